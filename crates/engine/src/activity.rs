//! Activity aggregator: classifies a recipient's activity within the window.
//!
//! Events are split into open source contributions and everything else; the
//! contributions are then grouped by their action classifier for rendering.

use std::collections::HashMap;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use campaign_common::error::AppResult;
use campaign_common::types::ActivityEvent;

use crate::providers::EventStore;
use crate::window::DateWindow;

/// Contributions grouped by action.
///
/// Groups keep the order in which each action was first seen, and events keep
/// their order within a group. Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributionGroups {
    groups: Vec<(String, Vec<ActivityEvent>)>,
}

impl ContributionGroups {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a ActivityEvent>) -> Self {
        let mut groups: Vec<(String, Vec<ActivityEvent>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for event in events {
            match index.get(&event.action) {
                Some(&position) => groups[position].1.push(event.clone()),
                None => {
                    index.insert(event.action.clone(), groups.len());
                    groups.push((event.action.clone(), vec![event.clone()]));
                }
            }
        }

        Self { groups }
    }

    pub fn get(&self, action: &str) -> Option<&[ActivityEvent]> {
        self.groups
            .iter()
            .find(|(a, _)| a == action)
            .map(|(_, events)| events.as_slice())
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(action, _)| action.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ActivityEvent])> {
        self.groups
            .iter()
            .map(|(action, events)| (action.as_str(), events.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for ContributionGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (action, events) in &self.groups {
            map.serialize_entry(action, events)?;
        }
        map.end()
    }
}

/// A recipient's classified activity for one window.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub open_contributions: Vec<ActivityEvent>,
    pub contributions: ContributionGroups,
    pub other_contributions_data: Vec<ActivityEvent>,
}

impl ActivitySummary {
    pub fn classify(events: Vec<ActivityEvent>) -> Self {
        let (open_contributions, other_contributions_data): (Vec<_>, Vec<_>) =
            events.into_iter().partition(|event| event.is_contribution);
        let contributions = ContributionGroups::from_events(&open_contributions);

        Self {
            open_contributions,
            contributions,
            other_contributions_data,
        }
    }

    pub fn has_contributions(&self) -> bool {
        !self.open_contributions.is_empty()
    }
}

pub struct ActivityAggregator;

impl ActivityAggregator {
    /// Fetch and classify a recipient's activity, excluding closed-source repositories.
    pub async fn aggregate(
        events: &dyn EventStore,
        corporate_id: &str,
        window: &DateWindow,
    ) -> AppResult<ActivitySummary> {
        let events = events
            .query_open_contribution_events_by_date_range_and_corporate_id(
                corporate_id,
                window.start,
                window.end,
                false,
            )
            .await?;

        let summary = ActivitySummary::classify(events);
        tracing::debug!(
            corporate_id,
            open_contributions = summary.open_contributions.len(),
            other_activity = summary.other_contributions_data.len(),
            "Aggregated activity"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn event(id: usize, action: &str, contribution: bool) -> ActivityEvent {
        ActivityEvent {
            event_id: format!("ev{}", id),
            corporate_id: "42".to_string(),
            action: action.to_string(),
            created: Utc.with_ymd_and_hms(2024, 2, 3, 12, 0, 0).unwrap() + Duration::hours(id as i64),
            is_contribution: contribution,
            is_closed_source: false,
            organization_name: Some("contoso".to_string()),
            repository_name: Some("widgets".to_string()),
            additional_data: serde_json::json!({}),
        }
    }

    fn ids(events: &[ActivityEvent]) -> Vec<&str> {
        events.iter().map(|e| e.event_id.as_str()).collect()
    }

    #[test]
    fn test_groups_contributions_by_action() {
        let summary = ActivitySummary::classify(vec![
            event(1, "PR", true),
            event(2, "Issue", true),
            event(3, "PR", true),
            event(4, "Comment", false),
        ]);

        assert_eq!(summary.contributions.len(), 2);
        assert_eq!(ids(summary.contributions.get("PR").unwrap()), vec!["ev1", "ev3"]);
        assert_eq!(ids(summary.contributions.get("Issue").unwrap()), vec!["ev2"]);
        assert!(summary.contributions.get("Comment").is_none());
        assert_eq!(ids(&summary.other_contributions_data), vec!["ev4"]);
        assert_eq!(ids(&summary.open_contributions), vec!["ev1", "ev2", "ev3"]);
        assert!(summary.has_contributions());
    }

    #[test]
    fn test_group_order_is_first_seen() {
        let summary = ActivitySummary::classify(vec![
            event(1, "Issue", true),
            event(2, "PR", true),
            event(3, "Issue", true),
            event(4, "Review", true),
        ]);
        let actions: Vec<&str> = summary.contributions.actions().collect();
        assert_eq!(actions, vec!["Issue", "PR", "Review"]);
    }

    #[test]
    fn test_no_contributions() {
        let summary = ActivitySummary::classify(vec![event(1, "Comment", false)]);
        assert!(!summary.has_contributions());
        assert!(summary.contributions.is_empty());
        assert_eq!(summary.other_contributions_data.len(), 1);
    }

    #[test]
    fn test_groups_serialize_as_ordered_object() {
        let summary = ActivitySummary::classify(vec![
            event(1, "PR", true),
            event(2, "Issue", true),
            event(3, "PR", true),
        ]);
        let json = serde_json::to_string(&summary.contributions).unwrap();
        let pr = json.find("\"PR\"").unwrap();
        let issue = json.find("\"Issue\"").unwrap();
        assert!(pr < issue);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["contributions"]["PR"].as_array().unwrap().len(), 2);
        assert_eq!(value["otherContributionsData"].as_array().unwrap().len(), 0);
    }
}
