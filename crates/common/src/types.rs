use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A corporate identity linked to a third-party (GitHub) account.
///
/// Owned by the link directory; the dispatch job only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LinkedIdentity {
    pub corporate_id: String,
    /// Corporate username (UPN), e.g. `alice@contoso.com`
    pub corporate_username: String,
    pub corporate_display_name: String,
    pub third_party_id: String,
    pub third_party_username: String,
    pub is_service_account: bool,
}

/// A voting election whose eligibility is bounded by a date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    pub election_id: String,
    pub title: String,
    pub description: String,
    pub eligibility_start: DateTime<Utc>,
    pub eligibility_end: DateTime<Utc>,
    pub voting_start: DateTime<Utc>,
    pub voting_end: DateTime<Utc>,
}

/// An approved nominee of an election. Passed through to rendering untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Nominee {
    pub nomination_id: String,
    pub election_id: String,
    pub title: String,
    pub description: String,
    pub web: Option<String>,
    pub justification: Option<String>,
}

/// A single recorded activity of a recipient on a third-party platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub event_id: String,
    pub corporate_id: String,
    /// Grouping classifier, e.g. `PullRequestEvent`, `IssuesEvent`
    pub action: String,
    pub created: DateTime<Utc>,
    /// Whether the event counts as an open source contribution
    pub is_contribution: bool,
    pub is_closed_source: bool,
    pub organization_name: Option<String>,
    pub repository_name: Option<String>,
    pub additional_data: serde_json::Value,
}

/// Identifies one recipient's state within one campaign.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CampaignKey {
    pub corporate_id: String,
    pub campaign_group_id: String,
    pub campaign_id: String,
}

impl CampaignKey {
    pub fn new(corporate_id: &str, campaign_group_id: &str, campaign_id: &str) -> Self {
        Self {
            corporate_id: corporate_id.to_string(),
            campaign_group_id: campaign_group_id.to_string(),
            campaign_id: campaign_id.to_string(),
        }
    }
}

impl std::fmt::Display for CampaignKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.campaign_group_id, self.campaign_id, self.corporate_id
        )
    }
}

/// Persisted delivery state of a campaign for one recipient.
///
/// Both flags only ever move from `false` to `true`. A recipient with no
/// stored state is `CampaignState::default()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignState {
    pub opt_out: bool,
    pub sent: bool,
}

/// Notification severity tag carried into the rendered mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Information,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Information => write!(f, "information"),
        }
    }
}

/// An outbound mail, built per recipient and handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mail {
    pub to: String,
    pub bcc: Option<String>,
    pub subject: String,
    /// Rendered HTML body
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_state_default_is_unseen() {
        let state = CampaignState::default();
        assert!(!state.opt_out);
        assert!(!state.sent);
    }

    #[test]
    fn test_campaign_key_display() {
        let key = CampaignKey::new("42", "fossfund", "2");
        assert_eq!(key.to_string(), "fossfund/2/42");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Severity::Information).unwrap(),
            serde_json::json!("information")
        );
        assert_eq!(Severity::Information.to_string(), "information");
    }
}
