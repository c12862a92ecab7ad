//! Content assembler: builds the render context of one recipient's mail.

use serde::Serialize;

use campaign_common::error::{AppError, AppResult};
use campaign_common::types::{ActivityEvent, Election, LinkedIdentity, Nominee, Severity};

use crate::activity::{ActivitySummary, ContributionGroups};

/// Per-campaign text and links shared by every mail of a run.
#[derive(Debug, Clone)]
pub struct CampaignContent {
    pub campaign_group_id: String,
    pub subject: String,
    pub headline: String,
    pub app_name: String,
    pub unsubscribe_text: String,
    pub unsubscribe_base_url: String,
    pub bcc: Option<String>,
}

impl CampaignContent {
    pub fn unsubscribe_link(&self) -> String {
        format!(
            "{}/{}/unsubscribe",
            self.unsubscribe_base_url.trim_end_matches('/'),
            self.campaign_group_id
        )
    }
}

/// Everything a campaign view needs to render one mail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderContext {
    pub reason: String,
    pub unsubscribe_text: String,
    pub unsubscribe_link: String,
    pub headline: String,
    pub subject: String,
    pub election: Election,
    pub nominees: Vec<Nominee>,
    pub notification: Severity,
    pub app: String,
    pub employee: LinkedIdentity,
    pub open_contributions: Vec<ActivityEvent>,
    pub contributions: ContributionGroups,
    pub other_contributions_data: Vec<ActivityEvent>,
}

pub struct ContentAssembler;

impl ContentAssembler {
    /// Assemble the render context. `nominees` must already be in the order
    /// this recipient should see them.
    pub fn assemble(
        content: &CampaignContent,
        recipient: &LinkedIdentity,
        election: &Election,
        nominees: Vec<Nominee>,
        activity: ActivitySummary,
        address: &str,
    ) -> AppResult<RenderContext> {
        if address.trim().is_empty() {
            return Err(AppError::Render(format!(
                "empty mail address for {}",
                recipient.corporate_id
            )));
        }
        if recipient.third_party_username.trim().is_empty() {
            return Err(AppError::Render(format!(
                "no linked username for {}",
                recipient.corporate_id
            )));
        }

        let reason = format!(
            "This mail was sent to {} for the GitHub user {} linked to {}",
            address, recipient.third_party_username, recipient.corporate_display_name
        );

        Ok(RenderContext {
            reason,
            unsubscribe_text: content.unsubscribe_text.clone(),
            unsubscribe_link: content.unsubscribe_link(),
            headline: content.headline.clone(),
            subject: content.subject.clone(),
            election: election.clone(),
            nominees,
            notification: Severity::Information,
            app: content.app_name.clone(),
            employee: recipient.clone(),
            open_contributions: activity.open_contributions,
            contributions: activity.contributions,
            other_contributions_data: activity.other_contributions_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn content() -> CampaignContent {
        CampaignContent {
            campaign_group_id: "fossfund".to_string(),
            subject: "FOSS Fund voting is now open".to_string(),
            headline: "FOSS Fund".to_string(),
            app_name: "Open Source".to_string(),
            unsubscribe_text: "Opt-out of future FOSS Fund emails".to_string(),
            unsubscribe_base_url: "https://repos.example.com/settings/campaigns/".to_string(),
            bcc: None,
        }
    }

    fn recipient() -> LinkedIdentity {
        LinkedIdentity {
            corporate_id: "42".to_string(),
            corporate_username: "alice@contoso.com".to_string(),
            corporate_display_name: "Alice Example".to_string(),
            third_party_id: "1001".to_string(),
            third_party_username: "alice-gh".to_string(),
            is_service_account: false,
        }
    }

    fn election() -> Election {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        Election {
            election_id: "e1".to_string(),
            title: "February FOSS Fund".to_string(),
            description: String::new(),
            eligibility_start: at,
            eligibility_end: at,
            voting_start: at,
            voting_end: at,
        }
    }

    #[test]
    fn test_unsubscribe_link_uses_group() {
        assert_eq!(
            content().unsubscribe_link(),
            "https://repos.example.com/settings/campaigns/fossfund/unsubscribe"
        );
    }

    #[test]
    fn test_assemble_reason_and_tags() {
        let ctx = ContentAssembler::assemble(
            &content(),
            &recipient(),
            &election(),
            Vec::new(),
            ActivitySummary::default(),
            "alice@contoso.com",
        )
        .unwrap();

        assert!(ctx.reason.contains("alice@contoso.com"));
        assert!(ctx.reason.contains("alice-gh"));
        assert!(ctx.reason.contains("Alice Example"));
        assert_eq!(ctx.notification, Severity::Information);
        assert_eq!(ctx.headline, "FOSS Fund");

        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["notification"], "information");
        assert_eq!(value["election"]["electionId"], "e1");
        assert_eq!(value["employee"]["thirdPartyUsername"], "alice-gh");
        assert_eq!(value["employee"]["corporateDisplayName"], "Alice Example");
        assert!(value["election"].get("election_id").is_none());
        assert!(value["unsubscribeLink"].as_str().unwrap().ends_with("/fossfund/unsubscribe"));
    }

    #[test]
    fn test_missing_linked_username_fails() {
        let mut r = recipient();
        r.third_party_username = String::new();
        let err = ContentAssembler::assemble(
            &content(),
            &r,
            &election(),
            Vec::new(),
            ActivitySummary::default(),
            "alice@contoso.com",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
    }
}
