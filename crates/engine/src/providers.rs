//! Collaborator contracts consumed by the dispatch job.
//!
//! Everything the dispatcher reads or writes goes through one of these traits,
//! so the loop can run against Postgres/Redis in production and against
//! in-memory fakes in tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use campaign_common::error::AppResult;
use campaign_common::types::{
    ActivityEvent, CampaignKey, CampaignState, Election, LinkedIdentity, Mail, Nominee,
};

use crate::content::RenderContext;

/// Directory of corporate identities linked to third-party accounts.
#[async_trait]
pub trait LinkedIdentityDirectory: Send + Sync {
    /// All links, in the directory's natural order.
    async fn get_all(&self) -> AppResult<Vec<LinkedIdentity>>;
}

/// Decides whether a corporate username belongs to an employee or intern.
pub trait EligibilityClassifier: Send + Sync {
    fn is_employee_or_intern(&self, corporate_username: &str) -> bool;
}

#[async_trait]
pub trait ElectionStore: Send + Sync {
    async fn query_elections_by_eligibility_dates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Election>>;
}

#[async_trait]
pub trait NominationStore: Send + Sync {
    async fn query_approved_election_nominees(&self, election_id: &str) -> AppResult<Vec<Nominee>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events of one recipient with `start <= created < end`.
    ///
    /// `include_closed_source = false` drops events on closed-source repositories
    /// but keeps both open source contributions and other activity.
    async fn query_open_contribution_events_by_date_range_and_corporate_id(
        &self,
        corporate_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        include_closed_source: bool,
    ) -> AppResult<Vec<ActivityEvent>>;
}

/// Durable per-recipient campaign state.
#[async_trait]
pub trait CampaignStateStore: Send + Sync {
    /// Missing state reads as `CampaignState::default()`.
    async fn get_state(&self, key: &CampaignKey) -> AppResult<CampaignState>;

    /// Mark the campaign as sent. Idempotent; never clears `opt_out`.
    async fn set_sent(&self, key: &CampaignKey) -> AppResult<()>;
}

#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Mail address for a corporate username, `None` if there is none.
    async fn resolve(&self, corporate_username: &str) -> AppResult<Option<String>>;
}

#[async_trait]
pub trait ContentRenderer: Send + Sync {
    async fn render(&self, view_name: &str, context: &RenderContext) -> AppResult<String>;
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &Mail) -> AppResult<()>;
}

/// The full set of collaborators a dispatch run needs.
#[derive(Clone)]
pub struct Providers {
    pub directory: Arc<dyn LinkedIdentityDirectory>,
    pub classifier: Arc<dyn EligibilityClassifier>,
    pub elections: Arc<dyn ElectionStore>,
    pub nominations: Arc<dyn NominationStore>,
    pub events: Arc<dyn EventStore>,
    pub campaign_state: Arc<dyn CampaignStateStore>,
    pub addresses: Arc<dyn AddressResolver>,
    pub renderer: Arc<dyn ContentRenderer>,
    pub mail: Arc<dyn MailTransport>,
}
