//! Postgres-backed collaborators.
//!
//! One `PgStore` serves the link directory, elections, nominations, activity
//! events and campaign state; each concern is a separate trait impl so the
//! dispatcher can mix backends (e.g. campaign state in Redis).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use campaign_common::error::AppResult;
use campaign_common::types::{
    ActivityEvent, CampaignKey, CampaignState, Election, LinkedIdentity, Nominee,
};

use crate::providers::{
    CampaignStateStore, ElectionStore, EventStore, LinkedIdentityDirectory, NominationStore,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkedIdentityDirectory for PgStore {
    async fn get_all(&self) -> AppResult<Vec<LinkedIdentity>> {
        let links: Vec<LinkedIdentity> = sqlx::query_as(
            r#"
            SELECT corporate_id, corporate_username, corporate_display_name,
                   third_party_id, third_party_username, is_service_account
            FROM links
            ORDER BY corporate_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }
}

#[async_trait]
impl ElectionStore for PgStore {
    async fn query_elections_by_eligibility_dates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Election>> {
        let elections: Vec<Election> = sqlx::query_as(
            r#"
            SELECT election_id, title, description, eligibility_start, eligibility_end,
                   voting_start, voting_end
            FROM voting_elections
            WHERE eligibility_start = $1
              AND eligibility_end = $2
            ORDER BY created_at, election_id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(elections)
    }
}

#[async_trait]
impl NominationStore for PgStore {
    async fn query_approved_election_nominees(&self, election_id: &str) -> AppResult<Vec<Nominee>> {
        let nominees: Vec<Nominee> = sqlx::query_as(
            r#"
            SELECT nomination_id, election_id, title, description, web, justification
            FROM voting_nominations
            WHERE election_id = $1
              AND approved = true
            ORDER BY created_at, nomination_id
            "#,
        )
        .bind(election_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(nominees)
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn query_open_contribution_events_by_date_range_and_corporate_id(
        &self,
        corporate_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        include_closed_source: bool,
    ) -> AppResult<Vec<ActivityEvent>> {
        let events: Vec<ActivityEvent> = sqlx::query_as(
            r#"
            SELECT event_id, corporate_id, action, created, is_contribution, is_closed_source,
                   organization_name, repository_name, additional_data
            FROM events
            WHERE corporate_id = $1
              AND created >= $2
              AND created < $3
              AND ($4 OR NOT is_closed_source)
            ORDER BY created, event_id
            "#,
        )
        .bind(corporate_id)
        .bind(start)
        .bind(end)
        .bind(include_closed_source)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}

#[async_trait]
impl CampaignStateStore for PgStore {
    async fn get_state(&self, key: &CampaignKey) -> AppResult<CampaignState> {
        let state: Option<CampaignState> = sqlx::query_as(
            r#"
            SELECT opt_out, sent
            FROM campaign_state
            WHERE corporate_id = $1
              AND campaign_group_id = $2
              AND campaign_id = $3
            "#,
        )
        .bind(&key.corporate_id)
        .bind(&key.campaign_group_id)
        .bind(&key.campaign_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state.unwrap_or_default())
    }

    async fn set_sent(&self, key: &CampaignKey) -> AppResult<()> {
        // The first sent_at wins; opt_out is never touched here.
        sqlx::query(
            r#"
            INSERT INTO campaign_state (corporate_id, campaign_group_id, campaign_id, sent, sent_at, updated_at)
            VALUES ($1, $2, $3, true, NOW(), NOW())
            ON CONFLICT (corporate_id, campaign_group_id, campaign_id)
            DO UPDATE SET sent = true,
                          sent_at = COALESCE(campaign_state.sent_at, EXCLUDED.sent_at),
                          updated_at = NOW()
            "#,
        )
        .bind(&key.corporate_id)
        .bind(&key.campaign_group_id)
        .bind(&key.campaign_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(key = %key, "Campaign state set to sent");
        Ok(())
    }
}
