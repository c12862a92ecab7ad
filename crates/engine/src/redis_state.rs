//! Redis-backed campaign state.
//!
//! Each recipient's state is a hash at `campaign:{group}:{campaign}:{corporate_id}`
//! with `optOut` and `sent` fields holding `1`/`0`. Fields are only ever set,
//! never deleted, so state moves monotonically towards `1`.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use campaign_common::error::AppResult;
use campaign_common::types::{CampaignKey, CampaignState};

use crate::providers::CampaignStateStore;

const OPT_OUT_FIELD: &str = "optOut";
const SENT_FIELD: &str = "sent";

#[derive(Clone)]
pub struct RedisCampaignStateStore {
    redis: ConnectionManager,
}

impl RedisCampaignStateStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn redis_key(key: &CampaignKey) -> String {
        format!(
            "campaign:{}:{}:{}",
            key.campaign_group_id, key.campaign_id, key.corporate_id
        )
    }

    fn parse_state(fields: &HashMap<String, String>) -> CampaignState {
        let flag = |name: &str| {
            fields
                .get(name)
                .map(|v| matches!(v.as_str(), "1" | "true"))
                .unwrap_or(false)
        };
        CampaignState {
            opt_out: flag(OPT_OUT_FIELD),
            sent: flag(SENT_FIELD),
        }
    }
}

#[async_trait]
impl CampaignStateStore for RedisCampaignStateStore {
    async fn get_state(&self, key: &CampaignKey) -> AppResult<CampaignState> {
        // ConnectionManager is a cheap handle; clone to get a mutable one.
        let mut redis = self.redis.clone();
        let fields: HashMap<String, String> = redis.hgetall(Self::redis_key(key)).await?;
        Ok(Self::parse_state(&fields))
    }

    async fn set_sent(&self, key: &CampaignKey) -> AppResult<()> {
        let mut redis = self.redis.clone();
        redis
            .hset::<_, _, _, ()>(Self::redis_key(key), SENT_FIELD, 1)
            .await?;

        tracing::debug!(key = %key, "Campaign state set to sent");
        Ok(())
    }
}
