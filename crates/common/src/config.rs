use std::time::Duration;

use serde::Deserialize;

/// Where per-recipient campaign state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    Postgres,
    Redis,
}

impl std::str::FromStr for StateBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StateBackend::Postgres),
            "redis" => Ok(StateBackend::Redis),
            other => Err(anyhow::anyhow!(
                "CAMPAIGN_STATE_BACKEND must be 'postgres' or 'redis', got '{}'",
                other
            )),
        }
    }
}

/// Campaign dispatch job configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 5)
    pub db_max_connections: u32,

    /// Redis connection string, required when state lives in Redis
    pub redis_url: Option<String>,

    pub state_backend: StateBackend,

    /// Campaign group, e.g. `fossfund`
    pub campaign_group_id: String,

    /// Campaign within the group (default: 2, the first voting campaign)
    pub campaign_id: String,

    /// Maximum number of recipients considered in one run
    pub run_limit: usize,

    /// Calendar month offset of the eligibility window (default: -1, previous month)
    pub month_offset: i32,

    /// Pause after every campaign state lookup
    pub state_delay_ms: u64,

    /// Pause after every mail sent
    pub send_delay_ms: u64,

    /// Number of recipients between long pauses
    pub batch_size: usize,

    pub batch_pause_ms: u64,

    pub subject: String,
    pub headline: String,
    pub app_name: String,
    pub unsubscribe_base_url: String,

    /// Optional blind copy on every campaign mail
    pub bcc: Option<String>,

    /// Corporate mail domain used to classify and address recipients
    pub corporate_mail_domain: String,

    /// Username prefixes of accounts that are neither employees nor interns
    pub non_employee_prefixes: Vec<String>,

    /// Resend API key for email delivery
    pub resend_api_key: Option<String>,

    /// Email sender address
    pub email_from: Option<String>,

    /// Log mails instead of delivering them
    pub dry_run: bool,

    /// Hard ceiling on the process lifetime
    pub max_runtime_secs: u64,

    /// Delay between job completion and process exit
    pub exit_grace_secs: u64,
}

/// Watchdog ceiling when nothing else is configured (six hours).
pub const DEFAULT_MAX_RUNTIME_SECS: u64 = 21_600;

/// Delay between completion and exit when nothing else is configured.
pub const DEFAULT_EXIT_GRACE_SECS: u64 = 60;

const DEFAULT_SUBJECT: &str =
    "FOSS Fund voting is now open: Let's give $10,000 to a project thanks to YOUR contributions!";

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            redis_url: non_empty("REDIS_URL"),
            state_backend: var_or("CAMPAIGN_STATE_BACKEND", "postgres").parse()?,
            campaign_group_id: var_or("CAMPAIGN_GROUP_ID", "fossfund"),
            campaign_id: var_or("CAMPAIGN_ID", "2"),
            run_limit: var_or("CAMPAIGN_RUN_LIMIT", "10000")
                .parse()
                .map_err(|_| anyhow::anyhow!("CAMPAIGN_RUN_LIMIT must be a valid usize"))?,
            month_offset: var_or("CAMPAIGN_MONTH_OFFSET", "-1")
                .parse()
                .map_err(|_| anyhow::anyhow!("CAMPAIGN_MONTH_OFFSET must be a valid i32"))?,
            state_delay_ms: var_or("CAMPAIGN_STATE_DELAY_MS", "5")
                .parse()
                .map_err(|_| anyhow::anyhow!("CAMPAIGN_STATE_DELAY_MS must be a valid u64"))?,
            send_delay_ms: var_or("CAMPAIGN_SEND_DELAY_MS", "10")
                .parse()
                .map_err(|_| anyhow::anyhow!("CAMPAIGN_SEND_DELAY_MS must be a valid u64"))?,
            batch_size: var_or("CAMPAIGN_BATCH_SIZE", "100")
                .parse()
                .map_err(|_| anyhow::anyhow!("CAMPAIGN_BATCH_SIZE must be a valid usize"))?,
            batch_pause_ms: var_or("CAMPAIGN_BATCH_PAUSE_MS", "5000")
                .parse()
                .map_err(|_| anyhow::anyhow!("CAMPAIGN_BATCH_PAUSE_MS must be a valid u64"))?,
            subject: var_or("CAMPAIGN_SUBJECT", DEFAULT_SUBJECT),
            headline: var_or("CAMPAIGN_HEADLINE", "FOSS Fund"),
            app_name: var_or("CAMPAIGN_APP_NAME", "Open Source"),
            unsubscribe_base_url: var_or(
                "CAMPAIGN_UNSUBSCRIBE_BASE_URL",
                "https://repos.opensource.example.com/settings/campaigns",
            ),
            bcc: non_empty("CAMPAIGN_BCC"),
            corporate_mail_domain: lookup("CORPORATE_MAIL_DOMAIN").ok_or_else(|| {
                anyhow::anyhow!("CORPORATE_MAIL_DOMAIN environment variable is required")
            })?,
            non_employee_prefixes: var_or("NON_EMPLOYEE_PREFIXES", "v-,a-,t-")
                .split(',')
                .map(|p| p.trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            resend_api_key: non_empty("RESEND_API_KEY"),
            email_from: non_empty("EMAIL_FROM"),
            dry_run: var_or("DRY_RUN", "false")
                .parse()
                .map_err(|_| anyhow::anyhow!("DRY_RUN must be 'true' or 'false'"))?,
            max_runtime_secs: lookup("JOB_MAX_RUNTIME_SECS")
                .map_or(Ok(DEFAULT_MAX_RUNTIME_SECS), |v| v.parse())
                .map_err(|_| anyhow::anyhow!("JOB_MAX_RUNTIME_SECS must be a valid u64"))?,
            exit_grace_secs: lookup("JOB_EXIT_GRACE_SECS")
                .map_or(Ok(DEFAULT_EXIT_GRACE_SECS), |v| v.parse())
                .map_err(|_| anyhow::anyhow!("JOB_EXIT_GRACE_SECS must be a valid u64"))?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("CAMPAIGN_BATCH_SIZE must be greater than zero");
        }
        if self.state_backend == StateBackend::Redis && self.redis_url.is_none() {
            anyhow::bail!("REDIS_URL is required when CAMPAIGN_STATE_BACKEND=redis");
        }
        if self.resend_api_key.is_some() && !self.dry_run && self.email_from.is_none() {
            anyhow::bail!("EMAIL_FROM is required when RESEND_API_KEY is set");
        }
        Ok(())
    }

    /// Template view rendered for this campaign, e.g. `fossfund-2`.
    pub fn view_name(&self) -> String {
        format!("{}-{}", self.campaign_group_id, self.campaign_id)
    }

    pub fn max_runtime(&self) -> Duration {
        Duration::from_secs(self.max_runtime_secs)
    }

    pub fn exit_grace(&self) -> Duration {
        Duration::from_secs(self.exit_grace_secs)
    }
}
