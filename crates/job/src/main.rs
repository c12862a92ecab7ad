//! Campaign dispatch job binary entrypoint.
//!
//! One invocation is one batch pass over the eligible population; schedule it
//! periodically (e.g. daily). Persisted campaign state makes repeated runs safe.

mod watchdog;

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use campaign_common::config::{AppConfig, StateBackend};
use campaign_common::connections::{connect_postgres, connect_redis};
use campaign_common::error::AppError;
use campaign_engine::address::UpnAddressResolver;
use campaign_engine::dispatcher::{DispatchSettings, Dispatcher, RunReport};
use campaign_engine::eligibility::UpnClassifier;
use campaign_engine::providers::{CampaignStateStore, MailTransport, Providers};
use campaign_engine::redis_state::RedisCampaignStateStore;
use campaign_engine::store::PgStore;
use campaign_notifier::mail::{LogTransport, ResendTransport};
use campaign_notifier::render::{CampaignViewRenderer, ViewKind};

use crate::watchdog::Watchdog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("campaign_job=info,campaign_engine=info,campaign_notifier=info")
        }))
        .json()
        .init();

    tracing::info!("Campaign dispatch job starting...");

    // Load configuration; a failure still exits through the watchdog
    let config = AppConfig::from_env();
    let (ceiling, exit_grace) = watchdog::limits(config.as_ref().ok());
    let watchdog = Watchdog::arm(ceiling, exit_grace)?;

    let outcome = match config {
        Ok(config) => work(&config).await,
        Err(e) => Err(e.context("Failed to load configuration")),
    };

    let success = match outcome {
        Ok(report) => {
            tracing::info!(
                run_id = %report.run_id,
                sent = report.sent(),
                skipped = report.skipped(),
                failed = report.failed(),
                "Campaign dispatch completed"
            );
            true
        }
        Err(e) if e.downcast_ref::<AppError>().is_some_and(AppError::is_run_level) => {
            tracing::warn!(error = %e, "Campaign dispatch did not start");
            false
        }
        Err(e) => {
            tracing::error!(error = %e, "Campaign dispatch aborted");
            false
        }
    };

    let code = watchdog.finish(success).await;
    std::process::exit(code);
}

async fn work(config: &AppConfig) -> anyhow::Result<RunReport> {
    // Connect to database
    let pool = connect_postgres(config).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let store = Arc::new(PgStore::new(pool));

    let campaign_state: Arc<dyn CampaignStateStore> = match config.state_backend {
        StateBackend::Postgres => store.clone(),
        StateBackend::Redis => Arc::new(RedisCampaignStateStore::new(
            connect_redis(config).await?,
        )),
    };

    let mail: Arc<dyn MailTransport> = match (&config.resend_api_key, &config.email_from) {
        (Some(api_key), Some(from)) if !config.dry_run => {
            tracing::info!(from = %from, "Delivering mail through Resend");
            Arc::new(ResendTransport::new(api_key.clone(), from.clone()))
        }
        _ => {
            tracing::warn!("No mail provider configured or DRY_RUN set, mails are only logged");
            Arc::new(LogTransport)
        }
    };

    let providers = Providers {
        directory: store.clone(),
        classifier: Arc::new(UpnClassifier::new(
            config.corporate_mail_domain.clone(),
            config.non_employee_prefixes.clone(),
        )),
        elections: store.clone(),
        nominations: store.clone(),
        events: store,
        campaign_state,
        addresses: Arc::new(UpnAddressResolver::new(config.corporate_mail_domain.clone())),
        renderer: Arc::new(
            CampaignViewRenderer::new().with_view(config.view_name(), ViewKind::VotingOpen),
        ),
        mail,
    };

    let mut dispatcher = Dispatcher::new(
        providers,
        DispatchSettings::from_config(config),
        StdRng::from_entropy(),
    );

    Ok(dispatcher.run().await?)
}
