//! Campaign dispatcher: drives one notification run end to end.
//!
//! 1. Resolve the eligibility window and the active election (once)
//! 2. Select and shuffle the eligible recipients (once)
//! 3. For each recipient, sequentially: consult campaign state, aggregate
//!    activity, assemble content, commit state, send
//!
//! Delivery is at-most-once. The `sent` flag is committed *before* the mail
//! is handed to the transport: a transport failure after the commit loses
//! that mail, but overlapping or retried runs can never send it twice. Do
//! not reorder the commit after the send.

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

use campaign_common::config::AppConfig;
use campaign_common::error::{AppError, AppResult};
use campaign_common::types::{CampaignKey, LinkedIdentity, Mail};

use crate::activity::ActivityAggregator;
use crate::content::{CampaignContent, ContentAssembler};
use crate::election::{ActiveElection, ElectionResolver};
use crate::eligibility::select_recipients;
use crate::providers::Providers;
use crate::window::{DateWindow, offset_month_range};

/// Run-wide knobs of the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub campaign_group_id: String,
    pub campaign_id: String,
    pub run_limit: usize,
    pub month_offset: i32,
    /// Pause after every state lookup
    pub state_delay: Duration,
    /// Pause after every send
    pub send_delay: Duration,
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub content: CampaignContent,
}

impl DispatchSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            campaign_group_id: config.campaign_group_id.clone(),
            campaign_id: config.campaign_id.clone(),
            run_limit: config.run_limit,
            month_offset: config.month_offset,
            state_delay: Duration::from_millis(config.state_delay_ms),
            send_delay: Duration::from_millis(config.send_delay_ms),
            batch_size: config.batch_size,
            batch_pause: Duration::from_millis(config.batch_pause_ms),
            content: CampaignContent {
                campaign_group_id: config.campaign_group_id.clone(),
                subject: config.subject.clone(),
                headline: config.headline.clone(),
                app_name: config.app_name.clone(),
                unsubscribe_text: format!("Opt-out of future {} emails", config.headline),
                unsubscribe_base_url: config.unsubscribe_base_url.clone(),
                bcc: config.bcc.clone(),
            },
        }
    }

    pub fn view_name(&self) -> String {
        format!("{}-{}", self.campaign_group_id, self.campaign_id)
    }

    fn key(&self, corporate_id: &str) -> CampaignKey {
        CampaignKey::new(corporate_id, &self.campaign_group_id, &self.campaign_id)
    }
}

/// Why a recipient was deliberately not mailed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OptedOut,
    AlreadySent,
    /// No open source contributions in the window; marked sent so later runs skip it.
    NoContributions,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::OptedOut => write!(f, "opted_out"),
            SkipReason::AlreadySent => write!(f, "already_sent"),
            SkipReason::NoContributions => write!(f, "no_contributions"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Skipped(SkipReason),
    Failed(String),
}

/// Terminal outcome of one recipient within a run.
#[derive(Debug, Clone)]
pub struct RecipientResult {
    pub corporate_id: String,
    pub corporate_username: String,
    pub outcome: Outcome,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub window: DateWindow,
    pub election_id: String,
    /// Recipients selected by the eligibility filter
    pub eligible: usize,
    /// Per-recipient outcomes, in processing order
    pub results: Vec<RecipientResult>,
}

impl RunReport {
    pub fn sent(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Sent))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn outcome_of(&self, corporate_id: &str) -> Option<&Outcome> {
        self.results
            .iter()
            .find(|r| r.corporate_id == corporate_id)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Counters local to one pass of the send loop.
#[derive(Debug, Default)]
struct LoopState {
    in_run: usize,
}

pub struct Dispatcher<R> {
    providers: Providers,
    settings: DispatchSettings,
    rng: R,
}

impl<R: Rng + Send> Dispatcher<R> {
    /// `rng` drives both the recipient shuffle and the per-recipient nominee shuffle.
    pub fn new(providers: Providers, settings: DispatchSettings, rng: R) -> Self {
        Self {
            providers,
            settings,
            rng,
        }
    }

    /// Run against the month `settings.month_offset` away from today.
    pub async fn run(&mut self) -> AppResult<RunReport> {
        let window = offset_month_range(self.settings.month_offset).ok_or_else(|| {
            AppError::Config(format!(
                "month offset {} is out of range",
                self.settings.month_offset
            ))
        })?;
        self.run_for_window(window).await
    }

    /// Run against an explicit eligibility window.
    ///
    /// Returns `Err` only for run-level failures; every recipient-level error
    /// is recorded as [`Outcome::Failed`] and the loop moves on.
    pub async fn run_for_window(&mut self, window: DateWindow) -> AppResult<RunReport> {
        let run_id = Uuid::new_v4();
        let started = Utc::now();

        tracing::info!(
            run_id = %run_id,
            campaign_group_id = %self.settings.campaign_group_id,
            campaign_id = %self.settings.campaign_id,
            start = %window.start,
            end = %window.end,
            run_limit = self.settings.run_limit,
            "Campaign run starting"
        );

        let active = ElectionResolver::resolve(
            self.providers.elections.as_ref(),
            self.providers.nominations.as_ref(),
            &window,
        )
        .await?;

        let identities = self.providers.directory.get_all().await?;
        let directory_size = identities.len();
        let recipients = select_recipients(
            identities,
            self.providers.classifier.as_ref(),
            self.settings.run_limit,
            &mut self.rng,
        );

        tracing::info!(
            run_id = %run_id,
            directory_size,
            eligible = recipients.len(),
            "Selected recipients"
        );

        let mut state = LoopState::default();
        let mut results = Vec::with_capacity(recipients.len());

        for recipient in &recipients {
            if state.in_run >= self.settings.run_limit {
                break;
            }
            state.in_run += 1;

            let outcome = match self.process_recipient(recipient, &active, &window).await {
                Ok(outcome) => outcome,
                Err(e) => Outcome::Failed(e.to_string()),
            };
            self.log_outcome(recipient, &outcome, &state);

            results.push(RecipientResult {
                corporate_id: recipient.corporate_id.clone(),
                corporate_username: recipient.corporate_username.clone(),
                outcome,
            });

            if state.in_run % self.settings.batch_size.max(1) == 0 && state.in_run < recipients.len()
            {
                tracing::info!(
                    in_run = state.in_run,
                    pause_ms = self.settings.batch_pause.as_millis() as u64,
                    "Long pause..."
                );
                pause(self.settings.batch_pause).await;
                tracing::info!(in_run = state.in_run, "Moving along");
            }
        }

        let report = RunReport {
            run_id,
            window,
            election_id: active.election.election_id.clone(),
            eligible: recipients.len(),
            results,
        };

        tracing::info!(
            run_id = %run_id,
            election_id = %report.election_id,
            considered = report.results.len(),
            sent = report.sent(),
            skipped = report.skipped(),
            failed = report.failed(),
            elapsed_secs = (Utc::now() - started).num_seconds(),
            "Campaign run finished"
        );

        Ok(report)
    }

    /// Move one recipient from UNSEEN to a terminal outcome.
    async fn process_recipient(
        &mut self,
        recipient: &LinkedIdentity,
        active: &ActiveElection,
        window: &DateWindow,
    ) -> AppResult<Outcome> {
        let key = self.settings.key(&recipient.corporate_id);

        let state = match self.providers.campaign_state.get_state(&key).await {
            Ok(state) => state,
            Err(e) => {
                pause(self.settings.state_delay).await;
                return Err(e);
            }
        };
        if state.opt_out {
            return Ok(Outcome::Skipped(SkipReason::OptedOut));
        }
        pause(self.settings.state_delay).await;
        if state.sent {
            return Ok(Outcome::Skipped(SkipReason::AlreadySent));
        }

        let activity = ActivityAggregator::aggregate(
            self.providers.events.as_ref(),
            &recipient.corporate_id,
            window,
        )
        .await?;
        if !activity.has_contributions() {
            self.providers.campaign_state.set_sent(&key).await?;
            return Ok(Outcome::Skipped(SkipReason::NoContributions));
        }

        let Some(address) = self
            .providers
            .addresses
            .resolve(&recipient.corporate_username)
            .await?
        else {
            return Ok(Outcome::Failed(format!(
                "no mail address for {}",
                recipient.corporate_username
            )));
        };

        let mut nominees = active.nominees.clone();
        nominees.shuffle(&mut self.rng);

        let context = ContentAssembler::assemble(
            &self.settings.content,
            recipient,
            &active.election,
            nominees,
            activity,
            &address,
        )?;
        let content = self
            .providers
            .renderer
            .render(&self.settings.view_name(), &context)
            .await?;

        let mail = Mail {
            to: address,
            bcc: self.settings.content.bcc.clone(),
            subject: self.settings.content.subject.clone(),
            content,
        };

        // At-most-once: commit before handing off to the transport.
        self.providers.campaign_state.set_sent(&key).await?;
        let delivered = self.providers.mail.send(&mail).await;
        // Rejected sends are throttled like accepted ones.
        pause(self.settings.send_delay).await;
        delivered?;

        Ok(Outcome::Sent)
    }

    fn log_outcome(&self, recipient: &LinkedIdentity, outcome: &Outcome, state: &LoopState) {
        let corporate_id = recipient.corporate_id.as_str();
        let campaign_group_id = self.settings.campaign_group_id.as_str();
        match outcome {
            Outcome::Sent => {
                tracing::info!(
                    corporate_id,
                    corporate_username = %recipient.corporate_username,
                    display_name = %recipient.corporate_display_name,
                    in_run = state.in_run,
                    run_limit = self.settings.run_limit,
                    "Sent and set state"
                );
            }
            Outcome::Skipped(SkipReason::OptedOut) => {
                tracing::info!(
                    corporate_id,
                    campaign_group_id,
                    "Recipient has opted out of the campaign group"
                );
            }
            Outcome::Skipped(reason) => {
                tracing::debug!(corporate_id, reason = %reason, "Recipient skipped");
            }
            Outcome::Failed(error) => {
                tracing::error!(
                    corporate_id,
                    corporate_username = %recipient.corporate_username,
                    error = %error,
                    "Failed to process recipient"
                );
            }
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
