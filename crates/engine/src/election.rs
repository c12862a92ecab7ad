//! Election resolver: finds the election whose eligibility matches the window.

use campaign_common::error::{AppError, AppResult};
use campaign_common::types::{Election, Nominee};

use crate::providers::{ElectionStore, NominationStore};
use crate::window::DateWindow;

/// The election a run campaigns for, with its approved nominees in store order.
#[derive(Debug, Clone)]
pub struct ActiveElection {
    pub election: Election,
    pub nominees: Vec<Nominee>,
}

pub struct ElectionResolver;

impl ElectionResolver {
    /// Resolve the active election for `window`.
    ///
    /// The first election returned by the store wins. No election, or an
    /// election without approved nominees, is a run-level failure.
    pub async fn resolve(
        elections: &dyn ElectionStore,
        nominations: &dyn NominationStore,
        window: &DateWindow,
    ) -> AppResult<ActiveElection> {
        let mut candidates = elections
            .query_elections_by_eligibility_dates(window.start, window.end)
            .await?;

        if candidates.len() > 1 {
            tracing::warn!(
                count = candidates.len(),
                start = %window.start,
                end = %window.end,
                "Multiple elections share the eligibility window, using the first"
            );
        }

        if candidates.is_empty() {
            return Err(AppError::NoActiveElection {
                start: window.start,
                end: window.end,
            });
        }
        let election = candidates.swap_remove(0);

        let nominees = nominations
            .query_approved_election_nominees(&election.election_id)
            .await?;
        if nominees.is_empty() {
            return Err(AppError::NoNominees {
                election_id: election.election_id,
            });
        }

        tracing::info!(
            election_id = %election.election_id,
            nominees = nominees.len(),
            "Resolved active election"
        );

        Ok(ActiveElection { election, nominees })
    }
}
