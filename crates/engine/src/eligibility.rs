//! Eligibility filter: picks the working set of recipients for a run.

use rand::Rng;
use rand::seq::SliceRandom;

use campaign_common::types::LinkedIdentity;

use crate::providers::EligibilityClassifier;

/// Select the recipients considered by one run.
///
/// Keeps employees and interns, drops service accounts, truncates to
/// `run_limit` in directory order and then shuffles the survivors, so that
/// interrupted runs do not keep starving the same tail of the directory.
pub fn select_recipients<R: Rng + ?Sized>(
    identities: Vec<LinkedIdentity>,
    classifier: &dyn EligibilityClassifier,
    run_limit: usize,
    rng: &mut R,
) -> Vec<LinkedIdentity> {
    let mut selected: Vec<LinkedIdentity> = identities
        .into_iter()
        .filter(|identity| classifier.is_employee_or_intern(&identity.corporate_username))
        .filter(|identity| !identity.is_service_account)
        .take(run_limit)
        .collect();

    selected.shuffle(rng);
    selected
}

/// Classifies corporate usernames (UPNs) by mail domain and alias prefix.
///
/// Vendors and other non-employees carry an alias prefix such as `v-`.
pub struct UpnClassifier {
    domain: String,
    non_employee_prefixes: Vec<String>,
}

impl UpnClassifier {
    pub fn new(domain: impl Into<String>, non_employee_prefixes: Vec<String>) -> Self {
        Self {
            domain: domain.into(),
            non_employee_prefixes: non_employee_prefixes
                .into_iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
        }
    }
}

impl EligibilityClassifier for UpnClassifier {
    fn is_employee_or_intern(&self, corporate_username: &str) -> bool {
        let Some((alias, domain)) = corporate_username.trim().split_once('@') else {
            return false;
        };
        if alias.is_empty() || !domain.eq_ignore_ascii_case(&self.domain) {
            return false;
        }
        let alias = alias.to_ascii_lowercase();
        !self
            .non_employee_prefixes
            .iter()
            .any(|prefix| alias.starts_with(prefix.as_str()))
    }
}
