use chrono::{DateTime, Utc};
use thiserror::Error;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No active election with eligibility window {start} .. {end}")]
    NoActiveElection {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Election {election_id} has no approved nominees")]
    NoNominees { election_id: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Mail error: {0}")]
    Mail(String),
}

impl AppError {
    /// Whether the error aborts a whole dispatch run rather than one recipient.
    pub fn is_run_level(&self) -> bool {
        matches!(
            self,
            AppError::NoActiveElection { .. } | AppError::NoNominees { .. } | AppError::Config(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_level_classification() {
        let now = Utc::now();
        assert!(AppError::NoActiveElection { start: now, end: now }.is_run_level());
        assert!(AppError::Config("bad".into()).is_run_level());
        assert!(
            AppError::NoNominees {
                election_id: "e1".into()
            }
            .is_run_level()
        );
        assert!(!AppError::Mail("smtp down".into()).is_run_level());
        assert!(!AppError::Render("missing".into()).is_run_level());
    }
}
