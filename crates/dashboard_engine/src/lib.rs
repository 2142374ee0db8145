//! Aggregation and forecasting engine behind the expense dashboard.
//!
//! Raw records go through the normalizer, are bucketed per calendar month
//! and per category, and the monthly expense totals feed a linear trend
//! forecast. The engine is pure: it reads an immutable snapshot of records
//! and returns a [`Summary`]; chart images are produced elsewhere from that
//! summary.

pub mod aggregation;
pub mod forecast;
pub mod summary;

use chrono::{DateTime, Utc};
use models::{ForecastSettings, RawRecord, Summary};
use thiserror::Error;
use tracing::info;

pub use aggregation::aggregate;
pub use forecast::{forecast_expenses, holdout_split, LinearTrend};
pub use summary::{summarize, summarize_batch};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies every record belonging to an owner.
pub trait RecordSource {
    type Error: Into<BoxError>;

    fn records_for_owner(&self, owner_id: &str) -> Result<Vec<RawRecord>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Fetching records for owner '{owner_id}' failed: {source}")]
    Source {
        owner_id: String,
        #[source]
        source: BoxError,
    },
}

/// Summarizes owners' records fetched through an injected [`RecordSource`].
pub struct DashboardEngine<S> {
    source: S,
    settings: ForecastSettings,
}

impl<S: RecordSource> DashboardEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            settings: ForecastSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ForecastSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn summarize_owner(&self, owner_id: &str) -> Result<Summary, EngineError> {
        self.summarize_owner_at(owner_id, Utc::now())
    }

    pub fn summarize_owner_at(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Summary, EngineError> {
        let raws = self
            .source
            .records_for_owner(owner_id)
            .map_err(|e| EngineError::Source {
                owner_id: owner_id.to_string(),
                source: e.into(),
            })?;
        info!(owner = owner_id, records = raws.len(), "summarizing records");
        Ok(summarize(Some(owner_id), &raws, now, &self.settings))
    }
}
