// Data manager trait for production and prediction data access
use crate::domain::records::{PredictionRecord, ProductionRecord};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// No prediction data has been produced yet, or it cannot be read.
    /// Callers render production data alone.
    #[error("prediction data not available: {0}")]
    NotAvailable(String),

    #[error("failed to load {what}: {reason}")]
    Load { what: &'static str, reason: String },
}

#[async_trait]
pub trait DataManager: Send + Sync {
    /// Timestamped production rows, the source of truth for the plots
    async fn load_production_data(&self) -> Result<Vec<ProductionRecord>, DataError>;

    /// Timestamped predictions; may fail independently of production data
    async fn load_prediction_data(&self) -> Result<Vec<PredictionRecord>, DataError>;
}
