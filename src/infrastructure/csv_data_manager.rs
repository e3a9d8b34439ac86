// CSV-backed data manager
use crate::application::data_manager::{DataError, DataManager};
use crate::domain::records::{PredictionRecord, ProductionRecord};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CsvDataManager {
    production_path: PathBuf,
    prediction_path: PathBuf,
}

impl CsvDataManager {
    pub fn new(production_path: PathBuf, prediction_path: PathBuf) -> Self {
        Self {
            production_path,
            prediction_path,
        }
    }

    async fn read_records<T>(path: &Path) -> Result<Vec<T>, csv::Error>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(&path)?;
            reader.deserialize().collect::<Result<Vec<T>, _>>()
        })
        .await
        .map_err(|e| csv::Error::from(std::io::Error::other(e)))?
    }
}

fn is_missing_file(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound)
}

#[async_trait]
impl DataManager for CsvDataManager {
    async fn load_production_data(&self) -> Result<Vec<ProductionRecord>, DataError> {
        let records = Self::read_records(&self.production_path)
            .await
            .map_err(|e| DataError::Load {
                what: "production data",
                reason: format!("{}: {}", self.production_path.display(), e),
            })?;

        tracing::debug!("Loaded {} production rows", records.len());
        Ok(records)
    }

    async fn load_prediction_data(&self) -> Result<Vec<PredictionRecord>, DataError> {
        match Self::read_records(&self.prediction_path).await {
            Ok(records) => {
                tracing::debug!("Loaded {} predictions", records.len());
                Ok(records)
            }
            Err(e) if is_missing_file(&e) => Err(DataError::NotAvailable(format!(
                "{} does not exist",
                self.prediction_path.display()
            ))),
            Err(e) => Err(DataError::Load {
                what: "prediction data",
                reason: format!("{}: {}", self.prediction_path.display(), e),
            }),
        }
    }
}
