// Production and prediction data domain models
use super::axis_range::parse_timestamp;
use super::feature::Feature;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Accepts both `T` and space separated date-times, as written by most exporters
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

/// One hourly row of the production dataset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductionRecord {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: NaiveDateTime,
    pub cnt: f64,
    pub temp: f64,
    pub hum: f64,
    pub windspeed: f64,
    pub weekday: f64,
    pub workingday: f64,
    pub weathersit: f64,
}

impl ProductionRecord {
    pub fn feature(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Temp => self.temp,
            Feature::Hum => self.hum,
            Feature::Windspeed => self.windspeed,
            Feature::Weekday => self.weekday,
            Feature::Workingday => self.workingday,
            Feature::Weathersit => self.weathersit,
        }
    }
}

/// A predicted bike count for one hour
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionRecord {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: NaiveDateTime,
    pub prediction: f64,
}

#[cfg(test)]
impl PredictionRecord {
    pub fn new(timestamp: NaiveDateTime, prediction: f64) -> Self {
        Self {
            timestamp,
            prediction,
        }
    }
}

/// Headline numbers shown beside the plots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub total_records: usize,
    pub latest_count: Option<f64>,
    pub last_updated: Option<NaiveDateTime>,
    pub predictions_made: usize,
}

impl DataSummary {
    pub fn from_records(production: &[ProductionRecord], predictions: Option<&[PredictionRecord]>) -> Self {
        let latest = production.iter().max_by_key(|r| r.timestamp);
        Self {
            total_records: production.len(),
            latest_count: latest.map(|r| r.cnt),
            last_updated: latest.map(|r| r.timestamp),
            predictions_made: predictions.map(<[_]>::len).unwrap_or(0),
        }
    }
}
