// Feature selection domain model
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Auxiliary production features that can be plotted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Temp,
    Hum,
    Windspeed,
    Weekday,
    Workingday,
    Weathersit,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::Temp,
        Feature::Hum,
        Feature::Windspeed,
        Feature::Weekday,
        Feature::Workingday,
        Feature::Weathersit,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Feature::Temp => "temp",
            Feature::Hum => "hum",
            Feature::Windspeed => "windspeed",
            Feature::Weekday => "weekday",
            Feature::Workingday => "workingday",
            Feature::Weathersit => "weathersit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Feature::Temp => "Temperature",
            Feature::Hum => "Humidity",
            Feature::Windspeed => "Wind Speed",
            Feature::Weekday => "Week Day",
            Feature::Workingday => "Working Day",
            Feature::Weathersit => "Weather",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature '{0}'")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.id() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

/// Features chosen for the second plot, in the order the user picked them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectedFeatures(Vec<Feature>);

impl SelectedFeatures {
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Self {
        let mut selected = Vec::new();
        for feature in features {
            if !selected.contains(&feature) {
                selected.push(feature);
            }
        }
        Self(selected)
    }

    /// Build from raw identifiers, rejecting anything outside the fixed set
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Result<Self, UnknownFeature> {
        let features = ids
            .iter()
            .map(|id| id.as_ref().parse::<Feature>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(features))
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

impl Default for SelectedFeatures {
    fn default() -> Self {
        Self::new([Feature::Temp, Feature::Hum])
    }
}
