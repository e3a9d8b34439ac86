// Figure builder - Turns data windows into the two dashboard plots
use crate::domain::axis_range::SharedAxisRange;
use crate::domain::feature::SelectedFeatures;
use crate::domain::figure::{Figure, Trace, TraceMode};
use crate::domain::lookback::LookbackWindow;
use crate::domain::records::{PredictionRecord, ProductionRecord};
use chrono::{Duration, NaiveDateTime};

pub const ACTUAL_TRACE: &str = "Actual";
pub const PREDICTED_TRACE: &str = "Predicted";

/// Predictions run this many hours past the newest production row
const PREDICTION_HORIZON_HOURS: i64 = 1;

/// Time span covered by a lookback window, anchored at the newest row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DataWindow {
    pub fn ending_at(end: NaiveDateTime, lookback: LookbackWindow) -> Self {
        Self {
            start: end - lookback.duration(),
            end,
        }
    }

    fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end
    }

    fn contains_prediction(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end + Duration::hours(PREDICTION_HORIZON_HOURS)
    }
}

/// Build (predicted vs actual, selected features) for one lookback window.
/// Both figures share the same time-axis bounds.
pub fn make_prediction_figures(
    production: &[ProductionRecord],
    predictions: Option<&[PredictionRecord]>,
    features: &SelectedFeatures,
    lookback: LookbackWindow,
    range: &SharedAxisRange,
) -> (Figure, Figure) {
    let mut counts = Figure::new("Bike count", range);
    let mut feature_fig = Figure::new("Value", range);

    let Some(end) = production.iter().map(|r| r.timestamp).max() else {
        return (counts, feature_fig);
    };
    let window = DataWindow::ending_at(end, lookback);

    let mut rows: Vec<&ProductionRecord> = production
        .iter()
        .filter(|r| window.contains(r.timestamp))
        .collect();
    rows.sort_by_key(|r| r.timestamp);

    counts = counts.with_trace(Trace::new(
        ACTUAL_TRACE,
        TraceMode::Lines,
        rows.iter().map(|r| (r.timestamp, r.cnt)).collect(),
    ));

    if let Some(predictions) = predictions {
        let mut points: Vec<(NaiveDateTime, f64)> = predictions
            .iter()
            .filter(|p| window.contains_prediction(p.timestamp))
            .map(|p| (p.timestamp, p.prediction))
            .collect();
        points.sort_by_key(|(ts, _)| *ts);

        counts = counts.with_trace(Trace::new(PREDICTED_TRACE, TraceMode::LinesMarkers, points));
    }

    for feature in features.iter() {
        feature_fig = feature_fig.with_trace(Trace::new(
            feature.label(),
            TraceMode::Lines,
            rows.iter().map(|r| (r.timestamp, r.feature(feature))).collect(),
        ));
    }

    (counts, feature_fig)
}
