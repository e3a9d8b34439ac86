// View synchronizer - Shared zoom state and figure recomputation
use crate::application::data_manager::{DataError, DataManager};
use crate::application::figure_builder::make_prediction_figures;
use crate::domain::axis_range::{AxisChange, RelayoutEvent, SharedAxisRange};
use crate::domain::feature::SelectedFeatures;
use crate::domain::figure::Figure;
use crate::domain::lookback::LookbackWindow;
use crate::domain::records::DataSummary;
use serde::Serialize;
use std::sync::Arc;

/// Fold the event from whichever plot fired into the shared range.
/// `None` means neither plot fired this cycle.
pub fn reconcile_axis_range(
    stored: SharedAxisRange,
    fired: Option<&RelayoutEvent>,
) -> SharedAxisRange {
    let Some(event) = fired else {
        return stored;
    };

    match event.axis_change() {
        AxisChange::Zoom(lower, upper) => SharedAxisRange::window(lower, upper),
        AxisChange::Autorange => SharedAxisRange::Auto,
        AxisChange::None => stored,
    }
}

/// Inputs the two plots are computed from
#[derive(Debug, Clone, Copy)]
pub struct ViewInputs<'a> {
    pub lookback_hours: Option<i64>,
    pub features: &'a SelectedFeatures,
    pub range: &'a SharedAxisRange,
}

/// Output of one recomputation; always holds two figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedViews {
    pub predictions: Figure,
    pub features: Figure,
    pub lookback_hours: u32,
    pub summary: Option<DataSummary>,
}

#[derive(Clone)]
pub struct ViewSynchronizer {
    data_manager: Arc<dyn DataManager>,
    default_lookback: LookbackWindow,
}

impl ViewSynchronizer {
    pub fn new(data_manager: Arc<dyn DataManager>, default_lookback: LookbackWindow) -> Self {
        Self {
            data_manager,
            default_lookback,
        }
    }

    pub fn default_lookback(&self) -> LookbackWindow {
        self.default_lookback
    }

    /// Rebuild both figures. Failures become annotated placeholders, never errors.
    pub async fn recompute(&self, inputs: ViewInputs<'_>) -> RenderedViews {
        let lookback = LookbackWindow::resolve(inputs.lookback_hours, self.default_lookback);

        match self.try_recompute(lookback, inputs).await {
            Ok(views) => views,
            Err(e) => {
                tracing::error!("Error recomputing figures: {}", e);
                let reason = e.to_string();
                RenderedViews {
                    predictions: Figure::placeholder(&reason),
                    features: Figure::placeholder(&reason),
                    lookback_hours: lookback.hours(),
                    summary: None,
                }
            }
        }
    }

    async fn try_recompute(
        &self,
        lookback: LookbackWindow,
        inputs: ViewInputs<'_>,
    ) -> Result<RenderedViews, DataError> {
        let predictions = match self.data_manager.load_prediction_data().await {
            Ok(records) => Some(records),
            Err(DataError::NotAvailable(reason)) => {
                tracing::debug!("Rendering without predictions: {}", reason);
                None
            }
            Err(e) => {
                tracing::warn!("Prediction data failed to load, rendering without it: {}", e);
                None
            }
        };
        let production = self.data_manager.load_production_data().await?;

        let (predictions_fig, features_fig) = make_prediction_figures(
            &production,
            predictions.as_deref(),
            inputs.features,
            lookback,
            inputs.range,
        );

        Ok(RenderedViews {
            predictions: predictions_fig,
            features: features_fig,
            lookback_hours: lookback.hours(),
            summary: Some(DataSummary::from_records(&production, predictions.as_deref())),
        })
    }
}
