// Dashboard session - State store plus the reactions that keep it consistent
use crate::application::inference_trigger::{InferenceError, TriggerBusy, TriggerState};
use crate::application::reactive::{ChangeBatch, DependencyGraph, Reaction, Signal};
use crate::application::view_synchronizer::{
    reconcile_axis_range, RenderedViews, ViewInputs, ViewSynchronizer,
};
use crate::domain::axis_range::{PlotId, RelayoutEvent, SharedAxisRange};
use crate::domain::feature::SelectedFeatures;
use crate::domain::inference::{InferenceOutcome, InferenceResponse};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

const RELAYOUT_SIGNALS: [Signal; 2] = [Signal::PredictionsRelayout, Signal::FeaturesRelayout];

fn relayout_signal(plot: PlotId) -> Signal {
    match plot {
        PlotId::Predictions => Signal::PredictionsRelayout,
        PlotId::Features => Signal::FeaturesRelayout,
    }
}

fn signal_plot(signal: Signal) -> Option<PlotId> {
    match signal {
        Signal::PredictionsRelayout => Some(PlotId::Predictions),
        Signal::FeaturesRelayout => Some(PlotId::Features),
        _ => None,
    }
}

/// Everything a session owns. Only the session's own handlers mutate it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Lookback input as the user entered it; resolved on each recomputation
    pub lookback_hours: Option<i64>,
    pub features: SelectedFeatures,
    pub axis_range: SharedAxisRange,
    pub relayouts: HashMap<PlotId, RelayoutEvent>,
    pub trigger: TriggerState,
    pub views: Option<RenderedViews>,
}

/// What the browser needs to draw the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub lookback_hours: Option<i64>,
    pub features: SelectedFeatures,
    pub shared_xaxis_range: SharedAxisRange,
    pub inference_trigger: u64,
    pub inference_status: String,
    pub inference_outcome: Option<InferenceOutcome>,
    pub predict_disabled: bool,
    pub views: Option<RenderedViews>,
}

pub struct Session {
    id: Uuid,
    state: SessionState,
    graph: DependencyGraph,
    synchronizer: ViewSynchronizer,
}

impl Session {
    pub fn new(synchronizer: ViewSynchronizer) -> Self {
        let state = SessionState {
            lookback_hours: Some(i64::from(synchronizer.default_lookback().hours())),
            ..SessionState::default()
        };

        Self {
            id: Uuid::new_v4(),
            state,
            graph: DependencyGraph::dashboard(),
            synchronizer,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Initial render: every figure input counts as changed. Inference is
    /// never triggered here.
    pub async fn initialize(&mut self) {
        let mut batch = ChangeBatch::new();
        for signal in [
            Signal::LookbackHours,
            Signal::SelectedFeatures,
            Signal::SharedAxisRange,
            Signal::InferenceTrigger,
        ] {
            batch.mark(&self.graph, signal);
        }
        self.flush(batch).await;
    }

    pub async fn relayout(&mut self, plot: PlotId, event: RelayoutEvent) {
        self.state.relayouts.insert(plot, event);

        let mut batch = ChangeBatch::new();
        batch.mark(&self.graph, relayout_signal(plot));
        self.flush(batch).await;
    }

    pub async fn set_lookback(&mut self, hours: Option<i64>) {
        if self.state.lookback_hours == hours {
            return;
        }
        self.state.lookback_hours = hours;

        let mut batch = ChangeBatch::new();
        batch.mark(&self.graph, Signal::LookbackHours);
        self.flush(batch).await;
    }

    pub async fn set_features(&mut self, features: SelectedFeatures) {
        if self.state.features == features {
            return;
        }
        self.state.features = features;

        let mut batch = ChangeBatch::new();
        batch.mark(&self.graph, Signal::SelectedFeatures);
        self.flush(batch).await;
    }

    /// Re-read the data without changing any input
    pub async fn refresh(&mut self) {
        let mut batch = ChangeBatch::new();
        batch.mark(&self.graph, Signal::Refresh);
        self.flush(batch).await;
    }

    pub fn begin_inference(&mut self) -> Result<(), TriggerBusy> {
        self.state.trigger.begin()
    }

    /// Apply a finished inference call. A successful call advances the
    /// counter and the figures are recomputed before this returns.
    pub async fn finish_inference(&mut self, result: Result<InferenceResponse, InferenceError>) {
        if !self.state.trigger.complete(result) {
            return;
        }

        let mut batch = ChangeBatch::new();
        batch.mark(&self.graph, Signal::InferenceTrigger);
        self.flush(batch).await;
    }

    /// Re-enable the control after an in-flight call was dropped
    pub fn abandon_inference(&mut self) {
        self.state.trigger.abandon();
    }

    pub fn inference_in_flight(&self) -> bool {
        self.state.trigger.in_flight()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            lookback_hours: self.state.lookback_hours,
            features: self.state.features.clone(),
            shared_xaxis_range: self.state.axis_range,
            inference_trigger: self.state.trigger.counter().value(),
            inference_status: self.state.trigger.status_text().to_string(),
            inference_outcome: self.state.trigger.outcome().cloned(),
            predict_disabled: self.state.trigger.in_flight(),
            views: self.state.views.clone(),
        }
    }

    async fn flush(&mut self, mut batch: ChangeBatch) {
        if batch.is_empty() {
            return;
        }
        while let Some(reaction) = batch.next() {
            tracing::debug!(session = %self.id, ?reaction, "Running reaction");
            match reaction {
                Reaction::SyncAxisRange => {
                    let fired = batch
                        .last_fired(&RELAYOUT_SIGNALS)
                        .and_then(signal_plot)
                        .and_then(|plot| self.state.relayouts.get(&plot));

                    let range = reconcile_axis_range(self.state.axis_range, fired);
                    if range != self.state.axis_range {
                        self.state.axis_range = range;
                        batch.mark(&self.graph, Signal::SharedAxisRange);
                    }
                }
                Reaction::UpdateFigures => {
                    let views = self
                        .synchronizer
                        .recompute(ViewInputs {
                            lookback_hours: self.state.lookback_hours,
                            features: &self.state.features,
                            range: &self.state.axis_range,
                        })
                        .await;
                    self.state.views = Some(views);
                }
            }
        }
    }
}
