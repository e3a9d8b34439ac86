// Dashboard service - Use cases for driving dashboard sessions
use crate::application::inference_trigger::{InferenceTriggerController, TriggerBusy};
use crate::application::session::{Session, SessionSnapshot};
use crate::application::view_synchronizer::ViewSynchronizer;
use crate::domain::axis_range::{PlotId, RelayoutEvent};
use crate::domain::feature::SelectedFeatures;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Busy(#[from] TriggerBusy),
}

/// A registered session and when it was last used
struct SessionSlot {
    session: Mutex<Session>,
    last_touched: std::sync::Mutex<Instant>,
}

impl SessionSlot {
    fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
            last_touched: std::sync::Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_touched.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Idle past the timeout and not doing anything right now
    fn is_stale(&self, idle_timeout: Duration) -> bool {
        let idle = self
            .last_touched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed();
        if idle < idle_timeout {
            return false;
        }
        match self.session.try_lock() {
            Ok(session) => !session.inference_in_flight(),
            Err(_) => false,
        }
    }
}

/// Re-enables a session's control when the trigger future is dropped
/// before the inference call returns.
struct InFlightGuard {
    id: Uuid,
    slot: Option<Arc<SessionSlot>>,
}

impl InFlightGuard {
    fn new(id: Uuid, slot: Arc<SessionSlot>) -> Self {
        Self {
            id,
            slot: Some(slot),
        }
    }

    fn disarm(mut self) {
        self.slot = None;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let id = self.id;
        runtime.spawn(async move {
            tracing::warn!(session = %id, "Inference request dropped before completion");
            slot.session.lock().await.abandon_inference();
        });
    }
}

#[derive(Clone)]
pub struct DashboardService {
    synchronizer: ViewSynchronizer,
    trigger: InferenceTriggerController,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<SessionSlot>>>>,
    idle_timeout: Duration,
}

impl DashboardService {
    pub fn new(
        synchronizer: ViewSynchronizer,
        trigger: InferenceTriggerController,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            synchronizer,
            trigger,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Create and render a new session, evicting idle ones first
    pub async fn create_session(&self) -> SessionSnapshot {
        let mut session = Session::new(self.synchronizer.clone());
        session.initialize().await;
        let snapshot = session.snapshot();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|id, slot| {
            let stale = slot.is_stale(self.idle_timeout);
            if stale {
                tracing::info!(session = %id, "Evicting idle session");
            }
            !stale
        });

        tracing::info!(session = %snapshot.id, active = sessions.len() + 1, "Session created");
        sessions.insert(snapshot.id, Arc::new(SessionSlot::new(session)));
        snapshot
    }

    pub async fn close_session(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| tracing::info!(session = %id, "Session closed"))
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let slot = self.session(id).await?;
        let session = slot.session.lock().await;
        Ok(session.snapshot())
    }

    pub async fn relayout(
        &self,
        id: Uuid,
        plot: PlotId,
        event: RelayoutEvent,
    ) -> Result<SessionSnapshot, SessionError> {
        let slot = self.session(id).await?;
        let mut session = slot.session.lock().await;
        session.relayout(plot, event).await;
        Ok(session.snapshot())
    }

    pub async fn set_lookback(
        &self,
        id: Uuid,
        hours: Option<i64>,
    ) -> Result<SessionSnapshot, SessionError> {
        let slot = self.session(id).await?;
        let mut session = slot.session.lock().await;
        session.set_lookback(hours).await;
        Ok(session.snapshot())
    }

    pub async fn set_features(
        &self,
        id: Uuid,
        features: SelectedFeatures,
    ) -> Result<SessionSnapshot, SessionError> {
        let slot = self.session(id).await?;
        let mut session = slot.session.lock().await;
        session.set_features(features).await;
        Ok(session.snapshot())
    }

    pub async fn refresh(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let slot = self.session(id).await?;
        let mut session = slot.session.lock().await;
        session.refresh().await;
        Ok(session.snapshot())
    }

    /// Run one inference for a session. The session lock is released while
    /// the remote call is outstanding so the rest of the dashboard stays
    /// responsive; the disabled control keeps a second trigger out.
    pub async fn trigger_inference(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let slot = self.session(id).await?;
        slot.session.lock().await.begin_inference()?;
        let guard = InFlightGuard::new(id, slot.clone());

        let result = self.trigger.trigger().await;

        let mut session = slot.session.lock().await;
        guard.disarm();
        session.finish_inference(result).await;
        slot.touch();
        Ok(session.snapshot())
    }

    async fn session(&self, id: Uuid) -> Result<Arc<SessionSlot>, SessionError> {
        let slot = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))?;
        slot.touch();
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::inference_trigger::{InferenceClient, InferenceError};
    use crate::application::view_synchronizer::tests::StubDataManager;
    use crate::domain::inference::InferenceResponse;
    use crate::domain::lookback::LookbackWindow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    const HOUR: Duration = Duration::from_secs(3600);

    fn success() -> InferenceResponse {
        InferenceResponse {
            status: "success".to_string(),
            timestamp: Some("2024-01-01T10:00:00".to_string()),
            message: None,
        }
    }

    /// Client that waits for a go signal before answering
    struct GatedClient {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl InferenceClient for GatedClient {
        async fn run_inference(&self) -> Result<InferenceResponse, InferenceError> {
            self.gate.notified().await;
            Ok(success())
        }
    }

    /// Client whose first call never returns
    #[derive(Default)]
    struct StallingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InferenceClient for StallingClient {
        async fn run_inference(&self) -> Result<InferenceResponse, InferenceError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            Ok(success())
        }
    }

    fn service_with(client: Arc<dyn InferenceClient>, idle_timeout: Duration) -> DashboardService {
        let synchronizer = ViewSynchronizer::new(
            Arc::new(StubDataManager::with_hours(48)),
            LookbackWindow::new(24).unwrap(),
        );
        DashboardService::new(
            synchronizer,
            InferenceTriggerController::new(client),
            idle_timeout,
        )
    }

    fn service(gate: Arc<Notify>) -> DashboardService {
        service_with(Arc::new(GatedClient { gate }), HOUR)
    }

    async fn wait_for_predict_disabled(svc: &DashboardService, id: Uuid, disabled: bool) {
        loop {
            if svc.snapshot(id).await.unwrap().predict_disabled == disabled {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let svc = service(Arc::new(Notify::new()));
        let id = Uuid::new_v4();
        assert_eq!(svc.snapshot(id).await.unwrap_err(), SessionError::NotFound(id));
        assert_eq!(svc.close_session(id).await.unwrap_err(), SessionError::NotFound(id));
    }

    #[tokio::test]
    async fn test_session_usable_while_inference_in_flight() {
        let gate = Arc::new(Notify::new());
        let svc = service(gate.clone());
        let id = svc.create_session().await.id;

        let in_flight = tokio::spawn({
            let svc = svc.clone();
            async move { svc.trigger_inference(id).await }
        });
        wait_for_predict_disabled(&svc, id, true).await;

        let snapshot = svc.set_lookback(id, Some(6)).await.unwrap();
        assert_eq!(snapshot.inference_trigger, 0);
        assert_eq!(
            svc.trigger_inference(id).await.unwrap_err(),
            SessionError::Busy(TriggerBusy)
        );

        gate.notify_one();
        let snapshot = in_flight.await.unwrap().unwrap();
        assert_eq!(snapshot.inference_trigger, 1);
        assert!(!snapshot.predict_disabled);
        assert_eq!(snapshot.lookback_hours, Some(6));
    }

    #[tokio::test]
    async fn test_dropped_trigger_reenables_control() {
        let svc = service_with(Arc::new(StallingClient::default()), HOUR);
        let id = svc.create_session().await.id;

        let stalled = tokio::spawn({
            let svc = svc.clone();
            async move { svc.trigger_inference(id).await }
        });
        wait_for_predict_disabled(&svc, id, true).await;

        stalled.abort();
        assert!(stalled.await.unwrap_err().is_cancelled());
        wait_for_predict_disabled(&svc, id, false).await;

        let snapshot = svc.snapshot(id).await.unwrap();
        assert_eq!(snapshot.inference_trigger, 0);
        assert_eq!(snapshot.inference_status, "Error: inference request cancelled");

        let snapshot = svc.trigger_inference(id).await.unwrap();
        assert_eq!(snapshot.inference_trigger, 1);
        assert!(!snapshot.predict_disabled);
    }

    #[tokio::test]
    async fn test_idle_sessions_evicted_on_create() {
        let svc = service_with(Arc::new(StallingClient::default()), Duration::ZERO);
        let first = svc.create_session().await.id;
        let second = svc.create_session().await.id;

        assert_eq!(svc.snapshot(first).await.unwrap_err(), SessionError::NotFound(first));
        assert!(svc.snapshot(second).await.is_ok());
    }

    #[tokio::test]
    async fn test_recent_sessions_survive_create() {
        let svc = service(Arc::new(Notify::new()));
        let first = svc.create_session().await.id;
        let second = svc.create_session().await.id;

        assert!(svc.snapshot(first).await.is_ok());
        assert!(svc.snapshot(second).await.is_ok());
    }

    #[tokio::test]
    async fn test_session_with_inference_in_flight_is_not_evicted() {
        let gate = Arc::new(Notify::new());
        let svc = service_with(Arc::new(GatedClient { gate: gate.clone() }), Duration::ZERO);
        let id = svc.create_session().await.id;

        let in_flight = tokio::spawn({
            let svc = svc.clone();
            async move { svc.trigger_inference(id).await }
        });
        wait_for_predict_disabled(&svc, id, true).await;

        svc.create_session().await;
        gate.notify_one();
        let snapshot = in_flight.await.unwrap().unwrap();
        assert_eq!(snapshot.inference_trigger, 1);
        assert!(svc.snapshot(id).await.is_ok());
    }
}
