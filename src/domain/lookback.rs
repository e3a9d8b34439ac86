// Lookback window domain model
use serde::Serialize;

/// Trailing hours of data rendered in both plots; always at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LookbackWindow(u32);

impl LookbackWindow {
    /// Returns `None` for anything below one hour
    pub fn new(hours: i64) -> Option<Self> {
        u32::try_from(hours).ok().filter(|h| *h >= 1).map(Self)
    }

    /// Missing or out-of-range input silently becomes the configured default
    pub fn resolve(raw: Option<i64>, default: LookbackWindow) -> Self {
        raw.and_then(Self::new).unwrap_or(default)
    }

    pub fn hours(&self) -> u32 {
        self.0
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.0))
    }
}
