// Shared time-axis range and plot relayout events
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// The two plot panes that share one zoom/pan state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotId {
    /// Predicted vs actual bike counts
    Predictions,
    /// Selected feature series
    Features,
}

/// Time-axis window displayed by both plots.
///
/// Either both bounds are set or the axis autoranges; a half-open range is
/// not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharedAxisRange {
    #[default]
    Auto,
    Window {
        lower: NaiveDateTime,
        upper: NaiveDateTime,
    },
}

impl SharedAxisRange {
    pub fn window(lower: NaiveDateTime, upper: NaiveDateTime) -> Self {
        Self::Window { lower, upper }
    }

    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match self {
            Self::Auto => None,
            Self::Window { lower, upper } => Some((*lower, *upper)),
        }
    }

    #[cfg(test)]
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

// Serialized as `null` or `[lower, upper]`, the shape plot front ends store
impl Serialize for SharedAxisRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bounds().serialize(serializer)
    }
}

/// What a relayout event means for the shared axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisChange {
    /// Manual zoom or pan to explicit bounds
    Zoom(NaiveDateTime, NaiveDateTime),
    /// Return to automatic range
    Autorange,
    /// Nothing axis-related (hover, legend toggle, ...)
    None,
}

/// A plot's `relayoutData` payload: a flat object of dotted layout keys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RelayoutEvent(pub Map<String, Value>);

impl RelayoutEvent {
    pub fn axis_change(&self) -> AxisChange {
        if let Some((lower, upper)) = self.explicit_bounds() {
            return AxisChange::Zoom(lower, upper);
        }

        if self.0.contains_key("xaxis.autorange") {
            return AxisChange::Autorange;
        }

        AxisChange::None
    }

    fn explicit_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let (lower, upper) = match (self.0.get("xaxis.range[0]"), self.0.get("xaxis.range[1]")) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ => match self.0.get("xaxis.range").and_then(Value::as_array) {
                Some(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
                _ => return None,
            },
        };

        Some((parse_bound(lower)?, parse_bound(upper)?))
    }
}

/// Parse an axis bound sent by the plot: a date-time string or epoch millis
pub fn parse_bound(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            let millis = n.as_f64()?;
            DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> RelayoutEvent {
        serde_json::from_value(value).unwrap()
    }

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn test_indexed_range_keys_are_a_zoom() {
        let e = event(json!({
            "xaxis.range[0]": "2024-01-01 08:00:00",
            "xaxis.range[1]": "2024-01-01 10:30:00.5"
        }));

        assert_eq!(
            e.axis_change(),
            AxisChange::Zoom(ts("2024-01-01T08:00:00"), ts("2024-01-01T10:30:00.5"))
        );
    }

    #[test]
    fn test_array_range_is_a_zoom() {
        let e = event(json!({ "xaxis.range": ["2024-01-01", "2024-01-02"] }));
        assert_eq!(
            e.axis_change(),
            AxisChange::Zoom(ts("2024-01-01T00:00:00"), ts("2024-01-02T00:00:00"))
        );
    }

    #[test]
    fn test_autorange_and_hover() {
        assert_eq!(
            event(json!({ "xaxis.autorange": true, "yaxis.autorange": true })).axis_change(),
            AxisChange::Autorange
        );
        assert_eq!(event(json!({ "dragmode": "pan" })).axis_change(), AxisChange::None);
        assert_eq!(RelayoutEvent::default().axis_change(), AxisChange::None);
    }

    #[test]
    fn test_single_bound_is_not_a_zoom() {
        let e = event(json!({ "xaxis.range[0]": "2024-01-01 08:00:00" }));
        assert_eq!(e.axis_change(), AxisChange::None);
    }

    #[test]
    fn test_unparseable_bound_is_ignored() {
        let e = event(json!({
            "xaxis.range[0]": "yesterday",
            "xaxis.range[1]": "2024-01-01 10:00:00"
        }));
        assert_eq!(e.axis_change(), AxisChange::None);
    }

    #[test]
    fn test_epoch_millis_bound() {
        assert_eq!(
            parse_bound(&json!(1_704_103_200_000_i64)),
            Some(ts("2024-01-01T10:00:00"))
        );
    }

    #[test]
    fn test_range_serializes_as_null_or_pair() {
        assert_eq!(serde_json::to_value(SharedAxisRange::Auto).unwrap(), Value::Null);

        let range = SharedAxisRange::window(ts("2024-01-01T08:00:00"), ts("2024-01-01T10:00:00"));
        assert_eq!(
            serde_json::to_value(range).unwrap(),
            json!(["2024-01-01T08:00:00", "2024-01-01T10:00:00"])
        );
    }
}
