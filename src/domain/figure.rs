// Plot figure domain models, serialized in the Plotly figure JSON shape
use super::axis_range::SharedAxisRange;
use chrono::NaiveDateTime;
use serde::Serialize;

const FIGURE_HEIGHT: u32 = 330;
const BACKGROUND: &str = "#fff";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceMode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: TraceMode,
    pub name: String,
    pub x: Vec<NaiveDateTime>,
    pub y: Vec<f64>,
}

impl Trace {
    pub fn new(name: impl Into<String>, mode: TraceMode, points: Vec<(NaiveDateTime, f64)>) -> Self {
        let (x, y): (Vec<_>, Vec<_>) = points.into_iter().unzip();
        Self {
            kind: "scatter",
            mode,
            name: name.into(),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub template: &'static str,
    pub margin: Margin,
    pub height: u32,
    pub showlegend: bool,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    pub plot_bgcolor: &'static str,
    pub paper_bgcolor: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: AxisTitle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[NaiveDateTime; 2]>,
    pub autorange: bool,
}

impl Axis {
    fn auto(title: &str) -> Self {
        Self {
            title: AxisTitle {
                text: title.to_string(),
            },
            range: None,
            autorange: true,
        }
    }

    fn time(range: &SharedAxisRange) -> Self {
        let mut axis = Self::auto("Time");
        if let Some((lower, upper)) = range.bounds() {
            axis.range = Some([lower, upper]);
            axis.autorange = false;
        }
        axis
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationFont {
    pub size: u32,
}

/// Free text drawn in paper coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub xref: &'static str,
    pub yref: &'static str,
    pub showarrow: bool,
    pub font: AnnotationFont,
}

impl Figure {
    /// Empty figure whose time axis follows the shared range
    pub fn new(y_title: &str, range: &SharedAxisRange) -> Self {
        Self {
            data: Vec::new(),
            layout: Layout {
                template: "plotly_white",
                margin: Margin {
                    l: 40,
                    r: 40,
                    t: 20,
                    b: 20,
                },
                height: FIGURE_HEIGHT,
                showlegend: true,
                xaxis: Axis::time(range),
                yaxis: Axis::auto(y_title),
                annotations: Vec::new(),
                plot_bgcolor: BACKGROUND,
                paper_bgcolor: BACKGROUND,
            },
        }
    }

    /// Figure standing in for a plot that could not be built
    pub fn placeholder(reason: &str) -> Self {
        let mut figure = Self::new("Value", &SharedAxisRange::Auto);
        figure.layout.annotations.push(Annotation {
            text: format!("Error loading data: {}", reason),
            xref: "paper",
            yref: "paper",
            showarrow: false,
            font: AnnotationFont { size: 20 },
        });
        figure
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.data.push(trace);
        self
    }
}

#[cfg(test)]
impl Figure {
    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.data.iter().find(|t| t.name == name)
    }

    pub fn x_range(&self) -> Option<[NaiveDateTime; 2]> {
        self.layout.xaxis.range
    }
}
