//! Research dashboard figures
//!
//! Each figure is a plotting-library description (`data`, `layout`, `config`)
//! handed to a [`ChartRenderer`] under its container id.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{error, info};

const FONT_FAMILY: &str = "Inter, sans-serif";
const TITLE_COLOR: &str = "#2c3e50";
const TRANSPARENT: &str = "rgba(0,0,0,0)";
const HIGHLIGHT: &str = "#e74c3c";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
    pub config: Value,
}

/// The plotting collaborator
pub trait ChartRenderer {
    fn new_plot(&mut self, container_id: &str, figure: &Figure) -> Result<()>;
}

/// Collects figures keyed by container id, for writing out as one JSON document
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FigureBundle {
    figures: BTreeMap<String, Figure>,
}

impl FigureBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, container_id: &str) -> Option<&Figure> {
        self.figures.get(container_id)
    }

    pub fn len(&self) -> usize {
        self.figures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize figures")
    }
}

impl ChartRenderer for FigureBundle {
    fn new_plot(&mut self, container_id: &str, figure: &Figure) -> Result<()> {
        if container_id.is_empty() {
            bail!("Empty chart container id");
        }
        self.figures.insert(container_id.to_string(), figure.clone());
        Ok(())
    }
}

/// Shared by every figure
pub fn chart_config() -> Value {
    json!({
        "responsive": true,
        "displayModeBar": true,
        "modeBarButtonsToRemove": ["pan2d", "lasso2d", "select2d"],
        "displaylogo": false
    })
}

fn title(text: &str) -> Value {
    json!({
        "text": text,
        "font": { "size": 18, "color": TITLE_COLOR, "family": FONT_FAMILY }
    })
}

fn axis(title: &str, tick_size: u32) -> Value {
    json!({
        "title": title,
        "titlefont": { "size": 14, "color": "#7f8c8d" },
        "tickfont": { "size": tick_size, "color": "#34495e" }
    })
}

fn base_layout(chart_title: &str, margin: [u32; 4]) -> Value {
    let [l, r, t, b] = margin;
    json!({
        "title": title(chart_title),
        "plot_bgcolor": TRANSPARENT,
        "paper_bgcolor": TRANSPARENT,
        "margin": { "l": l, "r": r, "t": t, "b": b },
        "font": { "family": FONT_FAMILY }
    })
}

fn bar_trace(x: &[&str], y: &[f64], colors: &[&str], text: Vec<String>, text_size: u32, hover: &str) -> Value {
    json!({
        "x": x,
        "y": y,
        "type": "bar",
        "marker": { "color": colors, "line": { "color": "white", "width": 2 } },
        "text": text,
        "textposition": "outside",
        "textfont": { "size": text_size, "color": "white", "family": FONT_FAMILY },
        "hovertemplate": hover
    })
}

fn percent_labels(values: &[f64]) -> Vec<String> {
    values.iter().map(|v| format!("{v:.1}%")).collect()
}

fn set(layout: &mut Value, key: &str, value: Value) {
    if let Some(map) = layout.as_object_mut() {
        map.insert(key.to_string(), value);
    }
}

/// Screening uptake by opportunity status
pub fn opportunity_chart() -> Figure {
    let y = [14.0, 12.6, 66.4];
    let data = vec![bar_trace(
        &["Given Opportunity", "Self Initiative", "Overall Access Rate"],
        &y,
        &["#e74c3c", "#3498db", "#27ae60"],
        percent_labels(&y),
        16,
        "<b>%{x}</b><br>Rate: %{y}%<br><extra></extra>",
    )];

    let mut layout = base_layout("Critical Gap: Opportunity vs Action", [60, 40, 60, 60]);
    set(&mut layout, "xaxis", axis("Screening Category", 12));
    let mut yaxis = axis("Percentage (%)", 12);
    set(&mut yaxis, "range", json!([0, 70]));
    set(&mut layout, "yaxis", yaxis);

    Figure {
        data,
        layout,
        config: chart_config(),
    }
}

/// Study population donut
pub fn age_chart() -> Figure {
    let data = vec![json!({
        "values": [45, 32, 23],
        "labels": ["18-20 years", "21-23 years", "24+ years"],
        "type": "pie",
        "hole": 0.6,
        "marker": {
            "colors": ["#3498db", "#e74c3c", "#27ae60"],
            "line": { "color": "white", "width": 3 }
        },
        "textposition": "outside",
        "textfont": { "size": 14, "color": TITLE_COLOR, "family": FONT_FAMILY },
        "hovertemplate": "<b>%{label}</b><br>Count: %{value}%<br>Percentage: %{percent}<br><extra></extra>"
    })];

    let mut layout = base_layout("Study Population by Age Groups", [40, 40, 60, 40]);
    set(
        &mut layout,
        "annotations",
        json!([{
            "text": "<b>354</b><br>Total<br>Participants",
            "font": { "size": 16, "color": TITLE_COLOR, "family": FONT_FAMILY },
            "showarrow": false,
            "x": 0.5,
            "y": 0.5
        }]),
    );

    Figure {
        data,
        layout,
        config: chart_config(),
    }
}

/// Awareness vs uptake
pub fn awareness_chart() -> Figure {
    let y = [39.8, 13.6, 26.2];
    let data = vec![bar_trace(
        &["Awareness Rate", "Screening Uptake", "Gap"],
        &y,
        &["#f39c12", "#e74c3c", "#95a5a6"],
        percent_labels(&y),
        16,
        "<b>%{x}</b><br>Rate: %{y}%<br><extra></extra>",
    )];

    let mut layout = base_layout("Knowledge-Action Gap Analysis", [60, 40, 60, 60]);
    set(&mut layout, "xaxis", axis("Metric Category", 12));
    let mut yaxis = axis("Percentage (%)", 12);
    set(&mut yaxis, "range", json!([0, 45]));
    set(&mut layout, "yaxis", yaxis);
    set(
        &mut layout,
        "annotations",
        json!([{
            "x": "Gap",
            "y": 28,
            "text": "Critical Gap<br>to Address",
            "showarrow": true,
            "arrowhead": 2,
            "arrowcolor": HIGHLIGHT,
            "font": { "color": HIGHLIGHT, "size": 12 }
        }]),
    );

    Figure {
        data,
        layout,
        config: chart_config(),
    }
}

/// Risk ratios from the modified Poisson regression
pub fn regression_chart() -> Figure {
    let y = [1.2, 0.9, 1.5, 1.3, 2.1, 3.2];
    let mut trace = bar_trace(
        &[
            "Age (21-23 vs 18-20)",
            "Age (24+ vs 18-20)",
            "Institution Type",
            "Previous Education",
            "Awareness Level",
            "Opportunity Given",
        ],
        &y,
        &["#3498db", "#95a5a6", "#27ae60", "#f39c12", "#9b59b6", "#e74c3c"],
        y.iter().map(|v| format!("RR: {v:.1}")).collect(),
        12,
        "<b>%{x}</b><br>Risk Ratio: %{y}<br><extra></extra>",
    );
    set(&mut trace, "orientation", json!("v"));

    let mut layout = base_layout("Risk Ratios from Modified Poisson Regression", [60, 40, 60, 120]);
    let mut xaxis = axis("Predictor Variables", 10);
    set(&mut xaxis, "tickangle", json!(-45));
    set(&mut layout, "xaxis", xaxis);
    let mut yaxis = axis("Risk Ratio (RR)", 12);
    set(&mut yaxis, "range", json!([0, 3.5]));
    set(&mut layout, "yaxis", yaxis);

    // Reference line at RR = 1 across all six bars
    set(
        &mut layout,
        "shapes",
        json!([{
            "type": "line",
            "x0": -0.5,
            "x1": 5.5,
            "y0": 1,
            "y1": 1,
            "line": { "color": HIGHLIGHT, "width": 2, "dash": "dash" }
        }]),
    );
    set(
        &mut layout,
        "annotations",
        json!([
            {
                "x": 2.5,
                "y": 1.1,
                "text": "RR = 1 (No Effect)",
                "showarrow": false,
                "font": { "color": HIGHLIGHT, "size": 12 }
            },
            {
                "x": 5,
                "y": 3.4,
                "text": "Strongest<br>Predictor",
                "showarrow": true,
                "arrowhead": 2,
                "arrowcolor": HIGHLIGHT,
                "font": { "color": HIGHLIGHT, "size": 12 }
            }
        ]),
    );

    Figure {
        data: vec![trace],
        layout,
        config: chart_config(),
    }
}

/// Participant counts from opportunity status to screening uptake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SankeyFlows {
    pub opportunity_uptake: u64,
    pub opportunity_no_uptake: u64,
    pub no_opportunity_uptake: u64,
    pub no_opportunity_no_uptake: u64,
}

/// Percentages derived from [`SankeyFlows`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConversionRates {
    /// Screened among those given the opportunity
    pub given_opportunity: f64,
    /// Screened without being given the opportunity
    pub self_initiative: f64,
    /// Share of participants given the opportunity
    pub access_rate: f64,
}

impl SankeyFlows {
    pub fn total(&self) -> u64 {
        self.opportunity_uptake
            + self.opportunity_no_uptake
            + self.no_opportunity_uptake
            + self.no_opportunity_no_uptake
    }

    pub fn rates(&self) -> ConversionRates {
        let given = self.opportunity_uptake + self.opportunity_no_uptake;
        let not_given = self.no_opportunity_uptake + self.no_opportunity_no_uptake;
        let percent = |part: u64, whole: u64| {
            if whole == 0 {
                0.0
            } else {
                part as f64 / whole as f64 * 100.0
            }
        };

        ConversionRates {
            given_opportunity: percent(self.opportunity_uptake, given),
            self_initiative: percent(self.no_opportunity_uptake, not_given),
            access_rate: percent(given, self.total()),
        }
    }
}

impl FromStr for SankeyFlows {
    type Err = anyhow::Error;

    /// `A,B,C,D`: yes/yes, yes/no, no/yes, no/no
    fn from_str(s: &str) -> Result<Self> {
        let counts = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid flow count: '{}'", part.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        let [a, b, c, d] = counts[..] else {
            bail!("Expected four comma-separated counts, got {}", counts.len());
        };
        Ok(Self {
            opportunity_uptake: a,
            opportunity_no_uptake: b,
            no_opportunity_uptake: c,
            no_opportunity_no_uptake: d,
        })
    }
}

pub fn sankey_chart(flows: &SankeyFlows) -> Figure {
    let rates = flows.rates();
    let data = vec![json!({
        "type": "sankey",
        "node": {
            "pad": 20,
            "thickness": 25,
            "line": { "color": "black", "width": 2 },
            "label": ["Given Opportunity: Yes", "Given Opportunity: No", "Uptake: Yes", "Uptake: No"],
            "color": ["#3498db", "#e74c3c", "#2ecc71", "#f39c12"],
            "hovertemplate": "<b>%{label}</b><br>Count: %{value}<extra></extra>"
        },
        "link": {
            "source": [0, 0, 1, 1],
            "target": [2, 3, 2, 3],
            "value": [
                flows.opportunity_uptake,
                flows.opportunity_no_uptake,
                flows.no_opportunity_uptake,
                flows.no_opportunity_no_uptake
            ],
            "color": [
                "rgba(52, 152, 219, 0.7)",
                "rgba(52, 152, 219, 0.5)",
                "rgba(231, 76, 60, 0.7)",
                "rgba(231, 76, 60, 0.5)"
            ],
            "hovertemplate": "<b>%{source.label}</b> → <b>%{target.label}</b><br>Count: %{value}<extra></extra>"
        }
    })];

    let mut layout = base_layout("Screening Uptake Pathway: From Opportunity to Action", [60, 60, 80, 60]);
    set(&mut layout, "height", json!(500));
    set(
        &mut layout,
        "annotations",
        json!([{
            "text": format!(
                "Given Opportunity: {:.1}%<br>Self Initiative: {:.1}%<br>Access Rate: {:.1}%",
                rates.given_opportunity, rates.self_initiative, rates.access_rate
            ),
            "showarrow": false,
            "x": 1,
            "y": 0,
            "xref": "paper",
            "yref": "paper",
            "align": "right"
        }]),
    );

    Figure {
        data,
        layout,
        config: chart_config(),
    }
}

/// Container id and figure for every literal dashboard chart
pub fn dashboard_figures() -> Vec<(&'static str, Figure)> {
    vec![
        ("opportunityChart", opportunity_chart()),
        ("ageChart", age_chart()),
        ("awarenessChart", awareness_chart()),
        ("regressionChart", regression_chart()),
    ]
}

/// Render every dashboard chart; a failing container is logged and skipped.
/// Returns how many rendered.
pub fn initialize_charts<R: ChartRenderer + ?Sized>(renderer: &mut R) -> usize {
    let mut rendered = 0;
    for (container, figure) in dashboard_figures() {
        match renderer.new_plot(container, &figure) {
            Ok(()) => rendered += 1,
            Err(e) => error!(container, error = %e, "Failed to render chart"),
        }
    }
    info!(rendered, "Dashboard charts initialized");
    rendered
}
