//! Page behaviors: clickable rows and the rating chart.
//!
//! Both behaviors run once at page start and are independent: row
//! navigation never waits on the chart and a chart failure never unbinds
//! the rows. The document and the charting engine sit behind narrow
//! traits so the logic here is plain data flow, testable without a
//! rendering environment.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::model::RatingSample;

/// Class marking a table row as a navigation target.
pub const CLICKABLE_ROW_CLASS: &str = "clickable-row";
/// Attribute holding the row's destination URL.
pub const ROW_TARGET_ATTR: &str = "data-href";
/// Element the chart renders into; pages without it get no chart.
pub const CHART_MOUNT_ID: &str = "ratingChart";
/// Element whose text content is the rating-sample JSON array.
pub const RATING_DATA_ID: &str = "ratingData";

const MEAN_COLOR: &str = "#3498db";
const MEAN_FILL: &str = "rgba(52, 152, 219, 0.1)";
const BAND_FILL: &str = "rgba(52, 152, 219, 0.05)";
const INVISIBLE: &str = "rgba(0,0,0,0)";

/// Opaque element handle minted by the page implementation.
pub type NodeId = u64;

/// Read-only view of a rendered document.
pub trait PageQuery {
    fn elements_with_class(&self, class: &str) -> Vec<NodeId>;
    fn element_by_id(&self, id: &str) -> Option<NodeId>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn text_content(&self, node: NodeId) -> Option<String>;
}

/// Full-page navigation; terminal for the current page.
pub trait Navigator {
    fn assign_location(&mut self, url: &str);
}

/// The external charting engine.
pub trait ChartHost {
    fn construct(&mut self, mount: NodeId, spec: &ChartSpec) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Row navigation
// ---------------------------------------------------------------------------

/// Click bindings for every row tagged clickable at install time.
///
/// The destination is read per click, not captured at install, so a page
/// that rewrites the attribute after load navigates to the new target.
pub struct RowNavigator {
    rows: Vec<NodeId>,
}

impl RowNavigator {
    pub fn install(page: &dyn PageQuery) -> Self {
        Self { rows: page.elements_with_class(CLICKABLE_ROW_CLASS) }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_bound(&self, node: NodeId) -> bool {
        self.rows.contains(&node)
    }

    /// Dispatch a click. Rows without a destination are a silent no-op,
    /// as are clicks on nodes this navigator never bound.
    pub fn click(&self, page: &dyn PageQuery, nav: &mut dyn Navigator, node: NodeId) {
        if !self.is_bound(node) {
            return;
        }
        if let Some(url) = page.attribute(node, ROW_TARGET_ATTR) {
            if !url.is_empty() {
                nav.assign_location(&url);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Chart series and spec
// ---------------------------------------------------------------------------

/// Aligned series derived from the rating samples, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub mean: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

impl ChartSeries {
    pub fn derive(samples: &[RatingSample]) -> Self {
        let mut labels = Vec::with_capacity(samples.len());
        let mut mean = Vec::with_capacity(samples.len());
        let mut upper = Vec::with_capacity(samples.len());
        let mut lower = Vec::with_capacity(samples.len());
        for s in samples {
            labels.push(format!("#{}", s.match_no));
            mean.push(s.mu);
            upper.push(s.mu + s.sigma);
            lower.push(s.mu - s.sigma);
        }
        Self { labels, mean, upper, lower }
    }
}

/// Line-chart configuration in the charting engine's constructor shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    pub fill: Fill,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<u32>,
}

/// Area fill for a dataset: on/off, or anchored to another dataset by
/// relative index ("-1" is the dataset drawn just before this one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fill {
    Toggle(bool),
    Anchor(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub responsive: bool,
    pub scales: Scales,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scales {
    pub y: AxisOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisOptions {
    pub begin_at_zero: bool,
}

/// Three overlapping datasets: the mean line, an invisible upper line
/// whose fill shades down to the mean, and an invisible lower line with
/// no fill of its own. Only the mean-to-upper band is shaded.
pub fn rating_chart_spec(series: &ChartSeries) -> ChartSpec {
    ChartSpec {
        kind: "line".to_string(),
        data: ChartData {
            labels: series.labels.clone(),
            datasets: vec![
                Dataset {
                    label: "Rating (μ)".to_string(),
                    data: series.mean.clone(),
                    border_color: MEAN_COLOR.to_string(),
                    background_color: Some(MEAN_FILL.to_string()),
                    tension: Some(0.3),
                    fill: Fill::Toggle(true),
                    point_radius: Some(4),
                },
                Dataset {
                    label: "Upper Bound (μ + σ)".to_string(),
                    data: series.upper.clone(),
                    border_color: INVISIBLE.to_string(),
                    background_color: Some(BAND_FILL.to_string()),
                    tension: None,
                    fill: Fill::Anchor("-1".to_string()),
                    point_radius: None,
                },
                Dataset {
                    label: "Lower Bound (μ - σ)".to_string(),
                    data: series.lower.clone(),
                    border_color: INVISIBLE.to_string(),
                    background_color: None,
                    tension: None,
                    fill: Fill::Toggle(false),
                    point_radius: None,
                },
            ],
        },
        options: ChartOptions {
            responsive: true,
            // Ratings live far from zero; let the axis follow the data.
            scales: Scales { y: AxisOptions { begin_at_zero: false } },
        },
    }
}

/// Render the rating chart if the page carries a mount point.
///
/// A missing mount is the normal "no chart on this view" case and returns
/// Ok(false). A missing data element or unparseable payload is an error:
/// the data is produced by our own templates, so breakage there should be
/// loud, not papered over.
pub fn render_rating_chart(page: &dyn PageQuery, host: &mut dyn ChartHost) -> Result<bool> {
    let Some(mount) = page.element_by_id(CHART_MOUNT_ID) else {
        return Ok(false);
    };
    let data_el = page
        .element_by_id(RATING_DATA_ID)
        .ok_or_else(|| anyhow!("element #{} not found", RATING_DATA_ID))?;
    let raw = page.text_content(data_el).unwrap_or_default();
    let samples: Vec<RatingSample> = serde_json::from_str(&raw)?;
    let spec = rating_chart_spec(&ChartSeries::derive(&samples));
    host.construct(mount, &spec)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Page start
// ---------------------------------------------------------------------------

/// Result of wiring a page: the installed row bindings, and the chart
/// outcome kept separate so one path failing never affects the other.
pub struct PageSetup {
    pub rows: RowNavigator,
    pub chart: Result<bool>,
}

/// Run both setup behaviors once. Each call produces an independent
/// setup; bindings are owned by the returned value, never accumulated in
/// shared state.
pub fn boot(page: &dyn PageQuery, host: &mut dyn ChartHost) -> PageSetup {
    PageSetup {
        rows: RowNavigator::install(page),
        chart: render_rating_chart(page, host),
    }
}
