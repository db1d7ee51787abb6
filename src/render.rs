use crate::config::MapConfig;
use crate::processing::{choose_color, located};
use crate::types::{BoundaryFeature, ComplaintRecord};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::MultiPolygon;
use serde::Serialize;

const STREET_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const STREET_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";
const TOPO_URL: &str = "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png";
const TOPO_ATTRIBUTION: &str = "Map data: &copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors, <a href=\"http://viewfinderpanoramas.org\">SRTM</a> | Map style: &copy; <a href=\"https://opentopomap.org\">OpenTopoMap</a> (<a href=\"https://creativecommons.org/licenses/by-sa/3.0/\">CC-BY-SA</a>)";

pub const STREET_MAP: &str = "Street Map";
pub const TOPO_MAP: &str = "Topographic Map";
pub const COMPLAINT_OVERLAY: &str = "Complaint";
pub const HEAT_OVERLAY: &str = "Heat Map";
pub const BOUNDARY_OVERLAY: &str = "NYC";

const OUTLINE_COLOR: &str = "white";
const OUTLINE_WEIGHT: f64 = 1.5;
const REST_FILL_OPACITY: f64 = 0.5;
const HOVER_FILL_OPACITY: f64 = 0.9;

/// Everything the page needs to draw one render cycle.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub base_layers: Vec<TileLayer>,
    pub markers: MarkerClusterLayer,
    pub heat: HeatLayer,
    pub boundaries: BoundaryOverlay,
    pub control: LayerControl,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileLayer {
    pub name: &'static str,
    pub url: &'static str,
    pub attribution: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerClusterLayer {
    pub active: bool,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub popup: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatLayer {
    pub active: bool,
    pub points: Vec<[f64; 2]>,
    pub radius: u32,
    pub blur: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundaryOverlay {
    pub active: bool,
    pub polygons: Vec<BoundaryPolygon>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundaryPolygon {
    pub neighborhood: String,
    pub borough: Option<String>,
    pub geometry: geojson::Geometry,
    pub style: PathStyle,
    /// Applied on pointer enter; `style` is restored on leave.
    pub hover_style: PathStyle,
    /// `[[south, west], [north, east]]`, the view a click fits to.
    pub bounds: Option<[[f64; 2]; 2]>,
    pub popup: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub color: &'static str,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerControl {
    pub base_layers: Vec<&'static str>,
    pub overlays: Vec<&'static str>,
}

pub fn build_map_view(
    config: &MapConfig,
    records: &[ComplaintRecord],
    boundaries: &[BoundaryFeature],
) -> MapView {
    let markers = build_markers(records);
    let heat = build_heat(config, records);
    let boundaries = build_boundaries(boundaries);
    tracing::info!(
        markers = markers.markers.len(),
        heat_points = heat.points.len(),
        polygons = boundaries.polygons.len(),
        "map view built"
    );

    MapView {
        center: config.center,
        zoom: config.zoom,
        base_layers: vec![
            TileLayer { name: STREET_MAP, url: STREET_URL, attribution: STREET_ATTRIBUTION, active: true },
            TileLayer { name: TOPO_MAP, url: TOPO_URL, attribution: TOPO_ATTRIBUTION, active: false },
        ],
        markers,
        heat,
        boundaries,
        control: LayerControl {
            base_layers: vec![STREET_MAP, TOPO_MAP],
            overlays: vec![COMPLAINT_OVERLAY, HEAT_OVERLAY, BOUNDARY_OVERLAY],
        },
    }
}

fn build_markers(records: &[ComplaintRecord]) -> MarkerClusterLayer {
    let markers = located(records)
        .map(|(record, pt)| Marker {
            lat: pt.y(),
            lng: pt.x(),
            popup: format!(
                "{}<hr>{}",
                escape_html(&record.descriptor),
                escape_html(record.borough.as_deref().unwrap_or_default())
            ),
        })
        .collect();
    MarkerClusterLayer { active: true, markers }
}

fn build_heat(config: &MapConfig, records: &[ComplaintRecord]) -> HeatLayer {
    HeatLayer {
        active: false,
        points: located(records).map(|(_, pt)| [pt.y(), pt.x()]).collect(),
        radius: config.heat_radius,
        blur: config.heat_blur,
    }
}

fn build_boundaries(features: &[BoundaryFeature]) -> BoundaryOverlay {
    let polygons = features
        .iter()
        .map(|feature| {
            let style = PathStyle {
                color: OUTLINE_COLOR,
                fill_color: choose_color(feature.borough.as_deref()),
                fill_opacity: REST_FILL_OPACITY,
                weight: OUTLINE_WEIGHT,
            };
            let bounds = fit_bounds(&feature.geometry);

            BoundaryPolygon {
                neighborhood: feature.neighborhood.clone(),
                borough: feature.borough.clone(),
                geometry: geojson::Geometry::new(geojson::Value::from(&feature.geometry)),
                style,
                hover_style: PathStyle { fill_opacity: HOVER_FILL_OPACITY, ..style },
                bounds,
                popup: format!(
                    "<h1>{}</h1> <hr> <h2>{}</h2>",
                    escape_html(&feature.neighborhood),
                    escape_html(feature.borough.as_deref().unwrap_or_default())
                ),
            }
        })
        .collect();
    BoundaryOverlay { active: true, polygons }
}

/// Leaflet-ordered `[[south, west], [north, east]]` for a polygon.
pub fn fit_bounds(geometry: &MultiPolygon<f64>) -> Option<[[f64; 2]; 2]> {
    geometry.bounding_rect()
        .map(|r| [[r.min().y, r.min().x], [r.max().y, r.max().x]])
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
