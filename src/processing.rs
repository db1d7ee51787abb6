use crate::types::{BoroughFilter, ComplaintRecord};
use geo::Point;

pub const DEFAULT_COLOR: &str = "black";

/// Fill color for a boundary polygon, keyed on its borough label.
pub fn choose_color(borough: Option<&str>) -> &'static str {
    match borough {
        Some("Brooklyn") => "yellow",
        Some("Bronx") => "red",
        Some("Manhattan") => "orange",
        Some("Queens") => "green",
        Some("Staten Island") => "purple",
        _ => DEFAULT_COLOR,
    }
}

/// Keeps only records whose borough is exactly the selected one.
pub fn filter_by_borough(records: Vec<ComplaintRecord>, filter: &BoroughFilter) -> Vec<ComplaintRecord> {
    match filter {
        BoroughFilter::All => records,
        BoroughFilter::Only(borough) => {
            let before = records.len();
            let kept: Vec<ComplaintRecord> = records
                .into_iter()
                .filter(|r| r.borough.as_deref() == Some(borough.as_str()))
                .collect();
            tracing::info!(borough = %borough, before, after = kept.len(), "filtered by borough");
            kept
        }
    }
}

/// Records that can be placed on the map, paired with their point.
pub fn located(records: &[ComplaintRecord]) -> impl Iterator<Item = (&ComplaintRecord, Point<f64>)> {
    records.iter().filter_map(|r| r.point.map(|pt| (r, pt)))
}
