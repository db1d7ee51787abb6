use geo::{MultiPolygon, Point};

/// Sentinel borough selection meaning "no local narrowing".
pub const ALL_BOROUGHS: &str = "ALL";

#[derive(Debug, Clone, PartialEq)]
pub struct ComplaintRecord {
    pub complaint_type: String,
    pub descriptor: String,
    pub borough: Option<String>,
    // x = longitude, y = latitude
    pub point: Option<Point<f64>>,
}

#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    pub neighborhood: String,
    pub borough: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoroughFilter {
    All,
    Only(String),
}

impl BoroughFilter {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case(ALL_BOROUGHS) {
            BoroughFilter::All
        } else {
            BoroughFilter::Only(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub complaint_type: String,
    pub borough: BoroughFilter,
}

impl FilterState {
    pub fn new(complaint_type: &str, borough: &str) -> Self {
        Self {
            complaint_type: complaint_type.to_string(),
            borough: BoroughFilter::parse(borough),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sentinel_is_case_insensitive() {
        assert_eq!(BoroughFilter::parse("ALL"), BoroughFilter::All);
        assert_eq!(BoroughFilter::parse("all"), BoroughFilter::All);
        assert_eq!(
            BoroughFilter::parse("Brooklyn"),
            BoroughFilter::Only("Brooklyn".to_string())
        );
        assert_eq!(BoroughFilter::parse(""), BoroughFilter::Only(String::new()));
    }
}
