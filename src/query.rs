use crate::config::AppConfig;
use crate::data;
use crate::types::{ComplaintRecord, FilterState};
use anyhow::{Context, Result};
use reqwest::{Client, Url};

/// A filtered request against the complaints dataset.
///
/// Only the complaint category is sent upstream. Borough narrowing is done
/// locally once the rows arrive (see `processing::filter_by_borough`).
#[derive(Debug, Clone, PartialEq)]
pub struct ComplaintQuery {
    pub base_url: String,
    pub complaint_type: String,
    pub year: i32,
    pub limit: u32,
}

impl ComplaintQuery {
    pub fn new(config: &AppConfig, filter: &FilterState) -> Self {
        Self {
            base_url: config.source.complaints_url.clone(),
            complaint_type: filter.complaint_type.clone(),
            year: config.query.year,
            limit: config.query.limit,
        }
    }

    /// Start (inclusive) and end of the creation-date window, ISO-8601.
    pub fn date_window(&self) -> (String, String) {
        (
            format!("{:04}-01-01T00:00:00", self.year),
            format!("{:04}-01-01T00:00:00", self.year + 1),
        )
    }

    pub fn where_clause(&self) -> String {
        let (start, end) = self.date_window();
        format!("created_date between '{}' and '{}'", start, end)
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("$where", self.where_clause()),
            ("complaint_type", self.complaint_type.clone()),
            ("$limit", self.limit.to_string()),
        ]
    }

    pub fn url(&self) -> Result<Url> {
        Url::parse_with_params(&self.base_url, self.params())
            .with_context(|| format!("Invalid complaints endpoint: {}", self.base_url))
    }
}

pub async fn fetch_complaints(client: &Client, query: &ComplaintQuery) -> Result<Vec<ComplaintRecord>> {
    let url = query.url()?;
    tracing::info!(%url, "requesting complaints");

    let rows: Vec<serde_json::Value> = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to reach complaints endpoint: {}", url))?
        .error_for_status()
        .with_context(|| format!("Complaints endpoint returned an error: {}", url))?
        .json()
        .await
        .context("Complaints response was not a JSON array")?;

    let records = data::normalize_complaints(rows);
    tracing::info!(rows = records.len(), "complaints received");
    Ok(records)
}
