use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub query: QueryConfig,
    pub map: MapConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    pub complaints_url: String,
    pub boundaries: String, // URL or local GeoJSON path
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            complaints_url: "https://data.cityofnewyork.us/resource/fhrw-4uyv.json".to_string(),
            boundaries: "https://2u-data-curriculum-team.s3.amazonaws.com/dataviz-classroom/v1.1/15-Mapping-Web/nyc.geojson".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    /// Calendar year of the `created_date` window.
    pub year: i32,
    pub limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { year: 2022, limit: 10_000 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub center: [f64; 2], // [lat, lng]
    pub zoom: u8,
    pub heat_radius: u32,
    pub heat_blur: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [40.7128, -74.0059],
            zoom: 11,
            heat_radius: 20,
            heat_blur: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080, static_dir: PathBuf::from("static") }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
