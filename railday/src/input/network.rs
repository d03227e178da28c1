//! Network description as delivered by the importer.

use crate::railway::category::TrainCategory;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkDescription {
    pub stations: Vec<StationDescription>,
    #[serde(default)]
    pub rails: Vec<RailDescription>,
    pub trains: Vec<TrainDescription>,
    /// Overrides and additions to the default category table.
    #[serde(default)]
    pub categories: Vec<TrainCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationDescription {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_importance")]
    pub importance: f64,
}

fn default_importance() -> f64 { 1.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct RailDescription {
    pub from: String,
    pub to: String,
    /// Intermediate `[latitude, longitude]` points, endpoints excluded.
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
    /// One limit per segment in m/s; missing values fall back to the default speed.
    #[serde(default)]
    pub max_speeds: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainDescription {
    pub number: u32,
    pub category: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Vec<String>,
    pub stops: Vec<StopDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopDescription {
    pub station_name: String,
    #[serde(default)]
    pub track: Option<TrackDescription>,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub min_dwell: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackDescription {
    pub platform: u32,
    pub track: String,
}

impl NetworkDescription {
    pub fn from_json(s: &str) -> Result<NetworkDescription, serde_json::Error> {
        serde_json::from_str(s)
    }
}
