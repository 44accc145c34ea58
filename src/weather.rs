//! Current-conditions lookup against the Open-Meteo forecast API.
//!
//! Weather is best-effort enrichment: callers go through
//! [`lookup_or_default`], which turns any failure into an empty snapshot.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather service returned status {0}")]
    Status(u16),
}

/// Conditions at the moment of logging. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub weather_code: Option<i32>,
    pub utc_offset_seconds: Option<i32>,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError>;
}

pub async fn lookup_or_default(
    provider: &dyn WeatherProvider,
    latitude: f64,
    longitude: f64,
) -> WeatherSnapshot {
    match provider.current(latitude, longitude).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!("weather lookup failed, logging without weather: {err}");
            WeatherSnapshot::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: Option<i32>,
    #[serde(default)]
    current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    #[serde(default)]
    temperature_2m: Option<f64>,
    #[serde(default)]
    relative_humidity_2m: Option<f64>,
    #[serde(default)]
    weather_code: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct OpenMeteoClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,weather_code".to_string(),
                ),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(WeatherError::Status(resp.status().as_u16()));
        }

        let body: ForecastResponse = resp.json().await?;
        let current = body.current;
        Ok(WeatherSnapshot {
            temperature_c: current.as_ref().and_then(|c| c.temperature_2m),
            humidity_pct: current.as_ref().and_then(|c| c.relative_humidity_2m),
            weather_code: current.as_ref().and_then(|c| c.weather_code),
            utc_offset_seconds: body.utc_offset_seconds,
        })
    }
}
