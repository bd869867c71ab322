//! FRED API integration for policy-rate series (e.g. `FEDFUNDS`).

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 100000;

/// The effective federal funds rate, monthly.
pub const SERIES_FEDFUNDS: &str = "FEDFUNDS";

pub struct FredClient {
    client: Client,
    api_key: String,
}

impl FredClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("FRED_API_KEY")
            .map_err(|_| AppError::new(2, "Missing FRED_API_KEY in environment (.env)."))?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// Fetch a full series in ascending date order, values in percent.
    ///
    /// Missing observations (FRED's `.`) and unparseable dates are skipped and
    /// counted, the same way the CSV loader drops bad rows.
    pub fn fetch_series(
        &self,
        series_id: &str,
        observation_end: Option<NaiveDate>,
    ) -> Result<FetchedSeries, AppError> {
        let mut req = self.client.get(BASE_URL).query(&[
            ("series_id", series_id),
            ("api_key", &self.api_key),
            ("file_type", "json"),
            ("sort_order", "asc"),
            ("limit", &OBS_LIMIT.to_string()),
        ]);

        if let Some(date) = observation_end {
            req = req.query(&[("observation_end", &date.to_string())]);
        }

        debug!(series_id, "requesting FRED observations");
        let resp = req
            .send()
            .map_err(|e| AppError::new(4, format!("FRED request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("FRED request failed with status {}.", resp.status()),
            ));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse FRED response: {e}")))?;

        let fetched = parse_observations(body.observations);
        info!(
            series_id,
            observations = fetched.observations,
            rows = fetched.rows.len(),
            skipped = fetched.skipped,
            "fetched FRED series"
        );
        Ok(fetched)
    }
}

/// Rows from one FRED download plus what was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedSeries {
    pub rows: Vec<(NaiveDate, f64)>,
    /// Observations in the response.
    pub observations: usize,
    /// Observations without a usable value or date.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

fn parse_observations(observations: Vec<Observation>) -> FetchedSeries {
    let total = observations.len();
    let mut rows = Vec::with_capacity(total);
    for obs in observations {
        let Some(value) = crate::io::ingest::parse_rate(&obs.value) else {
            continue;
        };
        match NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d") {
            Ok(date) => rows.push((date, value)),
            Err(e) => debug!(date = %obs.date, error = %e, "dropping FRED observation"),
        }
    }
    FetchedSeries {
        skipped: total - rows.len(),
        observations: total,
        rows,
    }
}
