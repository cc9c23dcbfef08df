//! Lowell Observatory ephemeris generator client.
//!
//! Asks the service for a body's positions through the night instead of
//! extrapolating catalog rates. Slower (one request per body) but exact.

use chrono::NaiveDate;
use pal_common::{MinorPlanetRecord, PropagatedTrack};
use reqwest::Url;
use std::sync::Arc;
use tracing::debug;

use super::types::decode_ephemeris;
use crate::error::{PalError, PalResult};
use crate::model::http::retry::{classify_status, run_with_retry};
use crate::model::http::{AttemptOutcome, HttpTransport, RetryPolicy};

pub const LOWELL_EPHEMERIS_URL: &str = "https://asteroid.lowell.edu/api/ephemeris/generate";
/// Statuses the generator answers for a request it will never accept
const TERMINAL_STATUSES: &[u16] = &[400];
/// MPC code of the observatory positions are computed for
pub const DEFAULT_OBSERVATORY: u32 = 256;

pub struct LowellClient {
    transport: Arc<dyn HttpTransport>,
    url: String,
    observatory: u32,
    retry: RetryPolicy,
}

impl LowellClient {
    pub fn new(transport: Arc<dyn HttpTransport>, observatory: u32) -> Self {
        Self {
            transport,
            url: LOWELL_EPHEMERIS_URL.to_string(),
            observatory,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Request URL for one body's night.
    pub fn request_url(
        &self,
        asteroid: &str,
        date: NaiveDate,
        step_minutes: u32,
        duration_minutes: u32,
    ) -> PalResult<String> {
        let start = format!("{}T00:00", date.format("%Y-%m-%d"));
        let url = Url::parse_with_params(
            &self.url,
            &[
                ("asteroid", asteroid.to_string()),
                ("observatory", self.observatory.to_string()),
                ("start-utc", start),
                ("duration-minutes", duration_minutes.to_string()),
                ("step-minutes", step_minutes.to_string()),
            ],
        )
        .map_err(|e| PalError::config(format!("invalid ephemeris URL '{}': {}", self.url, e)))?;
        Ok(url.to_string())
    }

    /// Positions of `record` through the night of `date`.
    pub async fn track(
        &self,
        record: &MinorPlanetRecord,
        date: NaiveDate,
        step_minutes: u32,
        duration_minutes: u32,
    ) -> PalResult<PropagatedTrack> {
        let mpc = record.identifier().ok_or_else(|| {
            PalError::MalformedResponse(
                "catalog row has neither number nor designation".to_string(),
            )
        })?;
        let url = self.request_url(&mpc.to_string(), date, step_minutes, duration_minutes)?;
        let label = format!("Lowell ephemeris for {}", mpc);

        let coordinates = run_with_retry(&self.retry, &label, |_| {
            let transport = Arc::clone(&self.transport);
            let url = url.clone();
            async move {
                match transport.get(&url).await {
                    Err(e) => AttemptOutcome::Retryable(format!("request failed: {:#}", e)),
                    Ok(response) if response.is_ok() => match decode_ephemeris(&response.body) {
                        Ok(points) => AttemptOutcome::Success(points),
                        Err(reason) => AttemptOutcome::Retryable(reason),
                    },
                    Ok(response) => classify_status(response.status, TERMINAL_STATUSES),
                }
            }
        })
        .await?;

        debug!("Received {} positions for {}", coordinates.len(), mpc);

        Ok(PropagatedTrack {
            mpc,
            name: record.minorplanet.designation.clone(),
            vmag: record.v_mag,
            coordinates,
        })
    }
}
