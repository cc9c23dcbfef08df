//! Response schema of the Lowell Observatory ephemeris generator.

use pal_common::EphemerisPoint;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LowellResponse {
    pub ephemeris: Vec<LowellPoint>,
}

#[derive(Debug, Deserialize)]
pub struct LowellPoint {
    pub ra_deg: f64,
    pub dec_deg: f64,
    #[serde(default)]
    pub ra_hms: Option<String>,
    #[serde(default)]
    pub dec_dms: Option<String>,
    /// UTC calendar timestamp of the position
    pub calendar: String,
}

impl From<LowellPoint> for EphemerisPoint {
    fn from(point: LowellPoint) -> Self {
        EphemerisPoint {
            ra: point.ra_deg,
            dec: point.dec_deg,
            obs_time: point.calendar,
            ra_hms: point.ra_hms,
            dec_dms: point.dec_dms,
        }
    }
}

/// Decode a generator response; an empty ephemeris list counts as malformed.
pub fn decode_ephemeris(body: &str) -> Result<Vec<EphemerisPoint>, String> {
    if body.trim().is_empty() {
        return Err("empty response body".to_string());
    }
    let response: LowellResponse = serde_json::from_str(body)
        .map_err(|e| format!("malformed ephemeris response: {}", e))?;
    if response.ephemeris.is_empty() {
        return Err("ephemeris response holds no positions".to_string());
    }
    Ok(response.ephemeris.into_iter().map(EphemerisPoint::from).collect())
}
