//! Response schema of the AstorbDB GraphQL endpoint.

use pal_common::MinorPlanetRecord;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<EphemerisData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct EphemerisData {
    ephemeris: Vec<MinorPlanetRecord>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Decode one page of catalog rows.
///
/// Returns the reason as `Err` when the body is empty, is not JSON, carries
/// GraphQL errors, or lacks `data.ephemeris`.
pub fn decode_page(body: &str) -> Result<Vec<MinorPlanetRecord>, String> {
    if body.trim().is_empty() {
        return Err("empty response body".to_string());
    }

    let response: GraphQlResponse = serde_json::from_str(body)
        .map_err(|e| format!("malformed catalog response: {}", e))?;

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(format!("catalog reported errors: {}", messages.join("; ")));
    }

    response
        .data
        .map(|data| data.ephemeris)
        .ok_or_else(|| "malformed catalog response: missing data.ephemeris".to_string())
}
