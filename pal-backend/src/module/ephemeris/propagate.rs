//! Night-long position tracks from an observable set.
//!
//! Two strategies: linear extrapolation of the catalog rates (no network),
//! or positions generated per body by the Lowell ephemeris service.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use pal_common::{EphemerisPoint, MinorPlanetRecord, ObservableSet, PropagatedTrack};
use tracing::{debug, info};

use crate::error::{PalError, PalResult};
use crate::model::lowell::LowellClient;
use crate::shutdown::Shutdown;

/// Catalog RA rate units per degree-per-second of propagated motion
pub const RA_RATE_DIVISOR: f64 = 1.74355;
/// Catalog Dec rate units per degree-per-second of propagated motion
pub const DEC_RATE_DIVISOR: f64 = 0.4;
pub const DEFAULT_DURATION_MINUTES: u32 = 600;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Reject a step that does not tile the duration.
pub fn check_interval(step_minutes: u32, duration_minutes: u32) -> PalResult<()> {
    if step_minutes == 0 {
        return Err(PalError::config("propagation interval must be positive"));
    }
    if duration_minutes % step_minutes != 0 {
        return Err(PalError::config(format!(
            "propagation interval {} min does not divide the {} min duration",
            step_minutes, duration_minutes
        )));
    }
    Ok(())
}

/// Extrapolate every record linearly from UTC midnight of `date`.
///
/// Each track holds `duration / step + 1` points.
pub fn propagate(
    set: &ObservableSet,
    date: NaiveDate,
    step_minutes: u32,
    duration_minutes: u32,
) -> PalResult<Vec<PropagatedTrack>> {
    check_interval(step_minutes, duration_minutes)?;

    let tracks = set
        .records
        .iter()
        .map(|record| propagate_record(record, date, step_minutes, duration_minutes))
        .collect::<PalResult<Vec<_>>>()?;

    info!(
        "Propagated {} bodies for {} ({} min steps over {} min)",
        tracks.len(),
        date,
        step_minutes,
        duration_minutes
    );
    Ok(tracks)
}

fn propagate_record(
    record: &MinorPlanetRecord,
    date: NaiveDate,
    step_minutes: u32,
    duration_minutes: u32,
) -> PalResult<PropagatedTrack> {
    let mpc = record.identifier().ok_or_else(|| {
        PalError::MalformedResponse("catalog row has neither number nor designation".to_string())
    })?;

    let ra = record.ra.to_degrees();
    let dec = record.dec.to_degrees();
    let ra_rate = record.ra_rate / RA_RATE_DIVISOR / 60.0 / 3600.0;
    let dec_rate = record.dec_rate / DEC_RATE_DIVISOR / 60.0 / 3600.0;
    let ra_step = ra_rate * step_minutes as f64 / 15.0;
    let dec_step = dec_rate * step_minutes as f64 / 15.0;

    let midnight = midnight(date);
    let steps = duration_minutes / step_minutes;
    let coordinates = (0..=steps)
        .map(|i| {
            let n = i as f64;
            let at = midnight + Duration::minutes(i as i64 * step_minutes as i64);
            EphemerisPoint {
                ra: (ra + ra_step * n).rem_euclid(360.0),
                dec: dec + dec_step * n,
                obs_time: at.format(TIME_FORMAT).to_string(),
                ra_hms: None,
                dec_dms: None,
            }
        })
        .collect();

    Ok(PropagatedTrack {
        mpc,
        name: record.minorplanet.designation.clone(),
        vmag: record.v_mag,
        coordinates,
    })
}

/// Ask the Lowell service for every record's track, one body at a time.
pub async fn propagate_lowell(
    client: &LowellClient,
    set: &ObservableSet,
    date: NaiveDate,
    step_minutes: u32,
    duration_minutes: u32,
    shutdown: &Shutdown,
) -> PalResult<Vec<PropagatedTrack>> {
    check_interval(step_minutes, duration_minutes)?;

    let mut tracks = Vec::with_capacity(set.len());
    for (index, record) in set.records.iter().enumerate() {
        shutdown.check()?;
        let track = client
            .track(record, date, step_minutes, duration_minutes)
            .await?;
        debug!("Tracked body {}/{}: {}", index + 1, set.len(), track.mpc);
        tracks.push(track);
    }

    info!("Generated {} Lowell tracks for {}", tracks.len(), date);
    Ok(tracks)
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}
