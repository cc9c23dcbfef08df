//! Sky window calculator.
//!
//! Maps a (telescope, date) pair to the right-ascension and declination band
//! that crosses the sky during astronomical night.

use chrono::{Duration, NaiveDate};
use pal_common::Telescope;
use std::f64::consts::TAU;
use tracing::debug;

use super::solar::{julian_day, local_sidereal_degrees, sun_altitude};
use crate::error::{PalError, PalResult};

/// Sun altitude below which the sky is astronomically dark
pub const TWILIGHT_ALTITUDE_DEG: f64 = -18.0;
/// Margin added to every edge of the window
pub const WINDOW_BUFFER_DEG: f64 = 5.0;
pub const MINUTES_PER_DAY: u32 = 24 * 60;
const DEGREES_PER_MINUTE: f64 = 15.0 / 60.0;

/// Astronomical night as minute offsets from the date's UTC midnight.
///
/// `end` exceeds [`MINUTES_PER_DAY`] when the night straddles the end of the
/// sampled day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightInterval {
    pub start: u32,
    pub end: u32,
}

impl NightInterval {
    pub fn start_hour_angle(&self) -> f64 {
        self.start as f64 * DEGREES_PER_MINUTE
    }

    pub fn end_hour_angle(&self) -> f64 {
        self.end as f64 * DEGREES_PER_MINUTE
    }
}

/// Query bounds in degrees, buffer applied, before any wrap handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyBounds {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

/// Query bounds in radians.
///
/// When `wraps` is set the band crosses 0h and `ra_max < ra_min`; the band is
/// then `[ra_min, 2pi] + [0, ra_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyWindow {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
    pub wraps: bool,
}

impl SkyWindow {
    /// RA intervals to query, each with `min <= max`.
    pub fn ra_segments(&self) -> Vec<(f64, f64)> {
        if self.wraps {
            vec![(self.ra_min, TAU), (0.0, self.ra_max)]
        } else {
            vec![(self.ra_min, self.ra_max)]
        }
    }
}

impl From<SkyBounds> for SkyWindow {
    fn from(bounds: SkyBounds) -> Self {
        let dec_min = bounds.dec_min.max(-90.0).to_radians();
        let dec_max = bounds.dec_max.min(90.0).to_radians();

        let width = bounds.ra_max - bounds.ra_min;
        if width >= 360.0 {
            return Self {
                ra_min: 0.0,
                ra_max: TAU,
                dec_min,
                dec_max,
                wraps: false,
            };
        }

        let ra_min = bounds.ra_min.rem_euclid(360.0);
        let mut ra_max = ra_min + width;
        let wraps = ra_max > 360.0;
        if wraps {
            ra_max -= 360.0;
        }

        Self {
            ra_min: ra_min.to_radians(),
            ra_max: ra_max.to_radians(),
            dec_min,
            dec_max,
            wraps,
        }
    }
}

/// Compute the buffered query window for one night.
pub fn compute_window(telescope: &Telescope, date: NaiveDate) -> PalResult<SkyWindow> {
    let lst = midnight_sidereal_degrees(telescope, date);
    let night = night_interval(telescope, date)?;
    let bounds = sky_bounds(lst, night, telescope);

    debug!(
        "Sky bounds for {} on {}: RA [{:.3}, {:.3}] Dec [{:.3}, {:.3}] \
         (LST {:.3}, night {}..{} min)",
        telescope.slug,
        date,
        bounds.ra_min,
        bounds.ra_max,
        bounds.dec_min,
        bounds.dec_max,
        lst,
        night.start,
        night.end
    );

    Ok(SkyWindow::from(bounds))
}

/// Local sidereal time at the date's UTC midnight, in degrees.
pub fn midnight_sidereal_degrees(telescope: &Telescope, date: NaiveDate) -> f64 {
    let midnight = date.and_time(chrono::NaiveTime::MIN).and_utc();
    local_sidereal_degrees(julian_day(&midnight), telescope.longitude)
}

/// Add night hour angles to the sidereal time and buffer every edge.
pub fn sky_bounds(lst_deg: f64, night: NightInterval, telescope: &Telescope) -> SkyBounds {
    SkyBounds {
        ra_min: lst_deg + night.start_hour_angle() - WINDOW_BUFFER_DEG,
        ra_max: lst_deg + night.end_hour_angle() + WINDOW_BUFFER_DEG,
        dec_min: telescope.dec_min - WINDOW_BUFFER_DEG,
        dec_max: telescope.dec_max + WINDOW_BUFFER_DEG,
    }
}

/// Sample the Sun once a minute over the 24 hours after UTC midnight and
/// locate astronomical night.
pub fn night_interval(telescope: &Telescope, date: NaiveDate) -> PalResult<NightInterval> {
    let midnight = date.and_time(chrono::NaiveTime::MIN).and_utc();

    let dark: Vec<bool> = (0..MINUTES_PER_DAY)
        .map(|minute| {
            let instant = midnight + Duration::minutes(minute as i64);
            sun_altitude(julian_day(&instant), telescope.latitude, telescope.longitude)
                < TWILIGHT_ALTITUDE_DEG
        })
        .collect();

    night_from_samples(&dark).ok_or_else(|| PalError::NoAstronomicalNight {
        telescope: telescope.name.clone(),
        date,
    })
}

/// Reduce per-minute darkness samples to a single contiguous night.
pub fn night_from_samples(dark: &[bool]) -> Option<NightInterval> {
    if dark.is_empty() {
        return None;
    }

    let mut runs: Vec<(u32, u32)> = Vec::new();
    let mut current: Option<u32> = None;

    for (minute, &is_dark) in dark.iter().enumerate() {
        let minute = minute as u32;
        match (is_dark, current) {
            (true, None) => current = Some(minute),
            (false, Some(start)) => {
                runs.push((start, minute - 1));
                current = None;
            }
            _ => {}
        }
    }
    if let Some(start) = current {
        runs.push((start, dark.len() as u32 - 1));
    }

    let last_sample = dark.len() as u32 - 1;
    match runs.as_slice() {
        [] => None,
        [(start, end)] => Some(NightInterval { start: *start, end: *end }),
        [first, .., last] if first.0 == 0 && last.1 == last_sample => Some(NightInterval {
            start: last.0,
            end: first.1 + dark.len() as u32,
        }),
        _ => runs
            .iter()
            .max_by_key(|(start, end)| end - start)
            .map(|&(start, end)| NightInterval { start, end }),
    }
}
