//! Sidereal time and solar position on top of the `astro` ephemeris crate.
//!
//! Angles cross this boundary in degrees; `astro` works in radians.

use astro::coords::{alt_frm_eq, asc_frm_ecl, dec_frm_ecl};
use astro::time::{CalType, Date};
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Julian day of the J2000.0 epoch
pub const J2000: f64 = 2_451_545.0;

/// Julian day for a UTC instant.
pub fn julian_day(dt: &DateTime<Utc>) -> f64 {
    let day_fraction = (dt.hour() as f64
        + dt.minute() as f64 / 60.0
        + (dt.second() as f64 + dt.nanosecond() as f64 * 1e-9) / 3600.0)
        / 24.0;
    let date = Date {
        year: dt.year() as i16,
        month: dt.month() as u8,
        decimal_day: dt.day() as f64 + day_fraction,
        cal_type: CalType::Gregorian,
    };
    astro::time::julian_day(&date)
}

/// Greenwich mean sidereal time in degrees, normalised to [0, 360).
pub fn gmst_degrees(jd: f64) -> f64 {
    astro::time::mn_sidr(jd).to_degrees().rem_euclid(360.0)
}

/// Local mean sidereal time in degrees for an east-positive longitude.
pub fn local_sidereal_degrees(jd: f64, longitude_deg: f64) -> f64 {
    (gmst_degrees(jd) + longitude_deg).rem_euclid(360.0)
}

/// Geocentric equatorial coordinates of the Sun, `(ra, dec)` in degrees.
pub fn sun_equatorial(jd: f64) -> (f64, f64) {
    let (ecliptic, _distance_au) = astro::sun::geocent_ecl_pos(jd);
    let obliquity = astro::ecliptic::mn_oblq_IAU(jd);

    let ra = asc_frm_ecl(ecliptic.long, ecliptic.lat, obliquity);
    let dec = dec_frm_ecl(ecliptic.long, ecliptic.lat, obliquity);
    (ra.to_degrees().rem_euclid(360.0), dec.to_degrees())
}

/// Altitude of the Sun above the horizon in degrees.
pub fn sun_altitude(jd: f64, latitude_deg: f64, longitude_deg: f64) -> f64 {
    let (sun_ra, sun_dec) = sun_equatorial(jd);
    let hour_angle = local_sidereal_degrees(jd, longitude_deg) - sun_ra;

    alt_frm_eq(
        hour_angle.to_radians(),
        sun_dec.to_radians(),
        latitude_deg.to_radians(),
    )
    .to_degrees()
}
