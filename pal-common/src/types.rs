use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A fixed-site telescope as described in the configuration file.
///
/// The name is the key of the `[telescopes.<Name>]` table and is filled in
/// after deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telescope {
    #[serde(skip)]
    pub name: String,
    pub slug: String,
    /// Geodetic latitude in degrees, north positive
    pub latitude: f64,
    /// Geodetic longitude in degrees, east positive
    pub longitude: f64,
    /// Height above sea level in metres
    #[serde(default)]
    pub altitude: f64,
    /// Lower edge of the declination band in degrees
    pub dec_min: f64,
    /// Upper edge of the declination band in degrees
    pub dec_max: f64,
    /// Faint-field limiting magnitude
    pub limiting_magnitude: f64,
    /// Bright-field limiting magnitude, used when `bright_field` is set
    #[serde(default)]
    pub bright_limiting_magnitude: Option<f64>,
    #[serde(default)]
    pub bright_field: bool,
}

impl Telescope {
    /// Magnitude ceiling applied to catalog queries for this instrument.
    pub fn mag_limit(&self) -> f64 {
        match (self.bright_field, self.bright_limiting_magnitude) {
            (true, Some(bright)) => bright,
            _ => self.limiting_magnitude,
        }
    }

    /// Check the static fields for physically meaningful values.
    pub fn validate(&self) -> Result<(), String> {
        if self.slug.trim().is_empty() {
            return Err(format!("telescope '{}' has an empty slug", self.name));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!(
                "telescope '{}' latitude {} is outside [-90, 90]",
                self.name, self.latitude
            ));
        }
        if !(-180.0..=360.0).contains(&self.longitude) {
            return Err(format!(
                "telescope '{}' longitude {} is outside [-180, 360]",
                self.name, self.longitude
            ));
        }
        if !(-90.0..=90.0).contains(&self.dec_min) || !(-90.0..=90.0).contains(&self.dec_max) {
            return Err(format!(
                "telescope '{}' declination band [{}, {}] is outside [-90, 90]",
                self.name, self.dec_min, self.dec_max
            ));
        }
        if self.dec_min >= self.dec_max {
            return Err(format!(
                "telescope '{}' declination band [{}, {}] is empty or inverted",
                self.name, self.dec_min, self.dec_max
            ));
        }
        Ok(())
    }
}

/// Catalog identity of a minor planet: its number when one has been assigned,
/// otherwise its provisional designation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinorPlanetId {
    Number(u64),
    Designation(String),
}

impl std::fmt::Display for MinorPlanetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MinorPlanetId::Number(n) => write!(f, "{}", n),
            MinorPlanetId::Designation(d) => write!(f, "{}", d),
        }
    }
}

/// The `minorplanet` object nested in every catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinorPlanet {
    pub ast_number: Option<u64>,
    /// Accepts either a plain string or the catalog's `{ "str_designame": .. }` object
    #[serde(default, deserialize_with = "deserialize_designation")]
    pub designation: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DesignationRepr {
    Plain(String),
    Nested { str_designame: Option<String> },
}

fn deserialize_designation<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<DesignationRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(DesignationRepr::Plain(s)) => Some(s),
        Some(DesignationRepr::Nested { str_designame }) => str_designame,
        None => None,
    })
}

/// One ephemeris row returned by the catalog service.
///
/// Angles are in radians as delivered by the service; rates are in the
/// service's native units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinorPlanetRecord {
    /// Internal catalog key, the ordering and pagination column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_minorplanet: Option<u64>,
    pub minorplanet: MinorPlanet,
    pub ra: f64,
    pub ra_rate: f64,
    pub dec: f64,
    pub dec_rate: f64,
    pub v_mag: f64,
}

impl MinorPlanetRecord {
    /// Number if assigned, designation otherwise.
    pub fn identifier(&self) -> Option<MinorPlanetId> {
        match (&self.minorplanet.ast_number, &self.minorplanet.designation) {
            (Some(n), _) => Some(MinorPlanetId::Number(*n)),
            (None, Some(d)) => Some(MinorPlanetId::Designation(d.clone())),
            (None, None) => None,
        }
    }

    /// Value used as the exclusive lower bound of the next page.
    pub fn cursor(&self) -> Option<u64> {
        self.id_minorplanet.or(self.minorplanet.ast_number)
    }
}

/// All bodies found for one (telescope, date) pair, ascending by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservableSet {
    pub telescope: String,
    pub date: NaiveDate,
    pub queried_at: DateTime<Utc>,
    pub records: Vec<MinorPlanetRecord>,
}

impl ObservableSet {
    pub fn new(telescope: &str, date: NaiveDate, records: Vec<MinorPlanetRecord>) -> Self {
        Self {
            telescope: telescope.to_string(),
            date,
            queried_at: Utc::now(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One instant of a body's motion. Angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisPoint {
    pub ra: f64,
    pub dec: f64,
    /// UTC timestamp, `YYYY-MM-DDTHH:MM`
    pub obs_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ra_hms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dec_dms: Option<String>,
}

/// A body's identity plus its positions through the night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagatedTrack {
    pub mpc: MinorPlanetId,
    pub name: Option<String>,
    pub vmag: f64,
    pub coordinates: Vec<EphemerisPoint>,
}

/// How tracks are generated from an observable set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PropagationMode {
    /// Linear propagation from the catalog rates
    #[default]
    #[serde(rename = "rate")]
    Rate,
    /// Positions generated by the Lowell Observatory ephemeris service
    #[serde(rename = "lowell")]
    Lowell,
}

impl PropagationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropagationMode::Rate => "rate",
            PropagationMode::Lowell => "lowell",
        }
    }
}

impl std::fmt::Display for PropagationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final per-date artifact: every propagated track for one night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisArtifact {
    pub telescope: String,
    pub date: NaiveDate,
    pub mode: PropagationMode,
    pub step_minutes: u32,
    pub duration_minutes: u32,
    /// Observatory code the positions were generated for, Lowell mode only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observatory: Option<u32>,
    /// `queried_at` of the observable set the tracks were built from
    pub source_queried_at: DateTime<Utc>,
    pub observable_asteroids: Vec<PropagatedTrack>,
}
