//! Shared data model for the asteroid locator: telescopes, catalog records,
//! observable sets and propagated tracks.

pub mod types;

pub use types::{
    EphemerisArtifact, EphemerisPoint, MinorPlanet, MinorPlanetId, MinorPlanetRecord,
    ObservableSet, PropagatedTrack, PropagationMode, Telescope,
};
