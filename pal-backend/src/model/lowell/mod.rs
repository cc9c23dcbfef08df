pub mod api_client;
pub mod types;

pub use api_client::{LowellClient, DEFAULT_OBSERVATORY, LOWELL_EPHEMERIS_URL};
