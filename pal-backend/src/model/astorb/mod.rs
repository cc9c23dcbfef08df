pub mod api_client;
pub mod query;
pub mod types;

pub use api_client::{CatalogClient, ASTORB_GRAPHQL_URL, PAGE_SIZE};
pub use query::CatalogQuery;
