pub mod astorb;
pub mod http;
pub mod lowell;
pub mod sky;
pub mod store;
