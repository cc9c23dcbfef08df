pub mod retry;
pub mod transport;

#[cfg(test)]
pub mod testing;

pub use retry::{AttemptOutcome, RetryPolicy};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
