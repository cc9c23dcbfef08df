pub mod action;
pub mod dates;
pub mod pipeline;
pub mod propagate;

pub use action::{execute, validate, RunOutcome, ValidatedRequest};
pub use dates::{create_dates, parse_date};
pub use pipeline::{ObservationPipeline, PipelineReport};
pub use propagate::{propagate, propagate_lowell};
