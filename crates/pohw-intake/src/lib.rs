pub mod pipeline;
pub mod receipt;

pub use pipeline::{IntakePipeline, SubmitOutcome, SubmitRequest};
pub use receipt::Receipt;
