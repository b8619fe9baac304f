pub mod engine;

pub use engine::{drain_batch, inclusion_proof_for, DEFAULT_BATCH_SIZE};
