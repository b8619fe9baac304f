pub mod engine;

pub use engine::{respond_to_challenge, resolve_challenge, submit_challenge};
