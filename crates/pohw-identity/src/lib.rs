pub mod engine;

pub use engine::{register_identifier, rotate_identifier, rotation_message};
