mod batch;
mod health;
mod sequence;

pub use batch::{create_batch_handler, validate_code_handler};
pub use health::health_handler;
pub use sequence::{current_sequence_handler, sequence_stats_handler};
