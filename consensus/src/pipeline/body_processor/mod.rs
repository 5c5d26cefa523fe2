mod body_validation_in_context;
mod body_validation_in_isolation;
mod processor;

pub use processor::{BlockBodyProcessor, BlockValidationInput, BodyValidationOutcome};
