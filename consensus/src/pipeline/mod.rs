pub mod body_processor;
pub mod header_processor;
