mod pow_validation;
mod processor;
mod recovery;
mod reorg;

pub use processor::HeaderProcessor;
