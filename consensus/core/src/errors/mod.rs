pub mod accumulator;
pub mod block;
pub mod consensus;
pub mod sequencing;
pub mod tx;

pub use accumulator::AccumulatorError;
pub use block::{BlockProcessError, BlockProcessResult, StructuralError};
pub use consensus::ConsensusError;
pub use sequencing::SequencingError;
pub use tx::{TxResult, TxRuleError};
