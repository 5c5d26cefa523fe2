use serde::{Deserialize, Serialize};

/// Validation state of a known header. Heights are carried only by states that
/// place the header at a measured position of some accepted branch.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug, Hash)]
pub enum BlockStatus {
    /// On the active chain, body not yet validated
    HeadersOnly(u32),

    /// Body fully validated including scripts
    FullyValid(u32),

    /// Body validated by an interval worker which skipped script verification
    AssumedValid(u32),

    /// Part of a branch which is not the active chain
    InFork(u32),

    /// The parent of the header is unknown
    Orphan,

    /// The header or one of its ancestors failed validation
    InvalidChain,
}

impl BlockStatus {
    pub fn height(self) -> Option<u32> {
        match self {
            Self::HeadersOnly(h) | Self::FullyValid(h) | Self::AssumedValid(h) | Self::InFork(h) => Some(h),
            Self::Orphan | Self::InvalidChain => None,
        }
    }

    pub fn is_headers_only(self) -> bool {
        matches!(self, Self::HeadersOnly(_))
    }

    pub fn is_fully_valid(self) -> bool {
        matches!(self, Self::FullyValid(_))
    }

    /// Whether the block body was accepted, with or without script checks
    pub fn is_validated(self) -> bool {
        matches!(self, Self::FullyValid(_) | Self::AssumedValid(_))
    }

    pub fn is_in_fork(self) -> bool {
        matches!(self, Self::InFork(_))
    }

    pub fn is_orphan(self) -> bool {
        self == Self::Orphan
    }

    pub fn is_invalid(self) -> bool {
        self == Self::InvalidChain
    }

    /// Orphans and invalidated headers cannot serve as a parent
    pub fn is_placeable(self) -> bool {
        self.height().is_some()
    }

    pub fn is_active_chain(self) -> bool {
        matches!(self, Self::HeadersOnly(_) | Self::FullyValid(_) | Self::AssumedValid(_))
    }
}
