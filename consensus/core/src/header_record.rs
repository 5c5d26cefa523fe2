use crate::{blockstatus::BlockStatus, header::Header};
use arbor_hashes::Hash;
use serde::{Deserialize, Serialize};

/// A stored header together with its validation state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderRecord {
    pub header: Header,
    pub status: BlockStatus,
}

impl HeaderRecord {
    pub fn new(header: Header, status: BlockStatus) -> Self {
        Self { header, status }
    }

    #[inline(always)]
    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn height(&self) -> Option<u32> {
        self.status.height()
    }

    pub fn with_status(&self, status: BlockStatus) -> Self {
        Self { header: self.header.clone(), status }
    }
}
