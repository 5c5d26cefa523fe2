use arbor_hashes::Hash;
use serde::{Deserialize, Serialize};

/// The authoritative pointer into the header tree
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainTip {
    pub best_block: Hash,
    /// Height of the best block
    pub depth: u32,
    /// Last block whose body was validated
    pub validation_index: Hash,
    pub validation_height: u32,
    /// Tips of losing branches which may still win a future reorg
    pub alternative_tips: Vec<Hash>,
    /// Height of the configured assume-valid block once it is known on the active chain
    pub assume_valid_index: Option<u32>,
}

impl ChainTip {
    pub fn from_genesis(genesis: Hash) -> Self {
        Self {
            best_block: genesis,
            depth: 0,
            validation_index: genesis,
            validation_height: 0,
            alternative_tips: Vec::new(),
            assume_valid_index: None,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.validation_index == self.best_block
    }

    pub fn insert_alternative_tip(&mut self, hash: Hash) {
        if !self.alternative_tips.contains(&hash) {
            self.alternative_tips.push(hash);
        }
    }

    pub fn remove_alternative_tip(&mut self, hash: &Hash) -> bool {
        let len = self.alternative_tips.len();
        self.alternative_tips.retain(|h| h != hash);
        len != self.alternative_tips.len()
    }
}
