#![allow(dead_code)]

use arbor_consensus::{
    consensus::Consensus,
    model::stores::{ChainStore, MemoryChainStore},
    test_helpers::{build_empty_block, genesis_header, regtest_config, UtxoTracker},
};
use arbor_consensus_core::{
    block::Block,
    blockstatus::BlockStatus,
    config::Config,
    errors::BlockProcessResult,
    header::Header,
    testutils::op_true_script::OpTrueVerifier,
};
use std::sync::Arc;

pub fn init_test_logger() {
    arbor_core::log::try_init_logger("info");
}

pub fn memory_consensus(config: Config) -> Consensus<MemoryChainStore> {
    init_test_logger();
    Consensus::new(Arc::new(config), MemoryChainStore::new(), Arc::new(OpTrueVerifier::new())).unwrap()
}

pub fn default_consensus() -> Consensus<MemoryChainStore> {
    memory_consensus(regtest_config())
}

/// Mines `count` coinbase-only blocks on top of `prev`, the first one at `start_height`
pub fn mine_blocks(prev: &Header, start_height: u32, count: u32, tag: u8) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::with_capacity(count as usize);
    for height in start_height..start_height + count {
        let parent = blocks.last().map(|block| block.header.clone()).unwrap_or_else(|| prev.clone());
        blocks.push(build_empty_block(&parent, height, tag));
    }
    blocks
}

/// Mines `count` blocks on top of genesis
pub fn mine_chain(count: u32) -> Vec<Block> {
    mine_blocks(&genesis_header(), 1, count, 0)
}

pub fn accept_headers<S: ChainStore>(consensus: &Consensus<S>, blocks: &[Block]) -> BlockProcessResult<Vec<BlockStatus>> {
    blocks.iter().map(|block| consensus.accept_header(block.header.clone())).collect()
}

/// Connects `block` with proof data produced by `tracker`, and advances the tracker on success
pub fn connect<S: ChainStore>(consensus: &Consensus<S>, tracker: &mut UtxoTracker, block: &Block, height: u32) -> BlockProcessResult<u32> {
    let data = tracker.connect_data(block).unwrap();
    let connected = consensus.connect_block(block.clone(), data.proof, data.spent_outputs, data.deletions)?;
    tracker.apply(block, height).unwrap();
    Ok(connected)
}

/// Connects `blocks`, the first one at `start_height`
pub fn connect_all<S: ChainStore>(consensus: &Consensus<S>, tracker: &mut UtxoTracker, blocks: &[Block], start_height: u32) {
    for (height, block) in (start_height..).zip(blocks) {
        assert_eq!(connect(consensus, tracker, block, height).unwrap(), height);
    }
}
