//!
//! Header chain, fork choice, invalidation and persistence scenarios run against
//! the full engine.
//!

mod common;

use arbor_accumulator::Stump;
use arbor_consensus::{
    consensus::Consensus,
    model::stores::{ChainStore, DbChainStore, MemoryChainStore},
    test_helpers::{build_empty_block, genesis_header, mine_header, regtest_config, unmined_header, UtxoTracker},
};
use arbor_consensus_core::{
    api::ConsensusApi,
    blockstatus::BlockStatus,
    config::ConfigBuilder,
    errors::{BlockProcessError, ConsensusError, SequencingError},
    header_record::HeaderRecord,
    testutils::op_true_script::OpTrueVerifier,
};
use arbor_database::{create_temp_db, prelude::ConnBuilder};
use arbor_hashes::Hash;
use common::*;
use std::sync::Arc;

#[test]
fn test_header_chain_extends_best_block() {
    let consensus = default_consensus();
    let genesis = genesis_header();
    assert_eq!(consensus.best_block(), genesis.hash);
    assert_eq!(consensus.get_block_status(genesis.hash).unwrap(), Some(BlockStatus::FullyValid(0)));

    let blocks = mine_chain(5);
    let statuses = accept_headers(&consensus, &blocks).unwrap();
    assert_eq!(statuses, (1..=5).map(BlockStatus::HeadersOnly).collect::<Vec<_>>());

    let tip = consensus.chain_tip();
    assert_eq!(tip.best_block, blocks[4].hash());
    assert_eq!(tip.depth, 5);
    assert_eq!(tip.validation_index, genesis.hash);
    assert_eq!(tip.validation_height, 0);
    assert!(!tip.is_synced());
    assert_eq!(consensus.get_header_by_height(3).unwrap(), Some(blocks[2].header.clone()));
    assert_eq!(consensus.get_header_by_height(6).unwrap(), None);
    assert_eq!(consensus.counters_snapshot().header_counts, 5);
}

#[test]
fn test_accept_header_is_idempotent() {
    let consensus = default_consensus();
    let blocks = mine_chain(2);
    accept_headers(&consensus, &blocks).unwrap();
    let tip = consensus.chain_tip();

    assert_eq!(consensus.accept_header(blocks[1].header.clone()).unwrap(), BlockStatus::HeadersOnly(2));
    assert_eq!(consensus.accept_header(blocks[0].header.clone()).unwrap(), BlockStatus::HeadersOnly(1));
    assert_eq!(consensus.chain_tip(), tip);
    assert_eq!(consensus.counters_snapshot().header_counts, 2);
}

#[test]
fn test_orphans_and_their_children() {
    let consensus = default_consensus();
    let blocks = mine_chain(3);

    // The parent of the second block was never submitted
    assert_eq!(consensus.accept_header(blocks[1].header.clone()).unwrap(), BlockStatus::Orphan);
    let err = consensus.accept_header(blocks[2].header.clone()).unwrap_err();
    assert!(matches!(err, BlockProcessError::Consensus(ConsensusError::UnplaceableAncestor(_))));
    assert_eq!(consensus.best_height(), 0);
    assert_eq!(consensus.get_block_status(blocks[2].hash()).unwrap(), None);
}

#[test]
fn test_proof_of_work_rules() {
    let consensus = default_consensus();
    let genesis = genesis_header();

    let header = unmined_header(&genesis, Hash::from(1), genesis.time + 60, genesis.bits);
    let err = consensus.accept_header(header).unwrap_err();
    assert!(matches!(err, BlockProcessError::Consensus(ConsensusError::InsufficientProofOfWork(_))));

    // Above the proof of work limit
    let header = mine_header(&genesis, Hash::from(1), genesis.time + 60, 0x2100ffff);
    let err = consensus.accept_header(header).unwrap_err();
    assert!(matches!(err, BlockProcessError::Consensus(ConsensusError::InvalidTargetBits(0x2100ffff))));

    // A harder target than required is fine
    let hard = mine_header(&genesis, Hash::from(1), genesis.time + 60, 0x2000ffff);
    assert_eq!(consensus.accept_header(hard.clone()).unwrap(), BlockStatus::HeadersOnly(1));

    // Its children may only fall back to the limit after twice the target spacing
    let early = mine_header(&hard, Hash::from(2), hard.time + 60, genesis.bits);
    let err = consensus.accept_header(early).unwrap_err();
    assert!(matches!(
        err,
        BlockProcessError::Consensus(ConsensusError::UnexpectedDifficulty { claimed: 0x207fffff, required: 0x2000ffff })
    ));
    let late = mine_header(&hard, Hash::from(2), hard.time + 1201, genesis.bits);
    assert_eq!(consensus.accept_header(late).unwrap(), BlockStatus::HeadersOnly(2));
}

#[test]
fn test_equal_work_keeps_first_seen_branch() {
    let consensus = default_consensus();
    let genesis = genesis_header();
    let a = build_empty_block(&genesis, 1, 0xa);
    let b = build_empty_block(&genesis, 1, 0xb);

    consensus.accept_header(a.header.clone()).unwrap();
    assert_eq!(consensus.accept_header(b.header.clone()).unwrap(), BlockStatus::InFork(1));
    assert_eq!(consensus.best_block(), a.hash());
    assert_eq!(consensus.chain_tip().alternative_tips, vec![b.hash()]);

    // Submitting the other way around yields the mirror image
    let consensus = default_consensus();
    consensus.accept_header(b.header.clone()).unwrap();
    consensus.accept_header(a.header.clone()).unwrap();
    assert_eq!(consensus.best_block(), b.hash());
    assert_eq!(consensus.chain_tip().alternative_tips, vec![a.hash()]);
    assert_eq!(consensus.counters_snapshot().reorg_counts, 0);
}

#[test]
fn test_fork_choice_is_independent_of_interleaving() {
    let genesis = genesis_header();
    let common = mine_blocks(&genesis, 1, 2, 0);
    let heavy = mine_blocks(&common[1].header, 3, 3, 0xa);
    let light = mine_blocks(&common[1].header, 3, 2, 0xb);

    let interleavings: [Vec<&arbor_consensus_core::block::Block>; 3] = [
        common.iter().chain(heavy.iter()).chain(light.iter()).collect(),
        common.iter().chain(light.iter()).chain(heavy.iter()).collect(),
        common.iter().chain([&light[0], &heavy[0], &light[1], &heavy[1], &heavy[2]]).collect(),
    ];
    for order in interleavings {
        let consensus = default_consensus();
        for block in order {
            consensus.accept_header(block.header.clone()).unwrap();
        }
        let tip = consensus.chain_tip();
        assert_eq!(tip.best_block, heavy[2].hash());
        assert_eq!(tip.depth, 5);
        assert_eq!(tip.alternative_tips, vec![light[1].hash()]);
        for (height, block) in (3..).zip(light.iter()) {
            assert_eq!(consensus.get_block_status(block.hash()).unwrap(), Some(BlockStatus::InFork(height)));
        }
        for (height, block) in (3..).zip(heavy.iter()) {
            assert_eq!(consensus.get_block_status(block.hash()).unwrap(), Some(BlockStatus::HeadersOnly(height)));
            assert_eq!(consensus.get_header_by_height(height).unwrap(), Some(block.header.clone()));
        }
    }
}

#[test]
fn test_reorg_scenario() {
    let consensus = default_consensus();
    let mut tracker = UtxoTracker::new();
    let genesis = genesis_header();

    let h1 = build_empty_block(&genesis, 1, 0);
    assert_eq!(consensus.accept_header(h1.header.clone()).unwrap(), BlockStatus::HeadersOnly(1));
    let tip = consensus.chain_tip();
    assert_eq!((tip.best_block, tip.validation_index), (h1.hash(), genesis.hash));

    assert_eq!(connect(&consensus, &mut tracker, &h1, 1).unwrap(), 1);
    assert_eq!(consensus.get_block_status(h1.hash()).unwrap(), Some(BlockStatus::FullyValid(1)));
    assert_eq!(consensus.validation_index(), h1.hash());
    let snapshot_at_h1 = consensus.accumulator_snapshot();
    assert_eq!(snapshot_at_h1, tracker.stump());

    let h2a = build_empty_block(&h1.header, 2, 0xa);
    let h2b = build_empty_block(&h1.header, 2, 0xb);
    consensus.accept_header(h2a.header.clone()).unwrap();
    assert_eq!(consensus.accept_header(h2b.header.clone()).unwrap(), BlockStatus::InFork(2));
    let tip = consensus.chain_tip();
    assert_eq!(tip.best_block, h2a.hash());
    assert_eq!(tip.alternative_tips, vec![h2b.hash()]);

    // Validate the soon to be abandoned block so the reorg has to roll back
    connect(&consensus, &mut tracker, &h2a, 2).unwrap();
    assert_eq!(consensus.validation_index(), h2a.hash());
    assert_ne!(consensus.accumulator_snapshot(), snapshot_at_h1);

    let h2b2 = build_empty_block(&h2b.header, 3, 0xb);
    assert_eq!(consensus.accept_header(h2b2.header.clone()).unwrap(), BlockStatus::HeadersOnly(3));

    let tip = consensus.chain_tip();
    assert_eq!(tip.best_block, h2b2.hash());
    assert_eq!(tip.depth, 3);
    assert_eq!(tip.validation_index, h1.hash());
    assert_eq!(tip.validation_height, 1);
    assert_eq!(tip.alternative_tips, vec![h2a.hash()]);
    assert_eq!(consensus.get_block_status(h2a.hash()).unwrap(), Some(BlockStatus::InFork(2)));
    assert_eq!(consensus.get_block_status(h2b.hash()).unwrap(), Some(BlockStatus::HeadersOnly(2)));
    assert_eq!(consensus.accumulator_snapshot(), snapshot_at_h1);
    assert_eq!(consensus.store().snapshot_heights(), vec![0, 1]);
    assert_eq!(consensus.counters_snapshot().reorg_counts, 1);

    // The winning branch connects on top of the rolled back state
    let mut tracker = UtxoTracker::new();
    tracker.apply(&h1, 1).unwrap();
    connect(&consensus, &mut tracker, &h2b, 2).unwrap();
    connect(&consensus, &mut tracker, &h2b2, 3).unwrap();
    assert!(consensus.chain_tip().is_synced());
    assert_eq!(consensus.accumulator_snapshot(), tracker.stump());
}

#[test]
fn test_reorg_beyond_retained_snapshots_rederives_from_genesis() {
    let config = ConfigBuilder::new(regtest_config().params).set_snapshot_retention_depth(1).build();
    let consensus = memory_consensus(config);
    let mut tracker = UtxoTracker::new();

    let blocks = mine_chain(4);
    accept_headers(&consensus, &blocks).unwrap();
    connect_all(&consensus, &mut tracker, &blocks, 1);
    // Heights 3 and 4 are retained
    assert_eq!(consensus.store().snapshot_heights(), vec![3, 4]);

    // A heavier branch forking at height 1, where no snapshot is left
    let fork = mine_blocks(&blocks[0].header, 2, 4, 0xf);
    let statuses = accept_headers(&consensus, &fork[..3]).unwrap();
    assert!(statuses.iter().all(|status| status.is_in_fork()));
    assert_eq!(consensus.accept_header(fork[3].header.clone()).unwrap(), BlockStatus::HeadersOnly(5));

    let tip = consensus.chain_tip();
    assert_eq!((tip.best_block, tip.depth), (fork[3].hash(), 5));
    assert_eq!((tip.validation_index, tip.validation_height), (genesis_header().hash, 0));
    assert_eq!(tip.alternative_tips, vec![blocks[3].hash()]);
    assert_eq!(consensus.get_block_status(blocks[0].hash()).unwrap(), Some(BlockStatus::HeadersOnly(1)));
    assert_eq!(consensus.get_block_status(blocks[1].hash()).unwrap(), Some(BlockStatus::InFork(2)));
    assert_eq!(consensus.accumulator_snapshot(), Stump::new());
    assert_eq!(consensus.store().snapshot_heights(), vec![0]);

    // The new active chain connects from genesis
    let mut tracker = UtxoTracker::new();
    connect(&consensus, &mut tracker, &blocks[0], 1).unwrap();
    connect_all(&consensus, &mut tracker, &fork, 2);
    assert!(consensus.chain_tip().is_synced());
    assert_eq!(consensus.accumulator_snapshot(), tracker.stump());
    assert_eq!(consensus.store().snapshot_heights(), vec![4, 5]);
}

#[test]
fn test_invalidate_block_switches_to_alternative() {
    let consensus = default_consensus();
    let mut tracker = UtxoTracker::new();
    let genesis = genesis_header();

    let main = mine_chain(3);
    let side = mine_blocks(&main[0].header, 2, 1, 0xc);
    accept_headers(&consensus, &main).unwrap();
    accept_headers(&consensus, &side).unwrap();
    connect_all(&consensus, &mut tracker, &main, 1);
    assert!(consensus.chain_tip().is_synced());

    consensus.invalidate_block(main[1].hash()).unwrap();
    let tip = consensus.chain_tip();
    assert_eq!(consensus.get_block_status(main[1].hash()).unwrap(), Some(BlockStatus::InvalidChain));
    assert_eq!(consensus.get_block_status(main[2].hash()).unwrap(), Some(BlockStatus::InvalidChain));
    // Only the side branch is left with more work than the first block
    assert_eq!(tip.best_block, side[0].hash());
    assert_eq!(tip.depth, 2);
    assert_eq!(tip.validation_index, main[0].hash());
    assert!(tip.alternative_tips.is_empty());
    assert_eq!(consensus.get_block_status(side[0].hash()).unwrap(), Some(BlockStatus::HeadersOnly(2)));

    // Children of invalid blocks are unplaceable
    let child = build_empty_block(&main[2].header, 4, 0);
    let err = consensus.accept_header(child.header).unwrap_err();
    assert!(matches!(err, BlockProcessError::Consensus(ConsensusError::UnplaceableAncestor(_))));

    let err = consensus.invalidate_block(genesis.hash).unwrap_err();
    assert!(matches!(err, BlockProcessError::UnsupportedOperation(_)));
    assert_eq!(consensus.counters_snapshot().invalidated_counts, 1);
}

#[test]
fn test_invalidate_fork_tip() {
    let consensus = default_consensus();
    let genesis = genesis_header();
    let a = build_empty_block(&genesis, 1, 0xa);
    let b = build_empty_block(&genesis, 1, 0xb);
    accept_headers(&consensus, &[a.clone(), b.clone()]).unwrap();

    consensus.invalidate_block(b.hash()).unwrap();
    let tip = consensus.chain_tip();
    assert_eq!(tip.best_block, a.hash());
    assert!(tip.alternative_tips.is_empty());
    assert_eq!(consensus.get_block_status(b.hash()).unwrap(), Some(BlockStatus::InvalidChain));

    let err = consensus.invalidate_block(Hash::from(77)).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::UnknownBlock(_))));
}

#[test]
fn test_restart_after_crash_demotes_unflushed_blocks() {
    let config = ConfigBuilder::new(regtest_config().params).set_flush_interval(100).build();
    let consensus = memory_consensus(config.clone());
    let mut tracker = UtxoTracker::new();

    let blocks = mine_chain(6);
    accept_headers(&consensus, &blocks[..3]).unwrap();
    connect_all(&consensus, &mut tracker, &blocks[..2], 1);
    // The tip did not move during the last flush
    consensus.flush().unwrap();
    let flushed_snapshot = consensus.accumulator_snapshot();
    accept_headers(&consensus, &blocks[3..]).unwrap();
    connect_all(&consensus, &mut tracker, &blocks[2..4], 3);
    assert_eq!(consensus.chain_tip().validation_height, 4);
    assert!(consensus.store().has_staged_writes());

    let crashed = consensus.store().crash_copy();
    drop(consensus);

    let consensus = Consensus::new(Arc::new(config), crashed, Arc::new(OpTrueVerifier::new())).unwrap();
    let tip = consensus.chain_tip();
    assert_eq!(tip.validation_height, 2);
    assert_eq!(tip.validation_index, blocks[1].hash());
    // Headers were durable and the best chain is recovered from them
    assert_eq!(tip.best_block, blocks[5].hash());
    assert_eq!(tip.depth, 6);
    assert_eq!(consensus.accumulator_snapshot(), flushed_snapshot);
    for (height, block) in (3..).zip(&blocks[2..]) {
        assert_eq!(consensus.get_block_status(block.hash()).unwrap(), Some(BlockStatus::HeadersOnly(height)));
    }

    // Blocks above the recovered validation index connect again
    let mut tracker = UtxoTracker::new();
    tracker.apply(&blocks[0], 1).unwrap();
    tracker.apply(&blocks[1], 2).unwrap();
    connect_all(&consensus, &mut tracker, &blocks[2..], 3);
    assert!(consensus.chain_tip().is_synced());
}

#[test]
fn test_restart_after_interrupted_reorg() {
    let config = regtest_config();
    let consensus = memory_consensus(config.clone());
    let mut tracker = UtxoTracker::new();

    let blocks = mine_chain(4);
    accept_headers(&consensus, &blocks).unwrap();
    connect(&consensus, &mut tracker, &blocks[0], 1).unwrap();
    let fork_snapshot = consensus.accumulator_snapshot();
    connect_all(&consensus, &mut tracker, &blocks[1..], 2);

    let fork = mine_blocks(&blocks[0].header, 2, 4, 0xf);
    let statuses = accept_headers(&consensus, &fork[..3]).unwrap();
    assert_eq!(statuses, (2..=4).map(BlockStatus::InFork).collect::<Vec<_>>());
    consensus.flush().unwrap();

    // The heavier branch was being written when the process died: the abandoned blocks are
    // partly marked as a fork, the index is rewritten up to height 4 and the branch tip is
    // stored without an index entry. None of it reached a flushed tip.
    let mut store = consensus.store().crash_copy();
    drop(consensus);
    for (height, block) in (2..).zip(&blocks[1..3]) {
        store.save_header(&HeaderRecord::new(block.header.clone(), BlockStatus::InFork(height))).unwrap();
    }
    for (height, block) in (2..).zip(&fork) {
        store.save_header(&HeaderRecord::new(block.header.clone(), BlockStatus::HeadersOnly(height))).unwrap();
        if height <= 4 {
            store.save_height_index(height, block.hash()).unwrap();
        }
    }
    store.check_integrity().unwrap();

    let consensus = Consensus::new(Arc::new(config), store, Arc::new(OpTrueVerifier::new())).unwrap();
    let tip = consensus.chain_tip();
    assert_eq!((tip.best_block, tip.depth), (fork[2].hash(), 4));
    assert_eq!((tip.validation_index, tip.validation_height), (blocks[0].hash(), 1));
    assert_eq!(tip.alternative_tips, vec![blocks[3].hash()]);
    assert_eq!(consensus.accumulator_snapshot(), fork_snapshot);
    assert_eq!(consensus.store().snapshot_heights(), vec![0, 1]);
    for (height, block) in (2..).zip(&blocks[1..]) {
        assert_eq!(consensus.get_block_status(block.hash()).unwrap(), Some(BlockStatus::InFork(height)));
    }
    assert!(!consensus.store().has_staged_writes());

    // The stranded branch tip is placed again when its header comes back
    assert_eq!(consensus.accept_header(fork[3].header.clone()).unwrap(), BlockStatus::HeadersOnly(5));
    assert_eq!(consensus.chain_tip().best_block, fork[3].hash());

    let mut tracker = UtxoTracker::new();
    tracker.apply(&blocks[0], 1).unwrap();
    connect_all(&consensus, &mut tracker, &fork, 2);
    assert!(consensus.chain_tip().is_synced());
}

#[test]
fn test_db_store_survives_reopen() {
    let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_create_if_missing(true));
    let config = Arc::new(regtest_config());
    let blocks = mine_chain(4);
    let mut tracker = UtxoTracker::new();

    let snapshot = {
        init_test_logger();
        let store = DbChainStore::new(db.clone(), 16);
        let consensus = Consensus::new(config.clone(), store, Arc::new(OpTrueVerifier::new())).unwrap();
        accept_headers(&consensus, &blocks).unwrap();
        connect_all(&consensus, &mut tracker, &blocks[..3], 1);
        consensus.flush().unwrap();
        consensus.accumulator_snapshot()
    };

    let store = DbChainStore::new(db, 16);
    store.check_integrity().unwrap();
    let consensus = Consensus::new(config, store, Arc::new(OpTrueVerifier::new())).unwrap();
    let tip = consensus.chain_tip();
    assert_eq!(tip.best_block, blocks[3].hash());
    assert_eq!(tip.validation_index, blocks[2].hash());
    assert_eq!(consensus.accumulator_snapshot(), snapshot);
    assert_eq!(consensus.get_block_status(blocks[3].hash()).unwrap(), Some(BlockStatus::HeadersOnly(4)));

    connect(&consensus, &mut tracker, &blocks[3], 4).unwrap();
    assert!(consensus.chain_tip().is_synced());
}

#[test]
fn test_empty_store_bootstraps_genesis() {
    let consensus = default_consensus();
    let genesis = genesis_header();
    assert_eq!(consensus.accumulator_snapshot(), Stump::new());
    assert_eq!(consensus.store().snapshot_heights(), vec![0]);
    assert!(!consensus.store().has_staged_writes());
    assert!(consensus.is_valid(genesis.hash).unwrap());

    let store: MemoryChainStore = consensus.into_store();
    assert_eq!(store.load_chain_tip().unwrap().map(|tip| tip.best_block), Some(genesis.hash));
}
