//!
//! Block connection, notifications and interval validation.
//!

mod common;

use arbor_accumulator::Stump;
use arbor_consensus::{
    consensus::Consensus,
    interval::{spawn_interval_worker, BlockBundle, IntervalOutcome, IntervalValidator},
    model::stores::MemoryChainStore,
    test_helpers::{build_block, build_empty_block, coinbase_tx, genesis_header, spend_tx, ConnectData, UtxoTracker},
};
use arbor_consensus_core::{
    api::ConsensusApi,
    block::Block,
    blockstatus::BlockStatus,
    config::{params::REGTEST_PARAMS, Config, ConfigBuilder},
    errors::{AccumulatorError, BlockProcessError, ConsensusError, SequencingError, StructuralError, TxRuleError},
    hashing::leaf::utxo_leaf_hash,
    script::{ScriptError, ScriptFlags, ScriptVerifier},
    testutils::op_true_script::OpTrueVerifier,
    tx::{PopulatedTransaction, Transaction, TransactionInput, TransactionOutpoint, TransactionOutput},
};
use common::*;
use std::{sync::Arc, time::Duration};

const FEE: u64 = 10_000;

/// Regtest with coinbase outputs spendable by the next block
fn spendable_config() -> Config {
    ConfigBuilder::new(REGTEST_PARAMS).edit_consensus_params(|params| params.coinbase_maturity = 1).build()
}

fn outpoint(tx: &Transaction, index: u32) -> TransactionOutpoint {
    TransactionOutpoint::new(tx.id(), index)
}

/// A chain where every block spends the previous coinbase, spends one of its own outputs
/// and spends an output left over by the previous block
fn mine_spending_chain(count: u32) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::with_capacity(count as usize);
    let mut previous_split: Option<Transaction> = None;
    for height in 1..=count {
        let mut txs = Vec::new();
        let mut fees = 0;
        let mut split = None;
        if let Some(parent) = blocks.last() {
            if let Some(previous_split) = previous_split.take() {
                let leftover = previous_split.outputs[1].value;
                txs.push(spend_tx(&[outpoint(&previous_split, 1)], &[leftover - FEE]));
                fees += FEE;
            }
            let coinbase = &parent.transactions[0];
            let value = coinbase.outputs[0].value;
            let split_tx = spend_tx(&[outpoint(coinbase, 0)], &[value / 2, value / 2 - FEE]);
            let chained = spend_tx(&[outpoint(&split_tx, 0)], &[value / 2 - FEE]);
            fees += value - (value / 2 + value / 2 - FEE) + FEE;
            txs.push(split_tx.clone());
            txs.push(chained);
            split = Some(split_tx);
        }
        previous_split = split;
        let parent = blocks.last().map(|block| block.header.clone()).unwrap_or_else(genesis_header);
        txs.insert(0, coinbase_tx(height, REGTEST_PARAMS.block_subsidy(height) + fees, 0));
        blocks.push(build_block(&parent, txs));
    }
    blocks
}

/// Proof data for every block of `blocks`, starting from an empty accumulator
fn connect_data_for(blocks: &[Block]) -> Vec<ConnectData> {
    let mut tracker = UtxoTracker::new();
    (1..)
        .zip(blocks)
        .map(|(height, block)| {
            let data = tracker.connect_data(block).unwrap();
            tracker.apply(block, height).unwrap();
            data
        })
        .collect()
}

#[test]
fn test_connect_blocks_with_spends() {
    let consensus = memory_consensus(spendable_config());
    let mut tracker = UtxoTracker::new();
    let blocks = mine_spending_chain(4);
    accept_headers(&consensus, &blocks).unwrap();

    for (height, block) in (1..).zip(&blocks) {
        assert_eq!(connect(&consensus, &mut tracker, block, height).unwrap(), height);
        assert_eq!(consensus.get_block_status(block.hash()).unwrap(), Some(BlockStatus::FullyValid(height)));
        assert_eq!(consensus.accumulator_snapshot(), tracker.stump());
    }

    let tip = consensus.chain_tip();
    assert!(tip.is_synced());
    assert_eq!(tip.validation_height, 4);
    assert_eq!(consensus.store().snapshot_heights(), vec![0, 1, 2, 3, 4]);
    let counters = consensus.counters_snapshot();
    assert_eq!(counters.body_counts, 4);
    assert_eq!(counters.txs_counts, blocks.iter().map(|block| block.transactions.len() as u64).sum::<u64>());
}

#[test]
fn test_connect_sequencing_rules() {
    let consensus = default_consensus();
    let mut tracker = UtxoTracker::new();
    let blocks = mine_chain(3);

    let unknown = tracker.connect_data(&blocks[0]).unwrap();
    let err = consensus.connect_block(blocks[0].clone(), unknown.proof, unknown.spent_outputs, unknown.deletions).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::UnknownBlock(_))));

    accept_headers(&consensus, &blocks).unwrap();
    let err = connect(&consensus, &mut tracker.clone(), &blocks[1], 2).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::OutOfOrder { height: 2, expected: 1, .. })));

    assert_eq!(connect(&consensus, &mut tracker, &blocks[0], 1).unwrap(), 1);
    // Retrying the block at the validation index is harmless
    assert_eq!(connect(&consensus, &mut tracker.clone(), &blocks[0], 1).unwrap(), 1);
    assert_eq!(consensus.counters_snapshot().body_counts, 1);

    connect(&consensus, &mut tracker, &blocks[1], 2).unwrap();
    let err = connect(&consensus, &mut tracker.clone(), &blocks[0], 1).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::DoesNotExtendValidatedTip(_))));

    // A fork block is never connected
    let fork = build_empty_block(&blocks[0].header, 2, 0xf);
    consensus.accept_header(fork.header.clone()).unwrap();
    let err = connect(&consensus, &mut tracker.clone(), &fork, 2).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::DoesNotExtendValidatedTip(_))));
}

#[test]
fn test_structural_failures_keep_block_placeable() {
    let consensus = default_consensus();
    let mut tracker = UtxoTracker::new();
    let genesis = genesis_header();
    let block = build_empty_block(&genesis, 1, 0);
    consensus.accept_header(block.header.clone()).unwrap();

    // Same header, different body
    let wrong_body = Block::new(block.header.clone(), vec![coinbase_tx(1, 1, 7)]);
    let err = connect(&consensus, &mut tracker.clone(), &wrong_body, 1).unwrap_err();
    assert!(matches!(err, BlockProcessError::Structural(StructuralError::BadMerkleRoot(..))));

    // Header fields changed after hashing
    let mut tampered = block.clone();
    tampered.header.time += 1;
    let err = connect(&consensus, &mut tracker.clone(), &tampered, 1).unwrap_err();
    assert!(matches!(err, BlockProcessError::Structural(StructuralError::HeaderMismatch(_))));

    assert_eq!(consensus.get_block_status(block.hash()).unwrap(), Some(BlockStatus::HeadersOnly(1)));
    assert_eq!(connect(&consensus, &mut tracker, &block, 1).unwrap(), 1);
}

#[test]
fn test_excessive_coinbase_payout_invalidates_block() {
    let consensus = default_consensus();
    let mut tracker = UtxoTracker::new();
    let genesis = genesis_header();

    let greedy = build_block(&genesis, vec![coinbase_tx(1, REGTEST_PARAMS.block_subsidy(1) + 1, 0)]);
    let child = build_empty_block(&greedy.header, 2, 0);
    accept_headers(&consensus, &[greedy.clone(), child.clone()]).unwrap();

    let err = connect(&consensus, &mut tracker, &greedy, 1).unwrap_err();
    assert!(matches!(err, BlockProcessError::Consensus(ConsensusError::BadCoinbasePayout(..))));
    assert_eq!(consensus.get_block_status(greedy.hash()).unwrap(), Some(BlockStatus::InvalidChain));
    assert_eq!(consensus.get_block_status(child.hash()).unwrap(), Some(BlockStatus::InvalidChain));
    assert_eq!(consensus.best_block(), genesis.hash);
    assert_eq!(consensus.accumulator_snapshot(), Stump::new());
}

#[test]
fn test_immature_coinbase_spend_is_rejected() {
    let consensus = default_consensus();
    let mut tracker = UtxoTracker::new();
    let b1 = build_empty_block(&genesis_header(), 1, 0);
    let spend = spend_tx(&[outpoint(&b1.transactions[0], 0)], &[FEE]);
    let fee = b1.transactions[0].outputs[0].value - FEE;
    let b2 = build_block(&b1.header, vec![coinbase_tx(2, REGTEST_PARAMS.block_subsidy(2) + fee, 0), spend.clone()]);
    accept_headers(&consensus, &[b1.clone(), b2.clone()]).unwrap();
    connect(&consensus, &mut tracker, &b1, 1).unwrap();

    let err = connect(&consensus, &mut tracker, &b2, 2).unwrap_err();
    match err {
        BlockProcessError::Transaction { txid, source } => {
            assert_eq!(txid, spend.id());
            assert_eq!(source, TxRuleError::ImmatureCoinbaseSpend(0, 1, 1 + REGTEST_PARAMS.coinbase_maturity));
        }
        err => panic!("unexpected error {err}"),
    }
    assert_eq!(consensus.get_block_status(b2.hash()).unwrap(), Some(BlockStatus::InvalidChain));
    assert_eq!(consensus.validation_index(), b1.hash());
}

/// Builds genesis <- b1 <- b2 <- b3 where b2 carries a transaction failing script verification
fn mine_chain_with_bad_script() -> (Vec<Block>, Transaction) {
    let b1 = build_empty_block(&genesis_header(), 1, 0);
    let coinbase = &b1.transactions[0];
    let bad = Transaction::new(
        2,
        vec![TransactionInput::new(outpoint(coinbase, 0), vec![0x00], u32::MAX)],
        vec![TransactionOutput::new(coinbase.outputs[0].value - FEE, vec![0x51])],
        0,
    );
    let b2 = build_block(&b1.header, vec![coinbase_tx(2, REGTEST_PARAMS.block_subsidy(2) + FEE, 0), bad.clone()]);
    let b3 = build_empty_block(&b2.header, 3, 0);
    (vec![b1, b2, b3], bad)
}

#[test]
fn test_script_failure_and_assume_valid() {
    let (blocks, bad) = mine_chain_with_bad_script();

    let consensus = memory_consensus(spendable_config());
    let mut tracker = UtxoTracker::new();
    accept_headers(&consensus, &blocks).unwrap();
    connect(&consensus, &mut tracker, &blocks[0], 1).unwrap();
    let err = connect(&consensus, &mut tracker, &blocks[1], 2).unwrap_err();
    match err {
        BlockProcessError::Transaction { txid, source: TxRuleError::ScriptFailure(ScriptError::EvalFalse(0, _)) } => assert_eq!(txid, bad.id()),
        err => panic!("unexpected error {err}"),
    }

    // Below the assume-valid block scripts are not checked
    let config = spendable_config().to_builder().set_assume_valid(blocks[2].hash()).build();
    let verifier = Arc::new(OpTrueVerifier::new());
    let consensus = Consensus::new(Arc::new(config), MemoryChainStore::new(), verifier.clone()).unwrap();
    let mut tracker = UtxoTracker::new();
    accept_headers(&consensus, &blocks).unwrap();
    assert_eq!(consensus.chain_tip().assume_valid_index, Some(3));
    connect_all(&consensus, &mut tracker, &blocks, 1);
    assert_eq!(consensus.get_block_status(blocks[1].hash()).unwrap(), Some(BlockStatus::FullyValid(2)));
    assert_eq!(verifier.verified_count(), 0);
}

#[test]
fn test_accumulator_failures_do_not_invalidate() {
    let consensus = memory_consensus(spendable_config());
    let mut tracker = UtxoTracker::new();
    let blocks = mine_spending_chain(2);
    accept_headers(&consensus, &blocks).unwrap();
    connect(&consensus, &mut tracker, &blocks[0], 1).unwrap();

    let data = tracker.connect_data(&blocks[1]).unwrap();
    assert_eq!(data.deletions.len(), 1);

    let err = consensus.connect_block(blocks[1].clone(), data.proof.clone(), data.spent_outputs.clone(), vec![]).unwrap_err();
    assert!(matches!(err, BlockProcessError::Accumulator(AccumulatorError::DeletionHashMismatch)));

    let err = consensus.connect_block(blocks[1].clone(), data.proof.clone(), Default::default(), data.deletions.clone()).unwrap_err();
    assert!(matches!(err, BlockProcessError::Transaction { source: TxRuleError::MissingSpentOutput(_), .. }));

    let err = consensus.connect_block(blocks[1].clone(), Default::default(), data.spent_outputs.clone(), data.deletions.clone()).unwrap_err();
    assert!(matches!(err, BlockProcessError::Accumulator(AccumulatorError::Proof(_))));

    assert_eq!(consensus.get_block_status(blocks[1].hash()).unwrap(), Some(BlockStatus::HeadersOnly(2)));
    assert_eq!(consensus.accumulator_snapshot(), tracker.stump());
    assert_eq!(consensus.connect_block(blocks[1].clone(), data.proof, data.spent_outputs, data.deletions).unwrap(), 2);
}

#[test]
fn test_forged_spent_outputs_do_not_invalidate() {
    let consensus = memory_consensus(spendable_config());
    let mut tracker = UtxoTracker::new();
    let blocks = mine_spending_chain(2);
    accept_headers(&consensus, &blocks).unwrap();
    connect(&consensus, &mut tracker, &blocks[0], 1).unwrap();
    let data = tracker.connect_data(&blocks[1]).unwrap();

    // Understating the spent amount would make the block overspend
    let mut forged = data.spent_outputs.clone();
    forged.values_mut().for_each(|entry| entry.amount = 1);
    let err = consensus.connect_block(blocks[1].clone(), data.proof.clone(), forged.clone(), data.deletions.clone()).unwrap_err();
    assert!(matches!(err, BlockProcessError::Accumulator(AccumulatorError::DeletionHashMismatch)));

    // Deletion hashes matching the forged entries are not in the accumulator
    let forged_deletions = forged.iter().map(|(outpoint, entry)| utxo_leaf_hash(outpoint, entry)).collect();
    let err = consensus.connect_block(blocks[1].clone(), data.proof.clone(), forged, forged_deletions).unwrap_err();
    assert!(matches!(err, BlockProcessError::Accumulator(AccumulatorError::Proof(_))));

    assert_eq!(consensus.get_block_status(blocks[1].hash()).unwrap(), Some(BlockStatus::HeadersOnly(2)));
    assert_eq!(consensus.best_block(), blocks[1].hash());
    assert_eq!(consensus.connect_block(blocks[1].clone(), data.proof, data.spent_outputs, data.deletions).unwrap(), 2);
    assert_eq!(consensus.get_block_status(blocks[1].hash()).unwrap(), Some(BlockStatus::FullyValid(2)));
}

/// Accepts the same spends as [`OpTrueVerifier`] but takes its time doing so
struct SlowVerifier(OpTrueVerifier);

impl ScriptVerifier for SlowVerifier {
    fn verify(&self, tx: &PopulatedTransaction, flags: ScriptFlags) -> Result<(), ScriptError> {
        std::thread::sleep(Duration::from_millis(100));
        self.0.verify(tx, flags)
    }
}

#[test]
fn test_concurrent_connection_of_the_same_block() {
    init_test_logger();
    let consensus = Consensus::new(Arc::new(spendable_config()), MemoryChainStore::new(), Arc::new(SlowVerifier(OpTrueVerifier::new()))).unwrap();
    let mut tracker = UtxoTracker::new();
    let blocks = mine_spending_chain(2);
    accept_headers(&consensus, &blocks).unwrap();
    connect(&consensus, &mut tracker, &blocks[0], 1).unwrap();
    let notifications = consensus.subscribe(false);
    let data = tracker.connect_data(&blocks[1]).unwrap();

    // Both callers validate against the same tip, the later one to commit finds the block connected
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let data = data.clone();
                let (consensus, block) = (&consensus, blocks[1].clone());
                scope.spawn(move || consensus.connect_block(block, data.proof, data.spent_outputs, data.deletions))
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });
    for result in results {
        assert_eq!(result.unwrap(), 2);
    }

    assert_eq!(consensus.validation_index(), blocks[1].hash());
    assert_eq!(consensus.counters_snapshot().body_counts, 2);
    assert_eq!(notifications.try_recv().unwrap().height, 2);
    assert!(notifications.try_recv().is_err());
}

#[test]
fn test_block_connected_notifications() {
    let consensus = memory_consensus(spendable_config());
    let mut tracker = UtxoTracker::new();
    let plain = consensus.subscribe(false);
    let detailed = consensus.subscribe(true);

    let blocks = mine_spending_chain(2);
    accept_headers(&consensus, &blocks).unwrap();
    connect_all(&consensus, &mut tracker, &blocks, 1);

    for (height, block) in (1..).zip(&blocks) {
        let notification = plain.try_recv().unwrap();
        assert_eq!((notification.height, notification.block.hash()), (height, block.hash()));
        assert!(notification.spent_outputs.is_none());

        let notification = detailed.try_recv().unwrap();
        assert_eq!(notification.height, height);
        let expected_spent = if height == 1 { 0 } else { 1 };
        assert_eq!(notification.spent_outputs.unwrap().len(), expected_spent);
    }
    assert!(plain.try_recv().is_err());

    // A dropped subscriber never blocks connection
    drop(detailed);
    let next = build_empty_block(&blocks[1].header, 3, 0);
    consensus.accept_header(next.header.clone()).unwrap();
    connect(&consensus, &mut tracker, &next, 3).unwrap();
    assert_eq!(plain.try_recv().unwrap().height, 3);
}

fn run_interval(config: &Arc<Config>, blocks: &[Block], data: &[ConnectData], initial_height: u32, start: Stump) -> IntervalOutcome {
    let headers = blocks.iter().map(|block| block.header.clone()).collect();
    let mut validator =
        IntervalValidator::new(config.clone(), Arc::new(OpTrueVerifier::new()), initial_height, headers, start, false).unwrap();
    for (block, data) in blocks.iter().zip(data) {
        validator.connect_next(block, &data.proof, &data.spent_outputs, &data.deletions).unwrap();
    }
    assert!(validator.is_complete());
    validator.into_outcome()
}

#[test]
fn test_split_intervals_match_single_pass() {
    let config = Arc::new(spendable_config());
    let blocks = mine_spending_chain(6);
    let data = connect_data_for(&blocks);

    let single = run_interval(&config, &blocks, &data, 1, Stump::new());
    for split in 1..blocks.len() {
        let first = run_interval(&config, &blocks[..split], &data[..split], 1, Stump::new());
        let second = run_interval(&config, &blocks[split..], &data[split..], split as u32 + 1, first.final_snapshot().clone());
        first.check_links_to(second.start_snapshot()).unwrap();
        assert_eq!(second.final_snapshot(), single.final_snapshot(), "split at {split}");
    }

    let first = run_interval(&config, &blocks[..3], &data[..3], 1, Stump::new());
    let err = first.check_links_to(&Stump::new()).unwrap_err();
    assert!(matches!(err, BlockProcessError::Accumulator(AccumulatorError::IntervalMismatch)));
}

#[test]
fn test_import_intervals() {
    let config = Arc::new(spendable_config());
    let blocks = mine_spending_chain(6);
    let data = connect_data_for(&blocks);
    let first = run_interval(&config, &blocks[..3], &data[..3], 1, Stump::new());
    let second = run_interval(&config, &blocks[3..], &data[3..], 4, first.final_snapshot().clone());

    let consensus = memory_consensus(spendable_config());
    // Headers must be on the active chain
    let err = consensus.import_interval(&first).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::UnexpectedBlock(_))));

    accept_headers(&consensus, &blocks).unwrap();
    let err = consensus.import_interval(&second).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::IntervalNotContiguous)));

    assert_eq!(consensus.import_interval(&first).unwrap(), 3);
    assert_eq!(consensus.import_interval(&second).unwrap(), 6);

    let mut tracker = UtxoTracker::new();
    for (height, block) in (1..).zip(&blocks) {
        tracker.apply(block, height).unwrap();
        assert_eq!(consensus.get_block_status(block.hash()).unwrap(), Some(BlockStatus::FullyValid(height)));
    }
    let tip = consensus.chain_tip();
    assert!(tip.is_synced());
    assert_eq!(consensus.accumulator_snapshot(), tracker.stump());
    assert_eq!(consensus.store().snapshot_heights(), (0..=6).collect::<Vec<_>>());

    // Blocks keep connecting on top of an imported range
    let next = build_empty_block(&blocks[5].header, 7, 0);
    consensus.accept_header(next.header.clone()).unwrap();
    connect(&consensus, &mut tracker, &next, 7).unwrap();
}

#[test]
fn test_assume_valid_interval_import() {
    let config = Arc::new(spendable_config());
    let (blocks, _) = mine_chain_with_bad_script();
    let data = connect_data_for(&blocks);
    let headers = blocks.iter().map(|block| block.header.clone()).collect::<Vec<_>>();

    let mut strict = IntervalValidator::new(config.clone(), Arc::new(OpTrueVerifier::new()), 1, headers.clone(), Stump::new(), false).unwrap();
    strict.connect_next(&blocks[0], &data[0].proof, &data[0].spent_outputs, &data[0].deletions).unwrap();
    assert!(strict.connect_next(&blocks[1], &data[1].proof, &data[1].spent_outputs, &data[1].deletions).is_err());
    assert!(strict.has_error());
    assert_eq!(strict.current_height(), 2);
    assert!(matches!(strict.take_error(), Some(BlockProcessError::Transaction { source: TxRuleError::ScriptFailure(_), .. })));
    assert!(!strict.has_error());
    // Taking the error does not resume the interval
    let err = strict.connect_next(&blocks[1], &data[1].proof, &data[1].spent_outputs, &data[1].deletions).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::IntervalHalted)));

    let mut assumed = IntervalValidator::new(config, Arc::new(OpTrueVerifier::new()), 1, headers, Stump::new(), true).unwrap();
    for (block, data) in blocks.iter().zip(&data) {
        assumed.connect_next(block, &data.proof, &data.spent_outputs, &data.deletions).unwrap();
    }
    let outcome = assumed.into_outcome();

    let consensus = memory_consensus(spendable_config());
    accept_headers(&consensus, &blocks).unwrap();
    consensus.import_interval(&outcome).unwrap();
    for (height, block) in (1..).zip(&blocks) {
        assert_eq!(consensus.get_block_status(block.hash()).unwrap(), Some(BlockStatus::AssumedValid(height)));
        assert!(consensus.is_valid(block.hash()).unwrap());
    }
}

#[test]
fn test_interval_halts_on_first_failure() {
    let config = Arc::new(spendable_config());
    let genesis = genesis_header();
    let good = build_empty_block(&genesis, 1, 0);
    let greedy = build_block(&good.header, vec![coinbase_tx(2, REGTEST_PARAMS.block_subsidy(2) + 1, 0)]);
    let after = build_empty_block(&greedy.header, 3, 0);
    let blocks = vec![good, greedy, after];
    let data = connect_data_for(&blocks);
    let headers = blocks.iter().map(|block| block.header.clone()).collect();

    let mut validator = IntervalValidator::new(config, Arc::new(OpTrueVerifier::new()), 1, headers, Stump::new(), false).unwrap();
    assert!(matches!(validator.accept_header(blocks[0].header.clone()), Err(BlockProcessError::UnsupportedOperation(_))));
    assert!(matches!(validator.reorg(blocks[0].hash()), Err(BlockProcessError::UnsupportedOperation(_))));
    assert!(matches!(validator.invalidate_block(blocks[0].hash()), Err(BlockProcessError::UnsupportedOperation(_))));

    // Blocks must come in header order
    let err = validator.connect_next(&blocks[1], &data[1].proof, &data[1].spent_outputs, &data[1].deletions).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::UnexpectedBlock(_))));
    assert!(!validator.has_error());

    validator.connect_next(&blocks[0], &data[0].proof, &data[0].spent_outputs, &data[0].deletions).unwrap();
    let snapshot_after_good = validator.snapshot().clone();
    let err = validator.connect_next(&blocks[1], &data[1].proof, &data[1].spent_outputs, &data[1].deletions).unwrap_err();
    assert!(matches!(err, BlockProcessError::Consensus(ConsensusError::BadCoinbasePayout(..))));
    assert!(validator.has_error());

    let err = validator.connect_next(&blocks[2], &data[2].proof, &data[2].spent_outputs, &data[2].deletions).unwrap_err();
    assert!(matches!(err, BlockProcessError::Sequencing(SequencingError::IntervalHalted)));
    assert_eq!(validator.snapshot(), &snapshot_after_good);

    let outcome = validator.into_outcome();
    assert!(!outcome.is_complete());
    assert!(matches!(outcome.error(), Some(BlockProcessError::Consensus(ConsensusError::BadCoinbasePayout(..)))));

    let consensus = memory_consensus(spendable_config());
    accept_headers(&consensus, &blocks).unwrap();
    let err = consensus.import_interval(&outcome).unwrap_err();
    assert!(matches!(err, BlockProcessError::Consensus(ConsensusError::BadCoinbasePayout(..))));
    assert_eq!(consensus.validation_index(), genesis.hash);
}

#[test]
fn test_interval_workers_report_over_channel() {
    let config = Arc::new(spendable_config());
    let blocks = mine_spending_chain(6);
    let data = connect_data_for(&blocks);
    let bundles: Vec<BlockBundle> = blocks
        .iter()
        .zip(&data)
        .map(|(block, data)| BlockBundle {
            block: block.clone(),
            proof: data.proof.clone(),
            spent_outputs: data.spent_outputs.clone(),
            deletions: data.deletions.clone(),
        })
        .collect();
    let headers = |range: std::ops::Range<usize>| blocks[range].iter().map(|block| block.header.clone()).collect::<Vec<_>>();

    // The start snapshot of the second interval is trusted input
    let mut tracker = UtxoTracker::new();
    for (height, block) in (1..).zip(&blocks[..3]) {
        tracker.apply(block, height).unwrap();
    }
    let middle = tracker.stump();

    let (sender, receiver) = crossbeam_channel::unbounded();
    let first = IntervalValidator::new(config.clone(), Arc::new(OpTrueVerifier::new()), 1, headers(0..3), Stump::new(), false).unwrap();
    let second = IntervalValidator::new(config.clone(), Arc::new(OpTrueVerifier::new()), 4, headers(3..6), middle.clone(), false).unwrap();
    let handles = vec![
        spawn_interval_worker(first, bundles[..3].to_vec().into_iter(), sender.clone()).unwrap(),
        spawn_interval_worker(second, bundles[3..].to_vec().into_iter(), sender.clone()).unwrap(),
    ];
    // Its source runs dry after one block
    let starved = IntervalValidator::new(config, Arc::new(OpTrueVerifier::new()), 4, headers(3..6), middle, false).unwrap();
    handles.into_iter().chain([spawn_interval_worker(starved, bundles[3..4].to_vec().into_iter(), sender).unwrap()]).for_each(|handle| {
        handle.join().unwrap();
    });

    let mut outcomes: Vec<IntervalOutcome> = receiver.iter().collect();
    assert_eq!(outcomes.len(), 3);
    outcomes.sort_by_key(|outcome| (outcome.initial_height(), outcome.is_complete()));
    let [first, starved, second] = outcomes.try_into().unwrap();

    assert!(matches!(starved.error(), Some(BlockProcessError::Sequencing(SequencingError::MissingBlock(5)))));
    assert!(first.is_complete() && second.is_complete());
    first.check_links_to(second.start_snapshot()).unwrap();
    let mut full = UtxoTracker::new();
    for (height, block) in (1..).zip(&blocks) {
        full.apply(block, height).unwrap();
    }
    assert_eq!(second.final_snapshot(), &full.stump());
}
