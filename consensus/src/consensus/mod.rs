use crate::{
    interval::IntervalOutcome,
    model::{chain_state::ChainState, stores::ChainStore},
    notify::{BlockConnectedNotification, ConsensusNotificationRoot},
    pipeline::{
        body_processor::{BlockBodyProcessor, BlockValidationInput},
        header_processor::HeaderProcessor,
    },
    processes::transaction_validator::tx_validation_in_utxo_context::TxValidationFlags,
};
use arbor_accumulator::{Proof, Stump};
use arbor_consensus_core::{
    api::{
        counters::{ProcessingCounters, ProcessingCountersSnapshot},
        ConsensusApi,
    },
    block::Block,
    blockstatus::BlockStatus,
    chain_tip::ChainTip,
    config::Config,
    errors::{AccumulatorError, BlockProcessError, BlockProcessResult, SequencingError, StructuralError},
    header::Header,
    header_record::HeaderRecord,
    script::ScriptVerifier,
    utxo::UtxoMap,
};
use arbor_core::{debug, info, time::Stopwatch, trace, warn};
use arbor_hashes::Hash;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use std::sync::{atomic::Ordering, Arc};

/// The consensus engine. Owns the chain store and serializes every mutation of the chain
/// tip through a single lock. Block bodies are validated outside the lock against a copy
/// of the accumulator snapshot, so queries are never blocked by script verification.
pub struct Consensus<S: ChainStore> {
    config: Arc<Config>,
    state: RwLock<ChainState<S>>,

    header_processor: HeaderProcessor,
    body_processor: BlockBodyProcessor,

    notification_root: ConsensusNotificationRoot,
    counters: Arc<ProcessingCounters>,
}

impl<S: ChainStore> Consensus<S> {
    /// Opens the engine over `store`, bootstrapping the genesis block on an empty store and
    /// reconciling unflushed state otherwise
    pub fn new(config: Arc<Config>, store: S, script_verifier: Arc<dyn ScriptVerifier>) -> BlockProcessResult<Self> {
        store.check_integrity().map_err(BlockProcessError::storage)?;
        let counters = Arc::new(ProcessingCounters::default());
        let header_processor = HeaderProcessor::new(config.clone(), counters.clone());
        let body_processor = BlockBodyProcessor::new(config.clone(), script_verifier);

        let state = match store.load_chain_tip().map_err(BlockProcessError::storage)? {
            Some(tip) => Self::reopen(&header_processor, store, tip)?,
            None => Self::bootstrap(&config, store)?,
        };

        Ok(Self {
            config,
            state: RwLock::new(state),
            header_processor,
            body_processor,
            notification_root: ConsensusNotificationRoot::new(),
            counters,
        })
    }

    fn bootstrap(config: &Config, store: S) -> BlockProcessResult<ChainState<S>> {
        let genesis = Header::from(&config.genesis);
        info!("initializing chain state with genesis block {}", genesis.hash);
        let mut state = ChainState::new(store, ChainTip::from_genesis(genesis.hash), Stump::new());
        state.save_record(&HeaderRecord::new(genesis.clone(), BlockStatus::FullyValid(0)))?;
        state.save_height_index(0, genesis.hash)?;
        state.save_snapshot(0, &Stump::new())?;
        state.save_tip()?;
        state.flush()?;
        Ok(state)
    }

    /// Records above the persisted validation index may carry a validated status whose tip
    /// and snapshot writes were lost. They are demoted so their blocks get connected again.
    fn reopen(header_processor: &HeaderProcessor, store: S, tip: ChainTip) -> BlockProcessResult<ChainState<S>> {
        let mut state = ChainState::new(store, tip, Stump::new());
        state.accumulator = state.load_snapshot(state.tip.validation_height)?;

        header_processor.reconcile_active_chain(&mut state)?;
        info!(
            "chain state loaded: best block {} at height {}, validation index {} at height {}",
            state.tip.best_block, state.tip.depth, state.tip.validation_index, state.tip.validation_height
        );
        Ok(state)
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Places `header` in the header tree and returns its resulting status
    pub fn accept_header(&self, header: Header) -> BlockProcessResult<BlockStatus> {
        let mut state = self.state.write();
        self.header_processor.accept_header(&mut state, header)
    }

    /// Connects the block right above the validation index and returns its height.
    ///
    /// `spent_outputs` must hold every output the block spends from earlier blocks, and
    /// `deletions` their leaf hashes in the order proven by `proof`.
    pub fn connect_block(&self, block: Block, proof: Proof, spent_outputs: UtxoMap, deletions: Vec<Hash>) -> BlockProcessResult<u32> {
        let _sw = Stopwatch::<500>::with_threshold("connect_block");
        let hash = block.hash();

        let (height, validation_index, snapshot, flags) = {
            let state = self.state.read();
            let record = state.known_header(hash)?;
            if !block.header.is_finalized() || block.header != record.header {
                return Err(StructuralError::HeaderMismatch(hash).into());
            }
            let height = match record.status {
                BlockStatus::FullyValid(height) if state.tip.validation_index == hash => {
                    debug!("block {} at height {} is already connected", hash, height);
                    return Ok(height);
                }
                BlockStatus::HeadersOnly(height) => height,
                _ => return Err(SequencingError::DoesNotExtendValidatedTip(hash).into()),
            };
            let expected = state.tip.validation_height + 1;
            if height != expected {
                return Err(SequencingError::OutOfOrder { hash, height, expected }.into());
            }
            if record.header.prev_block_hash != state.tip.validation_index {
                return Err(SequencingError::DoesNotExtendValidatedTip(hash).into());
            }
            let flags = match state.tip.assume_valid_index {
                Some(assumed) if height <= assumed => TxValidationFlags::SkipScriptChecks,
                _ => TxValidationFlags::Full,
            };
            (height, state.tip.validation_index, state.accumulator.clone(), flags)
        };

        let input = BlockValidationInput { block: &block, height, proof: &proof, spent_outputs: &spent_outputs, deletions: &deletions };
        let outcome = match self.body_processor.validate_block(&input, &snapshot, flags) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("block {} at height {} failed validation: {}", hash, height, err);
                if err.invalidates_block()
                    && let Err(invalidation_err) = self.invalidate_block(hash)
                {
                    warn!("failed to invalidate block {}: {}", hash, invalidation_err);
                }
                return Err(err);
            }
        };

        {
            let mut state = self.state.write();
            let record = state.known_header(hash)?;
            if record.status == BlockStatus::FullyValid(height) && state.tip.validation_index == hash {
                debug!("block {} at height {} was connected by a concurrent caller", hash, height);
                return Ok(height);
            }
            if record.status != BlockStatus::HeadersOnly(height) || state.tip.validation_index != validation_index {
                return Err(SequencingError::DoesNotExtendValidatedTip(hash).into());
            }
            state.set_status(record, BlockStatus::FullyValid(height))?;
            state.save_snapshot(height, &outcome.snapshot)?;
            self.prune_snapshots(&mut state, height)?;
            state.accumulator = outcome.snapshot;
            state.tip.validation_index = hash;
            state.tip.validation_height = height;
            state.save_tip()?;

            state.blocks_since_flush += 1;
            if state.tip.is_synced() || state.blocks_since_flush >= self.config.perf.flush_interval {
                state.flush()?;
            }
        }

        self.counters.body_counts.fetch_add(1, Ordering::Relaxed);
        self.counters.txs_counts.fetch_add(block.transactions.len() as u64, Ordering::Relaxed);
        debug!("connected block {} at height {} with {} transactions, fees {}", hash, height, block.transactions.len(), outcome.fees);

        self.notification_root.notify_block_connected(&block, height, spent_outputs);
        Ok(height)
    }

    /// Deletes the snapshot falling out of the retention window after connecting `height`
    fn prune_snapshots(&self, state: &mut ChainState<S>, height: u32) -> BlockProcessResult<()> {
        if let Some(depth) = self.config.snapshot_retention_depth
            && let Some(stale) = height.checked_sub(depth + 1)
        {
            trace!("pruning accumulator snapshot at height {}", stale);
            state.delete_snapshot(stale)?;
        }
        Ok(())
    }

    /// Marks `hash` and its active descendants invalid and moves the best chain away from it
    pub fn invalidate_block(&self, hash: Hash) -> BlockProcessResult<()> {
        let mut state = self.state.write();
        self.header_processor.invalidate_block(&mut state, hash)
    }

    /// Imports the blocks validated by a completed interval. The interval must start right
    /// above the validation index, from the canonical snapshot, and follow the active chain.
    pub fn import_interval(&self, outcome: &IntervalOutcome) -> BlockProcessResult<u32> {
        if let Some(err) = outcome.error() {
            return Err(err.clone());
        }
        if !outcome.is_complete() {
            return Err(SequencingError::IntervalHalted.into());
        }

        let mut state = self.state.write();
        if outcome.initial_height() != state.tip.validation_height + 1 {
            return Err(SequencingError::IntervalNotContiguous.into());
        }
        if outcome.start_snapshot() != &state.accumulator {
            return Err(AccumulatorError::IntervalMismatch.into());
        }

        let mut records = Vec::with_capacity(outcome.headers().len());
        for (height, header) in (outcome.initial_height()..).zip(outcome.headers()) {
            let record = state.header(header.hash)?.filter(|record| record.status == BlockStatus::HeadersOnly(height));
            let on_active_chain = state.active_hash_at(height)? == Some(header.hash);
            match record {
                Some(record) if on_active_chain => records.push(record),
                _ => return Err(SequencingError::UnexpectedBlock(header.hash).into()),
            }
        }

        let assumed = outcome.assume_valid();
        for (record, (height, snapshot)) in records.into_iter().zip(outcome.snapshots()) {
            let status = if assumed { BlockStatus::AssumedValid(height) } else { BlockStatus::FullyValid(height) };
            let record = state.set_status(record, status)?;
            state.save_snapshot(height, snapshot)?;
            self.prune_snapshots(&mut state, height)?;
            state.tip.validation_index = record.hash();
            state.tip.validation_height = height;
        }
        state.accumulator = outcome.final_snapshot().clone();
        state.save_tip()?;
        state.flush()?;

        let imported = outcome.headers().len() as u64;
        self.counters.body_counts.fetch_add(imported, Ordering::Relaxed);
        info!(
            "imported interval {}..={}, validation index is now {} at height {}",
            outcome.initial_height(),
            outcome.final_height(),
            state.tip.validation_index,
            state.tip.validation_height
        );
        Ok(state.tip.validation_height)
    }

    /// Persists every staged write
    pub fn flush(&self) -> BlockProcessResult<()> {
        self.state.write().flush()
    }

    pub fn subscribe(&self, include_spent_outputs: bool) -> async_channel::Receiver<BlockConnectedNotification> {
        self.notification_root.subscribe(include_spent_outputs)
    }

    pub fn processing_counters(&self) -> &Arc<ProcessingCounters> {
        &self.counters
    }

    pub fn counters_snapshot(&self) -> ProcessingCountersSnapshot {
        self.counters.snapshot()
    }

    /// Read access to the underlying store
    pub fn store(&self) -> MappedRwLockReadGuard<'_, S> {
        RwLockReadGuard::map(self.state.read(), |state| &state.store)
    }

    /// Tears the engine down and hands back the store, without flushing
    pub fn into_store(self) -> S {
        self.state.into_inner().store
    }
}

impl<S: ChainStore> ConsensusApi for Consensus<S> {
    fn best_block(&self) -> Hash {
        self.state.read().tip.best_block
    }

    fn best_height(&self) -> u32 {
        self.state.read().tip.depth
    }

    fn chain_tip(&self) -> ChainTip {
        self.state.read().tip.clone()
    }

    fn validation_index(&self) -> Hash {
        self.state.read().tip.validation_index
    }

    fn get_header(&self, hash: Hash) -> BlockProcessResult<Option<Header>> {
        Ok(self.state.read().header(hash)?.map(|record| record.header))
    }

    fn get_header_by_height(&self, height: u32) -> BlockProcessResult<Option<Header>> {
        let state = self.state.read();
        match state.active_hash_at(height)? {
            Some(hash) => Ok(state.header(hash)?.map(|record| record.header)),
            None => Ok(None),
        }
    }

    fn get_block_status(&self, hash: Hash) -> BlockProcessResult<Option<BlockStatus>> {
        self.state.read().status(hash)
    }

    fn accumulator_snapshot(&self) -> Stump {
        self.state.read().accumulator.clone()
    }
}
