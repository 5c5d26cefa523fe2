use super::BlockBodyProcessor;
use arbor_consensus_core::{
    block::Block,
    config::params::{MIN_WITNESS_COMMITMENT_LEN, WITNESS_COMMITMENT_HEADER},
    errors::{BlockProcessError, BlockProcessResult, ConsensusError, StructuralError, TxRuleError},
    merkle::{calc_tx_merkle_root, calc_witness_merkle_root, merkle_hash},
};
use arbor_hashes::Hash;
use std::collections::HashSet;

impl BlockBodyProcessor {
    pub fn validate_body_in_isolation(&self, block: &Block, height: u32) -> BlockProcessResult<()> {
        Self::check_has_transactions(block)?;
        Self::check_hash_merkle_root(block)?;
        Self::check_only_one_coinbase(block)?;
        self.check_block_weight(block)?;
        self.check_witness_commitment(block, height)?;
        self.check_coinbase_script(block, height)?;
        self.check_transactions_in_isolation(block)?;
        Self::check_block_double_spends(block)
    }

    fn check_has_transactions(block: &Block) -> BlockProcessResult<()> {
        if block.transactions.is_empty() {
            return Err(ConsensusError::EmptyBlock.into());
        }
        Ok(())
    }

    fn check_hash_merkle_root(block: &Block) -> BlockProcessResult<()> {
        let (calculated, mutated) = calc_tx_merkle_root(block.transactions.iter());
        if calculated != block.header.merkle_root {
            return Err(StructuralError::BadMerkleRoot(block.header.merkle_root, calculated).into());
        }
        if mutated {
            return Err(StructuralError::MutatedMerkleTree.into());
        }
        Ok(())
    }

    fn check_only_one_coinbase(block: &Block) -> BlockProcessResult<()> {
        if !block.transactions[0].is_coinbase() {
            return Err(StructuralError::FirstTxNotCoinbase.into());
        }
        if let Some(i) = block.transactions[1..].iter().position(|tx| tx.is_coinbase()) {
            return Err(StructuralError::MultipleCoinbases(i + 1).into());
        }
        Ok(())
    }

    fn check_block_weight(&self, block: &Block) -> BlockProcessResult<()> {
        let weight = block.weight();
        if weight > self.config.max_block_weight {
            return Err(StructuralError::BlockWeightTooHigh(weight, self.config.max_block_weight).into());
        }
        Ok(())
    }

    /// Once segwit is active, a block carrying witness data must commit to it in the last
    /// matching coinbase output. Without a commitment no witness data is allowed.
    fn check_witness_commitment(&self, block: &Block, height: u32) -> BlockProcessResult<()> {
        let coinbase = &block.transactions[0];
        let commitment_index = coinbase.outputs.iter().rposition(|output| {
            output.script_public_key.len() >= MIN_WITNESS_COMMITMENT_LEN && output.script_public_key.starts_with(&WITNESS_COMMITMENT_HEADER)
        });

        if let (true, Some(index)) = (height >= self.config.segwit_height, commitment_index) {
            let reserved = match coinbase.inputs[0].witness.as_slice() {
                [item] if item.len() == 32 => Hash::from_slice(item).ok_or(StructuralError::MissingWitnessReservedValue)?,
                _ => return Err(StructuralError::MissingWitnessReservedValue.into()),
            };
            let commitment = merkle_hash(calc_witness_merkle_root(block.transactions.iter()), reserved);
            let committed = &coinbase.outputs[index].script_public_key[WITNESS_COMMITMENT_HEADER.len()..MIN_WITNESS_COMMITMENT_LEN];
            if committed != &commitment.as_bytes()[..] {
                return Err(StructuralError::BadWitnessCommitment.into());
            }
            return Ok(());
        }

        if block.transactions.iter().any(|tx| tx.has_witness()) {
            return Err(StructuralError::UnexpectedWitness.into());
        }
        Ok(())
    }

    fn check_coinbase_script(&self, block: &Block, height: u32) -> BlockProcessResult<()> {
        let coinbase = &block.transactions[0];
        self.coinbase_manager.validate_coinbase_script_length(coinbase).map_err(|err| BlockProcessError::tx(coinbase.id(), err))?;
        self.coinbase_manager.validate_height_commitment(coinbase, height)?;
        Ok(())
    }

    fn check_transactions_in_isolation(&self, block: &Block) -> BlockProcessResult<()> {
        for tx in block.transactions.iter() {
            self.transaction_validator.validate_tx_in_isolation(tx).map_err(|err| BlockProcessError::tx(tx.id(), err))?;
        }
        Ok(())
    }

    fn check_block_double_spends(block: &Block) -> BlockProcessResult<()> {
        let mut existing = HashSet::new();
        for tx in block.transactions.iter().skip(1) {
            for input in tx.inputs.iter() {
                if !existing.insert(input.previous_outpoint) {
                    return Err(BlockProcessError::tx(tx.id(), TxRuleError::DuplicateInput(input.previous_outpoint)));
                }
            }
        }
        Ok(())
    }
}
