use arbor_consensus_core::{config::params::Params, script::ScriptFlags};
use arbor_hashes::Hash;

/// Script verification flags in effect for the block `hash` at `height`.
/// Flags accumulate as activation heights are crossed, except for the historical
/// blocks listed in the network exception table.
pub fn script_flags_for_block(params: &Params, height: u32, hash: Hash) -> ScriptFlags {
    if let Some((_, flags)) = params.script_flag_exceptions.iter().find(|(exception, _)| *exception == hash) {
        return *flags;
    }

    let activations = [
        (params.bip16_height, ScriptFlags::P2SH),
        (params.bip66_height, ScriptFlags::DERSIG),
        (params.bip65_height, ScriptFlags::CHECKLOCKTIMEVERIFY),
        (params.csv_height, ScriptFlags::CHECKSEQUENCEVERIFY),
        (params.segwit_height, ScriptFlags::WITNESS | ScriptFlags::NULLDUMMY),
        (params.taproot_height, ScriptFlags::TAPROOT),
    ];
    activations.into_iter().filter(|(activation, _)| height >= *activation).fold(ScriptFlags::empty(), |acc, (_, flags)| acc | flags)
}
