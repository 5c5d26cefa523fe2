use arbor_hashes::Hash;

/// The constant fields of a network's first block. The block body is never processed:
/// its coinbase output is not spendable, so the accumulator starts empty.
#[derive(Clone, Debug)]
pub struct GenesisBlock {
    pub hash: Hash,
    pub version: i32,
    pub merkle_root: Hash,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

/// Merkle root shared by every network, the id of the single genesis coinbase
const GENESIS_MERKLE_ROOT: Hash = Hash::from_bytes([
    0x3b, 0xa3, 0xed, 0xfd, 0x7a, 0x7b, 0x12, 0xb2, 0x7a, 0xc7, 0x2c, 0x3e, 0x67, 0x76, 0x8f, 0x61, 0x7f, 0xc8, 0x1b, 0xc3, 0x88, 0x8a,
    0x51, 0x32, 0x3a, 0x9f, 0xb8, 0xaa, 0x4b, 0x1e, 0x5e, 0x4a,
]);

pub const GENESIS: GenesisBlock = GenesisBlock {
    hash: Hash::from_bytes([
        0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72, 0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63, 0xf7, 0x4f, 0x93, 0x1e, 0x83, 0x65, 0xe1,
        0x5a, 0x08, 0x9c, 0x68, 0xd6, 0x19, 0x00, 0x00, 0x00, 0x00, 0x00,
    ]),
    version: 1,
    merkle_root: GENESIS_MERKLE_ROOT,
    time: 1231006505,
    bits: 0x1d00ffff,
    nonce: 2083236893,
};

pub const SIGNET_GENESIS: GenesisBlock = GenesisBlock {
    hash: Hash::from_bytes([
        0xf6, 0x1e, 0xee, 0x3b, 0x63, 0xa3, 0x80, 0xa4, 0x77, 0xa0, 0x63, 0xaf, 0x32, 0xb2, 0xbb, 0xc9, 0x7c, 0x9f, 0xf9, 0xf0, 0x1f,
        0x2c, 0x42, 0x25, 0xe9, 0x73, 0x98, 0x81, 0x08, 0x00, 0x00, 0x00,
    ]),
    version: 1,
    merkle_root: GENESIS_MERKLE_ROOT,
    time: 1598918400,
    bits: 0x1e0377ae,
    nonce: 52613770,
};

pub const REGTEST_GENESIS: GenesisBlock = GenesisBlock {
    hash: Hash::from_bytes([
        0x06, 0x22, 0x6e, 0x46, 0x11, 0x1a, 0x0b, 0x59, 0xca, 0xaf, 0x12, 0x60, 0x43, 0xeb, 0x5b, 0xbf, 0x28, 0xc3, 0x4f, 0x3a, 0x5e,
        0x33, 0x2a, 0x1f, 0xc7, 0xb2, 0xb7, 0x3c, 0xf1, 0x88, 0x91, 0x0f,
    ]),
    version: 1,
    merkle_root: GENESIS_MERKLE_ROOT,
    time: 1296688602,
    bits: 0x207fffff,
    nonce: 2,
};
