use crate::header::Header;
use arbor_hashes::{BlockHash, Hash, Hasher, HasherBase};

pub const HEADER_SIZE: usize = 80;

/// Feeds the 80 byte header serialization into `hasher`
pub fn write_header<H: HasherBase>(hasher: &mut H, header: &Header) {
    hasher
        .update(header.version.to_le_bytes())
        .update(header.prev_block_hash)
        .update(header.merkle_root)
        .update(header.time.to_le_bytes())
        .update(header.bits.to_le_bytes())
        .update(header.nonce.to_le_bytes());
}

/// Returns the header hash.
pub fn hash(header: &Header) -> Hash {
    let mut hasher = BlockHash::default();
    write_header(&mut hasher, header);
    hasher.finalize()
}
