use arbor_hashes::HasherBase;

pub mod header;
pub mod leaf;
pub mod tx;

/// Bitcoin wire serialization primitives on top of any hasher
pub trait HasherExtensions {
    /// Writes a `CompactSize` length prefix
    fn write_compact_size(&mut self, n: u64) -> &mut Self;

    /// Writes a length prefixed byte array
    fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self;
}

impl<T: HasherBase> HasherExtensions for T {
    #[inline(always)]
    fn write_compact_size(&mut self, n: u64) -> &mut Self {
        match n {
            0..=0xfc => self.update([n as u8]),
            0xfd..=0xffff => self.update([0xfd]).update((n as u16).to_le_bytes()),
            0x10000..=0xffff_ffff => self.update([0xfe]).update((n as u32).to_le_bytes()),
            _ => self.update([0xff]).update(n.to_le_bytes()),
        }
    }

    #[inline(always)]
    fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_compact_size(bytes.len() as u64).update(bytes)
    }
}

/// A sink which only counts the bytes fed to it, used for size and weight computations
#[derive(Default, Clone, Copy)]
pub struct SizeCounter(pub usize);

impl HasherBase for SizeCounter {
    #[inline(always)]
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.0 += data.as_ref().len();
        self
    }
}

pub fn compact_size_len(n: u64) -> usize {
    let mut counter = SizeCounter::default();
    counter.write_compact_size(n);
    counter.0
}
