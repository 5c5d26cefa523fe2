pub mod uint;

construct_uint!(Uint256, 4);
construct_uint!(Uint320, 5);

impl Uint256 {
    /// Decodes a compact ("nBits") target. The encoding is a base-256 float with
    /// a 3 byte signed mantissa and a 1 byte exponent. Returns `None` for negative
    /// mantissas and for values that do not fit in 256 bits.
    pub fn from_compact_target_bits(bits: u32) -> Option<Self> {
        let exponent = bits >> 24;
        let mantissa = bits & 0x00ff_ffff;
        if mantissa > 0x007f_ffff {
            return None;
        }
        if exponent <= 3 {
            return Some(Uint256::from_u64((mantissa >> (8 * (3 - exponent))) as u64));
        }
        if mantissa == 0 {
            return Some(Uint256::ZERO);
        }
        let shift = 8 * (exponent - 3);
        if shift >= Self::BITS || Uint256::from_u64(mantissa as u64).bits() + shift > Self::BITS {
            return None;
        }
        Some(Uint256::from_u64(mantissa as u64) << shift)
    }

    /// Encodes the value in compact form, truncating to the 3 most significant bytes
    pub fn compact_target_bits(self) -> u32 {
        let mut size = self.bits().div_ceil(8);
        let mut compact = if size <= 3 { (self.as_u64() << (8 * (3 - size))) as u32 } else { (self >> (8 * (size - 3))).as_u64() as u32 };
        if (compact & 0x0080_0000) != 0 {
            compact >>= 8;
            size += 1;
        }
        compact | (size << 24)
    }
}

impl From<Uint256> for Uint320 {
    fn from(value: Uint256) -> Self {
        let mut words = [0u64; 5];
        words[..4].copy_from_slice(&value.0);
        Uint320(words)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryFromIntError;

impl core::fmt::Display for TryFromIntError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("out of range integral type conversion attempted")
    }
}

impl std::error::Error for TryFromIntError {}

impl TryFrom<Uint320> for Uint256 {
    type Error = TryFromIntError;

    fn try_from(value: Uint320) -> Result<Self, Self::Error> {
        if value.0[4] != 0 {
            return Err(TryFromIntError);
        }
        let mut words = [0u64; 4];
        words.copy_from_slice(&value.0[..4]);
        Ok(Uint256(words))
    }
}
