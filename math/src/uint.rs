#[doc(hidden)]
pub use faster_hex;

/// Defines a fixed width unsigned integer of `$n_words` little-endian `u64` words,
/// with the arithmetic needed for proof of work targets and chain work.
#[macro_export]
macro_rules! construct_uint {
    ($name:ident, $n_words:literal $(, $derive_trait:ty)*) => {
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug$(, $derive_trait )*)]
        pub struct $name(pub [u64; $n_words]);

        #[allow(unused)]
        impl $name {
            pub const ZERO: Self = $name([0; $n_words]);
            pub const MAX: Self = $name([u64::MAX; $n_words]);
            pub const BITS: u32 = $n_words * u64::BITS;
            pub const BYTES: usize = $n_words * 8;

            #[inline]
            pub const fn from_u64(n: u64) -> Self {
                let mut words = [0u64; $n_words];
                words[0] = n;
                $name(words)
            }

            /// The least significant word
            #[inline]
            pub fn as_u64(self) -> u64 {
                self.0[0]
            }

            #[inline]
            pub fn is_zero(self) -> bool {
                self.0.iter().all(|&word| word == 0)
            }

            /// Number of significant bits
            #[inline]
            pub fn bits(&self) -> u32 {
                match self.0.iter().rposition(|&word| word != 0) {
                    Some(i) => (i as u32 + 1) * u64::BITS - self.0[i].leading_zeros(),
                    None => 0,
                }
            }

            /// Shifts left by `s % BITS`, flagging shifts of `BITS` or more
            pub fn overflowing_shl(self, s: u32) -> (Self, bool) {
                let shift = s % Self::BITS;
                let (words, offset) = ((shift / 64) as usize, shift % 64);
                let mut out = [0u64; $n_words];
                for i in words..$n_words {
                    out[i] = self.0[i - words] << offset;
                    if offset > 0 && i > words {
                        out[i] |= self.0[i - words - 1] >> (64 - offset);
                    }
                }
                ($name(out), s >= Self::BITS)
            }

            /// Shifts right by `s % BITS`, flagging shifts of `BITS` or more
            pub fn overflowing_shr(self, s: u32) -> (Self, bool) {
                let shift = s % Self::BITS;
                let (words, offset) = ((shift / 64) as usize, shift % 64);
                let mut out = [0u64; $n_words];
                for i in 0..$n_words - words {
                    out[i] = self.0[i + words] >> offset;
                    if offset > 0 && i + words + 1 < $n_words {
                        out[i] |= self.0[i + words + 1] << (64 - offset);
                    }
                }
                ($name(out), s >= Self::BITS)
            }

            pub fn overflowing_add(mut self, other: Self) -> (Self, bool) {
                let mut carry = false;
                for (word, &rhs) in self.0.iter_mut().zip(other.0.iter()) {
                    let (sum, c1) = word.overflowing_add(rhs);
                    let (sum, c2) = sum.overflowing_add(carry as u64);
                    *word = sum;
                    carry = c1 || c2;
                }
                (self, carry)
            }

            #[inline]
            pub fn checked_add(self, other: Self) -> Option<Self> {
                match self.overflowing_add(other) {
                    (sum, false) => Some(sum),
                    (_, true) => None,
                }
            }

            #[inline]
            pub fn overflowing_add_u64(self, other: u64) -> (Self, bool) {
                self.overflowing_add(Self::from_u64(other))
            }

            pub fn overflowing_sub(mut self, other: Self) -> (Self, bool) {
                let mut borrow = false;
                for (word, &rhs) in self.0.iter_mut().zip(other.0.iter()) {
                    let (diff, b1) = word.overflowing_sub(rhs);
                    let (diff, b2) = diff.overflowing_sub(borrow as u64);
                    *word = diff;
                    borrow = b1 || b2;
                }
                (self, borrow)
            }

            pub fn overflowing_mul_u64(mut self, other: u64) -> (Self, bool) {
                let mut carry: u128 = 0;
                for word in self.0.iter_mut() {
                    let product = (*word as u128) * (other as u128) + carry;
                    *word = product as u64;
                    carry = product >> 64;
                }
                (self, carry != 0)
            }

            #[inline]
            pub fn from_le_bytes(bytes: [u8; Self::BYTES]) -> Self {
                let mut words = [0u64; $n_words];
                for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
                    *word = u64::from_le_bytes(chunk.try_into().unwrap_or_default());
                }
                $name(words)
            }

            #[inline]
            pub fn from_be_bytes(bytes: [u8; Self::BYTES]) -> Self {
                let mut words = [0u64; $n_words];
                for (word, chunk) in words.iter_mut().rev().zip(bytes.chunks_exact(8)) {
                    *word = u64::from_be_bytes(chunk.try_into().unwrap_or_default());
                }
                $name(words)
            }

            #[inline]
            pub fn to_be_bytes(self) -> [u8; Self::BYTES] {
                let mut out = [0u8; Self::BYTES];
                for (chunk, word) in out.chunks_exact_mut(8).zip(self.0.iter().rev()) {
                    chunk.copy_from_slice(&word.to_be_bytes());
                }
                out
            }

            pub fn div_rem_u64(mut self, other: u64) -> (Self, u64) {
                let mut rem: u128 = 0;
                for word in self.0.iter_mut().rev() {
                    let n = (rem << 64) | *word as u128;
                    *word = (n / other as u128) as u64;
                    rem = n % other as u128;
                }
                (self, rem as u64)
            }

            /// Shift-subtract long division returning (quotient, remainder), or `None` when dividing by zero
            pub fn checked_div_rem(self, other: Self) -> Option<(Self, Self)> {
                let divisor_bits = other.bits();
                if divisor_bits == 0 {
                    return None;
                }
                let dividend_bits = self.bits();
                if dividend_bits < divisor_bits {
                    return Some((Self::ZERO, self));
                }
                let mut quotient = Self::ZERO;
                let mut remainder = self;
                for shift in (0..=dividend_bits - divisor_bits).rev() {
                    let candidate = other.overflowing_shl(shift).0;
                    if remainder >= candidate {
                        remainder = remainder.overflowing_sub(candidate).0;
                        quotient.0[(shift / 64) as usize] |= 1 << (shift % 64);
                    }
                }
                Some((quotient, remainder))
            }

            /// Parses a big endian hex string of at most `2 * BYTES` digits
            pub fn from_hex(hex: &str) -> Result<Self, $crate::uint::faster_hex::Error> {
                if hex.len() > Self::BYTES * 2 {
                    return Err($crate::uint::faster_hex::Error::InvalidLength(hex.len()));
                }
                let mut padded = [b'0'; Self::BYTES * 2];
                padded[Self::BYTES * 2 - hex.len()..].copy_from_slice(hex.as_bytes());
                let mut bytes = [0u8; Self::BYTES];
                $crate::uint::faster_hex::hex_decode(&padded, &mut bytes)?;
                Ok(Self::from_be_bytes(bytes))
            }
        }

        impl PartialEq<u64> for $name {
            #[inline]
            fn eq(&self, other: &u64) -> bool {
                *self == $name::from_u64(*other)
            }
        }

        impl PartialOrd for $name {
            #[inline]
            fn partial_cmp(&self, other: &$name) -> Option<core::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            #[inline]
            fn cmp(&self, other: &$name) -> core::cmp::Ordering {
                Iterator::cmp(self.0.iter().rev(), other.0.iter().rev())
            }
        }

        impl core::ops::Add<$name> for $name {
            type Output = $name;

            #[track_caller]
            fn add(self, other: $name) -> $name {
                let (sum, carry) = self.overflowing_add(other);
                debug_assert!(!carry, "attempt to add with overflow");
                sum
            }
        }

        impl core::ops::Add<u64> for $name {
            type Output = $name;

            #[track_caller]
            fn add(self, other: u64) -> $name {
                self + $name::from_u64(other)
            }
        }

        impl core::ops::Sub<$name> for $name {
            type Output = $name;

            #[track_caller]
            fn sub(self, other: $name) -> $name {
                let (diff, borrow) = self.overflowing_sub(other);
                debug_assert!(!borrow, "attempt to subtract with overflow");
                diff
            }
        }

        impl core::ops::Mul<u64> for $name {
            type Output = $name;

            #[track_caller]
            fn mul(self, other: u64) -> $name {
                let (product, carry) = self.overflowing_mul_u64(other);
                debug_assert!(!carry, "attempt to multiply with overflow");
                product
            }
        }

        impl core::ops::Div<u64> for $name {
            type Output = $name;

            fn div(self, other: u64) -> $name {
                self.div_rem_u64(other).0
            }
        }

        impl core::ops::Not for $name {
            type Output = $name;

            fn not(self) -> $name {
                $name(self.0.map(|word| !word))
            }
        }

        impl core::ops::Shl<u32> for $name {
            type Output = $name;

            #[track_caller]
            fn shl(self, shift: u32) -> $name {
                let (res, overflow) = self.overflowing_shl(shift);
                debug_assert!(!overflow, "attempt to shift left with overflow");
                res
            }
        }

        impl core::ops::Shr<u32> for $name {
            type Output = $name;

            #[track_caller]
            fn shr(self, shift: u32) -> $name {
                let (res, overflow) = self.overflowing_shr(shift);
                debug_assert!(!overflow, "attempt to shift right with overflow");
                res
            }
        }

        impl core::fmt::LowerHex for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let hex = $crate::uint::faster_hex::hex_string(&self.to_be_bytes());
                let trimmed = hex.trim_start_matches('0');
                f.pad_integral(true, "0x", if trimmed.is_empty() { "0" } else { trimmed })
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut digits = Vec::new();
                let mut current = *self;
                loop {
                    let (quotient, rem) = current.div_rem_u64(10);
                    digits.push(char::from(b'0' + rem as u8));
                    current = quotient;
                    if current.is_zero() {
                        break;
                    }
                }
                let digits: String = digits.into_iter().rev().collect();
                f.pad_integral(true, "", &digits)
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(value: u64) -> $name {
                $name::from_u64(value)
            }
        }
    };
}
