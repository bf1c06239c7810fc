//! Define [`Nibbles`] and how to convert bytes, hex prefix encodings and
//! strings into nibbles.
use std::fmt::{self, Debug, Display, LowerHex};
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use ethereum_types::U512;
use thiserror::Error;

use crate::utils::{create_mask_of_1s, is_even};

// Use a whole byte for a Nibble just for convenience
/// A Nibble has 4 bits and is stored as `u8`.
pub type Nibble = u8;

/// The maximum number of nibbles a key may hold (a 32 byte key).
pub const MAX_NIBBLES: usize = 64;

#[derive(Clone, Debug, Eq, Error, PartialEq, Hash)]
/// Errors encountered when converting from `Bytes` to `Nibbles`.
pub enum BytesToNibblesError {
    #[error("Tried constructing `Nibbles` from a zero byte slice")]
    /// The size is zero.
    ZeroSizedKey,

    #[error("Tried constructing `Nibbles` from a byte slice with more than 32 bytes (len: {0})")]
    /// The slice is too large.
    TooManyBytes(usize),
}

#[derive(Clone, Debug, Eq, Error, PartialEq, Hash)]
/// Errors encountered when converting a hex prefix encoding to nibbles.
pub enum FromHexPrefixError {
    #[error("Tried to convert an empty hex prefix byte string into `Nibbles`")]
    /// There is no flag byte.
    Empty,

    #[error("Tried to convert a hex prefix byte string into `Nibbles` with invalid flags at the start: {0:#04b}")]
    /// The hex prefix encoding flag is invalid.
    InvalidFlags(Nibble),

    #[error("Hex prefix byte string has a non-zero padding nibble: {0:#x}")]
    /// An even-length path must pad its flag byte with a zero nibble.
    NonZeroPadding(Nibble),

    #[error("Tried to convert a hex prefix byte string into `Nibbles` that was longer than 33 bytes: (length: {1}, bytes: {0})")]
    /// The hex prefix encoding is too large.
    TooLong(String, usize),
}

#[derive(Debug, Error)]
#[error("Invalid nibble string: {0}")]
/// An error encountered when parsing a hex string into `Nibbles`.
pub struct StrToNibblesError(String);

#[derive(Copy, Clone, Default, Eq, Hash, PartialEq)]
/// A sequence of nibbles which is used as the key type into
/// [`Trie`][`crate::partial_trie::Trie`].
///
/// Nibbles are kept packed into a `U512`, most significant nibble first. Keys
/// built from bytes always contain an even number of nibbles, while paths
/// stored in extension and leaf nodes may have any length.
///
/// ```
/// # use receipt_trie::nibbles::Nibbles;
/// let n = Nibbles::from_bytes_be(&[0x81, 0x80]).unwrap();
///
/// assert_eq!(n.count, 4);
/// assert_eq!(n.get_nibble(0), 8);
/// assert_eq!(format!("{n:x}"), "0x8180");
/// ```
pub struct Nibbles {
    /// The number of nibbles in this sequence.
    pub count: usize,
    /// A packed encoding of these nibbles. Only the first (least significant)
    /// `4 * count` bits are used. The rest are unused and should be zero.
    pub packed: U512,
}

impl Display for Nibbles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // By default, just use lower hex.
        <Self as LowerHex>::fmt(self, f)
    }
}

// Manual impl in order to print `packed` nicely.
impl Debug for Nibbles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nibbles")
            .field("count", &self.count)
            .field("packed", &format!("{self:x}"))
            .finish()
    }
}

impl LowerHex for Nibbles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: String = self
            .iter()
            .map(|n| char::from_digit(n as u32, 16).unwrap_or('?'))
            .collect();

        write!(f, "0x{s}")
    }
}

impl FromStr for Nibbles {
    type Err = StrToNibblesError;

    /// Parses a hex string with or without a preceding "0x". Every character
    /// becomes one nibble, so leading zeros are kept.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() > MAX_NIBBLES {
            return Err(StrToNibblesError(s.to_string()));
        }

        let mut nibbles = Nibbles::default();
        for c in stripped.chars() {
            let n = c
                .to_digit(16)
                .ok_or_else(|| StrToNibblesError(s.to_string()))?;
            nibbles.push_nibble_back(n as Nibble);
        }

        Ok(nibbles)
    }
}

impl Nibbles {
    /// Creates `Nibbles` from big endian bytes.
    ///
    /// Returns an error if the byte slice is empty or is longer than `32`
    /// bytes.
    pub fn from_bytes_be(bytes: &[u8]) -> Result<Self, BytesToNibblesError> {
        if bytes.is_empty() {
            return Err(BytesToNibblesError::ZeroSizedKey);
        }

        if bytes.len() > MAX_NIBBLES / 2 {
            return Err(BytesToNibblesError::TooManyBytes(bytes.len()));
        }

        Ok(Self {
            count: bytes.len() * 2,
            packed: U512::from_big_endian(bytes),
        })
    }

    /// Gets the nth proceeding nibble. The front `Nibble` is at idx `0`.
    ///
    /// # Panics
    /// Panics if `idx` is out of range.
    pub fn get_nibble(&self, idx: usize) -> Nibble {
        let nib_idx = self.count - idx - 1;
        let byte = self.packed.byte(nib_idx / 2);

        match is_even(nib_idx) {
            false => (byte & 0b11110000) >> 4,
            true => byte & 0b00001111,
        }
    }

    /// Pops the nibble at the front (the next nibble).
    ///
    /// # Panics
    /// Panics if the `Nibbles` is empty.
    pub fn pop_next_nibble_front(&mut self) -> Nibble {
        let n = self.get_nibble(0);
        self.truncate_n_nibbles_front_mut(1);

        n
    }

    /// Pushes a nibble to the back.
    ///
    /// # Panics
    /// Panics if the nibble is > `0xf` or if the sequence is already full.
    pub fn push_nibble_back(&mut self, n: Nibble) {
        assert!(n <= 0xf);
        assert!(self.count < MAX_NIBBLES);

        self.count += 1;
        self.packed = (self.packed << 4) | n.into();
    }

    /// Drops the next `n` proceeding nibbles without mutation.
    ///
    /// If we truncate more nibbles that there are, we will just return the
    /// `empty` nibble.
    pub fn truncate_n_nibbles_front(&self, n: usize) -> Nibbles {
        let mut nib = *self;
        nib.truncate_n_nibbles_front_mut(n);

        nib
    }

    /// Drop the next `n` proceeding nibbles.
    ///
    /// If we truncate more nibbles that there are, we will just return the
    /// `empty` nibble.
    pub fn truncate_n_nibbles_front_mut(&mut self, n: usize) {
        let n = n.min(self.count);

        let mask_shift = (self.count - n) * 4;
        let truncate_mask = !(create_mask_of_1s(n * 4) << mask_shift);

        self.count -= n;
        self.packed &= truncate_mask;
    }

    /// Returns whether or not this `Nibbles` contains actual nibbles. (If
    /// `count` is set to `0`)
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of leading nibbles shared by `self` and `other`.
    pub fn common_prefix_len(&self, other: &Nibbles) -> usize {
        let smaller_count = self.count.min(other.count);
        (0..smaller_count)
            .find(|&i| self.get_nibble(i) != other.get_nibble(i))
            .unwrap_or(smaller_count)
    }

    /// Whether `prefix` is a (possibly equal) prefix of `self`.
    pub fn starts_with(&self, prefix: &Nibbles) -> bool {
        prefix.count <= self.count && self.common_prefix_len(prefix) == prefix.count
    }

    /// Splits the `Nibbles` at the given index, returning two `Nibbles`.
    /// Specifically, if `0x1234` is split at `1`, we get `0x1` and `0x234`.
    ///
    /// # Panics
    /// Panics if the `idx` is out of range.
    pub fn split_at_idx(&self, idx: usize) -> (Nibbles, Nibbles) {
        let post_count = self.count - idx;
        let post_mask = create_mask_of_1s(post_count * 4);

        let post = Nibbles {
            count: post_count,
            packed: self.packed & post_mask,
        };

        let pre = Nibbles {
            count: idx,
            packed: (self.packed & !post_mask) >> (post_count * 4),
        };

        (pre, post)
    }

    /// Merge two `Nibbles` together. `self` will be the prefix.
    ///
    /// # Panics
    /// Panics if merging the `Nibbles` causes an overflow (total nibbles > 64).
    pub fn merge_nibbles(&self, post: &Nibbles) -> Nibbles {
        let new_count = self.count + post.count;
        assert!(new_count <= MAX_NIBBLES);

        Nibbles {
            count: new_count,
            packed: (self.packed << (post.count * 4)) | post.packed,
        }
    }

    /// Iterates over the nibbles from front to back.
    pub fn iter(&self) -> impl Iterator<Item = Nibble> + '_ {
        (0..self.count).map(|i| self.get_nibble(i))
    }

    /// Converts [`Nibbles`] to hex-prefix encoding (AKA "compact").
    ///
    /// The high nibble of the first byte carries two flags (`0b10` leaf,
    /// `0b01` odd length). An odd-length path stores its first nibble in the
    /// low half of that byte, an even-length one pads it with zero.
    pub fn to_hex_prefix_encoding(&self, is_leaf: bool) -> Bytes {
        let odd_bit: u8 = match is_even(self.count) {
            false => 1,
            true => 0,
        };
        let term_bit: u8 = match is_leaf {
            false => 0,
            true => 1,
        };
        let flags = (odd_bit | (term_bit << 1)) << 4;

        let mut buf = BytesMut::with_capacity(self.count / 2 + 1);
        let mut nibs = self.iter();

        match odd_bit {
            1 => buf.put_u8(flags | nibs.next().unwrap_or_default()),
            _ => buf.put_u8(flags),
        }

        while let Some(hi) = nibs.next() {
            let lo = nibs.next().unwrap_or_default();
            buf.put_u8((hi << 4) | lo);
        }

        buf.freeze()
    }

    /// Converts a hex prefix byte string ("AKA "compact") into `Nibbles`,
    /// also returning whether the leaf flag was set.
    pub fn from_hex_prefix_encoding(
        hex_prefix_bytes: &[u8],
    ) -> Result<(Self, bool), FromHexPrefixError> {
        let (&first, rest) = hex_prefix_bytes
            .split_first()
            .ok_or(FromHexPrefixError::Empty)?;

        if hex_prefix_bytes.len() > MAX_NIBBLES / 2 + 1 {
            return Err(FromHexPrefixError::TooLong(
                hex::encode(hex_prefix_bytes),
                hex_prefix_bytes.len(),
            ));
        }

        let flag_bits = (first & 0b11110000) >> 4;
        let low = first & 0b1111;

        // is_odd --> 0b01
        // is_leaf --> 0b10
        let (is_leaf, is_odd) = match flag_bits {
            0b00 => (false, false),
            0b01 => (false, true),
            0b10 => (true, false),
            0b11 => (true, true),
            _ => return Err(FromHexPrefixError::InvalidFlags(flag_bits)),
        };

        let mut nibbles = Nibbles::default();
        match is_odd {
            true => nibbles.push_nibble_back(low),
            false if low != 0 => return Err(FromHexPrefixError::NonZeroPadding(low)),
            false => (),
        }

        if nibbles.count + rest.len() * 2 > MAX_NIBBLES {
            return Err(FromHexPrefixError::TooLong(
                hex::encode(hex_prefix_bytes),
                hex_prefix_bytes.len(),
            ));
        }

        for b in rest {
            nibbles.push_nibble_back(b >> 4);
            nibbles.push_nibble_back(b & 0b1111);
        }

        Ok((nibbles, is_leaf))
    }

    /// Returns the minimum number of bytes needed to represent these `Nibbles`.
    pub const fn min_bytes(&self) -> usize {
        (self.count + 1) / 2
    }

    /// Returns the nibbles bytes in big-endian format. An odd count is
    /// padded with a leading zero nibble.
    pub fn bytes_be(&self) -> Vec<u8> {
        let mut byte_buf = [0; 64];
        self.packed.to_big_endian(&mut byte_buf);

        byte_buf[64 - self.min_bytes()..64].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{FromHexPrefixError, Nibbles};

    fn n(s: &str) -> Nibbles {
        Nibbles::from_str(s).unwrap()
    }

    #[test]
    fn from_bytes_keeps_leading_zero_nibbles() {
        let nibs = Nibbles::from_bytes_be(&[0x01, 0x80]).unwrap();

        assert_eq!(nibs.count, 4);
        assert_eq!(nibs.iter().collect::<Vec<_>>(), vec![0, 1, 8, 0]);
        assert_eq!(nibs, n("0x0180"));
    }

    #[test]
    fn rejects_bad_byte_lengths() {
        assert!(Nibbles::from_bytes_be(&[]).is_err());
        assert!(Nibbles::from_bytes_be(&[0; 33]).is_err());
        assert!(Nibbles::from_bytes_be(&[0xff; 32]).is_ok());
    }

    #[test]
    fn pop_and_truncate_work() {
        let mut nibs = n("0x1234");

        assert_eq!(nibs.pop_next_nibble_front(), 1);
        assert_eq!(nibs, n("0x234"));
        assert_eq!(nibs.truncate_n_nibbles_front(2), n("0x4"));
        assert_eq!(nibs.truncate_n_nibbles_front(10), Nibbles::default());
    }

    #[test]
    fn split_and_merge_are_inverse() {
        let nibs = n("0x12345");
        let (pre, post) = nibs.split_at_idx(2);

        assert_eq!(pre, n("0x12"));
        assert_eq!(post, n("0x345"));
        assert_eq!(pre.merge_nibbles(&post), nibs);

        let (pre, post) = nibs.split_at_idx(0);
        assert!(pre.is_empty());
        assert_eq!(post, nibs);
    }

    #[test]
    fn common_prefix_len_works() {
        assert_eq!(n("0x1234").common_prefix_len(&n("0x1299")), 2);
        assert_eq!(n("0x12").common_prefix_len(&n("0x1234")), 2);
        assert_eq!(n("0x5").common_prefix_len(&n("0x6")), 0);
        assert!(n("0x1234").starts_with(&n("0x12")));
        assert!(!n("0x12").starts_with(&n("0x123")));
    }

    #[test]
    fn hex_prefix_encoding_matches_yellow_paper_examples() {
        assert_eq!(n("0x12345").to_hex_prefix_encoding(false).as_ref(), &[0x11, 0x23, 0x45]);
        assert_eq!(n("0x012345").to_hex_prefix_encoding(false).as_ref(), &[0x00, 0x01, 0x23, 0x45]);
        assert_eq!(n("0x0f1cb8").to_hex_prefix_encoding(true).as_ref(), &[0x20, 0x0f, 0x1c, 0xb8]);
        assert_eq!(n("0xf1cb8").to_hex_prefix_encoding(true).as_ref(), &[0x3f, 0x1c, 0xb8]);
        assert_eq!(Nibbles::default().to_hex_prefix_encoding(true).as_ref(), &[0x20]);
    }

    #[test]
    fn hex_prefix_decoding_recovers_path_and_flag() {
        for (path, leaf) in [("0x12345", false), ("0x0f1cb8", true), ("0x", true), ("0x7", false)] {
            let encoded = n(path).to_hex_prefix_encoding(leaf);
            assert_eq!(Nibbles::from_hex_prefix_encoding(&encoded), Ok((n(path), leaf)));
        }
    }

    #[test]
    fn hex_prefix_decoding_rejects_garbage() {
        assert_eq!(Nibbles::from_hex_prefix_encoding(&[]), Err(FromHexPrefixError::Empty));
        assert_eq!(
            Nibbles::from_hex_prefix_encoding(&[0x41]),
            Err(FromHexPrefixError::InvalidFlags(4))
        );
        assert_eq!(
            Nibbles::from_hex_prefix_encoding(&[0x05, 0x12]),
            Err(FromHexPrefixError::NonZeroPadding(5))
        );
    }

    #[test]
    fn bytes_be_pads_odd_counts() {
        assert_eq!(n("0x123").bytes_be(), vec![0x01, 0x23]);
        assert_eq!(n("0x0180").bytes_be(), vec![0x01, 0x80]);
    }
}
