//! Decoding of raw node bytes as they appear in a Merkle proof.
//!
//! A proof is an ordered list of RLP encoded nodes. Verifiers can not trust
//! anything but those bytes, so this module rebuilds the typed view of a
//! node from them without looking at any in-memory trie.

use std::cmp::Ordering;

use bytes::Bytes;
use enum_as_inner::EnumAsInner;
use ethereum_types::H256;
use rlp::{PayloadInfo, Rlp};
use thiserror::Error;

use crate::nibbles::{FromHexPrefixError, Nibbles};

/// Errors encountered while decoding raw proof nodes.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum NodeDecodeError {
    /// The bytes are not valid RLP.
    #[error(transparent)]
    Rlp(#[from] rlp::DecoderError),

    /// Trie nodes are lists of either 2 or 17 items.
    #[error("Expected a list of 2 or 17 items, found {0}")]
    UnexpectedItemCount(usize),

    /// The path of an extension or leaf is not valid hex-prefix.
    #[error(transparent)]
    HexPrefix(#[from] FromHexPrefixError),

    /// A child slot holds neither a 32 byte hash, an embedded node nor
    /// the empty string.
    #[error("Invalid child reference in slot {0}")]
    InvalidChildReference(usize),

    /// The node encoding is followed by extra bytes.
    #[error("Found {0} trailing bytes after the node encoding")]
    TrailingBytes(usize),

    /// The header announces more bytes than the encoding holds.
    #[error("Node encoding truncated: header announces {expected} bytes, found {found}")]
    Truncated {
        /// Length announced by the RLP header.
        expected: usize,
        /// Bytes available.
        found: usize,
    },

    /// A requested list item does not exist.
    #[error("Node has no item at index {0}")]
    MissingItem(usize),
}

/// How a branch or extension refers to one of its children.
#[derive(Clone, Debug, Default, EnumAsInner, Eq, PartialEq)]
pub enum ChildRef {
    /// No child.
    #[default]
    Empty,
    /// The keccak hash of a child whose encoding is 32 bytes or longer.
    Hash(H256),
    /// A child whose encoding is shorter than 32 bytes, embedded as is.
    Inline(Bytes),
}

/// A trie node decoded from proof bytes.
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
pub enum ProofNode {
    /// A branch with 16 child references and a (possibly empty) value.
    Branch {
        /// Child references indexed by nibble.
        children: Box<[ChildRef; 16]>,
        /// The value slot (index 16).
        value: Bytes,
    },
    /// An extension with a shared path and a single child.
    Extension {
        /// The shared path.
        nibbles: Nibbles,
        /// The child reference.
        child: ChildRef,
    },
    /// A leaf with the remaining key path and a value.
    Leaf {
        /// The remaining key path.
        nibbles: Nibbles,
        /// The stored value.
        value: Bytes,
    },
}

impl ProofNode {
    /// Decodes one RLP encoded trie node.
    pub fn decode(bytes: &[u8]) -> Result<Self, NodeDecodeError> {
        let info = PayloadInfo::from(bytes)?;
        match info.total().cmp(&bytes.len()) {
            Ordering::Greater => {
                return Err(NodeDecodeError::Truncated {
                    expected: info.total(),
                    found: bytes.len(),
                })
            }
            Ordering::Less => {
                return Err(NodeDecodeError::TrailingBytes(bytes.len() - info.total()))
            }
            Ordering::Equal => (),
        }

        let rlp = Rlp::new(bytes);
        if !rlp.is_list() {
            return Err(NodeDecodeError::UnexpectedItemCount(0));
        }

        match rlp.item_count()? {
            17 => {
                let mut children: [ChildRef; 16] = Default::default();
                for (i, child) in children.iter_mut().enumerate() {
                    *child = decode_child_ref(&rlp.at(i)?, i)?;
                }

                Ok(ProofNode::Branch {
                    children: Box::new(children),
                    value: Bytes::copy_from_slice(rlp.at(16)?.data()?),
                })
            }
            2 => {
                let (nibbles, is_leaf) = Nibbles::from_hex_prefix_encoding(rlp.at(0)?.data()?)?;
                let second = rlp.at(1)?;

                match is_leaf {
                    true => Ok(ProofNode::Leaf {
                        nibbles,
                        value: Bytes::copy_from_slice(second.data()?),
                    }),
                    false => Ok(ProofNode::Extension {
                        nibbles,
                        child: decode_child_ref(&second, 1)?,
                    }),
                }
            }
            n => Err(NodeDecodeError::UnexpectedItemCount(n)),
        }
    }
}

fn decode_child_ref(item: &Rlp, slot: usize) -> Result<ChildRef, NodeDecodeError> {
    if item.is_list() {
        return match item.as_raw().len() < 32 {
            true => Ok(ChildRef::Inline(Bytes::copy_from_slice(item.as_raw()))),
            false => Err(NodeDecodeError::InvalidChildReference(slot)),
        };
    }

    let data = item.data()?;
    match data.len() {
        0 => Ok(ChildRef::Empty),
        32 => Ok(ChildRef::Hash(H256::from_slice(data))),
        _ => Err(NodeDecodeError::InvalidChildReference(slot)),
    }
}

/// Returns the byte offset, within an RLP encoded node, of the payload of
/// the list item at `index`.
///
/// For a child stored as a hash this is where the 32 hash bytes start, which
/// is what flat-parsing verifiers use to jump straight to the child hash.
pub fn item_payload_offset(encoded: &[u8], index: usize) -> Result<usize, NodeDecodeError> {
    let list = PayloadInfo::from(encoded)?;
    if !Rlp::new(encoded).is_list() {
        return Err(NodeDecodeError::UnexpectedItemCount(0));
    }

    let end = list.header_len + list.value_len;
    let mut offset = list.header_len;

    for _ in 0..index {
        let rest = encoded
            .get(offset..end)
            .ok_or(NodeDecodeError::MissingItem(index))?;
        offset += PayloadInfo::from(rest)?.total();
    }

    let rest = encoded
        .get(offset..end)
        .filter(|rest| !rest.is_empty())
        .ok_or(NodeDecodeError::MissingItem(index))?;

    Ok(offset + PayloadInfo::from(rest)?.header_len)
}
