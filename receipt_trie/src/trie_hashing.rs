//! RLP encoding and hashing of trie nodes.

use bytes::Bytes;
use ethereum_types::H256;
use keccak_hash::keccak;
use rlp::RlpStream;

use crate::partial_trie::{Node, TrieNode};

/// The node type used for calculating the hash of a trie.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum EncodedNode {
    /// Node that is RLPed but not hashed.
    Raw(Bytes),
    /// Node that is hashed.
    Hashed([u8; 32]),
}

impl From<&EncodedNode> for H256 {
    fn from(v: &EncodedNode) -> Self {
        match v {
            EncodedNode::Raw(b) => keccak(b),
            EncodedNode::Hashed(h) => H256(*h),
        }
    }
}

/// Calculates the hash of a node.
/// Assumes that all leaf values are already rlp encoded.
pub(crate) fn hash_trie(node: &TrieNode) -> H256 {
    (&node.reference()).into()
}

/// Returns the full RLP encoding of a node, which is what a proof carries
/// for every node on a path.
///
/// Children are embedded as their references: raw RLP when shorter than 32
/// bytes, otherwise a 32 byte hash.
pub fn rlp_encode_node(node: &Node) -> Bytes {
    match node {
        Node::Empty => Bytes::from_static(&rlp::NULL_RLP),
        Node::Branch { children, value } => {
            let mut stream = RlpStream::new_list(17);

            for c in children.iter() {
                append_to_stream(&mut stream, c.reference());
            }

            match value.is_empty() {
                false => stream.append(value),
                true => stream.append_empty_data(),
            };

            stream.out().into()
        }
        Node::Extension { nibbles, child } => {
            let mut stream = RlpStream::new_list(2);

            stream.append(&nibbles.to_hex_prefix_encoding(false));
            append_to_stream(&mut stream, child.reference());

            stream.out().into()
        }
        Node::Leaf { nibbles, value } => {
            let hex_prefix_k = nibbles.to_hex_prefix_encoding(true);
            let mut stream = RlpStream::new_list(2);

            stream.append(&hex_prefix_k);
            stream.append(value);

            stream.out().into()
        }
    }
}

pub(crate) fn rlp_encode_and_hash_node(node: &Node) -> EncodedNode {
    hash_bytes_if_large_enough(rlp_encode_node(node))
}

fn hash_bytes_if_large_enough(bytes: Bytes) -> EncodedNode {
    match bytes.len() >= 32 {
        false => EncodedNode::Raw(bytes),
        true => EncodedNode::Hashed(keccak(&bytes).0),
    }
}

fn append_to_stream(s: &mut RlpStream, node: EncodedNode) {
    match node {
        EncodedNode::Raw(b) => s.append_raw(&b, 1),
        EncodedNode::Hashed(h) => s.append(&h.as_ref()),
    };
}
