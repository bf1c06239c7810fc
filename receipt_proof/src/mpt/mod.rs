//! Proof assembly over a traversal stack.
//!
//! [`walk`] replays the descent from the root to a receipt, checks every
//! hash link on the way and records what each node contributed to the path.
//! The proof variants only differ in which of this they keep:
//! - [`v1`] keeps byte offsets of child hashes inside their parents.
//! - [`v2`] keeps one slot index per node.

pub mod v1;
pub mod v2;

use bytes::Bytes;
use ethereum_types::H256;
use keccak_hash::keccak;
use log::{debug, warn};
use receipt_trie::{
    nibbles::Nibbles,
    partial_trie::{Node, WrappedNode},
    special_query::TraversedNode,
    trie_hashing::{rlp_encode_node, EncodedNode},
    utils::TrieNodeType,
};

use crate::error::{ProofError, ProofResult};

/// Slot holding the value of a branch node.
pub const BRANCH_VALUE_SLOT: usize = 16;

/// Slot holding the child of an extension or the value of a leaf.
pub const SHORT_NODE_SLOT: usize = 1;

/// What a single node contributed to the descent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// Descended into the branch child at this nibble.
    Branch(u8),
    /// Descended into the child of an extension.
    Extension,
    /// Ended on the value slot of a branch.
    BranchValue,
    /// Ended on a leaf value.
    Leaf,
}

impl Step {
    /// The item of the node's RLP list this step used.
    pub const fn slot(&self) -> usize {
        match self {
            Step::Branch(nibble) => *nibble as usize,
            Step::Extension | Step::Leaf => SHORT_NODE_SLOT,
            Step::BranchValue => BRANCH_VALUE_SLOT,
        }
    }

    /// Whether this step ends the descent.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Step::BranchValue | Step::Leaf)
    }
}

/// A verified descent: the encoded nodes, root first, and one [`Step`] per
/// node. The last step is always terminal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Walk {
    /// RLP encoding of every node on the path.
    pub nodes: Vec<Bytes>,
    /// What every node contributed.
    pub steps: Vec<Step>,
}

impl Walk {
    /// Slot of the terminal step.
    pub fn terminal_slot(&self) -> usize {
        self.steps.last().map_or(SHORT_NODE_SLOT, Step::slot)
    }
}

/// Walks `stack` along `key`, checking that every node hashes to what its
/// parent (or `root`) references and that the descent ends on `target`.
///
/// Any inconsistency aborts the walk. Nothing is skipped or patched up.
pub fn walk(stack: &[TraversedNode], key: Nibbles, root: H256, target: &[u8]) -> ProofResult<Walk> {
    let total = key.count;
    let mut cursor = 0;
    let mut expected = root;
    let mut nodes = Vec::with_capacity(stack.len());
    let mut steps = Vec::with_capacity(stack.len());

    for (depth, traversed) in stack.iter().enumerate() {
        if cursor > total {
            return Err(malformed(
                depth,
                format!("cursor {cursor} ran past the key length {total}"),
            ));
        }

        let encoded = rlp_encode_node(&traversed.node);
        let found = keccak(&encoded);
        if found != expected {
            return Err(ProofError::HashChainBroken {
                depth,
                expected,
                found,
            });
        }

        let is_last = depth + 1 == stack.len();
        let step = match traversed.node.as_ref().as_ref() {
            Node::Branch { children, value } => match cursor == total {
                true => {
                    if !is_last {
                        return Err(malformed(depth, "key ends before the last node"));
                    }
                    if value.as_slice() != target {
                        return Err(ProofError::ReceiptMismatch { depth });
                    }

                    warn!(
                        "Proof of {key} terminates in the value slot of a branch (root {root:#x})"
                    );
                    Step::BranchValue
                }
                false => {
                    let nibble = key.get_nibble(cursor);
                    if nibble as usize >= BRANCH_VALUE_SLOT {
                        return Err(ProofError::InvalidNibble {
                            nibble: nibble as usize,
                            depth,
                        });
                    }

                    expected = child_hash(&children[nibble as usize], depth)?;
                    cursor += 1;
                    Step::Branch(nibble)
                }
            },
            Node::Extension { nibbles, child } => {
                let matched = key.truncate_n_nibbles_front(cursor).common_prefix_len(nibbles);
                if matched != nibbles.count {
                    return Err(malformed(
                        depth,
                        format!("extension {nibbles} diverges from the key"),
                    ));
                }

                cursor += matched;
                expected = child_hash(child, depth)?;
                Step::Extension
            }
            Node::Leaf { nibbles, value } => {
                cursor += key.truncate_n_nibbles_front(cursor).common_prefix_len(nibbles);
                if !is_last || cursor != total {
                    return Err(malformed(depth, "leaf does not complete the key"));
                }
                if value.as_slice() != target {
                    return Err(ProofError::ReceiptMismatch { depth });
                }

                Step::Leaf
            }
            Node::Empty => return Err(malformed(depth, "empty node on the path")),
        };

        debug!(
            "Verified {} at depth {} (slot {})",
            TrieNodeType::from(traversed.node.as_ref().as_ref()),
            depth,
            step.slot()
        );

        nodes.push(encoded);
        steps.push(step);
    }

    match steps.last() {
        Some(step) if step.is_terminal() => Ok(Walk { nodes, steps }),
        _ => Err(malformed(stack.len(), "path does not reach a value")),
    }
}

/// Proofs reference children by hash only. A child embedded in its parent
/// can not be followed by a verifier that hashes every proof element.
fn child_hash(child: &WrappedNode, depth: usize) -> ProofResult<H256> {
    match child.reference() {
        EncodedNode::Hashed(h) => Ok(H256(h)),
        EncodedNode::Raw(_) => Err(malformed(depth, "child is embedded instead of hashed")),
    }
}

fn malformed(depth: usize, reason: impl Into<String>) -> ProofError {
    ProofError::MalformedNode {
        depth,
        reason: reason.into(),
    }
}
