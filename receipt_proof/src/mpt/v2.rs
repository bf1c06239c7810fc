//! Slot index proofs, shared by utility versions 2, 3 and 4.
//!
//! Every node comes with the index of the list item the verifier has to
//! follow: the nibble for a branch, `1` for extensions and leaves, and `16`
//! for a value stored in a branch.

use bytes::Bytes;
use ethereum_types::H256;
use keccak_hash::keccak;
use receipt_trie::proof_node::{ChildRef, ProofNode};

use super::{Step, Walk, BRANCH_VALUE_SLOT, SHORT_NODE_SLOT};
use crate::{
    error::{DecodeError, ProofError, ProofResult},
    self_check::Replay,
};

/// One slot index per node, aligned with the node list.
pub fn slot_indices(walk: &Walk) -> Vec<usize> {
    walk.steps.iter().map(Step::slot).collect()
}

/// Replays a slot index proof by decoding every node and following the
/// recorded slot.
pub fn replay(root: H256, proof: &[Bytes], slots: &[usize]) -> ProofResult<Replay> {
    if proof.is_empty() || slots.len() != proof.len() {
        return Err(ProofError::InconsistentProof(format!(
            "{} slot indices for {} nodes",
            slots.len(),
            proof.len()
        )));
    }

    let mut expected = root;
    let mut terminal_value = None;

    for (depth, (node, &slot)) in proof.iter().zip(slots).enumerate() {
        let found = keccak(node);
        if found != expected {
            return Err(ProofError::HashChainBroken {
                depth,
                expected,
                found,
            });
        }

        if slot > BRANCH_VALUE_SLOT {
            return Err(ProofError::InvalidNibble {
                nibble: slot,
                depth,
            });
        }

        let is_last = depth + 1 == proof.len();
        match (ProofNode::decode(node).map_err(DecodeError::from)?, is_last) {
            (ProofNode::Branch { value, .. }, true) if slot == BRANCH_VALUE_SLOT => {
                terminal_value = Some(value);
            }
            (ProofNode::Branch { children, .. }, false) if slot < BRANCH_VALUE_SLOT => {
                expected = followed_hash(&children[slot], depth)?;
            }
            (ProofNode::Extension { child, .. }, false) if slot == SHORT_NODE_SLOT => {
                expected = followed_hash(&child, depth)?;
            }
            (ProofNode::Leaf { value, .. }, true) if slot == SHORT_NODE_SLOT => {
                terminal_value = Some(value);
            }
            (node, _) => {
                return Err(ProofError::MalformedNode {
                    depth,
                    reason: format!("slot {slot} can not be followed in {node:?}"),
                })
            }
        }
    }

    let terminal_value = terminal_value
        .ok_or_else(|| {
            ProofError::InconsistentProof("proof does not end on a value".to_string())
        })?;

    Ok(Replay {
        root: keccak(&proof[0]),
        terminal_value,
    })
}

fn followed_hash(child: &ChildRef, depth: usize) -> ProofResult<H256> {
    match child {
        ChildRef::Hash(h) => Ok(*h),
        ChildRef::Empty => Err(ProofError::MalformedNode {
            depth,
            reason: "followed an empty slot".to_string(),
        }),
        ChildRef::Inline(_) => Err(ProofError::MalformedNode {
            depth,
            reason: "followed an embedded child".to_string(),
        }),
    }
}
