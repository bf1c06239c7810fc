//! Pointer proofs.
//!
//! Verifiers of this version never decode a node. They hash it, then read the
//! next hash as the 32 bytes found at a byte offset ("pointer") into the node.
//! The last node is only decoded to pull out the receipt at its terminal slot.

use bytes::Bytes;
use ethereum_types::H256;
use keccak_hash::keccak;
use receipt_trie::proof_node::{item_payload_offset, ProofNode};

use super::{Walk, BRANCH_VALUE_SLOT, SHORT_NODE_SLOT};
use crate::{
    error::{DecodeError, ProofError, ProofResult},
    self_check::Replay,
};

/// Byte offsets, one per non-terminal node, of the hash of the next node.
pub fn pointers(walk: &Walk) -> ProofResult<Vec<usize>> {
    walk.steps
        .iter()
        .zip(walk.nodes.windows(2))
        .enumerate()
        .map(|(depth, (step, pair))| {
            let offset = item_payload_offset(&pair[0], step.slot()).map_err(DecodeError::from)?;
            let next_hash = keccak(&pair[1]);

            match pair[0].get(offset..offset + 32) {
                Some(bytes) if bytes == next_hash.as_bytes() => Ok(offset),
                _ => Err(ProofError::MalformedNode {
                    depth,
                    reason: format!("no child hash at offset {offset}"),
                }),
            }
        })
        .collect()
}

/// Replays a pointer proof the way a flat parsing verifier does.
pub fn replay(
    root: H256,
    proof: &[Bytes],
    pointers: &[usize],
    receipt_slot_index: usize,
) -> ProofResult<Replay> {
    let Some(last) = proof.last() else {
        return Err(ProofError::InconsistentProof("empty proof".to_string()));
    };
    if pointers.len() + 1 != proof.len() {
        return Err(ProofError::InconsistentProof(format!(
            "{} pointers for {} nodes",
            pointers.len(),
            proof.len()
        )));
    }

    let mut expected = root;
    for (depth, node) in proof.iter().enumerate() {
        let found = keccak(node);
        if found != expected {
            return Err(ProofError::HashChainBroken {
                depth,
                expected,
                found,
            });
        }

        if let Some(&pointer) = pointers.get(depth) {
            expected = node
                .get(pointer..pointer + 32)
                .map(H256::from_slice)
                .ok_or_else(|| ProofError::MalformedNode {
                    depth,
                    reason: format!("pointer {pointer} is out of bounds"),
                })?;
        }
    }

    let last_node = ProofNode::decode(last).map_err(DecodeError::from)?;
    let terminal_value = match (last_node, receipt_slot_index) {
        (ProofNode::Branch { value, .. }, BRANCH_VALUE_SLOT) => value,
        (ProofNode::Leaf { value, .. }, SHORT_NODE_SLOT) => value,
        _ => {
            return Err(ProofError::MalformedNode {
                depth: proof.len() - 1,
                reason: format!("slot {receipt_slot_index} holds no value"),
            })
        }
    };

    Ok(Replay {
        root: keccak(&proof[0]),
        terminal_value,
    })
}
