//! Offline replay of an assembled proof.
//!
//! Nothing computed while assembling is reused here: the proof is checked
//! from its bytes and path metadata alone, the way an on-chain verifier
//! would see it.

use bytes::Bytes;
use ethereum_types::H256;

use crate::{
    error::{ProofError, ProofResult},
    mpt::{v1, v2},
    proof::{ProofPath, ReceiptProof, UtilityVersion},
};

/// Result of replaying a proof.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Replay {
    /// Hash of the first node, i.e. the root the proof commits to.
    pub root: H256,
    /// Value found at the terminal slot of the last node.
    pub terminal_value: Bytes,
}

/// Replays `proof` against its own receipts root.
pub fn replay_proof(proof: &ReceiptProof) -> ProofResult<Replay> {
    match (&proof.path, proof.version) {
        (
            ProofPath::Pointers {
                pointers,
                receipt_slot_index,
            },
            UtilityVersion::V1,
        ) => v1::replay(proof.receipts_root, &proof.proof, pointers, *receipt_slot_index),
        (ProofPath::SlotIndices(_), UtilityVersion::V3) if proof.block_hash.is_none() => Err(
            ProofError::InconsistentProof("version 3 proof without a block hash".to_string()),
        ),
        (
            ProofPath::SlotIndices(slots),
            UtilityVersion::V2 | UtilityVersion::V3 | UtilityVersion::V4,
        ) => v2::replay(proof.receipts_root, &proof.proof, slots),
        (_, version) => Err(ProofError::InconsistentProof(format!(
            "path metadata does not match utility version {version}"
        ))),
    }
}

/// Replays `proof` and checks that it proves exactly `expected_receipt`.
pub fn assert_receipt_inclusion(
    proof: &ReceiptProof,
    expected_receipt: &[u8],
) -> ProofResult<Replay> {
    let replay = replay_proof(proof)?;

    if replay.root != proof.receipts_root {
        return Err(ProofError::HashChainBroken {
            depth: 0,
            expected: proof.receipts_root,
            found: replay.root,
        });
    }
    if replay.terminal_value.as_ref() != expected_receipt {
        return Err(ProofError::ReceiptMismatch {
            depth: proof.proof.len().saturating_sub(1),
        });
    }

    Ok(replay)
}

#[cfg(test)]
mod tests {
    use super::{assert_receipt_inclusion, replay_proof};
    use crate::{
        error::ProofError,
        proof::{ProofPath, UtilityVersion},
        testing_utils::{common_setup, load_fixture, sample_proof},
    };

    #[test]
    fn sample_proofs_replay_to_the_receipt() {
        common_setup();
        let fixture = load_fixture("sample_block.json");

        for version in UtilityVersion::ALL {
            let proof = sample_proof(version);
            let replay = assert_receipt_inclusion(&proof, &fixture.expected.receipt).unwrap();

            assert_eq!(replay.root, fixture.block.receipts_root);
            assert_eq!(replay.terminal_value.as_ref(), fixture.expected.receipt.as_slice());
        }
    }

    #[test]
    fn other_receipts_are_not_proven() {
        common_setup();

        let proof = sample_proof(UtilityVersion::V2);
        assert!(matches!(
            assert_receipt_inclusion(&proof, b"some other receipt"),
            Err(ProofError::ReceiptMismatch { depth: 2 })
        ));
    }

    #[test]
    fn metadata_must_match_the_version() {
        common_setup();

        let mut proof = sample_proof(UtilityVersion::V1);
        proof.version = UtilityVersion::V2;
        assert!(matches!(replay_proof(&proof), Err(ProofError::InconsistentProof(_))));

        let mut proof = sample_proof(UtilityVersion::V3);
        proof.block_hash = None;
        assert!(matches!(replay_proof(&proof), Err(ProofError::InconsistentProof(_))));

        let mut proof = sample_proof(UtilityVersion::V4);
        proof.path = ProofPath::Pointers {
            pointers: vec![3, 37],
            receipt_slot_index: 1,
        };
        assert!(matches!(replay_proof(&proof), Err(ProofError::InconsistentProof(_))));
    }
}
