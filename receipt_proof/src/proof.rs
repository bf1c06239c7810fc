//! Proof variants and the entry point that builds them.

use std::fmt::{self, Display};

use bytes::Bytes;
use enum_as_inner::EnumAsInner;
use ethereum_types::H256;
use log::debug;

use crate::{
    error::{ProofError, ProofResult},
    mpt::{self, v1, v2},
    network::QuirkRegistry,
    rpc::{RpcBlock, RpcReceipt},
    self_check::assert_receipt_inclusion,
    trie_builder::{receipt_key, ReceiptTrie},
};

/// How a packet is proven to the destination chain.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OutboundProofType {
    /// A receipt inclusion proof against a receipts root.
    Mpt = 1,
    /// The packet itself, attested off-chain.
    FeatherProof = 2,
}

impl TryFrom<u8> for OutboundProofType {
    type Error = ProofError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Mpt),
            2 => Ok(Self::FeatherProof),
            _ => Err(ProofError::UnknownProofType(v)),
        }
    }
}

impl Display for OutboundProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutboundProofType::Mpt => "MPT",
            OutboundProofType::FeatherProof => "FP",
        };

        write!(f, "{}", s)
    }
}

/// Version of the on-chain validator library a proof is built for.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum UtilityVersion {
    /// Flat parser following byte pointers.
    V1 = 1,
    /// Node decoding verifier following slot indices.
    V2 = 2,
    /// Like [`UtilityVersion::V2`], plus the block hash.
    V3 = 3,
    /// Like [`UtilityVersion::V2`], without a source endpoint id parameter.
    V4 = 4,
}

impl UtilityVersion {
    /// Every version, oldest first.
    pub const ALL: [UtilityVersion; 4] = [Self::V1, Self::V2, Self::V3, Self::V4];
}

impl TryFrom<u8> for UtilityVersion {
    type Error = ProofError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            _ => Err(ProofError::UnknownUtilityVersion(v)),
        }
    }
}

impl Display for UtilityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", *self as u8)
    }
}

/// Path metadata telling a verifier how to get from one node to the next.
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
pub enum ProofPath {
    /// [`UtilityVersion::V1`]: byte offsets of child hashes, then the slot
    /// of the receipt in the last node.
    Pointers {
        /// One offset per node but the last.
        pointers: Vec<usize>,
        /// `16` for a branch value, `1` for a leaf.
        receipt_slot_index: usize,
    },
    /// Every other version: one slot index per node.
    SlotIndices(Vec<usize>),
}

/// A receipt inclusion proof, ready to be encoded for a verifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReceiptProof {
    /// The validator library version this proof targets.
    pub version: UtilityVersion,
    /// Index of the proven receipt in the block.
    pub transaction_index: usize,
    /// Root the proof is checked against.
    pub receipts_root: H256,
    /// RLP encoded nodes from the root down to the receipt.
    pub proof: Vec<Bytes>,
    /// How to follow the nodes.
    pub path: ProofPath,
    /// Only set for [`UtilityVersion::V3`].
    pub block_hash: Option<H256>,
}

/// Builds the proof for `tx_index` out of an already checked trie, then
/// replays it offline before handing it out.
pub fn assemble_receipt_proof(
    trie: &ReceiptTrie,
    tx_index: usize,
    version: UtilityVersion,
) -> ProofResult<ReceiptProof> {
    let target = trie.encoded_receipt(tx_index)?;
    let stack = trie.traversal_stack(tx_index)?;
    let walk = mpt::walk(&stack, receipt_key(tx_index)?, trie.root(), target)?;

    let path = match version {
        UtilityVersion::V1 => ProofPath::Pointers {
            pointers: v1::pointers(&walk)?,
            receipt_slot_index: walk.terminal_slot(),
        },
        UtilityVersion::V2 | UtilityVersion::V3 | UtilityVersion::V4 => {
            ProofPath::SlotIndices(v2::slot_indices(&walk))
        }
    };

    let proof = ReceiptProof {
        version,
        transaction_index: tx_index,
        receipts_root: trie.root(),
        proof: walk.nodes,
        path,
        block_hash: (version == UtilityVersion::V3).then(|| trie.block_hash()),
    };
    assert_receipt_inclusion(&proof, target)?;

    debug!(
        "Built {} proof for transaction {} ({} nodes)",
        version,
        tx_index,
        proof.proof.len()
    );

    Ok(proof)
}

/// Builds a receipt inclusion proof for transaction `tx_index` of `block`.
///
/// The network is resolved before anything else, so an unknown network
/// never costs a trie build. Only [`OutboundProofType::Mpt`] yields receipt
/// proofs.
pub fn get_receipt_proof(
    registry: &QuirkRegistry,
    network: &str,
    block: &RpcBlock,
    receipts: &[RpcReceipt],
    tx_index: usize,
    proof_type: OutboundProofType,
    version: UtilityVersion,
) -> ProofResult<ReceiptProof> {
    let quirks = registry.get(network)?;

    if proof_type != OutboundProofType::Mpt {
        return Err(ProofError::UnsupportedVariant {
            proof_type,
            version,
        });
    }

    let trie = ReceiptTrie::build(quirks, block, receipts)?;
    assemble_receipt_proof(&trie, tx_index, version)
}

#[cfg(test)]
mod tests {
    use super::{get_receipt_proof, OutboundProofType, ProofPath, UtilityVersion};
    use crate::{
        error::ProofError,
        network::QuirkRegistry,
        testing_utils::{common_setup, load_fixture, sample_proof},
    };

    #[test]
    fn numeric_conversions() {
        common_setup();

        assert_eq!(OutboundProofType::try_from(1).unwrap(), OutboundProofType::Mpt);
        assert_eq!(
            OutboundProofType::try_from(2).unwrap(),
            OutboundProofType::FeatherProof
        );
        assert!(matches!(
            OutboundProofType::try_from(3),
            Err(ProofError::UnknownProofType(3))
        ));

        for v in 1..=4u8 {
            assert_eq!(UtilityVersion::try_from(v).unwrap() as u8, v);
        }
        assert!(matches!(
            UtilityVersion::try_from(0),
            Err(ProofError::UnknownUtilityVersion(0))
        ));
        assert_eq!(UtilityVersion::V3.to_string(), "V3");
    }

    #[test]
    fn sample_proofs_match_the_recorded_ones() {
        common_setup();
        let fixture = load_fixture("sample_block.json");

        let v1 = sample_proof(UtilityVersion::V1);
        assert_eq!(v1.proof, fixture.expected.proof);
        assert_eq!(
            v1.path,
            ProofPath::Pointers {
                pointers: fixture.expected.pointers.clone(),
                receipt_slot_index: fixture.expected.receipt_slot_index,
            }
        );
        assert_eq!(v1.block_hash, None);

        let v2 = sample_proof(UtilityVersion::V2);
        assert_eq!(v2.proof, fixture.expected.proof);
        assert_eq!(
            v2.path.as_slot_indices().unwrap(),
            &fixture.expected.slot_indices
        );

        let v3 = sample_proof(UtilityVersion::V3);
        assert_eq!(v3.path, v2.path);
        assert_eq!(v3.block_hash, Some(fixture.block.hash));

        let v4 = sample_proof(UtilityVersion::V4);
        assert_eq!(v4.path, v2.path);
        assert_eq!(v4.block_hash, None);
    }

    #[test]
    fn feather_proofs_are_not_receipt_proofs() {
        common_setup();
        let fixture = load_fixture("sample_block.json");

        let result = get_receipt_proof(
            &QuirkRegistry::default(),
            "default",
            &fixture.block,
            &fixture.receipts,
            2,
            OutboundProofType::FeatherProof,
            UtilityVersion::V2,
        );
        assert!(matches!(
            result,
            Err(ProofError::UnsupportedVariant {
                proof_type: OutboundProofType::FeatherProof,
                version: UtilityVersion::V2
            })
        ));
    }

    #[test]
    fn unknown_networks_fail_before_the_trie_is_built() {
        common_setup();
        let mut fixture = load_fixture("sample_block.json");
        // Would be a root mismatch if the trie were built.
        fixture.block.receipts_root.0[31] ^= 0xff;

        let result = get_receipt_proof(
            &QuirkRegistry::default(),
            "solana",
            &fixture.block,
            &fixture.receipts,
            2,
            OutboundProofType::Mpt,
            UtilityVersion::V2,
        );
        assert!(matches!(result, Err(ProofError::UnsupportedNetwork(_))));
    }
}
