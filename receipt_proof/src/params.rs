//! ABI encoding of proofs into the parameters each validator version takes.

use alloy_primitives::{Address as AbiAddress, Bytes as AbiBytes, B256, U256};
use alloy_sol_types::{sol_data, SolType};
use ethereum_types::Address;

use crate::{
    error::{ProofError, ProofResult},
    proof::{OutboundProofType, ProofPath, ReceiptProof, UtilityVersion},
};

type NodeList = sol_data::Array<sol_data::Bytes>;
type IndexList = sol_data::Array<sol_data::Uint<256>>;

/// `(uint16 srcEndpointId, bytes[] proof, uint256[] pointers, uint256 receiptSlotIndex, uint256 logIndex)`
pub type V1Params = (
    sol_data::Uint<16>,
    NodeList,
    IndexList,
    sol_data::Uint<256>,
    sol_data::Uint<256>,
);

/// `(uint16 srcEndpointId, bytes[] proof, uint256[] slotIndices, uint256 logIndex)`
pub type V2Params = (sol_data::Uint<16>, NodeList, IndexList, sol_data::Uint<256>);

/// `(uint16 srcEndpointId, bytes32 blockHash, bytes[] proof, uint256[] slotIndices, uint256 logIndex)`
pub type V3Params = (
    sol_data::Uint<16>,
    sol_data::FixedBytes<32>,
    NodeList,
    IndexList,
    sol_data::Uint<256>,
);

/// `(bytes[] proof, uint256[] slotIndices, uint256 logIndex)`
pub type V4Params = (NodeList, IndexList, sol_data::Uint<256>);

/// Encodes `proof` into the exact parameter tuple its validator version
/// expects, pointing the verifier at log `log_index` of the receipt.
///
/// Versions 1 to 3 take the source endpoint id as their first parameter.
pub fn encode_params(
    proof: &ReceiptProof,
    log_index: usize,
    src_endpoint_id: Option<u16>,
) -> ProofResult<Vec<u8>> {
    let nodes: Vec<AbiBytes> = proof
        .proof
        .iter()
        .map(|n| AbiBytes::copy_from_slice(n))
        .collect();
    let log_index = U256::from(log_index);
    let src = || src_endpoint_id.ok_or(ProofError::MissingSourceEndpoint(proof.version));

    let encoded = match (proof.version, &proof.path) {
        (
            UtilityVersion::V1,
            ProofPath::Pointers {
                pointers,
                receipt_slot_index,
            },
        ) => V1Params::abi_encode_params(&(
            src()?,
            nodes,
            indices(pointers),
            U256::from(*receipt_slot_index),
            log_index,
        )),
        (UtilityVersion::V2, ProofPath::SlotIndices(slots)) => {
            V2Params::abi_encode_params(&(src()?, nodes, indices(slots), log_index))
        }
        (UtilityVersion::V3, ProofPath::SlotIndices(slots)) => {
            let block_hash = proof.block_hash.ok_or_else(|| {
                ProofError::InconsistentProof("version 3 proof without a block hash".to_string())
            })?;

            V3Params::abi_encode_params(&(
                src()?,
                B256::from(block_hash.0),
                nodes,
                indices(slots),
                log_index,
            ))
        }
        (UtilityVersion::V4, ProofPath::SlotIndices(slots)) => {
            V4Params::abi_encode_params(&(nodes, indices(slots), log_index))
        }
        (version, _) => {
            return Err(ProofError::InconsistentProof(format!(
                "path metadata does not match utility version {version}"
            )))
        }
    };

    Ok(encoded)
}

fn indices(v: &[usize]) -> Vec<U256> {
    v.iter().map(|&i| U256::from(i)).collect()
}

/// Builds the proof bytes of an [`OutboundProofType::FeatherProof`].
///
/// - V1: the emitter left padded to 32 bytes, followed by the packet.
/// - V2: the packet as is.
pub fn get_feather_proof(
    version: UtilityVersion,
    emitter: Address,
    packet_payload: &[u8],
) -> ProofResult<Vec<u8>> {
    match version {
        UtilityVersion::V1 => {
            let emitter = AbiAddress::from(emitter.0).into_word();

            let mut proof = Vec::with_capacity(32 + packet_payload.len());
            proof.extend_from_slice(emitter.as_slice());
            proof.extend_from_slice(packet_payload);
            Ok(proof)
        }
        UtilityVersion::V2 => Ok(packet_payload.to_vec()),
        UtilityVersion::V3 | UtilityVersion::V4 => Err(ProofError::UnsupportedVariant {
            proof_type: OutboundProofType::FeatherProof,
            version,
        }),
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;
    use alloy_sol_types::SolType;
    use ethereum_types::{Address, H256};
    use hex_literal::hex;

    use super::{encode_params, get_feather_proof, V1Params, V2Params, V3Params, V4Params};
    use crate::{
        error::ProofError,
        proof::{OutboundProofType, UtilityVersion},
        testing_utils::{common_setup, load_fixture, sample_proof},
    };

    /// Reads the 32 byte head word at `slot` of an encoded tuple.
    fn word(encoded: &[u8], slot: usize) -> U256 {
        U256::from_be_slice(&encoded[slot * 32..(slot + 1) * 32])
    }

    #[test]
    fn v1_layout() {
        common_setup();
        let fixture = load_fixture("sample_block.json");

        let encoded = encode_params(&sample_proof(UtilityVersion::V1), 1, Some(101)).unwrap();

        // Head: srcEndpointId, offset(proof), offset(pointers), receiptSlotIndex, logIndex.
        assert_eq!(word(&encoded, 0), U256::from(101));
        assert_eq!(word(&encoded, 1), U256::from(5 * 32));
        assert_eq!(word(&encoded, 3), U256::from(1));
        assert_eq!(word(&encoded, 4), U256::from(1));

        let (src, proof, pointers, slot, log_index) =
            V1Params::abi_decode_params(&encoded, true).unwrap();
        assert_eq!(src, 101);
        assert_eq!(proof.len(), 3);
        assert_eq!(&proof[2][..], &fixture.expected.proof[2][..]);
        assert_eq!(pointers, vec![U256::from(3), U256::from(37)]);
        assert_eq!(slot, U256::from(1));
        assert_eq!(log_index, U256::from(1));
    }

    #[test]
    fn v2_to_v4_layouts() {
        common_setup();
        let fixture = load_fixture("sample_block.json");
        let slots = vec![U256::from(0), U256::from(2), U256::from(1)];

        let v2 = encode_params(&sample_proof(UtilityVersion::V2), 1, Some(101)).unwrap();
        assert_eq!(word(&v2, 0), U256::from(101));
        assert_eq!(word(&v2, 1), U256::from(4 * 32));
        let (src, proof, path, log_index) = V2Params::abi_decode_params(&v2, true).unwrap();
        assert_eq!((src, path.clone(), log_index), (101, slots.clone(), U256::from(1)));
        assert_eq!(proof.len(), 3);

        let v3 = encode_params(&sample_proof(UtilityVersion::V3), 1, Some(101)).unwrap();
        assert_eq!(&v3[32..64], fixture.block.hash.as_bytes());
        let (src, block_hash, _, path, _) = V3Params::abi_decode_params(&v3, true).unwrap();
        assert_eq!(src, 101);
        assert_eq!(H256(block_hash.0), fixture.block.hash);
        assert_eq!(path, slots);

        // No source endpoint id: the proof offset is the first word.
        let v4 = encode_params(&sample_proof(UtilityVersion::V4), 1, None).unwrap();
        assert_eq!(word(&v4, 0), U256::from(3 * 32));
        let (proof, path, log_index) = V4Params::abi_decode_params(&v4, true).unwrap();
        assert_eq!(&proof[0][..], &fixture.expected.proof[0][..]);
        assert_eq!((path, log_index), (slots, U256::from(1)));

        // V4 ignores an id it has no room for.
        assert_eq!(
            encode_params(&sample_proof(UtilityVersion::V4), 1, Some(7)).unwrap(),
            v4
        );
    }

    #[test]
    fn source_endpoint_is_required_up_to_v3() {
        common_setup();

        for version in [UtilityVersion::V1, UtilityVersion::V2, UtilityVersion::V3] {
            assert!(matches!(
                encode_params(&sample_proof(version), 0, None),
                Err(ProofError::MissingSourceEndpoint(v)) if v == version
            ));
        }
    }

    #[test]
    fn feather_proofs() {
        common_setup();
        let emitter = Address::from(hex!("52de0a13b50e250ebf64eb7396c597b457dde084"));
        let packet = hex!("0000000000000035deadbeef");

        let v1 = get_feather_proof(UtilityVersion::V1, emitter, &packet).unwrap();
        assert_eq!(&v1[..12], &[0u8; 12]);
        assert_eq!(&v1[12..32], emitter.as_bytes());
        assert_eq!(&v1[32..], &packet);

        assert_eq!(
            get_feather_proof(UtilityVersion::V2, emitter, &packet).unwrap(),
            packet.to_vec()
        );
        assert!(matches!(
            get_feather_proof(UtilityVersion::V4, emitter, &packet),
            Err(ProofError::UnsupportedVariant {
                proof_type: OutboundProofType::FeatherProof,
                ..
            })
        ));
    }
}
