use std::fs;

use bytes::Bytes;
use ethereum_types::H256;
use receipt_trie::{nibbles::Nibbles, partial_trie::Trie, utils::TryFromIterator};
use serde::{de::Error as _, Deserialize, Deserializer};

use crate::{
    network::QuirkRegistry,
    proof::{get_receipt_proof, OutboundProofType, ReceiptProof, UtilityVersion},
    rpc::{RpcBlock, RpcReceipt},
};

pub(crate) fn common_setup() {
    // Try init since multiple tests calling `init` will cause an error.
    let _ = pretty_env_logger::try_init();
}

/// A block snapshot from `test_data/` and what proving one of its receipts
/// has to produce.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Fixture {
    pub network: String,
    pub transaction_index: usize,
    pub block: RpcBlock,
    pub receipts: Vec<RpcReceipt>,
    pub expected: Expected,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Expected {
    pub receipts_root: H256,
    #[serde(with = "impl_serde::serialize")]
    pub receipt: Vec<u8>,
    #[serde(deserialize_with = "hex_list")]
    pub proof: Vec<Bytes>,
    pub slot_indices: Vec<usize>,
    pub pointers: Vec<usize>,
    pub receipt_slot_index: usize,
}

fn hex_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Bytes>, D::Error> {
    Vec::<String>::deserialize(deserializer)?
        .iter()
        .map(|s| {
            hex::decode(s.strip_prefix("0x").unwrap_or(s))
                .map(Bytes::from)
                .map_err(D::Error::custom)
        })
        .collect()
}

pub(crate) fn load_fixture(name: &str) -> Fixture {
    let path = format!("{}/test_data/{}", env!("CARGO_MANIFEST_DIR"), name);
    let json = fs::read_to_string(&path).unwrap();

    serde_json::from_str(&json).unwrap()
}

/// Proof of transaction 2 of the sample block.
pub(crate) fn sample_proof(version: UtilityVersion) -> ReceiptProof {
    let fixture = load_fixture("sample_block.json");

    get_receipt_proof(
        &QuirkRegistry::default(),
        &fixture.network,
        &fixture.block,
        &fixture.receipts,
        fixture.transaction_index,
        OutboundProofType::Mpt,
        version,
    )
    .unwrap()
}

pub(crate) const WORD_TRIE_ROOT: [u8; 32] =
    hex_literal::hex!("ee3085824dee2df0948ae2b7fd7ad84dec816929ab335b94ef51ab9831fded11");

/// `do`, `dog`, `doge` and `horse`, with values long enough that every node
/// is referenced by hash. `do` and `dog` end up in branch value slots.
pub(crate) fn word_trie() -> Trie {
    let entries = [
        ("do", "verb".repeat(10)),
        ("dog", "puppy".repeat(8)),
        ("doge", "coin".repeat(10)),
        ("horse", "stallion".repeat(5)),
    ];

    Trie::try_from_iter(entries.into_iter().map(|(k, v)| {
        (
            Nibbles::from_bytes_be(k.as_bytes()).unwrap(),
            v.into_bytes(),
        )
    }))
    .unwrap()
}
