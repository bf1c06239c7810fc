#![allow(dead_code)]

use std::{fs, sync::Arc};

use bytes::Bytes;
use eth_trie::{EthTrie, MemoryDB, Trie as _};
use ethereum_types::{Address, Bloom, H256, U256, U64};
use rand::{rngs::StdRng, Rng, SeedableRng};
use receipt_proof::{
    receipt::CanonicalReceipt, rpc::BlockTransaction, RpcBlock, RpcLog, RpcReceipt,
};
use serde::{de::Error as _, Deserialize, Deserializer};

pub fn common_setup() {
    let _ = pretty_env_logger::try_init();
}

/// A recorded block and the proof transaction `transaction_index` must get.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub network: String,
    pub transaction_index: usize,
    pub block: RpcBlock,
    pub receipts: Vec<RpcReceipt>,
    pub expected: Expected,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expected {
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
            hex::decode(s.trim_start_matches("0x"))
                .map(Bytes::from)
                .map_err(D::Error::custom)
        })
        .collect()
}

pub fn load_fixture(name: &str) -> anyhow::Result<Fixture> {
    let path = format!("{}/test_data/{}", env!("CARGO_MANIFEST_DIR"), name);
    let json = fs::read_to_string(path)?;

    Ok(serde_json::from_str(&json)?)
}

pub const FIXTURES: [&str; 4] = [
    "sample_block.json",
    "polygon_state_sync.json",
    "arbitrum_classic.json",
    "harmony_staking.json",
];

fn random_log(rng: &mut StdRng) -> RpcLog {
    let data_len = rng.gen_range(0..200);

    RpcLog {
        address: Address::from(rng.gen::<[u8; 20]>()),
        topics: (0..rng.gen_range(1..=4))
            .map(|_| H256::from(rng.gen::<[u8; 32]>()))
            .collect(),
        data: (0..data_len).map(|_| rng.gen()).collect(),
    }
}

/// `n` receipts with random types, outcomes and logs. Gas accumulates the
/// way it does in a real block.
pub fn random_receipts(n: usize, seed: u64) -> Vec<RpcReceipt> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut gas = 0u64;

    (0..n)
        .map(|i| {
            gas += rng.gen_range(21_000..500_000);
            let pre_byzantium = rng.gen_bool(0.05);

            RpcReceipt {
                transaction_hash: H256::from(rng.gen::<[u8; 32]>()),
                transaction_index: Some(U64::from(i)),
                cumulative_gas_used: U256::from(gas),
                logs_bloom: Bloom::from([rng.gen::<u8>(); 256]),
                logs: (0..rng.gen_range(0..4)).map(|_| random_log(&mut rng)).collect(),
                status: (!pre_byzantium).then(|| U64::from(rng.gen_range(0..=1u64))),
                root: pre_byzantium.then(|| H256::from(rng.gen::<[u8; 32]>())),
                transaction_type: match pre_byzantium {
                    true => None,
                    false => Some(U64::from(rng.gen_range(0..=2u64))),
                },
            }
        })
        .collect()
}

/// Receipts root of `receipts` according to `eth_trie`.
pub fn eth_trie_receipts_root(receipts: &[RpcReceipt]) -> anyhow::Result<H256> {
    let mut truth_trie = EthTrie::new(Arc::new(MemoryDB::new(true)));

    for (i, receipt) in receipts.iter().enumerate() {
        let key = rlp::encode(&(i as u64));
        let value = CanonicalReceipt::from_rpc(receipt)?.encode();
        truth_trie.insert(&key, &value)?;
    }

    // Same type behind two versions of the crate.
    Ok(H256(truth_trie.root_hash()?.0))
}

/// A block committing to `receipts`, with the root taken from `eth_trie`.
pub fn block_for(receipts: &[RpcReceipt], number: u64) -> anyhow::Result<RpcBlock> {
    Ok(RpcBlock {
        number: U64::from(number),
        hash: H256::from_low_u64_be(number),
        receipts_root: eth_trie_receipts_root(receipts)?,
        transactions: receipts
            .iter()
            .map(|r| BlockTransaction::Hash(r.transaction_hash))
            .collect(),
    })
}
