//! The block and receipt shapes handed to us by an Ethereum JSON-RPC client.
//!
//! Only the fields that end up in the receipts trie (or decide which
//! receipts get there) are modelled. Everything else in the RPC payload is
//! ignored while deserializing.

use ethereum_types::{Address, Bloom, H256, U256, U64};
use serde::{Deserialize, Serialize};

/// The subset of a block header (plus its transaction list) needed to
/// rebuild the receipts trie.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    /// Block number.
    pub number: U64,
    /// Block hash.
    pub hash: H256,
    /// The receipts root committed to by the header.
    pub receipts_root: H256,
    /// The ordinary transactions of the block, in order.
    #[serde(default)]
    pub transactions: Vec<BlockTransaction>,
}

impl RpcBlock {
    /// Hashes of the block's transactions, in order.
    pub fn transaction_hashes(&self) -> impl Iterator<Item = H256> + '_ {
        self.transactions.iter().map(BlockTransaction::hash)
    }
}

/// `eth_getBlockBy*` returns either bare hashes or full transaction objects
/// depending on the `full` flag.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockTransaction {
    /// Only the transaction hash.
    Hash(H256),
    /// A full transaction object.
    Full(Box<RpcTransaction>),
}

impl BlockTransaction {
    /// The transaction hash, whichever form we were given.
    pub fn hash(&self) -> H256 {
        match self {
            BlockTransaction::Hash(h) => *h,
            BlockTransaction::Full(tx) => tx.hash,
        }
    }
}

/// A full transaction object. Only its hash matters here.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    /// Transaction hash.
    pub hash: H256,
}

/// A transaction receipt as returned by `eth_getTransactionReceipt`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: H256,
    /// Position of the transaction in the block, when the node reports it.
    #[serde(default)]
    pub transaction_index: Option<U64>,
    /// Gas used by this and all preceding transactions of the block.
    pub cumulative_gas_used: U256,
    /// Bloom filter over the receipt's logs.
    pub logs_bloom: Bloom,
    /// Logs emitted by the transaction.
    pub logs: Vec<RpcLog>,
    /// Post-Byzantium execution status (`0x0` or `0x1`).
    #[serde(default)]
    pub status: Option<U64>,
    /// Pre-Byzantium intermediate state root.
    #[serde(default)]
    pub root: Option<H256>,
    /// EIP-2718 transaction type. Absent on legacy-only chains.
    #[serde(default, rename = "type")]
    pub transaction_type: Option<U64>,
}

/// A log entry of a receipt.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    /// The emitting contract.
    pub address: Address,
    /// Indexed topics, `topics[0]` being the event signature.
    pub topics: Vec<H256>,
    /// Non-indexed event data.
    #[serde(with = "impl_serde::serialize")]
    pub data: Vec<u8>,
}
