//! The canonical byte form of a receipt, as stored in the receipts trie.

use bytes::Bytes;
use ethereum_types::{Address, Bloom, H256, U256, U64};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use rlp_derive::{RlpDecodable, RlpEncodable};

use crate::{
    error::DecodeError,
    rpc::{RpcLog, RpcReceipt},
};

/// Highest EIP-2718 transaction type. Anything above is the first byte of a
/// legacy RLP list.
const MAX_TX_TYPE: u8 = 0x7f;

/// The first field of a receipt: the post-Byzantium status or the
/// pre-Byzantium state root.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReceiptOutcome {
    /// Execution status. `false` encodes as the empty string.
    Status(bool),
    /// Intermediate state root.
    StateRoot(H256),
}

impl Encodable for ReceiptOutcome {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self {
            ReceiptOutcome::Status(true) => s.append(&1u8),
            ReceiptOutcome::Status(false) => s.append_empty_data(),
            ReceiptOutcome::StateRoot(root) => s.append(root),
        };
    }
}

impl Decodable for ReceiptOutcome {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        match rlp.data()? {
            [] => Ok(ReceiptOutcome::Status(false)),
            [1] => Ok(ReceiptOutcome::Status(true)),
            root if root.len() == 32 => Ok(ReceiptOutcome::StateRoot(H256::from_slice(root))),
            _ => Err(DecoderError::Custom("Invalid receipt status")),
        }
    }
}

/// A log in its RLP form `[address, [topics...], data]`.
#[derive(Clone, Debug, Eq, PartialEq, RlpDecodable, RlpEncodable)]
pub struct LogRlp {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<H256>,
    /// Event data.
    pub data: Bytes,
}

impl From<&RpcLog> for LogRlp {
    fn from(log: &RpcLog) -> Self {
        Self {
            address: log.address,
            topics: log.topics.clone(),
            data: Bytes::copy_from_slice(&log.data),
        }
    }
}

/// The RLP list `[outcome, cumulativeGasUsed, logsBloom, logs]`.
#[derive(Clone, Debug, Eq, PartialEq, RlpDecodable, RlpEncodable)]
pub struct ReceiptRlp {
    /// Status or state root.
    pub outcome: ReceiptOutcome,
    /// Cumulative gas used in the block after this transaction.
    pub cum_gas_used: U256,
    /// Logs bloom.
    pub bloom: Bloom,
    /// Logs.
    pub logs: Vec<LogRlp>,
}

/// A receipt together with its EIP-2718 type, i.e. everything needed to
/// produce the exact bytes a client puts in the receipts trie.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanonicalReceipt {
    /// EIP-2718 type, `0` for legacy receipts.
    pub tx_type: u8,
    /// The RLP encoded part.
    pub body: ReceiptRlp,
}

impl CanonicalReceipt {
    /// Builds the canonical form of a receipt reported over RPC.
    pub fn from_rpc(receipt: &RpcReceipt) -> Result<Self, DecodeError> {
        let outcome = match (receipt.status, receipt.root) {
            (Some(status), _) if status.is_zero() => ReceiptOutcome::Status(false),
            (Some(status), _) if status == U64::one() => ReceiptOutcome::Status(true),
            (Some(status), _) => {
                return Err(DecodeError::InvalidStatus {
                    tx_hash: receipt.transaction_hash,
                    status,
                })
            }
            (None, Some(root)) => ReceiptOutcome::StateRoot(root),
            (None, None) => return Err(DecodeError::MissingOutcome(receipt.transaction_hash)),
        };

        let tx_type = receipt.transaction_type.unwrap_or_default();
        if tx_type > U64::from(MAX_TX_TYPE) {
            return Err(DecodeError::InvalidTransactionType(tx_type));
        }

        Ok(Self {
            tx_type: tx_type.low_u64() as u8,
            body: ReceiptRlp {
                outcome,
                cum_gas_used: receipt.cumulative_gas_used,
                bloom: receipt.logs_bloom,
                logs: receipt.logs.iter().map(LogRlp::from).collect(),
            },
        })
    }

    /// `type ++ rlp(body)` for typed receipts, `rlp(body)` for legacy ones.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = rlp::encode(&self.body).to_vec();
        if self.tx_type != 0 {
            bytes.insert(0, self.tx_type);
        }

        bytes
    }

    /// Parses the bytes produced by [`CanonicalReceipt::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (tx_type, rlp) = match bytes.split_first() {
            None => return Err(DecodeError::EmptyReceipt),
            Some((&first, rest)) if first <= MAX_TX_TYPE => (first, rest),
            Some(_) => (0, bytes),
        };

        Ok(Self {
            tx_type,
            body: rlp::decode(rlp)?,
        })
    }

    /// The receipt's logs.
    pub fn logs(&self) -> &[LogRlp] {
        &self.body.logs
    }
}
