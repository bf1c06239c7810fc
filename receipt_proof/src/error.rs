//! Error types returned while building and checking receipt proofs.

use ethereum_types::{H256, U64};
use receipt_trie::{
    nibbles::BytesToNibblesError, proof_node::NodeDecodeError, trie_ops::TrieOpError,
};
use thiserror::Error;

use crate::proof::{OutboundProofType, UtilityVersion};

/// Result alias for proof operations.
pub type ProofResult<T> = Result<T, ProofError>;

/// Everything that can stop a proof from being built or accepted.
///
/// None of these are transient: the same input fails the same way every
/// time, so callers should not retry.
#[derive(Debug, Error)]
pub enum ProofError {
    /// The network identifier has no entry in the quirk registry.
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// The receipts we inserted do not hash to the root the block declares.
    #[error("receiptsRoot from block ({expected:#x}) != receipts root we built ({computed:#x})")]
    RootMismatch {
        /// Root declared by the block header.
        expected: H256,
        /// Root of the trie built from the filtered receipts.
        computed: H256,
    },

    /// A node does not hash to the value its parent (or the root) commits to.
    #[error("Hash chain broken at depth {depth}: expected {expected:#x}, found {found:#x}")]
    HashChainBroken {
        /// Index of the offending node, root is 0.
        depth: usize,
        /// Hash referenced by the parent.
        expected: H256,
        /// Hash of the node bytes.
        found: H256,
    },

    /// The hash chain is intact but the terminal slot does not hold the
    /// receipt that was asked for.
    #[error("Proof terminates at depth {depth} on a value that is not the target receipt")]
    ReceiptMismatch {
        /// Index of the terminal node.
        depth: usize,
    },

    /// A node has a shape the traversal can not accept.
    #[error("Malformed trie node at depth {depth}: {reason}")]
    MalformedNode {
        /// Index of the offending node, root is 0.
        depth: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A path step selects a slot outside `0..=16`.
    #[error("Invalid nibble {nibble} at depth {depth}")]
    InvalidNibble {
        /// The rejected slot.
        nibble: usize,
        /// Index of the node the slot was applied to.
        depth: usize,
    },

    /// The underlying trie rejected an operation.
    #[error(transparent)]
    Trie(#[from] TrieOpError),

    /// A trie key could not be built from a transaction index.
    #[error(transparent)]
    Key(#[from] BytesToNibblesError),

    /// A receipt or packet could not be parsed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The proof type and utility version combination is not implemented.
    #[error("Unsupported proof variant: outbound proof type {proof_type} with utility version {version}")]
    UnsupportedVariant {
        /// The requested proof type.
        proof_type: OutboundProofType,
        /// The requested utility version.
        version: UtilityVersion,
    },

    /// Unknown numeric outbound proof type.
    #[error("Unknown outbound proof type: {0}")]
    UnknownProofType(u8),

    /// Unknown numeric utility version.
    #[error("Unknown utility version: {0}")]
    UnknownUtilityVersion(u8),

    /// There is no receipt at the requested transaction index.
    #[error("No receipt at transaction index {index} (the block has {count})")]
    TransactionNotFound {
        /// The requested transaction index.
        index: usize,
        /// Number of receipts in the trie.
        count: usize,
    },

    /// There is no log at the requested index within a receipt.
    #[error("Transaction {transaction_index} has no log at index {log_index}")]
    LogNotFound {
        /// The transaction holding the receipt.
        transaction_index: usize,
        /// The requested log index.
        log_index: usize,
    },

    /// The parameter layout of this version starts with the source endpoint
    /// id, which was not given.
    #[error("Utility version {0} needs a source endpoint id")]
    MissingSourceEndpoint(UtilityVersion),

    /// The proof object disagrees with itself, for example a V2 path on a
    /// proof tagged V1.
    #[error("Inconsistent proof: {0}")]
    InconsistentProof(String),

    /// A log recovered from a proof differs from the log reported by RPC.
    #[error("Log {log_index} of transaction {transaction_index} differs from the proven receipt ({field})")]
    LogMismatch {
        /// The transaction holding the log.
        transaction_index: usize,
        /// Index of the log within the receipt.
        log_index: usize,
        /// The first field that differs.
        field: &'static str,
    },
}

/// Errors raised while turning raw data into structured receipts and
/// packets.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Receipts carry either a `status` or a pre-Byzantium `root`.
    #[error("Receipt {0:#x} has neither a status nor a state root")]
    MissingOutcome(H256),

    /// A status other than 0 or 1.
    #[error("Receipt {tx_hash:#x} has an invalid status {status}")]
    InvalidStatus {
        /// The receipt's transaction.
        tx_hash: H256,
        /// The reported status.
        status: U64,
    },

    /// EIP-2718 types live in `0x00..=0x7f`.
    #[error("Invalid EIP-2718 transaction type {0}")]
    InvalidTransactionType(U64),

    /// No bytes where a receipt was expected.
    #[error("Empty receipt encoding")]
    EmptyReceipt,

    /// A packet is shorter than its fixed header.
    #[error("Packet too short: need at least {needed} bytes, found {found}")]
    PacketTooShort {
        /// Bytes required by the layout.
        needed: usize,
        /// Bytes available.
        found: usize,
    },

    /// An `abi.encode(bytes)` header whose length does not match the data
    /// that follows.
    #[error("Wrapped packet declares {declared} bytes but {available} follow the header")]
    WrappedLengthMismatch {
        /// Length from the header.
        declared: u64,
        /// Bytes after the two header words.
        available: usize,
    },

    /// A log without topics can not be checked against an event.
    #[error("Log {0} has no topics")]
    MissingTopic(usize),

    /// Invalid RLP.
    #[error(transparent)]
    Rlp(#[from] rlp::DecoderError),

    /// Invalid ABI encoding.
    #[error(transparent)]
    Abi(#[from] alloy_sol_types::Error),

    /// Invalid JSON input.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Invalid trie node bytes.
    #[error(transparent)]
    Node(#[from] NodeDecodeError),
}
