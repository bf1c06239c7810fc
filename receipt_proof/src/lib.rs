//! Receipt inclusion proofs for cross-chain message verification.
//!
//! A packet sent to another chain is only as trustworthy as the proof that
//! the log carrying it was emitted. This crate rebuilds a block's receipts
//! trie from RPC data, checks it against the block's `receiptsRoot` and
//! produces a Merkle-Patricia proof for one receipt, in the format a given
//! on-chain validator library expects.
//!
//! The pipeline is:
//! 1. [`network`]: per-chain fixups of what RPC reports (dropped receipts,
//!    rewritten fields).
//! 2. [`receipt`]: the canonical receipt bytes stored in the trie.
//! 3. [`trie_builder`]: insertion under `rlp(index)` and the root check.
//! 4. [`proof`] / [`mpt`]: the root-to-leaf walk, turned into pointer (V1)
//!    or slot index (V2 to V4) path metadata.
//! 5. [`self_check`]: an offline replay of every proof before it is handed
//!    out.
//! 6. [`params`]: ABI encoding of the proof for the destination verifier.
//!
//! [`packet`] and [`log_verifier`] work on the other side of a proof: they
//! recover logs and packets from proven receipts.
//!
//! ```no_run
//! # use receipt_proof::{
//! #     get_receipt_proof, encode_params, OutboundProofType, ProofResult, QuirkRegistry,
//! #     RpcBlock, RpcReceipt, UtilityVersion,
//! # };
//! # fn run(block: RpcBlock, receipts: Vec<RpcReceipt>) -> ProofResult<Vec<u8>> {
//! let proof = get_receipt_proof(
//!     &QuirkRegistry::default(),
//!     "polygon",
//!     &block,
//!     &receipts,
//!     2,
//!     OutboundProofType::Mpt,
//!     UtilityVersion::V2,
//! )?;
//!
//! encode_params(&proof, 1, Some(109))
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

pub mod error;
pub mod log_verifier;
pub mod mpt;
pub mod network;
pub mod packet;
pub mod params;
pub mod proof;
pub mod receipt;
pub mod rpc;
pub mod self_check;
pub mod trie_builder;
pub mod version_lookup;

#[cfg(test)]
pub(crate) mod testing_utils;

pub use error::{DecodeError, ProofError, ProofResult};
pub use log_verifier::{
    verify_all_logs, verify_all_logs_in_transactions, verify_log, BatchReport, VerifiedLog,
};
pub use network::{NetworkQuirks, QuirkRegistry};
pub use packet::{AddressWidths, Packet, PacketFormat};
pub use params::{encode_params, get_feather_proof};
pub use proof::{get_receipt_proof, OutboundProofType, ProofPath, ReceiptProof, UtilityVersion};
pub use rpc::{RpcBlock, RpcLog, RpcReceipt};
pub use self_check::assert_receipt_inclusion;
pub use version_lookup::utility_version_for;
