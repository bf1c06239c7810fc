//! Logs recovered from proven receipts, and bulk verification of a block's
//! logs against what RPC reported.

use std::ops::Range;

use bytes::Bytes;
use ethereum_types::{Address, H256};
use hex_literal::hex;
use log::{debug, warn};

use crate::{
    error::{DecodeError, ProofError, ProofResult},
    network::QuirkRegistry,
    packet::uln_address_of,
    proof::{assemble_receipt_proof, ReceiptProof, UtilityVersion},
    receipt::{CanonicalReceipt, LogRlp},
    rpc::{RpcBlock, RpcReceipt},
    self_check::replay_proof,
    trie_builder::ReceiptTrie,
};

/// Topic of the `Packet` event a ULN emits for every outbound packet.
pub const PACKET_EVENT_TOPIC: H256 = H256(hex!(
    "e8d23d927749ec8e512eb885679c2977d57068839d8cca1a85685dbbea0648f6"
));

/// A log as an on-chain verifier exposes it after accepting a proof.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifiedLog {
    /// Emitting contract, left padded to 32 bytes.
    pub contract_address: H256,
    /// Event signature.
    pub topic0: H256,
    /// Event data.
    pub data: Bytes,
}

impl VerifiedLog {
    fn from_log(log: &LogRlp, log_index: usize) -> ProofResult<Self> {
        let topic0 = *log
            .topics
            .first()
            .ok_or(DecodeError::MissingTopic(log_index))?;

        Ok(Self {
            contract_address: uln_address_of(log.address),
            topic0,
            data: log.data.clone(),
        })
    }
}

/// Replays `proof` offline and decodes the receipt it proves.
pub fn proven_receipt(proof: &ReceiptProof) -> ProofResult<CanonicalReceipt> {
    let replay = replay_proof(proof)?;
    Ok(CanonicalReceipt::decode(&replay.terminal_value)?)
}

/// Replays `proof` and returns log `log_index` of the proven receipt.
pub fn verify_log(proof: &ReceiptProof, log_index: usize) -> ProofResult<VerifiedLog> {
    let receipt = proven_receipt(proof)?;
    let log = receipt
        .logs()
        .get(log_index)
        .ok_or(ProofError::LogNotFound {
            transaction_index: proof.transaction_index,
            log_index,
        })?;

    VerifiedLog::from_log(log, log_index)
}

/// Index of the first `Packet` event emitted by `uln` in `receipt`.
pub fn first_packet_log_index(receipt: &CanonicalReceipt, uln: Address) -> Option<usize> {
    receipt
        .logs()
        .iter()
        .position(|log| log.address == uln && log.topics.first() == Some(&PACKET_EVENT_TOPIC))
}

/// Proves transaction `tx_index` of `block` and checks every log of the
/// proven receipt against the receipt RPC reported.
pub fn verify_all_logs(
    registry: &QuirkRegistry,
    network: &str,
    block: &RpcBlock,
    receipts: &[RpcReceipt],
    tx_index: usize,
    version: UtilityVersion,
) -> ProofResult<Vec<VerifiedLog>> {
    let quirks = registry.get(network)?;
    let trie = ReceiptTrie::build(quirks, block, receipts)?;
    let reported = quirks.filter_receipts(block, receipts);

    verify_transaction_logs(&trie, &reported, tx_index, version)
}

/// Checks the logs of one transaction of an already built trie.
///
/// `reported` holds the RPC receipts in trie order, i.e. after the network's
/// filter.
pub fn verify_transaction_logs(
    trie: &ReceiptTrie,
    reported: &[&RpcReceipt],
    tx_index: usize,
    version: UtilityVersion,
) -> ProofResult<Vec<VerifiedLog>> {
    let rpc = reported
        .get(tx_index)
        .ok_or(ProofError::TransactionNotFound {
            index: tx_index,
            count: reported.len(),
        })?;
    let proof = assemble_receipt_proof(trie, tx_index, version)?;
    let receipt = proven_receipt(&proof)?;

    let mismatch = |log_index, field| ProofError::LogMismatch {
        transaction_index: tx_index,
        log_index,
        field,
    };

    if receipt.logs().len() > rpc.logs.len() {
        return Err(mismatch(rpc.logs.len(), "count"));
    }

    let mut verified = Vec::with_capacity(rpc.logs.len());
    for (log_index, expected) in rpc.logs.iter().enumerate() {
        let proven = receipt.logs().get(log_index).ok_or(ProofError::LogNotFound {
            transaction_index: tx_index,
            log_index,
        })?;

        if proven.address != expected.address {
            return Err(mismatch(log_index, "address"));
        }
        if proven.topics != expected.topics {
            return Err(mismatch(log_index, "topics"));
        }
        if proven.data[..] != expected.data[..] {
            return Err(mismatch(log_index, "data"));
        }

        verified.push(VerifiedLog::from_log(proven, log_index)?);
    }

    debug!(
        "Verified {} logs of transaction {} against a {} proof",
        verified.len(),
        tx_index,
        version
    );

    Ok(verified)
}

/// Outcome of verifying the logs of one transaction.
#[derive(Debug)]
pub struct TransactionOutcome {
    /// Index of the transaction in the block.
    pub transaction_index: usize,
    /// The verified logs, or why they could not be verified.
    pub result: ProofResult<Vec<VerifiedLog>>,
}

/// Per transaction results of [`verify_all_logs_in_transactions`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per requested transaction, in order.
    pub outcomes: Vec<TransactionOutcome>,
}

impl BatchReport {
    /// Transactions that failed, with their error.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &ProofError)> + '_ {
        self.outcomes.iter().filter_map(|outcome| match &outcome.result {
            Ok(_) => None,
            Err(err) => Some((outcome.transaction_index, err)),
        })
    }

    /// Whether every transaction verified.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }
}

/// Verifies the logs of every transaction in `range`.
///
/// The trie is built once. Block level failures (unknown network, root
/// mismatch) abort the whole batch, anything else is recorded against the
/// transaction it happened in and the batch moves on.
pub fn verify_all_logs_in_transactions(
    registry: &QuirkRegistry,
    network: &str,
    block: &RpcBlock,
    receipts: &[RpcReceipt],
    range: Range<usize>,
    version: UtilityVersion,
) -> ProofResult<BatchReport> {
    let quirks = registry.get(network)?;
    let trie = ReceiptTrie::build(quirks, block, receipts)?;
    let reported = quirks.filter_receipts(block, receipts);

    Ok(verify_transactions(&trie, &reported, range, version))
}

/// [`verify_all_logs_in_transactions`] over an already built trie.
pub fn verify_transactions(
    trie: &ReceiptTrie,
    reported: &[&RpcReceipt],
    range: Range<usize>,
    version: UtilityVersion,
) -> BatchReport {
    let outcomes = range
        .map(|transaction_index| {
            let result = verify_transaction_logs(trie, reported, transaction_index, version);
            if let Err(err) = &result {
                warn!("Log verification of transaction {} failed: {}", transaction_index, err);
            }

            TransactionOutcome {
                transaction_index,
                result,
            }
        })
        .collect();

    BatchReport { outcomes }
}
