//! Per-network deviations from the standard receipts trie.
//!
//! Some chains put receipts in their trie that are not what their RPC
//! reports, or report receipts that are not in the trie at all. Each network
//! gets a [`NetworkQuirks`] strategy that fixes this up before the trie is
//! built. The trie and proof code never look at the network name.

use std::{collections::BTreeMap, fmt::Debug};

use ethereum_types::{H256, U64};
use keccak_hash::keccak;
use log::debug;

use crate::{
    error::{ProofError, ProofResult},
    receipt::CanonicalReceipt,
    rpc::{RpcBlock, RpcReceipt},
};
#[cfg(feature = "arbitrum_classic")]
use crate::receipt::ReceiptOutcome;

const BOR_RECEIPT_PREFIX: &[u8] = b"matic-bor-receipt-";

/// Where a receipt sits, passed to [`NetworkQuirks::transform_receipt`].
#[derive(Clone, Copy, Debug)]
pub struct ReceiptContext<'a> {
    /// Index of the receipt in the filtered list, which is also its trie key.
    pub index: usize,
    /// The block the receipt belongs to.
    pub block: &'a RpcBlock,
}

/// Hooks applied to a block's receipts before they are inserted into the
/// trie.
///
/// Both hooks default to doing nothing, which is what every standard EVM
/// chain needs.
pub trait NetworkQuirks: Debug + Send + Sync {
    /// Returns the receipts that are actually part of the receipts trie, in
    /// trie order.
    fn filter_receipts<'r>(
        &self,
        _block: &RpcBlock,
        receipts: &'r [RpcReceipt],
    ) -> Vec<&'r RpcReceipt> {
        receipts.iter().collect()
    }

    /// Adjusts a receipt so that it encodes to the bytes the chain stores.
    fn transform_receipt(&self, _ctx: &ReceiptContext<'_>, _receipt: &mut CanonicalReceipt) {}
}

/// A chain that follows the Ethereum receipt rules exactly.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenericEvm;

impl NetworkQuirks for GenericEvm {}

/// Arbitrum Classic commits to a zero status regardless of what its RPC
/// reports.
///
/// Nitro fixed this, so this goes away once Classic blocks no longer need
/// to be proven.
#[cfg(feature = "arbitrum_classic")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ArbitrumClassic;

#[cfg(feature = "arbitrum_classic")]
impl NetworkQuirks for ArbitrumClassic {
    fn transform_receipt(&self, _ctx: &ReceiptContext<'_>, receipt: &mut CanonicalReceipt) {
        receipt.body.outcome = ReceiptOutcome::Status(false);
    }
}

/// Polygon PoS (Bor) reports a synthetic state-sync receipt at the end of
/// some blocks. It is not part of the receipts trie.
#[derive(Clone, Copy, Debug, Default)]
pub struct BorStateSync;

impl NetworkQuirks for BorStateSync {
    fn filter_receipts<'r>(
        &self,
        block: &RpcBlock,
        receipts: &'r [RpcReceipt],
    ) -> Vec<&'r RpcReceipt> {
        let state_sync_hash = polygon_state_sync_tx_hash(block.number, block.hash);

        receipts
            .iter()
            .filter(|r| {
                let keep = r.transaction_hash != state_sync_hash;
                if !keep {
                    debug!(
                        "Dropping Bor state-sync receipt {:#x} from block {}",
                        state_sync_hash, block.number
                    );
                }
                keep
            })
            .collect()
    }
}

/// Harmony appends staking transaction receipts after the ordinary ones.
/// Their `type` is not an EIP-2718 type and is not part of the stored bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct HarmonyStaking;

impl NetworkQuirks for HarmonyStaking {
    fn transform_receipt(&self, ctx: &ReceiptContext<'_>, receipt: &mut CanonicalReceipt) {
        if ctx.index >= ctx.block.transactions.len() {
            receipt.tx_type = 0;
        }
    }
}

/// Hash of the synthetic Bor state-sync transaction of a block:
/// `keccak("matic-bor-receipt-" ++ be_u64(number) ++ hash)`.
pub fn polygon_state_sync_tx_hash(number: U64, hash: H256) -> H256 {
    let mut preimage = Vec::with_capacity(BOR_RECEIPT_PREFIX.len() + 8 + 32);
    preimage.extend_from_slice(BOR_RECEIPT_PREFIX);
    preimage.extend_from_slice(&number.low_u64().to_be_bytes());
    preimage.extend_from_slice(hash.as_bytes());

    keccak(preimage)
}

/// Maps network identifiers to their [`NetworkQuirks`].
///
/// The registry is owned by the caller. [`QuirkRegistry::default`] knows
/// `default`, `hardhat`, `arbitrum`, `polygon` and `harmony`. More networks
/// can be added with [`QuirkRegistry::register`].
#[derive(Debug)]
pub struct QuirkRegistry {
    networks: BTreeMap<String, Box<dyn NetworkQuirks>>,
}

impl Default for QuirkRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();

        registry.register("default", GenericEvm);
        registry.register("hardhat", GenericEvm);
        #[cfg(feature = "arbitrum_classic")]
        registry.register("arbitrum", ArbitrumClassic);
        #[cfg(not(feature = "arbitrum_classic"))]
        registry.register("arbitrum", GenericEvm);
        registry.register("polygon", BorStateSync);
        registry.register("harmony", HarmonyStaking);

        registry
    }
}

impl QuirkRegistry {
    /// A registry that supports no network at all.
    pub fn empty() -> Self {
        Self {
            networks: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) the quirks of a network.
    pub fn register<Q>(&mut self, network: impl Into<String>, quirks: Q)
    where
        Q: NetworkQuirks + 'static,
    {
        self.networks.insert(network.into(), Box::new(quirks));
    }

    /// Looks up a network. Unknown networks fail before any trie work.
    pub fn get(&self, network: &str) -> ProofResult<&dyn NetworkQuirks> {
        self.networks
            .get(network)
            .map(|q| q.as_ref())
            .ok_or_else(|| ProofError::UnsupportedNetwork(network.to_string()))
    }

    /// The supported network identifiers, sorted.
    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}
