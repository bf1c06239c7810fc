//! Rebuilds a block's receipts trie from RPC receipts.

use ethereum_types::H256;
use log::{debug, trace};
use receipt_trie::{nibbles::Nibbles, partial_trie::Trie, special_query::TraversedNode};

use crate::{
    error::{ProofError, ProofResult},
    network::{NetworkQuirks, ReceiptContext},
    receipt::CanonicalReceipt,
    rpc::{RpcBlock, RpcReceipt},
};

/// Trie key of the receipt at `index`: the nibbles of `rlp(index)`.
pub fn receipt_key(index: usize) -> ProofResult<Nibbles> {
    Ok(Nibbles::from_bytes_be(&rlp::encode(&(index as u64)))?)
}

/// The receipts trie of one block, checked against the block's
/// `receiptsRoot`.
///
/// Building is the only way to get one, so every instance is known to
/// reproduce the declared root.
#[derive(Clone, Debug)]
pub struct ReceiptTrie {
    trie: Trie,
    receipts: Vec<Vec<u8>>,
    root: H256,
    block_hash: H256,
}

impl ReceiptTrie {
    /// Filters, fixes up and encodes `receipts` with the network's quirks,
    /// inserts them under their index and checks the resulting root.
    pub fn build(
        quirks: &dyn NetworkQuirks,
        block: &RpcBlock,
        receipts: &[RpcReceipt],
    ) -> ProofResult<Self> {
        let filtered = quirks.filter_receipts(block, receipts);
        let mut trie = Trie::new();
        let mut encoded = Vec::with_capacity(filtered.len());

        for (index, rpc) in filtered.into_iter().enumerate() {
            let mut receipt = CanonicalReceipt::from_rpc(rpc)?;
            quirks.transform_receipt(&ReceiptContext { index, block }, &mut receipt);

            let bytes = receipt.encode();
            trace!("Inserting receipt {} ({} bytes)", index, bytes.len());

            trie.insert(receipt_key(index)?, bytes.clone())?;
            encoded.push(bytes);
        }

        let computed = trie.hash();
        if computed != block.receipts_root {
            return Err(ProofError::RootMismatch {
                expected: block.receipts_root,
                computed,
            });
        }

        debug!(
            "Rebuilt receipts trie of block {} ({} receipts, root {:#x})",
            block.number,
            encoded.len(),
            computed
        );

        Ok(Self {
            trie,
            receipts: encoded,
            root: computed,
            block_hash: block.hash,
        })
    }

    /// The receipts root, equal to the block's declared one.
    pub const fn root(&self) -> H256 {
        self.root
    }

    /// Hash of the block the receipts belong to.
    pub const fn block_hash(&self) -> H256 {
        self.block_hash
    }

    /// Number of receipts in the trie.
    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    /// Whether the block has no receipts.
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// The canonical bytes stored for transaction `tx_index`.
    pub fn encoded_receipt(&self, tx_index: usize) -> ProofResult<&[u8]> {
        self.receipts
            .get(tx_index)
            .map(Vec::as_slice)
            .ok_or(ProofError::TransactionNotFound {
                index: tx_index,
                count: self.receipts.len(),
            })
    }

    /// The nodes visited on the way from the root to the receipt of
    /// `tx_index`, root first.
    pub fn traversal_stack(&self, tx_index: usize) -> ProofResult<Vec<TraversedNode>> {
        self.encoded_receipt(tx_index)?;
        Ok(self.trie.path_to(receipt_key(tx_index)?)?)
    }
}
