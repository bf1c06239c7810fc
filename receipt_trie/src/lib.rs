//! An in-memory Ethereum Merkle-Patricia-Trie built for producing and
//! checking inclusion proofs.
//!
//! The core of this library is the [`Trie`][partial_trie::Trie] type. Every
//! node is held in full, so any key can be walked from the root
//! ([`Trie::path_to`][partial_trie::Trie::path_to]) and every node on the way
//! can be RLP encoded ([`rlp_encode_node`][trie_hashing::rlp_encode_node]) to
//! form a proof. The [`proof_node`] module goes the other way and decodes
//! proof bytes back into typed nodes without access to the trie.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

pub mod nibbles;
pub mod partial_trie;
pub mod proof_node;
pub mod special_query;
pub mod trie_hashing;
pub mod trie_ops;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing_utils;
