//! Definitions for the core types [`Trie`] and [`Node`].

use std::{
    fmt::{self, Debug},
    ops::Deref,
    sync::Arc,
};

use ethereum_types::H256;
use parking_lot::RwLock;

use crate::{
    nibbles::Nibbles,
    special_query::{path_for_query, TraversedNode},
    trie_hashing::{hash_trie, rlp_encode_and_hash_node, EncodedNode},
    trie_ops::{get_intern, insert_into_trie_rec, TrieOpError, TrieOpResult},
    utils::TryFromIterator,
};

/// Alias for a node that is a child of an extension or branch node.
pub type WrappedNode = Arc<TrieNode>;

impl From<Node> for WrappedNode {
    fn from(v: Node) -> Self {
        Arc::new(TrieNode::new(v))
    }
}

/// A trie node, mirroring the structure of an Ethereum trie.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Node {
    /// An empty trie.
    #[default]
    Empty,
    /// A branch node, which consists of 16 children and an optional value.
    Branch {
        /// A slice containing the 16 children of this branch node.
        children: [WrappedNode; 16],
        /// The payload of this node. Empty when the branch holds no value.
        value: Vec<u8>,
    },
    /// An extension node, which consists of a list of nibbles and a single
    /// child.
    Extension {
        /// The path of this extension.
        nibbles: Nibbles,
        /// The child of this extension node.
        child: WrappedNode,
    },
    /// A leaf node, which consists of a list of nibbles and a value.
    Leaf {
        /// The path of this leaf node.
        nibbles: Nibbles,
        /// The payload of this node
        value: Vec<u8>,
    },
}

/// A [`Node`] together with its lazily computed reference encoding.
///
/// Nodes never change once created (inserts rebuild the path they touch), so
/// the cached encoding never needs to be invalidated.
#[derive(Default)]
pub struct TrieNode {
    node: Node,
    encoded: RwLock<Option<EncodedNode>>,
}

impl TrieNode {
    /// Wraps a node with an empty encoding cache.
    pub fn new(node: Node) -> Self {
        Self {
            node,
            encoded: RwLock::new(None),
        }
    }

    /// The encoding a parent uses to reference this node: the raw RLP if it
    /// is shorter than 32 bytes, otherwise its keccak hash.
    pub fn reference(&self) -> EncodedNode {
        if let Some(encoded) = self.encoded.read().as_ref() {
            return encoded.clone();
        }

        let encoded = rlp_encode_and_hash_node(&self.node);
        *self.encoded.write() = Some(encoded.clone());

        encoded
    }
}

impl Deref for TrieNode {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl AsRef<Node> for TrieNode {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}

impl Debug for TrieNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

impl Eq for TrieNode {}

impl PartialEq for TrieNode {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

/// An in-memory Merkle-Patricia-Trie holding the full data of every node.
///
/// ```
/// # use receipt_trie::{nibbles::Nibbles, partial_trie::Trie};
/// let mut trie = Trie::default();
/// let key = Nibbles::from_bytes_be(&[0x80]).unwrap();
///
/// trie.insert(key, b"receipt".to_vec()).unwrap();
/// assert_eq!(trie.get(key), Some(b"receipt".as_slice()));
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Trie {
    root: WrappedNode,
}

impl Trie {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value into the trie, replacing any value already stored
    /// under `k`.
    ///
    /// Empty values are rejected since an empty branch value means "no
    /// value" in an Ethereum trie.
    pub fn insert(&mut self, k: Nibbles, v: Vec<u8>) -> TrieOpResult<()> {
        if v.is_empty() {
            return Err(TrieOpError::EmptyValue(k));
        }

        self.root = insert_into_trie_rec(&self.root, k, v);
        Ok(())
    }

    /// Add more entries to the trie through an iterator.
    pub fn extend<I>(&mut self, entries: I) -> TrieOpResult<()>
    where
        I: IntoIterator<Item = (Nibbles, Vec<u8>)>,
    {
        for (k, v) in entries {
            self.insert(k, v)?;
        }

        Ok(())
    }

    /// Get a value if it exists in the trie.
    pub fn get(&self, k: Nibbles) -> Option<&[u8]> {
        get_intern(&self.root, k)
    }

    /// The root hash of the trie. The root is always hashed, even when its
    /// encoding is shorter than 32 bytes.
    pub fn hash(&self) -> H256 {
        hash_trie(&self.root)
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Returns every node visited while descending from the root to the
    /// value stored under `k`, root first.
    ///
    /// Fails if `k` has no value in this trie.
    pub fn path_to(&self, k: Nibbles) -> TrieOpResult<Vec<TraversedNode>> {
        let mut iter = path_for_query(self.root.clone(), k);
        let path: Vec<_> = iter.by_ref().collect();

        match iter.reached_value() {
            true => Ok(path),
            false => Err(TrieOpError::KeyNotFound(k)),
        }
    }
}

impl TryFromIterator<(Nibbles, Vec<u8>)> for Trie {
    type Error = TrieOpError;

    fn try_from_iter<T: IntoIterator<Item = (Nibbles, Vec<u8>)>>(
        nodes: T,
    ) -> TrieOpResult<Self> {
        let mut root = Trie::new();
        root.extend(nodes)?;

        Ok(root)
    }
}
