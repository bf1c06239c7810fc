//! Various types and logic that don't fit well into any other module.

use std::fmt::{self, Display};

use ethereum_types::U512;

use crate::partial_trie::Node;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
/// Simplified trie node type to make logging cleaner.
pub enum TrieNodeType {
    /// Empty node.
    Empty,

    /// Branch node.
    Branch,

    /// Extension node.
    Extension,

    /// Leaf node.
    Leaf,
}

impl From<&Node> for TrieNodeType {
    fn from(node: &Node) -> Self {
        match node {
            Node::Empty => Self::Empty,
            Node::Branch { .. } => Self::Branch,
            Node::Extension { .. } => Self::Extension,
            Node::Leaf { .. } => Self::Leaf,
        }
    }
}

impl Display for TrieNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrieNodeType::Empty => "Empty",
            TrieNodeType::Branch => "Branch",
            TrieNodeType::Extension => "Extension",
            TrieNodeType::Leaf => "Leaf",
        };

        write!(f, "{}", s)
    }
}

/// Creates a collection from an iterator of entries, which may fail.
pub trait TryFromIterator<A>: Sized {
    /// The error returned when an entry can not be added.
    type Error;

    /// Builds `Self` from every entry of `iter`.
    fn try_from_iter<T: IntoIterator<Item = A>>(iter: T) -> Result<Self, Self::Error>;
}

pub(crate) const fn is_even(num: usize) -> bool {
    num & 1 == 0
}

pub(crate) fn create_mask_of_1s(amt: usize) -> U512 {
    (U512::one() << amt) - 1
}
