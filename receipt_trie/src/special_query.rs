//! Queries that walk a trie and report the nodes they pass through.

use log::trace;

use crate::{
    nibbles::Nibbles,
    partial_trie::{Node, WrappedNode},
    utils::TrieNodeType,
};

/// A node visited during a query, together with the part of the key that
/// had been consumed when the node was reached.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TraversedNode {
    /// The visited node.
    pub node: WrappedNode,
    /// Key nibbles consumed by the nodes above this one.
    pub consumed: Nibbles,
}

/// An iterator for a trie query. Note that this iterator is lazy.
///
/// It yields every node on the way from the root towards the queried key,
/// including the node the query stops at.
#[derive(Clone, Debug)]
pub struct TriePathIter {
    /// The next node in the trie to query with the remaining key.
    curr_node: WrappedNode,

    /// The remaining part of the key as we traverse down the trie.
    curr_key: Nibbles,

    /// The part of the key consumed so far.
    consumed: Nibbles,

    // Although wrapping `curr_node` in an option might be more "Rust like", the logic is a lot
    // cleaner with a bool.
    terminated: bool,

    /// Set once the query ends on a node that holds the value for the key.
    reached_value: bool,
}

impl TriePathIter {
    /// Whether the query ended on the value stored under the key. Only
    /// meaningful once the iterator is exhausted.
    pub const fn reached_value(&self) -> bool {
        self.reached_value
    }

    fn visit(&self) -> TraversedNode {
        TraversedNode {
            node: self.curr_node.clone(),
            consumed: self.consumed,
        }
    }
}

impl Iterator for TriePathIter {
    type Item = TraversedNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.terminated {
            return None;
        }

        let visited = self.visit();
        trace!(
            "Query visited {} (consumed: {}, remaining: {})",
            TrieNodeType::from(self.curr_node.as_ref().as_ref()),
            self.consumed,
            self.curr_key
        );

        match visited.node.as_ref().as_ref() {
            Node::Empty => {
                self.terminated = true;
                None
            }
            Node::Branch { children, value } => {
                if self.curr_key.is_empty() {
                    // Our query key has ended, the value (if any) lives here.
                    self.terminated = true;
                    self.reached_value = !value.is_empty();

                    return Some(visited);
                }

                let nib = self.curr_key.pop_next_nibble_front();
                self.consumed.push_nibble_back(nib);
                self.curr_node = children[nib as usize].clone();

                Some(visited)
            }
            Node::Extension { nibbles, child } => match self.curr_key.starts_with(nibbles) {
                false => {
                    // Only a partial match. Stop.
                    self.terminated = true;
                    Some(visited)
                }
                true => {
                    self.curr_key.truncate_n_nibbles_front_mut(nibbles.count);
                    self.consumed = self.consumed.merge_nibbles(nibbles);
                    self.curr_node = child.clone();

                    Some(visited)
                }
            },
            Node::Leaf { nibbles, .. } => {
                self.terminated = true;
                self.reached_value = self.curr_key == *nibbles;

                Some(visited)
            }
        }
    }
}

/// Returns all nodes in the trie that are traversed given a query (key).
///
/// The last node yielded is the one the query stopped at, whether or not it
/// matched the full key. Use [`TriePathIter::reached_value`] to tell the two
/// apart.
pub fn path_for_query(root: WrappedNode, k: Nibbles) -> TriePathIter {
    TriePathIter {
        curr_node: root,
        curr_key: k,
        consumed: Nibbles::default(),
        terminated: false,
        reached_value: false,
    }
}
