//! Insertion and lookup logic for [`Trie`][crate::partial_trie::Trie].

use log::trace;
use thiserror::Error;

use crate::{
    nibbles::{Nibble, Nibbles},
    partial_trie::{Node, TrieNode, WrappedNode},
    utils::TrieNodeType,
};

/// Stores the result of trie operations. Returns a [TrieOpError] upon
/// failure.
pub type TrieOpResult<T> = Result<T, TrieOpError>;

/// An error type for trie operation.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TrieOpError {
    /// Empty values can not be stored since they read back as "no value".
    #[error("Tried to insert an empty value under key {0}")]
    EmptyValue(Nibbles),

    /// The queried key has no value in the trie.
    #[error("No value is stored under key {0}")]
    KeyNotFound(Nibbles),
}

/// How the common prefix of an existing node and a new key splits them.
#[derive(Debug)]
struct ExistingAndNewNodePreAndPost {
    common_prefix: Nibbles,
    existing_postfix: Nibbles,
    new_postfix: Nibbles,
}

/// Where an entry lands once a node is split by a new branch.
enum BranchPlacement {
    Value(Vec<u8>),
    Child(Nibble, WrappedNode),
}

pub(crate) fn insert_into_trie_rec(node: &TrieNode, mut k: Nibbles, v: Vec<u8>) -> WrappedNode {
    match node.as_ref() {
        Node::Empty => {
            trace!("Insert traversed Empty");
            leaf(k, v)
        }
        Node::Branch { children, value } => {
            if k.is_empty() {
                trace!("Insert traversed Branch and placed value in node");
                return branch(children.clone(), v);
            }

            let nibble = k.pop_next_nibble_front();
            trace!("Insert traversed Branch (nibble: {:x})", nibble);

            let mut updated_children = children.clone();
            updated_children[nibble as usize] =
                insert_into_trie_rec(&children[nibble as usize], k, v);

            branch(updated_children, value.clone())
        }
        Node::Extension { nibbles, child } => {
            trace!("Insert traversed Extension (nibbles: {:?})", nibbles);

            if k.starts_with(nibbles) {
                let updated_child =
                    insert_into_trie_rec(child, k.truncate_n_nibbles_front(nibbles.count), v);
                return extension(*nibbles, updated_child);
            }

            let info = get_pre_and_postfixes_for_existing_and_new_nodes(nibbles, &k);

            // The key diverges inside the extension, so the existing postfix
            // holds at least one nibble and the branch covers the first.
            let existing_postfix_adjusted_for_branch =
                info.existing_postfix.truncate_n_nibbles_front(1);
            let existing = match existing_postfix_adjusted_for_branch.count {
                0 => child.clone(),
                _ => extension(existing_postfix_adjusted_for_branch, child.clone()),
            };

            place_branch_and_potentially_ext_prefix(
                &info,
                BranchPlacement::Child(info.existing_postfix.get_nibble(0), existing),
                v,
            )
        }
        Node::Leaf { nibbles, value } => {
            trace!("Insert traversed Leaf (nibbles: {:?})", nibbles);

            // Update existing node value if already present.
            if *nibbles == k {
                return leaf(*nibbles, v);
            }

            let info = get_pre_and_postfixes_for_existing_and_new_nodes(nibbles, &k);
            let existing = match info.existing_postfix.is_empty() {
                true => BranchPlacement::Value(value.clone()),
                false => BranchPlacement::Child(
                    info.existing_postfix.get_nibble(0),
                    leaf(info.existing_postfix.truncate_n_nibbles_front(1), value.clone()),
                ),
            };

            place_branch_and_potentially_ext_prefix(&info, existing, v)
        }
    }
}

pub(crate) fn get_intern(node: &TrieNode, mut k: Nibbles) -> Option<&[u8]> {
    match node.as_ref() {
        Node::Empty => {
            trace!("Get traversed Empty (k: {k})");
            None
        }
        Node::Branch { children, value } => {
            if k.is_empty() {
                return (!value.is_empty()).then_some(value.as_slice());
            }

            let nibble = k.pop_next_nibble_front();
            trace!("Get traversed Branch (nibble: {nibble:x})");

            get_intern(&children[nibble as usize], k)
        }
        Node::Extension { nibbles, child } => {
            trace!(
                "Get traversed {} (nibbles: {nibbles}, k: {k})",
                TrieNodeType::from(node.as_ref())
            );

            match k.starts_with(nibbles) {
                true => get_intern(child, k.truncate_n_nibbles_front(nibbles.count)),
                false => None,
            }
        }
        Node::Leaf { nibbles, value } => match *nibbles == k {
            true => Some(value.as_slice()),
            false => None,
        },
    }
}

fn get_pre_and_postfixes_for_existing_and_new_nodes(
    existing_node_nibbles: &Nibbles,
    new_node_nibbles: &Nibbles,
) -> ExistingAndNewNodePreAndPost {
    let nib_idx_of_difference = existing_node_nibbles.common_prefix_len(new_node_nibbles);

    let (common_prefix, existing_postfix) =
        existing_node_nibbles.split_at_idx(nib_idx_of_difference);
    let new_postfix = new_node_nibbles.truncate_n_nibbles_front(nib_idx_of_difference);

    ExistingAndNewNodePreAndPost {
        common_prefix,
        existing_postfix,
        new_postfix,
    }
}

/// Places the existing entry and the new value under a fresh branch, which
/// gets an extension in front of it when the two keys share a prefix.
fn place_branch_and_potentially_ext_prefix(
    info: &ExistingAndNewNodePreAndPost,
    existing: BranchPlacement,
    new_value: Vec<u8>,
) -> WrappedNode {
    let new = match info.new_postfix.is_empty() {
        true => BranchPlacement::Value(new_value),
        false => BranchPlacement::Child(
            info.new_postfix.get_nibble(0),
            leaf(info.new_postfix.truncate_n_nibbles_front(1), new_value),
        ),
    };

    let mut children = new_branch_child_arr();
    let mut value = Vec::new();

    // The keys differ, so at most one of the two placements is the value.
    for placement in [existing, new] {
        match placement {
            BranchPlacement::Value(v) => value = v,
            BranchPlacement::Child(nib, node) => children[nib as usize] = node,
        }
    }

    let branch = branch(children, value);

    match info.common_prefix.count {
        0 => branch,
        _ => extension(info.common_prefix, branch),
    }
}

pub(crate) fn new_branch_child_arr() -> [WrappedNode; 16] {
    std::array::from_fn(|_| Node::Empty.into())
}

fn branch(children: [WrappedNode; 16], value: Vec<u8>) -> WrappedNode {
    Node::Branch { children, value }.into()
}

fn extension(nibbles: Nibbles, child: WrappedNode) -> WrappedNode {
    Node::Extension { nibbles, child }.into()
}

fn leaf(nibbles: Nibbles, value: Vec<u8>) -> WrappedNode {
    Node::Leaf { nibbles, value }.into()
}
