//! Simple example showing off the basics of the library.

use receipt_trie::{
    nibbles::Nibbles,
    partial_trie::Trie,
    proof_node::ProofNode,
    trie_hashing::rlp_encode_node,
    trie_ops::TrieOpResult,
    utils::TryFromIterator,
};

fn receipt_key(index: u64) -> Nibbles {
    // Receipt tries are keyed by the RLP encoding of the transaction index.
    Nibbles::from_bytes_be(&rlp::encode(&index)).unwrap()
}

fn main() -> TrieOpResult<()> {
    // Construct an empty trie:
    let mut trie = Trie::default();

    // Elements can be inserted into the trie by calling insert directly:
    trie.insert(receipt_key(0), b"first receipt".to_vec())?;

    // Or by initializing the trie with an iterator of key value pairs:
    let trie = Trie::try_from_iter((0..20).map(|i| (receipt_key(i), vec![i as u8 + 1; 40])))?;

    // Tries can be queried:
    assert_eq!(trie.get(receipt_key(3)), Some([4; 40].as_slice()));
    assert_eq!(trie.get(receipt_key(300)), None);

    // Trie hashes can be calculated:
    let _hash = trie.hash();

    // The path to a key is the list of nodes a proof for it carries:
    let proof: Vec<_> = trie
        .path_to(receipt_key(3))?
        .iter()
        .map(|visited| rlp_encode_node(&visited.node))
        .collect();

    // And proof bytes can be decoded without the trie:
    for node in &proof {
        println!("{:?}", ProofNode::decode(node).unwrap());
    }

    Ok(())
}
