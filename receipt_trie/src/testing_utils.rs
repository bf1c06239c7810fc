use std::{
    iter::{once, repeat},
    str::FromStr,
};

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

use crate::{nibbles::Nibbles, partial_trie::Trie, utils::TryFromIterator};

pub(crate) type TestInsertValEntry = (Nibbles, Vec<u8>);

pub(crate) fn common_setup() {
    // Try init since multiple tests calling `init` will cause an error.
    let _ = pretty_env_logger::try_init();
}

pub(crate) fn entry(k: &str) -> TestInsertValEntry {
    (Nibbles::from_str(k).unwrap(), vec![2])
}

/// Needed when a test relies on nodes being >= 32 bytes when RLP encoded, so
/// that parents reference them by hash.
pub(crate) fn large_entry(k: &str) -> TestInsertValEntry {
    (
        Nibbles::from_str(k).unwrap(),
        once(2).chain(repeat(255).take(32)).collect(),
    )
}

/// ks --> 0x1234, 0x1324, 0x132400005, 0x2001, 0x2002
pub(crate) fn handmade_trie_1() -> (Trie, Vec<Nibbles>) {
    let ks: Vec<_> = ["0x1234", "0x1324", "0x132400005", "0x2001", "0x2002"]
        .into_iter()
        .map(|k| Nibbles::from_str(k).unwrap())
        .collect();

    let trie = Trie::try_from_iter(ks.iter().map(|k| (*k, vec![2]))).unwrap();

    (trie, ks)
}

/// Keys shaped like the ones of a receipts trie: `rlp(index)`.
pub(crate) fn generate_n_random_receipt_keyed_entries(
    n: usize,
    seed: u64,
) -> impl Iterator<Item = TestInsertValEntry> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n).map(move |i| {
        let k = Nibbles::from_bytes_be(&rlp::encode(&(i as u64))).unwrap();
        (k, gen_rand_value_bytes(&mut rng))
    })
}

pub(crate) fn generate_n_random_variable_byte_entries(
    n: usize,
    seed: u64,
) -> impl Iterator<Item = TestInsertValEntry> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n).map(move |_| {
        let n_bytes = rng.gen_range(1..=32);
        let k_bytes: Vec<u8> = (0..n_bytes).map(|_| rng.gen()).collect();

        (
            Nibbles::from_bytes_be(&k_bytes).unwrap(),
            gen_rand_value_bytes(&mut rng),
        )
    })
}

fn gen_rand_value_bytes(rng: &mut StdRng) -> Vec<u8> {
    let num_bytes = rng.gen_range(1..=96);

    let mut buf = vec![0; num_bytes];
    rng.fill_bytes(&mut buf);

    buf
}
