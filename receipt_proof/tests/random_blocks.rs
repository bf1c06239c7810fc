//! Large synthetic blocks, checked against an independent trie
//! implementation.

mod common;

use common::{block_for, common_setup, random_receipts};
use receipt_proof::{
    get_receipt_proof, network::GenericEvm, proof::assemble_receipt_proof,
    receipt::CanonicalReceipt, self_check::assert_receipt_inclusion, trie_builder::ReceiptTrie,
    verify_all_logs_in_transactions, OutboundProofType, ProofError, ProofPath, QuirkRegistry,
    UtilityVersion,
};

/// Enough receipts for keys to need two RLP bytes (`0x8180` and up).
const NUM_RECEIPTS: usize = 130;

#[test]
fn roots_agree_with_eth_trie() -> anyhow::Result<()> {
    common_setup();

    for (seed, n) in [(1, 1), (2, 2), (3, 17), (4, 128), (5, NUM_RECEIPTS)] {
        let receipts = random_receipts(n, seed);
        let block = block_for(&receipts, seed)?;

        let trie = ReceiptTrie::build(&GenericEvm, &block, &receipts)?;
        assert_eq!(trie.root(), block.receipts_root, "{n} receipts");
        assert_eq!(trie.len(), n);
    }

    Ok(())
}

#[test]
fn every_receipt_of_a_large_block_is_provable() -> anyhow::Result<()> {
    common_setup();
    let receipts = random_receipts(NUM_RECEIPTS, 42);
    let block = block_for(&receipts, 19_000_000)?;
    let trie = ReceiptTrie::build(&GenericEvm, &block, &receipts)?;

    for tx_index in 0..NUM_RECEIPTS {
        let expected = CanonicalReceipt::from_rpc(&receipts[tx_index])?.encode();

        for version in UtilityVersion::ALL {
            let proof = assemble_receipt_proof(&trie, tx_index, version)?;
            assert_receipt_inclusion(&proof, &expected)?;

            if let ProofPath::SlotIndices(slots) = &proof.path {
                assert_eq!(slots.len(), proof.proof.len());
                assert!(slots.iter().all(|&s| s <= 16));
            }
        }
    }

    Ok(())
}

#[test]
fn out_of_range_indices_are_reported() -> anyhow::Result<()> {
    common_setup();
    let receipts = random_receipts(20, 7);
    let block = block_for(&receipts, 7)?;

    let result = get_receipt_proof(
        &QuirkRegistry::default(),
        "hardhat",
        &block,
        &receipts,
        20,
        OutboundProofType::Mpt,
        UtilityVersion::V3,
    );
    assert!(matches!(
        result,
        Err(ProofError::TransactionNotFound {
            index: 20,
            count: 20
        })
    ));

    Ok(())
}

#[test]
fn batch_verification_of_a_large_block() -> anyhow::Result<()> {
    common_setup();
    let receipts = random_receipts(NUM_RECEIPTS, 99);
    let block = block_for(&receipts, 99)?;

    let report = verify_all_logs_in_transactions(
        &QuirkRegistry::default(),
        "default",
        &block,
        &receipts,
        0..NUM_RECEIPTS + 2,
        UtilityVersion::V1,
    )?;

    let failures: Vec<_> = report.failures().map(|(index, _)| index).collect();
    assert_eq!(failures, vec![NUM_RECEIPTS, NUM_RECEIPTS + 1]);
    assert!(!report.is_success());

    for outcome in &report.outcomes[..NUM_RECEIPTS] {
        let logs = outcome.result.as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_eq!(logs.len(), receipts[outcome.transaction_index].logs.len());
    }

    Ok(())
}
