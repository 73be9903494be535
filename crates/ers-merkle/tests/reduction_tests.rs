//! Hash tree reduction test suite
//!
//! Cross-checks the reduction against an independent SHA-2 implementation
//! and exercises the properties the validator relies on: determinism,
//! order sensitivity and reduced-tree inclusion.

use ers_crypto::AwsLcDigester;
use ers_merkle::{chain_root, reduce_tree, verify_inclusion, Error, LeafPosition};
use ers_types::{DigestAlgorithm, DigestValue, HashTree};
use rstest::rstest;
use sha2::{Digest, Sha256, Sha512};

fn sha256_leaf(data: &[u8]) -> DigestValue {
    let bytes = Sha256::digest(data);
    DigestValue::new(DigestAlgorithm::Sha256, bytes.to_vec()).unwrap()
}

fn sha256_concat(parts: &[&DigestValue]) -> DigestValue {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    DigestValue::new(DigestAlgorithm::Sha256, hasher.finalize().to_vec()).unwrap()
}

fn tree(groups: Vec<Vec<DigestValue>>) -> HashTree {
    HashTree::new(DigestAlgorithm::Sha256, groups).unwrap()
}

// ==== Root reduction ====

#[test]
fn test_single_leaf_root_is_leaf() {
    let d = sha256_leaf(b"D");
    let root = reduce_tree(&AwsLcDigester, &tree(vec![vec![d.clone()]])).unwrap();
    assert_eq!(root, d);
}

#[test]
fn test_one_group_root() {
    let a = sha256_leaf(b"a");
    let b = sha256_leaf(b"b");
    let c = sha256_leaf(b"c");

    let root = reduce_tree(
        &AwsLcDigester,
        &tree(vec![vec![a.clone(), b.clone(), c.clone()]]),
    )
    .unwrap();
    assert_eq!(root, sha256_concat(&[&a, &b, &c]));
}

#[test]
fn test_two_level_root() {
    let a = sha256_leaf(b"a");
    let b = sha256_leaf(b"b");
    let c = sha256_leaf(b"c");
    let d = sha256_leaf(b"d");

    let h_ab = sha256_concat(&[&a, &b]);
    let h_cd = sha256_concat(&[&c, &d]);
    let expected = sha256_concat(&[&h_ab, &h_cd]);

    let root = reduce_tree(&AwsLcDigester, &tree(vec![vec![a, b], vec![c, d]])).unwrap();
    assert_eq!(root, expected);
}

#[test]
fn test_single_member_group_among_others_passes_through() {
    let a = sha256_leaf(b"a");
    let b = sha256_leaf(b"b");
    let c = sha256_leaf(b"c");

    let h_ab = sha256_concat(&[&a, &b]);
    let expected = sha256_concat(&[&h_ab, &c]);

    let root = reduce_tree(&AwsLcDigester, &tree(vec![vec![a, b], vec![c]])).unwrap();
    assert_eq!(root, expected);
}

#[test]
fn test_leading_single_member_group_known_answer() {
    // [[a], [b, c]] reduces to H(a || H(b || c)), not H(H(a) || H(b || c))
    let a = sha256_leaf(b"a");
    let b = sha256_leaf(b"b");
    let c = sha256_leaf(b"c");

    let root = reduce_tree(&AwsLcDigester, &tree(vec![vec![a], vec![b, c]])).unwrap();
    assert_eq!(
        root.to_hex(),
        "16ce3dfe44b065b8b9a940c25c424c064de4db1cc914b5970b2d56b6dd18522a"
    );
    assert_ne!(
        root.to_hex(),
        "f6c5c851d6673550c188c291b457666894fd9e0554ae9fff8216c2d8148fa726"
    );
}

#[test]
fn test_sha512_tree_matches_independent_implementation() {
    let a = ers_crypto::digest(DigestAlgorithm::Sha512, b"a").unwrap();
    let b = ers_crypto::digest(DigestAlgorithm::Sha512, b"b").unwrap();

    let mut hasher = Sha512::new();
    hasher.update(a.as_bytes());
    hasher.update(b.as_bytes());
    let expected = hasher.finalize();

    let tree = HashTree::single_group(DigestAlgorithm::Sha512, vec![a, b]).unwrap();
    let root = reduce_tree(&AwsLcDigester, &tree).unwrap();
    assert_eq!(root.as_bytes(), &expected[..]);
}

#[test]
fn test_empty_tree_is_rejected() {
    let result = reduce_tree(&AwsLcDigester, &tree(vec![]));
    assert!(matches!(result, Err(Error::EmptyTree)));
}

// ==== Determinism and order sensitivity ====

#[rstest]
#[case(DigestAlgorithm::Sha1)]
#[case(DigestAlgorithm::Sha256)]
#[case(DigestAlgorithm::Sha384)]
#[case(DigestAlgorithm::Sha3_512)]
fn test_reduction_is_deterministic(#[case] algorithm: DigestAlgorithm) {
    let leaves: Vec<DigestValue> = (0u8..5)
        .map(|i| ers_crypto::digest(algorithm, &[i]).unwrap())
        .collect();
    let tree = HashTree::new(
        algorithm,
        vec![leaves[..2].to_vec(), leaves[2..].to_vec()],
    )
    .unwrap();

    let first = reduce_tree(&AwsLcDigester, &tree).unwrap();
    let second = reduce_tree(&AwsLcDigester, &tree.clone()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.algorithm(), algorithm);
}

#[rstest]
#[case(0, 1)]
#[case(1, 2)]
#[case(0, 2)]
fn test_swapping_siblings_changes_root(#[case] i: usize, #[case] j: usize) {
    let mut group: Vec<DigestValue> = [b"x", b"y", b"z"]
        .iter()
        .map(|data| sha256_leaf(*data))
        .collect();
    let original = reduce_tree(&AwsLcDigester, &tree(vec![group.clone()])).unwrap();

    group.swap(i, j);
    let swapped = reduce_tree(&AwsLcDigester, &tree(vec![group])).unwrap();
    assert_ne!(original, swapped);
}

#[test]
fn test_swapping_equal_siblings_keeps_root() {
    let a = sha256_leaf(b"same");
    let group = vec![a.clone(), a.clone()];
    let root = reduce_tree(&AwsLcDigester, &tree(vec![group.clone()])).unwrap();
    let mut swapped = group;
    swapped.swap(0, 1);
    assert_eq!(root, reduce_tree(&AwsLcDigester, &tree(vec![swapped])).unwrap());
}

#[test]
fn test_swapping_groups_changes_root() {
    let a = sha256_leaf(b"a");
    let b = sha256_leaf(b"b");
    let c = sha256_leaf(b"c");
    let forward = tree(vec![vec![a.clone(), b.clone()], vec![c.clone()]]);
    let backward = tree(vec![vec![c], vec![a, b]]);
    assert_ne!(
        reduce_tree(&AwsLcDigester, &forward).unwrap(),
        reduce_tree(&AwsLcDigester, &backward).unwrap()
    );
}

// ==== Reduced tree inclusion ====

#[test]
fn test_reduced_tree_inclusion() {
    // Full tree: [[a, b], [c, d]]. The reduced tree for `a` keeps its
    // sibling `b` and replaces the second group by its reduced digest.
    let a = sha256_leaf(b"a");
    let b = sha256_leaf(b"b");
    let c = sha256_leaf(b"c");
    let d = sha256_leaf(b"d");
    let full_root = reduce_tree(
        &AwsLcDigester,
        &tree(vec![vec![a.clone(), b.clone()], vec![c.clone(), d.clone()]]),
    )
    .unwrap();

    let reduced = tree(vec![vec![a.clone(), b], vec![sha256_concat(&[&c, &d])]]);
    let position = verify_inclusion(&AwsLcDigester, &reduced, &a, &full_root).unwrap();
    assert_eq!(position, LeafPosition { group: 0, index: 0 });
}

#[test]
fn test_inclusion_with_missing_sibling_fails() {
    let a = sha256_leaf(b"a");
    let b = sha256_leaf(b"b");
    let full_root = reduce_tree(&AwsLcDigester, &tree(vec![vec![a.clone(), b]])).unwrap();

    let without_sibling = tree(vec![vec![a.clone()]]);
    let result = verify_inclusion(&AwsLcDigester, &without_sibling, &a, &full_root);
    assert!(matches!(result, Err(Error::HashMismatch { .. })));
}

#[test]
fn test_inclusion_of_absent_leaf_fails() {
    let a = sha256_leaf(b"a");
    let root = reduce_tree(&AwsLcDigester, &tree(vec![vec![a.clone()]])).unwrap();
    let result = verify_inclusion(&AwsLcDigester, &tree(vec![vec![a]]), &sha256_leaf(b"b"), &root);
    assert!(matches!(result, Err(Error::LeafNotFound(_))));
}

// ==== Chain roots ====

#[test]
fn test_chain_root_covers_every_token_in_order() {
    let tokens: Vec<Vec<u8>> = vec![b"tst-0".to_vec(), b"tst-1".to_vec()];
    let expected = sha256_concat(&[&sha256_leaf(&tokens[0]), &sha256_leaf(&tokens[1])]);

    let root = chain_root(&AwsLcDigester, DigestAlgorithm::Sha256, &tokens).unwrap();
    assert_eq!(root, expected);

    let reversed: Vec<Vec<u8>> = tokens.into_iter().rev().collect();
    let reversed_root = chain_root(&AwsLcDigester, DigestAlgorithm::Sha256, &reversed).unwrap();
    assert_ne!(root, reversed_root);
}

#[test]
fn test_chain_root_known_answer() {
    // SHA-256("abc")
    let root = chain_root(&AwsLcDigester, DigestAlgorithm::Sha256, &[b"abc"]).unwrap();
    assert_eq!(
        root.as_bytes(),
        hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
            .unwrap()
            .as_slice()
    );
}
