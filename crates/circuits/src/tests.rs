//! Integration tests across the store, the verifiers and the tree.

use std::sync::Arc;

use ark_bn254::{Bn254, Fr};
use ark_groth16::Groth16;
use ark_relations::r1cs::ConstraintSystem;
use ark_snark::SNARK;
use num_bigint::BigUint;
use num_traits::One;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tree_hash::TreeHasher;

use crate::circuit::TransitionCircuit;
use crate::composer::Composer;
use crate::config::TreeConfig;
use crate::hash_path::{HashPath, HashPathVar};
use crate::index::{IndexVar, Side};
use crate::membership::{check_hash_path, check_membership, update_membership};
use crate::native::NativeComposer;
use crate::r1cs::R1csComposer;
use crate::recompute::recompute_path;
use crate::store::{HashPathStore, MemoryStore};
use crate::tree::MerkleTree;

fn hasher() -> Arc<TreeHasher<Fr>> {
    Arc::new(TreeHasher::new())
}

fn random_index(rng: &mut StdRng, depth: usize) -> BigUint {
    let bytes: Vec<u8> = (0..depth.div_ceil(8)).map(|_| rng.gen()).collect();
    BigUint::from_bytes_le(&bytes) % (BigUint::one() << depth)
}

fn random_value(rng: &mut StdRng) -> Vec<u8> {
    let len = rng.gen_range(0..80);
    (0..len).map(|_| rng.gen()).collect()
}

/// Recompute a path natively, then check it in-circuit under the new root.
fn recomputed_path_is_member<C: Composer<Fr>>(
    composer: &C,
    store: &MemoryStore<Fr>,
    index: &BigUint,
    value: &[u8],
) -> C::Bool {
    let hasher = composer.hasher();
    let path = recompute_path(store, hasher, index, value).unwrap();
    let new_root = path.root(hasher);

    let root = composer.alloc_witness(new_root).unwrap();
    let path_var = HashPathVar::new_witness(composer, &path).unwrap();
    let leaf = composer.hash_leaf(&composer.alloc_bytes(value).unwrap()).unwrap();
    let index_var = IndexVar::new_witness(composer, index, store.depth()).unwrap();
    check_membership(composer, &root, &path_var, &leaf, &index_var).unwrap()
}

/// Membership of a freshly recomputed path holds at every depth, native backend
#[test]
fn test_recomputed_membership_all_depths_native() {
    let mut rng = StdRng::seed_from_u64(7);
    let hasher = hasher();

    for depth in [1, 2, 3, 5, 8, 16, 31, 32, 64, 128, 255, 256] {
        let mut store = MemoryStore::new(depth, hasher.clone()).unwrap();
        for _ in 0..3 {
            let filler = random_index(&mut rng, depth);
            store.update_element(&filler, &random_value(&mut rng)).unwrap();
        }

        let composer = NativeComposer::new(hasher.clone());
        for index in [
            BigUint::from(0u32),
            (BigUint::one() << depth) - 1u32,
            random_index(&mut rng, depth),
        ] {
            let value = random_value(&mut rng);
            assert!(
                recomputed_path_is_member(&composer, &store, &index, &value),
                "depth {depth} index {index}"
            );
        }
    }
}

/// Same property on R1CS, every index of small trees
#[test]
fn test_recomputed_membership_small_depths_r1cs() {
    let hasher = hasher();

    for depth in 1..=3 {
        let mut store = MemoryStore::new(depth, hasher.clone()).unwrap();
        store.update_element(&BigUint::from(0u32), b"seed").unwrap();

        for i in 0u32..(1 << depth) {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let composer = R1csComposer::new(cs.clone(), hasher.clone());
            let is_member =
                recomputed_path_is_member(&composer, &store, &BigUint::from(i), b"value");
            composer.assert_true(&is_member, "membership").unwrap();
            assert!(cs.is_satisfied().unwrap(), "depth {depth} index {i}");
        }
    }
}

/// Updating the same slot twice with the same value gives the same root
#[test]
fn test_update_is_deterministic() {
    let hasher = hasher();
    let composer = NativeComposer::new(hasher.clone());
    let store = MemoryStore::new(6, hasher).unwrap();
    let mut tree = MerkleTree::new(&composer, store, TreeConfig::permissive(6)).unwrap();

    let index = BigUint::from(37u32);
    tree.update_member(b"potion", &index).unwrap();
    let first = tree.root_value();
    tree.update_member(b"potion", &index).unwrap();

    assert_eq!(tree.root_value(), first);
    assert!(composer.failures().is_empty());
}

/// An update leaves every other path untouched below the level where the
/// two indices meet
#[test]
fn test_update_non_interference_on_store() {
    let mut rng = StdRng::seed_from_u64(11);
    let depth = 8;
    let hasher = hasher();
    let mut store = MemoryStore::new(depth, hasher.clone()).unwrap();
    for _ in 0..20 {
        let index = random_index(&mut rng, depth);
        store.update_element(&index, &random_value(&mut rng)).unwrap();
    }

    let others: Vec<BigUint> = (0..30).map(|_| random_index(&mut rng, depth)).collect();
    let before: Vec<HashPath<Fr>> = others
        .iter()
        .map(|index| store.get_hash_path(index).unwrap())
        .collect();

    let target = BigUint::from(0b1011_0110u32);
    store.update_element(&target, b"changed").unwrap();
    let target_path = store.get_hash_path(&target).unwrap();

    for (other, old_path) in others.iter().zip(&before) {
        if *other == target {
            continue;
        }
        let new_path = store.get_hash_path(other).unwrap();
        for level in 0..depth {
            let shared = (other >> (level + 1)) == (&target >> (level + 1));
            if shared {
                assert_eq!(new_path.level(level), target_path.level(level));
            } else {
                assert_eq!(new_path.level(level), old_path.level(level), "level {level}");
            }
        }
    }
}

/// Appends land at consecutive slots and agree with direct updates
#[test]
fn test_append_ordering_matches_direct_updates() {
    let hasher = hasher();

    let appender = NativeComposer::new(hasher.clone());
    let store = MemoryStore::new(4, hasher.clone()).unwrap();
    let mut appended = MerkleTree::new(&appender, store, TreeConfig::with_depth(4)).unwrap();
    appended.add_member(b"v1").unwrap();
    appended.add_member(b"v2").unwrap();

    let updater = NativeComposer::new(hasher.clone());
    let store = MemoryStore::new(4, hasher.clone()).unwrap();
    let mut direct = MerkleTree::new(&updater, store, TreeConfig::permissive(4)).unwrap();
    direct.update_member(b"v1", &BigUint::from(0u32)).unwrap();
    direct.update_member(b"v2", &BigUint::from(1u32)).unwrap();

    assert_eq!(appended.root_value(), direct.root_value());
    assert_eq!(
        appended.store().get_element(&BigUint::from(1u32)).unwrap(),
        hasher.hash_leaf(b"v2")
    );
    assert!(appender.failures().is_empty());
    assert!(updater.failures().is_empty());
}

/// Capacity is enforced natively once every slot is taken
#[test]
fn test_append_rejected_when_full() {
    let hasher = hasher();
    let composer = NativeComposer::new(hasher.clone());
    let store = MemoryStore::new(2, hasher).unwrap();
    let mut tree = MerkleTree::new(&composer, store, TreeConfig::with_depth(2)).unwrap();

    for value in [b"a", b"b", b"c", b"d"] {
        tree.add_member(value).unwrap();
    }
    assert!(tree.add_member(b"e").is_err());
    assert_eq!(*tree.size(), BigUint::from(4u32));
}

/// The depth-2 walkthrough: two appends, membership checks, then an update
/// to an unrelated slot
fn depth_two_scenario<C: Composer<Fr>>(composer: &C, hasher: Arc<TreeHasher<Fr>>) {
    let store = MemoryStore::new(2, hasher.clone()).unwrap();
    let mut tree = MerkleTree::new(composer, store, TreeConfig::permissive(2)).unwrap();
    assert_eq!(*tree.total_size(), BigUint::from(4u32));

    tree.add_member(b"A").unwrap();
    tree.add_member(b"B").unwrap();
    assert_eq!(
        tree.store().get_element(&BigUint::from(0u32)).unwrap(),
        hasher.hash_leaf(b"A")
    );
    assert_eq!(
        tree.store().get_element(&BigUint::from(1u32)).unwrap(),
        hasher.hash_leaf(b"B")
    );
    assert_eq!(
        tree.store().get_element(&BigUint::from(2u32)).unwrap(),
        tree.store().zero_hash(0)
    );

    let zero = BigUint::from(0u32);
    let path_for_zero = HashPathVar::new_witness(composer, &tree.hash_path(&zero).unwrap()).unwrap();
    let leaf_a = composer.const_value(hasher.hash_leaf(b"A"));

    let at_zero = IndexVar::new_witness(composer, &zero, 2).unwrap();
    let holds = check_membership(composer, tree.root(), &path_for_zero, &leaf_a, &at_zero).unwrap();
    assert_eq!(composer.bool_value(&holds), Some(true));

    let at_one = IndexVar::new_witness(composer, &BigUint::from(1u32), 2).unwrap();
    let wrong = check_membership(composer, tree.root(), &path_for_zero, &leaf_a, &at_one).unwrap();
    assert_eq!(composer.bool_value(&wrong), Some(false));

    tree.update_member(b"C", &BigUint::from(3u32)).unwrap();
    tree.assert_member(b"A", &zero).unwrap();
    assert_eq!(*tree.size(), BigUint::from(2u32));
}

#[test]
fn test_depth_two_scenario_native() {
    let hasher = hasher();
    let composer = NativeComposer::new(hasher.clone());
    depth_two_scenario(&composer, hasher);
    assert!(composer.failures().is_empty());
}

#[test]
fn test_depth_two_scenario_r1cs() {
    let hasher = hasher();
    let cs = ConstraintSystem::<Fr>::new_ref();
    let composer = R1csComposer::new(cs.clone(), hasher.clone());
    depth_two_scenario(&composer, hasher);
    assert!(cs.is_satisfied().unwrap());
}

/// Both backends drive the tree to the same root
#[test]
fn test_backends_agree_on_root() {
    let mut rng = StdRng::seed_from_u64(3);
    let hasher = hasher();
    let values: Vec<Vec<u8>> = (0..5).map(|_| random_value(&mut rng)).collect();

    let native = NativeComposer::new(hasher.clone());
    let store = MemoryStore::new(5, hasher.clone()).unwrap();
    let mut native_tree = MerkleTree::new(&native, store, TreeConfig::with_depth(5)).unwrap();

    let cs = ConstraintSystem::<Fr>::new_ref();
    let r1cs = R1csComposer::new(cs.clone(), hasher.clone());
    let store = MemoryStore::new(5, hasher).unwrap();
    let mut r1cs_tree = MerkleTree::new(&r1cs, store, TreeConfig::with_depth(5)).unwrap();

    for value in &values {
        native_tree.add_member(value).unwrap();
        r1cs_tree.add_member(value).unwrap();
    }
    native_tree.update_member(b"swap", &BigUint::from(2u32)).unwrap();
    r1cs_tree.update_member(b"swap", &BigUint::from(2u32)).unwrap();

    assert_eq!(native_tree.root_value(), r1cs_tree.root_value());
    assert_eq!(r1cs.field_value(r1cs_tree.root()), Some(r1cs_tree.root_value()));
    assert!(native.failures().is_empty());
    assert!(cs.is_satisfied().unwrap());
}

fn tampered_fixture() -> (Arc<TreeHasher<Fr>>, MemoryStore<Fr>, BigUint, HashPath<Fr>) {
    let hasher = hasher();
    let mut store = MemoryStore::new(6, hasher.clone()).unwrap();
    for i in 0u32..12 {
        store.update_element(&BigUint::from(i), &i.to_le_bytes()).unwrap();
    }
    let index = BigUint::from(5u32);
    let mut path = store.get_hash_path(&index).unwrap();
    let sibling = Side::of(&index, 3).opposite();
    let flipped = path.get(3, sibling) + Fr::one();
    path.set(3, sibling, flipped);
    (hasher, store, index, path)
}

/// A tampered level-3 pair breaks the old path check
#[test]
fn test_tampered_path_fails_check() {
    let (hasher, store, index, tampered) = tampered_fixture();
    let composer = NativeComposer::new(hasher);
    let root = composer.alloc_witness(store.root()).unwrap();
    let index_var = IndexVar::new_witness(&composer, &index, 6).unwrap();

    let honest = HashPathVar::new_witness(&composer, &store.get_hash_path(&index).unwrap()).unwrap();
    assert!(check_hash_path(&composer, &root, &honest, &index_var).unwrap());

    let tampered = HashPathVar::new_witness(&composer, &tampered).unwrap();
    assert!(!check_hash_path(&composer, &root, &tampered, &index_var).unwrap());
}

/// ... and makes an update built on it unsatisfiable
#[test]
fn test_tampered_path_fails_update() {
    let (hasher, store, index, tampered) = tampered_fixture();
    let new_path = recompute_path(&store, &hasher, &index, b"new").unwrap();
    let new_root = new_path.root(&hasher);

    let native = NativeComposer::new(hasher.clone());
    let cs = ConstraintSystem::<Fr>::new_ref();
    let r1cs = R1csComposer::new(cs.clone(), hasher);

    fn emit<C: Composer<Fr>>(
        composer: &C,
        old_root: Fr,
        new_root: Fr,
        old_path: &HashPath<Fr>,
        new_path: &HashPath<Fr>,
        index: &BigUint,
    ) {
        let old_root = composer.alloc_witness(old_root).unwrap();
        let new_root = composer.alloc_witness(new_root).unwrap();
        let old_path = HashPathVar::new_witness(composer, old_path).unwrap();
        let new_path = HashPathVar::new_witness(composer, new_path).unwrap();
        let value = composer.alloc_bytes(b"new").unwrap();
        let index = IndexVar::new_witness(composer, index, 6).unwrap();
        update_membership(composer, &new_root, &new_path, &value, &old_root, &old_path, &index)
            .unwrap();
    }

    emit(&native, store.root(), new_root, &tampered, &new_path, &index);
    assert!(native.failures().contains(&"old hash path".to_string()));
    assert!(native.failures().contains(&"level 3 non-interference".to_string()));

    emit(&r1cs, store.root(), new_root, &tampered, &new_path, &index);
    assert!(!cs.is_satisfied().unwrap());
}

/// Pins both direction conventions on a valid transition: matching selects
/// the index side, sharing selects the sibling side. Swapping either makes
/// the same witness fail.
#[test]
fn test_direction_conventions_pinned() {
    let hasher = hasher();
    let mut store = MemoryStore::new(4, hasher.clone()).unwrap();
    store.update_element(&BigUint::from(9u32), b"old").unwrap();

    let index = BigUint::from(9u32);
    let old_path = store.get_hash_path(&index).unwrap();
    let new_path = recompute_path(&store, &hasher, &index, b"new").unwrap();

    for level in 0..4 {
        let own = Side::of(&index, level);
        assert_eq!(old_path.get(level, own.opposite()), new_path.get(level, own.opposite()));
        assert_ne!(old_path.get(level, own), new_path.get(level, own));
    }

    let composer = NativeComposer::new(hasher.clone());
    let old_root = composer.alloc_witness(store.root()).unwrap();
    let new_root = composer.alloc_witness(new_path.root(&hasher)).unwrap();
    let old_var = HashPathVar::new_witness(&composer, &old_path).unwrap();
    let new_var = HashPathVar::new_witness(&composer, &new_path).unwrap();
    let value = composer.alloc_bytes(b"new").unwrap();
    let index_var = IndexVar::new_witness(&composer, &index, 4).unwrap();
    update_membership(&composer, &new_root, &new_var, &value, &old_root, &old_var, &index_var)
        .unwrap();
    assert!(composer.failures().is_empty());

    // Sharing evaluated with the matching convention fails at every level.
    for level in 0..4 {
        let bit = Side::of(&index, level) == Side::Right;
        let (old_left, old_right) = *old_path.level(level);
        let (new_left, new_right) = *new_path.level(level);
        let share_left = old_left == new_left && !bit;
        let share_right = old_right == new_right && bit;
        assert!(!(share_left ^ share_right), "level {level}");
    }

    // Every index with one bit flipped is rejected.
    for level in 0..4 {
        let flipped = &index ^ (BigUint::one() << level);
        let composer = NativeComposer::new(hasher.clone());
        let old_root = composer.alloc_witness(store.root()).unwrap();
        let new_root = composer.alloc_witness(new_path.root(&hasher)).unwrap();
        let old_var = HashPathVar::new_witness(&composer, &old_path).unwrap();
        let new_var = HashPathVar::new_witness(&composer, &new_path).unwrap();
        let value = composer.alloc_bytes(b"new").unwrap();
        let index_var = IndexVar::new_witness(&composer, &flipped, 4).unwrap();
        update_membership(&composer, &new_root, &new_var, &value, &old_root, &old_var, &index_var)
            .unwrap();
        assert!(
            composer.failures().contains(&format!("level {level} non-interference")),
            "bit {level}"
        );
    }
}

/// Updating a slot past `size` under the default policy is unsatisfiable
#[test]
fn test_appended_only_policy_unsatisfiable() {
    let hasher = hasher();
    let cs = ConstraintSystem::<Fr>::new_ref();
    let composer = R1csComposer::new(cs.clone(), hasher.clone());
    let store = MemoryStore::new(3, hasher).unwrap();
    let mut tree = MerkleTree::new(&composer, store, TreeConfig::with_depth(3)).unwrap();

    tree.add_member(b"a").unwrap();
    tree.add_member(b"b").unwrap();
    tree.update_member(b"c", &BigUint::from(1u32)).unwrap();
    assert!(cs.is_satisfied().unwrap());

    tree.update_member(b"d", &BigUint::from(2u32)).unwrap();
    assert!(!cs.is_satisfied().unwrap());
}

/// Test full Groth16 proof generation and verification for TransitionCircuit
#[test]
fn test_transition_full_proof() {
    let mut rng = StdRng::seed_from_u64(42);
    let hasher = hasher();
    let depth = 4;
    let value = b"shield".to_vec();

    // Setup
    let empty_circuit = TransitionCircuit::empty(depth, value.len(), hasher.clone()).unwrap();
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(empty_circuit, &mut rng).unwrap();

    // Populate a tree and derive the witnesses for one update
    let mut store = MemoryStore::new(depth, hasher.clone()).unwrap();
    store.update_element(&BigUint::from(0u32), b"sword").unwrap();
    let index = BigUint::from(6u32);
    let circuit = TransitionCircuit::for_update(&store, hasher, &index, &value).unwrap();
    let public_inputs = circuit.public_inputs().unwrap();

    // Generate proof
    let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();

    // Verify proof
    let valid = Groth16::<Bn254>::verify(&vk, &public_inputs, &proof).unwrap();
    assert!(valid, "Transition proof verification failed");

    // The proof is bound to its roots
    store.update_element(&index, &value).unwrap();
    assert_eq!(public_inputs[1], store.root());
    let wrong_inputs = vec![public_inputs[0], public_inputs[0]];
    let valid = Groth16::<Bn254>::verify(&vk, &wrong_inputs, &proof).unwrap();
    assert!(!valid, "Proof verified against the wrong new root");
}
