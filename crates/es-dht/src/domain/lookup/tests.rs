//! Tests for the lookup state machine

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::*;
use crate::domain::{LookupItem, NodeId, PeerStateModel};
use shared_crypto::{HashFunction, Sha256Hasher};

fn model_sized(name: &str, bucket_size: usize) -> PeerStateModel {
    let id = NodeId::new(Sha256Hasher::new().hash(name.as_bytes()));
    PeerStateModel::new(id, Arc::new(Sha256Hasher::new()), bucket_size, 16)
}

fn model(name: &str) -> PeerStateModel {
    model_sized(name, 20)
}

fn introduce(into: &mut PeerStateModel, peer: &PeerStateModel) {
    let snapshot = peer.get_state(None).unwrap();
    assert!(into.set_peer(
        peer.id().clone(),
        snapshot.version,
        &snapshot.proof,
        snapshot.peers,
    ));
}

fn far_target() -> NodeId {
    NodeId::new(Sha256Hasher::new().hash(b"somewhere"))
}

// =============================================================================
// Start
// =============================================================================

#[test]
fn test_start_with_no_peers() {
    let alice = model("alice");
    let mut lookups = LookupCoordinator::new(0.2, 20);
    let target = far_target();

    let (lookup, items) = lookups.start(&alice, &target, None);
    assert!(items.is_empty());
    assert_eq!(lookups.active(), 1);
    assert_eq!(lookups.session(&lookup).unwrap().target(), &target);
    assert_eq!(lookups.finish(&alice, &lookup), Some(Vec::new()));
    assert_eq!(lookups.active(), 0);
}

#[test]
fn test_direct_peer_needs_no_queries() {
    let mut alice = model("alice");
    let bob = model("bob");
    introduce(&mut alice, &bob);
    let mut lookups = LookupCoordinator::new(0.2, 20);

    let (lookup, items) = lookups.start(&alice, bob.id(), None);
    assert!(items.is_empty());
    assert_eq!(lookups.finish(&alice, &lookup), Some(vec![bob.id().clone()]));
    assert_eq!(lookups.active(), 0);
}

#[test]
fn test_finish_without_session() {
    let alice = model("alice");
    let mut lookups = LookupCoordinator::new(0.2, 20);
    let (lookup, _) = lookups.start(&alice, &far_target(), None);

    assert!(lookups.finish(&alice, &lookup).is_some());
    assert_eq!(lookups.finish(&alice, &lookup), None);
}

#[test]
fn test_lookups_of_same_target_are_independent() {
    let mut alice = model("alice");
    let mut bob = model("bob");
    let carol = model("carol");
    introduce(&mut bob, &carol);
    introduce(&mut alice, &bob);
    let mut lookups = LookupCoordinator::new(0.2, 20);
    let target = far_target();

    let (first, first_items) = lookups.start(&alice, &target, None);
    let (second, second_items) = lookups.start(&alice, &target, None);
    assert_ne!(first, second);
    assert_eq!(first_items, second_items);
    assert_eq!(lookups.active(), 2);

    // Closing one leaves the other untouched.
    lookups.update(alice.id(), &first, carol.id(), None);
    assert_eq!(lookups.finish(&alice, &first), Some(vec![bob.id().clone()]));
    assert_eq!(lookups.session(&second).unwrap().awaiting(), 1);

    lookups.update(alice.id(), &second, carol.id(), Some((carol.version(), &[][..])));
    assert_eq!(
        lookups.finish(&alice, &second).map(|found| found.len()),
        Some(2)
    );
    assert_eq!(lookups.active(), 0);
}

#[test]
fn test_second_hop_target_reached_through_parent() {
    let mut alice = model("alice");
    let mut bob = model("bob");
    let carol = model("carol");
    introduce(&mut bob, &carol);
    introduce(&mut alice, &bob);
    let mut lookups = LookupCoordinator::new(0.2, 20);

    let (lookup, items) = lookups.start(&alice, carol.id(), None);

    assert_eq!(
        items,
        vec![LookupItem {
            node_id: carol.id().clone(),
            parent_id: bob.id().clone(),
            parent_version: bob.version().clone(),
        }]
    );

    let next = lookups.update(
        alice.id(),
        &lookup,
        carol.id(),
        Some((carol.version(), &[][..])),
    );
    assert!(next.is_empty());
    assert_eq!(lookups.finish(&alice, &lookup), Some(vec![carol.id().clone()]));
}

#[test]
fn test_start_queries_only_second_hop_candidates() {
    let mut alice = model("alice");
    let mut bob = model("bob");
    let carol = model("carol");
    introduce(&mut bob, &carol);
    introduce(&mut alice, &bob);
    let mut lookups = LookupCoordinator::new(0.2, 20);

    let (lookup, items) = lookups.start(&alice, &far_target(), None);

    assert_eq!(items.len(), 1);
    assert_eq!(&items[0].node_id, carol.id());
    assert_eq!(&items[0].parent_id, bob.id());
    assert_eq!(lookups.session(&lookup).unwrap().awaiting(), 1);
}

#[test]
fn test_own_id_is_never_a_candidate() {
    let mut alice = model("alice");
    let mut bob = model("bob");
    introduce(&mut bob, &alice);
    introduce(&mut alice, &bob);
    let mut lookups = LookupCoordinator::new(0.2, 20);
    let target = far_target();

    let (lookup, items) = lookups.start(&alice, &target, None);
    assert!(items.iter().all(|item| &item.node_id != alice.id()));

    let found = lookups.finish(&alice, &lookup).unwrap();
    assert_eq!(found, vec![bob.id().clone()]);
}

// =============================================================================
// Anti-Sybil cap
// =============================================================================

#[test]
fn test_single_relay_is_capped() {
    let mut alice = model("alice");
    let mut mallory = model_sized("mallory", 256);
    let sybils: HashSet<NodeId> = (0..30)
        .map(|i| {
            let sybil = model(&format!("sybil-{i}"));
            introduce(&mut mallory, &sybil);
            sybil.id().clone()
        })
        .collect();
    introduce(&mut alice, &mallory);
    for i in 0..4 {
        introduce(&mut alice, &model(&format!("honest-{i}")));
    }
    assert_eq!(alice.peer_count(), 5);
    let mut lookups = LookupCoordinator::new(0.2, 20);

    let (lookup, items) = lookups.start(&alice, &far_target(), None);

    assert!(!items.is_empty());
    assert!(items.iter().all(|item| &item.parent_id == mallory.id()));

    // Every origin, relay or direct peer, stays within
    // ceil(len * max(0.2, 1/5)) of the settled closest set.
    let closest = lookups.session(&lookup).unwrap().closest();
    let cap = (closest.len() as f64 * 0.2).ceil() as usize;
    let mut per_origin: HashMap<&NodeId, usize> = HashMap::new();
    for candidate in &closest {
        let origin = if sybils.contains(candidate) {
            mallory.id()
        } else {
            candidate
        };
        *per_origin.entry(origin).or_insert(0) += 1;
    }
    assert!(
        per_origin.values().all(|&seen| seen <= cap),
        "cap {cap} exceeded: {per_origin:?}"
    );

    // Exactly the relayed candidates that survived are queried.
    let relayed: HashSet<&NodeId> = closest.iter().filter(|id| sybils.contains(*id)).collect();
    let queried: HashSet<&NodeId> = items.iter().map(|item| &item.node_id).collect();
    assert_eq!(queried, relayed);
    assert!(items.len() <= cap);
}

#[test]
fn test_lone_peer_is_not_capped() {
    let mut alice = model("alice");
    let mut bob = model_sized("bob", 256);
    for i in 0..6 {
        introduce(&mut bob, &model(&format!("n-{i}")));
    }
    introduce(&mut alice, &bob);
    let mut lookups = LookupCoordinator::new(0.2, 20);

    let (_, items) = lookups.start(&alice, &far_target(), None);

    assert_eq!(items.len(), 6);
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_without_session() {
    let alice = model("alice");
    let mut lookups = LookupCoordinator::new(0.2, 20);
    let (lookup, _) = lookups.start(&alice, &far_target(), None);
    lookups.finish(&alice, &lookup);

    let node = model("bob");
    assert!(lookups
        .update(alice.id(), &lookup, node.id(), Some((node.version(), &[][..])))
        .is_empty());
    assert_eq!(lookups.active(), 0);
}

#[test]
fn test_failed_query_drops_candidate() {
    let mut alice = model("alice");
    let mut bob = model("bob");
    let carol = model("carol");
    introduce(&mut bob, &carol);
    introduce(&mut alice, &bob);
    let mut lookups = LookupCoordinator::new(0.2, 20);
    let (lookup, _) = lookups.start(&alice, &far_target(), None);

    assert!(lookups.update(alice.id(), &lookup, carol.id(), None).is_empty());

    let session = lookups.session(&lookup).unwrap();
    assert_eq!(session.awaiting(), 0);
    assert!(!session.closest().contains(carol.id()));
    assert_eq!(lookups.finish(&alice, &lookup), Some(vec![bob.id().clone()]));
}

#[test]
fn test_update_walks_towards_target() {
    // alice -> bob -> carol -> dave, alice only knows bob
    let mut alice = model("alice");
    let mut bob = model("bob");
    let mut carol = model("carol");
    let dave = model("dave");
    introduce(&mut carol, &dave);
    introduce(&mut bob, &carol);
    introduce(&mut alice, &bob);
    let mut lookups = LookupCoordinator::new(0.2, 20);

    let (lookup, first) = lookups.start(&alice, dave.id(), None);
    assert_eq!(first.len(), 1);
    assert_eq!(&first[0].node_id, carol.id());

    let carol_peers = vec![dave.id().clone(), bob.id().clone()];
    let second = lookups.update(
        alice.id(),
        &lookup,
        carol.id(),
        Some((carol.version(), &carol_peers[..])),
    );
    assert_eq!(
        second,
        vec![LookupItem {
            node_id: dave.id().clone(),
            parent_id: carol.id().clone(),
            parent_version: carol.version().clone(),
        }]
    );

    let third = lookups.update(
        alice.id(),
        &lookup,
        dave.id(),
        Some((dave.version(), &[][..])),
    );
    assert!(third.is_empty());
    assert_eq!(lookups.finish(&alice, &lookup), Some(vec![dave.id().clone()]));
}

#[test]
fn test_update_returns_only_new_close_candidates() {
    let mut alice = model("alice");
    let mut bob = model("bob");
    let carol = model("carol");
    introduce(&mut bob, &carol);
    introduce(&mut alice, &bob);
    let mut lookups = LookupCoordinator::new(0.2, 20);
    let (lookup, _) = lookups.start(&alice, &far_target(), None);

    let fresh: Vec<NodeId> = (0..3).map(|i| model(&format!("fresh-{i}")).id().clone()).collect();
    let mut reported = fresh.clone();
    reported.push(bob.id().clone());
    reported.push(alice.id().clone());

    let items = lookups.update(
        alice.id(),
        &lookup,
        carol.id(),
        Some((carol.version(), &reported[..])),
    );

    assert_eq!(items.len(), 3);
    for item in &items {
        assert!(fresh.contains(&item.node_id));
        assert_eq!(&item.parent_id, carol.id());
        assert_eq!(&item.parent_version, carol.version());
    }
    let session = lookups.session(&lookup).unwrap();
    assert_eq!(session.awaiting(), 3);
    assert!(session.is_connected(carol.id()));
}

#[test]
fn test_requested_count_bounds_result() {
    let mut alice = model("alice");
    for i in 0..5 {
        introduce(&mut alice, &model(&format!("peer-{i}")));
    }
    let mut lookups = LookupCoordinator::new(0.2, 20);
    let (lookup, _) = lookups.start(&alice, &far_target(), Some(2));
    let found = lookups.finish(&alice, &lookup).unwrap();

    assert_eq!(found.len(), 2);
}
