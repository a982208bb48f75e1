//! Property-based round-trip checks (spec.md §8 "Round-trip" / universal invariant 1):
//! build a policy string from a randomly chosen but well-typed shape, parse it, and
//! confirm the tree reports back exactly the structure that went in. `proptest` is
//! already a teacher dev-dependency; this is its first real use in this crate.

use proptest::prelude::*;

use wallet_policy_core::{parse_policy_script, NodeKind};

/// `multi(k, @0, .., @(n-1))`: every accepted tree must report the same `k` and the same
/// `0..n` key index sequence that was written (spec.md §8 universal invariant 4).
fn multi_string(k: u32, n: u32) -> String {
    let mut s = String::new();
    s.push_str("multi(");
    s.push_str(&k.to_string());
    for i in 0..n {
        s.push(',');
        s.push('@');
        s.push_str(&i.to_string());
    }
    s.push(')');
    s
}

proptest! {
    #[test]
    fn multi_round_trips_k_and_key_indexes(n in 1u32..=16, k_offset in 0u32..16) {
        let k = 1 + (k_offset % n);
        let policy = multi_string(k, n);
        let out = parse_policy_script(policy.as_bytes(), n as usize, 4096)
            .unwrap_or_else(|e| panic!("{policy} should parse, got {e}"));
        match &out.arena.get(out.root).kind {
            NodeKind::Multi { k: parsed_k, key_indexes } => {
                prop_assert_eq!(*parsed_k, k);
                prop_assert_eq!(key_indexes.len(), n as usize);
                for (i, idx) in key_indexes.iter().enumerate() {
                    prop_assert_eq!(*idx, i);
                }
            }
            other => prop_assert!(false, "unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn older_round_trips_its_value(n in 1u32..(1u32 << 31)) {
        let policy = std::format!("older({n})");
        let out = parse_policy_script(policy.as_bytes(), 0, 4096)
            .unwrap_or_else(|e| panic!("{policy} should parse, got {e}"));
        match &out.arena.get(out.root).kind {
            NodeKind::Older { n: parsed } => prop_assert_eq!(*parsed, n),
            other => prop_assert!(false, "unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn older_zero_and_overflow_are_always_rejected(n in prop_oneof![Just(0u64), (1u64 << 31)..(1u64 << 40)]) {
        let policy = std::format!("older({n})");
        prop_assert!(parse_policy_script(policy.as_bytes(), 0, 4096).is_err());
    }

    /// `thresh(k, pk(@0), s:pk(@0), .., s:pk(@0))`: the first child is B, every later
    /// child is `s:pk(...)` which is type W (spec.md §8 universal invariant 5).
    #[test]
    fn thresh_of_one_b_leaf_and_n_w_leaves_round_trips_arity(extra in 0u32..8, k_offset in 0u32..8) {
        let n = extra + 1;
        let k = 1 + (k_offset % n);
        let mut policy = std::format!("thresh({k},pk(@0)");
        for _ in 0..extra {
            policy.push_str(",s:pk(@0)");
        }
        policy.push(')');
        let out = parse_policy_script(policy.as_bytes(), 1, 4096)
            .unwrap_or_else(|e| panic!("{policy} should parse, got {e}"));
        match &out.arena.get(out.root).kind {
            NodeKind::Thresh { k: parsed_k, children } => {
                prop_assert_eq!(*parsed_k, k);
                prop_assert_eq!(children.len(), n as usize);
            }
            other => prop_assert!(false, "unexpected kind: {other:?}"),
        }
    }
}
