#![allow(
    clippy::doc_markdown,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rustc_hash::FxHashMap;
use sable_ir::intern;

use super::*;
use crate::RelationKind;

fn graph(edges: &[(char, &[char])]) -> impl Fn(char) -> Vec<char> {
    let map: FxHashMap<char, Vec<char>> = edges
        .iter()
        .map(|&(ty, bases)| (ty, bases.to_vec()))
        .collect();
    move |ty| map.get(&ty).cloned().unwrap_or_default()
}

fn text(order: &[char]) -> String {
    order.iter().collect()
}

#[test]
fn single_type_is_its_own_linearization() {
    let order = c3_linearize('A', graph(&[])).unwrap();
    assert_eq!(order, vec!['A']);
}

#[test]
fn consistent_diamond() {
    // A <- B, A <- C, (B, C) <- D
    let bases = graph(&[('B', &['A']), ('C', &['A']), ('D', &['B', 'C'])]);
    let order = c3_linearize('D', bases).unwrap();
    assert_eq!(text(&order), "DBCA");
}

#[test]
fn diamond_respects_declared_base_order() {
    let bases = graph(&[('B', &['A']), ('C', &['A']), ('D', &['C', 'B'])]);
    let order = c3_linearize('D', bases).unwrap();
    assert_eq!(text(&order), "DCBA");
}

#[test]
fn classic_example() {
    // Example from the Python 2.3 MRO write-up.
    let bases = graph(&[
        ('A', &['O']),
        ('B', &['O']),
        ('C', &['O']),
        ('D', &['O']),
        ('E', &['O']),
        ('1', &['A', 'B', 'C']),
        ('2', &['D', 'B', 'E']),
        ('3', &['D', 'A']),
        ('Z', &['1', '2', '3']),
    ]);
    let order = c3_linearize('Z', bases).unwrap();
    assert_eq!(text(&order), "Z123DABCEO");
}

#[test]
fn conflicting_precedence_fails() {
    // X says A before B, Y says B before A.
    let bases = graph(&[('X', &['A', 'B']), ('Y', &['B', 'A']), ('Z', &['X', 'Y'])]);
    let err = c3_linearize('Z', bases).unwrap_err();
    assert_eq!(
        err,
        LinearizationError {
            ty: 'Z',
            reason: LinearizationFailureReason::InconsistentPrecedence,
        }
    );
}

#[test]
fn base_listed_before_its_own_ancestor_fails() {
    let bases = graph(&[('B', &['A']), ('C', &['A', 'B'])]);
    let err = c3_linearize('C', bases).unwrap_err();
    assert_eq!(err.reason, LinearizationFailureReason::InconsistentPrecedence);
}

#[test]
fn cycle_is_reported() {
    let bases = graph(&[('A', &['B']), ('B', &['A'])]);
    let err = c3_linearize('A', bases).unwrap_err();
    assert_eq!(err.reason, LinearizationFailureReason::Cycle);
}

#[test]
fn linearizer_memoizes_across_roots() {
    let bases = graph(&[('B', &['A']), ('C', &['B']), ('D', &['B'])]);
    let mut linearizer = Linearizer::new();
    assert_eq!(text(linearizer.linearize('C', &bases).unwrap()), "CBA");
    assert_eq!(text(linearizer.linearize('D', &bases).unwrap()), "DBA");
    assert_eq!(text(linearizer.linearize('B', &bases).unwrap()), "BA");
}

#[test]
fn linearizer_recovers_after_failure() {
    let bases = graph(&[('A', &['B']), ('B', &['A']), ('C', &['D'])]);
    let mut linearizer = Linearizer::new();
    assert!(linearizer.linearize('A', &bases).is_err());
    assert_eq!(text(linearizer.linearize('C', &bases).unwrap()), "CD");
}

// Registry pass

#[test]
fn registry_linearizes_diamond() {
    let mut registry = TypeRegistry::new();
    let a = registry.plain(intern("LinA"), 0).unwrap();
    let b = registry.plain(intern("LinB"), 0).unwrap();
    let c = registry.plain(intern("LinC"), 0).unwrap();
    let d = registry.plain(intern("LinD"), 0).unwrap();
    registry.add_relation(a, b, RelationKind::Subtype, 0).unwrap();
    registry.add_relation(a, c, RelationKind::Subtype, 0).unwrap();
    registry.add_relation(b, d, RelationKind::Subtype, 0).unwrap();
    registry.add_relation(c, d, RelationKind::Subtype, 0).unwrap();
    registry.linearize().unwrap();

    let order: Vec<TypeId> = registry.linearization(d).iter().map(|a| a.ty).collect();
    assert_eq!(order, vec![d, b, c, a]);
    assert_eq!(registry.linearization(d)[0].via, None);
    assert_eq!(registry.linearization(d)[1].via, Some(RelationKind::Subtype));
    assert_eq!(registry.ancestor_index(d, a), Some(3));
    assert_eq!(registry.ancestor_index(a, d), None);
}

#[test]
fn registry_reports_failure_by_name() {
    let mut registry = TypeRegistry::new();
    let a = registry.plain(intern("BadA"), 0).unwrap();
    let b = registry.plain(intern("BadB"), 0).unwrap();
    let x = registry.plain(intern("BadX"), 0).unwrap();
    let y = registry.plain(intern("BadY"), 0).unwrap();
    let z = registry.plain(intern("BadZ"), 0).unwrap();
    for (base, derived) in [(a, x), (b, x), (b, y), (a, y), (x, z), (y, z)] {
        registry
            .add_relation(base, derived, RelationKind::Subtype, 0)
            .unwrap();
    }
    let err = registry.linearize().unwrap_err();
    assert_eq!(
        err,
        TypeError::LinearizationFailure {
            ty: "BadZ".to_string(),
            reason: LinearizationFailureReason::InconsistentPrecedence,
        }
    );
    assert_eq!(registry.phase(), Phase::Registering);
}

#[test]
fn conversion_edges_do_not_linearize() {
    let mut registry = TypeRegistry::new();
    let celsius = registry.plain(intern("Celsius"), 8).unwrap();
    registry
        .add_relation(TypeId::FLOAT, celsius, RelationKind::Conversion, 0)
        .unwrap();
    registry.linearize().unwrap();
    assert_eq!(registry.linearization(celsius).len(), 1);
}

#[test]
fn builtins_linearize() {
    let mut registry = TypeRegistry::new();
    registry.linearize().unwrap();
    let order: Vec<TypeId> = registry
        .linearization(TypeId::INT)
        .iter()
        .map(|a| a.ty)
        .collect();
    assert_eq!(order, vec![TypeId::INT, TypeId::NUMBER]);
    assert_eq!(registry.ancestor_index(TypeId::CLOSURE, TypeId::CALLABLE), Some(1));
}

// Properties

/// A random DAG over nodes `0..n`: node `i` lists distinct bases below `i`.
fn dag_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..4), 1..12).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, picks)| {
                let mut bases: Vec<usize> = Vec::new();
                if i > 0 {
                    for pick in picks {
                        let base = usize::from(pick) % i;
                        if !bases.contains(&base) {
                            bases.push(base);
                        }
                    }
                }
                bases
            })
            .collect()
    })
}

fn is_subsequence(needle: &[usize], haystack: &[usize]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|n| rest.any(|h| h == n))
}

proptest! {
    #[test]
    fn single_inheritance_is_the_parent_chain(parents in prop::collection::vec(any::<u8>(), 0..20)) {
        // Node i + 1 derives from some node <= i.
        let parent_of: Vec<usize> = parents
            .iter()
            .enumerate()
            .map(|(i, &p)| usize::from(p) % (i + 1))
            .collect();
        let bases = |ty: usize| if ty == 0 { vec![] } else { vec![parent_of[ty - 1]] };
        let leaf = parent_of.len();

        let order = c3_linearize(leaf, bases).unwrap();

        let mut chain = vec![leaf];
        let mut at = leaf;
        while at > 0 {
            at = parent_of[at - 1];
            chain.push(at);
        }
        prop_assert_eq!(order, chain);
    }

    #[test]
    fn successful_linearizations_are_monotonic(dag in dag_strategy()) {
        let bases = |ty: usize| dag[ty].clone();
        let mut linearizer = Linearizer::new();
        for ty in 0..dag.len() {
            let Ok(order) = linearizer.linearize(ty, &bases).map(|o| o.to_vec()) else {
                continue;
            };
            prop_assert_eq!(order[0], ty);
            prop_assert!(is_subsequence(&dag[ty], &order));
            for &base in &dag[ty] {
                let base_order = linearizer.linearize(base, &bases).unwrap().to_vec();
                prop_assert!(is_subsequence(&base_order, &order));
            }
        }
    }
}
