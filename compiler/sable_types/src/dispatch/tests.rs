use pretty_assertions::assert_eq;
use sable_ir::intern;

use super::*;
use crate::RelationKind;

/// `A <- B <- C`, plus an unrelated `U`.
struct Hierarchy {
    registry: TypeRegistry,
    a: TypeId,
    b: TypeId,
    c: TypeId,
    u: TypeId,
}

fn hierarchy() -> Hierarchy {
    let mut registry = TypeRegistry::new();
    let a = registry.plain(intern("DA"), 0).unwrap();
    let b = registry.plain(intern("DB"), 0).unwrap();
    let c = registry.plain(intern("DC"), 0).unwrap();
    let u = registry.plain(intern("DU"), 0).unwrap();
    registry.add_relation(a, b, RelationKind::Subtype, 0).unwrap();
    registry.add_relation(b, c, RelationKind::Subtype, 0).unwrap();
    registry.reference_to(b).unwrap();
    registry.pointer_to(a).unwrap();
    registry.seal().unwrap();
    Hierarchy {
        registry,
        a,
        b,
        c,
        u,
    }
}

#[test]
fn more_specific_candidate_wins() {
    let h = hierarchy();
    let mut table = DispatchTable::new();
    let on_a = table.push(Signature::of(&[h.a]));
    let on_b = table.push(Signature::of(&[h.b]));

    assert_eq!(table.select(&h.registry, &[h.b]), Ok(on_b));
    assert_eq!(table.select(&h.registry, &[h.c]), Ok(on_b));
    assert_eq!(table.select(&h.registry, &[h.a]), Ok(on_a));
}

#[test]
fn unrelated_argument_is_not_applicable() {
    let h = hierarchy();
    let mut table = DispatchTable::new();
    table.push(Signature::of(&[h.a]));
    table.push(Signature::of(&[h.b]));

    assert_eq!(
        table.select(&h.registry, &[h.u]),
        Err(DispatchError::NotApplicable)
    );
}

#[test]
fn any_matches_but_ranks_last() {
    let h = hierarchy();
    let mut table = DispatchTable::new();
    let fallback = table.push(Signature::new([ParamType::Any]));
    let on_a = table.push(Signature::of(&[h.a]));

    assert_eq!(table.select(&h.registry, &[h.c]), Ok(on_a));
    assert_eq!(table.select(&h.registry, &[h.u]), Ok(fallback));
    assert_eq!(table.select(&h.registry, &[TypeId::INT]), Ok(fallback));
}

#[test]
fn narrowing_is_left_to_right() {
    let h = hierarchy();
    let mut table = DispatchTable::new();
    // Specific on the first argument, general on the second...
    let first = table.push(Signature::of(&[h.b, h.a]));
    // ...and the reverse.
    table.push(Signature::of(&[h.a, h.b]));

    assert_eq!(table.select(&h.registry, &[h.b, h.b]), Ok(first));
}

#[test]
fn equally_specific_candidates_are_ambiguous() {
    let h = hierarchy();
    let mut table = DispatchTable::new();
    table.push(Signature::new([ParamType::Exact(h.a), ParamType::Any]));
    table.push(Signature::new([ParamType::Exact(h.a), ParamType::Any]));

    assert_eq!(
        table.select(&h.registry, &[h.b, h.u]),
        Err(DispatchError::Ambiguous {
            candidates: vec![0, 1]
        })
    );
}

#[test]
fn indirection_is_normalized() {
    let h = hierarchy();
    let r = &h.registry;
    let ref_b = r.get(crate::TypeKey::Reference(h.b)).unwrap();
    let ptr_a = r.get(crate::TypeKey::Pointer(h.a)).unwrap();

    let mut table = DispatchTable::new();
    let on_ptr_a = table.push(Signature::of(&[ptr_a]));
    assert_eq!(table.select(r, &[ref_b]), Ok(on_ptr_a));
    assert_eq!(table.select(r, &[h.c]), Ok(on_ptr_a));
}

#[test]
fn arity_filters_and_unions() {
    let h = hierarchy();
    let mut table = DispatchTable::new();
    let unary = table.push(Signature::of(&[h.a]));
    let variadic = table.push(Signature::of(&[h.a, h.a]).with_rest(ParamType::Exact(h.a)));

    assert_eq!(table.arity(), Some(Arity::at_least(1)));
    assert_eq!(table.select(&h.registry, &[h.b]), Ok(unary));
    assert_eq!(table.select(&h.registry, &[h.b, h.c, h.a]), Ok(variadic));
    assert_eq!(
        table.select(&h.registry, &[]),
        Err(DispatchError::NotApplicable)
    );
    assert_eq!(
        table.select(&h.registry, &[h.b, h.c, h.u]),
        Err(DispatchError::NotApplicable)
    );
}

#[test]
fn selections_are_memoized_and_invalidated() {
    let h = hierarchy();
    let mut table = DispatchTable::new();
    table.push(Signature::of(&[h.a]));
    table.select(&h.registry, &[h.b]).unwrap();
    table.select(&h.registry, &[h.b]).unwrap();
    table.select(&h.registry, &[h.u]).unwrap_err();
    assert_eq!(table.cached(), 2);

    let on_b = table.push(Signature::of(&[h.b]));
    assert_eq!(table.cached(), 0);
    assert_eq!(table.select(&h.registry, &[h.b]), Ok(on_b));
}

#[test]
fn arity_union() {
    assert_eq!(
        Arity::exact(2).union(Arity::range(1, 3)),
        Arity::range(1, 3)
    );
    assert_eq!(Arity::exact(2).union(Arity::at_least(4)), Arity::at_least(2));
    assert!(Arity::range(1, 2).accepts(2));
    assert!(!Arity::range(1, 2).accepts(3));
    assert!(Arity::at_least(0).accepts(100));
    assert_eq!(DispatchTable::new().arity(), None);
}
