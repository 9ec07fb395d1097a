use pretty_assertions::assert_eq;
use sable_types::{Arity, TypeId};

use super::Value;
use crate::tests::{eval, ints, read};

#[test]
fn lists_compare_structurally() {
    assert_eq!(ints(&[1, 2, 3]), read("(1 2 3)"));
    assert_ne!(ints(&[1, 2, 3]), ints(&[1, 2]));
    assert_ne!(Value::int(1), Value::float(1.0));
    assert_eq!(Value::string("a"), Value::from("a"));
}

#[test]
fn callables_compare_by_identity() {
    let f = eval("(lambda (x) x)");
    let g = eval("(lambda (x) x)");
    assert_eq!(f, f.clone());
    assert_ne!(f, g);
}

#[test]
fn ptr_eq_distinguishes_equal_lists() {
    let a = ints(&[1, 2]);
    let b = ints(&[1, 2]);
    assert!(a.ptr_eq(&a.clone()));
    assert!(!a.ptr_eq(&b));
    assert!(Value::int(3).ptr_eq(&Value::int(3)));
}

#[test]
fn debug_renders_s_expressions() {
    assert_eq!(format!("{:?}", read("(a (b 1) \"s\" #t #f)")), "(a (b 1) \"s\" #t #f)");
    assert_eq!(format!("{:?}", Value::Nil), "()");
    assert_eq!(format!("{:?}", Value::Blank), "_");
    assert_eq!(format!("{:?}", Value::float(2.5)), "2.5");
    assert_eq!(
        format!("{:?}", Value::improper_list([Value::int(1), Value::int(2)], Value::int(3))),
        "(1 2 . 3)"
    );
}

#[test]
fn debug_names_callables() {
    assert_eq!(format!("{:?}", eval("(lambda (x) x)")), "#<closure>");
    assert_eq!(format!("{:?}", eval("(begin (define (f x) x) f)")), "#<closure f>");
    let native = Value::native("id", Arity::exact(1), |args| Ok(args[0].clone()));
    assert_eq!(format!("{native:?}"), "#<native id>");
}

#[test]
fn to_vec_rejects_improper_lists() {
    assert_eq!(read("(1 2)").to_vec(), Some(vec![Value::int(1), Value::int(2)]));
    assert_eq!(Value::Nil.to_vec(), Some(Vec::new()));
    assert_eq!(read("(1 . 2)").to_vec(), None);
    assert_eq!(Value::int(1).to_vec(), None);
}

#[test]
fn iteration_reports_the_tail() {
    let pair = read("(1 2 . 3)");
    let mut iter = pair.iter();
    assert_eq!(iter.by_ref().count(), 2);
    assert_eq!(iter.tail(), &Value::int(3));
    assert!(!pair.is_list());
    assert!(Value::Nil.is_list());
}

#[test]
fn truthiness() {
    assert!(!Value::Nil.is_truthy());
    assert!(!Value::bool(false).is_truthy());
    assert!(Value::int(0).is_truthy());
    assert!(Value::string("").is_truthy());
    assert!(ints(&[]).is_nil());
}

#[test]
fn builtin_types() {
    assert_eq!(Value::Nil.type_of(), TypeId::NIL);
    assert_eq!(Value::int(1).type_of(), TypeId::INT);
    assert_eq!(Value::float(1.0).type_of(), TypeId::FLOAT);
    assert_eq!(read("(1)").type_of(), TypeId::CONS);
    assert_eq!(Value::Blank.type_of(), TypeId::BLANK);
    assert_eq!(eval("car").type_of(), TypeId::NATIVE);
    assert_eq!(eval("+").type_of(), TypeId::MULTIMETHOD);
    assert_eq!(eval("(lambda () 1)").type_name(), "closure");
}

#[test]
fn reference_cells_alias() {
    let r = Value::reference(TypeId::INT, Value::int(1));
    let alias = r.clone();
    assert!(r.ptr_eq(&alias));
    let Value::Ref(cell) = &r else {
        panic!("expected a reference");
    };
    *cell.cell.borrow_mut() = Value::int(2);
    assert_eq!(format!("{alias:?}"), "#<ref 2>");
}

#[test]
fn nested_reference_cells_drop() {
    let mut cell = Value::Nil;
    for _ in 0..100_000 {
        cell = Value::reference(TypeId::INT, cell);
    }
    drop(cell);
}

#[test]
fn list_of_nested_lists_drops() {
    let mut nested = Value::Nil;
    for i in 0..100_000 {
        nested = Value::list([nested, Value::int(i)]);
    }
    drop(nested);
}
