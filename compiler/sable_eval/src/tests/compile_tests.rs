use pretty_assertions::assert_eq;
use sable_ir::intern;

use super::read;
use crate::{Evaluator, Frame, LocalRef, Value};

/// Evaluate `src` with and without the compile pass.
fn both_ways(src: &str) -> (Value, Value) {
    let mut plain = Evaluator::new().unwrap();
    let mut compiled = Evaluator::builder().compile(true).build().unwrap();
    let expr = read(src);
    (
        plain.evaluate_global(&expr).unwrap(),
        compiled.evaluate_global(&expr).unwrap(),
    )
}

fn local(value: &Value) -> &LocalRef {
    match value {
        Value::Local(local) => local,
        other => panic!("expected a compiled reference, got {other:?}"),
    }
}

#[test]
fn compiled_programs_agree_with_name_lookup() {
    let programs = [
        "(let ((x 1)) (+ (let ((x 10)) x) x))",
        "(begin (define make (lambda (n) (lambda (x) (+ x n)))) ((make 5) 10))",
        "(begin (define (fact n) (if (< n 2) 1 (* n (fact (- n 1))))) (fact 12))",
        "(let loop ((i 0) (acc 1)) (if (< i 10) (loop (+ i 1) (* acc 2)) acc))",
        "((lambda (a . rest) (cons a rest)) 1 2 3)",
        "(begin (define f (lambda (x) (define y (* x 2)) (+ x y))) (f 4))",
        "((- _ 5) 3)",
        "(+ 1 (callcc (lambda (k) (+ 10 (k 5)))))",
    ];
    for src in programs {
        let (plain, compiled) = both_ways(src);
        assert_eq!(plain, compiled, "{src}");
    }
}

#[test]
fn lambda_parameters_become_slots() {
    let evaluator = Evaluator::new().unwrap();
    let compiled = evaluator.compile(&read("(lambda (x y) y)"), &Frame::root());
    let items = compiled.to_vec().unwrap();
    assert_eq!(items[0], Value::symbol("lambda"));
    assert_eq!(
        local(&items[2]),
        &LocalRef {
            name: intern("y"),
            depth: 0,
            slot: 1,
            epoch: evaluator.epoch(),
        }
    );
}

#[test]
fn enclosing_frames_are_counted_in_depth() {
    let evaluator = Evaluator::new().unwrap();
    let outer = Frame::root();
    outer.define(intern("a"), Value::int(1));
    outer.define(intern("b"), Value::int(2));
    let inner = outer.child();

    let compiled = evaluator.compile(&read("b"), &inner);
    let reference = local(&compiled);
    assert_eq!((reference.depth, reference.slot), (1, 1));
}

#[test]
fn unresolved_symbols_and_quoted_lists_are_untouched() {
    let evaluator = Evaluator::new().unwrap();
    let env = Frame::root();
    assert_eq!(evaluator.compile(&read("mystery"), &env), Value::symbol("mystery"));
    env.define(intern("a"), Value::int(1));
    assert_eq!(evaluator.compile(&read("(list a)"), &env), read("(list a)"));
}

#[test]
fn stale_references_fall_back_to_lookup() {
    let mut evaluator = Evaluator::new().unwrap();
    let outer = evaluator.global().child();
    outer.define(intern("x"), Value::int(1));
    let inner = outer.child();

    let compiled = evaluator.compile(&read("x"), &inner);
    assert_eq!(local(&compiled).depth, 1);
    assert_eq!(evaluator.evaluate(&compiled, &inner).unwrap(), Value::int(1));

    // A nearer binding appears; the compiled reference must not skip it.
    evaluator.evaluate(&read("(define x 2)"), &inner).unwrap();
    assert_eq!(evaluator.evaluate(&compiled, &inner).unwrap(), Value::int(2));
}

#[test]
fn slot_names_are_checked() {
    let mut evaluator = Evaluator::new().unwrap();
    let env = Frame::root();
    env.define(intern("x"), Value::int(1));
    let compiled = evaluator.compile(&read("x"), &env);

    // Same epoch, different frame layout: the name guard catches it.
    let other = Frame::root();
    other.define(intern("y"), Value::int(5));
    other.define(intern("x"), Value::int(7));
    assert_eq!(evaluator.evaluate(&compiled, &other).unwrap(), Value::int(7));
}
