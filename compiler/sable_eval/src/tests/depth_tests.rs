//! Programs nested far deeper than the native stack would allow a
//! recursive evaluator to go.

use pretty_assertions::assert_eq;

use super::{eval, read};
use crate::{Evaluator, Value};

const DEPTH: usize = 5_000;

fn sym(text: &str) -> Value {
    Value::symbol(text)
}

/// `(+ 1 (+ 1 ... 0))`
fn nested_sums(depth: usize) -> Value {
    (0..depth).fold(Value::int(0), |inner, _| {
        Value::list([sym("+"), Value::int(1), inner])
    })
}

/// `(let ((x (+ x 1))) (let ((x (+ x 1))) ... x))` inside `(let ((x 0)) ...)`.
fn nested_lets(depth: usize) -> Value {
    let body = (0..depth).fold(sym("x"), |inner, _| {
        let step = Value::list([sym("+"), sym("x"), Value::int(1)]);
        Value::list([sym("let"), Value::list([Value::list([sym("x"), step])]), inner])
    });
    Value::list([
        sym("let"),
        Value::list([Value::list([sym("x"), Value::int(0)])]),
        body,
    ])
}

/// `(begin (begin ... 7))`
fn nested_begins(depth: usize) -> Value {
    (0..depth).fold(Value::int(7), |inner, _| Value::list([sym("begin"), inner]))
}

fn run(expr: &Value, compile: bool) -> Value {
    let mut evaluator = Evaluator::builder().compile(compile).build().unwrap();
    evaluator.evaluate_global(expr).unwrap()
}

#[test]
fn deeply_nested_arguments() {
    assert_eq!(run(&nested_sums(DEPTH), false), Value::int(5_000));
}

#[test]
fn deeply_nested_lets() {
    assert_eq!(run(&nested_lets(DEPTH), false), Value::int(5_000));
}

#[test]
fn deeply_nested_begins() {
    assert_eq!(run(&nested_begins(DEPTH), false), Value::int(7));
}

#[test]
fn deep_nesting_survives_the_compile_pass() {
    assert_eq!(run(&nested_sums(DEPTH), true), Value::int(5_000));
    assert_eq!(run(&nested_lets(DEPTH), true), Value::int(5_000));
}

#[test]
fn non_tail_recursion() {
    let program = read(
        "(begin
           (define (count n) (if (= n 0) 0 (+ 1 (count (- n 1)))))
           (count 10000))",
    );
    assert_eq!(run(&program, false), Value::int(10_000));
}

#[test]
fn building_a_long_list_recursively() {
    let program = read(
        "(begin
           (define (range n acc) (if (= n 0) acc (range (- n 1) (cons n acc))))
           (range 20000 (list)))",
    );
    let list = run(&program, false);
    assert_eq!(list.iter().count(), 20_000);
    assert_eq!(list.iter().next(), Some(&Value::int(1)));
}

#[test]
fn long_lists_drop_without_recursion() {
    let list = Value::list((0..200_000).map(Value::int));
    assert_eq!(list.iter().count(), 200_000);
    drop(list);
}

#[test]
fn deeply_nested_pairs_compare_and_drop() {
    let a = nested_sums(50_000);
    let b = nested_sums(50_000);
    assert!(a == b);
    drop(a);
    drop(b);
}

#[test]
fn deep_frame_chains_drop() {
    let mut frame = crate::Frame::root();
    for i in 0..100_000 {
        frame = frame.child();
        frame.define(sable_ir::intern("i"), Value::int(i));
    }
    assert_eq!(frame.lookup(sable_ir::intern("i")).unwrap(), Value::int(99_999));
    drop(frame);
}

#[test]
fn recursion_through_higher_order_calls() {
    assert_eq!(
        eval(
            "(begin
               (define (twice f x) (f (f x)))
               (define (climb n) (if (= n 0) 0 (+ 1 (twice (lambda (y) y) (climb (- n 1))))))
               (climb 3000))"
        ),
        Value::int(3_000)
    );
}

/// Each closure captures the frame binding the previous one.
const CLOSURE_CHAIN: &str = "(let loop ((n 100000) (acc 0))
   (if (= n 0) acc (loop (- n 1) (let ((prev acc)) (lambda () prev)))))";

#[test]
fn overwriting_a_long_closure_chain_releases_it() {
    let mut evaluator = Evaluator::new().unwrap();
    let define = read(&format!("(define chain {CLOSURE_CHAIN})"));
    assert!(matches!(evaluator.evaluate_global(&define).unwrap(), Value::Closure(_)));
    assert_eq!(evaluator.evaluate_global(&read("(define chain 0)")).unwrap(), Value::int(0));
}

#[test]
fn dropping_a_long_closure_chain_while_the_evaluator_lives() {
    let mut evaluator = Evaluator::new().unwrap();
    let chain = evaluator.evaluate_global(&read(CLOSURE_CHAIN)).unwrap();
    assert!(matches!(chain, Value::Closure(_)));
    drop(chain);
    assert_eq!(evaluator.evaluate_global(&read("(+ 1 2)")).unwrap(), Value::int(3));
}

#[test]
fn long_chains_of_captured_continuations_drop() {
    let mut evaluator = Evaluator::new().unwrap();
    let program = read(
        "(let loop ((n 20000) (acc 0))
           (if (= n 0) acc (loop (- n 1) (let ((prev acc)) (callcc (lambda (k) k))))))",
    );
    let chain = evaluator.evaluate_global(&program).unwrap();
    assert!(matches!(chain, Value::Continuation(_)));
    drop(chain);
}
