use pretty_assertions::assert_eq;
use sable_ir::intern;
use sable_types::Arity;

use super::{eval, eval_err, ints, read};
use crate::{ClosureKind, EvalErrorKind, EvalResult, Evaluator, Value};

fn add(args: &[Value]) -> EvalResult {
    match args {
        [Value::Int(a), Value::Int(b)] => Ok(Value::int(a + b)),
        _ => Err(crate::wrong_type("int", "other")),
    }
}

#[test]
fn blank_yields_partial_closure() {
    let mut evaluator = Evaluator::builder()
        .native("add", Arity::exact(2), add)
        .build()
        .unwrap();
    let add = evaluator.global().lookup(intern("add")).unwrap();

    let partial = evaluator.apply(&add, vec![Value::Blank, Value::int(5)]).unwrap();
    let Value::Closure(closure) = &partial else {
        panic!("expected a closure, got {partial:?}");
    };
    assert_eq!(closure.kind(), ClosureKind::Partial);
    assert_eq!(closure.arity(), Arity::exact(1));

    assert_eq!(evaluator.apply(&partial, vec![Value::int(3)]).unwrap(), Value::int(8));
}

#[test]
fn blank_symbol_in_source() {
    assert_eq!(eval("((+ _ 5) 3)"), Value::int(8));
    assert_eq!(eval("((- _ 5) 3)"), Value::int(-2));
    assert_eq!(eval("((- 5 _) 3)"), Value::int(2));
}

#[test]
fn blanks_are_resolved_before_currying() {
    assert_eq!(eval("(- _ 5 3)"), Value::int(-2));
}

#[test]
fn too_few_arguments_yield_a_partial() {
    assert_eq!(eval("((- 10) 4)"), Value::int(6));
    assert_eq!(eval("(((lambda (a b c) (- (- a b) c))) 10 2 3)"), Value::int(5));
}

#[test]
fn surplus_arguments_curry_onto_the_result() {
    assert_eq!(eval("((lambda (x) (lambda (y) (+ x y))) 1 2)"), Value::int(3));
}

#[test]
fn surplus_applied_to_a_non_callable_is_wrong_type() {
    assert_eq!(
        eval_err("(+ 1 2 3)"),
        EvalErrorKind::WrongType {
            expected: "callable".to_string(),
            got: "int".to_string()
        }
    );
}

#[test]
fn several_blanks_fill_in_order() {
    let src = "(begin
        (define f (lambda (a b c) (- (- a b) c)))
        ((f _ 2 _) 1 3))";
    assert_eq!(eval(src), Value::int(-4));
}

#[test]
fn partial_of_a_partial() {
    assert_eq!(eval("(((- _ _) 10) 4)"), Value::int(6));
}

#[test]
fn blank_past_max_is_forwarded_to_the_result() {
    let mut evaluator = Evaluator::new().unwrap();
    let partial = evaluator
        .evaluate_global(&read("((lambda (x) (lambda (y) (+ x y))) 1 _)"))
        .unwrap();
    let Value::Closure(closure) = &partial else {
        panic!("expected a closure, got {partial:?}");
    };
    assert_eq!(closure.kind(), ClosureKind::Partial);
    assert_eq!(evaluator.apply(&partial, vec![Value::int(7)]).unwrap(), Value::int(8));
}

#[test]
fn supplied_arguments_are_not_reevaluated() {
    let src = "(begin
        (define second (lambda (a b) b))
        ((second _ (list unbound-symbol)) 1))";
    assert_eq!(eval(src), Value::list([Value::symbol("unbound-symbol")]));
}

#[test]
fn rest_parameters_absorb_surplus() {
    assert_eq!(eval("((lambda (a . more) more) 1 2 3)"), ints(&[2, 3]));
    assert_eq!(eval("((lambda args args) 1 2 3)"), ints(&[1, 2, 3]));
}

#[test]
fn partial_closures_do_not_capture_the_call_site() {
    // The partial's body only sees its own bindings, so a later global
    // `define` of the same name cannot change it.
    let src = "(begin
        (define x 100)
        (define p (- x _))
        (define x 0)
        (p 1))";
    assert_eq!(eval(src), Value::int(99));
}

#[test]
fn blank_in_operator_position_is_not_callable() {
    let expected = EvalErrorKind::WrongType {
        expected: "callable".to_string(),
        got: "blank".to_string(),
    };
    assert_eq!(eval_err("(_ 1 2)"), expected);

    let mut evaluator = Evaluator::builder().compile(true).build().unwrap();
    let err = evaluator.evaluate_global(&read("(_ 1)")).unwrap_err();
    assert_eq!(err.kind, expected);
}
