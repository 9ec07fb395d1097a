//! Standard native functions.
//!
//! Arithmetic operators are multimethods with an `INT × INT` candidate
//! (exact, checked) and a `NUMBER × NUMBER` candidate (floating point), so
//! mixed arguments promote to floats and integer arithmetic stays exact.

use std::cmp::Ordering;

use sable_ir::intern;
use sable_types::{Arity, Signature, TypeId};

use crate::environment::Frame;
use crate::errors::{
    arity_mismatch, division_by_zero, integer_overflow, wrong_type, EvalResult,
};
use crate::multimethod::define_method;
use crate::value::NativeFnPtr;
use crate::Value;

/// Bind the standard natives in `frame`.
pub fn install(frame: &Frame) -> EvalResult<()> {
    let ints = Signature::of(&[TypeId::INT, TypeId::INT]);
    let numbers = Signature::of(&[TypeId::NUMBER, TypeId::NUMBER]);
    let arithmetic: [(&str, NativeFnPtr, NativeFnPtr); 4] = [
        ("+", int_add, float_add),
        ("-", int_sub, float_sub),
        ("*", int_mul, float_mul),
        ("/", int_div, float_div),
    ];
    for (name, on_ints, on_numbers) in arithmetic {
        let binary = Arity::exact(2);
        define_method(
            frame,
            intern(name),
            ints.clone(),
            Value::native(&format!("int{name}"), binary, on_ints),
        )?;
        define_method(
            frame,
            intern(name),
            numbers.clone(),
            Value::native(&format!("number{name}"), binary, on_numbers),
        )?;
    }

    let plain: [(&str, Arity, NativeFnPtr); 11] = [
        ("<", Arity::exact(2), less),
        (">", Arity::exact(2), greater),
        ("<=", Arity::exact(2), less_equal),
        (">=", Arity::exact(2), greater_equal),
        ("=", Arity::exact(2), equal),
        ("eq?", Arity::exact(2), identical),
        ("not", Arity::exact(1), not),
        ("cons", Arity::exact(2), cons),
        ("car", Arity::exact(1), car),
        ("cdr", Arity::exact(1), cdr),
        ("null?", Arity::exact(1), null),
    ];
    for (name, arity, func) in plain {
        frame.define(intern(name), Value::native(name, arity, func));
    }
    Ok(())
}

fn unary<'a>(name: &str, args: &'a [Value]) -> EvalResult<&'a Value> {
    match args {
        [a] => Ok(a),
        _ => Err(arity_mismatch(name, "1", args.len())),
    }
}

fn binary<'a>(name: &str, args: &'a [Value]) -> EvalResult<(&'a Value, &'a Value)> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(arity_mismatch(name, "2", args.len())),
    }
}

fn ints(name: &str, args: &[Value]) -> EvalResult<(i64, i64)> {
    match binary(name, args)? {
        (Value::Int(a), Value::Int(b)) => Ok((*a, *b)),
        (Value::Int(_), other) | (other, _) => Err(wrong_type("int", other.type_name())),
    }
}

#[expect(clippy::cast_precision_loss, reason = "mixed arithmetic promotes to float")]
fn as_float(value: &Value) -> EvalResult<f64> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        other => Err(wrong_type("number", other.type_name())),
    }
}

fn floats(name: &str, args: &[Value]) -> EvalResult<(f64, f64)> {
    let (a, b) = binary(name, args)?;
    Ok((as_float(a)?, as_float(b)?))
}

// Arithmetic

fn int_add(args: &[Value]) -> EvalResult {
    let (a, b) = ints("+", args)?;
    a.checked_add(b).map(Value::Int).ok_or_else(|| integer_overflow("+"))
}

fn int_sub(args: &[Value]) -> EvalResult {
    let (a, b) = ints("-", args)?;
    a.checked_sub(b).map(Value::Int).ok_or_else(|| integer_overflow("-"))
}

fn int_mul(args: &[Value]) -> EvalResult {
    let (a, b) = ints("*", args)?;
    a.checked_mul(b).map(Value::Int).ok_or_else(|| integer_overflow("*"))
}

fn int_div(args: &[Value]) -> EvalResult {
    let (a, b) = ints("/", args)?;
    if b == 0 {
        return Err(division_by_zero());
    }
    a.checked_div(b).map(Value::Int).ok_or_else(|| integer_overflow("/"))
}

fn float_add(args: &[Value]) -> EvalResult {
    let (a, b) = floats("+", args)?;
    Ok(Value::Float(a + b))
}

fn float_sub(args: &[Value]) -> EvalResult {
    let (a, b) = floats("-", args)?;
    Ok(Value::Float(a - b))
}

fn float_mul(args: &[Value]) -> EvalResult {
    let (a, b) = floats("*", args)?;
    Ok(Value::Float(a * b))
}

fn float_div(args: &[Value]) -> EvalResult {
    let (a, b) = floats("/", args)?;
    Ok(Value::Float(a / b))
}

// Comparison

fn compare(name: &str, args: &[Value]) -> EvalResult<Option<Ordering>> {
    match binary(name, args)? {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (a, b) => Ok(as_float(a)?.partial_cmp(&as_float(b)?)),
    }
}

fn less(args: &[Value]) -> EvalResult {
    Ok(Value::Bool(compare("<", args)? == Some(Ordering::Less)))
}

fn greater(args: &[Value]) -> EvalResult {
    Ok(Value::Bool(compare(">", args)? == Some(Ordering::Greater)))
}

fn less_equal(args: &[Value]) -> EvalResult {
    let ordering = compare("<=", args)?;
    Ok(Value::Bool(matches!(ordering, Some(Ordering::Less | Ordering::Equal))))
}

fn greater_equal(args: &[Value]) -> EvalResult {
    let ordering = compare(">=", args)?;
    Ok(Value::Bool(matches!(ordering, Some(Ordering::Greater | Ordering::Equal))))
}

/// Structural equality; numbers compare by value across int and float.
fn equal(args: &[Value]) -> EvalResult {
    let equal = match binary("=", args)? {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            compare("=", args)? == Some(Ordering::Equal)
        }
        (a, b) => a == b,
    };
    Ok(Value::Bool(equal))
}

fn identical(args: &[Value]) -> EvalResult {
    let (a, b) = binary("eq?", args)?;
    Ok(Value::Bool(a.ptr_eq(b)))
}

fn not(args: &[Value]) -> EvalResult {
    Ok(Value::Bool(!unary("not", args)?.is_truthy()))
}

// Pairs

fn cons(args: &[Value]) -> EvalResult {
    let (car, cdr) = binary("cons", args)?;
    Ok(Value::cons(car.clone(), cdr.clone()))
}

fn car(args: &[Value]) -> EvalResult {
    let pair = unary("car", args)?;
    match pair.uncons() {
        Some((car, _)) => Ok(car.clone()),
        None => Err(wrong_type("cons", pair.type_name())),
    }
}

fn cdr(args: &[Value]) -> EvalResult {
    let pair = unary("cdr", args)?;
    match pair.uncons() {
        Some((_, cdr)) => Ok(cdr.clone()),
        None => Err(wrong_type("cons", pair.type_name())),
    }
}

fn null(args: &[Value]) -> EvalResult {
    Ok(Value::Bool(unary("null?", args)?.is_nil()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn integer_arithmetic_is_checked() {
        assert_eq!(int_add(&[Value::int(2), Value::int(3)]), Ok(Value::int(5)));
        assert_eq!(
            int_add(&[Value::int(i64::MAX), Value::int(1)]).map_err(|e| e.kind),
            Err(crate::EvalErrorKind::IntegerOverflow {
                operation: "+".to_string()
            })
        );
        assert_eq!(
            int_div(&[Value::int(1), Value::int(0)]).map_err(|e| e.kind),
            Err(crate::EvalErrorKind::DivisionByZero)
        );
        assert_eq!(int_div(&[Value::int(7), Value::int(2)]), Ok(Value::int(3)));
    }

    #[test]
    fn float_arithmetic_promotes() {
        assert_eq!(float_add(&[Value::int(1), Value::float(0.5)]), Ok(Value::float(1.5)));
        assert_eq!(float_div(&[Value::int(1), Value::int(4)]), Ok(Value::float(0.25)));
    }

    #[test]
    fn comparisons_mix_ints_and_floats() {
        assert_eq!(less(&[Value::int(1), Value::float(1.5)]), Ok(Value::bool(true)));
        assert_eq!(greater_equal(&[Value::int(2), Value::int(2)]), Ok(Value::bool(true)));
        assert_eq!(equal(&[Value::int(2), Value::float(2.0)]), Ok(Value::bool(true)));
        assert_eq!(equal(&[Value::symbol("a"), Value::symbol("a")]), Ok(Value::bool(true)));
    }

    #[test]
    fn pair_accessors_reject_atoms() {
        let pair = cons(&[Value::int(1), Value::int(2)]).unwrap_or_default();
        assert_eq!(car(&[pair.clone()]), Ok(Value::int(1)));
        assert_eq!(cdr(&[pair]), Ok(Value::int(2)));
        assert_eq!(
            car(&[Value::int(1)]).map_err(|e| e.kind),
            Err(crate::EvalErrorKind::WrongType {
                expected: "cons".to_string(),
                got: "int".to_string()
            })
        );
        assert_eq!(null(&[Value::Nil]), Ok(Value::bool(true)));
    }

    #[test]
    fn identity_differs_from_equality() {
        let a = Value::list([Value::int(1)]);
        let b = Value::list([Value::int(1)]);
        assert_eq!(equal(&[a.clone(), b.clone()]), Ok(Value::bool(true)));
        assert_eq!(identical(&[a.clone(), b]), Ok(Value::bool(false)));
        assert_eq!(identical(&[a.clone(), a]), Ok(Value::bool(true)));
    }
}
