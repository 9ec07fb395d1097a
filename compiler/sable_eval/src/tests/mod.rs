//! Evaluator tests. Programs are written as S-expressions and turned into
//! values by a small reader that only exists for tests.

mod apply_tests;
mod compile_tests;
mod depth_tests;

use crate::{EvalErrorKind, Evaluator, Value};

/// Read one S-expression. Supports integers, floats, strings, `#t`/`#f`,
/// symbols, lists and dotted pairs.
pub(crate) fn read(src: &str) -> Value {
    let tokens = tokenize(src);
    let mut pos = 0;
    let value = parse(&tokens, &mut pos);
    assert_eq!(pos, tokens.len(), "trailing input in {src:?}");
    value
}

fn tokenize(src: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = src.chars();
    while let Some(c) = chars.next() {
        match c {
            '(' | ')' => {
                flush(&mut current, &mut tokens);
                tokens.push(c.to_string());
            }
            '"' => {
                flush(&mut current, &mut tokens);
                let mut text = String::from('"');
                for c in chars.by_ref() {
                    text.push(c);
                    if c == '"' {
                        break;
                    }
                }
                tokens.push(text);
            }
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

fn parse(tokens: &[String], pos: &mut usize) -> Value {
    let token = tokens[*pos].as_str();
    *pos += 1;
    match token {
        "(" => {
            let mut items = Vec::new();
            let mut tail = Value::Nil;
            loop {
                match tokens[*pos].as_str() {
                    ")" => {
                        *pos += 1;
                        break;
                    }
                    "." => {
                        *pos += 1;
                        tail = parse(tokens, pos);
                        assert_eq!(tokens[*pos], ")");
                        *pos += 1;
                        break;
                    }
                    _ => items.push(parse(tokens, pos)),
                }
            }
            Value::improper_list(items, tail)
        }
        "#t" => Value::bool(true),
        "#f" => Value::bool(false),
        text if text.starts_with('"') => Value::string(&text[1..text.len() - 1]),
        text => {
            if let Ok(n) = text.parse::<i64>() {
                Value::int(n)
            } else if text.contains('.') && text.parse::<f64>().is_ok() {
                Value::float(text.parse().unwrap())
            } else {
                Value::symbol(text)
            }
        }
    }
}

/// Evaluate `src` under the global frame of a fresh evaluator.
pub(crate) fn eval(src: &str) -> Value {
    let mut evaluator = Evaluator::new().unwrap();
    evaluator.evaluate_global(&read(src)).unwrap()
}

/// Error kind of evaluating `src` under a fresh evaluator.
pub(crate) fn eval_err(src: &str) -> EvalErrorKind {
    let mut evaluator = Evaluator::new().unwrap();
    match evaluator.evaluate_global(&read(src)) {
        Ok(value) => panic!("expected an error from {src}, got {value:?}"),
        Err(err) => err.kind,
    }
}

pub(crate) fn ints(items: &[i64]) -> Value {
    Value::list(items.iter().copied().map(Value::int))
}

#[test]
fn reader_handles_atoms_and_pairs() {
    assert_eq!(read("42"), Value::int(42));
    assert_eq!(read("-7"), Value::int(-7));
    assert_eq!(read("2.5"), Value::float(2.5));
    assert_eq!(read("\"hi there\""), Value::string("hi there"));
    assert_eq!(read("-"), Value::symbol("-"));
    assert_eq!(read("(1 2)"), ints(&[1, 2]));
    assert_eq!(
        read("(a . b)"),
        Value::cons(Value::symbol("a"), Value::symbol("b"))
    );
}
