// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::cmp::Ordering;

use stencil_engine::{Error, FilterRegistryBuilder, RenderContext, Value};

pub fn register(builder: &mut FilterRegistryBuilder) {
    builder
        .register("greaterThan", 2, greater_than)
        .alias("gt", "greaterThan")
        .register("greaterThanEqual", 2, greater_than_equal)
        .alias("gte", "greaterThanEqual")
        .register("lessThan", 2, less_than)
        .alias("lt", "lessThan")
        .register("lessThanEqual", 2, less_than_equal)
        .alias("lte", "lessThanEqual")
        .register("equals", 2, equals)
        .alias("eq", "equals")
        .register("notEquals", 2, not_equals)
        .alias("not", "notEquals")
        .register_unknown_aware("and", 2, and)
        .register_unknown_aware("or", 2, or);
}

/// Common-type comparison: numbers compare arithmetically, timestamps
/// chronologically, strings lexicographically. A string against a timestamp
/// is parsed as a date; anything else compares by stringified form.
fn compare(left: &Value, right: &Value) -> Ordering {
    if let (Some(a), Some(b)) = (numeric(left), numeric(right)) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    if matches!(left, Value::Timestamp(_)) || matches!(right, Value::Timestamp(_)) {
        if let (Some(a), Some(b)) = (left.coerce_timestamp(), right.coerce_timestamp()) {
            return a.cmp(&b);
        }
    }
    left.stringify().cmp(&right.stringify())
}

// Strings never take the arithmetic branch; only genuinely numeric values
// do.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

pub fn greater_than(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(compare(&args[0], &args[1]) == Ordering::Greater))
}

pub fn greater_than_equal(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(compare(&args[0], &args[1]) != Ordering::Less))
}

pub fn less_than(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(compare(&args[0], &args[1]) == Ordering::Less))
}

pub fn less_than_equal(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(compare(&args[0], &args[1]) != Ordering::Greater))
}

pub fn equals(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(args[0] == args[1] || compare(&args[0], &args[1]) == Ordering::Equal))
}

pub fn not_equals(ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    equals(ctx, args).map(|v| Value::Bool(!v.is_truthy()))
}

// `and`/`or` return the deciding value, not a squashed boolean, so chains
// like `or(name, 'anonymous')` keep working. Unresolved inputs count as
// falsy rather than poisoning the pipeline.
pub fn and(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    if args[0].is_truthy() {
        Ok(args[1].clone())
    } else {
        Ok(args[0].clone())
    }
}

pub fn or(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    if args[0].is_truthy() {
        Ok(args[0].clone())
    } else {
        Ok(args[1].clone())
    }
}
