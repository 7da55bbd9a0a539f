// SPDX-License-Identifier: Apache-2.0 OR MIT
use stencil_engine::{Error, FilterRegistryBuilder, RenderContext, Value};

use super::{expect_integer, expect_number, expect_string};

pub fn register(builder: &mut FilterRegistryBuilder) {
    builder
        .register("add", 2, add)
        .register("sub", 2, sub)
        .alias("subtract", "sub")
        .register("mul", 2, mul)
        .alias("multiply", "mul")
        .register("div", 2, div)
        .alias("divide", "div")
        .register("incr", 1, incr)
        .register("incrBy", 2, incr_by)
        .register("decr", 1, decr)
        .register("decrBy", 2, decr_by);
}

// Integer operands stay integral through add/sub/mul so counters render
// without a decimal point. Division always goes through f64; evenly
// divisible results still print as integers because float stringification
// drops the trailing fraction.
fn binary_numeric(
    name: &'static str,
    args: &[Value],
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, Error> {
    if let (Value::Integer(a), Value::Integer(b)) = (&args[0], &args[1]) {
        if let Some(result) = int_op(*a, *b) {
            return Ok(Value::Integer(result));
        }
    }
    let a = expect_number(name, &args[0], 1)?;
    let b = expect_number(name, &args[1], 2)?;
    Ok(Value::Float(float_op(a, b)))
}

pub fn add(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    // Non-numeric strings concatenate; everything else is numeric addition.
    let both_numeric = args[0].coerce_number().is_some() && args[1].coerce_number().is_some();
    if !both_numeric && (args[0].as_str().is_some() || args[1].as_str().is_some()) {
        let left = expect_string("add", &args[0], 1)?;
        let right = expect_string("add", &args[1], 2)?;
        return Ok(Value::String(format!("{left}{right}")));
    }
    binary_numeric("add", args, |a, b| a.checked_add(b), |a, b| a + b)
}

pub fn sub(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    binary_numeric("sub", args, |a, b| a.checked_sub(b), |a, b| a - b)
}

pub fn mul(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    binary_numeric("mul", args, |a, b| a.checked_mul(b), |a, b| a * b)
}

pub fn div(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let a = expect_number("div", &args[0], 1)?;
    let b = expect_number("div", &args[1], 2)?;
    if b == 0.0 {
        return Err(Error::filter("div", "division by zero"));
    }
    Ok(Value::Float(a / b))
}

pub fn incr(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Integer(expect_integer("incr", &args[0], 1)? + 1))
}

pub fn incr_by(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let n = expect_integer("incrBy", &args[1], 2)?;
    Ok(Value::Integer(expect_integer("incrBy", &args[0], 1)? + n))
}

pub fn decr(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Integer(expect_integer("decr", &args[0], 1)? - 1))
}

pub fn decr_by(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let n = expect_integer("decrBy", &args[1], 2)?;
    Ok(Value::Integer(expect_integer("decrBy", &args[0], 1)? - n))
}
