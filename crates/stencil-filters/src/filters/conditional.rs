// SPDX-License-Identifier: Apache-2.0 OR MIT
use stencil_engine::{Error, FilterRegistryBuilder, RenderContext, Value};

pub fn register(builder: &mut FilterRegistryBuilder) {
    builder
        .register_unknown_aware("if", 2, keep_if)
        .alias("when", "if")
        .register_unknown_aware("ifNot", 2, keep_if_not)
        .alias("unless", "ifNot")
        .register_unknown_aware("otherwise", 2, otherwise)
        .alias("else", "otherwise")
        .register("truthy", 2, truthy)
        .register("falsy", 2, falsy)
        .register_unknown_aware("ifTruthy", 2, truthy)
        .register_unknown_aware("ifFalsey", 2, falsy);
}

// The conditional pair keeps or suppresses the subject. Suppression yields
// Unresolved; because these filters are unknown-aware, the invoker counts
// the chain as handled and a suppressed placeholder renders empty instead of
// passing its source through.
pub fn keep_if(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    if args[1].is_truthy() {
        Ok(args[0].clone())
    } else {
        Ok(Value::Unresolved)
    }
}

pub fn keep_if_not(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    if args[1].is_truthy() {
        Ok(Value::Unresolved)
    } else {
        Ok(args[0].clone())
    }
}

/// Fallback: the alternative when the subject is Unresolved or null, the
/// subject itself otherwise.
pub fn otherwise(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    if args[0].is_unresolved() || args[0].is_null() {
        Ok(args[1].clone())
    } else {
        Ok(args[0].clone())
    }
}

pub fn truthy(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    keep_if(_ctx, args)
}

pub fn falsy(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    keep_if_not(_ctx, args)
}
