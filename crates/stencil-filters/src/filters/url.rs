// SPDX-License-Identifier: Apache-2.0 OR MIT
use stencil_engine::{Error, FilterRegistryBuilder, RenderContext, Value};

use super::expect_string;

pub fn register(builder: &mut FilterRegistryBuilder) {
    builder
        .register("addQueryString", 2, add_query_string)
        .register("addHashParams", 2, add_hash_params);
}

/// Appends url-encoded `k=v` pairs after `?`, reusing an existing `?` with
/// `&` separators.
pub fn add_query_string(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    append_params("addQueryString", args, '?')
}

/// Appends url-encoded `k=v` pairs after `#`.
pub fn add_hash_params(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    append_params("addHashParams", args, '#')
}

fn append_params(name: &'static str, args: &[Value], separator: char) -> Result<Value, Error> {
    let mut url = expect_string(name, &args[0], 1)?;
    let Value::Object(params) = &args[1] else {
        return Err(Error::filter(
            name,
            format!("argument 2 must be an object, got {}", args[1].type_name()),
        ));
    };

    for (key, value) in params {
        if url.contains(separator) {
            url.push('&');
        } else {
            url.push(separator);
        }
        url.push_str(&encode(key));
        url.push('=');
        url.push_str(&encode(&value.stringify()));
    }
    Ok(Value::String(url))
}

fn encode(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for b in input.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                output.push(b as char)
            }
            b' ' => output.push('+'),
            _ => {
                output.push('%');
                output.push_str(&format!("{b:02X}"));
            }
        }
    }
    output
}
