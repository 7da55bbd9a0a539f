// SPDX-License-Identifier: Apache-2.0 OR MIT
use heck::{ToLowerCamelCase, ToTitleCase, ToUpperCamelCase};
use stencil_engine::{Error, FilterRegistryBuilder, RenderContext, Value};

use super::{expect_string, expect_usize};

pub fn register(builder: &mut FilterRegistryBuilder) {
    builder
        .register("lower", 1, lower)
        .register("upper", 1, upper)
        .register("titleCase", 1, title_case)
        .register("humanize", 1, humanize)
        .register("pascalCase", 1, pascal_case)
        .register("camelCase", 1, camel_case)
        .register("substring", 2, substring)
        .register("substring", 3, substring)
        .register("padLeft", 2, pad_left)
        .register("padLeft", 3, pad_left)
        .register("padRight", 2, pad_right)
        .register("padRight", 3, pad_right)
        .register("repeating", 2, repeating);
}

pub fn lower(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(expect_string("lower", &args[0], 1)?.to_lowercase()))
}

pub fn upper(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(expect_string("upper", &args[0], 1)?.to_uppercase()))
}

/// Uppercases the first letter of each space-delimited word, leaving the
/// rest of the word untouched.
pub fn title_case(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let input = expect_string("titleCase", &args[0], 1)?;
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if ch == ' ' {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.push(ch);
        }
    }
    Ok(Value::String(out))
}

/// Splits an identifier on underscores and word boundaries and title-cases
/// the words: `first_name` and `firstName` both become `First Name`.
pub fn humanize(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let input = expect_string("humanize", &args[0], 1)?;
    Ok(Value::String(input.to_title_case()))
}

pub fn pascal_case(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let input = expect_string("pascalCase", &args[0], 1)?;
    Ok(Value::String(input.to_upper_camel_case()))
}

pub fn camel_case(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let input = expect_string("camelCase", &args[0], 1)?;
    Ok(Value::String(input.to_lower_camel_case()))
}

pub fn substring(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let input = expect_string("substring", &args[0], 1)?;
    let start = expect_usize("substring", &args[1], 2)?;
    let len = match args.get(2) {
        Some(arg) => Some(expect_usize("substring", arg, 3)?),
        None => None,
    };
    let chars: Vec<char> = input.chars().collect();
    let start = start.min(chars.len());
    let end = match len {
        Some(len) => (start + len).min(chars.len()),
        None => chars.len(),
    };
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn pad_char(name: &'static str, args: &[Value]) -> Result<char, Error> {
    match args.get(2) {
        Some(arg) => {
            let text = expect_string(name, arg, 3)?;
            text.chars().next().ok_or_else(|| {
                Error::filter(name, "padding character must not be empty")
            })
        }
        None => Ok(' '),
    }
}

pub fn pad_left(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let input = expect_string("padLeft", &args[0], 1)?;
    let width = expect_usize("padLeft", &args[1], 2)?;
    let pad = pad_char("padLeft", args)?;
    let current = input.chars().count();
    let mut out = String::new();
    for _ in current..width {
        out.push(pad);
    }
    out.push_str(&input);
    Ok(Value::String(out))
}

pub fn pad_right(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let input = expect_string("padRight", &args[0], 1)?;
    let width = expect_usize("padRight", &args[1], 2)?;
    let pad = pad_char("padRight", args)?;
    let current = input.chars().count();
    let mut out = input;
    for _ in current..width {
        out.push(pad);
    }
    Ok(Value::String(out))
}

pub fn repeating(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let input = expect_string("repeating", &args[0], 1)?;
    let count = expect_usize("repeating", &args[1], 2)?;
    Ok(Value::String(input.repeat(count)))
}
