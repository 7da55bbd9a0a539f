// SPDX-License-Identifier: Apache-2.0 OR MIT
use stencil_engine::{Error, FilterRegistryBuilder, Value};

mod compare;
mod conditional;
mod flow;
mod formatting;
mod math;
mod output;
mod strings;
mod url;

pub fn install_all(builder: &mut FilterRegistryBuilder) {
    output::register(builder);
    math::register(builder);
    compare::register(builder);
    conditional::register(builder);
    strings::register(builder);
    formatting::register(builder);
    flow::register(builder);
    url::register(builder);
}

pub(crate) fn expect_string(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<String, Error> {
    match value {
        Value::String(s) | Value::Raw(s) => Ok(s.clone()),
        Value::Integer(_) | Value::Float(_) | Value::Bool(_) | Value::Timestamp(_) => {
            Ok(value.stringify())
        }
        Value::Null | Value::Unresolved => Ok(String::new()),
        other => Err(Error::filter(
            name,
            format!("argument {position} must be coercible to string, got {}", other.type_name()),
        )),
    }
}

pub(crate) fn expect_number(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<f64, Error> {
    value.coerce_number().ok_or_else(|| {
        Error::filter(
            name,
            format!("argument {position} must be numeric, got {}", value.type_name()),
        )
    })
}

pub(crate) fn expect_integer(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<i64, Error> {
    if let Some(i) = value.as_i64() {
        return Ok(i);
    }
    if let Some(text) = value.as_str() {
        if let Ok(parsed) = text.trim().parse::<i64>() {
            return Ok(parsed);
        }
    }
    Err(Error::filter(
        name,
        format!("argument {position} must be an integer, got {}", value.type_name()),
    ))
}

pub(crate) fn expect_usize(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<usize, Error> {
    let i = expect_integer(name, value, position)?;
    usize::try_from(i).map_err(|_| {
        Error::filter(
            name,
            format!("argument {position} must be non-negative, got {i}"),
        )
    })
}

pub(crate) fn expect_array(
    name: &'static str,
    value: &Value,
    position: usize,
) -> Result<Vec<Value>, Error> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::Null | Value::Unresolved => Ok(Vec::new()),
        other => Err(Error::filter(
            name,
            format!("argument {position} must be a list, got {}", other.type_name()),
        )),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use stencil_engine::{Context, PageResult, Value};

    use crate::default_filters;

    /// Renders an inline template against the default filter set.
    pub fn render(source: &str, args: &[(&str, Value)]) -> String {
        try_render(source, args).unwrap()
    }

    pub fn try_render(
        source: &str,
        args: &[(&str, Value)],
    ) -> Result<String, stencil_engine::Error> {
        let context = Context::builder().filters(default_filters()).init();
        render_in(&context, source, args)
    }

    pub fn render_in(
        context: &Arc<Context>,
        source: &str,
        args: &[(&str, Value)],
    ) -> Result<String, stencil_engine::Error> {
        let page = context.one_time_page(source, None)?;
        let mut result = PageResult::new(page);
        for (name, value) in args {
            result = result.arg(*name, value.clone());
        }
        result.render(context)
    }
}
