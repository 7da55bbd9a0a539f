// SPDX-License-Identifier: Apache-2.0 OR MIT
use indexmap::IndexMap;
use stencil_engine::{parse_template, Error, FilterRegistryBuilder, RenderContext, Value};

use super::{expect_array, expect_string};

pub fn register(builder: &mut FilterRegistryBuilder) {
    builder
        .register("forEach", 2, for_each)
        .register("forEach", 3, for_each)
        .register("partial", 1, partial)
        .register("partial", 2, partial);
}

/// Repeats the subject, a template fragment, once per list element,
/// binding the element to `it` (or the given name) in a child scope. The
/// concatenation is pre-escaped: each iteration already escaped its own
/// placeholders.
pub fn for_each(ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let fragment = expect_string("forEach", &args[0], 1)?;
    let items = expect_array("forEach", &args[1], 2)?;
    let var_name = match args.get(2) {
        Some(arg) => expect_string("forEach", arg, 3)?,
        None => "it".to_string(),
    };

    let segments = parse_template(&fragment)?;
    let mut output = String::new();
    for item in items {
        let mut bindings = IndexMap::new();
        bindings.insert(var_name.clone(), item);
        output.push_str(&ctx.render_fragment(&segments, bindings)?);
    }
    Ok(Value::Raw(output))
}

/// Renders the named page in-place with its own scope frame, seeded from the
/// optional args object. The result is pre-escaped.
pub fn partial(ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let name = expect_string("partial", &args[0], 1)?;
    let bindings = match args.get(1) {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Null) | None => IndexMap::new(),
        Some(other) => {
            return Err(Error::filter(
                "partial",
                format!("argument 2 must be an object, got {}", other.type_name()),
            ));
        }
    };
    ctx.render_partial(&name, bindings).map(Value::Raw)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stencil_engine::vfs::{MemoryFiles, VirtualFiles};
    use stencil_engine::{Context, Value};

    use super::super::testing::{render, render_in};
    use crate::default_filters;

    fn context_with(files: &[(&str, &str)]) -> Arc<Context> {
        let vfs = MemoryFiles::new();
        for (path, source) in files {
            vfs.write(path, source).unwrap();
        }
        Context::builder()
            .filters(default_filters())
            .files(Arc::new(vfs))
            .init()
    }

    #[test]
    fn for_each_repeats_the_fragment() {
        let letters = Value::Array(vec![
            Value::from("A"),
            Value::from("B"),
            Value::from("C"),
        ]);
        assert_eq!(
            render(
                "<ul> {{ '<li> {{it}} </li>' | forEach(letters) }} </ul>",
                &[("letters", letters)]
            ),
            "<ul> <li> A </li><li> B </li><li> C </li> </ul>"
        );
    }

    #[test]
    fn for_each_accepts_a_custom_variable_name() {
        let nums = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(
            render("{{ '{{n}};' | forEach(nums, 'n') }}", &[("nums", nums)]),
            "1;2;"
        );
    }

    #[test]
    fn for_each_over_an_empty_list_is_empty() {
        assert_eq!(
            render("[{{ '{{it}}' | forEach(items) }}]", &[("items", Value::Array(vec![]))]),
            "[]"
        );
    }

    #[test]
    fn for_each_iterations_see_the_outer_scope() {
        let items = Value::Array(vec![Value::from("x")]);
        assert_eq!(
            render(
                "{{ '{{prefix}}{{it}}' | forEach(items) }}",
                &[("items", items), ("prefix", Value::from("->"))]
            ),
            "-&gt;x"
        );
    }

    #[test]
    fn partial_renders_with_its_own_frame() {
        let context = context_with(&[("widgets/card.html", "<card>{{ title }}</card>")]);
        let out = render_in(
            &context,
            "{{ partial('widgets/card.html', { title: 'Hi' }) }}",
            &[],
        )
        .unwrap();
        assert_eq!(out, "<card>Hi</card>");
    }

    #[test]
    fn partial_resolves_through_the_current_format_extension() {
        let context = context_with(&[("header.html", "<h1>{{ site }}</h1>")]);
        let out = render_in(
            &context,
            "{{ partial('header', { site: 'S' }) }}",
            &[],
        )
        .unwrap();
        assert_eq!(out, "<h1>S</h1>");
    }

    #[test]
    fn partial_args_do_not_leak_into_the_caller() {
        let context = context_with(&[("p.html", "{{ local }}")]);
        let out = render_in(
            &context,
            "{{ partial('p.html', { local: 'v' }) }}|{{ local | otherwise('gone') }}",
            &[],
        )
        .unwrap();
        assert_eq!(out, "v|gone");
    }

    #[test]
    fn partial_sees_the_caller_scope_underneath_its_args() {
        let context = context_with(&[("p.html", "{{ outer }}")]);
        let out = render_in(&context, "{{ partial('p.html') }}", &[("outer", Value::from("o"))])
            .unwrap();
        assert_eq!(out, "o");
    }

    #[test]
    fn missing_partial_is_fatal() {
        let context = context_with(&[]);
        let err = render_in(&context, "{{ partial('nowhere') }}", &[]).unwrap_err();
        assert!(matches!(err, stencil_engine::Error::PageNotFound { .. }));
    }

    #[test]
    fn markdown_partial_is_transformed_for_an_html_caller() {
        let context = context_with(&[("note.md", "# {{ heading }}")]);
        let out = render_in(
            &context,
            "{{ partial('note.md', { heading: 'Title' }) }}",
            &[],
        )
        .unwrap();
        assert_eq!(out, "<h1>Title</h1>\n");
    }

    #[test]
    fn runaway_partial_recursion_is_capped() {
        let context = context_with(&[("loop.html", "{{ partial('loop.html') }}")]);
        let err = render_in(&context, "{{ partial('loop.html') }}", &[]).unwrap_err();
        assert!(matches!(err, stencil_engine::Error::Filter { .. }));
    }
}
