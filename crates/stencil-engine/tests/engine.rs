// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::HashMap;
use std::sync::Arc;

use stencil_engine::vfs::{MemoryFiles, VirtualFiles};
use stencil_engine::{
    Context, Error, FilterRegistryBuilder, HostObject, PageResult, Value,
};

fn test_filters() -> stencil_engine::FilterRegistry {
    let mut builder = FilterRegistryBuilder::new();
    builder
        .register("upper", 1, |_ctx, args| {
            Ok(Value::String(args[0].stringify().to_uppercase()))
        })
        .register_unknown_aware("otherwise", 2, |_ctx, args| {
            if args[0].is_unresolved() || args[0].is_null() {
                Ok(args[1].clone())
            } else {
                Ok(args[0].clone())
            }
        });
    builder.build()
}

fn context_with(files: &[(&str, &str)]) -> Arc<Context> {
    let vfs = MemoryFiles::new();
    for (path, source) in files {
        vfs.write(path, source).unwrap();
    }
    Context::builder()
        .filters(test_filters())
        .files(Arc::new(vfs))
        .init()
}

#[test]
fn placeholder_free_template_renders_identically() {
    let context = context_with(&[]);
    let source = "plain text, no { placeholders } here";
    let page = context.one_time_page(source, None).unwrap();
    assert_eq!(PageResult::new(page).render(&context).unwrap(), source);
}

#[test]
fn escaping_and_raw_render_through_the_full_stack() {
    let context = context_with(&[]);
    let page = context.one_time_page("{{ v | upper }}", None).unwrap();
    let out = PageResult::new(page)
        .arg("v", Value::from("<b>hi</b>"))
        .render(&context)
        .unwrap();
    assert_eq!(out, "&lt;B&gt;HI&lt;/B&gt;");
}

#[test]
fn unresolved_placeholder_survives_character_for_character() {
    let context = context_with(&[]);
    let source = "keep {{  spaced  |  weirdly('x')  }} intact";
    let page = context.one_time_page(source, None).unwrap();
    assert_eq!(PageResult::new(page).render(&context).unwrap(), source);
}

#[test]
fn front_matter_args_stay_in_the_page_frame() {
    let context = context_with(&[
        ("_layout.html", "<html>{{ title | otherwise('untitled') }}:{{ page }}</html>"),
        ("index.html", "---\ntitle: Home\n---\nwelcome"),
    ]);
    let page = context.get_page("index.html").unwrap();
    let out = PageResult::new(page).render(&context).unwrap();
    // Front-matter args live in the page frame, not the layout frame.
    assert_eq!(out, "<html>untitled:welcome</html>");

    let page = context.get_page("index.html").unwrap();
    let out = PageResult::new(page)
        .arg("title", Value::from("Home"))
        .render(&context)
        .unwrap();
    assert_eq!(out, "<html>Home:welcome</html>");
}

#[derive(Debug)]
struct Customer {
    id: i64,
    name: &'static str,
}

impl HostObject for Customer {
    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "Id" => Some(Value::Integer(self.id)),
            "Name" => Some(Value::from(self.name)),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<String> {
        vec!["Id".to_string(), "Name".to_string()]
    }

    fn type_name(&self) -> &'static str {
        "Customer"
    }
}

#[test]
fn host_objects_expose_fields_and_explode_into_scope() {
    let context = context_with(&[]);
    let page = context
        .one_time_page("{{ model.Name }} has id {{ Id }}", None)
        .unwrap();
    let model = Value::Host(Arc::new(Customer { id: 7, name: "acme" }));
    let out = PageResult::new(page).with_model(model).render(&context).unwrap();
    assert_eq!(out, "acme has id 7");
}

#[test]
fn method_invocation_on_a_binding_is_fatal() {
    let context = context_with(&[]);
    let err = context.one_time_page("{{ model.GetName() }}", None).unwrap_err();
    assert!(matches!(err, Error::BindingExpression { .. }));
    assert!(err.to_string().contains("model.GetName()"));
}

#[test]
fn lenient_mode_swallows_filter_failures() {
    let mut builder = FilterRegistryBuilder::new();
    builder.register("boom", 1, |_ctx, _args| {
        Err(Error::filter("boom", "always fails"))
    });
    let filters = builder.build();

    let strict = Context::builder().filters(filters.clone()).init();
    let page = strict.one_time_page("a {{ 1 | boom }} b", None).unwrap();
    assert!(PageResult::new(page).render(&strict).is_err());

    let lenient = Context::builder()
        .filters(filters)
        .lenient_filters(true)
        .init();
    let page = lenient.one_time_page("a {{ 1 | boom }} b", None).unwrap();
    assert_eq!(PageResult::new(page).render(&lenient).unwrap(), "a  b");
}

#[test]
fn concurrent_renders_share_one_context() {
    let context = context_with(&[("page.html", "{{ who | otherwise('n/a') }}")]);
    let mut handles = Vec::new();
    for i in 0..8 {
        let context = Arc::clone(&context);
        handles.push(std::thread::spawn(move || {
            let page = context.get_page("page.html").unwrap();
            PageResult::new(page)
                .arg("who", Value::Integer(i))
                .render(&context)
                .unwrap()
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), i.to_string());
    }
}
