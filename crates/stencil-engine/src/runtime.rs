// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Evaluation context threaded through a render: binding resolution, filter
//! invocation, and the segment loop shared by pages, layouts, partials, and
//! fragments.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Local, Utc};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::{Binding, Expression, FilterCall, PathStep, Placeholder, PipedExpr, Segment};
use crate::context::Context;
use crate::error::Error;
use crate::escape;
use crate::scope::ScopeFrame;
use crate::value::Value;

// Partials may legitimately recurse through conditionals; this bounds the
// pathological case.
const MAX_PARTIAL_DEPTH: usize = 64;

/// Per-render evaluation state. One placeholder is evaluated at a time; the
/// `consumed_unknown` flag tracks whether an unknown-handling filter ran in
/// the current chain, which decides between verbatim passthrough and empty
/// output for a final Unresolved.
pub struct RenderContext {
    context: Arc<Context>,
    scope: Arc<ScopeFrame>,
    model: Value,
    page_format: String,
    cancel: Option<Arc<AtomicBool>>,
    consumed_unknown: bool,
    partial_depth: usize,
}

impl RenderContext {
    pub(crate) fn new(
        context: Arc<Context>,
        scope: Arc<ScopeFrame>,
        model: Value,
        page_format: impl Into<String>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            context,
            scope,
            model,
            page_format: page_format.into(),
            cancel,
            consumed_unknown: false,
            partial_depth: 0,
        }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// The Model of the render invocation.
    pub fn model(&self) -> &Value {
        &self.model
    }

    /// Extension of the page currently being rendered.
    pub fn page_format(&self) -> &str {
        &self.page_format
    }

    /// Looks a name up through the scope chain, synthetics included.
    pub fn lookup(&self, name: &str) -> Value {
        match name {
            "now" => Value::Timestamp(Local::now().fixed_offset()),
            "utcNow" => Value::Timestamp(Utc::now().fixed_offset()),
            "model" => self.model.clone(),
            _ => self
                .scope
                .lookup(name)
                .cloned()
                .unwrap_or(Value::Unresolved),
        }
    }

    /// Renders a segment stream into a string, honoring cancellation at
    /// placeholder boundaries.
    pub fn render_segments(&mut self, segments: &[Segment]) -> Result<String, Error> {
        let mut output = String::new();
        for segment in segments {
            match segment {
                Segment::Text(text) => output.push_str(&text.text),
                Segment::Placeholder(ph) => {
                    self.check_cancelled()?;
                    output.push_str(&self.render_placeholder(ph)?);
                }
            }
        }
        Ok(output)
    }

    /// Renders pre-parsed fragment segments in a child scope. Used by flow
    /// filters that treat their subject as a template fragment.
    pub fn render_fragment(
        &mut self,
        segments: &[Segment],
        bindings: IndexMap<String, Value>,
    ) -> Result<String, Error> {
        let child = ScopeFrame::child(&self.scope, bindings);
        let saved = std::mem::replace(&mut self.scope, child);
        let result = self.render_segments(segments);
        self.scope = saved;
        result
    }

    /// Renders a named page as a partial: a child scope seeded with `args`,
    /// the page's own front matter underneath, and a format transform when
    /// the partial's extension differs from the caller's.
    pub fn render_partial(
        &mut self,
        name: &str,
        args: IndexMap<String, Value>,
    ) -> Result<String, Error> {
        self.check_cancelled()?;
        if self.partial_depth >= MAX_PARTIAL_DEPTH {
            return Err(Error::filter(
                "partial",
                format!("recursion deeper than {MAX_PARTIAL_DEPTH} while rendering '{name}'"),
            ));
        }

        let page = match self.context.find_page(name)? {
            Some(page) => page,
            None => {
                let with_ext = format!("{name}.{}", self.page_format);
                self.context
                    .find_page(&with_ext)?
                    .ok_or_else(|| Error::page_not_found(name))?
            }
        };
        debug!(partial = name, "rendering partial");

        let mut vars = page.args().clone();
        vars.extend(args);

        let child = ScopeFrame::child(&self.scope, vars);
        let saved_scope = std::mem::replace(&mut self.scope, child);
        let saved_format =
            std::mem::replace(&mut self.page_format, page.format().to_string());
        self.partial_depth += 1;

        let rendered = self.render_segments(page.segments());

        self.partial_depth -= 1;
        self.page_format = saved_format;
        self.scope = saved_scope;

        let mut body = rendered?;
        if page.format() != self.page_format {
            if let Some(format) = self.context.format(page.format()) {
                body = format.transform(&body);
            }
        }
        Ok(body)
    }

    fn check_cancelled(&self) -> Result<(), Error> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    // Renders one placeholder: evaluate the chain, then pick between raw
    // emission, escaped emission, verbatim passthrough, and consumed-empty.
    fn render_placeholder(&mut self, ph: &Placeholder) -> Result<String, Error> {
        self.consumed_unknown = false;
        let value = match self.eval_piped(&ph.expr) {
            Ok(value) => value,
            Err(err @ Error::Filter { .. }) => {
                if self.context.lenient_filters() {
                    debug!(error = %err, "filter failed, substituting empty output");
                    return Ok(String::new());
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        Ok(match value {
            Value::Unresolved => {
                if self.consumed_unknown {
                    String::new()
                } else {
                    trace!(source = %ph.source, "unresolved placeholder passed through");
                    ph.source.clone()
                }
            }
            Value::Raw(text) => text,
            other => escape::html(&other.stringify()),
        })
    }

    pub(crate) fn eval_piped(&mut self, expr: &PipedExpr) -> Result<Value, Error> {
        let mut value = match &expr.head {
            Expression::Call(call) => self.invoke(call, None)?,
            head => self.eval_expression(head)?,
        };
        for call in &expr.chain {
            value = self.invoke(call, Some(value))?;
        }
        Ok(value)
    }

    fn eval_expression(&mut self, expr: &Expression) -> Result<Value, Error> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Binding(binding) => self.resolve_binding(binding),
            Expression::ObjectLit(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value_expr) in entries {
                    map.insert(key.clone(), self.eval_expression(value_expr)?);
                }
                Ok(Value::Object(map))
            }
            Expression::ArrayLit(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expression(item)?);
                }
                Ok(Value::Array(values))
            }
            Expression::Call(call) => self.invoke(call, None),
            Expression::SubExpr(piped) => self.eval_piped(piped),
        }
    }

    /// Evaluates a binding path. An unbound head is Unresolved; a null or
    /// Unresolved value mid-path collapses the whole path to the empty
    /// string, so template authors never see null-chain errors.
    fn resolve_binding(&mut self, binding: &Binding) -> Result<Value, Error> {
        let mut value = self.lookup(&binding.head);
        if value.is_unresolved() && !binding.steps.is_empty() {
            return Ok(Value::String(String::new()));
        }

        for step in &binding.steps {
            if value.is_null() || value.is_unresolved() {
                return Ok(Value::String(String::new()));
            }
            value = match step {
                PathStep::Field(name) => field_of(&value, name),
                PathStep::Index(expr) => {
                    let key = self.eval_expression(expr)?;
                    index_of(&value, &key)
                }
            };
        }
        Ok(value)
    }

    // Invokes one filter. The subject of a piped call becomes argument 0;
    // lookup is by (name, total argument count). Unknown filters and
    // unresolved inputs flow as data, never as errors.
    fn invoke(&mut self, call: &FilterCall, subject: Option<Value>) -> Result<Value, Error> {
        let mut args = Vec::with_capacity(call.args.len() + 1);
        if let Some(subject) = subject {
            args.push(subject);
        }
        for arg in &call.args {
            args.push(self.eval_expression(arg)?);
        }

        let Some(entry) = self.context.filters().get(&call.name, args.len()) else {
            trace!(filter = %call.name, arity = args.len(), "unknown filter");
            return Ok(Value::Unresolved);
        };

        if !entry.handles_unknown && args.iter().any(Value::is_unresolved) {
            return Ok(Value::Unresolved);
        }
        if entry.handles_unknown {
            self.consumed_unknown = true;
        }

        (entry.func)(self, &args)
    }
}

fn field_of(value: &Value, name: &str) -> Value {
    match value {
        Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
        Value::Host(host) => host.get(name).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn index_of(value: &Value, key: &Value) -> Value {
    match value {
        Value::Array(items) => key
            .as_i64()
            .or_else(|| key.as_str().and_then(|s| s.parse().ok()))
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Null),
        Value::Object(map) => map.get(&key.stringify()).cloned().unwrap_or(Value::Null),
        Value::Host(host) => host.get(&key.stringify()).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_template;
    use crate::registry::FilterRegistry;
    use indexmap::indexmap;

    fn render_with(
        source: &str,
        vars: IndexMap<String, Value>,
        filters: FilterRegistry,
    ) -> Result<String, Error> {
        let context = Context::builder().filters(filters).init();
        let scope = ScopeFrame::child(context.root_scope(), vars);
        let mut ctx = RenderContext::new(context, scope, Value::Null, "html", None);
        let segments = parse_template(source)?;
        ctx.render_segments(&segments)
    }

    fn arith_filters() -> FilterRegistry {
        let mut builder = FilterRegistry::builder();
        builder
            .register("add", 2, |_, args| {
                let a = args[0].coerce_number().unwrap_or(0.0);
                let b = args[1].coerce_number().unwrap_or(0.0);
                Ok(Value::Float(a + b))
            })
            .register_unknown_aware("otherwise", 2, |_, args| {
                if args[0].is_unresolved() || args[0].is_null() {
                    Ok(args[1].clone())
                } else {
                    Ok(args[0].clone())
                }
            });
        builder.build()
    }

    #[test]
    fn literal_text_renders_verbatim() {
        let out = render_with("no placeholders", IndexMap::new(), FilterRegistry::empty()).unwrap();
        assert_eq!(out, "no placeholders");
    }

    #[test]
    fn bound_values_are_escaped() {
        let out = render_with(
            "{{ html }}",
            indexmap! { "html".to_string() => Value::String("<b>".into()) },
            FilterRegistry::empty(),
        )
        .unwrap();
        assert_eq!(out, "&lt;b&gt;");
    }

    #[test]
    fn unresolved_head_passes_through_verbatim() {
        let out = render_with("x {{ missing }} y", IndexMap::new(), FilterRegistry::empty())
            .unwrap();
        assert_eq!(out, "x {{ missing }} y");
    }

    #[test]
    fn unknown_filter_passes_through_verbatim() {
        let out = render_with(
            "{{ name | nonexistent }}",
            indexmap! { "name".to_string() => Value::String("v".into()) },
            FilterRegistry::empty(),
        )
        .unwrap();
        assert_eq!(out, "{{ name | nonexistent }}");
    }

    #[test]
    fn unknown_aware_filter_consumes_the_unresolved() {
        let out = render_with("{{ missing | otherwise('fallback') }}", IndexMap::new(), arith_filters())
            .unwrap();
        assert_eq!(out, "fallback");
    }

    #[test]
    fn null_mid_path_renders_empty() {
        let out = render_with(
            "[{{ user.address.city }}]",
            indexmap! { "user".to_string() => Value::Object(indexmap! {
                "address".to_string() => Value::Null,
            }) },
            FilterRegistry::empty(),
        )
        .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn null_binding_renders_empty_not_passthrough() {
        let out = render_with(
            "[{{ gone }}]",
            indexmap! { "gone".to_string() => Value::Null },
            FilterRegistry::empty(),
        )
        .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn chains_left_associate_through_the_subject_slot() {
        let out = render_with("{{ 1 | add(2) | add(3) }}", IndexMap::new(), arith_filters())
            .unwrap();
        assert_eq!(out, "6");
    }

    #[test]
    fn prefix_and_piped_forms_agree() {
        let piped = render_with("{{ 1 | add(2) }}", IndexMap::new(), arith_filters()).unwrap();
        let prefix = render_with("{{ add(1, 2) }}", IndexMap::new(), arith_filters()).unwrap();
        assert_eq!(piped, prefix);
    }

    #[test]
    fn index_steps_reach_into_arrays_and_objects() {
        let vars = indexmap! {
            "items".to_string() => Value::Array(vec![
                Value::String("zero".into()),
                Value::String("one".into()),
            ]),
            "map".to_string() => Value::Object(indexmap! {
                "key".to_string() => Value::Integer(7),
            }),
        };
        let out = render_with("{{ items[1] }}/{{ map['key'] }}", vars, FilterRegistry::empty())
            .unwrap();
        assert_eq!(out, "one/7");
    }

    #[test]
    fn cancellation_stops_at_a_placeholder_boundary() {
        let context = Context::builder().init();
        let scope = ScopeFrame::child(context.root_scope(), IndexMap::new());
        let flag = Arc::new(AtomicBool::new(true));
        let mut ctx = RenderContext::new(context, scope, Value::Null, "html", Some(flag));
        let segments = parse_template("a {{ x }}").unwrap();
        assert!(matches!(
            ctx.render_segments(&segments),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn now_and_utc_now_are_always_bound() {
        let out = render_with("{{ now | typeOf }}", IndexMap::new(), {
            let mut builder = FilterRegistry::builder();
            builder.register("typeOf", 1, |_, args| {
                Ok(Value::String(args[0].type_name().to_string()))
            });
            builder.build()
        })
        .unwrap();
        assert_eq!(out, "timestamp");
    }
}
