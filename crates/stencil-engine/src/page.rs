// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Pages, page formats, and the single-use render invocation.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::ast::Segment;
use crate::compose;
use crate::context::Context;
use crate::error::Error;
use crate::markdown;
use crate::parser;
use crate::value::Value;

/// Transformer applied to the rendered page body before layout injection.
pub type PageTransform = Arc<dyn Fn(&str) -> Result<String, Error> + Send + Sync>;

/// Transformer applied to the final composed output. Receives the
/// content-type hint verbatim.
pub type OutputTransform = Arc<dyn Fn(&str, &str) -> Result<String, Error> + Send + Sync>;

/// A named template source paired with its parsed segment stream.
///
/// File pages carry their virtual path and cached modification time and are
/// indexed by the context's page cache; one-time pages carry neither and are
/// never indexed.
pub struct Page {
    path: Option<String>,
    source: String,
    segments: Vec<Segment>,
    format: String,
    args: IndexMap<String, Value>,
    modified: Option<DateTime<Utc>>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("path", &self.path)
            .field("format", &self.format)
            .finish()
    }
}

impl Page {
    /// Parses page source, splitting off any front matter. Placeholder
    /// expressions parse eagerly, so grammar and safety violations surface
    /// here rather than mid-render.
    pub fn parse(
        path: Option<String>,
        source: String,
        format: impl Into<String>,
        modified: Option<DateTime<Utc>>,
    ) -> Result<Self, Error> {
        let (args, body) = split_front_matter(&source);
        let segments = parser::parse_template(body)?;
        Ok(Self {
            path,
            source,
            segments,
            format: format.into(),
            args,
            modified,
        })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// File extension naming this page's format.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Front-matter args declared at the top of the source.
    pub fn args(&self) -> &IndexMap<String, Value> {
        &self.args
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }
}

// Front matter is a leading fence of `key: value` lines:
//
//   ---
//   title: Home
//   layout: none
//   ---
//
// Values parse as literals where they look like one, strings otherwise.
fn split_front_matter(source: &str) -> (IndexMap<String, Value>, &str) {
    let mut args = IndexMap::new();
    let Some(rest) = source.strip_prefix("---") else {
        return (args, source);
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return (args, source);
    };
    let Some(end) = rest.find("\n---") else {
        return (args, source);
    };
    for line in rest[..end].lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            args.insert(key.trim().to_string(), parse_front_matter_value(value.trim()));
        }
    }
    let body = &rest[end + 4..];
    (args, body.strip_prefix('\n').unwrap_or(body))
}

fn parse_front_matter_value(text: &str) -> Value {
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        return Value::Float(f);
    }
    let unquoted = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')))
        .unwrap_or(text);
    Value::String(unquoted.to_string())
}

/// A page format: the extension it claims plus the body transform applied
/// when a page of this format is injected into a differently-formatted
/// layout or caller.
pub struct PageFormat {
    extension: String,
    content_type: String,
    transform: Arc<dyn Fn(&str) -> String + Send + Sync>,
}

impl PageFormat {
    pub fn new(
        extension: impl Into<String>,
        content_type: impl Into<String>,
        transform: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            extension: extension.into(),
            content_type: content_type.into(),
            transform: Arc::new(transform),
        }
    }

    /// The identity `html` format.
    pub fn html() -> Self {
        Self::new("html", "text/html", |body| body.to_string())
    }

    /// The built-in markdown format.
    pub fn markdown() -> Self {
        Self::new("md", "text/html", markdown::to_html)
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn transform(&self, body: &str) -> String {
        (self.transform)(body)
    }
}

impl fmt::Debug for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageFormat")
            .field("extension", &self.extension)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// One render invocation: a page, its optional explicit layout, the Model,
/// invocation-local args, and the transformer stacks. Single-use; the args
/// frame it seeds is discarded when the render returns.
pub struct PageResult {
    pub(crate) page: Arc<Page>,
    pub(crate) layout: Option<Arc<Page>>,
    pub(crate) model: Value,
    pub(crate) args: IndexMap<String, Value>,
    pub(crate) page_transforms: Vec<PageTransform>,
    pub(crate) output_transforms: Vec<OutputTransform>,
    pub(crate) content_type: String,
    pub(crate) cancel: Option<Arc<AtomicBool>>,
}

impl PageResult {
    pub fn new(page: Arc<Page>) -> Self {
        Self {
            page,
            layout: None,
            model: Value::Null,
            args: IndexMap::new(),
            page_transforms: Vec::new(),
            output_transforms: Vec::new(),
            content_type: "text/html".to_string(),
            cancel: None,
        }
    }

    /// Sets an explicit layout page, overriding front matter and convention.
    pub fn with_layout(mut self, layout: Arc<Page>) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_model(mut self, model: Value) -> Self {
        self.model = model;
        self
    }

    /// Binds a name in the invocation-local args frame.
    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Adds a transformer over the rendered page body, applied before layout
    /// injection.
    pub fn page_transform(
        mut self,
        transform: impl Fn(&str) -> Result<String, Error> + Send + Sync + 'static,
    ) -> Self {
        self.page_transforms.push(Arc::new(transform));
        self
    }

    /// Adds a transformer over the final composed output.
    pub fn output_transform(
        mut self,
        transform: impl Fn(&str, &str) -> Result<String, Error> + Send + Sync + 'static,
    ) -> Self {
        self.output_transforms.push(Arc::new(transform));
        self
    }

    /// Cooperative cancellation flag, honored at placeholder boundaries and
    /// before partial renders.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    /// Renders the page (and layout, if any) against the context.
    pub fn render(&self, context: &Arc<Context>) -> Result<String, Error> {
        compose::render(context, self)
    }
}
