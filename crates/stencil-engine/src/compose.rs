// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Page composition: page + optional layout + transformers.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::Error;
use crate::page::{Page, PageResult};
use crate::runtime::RenderContext;
use crate::scope::ScopeFrame;
use crate::value::Value;

/// Renders a [`PageResult`] to its final string.
///
/// Scope chain: Context args → PageResult args (with the Model's top-level
/// fields exploded in) → page- or layout-local frame. The page body renders
/// first; when a layout participates, the body is format-transformed on
/// extension mismatch, run through the page transformers, and bound
/// pre-escaped under `page` in the layout frame.
pub fn render(context: &Arc<Context>, result: &PageResult) -> Result<String, Error> {
    let page = Arc::clone(&result.page);
    debug!(page = ?page.path(), "rendering page result");

    let result_frame = ScopeFrame::child(context.root_scope(), invocation_args(result));
    let layout = resolve_layout(context, result)?;

    let mut ctx = RenderContext::new(
        Arc::clone(context),
        ScopeFrame::child(&result_frame, page.args().clone()),
        result.model.clone(),
        page.format(),
        result.cancel.clone(),
    );
    let mut body = ctx.render_segments(page.segments())?;

    let composed = match layout {
        Some(layout) => {
            if page.format() != layout.format() {
                if let Some(format) = context.format(page.format()) {
                    body = format.transform(&body);
                }
            }
            for transform in &result.page_transforms {
                body = transform(&body)?;
            }

            let mut layout_vars = layout.args().clone();
            layout_vars.insert("page".to_string(), Value::Raw(body));

            let mut layout_ctx = RenderContext::new(
                Arc::clone(context),
                ScopeFrame::child(&result_frame, layout_vars),
                result.model.clone(),
                layout.format(),
                result.cancel.clone(),
            );
            layout_ctx.render_segments(layout.segments())?
        }
        None => {
            for transform in &result.page_transforms {
                body = transform(&body)?;
            }
            body
        }
    };

    let mut output = composed;
    for transform in &result.output_transforms {
        output = transform(&output, &result.content_type)?;
    }
    Ok(output)
}

// The PageResult args frame: invocation args plus the exploded top-level
// fields of an object-like Model, so `Id` works alongside `model.Id` in both
// the page and the layout.
fn invocation_args(result: &PageResult) -> IndexMap<String, Value> {
    let mut vars = IndexMap::new();
    match &result.model {
        Value::Object(map) => {
            for (key, value) in map {
                vars.insert(key.clone(), value.clone());
            }
        }
        Value::Host(host) => {
            for field in host.fields() {
                if let Some(value) = host.get(&field) {
                    vars.insert(field, value);
                }
            }
        }
        _ => {}
    }
    vars.extend(result.args.clone());
    vars
}

// Layout resolution: explicit on the PageResult, then the page's
// front-matter `layout` key (`none` suppresses), then the nearest
// `_layout.<ext>` at or above the page's directory. A layout that resolves
// back to the page itself is refused.
fn resolve_layout(
    context: &Arc<Context>,
    result: &PageResult,
) -> Result<Option<Arc<Page>>, Error> {
    let page = &result.page;

    let resolved = if let Some(layout) = &result.layout {
        Some(Arc::clone(layout))
    } else if let Some(Value::String(name)) = page.args().get("layout") {
        if name == "none" {
            return Ok(None);
        }
        let layout = match context.find_page(name)? {
            Some(layout) => layout,
            None => context.get_page(&format!("{name}.{}", page.format()))?,
        };
        Some(layout)
    } else {
        convention_layout(context, page)?
    };

    match resolved {
        Some(layout) if same_page(page, &layout) => {
            warn!(page = ?page.path(), "page resolves to itself as layout, skipping");
            Ok(None)
        }
        other => Ok(other),
    }
}

fn convention_layout(
    context: &Arc<Context>,
    page: &Arc<Page>,
) -> Result<Option<Arc<Page>>, Error> {
    let Some(path) = page.path() else {
        return Ok(None);
    };
    let mut dir = match path.rsplit_once('/') {
        Some((dir, _)) => Some(dir),
        None => None,
    };
    loop {
        let candidate = match dir {
            Some(dir) => format!("{dir}/_layout.{}", page.format()),
            None => format!("_layout.{}", page.format()),
        };
        if let Some(layout) = context.find_page(&candidate)? {
            return Ok(Some(layout));
        }
        dir = match dir {
            Some(remaining) => match remaining.rsplit_once('/') {
                Some((parent, _)) => Some(parent),
                None => None,
            },
            None => return Ok(None),
        };
    }
}

fn same_page(a: &Arc<Page>, b: &Arc<Page>) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    matches!((a.path(), b.path()), (Some(pa), Some(pb)) if pa == pb)
}
