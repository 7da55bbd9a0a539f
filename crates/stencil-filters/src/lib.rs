#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The standard filter set for the stencil template engine: string, numeric,
//! comparison, conditional, date, currency, URL, flow, and output filters,
//! exposed in both piped (`{{ x | f(a) }}`) and prefix (`{{ f(x, a) }}`)
//! form.

use stencil_engine::{FilterRegistry, FilterRegistryBuilder};

mod culture;
mod filters;

pub use culture::Culture;

/// Registers the default filters into an existing registry builder.
pub fn install_default_filters(builder: &mut FilterRegistryBuilder) {
    filters::install_all(builder);
}

/// Returns a registry populated with the full default filter set.
pub fn default_filters() -> FilterRegistry {
    let mut builder = FilterRegistryBuilder::new();
    install_default_filters(&mut builder);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stencil_engine::{Context, PageResult, Value};

    #[test]
    fn template_with_default_filters() {
        let context = Context::builder().filters(default_filters()).init();
        let page = context
            .one_time_page("{{ name | otherwise('friend') | upper }}", None)
            .unwrap();
        let rendered = PageResult::new(Arc::clone(&page))
            .render(&context)
            .unwrap();
        assert_eq!(rendered, "FRIEND");

        let bound = PageResult::new(page)
            .arg("name", Value::from("stencil"))
            .render(&context)
            .unwrap();
        assert_eq!(bound, "STENCIL");
    }
}
