// SPDX-License-Identifier: Apache-2.0 OR MIT
use stencil_engine::{Error, FilterRegistryBuilder, RenderContext, Value};

use super::expect_string;

pub fn register(builder: &mut FilterRegistryBuilder) {
    builder
        .register("raw", 1, raw)
        .register("json", 1, json)
        .register("appSetting", 1, app_setting);
}

/// Marks the subject as pre-escaped; the composer emits it verbatim.
pub fn raw(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Raw(args[0].stringify()))
}

/// Canonical JSON form of the subject. Null serializes as the literal
/// `null`; the output is pre-escaped since it is destined for script
/// contexts, not markup.
pub fn json(_ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let text = serde_json::to_string(&args[0])
        .map_err(|err| Error::filter("json", err.to_string()))?;
    Ok(Value::Raw(text))
}

/// Looks the key up in the host's settings provider. Absent keys (and an
/// absent provider) yield Unresolved, keeping the passthrough contract.
pub fn app_setting(ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let key = expect_string("appSetting", &args[0], 1)?;
    let found = ctx
        .context()
        .settings()
        .and_then(|settings| settings.get(&key));
    Ok(match found {
        Some(value) => Value::String(value),
        None => Value::Unresolved,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use stencil_engine::{Context, Value};

    use super::super::testing::{render, render_in};
    use crate::default_filters;

    #[test]
    fn raw_suppresses_escaping() {
        assert_eq!(render("<h1>{{ '<script>' }}</h1>", &[]), "<h1>&lt;script&gt;</h1>");
        assert_eq!(render("<h1>{{ '<script>' | raw }}</h1>", &[]), "<h1><script></h1>");
    }

    #[test]
    fn json_serializes_objects_in_order() {
        let model = Value::from(serde_json::json!({"Id": 1, "Name": "foo"}));
        assert_eq!(
            render("var m = {{ m | json }};", &[("m", model)]),
            r#"var m = {"Id":1,"Name":"foo"};"#
        );
    }

    #[test]
    fn json_renders_null_as_the_literal() {
        assert_eq!(render("var m = {{ m | json }};", &[("m", Value::Null)]), "var m = null;");
    }

    #[test]
    fn json_strings_keep_their_quotes_unescaped() {
        assert_eq!(render("{{ 'text' | json }}", &[]), "\"text\"");
    }

    #[test]
    fn app_setting_reads_the_provider() {
        let mut settings = HashMap::new();
        settings.insert("site.title".to_string(), "Stencil".to_string());
        let context = Context::builder()
            .filters(default_filters())
            .settings(Arc::new(settings))
            .init();

        let out = render_in(&context, "{{ appSetting('site.title') }}", &[]).unwrap();
        assert_eq!(out, "Stencil");
    }

    #[test]
    fn missing_app_setting_passes_through() {
        let context = Context::builder()
            .filters(default_filters())
            .settings(Arc::new(HashMap::new()))
            .init();

        let out = render_in(&context, "{{ appSetting('absent') }}", &[]).unwrap();
        assert_eq!(out, "{{ appSetting('absent') }}");

        let with_fallback = render_in(
            &context,
            "{{ appSetting('absent') | otherwise('default') }}",
            &[],
        )
        .unwrap();
        assert_eq!(with_fallback, "default");
    }
}
