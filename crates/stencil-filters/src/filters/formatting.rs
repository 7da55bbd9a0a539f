// SPDX-License-Identifier: Apache-2.0 OR MIT
use chrono::{DateTime, FixedOffset};
use stencil_engine::{Error, FilterRegistryBuilder, RenderContext, Value};

use super::expect_string;
use crate::culture::Culture;

pub fn register(builder: &mut FilterRegistryBuilder) {
    builder
        .register("format", 2, format)
        .register("dateFormat", 1, date_format)
        .register("dateFormat", 2, date_format)
        .register("dateTimeFormat", 1, date_time_format)
        .register("dateTimeFormat", 2, date_time_format)
        .register("currency", 1, currency)
        .register("currency", 2, currency);
}

// Date patterns arrive in `yyyy-MM-dd` style and are translated to strftime
// before handing off to chrono. Longer tokens are replaced first so `MM`
// never corrupts `MMM`.
const PATTERN_TABLE: &[(&str, &str)] = &[
    ("yyyy", "%Y"),
    ("yy", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("dd", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("fff", "%3f"),
    ("tt", "%p"),
    ("zzz", "%:z"),
];

fn translate_pattern(pattern: &str) -> String {
    let mut result = pattern.to_string();
    for (from, to) in PATTERN_TABLE {
        result = result.replace(from, to);
    }
    result
}

fn subject_timestamp(name: &'static str, value: &Value) -> Result<DateTime<FixedOffset>, Error> {
    value.coerce_timestamp().ok_or_else(|| {
        Error::filter(
            name,
            format!("subject must be a timestamp or date string, got {}", value.type_name()),
        )
    })
}

fn default_arg(ctx: &RenderContext, name: &str, fallback: &str) -> String {
    match ctx.lookup(name) {
        Value::String(s) => s,
        _ => fallback.to_string(),
    }
}

pub fn date_format(ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let ts = subject_timestamp("dateFormat", &args[0])?;
    let pattern = match args.get(1) {
        Some(arg) => expect_string("dateFormat", arg, 2)?,
        None => default_arg(ctx, "DefaultDateFormat", "yyyy-MM-dd"),
    };
    Ok(Value::String(ts.format(&translate_pattern(&pattern)).to_string()))
}

pub fn date_time_format(ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let ts = subject_timestamp("dateTimeFormat", &args[0])?;
    let pattern = match args.get(1) {
        Some(arg) => expect_string("dateTimeFormat", arg, 2)?,
        None => default_arg(ctx, "DefaultDateTimeFormat", "yyyy-MM-dd HH:mm:ssZ"),
    };
    Ok(Value::String(ts.format(&translate_pattern(&pattern)).to_string()))
}

/// General formatter. Timestamps take a date pattern, numbers take a
/// `0.00` / `#,##0.00` style pattern (culture-aware separators), and any
/// other subject substitutes into a `{0}` template.
pub fn format(ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let pattern = expect_string("format", &args[1], 2)?;

    if matches!(args[0], Value::Timestamp(_)) {
        let ts = subject_timestamp("format", &args[0])?;
        return Ok(Value::String(
            ts.format(&translate_pattern(&pattern)).to_string(),
        ));
    }

    if let Some(value) = args[0].as_f64() {
        if pattern.contains('0') || pattern.contains('#') {
            let culture = Culture::lookup(&default_arg(ctx, "DefaultCulture", "en-US"));
            let decimals = pattern
                .rsplit_once('.')
                .map(|(_, frac)| frac.chars().filter(|c| *c == '0').count())
                .unwrap_or(0);
            let formatted = if pattern.contains(',') {
                culture.format_number(value, decimals)
            } else {
                let mut plain = culture.format_number(value, decimals);
                plain.retain(|c| c != culture.group_separator);
                plain
            };
            return Ok(Value::String(formatted));
        }
    }

    Ok(Value::String(pattern.replace("{0}", &args[0].stringify())))
}

pub fn currency(ctx: &mut RenderContext, args: &[Value]) -> Result<Value, Error> {
    let amount = args[0].coerce_number().ok_or_else(|| {
        Error::filter(
            "currency",
            format!("subject must be numeric, got {}", args[0].type_name()),
        )
    })?;
    let culture_id = match args.get(1) {
        Some(arg) => expect_string("currency", arg, 2)?,
        None => default_arg(ctx, "DefaultCulture", "en-US"),
    };
    Ok(Value::String(Culture::lookup(&culture_id).format_currency(amount)))
}

#[cfg(test)]
mod tests {
    use super::super::testing::render;
    use super::translate_pattern;
    use stencil_engine::Value;

    fn march_15() -> Value {
        Value::Timestamp(
            Value::String("2024-03-15T14:30:05Z".into())
                .coerce_timestamp()
                .unwrap(),
        )
    }

    #[test]
    fn pattern_translation_covers_the_common_tokens() {
        assert_eq!(translate_pattern("yyyy-MM-dd"), "%Y-%m-%d");
        assert_eq!(translate_pattern("yyyy-MM-dd HH:mm:ssZ"), "%Y-%m-%d %H:%M:%SZ");
        assert_eq!(translate_pattern("MMM dd, yyyy"), "%b %d, %Y");
    }

    #[test]
    fn date_format_defaults_to_iso_date() {
        assert_eq!(render("{{ when | dateFormat }}", &[("when", march_15())]), "2024-03-15");
    }

    #[test]
    fn date_format_accepts_an_explicit_pattern() {
        assert_eq!(
            render("{{ when | dateFormat('dd/MM/yyyy') }}", &[("when", march_15())]),
            "15/03/2024"
        );
    }

    #[test]
    fn date_time_format_defaults_to_iso_datetime() {
        assert_eq!(
            render("{{ when | dateTimeFormat }}", &[("when", march_15())]),
            "2024-03-15 14:30:05Z"
        );
    }

    #[test]
    fn date_strings_round_trip_through_their_format() {
        assert_eq!(render("{{ '2001-01-01' | dateFormat }}", &[]), "2001-01-01");
    }

    #[test]
    fn format_applies_date_patterns_to_timestamps() {
        assert_eq!(
            render("{{ when | format('yyyy/MM') }}", &[("when", march_15())]),
            "2024/03"
        );
    }

    #[test]
    fn format_applies_number_patterns_with_culture() {
        assert_eq!(render("{{ 1234.5 | format('#,##0.00') }}", &[]), "1,234.50");
        assert_eq!(render("{{ 1234.5 | format('0.00') }}", &[]), "1234.50");
    }

    #[test]
    fn format_substitutes_into_placeholder_templates() {
        assert_eq!(render("{{ 'world' | format('hello {0}!') }}", &[]), "hello world!");
    }

    #[test]
    fn currency_uses_the_default_culture() {
        assert_eq!(render("{{ 1234.5 | currency }}", &[]), "$1,234.50");
    }

    #[test]
    fn currency_accepts_an_explicit_culture() {
        assert_eq!(
            render("{{ 1234.5 | currency('de-DE') }}", &[]),
            "1.234,50\u{a0}€"
        );
        assert_eq!(render("{{ 1234.5 | currency('ja-JP') }}", &[]), "¥1,235");
    }
}
