// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Escapes the five HTML-significant characters. Applied to every rendered
/// placeholder value that is not marked pre-escaped.
pub fn html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(ch),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::html;

    #[test]
    fn escapes_the_five_characters() {
        assert_eq!(html("<script>"), "&lt;script&gt;");
        assert_eq!(html(r#"a & "b" & 'c'"#), "a &amp; &quot;b&quot; &amp; &#39;c&#39;");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(html("plain text 123"), "plain text 123");
    }
}
