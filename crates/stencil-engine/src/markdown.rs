// SPDX-License-Identifier: Apache-2.0 OR MIT
use pulldown_cmark::{html, Options, Parser};

/// Transforms a markdown page body into HTML. Backs the built-in `md` page
/// format.
pub fn to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use super::to_html;

    #[test]
    fn renders_basic_markdown() {
        assert_eq!(to_html("# Title"), "<h1>Title</h1>\n");
        assert_eq!(to_html("*em*"), "<p><em>em</em></p>\n");
    }

    #[test]
    fn leaves_placeholder_text_intact() {
        let out = to_html("Hello {{ name }}");
        assert!(out.contains("{{ name }}"));
    }
}
