//! Markdown-lite rendering for chat bubbles.
//!
//! Every input character is HTML-escaped before any construct is applied, so
//! bold, italic, fenced code, and inline code are the only markup this
//! module ever emits; raw user or provider text never reaches the page.

use regex::Regex;

/// Renderer for the four supported constructs.
pub struct MarkdownLite {
    fenced: Regex,
    inline: Regex,
    bold: Regex,
    italic: Regex,
}

impl MarkdownLite {
    /// Compile the construct patterns.
    ///
    /// # Errors
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            fenced: Regex::new(r"(?s)```(.*?)```")?,
            inline: Regex::new(r"`([^`]+)`")?,
            bold: Regex::new(r"\*\*(.*?)\*\*")?,
            italic: Regex::new(r"\*(.*?)\*")?,
        })
    }

    /// Render `content` to sanitized HTML.
    #[must_use]
    pub fn render(&self, content: &str) -> String {
        let escaped = escape_html(content);
        let text = self
            .fenced
            .replace_all(&escaped, "<pre><code>$1</code></pre>");
        let text = self.inline.replace_all(&text, "<code>$1</code>");
        let text = self.bold.replace_all(&text, "<strong>$1</strong>");
        let text = self.italic.replace_all(&text, "<em>$1</em>");
        text.replace('\n', "<br />")
    }
}

/// Escape the five HTML metacharacters.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> MarkdownLite {
        MarkdownLite::new().unwrap()
    }

    #[test]
    fn test_bold_and_italic() {
        let html = renderer().render("a **bold** and *slanted* word");
        assert_eq!(html, "a <strong>bold</strong> and <em>slanted</em> word");
    }

    #[test]
    fn test_inline_code() {
        let html = renderer().render("call `push()` here");
        assert_eq!(html, "call <code>push()</code> here");
    }

    #[test]
    fn test_fenced_code_block() {
        let html = renderer().render("```\nlet x = 1;\n```");
        assert_eq!(html, "<pre><code><br />let x = 1;<br /></code></pre>");
    }

    #[test]
    fn test_newlines_become_breaks() {
        let html = renderer().render("one\ntwo");
        assert_eq!(html, "one<br />two");
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = renderer().render("<script>alert('x')</script>");
        assert_eq!(
            html,
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_markup_inside_escaped_text_still_applies() {
        let html = renderer().render("**a < b**");
        assert_eq!(html, "<strong>a &lt; b</strong>");
    }
}
