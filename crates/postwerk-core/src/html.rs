// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text rendering of HTML email bodies.
//
// Mail clients that cannot show the HTML extra fall back to EXTRA_TEXT, so the
// text has to read the way Android's legacy `fromHtml` renders it: tags gone,
// whitespace collapsed, every block element separated by a blank line.

/// Render an HTML fragment as plain text.
///
/// - Tags are stripped; `<br>` becomes a newline.
/// - Block elements (`p`, `div`, lists, headings, `blockquote`) are
///   separated by a blank line.
/// - Runs of HTML whitespace collapse to one space.
/// - `script`, `style`, `head` and `title` content is dropped, as are comments.
///   A head without `</head>` ends at the first body element.
/// - Named and numeric entities are decoded.
///
/// ```
/// use postwerk_core::html::html_to_text;
///
/// assert_eq!(html_to_text("<b>Hi</b>"), "Hi");
/// assert_eq!(html_to_text("<p>One</p><p>Two</p>"), "One\n\nTwo");
/// ```
pub fn html_to_text(html: &str) -> String {
    let mut renderer = Renderer::with_capacity(html.len());
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => {
                if let Some(after) = rest.strip_prefix("<!--") {
                    rest = after.find("-->").map_or("", |end| &after[end + 3..]);
                    continue;
                }
                match tag_end(rest) {
                    Some(end) => {
                        renderer.tag(&rest[1..end]);
                        rest = &rest[end + 1..];
                    }
                    // A lone '<' is text.
                    None => {
                        renderer.text(c);
                        rest = &rest[1..];
                    }
                }
            }
            '&' => {
                let (decoded, used) = decode_entity(rest);
                renderer.literal(decoded);
                rest = &rest[used..];
            }
            _ => {
                renderer.text(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    renderer.finish()
}

struct Renderer {
    out: String,
    pending_space: bool,
    /// Raw-text element whose content is being dropped, until its end tag.
    skipping: Option<String>,
    /// Inside `<head>`. Ends at `</head>` or at the first start tag that
    /// cannot appear in a head, since the end tag is optional.
    in_head: bool,
}

impl Renderer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            pending_space: false,
            skipping: None,
            in_head: false,
        }
    }

    fn tag(&mut self, inner: &str) {
        let self_closing = inner.trim_end().ends_with('/');
        let (closing, inner) = match inner.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, inner),
        };
        let name: String = inner
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();

        if let Some(skipped) = &self.skipping {
            if closing && *skipped == name {
                self.skipping = None;
            }
            return;
        }

        if self.in_head {
            if closing {
                if name == "head" {
                    self.in_head = false;
                }
                return;
            }
            if !is_head_content(&name) {
                self.in_head = false;
            }
        }

        let opens = !closing && !self_closing;
        match name.as_str() {
            "br" => self.line_break(),
            "head" if opens => self.in_head = true,
            "script" | "style" | "title" if opens => self.skipping = Some(name),
            "p" | "div" | "ul" | "ol" | "li" | "blockquote" | "h1" | "h2" | "h3" | "h4"
            | "h5" | "h6" => self.block_break(),
            _ => {}
        }
    }

    /// Source text: HTML whitespace collapses.
    fn text(&mut self, c: char) {
        if self.suppressed() {
            return;
        }
        if is_html_whitespace(c) {
            if !self.out.is_empty() && !self.out.ends_with('\n') {
                self.pending_space = true;
            }
            return;
        }
        self.literal(c);
    }

    /// Decoded text: never collapsed.
    fn literal(&mut self, c: char) {
        if self.suppressed() {
            return;
        }
        if self.pending_space {
            self.out.push(' ');
            self.pending_space = false;
        }
        self.out.push(c);
    }

    fn line_break(&mut self) {
        if self.suppressed() {
            return;
        }
        self.pending_space = false;
        self.out.push('\n');
    }

    fn block_break(&mut self) {
        self.pending_space = false;
        if self.out.is_empty() {
            return;
        }
        let trailing = self.out.chars().rev().take_while(|&c| c == '\n').count();
        for _ in trailing..2 {
            self.out.push('\n');
        }
    }

    fn suppressed(&self) -> bool {
        self.skipping.is_some() || self.in_head
    }

    fn finish(self) -> String {
        self.out.trim_matches(|c| c == '\n' || c == ' ').to_string()
    }
}

/// Elements allowed inside `<head>`.
fn is_head_content(name: &str) -> bool {
    matches!(
        name,
        "meta" | "link" | "base" | "title" | "style" | "script" | "noscript" | "template"
    )
}

fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

/// Byte index of the `>` closing the tag that starts at `s[0]`, honouring
/// quoted attribute values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            (None, '<') => return None,
            _ => {}
        }
    }
    None
}

/// Decode the entity at the start of `s` (which begins with `&`).
///
/// Returns the character and the number of bytes consumed. Unknown or
/// unterminated entities decode to a literal `&`.
fn decode_entity(s: &str) -> (char, usize) {
    let Some((semi, _)) = s[1..].char_indices().take(10).find(|&(_, c)| c == ';') else {
        return ('&', 1);
    };
    let name = &s[1..1 + semi];
    let decoded = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        "hellip" => Some('\u{2026}'),
        "lsquo" => Some('\u{2018}'),
        "rsquo" => Some('\u{2019}'),
        "ldquo" => Some('\u{201C}'),
        "rdquo" => Some('\u{201D}'),
        "copy" => Some('\u{00A9}'),
        "reg" => Some('\u{00AE}'),
        "trade" => Some('\u{2122}'),
        "euro" => Some('\u{20AC}'),
        _ => name
            .strip_prefix("#x")
            .or_else(|| name.strip_prefix("#X"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| name.strip_prefix('#')?.parse::<u32>().ok())
            .and_then(char::from_u32),
    };
    match decoded {
        Some(c) => (c, semi + 2),
        None => ('&', 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_inline_tags() {
        assert_eq!(html_to_text("<b>Hi</b>"), "Hi");
        assert_eq!(
            html_to_text(r#"Go <a href="https://x.test/?a=1&amp;b=2">here</a> now"#),
            "Go here now"
        );
    }

    #[test]
    fn blocks_are_separated_by_blank_lines() {
        assert_eq!(html_to_text("<p>One</p><p>Two</p>"), "One\n\nTwo");
        assert_eq!(html_to_text("<h1>Title</h1>Body"), "Title\n\nBody");
        assert_eq!(html_to_text("<ul><li>a</li><li>b</li></ul>"), "a\n\nb");
    }

    #[test]
    fn br_is_a_single_newline() {
        assert_eq!(html_to_text("line one<br>line two<br/>three"), "line one\nline two\nthree");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(html_to_text("  hello \n\t  world  "), "hello world");
        assert_eq!(html_to_text("<p>\n  indented\n</p>"), "indented");
    }

    #[test]
    fn entities_decode() {
        assert_eq!(html_to_text("&lt;tag&gt; &amp; &#65;&#x42;"), "<tag> & AB");
        assert_eq!(html_to_text("caf&eacute"), "caf&eacute");
        assert_eq!(html_to_text("a&nbsp;&nbsp;b"), "a\u{00A0}\u{00A0}b");
    }

    #[test]
    fn script_style_and_comments_are_dropped() {
        let html = "<html><head><title>t</title><style>p{color:red}</style></head>\
                    <body><!-- hidden -->Shown<script>alert(1)</script></body></html>";
        assert_eq!(html_to_text(html), "Shown");
    }

    #[test]
    fn head_ends_without_its_end_tag() {
        let html = "<html><head><meta charset=\"utf-8\"><body><p>Hello team</p></body></html>";
        assert_eq!(html_to_text(html), "Hello team");
        assert_eq!(
            html_to_text("<head><title>Report</title><link rel=\"stylesheet\"><p>Figures</p>"),
            "Figures"
        );
    }

    #[test]
    fn self_closing_script_drops_nothing_after_it() {
        assert_eq!(html_to_text("<script src=\"x.js\"/>Hello"), "Hello");
        assert_eq!(html_to_text("<STYLE>p{}</Style>Body"), "Body");
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        assert_eq!(html_to_text("5 < 6"), "5 < 6");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(html_to_text("no markup here"), "no markup here");
        assert_eq!(html_to_text(""), "");
    }
}
