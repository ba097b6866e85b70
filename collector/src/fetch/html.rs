//! Visible-text extraction from HTML.

use scraper::Html;

/// Elements whose text never reaches the output.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that start a new line of output.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "html", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td",
    "th", "title", "tr", "ul",
];

/// Returns the visible text of an HTML document.
///
/// Whitespace inside each text node collapses to single spaces. Text from
/// the same block element is joined with a space and each new block starts
/// a new line, so patterns that stop at a newline stay inside a paragraph.
/// Content inside script, style, noscript and template elements is ignored.
#[must_use]
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    let mut last_block = None;

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if skipped {
            continue;
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let block = node
            .ancestors()
            .find(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| BLOCK_ELEMENTS.contains(&el.name()))
            })
            .map(|ancestor| ancestor.id());
        if !out.is_empty() {
            out.push(if block == last_block { ' ' } else { '\n' });
        }
        out.push_str(&words.join(" "));
        last_block = block;
    }

    out
}

/// Truncates `text` to at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut text = text;
            text.truncate(byte_idx);
            text
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_script_and_style() {
        let html = r"<html><head><title>Trust Forms</title>
            <style>body { color: red; }</style>
            <script>var required_fields = 1;</script></head>
            <body><h1>Certification</h1><p>Trustee  must include
            the trust name.</p><noscript>enable js</noscript></body></html>";

        let text = visible_text(html);
        assert!(text.contains("Trust Forms"));
        assert!(text.contains("Certification"));
        assert!(text.contains("Trustee must include the trust name."));
        assert!(!text.contains("color"));
        assert!(!text.contains("required_fields"));
        assert!(!text.contains("enable js"));
    }

    #[test]
    fn test_blocks_start_new_lines() {
        let text = visible_text("<p>one</p><p>two</p>  <div> three </div>");
        assert_eq!(text, "one\ntwo\nthree");
    }

    #[test]
    fn test_inline_elements_stay_on_the_line() {
        let text = visible_text("<p>The trustee <b>must</b> include <a href='#'>the date</a></p><p>Next</p>");
        assert_eq!(text, "The trustee must include the date\nNext");
    }

    #[test]
    fn test_text_after_nested_block_starts_a_line() {
        let text = visible_text("<div>Intro<p>Body</p>Tail</div>");
        assert_eq!(text, "Intro\nBody\nTail");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(visible_text(""), "");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef".to_string(), 3), "abc");
        assert_eq!(truncate_chars("abc".to_string(), 10), "abc");
        assert_eq!(truncate_chars("ééé".to_string(), 2), "éé");
        assert_eq!(truncate_chars("abc".to_string(), 0), "");
    }
}
