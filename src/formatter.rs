//! Index line and credit formatting
//!
//! Pure functions turning page metadata into:
//! - a Markdown index line, `- [label](target): credit`
//! - an HTML credit fragment linking back to the description page
//!
//! Author fields from the API are HTML. They are reduced to plain text with a
//! small renderer over the `scraper` DOM that follows Markdown-ish
//! conventions: `_emphasis_`, `__strong__`, `- ` list items, links replaced
//! by their text.

use crate::types::PageRecord;
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Characters kept verbatim in link targets besides the unreserved set
const PERCENT_ESCAPE_SAFE: &[(&str, &str)] = &[("%2F", "/"), ("%2C", ",")];

/// Fallback shown when no usable author is known
pub const UNKNOWN_AUTHOR_TEXT: &str = "See page for author";

/// Fallback shown when no usable license is known
pub const UNKNOWN_LICENSE_TEXT: &str = "See page for license";

/// Percent-encode a filename for use as a Markdown link target
///
/// Everything outside `A-Z a-z 0-9 - _ . ~` is encoded as UTF-8 bytes,
/// except `/` and `,` which stay readable.
///
/// # Examples
///
/// ```
/// use commons_archivist::formatter::percent_encode;
///
/// assert_eq!(percent_encode("a b/c,d.jpg"), "a%20b/c,d.jpg");
/// ```
#[must_use]
pub fn percent_encode(filename: &str) -> String {
    let mut encoded = urlencoding::encode(filename).into_owned();
    for (escape, raw) in PERCENT_ESCAPE_SAFE {
        encoded = encoded.replace(escape, raw);
    }
    encoded
}

/// Decode a percent-encoded link target back into a filename
///
/// Invalid UTF-8 sequences are replaced rather than rejected, so a hand
/// edited index never prevents a merge.
#[must_use]
pub fn percent_decode(target: &str) -> String {
    let bytes = urlencoding::decode_binary(target.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Format a Markdown index line for a file and its credit
///
/// `\` and `]` are escaped in the label; the target is percent-encoded.
///
/// # Examples
///
/// ```
/// use commons_archivist::formatter::index_line;
///
/// assert_eq!(
///     index_line("a]b\\c", "credit"),
///     "- [a\\]b\\\\c](a%5Db%5Cc): credit"
/// );
/// ```
#[must_use]
pub fn index_line(filename: &str, credit: &str) -> String {
    let escaped = filename.replace('\\', "\\\\").replace(']', "\\]");
    format!("- [{}]({}): {}", escaped, percent_encode(filename), credit)
}

/// Build the HTML credit fragment for a page
///
/// Returns `None` when the page has no image variant; callers treat that as
/// a per-record failure before formatting.
#[must_use]
pub fn credit(page: &PageRecord, service_name: &str) -> Option<String> {
    let image = page.primary_image()?;
    let metadata = &image.ext_metadata;

    let mut author = metadata
        .artist
        .as_ref()
        .map(|artist| html_to_text(&artist.value).trim().to_string())
        .unwrap_or_default();
    if contains_ignore_case(&author, "Unknown author") {
        author.clear();
    }

    let mut license = metadata
        .license_short_name
        .as_ref()
        .map(|license| license.value.clone())
        .unwrap_or_default();
    if contains_ignore_case(&license, "Unknown license") {
        license.clear();
    }

    let license_url = match (&metadata.license_url, license.is_empty()) {
        (Some(url), false) => url.value.as_str(),
        _ => "",
    };

    let license = or_fallback(strip_newlines(&license), UNKNOWN_LICENSE_TEXT);
    let license_link = if license_url.is_empty() {
        license
    } else {
        format!("<a href=\"{}\">{}</a>", license_url, license)
    };
    let author = or_fallback(strip_newlines(&author), UNKNOWN_AUTHOR_TEXT);

    Some(format!(
        "<a href=\"{}\">{}</a>, {}, via {}",
        image.description_url, author, license_link, service_name
    ))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn strip_newlines(text: &str) -> String {
    text.replace('\n', "")
}

fn or_fallback(text: String, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

/// Convert an HTML fragment to a plain-text approximation
///
/// Block elements and `<br>` become single line breaks, whitespace runs are
/// collapsed, `<em>`/`<i>` are wrapped in `_`, `<strong>`/`<b>` in `__`, list
/// items are prefixed with `- `, and links keep only their text.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = TextBuilder::default();
    render_children(fragment.root_element(), &mut out);
    out.finish()
}

fn render_children(element: ElementRef<'_>, out: &mut TextBuilder) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_text(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    render_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, out: &mut TextBuilder) {
    match element.value().name() {
        "script" | "style" | "head" | "title" => {}
        "br" => out.line_break(),
        "em" | "i" => out.wrap(element, "_"),
        "strong" | "b" => out.wrap(element, "__"),
        "li" => {
            out.line_break();
            out.push_mark("- ");
            render_children(element, out);
            out.line_break();
        }
        "p" | "div" | "ul" | "ol" | "table" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5"
        | "h6" | "blockquote" => {
            out.line_break();
            render_children(element, out);
            out.line_break();
        }
        _ => render_children(element, out),
    }
}

/// Accumulates rendered text with whitespace collapsing
#[derive(Default)]
struct TextBuilder {
    text: String,
    pending_space: bool,
}

impl TextBuilder {
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = !self.text.is_empty() && !self.text.ends_with('\n');
            } else {
                self.flush_space();
                self.text.push(c);
            }
        }
    }

    fn push_mark(&mut self, mark: &str) {
        self.flush_space();
        self.text.push_str(mark);
    }

    fn wrap(&mut self, element: ElementRef<'_>, mark: &str) {
        self.push_mark(mark);
        render_children(element, self);
        // Closing marks hug the text; a trailing space moves after them
        self.text.push_str(mark);
    }

    fn line_break(&mut self) {
        self.pending_space = false;
        let trimmed = self.text.trim_end_matches(' ').len();
        self.text.truncate(trimmed);
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    fn flush_space(&mut self) {
        if self.pending_space {
            self.text.push(' ');
            self.pending_space = false;
        }
    }

    fn finish(self) -> String {
        self.text
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExtMetadata, ImageVariant, MetadataValue};

    fn page(ext_metadata: ExtMetadata) -> PageRecord {
        PageRecord {
            title: "File:Example.jpg".to_string(),
            image_info: vec![ImageVariant {
                description_url: "https://commons.wikimedia.org/wiki/File:Example.jpg"
                    .to_string(),
                url: "https://upload.wikimedia.org/example.jpg".to_string(),
                ext_metadata,
            }],
        }
    }

    #[test]
    fn test_index_line_escapes_label_and_target() {
        let line = index_line("a]b\\c", "credit");
        assert!(line.contains("a\\]b\\\\c"));
        assert!(line.contains("a%5Db%5Cc"));
        assert!(line.ends_with(": credit"));
    }

    #[test]
    fn test_index_line_keeps_slash_and_comma() {
        assert_eq!(
            index_line("Map, 1900/north.png", "c"),
            "- [Map, 1900/north.png](Map,%201900/north.png): c"
        );
    }

    #[test]
    fn test_percent_round_trip() {
        for name in [
            "Zed.jpg",
            "a]b\\c",
            "dir/file,1.png",
            "Ünïcödé 名前.svg",
            "100% (real).jpg",
            "+plus+.jpg",
        ] {
            assert_eq!(percent_decode(&percent_encode(name)), name, "{name}");
        }
    }

    #[test]
    fn test_percent_decode_tolerates_invalid_utf8() {
        assert_eq!(percent_decode("a%FFb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_credit_full_metadata() {
        let credit = credit(
            &page(ExtMetadata {
                artist: Some(MetadataValue::new(
                    "<a href=\"//commons.wikimedia.org/wiki/User:Jane\">Jane Doe</a>",
                )),
                license_short_name: Some(MetadataValue::new("CC BY-SA 4.0")),
                license_url: Some(MetadataValue::new(
                    "https://creativecommons.org/licenses/by-sa/4.0",
                )),
            }),
            "Wikimedia Commons",
        )
        .unwrap();

        assert_eq!(
            credit,
            "<a href=\"https://commons.wikimedia.org/wiki/File:Example.jpg\">Jane Doe</a>, \
             <a href=\"https://creativecommons.org/licenses/by-sa/4.0\">CC BY-SA 4.0</a>, \
             via Wikimedia Commons"
        );
    }

    #[test]
    fn test_credit_without_metadata_uses_fallbacks() {
        let credit = credit(&page(ExtMetadata::default()), "Wikimedia Commons").unwrap();
        assert_eq!(
            credit,
            "<a href=\"https://commons.wikimedia.org/wiki/File:Example.jpg\">See page for author</a>, \
             See page for license, via Wikimedia Commons"
        );
    }

    #[test]
    fn test_credit_discards_unknown_markers() {
        let credit = credit(
            &page(ExtMetadata {
                artist: Some(MetadataValue::new("<b>UNKNOWN AUTHOR</b>")),
                license_short_name: Some(MetadataValue::new("unknown License")),
                license_url: Some(MetadataValue::new("https://example.org/license")),
            }),
            "Wikimedia Commons",
        )
        .unwrap();

        assert!(credit.contains(">See page for author</a>"));
        assert!(credit.contains(", See page for license, "));
        assert!(
            !credit.contains("example.org/license"),
            "license URL needs a license"
        );
    }

    #[test]
    fn test_credit_strips_newlines() {
        let credit = credit(
            &page(ExtMetadata {
                artist: Some(MetadataValue::new("<p>Jane</p><p>Doe</p>")),
                license_short_name: Some(MetadataValue::new("Public\ndomain")),
                license_url: None,
            }),
            "Example",
        )
        .unwrap();

        assert!(!credit.contains('\n'));
        assert!(credit.contains(">JaneDoe</a>"));
        assert!(credit.contains(", Publicdomain, via Example"));
    }

    #[test]
    fn test_credit_requires_image_variant() {
        let page = PageRecord {
            title: "File:Bad.jpg".to_string(),
            image_info: vec![],
        };
        assert!(credit(&page, "Wikimedia Commons").is_none());
    }

    #[test]
    fn test_html_to_text_conventions() {
        assert_eq!(html_to_text("  Jane   <i>Doe</i>  "), "Jane _Doe_");
        assert_eq!(html_to_text("<strong>Bold</strong> move"), "__Bold__ move");
        assert_eq!(html_to_text("Line<br>break"), "Line\nbreak");
        assert_eq!(
            html_to_text("<ul><li>one</li><li>two</li></ul>"),
            "- one\n- two\n"
        );
        assert_eq!(
            html_to_text("<span>Tom &amp; Jerry</span><script>x()</script>"),
            "Tom & Jerry"
        );
    }
}
