//! Readable-text extraction from raw HTML.
//!
//! Extraction is regex based: noise elements are removed, block boundaries
//! become line breaks, remaining tags are stripped and entities decoded.
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Text blocks at or under this many characters are treated as navigation or
/// boilerplate and dropped.
pub const MIN_BLOCK_CHARS: usize = 40;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("extraction pattern is valid"));
    };
}

pattern!(NOISE, r"(?is)<!--.*?-->|<(script|style|noscript|template|svg)\b[^>]*>.*?</(script|style|noscript|template|svg)\s*>");
pattern!(PARAGRAPH, r"(?is)<p\b[^>]*>(.*?)</p\s*>");
pattern!(TITLE, r"(?is)<title\b[^>]*>(.*?)</title\s*>");
pattern!(ARTICLE, r"(?is)<article\b[^>]*>(.*)</article\s*>");
pattern!(MAIN, r"(?is)<main\b[^>]*>(.*)</main\s*>");
pattern!(BODY, r"(?is)<body\b[^>]*>(.*)</body\s*>");
pattern!(BOILERPLATE, r"(?is)<(nav|header|footer|aside|form)\b[^>]*>.*?</(nav|header|footer|aside|form)\s*>");
pattern!(BLOCK_BREAK, r"(?i)<br\s*/?>|</?(p|div|li|ul|ol|h[1-6]|section|blockquote|tr|table|pre)\b[^>]*>");
pattern!(TAG, r"(?s)<[^>]*>");
pattern!(ENTITY, r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});");
pattern!(INLINE_SPACE, r"[ \t\r\x0C\u{00A0}]+");

/// A strategy that turns a page's HTML into cleaned text.
pub trait ContentExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the extracted text, or `None` when nothing usable was found.
    fn extract(&self, html: &str) -> Option<String>;
}

/// Collects `<p>` blocks longer than [`MIN_BLOCK_CHARS`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ParagraphExtractor;

impl ContentExtractor for ParagraphExtractor {
    fn name(&self) -> &'static str {
        "paragraphs"
    }

    fn extract(&self, html: &str) -> Option<String> {
        let html = NOISE.replace_all(html, " ");
        let blocks: Vec<String> = PARAGRAPH
            .captures_iter(&html)
            .map(|cap| collapse_whitespace(&inline_text(&cap[1])))
            .filter(|text| is_substantial(text))
            .collect();

        non_empty(blocks.join("\n"))
    }
}

/// Reads the main content container (`<article>`, then `<main>`, then
/// `<body>`) and keeps substantial lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArticleExtractor;

impl ContentExtractor for ArticleExtractor {
    fn name(&self) -> &'static str {
        "article"
    }

    fn extract(&self, html: &str) -> Option<String> {
        let html = NOISE.replace_all(html, " ");
        let container = [&ARTICLE, &MAIN, &BODY]
            .iter()
            .find_map(|re| re.captures(&html).map(|cap| cap[1].to_string()))
            .unwrap_or_else(|| html.to_string());

        let container = BOILERPLATE.replace_all(&container, "\n");
        let broken = BLOCK_BREAK.replace_all(&container, "\n");
        let text = decode_entities(&TAG.replace_all(&broken, " "));

        let lines: Vec<String> = text
            .lines()
            .map(collapse_whitespace)
            .filter(|line| is_substantial(line))
            .collect();

        non_empty(lines.join("\n"))
    }
}

/// Returns the default extraction chain: paragraphs first, then the article
/// heuristic.
pub fn default_extractors() -> Vec<Box<dyn ContentExtractor>> {
    vec![Box::new(ParagraphExtractor), Box::new(ArticleExtractor)]
}

/// Returns the cleaned `<title>` text, if present and non-empty.
pub fn extract_title(html: &str) -> Option<String> {
    let cap = TITLE.captures(html)?;
    non_empty(collapse_whitespace(&inline_text(&cap[1])))
}

/// Returns the host component of `url`.
pub fn host_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_string())
}

fn inline_text(fragment: &str) -> String {
    decode_entities(&TAG.replace_all(fragment, " "))
}

fn collapse_whitespace(text: &str) -> String {
    INLINE_SPACE
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_substantial(text: &str) -> bool {
    text.chars().count() > MIN_BLOCK_CHARS
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Decodes the common named entities and all numeric character references.
/// Unknown entities are left untouched.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |cap: &Captures<'_>| {
            let entity = &cap[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            decoded.map_or_else(|| cap[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "deg" => '\u{00B0}',
        _ => return None,
    };
    Some(c)
}
