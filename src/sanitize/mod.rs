//! HTML sanitization gate.
//!
//! Every rendered fragment passes through an allow-list sanitizer before it
//! is cached or served. The sanitizer re-emits markup from scratch: allowed
//! tags with allowed attributes survive, everything else is dropped, and all
//! text is escaped on output.
//!
//! ## Rules
//!
//! - Tags outside the allow-list are unwrapped: the markup is dropped but
//!   their text content is kept.
//! - `script`, `style`, `iframe`, `object`, and `embed` are dropped together
//!   with their entire content.
//! - Attributes named `on*` are always removed.
//! - `href`/`src` values with `javascript:`/`vbscript:` schemes are removed;
//!   `data:` URLs are allowed only for `img[src]` with a `data:image/` prefix.
//! - HTML comments are stripped when configured (default on).
//! - Output is well-formed: every emitted open tag is closed, in order.

use crate::config::SanitizerConfig;
use std::collections::{HashMap, HashSet};

/// Tags whose content is dropped entirely, never unwrapped.
const BANNED_WITH_CONTENT: &[&str] = &["script", "style", "iframe", "object", "embed"];

/// Void elements: emitted self-contained, never pushed on the open stack.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img"];

/// Attributes allowed on every tag in the allow-list.
const GLOBAL_ATTRIBUTES: &[&str] = &["class", "id", "title"];

/// Result of sanitizing a fragment.
#[derive(Debug, Clone)]
pub struct Sanitized {
    /// The cleaned markup
    pub html: String,
    /// Count of removed tags, attributes, and comments
    pub removals: u64,
}

/// Allow-list HTML sanitizer.
///
/// Construction is cheap; a single instance is shared through `AppState`.
pub struct Sanitizer {
    allowed: HashMap<String, HashSet<String>>,
    strip_comments: bool,
}

impl Sanitizer {
    /// Build a sanitizer from configuration.
    ///
    /// Config extensions are additive; the hard-banned elements stay banned
    /// even if listed in `extra_tags`.
    pub fn new(config: &SanitizerConfig) -> Self {
        let mut allowed: HashMap<String, HashSet<String>> = HashMap::new();

        let base: &[(&str, &[&str])] = &[
            ("div", &[]),
            ("span", &[]),
            ("p", &[]),
            ("h1", &[]),
            ("h2", &[]),
            ("h3", &[]),
            ("h4", &[]),
            ("h5", &[]),
            ("h6", &[]),
            ("table", &[]),
            ("caption", &[]),
            ("thead", &[]),
            ("tbody", &[]),
            ("tr", &[]),
            ("th", &["scope"]),
            ("td", &[]),
            ("ul", &[]),
            ("ol", &["start"]),
            ("li", &[]),
            ("a", &["href"]),
            ("strong", &[]),
            ("em", &[]),
            ("code", &[]),
            ("pre", &[]),
            ("br", &[]),
            ("hr", &[]),
            ("img", &["src", "alt", "width", "height"]),
        ];
        for (tag, attrs) in base {
            allowed.insert(
                tag.to_string(),
                attrs.iter().map(|a| a.to_string()).collect(),
            );
        }

        for tag in &config.extra_tags {
            let tag = tag.to_lowercase();
            if BANNED_WITH_CONTENT.contains(&tag.as_str()) {
                continue;
            }
            allowed.entry(tag).or_default();
        }
        for (tag, attrs) in &config.extra_attributes {
            if let Some(set) = allowed.get_mut(&tag.to_lowercase()) {
                set.extend(attrs.iter().map(|a| a.to_lowercase()));
            }
        }

        Self {
            allowed,
            strip_comments: config.strip_comments,
        }
    }

    /// Sanitize a fragment, returning cleaned markup and a removal count.
    pub fn sanitize(&self, input: &str) -> Sanitized {
        let mut out = String::with_capacity(input.len());
        let mut removals = 0u64;
        let mut open_stack: Vec<String> = Vec::new();
        let bytes = input.as_bytes();

        let mut i = 0;
        while i < input.len() {
            if bytes[i] != b'<' {
                let next_lt = input[i..].find('<').map(|p| i + p).unwrap_or(input.len());
                escape_text_into(&mut out, &input[i..next_lt]);
                i = next_lt;
                continue;
            }

            // Comment
            if input[i..].starts_with("<!--") {
                let end = input[i + 4..]
                    .find("-->")
                    .map(|p| i + 4 + p + 3)
                    .unwrap_or(input.len());
                if self.strip_comments {
                    removals += 1;
                } else {
                    out.push_str(&input[i..end]);
                }
                i = end;
                continue;
            }

            // Doctype or other declaration: drop
            if input[i..].starts_with("<!") {
                let end = input[i..].find('>').map(|p| i + p + 1).unwrap_or(input.len());
                removals += 1;
                i = end;
                continue;
            }

            match parse_tag(&input[i..]) {
                Some(tag) => {
                    let consumed = tag.consumed;
                    if tag.closing {
                        if self.allowed.contains_key(&tag.name) {
                            self.emit_close(&mut out, &mut open_stack, &tag.name);
                        } else {
                            removals += 1;
                        }
                    } else if BANNED_WITH_CONTENT.contains(&tag.name.as_str()) {
                        removals += 1;
                        let skipped = skip_banned_content(&input[i + consumed..], &tag.name);
                        i += consumed + skipped;
                        continue;
                    } else if let Some(allowed_attrs) = self.allowed.get(&tag.name) {
                        removals += self.emit_open(&mut out, &tag, allowed_attrs);
                        if !tag.self_closing && !VOID_ELEMENTS.contains(&tag.name.as_str()) {
                            open_stack.push(tag.name.clone());
                        }
                    } else {
                        // Unwrap: drop the markup, keep whatever text follows
                        removals += 1;
                    }
                    i += consumed;
                }
                None => {
                    // Stray '<' that never forms a tag
                    out.push_str("&lt;");
                    i += 1;
                }
            }
        }

        // Close anything still open, innermost first
        while let Some(name) = open_stack.pop() {
            out.push_str("</");
            out.push_str(&name);
            out.push('>');
        }

        Sanitized { html: out, removals }
    }

    /// Emit an open tag with filtered attributes. Returns removed-attr count.
    fn emit_open(&self, out: &mut String, tag: &ParsedTag, allowed_attrs: &HashSet<String>) -> u64 {
        let mut removed = 0u64;
        out.push('<');
        out.push_str(&tag.name);
        for (name, value) in &tag.attributes {
            if !self.attribute_allowed(&tag.name, name, value, allowed_attrs) {
                removed += 1;
                continue;
            }
            out.push(' ');
            out.push_str(name);
            if let Some(value) = value {
                out.push_str("=\"");
                escape_attr_into(out, value);
                out.push('"');
            }
        }
        if VOID_ELEMENTS.contains(&tag.name.as_str()) {
            out.push_str(" />");
        } else {
            out.push('>');
        }
        removed
    }

    /// Emit a close tag, closing intermediate open tags to stay well-formed.
    fn emit_close(&self, out: &mut String, open_stack: &mut Vec<String>, name: &str) {
        if let Some(pos) = open_stack.iter().rposition(|n| n == name) {
            while open_stack.len() > pos {
                let closing = open_stack.pop().unwrap_or_default();
                out.push_str("</");
                out.push_str(&closing);
                out.push('>');
            }
        }
        // Close tag with no matching open is dropped silently
    }

    fn attribute_allowed(
        &self,
        tag: &str,
        name: &str,
        value: &Option<String>,
        allowed_attrs: &HashSet<String>,
    ) -> bool {
        if name.starts_with("on") {
            return false;
        }
        if !allowed_attrs.contains(name) && !GLOBAL_ATTRIBUTES.contains(&name) {
            return false;
        }
        if name == "href" || name == "src" {
            let value = match value {
                Some(v) => v,
                None => return false,
            };
            if !url_scheme_allowed(tag, name, value) {
                return false;
            }
        }
        true
    }
}

/// A parsed tag token.
struct ParsedTag {
    name: String,
    closing: bool,
    self_closing: bool,
    attributes: Vec<(String, Option<String>)>,
    /// Bytes consumed from the input, including the angle brackets
    consumed: usize,
}

/// Parse a tag starting at a `<`. Returns None if no well-formed tag starts here.
fn parse_tag(input: &str) -> Option<ParsedTag> {
    let bytes = input.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&b'<'));

    let mut pos = 1;
    let closing = bytes.get(pos) == Some(&b'/');
    if closing {
        pos += 1;
    }

    let name_start = pos;
    while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'-') {
        pos += 1;
    }
    if pos == name_start {
        return None;
    }
    let name = input[name_start..pos].to_lowercase();

    let mut attributes = Vec::new();
    let mut self_closing = false;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return None, // Unterminated tag
            Some(b'>') => {
                pos += 1;
                break;
            }
            Some(b'/') => {
                self_closing = true;
                pos += 1;
            }
            Some(_) => {
                let attr_start = pos;
                while pos < bytes.len()
                    && !bytes[pos].is_ascii_whitespace()
                    && bytes[pos] != b'='
                    && bytes[pos] != b'>'
                    && bytes[pos] != b'/'
                {
                    pos += 1;
                }
                if pos == attr_start {
                    return None;
                }
                let attr_name = input[attr_start..pos].to_lowercase();

                while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                let value = if bytes.get(pos) == Some(&b'=') {
                    pos += 1;
                    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                        pos += 1;
                    }
                    match bytes.get(pos) {
                        Some(&q) if q == b'"' || q == b'\'' => {
                            pos += 1;
                            let value_start = pos;
                            while pos < bytes.len() && bytes[pos] != q {
                                pos += 1;
                            }
                            if pos >= bytes.len() {
                                return None; // Unterminated quote
                            }
                            let value = input[value_start..pos].to_string();
                            pos += 1;
                            Some(value)
                        }
                        _ => {
                            let value_start = pos;
                            while pos < bytes.len()
                                && !bytes[pos].is_ascii_whitespace()
                                && bytes[pos] != b'>'
                            {
                                pos += 1;
                            }
                            Some(input[value_start..pos].to_string())
                        }
                    }
                } else {
                    None
                };
                attributes.push((attr_name, value));
            }
        }
    }

    Some(ParsedTag {
        name,
        closing,
        self_closing,
        attributes,
        consumed: pos,
    })
}

/// Skip past the matching close tag of a banned element.
///
/// Returns the number of bytes to skip. If no close tag is found the rest of
/// the input is consumed (content stays dropped, never half-emitted).
fn skip_banned_content(input: &str, name: &str) -> usize {
    // Byte-window comparison keeps offsets valid: tag names are ASCII, and
    // Unicode-aware lowercasing can change byte lengths mid-input.
    let bytes = input.as_bytes();
    let close_len = name.len() + 2;
    let mut i = 0;
    while i + close_len <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1] == b'/'
            && bytes[i + 2..i + close_len].eq_ignore_ascii_case(name.as_bytes())
        {
            return match input[i + close_len..].find('>') {
                Some(q) => i + close_len + q + 1,
                None => input.len(),
            };
        }
        i += 1;
    }
    input.len()
}

/// Check URL scheme policy for href/src attributes.
fn url_scheme_allowed(tag: &str, attr: &str, value: &str) -> bool {
    // Decode character entities first: the browser decodes the attribute, so
    // "javascript&#58;..." is a live scheme even though the raw value has no
    // colon. Then strip ASCII whitespace and control chars that browsers
    // ignore inside schemes ("java\tscript:" still executes).
    let compact: String = decode_entities(value)
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_lowercase();

    if compact.starts_with("javascript:") || compact.starts_with("vbscript:") {
        return false;
    }
    if compact.starts_with("data:") {
        return tag == "img" && attr == "src" && compact.starts_with("data:image/");
    }
    true
}

/// Escape a text node into `out`.
///
/// Existing character entities (`&amp;`, `&#x27;`) are preserved rather than
/// double-escaped.
fn escape_text_into(out: &mut String, text: &str) {
    let bytes = text.as_bytes();
    let mut i = 0;
    for (idx, ch) in text.char_indices() {
        if idx < i {
            continue;
        }
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => {
                if let Some(len) = entity_length(&bytes[idx..]) {
                    out.push_str(&text[idx..idx + len]);
                    i = idx + len;
                    continue;
                }
                out.push_str("&amp;");
            }
            c => out.push(c),
        }
        i = idx + ch.len_utf8();
    }
}

/// Escape an attribute value into `out`.
///
/// Like text escaping, existing entities are preserved so that re-sanitizing
/// emitted markup is a no-op.
fn escape_attr_into(out: &mut String, value: &str) {
    let bytes = value.as_bytes();
    let mut i = 0;
    for (idx, ch) in value.char_indices() {
        if idx < i {
            continue;
        }
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => {
                if let Some(len) = entity_length(&bytes[idx..]) {
                    out.push_str(&value[idx..idx + len]);
                    i = idx + len;
                    continue;
                }
                out.push_str("&amp;");
            }
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
        i = idx + ch.len_utf8();
    }
}

/// Decode character entities for URL scheme inspection.
///
/// Numeric entities and the named ones browsers use in scheme smuggling are
/// decoded; any other well-formed entity is dropped rather than kept
/// literal, so an undecodable entity can never hide scheme bytes.
fn decode_entities(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = String::with_capacity(value.len());
    let mut skip = 0;
    for (idx, ch) in value.char_indices() {
        if idx < skip {
            continue;
        }
        if ch == '&' {
            if let Some(len) = entity_length(&bytes[idx..]) {
                if let Some(decoded) = decode_entity(&value[idx + 1..idx + len - 1]) {
                    out.push(decoded);
                }
                skip = idx + len;
                continue;
            }
        }
        out.push(ch);
        skip = idx + ch.len_utf8();
    }
    out
}

/// Decode a single entity body (the part between `&` and `;`).
fn decode_entity(body: &str) -> Option<char> {
    let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = body.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return match body {
            "amp" | "AMP" => Some('&'),
            "lt" | "LT" => Some('<'),
            "gt" | "GT" => Some('>'),
            "quot" | "QUOT" => Some('"'),
            "apos" => Some('\''),
            "colon" => Some(':'),
            "sol" => Some('/'),
            "Tab" => Some('\t'),
            "NewLine" => Some('\n'),
            _ => None,
        };
    };
    char::from_u32(code)
}

/// Length of a well-formed entity at the start of `bytes`, if any.
fn entity_length(bytes: &[u8]) -> Option<usize> {
    debug_assert_eq!(bytes.first(), Some(&b'&'));
    let mut i = 1;
    if bytes.get(i) == Some(&b'#') {
        i += 1;
        if bytes.get(i) == Some(&b'x') || bytes.get(i) == Some(&b'X') {
            i += 1;
        }
    }
    let body_start = i;
    while i < bytes.len() && i < 12 && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i > body_start && bytes.get(i) == Some(&b';') {
        Some(i + 1)
    } else {
        None
    }
}
