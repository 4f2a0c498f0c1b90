//! URL path templates with `:name` slots.
//!
//! ```
//! use reqflow::pathx::Template;
//! use std::collections::HashMap;
//!
//! let template = Template::parse("/:store/products/:product.json").unwrap();
//! let data = HashMap::from([("store", "1001"), ("product", "2020")]);
//! let (path, raw_path) = template.execute(&data);
//! assert_eq!(path, "/1001/products/2020.json");
//! assert_eq!(raw_path, "/1001/products/2020.json");
//! ```

use http::uri::{InvalidUri, Uri};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::Range;
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

const SLOT_PATTERN: &str = ":[a-zA-Z0-9_-]+";

static SLOT: OnceLock<Regex> = OnceLock::new();

fn slot_regex() -> Result<&'static Regex, TemplateError> {
    if let Some(re) = SLOT.get() {
        return Ok(re);
    }
    let re = Regex::new(SLOT_PATTERN)?;
    Ok(SLOT.get_or_init(|| re))
}

/// Errors raised by path templating.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The slot pattern failed to compile.
    #[error("path template pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A `%` is not followed by two hex digits.
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),

    /// The unescaped bytes are not UTF-8.
    #[error("unescaped path is not valid UTF-8")]
    InvalidUtf8,

    /// The base or the joined reference is not a valid absolute URL.
    #[error("resolve url: {0}")]
    Url(#[from] url::ParseError),

    /// The resolved URL does not form a valid URI.
    #[error("invalid resolved uri: {0}")]
    InvalidUri(#[from] InvalidUri),
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
    slots: Vec<Range<usize>>,
}

impl Template {
    /// Finds the slots in `text`. A slot is `:` followed by letters, digits,
    /// `_` or `-`.
    pub fn parse(text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        let slots = slot_regex()?.find_iter(&text).map(|m| m.range()).collect();
        Ok(Self { text, slots })
    }

    /// Returns the slot names in order of appearance.
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| &self.text[slot.start + 1..slot.end])
    }

    /// Fills the slots from `data`.
    ///
    /// Returns the plain path and the raw path, where each value is escaped
    /// as a single path segment. Missing values fill in as empty strings.
    pub fn execute<K, V>(&self, data: &HashMap<K, V>) -> (String, String)
    where
        K: Borrow<str> + Eq + Hash,
        V: AsRef<str>,
    {
        let mut path = String::with_capacity(self.text.len());
        let mut raw_path = String::with_capacity(self.text.len());

        let mut cursor = 0;
        for slot in &self.slots {
            let literal = &self.text[cursor..slot.start];
            path.push_str(literal);
            raw_path.push_str(literal);

            let value = data
                .get(&self.text[slot.start + 1..slot.end])
                .map_or("", |v| v.as_ref());
            path.push_str(value);
            path_escape_into(value, &mut raw_path);

            cursor = slot.end;
        }
        let tail = &self.text[cursor..];
        path.push_str(tail);
        raw_path.push_str(tail);

        (path, raw_path)
    }

    /// Fills the slots and resolves the result against `base` as a relative
    /// reference, removing `.` and `..` segments.
    ///
    /// The result always carries the base query. `base` must be absolute.
    pub fn resolve<K, V>(&self, base: &Uri, data: &HashMap<K, V>) -> Result<Uri, TemplateError>
    where
        K: Borrow<str> + Eq + Hash,
        V: AsRef<str>,
    {
        let (_, raw_path) = self.execute(data);
        // Values are already escaped; only template literals can still hold these.
        let reference = raw_path.replace('?', "%3F").replace('#', "%23");

        let base = Url::parse(&base.to_string())?;
        let mut resolved = base.join(&reference)?;
        resolved.set_query(base.query());
        Ok(Uri::try_from(resolved.as_str())?)
    }

    /// Returns the template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// Unreserved characters plus the sub-delims a path segment may carry as-is.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

fn path_escape_into(value: &str, out: &mut String) {
    out.extend(utf8_percent_encode(value, SEGMENT));
}

/// Escapes `value` for use as a single path segment.
#[must_use]
pub fn path_escape(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Reverses percent-escaping.
///
/// Every `%` must start a two digit hex escape.
pub fn path_unescape(raw: &str) -> Result<String, TemplateError> {
    for (i, _) in raw.match_indices('%') {
        let escape = raw.get(i..i + 3).unwrap_or(&raw[i..]);
        let valid = escape.len() == 3 && escape.bytes().skip(1).all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(TemplateError::InvalidEscape(escape.to_owned()));
        }
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| TemplateError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn execute(text: &str, data: &[(&str, &str)]) -> (String, String) {
        let data: HashMap<&str, &str> = data.iter().copied().collect();
        let (path, raw_path) = Template::parse(text).unwrap().execute(&data);
        assert_eq!(path_unescape(&raw_path).unwrap(), path);
        (path, raw_path)
    }

    #[test]
    fn test_execute_cases() {
        assert_eq!(execute("", &[]), (String::new(), String::new()));
        assert_eq!(execute("/", &[]), ("/".to_string(), "/".to_string()));
        assert_eq!(
            execute("/:store/products/:product.json", &[("store", "1001"), ("product", "2020")]),
            (
                "/1001/products/2020.json".to_string(),
                "/1001/products/2020.json".to_string()
            )
        );
        assert_eq!(
            execute("/:product.:ext", &[("product", "2020"), ("ext", "xml")]),
            ("/2020.xml".to_string(), "/2020.xml".to_string())
        );
    }

    #[test]
    fn test_execute_escapes_segment() {
        assert_eq!(
            execute("/:name", &[("name", "中/")]),
            ("/中/".to_string(), "/%E4%B8%AD%2F".to_string())
        );
        assert_eq!(path_escape("a b;c?d@e"), "a%20b%3Bc%3Fd@e");
    }

    #[test]
    fn test_missing_value_is_empty() {
        assert_eq!(execute("/items/:id", &[]).0, "/items/");
    }

    #[test]
    fn test_slot_names() {
        let template = Template::parse("/:store-id/x/:item_2").unwrap();
        assert_eq!(template.slot_names().collect::<Vec<_>>(), vec!["store-id", "item_2"]);
        assert_eq!(template.to_string(), "/:store-id/x/:item_2");
    }

    #[test]
    fn test_resolve_keeps_query() {
        let base: Uri = "https://www.example.com/v1/old?foo=bar".parse().unwrap();
        let data = HashMap::from([("store", "10001"), ("product", "2020")]);

        let absolute = Template::parse("/:store/products/:product.json").unwrap();
        assert_eq!(
            absolute.resolve(&base, &data).unwrap().to_string(),
            "https://www.example.com/10001/products/2020.json?foo=bar"
        );

        let relative = Template::parse(":store").unwrap();
        assert_eq!(
            relative.resolve(&base, &data).unwrap().to_string(),
            "https://www.example.com/v1/10001?foo=bar"
        );
    }

    #[test]
    fn test_resolve_removes_dot_segments() {
        let base: Uri = "https://www.example.com/v1/old".parse().unwrap();
        let data = HashMap::from([("store", "10001")]);

        let parent = Template::parse("../:store").unwrap();
        assert_eq!(
            parent.resolve(&base, &data).unwrap().to_string(),
            "https://www.example.com/10001"
        );

        let current = Template::parse("./:store/./items/../orders").unwrap();
        assert_eq!(
            current.resolve(&base, &data).unwrap().to_string(),
            "https://www.example.com/v1/10001/orders"
        );

        let above_root = Template::parse("../../../:store").unwrap();
        assert_eq!(
            above_root.resolve(&base, &data).unwrap().to_string(),
            "https://www.example.com/10001"
        );
    }

    #[test]
    fn test_resolve_escapes_literal_query_marks() {
        let base: Uri = "https://www.example.com/v1/?foo=bar".parse().unwrap();
        let data = HashMap::from([("id", "a?b")]);

        let template = Template::parse("items?:id").unwrap();
        assert_eq!(
            template.resolve(&base, &data).unwrap().to_string(),
            "https://www.example.com/v1/items%3Fa%3Fb?foo=bar"
        );
    }

    #[test]
    fn test_resolve_needs_absolute_base() {
        let base: Uri = "/v1/old".parse().unwrap();
        let data: HashMap<&str, &str> = HashMap::new();
        let err = Template::parse("/x").unwrap().resolve(&base, &data).unwrap_err();
        assert!(matches!(err, TemplateError::Url(url::ParseError::RelativeUrlWithoutBase)));
    }

    #[test]
    fn test_unescape_errors() {
        assert!(matches!(path_unescape("%zz"), Err(TemplateError::InvalidEscape(e)) if e == "%zz"));
        assert!(matches!(path_unescape("abc%4"), Err(TemplateError::InvalidEscape(_))));
        assert!(matches!(path_unescape("%FF"), Err(TemplateError::InvalidUtf8)));
    }
}
