//! Front-matter parsing

use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::PathBuf;

use crate::error::{BuildError, Result};

/// Delimiter line opening and closing a front-matter block
pub const DELIMITER: &str = "---";

/// Flat key/value metadata from the top of a content file.
///
/// Keys are lowercased; values are kept as strings and coerced later by
/// [`crate::content::Page::from_front_matter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    fields: IndexMap<String, String>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start_matches('\u{feff}');

        if content.trim().is_empty() {
            return Ok((FrontMatter::default(), ""));
        }

        match split_block(content)? {
            Some((block, body)) => {
                let fields = parse_block(block)?;
                Ok((Self { fields }, body.trim_start_matches(['\n', '\r'])))
            }
            None => Ok((FrontMatter::default(), content)),
        }
    }

    /// Look up a field; blank values count as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into().to_lowercase(), value.into());
    }

    /// Iterate over all keys in source order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize back into a delimited front-matter block.
    ///
    /// Values are always double-quoted, so parsing the result yields the same
    /// strings regardless of what they look like to a YAML reader.
    pub fn to_yaml(&self) -> String {
        let mut out = String::from(DELIMITER);
        out.push('\n');
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&quote(value));
            out.push('\n');
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out
    }
}

fn malformed(reason: impl Into<String>) -> BuildError {
    BuildError::MalformedFrontMatter {
        path: PathBuf::new(),
        reason: reason.into(),
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Find the metadata block and the body.
///
/// Returns `None` when the first non-blank line is not a delimiter.
fn split_block(content: &str) -> Result<Option<(&str, &str)>> {
    let mut offset = 0;
    let mut lines = content.split_inclusive('\n');

    // Leading blank lines before the opening delimiter are tolerated
    let opening = loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => offset += line.len(),
            Some(line) => break line,
            None => return Ok(None),
        }
    };
    if !is_delimiter(opening) {
        return Ok(None);
    }

    let block_start = offset + opening.len();
    offset = block_start;
    for line in lines {
        if is_delimiter(line) {
            let block = &content[block_start..offset];
            let body = &content[offset + line.len()..];
            return Ok(Some((block, body)));
        }
        offset += line.len();
    }

    Err(malformed("opening `---` has no matching closing `---`"))
}

/// Parse the metadata block, as YAML when possible and as `key: value`
/// lines otherwise.
fn parse_block(block: &str) -> Result<IndexMap<String, String>> {
    if block.trim().is_empty() {
        return Ok(IndexMap::new());
    }

    match serde_yaml::from_str::<Value>(block) {
        Ok(Value::Mapping(map)) => {
            let mut fields = IndexMap::new();
            for (key, value) in map {
                let Some(key) = scalar_to_string(&key) else {
                    tracing::warn!("Ignoring non-scalar front-matter key {:?}", key);
                    continue;
                };
                let key = key.trim().to_lowercase();
                if value.is_null() {
                    // `title: #1 tips` reads as a comment to YAML
                    fields.insert(key.clone(), raw_line_value(block, &key).unwrap_or_default());
                    continue;
                }
                match value_to_string(&value) {
                    Some(value) => {
                        fields.insert(key, value);
                    }
                    None => tracing::warn!("Ignoring nested front-matter value for `{}`", key),
                }
            }
            Ok(fields)
        }
        Ok(Value::Null) => Ok(IndexMap::new()),
        Ok(_) => parse_lines(block),
        Err(e) => {
            tracing::debug!("Front matter is not valid YAML ({}), splitting lines", e);
            parse_lines(block)
        }
    }
}

/// Line-oriented fallback: every non-blank, non-comment line must be
/// `key: value`, split at the first colon.
fn parse_lines(block: &str) -> Result<IndexMap<String, String>> {
    let mut fields = IndexMap::new();
    for line in block.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            return Err(malformed(format!("expected `key: value`, found `{}`", trimmed)));
        };
        let key = key.trim().to_lowercase();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(malformed(format!("invalid key in `{}`", trimmed)));
        }
        fields.insert(key, unquote(value.trim()).to_string());
    }
    Ok(fields)
}

/// Text after the colon on the `key:` line, for values YAML read as null
fn raw_line_value(block: &str, key: &str) -> Option<String> {
    block
        .lines()
        .find_map(|line| {
            let (k, v) = line.trim().split_once(':')?;
            k.trim().eq_ignore_ascii_case(key).then(|| unquote(v.trim()).to_string())
        })
        .filter(|v| !matches!(v.as_str(), "" | "~" | "null" | "Null" | "NULL"))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Scalars become strings, sequences of scalars are joined with `", "`
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(items) => {
            let parts: Option<Vec<String>> = items.iter().map(scalar_to_string).collect();
            parts.map(|p| p.join(", "))
        }
        Value::Tagged(tagged) => value_to_string(&tagged.value),
        other => scalar_to_string(other),
    }
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
