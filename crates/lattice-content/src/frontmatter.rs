//! Frontmatter extraction and parsing.

use std::collections::BTreeMap;

use crate::value::Value;

/// Syntax of a frontmatter block, chosen by its fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// `---` fenced YAML
    Yaml,
    /// `+++` fenced TOML
    Toml,
}

impl FrontmatterFormat {
    fn fence(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Parsed frontmatter from a content file.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    /// Fence syntax the block was written in
    pub format: FrontmatterFormat,

    /// Every key of the block, in key order
    pub data: BTreeMap<String, Value>,
}

impl Frontmatter {
    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Look up a top-level key holding a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// Extract frontmatter from content.
///
/// Returns the parsed frontmatter and the remaining content after the frontmatter block.
/// A block opens only when the first line is exactly a fence, so a leading
/// horizontal rule or `----` is body content. A file without a leading fence
/// has no frontmatter, which is not an error.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    let Some((first, body)) = split_line(trimmed) else {
        return Ok((None, source));
    };
    let format = match first {
        "---" => FrontmatterFormat::Yaml,
        "+++" => FrontmatterFormat::Toml,
        _ => return Ok((None, source)),
    };

    // Find the closing fence line
    let mut offset = 0;
    let (block, remaining) = loop {
        let rest = &body[offset..];
        match split_line(rest) {
            Some((line, next)) if line == format.fence() => break (&body[..offset], next),
            Some((_, next)) => offset = body.len() - next.len(),
            None if rest.trim_end_matches('\r') == format.fence() => break (&body[..offset], ""),
            None => return Err(FrontmatterError::Unclosed(format.fence())),
        }
    };

    let data = match format {
        FrontmatterFormat::Yaml => parse_yaml(block.trim())?,
        FrontmatterFormat::Toml => parse_toml(block.trim())?,
    };

    Ok((Some(Frontmatter { format, data }), remaining.trim_start()))
}

/// Split off the first line, without its line ending.
fn split_line(s: &str) -> Option<(&str, &str)> {
    let (line, rest) = s.split_once('\n')?;
    Some((line.strip_suffix('\r').unwrap_or(line), rest))
}

fn parse_yaml(block: &str) -> Result<BTreeMap<String, Value>, FrontmatterError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|e| FrontmatterError::Malformed {
            format: "YAML",
            message: e.to_string(),
        })?;

    match Value::from(yaml) {
        Value::Map(map) => Ok(map),
        // An empty block parses as null
        Value::Null => Ok(BTreeMap::new()),
        other => Err(FrontmatterError::Malformed {
            format: "YAML",
            message: format!("expected a mapping, found {}", other.type_name()),
        }),
    }
}

fn parse_toml(block: &str) -> Result<BTreeMap<String, Value>, FrontmatterError> {
    let table: toml::Table = toml::from_str(block).map_err(|e| FrontmatterError::Malformed {
        format: "TOML",
        message: e.to_string(),
    })?;

    Ok(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing {0}")]
    Unclosed(&'static str),

    #[error("Malformed {format} frontmatter: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },
}
