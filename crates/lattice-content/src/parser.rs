//! Content document parser.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};

/// A parsed content document.
#[derive(Debug, Clone)]
pub struct ParsedContent {
    /// Parsed frontmatter (if present)
    pub frontmatter: Option<Frontmatter>,

    /// Markdown body (without frontmatter)
    pub body: String,

    /// Heading outline of the body
    pub headings: Vec<Heading>,
}

/// A heading found in the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Errors that can occur when parsing content.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// Parse a content document.
///
/// Extracts frontmatter and the heading outline of the body.
pub fn parse_content(source: &str) -> Result<ParsedContent, ParseError> {
    let (frontmatter, body) = extract_frontmatter(source)?;

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let mut headings = Vec::new();
    let mut current_heading: Option<(u8, String)> = None;

    for event in Parser::new_ext(body, options) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current_heading = Some((level as u8, String::new()));
            }

            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut heading_text)) = current_heading {
                    heading_text.push_str(&text);
                }
            }

            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title)) = current_heading.take() {
                    let id = slugify(&title);
                    headings.push(Heading { title, id, level });
                }
            }

            _ => {}
        }
    }

    Ok(ParsedContent {
        frontmatter,
        body: body.to_string(),
        headings,
    })
}

/// Convert a heading to a URL-safe slug.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_document() {
        let source = r#"---
title: Button
description: A button component
---

# Button

A clickable button.

## Variants

Different button styles, see `variant`.
"#;

        let doc = parse_content(source).unwrap();

        let fm = doc.frontmatter.unwrap();
        assert_eq!(fm.get_str("title"), Some("Button"));
        assert_eq!(fm.get_str("description"), Some("A button component"));

        assert!(doc.body.starts_with("# Button"));

        assert_eq!(doc.headings.len(), 2);
        assert_eq!(doc.headings[0].title, "Button");
        assert_eq!(doc.headings[0].level, 1);
        assert_eq!(doc.headings[0].id, "button");
        assert_eq!(doc.headings[1].title, "Variants");
        assert_eq!(doc.headings[1].level, 2);
    }

    #[test]
    fn parses_without_frontmatter() {
        let source = "# Just Markdown\n\nNo frontmatter.";

        let doc = parse_content(source).unwrap();

        assert!(doc.frontmatter.is_none());
        assert_eq!(doc.headings.len(), 1);
        assert_eq!(doc.headings[0].title, "Just Markdown");
    }

    #[test]
    fn keeps_inline_code_in_headings() {
        let doc = parse_content("## The `all` query").unwrap();

        assert_eq!(doc.headings[0].title, "The all query");
        assert_eq!(doc.headings[0].id, "the-all-query");
    }

    #[test]
    fn reports_malformed_frontmatter() {
        let result = parse_content("---\ntitle: [oops\n---\n# Body");

        assert!(matches!(result, Err(ParseError::Frontmatter(_))));
    }

    #[test]
    fn slugify_works() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("API Reference"), "api-reference");
        assert_eq!(slugify("Button (Primary)"), "button-primary");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
    }
}
