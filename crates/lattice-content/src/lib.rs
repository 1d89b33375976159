//! Content parser with frontmatter and heading extraction.
//!
//! This crate turns a single source content file (a markdown page with an
//! optional YAML or TOML frontmatter block) into a normalized [`ContentRecord`].
//! Parsing is pure: file discovery and route assignment are supplied by the caller.

pub mod frontmatter;
pub mod parser;
pub mod record;
pub mod route;
pub mod value;

pub use frontmatter::{Frontmatter, FrontmatterError, FrontmatterFormat};
pub use parser::{parse_content, Heading, ParseError, ParsedContent};
pub use record::ContentRecord;
pub use route::{fallback_title, normalize_route, PathRouteResolver, RouteResolver};
pub use value::Value;
