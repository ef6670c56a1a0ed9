//! Name and link grammar for hierarchical IDs.
//!
//! Folder names carry a dotted numeric ID behind a scope letter:
//!
//! | type     | example      |
//! |----------|--------------|
//! | scope    | `S01`        |
//! | area     | `S01.10-19`  |
//! | category | `S01.11`     |
//! | item     | `S01.11.11`  |
//!
//! Notes reference categories and items through `[[...]]` links.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

const SCOPE_PATTERN: &str = r"^(S[0-9]{2})(?:\s|$)";
const AREA_PATTERN: &str = r"^(S[0-9]{2}\.[0-9]{2}-[0-9]{2})(?:\s|$)";
const CATEGORY_PATTERN: &str = r"^(S[0-9]{2}\.[0-9]{2})(?:\s|$)";
const ITEM_PATTERN: &str = r"^(S[0-9]{2}\.[0-9]{2}\.[0-9]{2})(?:\s|$)";
const LINK_PATTERN: &str = r"\[\[([^\[\]|]+)(?:\|[^\[\]]*)?\]\]";
const LINK_TARGET_PATTERN: &str = r"^\s*(S[0-9]{2}\.[0-9]{2}(?:\.[0-9]{2})?)(?:[^0-9.\-]|$)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Scope,
    Area,
    Category,
    Item,
    Unclassified,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Scope => "scope",
            EntityType::Area => "area",
            EntityType::Category => "category",
            EntityType::Item => "item",
            EntityType::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scope" => Ok(EntityType::Scope),
            "area" => Ok(EntityType::Area),
            "category" => Ok(EntityType::Category),
            "item" => Ok(EntityType::Item),
            "unclassified" => Ok(EntityType::Unclassified),
            other => Err(VaultError::Internal(format!("unknown entity type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub id: Option<String>,
    pub entity_type: EntityType,
    pub name: String,
}

impl Classification {
    pub fn is_classified(&self) -> bool {
        self.id.is_some()
    }
}

/// A `[[...]]` link whose body starts with a category or item ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkRef {
    pub target_id: String,
    /// The whole link as written, brackets and alias included.
    pub link_text: String,
}

/// Compiled patterns. Build once and share by reference.
#[derive(Debug, Clone)]
pub struct Grammar {
    // Most specific first: an item name also starts like a category.
    names: [(EntityType, Regex); 4],
    link: Regex,
    link_target: Regex,
}

impl Grammar {
    pub fn new() -> Result<Self> {
        Ok(Self {
            names: [
                (EntityType::Item, compile(ITEM_PATTERN)?),
                (EntityType::Category, compile(CATEGORY_PATTERN)?),
                (EntityType::Area, compile(AREA_PATTERN)?),
                (EntityType::Scope, compile(SCOPE_PATTERN)?),
            ],
            link: compile(LINK_PATTERN)?,
            link_target: compile(LINK_TARGET_PATTERN)?,
        })
    }

    pub fn classify(&self, name: &str) -> Classification {
        for (entity_type, pattern) in &self.names {
            if let Some(caps) = pattern.captures(name) {
                return Classification {
                    id: Some(caps[1].to_string()),
                    entity_type: *entity_type,
                    name: display_name(name),
                };
            }
        }
        Classification {
            id: None,
            entity_type: EntityType::Unclassified,
            name: display_name(name),
        }
    }

    pub fn extract_links(&self, text: &str) -> Vec<LinkRef> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for caps in self.link.captures_iter(text) {
            let Some(target) = self.link_target.captures(&caps[1]) else {
                continue;
            };
            let link_text = caps[0].to_string();
            if !seen.insert(link_text.clone()) {
                continue;
            }
            links.push(LinkRef {
                target_id: target[1].to_string(),
                link_text,
            });
        }
        links
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| VaultError::Internal(format!("bad pattern {pattern}: {e}")))
}

/// Text after the first space; the whole name when there is none.
pub fn display_name(name: &str) -> String {
    match name.split_once(' ') {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => name.to_string(),
    }
}

pub fn is_note(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        Grammar::new().unwrap()
    }

    #[test]
    fn test_classify_each_level() {
        let g = grammar();
        let cases = [
            ("S01 Personal", "S01", EntityType::Scope, "Personal"),
            ("S01.10-19 Life Admin", "S01.10-19", EntityType::Area, "Life Admin"),
            ("S01.11 Finance", "S01.11", EntityType::Category, "Finance"),
            ("S01.11.11 Budget", "S01.11.11", EntityType::Item, "Budget"),
        ];
        for (name, id, entity_type, display) in cases {
            let c = g.classify(name);
            assert_eq!(c.id.as_deref(), Some(id), "{name}");
            assert_eq!(c.entity_type, entity_type, "{name}");
            assert_eq!(c.name, display, "{name}");
        }
    }

    #[test]
    fn test_bare_id_keeps_whole_name() {
        let c = grammar().classify("S02.21");
        assert_eq!(c.entity_type, EntityType::Category);
        assert_eq!(c.name, "S02.21");
    }

    #[test]
    fn test_unclassified_names() {
        let g = grammar();
        for name in [
            "Inbox",
            "S1.11 Short",
            "S01.11.111 Too long",
            "S01.11Finance",
            "s01.11 lowercase",
            "X01.11 Other letter",
            "S01.11.11.11 Four levels",
            "S\u{0660}\u{0661}.\u{0661}\u{0661} Arabic-Indic digits",
            "S01.\u{FF11}\u{FF11} Fullwidth digits",
        ] {
            let c = g.classify(name);
            assert_eq!(c.entity_type, EntityType::Unclassified, "{name}");
            assert!(c.id.is_none(), "{name}");
        }
    }

    #[test]
    fn test_extract_links_keeps_verbatim_text() {
        let links = grammar().extract_links(
            "See [[S01.11.12 Taxes]] and [[S01.11|Finance]] but not [[Shopping list]].",
        );
        assert_eq!(
            links,
            vec![
                LinkRef {
                    target_id: "S01.11.12".to_string(),
                    link_text: "[[S01.11.12 Taxes]]".to_string(),
                },
                LinkRef {
                    target_id: "S01.11".to_string(),
                    link_text: "[[S01.11|Finance]]".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_extract_links_ignores_scopes_areas_and_duplicates() {
        let links = grammar().extract_links(
            "[[S01]] [[S01.10-19 Admin]] [[S01.11.123]] [[S01.11.12]] [[S01.11.12]]",
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target_id, "S01.11.12");
    }

    #[test]
    fn test_links_require_ascii_digits() {
        let links =
            grammar().extract_links("[[S01.\u{0661}\u{0661}.12]] [[S\u{0660}\u{0661}.11]]");
        assert!(links.is_empty());
    }

    #[test]
    fn test_alias_does_not_affect_matching() {
        let links = grammar().extract_links("[[Budget|S01.11.11]]");
        assert!(links.is_empty());
    }

    #[test]
    fn test_entity_type_round_trips_through_column_text() {
        for t in [
            EntityType::Scope,
            EntityType::Area,
            EntityType::Category,
            EntityType::Item,
            EntityType::Unclassified,
        ] {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
        }
        assert!("folder".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_is_note_ignores_case() {
        let exts = vec!["md".to_string()];
        assert!(is_note(Path::new("a/B.md"), &exts));
        assert!(is_note(Path::new("a/B.MD"), &exts));
        assert!(!is_note(Path::new("a/B.txt"), &exts));
        assert!(!is_note(Path::new("a/md"), &exts));
    }
}
