//! # Category table
//!
//! Ordered list of meeting categories, each with a keyword set and a base
//! weight in `[0.0, 1.0]`.
//!
//! - Order is significant: the classifier walks entries top to bottom and the
//!   first hit wins, so earlier entries resolve ambiguous titles.
//! - `team_category` is the fallback for unmatched events with 3+ attendees,
//!   `default_category` for everything else. Both must name table entries.
//! - `default_seed()` ships the built-in table used when no config is found.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ConfigurationError;
use crate::model::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    /// Base weight used by the scorer's category factor.
    pub weight: f64,
    /// Case-insensitive substrings; an entry with no keywords is only reachable
    /// through the fallbacks.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryEntry {
    pub fn new(name: &str, weight: f64, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            weight,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTable {
    pub entries: Vec<CategoryEntry>,
    pub team_category: String,
    pub default_category: String,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl CategoryTable {
    pub fn new(entries: Vec<CategoryEntry>) -> Self {
        Self {
            entries,
            team_category: "Team".to_string(),
            default_category: "Other".to_string(),
        }
    }

    /// Built-in table. Order encodes precedence: e.g. "Client Networking
    /// Coffee Chat" hits Client before Networking.
    pub fn default_seed() -> Self {
        Self::new(vec![
            CategoryEntry::new(
                "Interview",
                1.0,
                &["interview", "screening", "hiring", "recruiter call"],
            ),
            CategoryEntry::new(
                "Career-Fair",
                0.8,
                &["career fair", "job fair", "career expo", "recruiting event"],
            ),
            CategoryEntry::new(
                "Client",
                0.9,
                &["client", "customer", "external", "vendor", "partner call"],
            ),
            CategoryEntry::new(
                "Networking",
                0.7,
                &["networking", "coffee chat", "meet & greet", "meet and greet", "intro"],
            ),
            CategoryEntry::new(
                "One-on-One",
                0.7,
                &["1:1", "1-1", "1on1", "one on one", "one-on-one"],
            ),
            CategoryEntry::new("Office-Hours", 0.6, &["office hours", "office hour"]),
            CategoryEntry::new(
                "All-Hands",
                0.3,
                &["all-hands", "all hands", "town hall", "company meeting"],
            ),
            CategoryEntry::new(
                "Standup",
                0.2,
                &["standup", "stand-up", "daily sync", "daily scrum"],
            ),
            CategoryEntry::new(
                "Class",
                0.5,
                &["lecture", "class", "seminar", "recitation", "tutorial"],
            ),
            CategoryEntry::new("Part-time", 0.5, &["shift", "part-time", "part time"]),
            CategoryEntry::new("Club", 0.4, &["club", "society", "chapter meeting"]),
            CategoryEntry::new(
                "Team",
                0.5,
                &["team", "planning", "sprint", "retro", "roadmap"],
            ),
            CategoryEntry::new("Other", 0.4, &[]),
        ])
    }

    /// Fail fast on an empty table, duplicate names, out-of-range weights or
    /// undefined fallbacks.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.entries.is_empty() {
            return Err(ConfigurationError::EmptyCategoryTable);
        }
        let mut seen = HashSet::new();
        for e in &self.entries {
            if !seen.insert(e.name.as_str()) {
                return Err(ConfigurationError::DuplicateCategory(e.name.clone()));
            }
            if !(0.0..=1.0).contains(&e.weight) {
                return Err(ConfigurationError::CategoryWeight {
                    name: e.name.clone(),
                    weight: e.weight,
                });
            }
        }
        for fallback in [&self.team_category, &self.default_category] {
            if !seen.contains(fallback.as_str()) {
                return Err(ConfigurationError::MissingFallbackCategory(fallback.clone()));
            }
        }
        Ok(())
    }

    pub fn entry(&self, category: &Category) -> Option<&CategoryEntry> {
        self.entries.iter().find(|e| e.name == category.as_str())
    }

    /// Base weight for a category; `None` if the table does not know it.
    pub fn weight_for(&self, category: &Category) -> Option<f64> {
        self.entry(category).map(|e| e.weight)
    }

    pub fn team(&self) -> Category {
        Category::new(self.team_category.clone())
    }

    pub fn fallback(&self) -> Category {
        Category::new(self.default_category.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_seed_is_valid() {
        CategoryTable::default_seed().validate().unwrap();
    }

    #[test]
    fn client_precedes_networking_in_seed() {
        let t = CategoryTable::default_seed();
        let pos = |n: &str| t.entries.iter().position(|e| e.name == n).unwrap();
        assert!(pos("Client") < pos("Networking"));
    }

    #[test]
    fn empty_table_is_rejected() {
        let t = CategoryTable::new(vec![]);
        assert!(matches!(
            t.validate(),
            Err(ConfigurationError::EmptyCategoryTable)
        ));
    }

    #[test]
    fn missing_fallback_is_rejected() {
        let t = CategoryTable::new(vec![CategoryEntry::new("Team", 0.5, &["team"])]);
        assert!(matches!(
            t.validate(),
            Err(ConfigurationError::MissingFallbackCategory(ref c)) if c == "Other"
        ));
    }

    #[test]
    fn duplicate_and_out_of_range_weights_are_rejected() {
        let dup = CategoryTable::new(vec![
            CategoryEntry::new("Team", 0.5, &[]),
            CategoryEntry::new("Team", 0.4, &[]),
            CategoryEntry::new("Other", 0.4, &[]),
        ]);
        assert!(matches!(
            dup.validate(),
            Err(ConfigurationError::DuplicateCategory(_))
        ));

        let heavy = CategoryTable::new(vec![
            CategoryEntry::new("Team", 1.5, &[]),
            CategoryEntry::new("Other", 0.4, &[]),
        ]);
        assert!(matches!(
            heavy.validate(),
            Err(ConfigurationError::CategoryWeight { .. })
        ));
    }

    #[test]
    fn weight_lookup() {
        let t = CategoryTable::default_seed();
        assert_eq!(t.weight_for(&Category::from("Interview")), Some(1.0));
        assert_eq!(t.weight_for(&Category::from("Nope")), None);
    }
}
