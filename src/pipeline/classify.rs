// src/pipeline/classify.rs
//! Keyword classifier.
//!
//! Order of checks:
//! 1) title against every table entry, in table order
//! 2) description against every table entry, in table order
//! 3) 3+ attendees → the table's team category
//! 4) the table's default category
//!
//! Table order is the tie-break: when two entries both match, the earlier one
//! wins.

use crate::config::CategoryTable;
use crate::error::ConfigurationError;
use crate::model::{Category, SourceEvent};

/// Attendee count at which an unmatched event becomes a team meeting.
pub const TEAM_MIN_ATTENDEES: usize = 3;

#[derive(Debug, Clone)]
pub struct Classifier {
    entries: Vec<(Category, Vec<String>)>,
    team: Category,
    fallback: Category,
}

impl Classifier {
    pub fn new(table: &CategoryTable) -> Result<Self, ConfigurationError> {
        table.validate()?;
        Ok(Self::build(table))
    }

    fn build(table: &CategoryTable) -> Self {
        let entries = table
            .entries
            .iter()
            .map(|e| {
                let kws = e
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (Category::new(e.name.clone()), kws)
            })
            .collect();
        Self {
            entries,
            team: table.team(),
            fallback: table.fallback(),
        }
    }

    pub fn classify(&self, event: &SourceEvent) -> Category {
        self.classify_parts(&event.title, &event.description, event.attendees.len())
    }

    pub fn classify_parts(&self, title: &str, description: &str, attendee_count: usize) -> Category {
        for text in [title, description] {
            if let Some(c) = self.first_hit(text) {
                return c.clone();
            }
        }
        if attendee_count >= TEAM_MIN_ATTENDEES {
            self.team.clone()
        } else {
            self.fallback.clone()
        }
    }

    fn first_hit(&self, text: &str) -> Option<&Category> {
        if text.is_empty() {
            return None;
        }
        let hay = text.to_lowercase();
        self.entries
            .iter()
            .find(|(_, kws)| kws.iter().any(|k| hay.contains(k.as_str())))
            .map(|(c, _)| c)
    }
}

/// One-shot classification against a table. Prefer building a
/// [`Classifier`] once when classifying a batch.
pub fn classify(event: &SourceEvent, table: &CategoryTable) -> Category {
    Classifier::build(table).classify(event)
}
