//! Substring keyword search.
//!
//! A doctor matches when any keyword occurs, case-sensitively, in its
//! expertise, specialty, department name or hospital name. Results with an
//! external profile link come first, then by recommendation score
//! (nulls last), then by id.

use rusqlite::types::Value;

use super::{usable_keywords, DoctorSearch};
use crate::db::{listing_from_row, Database, DbResult, LISTING_SELECT};
use crate::models::DoctorListing;

/// Keywords beyond this are ignored to bound the predicate count.
pub const MAX_KEYWORDS: usize = 50;

/// Fields each keyword is matched against.
const MATCH_FIELDS: [&str; 4] = ["d.expertise", "d.specialty", "p.name", "h.name"];

/// Keyword search over the directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSearch;

impl KeywordSearch {
    pub fn new() -> Self {
        Self
    }

    /// Build the WHERE clause and its bound values.
    fn predicates(keywords: &[&str]) -> (String, Vec<Value>) {
        let mut clauses = Vec::with_capacity(keywords.len() * MATCH_FIELDS.len());
        let mut values = Vec::with_capacity(keywords.len() * MATCH_FIELDS.len());

        for keyword in keywords {
            for field in MATCH_FIELDS {
                // instr() is case-sensitive, unlike LIKE
                clauses.push(format!("instr({field}, ?) > 0"));
                values.push(Value::Text((*keyword).to_string()));
            }
        }

        (clauses.join(" OR "), values)
    }
}

impl DoctorSearch for KeywordSearch {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn search(
        &self,
        db: &Database,
        keywords: &[String],
        limit: usize,
    ) -> DbResult<Vec<DoctorListing>> {
        let mut keywords = usable_keywords(keywords);
        if keywords.len() > MAX_KEYWORDS {
            tracing::warn!(
                received = keywords.len(),
                kept = MAX_KEYWORDS,
                ignored = ?&keywords[MAX_KEYWORDS..],
                "Too many search keywords; extra keywords ignored"
            );
            keywords.truncate(MAX_KEYWORDS);
        }
        if keywords.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let (where_clause, mut values) = Self::predicates(&keywords);
        values.push(Value::Integer(limit as i64));

        let sql = format!(
            r#"{LISTING_SELECT}
            WHERE {where_clause}
            ORDER BY d.profile_url IS NOT NULL DESC,
                     d.recommendation_score IS NULL,
                     d.recommendation_score DESC,
                     d.id
            LIMIT ?"#
        );

        let mut stmt = db.conn().prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), listing_from_row)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }

        tracing::debug!(
            keywords = keywords.len(),
            results = listings.len(),
            "Keyword search complete"
        );
        Ok(listings)
    }
}
