//! Doctor retrieval for the recommendation pipeline.
//!
//! Retrieval is a replaceable strategy: the facade holds an
//! `Arc<dyn DoctorSearch>` and everything downstream only sees
//! `DoctorListing`s in rank order.

mod keyword;

pub use keyword::*;

use crate::db::{Database, DbResult};
use crate::models::DoctorListing;

/// Retrieval strategy over the doctor directory.
pub trait DoctorSearch: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Return at most `limit` listings matching `keywords`, best first.
    fn search(
        &self,
        db: &Database,
        keywords: &[String],
        limit: usize,
    ) -> DbResult<Vec<DoctorListing>>;
}

/// Trim keywords and drop blank ones.
pub fn usable_keywords(keywords: &[String]) -> Vec<&str> {
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_keywords() {
        let keywords = vec![" 心脏 ".to_string(), "".to_string(), "  ".to_string(), "chest pain".to_string()];
        assert_eq!(usable_keywords(&keywords), vec!["心脏", "chest pain"]);
    }
}
