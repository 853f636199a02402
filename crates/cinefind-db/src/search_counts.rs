//! `search_counts` table operations.
//!
//! Rows map 1:1 onto [`SearchCountDocument`]; the integer primary key is
//! exposed as the document ID in decimal.

use anyhow::{Context, Result, bail};
use cinefind_api::store::{NewSearchCount, SearchCountDocument};
use rusqlite::{Connection, OptionalExtension, Row};

/// Column list shared by every `SELECT`.
const COLUMNS: &str = "id, search_term, count, movie_id, poster_url, title";

/// Maps a row selected with [`COLUMNS`].
fn from_row(row: &Row<'_>) -> rusqlite::Result<SearchCountDocument> {
    let id: i64 = row.get(0)?;
    Ok(SearchCountDocument {
        id: id.to_string(),
        search_term: row.get(1)?,
        count: row.get(2)?,
        movie_id: row.get(3)?,
        poster_url: row.get(4)?,
        title: row.get(5)?,
    })
}

/// Parses a document ID back into the row ID.
fn parse_id(document_id: &str) -> Result<i64> {
    document_id
        .parse()
        .with_context(|| format!("invalid document ID: {document_id}"))
}

/// Finds the row whose `search_term` equals `term` exactly.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_by_term(conn: &Connection, term: &str) -> Result<Option<SearchCountDocument>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM search_counts WHERE search_term = ?1"),
        [term],
        from_row,
    )
    .optional()
    .with_context(|| format!("failed to query search_counts for {term:?}"))
}

/// Inserts a new row and returns it.
///
/// # Errors
///
/// Returns an error if the insert fails, including when `search_term`
/// already exists.
pub fn insert(conn: &Connection, document: &NewSearchCount) -> Result<SearchCountDocument> {
    conn.execute(
        "INSERT INTO search_counts (search_term, count, movie_id, poster_url, title)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            document.search_term,
            document.count,
            document.movie_id,
            document.poster_url,
            document.title
        ],
    )
    .with_context(|| format!("failed to insert search_count {:?}", document.search_term))?;

    let id = conn.last_insert_rowid();
    get(conn, id)
}

/// Sets `count` on an existing row and returns the updated row.
///
/// # Errors
///
/// Returns an error if the ID is malformed, the row does not exist,
/// or the update fails.
pub fn set_count(conn: &Connection, document_id: &str, count: u32) -> Result<SearchCountDocument> {
    let id = parse_id(document_id)?;
    let changed = conn
        .execute(
            "UPDATE search_counts SET count = ?1 WHERE id = ?2",
            rusqlite::params![count, id],
        )
        .with_context(|| format!("failed to update search_count {document_id}"))?;
    if changed == 0 {
        bail!("document not found: {document_id}");
    }
    get(conn, id)
}

/// Loads up to `limit` rows ordered by `count` descending.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn top_by_count(conn: &Connection, limit: u32) -> Result<Vec<SearchCountDocument>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COLUMNS} FROM search_counts ORDER BY count DESC LIMIT ?1"
        ))
        .context("failed to prepare search_counts query")?;

    let rows = stmt
        .query_map([limit], from_row)
        .context("failed to query search_counts")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read search_counts rows")
}

/// Loads one row by ID.
fn get(conn: &Connection, id: i64) -> Result<SearchCountDocument> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM search_counts WHERE id = ?1"),
        [id],
        from_row,
    )
    .with_context(|| format!("failed to load search_count {id}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;
    use crate::open_in_memory;

    fn new_count(term: &str, movie_id: u64, title: &str) -> NewSearchCount {
        NewSearchCount {
            search_term: String::from(term),
            count: 1,
            movie_id,
            poster_url: None,
            title: String::from(title),
        }
    }

    #[test]
    fn test_insert_and_find() {
        // Arrange
        let conn = open_in_memory().unwrap();
        let mut doc = new_count("dune", 438_631, "Dune");
        doc.poster_url = Some(String::from("https://image.tmdb.org/t/p/w500/d5N.jpg"));

        // Act
        let created = insert(&conn, &doc).unwrap();
        let found = find_by_term(&conn, "dune").unwrap().unwrap();

        // Assert
        assert_eq!(created, found);
        assert_eq!(found.count, 1);
        assert_eq!(found.movie_id, 438_631);
        assert_eq!(
            found.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/d5N.jpg")
        );
    }

    #[test]
    fn test_find_is_exact_match() {
        // Arrange
        let conn = open_in_memory().unwrap();
        insert(&conn, &new_count("Batman", 268, "Batman")).unwrap();

        // Act & Assert
        assert!(find_by_term(&conn, "batman").unwrap().is_none());
        assert!(find_by_term(&conn, "Batman").unwrap().is_some());
    }

    #[test]
    fn test_insert_duplicate_term_fails() {
        // Arrange
        let conn = open_in_memory().unwrap();
        insert(&conn, &new_count("dune", 438_631, "Dune")).unwrap();

        // Act
        let result = insert(&conn, &new_count("dune", 1, "Other"));

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_set_count_keeps_denormalized_fields() {
        // Arrange
        let conn = open_in_memory().unwrap();
        let created = insert(&conn, &new_count("dune", 438_631, "Dune")).unwrap();

        // Act
        let updated = set_count(&conn, &created.id, 7).unwrap();

        // Assert
        assert_eq!(updated.count, 7);
        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.id, created.id);
    }

    #[test]
    fn test_set_count_missing_row_fails() {
        // Arrange
        let conn = open_in_memory().unwrap();

        // Act
        let missing = set_count(&conn, "42", 2);
        let malformed = set_count(&conn, "not-a-number", 2);

        // Assert
        assert!(missing.unwrap_err().to_string().contains("not found"));
        assert!(malformed.unwrap_err().to_string().contains("invalid document ID"));
    }

    #[test]
    fn test_top_by_count_orders_and_limits() {
        // Arrange
        let conn = open_in_memory().unwrap();
        for (term, count) in [("alien", 1), ("batman", 12), ("dune", 3), ("heat", 5)] {
            let doc = insert(&conn, &new_count(term, 1, term)).unwrap();
            set_count(&conn, &doc.id, count).unwrap();
        }

        // Act
        let top = top_by_count(&conn, 3).unwrap();

        // Assert
        let terms: Vec<&str> = top.iter().map(|d| d.search_term.as_str()).collect();
        assert_eq!(terms, vec!["batman", "heat", "dune"]);
    }

    #[test]
    fn test_top_by_count_empty_table() {
        // Arrange
        let conn = open_in_memory().unwrap();

        // Act
        let top = top_by_count(&conn, 5).unwrap();

        // Assert
        assert!(top.is_empty());
    }
}
