//! Full-text search index.
//!
//! The index is always rebuilt as a whole: one transaction deletes every row
//! and inserts the current entries. If any statement fails the transaction is
//! rolled back and the previous index stays queryable.

use super::connection::Store;
use crate::Error;
use crate::search::{ContentType, SearchHit, SearchIndexEntry};
use tokio_rusqlite::params;

// Control characters survive HTML escaping untouched.
const MARK_OPEN: &str = "\u{1}";
const MARK_CLOSE: &str = "\u{2}";

impl Store {
    /// Replace the whole search index with `entries`.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexRebuild` if any insert fails, including two entries
    /// sharing a content type and slug. Nothing is changed in that case.
    pub async fn rebuild_search_index(&self, entries: Vec<SearchIndexEntry>) -> Result<usize, Error> {
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM search_index", [])?;
                tx.execute("DELETE FROM search_documents", [])?;

                {
                    let mut doc = tx.prepare("INSERT INTO search_documents (content_type, slug) VALUES (?1, ?2)")?;
                    let mut row = tx.prepare(
                        "INSERT INTO search_index (slug, title, tags, body, content_type) VALUES (?1, ?2, ?3, ?4, ?5)",
                    )?;
                    for entry in &entries {
                        let kind = entry.content_type.as_str();
                        doc.execute(params![kind, entry.slug])
                            .map_err(|e| Error::IndexRebuild(format!("{kind} {}: {e}", entry.slug)))?;
                        row.execute(params![entry.slug, entry.title, entry.tags, entry.body, kind])
                            .map_err(|e| Error::IndexRebuild(format!("{kind} {}: {e}", entry.slug)))?;
                    }
                }

                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Ranked full-text search.
    ///
    /// The query is matched as a single phrase, so FTS operators in user input
    /// are treated as text. Blank queries return nothing.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, Error> {
        let Some(phrase) = fts_phrase(query) else {
            return Ok(Vec::new());
        };
        let limit = limit as i64;

        self.conn
            .call(move |conn| -> Result<Vec<SearchHit>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT slug, title, content_type, snippet(search_index, 3, ?2, ?3, '...', 30)
                     FROM search_index
                     WHERE search_index MATCH ?1
                     ORDER BY rank
                     LIMIT ?4",
                )?;

                let rows = stmt.query_map(params![phrase, MARK_OPEN, MARK_CLOSE, limit], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, String>(3)?))
                })?;

                let mut hits = Vec::new();
                for row in rows {
                    let (slug, title, kind, raw_snippet) = row?;
                    let Some(content_type) = ContentType::parse(&kind) else {
                        tracing::warn!(slug = %slug, kind = %kind, "skipping search row with unknown content type");
                        continue;
                    };
                    hits.push(SearchHit { slug, title, content_type, snippet: highlight(&raw_snippet) });
                }
                Ok(hits)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of rows currently in the index.
    pub async fn search_index_len(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM search_index", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

/// Quote user input as one FTS5 phrase.
fn fts_phrase(query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    Some(format!("\"{}\"", query.replace('"', "\"\"")))
}

/// Escape a raw snippet and turn the sentinel markers into `<mark>` tags.
fn highlight(raw: &str) -> String {
    html_escape::encode_safe(raw).replace(MARK_OPEN, "<mark>").replace(MARK_CLOSE, "</mark>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slug: &str, body: &str, content_type: ContentType) -> SearchIndexEntry {
        SearchIndexEntry {
            slug: slug.to_string(),
            title: format!("Title {slug}"),
            tags: "rust sqlite".to_string(),
            body: body.to_string(),
            content_type,
        }
    }

    async fn dump(store: &Store) -> Vec<(String, String, String, String, String)> {
        store
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT slug, title, tags, body, content_type FROM search_index ORDER BY content_type, slug",
                )?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, tokio_rusqlite::rusqlite::Error>(rows)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        let entries = vec![
            entry("hello-world", "An introduction to the journal", ContentType::Post),
            entry("quire", "A publishing engine", ContentType::Project),
        ];

        assert_eq!(store.rebuild_search_index(entries.clone()).await.unwrap(), 2);
        let first = dump(&store).await;
        store.rebuild_search_index(entries).await.unwrap();
        let second = dump(&store).await;

        assert_eq!(first, second);
        assert_eq!(store.search_index_len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_rows() {
        let store = Store::open_in_memory().await.unwrap();
        store.rebuild_search_index(vec![entry("old", "stale words", ContentType::Post)]).await.unwrap();
        store.rebuild_search_index(vec![entry("new", "fresh words", ContentType::Post)]).await.unwrap();

        assert!(store.search("stale", 10).await.unwrap().is_empty());
        assert_eq!(store.search("fresh", 10).await.unwrap()[0].slug, "new");
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_index() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .rebuild_search_index(vec![entry("kept", "original searchable text", ContentType::Post)])
            .await
            .unwrap();
        let before = dump(&store).await;

        let result = store
            .rebuild_search_index(vec![
                entry("first", "replacement text", ContentType::Post),
                entry("dup", "one", ContentType::Post),
                entry("dup", "two", ContentType::Post),
            ])
            .await;

        assert!(matches!(result, Err(Error::IndexRebuild(_))));
        assert_eq!(dump(&store).await, before);
        assert_eq!(store.search("original", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_slug_in_different_types_is_allowed() {
        let store = Store::open_in_memory().await.unwrap();
        let written = store
            .rebuild_search_index(vec![
                entry("quire", "post about it", ContentType::Post),
                entry("quire", "the project", ContentType::Project),
            ])
            .await
            .unwrap();
        assert_eq!(written, 2);
    }

    #[tokio::test]
    async fn test_search_highlights_and_escapes() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .rebuild_search_index(vec![entry("tags", "escaping <b> matters for sqlite snippets", ContentType::Post)])
            .await
            .unwrap();

        let hits = store.search("sqlite", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].snippet.contains("<mark>sqlite</mark>"));
        assert!(hits[0].snippet.contains("&lt;b&gt;"));
        assert!(!hits[0].snippet.contains("<b>"));
    }

    #[tokio::test]
    async fn test_search_matches_decoded_entities() {
        let store = Store::open_in_memory().await.unwrap();
        let body = crate::search::strip_tags("<p>Tom &amp; Jerry</p><pre><code>a &lt; b</code></pre>");
        store.rebuild_search_index(vec![entry("cartoon", &body, ContentType::Post)]).await.unwrap();

        assert!(store.search("amp", 10).await.unwrap().is_empty());
        assert!(store.search("lt", 10).await.unwrap().is_empty());

        let hits = store.search("Tom & Jerry", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].snippet.matches("&amp;").count(), 1);
        assert!(!hits[0].snippet.contains("&amp;amp;"));
        assert!(hits[0].snippet.contains("&lt;"));
        assert!(hits[0].snippet.contains("<mark>"));
    }

    #[tokio::test]
    async fn test_search_treats_operators_as_text() {
        let store = Store::open_in_memory().await.unwrap();
        store.rebuild_search_index(vec![entry("a", "plain words here", ContentType::Post)]).await.unwrap();

        assert!(store.search("words OR \"", 10).await.unwrap().is_empty());
        assert!(store.search("   ", 10).await.unwrap().is_empty());
        assert!(store.search("NEAR(", 10).await.unwrap().is_empty());
    }

    #[test]
    fn test_fts_phrase_doubles_quotes() {
        assert_eq!(fts_phrase(" say \"hi\" ").as_deref(), Some("\"say \"\"hi\"\"\""));
        assert_eq!(fts_phrase(""), None);
    }
}
