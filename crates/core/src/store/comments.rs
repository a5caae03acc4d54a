//! Comment storage.

use super::connection::Store;
use crate::Error;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_slug: String,
    pub author: String,
    pub body: String,
    pub visible: bool,
    pub created_at: String,
}

impl Comment {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Comment {
            id: row.get(0)?,
            post_slug: row.get(1)?,
            author: row.get(2)?,
            body: row.get(3)?,
            visible: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

const COLUMNS: &str = "id, post_slug, author, body, visible, created_at";

impl Store {
    /// Store a new, visible comment and return its id.
    pub async fn insert_comment(&self, post_slug: &str, author: &str, body: &str) -> Result<i64, Error> {
        if post_slug.is_empty() {
            return Err(Error::InvalidInput("post slug must not be empty".into()));
        }
        let post_slug = post_slug.to_string();
        let author = author.to_string();
        let body = body.to_string();
        let created_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO comments (post_slug, author, body, visible, created_at) VALUES (?1, ?2, ?3, 1, ?4)",
                    params![post_slug, author, body, created_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// Visible comments on a post, oldest first.
    pub async fn visible_comments(&self, post_slug: &str) -> Result<Vec<Comment>, Error> {
        let post_slug = post_slug.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<Comment>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM comments WHERE post_slug = ?1 AND visible = 1 ORDER BY created_at, id"
                ))?;
                let comments = stmt
                    .query_map(params![post_slug], Comment::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(comments)
            })
            .await
            .map_err(Error::from)
    }

    /// Every comment, newest first.
    pub async fn all_comments(&self) -> Result<Vec<Comment>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Comment>, Error> {
                let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM comments ORDER BY created_at DESC, id DESC"))?;
                let comments = stmt.query_map([], Comment::from_row)?.collect::<Result<Vec<_>, _>>()?;
                Ok(comments)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn get_comment(&self, id: i64) -> Result<Option<Comment>, Error> {
        self.conn
            .call(move |conn| -> Result<Option<Comment>, Error> {
                let result = conn.query_row(
                    &format!("SELECT {COLUMNS} FROM comments WHERE id = ?1"),
                    params![id],
                    Comment::from_row,
                );
                match result {
                    Ok(comment) => Ok(Some(comment)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Flip a comment's visibility.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown id.
    pub async fn toggle_comment(&self, id: i64) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let changed = conn.execute("UPDATE comments SET visible = NOT visible WHERE id = ?1", params![id])?;
                if changed == 0 {
                    return Err(Error::NotFound(format!("comment {id}")));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown id.
    pub async fn delete_comment(&self, id: i64) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let changed = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
                if changed == 0 {
                    return Err(Error::NotFound(format!("comment {id}")));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn count_comments(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
