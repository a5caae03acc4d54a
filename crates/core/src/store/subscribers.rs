//! Email subscribers and the notified-posts ledger.

use super::connection::Store;
use crate::Error;
use chrono::Utc;
use rand::RngCore;
use serde::Serialize;
use tokio_rusqlite::{params, rusqlite};

/// A subscriber that can receive notification mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub unsubscribe_token: String,
}

/// Outcome of a subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// A new row was written; mail the verify token.
    Created { verify_token: String },
    /// The address was already known. Nothing changed.
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriberCounts {
    pub total: u64,
    pub verified: u64,
}

/// Random 128-bit token, hex encoded.
pub fn new_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl Store {
    /// Insert-or-ignore a subscriber.
    pub async fn subscribe(&self, email: &str) -> Result<Subscription, Error> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(Error::InvalidInput("email must not be empty".into()));
        }
        let verify_token = new_token();
        let unsubscribe_token = new_token();
        let created_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<Subscription, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO subscribers (email, verified, verify_token, unsubscribe_token, created_at)
                     VALUES (?1, 0, ?2, ?3, ?4)",
                    params![email, verify_token, unsubscribe_token, created_at],
                )?;
                if inserted == 0 {
                    return Ok(Subscription::Existing);
                }
                Ok(Subscription::Created { verify_token })
            })
            .await
            .map_err(Error::from)
    }

    /// Mark the subscriber holding `token` as verified and consume the token.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no subscriber holds the token.
    pub async fn verify_subscriber(&self, token: &str) -> Result<(), Error> {
        if token.is_empty() {
            return Err(Error::NotFound("empty verify token".into()));
        }
        let token = token.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let changed = conn.execute(
                    "UPDATE subscribers SET verified = 1, verify_token = '' WHERE verify_token = ?1",
                    params![token],
                )?;
                if changed == 0 {
                    return Err(Error::NotFound("verify token".into()));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// # Errors
    ///
    /// Returns `Error::NotFound` if no subscriber holds the token.
    pub async fn unsubscribe(&self, token: &str) -> Result<(), Error> {
        if token.is_empty() {
            return Err(Error::NotFound("empty unsubscribe token".into()));
        }
        let token = token.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let changed = conn.execute("DELETE FROM subscribers WHERE unsubscribe_token = ?1", params![token])?;
                if changed == 0 {
                    return Err(Error::NotFound("unsubscribe token".into()));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn verified_recipients(&self) -> Result<Vec<Recipient>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Recipient>, Error> {
                let mut stmt =
                    conn.prepare("SELECT email, unsubscribe_token FROM subscribers WHERE verified = 1 ORDER BY id")?;
                let recipients = stmt
                    .query_map([], |row| Ok(Recipient { email: row.get(0)?, unsubscribe_token: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(recipients)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn subscriber_counts(&self) -> Result<SubscriberCounts, Error> {
        self.conn
            .call(|conn| -> Result<SubscriberCounts, Error> {
                let (total, verified): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(verified), 0) FROM subscribers",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(SubscriberCounts { total: total as u64, verified: verified as u64 })
            })
            .await
            .map_err(Error::from)
    }

    /// Record that subscribers were told about `slug`.
    ///
    /// Returns `true` only for the call that created the ledger row, so
    /// concurrent or repeated passes notify at most once per post.
    pub async fn mark_notified(&self, slug: &str) -> Result<bool, Error> {
        let slug = slug.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO notified_posts (slug, notified_at) VALUES (?1, ?2)",
                    params![slug, now],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Record every slug as notified without sending anything.
    ///
    /// Returns how many slugs were new to the ledger.
    pub async fn seed_notified(&self, slugs: Vec<String>) -> Result<usize, Error> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                let mut added = 0;
                {
                    let mut stmt = tx.prepare("INSERT OR IGNORE INTO notified_posts (slug, notified_at) VALUES (?1, ?2)")?;
                    for slug in &slugs {
                        added += stmt.execute(params![slug, now])?;
                    }
                }
                tx.commit()?;
                Ok(added)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_notified(&self, slug: &str) -> Result<bool, Error> {
        let slug = slug.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let result = conn.query_row("SELECT 1 FROM notified_posts WHERE slug = ?1", params![slug], |_| Ok(()));
                match result {
                    Ok(()) => Ok(true),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_shape() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_subscribe_is_insert_or_ignore() {
        let store = Store::open_in_memory().await.unwrap();
        let first = store.subscribe("reader@example.com").await.unwrap();
        assert!(matches!(first, Subscription::Created { .. }));

        let again = store.subscribe(" Reader@Example.com ").await.unwrap();
        assert_eq!(again, Subscription::Existing);
        assert_eq!(store.subscriber_counts().await.unwrap(), SubscriberCounts { total: 1, verified: 0 });
    }

    #[tokio::test]
    async fn test_verify_consumes_token() {
        let store = Store::open_in_memory().await.unwrap();
        let Subscription::Created { verify_token } = store.subscribe("a@example.com").await.unwrap() else {
            panic!("expected a new subscriber");
        };

        store.verify_subscriber(&verify_token).await.unwrap();
        assert_eq!(store.subscriber_counts().await.unwrap().verified, 1);
        assert!(store.verify_subscriber(&verify_token).await.unwrap_err().is_not_found());
        assert!(store.verify_subscriber("").await.unwrap_err().is_not_found());

        let recipients = store.verified_recipients().await.unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].email, "a@example.com");
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_row() {
        let store = Store::open_in_memory().await.unwrap();
        store.subscribe("a@example.com").await.unwrap();
        let token: String = store
            .conn
            .call(|conn| conn.query_row("SELECT unsubscribe_token FROM subscribers", [], |row| row.get(0)))
            .await
            .unwrap();

        store.unsubscribe(&token).await.unwrap();
        assert_eq!(store.subscriber_counts().await.unwrap().total, 0);
        assert!(store.unsubscribe(&token).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_mark_notified_once() {
        let store = Store::open_in_memory().await.unwrap();
        assert!(!store.is_notified("hello").await.unwrap());
        assert!(store.mark_notified("hello").await.unwrap());
        assert!(!store.mark_notified("hello").await.unwrap());
        assert!(store.is_notified("hello").await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_notified_counts_new_rows() {
        let store = Store::open_in_memory().await.unwrap();
        store.mark_notified("a").await.unwrap();
        let added = store.seed_notified(vec!["a".into(), "b".into(), "c".into()]).await.unwrap();
        assert_eq!(added, 2);
        assert!(!store.mark_notified("c").await.unwrap());
    }
}
