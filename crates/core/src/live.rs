//! Live content cache.
//!
//! Holds the currently published [`ContentSnapshot`] behind an [`ArcSwap`].
//! Readers never block and always see one complete snapshot; a reload builds
//! the next snapshot off to the side and installs it with a single pointer swap.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::content::ContentSnapshot;

/// Cheaply cloneable handle to the published snapshot.
#[derive(Clone)]
pub struct LiveCache {
    current: Arc<ArcSwap<ContentSnapshot>>,
}

impl LiveCache {
    pub fn new(snapshot: ContentSnapshot) -> Self {
        Self { current: Arc::new(ArcSwap::from_pointee(snapshot)) }
    }

    /// The snapshot installed right now.
    ///
    /// The returned `Arc` stays valid after a later `replace`.
    pub fn read(&self) -> Arc<ContentSnapshot> {
        self.current.load_full()
    }

    /// Install a fully built snapshot.
    pub fn replace(&self, snapshot: ContentSnapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for LiveCache {
    fn default() -> Self {
        Self::new(ContentSnapshot::default())
    }
}

impl std::fmt::Debug for LiveCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("LiveCache")
            .field("posts", &snapshot.posts.len())
            .field("pages", &snapshot.pages.len())
            .field("projects", &snapshot.projects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::content::fixtures::{page, post};

    fn generation(n: usize) -> ContentSnapshot {
        // Every post in generation `n` carries the same marker, so a mixed
        // snapshot would show more than one distinct title suffix.
        let posts = (0..20).map(|i| {
            let mut p = post(&format!("post-{i}"), (2026, 1, 1 + (i as u32 % 28)));
            p.title = format!("gen-{n}");
            p
        });
        ContentSnapshot::new(posts.collect(), vec![page(&format!("gen-{n}"))], Vec::new())
    }

    #[test]
    fn test_read_returns_installed_snapshot() {
        let cache = LiveCache::new(generation(0));
        assert_eq!(cache.read().pages[0].slug, "gen-0");

        cache.replace(generation(1));
        assert_eq!(cache.read().pages[0].slug, "gen-1");
    }

    #[test]
    fn test_held_snapshot_survives_replace() {
        let cache = LiveCache::new(generation(0));
        let held = cache.read();
        cache.replace(generation(1));
        assert_eq!(held.pages[0].slug, "gen-0");
        assert_eq!(held.posts.len(), 20);
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_snapshot() {
        let cache = LiveCache::new(generation(0));
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let done = done.clone();
                std::thread::spawn(move || {
                    let mut reads = 0usize;
                    while !done.load(Ordering::Relaxed) || reads == 0 {
                        let snapshot = cache.read();
                        let marker = &snapshot.pages[0].slug;
                        assert!(snapshot.posts.iter().all(|p| &p.title == marker));
                        assert_eq!(snapshot.posts.len(), 20);
                        reads += 1;
                    }
                    reads
                })
            })
            .collect();

        for n in 1..=200 {
            cache.replace(generation(n));
        }
        done.store(true, Ordering::Relaxed);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
        assert_eq!(cache.read().pages[0].slug, "gen-200");
    }
}
