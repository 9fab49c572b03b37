//! Semantic FAQ cache for Campanile.
//!
//! Caches grounded answers keyed by question meaning, not question text:
//! lookups match by embedding similarity under a strict threshold, so
//! "When does the library open?" and "what time does the library open"
//! share one entry. Entries expire after a TTL and the coldest entry is
//! evicted at capacity.

use campanile_core::chunk::Citation;
use campanile_retrieval::cosine_similarity;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// A cached FAQ entry.
#[derive(Debug, Clone)]
pub struct FaqEntry {
    /// The question text as originally asked.
    pub question: String,
    /// Embedding of the original question; lookups match against this.
    pub fingerprint: Vec<f32>,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub hits: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

/// A successful cache lookup.
#[derive(Debug, Clone)]
pub struct CacheHit {
    /// The question the cached answer was originally produced for.
    pub question: String,
    pub answer: String,
    pub citations: Vec<Citation>,
    /// Similarity between the probe and the matched entry.
    pub similarity: f32,
}

/// What happened on an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The coldest entry was evicted to make room.
    InsertedEvicting,
    /// An entry for this question already exists (e.g. a racing insert
    /// landed first); the existing answer is kept.
    AlreadyPresent,
}

/// Cache occupancy and hit-rate counters.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f32,
}

/// The FAQ cache. All mutation happens under one write lock so
/// check-and-insert is atomic; lookups take the read lock.
pub struct FaqCache {
    inner: RwLock<HashMap<String, FaqEntry>>,
    capacity: usize,
    threshold: f32,
    ttl: Duration,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl FaqCache {
    /// Create a cache. `threshold` is the minimum cosine similarity for
    /// a lookup to hit; `ttl` is the entry lifetime.
    pub fn new(capacity: usize, threshold: f32, ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            threshold,
            ttl,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Look up a cached answer by question embedding.
    ///
    /// Scans for the most similar non-expired entry at or above the
    /// threshold. A hit bumps the entry's hit count and recency.
    pub async fn lookup(&self, fingerprint: &[f32]) -> Option<CacheHit> {
        let now = Utc::now();
        let best = {
            let entries = self.inner.read().await;
            let mut best: Option<(String, f32)> = None;
            for (key, entry) in entries.iter() {
                if now - entry.created_at > self.ttl {
                    continue;
                }
                let sim = cosine_similarity(&entry.fingerprint, fingerprint);
                if sim >= self.threshold && best.as_ref().is_none_or(|(_, s)| sim > *s) {
                    best = Some((key.clone(), sim));
                }
            }
            best
        };

        let Some((key, similarity)) = best else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        // Re-acquire as a writer to bump counters. The entry may have been
        // evicted between locks; that race loses the bump, nothing else.
        let mut entries = self.inner.write().await;
        let entry = entries.get_mut(&key)?;
        entry.hits += 1;
        entry.last_accessed = now;
        self.hit_count.fetch_add(1, Ordering::Relaxed);

        debug!(similarity, hits = entry.hits, "FAQ cache hit");
        Some(CacheHit {
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            citations: entry.citations.clone(),
            similarity,
        })
    }

    /// Insert an answer for a question.
    ///
    /// The purge, duplicate check, insert, and eviction all happen inside
    /// one write critical section, so concurrent inserts of the same
    /// question produce exactly one entry.
    pub async fn insert(
        &self,
        question: &str,
        fingerprint: Vec<f32>,
        answer: String,
        citations: Vec<Citation>,
    ) -> InsertOutcome {
        let key = fingerprint_key(question);
        let now = Utc::now();

        let mut entries = self.inner.write().await;
        entries.retain(|_, e| now - e.created_at <= self.ttl);

        if entries.contains_key(&key) {
            return InsertOutcome::AlreadyPresent;
        }

        let mut evicted = false;
        while entries.len() >= self.capacity {
            if let Some(cold) = coldest_key(&entries) {
                entries.remove(&cold);
                evicted = true;
            } else {
                break;
            }
        }

        entries.insert(
            key,
            FaqEntry {
                question: question.to_string(),
                fingerprint,
                answer,
                citations,
                hits: 0,
                created_at: now,
                last_accessed: now,
            },
        );

        debug!(size = entries.len(), evicted, "FAQ cache insert");
        if evicted {
            InsertOutcome::InsertedEvicting
        } else {
            InsertOutcome::Inserted
        }
    }

    /// Current occupancy and hit-rate counters.
    pub async fn stats(&self) -> CacheStats {
        let size = self.inner.read().await.len();
        let hits = self.hit_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size,
            capacity: self.capacity,
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f32 / total as f32
            },
        }
    }

    /// The `n` most-asked cached questions, by hit count descending.
    pub async fn popular(&self, n: usize) -> Vec<(String, u64)> {
        let entries = self.inner.read().await;
        let mut ranked: Vec<(String, u64)> = entries
            .values()
            .map(|e| (e.question.clone(), e.hits))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// The eviction victim: fewest hits, oldest access as tiebreak.
fn coldest_key(entries: &HashMap<String, FaqEntry>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, e)| (e.hits, e.last_accessed))
        .map(|(k, _)| k.clone())
}

/// Normalize question text for identity: lowercase, collapsed whitespace.
fn normalize(question: &str) -> String {
    question
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable identity key for a question. Two askings of the same question
/// (modulo case and spacing) map to the same key.
fn fingerprint_key(question: &str) -> String {
    hex::encode(Sha256::digest(normalize(question).as_bytes()))
}
