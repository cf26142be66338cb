use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::store::{PayrollStore, StoreResult};

/// Initial capacity and false-positive rate of the email filter.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Answers "is this email taken?" without touching the database for most
/// registrations.
///
/// * cuckoo filter: "not present" is definitive, "present" may be a false positive
/// * moka cache: emails known to be taken
/// * store lookup for everything else
pub struct EmailIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, bool>,
}

impl Default for EmailIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(500_000)
                .time_to_live(Duration::from_secs(24 * 60 * 60))
                .build(),
        }
    }

    /// Check if an email might be registered (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email)
    }

    /// Record a newly registered email in both the filter and the cache.
    pub async fn insert(&self, email: &str) {
        let email = normalize(email);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&email);
        self.taken.insert(email, true).await;
    }

    pub async fn is_known_taken(&self, email: &str) -> bool {
        self.taken.get(&normalize(email)).await.unwrap_or(false)
    }

    /// `Ok(true)` when no user has registered `email`.
    pub async fn is_available(&self, email: &str, store: &dyn PayrollStore) -> StoreResult<bool> {
        // a filter miss is definitive
        if !self.might_exist(email) {
            return Ok(true);
        }

        if self.is_known_taken(email).await {
            return Ok(false);
        }

        let exists = store.email_exists(email).await?;
        if exists {
            self.taken.insert(normalize(email), true).await;
        }
        Ok(!exists)
    }

    /// Insert a batch of normalized emails into the filter
    fn filter_batch(&self, emails: &[String]) {
        let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
        for email in emails {
            filter.add(email);
        }
    }

    /// Batch mark emails as taken
    async fn cache_batch(&self, emails: &[String]) {
        let futures: Vec<_> = emails
            .iter()
            .map(|e| self.taken.insert(e.clone(), true))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Warm up the filter with every registered email, streamed in batches.
    pub async fn warmup_filter(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

            batch.push(normalize(&email));
            total += 1;

            if batch.len() == batch_size {
                self.filter_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.filter_batch(&batch);
        }

        log::info!("Email filter warmup complete: {} users", total);
        Ok(())
    }

    /// Load only RECENTLY active emails into the cache (batched)
    pub async fn warmup_cache(&self, pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT email
            FROM users
            WHERE last_login_at >= NOW() - INTERVAL ? DAY
            ORDER BY last_login_at DESC
            "#,
        )
        .bind(days)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row?;
            batch.push(normalize(&email));
            total_count += 1;

            if batch.len() >= batch_size {
                self.cache_batch(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.cache_batch(&batch).await;
        }

        log::info!(
            "Email cache warmup complete: {} recent users (last {} days)",
            total_count,
            days
        );

        Ok(())
    }
}
