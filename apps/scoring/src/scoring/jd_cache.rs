//! In-memory `jobId → JobDescription` cache.
//!
//! Entries expire after a TTL; past capacity the oldest insertion is evicted.
//! Re-extraction of the same job overwrites the entry and refreshes its timestamp.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::models::jd::JobDescription;

struct CachedJd {
    jd: Arc<JobDescription>,
    inserted_at: Instant,
}

#[derive(Clone)]
pub struct JdCache {
    entries: Arc<RwLock<HashMap<String, CachedJd>>>,
    ttl: Duration,
    capacity: usize,
}

impl JdCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn insert(&self, jd: JobDescription) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, cached| now.duration_since(cached.inserted_at) < self.ttl);

        let job_id = jd.job_id.clone();
        entries.insert(
            job_id,
            CachedJd {
                jd: Arc::new(jd),
                inserted_at: now,
            },
        );

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, cached)| cached.inserted_at)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    debug!(job_id = %id, "Evicting oldest cached JD");
                    entries.remove(&id);
                }
                None => break,
            }
        }
    }

    /// `None` when the job was never extracted or its entry expired.
    pub async fn get(&self, job_id: &str) -> Option<Arc<JobDescription>> {
        let entries = self.entries.read().await;
        entries
            .get(job_id)
            .filter(|cached| cached.inserted_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.jd))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::jd::{EducationLevel, ExperienceRange, Seniority};

    fn jd(job_id: &str, seniority: Seniority) -> JobDescription {
        JobDescription {
            job_id: job_id.to_string(),
            required_skills: vec![],
            experience_years: ExperienceRange::default(),
            education_level: EducationLevel::Any,
            soft_skills: vec![],
            seniority,
            company_profile: None,
            industry_context: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_overwrites_same_job() {
        let cache = JdCache::new(Duration::from_secs(60), 10);
        cache.insert(jd("job-1", Seniority::Junior)).await;
        cache.insert(jd("job-1", Seniority::Senior)).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("job-1").await.unwrap().seniority, Seniority::Senior);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = JdCache::new(Duration::from_secs(60), 10);
        cache.insert(jd("job-1", Seniority::Mid)).await;
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("job-1").await.is_some());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("job-1").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oldest_evicted_past_capacity() {
        let cache = JdCache::new(Duration::from_secs(600), 2);
        cache.insert(jd("job-1", Seniority::Mid)).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert(jd("job-2", Seniority::Mid)).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert(jd("job-3", Seniority::Mid)).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("job-1").await.is_none());
        assert!(cache.get("job-3").await.is_some());
    }

    #[tokio::test]
    async fn test_unknown_job_is_none() {
        let cache = JdCache::new(Duration::from_secs(60), 10);
        assert!(cache.get("nope").await.is_none());
    }
}
