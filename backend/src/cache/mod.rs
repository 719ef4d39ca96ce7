//! Per-user cache of generated meal plans
//!
//! Plans live in Redis when a connection is available so every instance sees
//! the same plan. Without Redis, or when a Redis call fails, an in-process
//! map with the same TTL is used.

use chrono::{DateTime, Utc};
use meal_planner_shared::{MealSelection, SelectionOptions, WhoopAnalysis};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

const KEY_PREFIX: &str = "meal_plan:";

/// A generated plan together with the inputs that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPlan {
    pub generated_at: DateTime<Utc>,
    pub analysis: WhoopAnalysis,
    pub options: SelectionOptions,
    pub selection: MealSelection,
}

struct LocalEntry {
    plan: CachedPlan,
    expires_at: Instant,
}

/// Plan store owned by `AppState`
#[derive(Clone)]
pub struct PlanCache {
    redis: Option<ConnectionManager>,
    local: Arc<RwLock<HashMap<Uuid, LocalEntry>>>,
    ttl: Duration,
}

impl PlanCache {
    pub fn new(redis: Option<ConnectionManager>, ttl_secs: u64) -> Self {
        Self {
            redis,
            local: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Cache backed only by process memory
    pub fn in_memory(ttl_secs: u64) -> Self {
        Self::new(None, ttl_secs)
    }

    pub fn backend(&self) -> &'static str {
        if self.redis.is_some() {
            "redis"
        } else {
            "memory"
        }
    }

    fn key(user_id: Uuid) -> String {
        format!("{}{}", KEY_PREFIX, user_id)
    }

    /// Cached plan for a user, if present and not expired
    pub async fn get(&self, user_id: Uuid) -> Option<CachedPlan> {
        if let Some(mut conn) = self.redis.clone() {
            let result = redis::cmd("GET")
                .arg(Self::key(user_id))
                .query_async::<_, Option<String>>(&mut conn)
                .await;
            match result {
                Ok(Some(json)) => match serde_json::from_str(&json) {
                    Ok(plan) => return Some(plan),
                    Err(e) => warn!(%user_id, "Discarding unreadable cached plan: {}", e),
                },
                Ok(None) => return None,
                Err(e) => warn!("Redis GET failed, using local plan cache: {}", e),
            }
        }

        {
            let local = self.local.read().await;
            match local.get(&user_id) {
                None => return None,
                Some(entry) if Instant::now() < entry.expires_at => {
                    return Some(entry.plan.clone())
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock; an insert may have raced in
        let mut local = self.local.write().await;
        if local
            .get(&user_id)
            .is_some_and(|entry| Instant::now() >= entry.expires_at)
        {
            local.remove(&user_id);
            debug!(%user_id, "Dropped expired local plan");
        }
        local.get(&user_id).map(|entry| entry.plan.clone())
    }

    #[cfg(test)]
    async fn local_len(&self) -> usize {
        self.local.read().await.len()
    }

    /// Store a plan for a user, replacing any previous one
    pub async fn insert(&self, user_id: Uuid, plan: CachedPlan) {
        if let Some(mut conn) = self.redis.clone() {
            match serde_json::to_string(&plan) {
                Ok(json) => {
                    let result = redis::cmd("SET")
                        .arg(Self::key(user_id))
                        .arg(json)
                        .arg("EX")
                        .arg(self.ttl.as_secs().max(1))
                        .query_async::<_, ()>(&mut conn)
                        .await;
                    match result {
                        Ok(()) => {
                            debug!(%user_id, "Cached plan in Redis");
                            return;
                        }
                        Err(e) => warn!("Redis SET failed, using local plan cache: {}", e),
                    }
                }
                Err(e) => warn!("Plan serialization failed, using local plan cache: {}", e),
            }
        }

        let mut local = self.local.write().await;
        local.insert(
            user_id,
            LocalEntry {
                plan,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Remove a user's plan; returns whether one was cached
    pub async fn evict(&self, user_id: Uuid) -> bool {
        let mut removed = false;
        if let Some(mut conn) = self.redis.clone() {
            match redis::cmd("DEL")
                .arg(Self::key(user_id))
                .query_async::<_, i64>(&mut conn)
                .await
            {
                Ok(count) => removed = count > 0,
                Err(e) => warn!("Redis DEL failed: {}", e),
            }
        }

        let local_removed = self.local.write().await.remove(&user_id).is_some();
        removed || local_removed
    }

    /// Drop every cached plan; returns how many were removed
    pub async fn clear(&self) -> usize {
        let mut count = 0usize;
        if let Some(mut conn) = self.redis.clone() {
            let mut cursor = 0u64;
            loop {
                let scan = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(format!("{}*", KEY_PREFIX))
                    .arg("COUNT")
                    .arg(100)
                    .query_async::<_, (u64, Vec<String>)>(&mut conn)
                    .await;
                let (next, keys) = match scan {
                    Ok(page) => page,
                    Err(e) => {
                        warn!("Redis SCAN failed: {}", e);
                        break;
                    }
                };
                if !keys.is_empty() {
                    match redis::cmd("DEL").arg(&keys).query_async::<_, i64>(&mut conn).await {
                        Ok(deleted) => count += deleted.max(0) as usize,
                        Err(e) => warn!("Redis DEL failed: {}", e),
                    }
                }
                cursor = next;
                if cursor == 0 {
                    break;
                }
            }
        }

        let mut local = self.local.write().await;
        count += local.len();
        local.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meal_planner_shared::meal_selection::{ImageClassValidation, WeeklyMealPlan};

    fn plan(summary: &str) -> CachedPlan {
        CachedPlan {
            generated_at: Utc::now(),
            analysis: WhoopAnalysis::neutral(),
            options: SelectionOptions::default(),
            selection: MealSelection {
                meals: WeeklyMealPlan {
                    days: Vec::new(),
                    seed: 1,
                },
                whoop_insights: String::new(),
                selection_summary: summary.to_string(),
                image_class_validation: ImageClassValidation {
                    total_slots: 0,
                    class_a_slots: 0,
                    class_b_slots: 0,
                    violations: Vec::new(),
                    unfilled_slots: Vec::new(),
                    is_valid: true,
                },
            },
        }
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let cache = PlanCache::in_memory(60);
        let user = Uuid::new_v4();
        assert!(cache.get(user).await.is_none());

        cache.insert(user, plan("first")).await;
        let cached = cache.get(user).await.unwrap();
        assert_eq!(cached.selection.selection_summary, "first");
        assert_eq!(cache.backend(), "memory");
    }

    #[tokio::test]
    async fn test_insert_replaces_previous_plan() {
        let cache = PlanCache::in_memory(60);
        let user = Uuid::new_v4();
        cache.insert(user, plan("first")).await;
        cache.insert(user, plan("second")).await;
        assert_eq!(
            cache.get(user).await.unwrap().selection.selection_summary,
            "second"
        );
    }

    #[tokio::test]
    async fn test_evict_only_affects_one_user() {
        let cache = PlanCache::in_memory(60);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        cache.insert(a, plan("a")).await;
        cache.insert(b, plan("b")).await;

        assert!(cache.evict(a).await);
        assert!(!cache.evict(a).await);
        assert!(cache.get(a).await.is_none());
        assert!(cache.get(b).await.is_some());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let cache = PlanCache::in_memory(60);
        for _ in 0..3 {
            cache.insert(Uuid::new_v4(), plan("x")).await;
        }
        assert_eq!(cache.clear().await, 3);
        assert_eq!(cache.clear().await, 0);
    }

    #[tokio::test]
    async fn test_expired_plan_is_not_returned() {
        let cache = PlanCache::in_memory(0);
        let user = Uuid::new_v4();
        cache.insert(user, plan("stale")).await;
        assert!(cache.get(user).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_plan_is_removed_on_read() {
        let cache = PlanCache::in_memory(0);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        cache.insert(a, plan("a")).await;
        cache.insert(b, plan("b")).await;
        assert_eq!(cache.local_len().await, 2);

        assert!(cache.get(a).await.is_none());
        assert_eq!(cache.local_len().await, 1);
        assert!(cache.get(b).await.is_none());
        assert_eq!(cache.local_len().await, 0);
    }
}
