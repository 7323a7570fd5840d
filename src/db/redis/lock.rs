use std::time::Duration;

use redis::{Client, Script};
use uuid::Uuid;

use crate::{
    error::AppResult,
    services::job_lock::{JobLease, JobLock},
};

/// Deletes the key only while it still carries our token, so a lease that
/// outlived its TTL cannot free somebody else's lock.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

fn lock_key(key: &str) -> String {
    format!("lock:{}", key)
}

/// Job lock shared by every service instance pointing at the same Redis
#[derive(Clone)]
pub struct RedisJobLock {
    client: Client,
    ttl: Duration,
}

impl RedisJobLock {
    pub fn new(client: Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }
}

struct RedisLease {
    client: Client,
    key: String,
    token: String,
}

#[async_trait::async_trait]
impl JobLease for RedisLease {
    async fn release(self: Box<Self>) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let released: i32 = Script::new(RELEASE_SCRIPT)
            .key(&self.key)
            .arg(&self.token)
            .invoke_async(&mut conn)
            .await?;

        if released == 0 {
            tracing::warn!(key = %self.key, "Job lock expired before release");
        } else {
            tracing::debug!(key = %self.key, "Job lock released");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobLock for RedisJobLock {
    async fn try_acquire(&self, key: &str) -> AppResult<Option<Box<dyn JobLease>>> {
        let key = lock_key(key);
        let token = Uuid::new_v4().to_string();
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let acquired: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(self.ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;

        if acquired.is_none() {
            tracing::debug!(key = %key, "Job lock held elsewhere");
            return Ok(None);
        }

        tracing::debug!(key = %key, ttl_ms = self.ttl.as_millis() as u64, "Job lock acquired");
        Ok(Some(Box::new(RedisLease {
            client: self.client.clone(),
            key,
            token,
        })))
    }
}
