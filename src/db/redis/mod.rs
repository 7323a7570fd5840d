pub mod lock;

pub use lock::RedisJobLock;

use redis::Client;

/// Creates a Redis client for the distributed job lock
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}
