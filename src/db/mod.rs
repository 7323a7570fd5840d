pub mod memory;
pub mod postgres;
pub mod redis;
pub mod store;

pub use memory::InMemoryStore;
pub use postgres::{create_pool, PgStore};
pub use self::redis::{create_redis_client, RedisJobLock};
pub use store::{CatalogStore, NotificationStore};
