use std::env;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

const DEFAULT_POOL_SIZE: u32 = 10;

/// Pool size from `DATABASE_POOL_SIZE`; unset or unparseable values fall back
/// to the default.
fn pool_size(raw: Option<String>) -> u32 {
    raw.and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_POOL_SIZE)
}

pub fn create_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(pool_size(env::var("DATABASE_POOL_SIZE").ok()))
        .build(manager)
        .expect("Failed to create database connection pool")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_parses_or_falls_back() {
        assert_eq!(pool_size(Some("4".to_string())), 4);
        assert_eq!(pool_size(Some("not a number".to_string())), DEFAULT_POOL_SIZE);
        assert_eq!(pool_size(None), DEFAULT_POOL_SIZE);
    }
}
