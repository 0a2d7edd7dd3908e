pub mod pool;
pub mod postgres;

pub use pool::{AcquirePolicy, ConnectionManager, ConnectionPool, PoolOptions, PoolState, PooledConnection};
pub use postgres::{DramaStore, PgConnectionManager};
