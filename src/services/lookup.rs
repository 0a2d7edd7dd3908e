use std::time::Duration;

use crate::{
    db::{
        postgres::{contains_pattern, is_connection_error},
        ConnectionManager, ConnectionPool, DramaStore,
    },
    error::LookupError,
    models::Drama,
};

/// Finds dramas by title
///
/// Handlers depend on this trait rather than on the pool, so they can be
/// exercised without a database.
#[async_trait::async_trait]
pub trait DramaFinder: Send + Sync {
    /// Case-insensitive substring match on the title.
    ///
    /// Returns at most one drama; when several match, the shortest title
    /// wins, then alphabetical order. An empty query matches every row.
    async fn find(&self, query: &str) -> Result<Option<Drama>, LookupError>;

    /// Checks that the backing store answers
    async fn ping(&self) -> Result<(), LookupError>;
}

/// [`DramaFinder`] backed by a connection pool
pub struct DramaLookup<M: ConnectionManager> {
    pool: ConnectionPool<M>,
    query_timeout: Duration,
}

impl<M: ConnectionManager> DramaLookup<M> {
    pub fn new(pool: ConnectionPool<M>, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &ConnectionPool<M> {
        &self.pool
    }

    fn timeout_ms(&self) -> u64 {
        self.query_timeout.as_millis() as u64
    }
}

#[async_trait::async_trait]
impl<M> DramaFinder for DramaLookup<M>
where
    M: ConnectionManager,
    M::Connection: DramaStore,
{
    async fn find(&self, query: &str) -> Result<Option<Drama>, LookupError> {
        let pattern = contains_pattern(query);
        let mut conn = match self.pool.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, query = %query, "No connection available for drama lookup");
                return Err(e.into());
            }
        };

        // `conn` goes back to the pool when it drops, unless discarded below
        match tokio::time::timeout(self.query_timeout, conn.find_by_title(&pattern)).await {
            Ok(Ok(drama)) => {
                tracing::debug!(query = %query, found = drama.is_some(), "Drama lookup finished");
                Ok(drama)
            }
            Ok(Err(e)) => {
                let broken = is_connection_error(&e);
                tracing::error!(error = %e, query = %query, broken, "Error fetching drama details");
                if broken {
                    conn.discard();
                }
                Err(LookupError::Failed(e))
            }
            Err(_) => {
                tracing::error!(
                    query = %query,
                    timeout_ms = self.timeout_ms(),
                    "Drama lookup timed out"
                );
                conn.discard();
                Err(LookupError::Timeout(self.timeout_ms()))
            }
        }
    }

    async fn ping(&self) -> Result<(), LookupError> {
        let mut conn = self.pool.acquire().await?;

        match tokio::time::timeout(self.query_timeout, conn.ping()).await {
            Ok(Ok(())) => Ok(()),
            // A connection that cannot answer `SELECT 1` is not worth keeping
            Ok(Err(e)) => {
                conn.discard();
                Err(LookupError::Failed(e))
            }
            Err(_) => {
                conn.discard();
                Err(LookupError::Timeout(self.timeout_ms()))
            }
        }
    }
}
