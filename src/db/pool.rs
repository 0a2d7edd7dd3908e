//! Bounded connection pool with an explicit lifecycle.
//!
//! The pool moves through `Uninitialized -> Ready -> Closed`. Capacity is
//! tracked by a semaphore with one permit per connection that may be lent
//! out; the idle stack and bookkeeping sit behind a mutex that is never held
//! across an `.await`.
//!
//! Borrowed connections come back through [`PooledConnection`]'s `Drop`, so a
//! caller cannot leak one on an early return or a `?`.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::error::PoolError;

/// Opens and closes the connections a [`ConnectionPool`] hands out
#[async_trait::async_trait]
pub trait ConnectionManager: Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Open a fresh connection to the backing store
    async fn connect(&self) -> Result<Self::Connection, sqlx::Error>;

    /// Close a connection the pool no longer wants
    async fn close(&self, conn: Self::Connection);
}

/// Behaviour of `acquire` once every connection is lent out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquirePolicy {
    /// Wait up to `acquire_timeout` for a connection to be released
    #[default]
    Wait,
    /// Report exhaustion immediately
    FailFast,
}

#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub min_size: usize,
    pub max_size: usize,
    pub acquire_policy: AcquirePolicy,
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 10,
            acquire_policy: AcquirePolicy::Wait,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Uninitialized,
    Ready,
    Closed,
}

/// Point-in-time view of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub state: PoolState,
    /// Open connections, idle and lent
    pub size: usize,
    pub idle: usize,
    pub in_use: usize,
    pub min_size: usize,
    pub max_size: usize,
}

struct Inner<C> {
    state: PoolState,
    idle: Vec<C>,
    size: usize,
}

struct Shared<M: ConnectionManager> {
    manager: M,
    options: PoolOptions,
    semaphore: Arc<Semaphore>,
    inner: Mutex<Inner<M::Connection>>,
}

/// Cloneable handle to a shared connection pool
pub struct ConnectionPool<M: ConnectionManager> {
    shared: Arc<Shared<M>>,
}

impl<M: ConnectionManager> Clone for ConnectionPool<M> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<M: ConnectionManager> ConnectionPool<M> {
    /// Creates an uninitialized pool. No connection is opened until
    /// [`initialize`](Self::initialize) is called.
    pub fn new(options: PoolOptions, manager: M) -> Result<Self, PoolError> {
        if options.max_size == 0 {
            return Err(PoolError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if options.min_size > options.max_size {
            return Err(PoolError::InvalidConfig(format!(
                "min_size ({}) exceeds max_size ({})",
                options.min_size, options.max_size
            )));
        }

        Ok(Self {
            shared: Arc::new(Shared {
                manager,
                semaphore: Arc::new(Semaphore::new(options.max_size)),
                inner: Mutex::new(Inner {
                    state: PoolState::Uninitialized,
                    idle: Vec::with_capacity(options.max_size),
                    size: 0,
                }),
                options,
            }),
        })
    }

    /// Opens the initial connections and makes the pool usable.
    ///
    /// At least one connection is opened even when `min_size` is zero, so an
    /// unreachable store or bad credentials surface here rather than on the
    /// first request.
    pub async fn initialize(&self) -> Result<(), PoolError> {
        match self.lock().state {
            PoolState::Uninitialized => {}
            PoolState::Ready => return Err(PoolError::AlreadyInitialized),
            PoolState::Closed => return Err(PoolError::Closed),
        }

        let target = self.shared.options.min_size.max(1);
        let mut opened = Vec::with_capacity(target);
        for _ in 0..target {
            match self.shared.manager.connect().await {
                Ok(conn) => opened.push(conn),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to initialize database connection pool");
                    self.close_all(opened).await;
                    return Err(PoolError::Initialization(e));
                }
            }
        }

        let rejected = {
            let mut inner = self.lock();
            match inner.state {
                PoolState::Uninitialized => {
                    inner.size = opened.len();
                    inner.idle = opened;
                    inner.state = PoolState::Ready;
                    None
                }
                PoolState::Ready => Some((opened, PoolError::AlreadyInitialized)),
                PoolState::Closed => Some((opened, PoolError::Closed)),
            }
        };

        if let Some((opened, err)) = rejected {
            self.close_all(opened).await;
            return Err(err);
        }

        tracing::info!(
            min_size = self.shared.options.min_size,
            max_size = self.shared.options.max_size,
            "Database connection pool initialized"
        );
        Ok(())
    }

    /// Borrows a connection, reusing an idle one when available.
    pub async fn acquire(&self) -> Result<PooledConnection<M>, PoolError> {
        self.ensure_ready()?;

        let permit = self.acquire_permit().await?;

        let idle = {
            let mut inner = self.lock();
            if inner.state != PoolState::Ready {
                return Err(PoolError::Closed);
            }
            match inner.idle.pop() {
                Some(conn) => Some(conn),
                None => {
                    // Reserve the slot before connecting so `size` never
                    // undercounts while the connect is in flight
                    inner.size += 1;
                    None
                }
            }
        };

        let conn = match idle {
            Some(conn) => conn,
            None => match self.shared.manager.connect().await {
                Ok(conn) => {
                    // Teardown may have run while the connect was in flight
                    if self.lock().state != PoolState::Ready {
                        self.discard(conn);
                        return Err(PoolError::Closed);
                    }
                    tracing::debug!("Opened a new pooled connection");
                    conn
                }
                Err(e) => {
                    self.lock().size -= 1;
                    return Err(PoolError::Connect(e));
                }
            },
        };

        tracing::debug!("Retrieved a connection from the pool");

        Ok(PooledConnection {
            conn: Some(conn),
            pool: self.clone(),
            _permit: permit,
        })
    }

    /// Returns a borrowed connection. Never fails: after teardown the
    /// connection is closed instead of being kept.
    pub fn release(&self, handle: PooledConnection<M>) {
        drop(handle);
    }

    /// Closes the pool. Idle connections are closed now, lent ones when
    /// their handle comes back. Waiters in `acquire` are woken with
    /// [`PoolError::Closed`]. Calling it again is a no-op.
    pub async fn teardown(&self) {
        let idle = {
            let mut inner = self.lock();
            if inner.state == PoolState::Closed {
                return;
            }
            inner.state = PoolState::Closed;
            let idle = std::mem::take(&mut inner.idle);
            inner.size -= idle.len();
            idle
        };

        self.shared.semaphore.close();

        let closed = idle.len();
        self.close_all(idle).await;

        tracing::info!(closed, "Database connection pool closed");
    }

    pub fn state(&self) -> PoolState {
        self.lock().state
    }

    pub fn status(&self) -> PoolStatus {
        let inner = self.lock();
        PoolStatus {
            state: inner.state,
            size: inner.size,
            idle: inner.idle.len(),
            in_use: inner.size - inner.idle.len(),
            min_size: self.shared.options.min_size,
            max_size: self.shared.options.max_size,
        }
    }

    pub fn manager(&self) -> &M {
        &self.shared.manager
    }

    fn ensure_ready(&self) -> Result<(), PoolError> {
        match self.lock().state {
            PoolState::Ready => Ok(()),
            PoolState::Uninitialized => Err(PoolError::NotInitialized),
            PoolState::Closed => Err(PoolError::Closed),
        }
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, PoolError> {
        let semaphore = self.shared.semaphore.clone();

        match self.shared.options.acquire_policy {
            AcquirePolicy::FailFast => semaphore.try_acquire_owned().map_err(|e| match e {
                TryAcquireError::Closed => PoolError::Closed,
                TryAcquireError::NoPermits => PoolError::Exhausted { waited_ms: 0 },
            }),
            AcquirePolicy::Wait => {
                let start = Instant::now();
                let timeout = self.shared.options.acquire_timeout;
                match tokio::time::timeout(timeout, semaphore.acquire_owned()).await {
                    Ok(Ok(permit)) => Ok(permit),
                    Ok(Err(_)) => Err(PoolError::Closed),
                    Err(_) => Err(PoolError::Exhausted {
                        waited_ms: start.elapsed().as_millis() as u64,
                    }),
                }
            }
        }
    }

    fn put_back(&self, conn: M::Connection) {
        let stale = {
            let mut inner = self.lock();
            if inner.state == PoolState::Ready {
                inner.idle.push(conn);
                None
            } else {
                inner.size -= 1;
                Some(conn)
            }
        };

        match stale {
            None => tracing::debug!("Connection returned to the pool"),
            Some(conn) => self.close_detached(conn),
        }
    }

    fn discard(&self, conn: M::Connection) {
        self.lock().size -= 1;
        self.close_detached(conn);
    }

    /// Closes a connection from a synchronous context such as `Drop`
    fn close_detached(&self, conn: M::Connection) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let pool = self.clone();
                handle.spawn(async move {
                    pool.shared.manager.close(conn).await;
                });
            }
            // Runtime already gone; dropping the connection closes its socket
            Err(_) => drop(conn),
        }
    }

    async fn close_all(&self, conns: Vec<M::Connection>) {
        for conn in conns {
            self.shared.manager.close(conn).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<M::Connection>> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A connection borrowed from a [`ConnectionPool`].
///
/// Dropping the handle returns the connection to the pool.
pub struct PooledConnection<M: ConnectionManager> {
    conn: Option<M::Connection>,
    pool: ConnectionPool<M>,
    // Released after `Drop::drop` has put the connection back
    _permit: OwnedSemaphorePermit,
}

impl<M: ConnectionManager> PooledConnection<M> {
    /// Returns the connection to its pool
    pub fn release(self) {
        drop(self);
    }

    /// Closes the connection instead of returning it, for connections left
    /// in an unknown state (e.g. a query abandoned mid-flight).
    pub fn discard(mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.discard(conn);
        }
    }
}

impl<M: ConnectionManager> Deref for PooledConnection<M> {
    type Target = M::Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
            .as_ref()
            .expect("BUG: PooledConnection used after return to pool")
    }
}

impl<M: ConnectionManager> DerefMut for PooledConnection<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn
            .as_mut()
            .expect("BUG: PooledConnection used after return to pool")
    }
}

impl<M: ConnectionManager> Drop for PooledConnection<M> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.put_back(conn);
        }
    }
}
