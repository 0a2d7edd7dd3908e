use sqlx::{
    postgres::{PgConnectOptions, PgConnection},
    Connection,
};

use crate::{config::Config, db::pool::ConnectionManager, models::Drama};

/// Columns cast to the types `Drama` decodes, so NUMERIC/REAL variants of
/// the external schema read the same way.
const FIND_BY_TITLE_SQL: &str = r#"
    SELECT title,
           year::int4 AS year,
           rating::float8 AS rating,
           rating_count::int8 AS rating_count,
           description,
           country,
           episodes::int4 AS episodes,
           airing_start::date AS airing_start,
           airing_end::date AS airing_end,
           network,
           duration,
           content_rating,
           genre,
           trailer_url,
           image_url
    FROM dramas
    WHERE title ILIKE $1 ESCAPE '\'
    ORDER BY length(title), title
    LIMIT 1
"#;

/// Opens plain Postgres connections for the bot's own pool
pub struct PgConnectionManager {
    options: PgConnectOptions,
}

impl PgConnectionManager {
    pub fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &Config) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.db_host)
            .port(config.db_port)
            .database(&config.db_name)
            .username(&config.db_user)
            .password(&config.db_password)
            .application_name("drama-bot");

        Self::new(options)
    }
}

#[async_trait::async_trait]
impl ConnectionManager for PgConnectionManager {
    type Connection = PgConnection;

    async fn connect(&self) -> Result<PgConnection, sqlx::Error> {
        PgConnection::connect_with(&self.options).await
    }

    async fn close(&self, conn: PgConnection) {
        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "Failed to close database connection cleanly");
        }
    }
}

/// Read-only queries against the `dramas` table
#[async_trait::async_trait]
pub trait DramaStore: Send {
    /// First row whose title matches the ILIKE `pattern`, shortest title first
    async fn find_by_title(&mut self, pattern: &str) -> Result<Option<Drama>, sqlx::Error>;

    /// Round-trip to check the connection is alive
    async fn ping(&mut self) -> Result<(), sqlx::Error>;
}

#[async_trait::async_trait]
impl DramaStore for PgConnection {
    async fn find_by_title(&mut self, pattern: &str) -> Result<Option<Drama>, sqlx::Error> {
        sqlx::query_as::<_, Drama>(FIND_BY_TITLE_SQL)
            .bind(pattern)
            .fetch_optional(&mut *self)
            .await
    }

    async fn ping(&mut self) -> Result<(), sqlx::Error> {
        Connection::ping(self).await
    }
}

/// Errors after which the connection itself can no longer be trusted
pub fn is_connection_error(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

/// Builds an ILIKE pattern matching `query` literally anywhere in a title
pub fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
