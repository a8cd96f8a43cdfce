use async_trait::async_trait;
use history_sync_config::StoreConfig;
use history_sync_models::PlaybackRecord;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::debug;
use super::{HistoryWriter, StoreConnector, StoreError};

pub const HISTORY_TABLE: &str = "plex_history";

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS plex_history (
    reference_id  BIGINT PRIMARY KEY,
    watched_at    TIMESTAMPTZ,
    friendly_name TEXT,
    full_title    TEXT,
    media_type    TEXT,
    duration      INTEGER,
    ip_address    TEXT,
    platform      TEXT
)
"#;

const INSERT_PREFIX: &str = "INSERT INTO plex_history \
    (reference_id, watched_at, friendly_name, full_title, media_type, duration, ip_address, platform) ";

const INSERT_SUFFIX: &str = " ON CONFLICT (reference_id) DO NOTHING";

/// 8 binds per row keeps each statement far below the 65535 parameter limit
const INSERT_CHUNK_SIZE: usize = 500;

pub struct PgStoreConnector {
    options: PgConnectOptions,
    connect_timeout: Duration,
    target: String,
}

impl PgStoreConnector {
    pub fn new(config: &StoreConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        Self {
            options,
            connect_timeout: config.connect_timeout(),
            target: config.redacted_url(),
        }
    }

    pub fn from_options(options: PgConnectOptions, connect_timeout: Duration) -> Self {
        let target = format!(
            "postgres://{}:{}/{}",
            options.get_host(),
            options.get_port(),
            options.get_database().unwrap_or_default()
        );
        Self {
            options,
            connect_timeout,
            target,
        }
    }
}

#[async_trait]
impl StoreConnector for PgStoreConnector {
    fn describe(&self) -> String {
        self.target.clone()
    }

    async fn connect(&self) -> Result<Box<dyn HistoryWriter>, StoreError> {
        let conn = tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&self.options))
            .await
            .map_err(|_| StoreError::ConnectTimeout(self.connect_timeout))?
            .map_err(StoreError::Connect)?;

        debug!(target_db = %self.target, "Connected to history store");
        Ok(Box::new(PgHistoryWriter { conn }))
    }
}

/// Single PostgreSQL connection scoped to one sync cycle
pub struct PgHistoryWriter {
    conn: PgConnection,
}

#[async_trait]
impl HistoryWriter for PgHistoryWriter {
    async fn ensure_schema(&mut self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&mut self.conn)
            .await
            .map_err(StoreError::Schema)?;
        Ok(())
    }

    async fn insert_new(&mut self, records: &[PlaybackRecord]) -> Result<u64, StoreError> {
        let mut tx = self.conn.begin().await.map_err(StoreError::Write)?;
        let mut inserted = 0u64;

        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(INSERT_PREFIX);
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.reference_id)
                    .push_bind(record.watched_at)
                    .push_bind(record.friendly_name.clone())
                    .push_bind(record.full_title.clone())
                    .push_bind(record.media_type.clone())
                    .push_bind(record.duration)
                    .push_bind(record.ip_address.clone())
                    .push_bind(record.platform.clone());
            });
            builder.push(INSERT_SUFFIX);

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(StoreError::Write)?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(StoreError::Write)?;
        debug!(
            table = HISTORY_TABLE,
            attempted = records.len(),
            inserted,
            "Committed history batch"
        );
        Ok(inserted)
    }

    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        self.conn.close().await.map_err(StoreError::Connect)
    }
}
