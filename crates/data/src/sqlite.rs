//! SQLite-backed store via sqlx.
//!
//! Rows keep the identity columns queryable (exchange, market, selection,
//! status) and carry the full entity as a JSON payload, so schema churn in
//! the domain types never needs a migration. All writes are
//! `ON CONFLICT ... DO UPDATE` upserts.
//!
//! The pool is capped at a single connection: SQLite is a local file, the
//! managers are the only writers, and one connection keeps `sqlite::memory:`
//! databases coherent in tests.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use betarb_core::{
    ExchangeId, MarketLink, Order, Selection, SelectionKey, SelectionLink, Store,
};

/// A store backed by a local SQLite database.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to `url` (e.g. `sqlite://betarb.db` or `sqlite::memory:`),
    /// creating the file and schema if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema setup fails.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS selections (
                exchange     TEXT    NOT NULL,
                market_id    TEXT    NOT NULL,
                selection_id INTEGER NOT NULL,
                name         TEXT    NOT NULL,
                payload      TEXT    NOT NULL,
                PRIMARY KEY (exchange, market_id, selection_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS orders (
                exchange     TEXT    NOT NULL,
                id           TEXT    NOT NULL,
                exchange_ref TEXT,
                market_id    TEXT    NOT NULL,
                selection_id INTEGER NOT NULL,
                side         INTEGER NOT NULL,
                status       TEXT    NOT NULL,
                payload      TEXT    NOT NULL,
                PRIMARY KEY (exchange, id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS market_links (
                betfair_market_id TEXT NOT NULL,
                betdaq_market_id  TEXT NOT NULL,
                name              TEXT NOT NULL,
                PRIMARY KEY (betfair_market_id, betdaq_market_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS selection_links (
                betfair_market_id    TEXT    NOT NULL,
                betfair_selection_id INTEGER NOT NULL,
                betdaq_market_id     TEXT    NOT NULL,
                betdaq_selection_id  INTEGER NOT NULL,
                name                 TEXT    NOT NULL,
                PRIMARY KEY (
                    betfair_market_id, betfair_selection_id,
                    betdaq_market_id, betdaq_selection_id
                )
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS balances (
                exchange TEXT NOT NULL PRIMARY KEY,
                balance  TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_selection(&self, selection: &Selection) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO selections (exchange, market_id, selection_id, name, payload)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (exchange, market_id, selection_id)
            DO UPDATE SET name = excluded.name, payload = excluded.payload
            ",
        )
        .bind(selection.exchange.as_str())
        .bind(&selection.market_id)
        .bind(selection.selection_id as i64)
        .bind(&selection.name)
        .bind(serde_json::to_string(selection)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn selection(&self, key: &SelectionKey) -> anyhow::Result<Option<Selection>> {
        let row = sqlx::query(
            r"
            SELECT payload FROM selections
            WHERE exchange = $1 AND market_id = $2 AND selection_id = $3
            ",
        )
        .bind(key.0.as_str())
        .bind(&key.1)
        .bind(key.2 as i64)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Ok(serde_json::from_str(&r.get::<String, _>("payload"))?))
            .transpose()
    }

    async fn upsert_order(&self, order: &Order) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO orders
                (exchange, id, exchange_ref, market_id, selection_id, side, status, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (exchange, id) DO UPDATE SET
                exchange_ref = excluded.exchange_ref,
                status = excluded.status,
                payload = excluded.payload
            ",
        )
        .bind(order.exchange.as_str())
        .bind(order.id.to_string())
        .bind(order.exchange_ref.as_deref())
        .bind(&order.market_id)
        .bind(order.selection_id as i64)
        .bind(i64::from(order.side.as_u8()))
        .bind(order.status.as_str())
        .bind(serde_json::to_string(order)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn order(&self, exchange: ExchangeId, id: Uuid) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query("SELECT payload FROM orders WHERE exchange = $1 AND id = $2")
            .bind(exchange.as_str())
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Ok(serde_json::from_str(&r.get::<String, _>("payload"))?))
            .transpose()
    }

    async fn unmatched_orders(&self, exchange: ExchangeId) -> anyhow::Result<Vec<Order>> {
        let rows =
            sqlx::query("SELECT payload FROM orders WHERE exchange = $1 AND status = 'unmatched'")
                .bind(exchange.as_str())
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|r| Ok(serde_json::from_str(&r.get::<String, _>("payload"))?))
            .collect()
    }

    async fn upsert_market_link(&self, link: &MarketLink) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO market_links (betfair_market_id, betdaq_market_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (betfair_market_id, betdaq_market_id)
            DO UPDATE SET name = excluded.name
            ",
        )
        .bind(&link.betfair_market_id)
        .bind(&link.betdaq_market_id)
        .bind(&link.name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_selection_link(&self, link: &SelectionLink) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO selection_links
                (betfair_market_id, betfair_selection_id,
                 betdaq_market_id, betdaq_selection_id, name)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (betfair_market_id, betfair_selection_id,
                         betdaq_market_id, betdaq_selection_id)
            DO UPDATE SET name = excluded.name
            ",
        )
        .bind(&link.betfair_market_id)
        .bind(link.betfair_selection_id as i64)
        .bind(&link.betdaq_market_id)
        .bind(link.betdaq_selection_id as i64)
        .bind(&link.name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_balance(&self, exchange: ExchangeId, balance: Decimal) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO balances (exchange, balance) VALUES ($1, $2)
            ON CONFLICT (exchange) DO UPDATE SET balance = excluded.balance
            ",
        )
        .bind(exchange.as_str())
        .bind(balance.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn balance(&self, exchange: ExchangeId) -> anyhow::Result<Option<Decimal>> {
        let row = sqlx::query("SELECT balance FROM balances WHERE exchange = $1")
            .bind(exchange.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Ok(Decimal::from_str(&r.get::<String, _>("balance"))?))
            .transpose()
    }
}
