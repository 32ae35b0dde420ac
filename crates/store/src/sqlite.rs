//! SQLite backend.
//!
//! One database file holds the catalog and the conversation log:
//! - `customers`, `products`, `orders`: read-only from the agent's side
//! - `conversation_history`: append-only turns, one JSON-encoded body per row
//!
//! Money is stored as integer cents and surfaced as currency units. Turn
//! timestamps are fixed-width RFC 3339 strings, so text comparison orders them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use shopdesk_core::catalog::{cents_to_units, units_to_cents};
use shopdesk_core::error::StoreError;
use shopdesk_core::message::{ChatMessage, MessageContent, Role, SessionId, Turn};
use shopdesk_core::{CatalogStore, ConversationStore, Customer, Order, Product};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use crate::seed::{CatalogSeed, SeedSummary};

/// A production SQLite store for the catalog and the conversation log.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and run migrations.
    ///
    /// Accepts a plain path or a `sqlite:` URL. `":memory:"` gives a private
    /// ephemeral database pinned to a single connection.
    pub async fn new(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connection(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        if let Some(dir) = options.get_filename().parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    StoreError::Connection(format!("Cannot create {}: {e}", dir.display()))
                })?;
            }
        }

        // Every connection to :memory: is a separate database.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        }
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Connection(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {url}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create every table and index. Safe to run repeatedly.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements: [(&str, &str); 7] = [
            (
                "customers table",
                r#"
                CREATE TABLE IF NOT EXISTS customers (
                    id          INTEGER PRIMARY KEY,
                    first_name  TEXT NOT NULL,
                    last_name   TEXT NOT NULL,
                    email       TEXT
                )
                "#,
            ),
            (
                "products table",
                r#"
                CREATE TABLE IF NOT EXISTS products (
                    id            INTEGER PRIMARY KEY,
                    product_name  TEXT NOT NULL,
                    description   TEXT,
                    price_cents   INTEGER NOT NULL,
                    stock         INTEGER NOT NULL DEFAULT 0
                )
                "#,
            ),
            (
                "orders table",
                r#"
                CREATE TABLE IF NOT EXISTS orders (
                    id           INTEGER PRIMARY KEY,
                    customer_id  INTEGER NOT NULL REFERENCES customers(id),
                    product_id   INTEGER NOT NULL REFERENCES products(id),
                    quantity     INTEGER NOT NULL,
                    order_date   TEXT NOT NULL,
                    status       TEXT NOT NULL,
                    total_cents  INTEGER NOT NULL
                )
                "#,
            ),
            (
                "conversation_history table",
                r#"
                CREATE TABLE IF NOT EXISTS conversation_history (
                    iid           INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id    TEXT NOT NULL,
                    role          TEXT NOT NULL,
                    content       TEXT NOT NULL,
                    message_type  TEXT NOT NULL,
                    created_at    TEXT NOT NULL
                )
                "#,
            ),
            (
                "last_name index",
                "CREATE INDEX IF NOT EXISTS idx_customers_last_name ON customers(last_name COLLATE NOCASE)",
            ),
            (
                "customer_id index",
                "CREATE INDEX IF NOT EXISTS idx_orders_customer_id ON orders(customer_id)",
            ),
            (
                "session index",
                "CREATE INDEX IF NOT EXISTS idx_history_session ON conversation_history(session_id, created_at)",
            ),
        ];

        for (what, sql) in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(format!("{what}: {e}")))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Upsert a catalog fixture in one transaction.
    pub async fn seed(&self, seed: &CatalogSeed) -> Result<SeedSummary, StoreError> {
        seed.validate()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        for c in &seed.customers {
            sqlx::query(
                "INSERT OR REPLACE INTO customers (id, first_name, last_name, email) VALUES (?, ?, ?, ?)",
            )
            .bind(c.id)
            .bind(&c.first_name)
            .bind(&c.last_name)
            .bind(&c.email)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("insert customer {}: {e}", c.id)))?;
        }

        for p in &seed.products {
            sqlx::query(
                "INSERT OR REPLACE INTO products (id, product_name, description, price_cents, stock) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(p.id)
            .bind(&p.product_name)
            .bind(&p.description)
            .bind(units_to_cents(p.price))
            .bind(p.stock)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("insert product {}: {e}", p.id)))?;
        }

        for o in &seed.orders {
            sqlx::query(
                r#"INSERT OR REPLACE INTO orders
                   (id, customer_id, product_id, quantity, order_date, status, total_cents)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(o.id)
            .bind(o.customer_id)
            .bind(o.product_id)
            .bind(o.quantity)
            .bind(o.order_date.format("%Y-%m-%d").to_string())
            .bind(&o.status)
            .bind(units_to_cents(o.total))
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("insert order {}: {e}", o.id)))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::QueryFailed(format!("commit seed: {e}")))?;

        let summary = seed.summary();
        info!(%summary, "Catalog seeded");
        Ok(summary)
    }

    fn row_to_customer(row: &SqliteRow) -> Result<Customer, StoreError> {
        Ok(Customer {
            id: column(row, "id")?,
            first_name: column(row, "first_name")?,
            last_name: column(row, "last_name")?,
            email: column(row, "email")?,
        })
    }

    fn row_to_order(row: &SqliteRow) -> Result<Order, StoreError> {
        let date: String = column(row, "order_date")?;
        let order_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| StoreError::Corrupt(format!("order_date '{date}': {e}")))?;
        Ok(Order {
            id: column(row, "id")?,
            customer_id: column(row, "customer_id")?,
            product_id: column(row, "product_id")?,
            quantity: column(row, "quantity")?,
            order_date,
            status: column(row, "status")?,
            total: cents_to_units(column(row, "total_cents")?),
        })
    }

    fn row_to_product(row: &SqliteRow) -> Result<Product, StoreError> {
        Ok(Product {
            id: column(row, "id")?,
            product_name: column(row, "product_name")?,
            description: column(row, "description")?,
            price: cents_to_units(column(row, "price_cents")?),
            stock: column(row, "stock")?,
        })
    }

    fn row_to_message(row: &SqliteRow) -> Result<ChatMessage, StoreError> {
        let role: String = column(row, "role")?;
        let content: String = column(row, "content")?;
        let role = Role::from_str(&role).map_err(StoreError::Corrupt)?;
        let content: MessageContent = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("turn content: {e}")))?;
        Ok(ChatMessage { role, content })
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| StoreError::QueryFailed(format!("{name} column: {e}")))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Wrap a user-supplied fragment for a `LIKE ... ESCAPE '\'` substring match.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl CatalogStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find_order_by_id(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("find order: {e}")))?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn find_customers_by_last_name(
        &self,
        last_name: &str,
    ) -> Result<Vec<Customer>, StoreError> {
        let rows =
            sqlx::query("SELECT * FROM customers WHERE last_name = ? COLLATE NOCASE ORDER BY id")
                .bind(last_name)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::QueryFailed(format!("find customers: {e}")))?;
        rows.iter().map(Self::row_to_customer).collect()
    }

    async fn find_customers_by_name(
        &self,
        last_name: &str,
        first_name: &str,
    ) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT * FROM customers
               WHERE last_name = ? COLLATE NOCASE
                 AND first_name LIKE ? ESCAPE '\'
               ORDER BY id"#,
        )
        .bind(last_name)
        .bind(like_pattern(first_name))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("find customers: {e}")))?;
        rows.iter().map(Self::row_to_customer).collect()
    }

    async fn find_orders_by_customer_id(&self, customer_id: i64) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders WHERE customer_id = ? ORDER BY id")
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("find orders: {e}")))?;
        rows.iter().map(Self::row_to_order).collect()
    }

    async fn find_product_by_id(&self, product_id: i64) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT * FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("find product: {e}")))?;
        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn find_products_by_name(&self, tokens: &[String]) -> Result<Vec<Product>, StoreError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let conditions = vec![r"product_name LIKE ? ESCAPE '\'"; tokens.len()].join(" AND ");
        let sql = format!("SELECT * FROM products WHERE {conditions} ORDER BY id");

        let mut query = sqlx::query(&sql);
        for token in tokens {
            query = query.bind(like_pattern(token));
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("find products: {e}")))?;
        rows.iter().map(Self::row_to_product).collect()
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append_turn(&self, turn: &Turn) -> Result<(), StoreError> {
        let content = serde_json::to_string(&turn.content)
            .map_err(|e| StoreError::QueryFailed(format!("encode turn: {e}")))?;

        sqlx::query(
            r#"INSERT INTO conversation_history
               (session_id, role, content, message_type, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(turn.session_id.as_str())
        .bind(turn.role.as_str())
        .bind(&content)
        .bind(turn.message_type.as_str())
        .bind(timestamp(turn.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("append turn: {e}")))?;

        debug!(
            session = %turn.session_id,
            role = turn.role.as_str(),
            message_type = turn.message_type.as_str(),
            "Turn persisted"
        );
        Ok(())
    }

    async fn load_since(
        &self,
        session_id: &SessionId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT role, content FROM conversation_history
               WHERE session_id = ? AND created_at > ?
               ORDER BY created_at ASC, iid ASC"#,
        )
        .bind(session_id.as_str())
        .bind(timestamp(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("load history: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shopdesk_core::message::{ContentBlock, MessageType};
    use shopdesk_core::tool::ToolResult;

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:", 1).await.unwrap()
    }

    fn fixture() -> CatalogSeed {
        CatalogSeed::from_json(
            r#"{
                "customers": [
                    {"id": 1, "first_name": "Jane", "last_name": "Smith", "email": "jane@example.com"},
                    {"id": 2, "first_name": "Jan", "last_name": "Smith"},
                    {"id": 3, "first_name": "Omar", "last_name": "Haddad"}
                ],
                "products": [
                    {"id": 10, "product_name": "Wireless Mouse", "price": 24.99, "stock": 40},
                    {"id": 11, "product_name": "Wired Mouse", "price": 9.5, "stock": 0},
                    {"id": 12, "product_name": "100% Cotton Mouse Pad", "price": 7.0, "stock": 3}
                ],
                "orders": [
                    {"id": 1001, "customer_id": 1, "product_id": 10, "quantity": 2,
                     "order_date": "2025-03-14", "status": "shipped", "total": 49.98},
                    {"id": 1002, "customer_id": 3, "product_id": 11, "quantity": 1,
                     "order_date": "2025-04-01", "status": "pending", "total": 9.5},
                    {"id": 1003, "customer_id": 3, "product_id": 12, "quantity": 1,
                     "order_date": "2025-04-02", "status": "delivered", "total": 7.0}
                ]
            }"#,
        )
        .unwrap()
    }

    async fn seeded_store() -> SqliteStore {
        let store = test_store().await;
        store.seed(&fixture()).await.unwrap();
        store
    }

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let store = test_store().await;
        store.run_migrations().await.unwrap();
        store.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");
        let url = path.to_string_lossy().to_string();

        {
            let store = SqliteStore::new(&url, 2).await.unwrap();
            store.seed(&fixture()).await.unwrap();
        }

        let store = SqliteStore::new(&url, 2).await.unwrap();
        assert!(store.find_order_by_id(1001).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn order_round_trips_money_and_date() {
        let store = seeded_store().await;
        let order = store.find_order_by_id(1001).await.unwrap().unwrap();
        assert_eq!(order.customer_id, 1);
        assert_eq!(order.total, 49.98);
        assert_eq!(order.order_date.to_string(), "2025-03-14");
        assert!(store.find_order_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn last_name_match_ignores_case() {
        let store = seeded_store().await;
        let found = store.find_customers_by_last_name("sMiTh").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].email.as_deref(), Some("jane@example.com"));
        assert!(store.find_customers_by_last_name("Smit").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_name_is_a_substring_match() {
        let store = seeded_store().await;
        // "jan" is contained in both "Jane" and "Jan".
        assert_eq!(store.find_customers_by_name("smith", "jan").await.unwrap().len(), 2);
        let jane = store.find_customers_by_name("Smith", "Jane").await.unwrap();
        assert_eq!(jane.len(), 1);
        assert_eq!(jane[0].id, 1);
        assert!(store.find_customers_by_name("Smith", "Omar").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orders_for_customer_in_id_order() {
        let store = seeded_store().await;
        let orders = store.find_orders_by_customer_id(3).await.unwrap();
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1002, 1003]);
        assert!(store.find_orders_by_customer_id(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn product_lookup_by_id() {
        let store = seeded_store().await;
        let product = store.find_product_by_id(10).await.unwrap().unwrap();
        assert_eq!(product.product_name, "Wireless Mouse");
        assert_eq!(product.price, 24.99);
        assert!(store.find_product_by_id(77).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn product_search_requires_every_token() {
        let store = seeded_store().await;
        assert_eq!(store.find_products_by_name(&tokens(&["mouse"])).await.unwrap().len(), 3);
        let hits = store
            .find_products_by_name(&tokens(&["MOUSE", "wireless"]))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 10);
        assert!(store.find_products_by_name(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn product_search_escapes_like_wildcards() {
        let store = seeded_store().await;
        // A bare "%" would match everything if passed through unescaped.
        let hits = store.find_products_by_name(&tokens(&["%"])).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 12);
        assert!(store.find_products_by_name(&tokens(&["_"])).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_preserves_append_order() {
        let store = test_store().await;
        let session = SessionId::from("s-order");

        store
            .append(&session, Role::User, "Where is order 1001?".into(), MessageType::Text)
            .await
            .unwrap();
        store
            .append(
                &session,
                Role::Assistant,
                vec![ContentBlock::ToolUse {
                    id: "toolu_1".into(),
                    name: "get_order".into(),
                    input: serde_json::json!({"order_id": "1001"}),
                }]
                .into(),
                MessageType::ToolUse,
            )
            .await
            .unwrap();
        store
            .append(
                &session,
                Role::User,
                ChatMessage::tool_results(vec![ToolResult {
                    tool_use_id: "toolu_1".into(),
                    content: r#"{"status":"success"}"#.into(),
                }])
                .content,
                MessageType::ToolResult,
            )
            .await
            .unwrap();

        let history = store.load(&session).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0], ChatMessage::user("Where is order 1001?"));
        assert_eq!(history[1].content.tool_calls()[0].id, "toolu_1");
        match &history[2].content {
            MessageContent::Blocks(blocks) => assert!(matches!(
                &blocks[0],
                ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == "toolu_1"
            )),
            other => panic!("expected blocks, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn turns_with_equal_timestamps_keep_insertion_order() {
        let store = test_store().await;
        let session = SessionId::from("s-tie");
        let at = Utc::now();

        for text in ["first", "second", "third"] {
            let turn = Turn::new(session.clone(), Role::User, text, MessageType::Text)
                .with_created_at(at);
            store.append_turn(&turn).await.unwrap();
        }

        let texts: Vec<String> = store
            .load(&session)
            .await
            .unwrap()
            .iter()
            .map(|m| m.content.text_fragments().concat())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn history_window_excludes_old_turns() {
        let store = test_store().await;
        let session = SessionId::from("s-window");

        let old = Turn::new(session.clone(), Role::User, "four days ago", MessageType::Text)
            .with_created_at(Utc::now() - Duration::days(4));
        let recent = Turn::new(session.clone(), Role::User, "two days ago", MessageType::Text)
            .with_created_at(Utc::now() - Duration::days(2));
        store.append_turn(&old).await.unwrap();
        store.append_turn(&recent).await.unwrap();

        let history = store.load(&session).await.unwrap();
        assert_eq!(history, vec![ChatMessage::user("two days ago")]);

        let wide = store.load_within(&session, Duration::days(7)).await.unwrap();
        assert_eq!(wide.len(), 2);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = test_store().await;
        let a = SessionId::from("a");
        let b = SessionId::from("b");
        store.append(&a, Role::User, "for a".into(), MessageType::Text).await.unwrap();

        assert_eq!(store.load(&a).await.unwrap().len(), 1);
        assert!(store.load(&b).await.unwrap().is_empty());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("mouse"), "%mouse%");
        assert_eq!(like_pattern("100%"), r"%100\%%");
        assert_eq!(like_pattern("a_b"), r"%a\_b%");
        assert_eq!(like_pattern(r"c\d"), r"%c\\d%");
    }
}
