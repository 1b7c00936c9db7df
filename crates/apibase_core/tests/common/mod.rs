#![allow(dead_code)]

use apibase_core::cache::{CacheMap, CacheResult, Cacheable, CacheableObject};
use apibase_core::convert::{str_to_bool, str_to_i64, to_cache_value};
use apibase_core::db::open_db_in_memory;
use apibase_core::{FilterValue, RepoEntity};
use rusqlite::{Connection, Row};

pub const PRODUCTS_SCHEMA: &str = "CREATE TABLE products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price INTEGER NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub active: bool,
}

impl Product {
    pub fn new(name: &str, price: i64, active: bool) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            price,
            active,
        }
    }
}

impl RepoEntity for Product {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn table_name() -> &'static str {
        "products"
    }

    fn is_filterable(field: &str) -> bool {
        matches!(field, "id" | "name" | "price" | "active")
    }

    fn columns() -> &'static [&'static str] {
        &["name", "price", "active"]
    }

    fn column_values(&self) -> Vec<FilterValue> {
        vec![
            FilterValue::text(self.name.clone()),
            FilterValue::from(self.price),
            FilterValue::from(self.active),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
            active: row.get(3)?,
        })
    }
}

impl Cacheable for Product {
    fn cache_key(&self) -> String {
        format!("product:{}", self.id)
    }
}

impl CacheableObject for Product {
    fn get_cache_object(&self) -> CacheMap {
        [
            ("id", to_cache_value(&self.id)),
            ("name", self.name.clone()),
            ("price", to_cache_value(&self.price)),
            ("active", to_cache_value(&self.active)),
        ]
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .collect()
    }

    fn set_cache_object(&mut self, data: CacheMap) -> CacheResult<()> {
        let field = |name: &str| data.get(name).map(String::as_str).unwrap_or_default();
        self.id = str_to_i64(field("id"));
        self.name = field("name").to_string();
        self.price = str_to_i64(field("price"));
        self.active = str_to_bool(field("active"));
        Ok(())
    }
}

/// In-memory database with the `products` table.
pub fn products_db() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(PRODUCTS_SCHEMA).unwrap();
    conn
}

/// Inserts `bolt`(10), `nut`(20), `gear`(30, inactive), `belt`(40) with ids 1..=4.
pub fn seed_products(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO products (name, price, active) VALUES
            ('bolt', 10, 1),
            ('nut', 20, 1),
            ('gear', 30, 0),
            ('belt', 40, 1);",
    )
    .unwrap();
}
