//! # Menu Repository
//!
//! Read access to the `menu_items` catalog, plus the insert used by the
//! seed binary. The register never edits the menu.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use comanda_core::validation::{validate_price, validate_required};
use comanda_core::{MenuItem, Money};

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: String,
    name: String,
    category: String,
    price: i64,
    description: Option<String>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            name: row.name,
            category: row.category,
            price: Money::from_minor(row.price),
            description: row.description,
        }
    }
}

/// Repository for the `menu_items` catalog.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    /// Creates a new MenuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// The whole catalog, grouped by category then name.
    pub async fn list_all(&self) -> DbResult<Vec<MenuItem>> {
        let rows: Vec<MenuItemRow> = sqlx::query_as(
            "SELECT id, name, category, price, description FROM menu_items ORDER BY category, name",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded menu");
        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    /// Items of one category, by name.
    pub async fn by_category(&self, category: &str) -> DbResult<Vec<MenuItem>> {
        let rows: Vec<MenuItemRow> = sqlx::query_as(
            r#"
            SELECT id, name, category, price, description
            FROM menu_items
            WHERE category = ?1
            ORDER BY name
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    /// Distinct category names, sorted.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM menu_items ORDER BY category")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    /// Gets a menu item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let row: Option<MenuItemRow> = sqlx::query_as(
            "SELECT id, name, category, price, description FROM menu_items WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MenuItem::from))
    }

    /// Inserts a catalog item. An empty id gets a fresh UUID.
    pub async fn insert(&self, item: &MenuItem) -> DbResult<MenuItem> {
        validate_required("name", &item.name)?;
        validate_required("category", &item.category)?;
        validate_price(item.price)?;

        let mut item = item.clone();
        if item.id.is_empty() {
            item.id = Uuid::new_v4().to_string();
        }

        sqlx::query(
            r#"
            INSERT INTO menu_items (id, name, category, price, description)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price.minor())
        .bind(&item.description)
        .execute(&self.pool)
        .await?;

        debug!(id = %item.id, name = %item.name, "Inserted menu item");
        Ok(item)
    }
}
