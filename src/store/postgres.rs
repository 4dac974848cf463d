//! PostgreSQL store. Each aggregate is one JSONB `doc` column plus the
//! columns the queries filter and sort on.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::aggregates::{AddressBook, Cart, CartSnapshot, Category, Discount, Order, Product, Wishlist};
use crate::store::{keyed, return_inventory, take_inventory, ProductQuery, StatusUpdate, Store};
use crate::{Result, StorefrontError};

const PRODUCT_FILTER: &str = "status = 'active' AND ($1::uuid IS NULL OR category_id = $1) AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')";

#[derive(Debug, Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self { Self { db } }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let db = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self::new(db))
    }

    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db).await
    }
}

async fn upsert_product(conn: &mut PgConnection, p: &Product) -> Result<()> {
    sqlx::query(
        "INSERT INTO products (id, category_id, status, name, created_at, doc) VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (id) DO UPDATE SET category_id = $2, status = $3, name = $4, doc = $6, updated_at = NOW()",
    )
    .bind(p.id()).bind(p.category_id()).bind(p.status().as_str()).bind(p.name()).bind(p.created_at()).bind(Json(p))
    .execute(conn).await?;
    Ok(())
}

async fn upsert_order(conn: &mut PgConnection, o: &Order) -> Result<()> {
    sqlx::query(
        "INSERT INTO orders (id, customer_id, status, created_at, doc) VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (id) DO UPDATE SET status = $3, doc = $5, updated_at = NOW()",
    )
    .bind(o.id()).bind(o.customer_id()).bind(o.status().as_str()).bind(o.created_at()).bind(Json(o))
    .execute(conn).await?;
    Ok(())
}

/// Loads the order's products and holds their row locks until the
/// transaction ends. Rows are locked in id order.
async fn lock_products(conn: &mut PgConnection, order: &Order) -> Result<HashMap<Uuid, Product>> {
    let ids: Vec<Uuid> = order.items().iter().map(|i| i.product_id).collect();
    let rows: Vec<(Json<Product>,)> = sqlx::query_as("SELECT doc FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(&ids).fetch_all(conn).await?;
    Ok(keyed(docs(rows)))
}

fn docs<T>(rows: Vec<(Json<T>,)>) -> Vec<T> {
    rows.into_iter().map(|(Json(doc),)| doc).collect()
}

#[async_trait]
impl Store for PgStore {
    async fn list_products(&self, query: &ProductQuery) -> Result<(Vec<Product>, u64)> {
        let rows: Vec<(Json<Product>,)> = sqlx::query_as(&format!(
            "SELECT doc FROM products WHERE {PRODUCT_FILTER} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(query.category).bind(query.search.as_deref())
        .bind(i64::from(query.per_page)).bind(query.offset() as i64)
        .fetch_all(&self.db).await?;
        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {PRODUCT_FILTER}"))
            .bind(query.category).bind(query.search.as_deref())
            .fetch_one(&self.db).await?;
        Ok((docs(rows), total.0.max(0) as u64))
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        let row: Option<(Json<Product>,)> = sqlx::query_as("SELECT doc FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(p),)| p))
    }

    async fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let rows: Vec<(Json<Product>,)> = sqlx::query_as("SELECT doc FROM products WHERE id = ANY($1)")
            .bind(ids).fetch_all(&self.db).await?;
        Ok(docs(rows))
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        let mut conn = self.db.acquire().await?;
        upsert_product(&mut conn, product).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<(Json<Category>,)> = sqlx::query_as("SELECT doc FROM categories ORDER BY name")
            .fetch_all(&self.db).await?;
        Ok(docs(rows))
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        let row: Option<(Json<Category>,)> = sqlx::query_as("SELECT doc FROM categories WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(c),)| c))
    }

    async fn save_category(&self, category: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, doc) VALUES ($1, $2, $3) ON CONFLICT (id) DO UPDATE SET name = $2, doc = $3")
            .bind(category.id()).bind(category.name()).bind(Json(category))
            .execute(&self.db).await?;
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_discounts(&self) -> Result<Vec<Discount>> {
        let rows: Vec<(Json<Discount>,)> = sqlx::query_as("SELECT doc FROM discounts ORDER BY created_at DESC")
            .fetch_all(&self.db).await?;
        Ok(docs(rows))
    }

    async fn list_live_discounts(&self, now: DateTime<Utc>) -> Result<Vec<Discount>> {
        let rows: Vec<(Json<Discount>,)> = sqlx::query_as(
            "SELECT doc FROM discounts WHERE active AND start_date <= $1 AND end_date >= $1 ORDER BY created_at DESC",
        )
        .bind(now).fetch_all(&self.db).await?;
        Ok(docs(rows))
    }

    async fn get_discount(&self, id: Uuid) -> Result<Option<Discount>> {
        let row: Option<(Json<Discount>,)> = sqlx::query_as("SELECT doc FROM discounts WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(d),)| d))
    }

    async fn save_discount(&self, d: &Discount) -> Result<()> {
        sqlx::query(
            "INSERT INTO discounts (id, active, start_date, end_date, show_on_home_page, created_at, doc) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET active = $2, start_date = $3, end_date = $4, show_on_home_page = $5, doc = $7, updated_at = NOW()",
        )
        .bind(d.id()).bind(d.is_active()).bind(d.start_date()).bind(d.end_date()).bind(d.show_on_home_page())
        .bind(d.created_at()).bind(Json(d))
        .execute(&self.db).await?;
        Ok(())
    }

    async fn delete_discount(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_cart(&self, session_id: &str) -> Result<Option<Cart>> {
        let row: Option<(Json<CartSnapshot>,)> = sqlx::query_as("SELECT doc FROM carts WHERE session_id = $1")
            .bind(session_id).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(snapshot),)| Cart::from_snapshot(snapshot)).transpose()?)
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            "INSERT INTO carts (session_id, doc, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (session_id) DO UPDATE SET doc = $2, updated_at = NOW()",
        )
        .bind(cart.session_id()).bind(Json(cart.to_snapshot()))
        .execute(&self.db).await?;
        Ok(())
    }

    async fn delete_cart(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM carts WHERE session_id = $1").bind(session_id).execute(&self.db).await?;
        Ok(())
    }

    async fn place_order(&self, order: &Order, session_id: &str) -> Result<Vec<Product>> {
        let mut tx = self.db.begin().await?;
        let mut products = lock_products(&mut *tx, order).await?;
        take_inventory(order, &mut products)?;
        let products: Vec<Product> = products.into_values().collect();
        for product in &products {
            upsert_product(&mut *tx, product).await?;
        }
        upsert_order(&mut *tx, order).await?;
        sqlx::query("DELETE FROM carts WHERE session_id = $1").bind(session_id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(products)
    }

    async fn advance_order(&self, id: Uuid, update: StatusUpdate) -> Result<(Order, Vec<Product>)> {
        let mut tx = self.db.begin().await?;
        let row: Option<(Json<Order>,)> = sqlx::query_as("SELECT doc FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id).fetch_optional(&mut *tx).await?;
        let (Json(mut order),) = row.ok_or(StorefrontError::OrderNotFound(id))?;
        let mut restocked = vec![];
        if update.apply(&mut order)? {
            let mut products = lock_products(&mut *tx, &order).await?;
            return_inventory(&order, &mut products);
            restocked = products.into_values().collect();
            for product in &restocked {
                upsert_product(&mut *tx, product).await?;
            }
        }
        upsert_order(&mut *tx, &order).await?;
        tx.commit().await?;
        Ok((order, restocked))
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        let row: Option<(Json<Order>,)> = sqlx::query_as("SELECT doc FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(o),)| o))
    }

    async fn list_orders(&self, customer_id: Option<&str>) -> Result<Vec<Order>> {
        let rows: Vec<(Json<Order>,)> = sqlx::query_as(
            "SELECT doc FROM orders WHERE ($1::text IS NULL OR customer_id = $1) ORDER BY created_at DESC",
        )
        .bind(customer_id).fetch_all(&self.db).await?;
        Ok(docs(rows))
    }

    async fn load_address_book(&self, customer_id: &str) -> Result<AddressBook> {
        let row: Option<(Json<AddressBook>,)> = sqlx::query_as("SELECT doc FROM address_books WHERE customer_id = $1")
            .bind(customer_id).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(b),)| b).unwrap_or_else(|| AddressBook::new(customer_id)))
    }

    async fn save_address_book(&self, book: &AddressBook) -> Result<()> {
        sqlx::query(
            "INSERT INTO address_books (customer_id, doc) VALUES ($1, $2) ON CONFLICT (customer_id) DO UPDATE SET doc = $2",
        )
        .bind(book.customer_id()).bind(Json(book))
        .execute(&self.db).await?;
        Ok(())
    }

    async fn load_wishlist(&self, customer_id: &str) -> Result<Wishlist> {
        let row: Option<(Json<Wishlist>,)> = sqlx::query_as("SELECT doc FROM wishlists WHERE customer_id = $1")
            .bind(customer_id).fetch_optional(&self.db).await?;
        Ok(row.map(|(Json(w),)| w).unwrap_or_else(|| Wishlist::new(customer_id)))
    }

    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()> {
        sqlx::query(
            "INSERT INTO wishlists (customer_id, doc) VALUES ($1, $2) ON CONFLICT (customer_id) DO UPDATE SET doc = $2",
        )
        .bind(wishlist.customer_id()).bind(Json(wishlist))
        .execute(&self.db).await?;
        Ok(())
    }
}
