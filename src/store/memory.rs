//! In-process store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::aggregates::{AddressBook, Cart, Category, Discount, Order, Product, Wishlist};
use crate::store::{keyed, return_inventory, take_inventory, ProductQuery, StatusUpdate, Store};
use crate::{Result, StorefrontError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, Category>,
    discounts: HashMap<Uuid, Discount>,
    /// Carts are kept in their serialized snapshot form.
    carts: HashMap<String, String>,
    orders: HashMap<Uuid, Order>,
    address_books: HashMap<String, AddressBook>,
    wishlists: HashMap<String, Wishlist>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

impl Inner {
    fn order_products(&self, order: &Order) -> HashMap<Uuid, Product> {
        keyed(order.items().iter().filter_map(|i| self.products.get(&i.product_id).cloned()))
    }

    /// Stores copies of `products` without their pending events.
    fn put_products(&mut self, products: &[Product]) {
        for product in products {
            let mut stored = product.clone();
            stored.take_events();
            self.products.insert(stored.id(), stored);
        }
    }

    fn put_order(&mut self, order: &Order) {
        let mut stored = order.clone();
        stored.take_events();
        self.orders.insert(stored.id(), stored);
    }
}

fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_products(&self, query: &ProductQuery) -> Result<(Vec<Product>, u64)> {
        let inner = self.inner.read().await;
        let needle = query.search.as_deref().map(str::to_lowercase);
        let matching: Vec<Product> = inner
            .products
            .values()
            .filter(|p| p.is_active())
            .filter(|p| query.category.map_or(true, |c| p.category_id() == Some(c)))
            .filter(|p| needle.as_deref().map_or(true, |n| p.name().to_lowercase().contains(n)))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let page = newest_first(matching, Product::created_at)
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();
        Ok((page, total))
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.products.get(id).cloned()).collect())
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        self.inner.write().await.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self.inner.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.inner.read().await.categories.get(&id).cloned())
    }

    async fn save_category(&self, category: &Category) -> Result<()> {
        self.inner.write().await.categories.insert(category.id(), category.clone());
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.categories.remove(&id).is_some())
    }

    async fn list_discounts(&self) -> Result<Vec<Discount>> {
        let discounts = self.inner.read().await.discounts.values().cloned().collect();
        Ok(newest_first(discounts, Discount::created_at))
    }

    async fn list_live_discounts(&self, now: DateTime<Utc>) -> Result<Vec<Discount>> {
        let discounts = self.inner.read().await.discounts.values().filter(|d| d.is_live_at(now)).cloned().collect();
        Ok(newest_first(discounts, Discount::created_at))
    }

    async fn get_discount(&self, id: Uuid) -> Result<Option<Discount>> {
        Ok(self.inner.read().await.discounts.get(&id).cloned())
    }

    async fn save_discount(&self, discount: &Discount) -> Result<()> {
        self.inner.write().await.discounts.insert(discount.id(), discount.clone());
        Ok(())
    }

    async fn delete_discount(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.discounts.remove(&id).is_some())
    }

    async fn load_cart(&self, session_id: &str) -> Result<Option<Cart>> {
        let inner = self.inner.read().await;
        Ok(inner.carts.get(session_id).map(|json| Cart::from_json(json)).transpose()?)
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        let json = cart.to_json()?;
        self.inner.write().await.carts.insert(cart.session_id().to_string(), json);
        Ok(())
    }

    async fn delete_cart(&self, session_id: &str) -> Result<()> {
        self.inner.write().await.carts.remove(session_id);
        Ok(())
    }

    async fn place_order(&self, order: &Order, session_id: &str) -> Result<Vec<Product>> {
        let mut inner = self.inner.write().await;
        let mut products = inner.order_products(order);
        take_inventory(order, &mut products)?;
        let products: Vec<Product> = products.into_values().collect();
        inner.put_products(&products);
        inner.put_order(order);
        inner.carts.remove(session_id);
        Ok(products)
    }

    async fn advance_order(&self, id: Uuid, update: StatusUpdate) -> Result<(Order, Vec<Product>)> {
        let mut inner = self.inner.write().await;
        let mut order = inner.orders.get(&id).cloned().ok_or(StorefrontError::OrderNotFound(id))?;
        let mut restocked = vec![];
        if update.apply(&mut order)? {
            let mut products = inner.order_products(&order);
            return_inventory(&order, &mut products);
            restocked = products.into_values().collect();
            inner.put_products(&restocked);
        }
        inner.put_order(&order);
        Ok((order, restocked))
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, customer_id: Option<&str>) -> Result<Vec<Order>> {
        let orders = self
            .inner
            .read()
            .await
            .orders
            .values()
            .filter(|o| customer_id.map_or(true, |c| o.customer_id() == c))
            .cloned()
            .collect();
        Ok(newest_first(orders, Order::created_at))
    }

    async fn load_address_book(&self, customer_id: &str) -> Result<AddressBook> {
        let inner = self.inner.read().await;
        Ok(inner.address_books.get(customer_id).cloned().unwrap_or_else(|| AddressBook::new(customer_id)))
    }

    async fn save_address_book(&self, book: &AddressBook) -> Result<()> {
        self.inner.write().await.address_books.insert(book.customer_id().to_string(), book.clone());
        Ok(())
    }

    async fn load_wishlist(&self, customer_id: &str) -> Result<Wishlist> {
        let inner = self.inner.read().await;
        Ok(inner.wishlists.get(customer_id).cloned().unwrap_or_else(|| Wishlist::new(customer_id)))
    }

    async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<()> {
        self.inner.write().await.wishlists.insert(wishlist.customer_id().to_string(), wishlist.clone());
        Ok(())
    }
}
