//! Aggregates module
pub mod product;
pub mod category;
pub mod discount;
pub mod cart;
pub mod order;
pub mod address;
pub mod wishlist;

pub use product::{Product, ProductError, ProductStatus};
pub use category::{Category, CategoryError};
pub use discount::{Discount, DiscountDraft, DiscountError, DiscountKind};
pub use cart::{Cart, CartError, CartItem, CartSnapshot};
pub use order::{Checkout, LineItem, Order, OrderError, OrderStatus, OrderTotals, PaymentStatus, ShippingAddress};
pub use address::{Address, AddressBook, AddressError, NewAddress};
pub use wishlist::Wishlist;
