//! Address Book Aggregate
//!
//! A non-empty book always has exactly one default address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBook {
    customer_id: String,
    addresses: Vec<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewAddress {
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl AddressBook {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self { customer_id: customer_id.into(), addresses: vec![] }
    }

    pub fn customer_id(&self) -> &str { &self.customer_id }
    pub fn addresses(&self) -> &[Address] { &self.addresses }
    pub fn get(&self, id: Uuid) -> Option<&Address> { self.addresses.iter().find(|a| a.id == id) }
    pub fn default_address(&self) -> Option<&Address> { self.addresses.iter().find(|a| a.is_default) }

    /// Adds an address. The first address is always the default.
    pub fn add(&mut self, new: NewAddress, make_default: bool) -> Result<Uuid, AddressError> {
        for (field, value) in [("fullName", &new.full_name), ("line1", &new.line1), ("city", &new.city), ("postalCode", &new.postal_code), ("country", &new.country)] {
            if value.trim().is_empty() { return Err(AddressError::MissingField(field)); }
        }
        let id = Uuid::now_v7();
        let is_default = make_default || self.addresses.is_empty();
        if is_default { self.clear_default(); }
        self.addresses.push(Address {
            id, full_name: new.full_name, line1: new.line1, line2: new.line2, city: new.city, state: new.state,
            postal_code: new.postal_code, country: new.country, phone: new.phone, is_default, created_at: Utc::now(),
        });
        Ok(id)
    }

    pub fn set_default(&mut self, id: Uuid) -> Result<(), AddressError> {
        if self.get(id).is_none() { return Err(AddressError::NotFound(id)); }
        for a in &mut self.addresses { a.is_default = a.id == id; }
        Ok(())
    }

    /// Removes an address; removing the default promotes the oldest remaining one.
    pub fn remove(&mut self, id: Uuid) -> Result<Address, AddressError> {
        let idx = self.addresses.iter().position(|a| a.id == id).ok_or(AddressError::NotFound(id))?;
        let removed = self.addresses.remove(idx);
        if removed.is_default {
            if let Some(first) = self.addresses.first_mut() { first.is_default = true; }
        }
        Ok(removed)
    }

    fn clear_default(&mut self) {
        for a in &mut self.addresses { a.is_default = false; }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address {0} not found")]
    NotFound(Uuid),
    #[error("address field {0} is required")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_address(name: &str) -> NewAddress {
        NewAddress {
            full_name: name.into(),
            line1: "1 Main St".into(),
            city: "Springfield".into(),
            postal_code: "12345".into(),
            country: "US".into(),
            ..Default::default()
        }
    }

    fn default_count(book: &AddressBook) -> usize {
        book.addresses().iter().filter(|a| a.is_default).count()
    }

    #[test]
    fn test_first_address_is_default() {
        let mut book = AddressBook::new("c1");
        let a = book.add(new_address("A"), false).unwrap();
        assert_eq!(book.default_address().unwrap().id, a);
        let b = book.add(new_address("B"), false).unwrap();
        assert_eq!(book.default_address().unwrap().id, a);
        assert!(!book.get(b).unwrap().is_default);
    }

    #[test]
    fn test_single_default() {
        let mut book = AddressBook::new("c1");
        book.add(new_address("A"), false).unwrap();
        let b = book.add(new_address("B"), true).unwrap();
        assert_eq!(default_count(&book), 1);
        assert_eq!(book.default_address().unwrap().id, b);
        let c = book.add(new_address("C"), false).unwrap();
        book.set_default(c).unwrap();
        assert_eq!(default_count(&book), 1);
        assert_eq!(book.default_address().unwrap().id, c);
    }

    #[test]
    fn test_remove_default_promotes_oldest() {
        let mut book = AddressBook::new("c1");
        let a = book.add(new_address("A"), false).unwrap();
        let b = book.add(new_address("B"), false).unwrap();
        book.add(new_address("C"), false).unwrap();
        book.remove(a).unwrap();
        assert_eq!(book.default_address().unwrap().id, b);
        assert_eq!(default_count(&book), 1);
    }

    #[test]
    fn test_errors() {
        let mut book = AddressBook::new("c1");
        let missing = Uuid::now_v7();
        assert_eq!(book.set_default(missing), Err(AddressError::NotFound(missing)));
        assert_eq!(book.remove(missing), Err(AddressError::NotFound(missing)));
        let mut bad = new_address("A");
        bad.city = " ".into();
        assert_eq!(book.add(bad, false), Err(AddressError::MissingField("city")));
    }
}
