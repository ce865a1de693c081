//! Catalog entities: products, companies, and account managers.

use chrono::{DateTime, Utc};
use common::{AccountManagerId, CompanyId, Points, ProductId};
use serde::{Deserialize, Serialize};

/// Whether a product ships physically or is delivered electronically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    /// Tangible goods that consume inventory and ship to an address.
    Physical,
    /// Gift cards, licenses, and other electronically delivered goods.
    Virtual,
}

impl ProductType {
    /// Returns true if items of this type go through the ship/deliver flow.
    pub fn requires_shipping(&self) -> bool {
        matches!(self, ProductType::Physical)
    }

    /// Returns true if items of this type reserve and consume stock.
    pub fn requires_inventory(&self) -> bool {
        matches!(self, ProductType::Physical)
    }

    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Physical => "Physical",
            ProductType::Virtual => "Virtual",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A redeemable product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub points_cost: Points,
    pub product_type: ProductType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new active product.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        points_cost: Points,
        product_type: ProductType,
    ) -> Self {
        Self {
            id: ProductId::new(),
            sku: sku.into(),
            name: name.into(),
            description: None,
            points_cost,
            product_type,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A customer organization holding a loyalty account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// External account id in the points ledger. A company without one
    /// cannot redeem.
    pub loyalty_account_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Company {
    /// Creates a new active company with a loyalty account.
    pub fn new(name: impl Into<String>, loyalty_account_id: impl Into<String>) -> Self {
        Self {
            id: CompanyId::new(),
            name: name.into(),
            loyalty_account_id: Some(loyalty_account_id.into()),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A person authorized to place redemption orders for a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountManager {
    pub id: AccountManagerId,
    pub company_id: CompanyId,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AccountManager {
    /// Creates a new active account manager for a company.
    pub fn new(
        company_id: CompanyId,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountManagerId::new(),
            company_id,
            name: name.into(),
            email: email.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_type_predicates() {
        assert!(ProductType::Physical.requires_shipping());
        assert!(ProductType::Physical.requires_inventory());
        assert!(!ProductType::Virtual.requires_shipping());
        assert!(!ProductType::Virtual.requires_inventory());
    }

    #[test]
    fn test_product_type_display() {
        assert_eq!(ProductType::Physical.to_string(), "Physical");
        assert_eq!(ProductType::Virtual.to_string(), "Virtual");
    }

    #[test]
    fn test_new_product_is_active() {
        let product = Product::new("MUG-001", "Coffee Mug", Points::new(500), ProductType::Physical);
        assert!(product.is_active);
        assert_eq!(product.sku, "MUG-001");
        assert_eq!(product.points_cost, Points::new(500));
    }

    #[test]
    fn test_new_company_has_loyalty_account() {
        let company = Company::new("Acme Corp", "ACME001");
        assert!(company.is_active);
        assert_eq!(company.loyalty_account_id.as_deref(), Some("ACME001"));
    }

    #[test]
    fn test_account_manager_belongs_to_company() {
        let company = Company::new("Acme Corp", "ACME001");
        let manager = AccountManager::new(company.id, "Jane Doe", "jane@acme.example");
        assert_eq!(manager.company_id, company.id);
        assert!(manager.is_active);
    }
}
