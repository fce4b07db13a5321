//! Catalogue of the entities this client knows by type.
//!
//! Records keep the server's SCREAMING_SNAKE field names on the wire. Every
//! field is optional because the server decides which ones it returns
//! (`fields`, `expandLevel`), and anything not modelled here survives in the
//! flattened `extra` map.

mod bank_ml_descriptions;
mod employee_standard_costs;
mod extended_field_categories;
mod items;
mod sales_orders;

pub use bank_ml_descriptions::{BankMlDescription, BankMlDescriptions};
pub use employee_standard_costs::{EmployeeStandardCost, EmployeeStandardCosts};
pub use extended_field_categories::{ExtendedFieldCategories, ExtendedFieldCategory};
pub use items::{Item, Items};
pub use sales_orders::{SalesOrder, SalesOrders};

use crate::entity::Entity;
use crate::error::{ApiError, Result};

/// Name and wire path of a catalogued entity, for front-ends that pick the
/// entity at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityInfo {
    pub name: &'static str,
    pub path: &'static str,
}

pub const ALL: &[EntityInfo] = &[
    EntityInfo {
        name: "BankMLDescriptions",
        path: <BankMlDescriptions as Entity>::PATH,
    },
    EntityInfo {
        name: "EmployeeStandardCosts",
        path: <EmployeeStandardCosts as Entity>::PATH,
    },
    EntityInfo {
        name: "ExtendedFieldCategories",
        path: <ExtendedFieldCategories as Entity>::PATH,
    },
    EntityInfo {
        name: "Items",
        path: <Items as Entity>::PATH,
    },
    EntityInfo {
        name: "SalesOrders",
        path: <SalesOrders as Entity>::PATH,
    },
];

/// Look an entity up by name or path, ignoring case.
pub fn resolve(name: &str) -> Result<&'static EntityInfo> {
    let name = name.trim();
    ALL.iter()
        .find(|e| e.name.eq_ignore_ascii_case(name) || e.path.eq_ignore_ascii_case(name))
        .ok_or_else(|| ApiError::InvalidArgument(format!("unknown entity {name:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_by_name_or_path() {
        assert_eq!(resolve("BankMLDescriptions").unwrap().path, "bankMLDescriptions");
        assert_eq!(resolve("salesorders").unwrap().name, "SalesOrders");
        assert_eq!(resolve(" ITEMS ").unwrap().path, "items");
    }

    #[test]
    fn resolve_unknown_entity() {
        assert!(matches!(resolve("Nope"), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn paths_are_unique() {
        for (i, a) in ALL.iter().enumerate() {
            assert!(ALL[i + 1..].iter().all(|b| !a.path.eq_ignore_ascii_case(b.path)));
        }
    }
}
