//! Custody transition table
//!
//! Each custody hand-over is one row: the status the device must be in, the
//! role the caller must hold, the role the recipient must hold, the status the
//! device ends in and any extra fields the edge stamps. The engine evaluates
//! rows; it holds no per-edge logic of its own.
//!
//! ```text
//! MANUFACTURE --manufacturer->warehouse--> WAREHOUSE
//! MANUFACTURE --manufacturer->custcare---> REPLACE
//! WAREHOUSE   --warehouse->store---------> STORE
//! WAREHOUSE   --warehouse->retailer------> RETAILER
//! WAREHOUSE   --warehouse->manufacturer--> RETURN
//! RETAILER    --retailer->custcare-------> SOLD
//! RETAILER    --retailer->warehouse------> RETURN
//! STORE       --store->custcare----------> SOLD
//! STORE       --store->warehouse---------> RETURN
//! ```
use super::device::{Role, Status};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    ManufacturerToWarehouse,
    ManufacturerToCustCare,
    WarehouseToStore,
    WarehouseToRetailer,
    WarehouseToManufacturer,
    RetailerToCustCare,
    RetailerToWarehouse,
    StoreToCustCare,
    StoreToWarehouse,
}

/// Extra fields written by an edge besides owner and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    None,
    /// sale date and selling actor
    Sale,
    /// identifier of the device being replaced
    Replacement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub kind: Transition,
    pub from: Status,
    pub caller: Role,
    pub recipient: Role,
    pub to: Status,
    pub stamp: Stamp,
}

const fn rule(
    kind: Transition,
    from: Status,
    caller: Role,
    recipient: Role,
    to: Status,
    stamp: Stamp,
) -> Rule {
    Rule {
        kind,
        from,
        caller,
        recipient,
        to,
        stamp,
    }
}

/// Rows are ordered like the `Transition` variants.
pub static RULES: [Rule; 9] = [
    rule(
        Transition::ManufacturerToWarehouse,
        Status::Manufacture,
        Role::Manufacturer,
        Role::Warehouse,
        Status::Warehouse,
        Stamp::None,
    ),
    rule(
        Transition::ManufacturerToCustCare,
        Status::Manufacture,
        Role::Manufacturer,
        Role::CustCare,
        Status::Replace,
        Stamp::Replacement,
    ),
    rule(
        Transition::WarehouseToStore,
        Status::Warehouse,
        Role::Warehouse,
        Role::Store,
        Status::Store,
        Stamp::None,
    ),
    rule(
        Transition::WarehouseToRetailer,
        Status::Warehouse,
        Role::Warehouse,
        Role::Retailer,
        Status::Retailer,
        Stamp::None,
    ),
    rule(
        Transition::WarehouseToManufacturer,
        Status::Warehouse,
        Role::Warehouse,
        Role::Manufacturer,
        Status::Return,
        Stamp::None,
    ),
    rule(
        Transition::RetailerToCustCare,
        Status::Retailer,
        Role::Retailer,
        Role::CustCare,
        Status::Sold,
        Stamp::Sale,
    ),
    rule(
        Transition::RetailerToWarehouse,
        Status::Retailer,
        Role::Retailer,
        Role::Warehouse,
        Status::Return,
        Stamp::None,
    ),
    rule(
        Transition::StoreToCustCare,
        Status::Store,
        Role::Store,
        Role::CustCare,
        Status::Sold,
        Stamp::Sale,
    ),
    rule(
        Transition::StoreToWarehouse,
        Status::Store,
        Role::Store,
        Role::Warehouse,
        Status::Return,
        Stamp::None,
    ),
];

impl Transition {
    pub const ALL: [Transition; 9] = [
        Transition::ManufacturerToWarehouse,
        Transition::ManufacturerToCustCare,
        Transition::WarehouseToStore,
        Transition::WarehouseToRetailer,
        Transition::WarehouseToManufacturer,
        Transition::RetailerToCustCare,
        Transition::RetailerToWarehouse,
        Transition::StoreToCustCare,
        Transition::StoreToWarehouse,
    ];

    pub fn rule(&self) -> &'static Rule {
        &RULES[*self as usize]
    }

    /// Operation name the router exposes, `<caller role>_to_<recipient role>`.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Transition::ManufacturerToWarehouse => "manufacturer_to_warehouse",
            Transition::ManufacturerToCustCare => "manufacturer_to_custcare",
            Transition::WarehouseToStore => "warehouse_to_store",
            Transition::WarehouseToRetailer => "warehouse_to_retailer",
            Transition::WarehouseToManufacturer => "warehouse_to_manufacturer",
            Transition::RetailerToCustCare => "retailer_to_custcare",
            Transition::RetailerToWarehouse => "retailer_to_warehouse",
            Transition::StoreToCustCare => "store_to_custcare",
            Transition::StoreToWarehouse => "store_to_warehouse",
        }
    }

    pub fn from_operation(name: &str) -> Option<Transition> {
        Transition::ALL
            .into_iter()
            .find(|kind| kind.operation_name() == name)
    }

    /// Edges leaving `status`.
    pub fn from_status(status: Status) -> impl Iterator<Item = Transition> {
        RULES
            .iter()
            .filter(move |rule| rule.from == status)
            .map(|rule| rule.kind)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_kind_has_exactly_one_rule() {
        assert_eq!(Transition::ALL.len(), RULES.len());
        for kind in Transition::ALL {
            let rows = RULES.iter().filter(|rule| rule.kind == kind).count();
            assert_eq!(rows, 1, "{kind}");
            assert_eq!(kind.rule().kind, kind);
        }
    }

    #[test]
    fn operation_names_follow_roles() {
        for rule in RULES {
            let expected = format!("{}_to_{}", rule.caller, rule.recipient);
            assert_eq!(rule.kind.operation_name(), expected);
            assert_eq!(Transition::from_operation(&expected), Some(rule.kind));
        }
        assert_eq!(Transition::from_operation("custcare_to_manufacturer"), None);
    }

    #[test]
    fn edges_are_unambiguous() {
        let edges: HashSet<_> = RULES
            .iter()
            .map(|rule| (rule.from, rule.caller, rule.recipient))
            .collect();
        assert_eq!(edges.len(), RULES.len());
    }

    #[test]
    fn end_of_life_statuses_are_terminal() {
        for status in [Status::Return, Status::Replace, Status::Sold] {
            assert_eq!(Transition::from_status(status).count(), 0, "{status}");
        }
        assert_eq!(Transition::from_status(Status::Warehouse).count(), 3);
    }

    #[test]
    fn only_sales_stamp_sale_fields() {
        for rule in RULES {
            assert_eq!(rule.stamp == Stamp::Sale, rule.to == Status::Sold);
            assert_eq!(rule.stamp == Stamp::Replacement, rule.to == Status::Replace);
        }
    }
}
