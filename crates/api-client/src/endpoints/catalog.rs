//! Catalog of REST collections exposed by the MES Office API

use std::fmt;
use std::str::FromStr;

/// Route segment for lookups by business code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSegment {
    /// `GET {base}/code/{code}`
    Code,
    /// `GET {base}/by-code/{code}`
    ByCode,
}

impl CodeSegment {
    /// Route segment as written in the URL
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::ByCode => "by-code",
        }
    }
}

/// Functional area an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityGroup {
    /// Reference and configuration data
    MasterData,
    /// Stock movements and warehouse documents
    Stock,
    /// Purchasing documents
    Purchasing,
    /// Sales documents
    Sales,
}

impl fmt::Display for EntityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MasterData => "master data",
            Self::Stock => "stock",
            Self::Purchasing => "purchasing",
            Self::Sales => "sales",
        })
    }
}

macro_rules! entities {
    ($( $variant:ident => $name:literal, $path:literal, $segment:ident, $group:ident, $workflow:literal; )+) => {
        /// A REST collection of the MES Office API
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Entity {
            $( #[doc = concat!("`", $path, "`")] $variant, )+
        }

        impl Entity {
            /// Every entity, in catalog order
            pub const ALL: &'static [Entity] = &[$( Entity::$variant, )+];

            /// Kebab-case name used on the command line
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }

            /// Collection route, relative to the API base URL
            #[must_use]
            pub fn base_path(self) -> &'static str {
                match self {
                    $( Self::$variant => $path, )+
                }
            }

            /// Route segment used for lookups by code
            #[must_use]
            pub fn code_segment(self) -> CodeSegment {
                match self {
                    $( Self::$variant => CodeSegment::$segment, )+
                }
            }

            /// Functional area
            #[must_use]
            pub fn group(self) -> EntityGroup {
                match self {
                    $( Self::$variant => EntityGroup::$group, )+
                }
            }

            /// Whether the collection exposes workflow transitions and history
            #[must_use]
            pub fn has_workflow(self) -> bool {
                match self {
                    $( Self::$variant => $workflow, )+
                }
            }
        }
    };
}

entities! {
    Addresses => "addresses", "api/addresses", Code, MasterData, false;
    AuditLogs => "audit-logs", "api/audit-logs", Code, MasterData, false;
    BusinessRules => "business-rules", "api/configuration/business-rules", Code, MasterData, false;
    Carriers => "carriers", "api/carriers", ByCode, MasterData, false;
    Companies => "companies", "api/companies", ByCode, MasterData, false;
    Contacts => "contacts", "api/contacts", Code, MasterData, false;
    Customers => "customers", "api/customers", ByCode, MasterData, false;
    Departments => "departments", "api/departments", ByCode, MasterData, false;
    TransactionNumbers => "transaction-numbers", "api/configuration/transaction-numbers", Code, MasterData, false;
    Languages => "languages", "api/configuration/localization/languages", Code, MasterData, false;
    Localization => "localization", "api/configuration/localization", Code, MasterData, false;
    LocalizedMessages => "localized-messages", "api/localizedmessages", Code, MasterData, false;
    Locations => "locations", "api/locations", ByCode, MasterData, false;
    Machines => "machines", "api/machines", ByCode, MasterData, false;
    Partners => "partners", "api/partners", ByCode, MasterData, false;
    Permissions => "permissions", "api/permissions", ByCode, MasterData, false;
    ProductBatches => "product-batches", "api/product-batches", Code, MasterData, false;
    ProductCategories => "product-categories", "api/product-categories", Code, MasterData, false;
    Products => "products", "api/products", Code, MasterData, false;
    Projects => "projects", "api/projects", ByCode, MasterData, false;
    Roles => "roles", "api/roles", ByCode, MasterData, false;
    SecurityGroups => "security-groups", "api/securitygroups", Code, MasterData, false;
    Sites => "sites", "api/sites", Code, MasterData, false;
    StockBins => "stock-bins", "api/stock-bins", ByCode, MasterData, false;
    MovementReasons => "movement-reasons", "api/stock/movement-reasons", Code, MasterData, false;
    Suppliers => "suppliers", "api/suppliers", Code, MasterData, false;
    UnitsOfMeasure => "uom", "api/uom", ByCode, MasterData, false;
    Users => "users", "api/users", ByCode, MasterData, false;
    Warehouses => "warehouses", "api/warehouses", ByCode, MasterData, false;
    WorkflowStatuses => "workflow-statuses", "api/workflows/statuses", Code, MasterData, false;
    WorkOrders => "work-orders", "api/workorders", ByCode, MasterData, false;

    SiteTransfers => "site-transfers", "api/stock/site-transfers", Code, Stock, true;
    WarehouseTransfers => "warehouse-transfers", "api/stock/warehouse-transfers", Code, Stock, true;
    StockAdjustments => "stock-adjustments", "api/stock/adjustments", Code, Stock, true;
    BinTransferRequests => "bin-transfer-requests", "api/StockBinTransferRequest", Code, Stock, false;
    BinTransfers => "bin-transfers", "api/stock/bin-transfers", Code, Stock, true;
    IssueRequests => "issue-requests", "api/stock/issue-requests", Code, Stock, true;
    StockIssues => "stock-issues", "api/stock/issues", Code, Stock, true;
    StockMovements => "stock-movements", "api/stock/movements", Code, Stock, false;
    PutAways => "put-aways", "api/stock/put-aways", Code, Stock, true;
    Quarantines => "quarantines", "api/stock/quarantines", Code, Stock, true;
    Reservations => "reservations", "api/stock/reservations", Code, Stock, true;
    StockTakes => "stock-takes", "api/stock/takes", Code, Stock, true;

    PurchaseDeliveryNotes => "purchase-delivery-notes", "api/purchasing/delivery-notes", Code, Purchasing, false;
    PurchaseOrders => "purchase-orders", "api/purchasing/purchase-orders", Code, Purchasing, true;
    PurchaseReturns => "purchase-returns", "api/purchasing/returns", Code, Purchasing, true;
    ShippingNotes => "shipping-notes", "api/purchasing/shipping-notes", Code, Purchasing, true;

    SalesDeliveryNotes => "sales-delivery-notes", "api/sales/delivery-notes", Code, Sales, true;
    SalesOrders => "sales-orders", "api/sales/orders", Code, Sales, true;
    PackingNotes => "packing-notes", "api/sales/packing-notes", Code, Sales, true;
    PickingNotes => "picking-notes", "api/sales/picking-notes", Code, Sales, true;
    SalesReturns => "sales-returns", "api/sales/returns", Code, Sales, true;
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown entity name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntity(pub String);

impl fmt::Display for UnknownEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity '{}' (see `mes-seed entities`)", self.0)
    }
}

impl std::error::Error for UnknownEntity {}

impl FromStr for Entity {
    type Err = UnknownEntity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|entity| entity.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| UnknownEntity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_and_paths_are_unique() {
        let names: HashSet<_> = Entity::ALL.iter().map(|e| e.name()).collect();
        let paths: HashSet<_> = Entity::ALL.iter().map(|e| e.base_path()).collect();

        assert_eq!(names.len(), Entity::ALL.len());
        assert_eq!(paths.len(), Entity::ALL.len());
    }

    #[test]
    fn test_parse_round_trip() {
        for entity in Entity::ALL {
            assert_eq!(entity.to_string().parse::<Entity>().unwrap(), *entity);
        }
        assert_eq!("Purchase_Orders".parse::<Entity>().unwrap(), Entity::PurchaseOrders);
        assert!("widgets".parse::<Entity>().is_err());
    }

    #[test]
    fn test_code_segments() {
        assert_eq!(Entity::Warehouses.code_segment(), CodeSegment::ByCode);
        assert_eq!(Entity::Sites.code_segment(), CodeSegment::Code);
        assert_eq!(CodeSegment::ByCode.as_str(), "by-code");
    }

    #[test]
    fn test_workflow_entities_are_transactions() {
        assert!(Entity::ALL
            .iter()
            .filter(|e| e.has_workflow())
            .all(|e| e.group() != EntityGroup::MasterData));
        assert!(Entity::SalesOrders.has_workflow());
        assert!(!Entity::StockMovements.has_workflow());
    }
}
