//! Static schema registry for the master shipment dataset
//!
//! One source of truth for column types (driving cell coercion) and
//! human-readable descriptions (driving the code-generation prompt).
//! Columns listed in [`INTERNAL_COLUMNS`] exist in the snapshot but are
//! never described to the model.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Value class of a dataset column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Free-form text
    Text,
    /// Parsed as a number; unparsable values become null
    Numeric,
    /// Parsed as a UTC timestamp; unparsable values become null
    Datetime,
    /// Small closed vocabulary (statuses, ports)
    Categorical,
    /// Boolean flag
    Flag,
    /// List of strings
    List,
}

/// Registry entry for one column
#[derive(Debug, Clone, Copy)]
pub struct ColumnMeta {
    /// Human-readable description, shown to the model
    pub description: &'static str,
    /// Value class
    pub column_type: ColumnType,
}

const fn meta(description: &'static str, column_type: ColumnType) -> ColumnMeta {
    ColumnMeta {
        description,
        column_type,
    }
}

/// Column name -> metadata for every analytics-visible column.
pub static SCHEMA_REGISTRY: Lazy<BTreeMap<&'static str, ColumnMeta>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "container_number",
            meta("The unique 11-character container identifier.", ColumnType::Text),
        ),
        (
            "hot_container_flag",
            meta("Flag indicating if the container is hot.", ColumnType::Flag),
        ),
        (
            "shipment_status",
            meta(
                "Current phase of the shipment (e.g., DELIVERED, IN_OCEAN, READY_FOR_PICKUP).",
                ColumnType::Categorical,
            ),
        ),
        (
            "cargo_weight_kg",
            meta("Total weight of the cargo in kilograms.", ColumnType::Numeric),
        ),
        (
            "cargo_measure_cubic_meter",
            meta("Total volume of the cargo in cubic meters (CBM).", ColumnType::Numeric),
        ),
        (
            "cargo_count",
            meta("Total number of packages or units.", ColumnType::Numeric),
        ),
        (
            "true_carrier_scac_name",
            meta("The primary carrier shipping line name.", ColumnType::Text),
        ),
        (
            "final_carrier_name",
            meta("The name of the carrier handling the final leg.", ColumnType::Text),
        ),
        (
            "first_vessel_name",
            meta("The vessel for the first leg of ocean transport.", ColumnType::Text),
        ),
        (
            "final_vessel_name",
            meta("The vessel for the final ocean leg.", ColumnType::Text),
        ),
        (
            "supplier_vendor_name",
            meta("The shipper or supplier of the goods.", ColumnType::Text),
        ),
        (
            "load_port",
            meta("The port where the cargo was initially loaded.", ColumnType::Categorical),
        ),
        (
            "discharge_port",
            meta("The port where the cargo leaves the final vessel.", ColumnType::Categorical),
        ),
        (
            "final_destination",
            meta("The final point of delivery.", ColumnType::Text),
        ),
        (
            "dp_delayed_dur",
            meta("Days the shipment is delayed at the discharge port.", ColumnType::Numeric),
        ),
        (
            "fd_delayed_dur",
            meta("Days the shipment is delayed at the final destination.", ColumnType::Numeric),
        ),
        (
            "eta_dp_date",
            meta("Estimated arrival at the discharge port.", ColumnType::Datetime),
        ),
        (
            "ata_dp_date",
            meta("Actual arrival at the discharge port.", ColumnType::Datetime),
        ),
        (
            "eta_fd_date",
            meta("Estimated arrival at the final destination.", ColumnType::Datetime),
        ),
        (
            "etd_lp_date",
            meta("Estimated departure from the load port.", ColumnType::Datetime),
        ),
        (
            "atd_lp_date",
            meta("Actual departure from the load port.", ColumnType::Datetime),
        ),
        (
            "po_numbers",
            meta("Customer purchase order numbers.", ColumnType::List),
        ),
        (
            "obl_number",
            meta("Original bill of lading number.", ColumnType::Text),
        ),
    ])
});

/// Columns present in the snapshot that must never be described to the
/// model or surfaced in reports. The scoping column is first among them.
pub const INTERNAL_COLUMNS: &[&str] = &["consignee_codes", "job_no", "carr_eqp_uid", "document_id"];

/// Informal words mapped to canonical columns, used to hint the model.
pub static COLUMN_SYNONYMS: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("weight", "cargo_weight_kg"),
        ("volume", "cargo_measure_cubic_meter"),
        ("count", "cargo_count"),
        ("carrier", "final_carrier_name"),
        ("vessel", "final_vessel_name"),
        ("status", "shipment_status"),
        ("shipper", "supplier_vendor_name"),
        ("arrival", "ata_dp_date"),
        ("delay", "dp_delayed_dur"),
        ("delivery_delay", "fd_delayed_dur"),
        ("departure", "etd_lp_date"),
        ("etd", "etd_lp_date"),
        ("atd", "atd_lp_date"),
    ])
});

/// Look up a column's registered type
#[inline]
#[must_use]
pub fn column_type(name: &str) -> Option<ColumnType> {
    SCHEMA_REGISTRY.get(name).map(|m| m.column_type)
}

/// True when a column must be hidden from the model
#[inline]
#[must_use]
pub fn is_internal(name: &str) -> bool {
    INTERNAL_COLUMNS.contains(&name)
}
