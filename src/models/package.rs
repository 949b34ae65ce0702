use serde::{Deserialize, Serialize};

/// A manufactured package as supplied by the catalog. Read-only to this
/// crate; `size > 0` is assumed for valid records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package-level product code (NDC).
    pub code: String,
    /// Quantity of the unit contained in one package.
    pub size: f64,
    pub unit: String,
    pub product_name: String,
    pub manufacturer: String,
    /// Inactive records (discontinued, recalled) are never dispensed.
    pub active: bool,
}

/// One scored dispense option: a package repeated `package_count` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSelection {
    pub code: String,
    pub size: f64,
    pub unit: String,
    /// `size × package_count` — always covers the needed total.
    pub quantity_to_dispense: f64,
    pub package_count: u32,
    /// Percentage dispensed beyond the needed total (0 when the need is 0).
    pub overfill_percent: f64,
    pub product_name: String,
    pub manufacturer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_record_deserializes_from_catalog_shape() {
        let json = r#"{
            "code": "00071015523",
            "size": 30.0,
            "unit": "tablet",
            "product_name": "Lipitor 10mg",
            "manufacturer": "Pfizer",
            "active": true
        }"#;
        let record: PackageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.code, "00071015523");
        assert!(record.active);
        assert!((record.size - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn selection_serializes() {
        let selection = PackageSelection {
            code: "00071015523".into(),
            size: 30.0,
            unit: "tablet".into(),
            quantity_to_dispense: 30.0,
            package_count: 1,
            overfill_percent: 0.0,
            product_name: "Lipitor 10mg".into(),
            manufacturer: "Pfizer".into(),
        };
        let json = serde_json::to_string(&selection).unwrap();
        assert!(json.contains("\"package_count\":1"));
        assert!(json.contains("\"overfill_percent\":0.0"));
    }
}
