use std::{collections::HashMap, path::Path};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{error::Error, table::SheetLayout};

/// A retailer enrolled in the program, keyed by the name its transactions
/// appear under in the summary sheets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PartnerConfig {
    pub appears_as: String,
    pub retailer_name: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    /// Fraction of customer spend returned as discount.
    pub customer_discount: Decimal,
    /// Fraction of spend charged as the ARG fee.
    pub arg_fee: Decimal,
}

/// Read-only lookup of partners by their exact display name.
/// Iteration follows the order partners were configured in.
#[derive(Debug, Default, Clone)]
pub struct PartnerRegistry {
    partners: Vec<PartnerConfig>,
    index: HashMap<String, usize>,
}

impl PartnerRegistry {
    /// When two entries share a display name the first one is kept.
    pub fn new(partners: impl IntoIterator<Item = PartnerConfig>) -> Self {
        let mut registry = Self::default();
        for partner in partners {
            if registry.index.contains_key(&partner.appears_as) {
                continue;
            }
            registry
                .index
                .insert(partner.appears_as.clone(), registry.partners.len());
            registry.partners.push(partner);
        }
        registry
    }

    /// Exact, case-sensitive match. No trimming or normalization.
    pub fn contains(&self, appears_as: &str) -> bool {
        self.index.contains_key(appears_as)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartnerConfig> {
        self.partners.iter()
    }

    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }
}

#[derive(Deserialize)]
struct SettingsFile {
    #[serde(default, rename = "partner")]
    partners: Vec<PartnerConfig>,
    #[serde(default)]
    layout: SheetLayout,
}

/// Everything loaded once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub registry: PartnerRegistry,
    pub layout: SheetLayout,
}

impl Settings {
    pub fn from_toml(input: &str) -> Result<Self, Error> {
        let file: SettingsFile = toml::from_str(input).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            registry: PartnerRegistry::new(file.partners),
            layout: file.layout,
        })
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&input)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const SETTINGS: &str = r#"
        [[partner]]
        appears_as = "MR PICKLES - 132"
        retailer_name = "Mr Pickles Sandwich Shop"
        contact_name = "Pat Pickle"
        contact_phone = "555-0100"
        contact_email = "pat@example.com"
        customer_discount = 0.05
        arg_fee = 0.02

        [[partner]]
        appears_as = "ACME"
        retailer_name = "Acme Corp"
        contact_name = "Wile E."
        contact_phone = "555-0199"
        contact_email = "wile@example.com"
        customer_discount = "0.10"
        arg_fee = "0.025"

        [[partner]]
        appears_as = "ACME"
        retailer_name = "Duplicate"
        contact_name = ""
        contact_phone = ""
        contact_email = ""
        customer_discount = 0
        arg_fee = 0
    "#;

    #[test]
    fn loads_partners_in_order() {
        let settings = Settings::from_toml(SETTINGS).unwrap();
        let names: Vec<&str> = settings
            .registry
            .iter()
            .map(|p| p.appears_as.as_str())
            .collect();
        assert_eq!(names, vec!["MR PICKLES - 132", "ACME"]);
        assert_eq!(settings.layout, SheetLayout::default());
    }

    #[test]
    fn first_duplicate_wins() {
        let settings = Settings::from_toml(SETTINGS).unwrap();
        let acme = settings.registry.iter().nth(1).unwrap();
        assert_eq!(acme.appears_as, "ACME");
        assert_eq!(acme.retailer_name, "Acme Corp");
        assert_eq!(acme.customer_discount, dec!(0.10));
        assert_eq!(acme.arg_fee, dec!(0.025));
    }

    #[test]
    fn lookup_is_exact() {
        let settings = Settings::from_toml(SETTINGS).unwrap();
        assert!(settings.registry.contains("ACME"));
        assert!(!settings.registry.contains("acme"));
        assert!(!settings.registry.contains("ACME "));
    }

    #[test]
    fn layout_override() {
        let settings = Settings::from_toml(
            r#"
            [layout]
            first_data_row = 5
            [layout.columns]
            amount = 9
            "#,
        )
        .unwrap();
        assert!(settings.registry.is_empty());
        assert_eq!(settings.layout.first_data_row, 5);
        assert_eq!(settings.layout.columns.amount, 9);
        assert_eq!(settings.layout.columns.merchant, 7);
        assert_eq!(settings.layout.data_sheet, 1);
    }

    #[test]
    fn malformed_settings() {
        assert!(matches!(
            Settings::from_toml("[[partner]]\nappears_as = 1"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partners.toml");
        std::fs::write(&path, SETTINGS).unwrap();
        assert_eq!(Settings::load(&path).unwrap().registry.len(), 2);
        assert!(matches!(
            Settings::load(&dir.path().join("missing.toml")),
            Err(Error::Config(_))
        ));
    }
}
