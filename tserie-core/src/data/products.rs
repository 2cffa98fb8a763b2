//! Exchange product codes served by the primary vendor.
//!
//! Each code maps to the vendor's continuous front-month dataset. Anything not
//! listed here is treated as an equity/index ticker for the secondary vendor.

use std::collections::BTreeMap;

/// Built-in `code → DATABASE/DATASET` pairs.
const BUILTIN: &[(&str, &str)] = &[
    // Metals
    ("GC", "CHRIS/CME_GC1"),
    ("SI", "CHRIS/CME_SI1"),
    ("HG", "CHRIS/CME_HG1"),
    ("PL", "CHRIS/CME_PL1"),
    ("PA", "CHRIS/CME_PA1"),
    // Energy
    ("CL", "CHRIS/CME_CL1"),
    ("NG", "CHRIS/CME_NG1"),
    ("HO", "CHRIS/CME_HO1"),
    ("RB", "CHRIS/CME_RB1"),
    ("BZ", "CHRIS/CME_BZ1"),
    // Grains and softs
    ("ZC", "CHRIS/CME_C1"),
    ("ZW", "CHRIS/CME_W1"),
    ("ZS", "CHRIS/CME_S1"),
    ("ZM", "CHRIS/CME_SM1"),
    ("ZL", "CHRIS/CME_BO1"),
    ("KC", "CHRIS/ICE_KC1"),
    ("SB", "CHRIS/ICE_SB1"),
    ("CC", "CHRIS/ICE_CC1"),
    ("CT", "CHRIS/ICE_CT1"),
    // Livestock
    ("LE", "CHRIS/CME_LC1"),
    ("HE", "CHRIS/CME_LN1"),
    // Currencies
    ("6E", "CHRIS/CME_EC1"),
    ("6J", "CHRIS/CME_JY1"),
    ("6B", "CHRIS/CME_BP1"),
    ("6A", "CHRIS/CME_AD1"),
    ("6C", "CHRIS/CME_CD1"),
    ("6S", "CHRIS/CME_SF1"),
    // Rates
    ("ZB", "CHRIS/CME_US1"),
    ("ZN", "CHRIS/CME_TY1"),
    ("ZF", "CHRIS/CME_FV1"),
    ("ZT", "CHRIS/CME_TU1"),
    ("GE", "CHRIS/CME_ED1"),
    // Equity index
    ("ES", "CHRIS/CME_SP1"),
    ("NQ", "CHRIS/CME_NQ1"),
    ("YM", "CHRIS/CME_YM1"),
    ("VX", "CHRIS/CBOE_VX1"),
];

/// Product table: built-in entries plus configured overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTable {
    entries: BTreeMap<String, String>,
}

impl Default for ProductTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProductTable {
    pub fn builtin() -> Self {
        Self {
            entries: BTreeMap::from_iter(
                BUILTIN
                    .iter()
                    .map(|(code, dataset)| (code.to_string(), dataset.to_string())),
            ),
        }
    }

    /// An empty table: every code routes to the secondary vendor.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Built-ins with `overrides` merged on top (overrides win).
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut table = Self::builtin();
        for (code, dataset) in overrides {
            table.insert(code.clone(), dataset.clone());
        }
        table
    }

    pub fn insert(&mut self, code: impl Into<String>, dataset: impl Into<String>) {
        self.entries.insert(code.into(), dataset.into());
    }

    /// Dataset code for `code`, if it is a primary-vendor product.
    pub fn dataset(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_metals() {
        let table = ProductTable::builtin();
        assert_eq!(table.dataset("GC"), Some("CHRIS/CME_GC1"));
        assert_eq!(table.dataset("SI"), Some("CHRIS/CME_SI1"));
        assert!(!table.contains("SPY"));
    }

    #[test]
    fn builtin_codes_are_unique() {
        assert_eq!(ProductTable::builtin().len(), BUILTIN.len());
    }

    #[test]
    fn overrides_replace_and_extend() {
        let overrides = BTreeMap::from([
            ("GC".to_string(), "CHRIS/CME_GC2".to_string()),
            ("LBS".to_string(), "CHRIS/CME_LB1".to_string()),
        ]);
        let table = ProductTable::with_overrides(&overrides);
        assert_eq!(table.dataset("GC"), Some("CHRIS/CME_GC2"));
        assert_eq!(table.dataset("LBS"), Some("CHRIS/CME_LB1"));
        assert_eq!(table.len(), BUILTIN.len() + 1);
    }
}
