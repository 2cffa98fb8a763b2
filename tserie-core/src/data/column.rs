//! Price-column selection.
//!
//! Vendors label the "price" differently: Yahoo tables carry `Adj Close`,
//! futures datasets `Settle` or `Last`, index datasets `Value`.

use crate::config::ConfigError;

/// Candidate price columns, highest priority first.
pub const DEFAULT_PRICE_COLUMNS: [&str; 4] = ["Adj Close", "Settle", "Value", "Last"];

/// The first name in `priority` that `columns` contains.
///
/// The scan follows `priority` order, not the table's column order.
pub fn select_price_column<'a, S: AsRef<str>>(
    columns: &[&str],
    priority: &'a [S],
) -> Result<&'a str, ConfigError> {
    priority
        .iter()
        .map(AsRef::as_ref)
        .find(|candidate| columns.contains(candidate))
        .ok_or_else(|| ConfigError::NoPriceColumn {
            available: columns.iter().map(|c| c.to_string()).collect(),
            priority: priority.iter().map(|p| p.as_ref().to_string()).collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_beats_table_order() {
        let cols = ["Open", "Settle", "Adj Close"];
        assert_eq!(
            select_price_column(&cols, &DEFAULT_PRICE_COLUMNS).unwrap(),
            "Adj Close"
        );
    }

    #[test]
    fn futures_table_uses_settle() {
        let cols = ["Open", "High", "Low", "Last", "Settle", "Volume"];
        assert_eq!(
            select_price_column(&cols, &DEFAULT_PRICE_COLUMNS).unwrap(),
            "Settle"
        );
    }

    #[test]
    fn custom_priority_is_honoured() {
        let cols = ["Last", "Settle"];
        let priority = vec!["Last".to_string()];
        assert_eq!(select_price_column(&cols, &priority).unwrap(), "Last");
    }

    #[test]
    fn no_match_is_a_configuration_error() {
        let err = select_price_column(&["Open", "Close"], &DEFAULT_PRICE_COLUMNS).unwrap_err();
        match err {
            ConfigError::NoPriceColumn {
                available,
                priority,
            } => {
                assert_eq!(available, vec!["Open", "Close"]);
                assert_eq!(priority.len(), 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
