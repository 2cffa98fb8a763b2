//! Property tests for the fetch-and-align pipeline.
//!
//! 1. Routing: product-table codes go to the primary vendor, all else to the secondary
//! 2. Column priority: the first candidate in priority order wins, whatever the table order
//! 3. Derived length: a one-step transform of n points has n - 1 points
//! 4. Date alignment: aligned rows pair values observed on the same date

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tserie_core::data::{
    align, select_price_column, AlignPolicy, ProductTable, Resolver, DEFAULT_PRICE_COLUMNS,
};
use tserie_core::domain::{Series, TableView, Transform, Vendor};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_code() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,5}"
}

/// Strictly increasing day offsets from a fixed origin, with values.
fn arb_series(code: &'static str) -> impl Strategy<Value = Series> {
    prop::collection::btree_map(0u32..200, 1.0..500.0_f64, 1..60).prop_map(move |obs| {
        let origin = NaiveDate::from_ymd_opt(2012, 1, 2).unwrap();
        let (dates, values): (Vec<_>, Vec<_>) = obs
            .into_iter()
            .map(|(offset, v)| (origin + chrono::Duration::days(offset as i64), v))
            .unzip();
        Series::new(code, "Settle", dates, values).unwrap()
    })
}

fn arb_transform() -> impl Strategy<Value = Transform> {
    prop_oneof![
        Just(Transform::PctChange),
        Just(Transform::LogDiff),
        Just(Transform::Diff),
    ]
}

// ── 1. Routing ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn routing_follows_product_table(code in arb_code(), listed in any::<bool>()) {
        let mut products = ProductTable::empty();
        if listed {
            products.insert(code.clone(), format!("CHRIS/CME_{code}1"));
        }
        let instrument = Resolver::new(products).resolve(&code);
        let expected = if listed { Vendor::Quandl } else { Vendor::Yahoo };
        prop_assert_eq!(instrument.vendor, expected);
        prop_assert_eq!(instrument.dataset.is_some(), listed);
    }
}

// ── 2. Column priority ───────────────────────────────────────────────

proptest! {
    #[test]
    fn column_choice_ignores_table_order(
        present in prop::collection::vec(any::<bool>(), 4),
        extra in prop::collection::vec("[a-z]{3,8}", 0..4),
        shuffle_seed in any::<u64>(),
    ) {
        let mut columns: Vec<String> = DEFAULT_PRICE_COLUMNS
            .iter()
            .zip(&present)
            .filter(|(_, keep)| **keep)
            .map(|(c, _)| c.to_string())
            .chain(extra)
            .collect();
        // Deterministic rotation stands in for a shuffle.
        if !columns.is_empty() {
            let k = (shuffle_seed % columns.len() as u64) as usize;
            columns.rotate_left(k);
        }
        let refs: Vec<&str> = columns.iter().map(String::as_str).collect();

        let expected = DEFAULT_PRICE_COLUMNS
            .iter()
            .zip(&present)
            .find(|(_, keep)| **keep)
            .map(|(c, _)| *c);
        let chosen = select_price_column(&refs, &DEFAULT_PRICE_COLUMNS).ok();
        prop_assert_eq!(chosen, expected);
    }
}

// ── 3. Derived length ────────────────────────────────────────────────

proptest! {
    #[test]
    fn derived_series_is_one_shorter(series in arb_series("GC"), t in arb_transform()) {
        let derived = series.derive(t);
        prop_assert_eq!(derived.len(), series.len() - 1);
        prop_assert_eq!(&derived.dates[..], &series.dates()[1..]);
    }
}

// ── 4. Alignment by date ─────────────────────────────────────────────

proptest! {
    #[test]
    fn inner_alignment_pairs_same_date(a in arb_series("GC"), b in arb_series("SI")) {
        let lookup_a: BTreeMap<_, _> = a.iter().collect();
        let lookup_b: BTreeMap<_, _> = b.iter().collect();
        let shared: BTreeSet<_> = lookup_a.keys().filter(|d| lookup_b.contains_key(d)).collect();

        match align(&[a.clone(), b.clone()], AlignPolicy::Inner) {
            Ok(table) => {
                prop_assert_eq!(table.len(), shared.len());
                for (i, date) in table.dates().iter().enumerate() {
                    prop_assert_eq!(table.column("GC").unwrap()[i], lookup_a[date]);
                    prop_assert_eq!(table.column("SI").unwrap()[i], lookup_b[date]);
                }
            }
            Err(_) => prop_assert!(shared.is_empty()),
        }
    }

    #[test]
    fn strict_alignment_fails_iff_dates_differ(a in arb_series("GC"), b in arb_series("SI")) {
        let same = a.dates() == b.dates();
        let result = align(&[a, b], AlignPolicy::Strict);
        prop_assert_eq!(result.is_ok(), same);
    }
}
