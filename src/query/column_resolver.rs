//! Fuzzy mapping from question phrases to real dataset columns.
//!
//! Resolution is a strict precedence ladder: an exact case-insensitive
//! match always wins, then substring containment in either direction,
//! then the domain alias table. Names are compared in a normalized form
//! where runs of spaces, hyphens and underscores collapse to a single
//! underscore, so "Total Weight", "total-weight" and "total_weight" are
//! the same name.

use std::collections::HashMap;

use crate::error::{QaError, QaResult};
use crate::storage::Table;

/// Alias table: canonical normalized column name to the phrases people
/// actually use for it.
const ALIASES: &[(&str, &[&str])] = &[
    ("total_transportation_cost", &["cost", "transportation cost", "total cost", "freight cost", "shipping cost"]),
    ("total_weight", &["weight", "total weight"]),
    ("sku_weight", &["sku weight", "unit weight"]),
    ("total_volume", &["volume", "total volume"]),
    ("source_name", &["source", "source location", "origin", "source name"]),
    ("source_type", &["source type"]),
    ("source_code", &["source code"]),
    ("destination_name", &["destination", "destination location", "destination name"]),
    ("destination_type", &["destination type"]),
    ("destination_code", &["destination code"]),
    ("product_name", &["product", "product name", "item", "sku"]),
    ("product_code", &["product code", "item code"]),
    ("mode", &["transportation mode", "transport mode", "mode of transport", "mode"]),
    ("customer_name", &["customer", "customer name", "client"]),
    ("consignment_no", &["consignment", "consignment number", "consignment no"]),
    ("order", &["order", "order number", "order no"]),
    ("no_of_cases", &["cases per order", "number of cases"]),
    ("total_no_of_cases", &["cases", "total cases", "no of cases"]),
    ("total_consignment_mrp_value", &["mrp", "mrp value", "total mrp", "consignment value", "value"]),
    ("consignment_mrp_value", &["consignment mrp"]),
    ("load_type", &["load type"]),
    ("plan_name", &["plan name", "plan"]),
    ("date_of_dispatch", &["dispatch date", "date of dispatch"]),
    ("expected_date_of_arrival", &["arrival date", "expected date of arrival", "expected arrival"]),
    ("consignment_date", &["consignment date"]),
];

/// Collapse separators so spelling variants compare equal.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if ch == ' ' || ch == '-' || ch == '_' {
            pending_sep = !out.is_empty();
        } else {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.extend(ch.to_lowercase());
        }
    }
    out
}

pub struct ColumnResolver {
    // phrase (normalized) -> canonical column name (normalized)
    aliases: HashMap<String, String>,
}

impl Default for ColumnResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnResolver {
    pub fn new() -> Self {
        let mut aliases = HashMap::new();
        for (canonical, variants) in ALIASES {
            aliases.insert(canonical.to_string(), canonical.to_string());
            for variant in *variants {
                aliases
                    .entry(normalize(variant))
                    .or_insert_with(|| canonical.to_string());
            }
        }
        Self { aliases }
    }

    /// Map a phrase to an actual column name from `columns`, or None.
    pub fn resolve_among(&self, phrase: &str, columns: &[String]) -> Option<String> {
        let wanted = normalize(phrase);
        if wanted.is_empty() {
            return None;
        }

        // exact
        if let Some(col) = columns.iter().find(|c| normalize(c) == wanted) {
            return Some(col.clone());
        }

        // substring, either direction
        if let Some(col) = columns.iter().find(|c| {
            let norm = normalize(c);
            norm.contains(&wanted) || wanted.contains(&norm)
        }) {
            return Some(col.clone());
        }

        // alias table, then the canonical name goes back through the
        // exact and substring tiers
        if let Some(canonical) = self.aliases.get(&wanted) {
            if let Some(col) = columns.iter().find(|c| normalize(c) == *canonical) {
                return Some(col.clone());
            }
            if let Some(col) = columns.iter().find(|c| {
                let norm = normalize(c);
                norm.contains(canonical.as_str()) || canonical.contains(&norm)
            }) {
                return Some(col.clone());
            }
        }

        None
    }

    /// Resolve against a table, producing the not-found error with a
    /// sample of real columns when the phrase matches nothing.
    pub fn resolve(&self, phrase: &str, table: &Table) -> QaResult<String> {
        let columns = table.column_names();
        self.resolve_among(phrase, &columns)
            .ok_or_else(|| QaError::column_not_found(phrase, columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        [
            "Consignment No",
            "Source Name",
            "Destination Name",
            "Mode",
            "Total Weight",
            "Total Transportation Cost",
            "Total No Of Cases",
            "Date of Dispatch",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn normalization_collapses_separators() {
        assert_eq!(normalize("Total  Weight"), "total_weight");
        assert_eq!(normalize("total-weight"), "total_weight");
        assert_eq!(normalize("  Total_Weight  "), "total_weight");
    }

    #[test]
    fn exact_match_beats_substring() {
        let resolver = ColumnResolver::new();
        let cols = vec!["Mode".to_string(), "Mode Detail".to_string()];
        assert_eq!(resolver.resolve_among("mode", &cols).as_deref(), Some("Mode"));
    }

    #[test]
    fn substring_matches_both_directions() {
        let resolver = ColumnResolver::new();
        let cols = columns();
        assert_eq!(
            resolver.resolve_among("transportation cost", &cols).as_deref(),
            Some("Total Transportation Cost")
        );
        // phrase containing the full column name also resolves
        assert_eq!(
            resolver
                .resolve_among("total transportation cost column", &cols)
                .as_deref(),
            Some("Total Transportation Cost")
        );
        assert_eq!(
            resolver.resolve_among("weight", &cols).as_deref(),
            Some("Total Weight")
        );
    }

    #[test]
    fn alias_table_resolves_domain_phrases() {
        let resolver = ColumnResolver::new();
        let cols = columns();
        assert_eq!(
            resolver.resolve_among("dispatch date", &cols).as_deref(),
            Some("Date of Dispatch")
        );
        assert_eq!(
            resolver.resolve_among("source location", &cols).as_deref(),
            Some("Source Name")
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let resolver = ColumnResolver::new();
        let cols = columns();
        for phrase in ["cost", "weight", "mode", "source location", "cases"] {
            let first = resolver.resolve_among(phrase, &cols).unwrap();
            let again = resolver.resolve_among(&first, &cols).unwrap();
            assert_eq!(first, again, "resolving {phrase:?} twice diverged");
        }
    }

    #[test]
    fn miss_returns_none() {
        let resolver = ColumnResolver::new();
        assert!(resolver.resolve_among("warp drive", &columns()).is_none());
    }
}
