//! Column-to-unit lookup for rendered numbers.
//!
//! Lookup order is exact normalized name, then substring, then suffix
//! heuristics. Columns with no sensible unit return an empty string and
//! render bare.

use crate::query::column_resolver::normalize;
use crate::query::intent::CalcKind;

const EXACT_UNITS: &[(&str, &str)] = &[
    ("total_transportation_cost", "Rs"),
    ("total_consignment_mrp_value", "Rs"),
    ("consignment_mrp_value", "Rs"),
    ("mrp", "Rs"),
    ("total_weight", "kg"),
    ("sku_weight", "kg"),
    ("total_volume", "m³"),
    ("total_no_of_cases", ""),
    ("no_of_cases", ""),
    ("weight_fill", "%"),
    ("volume_fill", "%"),
    ("utilization", "%"),
];

/// Unit suffix for a column, or "" when none applies.
pub fn unit_for(column: &str) -> &'static str {
    let norm = normalize(column);
    if let Some((_, unit)) = EXACT_UNITS.iter().find(|(name, _)| *name == norm) {
        return unit;
    }
    if norm.contains("fill") || norm.contains("utilization") || norm.contains('%') {
        return "%";
    }
    if norm.contains("cost") || norm.contains("mrp") || norm.contains("value") || norm.contains("price")
    {
        return "Rs";
    }
    if norm.contains("weight") {
        return "kg";
    }
    if norm.contains("volume") {
        return "m³";
    }
    if norm.contains("cases") {
        return "";
    }
    ""
}

/// Compound unit for a ratio, derived from the calculation kind first
/// and the operand units otherwise.
pub fn calc_unit(calc: CalcKind, numerator: &str, denominator: &str) -> String {
    let num_unit = unit_for(numerator);
    match calc {
        CalcKind::PerCase => compound(num_unit, "case"),
        CalcKind::PerKg => compound(num_unit, "kg"),
        CalcKind::WeightPerCase => "kg/case".to_string(),
        CalcKind::Ratio | CalcKind::General => {
            let den_unit = unit_for(denominator);
            if num_unit.is_empty() || den_unit.is_empty() {
                String::new()
            } else {
                format!("{num_unit}/{den_unit}")
            }
        }
    }
}

fn compound(num_unit: &str, per: &str) -> String {
    if num_unit.is_empty() {
        format!("per {per}")
    } else {
        format!("{num_unit}/{per}")
    }
}

/// Append a unit suffix when one applies.
pub fn with_unit(rendered: &str, unit: &str) -> String {
    if unit.is_empty() {
        rendered.to_string()
    } else if unit == "%" {
        format!("{rendered}%")
    } else {
        format!("{rendered} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_beats_heuristics() {
        assert_eq!(unit_for("Total Transportation Cost"), "Rs");
        assert_eq!(unit_for("Total No Of Cases"), "");
    }

    #[test]
    fn suffix_heuristics_apply() {
        assert_eq!(unit_for("Unit Weight"), "kg");
        assert_eq!(unit_for("Truck Volume"), "m³");
        assert_eq!(unit_for("Weight Fill"), "%");
        assert_eq!(unit_for("Source Name"), "");
    }

    #[test]
    fn compound_units() {
        assert_eq!(
            calc_unit(CalcKind::PerCase, "Total Transportation Cost", "Total No Of Cases"),
            "Rs/case"
        );
        assert_eq!(
            calc_unit(CalcKind::PerKg, "Total Transportation Cost", "Total Weight"),
            "Rs/kg"
        );
        assert_eq!(
            calc_unit(CalcKind::WeightPerCase, "Total Weight", "Total No Of Cases"),
            "kg/case"
        );
    }

    #[test]
    fn unit_rendering() {
        assert_eq!(with_unit("42", "kg"), "42 kg");
        assert_eq!(with_unit("42", "%"), "42%");
        assert_eq!(with_unit("42", ""), "42");
    }
}
