//! Response formatting: templates and unit lookup.

pub mod formatter;
pub mod units;

pub use formatter::{fmt_number, ResponseFormatter};
pub use units::{calc_unit, unit_for, with_unit};
