//!
//! # Unit Conversions
//!
//! Database distances are integers in dbu; parasitics are in SI units.
//!

use crate::design::Int;

/// Convert `dist` in dbu to meters
pub fn dbu_to_meters(dist: Int, dbu_per_micron: u32) -> f64 {
    dist as f64 / (f64::from(dbu_per_micron) * 1e6)
}
/// Convert `dist` in meters to the nearest dbu
pub fn meters_to_dbu(dist: f64, dbu_per_micron: u32) -> Int {
    (dist * f64::from(dbu_per_micron) * 1e6).round() as Int
}
/// Convert `dist` in dbu to microns
pub fn dbu_to_microns(dist: Int, dbu_per_micron: u32) -> f64 {
    dist as f64 / f64::from(dbu_per_micron)
}
/// Convert `dist` in microns to the nearest dbu
pub fn microns_to_dbu(dist: f64, dbu_per_micron: u32) -> Int {
    (dist * f64::from(dbu_per_micron)).round() as Int
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for dbu in [1000, 2000] {
            for x in [0, 1, 137, 1000, 123_456_789] {
                let m = dbu_to_meters(x, dbu);
                assert_eq!(meters_to_dbu(m, dbu), x);
                let um = dbu_to_microns(x, dbu);
                assert_eq!(microns_to_dbu(um, dbu), x);
                assert!((m - um * 1e-6).abs() <= 1e-12 * m.abs());
            }
        }
        assert_eq!(dbu_to_meters(1000, 1000), 1e-6);
        assert_eq!(dbu_to_meters(2000, 2000), 1e-6);
    }
}
