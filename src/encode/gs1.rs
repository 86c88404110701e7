//! GS1-128 element strings.
//!
//! Packs three application identifiers into a fixed layout:
//!
//! ```text
//! 01 <GTIN, 14 digits> 17 <expiry YYMMDD> 10 <lot, up to 20 chars>
//! ```
//!
//! The lot is the only variable-length field and comes last, so no FNC1
//! separator is needed. The result feeds the barcode or QR encoder; it is
//! never printed as plain text.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use labelprint::encode::Gs1CodeBuilder;
//!
//! let expiry = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
//! let code = Gs1CodeBuilder::new().build("7612345000011", "L5 2024 ", expiry);
//! assert_eq!(code, "01076123450000111725030110L52024");
//! ```

use chrono::NaiveDate;
use rand::Rng;

pub const GTIN_LEN: usize = 14;
pub const MAX_LOT_LEN: usize = 20;
pub const DEFAULT_LOT: &str = "000";

/// Builds GS1-128 element strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gs1CodeBuilder;

impl Gs1CodeBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Digits of `product_code`, first 14 kept, zero-padded on the left.
    /// `None` when the code has no digits at all.
    pub fn normalize_gtin(product_code: &str) -> Option<String> {
        let digits: String = product_code
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(GTIN_LEN)
            .collect();
        if digits.is_empty() {
            return None;
        }
        Some(format!("{:0>width$}", digits, width = GTIN_LEN))
    }

    /// Lot with all whitespace removed, at most 20 characters.
    pub fn normalize_lot(lot: &str) -> String {
        let lot: String = lot
            .chars()
            .filter(|c| !c.is_whitespace())
            .take(MAX_LOT_LEN)
            .collect();
        if lot.is_empty() {
            DEFAULT_LOT.to_string()
        } else {
            lot
        }
    }

    /// A pseudo-random 14-digit GTIN for products without a usable code.
    pub fn fallback_gtin<R: Rng + ?Sized>(rng: &mut R) -> String {
        (0..GTIN_LEN)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }

    /// Build the element string, using the thread RNG for a missing GTIN.
    pub fn build(&self, product_code: &str, lot: &str, expiry: NaiveDate) -> String {
        self.build_with_rng(product_code, lot, expiry, &mut rand::rng())
    }

    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        product_code: &str,
        lot: &str,
        expiry: NaiveDate,
        rng: &mut R,
    ) -> String {
        let gtin = Self::normalize_gtin(product_code).unwrap_or_else(|| {
            let gtin = Self::fallback_gtin(rng);
            tracing::debug!(%gtin, "product code has no digits, using generated GTIN");
            gtin
        });
        format!(
            "01{}17{}10{}",
            gtin,
            expiry.format("%y%m%d"),
            Self::normalize_lot(lot)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_scenario_digits_only_gtin_and_stripped_lot() {
        let code = Gs1CodeBuilder::new().build("7612345000011", "L5 2024 ", date(2025, 3, 1));
        assert_eq!(code, "01076123450000111725030110L52024");
    }

    #[test]
    fn test_deterministic() {
        let b = Gs1CodeBuilder::new();
        let a1 = b.build("ABC-123/45", "lot 9", date(2030, 12, 31));
        let a2 = b.build("ABC-123/45", "lot 9", date(2030, 12, 31));
        assert_eq!(a1, a2);
        assert_eq!(a1, format!("01{}17{}10{}", "00000000012345", "301231", "lot9"));
    }

    #[test]
    fn test_long_product_code_truncates() {
        let gtin = Gs1CodeBuilder::normalize_gtin("1234567890123456789").unwrap();
        assert_eq!(gtin, "12345678901234");
    }

    #[test]
    fn test_lot_rules() {
        assert_eq!(Gs1CodeBuilder::normalize_lot(""), "000");
        assert_eq!(Gs1CodeBuilder::normalize_lot(" \t\n"), "000");
        assert_eq!(Gs1CodeBuilder::normalize_lot("A B\tC\nD"), "ABCD");
        let long = Gs1CodeBuilder::normalize_lot(&"X ".repeat(40));
        assert_eq!(long.len(), MAX_LOT_LEN);
        assert!(!long.contains(char::is_whitespace));
    }

    #[test]
    fn test_fallback_gtin_when_no_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = Gs1CodeBuilder::new().build_with_rng("no digits", "", date(2026, 1, 2), &mut rng);
        assert!(code.starts_with("01"));
        let gtin = &code[2..16];
        assert_eq!(gtin.len(), GTIN_LEN);
        assert!(gtin.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(&code[16..24], "17260102");
        assert_eq!(&code[24..], "10000");
    }

    #[test]
    fn test_fallback_is_seed_deterministic() {
        let a = Gs1CodeBuilder::fallback_gtin(&mut StdRng::seed_from_u64(42));
        let b = Gs1CodeBuilder::fallback_gtin(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_gtin_segment_always_fourteen_digits() {
        let b = Gs1CodeBuilder::new();
        for product in ["", "1", "12345678901234", "99999999999999999", "x1y2z3"] {
            let code = b.build(product, "lot", date(2025, 6, 30));
            let gtin = &code[2..16];
            assert_eq!(gtin.len(), 14, "{}", product);
            assert!(gtin.chars().all(|c| c.is_ascii_digit()), "{}", product);
            assert_eq!(&code[16..18], "17");
        }
    }
}
