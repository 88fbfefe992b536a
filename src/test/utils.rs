#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::app::{
        SymbolNormalizer,
        utils::{format_money, parse_decimal},
    };

    #[test]
    fn normalize_trims_upper_cases_and_appends_suffix() {
        let normalizer = SymbolNormalizer::default();
        assert_eq!(normalizer.normalize(" acme "), "ACME.NS");
        assert_eq!(normalizer.normalize("reliance.ns"), "RELIANCE.NS");
        assert_eq!(normalizer.normalize("BAJAJ-AUTO"), "BAJAJ-AUTO.NS");
    }

    #[test]
    fn normalize_encodes_ampersand() {
        let normalizer = SymbolNormalizer::default();
        assert_eq!(normalizer.normalize("M&M"), "M%26M.NS");
    }

    #[test]
    fn normalize_with_custom_or_no_suffix() {
        let bse = SymbolNormalizer::new(Some(".bo".to_string()));
        assert_eq!(bse.market_suffix(), Some(".BO"));
        assert_eq!(bse.normalize("tcs"), "TCS.BO");

        let none = SymbolNormalizer::new(Some("  ".to_string()));
        assert_eq!(none.market_suffix(), None);
        assert_eq!(none.normalize(" aapl"), "AAPL");
        assert_eq!(none, SymbolNormalizer::new(None));
    }

    #[test]
    fn parse_decimal_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_decimal(&json!(10)), Some(dec!(10)));
        assert_eq!(parse_decimal(&json!(2.5)), Some(dec!(2.5)));
        assert_eq!(parse_decimal(&json!(" 1520.75 ")), Some(dec!(1520.75)));
        assert_eq!(parse_decimal(&json!("1e2")), Some(dec!(100)));
    }

    #[test]
    fn parse_decimal_rejects_everything_else() {
        assert_eq!(parse_decimal(&json!("abc")), None);
        assert_eq!(parse_decimal(&json!("")), None);
        assert_eq!(parse_decimal(&json!(null)), None);
        assert_eq!(parse_decimal(&json!(true)), None);
        assert_eq!(parse_decimal(&json!(-3)), None);
    }

    #[test]
    fn format_money_groups_thousands() {
        assert_eq!(format_money(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_money(dec!(-1234.5)), "-1,234.50");
        assert_eq!(format_money(dec!(999)), "999.00");
        assert_eq!(format_money(dec!(0)), "0.00");
    }
}
