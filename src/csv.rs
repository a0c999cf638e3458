//! CSV module.
//! Single-pass line splitter for the site's data files plus the writer used
//! when the benefits library is pushed back to GitHub.
//!
//! Quote handling is a plain toggle: `""` is NOT an escape, every `"` flips the
//! in-quotes flag. The writer does not escape either, so a value containing a
//! `"` will not survive a write/parse cycle.

use std::collections::HashMap;
use std::mem::take;

use crate::benefits::BenefitRow;

/// One parsed data line, keyed by normalized header.
pub type Record = HashMap<String, String>;

pub const BENEFITS_HEADER: [&str; 7] = [
    "Country",
    "Product",
    "Type",
    "Features",
    "Free Plan",
    "Tabby+ (AED 49/month)",
    "Description",
];

/// Lower-case, drop all whitespace, drop parentheses.
/// `Tabby+ (AED 49/month)` → `tabby+aed49/month`.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Splits one line into trimmed fields.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(take(&mut field).trim().to_string()),
            _ => field.push(ch),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Parses CSV text into records. The first line is the header; data lines with
/// fewer fields than the header are dropped.
pub fn parse_records(text: &str) -> Vec<Record> {
    let mut lines = text.trim().split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = parse_line(header_line)
        .iter()
        .map(|h| normalize_header(h))
        .collect();

    lines
        .filter_map(|line| {
            let values = parse_line(line);
            if values.len() < headers.len() {
                return None;
            }
            Some(headers.iter().cloned().zip(values).collect())
        })
        .collect()
}

/// Writes the benefits library: fixed header, every value quoted, one line per
/// row, each line terminated by `\n`.
pub fn serialize_benefits(rows: &[BenefitRow]) -> String {
    let mut out = BENEFITS_HEADER.join(",");
    out.push('\n');

    for row in rows {
        let line = row
            .fields()
            .iter()
            .map(|v| format!("\"{}\"", v))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(features: &str, description: &str) -> BenefitRow {
        BenefitRow {
            country: "UAE, KSA".to_string(),
            product: "Tabby Card".to_string(),
            kind: "Rewards, Cashback".to_string(),
            features: features.to_string(),
            free_plan: "Basic".to_string(),
            tabby_plan: "Free".to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Tabby+ (AED 49/month)"), "tabby+aed49/month");
        assert_eq!(normalize_header("Tabby+(AED49/month)"), "tabby+aed49/month");
        assert_eq!(normalize_header(" Free Plan "), "freeplan");
        assert_eq!(normalize_header("ModalContent"), "modalcontent");
    }

    #[test]
    fn test_parse_line_respects_quotes() {
        assert_eq!(
            parse_line(r#""UAE, KSA",BNPL, plain "#),
            vec!["UAE, KSA", "BNPL", "plain"]
        );
    }

    #[test]
    fn test_doubled_quote_is_not_an_escape() {
        assert_eq!(parse_line(r#""a""b",c"#), vec!["ab", "c"]);
    }

    #[test]
    fn test_parse_consistent_rows() {
        let text = "A,B,C\n1,2,3\n4,5,6\n7,8,9\n";
        let records = parse_records(text);
        assert_eq!(records.len(), 3);
        for r in &records {
            for key in ["a", "b", "c"] {
                assert!(r.contains_key(key));
            }
        }
        assert_eq!(records[1]["b"], "5");
    }

    #[test]
    fn test_short_row_is_dropped() {
        let text = "A,B,C\n1,2,3\na,b\n4,5,6";
        let records = parse_records(text);
        // three data lines, one short
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["a"], "4");
    }

    #[test]
    fn test_blank_line_is_dropped() {
        let records = parse_records("A,B\n1,2\n\n3,4");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let records = parse_records("A,B\n1,2,3");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn test_crlf_input() {
        let records = parse_records("A,B\r\n1,2\r\n3,4\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["b"], "4");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_records("").is_empty());
        assert!(parse_records("A,B").is_empty());
    }

    #[test]
    fn test_serialize_layout() {
        let csv = serialize_benefits(&[row("Cashback", "Up to 5%")]);
        assert_eq!(
            csv,
            "Country,Product,Type,Features,Free Plan,Tabby+ (AED 49/month),Description\n\
             \"UAE, KSA\",\"Tabby Card\",\"Rewards, Cashback\",\"Cashback\",\"Basic\",\"Free\",\"Up to 5%\"\n"
        );
    }

    #[test]
    fn test_round_trip_plain_values() {
        let rows = vec![row("Cashback", "Up to 5%, monthly"), row("Lounge", "")];
        let parsed: Vec<BenefitRow> = parse_records(&serialize_benefits(&rows))
            .iter()
            .map(BenefitRow::from_record)
            .collect();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn test_round_trip_breaks_on_embedded_quote() {
        let rows = vec![row("Cashback", r#"The "best" deal"#)];
        let parsed: Vec<BenefitRow> = parse_records(&serialize_benefits(&rows))
            .iter()
            .map(BenefitRow::from_record)
            .collect();
        assert_eq!(parsed.len(), 1);
        assert_ne!(parsed[0].description, rows[0].description);
    }
}
