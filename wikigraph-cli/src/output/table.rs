//! Table output formatting using the `tabled` crate

use tabled::{
    builder::Builder,
    settings::{object::Columns, style::Style, Alignment, Modify},
};

/// Table output formatter
pub struct TableOutput;

impl TableOutput {
    /// Format a simple key-value table
    pub fn format_key_value(pairs: &[(&str, String)]) -> String {
        let mut builder = Builder::default();

        for (key, value) in pairs {
            builder.push_record([*key, value.as_str()]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Columns::first()).with(Alignment::right()));

        table.to_string()
    }

    /// Create a simple table from rows of strings
    pub fn from_rows(headers: &[&str], rows: &[Vec<String>]) -> String {
        if rows.is_empty() {
            return "(no results)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(headers.iter().copied());

        for row in rows {
            builder.push_record(row.iter().map(|s| s.as_str()));
        }

        let mut table = builder.build();
        table.with(Style::rounded());

        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_table() {
        let pairs = vec![("Pages", "12".to_string()), ("Links", "30".to_string())];
        let output = TableOutput::format_key_value(&pairs);

        assert!(output.contains("Pages"));
        assert!(output.contains("30"));
    }

    #[test]
    fn test_from_rows() {
        let rows = vec![
            vec!["FAQ.md".to_string(), "FAQ".to_string()],
            vec!["../Home.md".to_string(), "Home".to_string()],
        ];
        let output = TableOutput::from_rows(&["Destination", "Title"], &rows);

        assert!(output.contains("Destination"));
        assert!(output.contains("../Home.md"));
    }

    #[test]
    fn test_empty_rows() {
        assert_eq!(TableOutput::from_rows(&["A"], &[]), "(no results)");
    }
}
