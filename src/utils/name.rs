use chrono::{Datelike, NaiveDate};

/// Strip everything the backend would not accept in a file name.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ',' | '-'))
        .collect()
}

pub fn default_selection_name(date: NaiveDate) -> String {
    format!("selection-{}-{}-{}", date.year(), date.month(), date.day())
}
