//! Built-in Tera filters available to every template

use chrono::{DateTime, NaiveDate};
use std::collections::HashMap;
use std::fmt::Write;
use tera::Tera;

/// Register all built-in filters
pub fn register(tera: &mut Tera) {
    tera.register_filter("strip_html", strip_html_filter);
    tera.register_filter("truncate_chars", truncate_chars_filter);
    tera.register_filter("date_format", date_format_filter);
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => " .....".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Tera filter: reformat a `YYYY-MM-DD` or RFC 3339 date with a strftime pattern
///
/// Values that don't parse as a date are returned unchanged.
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%Y-%m-%d".to_string(),
    };

    let mut out = String::new();
    let written = if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        write!(out, "{}", date.format(&format))
    } else if let Ok(date) = DateTime::parse_from_rfc3339(&s) {
        write!(out, "{}", date.format(&format))
    } else {
        return Ok(tera::Value::String(s));
    };
    written.map_err(|_| tera::Error::msg(format!("date_format: invalid format '{}'", format)))?;
    Ok(tera::Value::String(out))
}

fn strip_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}
