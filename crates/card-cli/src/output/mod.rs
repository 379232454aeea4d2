use card_core::report::{MissingFieldReport, section_display_name};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;

pub mod table;

use table::{TableOptions, render_table};

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_value_table(&serde_json::to_value(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// Warnings view: one titled table per section, in report order.
#[must_use]
pub fn render_missing(report: &MissingFieldReport) -> String {
    if report.is_empty() {
        return String::from("All required fields are filled.");
    }
    let options = TableOptions::from_env();
    report
        .grouped()
        .into_iter()
        .map(|(title, items)| {
            let rows: Vec<Vec<String>> = items
                .iter()
                .map(|item| vec![item.label.clone()])
                .collect();
            format!("{title}\n{}", render_table(&["missing field"], &rows, options))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Display name for a section key, falling back to the key.
#[must_use]
pub fn section_title(section: &str) -> &str {
    section_display_name(section).unwrap_or(section)
}

fn render_value_table(value: &Value) -> anyhow::Result<String> {
    let options = TableOptions::from_env();
    match value {
        Value::Array(items) => Ok(render_array_table(items, options)),
        Value::Object(map) => {
            let rows: Vec<Vec<String>> = map
                .iter()
                .map(|(key, value)| vec![key.clone(), value_to_cell(value)])
                .collect();
            Ok(render_table(&["key", "value"], &rows, options))
        }
        scalar => Ok(render_table(&["value"], &[vec![value_to_cell(scalar)]], options)),
    }
}

fn render_array_table(items: &[Value], options: TableOptions) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }

    if !items.iter().all(Value::is_object) {
        let rows: Vec<Vec<String>> = items.iter().map(|item| vec![value_to_cell(item)]).collect();
        return render_table(&["value"], &rows, options);
    }

    let mut headers = Vec::<String>::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let rows: Vec<Vec<String>> = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(header).map_or_else(|| String::from("-"), value_to_cell))
                .collect()
        })
        .collect();
    render_table(&header_refs, &rows, options)
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}

#[cfg(test)]
mod tests {
    use card_core::report::MissingFieldReport;
    use serde::Serialize;

    use super::{render, render_missing};
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Example {
        section: &'static str,
        count: u32,
    }

    #[test]
    fn json_render_is_valid_json() {
        let value = Example { section: "card_metadata", count: 2 };
        let out = render(&value, OutputFormat::Json).expect("json render should work");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["section"], "card_metadata");
        assert_eq!(parsed["count"], 2);
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let value = Example { section: "card_metadata", count: 2 };
        let out = render(&value, OutputFormat::Raw).expect("raw render should work");
        assert!(!out.contains('\n'));
    }

    #[test]
    fn table_render_keeps_key_order() {
        let value = Example { section: "card_metadata", count: 2 };
        let out = render(&value, OutputFormat::Table).expect("table render should work");
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("key"));
        assert!(lines[2].starts_with("section"));
        assert!(lines[3].starts_with("count"));
    }

    #[test]
    fn missing_fields_are_grouped_under_display_names() {
        let mut report = MissingFieldReport::new();
        report.push("card_metadata", "Creation Date");
        report.push("learning_architecture", "Loss function (Learning Architecture 1)");
        report.push("card_metadata", "Version Number");
        let out = render_missing(&report);
        let card = out.find("Card Metadata").unwrap();
        let technical = out.find("Technical Specifications").unwrap();
        assert!(card < technical);
        assert!(out[card..technical].contains("Version Number"));
    }
}
