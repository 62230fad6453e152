use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{result_of, SCHEDULE_COLUMNS};

const SUMMARY_SECTIONS: [(&str, &str); 3] = [
    ("baseline_summary", "Baseline"),
    ("summary", "Summary"),
    ("savings", "Savings"),
];

const EVENT_COLUMNS: [&str; 8] = [
    "status", "year", "month", "gross", "fee", "net", "penalty", "reason",
];

/// Amortisation table, summaries and prepayment events as text tables.
pub fn print_table(value: &Value) {
    let result = result_of(value);
    let Value::Object(res_map) = result else {
        println!("{}", value);
        return;
    };

    if let Some(Value::Array(rows)) = res_map.get("schedule") {
        print_schedule(rows);
    }

    let scalars: Vec<(&String, &Value)> = res_map
        .iter()
        .filter(|(_, v)| !v.is_object() && !v.is_array())
        .collect();
    if !scalars.is_empty() {
        println!();
        print_fields(scalars);
    }

    for (key, title) in SUMMARY_SECTIONS {
        if let Some(Value::Object(section)) = res_map.get(key) {
            println!("\n{}:", title);
            print_fields(section.iter().collect());
        }
    }

    if let Some(Value::Array(events)) = res_map.get("events") {
        if !events.is_empty() {
            println!("\nPrepayments:");
            print_events(events);
        }
    }

    if let Value::Object(envelope) = value {
        print_notes(envelope);
    }
}

fn print_schedule(rows: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(SCHEDULE_COLUMNS);
    for row in rows.iter().filter_map(Value::as_object) {
        builder.push_record(
            SCHEDULE_COLUMNS
                .iter()
                .map(|c| row.get(*c).map(|v| format_value(c, v)).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn print_fields(fields: Vec<(&String, &Value)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.clone(), format_value(key, val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_events(events: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(EVENT_COLUMNS);
    for event in events.iter().filter_map(Value::as_object) {
        builder.push_record(
            EVENT_COLUMNS
                .iter()
                .map(|c| event.get(*c).map(|v| format_value(c, v)).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Money rounds to cents; rates keep enough places to be readable.
fn format_value(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) => match s.parse::<Decimal>() {
            Ok(d) if key.contains("rate") => d.round_dp(8).normalize().to_string(),
            Ok(d) => d.round_dp(2).to_string(),
            Err(_) => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
