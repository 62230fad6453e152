use serde_json::Value;
use std::io;

use super::{result_of, SCHEDULE_COLUMNS};

/// Write the amortisation table as CSV, or field/value pairs when the
/// result carries no schedule.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Err(e) = write_csv(&mut wtr, result_of(value)) {
        eprintln!("CSV output error: {}", e);
    }
    let _ = wtr.flush();
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Value) -> csv::Result<()> {
    match result {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("schedule") {
                wtr.write_record(SCHEDULE_COLUMNS)?;
                for row in rows.iter().filter_map(Value::as_object) {
                    wtr.write_record(
                        SCHEDULE_COLUMNS
                            .iter()
                            .map(|c| row.get(*c).map(format_csv_value).unwrap_or_default()),
                    )?;
                }
            } else {
                wtr.write_record(["field", "value"])?;
                for (key, val) in map {
                    wtr.write_record([key.as_str(), &format_csv_value(val)])?;
                }
            }
        }
        _ => wtr.write_record([format_csv_value(result)])?,
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
