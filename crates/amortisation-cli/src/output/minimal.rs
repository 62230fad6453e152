use serde_json::Value;

use super::result_of;

/// Paths to the headline figure of each command, in order of priority.
const PRIORITY_PATHS: [&[&str]; 4] = [
    &["savings", "interest_saved"],
    &["penalty"],
    &["summary", "final_installment"],
    &["monthly_rate"],
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);
    match headline(result) {
        Some(val) => println!("{}", format_minimal(val)),
        None => println!("{}", format_minimal(result)),
    }
}

fn headline(result: &Value) -> Option<&Value> {
    PRIORITY_PATHS.iter().find_map(|path| {
        path.iter()
            .try_fold(result, |node, key| node.get(*key))
            .filter(|v| !v.is_null())
    })
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
