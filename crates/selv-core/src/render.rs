//! Human-readable rendering of snapshots, change lines and histories.
//!
//! Change lines have two fixed shapes:
//!
//! ```text
//! [TypeName] field = value (initialized)
//! [TypeName] field: old -> new
//! ```

use std::fmt;

use selv_core_types::sensitive::REDACTED;

use crate::history::{ChangeRecord, History};
use crate::snapshot::Value;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&float_repr(*x)),
            Value::Str(s) => write!(f, "'{s}'"),
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                f.write_str(")")
            }
            Value::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Value::Set(items) => {
                f.write_str("{")?;
                write_items(f, items)?;
                f.write_str("}")
            }
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Opaque(type_name) => write!(f, "{type_name} instance"),
            Value::Redacted => f.write_str(REDACTED),
        }
    }
}

/// Shortest round-trip digits, positional for exponents in `-4..16` and
/// `1e+20` / `1e-05` style outside that range
fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{x:e}");
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return scientific;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };

    if !(-4..16).contains(&exp) {
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exp_sign}{:02}", exp.abs());
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let point = exp + 1;
    let body = if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point as usize >= digits.len() {
        format!("{digits}{}.0", "0".repeat(point as usize - digits.len()))
    } else {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    };
    format!("{sign}{body}")
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Line for a field's first recorded write
pub fn initialized_line(type_name: &str, field: &str, value: &Value) -> String {
    format!("[{type_name}] {field} = {value} (initialized)")
}

/// Line for every later write to a field
pub fn changed_line(type_name: &str, field: &str, from: &Value, to: &Value) -> String {
    format!("[{type_name}] {field}: {from} -> {to}")
}

/// Render the change line for a record
pub fn change_line(type_name: &str, record: &ChangeRecord) -> String {
    match &record.from {
        None => initialized_line(type_name, &record.field, &record.to),
        Some(from) => changed_line(type_name, &record.field, from, &record.to),
    }
}

/// Render a text summary of a history query result.
///
/// Flat histories list one change per line; grouped histories list each
/// field with its change count followed by its changes.
pub fn render_history(history: &History) -> String {
    let mut out = String::new();

    match history {
        History::Flat(records) => {
            if records.is_empty() {
                out.push_str("(no changes)\n");
            }
            for record in records {
                out.push_str(&format!(
                    "  #{} {} {}: {} -> {}\n",
                    record.seq,
                    record.timestamp.format("%H:%M:%S%.6f"),
                    record.field,
                    render_from(&record.from),
                    record.to
                ));
            }
        }
        History::Grouped(groups) => {
            if groups.is_empty() {
                out.push_str("(no changes)\n");
            }
            for (field, changes) in groups {
                let noun = if changes.len() == 1 { "change" } else { "changes" };
                out.push_str(&format!("  {field}: {} {noun}\n", changes.len()));
                for change in changes {
                    out.push_str(&format!(
                        "    #{} {} -> {}\n",
                        change.seq,
                        render_from(&change.from),
                        change.to
                    ));
                }
            }
        }
    }

    out
}

fn render_from(from: &Option<Value>) -> String {
    match from {
        Some(value) => value.to_string(),
        None => "(absent)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ChangeHistory;
    use crate::history::{HistoryFormat, HistoryQuery};

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::from("x").to_string(), "'x'");
    }

    #[test]
    fn test_float_rendering_switches_to_exponent_form() {
        assert_eq!(Value::Float(1e20).to_string(), "1e+20");
        assert_eq!(Value::Float(1.5e16).to_string(), "1.5e+16");
        assert_eq!(Value::Float(1e-5).to_string(), "1e-05");
        assert_eq!(Value::Float(-2.5e-7).to_string(), "-2.5e-07");
        assert_eq!(Value::Float(0.0001).to_string(), "0.0001");
        assert_eq!(Value::Float(1e15).to_string(), "1000000000000000.0");
        assert_eq!(Value::Float(123.5).to_string(), "123.5");
        assert_eq!(Value::Float(-0.0).to_string(), "-0.0");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(Value::Float(f64::NAN).to_string(), "nan");
    }

    #[test]
    fn test_container_rendering() {
        assert_eq!(Value::map([("a", 10), ("b", 5)]).to_string(), "{'a': 10, 'b': 5}");
        assert_eq!(Value::list([1, 2, 3]).to_string(), "[1, 2, 3]");
        assert_eq!(Value::tuple([1, 2]).to_string(), "(1, 2)");
        assert_eq!(Value::set([3, 1, 2]).to_string(), "{1, 2, 3}");
        assert_eq!(Value::set(Vec::<i32>::new()).to_string(), "{}");
        assert_eq!(Value::opaque("Child").to_string(), "Child instance");
        assert_eq!(Value::Redacted.to_string(), REDACTED);
    }

    #[test]
    fn test_initialized_line_shape() {
        assert_eq!(
            initialized_line("Counter", "value", &Value::Int(0)),
            "[Counter] value = 0 (initialized)"
        );
    }

    #[test]
    fn test_changed_line_shape() {
        assert_eq!(
            changed_line("Counter", "value", &Value::Int(0), &Value::Int(1)),
            "[Counter] value: 0 -> 1"
        );
    }

    #[test]
    fn test_change_line_picks_shape_from_record() {
        let mut history = ChangeHistory::new();
        history.record("name", None, Value::from("a"));
        history.record("name", Some(Value::from("a")), Value::from("b"));

        let lines: Vec<_> = history
            .records()
            .iter()
            .map(|r| change_line("Doc", r))
            .collect();
        assert_eq!(lines, vec!["[Doc] name = 'a' (initialized)", "[Doc] name: 'a' -> 'b'"]);
    }

    #[test]
    fn test_render_grouped_history_counts() {
        let mut history = ChangeHistory::new();
        history.record("title", None, Value::from("Untitled"));
        history.record("version", None, Value::Int(1));
        history.record("version", Some(Value::Int(1)), Value::Int(2));

        let grouped = history
            .query(&HistoryQuery::new().format(HistoryFormat::Grouped))
            .unwrap();
        let text = render_history(&grouped);
        assert!(text.contains("title: 1 change\n"));
        assert!(text.contains("version: 2 changes\n"));
        assert!(text.contains("(absent) -> 1"));
    }

    #[test]
    fn test_render_empty_history() {
        assert_eq!(render_history(&History::Flat(Vec::new())), "(no changes)\n");
    }
}
