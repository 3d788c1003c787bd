//! Lenient field decoders for schedule rows.
//!
//! The schedule endpoint returns rows straight out of a dataframe: missing cells come
//! back as `""`, numeric columns may arrive as strings, and phone numbers may arrive as
//! numbers. These helpers are used with `#[serde(deserialize_with = ...)]` on [`Task`].
//!
//! [`Task`]: crate::task::Task

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::status::TaskStatus;

/// Resolve a raw status cell to the enum. Unknown values fall back to `Planned`
/// so every task lands in exactly one bucket.
pub fn status_from_value(value: Option<&Value>) -> TaskStatus {
    match value {
        None | Some(Value::Null) => TaskStatus::Planned,
        Some(Value::String(s)) => s.parse().unwrap_or_else(|err| {
            warn!(%err, "treating unrecognized status as Planned");
            TaskStatus::Planned
        }),
        Some(other) => {
            warn!(value = %other, "non-string status; treating as Planned");
            TaskStatus::Planned
        }
    }
}

fn text_from_value(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn number_from_value(value: Option<Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub fn status<'de, D>(de: D) -> Result<TaskStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(status_from_value(v.as_ref()))
}

pub fn text<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_from_value(Option::<Value>::deserialize(de)?))
}

/// Like [`text`], but blank cells become `None`.
pub fn opt_text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = text_from_value(Option::<Value>::deserialize(de)?);
    Ok(if s.trim().is_empty() { None } else { Some(s) })
}

pub fn number<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from_value(Option::<Value>::deserialize(de)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_cells() {
        assert_eq!(status_from_value(None), TaskStatus::Planned);
        assert_eq!(status_from_value(Some(&Value::Null)), TaskStatus::Planned);
        assert_eq!(status_from_value(Some(&json!("Completed"))), TaskStatus::Done);
        assert_eq!(status_from_value(Some(&json!("Cancelled"))), TaskStatus::Cancelled);
        assert_eq!(status_from_value(Some(&json!("Rescheduled"))), TaskStatus::Planned);
        assert_eq!(status_from_value(Some(&json!(3))), TaskStatus::Planned);
    }

    #[test]
    fn numeric_cells() {
        assert_eq!(number_from_value(Some(json!(23.02))), Some(23.02));
        assert_eq!(number_from_value(Some(json!(" 72.57 "))), Some(72.57));
        assert_eq!(number_from_value(Some(json!(""))), None);
        assert_eq!(number_from_value(Some(json!("n/a"))), None);
        assert_eq!(number_from_value(Some(json!("NaN"))), None);
        assert_eq!(number_from_value(None), None);
    }

    #[test]
    fn text_cells() {
        assert_eq!(text_from_value(Some(json!(9876543210u64))), "9876543210");
        assert_eq!(text_from_value(Some(Value::Null)), "");
    }
}
