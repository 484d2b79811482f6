// Field resolver - Tolerant lookup over backend records with unstable key names
use serde_json::{Map, Value};

pub type RawRecord = Map<String, Value>;

/// Find the first non-null value among `candidates`.
///
/// Each candidate is tried as an exact key first, then case-insensitively
/// (Unicode lowercase, so `ALMACÉN` matches `almacén`), before moving on to
/// the next candidate.
pub fn resolve<'a>(record: &'a RawRecord, candidates: &[&str]) -> Option<&'a Value> {
    for candidate in candidates {
        if let Some(value) = record.get(*candidate) {
            if !value.is_null() {
                return Some(value);
            }
        }

        let wanted = candidate.to_lowercase();
        let folded = record
            .iter()
            .find(|(key, value)| !value.is_null() && key.to_lowercase() == wanted);
        if let Some((_, value)) = folded {
            return Some(value);
        }
    }
    None
}

/// Text form of a resolved value. Empty strings are kept, since key
/// derivation treats them as a (poor) identity component.
pub fn resolve_text(record: &RawRecord, candidates: &[&str]) -> Option<String> {
    resolve(record, candidates).and_then(value_as_text)
}

/// Like `resolve_text`, but blank strings count as absent and the default is
/// used instead. Meant for labels shown to the user.
pub fn resolve_display(record: &RawRecord, candidates: &[&str], default: &str) -> String {
    for candidate in candidates {
        if let Some(text) = resolve_text(record, &[*candidate]) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    default.to_string()
}

pub fn resolve_optional_number(record: &RawRecord, candidates: &[&str]) -> Option<f64> {
    for candidate in candidates {
        if let Some(number) = resolve(record, &[*candidate]).and_then(value_as_number) {
            return Some(number);
        }
    }
    None
}

pub fn resolve_number(record: &RawRecord, candidates: &[&str], default: f64) -> f64 {
    resolve_optional_number(record, candidates).unwrap_or(default)
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers, or numeric strings using either `.` or `,` as decimal separator.
pub fn value_as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_case_insensitive_match() {
        let r = record(json!({"almacen": "A1"}));
        assert_eq!(resolve_text(&r, &["CODIGO", "ALMACEN"]).as_deref(), Some("A1"));
    }

    #[test]
    fn test_candidate_order_wins() {
        let r = record(json!({"COD_ALM": "late", "almacen_id": "early"}));
        assert_eq!(resolve_text(&r, &["almacen_id", "COD_ALM"]).as_deref(), Some("early"));
    }

    #[test]
    fn test_exact_match_beats_folded_for_same_candidate() {
        let r = record(json!({"CODIGO": "upper", "codigo": "lower"}));
        assert_eq!(resolve_text(&r, &["codigo"]).as_deref(), Some("lower"));
        assert_eq!(resolve_text(&r, &["CODIGO"]).as_deref(), Some("upper"));
    }

    #[test]
    fn test_case_folding_covers_accented_keys() {
        let r = record(json!({"ALMACÉN": "ALM1", "Población": "Huelva"}));
        assert_eq!(resolve_text(&r, &["almacén"]).as_deref(), Some("ALM1"));
        assert_eq!(resolve_text(&r, &["POBLACIÓN"]).as_deref(), Some("Huelva"));
    }

    #[test]
    fn test_null_moves_to_next_candidate() {
        let r = record(json!({"almacen_id": null, "CODIGO": 7}));
        assert_eq!(resolve_text(&r, &["almacen_id", "CODIGO"]).as_deref(), Some("7"));
        assert!(resolve(&r, &["almacen_id"]).is_none());
    }

    #[test]
    fn test_empty_string_display_vs_text() {
        let r = record(json!({"nombre": "", "DESCRI": "Tank one"}));
        assert_eq!(resolve_text(&r, &["nombre", "DESCRI"]).as_deref(), Some(""));
        assert_eq!(resolve_display(&r, &["nombre", "DESCRI"], "-"), "Tank one");
        assert_eq!(resolve_display(&r, &["nombre"], "-"), "-");
    }

    #[test]
    fn test_numbers_with_comma_decimals() {
        let r = record(json!({"litros": "1234,5", "capacidad": 5000, "temp": "n/a"}));
        assert_eq!(resolve_number(&r, &["litros"], 0.0), 1234.5);
        assert_eq!(resolve_number(&r, &["capacidad"], 0.0), 5000.0);
        assert_eq!(resolve_number(&r, &["temp"], 0.0), 0.0);
        assert_eq!(resolve_optional_number(&r, &["temp", "capacidad"]), Some(5000.0));
    }
}
