use serde_json::{Number, Value};

/// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form used when a value is written into markup.
pub fn display(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => display_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn display_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Numeric coercion. `None` stands for NaN.
pub fn to_number(v: &Value) -> Option<f64> {
    match v {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() { Some(0.0) } else { t.parse::<f64>().ok() }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Build a JSON number, keeping integral values as integers.
/// Returns `None` for NaN and infinities, which JSON cannot hold.
pub fn number(f: f64) -> Option<Value> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(-1.5)));
    }

    #[test]
    fn display_forms() {
        assert_eq!(display(&json!(3.0)), "3");
        assert_eq!(display(&json!(2.5)), "2.5");
        assert_eq!(display(&json!(null)), "");
        assert_eq!(display(&json!([1, "a", true])), "1,a,true");
        assert_eq!(display(&json!({"a": 1})), "[object Object]");
    }

    #[test]
    fn numbers_stay_integral() {
        assert_eq!(number(4.0), Some(json!(4)));
        assert_eq!(number(0.5), Some(json!(0.5)));
        assert_eq!(number(f64::INFINITY), None);
        assert_eq!(to_number(&json!(" 12 ")), Some(12.0));
        assert_eq!(to_number(&json!("abc")), None);
    }
}
