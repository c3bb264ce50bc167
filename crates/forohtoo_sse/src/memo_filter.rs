//! A tiny embedded query language over a transaction's memo, decoded as
//! JSON, for use as an Await predicate (spec.md §4.7/§9). Treated as
//! untrusted input: no side effects, bounded recursion, and any evaluation
//! failure (bad JSON, missing field, depth exceeded) is a non-match rather
//! than an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_DEPTH: u32 = 16;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum MemoFilterExpr {
    /// `field` is a dot-separated path into the memo's JSON object.
    Eq { field: String, value: Value },
    Contains { field: String, value: String },
    And(Vec<MemoFilterExpr>),
    Or(Vec<MemoFilterExpr>),
    Not(Box<MemoFilterExpr>),
}

impl MemoFilterExpr {
    /// `memo` is the raw memo string; `None`/unparseable JSON is treated as
    /// "matches nothing" rather than an error.
    pub fn matches(&self, memo: Option<&str>) -> bool {
        let Some(memo) = memo else { return false };
        let Ok(value) = serde_json::from_str::<Value>(memo) else { return false };
        self.eval(&value, 0)
    }

    fn eval(&self, root: &Value, depth: u32) -> bool {
        if depth > MAX_DEPTH {
            return false;
        }
        match self {
            MemoFilterExpr::Eq { field, value } => field_at(root, field) == Some(value),
            MemoFilterExpr::Contains { field, value } => match field_at(root, field) {
                Some(Value::String(s)) => s.contains(value.as_str()),
                _ => false,
            },
            MemoFilterExpr::And(exprs) => exprs.iter().all(|e| e.eval(root, depth + 1)),
            MemoFilterExpr::Or(exprs) => exprs.iter().any(|e| e.eval(root, depth + 1)),
            MemoFilterExpr::Not(expr) => !expr.eval(root, depth + 1),
        }
    }
}

fn field_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |acc, segment| acc.get(segment))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn matches_a_simple_equality() {
        let expr = MemoFilterExpr::Eq { field: "kind".into(), value: json!("registration") };
        assert!(expr.matches(Some(r#"{"kind":"registration"}"#)));
        assert!(!expr.matches(Some(r#"{"kind":"refund"}"#)));
    }

    #[test]
    fn matches_a_nested_path() {
        let expr = MemoFilterExpr::Eq { field: "order.id".into(), value: json!(42) };
        assert!(expr.matches(Some(r#"{"order":{"id":42}}"#)));
    }

    #[test]
    fn and_or_not_compose() {
        let expr = MemoFilterExpr::And(vec![
            MemoFilterExpr::Eq { field: "kind".into(), value: json!("registration") },
            MemoFilterExpr::Not(Box::new(MemoFilterExpr::Eq { field: "void".into(), value: json!(true) })),
        ]);
        assert!(expr.matches(Some(r#"{"kind":"registration"}"#)));
        assert!(!expr.matches(Some(r#"{"kind":"registration","void":true}"#)));
    }

    #[test]
    fn malformed_memo_is_a_non_match_not_an_error() {
        let expr = MemoFilterExpr::Eq { field: "kind".into(), value: json!("registration") };
        assert!(!expr.matches(Some("not json")));
        assert!(!expr.matches(None));
    }
}
