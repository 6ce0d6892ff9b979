//! Custom-function call bodies.

use serde::{Deserialize, Serialize};

use crate::Value;

/// Body sent for one custom-function invocation, over REST or the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub func_name: String,
    /// Arguments as passed by the host; ranges arrive as nested arrays
    pub args: Vec<serde_json::Value>,
    /// `<client>[<book>]<address>` of the calling cell
    pub caller_address: String,
    pub content_language: String,
    pub version: String,
    /// Custom-functions runtime version reported by the host
    pub runtime: String,
    /// Correlation key, only set for streaming calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_key: Option<String>,
}

impl FunctionCall {
    /// The key results for this call are published under
    pub fn task_key(&self) -> String {
        task_key(&self.func_name, &self.args)
    }
}

/// Result body of a custom-function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub result: Vec<Vec<Value>>,
}

/// Correlation key for a streaming call: `<func_name>_<args joined by ",">`.
///
/// Nested arrays are flattened and `null` renders as an empty string, so
/// `("f", [1, [2, null], "a"])` gives `f_1,2,,a`.
pub fn task_key(func_name: &str, args: &[serde_json::Value]) -> String {
    format!("{}_{}", func_name, join_args(args))
}

fn join_args(args: &[serde_json::Value]) -> String {
    args.iter().map(arg_text).collect::<Vec<_>>().join(",")
}

fn arg_text(arg: &serde_json::Value) -> String {
    use serde_json::Value as Json;
    match arg {
        Json::Null => String::new(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Json::String(s) => s.clone(),
        Json::Array(items) => join_args(items),
        Json::Object(_) => "[object Object]".to_string(),
    }
}
