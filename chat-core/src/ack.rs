//! Acknowledgement decoding.
//!
//! The server answers every request with positional arguments
//! `(result?, error?)`. A present error always wins; otherwise a present
//! result resolves the request. `null`, a missing argument and the empty
//! string all count as absent.

use chat_types::AppError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Outcome of decoding one acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub enum AckOutcome<T> {
    /// The request succeeded with this result.
    Resolved(T),
    /// The server rejected the request.
    Rejected(AppError),
    /// Neither a result nor an error was supplied.
    Empty,
    /// The acknowledgement could not be decoded.
    Malformed(String),
}

/// Decode acknowledgement arguments into a typed outcome.
pub fn decode_ack<T: DeserializeOwned>(args: Vec<Value>) -> AckOutcome<T> {
    let mut args = args.into_iter();
    let result = args.next().filter(is_present);
    let error = args.next().filter(is_present);

    if let Some(error) = error {
        return match serde_json::from_value::<AppError>(error) {
            Ok(err) => AckOutcome::Rejected(err),
            Err(e) => AckOutcome::Malformed(format!("invalid error payload: {e}")),
        };
    }

    match result {
        Some(value) => match serde_json::from_value::<T>(value) {
            Ok(v) => AckOutcome::Resolved(v),
            Err(e) => AckOutcome::Malformed(format!("invalid result payload: {e}")),
        },
        None => AckOutcome::Empty,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
