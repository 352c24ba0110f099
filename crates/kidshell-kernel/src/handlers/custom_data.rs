//! custom_data — words a parent mapped to answers in a data file.

use serde_json::Value as JsonValue;

use super::{Handler, HandlerError, Outcome, Turn};
use crate::session::Session;
use kidshell_types::Response;

pub struct CustomData;

/// Exact key first, then the first key equal ignoring case.
fn lookup<'a>(session: &'a Session, input: &str) -> Option<&'a JsonValue> {
    session.custom_data.get(input).or_else(|| {
        let lowered = input.to_lowercase();
        session
            .custom_data
            .iter()
            .find(|(key, _)| key.to_lowercase() == lowered)
            .map(|(_, value)| value)
    })
}

impl Handler for CustomData {
    fn name(&self) -> &'static str {
        "custom_data"
    }

    fn can_handle(&self, input: &str, session: &Session) -> bool {
        !session.custom_data.is_empty() && lookup(session, input).is_some()
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let value = lookup(turn.session, input)
            .cloned()
            .ok_or_else(|| HandlerError::NotFound(input.to_string()))?;
        turn.session.record("custom_data", input, value.clone(), true);
        Ok(Outcome::Matched(
            Response::text(value).with_meta("source", "custom_data"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_prefers_exact_key() {
        let mut session = Session::new();
        session.custom_data.insert("Hello".into(), json!("exact"));
        session.custom_data.insert("hello".into(), json!("lower"));
        assert_eq!(lookup(&session, "Hello"), Some(&json!("exact")));
        assert_eq!(lookup(&session, "HELLO"), Some(&json!("exact")));
        assert_eq!(lookup(&session, "hello"), Some(&json!("lower")));
        assert!(lookup(&session, "bye").is_none());
    }

    #[test]
    fn test_empty_data_claims_nothing() {
        assert!(!CustomData.can_handle("blue", &Session::new()));
    }
}
