//! Handler dispatch: the single path every line of input takes.
//!
//! ```text
//! input ──▶ for handler in registry:
//!             can_handle? ──no──▶ next
//!                 │yes
//!             handle ──Matched──────▶ response
//!                 ├──Declined / NotFound ──▶ next
//!                 └──Err(other) ──────────▶ ERROR response
//! ```
//!
//! Handler errors never escape: they are turned into `ERROR` responses here.

use crate::handlers::{HandlerError, HandlerRegistry, Outcome, Turn, NOT_UNDERSTOOD};
use kidshell_types::Response;

#[derive(Debug)]
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(HandlerRegistry::standard())
    }
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Offer `input` to each handler in order; the first match wins.
    pub fn dispatch(&self, input: &str, turn: &mut Turn<'_>) -> Response {
        for handler in self.registry.iter() {
            let name = handler.name();
            if !handler.can_handle(input, turn.session) {
                continue;
            }

            match handler.handle(input, turn) {
                Ok(Outcome::Matched(response)) => {
                    tracing::debug!(handler = name, kind = %response.kind(), "handled");
                    return response;
                }
                Ok(Outcome::Declined) => {
                    tracing::debug!(handler = name, "declined");
                }
                Err(HandlerError::NotFound(what)) => {
                    tracing::debug!(handler = name, %what, "declined");
                }
                Err(err) => {
                    tracing::debug!(handler = name, error = %err, "failed");
                    let message = err.to_string();
                    turn.session.record(name, input, &message, false);
                    return Response::error(message)
                        .with_meta("handler", name)
                        .with_meta("input", input);
                }
            }
        }

        // Only reachable when the catch-all is missing or declines.
        Response::error(NOT_UNDERSTOOD).with_meta("input", input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::Handler;
    use crate::quiz::ScriptedQuizzes;
    use crate::safe_math::SafeMathEvaluator;
    use crate::session::Session;
    use kidshell_types::ResponseType;

    struct Always(&'static str, fn() -> Result<Outcome, HandlerError>);

    impl Handler for Always {
        fn name(&self) -> &'static str {
            self.0
        }

        fn can_handle(&self, _input: &str, _session: &Session) -> bool {
            true
        }

        fn handle(&self, _input: &str, _turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
            (self.1)()
        }
    }

    fn dispatch(registry: HandlerRegistry, input: &str) -> (Response, Session) {
        let mut session = Session::new();
        let mut evaluator = SafeMathEvaluator::new();
        let mut quizzes = ScriptedQuizzes::new(Vec::new());
        let mut turn = Turn {
            session: &mut session,
            evaluator: &mut evaluator,
            quizzes: &mut quizzes,
        };
        let response = Dispatcher::new(registry).dispatch(input, &mut turn);
        (response, session)
    }

    #[test]
    fn test_declines_fall_through() {
        let mut registry = HandlerRegistry::new();
        registry.register(Always("no", || Ok(Outcome::Declined)));
        registry.register(Always("missing", || Err(HandlerError::NotFound("x".into()))));
        registry.register(Always("yes", || Ok(Outcome::Matched(Response::text("picked")))));

        let (response, _) = dispatch(registry, "anything");
        assert_eq!(response.as_text(), Some("picked"));
    }

    #[test]
    fn test_errors_become_error_responses() {
        let mut registry = HandlerRegistry::new();
        registry.register(Always("broken", || Err(HandlerError::NoActiveQuiz)));
        registry.register(Always("never", || Ok(Outcome::Matched(Response::text("unreachable")))));

        let (response, session) = dispatch(registry, "5");
        assert_eq!(response.kind(), ResponseType::Error);
        assert_eq!(response.as_text(), Some("No active quiz."));
        assert_eq!(response.meta("handler"), Some(&serde_json::json!("broken")));
        assert_eq!(session.activities.back().map(|a| a.success), Some(false));
    }

    #[test]
    fn test_empty_registry_still_answers() {
        let (response, _) = dispatch(HandlerRegistry::new(), "1 + 1");
        assert_eq!(response.kind(), ResponseType::Error);
        assert_eq!(response.as_text(), Some(NOT_UNDERSTOOD));
    }
}
