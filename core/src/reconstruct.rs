//! Rebuilding typed errors from server error payloads.
//!
//! # Design
//! The server names the failed kind by its class name. `ErrorRegistry` maps
//! those names to what the client knows about them: a family kind with a
//! params or message constructor, a family kind with neither, a kind from
//! outside the family, or a name that is not an error at all. The registry is
//! filled once at start-up; names it does not know degrade to the family's
//! base error carrying the server's message.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ClientError, ForeignError, GameError};
use crate::types::ErrorDetails;

type ParamsFn = dyn Fn(Vec<Value>) -> GameError + Send + Sync;
type MessageFn = dyn Fn(String) -> GameError + Send + Sync;

/// Constructors a family kind offers. The params constructor is preferred
/// when both are present.
#[derive(Clone, Default)]
pub struct GameConstructors {
    params: Option<Arc<ParamsFn>>,
    message: Option<Arc<MessageFn>>,
}

impl GameConstructors {
    pub fn has_params(&self) -> bool {
        self.params.is_some()
    }

    pub fn has_message(&self) -> bool {
        self.message.is_some()
    }
}

impl fmt::Debug for GameConstructors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameConstructors")
            .field("params", &self.has_params())
            .field("message", &self.has_message())
            .finish()
    }
}

/// A server-side kind outside the word-game family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKind {
    /// Unchecked kinds are raised as they are; checked ones are wrapped as
    /// the cause of a family base error.
    pub runtime: bool,
    /// Whether the kind can be built from a message alone.
    pub message_constructor: bool,
}

impl ForeignKind {
    pub const RUNTIME: ForeignKind = ForeignKind {
        runtime: true,
        message_constructor: true,
    };
    pub const CHECKED: ForeignKind = ForeignKind {
        runtime: false,
        message_constructor: true,
    };
}

#[derive(Debug, Clone)]
enum Entry {
    Game(GameConstructors),
    Foreign(ForeignKind),
    Unrelated,
}

/// Map from wire kind name to what the client can build from it.
#[derive(Debug, Clone, Default)]
pub struct ErrorRegistry {
    entries: HashMap<String, Entry>,
}

impl ErrorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with the platform exception names a servlet back
    /// end reports for argument, state and I/O failures.
    pub fn with_common_server_kinds() -> Self {
        let mut registry = Self::new();
        for name in [
            "java.lang.RuntimeException",
            "java.lang.IllegalArgumentException",
            "java.lang.IllegalStateException",
            "java.lang.NullPointerException",
            "java.lang.UnsupportedOperationException",
            "java.lang.IndexOutOfBoundsException",
            "java.lang.NumberFormatException",
            "java.lang.SecurityException",
        ] {
            registry.register_foreign(name, ForeignKind::RUNTIME);
        }
        for name in [
            "java.lang.Exception",
            "java.io.IOException",
            "java.io.FileNotFoundException",
            "java.util.concurrent.TimeoutException",
        ] {
            registry.register_foreign(name, ForeignKind::CHECKED);
        }
        registry
    }

    /// Family kind built from the payload's params. A message constructor
    /// registered for the same name is kept as the fallback.
    pub fn register_params<F>(&mut self, name: impl Into<String>, ctor: F) -> &mut Self
    where
        F: Fn(Vec<Value>) -> GameError + Send + Sync + 'static,
    {
        self.game_entry(name).params = Some(Arc::new(ctor));
        self
    }

    /// Family kind built from the payload's message, used when the kind has
    /// no params constructor.
    pub fn register_message<F>(&mut self, name: impl Into<String>, ctor: F) -> &mut Self
    where
        F: Fn(String) -> GameError + Send + Sync + 'static,
    {
        self.game_entry(name).message = Some(Arc::new(ctor));
        self
    }

    /// Family kind that keeps its wire name and the server's message.
    pub fn register_game_kind(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        let kind = name.clone();
        self.register_message(name, move |message| GameError::new(kind.clone(), message))
    }

    /// Family kind that cannot be built from a payload.
    pub fn register_without_constructor(&mut self, name: impl Into<String>) -> &mut Self {
        self.insert(name, Entry::Game(GameConstructors::default()))
    }

    pub fn register_foreign(&mut self, name: impl Into<String>, kind: ForeignKind) -> &mut Self {
        self.insert(name, Entry::Foreign(kind))
    }

    /// A name the server may send that is not an error type.
    pub fn register_unrelated(&mut self, name: impl Into<String>) -> &mut Self {
        self.insert(name, Entry::Unrelated)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Constructors registered for `name`, replacing any non-family entry.
    fn game_entry(&mut self, name: impl Into<String>) -> &mut GameConstructors {
        let entry = self
            .entries
            .entry(name.into())
            .or_insert_with(|| Entry::Game(GameConstructors::default()));
        if !matches!(entry, Entry::Game(_)) {
            *entry = Entry::Game(GameConstructors::default());
        }
        match entry {
            Entry::Game(ctors) => ctors,
            _ => unreachable!("entry was just made a family kind"),
        }
    }

    fn insert(&mut self, name: impl Into<String>, entry: Entry) -> &mut Self {
        self.entries.insert(name.into(), entry);
        self
    }

    /// Turn an error payload into the error the caller should see.
    pub fn reconstruct(&self, details: ErrorDetails) -> ClientError {
        let class = details.exception_class.as_str();
        let message = details.message().to_string();

        let entry = match self.entries.get(class) {
            Some(entry) => entry,
            None => {
                warn!(class, "unknown error kind, falling back to base error");
                return GameError::base(message).into();
            }
        };

        match entry {
            Entry::Game(GameConstructors {
                params: Some(ctor), ..
            }) => {
                debug!(class, "rebuilding error from params");
                ctor(details.params.unwrap_or_default()).into()
            }
            Entry::Game(GameConstructors {
                message: Some(ctor), ..
            }) => {
                debug!(class, "rebuilding error from message");
                ctor(message).into()
            }
            Entry::Game(_) => ClientError::Configuration(format!(
                "Cannot find params or String constructor for exception: {class}"
            )),
            Entry::Foreign(kind) if !kind.message_constructor => GameError::base(format!(
                "Cannot find String constructor for exception: {class}"
            ))
            .into(),
            Entry::Foreign(kind) => {
                let foreign = ForeignError {
                    class: class.to_string(),
                    message: message.clone(),
                };
                if kind.runtime {
                    foreign.into()
                } else {
                    GameError::base(message).caused_by(foreign).into()
                }
            }
            Entry::Unrelated => {
                ClientError::Configuration(format!("{class} is not assignable from Throwable"))
            }
        }
    }

    /// Decode an error body and rebuild the error it describes.
    pub fn reconstruct_body(&self, status: u16, body: &[u8]) -> ClientError {
        match serde_json::from_slice::<Option<ErrorDetails>>(body) {
            Ok(Some(details)) => self.reconstruct(details),
            Ok(None) => ClientError::UnparsableErrorDetails { status, source: None },
            Err(e) => {
                debug!(status, error = %e, "error body is not an error-details record");
                ClientError::UnparsableErrorDetails {
                    status,
                    source: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BASE_KIND;
    use std::error::Error as _;

    fn details(class: &str, message: &str, params: Option<Vec<Value>>) -> ErrorDetails {
        ErrorDetails {
            exception_class: class.to_string(),
            error_message: Some(message.to_string()),
            params,
        }
    }

    #[test]
    fn unknown_kind_degrades_to_base_error() {
        let err = ErrorRegistry::new().reconstruct(details("UnknownThing", "not found", Some(vec![])));
        match err {
            ClientError::Game(e) => {
                assert_eq!(e.kind, BASE_KIND);
                assert_eq!(e.message, "not found");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn params_constructor_receives_params() {
        let mut registry = ErrorRegistry::new();
        registry.register_params("WordNotFoundException", |params| {
            let word = params.first().and_then(Value::as_str).unwrap_or("?").to_string();
            GameError::with_params("WordNotFoundException", format!("Word {word} not found"), params)
        });
        let err = registry.reconstruct(details(
            "WordNotFoundException",
            "ignored",
            Some(vec![Value::from("zebra")]),
        ));
        match err {
            ClientError::Game(e) => {
                assert_eq!(e.message, "Word zebra not found");
                assert_eq!(e.params, vec![Value::from("zebra")]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn params_constructor_gets_empty_list_when_params_absent() {
        let mut registry = ErrorRegistry::new();
        registry.register_params("P", |params| GameError::with_params("P", "n", params));
        let err = registry.reconstruct(details("P", "m", None));
        assert!(matches!(err, ClientError::Game(e) if e.params.is_empty()));
    }

    #[test]
    fn message_constructor_keeps_kind_and_message() {
        let mut registry = ErrorRegistry::new();
        registry.register_game_kind("PuzzleLockedException");
        let err = registry.reconstruct(details("PuzzleLockedException", "locked", Some(vec![Value::from(1)])));
        assert_eq!(err.kind(), Some("PuzzleLockedException"));
        assert_eq!(err.to_string(), "PuzzleLockedException: locked");
    }

    #[test]
    fn family_kind_without_constructor_is_a_configuration_error() {
        let mut registry = ErrorRegistry::new();
        registry.register_without_constructor("Broken");
        let err = registry.reconstruct(details("Broken", "m", None));
        assert!(matches!(err, ClientError::Configuration(msg) if msg.contains("Broken")));
    }

    #[test]
    fn runtime_foreign_kind_is_raised_directly() {
        let registry = ErrorRegistry::with_common_server_kinds();
        let err = registry.reconstruct(details("java.lang.IllegalArgumentException", "bad size", None));
        match err {
            ClientError::Foreign(e) => {
                assert_eq!(e.class, "java.lang.IllegalArgumentException");
                assert_eq!(e.message, "bad size");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn checked_foreign_kind_is_wrapped() {
        let registry = ErrorRegistry::with_common_server_kinds();
        let err = registry.reconstruct(details("java.io.IOException", "disk full", None));
        match err {
            ClientError::Game(e) => {
                assert!(e.is_base());
                assert_eq!(e.message, "disk full");
                let cause = e.source().unwrap().to_string();
                assert_eq!(cause, "java.io.IOException: disk full");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn foreign_kind_without_message_constructor() {
        let mut registry = ErrorRegistry::new();
        registry.register_foreign(
            "odd.Error",
            ForeignKind {
                runtime: true,
                message_constructor: false,
            },
        );
        let err = registry.reconstruct(details("odd.Error", "m", None));
        match err {
            ClientError::Game(e) => {
                assert_eq!(e.message, "Cannot find String constructor for exception: odd.Error")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unrelated_name_is_not_throwable() {
        let mut registry = ErrorRegistry::new();
        registry.register_unrelated("java.lang.String");
        let err = registry.reconstruct(details("java.lang.String", "m", None));
        assert_eq!(err.to_string(), "java.lang.String is not assignable from Throwable");
    }

    #[test]
    fn unparsable_body() {
        let err = ErrorRegistry::new().reconstruct_body(500, b"<html>oops</html>");
        assert!(matches!(err, ClientError::UnparsableErrorDetails { status: 500, source: Some(_) }));
        assert!(err.to_string().starts_with("Unable to parse error details"));
    }

    #[test]
    fn null_body_yields_nothing_to_rebuild() {
        let err = ErrorRegistry::new().reconstruct_body(400, b"null");
        assert!(matches!(err, ClientError::UnparsableErrorDetails { status: 400, source: None }));
    }

    #[test]
    fn later_registration_replaces_other_entry_shapes() {
        let mut registry = ErrorRegistry::new();
        registry
            .register_unrelated("K")
            .register_game_kind("K");
        assert!(registry.contains("K"));
        assert_eq!(registry.reconstruct(details("K", "m", None)).kind(), Some("K"));
    }

    fn register_both(registry: &mut ErrorRegistry, params_first: bool) {
        let by_params = |params: Vec<Value>| GameError::with_params("Both", "from params", params);
        let by_message = |message: String| GameError::new("Both", message);
        if params_first {
            registry.register_params("Both", by_params).register_message("Both", by_message);
        } else {
            registry.register_message("Both", by_message).register_params("Both", by_params);
        }
    }

    #[test]
    fn params_constructor_preferred_over_message_in_either_order() {
        for params_first in [true, false] {
            let mut registry = ErrorRegistry::new();
            register_both(&mut registry, params_first);
            let err = registry.reconstruct(details("Both", "from message", Some(vec![Value::from(1)])));
            match err {
                ClientError::Game(e) => {
                    assert_eq!(e.message, "from params", "params_first={params_first}");
                    assert_eq!(e.params, vec![Value::from(1)]);
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn message_constructor_fills_kind_registered_without_one() {
        let mut registry = ErrorRegistry::new();
        registry
            .register_without_constructor("Late")
            .register_message("Late", |message| GameError::new("Late", message));
        assert_eq!(
            registry.reconstruct(details("Late", "m", None)).to_string(),
            "Late: m"
        );
    }
}
