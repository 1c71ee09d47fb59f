/// `error.rs`: failure kinds raised while moving data across the host boundary
use thiserror::Error;

/// A value crossing the script/host boundary did not have the required shape.
///
/// `TypeMismatch`, `ArityMismatch` and `InvalidArgument` are raised by
/// host-exposed functions and surface to the script as ordinary Lua errors.
/// `UnboundHandle` means the host never bound its context to the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    #[error("bad argument #{index} ({expected} expected, got {found})")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("wrong number of arguments (expected at most {expected}, got {found})")]
    ArityMismatch { expected: usize, found: usize },

    #[error("bad argument #{index} ({reason})")]
    InvalidArgument { index: usize, reason: &'static str },

    #[error("host string array not terminated within {limit} entries")]
    UnterminatedArray { limit: usize },

    #[error("no host handle bound to this interpreter")]
    UnboundHandle,
}

impl From<MarshalError> for mlua::Error {
    fn from(err: MarshalError) -> Self {
        mlua::Error::RuntimeError(err.to_string())
    }
}

/// The host reported that it could not carry out a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("client failure")]
pub struct ClientFailure;

impl From<ClientFailure> for mlua::Error {
    fn from(err: ClientFailure) -> Self {
        mlua::Error::RuntimeError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_names_position_and_types() {
        let err = MarshalError::TypeMismatch {
            index: 2,
            expected: "string",
            found: "number",
        };
        assert_eq!(err.to_string(), "bad argument #2 (string expected, got number)");
    }

    #[test]
    fn converts_into_runtime_error() {
        let err: mlua::Error = MarshalError::ArityMismatch { expected: 17, found: 18 }.into();
        match err {
            mlua::Error::RuntimeError(msg) => assert!(msg.contains("expected at most 17")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
