/// `marshal/args.rs`: positional argument decoding for host-exposed functions
///
/// Positions are 1-based to match the way Lua reports bad arguments.
use mlua::{BorrowedBytes, Value, Variadic};

use super::bytes::import_bytes;
use crate::error::MarshalError;

pub struct CallArgs {
    values: Variadic<Value>,
}

impl CallArgs {
    pub fn new(values: Variadic<Value>) -> Self {
        Self { values }
    }

    fn get(&self, index: usize) -> Option<&Value> {
        index.checked_sub(1).and_then(|i| self.values.get(i))
    }

    /// Fail unless the call supplied at most `max` arguments.
    pub fn expect_at_most(&self, max: usize) -> Result<(), MarshalError> {
        if self.values.len() > max {
            Err(MarshalError::ArityMismatch {
                expected: max,
                found: self.values.len(),
            })
        } else {
            Ok(())
        }
    }

    /// A required string argument, borrowed for the current call.
    pub fn string(&self, index: usize) -> Result<BorrowedBytes<'_>, MarshalError> {
        match self.get(index) {
            Some(value) => import_bytes(value, index),
            None => Err(missing(index, "string")),
        }
    }

    /// A string argument that may be absent or `nil`.
    pub fn opt_string(&self, index: usize) -> Result<Option<BorrowedBytes<'_>>, MarshalError> {
        match self.get(index) {
            None | Some(Value::Nil) => Ok(None),
            Some(value) => import_bytes(value, index).map(Some),
        }
    }

    /// A required integer. Floats with an exact integer value are accepted.
    pub fn integer(&self, index: usize) -> Result<i64, MarshalError> {
        match self.get(index) {
            Some(Value::Integer(i)) => Ok(*i),
            // The range is half-open: 2^63 itself does not fit.
            Some(Value::Number(n)) if n.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(n) => {
                Ok(*n as i64)
            }
            Some(Value::Number(_)) => Err(MarshalError::InvalidArgument {
                index,
                reason: "number has no integer representation",
            }),
            Some(other) => Err(MarshalError::TypeMismatch {
                index,
                expected: "integer",
                found: other.type_name(),
            }),
            None => Err(missing(index, "integer")),
        }
    }

    /// Lua truthiness of the argument; absent counts as false.
    pub fn boolean(&self, index: usize) -> bool {
        !matches!(self.get(index), None | Some(Value::Nil) | Some(Value::Boolean(false)))
    }

    /// Any present value, `nil` included.
    pub fn value(&self, index: usize) -> Result<Value, MarshalError> {
        self.get(index)
            .cloned()
            .ok_or_else(|| missing(index, "value"))
    }

    /// The arguments from `index` onwards, each as a borrowed string.
    pub fn strings_from(&self, index: usize) -> Result<Vec<BorrowedBytes<'_>>, MarshalError> {
        (index..=self.values.len())
            .map(|i| self.string(i))
            .collect()
    }
}

fn missing(index: usize, expected: &'static str) -> MarshalError {
    MarshalError::TypeMismatch {
        index,
        expected,
        found: "no value",
    }
}
