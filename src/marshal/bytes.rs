/// `marshal/bytes.rs`: host byte strings <-> Lua strings
///
/// Export always copies into a Lua-owned string, so nothing on the Lua side
/// ever aliases host memory. Import hands back a `BorrowedBytes` view whose
/// lifetime is tied to the Lua value it came from; copy it out before the
/// value goes away.
use mlua::{BorrowedBytes, Lua, Result as LuaResult, String as LuaString, Value};

use crate::error::MarshalError;
use crate::ffi::GlircString;

/// Copy `bytes` into a fresh Lua string. Embedded NULs are preserved.
pub fn export_bytes(lua: &Lua, bytes: &[u8]) -> LuaResult<LuaString> {
    lua.create_string(bytes)
}

/// Copy a host `(pointer, length)` string into a fresh Lua string.
///
/// # Safety
/// `raw` must describe `len` readable bytes for the duration of the call.
pub unsafe fn export_raw(lua: &Lua, raw: &GlircString) -> LuaResult<LuaString> {
    export_bytes(lua, raw.as_bytes())
}

/// Read the string at argument position `index` (1-based, for error
/// reporting) without copying.
pub fn import_bytes(value: &Value, index: usize) -> Result<BorrowedBytes<'_>, MarshalError> {
    match value {
        Value::String(s) => Ok(s.as_bytes()),
        other => Err(MarshalError::TypeMismatch {
            index,
            expected: "string",
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip(lua: &Lua, bytes: &[u8]) -> Vec<u8> {
        let value = Value::String(export_bytes(lua, bytes).unwrap());
        let view = import_bytes(&value, 1).unwrap();
        view.to_vec()
    }

    #[test]
    fn empty_buffer_round_trips() {
        let lua = Lua::new();
        assert_eq!(round_trip(&lua, b""), b"");
    }

    #[test]
    fn embedded_nul_round_trips() {
        let lua = Lua::new();
        assert_eq!(round_trip(&lua, b"hi\0there\0"), b"hi\0there\0");
    }

    #[test]
    fn export_raw_copies_exactly_len_bytes() {
        let lua = Lua::new();
        let backing = b"networkXXXX".to_vec();
        let raw = GlircString {
            str: backing.as_ptr().cast(),
            len: 7,
        };
        let s = unsafe { export_raw(&lua, &raw) }.unwrap();
        drop(backing);
        assert_eq!(&*s.as_bytes(), b"network");
    }

    #[test]
    fn null_raw_string_exports_empty() {
        let lua = Lua::new();
        let s = unsafe { export_raw(&lua, &GlircString::EMPTY) }.unwrap();
        assert!(s.as_bytes().is_empty());
    }

    #[test]
    fn non_string_values_are_rejected() {
        let lua = Lua::new();
        let table = Value::Table(lua.create_table().unwrap());
        for (value, found) in [
            (Value::Integer(42), "integer"),
            (Value::Number(1.5), "number"),
            (Value::Boolean(true), "boolean"),
            (Value::Nil, "nil"),
            (table, "table"),
        ] {
            assert_eq!(
                import_bytes(&value, 3).err(),
                Some(MarshalError::TypeMismatch {
                    index: 3,
                    expected: "string",
                    found,
                })
            );
        }
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let lua = Lua::new();
            prop_assert_eq!(round_trip(&lua, &bytes), bytes);
        }
    }
}
