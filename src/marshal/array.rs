/// `marshal/array.rs`: host `char **` lists -> Lua sequences
///
/// Host lists carry no count. They end at the first null entry, and each
/// entry ends at its own NUL byte. The scan is bounded so a list missing its
/// sentinel fails instead of reading past the allocation forever.
use std::ffi::{c_char, CStr};

use mlua::{Lua, Result as LuaResult, Table};

use super::bytes::export_bytes;
use crate::error::MarshalError;

/// Default scan guard for host lists.
pub const DEFAULT_MAX_ENTRIES: usize = 1 << 20;

/// Collect the entries of a sentinel-terminated list, in order.
///
/// A null `list` is treated as empty.
///
/// # Safety
/// `list` must be null or point at an array of NUL-terminated strings ending
/// in a null pointer (or at least `limit + 1` readable entries), all alive
/// for `'a`.
pub unsafe fn scan_string_array<'a>(
    list: *const *const c_char,
    limit: usize,
) -> Result<Vec<&'a CStr>, MarshalError> {
    let mut entries = Vec::new();
    if list.is_null() {
        return Ok(entries);
    }
    loop {
        let entry = *list.add(entries.len());
        if entry.is_null() {
            return Ok(entries);
        }
        if entries.len() == limit {
            return Err(MarshalError::UnterminatedArray { limit });
        }
        entries.push(CStr::from_ptr(entry));
    }
}

/// Copy a host list into a new Lua sequence of strings.
///
/// # Safety
/// Same contract as [`scan_string_array`]; the list is only read during the
/// call.
pub unsafe fn import_string_array(
    lua: &Lua,
    list: *const *const c_char,
    limit: usize,
) -> LuaResult<Table> {
    let entries = scan_string_array(list, limit)?;
    let table = lua.create_table()?;
    for (i, entry) in entries.iter().enumerate() {
        table.raw_set(i + 1, export_bytes(lua, entry.to_bytes())?)?;
    }
    Ok(table)
}
