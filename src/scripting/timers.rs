/// `scripting/timers.rs`: callbacks waiting on host timers
///
/// The host only knows timer ids. The Lua function for each id is pinned in
/// the Lua registry until the timer fires or is cancelled.
use std::cell::RefCell;
use std::collections::HashMap;

use mlua::{Lua, RegistryKey, Result as LuaResult, Value};

use crate::ffi::TimerId;

#[derive(Default)]
pub struct PendingTimers(RefCell<HashMap<TimerId, RegistryKey>>);

pub fn install(lua: &Lua) {
    lua.set_app_data(PendingTimers::default());
}

fn with_timers<R>(lua: &Lua, f: impl FnOnce(&mut HashMap<TimerId, RegistryKey>) -> R) -> LuaResult<R> {
    let timers = lua
        .app_data_ref::<PendingTimers>()
        .ok_or_else(|| mlua::Error::RuntimeError("timers not installed".to_string()))?;
    let mut map = timers.0.borrow_mut();
    Ok(f(&mut map))
}

pub fn register(lua: &Lua, id: TimerId, callback: Value) -> LuaResult<()> {
    let key = lua.create_registry_value(callback)?;
    if let Some(stale) = with_timers(lua, |map| map.insert(id, key))? {
        log::warn!("[timer] host reused id {id}");
        lua.remove_registry_value(stale)?;
    }
    Ok(())
}

/// Remove the callback for `id`, returning it if one was pending.
pub fn take(lua: &Lua, id: TimerId) -> LuaResult<Option<Value>> {
    let Some(key) = with_timers(lua, |map| map.remove(&id))? else {
        return Ok(None);
    };
    let callback: Value = lua.registry_value(&key)?;
    lua.remove_registry_value(key)?;
    Ok(Some(callback))
}

pub fn pending(lua: &Lua) -> usize {
    with_timers(lua, |map| map.len()).unwrap_or(0)
}

/// Forget every pending callback and return the ids the host still holds.
pub fn drain(lua: &Lua) -> Vec<TimerId> {
    let keys = with_timers(lua, std::mem::take).unwrap_or_default();
    let mut ids = Vec::with_capacity(keys.len());
    for (id, key) in keys {
        if let Err(e) = lua.remove_registry_value(key) {
            log::debug!("[timer] releasing callback {id}: {e}");
        }
        ids.push(id);
    }
    ids.sort_unstable();
    ids
}
