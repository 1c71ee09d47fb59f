/// `registry.rs`: the host handle each interpreter calls back into
///
/// The handle lives in the interpreter's own app-data slot, so separate
/// interpreters never see each other's host. The interpreter holds a shared
/// reference only; the host's context outlives it and is never freed here.
use std::rc::Rc;

use mlua::Lua;

use crate::error::MarshalError;
use crate::host::Client;

struct HostHandle(Rc<dyn Client>);

/// Bind `client` to `lua`, replacing any earlier binding.
pub fn bind(lua: &Lua, client: Rc<dyn Client>) {
    if lua.set_app_data(HostHandle(client)).is_some() {
        log::debug!("host handle rebound");
    }
}

/// The bound host, or `UnboundHandle` if `bind` never ran.
pub fn try_resolve(lua: &Lua) -> Result<Rc<dyn Client>, MarshalError> {
    lua.app_data_ref::<HostHandle>()
        .map(|handle| Rc::clone(&handle.0))
        .ok_or(MarshalError::UnboundHandle)
}

/// The bound host.
///
/// # Panics
/// If no host was bound. Binding happens before any script runs, so this
/// is a host integration bug, not something a script can cause.
pub fn resolve(lua: &Lua) -> Rc<dyn Client> {
    match try_resolve(lua) {
        Ok(client) => client,
        Err(err) => panic!("{err}"),
    }
}
