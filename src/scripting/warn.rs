/// `scripting/warn.rs`: route Lua 5.4 `warn()` output to the client console
///
/// A warning may arrive in several pieces; pieces are buffered until the
/// last one and then printed as a single error line. `@off` and `@on`
/// control messages silence and restore delivery.
use std::cell::RefCell;

use mlua::{Lua, Result as LuaResult};

use crate::ffi::MessageCode;
use crate::registry;

/// mIRC orange "Lua warning" followed by a formatting reset.
const WARNING_TAG: &[u8] = b"\x037Lua warning\x0f: ";

#[derive(Default)]
struct WarningState {
    buffer: Vec<u8>,
    disabled: bool,
}

pub fn install_warnings(lua: &Lua) -> LuaResult<()> {
    let state = RefCell::new(WarningState::default());
    lua.set_warning_function(move |lua, msg: &str, incomplete: bool| {
        let mut st = state.borrow_mut();

        if st.buffer.is_empty() {
            if let Some(control) = msg.strip_prefix('@') {
                match control {
                    "off" => st.disabled = true,
                    "on" => st.disabled = false,
                    _ => {}
                }
                return Ok(());
            }
            if st.disabled {
                return Ok(());
            }
            st.buffer.extend_from_slice(WARNING_TAG);
        }

        st.buffer.extend_from_slice(msg.as_bytes());

        if !incomplete {
            let line = std::mem::take(&mut st.buffer);
            drop(st);
            registry::resolve(lua).print(MessageCode::Error, &line);
        }
        Ok(())
    });
    Ok(())
}
