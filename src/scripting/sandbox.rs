/// `scripting/sandbox.rs`: which Lua standard libraries a script gets
///
/// glirc scripts historically run with every standard library opened, so
/// `Full` is the default. Narrower levels are available through config.
use mlua::{Lua, LuaOptions, Result as LuaResult, StdLib};
use serde::{Deserialize, Serialize};

/// Controls which Lua standard libraries are available to a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// string, table, math, utf8, coroutine. No I/O or OS.
    Basic,
    /// Basic + io
    FileRead,
    /// Every standard library, debug included, as `luaL_openlibs` opens them
    #[default]
    Full,
}

impl TrustLevel {
    pub fn libraries(self) -> StdLib {
        let basic = StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8 | StdLib::COROUTINE;
        match self {
            TrustLevel::Basic => basic,
            TrustLevel::FileRead => basic | StdLib::IO,
            TrustLevel::Full => StdLib::ALL,
        }
    }
}

/// Creates a new Lua VM with the libraries `trust` allows.
pub fn create_vm(trust: TrustLevel) -> LuaResult<Lua> {
    match trust {
        // SAFETY: scripts at this level get `debug` and C module loading and
        // can break memory safety with them.
        TrustLevel::Full => Ok(unsafe { Lua::unsafe_new_with(trust.libraries(), LuaOptions::default()) }),
        _ => Lua::new_with(trust.libraries(), LuaOptions::default()),
    }
}
