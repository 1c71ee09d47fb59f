/// `scripting/`: the Lua side of the extension
///
/// One interpreter per loaded extension (mlua, Lua 5.4). The host drives it
/// through `engine::Extension`; scripts reach back into the host through the
/// `glirc` library in `api`. Script errors are printed to the client and
/// never unload the extension.
pub mod api;
pub mod engine;
pub mod sandbox;
pub mod timers;
pub mod trigger;
pub mod warn;
