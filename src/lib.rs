//! Lua 5.4 scripting extension for the glirc IRC client.
//!
//! The host loads this library, reads the exported `extension` descriptor
//! and hands every IRC message, outgoing chat line and `/extension Lua`
//! command to the user's script. The `marshal` and `registry` modules hold
//! the conversion layer between host records and Lua values; `scripting`
//! runs the interpreter; `ffi` is the C ABI.
pub mod config;
pub mod error;
pub mod ffi;
pub mod host;
pub mod marshal;
pub mod registry;
pub mod scripting;

pub use config::ExtensionConfig;
pub use error::{ClientFailure, MarshalError};
pub use host::{Client, Focus, StringList};
pub use scripting::api::{MAJOR_VERSION, MINOR_VERSION};
pub use scripting::engine::Extension;
pub use scripting::sandbox::TrustLevel;
