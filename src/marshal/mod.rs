/// `marshal/`: conversion between host data and Lua values
///
/// Host -> Lua always copies. Lua -> host lends short-lived views that
/// must not outlive the call that produced them.
pub mod args;
pub mod array;
pub mod bytes;
pub mod record;

pub use args::CallArgs;
pub use array::{import_string_array, scan_string_array};
pub use bytes::{export_bytes, export_raw, import_bytes};
pub use record::{push_chat, push_command, push_message, Chat, Command, Message, Prefix, Tag};
