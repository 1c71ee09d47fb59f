/// `scripting/trigger.rs`: host events and the script callback each one runs
///
/// The host raises a `HostEvent`; `Extension` looks up the matching field on
/// the module table the user script returned and calls it.
use mlua::{Lua, Result as LuaResult, Table};

use crate::marshal::record::{push_chat, push_command, push_message, Chat, Command, Message};

/// Events that reach a loaded script.
#[derive(Debug, Clone, Copy)]
pub enum HostEvent<'a> {
    /// An IRC message arrived from a network.
    Message(&'a Message<'a>),
    /// The user sent a chat line.
    Chat(&'a Chat<'a>),
    /// The user ran `/extension Lua ...`.
    Command(&'a Command<'a>),
    /// The extension is being unloaded.
    Stop,
}

impl HostEvent<'_> {
    /// Name of the module field the script implements for this event.
    pub fn callback_name(&self) -> &'static str {
        match self {
            HostEvent::Message(_) => "process_message",
            HostEvent::Chat(_) => "process_chat",
            HostEvent::Command(_) => "process_command",
            HostEvent::Stop => "stop",
        }
    }

    /// The argument passed after the module itself, if any.
    pub fn payload(&self, lua: &Lua) -> LuaResult<Option<Table>> {
        match self {
            HostEvent::Message(msg) => push_message(lua, msg).map(Some),
            HostEvent::Chat(chat) => push_chat(lua, chat).map(Some),
            HostEvent::Command(cmd) => push_command(lua, cmd).map(Some),
            HostEvent::Stop => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_names_match_script_interface() {
        let msg = Message::default();
        let chat = Chat::default();
        let cmd = Command::default();
        assert_eq!(HostEvent::Message(&msg).callback_name(), "process_message");
        assert_eq!(HostEvent::Chat(&chat).callback_name(), "process_chat");
        assert_eq!(HostEvent::Command(&cmd).callback_name(), "process_command");
        assert_eq!(HostEvent::Stop.callback_name(), "stop");
    }

    #[test]
    fn stop_has_no_payload() {
        let lua = Lua::new();
        assert!(HostEvent::Stop.payload(&lua).unwrap().is_none());
    }
}
