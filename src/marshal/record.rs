/// `marshal/record.rs`: host event structs -> Lua tables
///
/// Scripts read host data only through the field names below, so renaming
/// one is a breaking change for every user script.
use mlua::{Lua, Result as LuaResult, Table};

use super::bytes::export_bytes;
use crate::ffi::{GlircChat, GlircCommand, GlircMessage, GlircString};

/// Largest parameter list the host accepts on an outgoing message.
pub const MAX_MESSAGE_PARAMS: usize = 15;

pub const CHAT_FIELDS: [&str; 3] = ["network", "target", "message"];
pub const COMMAND_FIELDS: [&str; 1] = ["command"];
pub const MESSAGE_FIELDS: [&str; 5] = ["network", "prefix", "command", "params", "tags"];
pub const PREFIX_FIELDS: [&str; 3] = ["nick", "user", "host"];

/// A chat line the user submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chat<'a> {
    pub network: &'a [u8],
    pub target: &'a [u8],
    pub message: &'a [u8],
}

/// Argument text of an `/extension` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Command<'a> {
    pub command: &'a [u8],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Prefix<'a> {
    pub nick: &'a [u8],
    pub user: &'a [u8],
    pub host: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

/// An IRC message received from, or bound for, a network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message<'a> {
    pub network: &'a [u8],
    pub prefix: Prefix<'a>,
    pub command: &'a [u8],
    pub params: Vec<&'a [u8]>,
    pub tags: Vec<Tag<'a>>,
}

impl<'a> Chat<'a> {
    /// # Safety
    /// Every string in `raw` must stay valid for `'a`.
    pub unsafe fn from_raw(raw: &'a GlircChat) -> Self {
        Self {
            network: raw.network.as_bytes(),
            target: raw.target.as_bytes(),
            message: raw.message.as_bytes(),
        }
    }
}

impl<'a> Command<'a> {
    /// # Safety
    /// `raw.command` must stay valid for `'a`.
    pub unsafe fn from_raw(raw: &'a GlircCommand) -> Self {
        Self {
            command: raw.command.as_bytes(),
        }
    }
}

impl<'a> Message<'a> {
    /// # Safety
    /// Every string in `raw`, and the `params`, `tagkeys` and `tagvals`
    /// arrays with their stated lengths, must stay valid for `'a`.
    pub unsafe fn from_raw(raw: &'a GlircMessage) -> Self {
        let params = raw_array(raw.params, raw.params_n);
        let keys = raw_array(raw.tagkeys, raw.tags_n);
        let vals = raw_array(raw.tagvals, raw.tags_n);
        Self {
            network: raw.network.as_bytes(),
            prefix: Prefix {
                nick: raw.prefix_nick.as_bytes(),
                user: raw.prefix_user.as_bytes(),
                host: raw.prefix_host.as_bytes(),
            },
            command: raw.command.as_bytes(),
            params: params.iter().map(|p| p.as_bytes()).collect(),
            tags: keys
                .iter()
                .zip(vals)
                .map(|(k, v)| Tag {
                    key: k.as_bytes(),
                    value: v.as_bytes(),
                })
                .collect(),
        }
    }
}

unsafe fn raw_array<'a>(ptr: *const GlircString, len: usize) -> &'a [GlircString] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len)
    }
}

/// `{ network, target, message }`
pub fn push_chat(lua: &Lua, chat: &Chat<'_>) -> LuaResult<Table> {
    let tbl = lua.create_table()?;
    tbl.set("network", export_bytes(lua, chat.network)?)?;
    tbl.set("target", export_bytes(lua, chat.target)?)?;
    tbl.set("message", export_bytes(lua, chat.message)?)?;
    Ok(tbl)
}

/// `{ command }`
pub fn push_command(lua: &Lua, cmd: &Command<'_>) -> LuaResult<Table> {
    let tbl = lua.create_table()?;
    tbl.set("command", export_bytes(lua, cmd.command)?)?;
    Ok(tbl)
}

/// `{ network, prefix = { nick, user, host }, command, params = {...}, tags = {[key] = value} }`
pub fn push_message(lua: &Lua, msg: &Message<'_>) -> LuaResult<Table> {
    let tbl = lua.create_table()?;
    tbl.set("network", export_bytes(lua, msg.network)?)?;

    let prefix = lua.create_table()?;
    prefix.set("nick", export_bytes(lua, msg.prefix.nick)?)?;
    prefix.set("user", export_bytes(lua, msg.prefix.user)?)?;
    prefix.set("host", export_bytes(lua, msg.prefix.host)?)?;
    tbl.set("prefix", prefix)?;

    tbl.set("command", export_bytes(lua, msg.command)?)?;

    let params = lua.create_table()?;
    for (i, param) in msg.params.iter().enumerate() {
        params.raw_set(i + 1, export_bytes(lua, param)?)?;
    }
    tbl.set("params", params)?;

    let tags = lua.create_table()?;
    for tag in &msg.tags {
        tags.raw_set(export_bytes(lua, tag.key)?, export_bytes(lua, tag.value)?)?;
    }
    tbl.set("tags", tags)?;

    Ok(tbl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::{String as LuaString, Value};

    fn field(tbl: &Table, name: &str) -> Vec<u8> {
        tbl.get::<LuaString>(name).unwrap().as_bytes().to_vec()
    }

    fn keys(tbl: &Table) -> Vec<String> {
        let mut keys: Vec<String> = tbl
            .clone()
            .pairs::<String, Value>()
            .map(|pair| pair.unwrap().0)
            .collect();
        keys.sort();
        keys
    }

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn message_projects_sender_and_params_with_embedded_nul() {
        let lua = Lua::new();
        let msg = Message {
            network: b"libera",
            prefix: Prefix {
                nick: b"alice",
                user: b"al",
                host: b"example.org",
            },
            command: b"PRIVMSG",
            params: vec![&b"#room"[..], &b"hi\0there"[..]],
            tags: vec![Tag {
                key: b"time",
                value: b"2018-01-01T00:00:00Z",
            }],
        };
        let tbl = push_message(&lua, &msg).unwrap();

        let prefix: Table = tbl.get("prefix").unwrap();
        assert_eq!(field(&prefix, "nick"), b"alice");
        assert_eq!(field(&tbl, "command"), b"PRIVMSG");

        let params: Vec<Vec<u8>> = tbl
            .get::<Table>("params")
            .unwrap()
            .sequence_values::<LuaString>()
            .map(|s| s.unwrap().as_bytes().to_vec())
            .collect();
        assert_eq!(params, vec![b"#room".to_vec(), b"hi\0there".to_vec()]);

        let tags: Table = tbl.get("tags").unwrap();
        assert_eq!(field(&tags, "time"), b"2018-01-01T00:00:00Z");
    }

    #[test]
    fn empty_records_keep_every_field_name() {
        let lua = Lua::new();

        let chat = push_chat(&lua, &Chat::default()).unwrap();
        assert_eq!(keys(&chat), sorted(&CHAT_FIELDS));

        let cmd = push_command(&lua, &Command::default()).unwrap();
        assert_eq!(keys(&cmd), sorted(&COMMAND_FIELDS));

        let msg = push_message(&lua, &Message::default()).unwrap();
        assert_eq!(keys(&msg), sorted(&MESSAGE_FIELDS));
        let prefix: Table = msg.get("prefix").unwrap();
        assert_eq!(keys(&prefix), sorted(&PREFIX_FIELDS));
        assert_eq!(msg.get::<Table>("params").unwrap().raw_len(), 0);
    }

    #[test]
    fn chat_fields_are_copied_from_host_struct() {
        let lua = Lua::new();
        let raw = GlircChat {
            network: GlircString::from_bytes(b"mynet"),
            target: GlircString::from_bytes(b"#chan"),
            message: GlircString::from_bytes(b"hello"),
        };
        let tbl = push_chat(&lua, &unsafe { Chat::from_raw(&raw) }).unwrap();
        assert_eq!(field(&tbl, "network"), b"mynet");
        assert_eq!(field(&tbl, "target"), b"#chan");
        assert_eq!(field(&tbl, "message"), b"hello");
    }

    #[test]
    fn raw_message_views_params_and_tags_in_order() {
        let params = [
            GlircString::from_bytes(b"#room"),
            GlircString::from_bytes(b"hi\0there"),
        ];
        let keys = [GlircString::from_bytes(b"account")];
        let vals = [GlircString::from_bytes(b"alice")];
        let raw = GlircMessage {
            network: GlircString::from_bytes(b"libera"),
            prefix_nick: GlircString::from_bytes(b"alice"),
            prefix_user: GlircString::EMPTY,
            prefix_host: GlircString::EMPTY,
            command: GlircString::from_bytes(b"PRIVMSG"),
            params: params.as_ptr(),
            params_n: params.len(),
            tagkeys: keys.as_ptr(),
            tagvals: vals.as_ptr(),
            tags_n: 1,
        };
        let msg = unsafe { Message::from_raw(&raw) };
        assert_eq!(msg.prefix.nick, b"alice");
        assert!(msg.prefix.user.is_empty());
        assert_eq!(msg.params, vec![&b"#room"[..], &b"hi\0there"[..]]);
        assert_eq!(
            msg.tags,
            vec![Tag {
                key: b"account",
                value: b"alice",
            }]
        );
    }

    #[test]
    fn command_projects_single_field() {
        let lua = Lua::new();
        let raw = GlircCommand {
            command: GlircString::from_bytes(b"reload now"),
        };
        let tbl = push_command(&lua, &unsafe { Command::from_raw(&raw) }).unwrap();
        assert_eq!(field(&tbl, "command"), b"reload now");
    }
}
