/// `scripting/api.rs`: registers the `glirc` Lua library
///
/// Every function here re-enters the host through the handle bound to the
/// calling interpreter. Arguments are decoded with `CallArgs`, so a string
/// argument is never coerced from a number and surplus arguments are
/// rejected. A rejected argument raises an ordinary Lua error.
use mlua::{Function, Lua, Result as LuaResult, String as LuaString, Table, Value, Variadic};

use crate::config::ExtensionConfig;
use crate::error::MarshalError;
use crate::ffi::{MessageCode, TimerId};
use crate::host::StringList;
use crate::marshal::array::{import_string_array, DEFAULT_MAX_ENTRIES};
use crate::marshal::bytes::export_bytes;
use crate::marshal::record::{Message, MAX_MESSAGE_PARAMS};
use crate::marshal::CallArgs;
use crate::registry;
use crate::scripting::timers;

/// Extension API version reported to scripts and to the host.
pub const MAJOR_VERSION: i32 = 1;
pub const MINOR_VERSION: i32 = 0;

/// Install the `glirc` global and replace the global `print`.
pub fn register_all(lua: &Lua) -> LuaResult<()> {
    timers::install(lua);

    let tbl = lua.create_table()?;

    macro_rules! host_fn {
        ($name:literal, $handler:path) => {
            tbl.set(
                $name,
                lua.create_function(|lua, args: Variadic<Value>| $handler(lua, CallArgs::new(args)))?,
            )?;
        };
    }

    host_fn!("send_message", send_message);
    host_fn!("inject_chat", inject_chat);
    host_fn!("print", print_normal);
    host_fn!("error", print_error);
    host_fn!("identifier_cmp", identifier_cmp);
    host_fn!("list_networks", list_networks);
    host_fn!("list_channels", list_channels);
    host_fn!("list_channel_users", list_channel_users);
    host_fn!("my_nick", my_nick);
    host_fn!("user_account", user_account);
    host_fn!("user_channel_modes", user_channel_modes);
    host_fn!("channel_modes", channel_modes);
    host_fn!("channel_masks", channel_masks);
    host_fn!("mark_seen", mark_seen);
    host_fn!("clear_window", clear_window);
    host_fn!("current_focus", current_focus);
    host_fn!("set_focus", set_focus);
    host_fn!("is_logged_on", is_logged_on);
    host_fn!("is_channel", is_channel);
    host_fn!("resolve_path", resolve_path);
    host_fn!("set_timer", set_timer);
    host_fn!("cancel_timer", cancel_timer);
    host_fn!("window_lines", window_lines);

    let version = lua.create_table()?;
    version.set("major", MAJOR_VERSION)?;
    version.set("minor", MINOR_VERSION)?;
    tbl.set("version", version)?;
    tbl.set("format", formatting_table(lua)?)?;

    let globals = lua.globals();
    globals.set("glirc", tbl)?;
    globals.set(
        "print",
        lua.create_function(|lua, args: Variadic<Value>| print_values(lua, args))?,
    )?;
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn failure(msg: &str) -> mlua::Error {
    mlua::Error::RuntimeError(msg.to_string())
}

fn scan_limit(lua: &Lua) -> usize {
    lua.app_data_ref::<ExtensionConfig>()
        .map(|config| config.max_array_entries)
        .unwrap_or(DEFAULT_MAX_ENTRIES)
}

fn import_list(lua: &Lua, list: &StringList) -> LuaResult<Table> {
    // SAFETY: `list` owns a live sentinel-terminated array until it drops.
    unsafe { import_string_array(lua, list.as_ptr(), scan_limit(lua)) }
}

fn opt_bytes(lua: &Lua, bytes: Option<Vec<u8>>) -> LuaResult<Option<LuaString>> {
    bytes.map(|b| export_bytes(lua, &b)).transpose()
}

// ── messages ──────────────────────────────────────────────────────────────────

/// `glirc.send_message(network, command, ...)`; tags are never sent.
fn send_message(lua: &Lua, args: CallArgs) -> LuaResult<()> {
    let network = args.string(1)?;
    let command = args.string(2)?;
    args.expect_at_most(2 + MAX_MESSAGE_PARAMS)?;
    let params = args.strings_from(3)?;

    let msg = Message {
        network: &network,
        command: &command,
        params: params.iter().map(|p| &**p).collect(),
        ..Default::default()
    };
    registry::resolve(lua).send_message(&msg)?;
    Ok(())
}

/// `glirc.inject_chat(network, source, target, message)`
fn inject_chat(lua: &Lua, args: CallArgs) -> LuaResult<()> {
    let network = args.string(1)?;
    let source = args.string(2)?;
    let target = args.string(3)?;
    let message = args.string(4)?;
    args.expect_at_most(4)?;
    registry::resolve(lua).inject_chat(&network, &source, &target, &message)?;
    Ok(())
}

fn print_with(lua: &Lua, args: CallArgs, code: MessageCode) -> LuaResult<()> {
    let msg = args.string(1)?;
    args.expect_at_most(1)?;
    registry::resolve(lua).print(code, &msg);
    Ok(())
}

fn print_normal(lua: &Lua, args: CallArgs) -> LuaResult<()> {
    print_with(lua, args, MessageCode::Normal)
}

fn print_error(lua: &Lua, args: CallArgs) -> LuaResult<()> {
    print_with(lua, args, MessageCode::Error)
}

/// Global `print`: `tostring` each argument, join with tabs.
fn print_values(lua: &Lua, args: Variadic<Value>) -> LuaResult<()> {
    let tostring: Function = lua.globals().get("tostring")?;
    let mut line = Vec::new();
    for (i, value) in args.into_iter().enumerate() {
        let text: Value = tostring.call(value)?;
        let Value::String(text) = text else {
            return Err(failure("'tostring' must return a string to 'print'"));
        };
        if i > 0 {
            line.push(b'\t');
        }
        line.extend_from_slice(&text.as_bytes());
    }
    registry::resolve(lua).print(MessageCode::Normal, &line);
    Ok(())
}

// ── identifiers ───────────────────────────────────────────────────────────────

/// `glirc.identifier_cmp(a, b)` -> -1, 0 or 1 under the IRC case map
fn identifier_cmp(lua: &Lua, args: CallArgs) -> LuaResult<i64> {
    let a = args.string(1)?;
    let b = args.string(2)?;
    args.expect_at_most(2)?;
    Ok(registry::resolve(lua).identifier_cmp(&a, &b) as i64)
}

fn is_channel(lua: &Lua, args: CallArgs) -> LuaResult<bool> {
    let network = args.string(1)?;
    let target = args.string(2)?;
    args.expect_at_most(2)?;
    Ok(registry::resolve(lua).is_channel(&network, &target))
}

fn is_logged_on(lua: &Lua, args: CallArgs) -> LuaResult<bool> {
    let network = args.string(1)?;
    let nick = args.string(2)?;
    args.expect_at_most(2)?;
    Ok(registry::resolve(lua).is_logged_on(&network, &nick))
}

// ── lists ─────────────────────────────────────────────────────────────────────

fn list_networks(lua: &Lua, args: CallArgs) -> LuaResult<Table> {
    args.expect_at_most(0)?;
    let list = registry::resolve(lua)
        .list_networks()
        .ok_or_else(|| failure("client failure"))?;
    import_list(lua, &list)
}

fn list_channels(lua: &Lua, args: CallArgs) -> LuaResult<Table> {
    let network = args.string(1)?;
    args.expect_at_most(1)?;
    let list = registry::resolve(lua)
        .list_channels(&network)
        .ok_or_else(|| failure("no such network"))?;
    import_list(lua, &list)
}

fn list_channel_users(lua: &Lua, args: CallArgs) -> LuaResult<Table> {
    let network = args.string(1)?;
    let channel = args.string(2)?;
    args.expect_at_most(2)?;
    let list = registry::resolve(lua)
        .list_channel_users(&network, &channel)
        .ok_or_else(|| failure("no such channel"))?;
    import_list(lua, &list)
}

/// `glirc.window_lines(network, target, filtered)`
fn window_lines(lua: &Lua, args: CallArgs) -> LuaResult<Table> {
    let network = args.string(1)?;
    let target = args.string(2)?;
    let filtered = args.boolean(3);
    args.expect_at_most(3)?;
    let list = registry::resolve(lua)
        .window_lines(&network, &target, filtered)
        .ok_or_else(|| failure("client failure"))?;
    import_list(lua, &list)
}

// ── users and channels ────────────────────────────────────────────────────────

fn my_nick(lua: &Lua, args: CallArgs) -> LuaResult<Option<LuaString>> {
    let network = args.string(1)?;
    args.expect_at_most(1)?;
    opt_bytes(lua, registry::resolve(lua).my_nick(&network))
}

fn user_account(lua: &Lua, args: CallArgs) -> LuaResult<Option<LuaString>> {
    let network = args.string(1)?;
    let nick = args.string(2)?;
    args.expect_at_most(2)?;
    opt_bytes(lua, registry::resolve(lua).user_account(&network, &nick))
}

fn user_channel_modes(lua: &Lua, args: CallArgs) -> LuaResult<Option<LuaString>> {
    let network = args.string(1)?;
    let channel = args.string(2)?;
    let nick = args.string(3)?;
    args.expect_at_most(3)?;
    opt_bytes(
        lua,
        registry::resolve(lua).user_channel_modes(&network, &channel, &nick),
    )
}

/// `glirc.channel_modes(network, channel)` -> `{ [mode] = argument }` or nil
fn channel_modes(lua: &Lua, args: CallArgs) -> LuaResult<Option<Table>> {
    let network = args.string(1)?;
    let channel = args.string(2)?;
    args.expect_at_most(2)?;

    let Some(list) = registry::resolve(lua).channel_modes(&network, &channel) else {
        return Ok(None);
    };
    let tbl = lua.create_table()?;
    for entry in list.entries(scan_limit(lua))? {
        if let Some((mode, argument)) = entry.to_bytes().split_first() {
            tbl.set(
                export_bytes(lua, std::slice::from_ref(mode))?,
                export_bytes(lua, argument)?,
            )?;
        }
    }
    Ok(Some(tbl))
}

/// `glirc.channel_masks(network, channel, mode)` -> list of masks or nil
fn channel_masks(lua: &Lua, args: CallArgs) -> LuaResult<Option<Table>> {
    let network = args.string(1)?;
    let channel = args.string(2)?;
    let mode = args.string(3)?;
    args.expect_at_most(3)?;
    let &[mode] = &*mode else {
        return Err(MarshalError::InvalidArgument {
            index: 3,
            reason: "expected single mode character",
        }
        .into());
    };

    registry::resolve(lua)
        .channel_masks(&network, &channel, mode)
        .map(|list| import_list(lua, &list))
        .transpose()
}

// ── windows ───────────────────────────────────────────────────────────────────

fn mark_seen(lua: &Lua, args: CallArgs) -> LuaResult<()> {
    let network = args.opt_string(1)?;
    let channel = args.opt_string(2)?;
    args.expect_at_most(2)?;
    registry::resolve(lua).mark_seen(network.as_deref(), channel.as_deref());
    Ok(())
}

fn clear_window(lua: &Lua, args: CallArgs) -> LuaResult<()> {
    let network = args.opt_string(1)?;
    let channel = args.opt_string(2)?;
    args.expect_at_most(2)?;
    registry::resolve(lua).clear_window(network.as_deref(), channel.as_deref());
    Ok(())
}

/// `glirc.current_focus()` -> network?, target?
fn current_focus(lua: &Lua, args: CallArgs) -> LuaResult<(Option<LuaString>, Option<LuaString>)> {
    args.expect_at_most(0)?;
    let focus = registry::resolve(lua).current_focus();
    Ok((opt_bytes(lua, focus.network)?, opt_bytes(lua, focus.target)?))
}

/// `glirc.set_focus(network?, target?)`
fn set_focus(lua: &Lua, args: CallArgs) -> LuaResult<()> {
    let network = args.opt_string(1)?;
    let target = args.opt_string(2)?;
    args.expect_at_most(2)?;

    let has_network = network.as_deref().is_some_and(|n| !n.is_empty());
    let has_target = target.as_deref().is_some_and(|t| !t.is_empty());
    if has_target && !has_network {
        return Err(MarshalError::InvalidArgument {
            index: 2,
            reason: "target specified without a network",
        }
        .into());
    }

    registry::resolve(lua).set_focus(network.as_deref(), target.as_deref());
    Ok(())
}

fn resolve_path(lua: &Lua, args: CallArgs) -> LuaResult<Option<LuaString>> {
    let path = args.string(1)?;
    args.expect_at_most(1)?;
    opt_bytes(lua, registry::resolve(lua).resolve_path(&path))
}

// ── timers ────────────────────────────────────────────────────────────────────

/// `glirc.set_timer(millis, callback)` -> timer id
fn set_timer(lua: &Lua, args: CallArgs) -> LuaResult<i64> {
    let millis = args.integer(1)?;
    let callback = args.value(2)?;
    args.expect_at_most(2)?;

    // A negative delay fires on the next host tick.
    let delay = u64::try_from(millis).unwrap_or(0);
    let id = registry::resolve(lua).set_timer(delay);
    timers::register(lua, id, callback)?;
    log::debug!("[timer] set {id} for {millis}ms");
    Ok(i64::from(id))
}

/// `glirc.cancel_timer(id)`
fn cancel_timer(lua: &Lua, args: CallArgs) -> LuaResult<()> {
    let id = args.integer(1)?;
    args.expect_at_most(1)?;
    let id = TimerId::try_from(id).map_err(|_| failure("no such timer"))?;

    if !registry::resolve(lua).cancel_timer(id) {
        return Err(failure("no such timer"));
    }
    timers::take(lua, id)?;
    Ok(())
}

// ── format ────────────────────────────────────────────────────────────────────

const COLORS: [(&str, &str); 16] = [
    ("white", "00"),
    ("black", "01"),
    ("blue", "02"),
    ("green", "03"),
    ("red", "04"),
    ("brown", "05"),
    ("purple", "06"),
    ("orange", "07"),
    ("yellow", "08"),
    ("light_green", "09"),
    ("cyan", "10"),
    ("light_cyan", "11"),
    ("light_blue", "12"),
    ("pink", "13"),
    ("gray", "14"),
    ("light_gray", "15"),
];

/// mIRC control codes, e.g. `glirc.format.bold .. 'hi' .. glirc.format.reset`
fn formatting_table(lua: &Lua) -> LuaResult<Table> {
    let tbl = lua.create_table()?;
    tbl.set("reset", "\x0f")?;
    tbl.set("underline", "\x1f")?;
    tbl.set("italic", "\x1d")?;
    tbl.set("bold", "\x02")?;
    tbl.set("reverse", "\x16")?;
    for (name, code) in COLORS {
        tbl.set(name, format!("\x03{code}"))?;
    }
    Ok(tbl)
}
