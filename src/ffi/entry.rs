/// `ffi/entry.rs`: the exported `extension` descriptor and its entry points
///
/// The state pointer handed back to the host is a leaked `Box<Extension>`;
/// `stop` reclaims it.
use std::ffi::{c_char, c_void, CStr};
use std::ptr::{self, NonNull};
use std::rc::Rc;

use super::client::FfiClient;
use super::{Glirc, GlircChat, GlircCommand, GlircExtension, GlircMessage, GlircString, ProcessResult};
use crate::config::ExtensionConfig;
use crate::marshal::record::{Chat, Command, Message};
use crate::scripting::api::{MAJOR_VERSION, MINOR_VERSION};
use crate::scripting::engine::Extension;

/// Environment variable holding the `env_logger` filter.
pub const LOG_ENV: &str = "GLIRC_LUA_LOG";

#[no_mangle]
#[allow(non_upper_case_globals)]
pub static extension: GlircExtension = GlircExtension {
    name: c"Lua".as_ptr(),
    major_version: MAJOR_VERSION,
    minor_version: MINOR_VERSION,
    start: Some(start),
    stop: Some(stop),
    process_message: Some(process_message),
    process_command: Some(process_command),
    process_chat: Some(process_chat),
    process_thread_join: None,
};

fn init_logging() {
    // A second load of the extension finds the logger already installed.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "warn"))
        .try_init();
}

unsafe extern "C" fn start(
    glirc: *mut Glirc,
    path: *const c_char,
    args: *const GlircString,
    args_len: usize,
) -> *mut c_void {
    init_logging();

    let Some(glirc) = NonNull::new(glirc) else {
        log::error!("[ffi] start called without a host context");
        return ptr::null_mut();
    };
    let library_path = if path.is_null() {
        &[][..]
    } else {
        CStr::from_ptr(path).to_bytes()
    };
    let args: Vec<&[u8]> = if args.is_null() || args_len == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(args, args_len)
            .iter()
            .map(|a| a.as_bytes())
            .collect()
    };

    let client = Rc::new(FfiClient::new(glirc));
    let Some(ext) = Extension::new_or_report(client.clone(), ExtensionConfig::from_env()) else {
        return ptr::null_mut();
    };
    let mut ext = Box::new(ext);
    client.set_owner(&*ext);
    if !ext.run_script(library_path, &args) {
        return ptr::null_mut();
    }
    log::info!("[ffi] Lua extension started");
    Box::into_raw(ext).cast()
}

unsafe extern "C" fn stop(state: *mut c_void) {
    if state.is_null() {
        return;
    }
    Box::from_raw(state.cast::<Extension>()).stop();
}

unsafe fn instance<'a>(state: *mut c_void) -> Option<&'a Extension> {
    state.cast::<Extension>().cast_const().as_ref()
}

unsafe extern "C" fn process_message(state: *mut c_void, msg: *const GlircMessage) -> ProcessResult {
    match (instance(state), msg.as_ref()) {
        (Some(ext), Some(msg)) => ext.process_message(&Message::from_raw(msg)),
        _ => ProcessResult::Pass,
    }
}

unsafe extern "C" fn process_chat(state: *mut c_void, chat: *const GlircChat) -> ProcessResult {
    match (instance(state), chat.as_ref()) {
        (Some(ext), Some(chat)) => ext.process_chat(&Chat::from_raw(chat)),
        _ => ProcessResult::Pass,
    }
}

unsafe extern "C" fn process_command(state: *mut c_void, cmd: *const GlircCommand) {
    if let (Some(ext), Some(cmd)) = (instance(state), cmd.as_ref()) {
        ext.process_command(&Command::from_raw(cmd));
    }
}
