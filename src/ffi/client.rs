/// `ffi/client.rs`: the glirc host API, linked from the client executable
///
/// `FfiClient` adapts the C entry points to the `Client` trait. Strings the
/// host allocates are copied and released with the host's own free
/// functions before returning.
use std::cell::Cell;
use std::cmp::Ordering;
use std::ffi::{c_char, c_int, c_ulong, c_void, CStr};
use std::ptr::{self, NonNull};

use super::{Glirc, GlircMessage, GlircString, MessageCode, TimerCallback, TimerId};
use crate::error::ClientFailure;
use crate::host::{Client, Focus, StringList};
use crate::marshal::record::Message;
use crate::scripting::engine::Extension;

extern "C" {
    fn glirc_send_message(g: *mut Glirc, msg: *const GlircMessage) -> c_int;
    fn glirc_print(g: *mut Glirc, code: MessageCode, msg: *const c_char, msglen: usize) -> c_int;
    fn glirc_inject_chat(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        src: *const c_char,
        srclen: usize,
        tgt: *const c_char,
        tgtlen: usize,
        msg: *const c_char,
        msglen: usize,
    ) -> c_int;

    fn glirc_list_networks(g: *mut Glirc) -> *mut *mut c_char;
    fn glirc_list_channels(g: *mut Glirc, net: *const c_char, netlen: usize) -> *mut *mut c_char;
    fn glirc_list_channel_users(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        chan: *const c_char,
        chanlen: usize,
    ) -> *mut *mut c_char;

    fn glirc_current_focus(
        g: *mut Glirc,
        net: *mut *mut c_char,
        netlen: *mut usize,
        tgt: *mut *mut c_char,
        tgtlen: *mut usize,
    );
    fn glirc_set_focus(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        tgt: *const c_char,
        tgtlen: usize,
    );

    fn glirc_my_nick(g: *mut Glirc, net: *const c_char, netlen: usize) -> *mut c_char;
    fn glirc_user_account(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        nick: *const c_char,
        nicklen: usize,
    ) -> *mut c_char;
    fn glirc_user_channel_modes(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        chan: *const c_char,
        chanlen: usize,
        nick: *const c_char,
        nicklen: usize,
    ) -> *mut c_char;
    fn glirc_channel_modes(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        chan: *const c_char,
        chanlen: usize,
    ) -> *mut *mut c_char;
    fn glirc_channel_masks(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        chan: *const c_char,
        chanlen: usize,
        mode: c_char,
    ) -> *mut *mut c_char;

    fn glirc_mark_seen(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        chan: *const c_char,
        chanlen: usize,
    );
    fn glirc_clear_window(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        chan: *const c_char,
        chanlen: usize,
    );

    fn glirc_identifier_cmp(s: *const c_char, slen: usize, t: *const c_char, tlen: usize) -> c_int;
    fn glirc_is_channel(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        tgt: *const c_char,
        tgtlen: usize,
    ) -> c_int;
    fn glirc_is_logged_on(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        tgt: *const c_char,
        tgtlen: usize,
    ) -> c_int;
    fn glirc_resolve_path(g: *mut Glirc, path: *const c_char, pathlen: usize) -> *mut c_char;

    fn glirc_set_timer(
        g: *mut Glirc,
        millis: c_ulong,
        cb: TimerCallback,
        dat: *mut c_void,
    ) -> TimerId;
    fn glirc_cancel_timer(g: *mut Glirc, tid: TimerId) -> *mut c_void;

    fn glirc_window_lines(
        g: *mut Glirc,
        net: *const c_char,
        netlen: usize,
        tgt: *const c_char,
        tgtlen: usize,
        filtered: c_int,
    ) -> *mut *mut c_char;

    fn glirc_free_string(s: *mut c_char);
    fn glirc_free_strings(s: *mut *mut c_char);
}

pub struct FfiClient {
    glirc: NonNull<Glirc>,
    /// The `Extension` timer callbacks are delivered to.
    owner: Cell<*const Extension>,
}

impl FfiClient {
    pub fn new(glirc: NonNull<Glirc>) -> Self {
        Self {
            glirc,
            owner: Cell::new(ptr::null()),
        }
    }

    /// Route timers set from now on to `ext`. `ext` must stay at this
    /// address until it stops.
    pub fn set_owner(&self, ext: *const Extension) {
        self.owner.set(ext);
    }

    fn g(&self) -> *mut Glirc {
        self.glirc.as_ptr()
    }
}

unsafe extern "C" fn on_timer(dat: *mut c_void, tid: TimerId) {
    // SAFETY: `dat` is the owner recorded at `set_timer`; pending timers are
    // cancelled before the owner is freed.
    if let Some(ext) = dat.cast::<Extension>().cast_const().as_ref() {
        ext.fire_timer(tid);
    }
}

// ── Host string ownership ─────────────────────────────────────────────────────

fn raw(bytes: &[u8]) -> (*const c_char, usize) {
    (bytes.as_ptr().cast(), bytes.len())
}

fn raw_opt(bytes: Option<&[u8]>) -> (*const c_char, usize) {
    bytes.map_or((ptr::null(), 0), raw)
}

/// Copy and release a NUL-terminated host string.
unsafe fn take_string(s: *mut c_char) -> Option<Vec<u8>> {
    if s.is_null() {
        return None;
    }
    let bytes = CStr::from_ptr(s).to_bytes().to_vec();
    glirc_free_string(s);
    Some(bytes)
}

/// Copy and release a length-delimited host string.
unsafe fn take_counted(s: *mut c_char, len: usize) -> Option<Vec<u8>> {
    if s.is_null() {
        return None;
    }
    let bytes = std::slice::from_raw_parts(s.cast::<u8>(), len).to_vec();
    glirc_free_string(s);
    Some(bytes)
}

unsafe fn take_list(list: *mut *mut c_char) -> Option<StringList> {
    StringList::from_raw(list, glirc_free_strings)
}

fn status(code: c_int) -> Result<(), ClientFailure> {
    if code == 0 {
        Ok(())
    } else {
        Err(ClientFailure)
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

impl Client for FfiClient {
    fn send_message(&self, msg: &Message<'_>) -> Result<(), ClientFailure> {
        let params: Vec<GlircString> = msg.params.iter().map(|p| GlircString::from_bytes(p)).collect();
        let tagkeys: Vec<GlircString> = msg.tags.iter().map(|t| GlircString::from_bytes(t.key)).collect();
        let tagvals: Vec<GlircString> = msg.tags.iter().map(|t| GlircString::from_bytes(t.value)).collect();
        let raw_msg = GlircMessage {
            network: GlircString::from_bytes(msg.network),
            prefix_nick: GlircString::from_bytes(msg.prefix.nick),
            prefix_user: GlircString::from_bytes(msg.prefix.user),
            prefix_host: GlircString::from_bytes(msg.prefix.host),
            command: GlircString::from_bytes(msg.command),
            params: params.as_ptr(),
            params_n: params.len(),
            tagkeys: tagkeys.as_ptr(),
            tagvals: tagvals.as_ptr(),
            tags_n: tagkeys.len(),
        };
        // SAFETY: every pointer in `raw_msg` borrows data alive for the call.
        status(unsafe { glirc_send_message(self.g(), &raw_msg) })
    }

    fn print(&self, code: MessageCode, msg: &[u8]) {
        let (m, mlen) = raw(msg);
        // SAFETY: `m` points at `mlen` bytes for the duration of the call.
        if unsafe { glirc_print(self.g(), code, m, mlen) } != 0 {
            log::warn!("[host] print failed");
        }
    }

    fn inject_chat(
        &self,
        network: &[u8],
        source: &[u8],
        target: &[u8],
        message: &[u8],
    ) -> Result<(), ClientFailure> {
        let (n, nl) = raw(network);
        let (s, sl) = raw(source);
        let (t, tl) = raw(target);
        let (m, ml) = raw(message);
        status(unsafe { glirc_inject_chat(self.g(), n, nl, s, sl, t, tl, m, ml) })
    }

    fn list_networks(&self) -> Option<StringList> {
        unsafe { take_list(glirc_list_networks(self.g())) }
    }

    fn list_channels(&self, network: &[u8]) -> Option<StringList> {
        let (n, nl) = raw(network);
        unsafe { take_list(glirc_list_channels(self.g(), n, nl)) }
    }

    fn list_channel_users(&self, network: &[u8], channel: &[u8]) -> Option<StringList> {
        let (n, nl) = raw(network);
        let (c, cl) = raw(channel);
        unsafe { take_list(glirc_list_channel_users(self.g(), n, nl, c, cl)) }
    }

    fn my_nick(&self, network: &[u8]) -> Option<Vec<u8>> {
        let (n, nl) = raw(network);
        unsafe { take_string(glirc_my_nick(self.g(), n, nl)) }
    }

    fn user_account(&self, network: &[u8], nick: &[u8]) -> Option<Vec<u8>> {
        let (n, nl) = raw(network);
        let (k, kl) = raw(nick);
        unsafe { take_string(glirc_user_account(self.g(), n, nl, k, kl)) }
    }

    fn user_channel_modes(&self, network: &[u8], channel: &[u8], nick: &[u8]) -> Option<Vec<u8>> {
        let (n, nl) = raw(network);
        let (c, cl) = raw(channel);
        let (k, kl) = raw(nick);
        unsafe { take_string(glirc_user_channel_modes(self.g(), n, nl, c, cl, k, kl)) }
    }

    fn channel_modes(&self, network: &[u8], channel: &[u8]) -> Option<StringList> {
        let (n, nl) = raw(network);
        let (c, cl) = raw(channel);
        unsafe { take_list(glirc_channel_modes(self.g(), n, nl, c, cl)) }
    }

    fn channel_masks(&self, network: &[u8], channel: &[u8], mode: u8) -> Option<StringList> {
        let (n, nl) = raw(network);
        let (c, cl) = raw(channel);
        unsafe { take_list(glirc_channel_masks(self.g(), n, nl, c, cl, mode as c_char)) }
    }

    fn mark_seen(&self, network: Option<&[u8]>, channel: Option<&[u8]>) {
        let (n, nl) = raw_opt(network);
        let (c, cl) = raw_opt(channel);
        unsafe { glirc_mark_seen(self.g(), n, nl, c, cl) }
    }

    fn clear_window(&self, network: Option<&[u8]>, channel: Option<&[u8]>) {
        let (n, nl) = raw_opt(network);
        let (c, cl) = raw_opt(channel);
        unsafe { glirc_clear_window(self.g(), n, nl, c, cl) }
    }

    fn current_focus(&self) -> Focus {
        let (mut net, mut netlen) = (ptr::null_mut(), 0);
        let (mut tgt, mut tgtlen) = (ptr::null_mut(), 0);
        // SAFETY: the host fills both out-parameters with owned strings or null.
        unsafe {
            glirc_current_focus(self.g(), &mut net, &mut netlen, &mut tgt, &mut tgtlen);
            Focus {
                network: take_counted(net, netlen),
                target: take_counted(tgt, tgtlen),
            }
        }
    }

    fn set_focus(&self, network: Option<&[u8]>, target: Option<&[u8]>) {
        let (n, nl) = raw_opt(network);
        let (t, tl) = raw_opt(target);
        unsafe { glirc_set_focus(self.g(), n, nl, t, tl) }
    }

    fn identifier_cmp(&self, a: &[u8], b: &[u8]) -> Ordering {
        let (s, sl) = raw(a);
        let (t, tl) = raw(b);
        unsafe { glirc_identifier_cmp(s, sl, t, tl) }.cmp(&0)
    }

    fn is_channel(&self, network: &[u8], target: &[u8]) -> bool {
        let (n, nl) = raw(network);
        let (t, tl) = raw(target);
        unsafe { glirc_is_channel(self.g(), n, nl, t, tl) != 0 }
    }

    fn is_logged_on(&self, network: &[u8], nick: &[u8]) -> bool {
        let (n, nl) = raw(network);
        let (k, kl) = raw(nick);
        unsafe { glirc_is_logged_on(self.g(), n, nl, k, kl) != 0 }
    }

    fn resolve_path(&self, path: &[u8]) -> Option<Vec<u8>> {
        let (p, pl) = raw(path);
        unsafe { take_string(glirc_resolve_path(self.g(), p, pl)) }
    }

    fn set_timer(&self, millis: u64) -> TimerId {
        let millis = c_ulong::try_from(millis).unwrap_or(c_ulong::MAX);
        let dat = self.owner.get().cast_mut().cast::<c_void>();
        unsafe { glirc_set_timer(self.g(), millis, on_timer, dat) }
    }

    fn cancel_timer(&self, id: TimerId) -> bool {
        !unsafe { glirc_cancel_timer(self.g(), id) }.is_null()
    }

    fn window_lines(&self, network: &[u8], target: &[u8], filtered: bool) -> Option<StringList> {
        let (n, nl) = raw(network);
        let (t, tl) = raw(target);
        unsafe {
            take_list(glirc_window_lines(
                self.g(),
                n,
                nl,
                t,
                tl,
                c_int::from(filtered),
            ))
        }
    }
}
