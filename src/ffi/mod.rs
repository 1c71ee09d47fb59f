/// `ffi/`: C layout of the glirc extension API
///
/// Field order in these structs is part of the host compatibility contract
/// and must match `glirc-api.h` exactly.
#[cfg(feature = "extension")]
pub mod client;
#[cfg(feature = "extension")]
pub mod entry;

use std::ffi::{c_char, c_int, c_long, c_void};
use std::ptr;

/// Opaque host context. Only ever handled by pointer.
#[repr(C)]
pub struct Glirc {
    _private: [u8; 0],
}

pub type TimerId = c_long;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCode {
    Normal = 0,
    Error = 1,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    Pass = 0,
    Drop = 1,
}

/// Length-delimited byte string. `len` is authoritative; `str` is not
/// NUL-terminated and may be null when `len` is zero.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GlircString {
    pub str: *const c_char,
    pub len: usize,
}

impl GlircString {
    pub const EMPTY: GlircString = GlircString {
        str: ptr::null(),
        len: 0,
    };

    /// Borrow `bytes` for the duration of a host call.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            str: bytes.as_ptr().cast(),
            len: bytes.len(),
        }
    }

    /// View the bytes this string points at.
    ///
    /// # Safety
    /// `str` must point at `len` readable bytes that stay alive and unmodified
    /// for `'a`.
    pub unsafe fn as_bytes<'a>(&self) -> &'a [u8] {
        if self.str.is_null() || self.len == 0 {
            &[]
        } else {
            std::slice::from_raw_parts(self.str.cast::<u8>(), self.len)
        }
    }
}

#[repr(C)]
pub struct GlircMessage {
    pub network: GlircString,
    pub prefix_nick: GlircString,
    pub prefix_user: GlircString,
    pub prefix_host: GlircString,
    pub command: GlircString,
    pub params: *const GlircString,
    pub params_n: usize,
    pub tagkeys: *const GlircString,
    pub tagvals: *const GlircString,
    pub tags_n: usize,
}

#[repr(C)]
pub struct GlircChat {
    pub network: GlircString,
    pub target: GlircString,
    pub message: GlircString,
}

#[repr(C)]
pub struct GlircCommand {
    pub command: GlircString,
}

pub type StartFn = unsafe extern "C" fn(
    glirc: *mut Glirc,
    path: *const c_char,
    args: *const GlircString,
    args_len: usize,
) -> *mut c_void;
pub type StopFn = unsafe extern "C" fn(state: *mut c_void);
pub type ProcessMessageFn =
    unsafe extern "C" fn(state: *mut c_void, msg: *const GlircMessage) -> ProcessResult;
pub type ProcessChatFn =
    unsafe extern "C" fn(state: *mut c_void, chat: *const GlircChat) -> ProcessResult;
pub type ProcessCommandFn = unsafe extern "C" fn(state: *mut c_void, cmd: *const GlircCommand);
pub type ProcessThreadJoinFn = unsafe extern "C" fn(result: *mut c_void);
pub type TimerCallback = unsafe extern "C" fn(dat: *mut c_void, tid: TimerId);

/// The descriptor the host looks up when it loads the extension library.
#[repr(C)]
pub struct GlircExtension {
    pub name: *const c_char,
    pub major_version: c_int,
    pub minor_version: c_int,
    pub start: Option<StartFn>,
    pub stop: Option<StopFn>,
    pub process_message: Option<ProcessMessageFn>,
    pub process_command: Option<ProcessCommandFn>,
    pub process_chat: Option<ProcessChatFn>,
    pub process_thread_join: Option<ProcessThreadJoinFn>,
}

// SAFETY: the descriptor is immutable and `name` points at a static literal.
unsafe impl Sync for GlircExtension {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_views_as_empty_slice() {
        let bytes = unsafe { GlircString::EMPTY.as_bytes() };
        assert!(bytes.is_empty());
    }

    #[test]
    fn from_bytes_keeps_embedded_nul() {
        let data = b"hi\0there";
        let raw = GlircString::from_bytes(data);
        assert_eq!(raw.len, 8);
        assert_eq!(unsafe { raw.as_bytes() }, data);
    }
}
