/// `host/`: everything a script can ask of the glirc client
///
/// `Client` is the seam between the marshaling layer and the host. The
/// extension build implements it over the C API (`ffi::client::FfiClient`);
/// tests implement it in-process.
#[cfg(test)]
pub(crate) mod mock;

use std::cmp::Ordering;
use std::ffi::{c_char, CStr};
use std::ptr::NonNull;

use crate::error::{ClientFailure, MarshalError};
use crate::ffi::{MessageCode, TimerId};
use crate::marshal::array::scan_string_array;
use crate::marshal::record::Message;

/// Host API reachable from script code.
///
/// Byte-slice arguments are borrowed for the duration of the call only.
pub trait Client {
    fn send_message(&self, msg: &Message<'_>) -> Result<(), ClientFailure>;
    fn print(&self, code: MessageCode, msg: &[u8]);
    fn inject_chat(
        &self,
        network: &[u8],
        source: &[u8],
        target: &[u8],
        message: &[u8],
    ) -> Result<(), ClientFailure>;

    fn list_networks(&self) -> Option<StringList>;
    fn list_channels(&self, network: &[u8]) -> Option<StringList>;
    fn list_channel_users(&self, network: &[u8], channel: &[u8]) -> Option<StringList>;

    fn my_nick(&self, network: &[u8]) -> Option<Vec<u8>>;
    fn user_account(&self, network: &[u8], nick: &[u8]) -> Option<Vec<u8>>;
    fn user_channel_modes(&self, network: &[u8], channel: &[u8], nick: &[u8]) -> Option<Vec<u8>>;

    /// Each entry is the mode letter followed by its argument, if any.
    fn channel_modes(&self, network: &[u8], channel: &[u8]) -> Option<StringList>;
    fn channel_masks(&self, network: &[u8], channel: &[u8], mode: u8) -> Option<StringList>;

    fn mark_seen(&self, network: Option<&[u8]>, channel: Option<&[u8]>);
    fn clear_window(&self, network: Option<&[u8]>, channel: Option<&[u8]>);
    fn current_focus(&self) -> Focus;
    fn set_focus(&self, network: Option<&[u8]>, target: Option<&[u8]>);

    fn identifier_cmp(&self, a: &[u8], b: &[u8]) -> Ordering;
    fn is_channel(&self, network: &[u8], target: &[u8]) -> bool;
    fn is_logged_on(&self, network: &[u8], nick: &[u8]) -> bool;
    fn resolve_path(&self, path: &[u8]) -> Option<Vec<u8>>;

    /// Ask the host to call back after `millis`. The host later reports the
    /// returned id to `Extension::fire_timer`.
    fn set_timer(&self, millis: u64) -> TimerId;
    /// Returns `false` when the host knows no such pending timer.
    fn cancel_timer(&self, id: TimerId) -> bool;

    fn window_lines(&self, network: &[u8], target: &[u8], filtered: bool) -> Option<StringList>;
}

/// Currently focused client window. Both `None` is the client window,
/// a network alone is a network window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Focus {
    pub network: Option<Vec<u8>>,
    pub target: Option<Vec<u8>>,
}

pub type ReleaseStrings = unsafe extern "C" fn(list: *mut *mut c_char);

/// A NUL-pointer-terminated array of C strings together with the function
/// that releases it. The array is released when this value drops.
pub struct StringList {
    list: NonNull<*mut c_char>,
    release: ReleaseStrings,
}

impl StringList {
    /// Take ownership of a host-allocated list.
    ///
    /// # Safety
    /// `list` must be a valid sentinel-terminated array of NUL-terminated
    /// strings that `release` frees exactly once.
    pub unsafe fn from_raw(list: *mut *mut c_char, release: ReleaseStrings) -> Option<Self> {
        NonNull::new(list).map(|list| Self { list, release })
    }

    /// Build a list in the host wire shape from Rust-owned strings, for
    /// the in-process client.
    #[cfg(test)]
    pub fn from_vec(strings: Vec<std::ffi::CString>) -> Self {
        let entries: Box<[*mut c_char]> = strings
            .into_iter()
            .map(std::ffi::CString::into_raw)
            .chain(std::iter::once(std::ptr::null_mut()))
            .collect();
        let raw = Box::into_raw(entries).cast::<*mut c_char>();
        Self {
            // SAFETY: `Box::into_raw` never returns null.
            list: unsafe { NonNull::new_unchecked(raw) },
            release: release_owned,
        }
    }

    pub fn as_ptr(&self) -> *const *const c_char {
        self.list.as_ptr().cast_const().cast()
    }

    /// Entries in order, stopping at the sentinel or failing past `limit`.
    pub fn entries(&self, limit: usize) -> Result<Vec<&CStr>, MarshalError> {
        // SAFETY: the list stays alive as long as `self` is borrowed.
        unsafe { scan_string_array(self.as_ptr(), limit) }
    }
}

impl Drop for StringList {
    fn drop(&mut self) {
        // SAFETY: `from_raw`/`from_vec` paired the list with its release
        // function, and drop runs once.
        unsafe { (self.release)(self.list.as_ptr()) }
    }
}

#[cfg(test)]
unsafe extern "C" fn release_owned(list: *mut *mut c_char) {
    let mut count = 0;
    while !(*list.add(count)).is_null() {
        drop(std::ffi::CString::from_raw(*list.add(count)));
        count += 1;
    }
    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(list, count + 1)));
}
