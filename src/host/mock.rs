/// `host/mock.rs`: in-process `Client` that records every call, for tests
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::CString;

use super::{Client, Focus, StringList};
use crate::error::ClientFailure;
use crate::ffi::{MessageCode, TimerId};
use crate::marshal::record::Message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub network: Vec<u8>,
    pub command: Vec<u8>,
    pub params: Vec<Vec<u8>>,
}

#[derive(Default)]
pub struct MockClient {
    pub printed: RefCell<Vec<(MessageCode, Vec<u8>)>>,
    pub sent: RefCell<Vec<SentMessage>>,
    pub injected: RefCell<Vec<[Vec<u8>; 4]>>,
    pub seen: RefCell<Vec<(Option<Vec<u8>>, Option<Vec<u8>>)>>,
    pub cleared: RefCell<Vec<(Option<Vec<u8>>, Option<Vec<u8>>)>>,
    pub focus: RefCell<Focus>,
    pub fail_sends: Cell<bool>,
    /// network -> channel -> users
    pub networks: BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, Vec<Vec<u8>>>>,
    pub nicks: BTreeMap<Vec<u8>, Vec<u8>>,
    pub modes: Vec<CString>,
    pub timers: RefCell<BTreeSet<TimerId>>,
    pub next_timer: Cell<TimerId>,
    pub timer_delays: RefCell<Vec<u64>>,
}

impl MockClient {
    pub fn with_network(mut self, network: &str, channels: &[(&str, &[&str])]) -> Self {
        let chans = channels
            .iter()
            .map(|(chan, users)| {
                let users = users.iter().map(|u| u.as_bytes().to_vec()).collect();
                (chan.as_bytes().to_vec(), users)
            })
            .collect();
        self.networks.insert(network.as_bytes().to_vec(), chans);
        self
    }

    pub fn with_nick(mut self, network: &str, nick: &str) -> Self {
        self.nicks
            .insert(network.as_bytes().to_vec(), nick.as_bytes().to_vec());
        self
    }

    pub fn printed_text(&self, code: MessageCode) -> Vec<String> {
        self.printed
            .borrow()
            .iter()
            .filter(|(c, _)| *c == code)
            .map(|(_, msg)| String::from_utf8_lossy(msg).into_owned())
            .collect()
    }

    fn list<I: IntoIterator<Item = Vec<u8>>>(items: I) -> StringList {
        StringList::from_vec(
            items
                .into_iter()
                .filter_map(|item| CString::new(item).ok())
                .collect(),
        )
    }
}

impl Client for MockClient {
    fn send_message(&self, msg: &Message<'_>) -> Result<(), ClientFailure> {
        if self.fail_sends.get() {
            return Err(ClientFailure);
        }
        self.sent.borrow_mut().push(SentMessage {
            network: msg.network.to_vec(),
            command: msg.command.to_vec(),
            params: msg.params.iter().map(|p| p.to_vec()).collect(),
        });
        Ok(())
    }

    fn print(&self, code: MessageCode, msg: &[u8]) {
        self.printed.borrow_mut().push((code, msg.to_vec()));
    }

    fn inject_chat(
        &self,
        network: &[u8],
        source: &[u8],
        target: &[u8],
        message: &[u8],
    ) -> Result<(), ClientFailure> {
        self.injected.borrow_mut().push([
            network.to_vec(),
            source.to_vec(),
            target.to_vec(),
            message.to_vec(),
        ]);
        Ok(())
    }

    fn list_networks(&self) -> Option<StringList> {
        Some(Self::list(self.networks.keys().cloned()))
    }

    fn list_channels(&self, network: &[u8]) -> Option<StringList> {
        let chans = self.networks.get(network)?;
        Some(Self::list(chans.keys().cloned()))
    }

    fn list_channel_users(&self, network: &[u8], channel: &[u8]) -> Option<StringList> {
        let users = self.networks.get(network)?.get(channel)?;
        Some(Self::list(users.iter().cloned()))
    }

    fn my_nick(&self, network: &[u8]) -> Option<Vec<u8>> {
        self.nicks.get(network).cloned()
    }

    fn user_account(&self, _network: &[u8], nick: &[u8]) -> Option<Vec<u8>> {
        (nick == b"alice").then(|| b"alice_acct".to_vec())
    }

    fn user_channel_modes(&self, _network: &[u8], _channel: &[u8], nick: &[u8]) -> Option<Vec<u8>> {
        (nick == b"alice").then(|| b"@".to_vec())
    }

    fn channel_modes(&self, network: &[u8], channel: &[u8]) -> Option<StringList> {
        self.networks.get(network)?.get(channel)?;
        Some(StringList::from_vec(self.modes.clone()))
    }

    fn channel_masks(&self, network: &[u8], channel: &[u8], mode: u8) -> Option<StringList> {
        self.networks.get(network)?.get(channel)?;
        match mode {
            b'b' => Some(Self::list([b"*!*@spam.host".to_vec()])),
            _ => None,
        }
    }

    fn mark_seen(&self, network: Option<&[u8]>, channel: Option<&[u8]>) {
        self.seen
            .borrow_mut()
            .push((network.map(<[u8]>::to_vec), channel.map(<[u8]>::to_vec)));
    }

    fn clear_window(&self, network: Option<&[u8]>, channel: Option<&[u8]>) {
        self.cleared
            .borrow_mut()
            .push((network.map(<[u8]>::to_vec), channel.map(<[u8]>::to_vec)));
    }

    fn current_focus(&self) -> Focus {
        self.focus.borrow().clone()
    }

    fn set_focus(&self, network: Option<&[u8]>, target: Option<&[u8]>) {
        *self.focus.borrow_mut() = Focus {
            network: network.map(<[u8]>::to_vec),
            target: target.map(<[u8]>::to_vec),
        };
    }

    fn identifier_cmp(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())
    }

    fn is_channel(&self, _network: &[u8], target: &[u8]) -> bool {
        target.first() == Some(&b'#')
    }

    fn is_logged_on(&self, network: &[u8], nick: &[u8]) -> bool {
        self.networks
            .get(network)
            .map(|chans| chans.values().any(|users| users.iter().any(|u| u == nick)))
            .unwrap_or(false)
    }

    fn resolve_path(&self, path: &[u8]) -> Option<Vec<u8>> {
        if path.first() == Some(&b'/') {
            Some(path.to_vec())
        } else {
            let mut resolved = b"/home/user/.config/glirc/".to_vec();
            resolved.extend_from_slice(path);
            Some(resolved)
        }
    }

    fn set_timer(&self, millis: u64) -> TimerId {
        let id = self.next_timer.get() + 1;
        self.next_timer.set(id);
        self.timers.borrow_mut().insert(id);
        self.timer_delays.borrow_mut().push(millis);
        id
    }

    fn cancel_timer(&self, id: TimerId) -> bool {
        self.timers.borrow_mut().remove(&id)
    }

    fn window_lines(&self, network: &[u8], target: &[u8], filtered: bool) -> Option<StringList> {
        self.networks.get(network)?.get(target)?;
        let lines: &[&[u8]] = if filtered {
            &[b"<alice> hi"]
        } else {
            &[b"<alice> hi", b"<bob> hey"]
        };
        Some(Self::list(lines.iter().map(|l| l.to_vec())))
    }
}
