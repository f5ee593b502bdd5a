//! # Typed message pipe between a worker process and its parent.
//!
//! The worker writes newline-delimited JSON [`Message`]s: any number of lifecycle
//! [`Notice`]s followed by at most one [`Outcome`]. The parent drains the stream on a
//! blocking reader, so the worker never stalls on a full pipe buffer.
//!
//! ## Wire format
//! ```text
//! {"Event":{"kind":"AttemptFailed","attempt":1,...}}\n
//! {"Event":{"kind":"RetryScheduled","attempt":2,...}}\n
//! {"Outcome":{"Success":42}}\n
//! ```
//!
//! ## Rules
//! - End-of-file before an outcome means the writer went away without one (e.g. the worker
//!   was killed) and is reported as `Ok(None)`.
//! - Undecodable lines are `InvalidData` I/O errors; a line cut short is `UnexpectedEof`.
//! - Lines after the outcome are ignored.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::os::fd::OwnedFd;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::events::{Event, EventKind};

use super::Outcome;

/// One line on the worker pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message<T> {
    /// Lifecycle event raised inside the worker.
    Event(Notice),
    /// Final result; the last meaningful line.
    Outcome(Outcome<T>),
}

/// Process-independent part of an [`Event`].
///
/// Sequence number, timestamp and instance name are assigned on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    kind: EventKind,
    attempt: Option<u32>,
    attempts: Option<u32>,
    delay_ms: Option<u32>,
    reason: Option<String>,
}

impl From<&Event> for Notice {
    fn from(ev: &Event) -> Self {
        Self {
            kind: ev.kind,
            attempt: ev.attempt,
            attempts: ev.attempts,
            delay_ms: ev.delay_ms,
            reason: ev.reason.as_deref().map(str::to_owned),
        }
    }
}

impl Notice {
    /// Rebuilds a local event for `instance`, stamped with this process's sequence.
    pub fn into_event(self, instance: Arc<str>) -> Event {
        let mut ev = Event::new(self.kind).with_task(instance);
        ev.attempt = self.attempt;
        ev.attempts = self.attempts;
        ev.delay_ms = self.delay_ms;
        ev.reason = self.reason.map(Arc::from);
        ev
    }
}

/// Writing end of a worker pipe.
#[derive(Debug)]
pub struct PipeSender<T> {
    file: File,
    _marker: PhantomData<fn(T)>,
}

/// Reading end of a worker pipe.
#[derive(Debug)]
pub struct PipeReceiver<T> {
    fd: OwnedFd,
    _marker: PhantomData<fn() -> T>,
}

/// Opens an anonymous pipe for one worker.
pub fn pipe<T>() -> io::Result<(PipeSender<T>, PipeReceiver<T>)> {
    let (read, write) = nix::unistd::pipe()?;
    Ok((
        PipeSender {
            file: File::from(write),
            _marker: PhantomData,
        },
        PipeReceiver {
            fd: read,
            _marker: PhantomData,
        },
    ))
}

impl<T: Serialize> PipeSender<T> {
    /// Writes one message as a single line.
    ///
    /// Blocking; intended for the worker side, which has no async runtime.
    pub fn send(&self, msg: &Message<T>) -> io::Result<()> {
        let mut line = serde_json::to_vec(msg)?;
        line.push(b'\n');
        (&self.file).write_all(&line)
    }
}

impl<T: DeserializeOwned> PipeReceiver<T> {
    /// Reads messages until the outcome or end-of-file, handing every notice to `on_notice`.
    ///
    /// Blocking; run it on a dedicated thread.
    pub fn drain(self, mut on_notice: impl FnMut(Notice)) -> io::Result<Option<Outcome<T>>> {
        let reader = BufReader::new(File::from(self.fd));
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Message<T>>(&line)? {
                Message::Event(notice) => on_notice(notice),
                Message::Outcome(outcome) => return Ok(Some(outcome)),
            }
        }
        Ok(None)
    }
}
