//! Capture of GPU register writes.
//!
//! A [`TraceRecorder`] is shared between the emulated hardware, which reports every register write
//! through [`TraceRecorder::record`], and a debugger, which brackets a capture with
//! [`TraceRecorder::start`] and [`TraceRecorder::finish`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A single register write.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Write {
    id: u32,
    value: u32,
}

impl Write {
    pub fn new(id: u32, value: u32) -> Self {
        Self { id, value }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Register writes captured during one session, in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PicaTrace {
    pub writes: Vec<Write>,
}

impl PicaTrace {
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Write> {
        self.writes.iter()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    #[error("register tracing is already running")]
    AlreadyActive,

    #[error("register tracing is not running")]
    NotActive,
}

/// Receives every register write performed by the emulated GPU.
pub trait RegisterWriteObserver {
    fn on_register_write(&self, id: u32, value: u32);
}

/// Records register writes while a session is active.
///
/// The session lives behind a mutex; no session means idle. `active` mirrors whether a session
/// exists so that [`record`](Self::record) can return without locking when idle. It is only
/// written while the lock is held, and `record` re-checks the session under the lock.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    active: AtomicBool,
    session: Mutex<Option<PicaTrace>>,
}

impl TraceRecorder {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            session: Mutex::new(None),
        }
    }

    fn session(&self) -> MutexGuard<'_, Option<PicaTrace>> {
        self.session.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::warn!("trace session lock is poisoned");
            poisoned.into_inner()
        })
    }

    /// Begins a new session. Fails without touching the running session if there is one.
    pub fn start(&self) -> Result<(), TraceError> {
        let mut session = self.session();
        if session.is_some() {
            tracing::error!("start requested while register tracing is already running");
            return Err(TraceError::AlreadyActive);
        }
        *session = Some(PicaTrace::default());
        self.active.store(true, Ordering::Release);
        tracing::debug!("started register tracing");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Appends a write to the running session. Does nothing when idle.
    pub fn record(&self, id: u32, value: u32) {
        if !self.is_active() {
            return;
        }

        let mut session = self.session();
        let Some(trace) = session.as_mut() else {
            return;
        };
        tracing::trace!(id, value, "register write");
        trace.writes.push(Write::new(id, value));
    }

    /// Ends the running session and hands over everything it captured.
    pub fn finish(&self) -> Result<PicaTrace, TraceError> {
        let mut session = self.session();
        let Some(trace) = session.take() else {
            tracing::error!("finish requested while register tracing is not running");
            return Err(TraceError::NotActive);
        };
        self.active.store(false, Ordering::Release);
        tracing::debug!(writes = trace.len(), "finished register tracing");
        Ok(trace)
    }
}

impl RegisterWriteObserver for TraceRecorder {
    fn on_register_write(&self, id: u32, value: u32) {
        self.record(id, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_only_while_active() {
        let recorder = TraceRecorder::new();
        recorder.record(0x10, 1);
        recorder.start().unwrap();
        recorder.record(0x11, 2);
        recorder.on_register_write(0x12, 3);
        let trace = recorder.finish().unwrap();
        recorder.record(0x13, 4);

        assert_eq!(trace.writes, vec![Write::new(0x11, 2), Write::new(0x12, 3)]);
        assert!(!recorder.is_active());
    }

    #[test]
    fn second_start_keeps_running_session() {
        let recorder = TraceRecorder::new();
        recorder.start().unwrap();
        recorder.record(1, 1);
        assert_eq!(recorder.start(), Err(TraceError::AlreadyActive));
        assert!(recorder.is_active());
        recorder.record(2, 2);

        let trace = recorder.finish().unwrap();
        assert_eq!(trace.len(), 2);
    }

    #[test]
    fn second_finish_reports_not_active() {
        let recorder = TraceRecorder::new();
        assert_eq!(recorder.finish(), Err(TraceError::NotActive));
        recorder.start().unwrap();
        assert!(recorder.finish().unwrap().is_empty());
        assert_eq!(recorder.finish(), Err(TraceError::NotActive));
    }

    #[test]
    fn sessions_do_not_share_writes() {
        let recorder = TraceRecorder::new();
        recorder.start().unwrap();
        recorder.record(1, 1);
        recorder.finish().unwrap();

        recorder.start().unwrap();
        recorder.record(2, 2);
        let trace = recorder.finish().unwrap();
        assert_eq!(trace.iter().map(Write::id).collect::<Vec<_>>(), vec![2]);
    }
}
