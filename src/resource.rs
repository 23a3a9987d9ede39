//! ResourceArc Wrappers
//!
//! Persistent highlighter state handed to BEAM callers. One mutex per
//! document serializes every call against it.

use crate::cursor::CursorEvent;
use crate::highlighter::Highlighter;
use rustler::ResourceArc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Cursor events kept for `take_events`; the oldest are dropped first
pub const EVENT_LOG_CAPACITY: usize = 1024;

/// Wrapper for a Highlighter that can be stored in a ResourceArc
pub struct HighlighterResource {
    inner: Mutex<Highlighter>,
    events: Arc<Mutex<VecDeque<CursorEvent>>>,
}

impl HighlighterResource {
    pub fn new(mut highlighter: Highlighter) -> Self {
        let events = Arc::new(Mutex::new(VecDeque::new()));
        let log = Arc::clone(&events);
        highlighter.subscribe_cursor(move |event: &CursorEvent| {
            if let Ok(mut log) = log.lock() {
                if log.len() == EVENT_LOG_CAPACITY {
                    log.pop_front();
                }
                log.push_back(event.clone());
            }
        });

        HighlighterResource {
            inner: Mutex::new(highlighter),
            events,
        }
    }

    /// Run `f` with exclusive access to the highlighter
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if a previous call panicked mid-mutation.
    pub fn with_highlighter<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&mut Highlighter) -> R,
    {
        let mut guard = self.inner.lock().map_err(|_| "mutex_poisoned")?;
        Ok(f(&mut guard))
    }

    /// Drain up to `max` recorded cursor events, oldest first
    pub fn take_events(&self, max: usize) -> Result<Vec<CursorEvent>, &'static str> {
        let mut log = self.events.lock().map_err(|_| "mutex_poisoned")?;
        let n = max.min(log.len());
        Ok(log.drain(..n).collect())
    }
}

#[rustler::resource_impl]
impl rustler::Resource for HighlighterResource {}

/// Type alias for the ResourceArc
pub type HighlighterRef = ResourceArc<HighlighterResource>;
