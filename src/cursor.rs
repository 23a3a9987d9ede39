//! Cursor - navigation over the registry's filtered view
//!
//! Two states: unset (`index == None`) and positioned
//! (`Some(i)` with `i < total`). The index is a virtual position into the
//! filtered ordering and is re-resolved against the host on every move.
//! Misses are never errors: moves report whether they happened, and
//! running off the end wraps to the first position with one bounded retry.

use crate::error::{Error, Result};
use crate::events::{ListenerId, Listeners};
use crate::registry::HighlightId;

/// What the cursor navigates: an ordered, filterable highlight view plus
/// the active/inactive decoration hooks
pub trait CursorHost {
    fn count_matching(&self, filter: Option<&[String]>) -> usize;

    fn find_at(&self, index: usize, filter: Option<&[String]>) -> Option<HighlightId>;

    fn activate(&mut self, id: HighlightId);

    fn deactivate(&mut self, id: HighlightId);
}

/// Bring a highlight into view (scrolling, paging, ...)
pub trait Reveal {
    fn in_view(&self, id: HighlightId) -> bool;

    fn reveal(&mut self, id: HighlightId) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorEvent {
    Clear,
    SetIterable(Option<Vec<String>>),
    Update { index: Option<usize>, total: usize },
}

/// Snapshot of the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    pub index: Option<usize>,
    pub total: usize,
    pub iterable_queries: Option<Vec<String>>,
    pub active: Option<HighlightId>,
}

#[derive(Debug, Default)]
pub struct Cursor {
    index: Option<usize>,
    total: usize,
    iterable: Option<Vec<String>>,
    active: Option<HighlightId>,
    listeners: Listeners<CursorEvent>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn active(&self) -> Option<HighlightId> {
        self.active
    }

    pub fn iterable_queries(&self) -> Option<&[String]> {
        self.iterable.as_deref()
    }

    pub fn state(&self) -> CursorState {
        CursorState {
            index: self.index,
            total: self.total,
            iterable_queries: self.iterable.clone(),
            active: self.active,
        }
    }

    /// Replace the group filter (None = all groups), then clear
    pub fn set_iterable_queries(&mut self, host: &mut dyn CursorHost, names: Option<Vec<String>>) {
        self.iterable = names;
        self.listeners
            .emit(&CursorEvent::SetIterable(self.iterable.clone()));
        self.clear(host);
    }

    /// Deactivate the active highlight and return to the unset state
    pub fn clear(&mut self, host: &mut dyn CursorHost) {
        if let Some(active) = self.active.take() {
            host.deactivate(active);
        }
        self.index = None;
        self.total = host.count_matching(self.iterable.as_deref());
        tracing::trace!(target: "rustymark::cursor", total = self.total, "cursor cleared");
        self.listeners.emit(&CursorEvent::Clear);
    }

    /// Recount; notify when the total changed or `force` is set
    pub fn update(&mut self, host: &dyn CursorHost, force: bool) {
        let total = host.count_matching(self.iterable.as_deref());
        let changed = total != self.total;
        self.total = total;
        if changed || force {
            self.listeners.emit(&CursorEvent::Update {
                index: self.index,
                total,
            });
        }
    }

    /// Move to a virtual index; returns whether the position changed
    ///
    /// `wrapped` marks a call that is already the wraparound retry: when
    /// it is false and `index` resolves to nothing, the move is retried
    /// once at index 0. Activation runs even when the resolved index is the
    /// current one. A failing reveal is logged and otherwise ignored.
    pub fn set(
        &mut self,
        host: &mut dyn CursorHost,
        index: isize,
        wrapped: bool,
        reveal: Option<&mut dyn Reveal>,
    ) -> Result<bool> {
        if index < 0 {
            return Err(Error::NegativeCursorIndex(index));
        }

        let mut target = index as usize;
        let mut wrapped = wrapped;
        let id = loop {
            match host.find_at(target, self.iterable.as_deref()) {
                Some(id) => break id,
                None if !wrapped => {
                    wrapped = true;
                    target = 0;
                }
                None => return Ok(false),
            }
        };

        if let Some(previous) = self.active.take() {
            host.deactivate(previous);
        }
        host.activate(id);
        self.active = Some(id);

        if let Some(reveal) = reveal {
            if !reveal.in_view(id) {
                if let Err(err) = reveal.reveal(id) {
                    tracing::warn!(target: "rustymark::cursor", id = id.0, %err, "reveal failed");
                }
            }
        }

        if self.index == Some(target) {
            return Ok(false);
        }
        self.index = Some(target);
        tracing::trace!(target: "rustymark::cursor", index = target, total = self.total, "cursor moved");
        self.listeners.emit(&CursorEvent::Update {
            index: self.index,
            total: self.total,
        });
        Ok(true)
    }

    /// Step back, wrapping from the first position to the last
    pub fn prev(&mut self, host: &mut dyn CursorHost, reveal: Option<&mut dyn Reveal>) -> Result<bool> {
        if self.total == 0 {
            return Ok(false);
        }
        let from = match self.index {
            Some(i) if i >= 1 => i,
            _ => self.total,
        };
        self.set(host, (from - 1) as isize, false, reveal)
    }

    /// Step forward; running off the end wraps through the retry in `set`
    pub fn next(&mut self, host: &mut dyn CursorHost, reveal: Option<&mut dyn Reveal>) -> Result<bool> {
        let to = self.index.map_or(0, |i| i + 1);
        self.set(host, to as isize, false, reveal)
    }

    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&CursorEvent) + Send + 'static,
    {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
