//! RustyMark - in-document search highlighting
//!
//! Parses HTML into an arena tree, flattens its rendered text into a
//! byte-offset index and wraps search hits in marker elements. A cursor
//! walks the resulting highlights.
//!
//! Layers:
//! - dom / reader: markup parsing, mutable tree, serialization
//! - index: flattened text and node markers
//! - matching: hit sources, patterns, range resolution
//! - render / registry / cursor: wrapping, bookkeeping, navigation
//! - highlighter: composition of the above; the NIFs below drive it

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};

pub mod config;
pub mod core;
pub mod cursor;
pub mod dom;
pub mod error;
pub mod events;
pub mod highlighter;
pub mod index;
pub mod matching;
pub mod reader;
pub mod registry;
pub mod render;
mod resource;
mod term;

use config::Config;
use highlighter::Highlighter;
use matching::{Hit, Pattern};
use resource::{HighlighterRef, HighlighterResource};
use term::{
    cursor_events_to_term, cursor_state_to_term, decode_config, decode_pattern, error_tuple,
    highlight_to_term, ids_to_term, ok_tuple, str_to_binary,
};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    /// Counts live bytes on top of the underlying allocator
    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let live = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(live, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

#[cfg(feature = "memory_tracking")]
use std::sync::atomic::Ordering;

/// Live bytes allocated by the NIF library
#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory() -> usize {
    tracking::ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
}

/// Reset the peak to the current usage; returns `{current, previous_peak}`
#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    (0, 0)
}

// ============================================================================
// Document NIFs
// ============================================================================

/// Fold a locked call into `{:ok, term}` / `{:error, message}`
fn respond<'a, T>(
    env: Env<'a>,
    result: Result<error::Result<T>, &'static str>,
    to_term: impl FnOnce(T) -> Term<'a>,
) -> Term<'a> {
    match result {
        Ok(Ok(value)) => ok_tuple(env, to_term(value)),
        Ok(Err(err)) => error_tuple(env, err),
        Err(lock) => error_tuple(env, lock),
    }
}

fn new_document<'a>(env: Env<'a>, input: Binary<'a>, config: Config) -> Term<'a> {
    match Highlighter::parse(input.as_slice(), config) {
        Ok(highlighter) => {
            let arc = ResourceArc::new(HighlighterResource::new(highlighter));
            ok_tuple(env, arc)
        }
        Err(err) => error_tuple(env, err),
    }
}

#[rustler::nif(schedule = "DirtyCpu")]
fn parse<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    Ok(new_document(env, input, Config::default()))
}

#[rustler::nif(schedule = "DirtyCpu")]
fn parse_with_options<'a>(env: Env<'a>, input: Binary<'a>, opts: Term<'a>) -> NifResult<Term<'a>> {
    let config = decode_config(opts)?;
    Ok(new_document(env, input, config))
}

#[rustler::nif(schedule = "DirtyCpu")]
fn search<'a>(
    env: Env<'a>,
    doc: HighlighterRef,
    query: &str,
    pattern: &str,
    opts: Term<'a>,
) -> NifResult<Term<'a>> {
    let pattern = decode_pattern(pattern, opts)?;
    let result = doc.with_highlighter(|h| h.search(query, &pattern));
    Ok(respond(env, result, |ids| ids_to_term(env, &ids)))
}

/// Scan all `{query, pattern}` pairs in parallel, then apply them in order
#[rustler::nif(schedule = "DirtyCpu")]
fn search_many<'a>(
    env: Env<'a>,
    doc: HighlighterRef,
    queries: Vec<(String, String)>,
    opts: Term<'a>,
) -> NifResult<Term<'a>> {
    let queries = queries
        .into_iter()
        .map(|(query, source)| Ok((query, decode_pattern(&source, opts)?)))
        .collect::<NifResult<Vec<(String, Pattern)>>>()?;
    let result = doc.with_highlighter(|h| h.search_many(&queries));
    Ok(respond(env, result, |groups| {
        let mut list = Term::list_new_empty(env);
        for (query, ids) in groups.iter().rev() {
            let entry = (str_to_binary(env, query), ids_to_term(env, ids));
            list = list.list_prepend(entry.encode(env));
        }
        list
    }))
}

/// Highlight caller-supplied `{offset, len}` pairs over the flattened text
#[rustler::nif(schedule = "DirtyCpu")]
fn highlight_ranges<'a>(
    env: Env<'a>,
    doc: HighlighterRef,
    query: &str,
    ranges: Vec<(usize, usize)>,
) -> NifResult<Term<'a>> {
    let hits = ranges
        .into_iter()
        .map(|(offset, len)| Hit::new(offset, len))
        .collect();
    let result = doc.with_highlighter(|h| h.highlight_hits(query, hits));
    Ok(respond(env, result, |ids| ids_to_term(env, &ids)))
}

#[rustler::nif(schedule = "DirtyCpu")]
fn remove_query<'a>(env: Env<'a>, doc: HighlighterRef, query: &str) -> NifResult<Term<'a>> {
    let result = doc.with_highlighter(|h| h.remove_query(query));
    Ok(respond(env, result, |count| count.encode(env)))
}

#[rustler::nif(schedule = "DirtyCpu")]
fn remove_all<'a>(env: Env<'a>, doc: HighlighterRef) -> NifResult<Term<'a>> {
    let result = doc.with_highlighter(|h| h.remove_all());
    Ok(respond(env, result, |count| count.encode(env)))
}

// ============================================================================
// Cursor NIFs
// ============================================================================

#[rustler::nif]
fn cursor_next<'a>(env: Env<'a>, doc: HighlighterRef) -> NifResult<Term<'a>> {
    let result = doc.with_highlighter(|h| h.next(None));
    Ok(respond(env, result, |moved| moved.encode(env)))
}

#[rustler::nif]
fn cursor_prev<'a>(env: Env<'a>, doc: HighlighterRef) -> NifResult<Term<'a>> {
    let result = doc.with_highlighter(|h| h.prev(None));
    Ok(respond(env, result, |moved| moved.encode(env)))
}

#[rustler::nif]
fn cursor_set<'a>(env: Env<'a>, doc: HighlighterRef, index: i64) -> NifResult<Term<'a>> {
    let index = isize::try_from(index).map_err(|_| rustler::Error::BadArg)?;
    let result = doc.with_highlighter(|h| h.set_cursor(index, None));
    Ok(respond(env, result, |moved| moved.encode(env)))
}

/// Restrict navigation to the named queries; `nil` iterates all
#[rustler::nif]
fn cursor_set_iterable<'a>(
    env: Env<'a>,
    doc: HighlighterRef,
    names: Option<Vec<String>>,
) -> NifResult<Term<'a>> {
    let result = doc.with_highlighter(|h| {
        h.set_iterable_queries(names);
        Ok(())
    });
    Ok(respond(env, result, |()| term::ok().encode(env)))
}

#[rustler::nif]
fn cursor_state<'a>(env: Env<'a>, doc: HighlighterRef) -> NifResult<Term<'a>> {
    match doc.with_highlighter(|h| h.cursor_state()) {
        Ok(state) => Ok(ok_tuple(env, cursor_state_to_term(env, &state)?)),
        Err(lock) => Ok(error_tuple(env, lock)),
    }
}

/// Drain up to `max` cursor events recorded since the last call
#[rustler::nif]
fn take_events<'a>(env: Env<'a>, doc: HighlighterRef, max: usize) -> NifResult<Term<'a>> {
    match doc.take_events(max) {
        Ok(events) => Ok(ok_tuple(env, cursor_events_to_term(env, &events))),
        Err(lock) => Ok(error_tuple(env, lock)),
    }
}

// ============================================================================
// Accessor NIFs
// ============================================================================

#[rustler::nif]
fn flattened_text<'a>(env: Env<'a>, doc: HighlighterRef) -> NifResult<Term<'a>> {
    match doc.with_highlighter(|h| str_to_binary(env, h.flattened_text())) {
        Ok(text) => Ok(ok_tuple(env, text)),
        Err(lock) => Ok(error_tuple(env, lock)),
    }
}

#[rustler::nif(schedule = "DirtyCpu")]
fn to_html<'a>(env: Env<'a>, doc: HighlighterRef) -> NifResult<Term<'a>> {
    match doc.with_highlighter(|h| h.to_html()) {
        Ok(html) => Ok(ok_tuple(env, str_to_binary(env, &html))),
        Err(lock) => Ok(error_tuple(env, lock)),
    }
}

/// Every highlight in navigation order (groups by creation, then offset)
#[rustler::nif(schedule = "DirtyCpu")]
fn highlights<'a>(env: Env<'a>, doc: HighlighterRef) -> NifResult<Term<'a>> {
    let listed = doc.with_highlighter(|h| {
        let mut terms = Vec::with_capacity(h.registry().len());
        for highlight in h.registry().iter() {
            let content = h.highlight_text(highlight.id).unwrap_or_default();
            terms.push(highlight_to_term(env, highlight, &content)?);
        }
        Ok(terms)
    });
    match listed {
        Ok(terms) => Ok(ok_tuple(env, terms?)),
        Err(lock) => Ok(error_tuple(env, lock)),
    }
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.RustyMark.Native");
