//! Elixir Term Conversion Utilities
//!
//! Converts engine state to Elixir terms and decodes option maps.

use crate::config::Config;
use crate::cursor::{CursorEvent, CursorState};
use crate::matching::Pattern;
use crate::registry::{Highlight, HighlightId};
use rustler::types::atom::nil;
use rustler::{Decoder, Encoder, Env, NewBinary, NifResult, Term};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    clear,
    set_iterable,
    update,
    // highlight and cursor maps
    id,
    query,
    start,
    end,
    text,
    wrappers,
    index,
    total,
    iterable_queries,
    active,
    // search options
    regex,
    case_insensitive,
    whitespace_tolerant,
    // parse options
    hidden_tags,
    wrapper_tag,
    marker_attribute,
    query_attribute,
    class_name,
    active_class,
    pattern_cache_size,
    consistency_checks,
}

/// `{:ok, value}`
pub fn ok_tuple<'a>(env: Env<'a>, value: impl Encoder) -> Term<'a> {
    (ok(), value).encode(env)
}

/// `{:error, message}`
pub fn error_tuple<'a>(env: Env<'a>, message: impl std::fmt::Display) -> Term<'a> {
    (error(), message.to_string()).encode(env)
}

/// Convert a cursor event to `:clear`, `{:set_iterable, names | nil}` or
/// `{:update, index | nil, total}`
pub fn cursor_event_to_term<'a>(env: Env<'a>, event: &CursorEvent) -> Term<'a> {
    match event {
        CursorEvent::Clear => clear().encode(env),
        CursorEvent::SetIterable(names) => (set_iterable(), names).encode(env),
        CursorEvent::Update { index, total } => (update(), *index, *total).encode(env),
    }
}

pub fn cursor_events_to_term<'a>(env: Env<'a>, events: &[CursorEvent]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for event in events.iter().rev() {
        list = list.list_prepend(cursor_event_to_term(env, event));
    }
    list
}

pub fn cursor_state_to_term<'a>(env: Env<'a>, state: &CursorState) -> NifResult<Term<'a>> {
    let pairs = [
        (index().encode(env), state.index.encode(env)),
        (total().encode(env), state.total.encode(env)),
        (iterable_queries().encode(env), state.iterable_queries.encode(env)),
        (active().encode(env), state.active.map(|id| id.0).encode(env)),
    ];
    Term::map_from_pairs(env, &pairs)
}

/// Convert a highlight to `%{id, query, start, end, text, wrappers}`
///
/// `start` and `end` are global byte offsets; `end` is exclusive.
pub fn highlight_to_term<'a>(env: Env<'a>, highlight: &Highlight, content: &str) -> NifResult<Term<'a>> {
    let pairs = [
        (id().encode(env), highlight.id.0.encode(env)),
        (query().encode(env), str_to_binary(env, &highlight.query)),
        (start().encode(env), highlight.range.start_offset().encode(env)),
        (end().encode(env), highlight.range.end_offset().encode(env)),
        (text().encode(env), str_to_binary(env, content)),
        (wrappers().encode(env), highlight.elements.len().encode(env)),
    ];
    Term::map_from_pairs(env, &pairs)
}

pub fn ids_to_term<'a>(env: Env<'a>, ids: &[HighlightId]) -> Term<'a> {
    ids.iter().map(|id| id.0).collect::<Vec<_>>().encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

// ============================================================================
// Option maps
// ============================================================================

fn is_nil(term: Term<'_>) -> bool {
    term.decode::<rustler::Atom>().is_ok_and(|atom| atom == nil())
}

/// Look up an optional key; absent keys and `nil` both yield `None`
fn option<'a, T: Decoder<'a>>(opts: Term<'a>, key: rustler::Atom) -> NifResult<Option<T>> {
    if is_nil(opts) {
        return Ok(None);
    }
    if !opts.is_map() {
        return Err(rustler::Error::BadArg);
    }
    match opts.map_get(key) {
        Ok(value) if is_nil(value) => Ok(None),
        Ok(value) => value.decode().map(Some),
        Err(_) => Ok(None),
    }
}

/// Build a pattern from `%{regex: bool, case_insensitive: bool, whitespace_tolerant: bool}`
pub fn decode_pattern<'a>(source: &str, opts: Term<'a>) -> NifResult<Pattern> {
    let is_regex = option::<bool>(opts, regex())?.unwrap_or(false);
    let pattern = if is_regex {
        Pattern::regex(source)
    } else {
        Pattern::literal(source)
    };
    Ok(pattern
        .case_insensitive(option(opts, case_insensitive())?.unwrap_or(false))
        .whitespace_tolerant(option(opts, whitespace_tolerant())?.unwrap_or(false)))
}

/// Build a config from a parse option map; unknown keys are ignored
pub fn decode_config<'a>(opts: Term<'a>) -> NifResult<Config> {
    let mut config = Config::default();
    if let Some(tags) = option::<Vec<String>>(opts, hidden_tags())? {
        config = config.with_hidden_tags(tags);
    }
    if let Some(tag) = option::<String>(opts, wrapper_tag())? {
        config = config.with_wrapper_tag(tag);
    }
    if let Some(attr) = option(opts, marker_attribute())? {
        config.marker_attribute = attr;
    }
    if let Some(attr) = option(opts, query_attribute())? {
        config.query_attribute = attr;
    }
    if let Some(class) = option(opts, class_name())? {
        config.class_name = class;
    }
    if let Some(class) = option(opts, active_class())? {
        config.active_class = class;
    }
    if let Some(size) = option(opts, pattern_cache_size())? {
        config.pattern_cache_size = size;
    }
    if let Some(enabled) = option(opts, consistency_checks())? {
        config = config.with_consistency_checks(enabled);
    }
    Ok(config)
}
