//! Highlighter - composition of index, renderer, registry and cursor
//!
//! One [`Highlighter`] owns one document. Passes run strictly one after
//! another: each pass pulls hits in increasing offset order, resolves them
//! against the live index, wraps them, and registers the result before the
//! next hit is resolved. Running two passes interleaved is not supported.

use crate::config::Config;
use crate::cursor::{Cursor, CursorEvent, CursorHost, CursorState, Reveal};
use crate::dom::{to_html, Document, NodeId, DOCUMENT_NODE};
use crate::error::{Error, Result};
use crate::events::ListenerId;
use crate::index::TextIndex;
use crate::matching::{
    resolve, scan_parallel, Finder, Hit, HitList, MatchSource, Pattern, PatternCache,
};
use crate::registry::{Highlight, HighlightId, Registry, RegistryEvent};
use crate::render::{ClassDecorator, Decorator, Renderer};

/// The parts the cursor reaches through [`CursorHost`]
struct Stage {
    doc: Document,
    registry: Registry,
    decorator: Box<dyn Decorator>,
}

impl CursorHost for Stage {
    fn count_matching(&self, filter: Option<&[String]>) -> usize {
        self.registry.count_matching(filter)
    }

    fn find_at(&self, index: usize, filter: Option<&[String]>) -> Option<HighlightId> {
        self.registry.find_at(index, filter).map(|h| h.id)
    }

    fn activate(&mut self, id: HighlightId) {
        if let Some(highlight) = self.registry.get(id) {
            self.decorator.set_active(&mut self.doc, highlight);
        }
    }

    fn deactivate(&mut self, id: HighlightId) {
        if let Some(highlight) = self.registry.get(id) {
            self.decorator.set_inactive(&mut self.doc, highlight);
        }
    }
}

pub struct Highlighter {
    config: Config,
    root: NodeId,
    stage: Stage,
    index: TextIndex,
    cursor: Cursor,
    renderer: Renderer,
    patterns: PatternCache,
}

impl Highlighter {
    /// Index a whole document
    pub fn new(doc: Document, config: Config) -> Result<Self> {
        let mut highlighter = Highlighter {
            root: DOCUMENT_NODE,
            stage: Stage {
                doc,
                registry: Registry::new(),
                decorator: Box::new(ClassDecorator::new(&config)),
            },
            index: TextIndex::new(&config),
            cursor: Cursor::new(),
            renderer: Renderer::new(&config),
            patterns: PatternCache::new(config.pattern_cache_size),
            config,
        };
        highlighter.rebuild()?;
        Ok(highlighter)
    }

    /// Parse markup and index it
    pub fn parse(input: &[u8], config: Config) -> Result<Self> {
        Self::new(Document::parse(input), config)
    }

    /// Restrict indexing to the subtree at `root`
    pub fn with_root(mut self, root: NodeId) -> Result<Self> {
        if self.stage.doc.get_node(root).is_none() {
            return Err(Error::UnknownNode(root));
        }
        self.root = root;
        self.rebuild()?;
        Ok(self)
    }

    pub fn with_decorator(mut self, decorator: impl Decorator + 'static) -> Self {
        self.stage.decorator = Box::new(decorator);
        self
    }

    // ------------------------------------------------------------------
    // Passes
    // ------------------------------------------------------------------

    /// Run one highlight pass over a match source
    ///
    /// A pass either applies completely or not at all: when any hit fails,
    /// the highlights it already created are unwrapped and the error is
    /// returned.
    pub fn highlight<S: MatchSource>(&mut self, query: &str, source: S) -> Result<Vec<HighlightId>> {
        let mut created = Vec::new();
        if let Err(err) = self.run_pass(query, source, &mut created) {
            return Err(self.abort(query, err, &created));
        }
        self.cursor.update(&self.stage, false);

        tracing::debug!(
            target: "rustymark::search",
            query,
            highlights = created.len(),
            "highlight pass finished"
        );
        Ok(created)
    }

    fn run_pass<S: MatchSource>(
        &mut self,
        query: &str,
        source: S,
        created: &mut Vec<HighlightId>,
    ) -> Result<()> {
        let mut finder = Finder::new(source);
        while let Some(range) = finder.next_range(&self.index)? {
            let id = self.stage.registry.next_id();
            let highlight = self.renderer.surround(
                &mut self.stage.doc,
                &mut self.index,
                &range,
                id,
                query,
                self.stage.decorator.as_mut(),
            )?;
            if highlight.elements.is_empty() {
                tracing::trace!(
                    target: "rustymark::search",
                    offset = range.start_offset(),
                    "hit covers only hidden text"
                );
                continue;
            }
            self.stage.registry.insert(highlight);
            created.push(id);
        }
        Ok(())
    }

    /// Undo `created` after a failed pass; returns the error to report
    fn abort(&mut self, query: &str, err: Error, created: &[HighlightId]) -> Error {
        tracing::warn!(
            target: "rustymark::search",
            query,
            %err,
            undone = created.len(),
            "highlight pass failed"
        );
        let reported = match self.roll_back(created) {
            Ok(()) => err,
            Err(rollback) => rollback,
        };
        self.cursor.update(&self.stage, false);
        reported
    }

    /// Unregister `created` and unwrap every wrapper no highlight owns
    fn roll_back(&mut self, created: &[HighlightId]) -> Result<()> {
        self.stage.registry.remove_ids(created);
        let strays =
            self.renderer
                .orphaned_wrappers(&self.stage.doc, self.root, &self.stage.registry);
        for wrapper in strays {
            self.stage.doc.unwrap(wrapper)?;
        }
        self.tidy()
    }

    /// Search the flattened text with a pattern
    pub fn search(&mut self, query: &str, pattern: &Pattern) -> Result<Vec<HighlightId>> {
        let source = pattern.source_over(self.index.snapshot(), &mut self.patterns)?;
        self.highlight(query, source)
    }

    /// Scan for several patterns in parallel, then apply them in order
    ///
    /// All patterns see the same snapshot; the passes are applied one by one
    /// because wrapping does not move global offsets.
    pub fn search_many(
        &mut self,
        queries: &[(String, Pattern)],
    ) -> Result<Vec<(String, Vec<HighlightId>)>> {
        let regexes = queries
            .iter()
            .map(|(_, pattern)| self.patterns.get_or_compile(pattern))
            .collect::<Result<Vec<_>>>()?;
        let snapshot = self.index.snapshot();
        let scans = scan_parallel(&snapshot, &regexes);

        // A failing query also undoes the queries applied before it
        let mut results = Vec::with_capacity(queries.len());
        let mut created = Vec::new();
        for ((query, _), hits) in queries.iter().zip(scans) {
            let before = created.len();
            if let Err(err) = self.run_pass(query, HitList::new(hits), &mut created) {
                return Err(self.abort(query, err, &created));
            }
            results.push((query.clone(), created[before..].to_vec()));
        }
        self.cursor.update(&self.stage, false);
        Ok(results)
    }

    /// Highlight externally supplied offsets (any order)
    ///
    /// Every hit is resolved before the first one is applied.
    pub fn highlight_hits(&mut self, query: &str, hits: Vec<Hit>) -> Result<Vec<HighlightId>> {
        for &hit in &hits {
            resolve(&self.index, hit)?;
        }
        self.highlight(query, HitList::sorted(hits))
    }

    /// Unwrap every highlight of a query; returns how many were removed
    pub fn remove_query(&mut self, query: &str) -> Result<usize> {
        let removed = self.stage.registry.remove_group(query).unwrap_or_default();
        self.unwrap_all(&removed)?;
        Ok(removed.len())
    }

    /// Unwrap every highlight
    pub fn remove_all(&mut self) -> Result<usize> {
        let removed = self.stage.registry.clear();
        self.unwrap_all(&removed)?;
        Ok(removed.len())
    }

    fn unwrap_all(&mut self, removed: &[Highlight]) -> Result<()> {
        for highlight in removed {
            self.renderer.unwrap(&mut self.stage.doc, highlight)?;
        }
        self.tidy()?;
        self.cursor.clear(&mut self.stage);
        Ok(())
    }

    /// Merge split text, drop detached nodes from the arena and reindex
    ///
    /// Compaction renumbers nodes; ids obtained from [`Self::document`]
    /// before a removal are not valid afterwards. It is skipped while the
    /// root is detached so the indexed subtree survives.
    fn tidy(&mut self) -> Result<()> {
        self.stage.doc.normalize(self.root);
        if self.stage.doc.is_attached(self.root) {
            let remap = self.stage.doc.compact();
            self.stage.registry.remap_nodes(&remap);
            if let Some(root) = remap.get(self.root as usize).copied().flatten() {
                self.root = root;
            }
        }
        self.rebuild()
    }

    /// Rebuild the index from the current tree
    pub fn rebuild(&mut self) -> Result<()> {
        self.index.parse(&self.stage.doc, self.root)
    }

    /// Mutate the document directly, then rebuild the index
    ///
    /// Highlights whose wrappers the mutation removes stay registered.
    pub fn edit_document<F, T>(&mut self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> T,
    {
        let value = edit(&mut self.stage.doc);
        self.rebuild()?;
        self.cursor.update(&self.stage, false);
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    pub fn next(&mut self, reveal: Option<&mut dyn Reveal>) -> Result<bool> {
        self.cursor.next(&mut self.stage, reveal)
    }

    pub fn prev(&mut self, reveal: Option<&mut dyn Reveal>) -> Result<bool> {
        self.cursor.prev(&mut self.stage, reveal)
    }

    pub fn set_cursor(&mut self, index: isize, reveal: Option<&mut dyn Reveal>) -> Result<bool> {
        self.cursor.set(&mut self.stage, index, false, reveal)
    }

    pub fn set_iterable_queries(&mut self, names: Option<Vec<String>>) {
        self.cursor.set_iterable_queries(&mut self.stage, names);
    }

    pub fn clear_cursor(&mut self) {
        self.cursor.clear(&mut self.stage);
    }

    pub fn cursor_state(&self) -> CursorState {
        self.cursor.state()
    }

    pub fn subscribe_cursor<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&CursorEvent) + Send + 'static,
    {
        self.cursor.subscribe(callback)
    }

    pub fn subscribe_registry<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&RegistryEvent) + Send + 'static,
    {
        self.stage.registry.subscribe(callback)
    }

    /// Re-apply decoration to one highlight; false if it does not exist
    pub fn redecorate(&mut self, id: HighlightId) -> bool {
        let Stage {
            doc,
            registry,
            decorator,
        } = &mut self.stage;
        let Some(highlight) = registry.get(id) else {
            return false;
        };
        self.renderer.decorate(doc, highlight, decorator.as_mut());
        if self.cursor.active() == Some(id) {
            decorator.set_active(doc, highlight);
        }
        true
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document(&self) -> &Document {
        &self.stage.doc
    }

    pub fn index(&self) -> &TextIndex {
        &self.index
    }

    pub fn registry(&self) -> &Registry {
        &self.stage.registry
    }

    pub fn flattened_text(&self) -> &str {
        self.index.text()
    }

    /// Text currently inside a highlight's wrappers
    pub fn highlight_text(&self, id: HighlightId) -> Option<String> {
        let highlight = self.stage.registry.get(id)?;
        Some(
            highlight
                .elements
                .iter()
                .map(|&element| self.stage.doc.text(element))
                .collect(),
        )
    }

    pub fn to_html(&self) -> String {
        to_html(&self.stage.doc, DOCUMENT_NODE)
    }
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("root", &self.root)
            .field("markers", &self.index.len())
            .field("highlights", &self.stage.registry.len())
            .field("cursor", &self.cursor.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn highlighter(input: &str) -> Highlighter {
        Highlighter::parse(input.as_bytes(), Config::default().with_consistency_checks(true))
            .unwrap()
    }

    fn wrappers(h: &Highlighter) -> Vec<NodeId> {
        let renderer = Renderer::new(h.config());
        h.document()
            .descendants(DOCUMENT_NODE)
            .filter(|&id| renderer.is_wrapper(h.document(), id))
            .collect()
    }

    #[test]
    fn test_match_across_hidden_script() {
        let mut h = highlighter("<div>Positive <script>ignored</script> match</div>");
        let pattern = Pattern::regex(r"positive\s+match").case_insensitive(true);
        let ids = h.search("q", &pattern).unwrap();

        assert_eq!(ids.len(), 1);
        let highlight = h.registry().get(ids[0]).unwrap();
        assert_eq!(highlight.elements.len(), 2);
        assert_eq!(h.highlight_text(ids[0]).unwrap(), "Positive  match");
        assert!(h.to_html().contains("<script>ignored</script>"));
        assert_eq!(wrappers(&h).len(), 2);
    }

    #[test]
    fn test_hidden_text_masked_in_flattened_text() {
        let mut h = highlighter("<p>Hello <script>x();</script>world</p>");
        assert_eq!(h.flattened_text(), "Hello     world");

        let pattern = Pattern::literal("Hello world").whitespace_tolerant(true);
        let ids = h.search("q", &pattern).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(h.highlight_text(ids[0]).unwrap(), "Hello world");
        // No search can land inside the script body
        assert!(h.search("s", &Pattern::literal("x()")).unwrap().is_empty());
    }

    #[test]
    fn test_three_node_range() {
        let mut h = highlighter("<p>ab<b>cd</b>ef</p>");
        let ids = h.search("q", &Pattern::literal("bcde")).unwrap();
        let highlight = h.registry().get(ids[0]).unwrap();
        assert_eq!(highlight.elements.len(), 3);
        assert_eq!(h.highlight_text(ids[0]).unwrap(), "bcde");
        assert_eq!(wrappers(&h), highlight.elements);
    }

    #[test]
    fn test_redecorate_is_idempotent() {
        let mut h = highlighter("<p>one two one</p>");
        let ids = h.search("q", &Pattern::literal("one")).unwrap();
        assert_eq!(ids.len(), 2);
        let before = h.to_html();
        let wrappers_before = wrappers(&h);

        assert!(h.redecorate(ids[1]));
        assert_eq!(h.to_html(), before);
        assert_eq!(wrappers(&h), wrappers_before);
        assert!(!h.redecorate(HighlightId(99)));
    }

    #[test]
    fn test_cursor_navigation_toggles_active_class() {
        let mut h = highlighter("<p>a b a b a</p>");
        h.search("a", &Pattern::literal("a")).unwrap();
        assert_eq!(h.cursor_state().total, 3);

        assert!(h.next(None).unwrap());
        assert_eq!(h.to_html().matches("highlight highlight-active").count(), 1);

        h.set_cursor(2, None).unwrap();
        assert!(h.next(None).unwrap());
        assert_eq!(h.cursor_state().index, Some(0));
        assert!(h.prev(None).unwrap());
        assert_eq!(h.cursor_state().index, Some(2));
        assert_eq!(h.to_html().matches("highlight-active").count(), 1);

        h.clear_cursor();
        assert_eq!(h.to_html().matches("highlight-active").count(), 0);
        assert_eq!(h.set_cursor(-2, None), Err(Error::NegativeCursorIndex(-2)));
    }

    #[test]
    fn test_iterable_queries_filter() {
        let mut h = highlighter("<p>a b a b b</p>");
        let a = h.search("A", &Pattern::literal("a")).unwrap();
        h.search("B", &Pattern::literal("b")).unwrap();

        h.set_iterable_queries(Some(vec!["A".to_string()]));
        assert_eq!(h.cursor_state().total, 2);
        let mut visited = Vec::new();
        for _ in 0..3 {
            h.next(None).unwrap();
            visited.push(h.cursor_state().active.unwrap());
        }
        assert_eq!(visited, vec![a[0], a[1], a[0]]);
    }

    #[test]
    fn test_remove_query_restores_markup() {
        let input = "<p>alpha beta alpha</p>";
        let mut h = highlighter(input);
        h.search("alpha", &Pattern::literal("alpha")).unwrap();
        h.search("beta", &Pattern::literal("beta")).unwrap();
        h.next(None).unwrap();

        assert_eq!(h.remove_query("alpha").unwrap(), 2);
        assert_eq!(h.registry().len(), 1);
        assert_eq!(h.cursor_state().index, None);
        assert_eq!(h.cursor_state().total, 1);
        assert!(h.index().check_contiguity(h.document()).is_ok());

        assert_eq!(h.remove_all().unwrap(), 1);
        assert_eq!(h.to_html(), input);
        assert_eq!(h.index().len(), 1);
        assert_eq!(h.remove_query("missing").unwrap(), 0);
    }

    #[test]
    fn test_search_many_applies_each_query() {
        let mut h = highlighter("<p>red green blue green</p>");
        let results = h
            .search_many(&[
                ("g".to_string(), Pattern::literal("green")),
                ("b".to_string(), Pattern::literal("BLUE").case_insensitive(true)),
            ])
            .unwrap();
        assert_eq!(results[0].1.len(), 2);
        assert_eq!(results[1].1.len(), 1);
        assert_eq!(h.highlight_text(results[1].1[0]).unwrap(), "blue");
        assert_eq!(h.registry().group_names().collect::<Vec<_>>(), vec!["g", "b"]);
    }

    #[test]
    fn test_highlight_hits_sorted_and_validated() {
        let mut h = highlighter("<p>abcdefgh</p>");
        let ids = h
            .highlight_hits("ext", vec![Hit::new(6, 2), Hit::new(0, 2)])
            .unwrap();
        assert_eq!(h.highlight_text(ids[0]).unwrap(), "ab");
        assert_eq!(h.highlight_text(ids[1]).unwrap(), "gh");

        let err = h.highlight_hits("bad", vec![Hit::new(3, 0)]).unwrap_err();
        assert_eq!(err, Error::EmptyHit { offset: 3 });
        let err = h.highlight_hits("bad", vec![Hit::new(7, 5)]).unwrap_err();
        assert!(matches!(err, Error::OffsetOutOfRange { .. }));
    }

    #[test]
    fn test_edit_document_rebuilds() {
        let mut h = highlighter("<p>abc</p>");
        h.edit_document(|doc| {
            let p = doc.root_element_id().unwrap();
            let extra = doc.create_text("def");
            doc.append_child(p, extra)
        })
        .unwrap()
        .unwrap();
        assert_eq!(h.flattened_text(), "abcdef");
        assert_eq!(h.search("q", &Pattern::literal("cd")).unwrap().len(), 1);
    }

    #[test]
    fn test_with_root_limits_scope() {
        let doc = Document::parse(b"<div><p>keep</p><p>skip keep</p></div>");
        let div = doc.root_element_id().unwrap();
        let first_p = doc.children(div).next().unwrap();
        let mut h = Highlighter::new(doc, Config::default())
            .unwrap()
            .with_root(first_p)
            .unwrap();
        assert_eq!(h.flattened_text(), "keep");
        assert_eq!(h.search("q", &Pattern::literal("keep")).unwrap().len(), 1);
        assert!(h.with_root(9999).is_err());
    }

    #[test]
    fn test_events_reach_subscribers() {
        let mut h = highlighter("<p>x y x</p>");
        let cursor_events = Arc::new(Mutex::new(Vec::new()));
        let registry_events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&cursor_events);
        h.subscribe_cursor(move |e| sink.lock().unwrap().push(e.clone()));
        let sink = Arc::clone(&registry_events);
        h.subscribe_registry(move |e| sink.lock().unwrap().push(e.clone()));

        h.search("x", &Pattern::literal("x")).unwrap();
        h.next(None).unwrap();

        assert_eq!(registry_events.lock().unwrap().len(), 2);
        assert_eq!(
            *cursor_events.lock().unwrap(),
            vec![
                CursorEvent::Update { index: None, total: 2 },
                CursorEvent::Update { index: Some(0), total: 2 },
            ]
        );
    }

    #[test]
    fn test_failed_pass_is_rolled_back() {
        let input = "<p>abcdefgh</p>";
        let mut h = highlighter(input);
        let err = h
            .highlight_hits("bad", vec![Hit::new(0, 2), Hit::new(7, 5)])
            .unwrap_err();
        assert!(matches!(err, Error::OffsetOutOfRange { .. }));
        assert!(h.registry().is_empty());
        assert_eq!(h.to_html(), input);

        let kept = h.search("q", &Pattern::literal("cd")).unwrap();
        let err = h
            .highlight("bad", HitList::new(vec![Hit::new(0, 2), Hit::new(7, 5)]))
            .unwrap_err();
        assert!(matches!(err, Error::OffsetOutOfRange { .. }));
        assert_eq!(h.registry().len(), 1);
        assert_eq!(wrappers(&h), h.registry().get(kept[0]).unwrap().elements);
        assert_eq!(h.highlight_text(kept[0]).unwrap(), "cd");
        assert_eq!(h.cursor_state().total, 1);
        assert!(h.index().check_contiguity(h.document()).is_ok());
    }

    #[test]
    fn test_search_many_invalid_pattern_applies_nothing() {
        let input = "<p>red green</p>";
        let mut h = highlighter(input);
        h.search_many(&[
            ("g".to_string(), Pattern::literal("green")),
            ("bad".to_string(), Pattern::regex("(")),
        ])
        .unwrap_err();
        assert!(h.registry().is_empty());
        assert_eq!(h.to_html(), input);
    }

    #[test]
    fn test_search_remove_cycles_keep_arena_bounded() {
        let input = "<p>alpha beta alpha</p>";
        let mut h = highlighter(input);
        let nodes = h.document().node_count();
        let strings = h.document().strings.len();
        for _ in 0..50 {
            assert_eq!(h.search("q", &Pattern::literal("alpha")).unwrap().len(), 2);
            h.next(None).unwrap();
            assert_eq!(h.remove_query("q").unwrap(), 2);
        }
        assert_eq!(h.document().node_count(), nodes);
        assert!(h.document().strings.len() <= strings);
        assert_eq!(h.to_html(), input);
    }

    #[test]
    fn test_remove_keeps_other_queries_usable() {
        let mut h = highlighter("<p>one two one two</p>");
        let two = h.search("two", &Pattern::literal("two")).unwrap();
        h.search("one", &Pattern::literal("one")).unwrap();
        h.remove_query("one").unwrap();

        assert_eq!(wrappers(&h), {
            let mut all: Vec<_> = two
                .iter()
                .flat_map(|&id| h.registry().get(id).unwrap().elements.clone())
                .collect();
            all.sort();
            all
        });
        assert!(h.next(None).unwrap());
        assert_eq!(h.to_html().matches("highlight-active").count(), 1);
    }

    #[test]
    fn test_edit_document_recounts_cursor() {
        let mut h = highlighter("<p>x y x</p>");
        h.search("x", &Pattern::literal("x")).unwrap();
        h.edit_document(|doc| {
            let p = doc.root_element_id().unwrap();
            let extra = doc.create_text(" z");
            doc.append_child(p, extra)
        })
        .unwrap()
        .unwrap();
        assert_eq!(h.cursor_state().total, h.registry().len());
        assert!(h.prev(None).unwrap());
        assert_eq!(h.cursor_state().index, Some(1));
    }
}

