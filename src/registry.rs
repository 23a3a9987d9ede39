//! Highlight Registry
//!
//! Highlights grouped by query name. Groups keep creation order and so do
//! the highlights inside them; the registry's virtual index addresses the
//! concatenation of the selected groups in that order.

use crate::dom::NodeId;
use crate::events::{ListenerId, Listeners};
use crate::matching::Range;

/// Stable highlight identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HighlightId(pub u64);

impl std::fmt::Display for HighlightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rendered range and the wrapper elements that realize it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub id: HighlightId,
    pub query: String,
    pub range: Range,
    /// Wrapper elements in document order
    pub elements: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Added { query: String, id: HighlightId },
    Removed { query: String, count: usize },
}

#[derive(Debug, Default)]
pub struct Registry {
    groups: Vec<(String, Vec<Highlight>)>,
    next_id: u64,
    listeners: Listeners<RegistryEvent>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next highlight id
    pub fn next_id(&mut self) -> HighlightId {
        let id = HighlightId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a highlight to the end of its query group
    pub fn insert(&mut self, highlight: Highlight) -> HighlightId {
        let id = highlight.id;
        let query = highlight.query.clone();
        match self.groups.iter_mut().find(|(name, _)| *name == query) {
            Some((_, group)) => group.push(highlight),
            None => self.groups.push((query.clone(), vec![highlight])),
        }
        self.listeners.emit(&RegistryEvent::Added { query, id });
        id
    }

    pub fn get(&self, id: HighlightId) -> Option<&Highlight> {
        self.iter().find(|h| h.id == id)
    }

    /// Highlights of one query, in creation order
    pub fn group(&self, query: &str) -> Option<&[Highlight]> {
        self.groups
            .iter()
            .find(|(name, _)| name == query)
            .map(|(_, group)| group.as_slice())
    }

    /// Remove a whole query group
    pub fn remove_group(&mut self, query: &str) -> Option<Vec<Highlight>> {
        let pos = self.groups.iter().position(|(name, _)| name == query)?;
        let (query, removed) = self.groups.remove(pos);
        self.listeners.emit(&RegistryEvent::Removed {
            query,
            count: removed.len(),
        });
        Some(removed)
    }

    /// Remove every group
    pub fn clear(&mut self) -> Vec<Highlight> {
        let groups = std::mem::take(&mut self.groups);
        let mut removed = Vec::new();
        for (query, group) in groups {
            self.listeners.emit(&RegistryEvent::Removed {
                query,
                count: group.len(),
            });
            removed.extend(group);
        }
        removed
    }

    /// Remove individual highlights; emptied groups are dropped
    pub fn remove_ids(&mut self, ids: &[HighlightId]) -> Vec<Highlight> {
        let mut removed = Vec::new();
        for (query, group) in &mut self.groups {
            let before = removed.len();
            let (gone, kept): (Vec<_>, Vec<_>) =
                group.drain(..).partition(|h| ids.contains(&h.id));
            *group = kept;
            removed.extend(gone);
            if removed.len() > before {
                self.listeners.emit(&RegistryEvent::Removed {
                    query: query.clone(),
                    count: removed.len() - before,
                });
            }
        }
        self.groups.retain(|(_, group)| !group.is_empty());
        removed
    }

    /// Rewrite held node ids after the document was compacted
    ///
    /// Wrappers that no longer exist are dropped from their highlight.
    pub fn remap_nodes(&mut self, remap: &[Option<NodeId>]) {
        let lookup = |id: NodeId| remap.get(id as usize).copied().flatten();
        for highlight in self.groups.iter_mut().flat_map(|(_, group)| group.iter_mut()) {
            highlight.elements = highlight.elements.iter().filter_map(|&id| lookup(id)).collect();
            for descriptor in [&mut highlight.range.start, &mut highlight.range.end] {
                if let Some(node) = lookup(descriptor.marker.node) {
                    descriptor.marker.node = node;
                }
            }
        }
    }

    fn selected<'a>(
        &'a self,
        filter: Option<&'a [String]>,
    ) -> impl Iterator<Item = &'a Vec<Highlight>> + 'a {
        self.groups
            .iter()
            .filter(move |(name, _)| filter.map_or(true, |names| names.contains(name)))
            .map(|(_, group)| group)
    }

    /// Number of highlights in the selected groups (all groups when None)
    pub fn count_matching(&self, filter: Option<&[String]>) -> usize {
        self.selected(filter).map(Vec::len).sum()
    }

    /// Highlight at a virtual index over the selected groups
    pub fn find_at<'a>(&'a self, index: usize, filter: Option<&'a [String]>) -> Option<&'a Highlight> {
        let mut remaining = index;
        for group in self.selected(filter) {
            if remaining < group.len() {
                return group.get(remaining);
            }
            remaining -= group.len();
        }
        None
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// All highlights, group by group
    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.groups.iter().flat_map(|(_, group)| group.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, group)| group.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|(_, group)| group.is_empty())
    }

    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&RegistryEvent) + Send + 'static,
    {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
