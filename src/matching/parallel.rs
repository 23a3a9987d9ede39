//! Parallel pattern scanning
//!
//! Uses Rayon to scan one flattened-text snapshot with many regexes at
//! once. Scanning only reads the snapshot; the resulting hit lists are
//! applied to the tree one pass at a time afterwards.

use super::sources::RegexSource;
use super::{Hit, MatchSource};
use rayon::prelude::*;
use regex::Regex;
use std::sync::Arc;

/// Collect the hits of every regex over `text`, one list per regex
pub fn scan_parallel(text: &Arc<str>, regexes: &[Arc<Regex>]) -> Vec<Vec<Hit>> {
    regexes
        .par_iter()
        .map(|regex| {
            let mut source = RegexSource::new(Arc::clone(text), Arc::clone(regex));
            std::iter::from_fn(|| source.next_hit()).collect()
        })
        .collect()
}
