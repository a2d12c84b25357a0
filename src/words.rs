use crate::lines::Visitor;
use crate::node::{split_child, Element, Node};
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use tracing::{debug, trace};

/// Set on the element that carries a highlighted occurrence.
pub const HIGHLIGHTED_CHARS: &str = "data-highlighted-chars";
/// Marks an element as finished; its text is never matched again.
pub const WRAPPER: &str = "data-chars-wrapper";
pub const CHARS_ID: &str = "data-chars-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpec {
    pub pattern: String,
    /// 1-based block-wide occurrence numbers to highlight; empty means all.
    pub occurrences: BTreeSet<usize>,
    pub id: Option<String>,
}

impl WordSpec {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            occurrences: BTreeSet::new(),
            id: None,
        }
    }

    pub fn with_occurrences(mut self, occurrences: impl IntoIterator<Item = usize>) -> Self {
        self.occurrences = occurrences.into_iter().collect();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn wants(&self, occurrence: usize) -> bool {
        self.occurrences.is_empty() || self.occurrences.contains(&occurrence)
    }
}

/// Occurrence counters for one highlighted tree, keyed by pattern and the
/// word's position in the word list. Create a fresh one per tree.
#[derive(Debug, Default)]
pub struct OccurrenceContext {
    counters: HashMap<(String, usize), usize>,
}

impl OccurrenceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more occurrence and returns its 1-based number.
    pub fn next(&mut self, pattern: &str, index: usize) -> usize {
        let counter = self
            .counters
            .entry((pattern.to_string(), index))
            .or_insert(0);
        *counter += 1;
        *counter
    }
}

/// Highlights every word of `words` in `line`, in list order. Text claimed by
/// an earlier word is not available to later ones.
pub fn highlight_words<V: Visitor + ?Sized>(
    line: &mut Element,
    words: &[WordSpec],
    context: &mut OccurrenceContext,
    visitor: &mut V,
) {
    for (index, word) in words.iter().enumerate() {
        if word.pattern.is_empty() {
            continue;
        }
        highlight_word(line, word, index, context, visitor);
    }
}

fn highlight_word<V: Visitor + ?Sized>(
    line: &mut Element,
    word: &WordSpec,
    index: usize,
    context: &mut OccurrenceContext,
    visitor: &mut V,
) {
    let layout = LineLayout::of(line);
    let found = layout.find(&word.pattern);
    if found.is_empty() {
        return;
    }

    // Numbers are assigned in document order before anything moves; offsets
    // stay valid because splitting and wrapping never change the line text.
    let scan: Vec<(Range<usize>, bool)> = found
        .into_iter()
        .map(|range| {
            let occurrence = context.next(&word.pattern, index);
            (range, word.wants(occurrence))
        })
        .collect();

    // Filtered-out occurrences are still split at their edges, only the
    // wrapping is skipped.
    for (range, wanted) in scan {
        let Some(matched) = resolve(line, range.clone()) else {
            debug!(
                pattern = %word.pattern,
                start = range.start,
                end = range.end,
                "match did not resolve to any node; skipping rest of line"
            );
            return;
        };
        if wanted {
            wrap(line, matched, word, visitor);
        }
    }
}

/// Children of a line with their offsets into the line's full text.
struct LineLayout {
    text: String,
    segments: Vec<Segment>,
}

struct Segment {
    index: usize,
    range: Range<usize>,
    wrapped: bool,
}

impl LineLayout {
    fn of(line: &Element) -> Self {
        let mut text = String::new();
        let mut segments = Vec::with_capacity(line.children.len());
        for (index, child) in line.children.iter().enumerate() {
            let start = text.len();
            text.push_str(&child.to_text());
            segments.push(Segment {
                index,
                range: start..text.len(),
                wrapped: is_wrapper(child),
            });
        }
        Self { text, segments }
    }

    /// Maximal stretches of text not covered by an earlier highlight.
    fn runs(&self) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut current: Option<Range<usize>> = None;
        for segment in &self.segments {
            if segment.wrapped {
                if let Some(run) = current.take() {
                    runs.push(run);
                }
                continue;
            }
            match current.as_mut() {
                Some(run) => run.end = segment.range.end,
                None => current = Some(segment.range.clone()),
            }
        }
        runs.extend(current);
        runs
    }

    /// Leftmost-first, non-overlapping matches of `pattern` within each run.
    fn find(&self, pattern: &str) -> Vec<Range<usize>> {
        let mut out = Vec::new();
        for run in self.runs() {
            let hay = &self.text[run.clone()];
            for (offset, _) in hay.match_indices(pattern) {
                let start = run.start + offset;
                out.push(start..start + pattern.len());
            }
        }
        out
    }

    /// The unwrapped child whose text contains byte `offset`.
    fn segment_at(&self, offset: usize) -> Option<&Segment> {
        self.segments
            .iter()
            .find(|s| !s.wrapped && s.range.contains(&offset))
    }
}

fn is_wrapper(node: &Node) -> bool {
    node.as_element().is_some_and(|el| el.has_property(WRAPPER))
}

/// Splits the children at the edges of `range` and returns the indices of
/// the children that now make up the match exactly.
fn resolve(line: &mut Element, range: Range<usize>) -> Option<Range<usize>> {
    if range.is_empty() {
        return None;
    }
    let layout = LineLayout::of(line);
    let (first, first_start) = layout
        .segment_at(range.start)
        .map(|s| (s.index, s.range.start))?;
    let (last, last_start) = layout
        .segment_at(range.end - 1)
        .map(|s| (s.index, s.range.start))?;
    if (first..=last).any(|i| layout.segments[i].wrapped) {
        return None;
    }

    // Tail first so the head split does not shift it.
    split_child(&mut line.children, last, range.end - last_start);
    if split_child(&mut line.children, first, range.start - first_start) {
        return Some(first + 1..last + 2);
    }
    Some(first..last + 1)
}

fn wrap<V: Visitor + ?Sized>(
    line: &mut Element,
    matched: Range<usize>,
    word: &WordSpec,
    visitor: &mut V,
) {
    let at = matched.start;
    let single_element = matched.len() == 1
        && matches!(line.children.get(at), Some(Node::Element(_)));

    if !single_element {
        let nodes: Vec<Node> = line.children.drain(matched).collect();
        line.children
            .insert(at, Element::new("span").with_children(nodes).into());
    }

    if let Some(Node::Element(el)) = line.children.get_mut(at) {
        el.set_property(HIGHLIGHTED_CHARS, "");
        el.set_property(WRAPPER, "");
        if let Some(id) = &word.id {
            el.set_property(CHARS_ID, id.as_str());
        }
        trace!(text = %el.text(), id = ?word.id, "highlighted occurrence");
        visitor.visit_highlighted_word(el, word.id.as_deref());
    }
}
