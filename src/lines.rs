use crate::node::{Element, Node};
use crate::words::{highlight_words, OccurrenceContext, WordSpec};
use std::collections::BTreeSet;

pub const HIGHLIGHTED_LINE: &str = "data-highlighted-line";

/// Hooks called while a code tree is annotated. Every method defaults to a
/// no-op.
pub trait Visitor {
    fn visit_line(&mut self, _line: &mut Element) {}

    fn visit_highlighted_line(&mut self, _line: &mut Element) {}

    fn visit_highlighted_word(&mut self, _element: &mut Element, _id: Option<&str>) {}
}

/// Keeps empty lines from collapsing and flags highlighted lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultVisitor;

impl Visitor for DefaultVisitor {
    fn visit_line(&mut self, line: &mut Element) {
        if line.children.is_empty() {
            line.children.push(Node::text(" "));
        }
    }

    fn visit_highlighted_line(&mut self, line: &mut Element) {
        line.set_property(HIGHLIGHTED_LINE, "");
    }
}

pub fn is_line(element: &Element) -> bool {
    element.classes().next() == Some("line")
}

/// Visits every line of `tree` in document order, calling the line hooks and
/// highlighting `words`. Occurrence numbering runs across the whole tree.
/// Returns the number of lines visited.
pub fn traverse_and_annotate<V: Visitor + ?Sized>(
    tree: &mut Element,
    highlighted_lines: &BTreeSet<usize>,
    words: &[WordSpec],
    visitor: &mut V,
) -> usize {
    let mut walk = Walk {
        highlighted_lines,
        words,
        context: OccurrenceContext::new(),
        line_number: 0,
    };
    walk.element(tree, visitor);
    walk.line_number
}

struct Walk<'a> {
    highlighted_lines: &'a BTreeSet<usize>,
    words: &'a [WordSpec],
    context: OccurrenceContext,
    line_number: usize,
}

impl Walk<'_> {
    fn element<V: Visitor + ?Sized>(&mut self, element: &mut Element, visitor: &mut V) {
        if is_line(element) {
            self.line(element, visitor);
            return;
        }
        for child in &mut element.children {
            if let Node::Element(child) = child {
                self.element(child, visitor);
            }
        }
    }

    fn line<V: Visitor + ?Sized>(&mut self, line: &mut Element, visitor: &mut V) {
        visitor.visit_line(line);
        self.line_number += 1;
        if self.highlighted_lines.contains(&self.line_number) {
            visitor.visit_highlighted_line(line);
        }
        highlight_words(line, self.words, &mut self.context, visitor);
    }
}

#[cfg(test)]
mod tests {
    use super::{is_line, traverse_and_annotate, DefaultVisitor, Visitor, HIGHLIGHTED_LINE};
    use crate::node::{Element, Node};
    use crate::words::{WordSpec, WRAPPER};
    use std::collections::BTreeSet;

    #[derive(Default)]
    struct Recorder {
        lines: Vec<String>,
        highlighted: Vec<String>,
        words: Vec<(String, Option<String>)>,
    }

    impl Visitor for Recorder {
        fn visit_line(&mut self, line: &mut Element) {
            self.lines.push(line.text());
        }

        fn visit_highlighted_line(&mut self, line: &mut Element) {
            self.highlighted.push(line.text());
        }

        fn visit_highlighted_word(&mut self, element: &mut Element, id: Option<&str>) {
            self.words.push((element.text(), id.map(str::to_string)));
        }
    }

    fn code_tree(lines: &[&[&str]]) -> Element {
        let mut code = Element::new("code");
        for (i, tokens) in lines.iter().enumerate() {
            if i > 0 {
                code.children.push(Node::text("\n"));
            }
            let line = Element::new("span")
                .with_property("class", "line")
                .with_children(tokens.iter().map(|t| {
                    Element::new("span")
                        .with_property("style", "color:#123456")
                        .with_child(*t)
                        .into()
                }));
            code.children.push(line.into());
        }
        Element::new("pre").with_child(code)
    }

    #[test]
    fn visits_lines_in_order_and_flags_highlighted_ones() {
        let mut tree = code_tree(&[&["a"], &[], &["c"]]);
        let mut recorder = Recorder::default();
        let highlighted: BTreeSet<usize> = [2, 3, 9].into_iter().collect();
        let count = traverse_and_annotate(&mut tree, &highlighted, &[], &mut recorder);

        assert_eq!(count, 3);
        assert_eq!(recorder.lines, vec!["a", "", "c"]);
        assert_eq!(recorder.highlighted, vec!["", "c"]);
    }

    #[test]
    fn occurrence_filter_counts_across_the_whole_block() {
        let mut tree = code_tree(&[&["let x", " = 1;"], &["x += x;"]]);
        let mut recorder = Recorder::default();
        let words = [WordSpec::new("x").with_occurrences([2]).with_id("second")];
        traverse_and_annotate(&mut tree, &BTreeSet::new(), &words, &mut recorder);

        assert_eq!(recorder.words, vec![("x".to_string(), Some("second".to_string()))]);
        let code = tree.children[0].as_element().expect("code");
        let second = code.children[2].as_element().expect("line");
        assert!(second.children[0].as_element().expect("token").has_property(WRAPPER));
    }

    #[test]
    fn fresh_traversals_restart_numbering() {
        let words = [WordSpec::new("a").with_occurrences([1])];
        for _ in 0..2 {
            let mut tree = code_tree(&[&["a a"]]);
            let mut recorder = Recorder::default();
            traverse_and_annotate(&mut tree, &BTreeSet::new(), &words, &mut recorder);
            assert_eq!(recorder.words.len(), 1);
        }
    }

    #[test]
    fn default_visitor_fills_empty_lines_and_marks_highlights() {
        let mut tree = code_tree(&[&["a"], &[]]);
        let highlighted: BTreeSet<usize> = [1].into_iter().collect();
        traverse_and_annotate(&mut tree, &highlighted, &[], &mut DefaultVisitor);

        let code = tree.children[0].as_element().expect("code");
        let first = code.children[0].as_element().expect("line");
        let second = code.children[2].as_element().expect("line");
        assert!(first.has_property(HIGHLIGHTED_LINE));
        assert!(!second.has_property(HIGHLIGHTED_LINE));
        assert_eq!(second.text(), " ");
    }

    #[test]
    fn line_is_detected_by_first_class() {
        assert!(is_line(&Element::new("span").with_property("class", "line highlighted")));
        assert!(!is_line(&Element::new("span").with_property("class", "token line")));
        assert!(!is_line(&Element::new("span")));
    }
}
