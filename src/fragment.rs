use crate::meta::LineNumbers;
use crate::node::{Element, Node};

pub const FRAGMENT: &str = "data-pretty-code-fragment";
pub const TITLE: &str = "data-pretty-code-title";
pub const CAPTION: &str = "data-pretty-code-caption";
pub const LINE_NUMBERS: &str = "data-line-numbers";
pub const LINE_NUMBERS_MAX_DIGITS: &str = "data-line-numbers-max-digits";

/// A highlighted `pre` tree for one theme mode.
#[derive(Debug, Clone)]
pub struct ModeTree {
    pub mode: String,
    pub pre: Element,
}

#[derive(Debug, Clone, Default)]
pub struct BlockOptions<'a> {
    pub lang: &'a str,
    pub title: Option<&'a str>,
    pub caption: Option<&'a str>,
    pub keep_background: bool,
    pub line_numbers: Option<LineNumbers>,
    pub line_count: usize,
}

/// `div[data-pretty-code-fragment]` holding, per mode, an optional title,
/// the `pre` and an optional caption.
pub fn block_fragment(trees: Vec<ModeTree>, options: &BlockOptions<'_>) -> Element {
    let mut children = Vec::new();
    for ModeTree { mode, mut pre } in trees {
        pre.remove_property("class");
        if !options.keep_background {
            pre.properties.clear();
        }
        tag_mode(&mut pre, options.lang, &mode);

        if let Some(code) = pre.find_mut("code") {
            tag_mode(code, options.lang, &mode);
            if let Some(numbers) = options.line_numbers {
                number_lines(code, numbers, options.line_count);
            }
        }

        if let Some(title) = options.title {
            children.push(label(TITLE, title, options.lang, &mode));
        }
        children.push(pre.into());
        if let Some(caption) = options.caption {
            children.push(label(CAPTION, caption, options.lang, &mode));
        }
    }

    Element::new("div")
        .with_property(FRAGMENT, "")
        .with_children(children)
}

/// `span[data-pretty-code-fragment]` holding one `code` per mode.
pub fn inline_fragment(trees: Vec<ModeTree>, lang: &str, keep_background: bool) -> Element {
    let mut children = Vec::new();
    for ModeTree { mode, pre } in trees {
        let style = pre.property("style").map(str::to_string);
        let code = pre.children.into_iter().find_map(|child| match child {
            Node::Element(el) if el.tag == "code" => Some(el),
            _ => None,
        });
        let Some(mut code) = code else {
            continue;
        };
        tag_mode(&mut code, lang, &mode);
        if keep_background {
            if let Some(style) = style {
                code.set_property("style", style);
            }
        }
        children.push(code.into());
    }

    Element::new("span")
        .with_property(FRAGMENT, "")
        .with_children(children)
}

fn tag_mode(element: &mut Element, lang: &str, mode: &str) {
    element.set_property("data-language", lang);
    element.set_property("data-theme", mode);
}

fn label(kind: &str, text: &str, lang: &str, mode: &str) -> Node {
    let mut div = Element::new("div").with_property(kind, "").with_child(text);
    tag_mode(&mut div, lang, mode);
    div.into()
}

/// Flags the block for CSS line counters. The counter is offset when
/// numbering does not start at 1; the digit count sizes the gutter.
fn number_lines(code: &mut Element, numbers: LineNumbers, line_count: usize) {
    code.set_property(LINE_NUMBERS, "");
    let offset = numbers.start.saturating_sub(1);
    if offset > 0 {
        code.set_property("style", format!("counter-set: line {offset};"));
    }
    let last = offset + line_count.max(1);
    code.set_property(LINE_NUMBERS_MAX_DIGITS, last.to_string().len().to_string());
}

#[cfg(test)]
mod tests {
    use super::{
        block_fragment, inline_fragment, BlockOptions, ModeTree, CAPTION, FRAGMENT, LINE_NUMBERS,
        LINE_NUMBERS_MAX_DIGITS, TITLE,
    };
    use crate::meta::LineNumbers;
    use crate::node::{Element, Node};

    fn pre(text: &str) -> Element {
        Element::new("pre")
            .with_property("style", "background-color:#000")
            .with_property("class", "syntect")
            .with_child(Element::new("code").with_child(text))
    }

    fn tree(mode: &str) -> ModeTree {
        ModeTree {
            mode: mode.to_string(),
            pre: pre("x"),
        }
    }

    #[test]
    fn block_fragment_orders_title_pre_caption_per_mode() {
        let options = BlockOptions {
            lang: "rust",
            title: Some("main.rs"),
            caption: Some("Entry point"),
            ..BlockOptions::default()
        };
        let fragment = block_fragment(vec![tree("dark"), tree("light")], &options);

        assert!(fragment.has_property(FRAGMENT));
        let kinds: Vec<(String, String)> = fragment
            .children
            .iter()
            .filter_map(Node::as_element)
            .map(|el| {
                let kind = if el.has_property(TITLE) {
                    "title"
                } else if el.has_property(CAPTION) {
                    "caption"
                } else {
                    el.tag.as_str()
                };
                (kind.to_string(), el.property("data-theme").unwrap_or_default().to_string())
            })
            .collect();
        let expected: Vec<(String, String)> = [
            ("title", "dark"),
            ("pre", "dark"),
            ("caption", "dark"),
            ("title", "light"),
            ("pre", "light"),
            ("caption", "light"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
        assert_eq!(kinds, expected);
    }

    #[test]
    fn background_is_dropped_unless_kept() {
        let dropped = block_fragment(vec![tree("default")], &BlockOptions::default());
        let pre = dropped.children[0].as_element().expect("pre");
        assert!(!pre.has_property("style"));
        assert!(!pre.has_property("class"));
        assert_eq!(pre.property("data-theme"), Some("default"));

        let options = BlockOptions {
            keep_background: true,
            ..BlockOptions::default()
        };
        let kept = block_fragment(vec![tree("default")], &options);
        let pre = kept.children[0].as_element().expect("pre");
        assert_eq!(pre.property("style"), Some("background-color:#000"));
        assert!(!pre.has_property("class"));
    }

    #[test]
    fn line_numbers_set_counter_and_digits() {
        let options = BlockOptions {
            lang: "rust",
            line_numbers: Some(LineNumbers { start: 98 }),
            line_count: 3,
            ..BlockOptions::default()
        };
        let fragment = block_fragment(vec![tree("default")], &options);
        let pre = fragment.children[0].as_element().expect("pre");
        let code = pre.children[0].as_element().expect("code");
        assert!(code.has_property(LINE_NUMBERS));
        assert_eq!(code.property("style"), Some("counter-set: line 97;"));
        assert_eq!(code.property(LINE_NUMBERS_MAX_DIGITS), Some("3"));
        assert_eq!(code.property("data-language"), Some("rust"));
    }

    #[test]
    fn numbering_from_one_needs_no_counter_reset() {
        let options = BlockOptions {
            line_numbers: Some(LineNumbers::default()),
            line_count: 9,
            ..BlockOptions::default()
        };
        let fragment = block_fragment(vec![tree("default")], &options);
        let pre = fragment.children[0].as_element().expect("pre");
        let code = pre.children[0].as_element().expect("code");
        assert!(!code.has_property("style"));
        assert_eq!(code.property(LINE_NUMBERS_MAX_DIGITS), Some("1"));
    }

    #[test]
    fn inline_fragment_keeps_code_elements_only() {
        let fragment = inline_fragment(vec![tree("dark")], "rust", true);
        assert_eq!(fragment.tag, "span");
        let code = fragment.children[0].as_element().expect("code");
        assert_eq!(code.tag, "code");
        assert_eq!(code.property("style"), Some("background-color:#000"));
        assert_eq!(code.property("data-theme"), Some("dark"));
        assert_eq!(code.text(), "x");

        let plain = inline_fragment(vec![tree("dark")], ".token", false);
        let code = plain.children[0].as_element().expect("code");
        assert!(!code.has_property("style"));
        assert_eq!(code.property("data-language"), Some(".token"));
    }
}
