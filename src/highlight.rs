use crate::node::{Element, Node};
use crate::theme::{css_color, palette_from_theme};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::debug;

/// Turns source text into `pre > code > span.line` trees. The syntax set is
/// loaded once and shared by every block and theme.
pub struct Highlighter {
    syntax_set: SyntaxSet,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// One `span.line` per source line, each holding one `span` per run of
    /// equally styled text. Unknown languages render as plain text.
    pub fn highlight_block(&self, code: &str, lang: &str, theme: &Theme) -> Element {
        let syntax = find_syntax(&self.syntax_set, lang).unwrap_or_else(|| {
            debug!("no syntax for `{lang}`, highlighting as plain text");
            self.syntax_set.find_syntax_plain_text()
        });
        let mut highlighter = HighlightLines::new(syntax, theme);

        let mut code_el = Element::new("code");
        let mut lines = LinesWithEndings::from(code).peekable();
        if lines.peek().is_none() {
            code_el.children.push(line_element(Vec::new()).into());
        }
        for (i, line) in lines.enumerate() {
            if i > 0 {
                code_el.children.push(Node::text("\n"));
            }
            let ranges = match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(r) => r,
                Err(err) => {
                    debug!("highlighting failed, keeping line unstyled: {err}");
                    vec![(Style::default(), line)]
                }
            };
            code_el.children.push(line_element(token_spans(&ranges)).into());
        }
        // A final newline opens one more, empty, line.
        if code.ends_with('\n') {
            code_el.children.push(Node::text("\n"));
            code_el.children.push(line_element(Vec::new()).into());
        }

        pre_element(theme).with_child(code_el)
    }

    /// A block holding `code` as a single span in `color`, used for inline
    /// code that names a theme token instead of a language.
    pub fn token_block(&self, code: &str, color: Option<&str>, theme: &Theme) -> Element {
        let color = color.unwrap_or("inherit");
        let span = Element::new("span")
            .with_property("style", format!("color:{color}"))
            .with_child(code);
        pre_element(theme).with_child(Element::new("code").with_child(span))
    }
}

fn pre_element(theme: &Theme) -> Element {
    let style = palette_from_theme(theme).style();
    let mut pre = Element::new("pre");
    if !style.is_empty() {
        pre.set_property("style", style);
    }
    pre
}

fn line_element(tokens: Vec<Node>) -> Element {
    Element::new("span")
        .with_property("class", "line")
        .with_children(tokens)
}

/// Adjacent ranges that map to the same CSS are merged into one span.
fn token_spans(ranges: &[(Style, &str)]) -> Vec<Node> {
    let mut out: Vec<(String, String)> = Vec::new();
    for (style, text) in ranges {
        let text = text.trim_end_matches(['\n', '\r']);
        if text.is_empty() {
            continue;
        }
        let css = token_css(*style);
        match out.last_mut() {
            Some((last_css, last_text)) if *last_css == css => last_text.push_str(text),
            _ => out.push((css, text.to_string())),
        }
    }
    out.into_iter()
        .map(|(css, text)| {
            Element::new("span")
                .with_property("style", css)
                .with_child(text)
                .into()
        })
        .collect()
}

fn token_css(style: Style) -> String {
    let mut css = format!("color:{}", css_color(style.foreground));
    if style.font_style.contains(FontStyle::BOLD) {
        css.push_str(";font-weight:bold");
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        css.push_str(";font-style:italic");
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        css.push_str(";text-decoration:underline");
    }
    css
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, lang: &str) -> Option<&'a SyntaxReference> {
    let lang = lang.trim();
    if lang.is_empty() {
        return None;
    }
    let token = lang.strip_prefix("language-").unwrap_or(lang);
    for cand in language_candidates(token) {
        if let Some(syntax) = syntax_set.find_syntax_by_token(&cand) {
            return Some(syntax);
        }
        if let Some(syntax) = syntax_set.find_syntax_by_extension(&cand) {
            return Some(syntax);
        }
    }
    None
}

fn language_candidates(lang: &str) -> Vec<String> {
    let mut out = Vec::new();
    let lower = lang.to_ascii_lowercase();
    match lower.as_str() {
        "txt" | "text" | "plaintext" | "plain" => out.push("Plain Text".to_string()),
        "ts" | "typescript" | "tsx" => out.push("js".to_string()),
        "sh" | "shell" | "zsh" | "console" => out.push("bash".to_string()),
        "elixir" | "ex" | "exs" => {
            out.push("Elixir".to_string());
            out.push("ex".to_string());
        }
        _ => {}
    }
    out.push(lang.to_string());
    if lower != lang {
        out.push(lower);
    }
    out
}
