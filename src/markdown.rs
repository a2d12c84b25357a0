use crate::html::{element_to_html, text_to_html};
use crate::render::Renderer;
use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::borrow::Cow;
use std::fmt::Write as _;

const STYLESHEET: &str = r#"
body { max-width: 52rem; margin: 2rem auto; padding: 0 1rem; font-family: system-ui, sans-serif; line-height: 1.5; }
pre { padding: 0.75rem 0; overflow-x: auto; border-radius: 6px; }
pre > code { display: grid; font-size: 0.875rem; }
code .line { padding: 0 1rem; }
code .line[data-highlighted-line] { background: rgba(200, 200, 255, 0.12); border-left: 2px solid #8fa1b3; }
[data-highlighted-chars] { background: rgba(200, 200, 255, 0.2); border-radius: 3px; padding: 0 2px; }
code[data-line-numbers] { counter-reset: line; }
code[data-line-numbers] > .line::before {
  counter-increment: line; content: counter(line);
  display: inline-block; width: 1.5rem; margin-right: 1rem; text-align: right; color: gray;
}
code[data-line-numbers-max-digits="2"] > .line::before { width: 2rem; }
code[data-line-numbers-max-digits="3"] > .line::before { width: 3rem; }
[data-pretty-code-title] { font-family: monospace; font-size: 0.8rem; opacity: 0.8; }
[data-pretty-code-caption] { font-size: 0.8rem; opacity: 0.8; }
@media (prefers-color-scheme: dark) { [data-theme="light"] { display: none; } }
@media (prefers-color-scheme: light) { [data-theme="dark"] { display: none; } }
"#;

/// Markdown to HTML with every fenced or indented code block, and every
/// inline code span carrying a `{:lang}` suffix, highlighted by `renderer`.
pub fn render_markdown(input: &str, renderer: &Renderer) -> Result<String> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let normalized = normalize_line_endings(input);
    let parser = Parser::new_ext(normalized.as_ref(), options);

    let mut events: Vec<Event<'_>> = Vec::new();
    let mut code_block: Option<CodeBlock> = None;
    let mut blocks = 0usize;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => code_block = Some(CodeBlock::new(kind)),
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = code_block.take() {
                    let fragment =
                        renderer.render_block(block.language.as_deref(), &block.meta, &block.text);
                    events.push(Event::Html(CowStr::from(element_to_html(&fragment))));
                    blocks += 1;
                }
            }
            Event::Text(text) if code_block.is_some() => {
                if let Some(block) = code_block.as_mut() {
                    block.text.push_str(&text);
                }
            }
            Event::Code(text) => events.push(inline_code(text, renderer)),
            other => events.push(other),
        }
    }
    tracing::debug!(blocks, "rendered markdown document");

    let mut out = String::with_capacity(normalized.len() * 2);
    html::push_html(&mut out, events.into_iter());
    Ok(out)
}

/// Inline code with a `{:...}` suffix becomes inline HTML inside its
/// paragraph; anything else stays a code span.
fn inline_code<'a>(text: CowStr<'a>, renderer: &Renderer) -> Event<'a> {
    match renderer.render_inline(&text) {
        Some(fragment) => Event::InlineHtml(CowStr::from(element_to_html(&fragment))),
        None => Event::Code(text),
    }
}

/// Wraps a rendered body in a standalone page with the highlight styles.
pub fn page(title: &str, body: &str) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLESHEET}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        text_to_html(title)
    );
    out
}

fn normalize_line_endings(input: &str) -> Cow<'_, str> {
    if input.contains('\r') {
        Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(input)
    }
}

struct CodeBlock {
    language: Option<String>,
    meta: String,
    text: String,
}

impl CodeBlock {
    /// Fenced info strings are `lang meta...`; indented blocks have neither.
    fn new(kind: CodeBlockKind) -> Self {
        let (language, meta) = match kind {
            CodeBlockKind::Fenced(info) => {
                let info = info.trim();
                match info.split_once(char::is_whitespace) {
                    Some((lang, meta)) => (Some(lang.to_string()), meta.trim().to_string()),
                    None if info.is_empty() => (None, String::new()),
                    None => (Some(info.to_string()), String::new()),
                }
            }
            CodeBlockKind::Indented => (None, String::new()),
        };
        Self {
            language,
            meta,
            text: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{inline_code, normalize_line_endings, page, render_markdown, CodeBlock};
    use crate::render::tests::{renderer, test_config};
    use pulldown_cmark::{CodeBlockKind, CowStr, Event};
    use std::borrow::Cow;

    #[test]
    fn normalize_line_endings_preserves_lf_input() {
        let input = "a\nb\n";
        let normalized = normalize_line_endings(input);
        assert!(matches!(normalized, Cow::Borrowed(_)));
        assert_eq!(normalized.as_ref(), input);
    }

    #[test]
    fn normalize_line_endings_converts_crlf_and_cr() {
        let input = "a\r\nb\rc\r\n";
        let normalized = normalize_line_endings(input);
        assert_eq!(normalized.as_ref(), "a\nb\nc\n");
    }

    #[test]
    fn info_string_splits_language_and_meta() {
        let block = CodeBlock::new(CodeBlockKind::Fenced(CowStr::from(
            "rust  title=\"a.rs\" {1}",
        )));
        assert_eq!(block.language.as_deref(), Some("rust"));
        assert_eq!(block.meta, "title=\"a.rs\" {1}");

        let bare = CodeBlock::new(CodeBlockKind::Fenced(CowStr::from("js")));
        assert_eq!(bare.language.as_deref(), Some("js"));
        assert!(bare.meta.is_empty());

        let none = CodeBlock::new(CodeBlockKind::Fenced(CowStr::from("  ")));
        assert_eq!(none.language, None);
    }

    #[test]
    fn fenced_blocks_become_fragments() {
        let markdown = "\
# Example

```rust title=\"main.rs\" /main/
fn main() {}
```

Some `plain` and `let x{:rust}` code.
";
        let renderer = renderer(&test_config());
        let html = render_markdown(markdown, &renderer).expect("render");

        assert!(html.contains("<h1>Example</h1>"));
        assert!(html.contains("data-pretty-code-fragment=\"\""));
        assert!(html.contains("data-pretty-code-title=\"\""));
        assert!(html.contains(">main.rs</div>"));
        assert!(html.contains("data-highlighted-chars=\"\""));
        assert!(html.contains("<code>plain</code>"));
        assert!(!html.contains("{:rust}"));
        assert!(!html.contains("language-rust"));
    }

    #[test]
    fn inline_fragments_are_inline_html() {
        let renderer = renderer(&test_config());
        match inline_code(CowStr::from("let x{:rust}"), &renderer) {
            Event::InlineHtml(html) => {
                assert!(html.starts_with("<span data-pretty-code-fragment=\"\">"));
            }
            other => panic!("expected inline html, got {other:?}"),
        }
        assert_eq!(
            inline_code(CowStr::from("plain"), &renderer),
            Event::Code(CowStr::from("plain"))
        );
    }

    #[test]
    fn crlf_documents_render_like_lf() {
        let renderer = renderer(&test_config());
        let lf = render_markdown("```txt\na\nb\n```\n", &renderer).expect("render");
        let crlf = render_markdown("```txt\r\na\r\nb\r\n```\r\n", &renderer).expect("render");
        assert_eq!(lf, crlf);
    }

    #[test]
    fn page_escapes_title() {
        let html = page("a <b>", "<p>x</p>\n");
        assert!(html.contains("<title>a &lt;b&gt;</title>"));
        assert!(html.contains("<body>\n<p>x</p>\n</body>"));
    }
}
