//! Code fence meta strings and inline code suffixes.
//!
//! The info string after the language, e.g.
//! `title="main.rs" {1,3-4} /count/2#c showLineNumbers{10}`, carries a
//! title, highlighted lines, word patterns with optional occurrence ranges
//! and ids, and line numbering. Inline code opts into highlighting with a
//! trailing `{:lang}` or `{:.token}`.

use crate::range;
use crate::words::WordSpec;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::warn;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"title="([^"]*)""#).expect("valid title regex"));
static CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"caption="([^"]*)""#).expect("valid caption regex"));
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(.*?)/(\S*)").expect("valid word regex"));
static LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\{(.*?)\}").expect("valid lines regex"));
static LINE_NUMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)showLineNumbers(?:\{(\d+)\})?").expect("valid line numbers regex")
});
static INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{:([a-zA-Z.-]+)\}$").expect("valid inline regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeMeta {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub lines: BTreeSet<usize>,
    pub words: Vec<WordSpec>,
    pub line_numbers: Option<LineNumbers>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumbers {
    pub start: usize,
}

impl Default for LineNumbers {
    fn default() -> Self {
        Self { start: 1 }
    }
}

pub fn parse(meta: &str) -> CodeMeta {
    let mut rest = meta.to_string();
    let title = take_quoted(&TITLE, &mut rest);
    let caption = take_quoted(&CAPTION, &mut rest);

    let mut words = Vec::new();
    for caps in WORD.captures_iter(&rest) {
        let pattern = &caps[1];
        if pattern.is_empty() {
            continue;
        }
        let mut word = WordSpec::new(pattern);
        let (occurrences, id) = caps[2].split_once('#').unwrap_or((&caps[2], ""));
        if !occurrences.is_empty() {
            word = word.with_occurrences(parse_range(occurrences, "word occurrences"));
        }
        if !id.is_empty() {
            word = word.with_id(id);
        }
        words.push(word);
    }
    // Word patterns may contain braces; keep them out of the line and
    // numbering directives.
    let rest = WORD.replace_all(&rest, " ");

    let lines = LINES
        .captures(&rest)
        .map(|caps| parse_range(&caps[1], "highlighted lines"))
        .unwrap_or_default();

    let line_numbers = LINE_NUMBERS.captures(&rest).map(|caps| LineNumbers {
        start: caps
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1),
    });

    CodeMeta {
        title,
        caption,
        lines,
        words,
        line_numbers,
    }
}

fn take_quoted(re: &Regex, meta: &mut String) -> Option<String> {
    let (range, value) = {
        let caps = re.captures(meta)?;
        let whole = caps.get(0)?;
        (whole.range(), caps[1].to_string())
    };
    meta.replace_range(range, "");
    Some(value)
}

fn parse_range(expr: &str, what: &str) -> BTreeSet<usize> {
    match range::parse(expr) {
        Ok(set) => set,
        Err(err) => {
            warn!("ignoring {what} `{expr}`: {err}");
            BTreeSet::new()
        }
    }
}

/// What a highlighted inline code span should be rendered as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineTarget {
    /// `{:rust}`: highlight as a language.
    Lang(String),
    /// `{:.keyword}`: color with a theme token scope.
    Token(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineCode {
    pub code: String,
    pub target: InlineTarget,
}

/// Splits `code{:lang}` into code and target. `None` when the suffix is
/// missing, which leaves the inline code untouched.
pub fn parse_inline(value: &str) -> Option<InlineCode> {
    let caps = INLINE.captures(value)?;
    let whole = caps.get(0)?;
    let code = value[..whole.start()].to_string();
    if code.is_empty() {
        return None;
    }
    let meta = &caps[1];
    let target = match meta.strip_prefix('.') {
        Some(token) => InlineTarget::Token(token.to_string()),
        None => InlineTarget::Lang(meta.to_string()),
    };
    Some(InlineCode { code, target })
}
