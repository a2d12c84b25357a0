use crate::config::Config;
use crate::fragment::{block_fragment, inline_fragment, BlockOptions, ModeTree};
use crate::highlight::Highlighter;
use crate::lines::{traverse_and_annotate, DefaultVisitor, Visitor};
use crate::meta::{self, InlineTarget};
use crate::node::Element;
use crate::theme::{token_color, ThemeManager};
use anyhow::Result;
use std::collections::BTreeMap;
use syntect::highlighting::Theme;
use tracing::debug;

/// Highlights code blocks and inline code for every configured theme mode.
/// Syntaxes and themes are loaded once and reused for every block.
pub struct Renderer {
    highlighter: Highlighter,
    modes: Vec<(String, Theme)>,
    keep_background: bool,
    default_lang: String,
    tokens_map: BTreeMap<String, String>,
}

impl Renderer {
    pub fn new(config: &Config, themes: &ThemeManager) -> Result<Self> {
        Ok(Self {
            highlighter: Highlighter::new(),
            modes: themes.resolve_modes(config)?,
            keep_background: config.keep_background,
            default_lang: config.default_lang.clone(),
            tokens_map: config.tokens_map.clone(),
        })
    }

    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.modes.iter().map(|(mode, _)| mode.as_str())
    }

    pub fn render_block(&self, lang: Option<&str>, meta: &str, code: &str) -> Element {
        self.render_block_with(lang, meta, code, &mut DefaultVisitor)
    }

    /// Highlights `code` once per mode, applies the line and word directives
    /// from `meta`, and assembles the fragment.
    pub fn render_block_with<V: Visitor + ?Sized>(
        &self,
        lang: Option<&str>,
        meta: &str,
        code: &str,
        visitor: &mut V,
    ) -> Element {
        let lang = lang
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.default_lang);
        let meta = meta::parse(meta);
        let code = code.strip_suffix('\n').unwrap_or(code);

        let mut trees = Vec::with_capacity(self.modes.len());
        let mut line_count = 0;
        for (mode, theme) in &self.modes {
            let mut pre = self.highlighter.highlight_block(code, lang, theme);
            line_count = traverse_and_annotate(&mut pre, &meta.lines, &meta.words, visitor);
            trees.push(ModeTree {
                mode: mode.clone(),
                pre,
            });
        }
        debug!(
            lang,
            lines = line_count,
            words = meta.words.len(),
            modes = trees.len(),
            "rendered code block"
        );

        block_fragment(
            trees,
            &BlockOptions {
                lang,
                title: meta.title.as_deref(),
                caption: meta.caption.as_deref(),
                keep_background: self.keep_background,
                line_numbers: meta.line_numbers,
                line_count,
            },
        )
    }

    /// `None` when `value` has no `{:lang}` / `{:.token}` suffix.
    pub fn render_inline(&self, value: &str) -> Option<Element> {
        let inline = meta::parse_inline(value)?;
        let mut trees = Vec::with_capacity(self.modes.len());
        for (mode, theme) in &self.modes {
            let pre = match &inline.target {
                InlineTarget::Lang(lang) => {
                    self.highlighter.highlight_block(&inline.code, lang, theme)
                }
                InlineTarget::Token(token) => {
                    let scope = self
                        .tokens_map
                        .get(token)
                        .map(String::as_str)
                        .unwrap_or(token);
                    let color = token_color(theme, scope);
                    self.highlighter
                        .token_block(&inline.code, color.as_deref(), theme)
                }
            };
            trees.push(ModeTree {
                mode: mode.clone(),
                pre,
            });
        }

        let lang = match &inline.target {
            InlineTarget::Lang(lang) => lang.as_str(),
            InlineTarget::Token(_) => ".token",
        };
        Some(inline_fragment(trees, lang, self.keep_background))
    }
}
