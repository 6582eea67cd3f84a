//! Markdown document transformer.
//!
//! Renders markdown with comrak and highlights fenced code blocks with syntect.
//! A block whose language is unknown, or whose highlighting fails, is left to
//! comrak's plain escaped output so one bad block never fails the document.

use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use comrak::{format_html, parse_document, Arena, Options};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::warn;

use super::RenderError;

// == Document Transformer ==
/// Markdown to HTML transformer with class-based syntax highlighting.
pub struct DocumentTransformer {
    options: Options<'static>,
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
}

impl DocumentTransformer {
    pub fn new() -> Self {
        Self {
            options: markdown_options(),
            syntax_set: SyntaxSet::load_defaults_newlines(),
            class_style: ClassStyle::SpacedPrefixed { prefix: "hljs-" },
        }
    }

    /// Transforms a markdown document into an HTML fragment.
    pub fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);

        self.highlight_blocks(root);

        let mut html = String::new();
        format_html(root, &self.options, &mut html)
            .map_err(|err| RenderError::InvalidOutput(err.to_string()))?;
        Ok(html)
    }

    fn highlight_blocks(&self, node: &AstNode<'_>) {
        if let Some((language, literal)) = fenced_code(node) {
            if let Some(html) = self.highlight(&language, &literal) {
                let mut data = node.data.borrow_mut();
                data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                    block_type: 0,
                    literal: html,
                });
            }
        }

        let mut child = node.first_child();
        while let Some(next) = child {
            self.highlight_blocks(next);
            child = next.next_sibling();
        }
    }

    /// Highlighted markup for one block, or `None` to keep the plain block.
    fn highlight(&self, language: &str, code: &str) -> Option<String> {
        let syntax = find_syntax(&self.syntax_set, language)?;

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, self.class_style);

        for line in LinesWithEndings::from(code) {
            if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
                warn!(language, error = %err, "Highlighting failed, emitting block unhighlighted");
                return None;
            }
        }

        Some(format!(
            "<pre><code class=\"language-{}\"><div class=\"hljs-lang\">{}</div></code></pre>\n",
            class_token(language),
            generator.finalize()
        ))
    }
}

impl Default for DocumentTransformer {
    fn default() -> Self {
        Self::new()
    }
}

// == Markdown Helpers ==
/// HTML passthrough, smart punctuation, hard breaks, autolinks, tables and
/// strikethrough.
fn markdown_options() -> Options<'static> {
    let mut options = Options::default();

    options.extension.autolink = true;
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.parse.smart = true;
    options.render.hardbreaks = true;
    options.render.r#unsafe = true;

    options
}

/// Language token and literal of a fenced code block that names a language.
fn fenced_code(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    let NodeValue::CodeBlock(block) = &data.value else {
        return None;
    };

    let language = block.info.split_whitespace().next()?.to_string();
    let mut literal = block.literal.clone();
    if !literal.ends_with('\n') {
        literal.push('\n');
    }
    Some((language, literal))
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

fn class_token(language: &str) -> String {
    language
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .collect()
}
