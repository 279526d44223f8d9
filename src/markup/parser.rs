//! The markup parser: a line-oriented block pass over a small markdown
//! dialect, with a regex token pass for inline styles, colors, and holes.
//!
//! Malformed markup never fails; anything the grammar does not recognize
//! falls through as literal text.

use std::sync::LazyLock;

use regex::Regex;

use super::ast::{Node, NodeKind};
use super::style::{Color, Style};

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})[ \t]+(.+)").expect("header regex"));
static RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\*{3,}|-{3,}|_{3,})$").expect("rule regex"));
static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)([*+-]|\d+\.)[ \t]+(.+)").expect("list regex"));
static QUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>[ \t]*(.+)").expect("quote regex"));
static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(.*)").expect("code fence regex"));

/// Inline tokens, longest-first per alternation priority: holes, bold,
/// italic, underline, strike, fg/bg color.
static INLINE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(%v)|(\*\*.+?\*\*)|(\*.+?\*)|(__.+?__)|(~~.+?~~)|(!?#[a-zA-Z0-9]{3,8}\(.+?\))")
        .expect("inline token regex")
});

// ---------------------------------------------------------------------------
// Block pass
// ---------------------------------------------------------------------------

/// Parse markup into an AST with holes numbered left-to-right.
pub fn parse(input: &str) -> Node {
    let mut root = Node::new(NodeKind::Root);

    // Index of the open list in `root.children`, if any.
    let mut current_list: Option<usize> = None;
    let mut in_code_block = false;
    let mut code_lang = String::new();
    let mut code_body = String::new();

    for line in input.split('\n') {
        let trimmed = line.trim();

        // Code fences toggle verbatim collection.
        if let Some(fence) = CODE_FENCE_RE.captures(trimmed) {
            if in_code_block {
                root.children.push(Node::new(NodeKind::CodeBlock {
                    lang: std::mem::take(&mut code_lang),
                    body: std::mem::take(&mut code_body),
                }));
                in_code_block = false;
            } else {
                in_code_block = true;
                code_lang = fence[1].trim().to_string();
            }
            continue;
        }
        if in_code_block {
            code_body.push_str(line);
            code_body.push('\n');
            continue;
        }

        // List items group into the current list; a non-blank non-list line
        // closes it.
        if let Some(item) = LIST_RE.captures(line) {
            let index = *current_list.get_or_insert_with(|| {
                root.children.push(Node::new(NodeKind::List));
                root.children.len() - 1
            });
            root.children[index]
                .children
                .push(Node::with_children(NodeKind::ListItem, parse_inline(&item[3])));
            continue;
        } else if !trimmed.is_empty() {
            current_list = None;
        }

        if let Some(header) = HEADER_RE.captures(line) {
            let level = header[1].len() as u8;
            root.children
                .push(Node::with_children(NodeKind::Header(level), parse_inline(&header[2])));
            continue;
        }

        if RULE_RE.is_match(trimmed) {
            root.children.push(Node::new(NodeKind::Rule));
            continue;
        }

        if let Some(quote) = QUOTE_RE.captures(line) {
            root.children
                .push(Node::with_children(NodeKind::Quote, parse_inline(&quote[1])));
            continue;
        }

        if trimmed.is_empty() {
            // Blank line: a vertical spacer.
            root.children.push(Node::text(""));
            continue;
        }

        root.children
            .push(Node::with_children(NodeKind::Block, parse_inline(line)));
    }

    let mut next_hole = 0;
    root.assign_holes(&mut next_hole);
    root
}

// ---------------------------------------------------------------------------
// Inline pass
// ---------------------------------------------------------------------------

/// Parse inline styles, colors, and holes. Styled regions recurse, so
/// `**bold *italic* bold**` nests.
pub(crate) fn parse_inline(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut last = 0;

    for token in INLINE_TOKEN_RE.find_iter(text) {
        if token.start() > last {
            nodes.push(Node::text(&text[last..token.start()]));
        }
        let raw = token.as_str();

        if raw == "%v" {
            nodes.push(Node::new(NodeKind::Hole(0)));
        } else if let Some(inner) = strip_delimited(raw, "**") {
            nodes.push(Node::styled(Style::bold(), parse_inline(inner)));
        } else if let Some(inner) = strip_delimited(raw, "__") {
            nodes.push(Node::styled(Style::underline(), parse_inline(inner)));
        } else if let Some(inner) = strip_delimited(raw, "~~") {
            nodes.push(Node::styled(Style::strike(), parse_inline(inner)));
        } else if let Some(inner) = strip_delimited(raw, "*") {
            nodes.push(Node::styled(Style::italic(), parse_inline(inner)));
        } else if raw.contains('#') {
            nodes.push(parse_color_token(raw));
        } else {
            nodes.push(Node::text(raw));
        }

        last = token.end();
    }

    if last < text.len() {
        nodes.push(Node::text(&text[last..]));
    }

    nodes
}

/// Strip a symmetric delimiter pair; `None` if `raw` is not delimited by it.
fn strip_delimited<'a>(raw: &'a str, delim: &str) -> Option<&'a str> {
    raw.strip_prefix(delim)?.strip_suffix(delim)
}

/// Parse a `#name(content)` or `!#name(content)` color token. Tokens that
/// do not have the expected bracket shape fall through as literal text.
fn parse_color_token(raw: &str) -> Node {
    let is_bg = raw.starts_with('!');
    let (Some(open), Some(close)) = (raw.find('('), raw.rfind(')')) else {
        return Node::text(raw);
    };
    if close <= open {
        return Node::text(raw);
    }

    let name_start = if is_bg { 2 } else { 1 };
    let name = &raw[name_start..open];
    let content = &raw[open + 1..close];

    // Unknown colors render plain.
    let mut style = Style::new();
    match Color::from_name(name) {
        Some(color) if is_bg => style.bg = Some(color),
        Some(color) => style.fg = Some(color),
        None => {}
    }

    Node::styled(style, parse_inline(content))
}

// ===========================================================================
// Tests
// ===========================================================================
