//! Trivia accessors and synthesis
//!
//! Trivia lives in the tree as ordinary tokens, so the accessors here work
//! on sibling runs around significant tokens:
//!
//! - a token's trailing trivia is the run after it up to and including the
//!   first end-of-line
//! - its leading trivia is the run before it, minus the previous sibling
//!   token's trailing part
//!
//! The update functions take and return green nodes. They navigate a red
//! view of the node and rebuild only the path to the edited token.

use rowan::{GreenNode, GreenToken, NodeOrToken};

use super::lexer::lex_with_trivia;
use super::tree::{self, GreenElement};
use super::{CsSyntaxKind, SyntaxNode, SyntaxToken};

pub fn first_significant_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| !token.kind().is_trivia())
}

pub fn last_significant_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    let mut last = None;
    for token in node
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
    {
        if !token.kind().is_trivia() {
            last = Some(token);
        }
    }
    last
}

/// Leading trivia of a significant token
pub fn token_leading(token: &SyntaxToken) -> Vec<SyntaxToken> {
    let mut run = Vec::new();
    let mut after_token = false;
    let mut cursor = token.prev_sibling_or_token();
    while let Some(element) = cursor {
        match element {
            NodeOrToken::Token(trivia) if trivia.kind().is_trivia() => {
                cursor = trivia.prev_sibling_or_token();
                run.push(trivia);
            }
            NodeOrToken::Token(_) => {
                after_token = true;
                break;
            }
            NodeOrToken::Node(_) => break,
        }
    }
    run.reverse();

    if after_token {
        // The head of the run trails the previous token
        match run.iter().position(|t| t.kind() == CsSyntaxKind::Newline) {
            Some(newline) => {
                run.drain(..=newline);
            }
            None => run.clear(),
        }
    }
    run
}

/// Trailing trivia of a significant token
pub fn token_trailing(token: &SyntaxToken) -> Vec<SyntaxToken> {
    let mut run = Vec::new();
    let mut cursor = token.next_sibling_or_token();
    while let Some(NodeOrToken::Token(trivia)) = cursor {
        if !trivia.kind().is_trivia() {
            break;
        }
        cursor = trivia.next_sibling_or_token();
        let newline = trivia.kind() == CsSyntaxKind::Newline;
        run.push(trivia);
        if newline {
            break;
        }
    }
    run
}

pub fn leading_trivia(node: &SyntaxNode) -> Vec<SyntaxToken> {
    first_significant_token(node)
        .map(|token| token_leading(&token))
        .unwrap_or_default()
}

pub fn trailing_trivia(node: &SyntaxNode) -> Vec<SyntaxToken> {
    last_significant_token(node)
        .map(|token| token_trailing(&token))
        .unwrap_or_default()
}

pub fn trivia_text(trivia: &[SyntaxToken]) -> String {
    trivia.iter().map(|t| t.text()).collect()
}

pub fn to_green(trivia: &[SyntaxToken]) -> Vec<GreenToken> {
    trivia.iter().map(tree::green_token).collect()
}

/// Comment tokens out of a trivia run
pub fn comments(trivia: &[SyntaxToken]) -> Vec<GreenToken> {
    trivia
        .iter()
        .filter(|t| t.kind().is_comment())
        .map(tree::green_token)
        .collect()
}

// ============================================================================
// Synthesis
// ============================================================================

pub fn whitespace(text: &str) -> GreenToken {
    tree::token(CsSyntaxKind::Whitespace, text)
}

pub fn newline(eol: &str) -> GreenToken {
    tree::token(CsSyntaxKind::Newline, eol)
}

pub fn space() -> GreenToken {
    whitespace(" ")
}

/// Keep rendered source from closing the comment that wraps it
///
/// A `\` is inserted after every `*` that precedes `/` or `\`, so `*/`
/// becomes `*\/` and a literal `*\` becomes `*\\`. The mapping is
/// reversed exactly by [`unescape_comment_text`].
pub fn escape_comment_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        escaped.push(c);
        if c == '*' && matches!(chars.peek(), Some('/' | '\\')) {
            escaped.push('\\');
        }
    }
    escaped
}

pub fn unescape_comment_text(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        plain.push(c);
        if c != '*' || chars.peek() != Some(&'\\') {
            continue;
        }
        let mut lookahead = chars.clone();
        lookahead.next();
        if let Some(escaped @ ('/' | '\\')) = lookahead.next() {
            plain.push(escaped);
            chars = lookahead;
        }
    }
    plain
}

/// `/* text */`
pub fn block_comment(text: &str) -> GreenToken {
    tree::token(
        CsSyntaxKind::BlockComment,
        &format!("/* {} */", escape_comment_text(text)),
    )
}

/// Trivia tokens for a run of whitespace, line breaks and comments
///
/// Empty text yields no tokens. Anything that does not lex as trivia is
/// kept as a block comment so the run never changes program meaning.
pub fn trivia_tokens(text: &str) -> Vec<GreenToken> {
    let (tokens, _) = lex_with_trivia(text);
    tokens
        .into_iter()
        .filter(|t| !t.text.is_empty())
        .map(|t| {
            if t.kind.is_trivia() {
                tree::token(t.kind, &t.text)
            } else {
                block_comment(&t.text)
            }
        })
        .collect()
}

/// `elided` comment followed by the comments and trivia that were in the way
///
/// Produces ` /* elided */ /* kept */` and then `after`.
pub fn elision_tail(elided: &str, displaced: &[SyntaxToken], after: &[SyntaxToken]) -> Vec<GreenToken> {
    let mut tail = vec![space(), block_comment(elided)];
    for comment in comments(displaced) {
        tail.push(space());
        tail.push(comment);
    }
    tail.extend(to_green(after));
    tail
}

// ============================================================================
// Layout
// ============================================================================

/// Whitespace at the start of the line that contains `token`
pub fn line_indentation(token: &SyntaxToken) -> String {
    let mut line = String::new();
    let mut cursor = token.prev_token();
    while let Some(previous) = cursor {
        let text = previous.text();
        if let Some(newline) = text.rfind('\n') {
            line.insert_str(0, &text[newline + 1..]);
            return leading_blanks(&line);
        }
        line.insert_str(0, text);
        cursor = previous.prev_token();
    }
    leading_blanks(&line)
}

/// Indentation of the line where `node` starts
pub fn indentation(node: &SyntaxNode) -> String {
    first_significant_token(node)
        .map(|token| line_indentation(&token))
        .unwrap_or_default()
}

/// `token` is the first significant token on its line
pub fn starts_line(token: &SyntaxToken) -> bool {
    let mut cursor = token.prev_token();
    while let Some(previous) = cursor {
        match previous.kind() {
            CsSyntaxKind::Newline => return true,
            CsSyntaxKind::Whitespace => cursor = previous.prev_token(),
            kind if kind.is_trivia() => {
                if previous.text().ends_with('\n') {
                    return true;
                }
                cursor = previous.prev_token();
            }
            _ => return false,
        }
    }
    true
}

/// The end-of-line sequence used by a tree, `\n` when it has none
pub fn detect_eol(node: &SyntaxNode) -> &'static str {
    let first = node
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| token.kind() == CsSyntaxKind::Newline);
    match first.as_ref().map(|t| t.text()) {
        Some("\r\n") => "\r\n",
        Some("\r") => "\r",
        _ => "\n",
    }
}

fn leading_blanks(line: &str) -> String {
    line.chars().take_while(|c| matches!(c, ' ' | '\t')).collect()
}

// ============================================================================
// Updates
// ============================================================================

/// Replace the leading trivia of the first significant token
pub fn with_leading_trivia(node: &GreenNode, trivia: Vec<GreenToken>) -> GreenNode {
    let root = SyntaxNode::new_root(node.clone());
    let Some(token) = first_significant_token(&root) else {
        return node.clone();
    };
    let existing = token_leading(&token);
    let start = existing.first().map_or(token.index(), |t| t.index());
    splice_around(node, &token, start..token.index(), trivia)
}

/// Put `trivia` before the existing leading trivia
pub fn prepend_leading_trivia(node: &GreenNode, trivia: Vec<GreenToken>) -> GreenNode {
    let root = SyntaxNode::new_root(node.clone());
    let Some(token) = first_significant_token(&root) else {
        return node.clone();
    };
    let start = token_leading(&token)
        .first()
        .map_or(token.index(), |t| t.index());
    splice_around(node, &token, start..start, trivia)
}

/// Replace the trailing trivia of the last significant token
pub fn with_trailing_trivia(node: &GreenNode, trivia: Vec<GreenToken>) -> GreenNode {
    let root = SyntaxNode::new_root(node.clone());
    let Some(token) = last_significant_token(&root) else {
        return node.clone();
    };
    let existing = token_trailing(&token);
    let start = token.index() + 1;
    let end = existing.last().map_or(start, |t| t.index() + 1);
    splice_around(node, &token, start..end, trivia)
}

/// Insert `trivia` right after the last significant token, before its
/// existing trailing trivia
pub fn insert_after_last_token(node: &GreenNode, trivia: Vec<GreenToken>) -> GreenNode {
    let root = SyntaxNode::new_root(node.clone());
    let Some(token) = last_significant_token(&root) else {
        return node.clone();
    };
    let at = token.index() + 1;
    splice_around(node, &token, at..at, trivia)
}

/// Drop whitespace at the end of the trailing trivia of the last token
pub fn trim_trailing_whitespace(node: &GreenNode) -> GreenNode {
    let root = SyntaxNode::new_root(node.clone());
    let Some(token) = last_significant_token(&root) else {
        return node.clone();
    };
    let trailing = token_trailing(&token);
    let keep = trailing
        .iter()
        .rposition(|t| t.kind() != CsSyntaxKind::Whitespace)
        .map_or(0, |i| i + 1);
    if keep == trailing.len() {
        return node.clone();
    }
    let start = token.index() + 1 + keep;
    splice_around(node, &token, start..token.index() + 1 + trailing.len(), Vec::new())
}

fn splice_around(
    node: &GreenNode,
    token: &SyntaxToken,
    range: std::ops::Range<usize>,
    trivia: Vec<GreenToken>,
) -> GreenNode {
    let Some(parent) = token.parent() else {
        return node.clone();
    };
    let elements: Vec<GreenElement> = trivia.into_iter().map(Into::into).collect();
    let updated = tree::splice_children(&parent.green(), range, elements);
    tree::replace_node(&parent, updated)
}
