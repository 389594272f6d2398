//! Hierarchical C# parser building a lossless rowan tree
//!
//! The parser works on the significant tokens produced by the lexer and
//! attaches trivia the way the rewriters expect it:
//!
//! - a token's trailing trivia runs up to and including the first line break
//! - everything else before a token is its leading trivia
//!
//! When a token is bumped, its leading trivia, the token itself and its
//! trailing trivia are all emitted into the node that is currently open.
//! A node therefore starts with the leading trivia of its first token and
//! ends with the trailing trivia of its last token.

mod expressions;
mod items;
mod statements;
mod types;

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder};

use crate::cst::lexer::{CstToken, lex_with_trivia};
use crate::cst::{CsSyntaxKind, SyntaxNode};

/// A parse error with the byte offset where it was detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

/// Result of parsing: a green tree plus every lexer and parser error
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn into_green(self) -> GreenNode {
        self.green
    }

    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// True when the source parsed without a single error
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a complete C# source file into a `CompilationUnit`
pub fn parse(source: &str) -> Parse {
    let mut p = Parser::new(source);
    p.start_node(CsSyntaxKind::CompilationUnit);
    p.compilation_unit_body();
    p.finish_root();
    p.finish()
}

/// Parse a sequence of member declarations into a `Fragment` node
pub fn parse_members(source: &str) -> Parse {
    let mut p = Parser::new(source);
    p.start_node(CsSyntaxKind::Fragment);
    p.member_list(true, |p| p.at_end());
    p.finish_root();
    p.finish()
}

/// Parse a sequence of statements into a `Fragment` node
pub fn parse_statements(source: &str) -> Parse {
    let mut p = Parser::new(source);
    p.start_node(CsSyntaxKind::Fragment);
    while !p.at_end() {
        p.with_progress(|p| p.statement());
    }
    p.finish_root();
    p.finish()
}

/// Parse a single expression into a `Fragment` node
pub fn parse_expression(source: &str) -> Parse {
    let mut p = Parser::new(source);
    p.start_node(CsSyntaxKind::Fragment);
    p.expression();
    if !p.at_end() {
        p.error("Expected end of expression");
        p.recover_to_end();
    }
    p.finish_root();
    p.finish()
}

pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: Vec<CstToken>,
    /// Raw indices of significant tokens
    significant: Vec<usize>,
    /// For each significant token, raw index one past its trailing trivia
    trailing_end: Vec<usize>,
    /// Cursor into `significant`
    pos: usize,
    /// Next raw token that has not been emitted yet
    emitted: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        let (tokens, lex_errors) = lex_with_trivia(source);

        let significant: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_trivia())
            .map(|(idx, _)| idx)
            .collect();

        let trailing_end = significant
            .iter()
            .map(|&raw| {
                let mut end = raw + 1;
                while end < tokens.len()
                    && matches!(
                        tokens[end].kind,
                        CsSyntaxKind::Whitespace
                            | CsSyntaxKind::LineComment
                            | CsSyntaxKind::BlockComment
                    )
                {
                    end += 1;
                }
                if end < tokens.len() && tokens[end].kind == CsSyntaxKind::Newline {
                    end += 1;
                }
                end
            })
            .collect();

        let errors = lex_errors
            .into_iter()
            .map(|e| ParseError {
                message: e.message,
                offset: e.span.start,
            })
            .collect();

        Self {
            source,
            tokens,
            significant,
            trailing_end,
            pos: 0,
            emitted: 0,
            builder: GreenNodeBuilder::new(),
            errors,
        }
    }

    fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    /// Emit every remaining token, close the root with an `EndOfFile` token
    fn finish_root(&mut self) {
        if !self.at_end() {
            self.error("Unexpected input");
            self.recover_to_end();
        }
        while self.emitted < self.tokens.len() {
            let token = &self.tokens[self.emitted];
            self.builder.token(token.kind.into(), &token.text);
            self.emitted += 1;
        }
        self.builder.token(CsSyntaxKind::EndOfFile.into(), "");
        self.builder.finish_node();
    }

    // ---------------------------------------------------------------------
    // Cursor
    // ---------------------------------------------------------------------

    fn nth(&self, n: usize) -> CsSyntaxKind {
        self.significant
            .get(self.pos + n)
            .map(|&raw| self.tokens[raw].kind)
            .unwrap_or(CsSyntaxKind::EndOfFile)
    }

    fn nth_text(&self, n: usize) -> &str {
        self.significant
            .get(self.pos + n)
            .map(|&raw| self.tokens[raw].text.as_str())
            .unwrap_or("")
    }

    fn current(&self) -> CsSyntaxKind {
        self.nth(0)
    }

    fn at(&self, kind: CsSyntaxKind) -> bool {
        self.current() == kind
    }

    fn nth_at(&self, n: usize, kind: CsSyntaxKind) -> bool {
        self.nth(n) == kind
    }

    /// Current token is the contextual keyword `text`
    fn at_contextual(&self, text: &str) -> bool {
        self.nth_contextual(0, text)
    }

    fn nth_contextual(&self, n: usize, text: &str) -> bool {
        self.nth(n) == CsSyntaxKind::Ident && self.nth_text(n) == text
    }

    fn at_end(&self) -> bool {
        self.pos >= self.significant.len()
    }

    /// Tokens `n - 1` and `n` touch with no trivia in between
    fn nth_adjacent(&self, n: usize) -> bool {
        match (
            self.significant.get(self.pos + n - 1),
            self.significant.get(self.pos + n),
        ) {
            (Some(&a), Some(&b)) => b == a + 1,
            _ => false,
        }
    }

    fn offset(&self) -> usize {
        self.significant
            .get(self.pos)
            .map(|&raw| self.tokens[raw].span.start)
            .unwrap_or(self.source.len())
    }

    // ---------------------------------------------------------------------
    // Tree building
    // ---------------------------------------------------------------------

    fn bump(&mut self) {
        if self.at_end() {
            return;
        }
        let end = self.trailing_end[self.pos];
        while self.emitted < end {
            let token = &self.tokens[self.emitted];
            self.builder.token(token.kind.into(), &token.text);
            self.emitted += 1;
        }
        self.pos += 1;
    }

    fn start_node(&mut self, kind: CsSyntaxKind) {
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&self) -> Checkpoint {
        self.builder.checkpoint()
    }

    fn start_node_at(&mut self, checkpoint: Checkpoint, kind: CsSyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn expect(&mut self, kind: CsSyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.error(format!("Expected {kind}, found {}", self.current()));
            false
        }
    }

    fn eat(&mut self, kind: CsSyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let offset = self.offset();
        // One error per position keeps cascades out of the report
        if self.errors.last().is_some_and(|e| e.offset == offset) {
            return;
        }
        self.errors.push(ParseError {
            message: message.into(),
            offset,
        });
    }

    /// Wrap the current token in an `Error` node
    fn error_and_bump(&mut self, message: impl Into<String>) {
        self.error(message);
        self.start_node(CsSyntaxKind::Error);
        self.bump();
        self.finish_node();
    }

    fn recover_to_end(&mut self) {
        self.start_node(CsSyntaxKind::Error);
        while !self.at_end() {
            self.bump();
        }
        self.finish_node();
    }

    /// Run `f` and bump one token as an error if it consumed nothing
    fn with_progress(&mut self, f: impl FnOnce(&mut Self)) {
        let before = self.pos;
        f(self);
        if self.pos == before && !self.at_end() {
            self.error_and_bump(format!("Unexpected {}", self.current()));
        }
    }
}

/// Tokens that may begin an expression
fn can_start_expression(kind: CsSyntaxKind) -> bool {
    use CsSyntaxKind::*;
    kind.is_predefined_type()
        || matches!(
            kind,
            Ident
                | IntLiteral
                | RealLiteral
                | StringLiteral
                | InterpolatedString
                | CharLiteral
                | TrueKw
                | FalseKw
                | NullKw
                | DefaultKw
                | ThisKw
                | BaseKw
                | NewKw
                | TypeofKw
                | SizeofKw
                | CheckedKw
                | UncheckedKw
                | DelegateKw
                | StackallocKw
                | ThrowKw
                | RefKw
                | LParen
                | LBracket
                | Bang
                | Tilde
                | Minus
                | Plus
                | MinusMinus
                | PlusPlus
                | Amp
                | Star
                | Caret
                | DotDot
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_lossless(source: &str) -> Parse {
        let parse = parse(source);
        assert!(parse.ok(), "errors for {source:?}: {:?}", parse.errors());
        assert_eq!(parse.syntax().to_string(), source);
        parse
    }

    fn first_node(parse: &Parse, kind: CsSyntaxKind) -> SyntaxNode {
        parse
            .syntax()
            .descendants()
            .find(|n| n.kind() == kind)
            .unwrap_or_else(|| panic!("no {kind} node"))
    }

    #[test]
    fn test_empty_source() {
        let parse = assert_lossless("");
        assert_eq!(parse.syntax().kind(), CsSyntaxKind::CompilationUnit);
    }

    #[test]
    fn test_trailing_trivia_stops_after_newline() {
        let parse = assert_lossless("class A { } // a\n\n// b\nclass B { }\n");
        let classes: Vec<_> = parse
            .syntax()
            .children()
            .filter(|n| n.kind() == CsSyntaxKind::ClassDecl)
            .collect();
        assert_eq!(classes[0].to_string(), "class A { } // a\n");
        assert_eq!(classes[1].to_string(), "\n// b\nclass B { }\n");
    }

    #[test]
    fn test_final_trivia_hangs_off_end_of_file() {
        let parse = assert_lossless("class A { }\n\n// tail");
        let last = parse.syntax().last_token().map(|t| t.kind());
        assert_eq!(last, Some(CsSyntaxKind::EndOfFile));
    }

    #[test]
    fn test_parse_failure_reports_errors() {
        let parse = parse("class A { int x = ; }");
        assert!(!parse.ok());
        assert_eq!(parse.syntax().to_string(), "class A { int x = ; }");
    }

    #[test]
    fn test_unbalanced_braces_fail() {
        let parse = parse("class A { void M() { }");
        assert!(!parse.ok());
    }

    #[test]
    fn test_parse_members_fragment() {
        let parse = parse_members("    public int X { get; private set; }\n");
        assert!(parse.ok(), "{:?}", parse.errors());
        assert_eq!(parse.syntax().kind(), CsSyntaxKind::Fragment);
        first_node(&parse, CsSyntaxKind::PropertyDecl);
    }

    #[test]
    fn test_parse_expression_fragment() {
        let parse = parse_expression("a ?? b.c");
        assert!(parse.ok());
        let binary = first_node(&parse, CsSyntaxKind::BinaryExpr);
        assert_eq!(binary.to_string(), "a ?? b.c");
    }

    #[test]
    fn test_parse_statements_fragment() {
        let parse = parse_statements("Foo f = (Foo)o;\nreturn;");
        assert!(parse.ok(), "{:?}", parse.errors());
        first_node(&parse, CsSyntaxKind::LocalDeclStatement);
        first_node(&parse, CsSyntaxKind::CastExpr);
        first_node(&parse, CsSyntaxKind::ReturnStatement);
    }
}
