//! Lossless C# lexer
//!
//! Produces one token for every byte of input, trivia included, so that
//! concatenating the token texts reproduces the source exactly.

use crate::cst::CsSyntaxKind;
use std::ops::Range;

/// Byte range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: CsSyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: CsSyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

/// Operators ordered so that longer spellings are tried first.
///
/// `>` never combines with a following `>`: generic argument lists close
/// one bracket at a time and the parser rebuilds shift operators.
const OPERATORS: &[(&str, CsSyntaxKind)] = &[
    ("??=", CsSyntaxKind::QuestionQuestionEq),
    ("<<=", CsSyntaxKind::LtLtEq),
    ("??", CsSyntaxKind::QuestionQuestion),
    ("?.", CsSyntaxKind::QuestionDot),
    ("::", CsSyntaxKind::ColonColon),
    ("..", CsSyntaxKind::DotDot),
    ("==", CsSyntaxKind::EqEq),
    ("=>", CsSyntaxKind::FatArrow),
    ("!=", CsSyntaxKind::BangEq),
    ("<=", CsSyntaxKind::LtEq),
    ("<<", CsSyntaxKind::LtLt),
    (">=", CsSyntaxKind::GtEq),
    ("++", CsSyntaxKind::PlusPlus),
    ("+=", CsSyntaxKind::PlusEq),
    ("--", CsSyntaxKind::MinusMinus),
    ("-=", CsSyntaxKind::MinusEq),
    ("->", CsSyntaxKind::Arrow),
    ("*=", CsSyntaxKind::StarEq),
    ("/=", CsSyntaxKind::SlashEq),
    ("%=", CsSyntaxKind::PercentEq),
    ("&&", CsSyntaxKind::AmpAmp),
    ("&=", CsSyntaxKind::AmpEq),
    ("||", CsSyntaxKind::PipePipe),
    ("|=", CsSyntaxKind::PipeEq),
    ("^=", CsSyntaxKind::CaretEq),
    ("{", CsSyntaxKind::LBrace),
    ("}", CsSyntaxKind::RBrace),
    ("(", CsSyntaxKind::LParen),
    (")", CsSyntaxKind::RParen),
    ("[", CsSyntaxKind::LBracket),
    ("]", CsSyntaxKind::RBracket),
    (";", CsSyntaxKind::Semicolon),
    (",", CsSyntaxKind::Comma),
    (".", CsSyntaxKind::Dot),
    (":", CsSyntaxKind::Colon),
    ("?", CsSyntaxKind::Question),
    ("=", CsSyntaxKind::Eq),
    ("!", CsSyntaxKind::Bang),
    ("<", CsSyntaxKind::Lt),
    (">", CsSyntaxKind::Gt),
    ("+", CsSyntaxKind::Plus),
    ("-", CsSyntaxKind::Minus),
    ("*", CsSyntaxKind::Star),
    ("/", CsSyntaxKind::Slash),
    ("%", CsSyntaxKind::Percent),
    ("&", CsSyntaxKind::Amp),
    ("|", CsSyntaxKind::Pipe),
    ("^", CsSyntaxKind::Caret),
    ("~", CsSyntaxKind::Tilde),
];

/// Lex input preserving all trivia
///
/// - whitespace runs become `Whitespace` tokens
/// - every line break becomes its own `Newline` token
/// - comments and preprocessor lines become comment/`Directive` tokens
///
/// This enables lossless round-tripping: parse(source).text() == source
pub fn lex_with_trivia(input: &str) -> CstLexResult {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
        errors: Vec::new(),
        line_start: true,
    };
    lexer.run();
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<CstToken>,
    errors: Vec<LexerError>,
    /// Only whitespace has been seen since the last line break
    line_start: bool,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) {
        while let Some(ch) = self.peek() {
            let start = self.pos;
            let kind = match ch {
                '\u{feff}' if start == 0 => {
                    self.pos += ch.len_utf8();
                    CsSyntaxKind::ByteOrderMark
                }
                '\r' | '\n' => {
                    if self.rest().starts_with("\r\n") {
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                    }
                    CsSyntaxKind::Newline
                }
                c if c.is_whitespace() => {
                    self.eat_while(|c| c.is_whitespace() && c != '\r' && c != '\n');
                    CsSyntaxKind::Whitespace
                }
                '/' if self.rest().starts_with("//") => {
                    self.eat_while(|c| c != '\r' && c != '\n');
                    CsSyntaxKind::LineComment
                }
                '/' if self.rest().starts_with("/*") => self.block_comment(),
                '#' if self.line_start => {
                    self.eat_while(|c| c != '\r' && c != '\n');
                    CsSyntaxKind::Directive
                }
                '"' | '$' | '@' if self.at_string_start() => self.string(),
                '@' if self.peek_nth(1).is_some_and(is_ident_start) => {
                    self.pos += 1;
                    self.eat_while(is_ident_continue);
                    CsSyntaxKind::Ident
                }
                '\'' => self.char_literal(),
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
                c if is_ident_start(c) => {
                    self.eat_while(is_ident_continue);
                    CsSyntaxKind::from_keyword(&self.input[start..self.pos])
                        .unwrap_or(CsSyntaxKind::Ident)
                }
                _ => self.operator(),
            };

            self.line_start = match kind {
                CsSyntaxKind::Newline => true,
                CsSyntaxKind::Whitespace | CsSyntaxKind::ByteOrderMark => self.line_start,
                _ => false,
            };
            self.push(kind, start);
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn push(&mut self, kind: CsSyntaxKind, start: usize) {
        self.tokens.push(CstToken::new(
            kind,
            &self.input[start..self.pos],
            start..self.pos,
        ));
    }

    fn error(&mut self, message: &str, start: usize) {
        self.errors
            .push(LexerError::new(message, start..self.pos.max(start + 1)));
    }

    fn block_comment(&mut self) -> CsSyntaxKind {
        let start = self.pos;
        self.pos += 2;
        match self.rest().find("*/") {
            Some(end) => self.pos += end + 2,
            None => {
                self.pos = self.input.len();
                self.error("Unterminated block comment", start);
            }
        }
        CsSyntaxKind::BlockComment
    }

    fn at_string_start(&self) -> bool {
        let prefix: String = self.rest().chars().take(3).collect();
        prefix.starts_with('"')
            || prefix.starts_with("$\"")
            || prefix.starts_with("@\"")
            || prefix.starts_with("$@\"")
            || prefix.starts_with("@$\"")
            || prefix.starts_with("$$")
    }

    fn string(&mut self) -> CsSyntaxKind {
        let start = self.pos;
        let mut dollars = 0usize;
        let mut verbatim = false;
        loop {
            match self.peek() {
                Some('$') => dollars += 1,
                Some('@') => verbatim = true,
                _ => break,
            }
            self.pos += 1;
        }

        let quotes = self.rest().chars().take_while(|c| *c == '"').count();
        let ok = if quotes >= 3 && !verbatim {
            self.raw_string_body(quotes)
        } else if dollars > 0 {
            self.interpolated_body(verbatim)
        } else if verbatim {
            self.verbatim_body()
        } else {
            self.regular_body()
        };

        if !ok {
            self.error("Unterminated string literal", start);
        } else if self.rest().starts_with("u8") || self.rest().starts_with("U8") {
            self.pos += 2;
        }

        if dollars > 0 {
            CsSyntaxKind::InterpolatedString
        } else {
            CsSyntaxKind::StringLiteral
        }
    }

    /// Body of `"..."`, starting at the opening quote
    fn regular_body(&mut self) -> bool {
        self.pos += 1;
        while let Some(ch) = self.peek() {
            match ch {
                '\\' => {
                    self.pos += 1;
                    self.bump_char();
                }
                '"' => {
                    self.pos += 1;
                    return true;
                }
                '\r' | '\n' => return false,
                _ => {
                    self.bump_char();
                }
            }
        }
        false
    }

    /// Body of `@"..."`, where `""` is an escaped quote
    fn verbatim_body(&mut self) -> bool {
        self.pos += 1;
        while let Some(ch) = self.bump_char() {
            if ch == '"' {
                if self.peek() == Some('"') {
                    self.pos += 1;
                } else {
                    return true;
                }
            }
        }
        false
    }

    fn raw_string_body(&mut self, quotes: usize) -> bool {
        self.pos += quotes;
        let closer = "\"".repeat(quotes);
        match self.rest().find(&closer) {
            Some(end) => {
                self.pos += end + quotes;
                self.eat_while(|c| c == '"');
                true
            }
            None => {
                self.pos = self.input.len();
                false
            }
        }
    }

    /// Body of `$"..."` or `$@"..."` including nested interpolation holes
    fn interpolated_body(&mut self, verbatim: bool) -> bool {
        self.pos += 1;
        while let Some(ch) = self.peek() {
            match ch {
                '"' if verbatim && self.peek_nth(1) == Some('"') => self.pos += 2,
                '"' => {
                    self.pos += 1;
                    return true;
                }
                '\\' if !verbatim => {
                    self.pos += 1;
                    self.bump_char();
                }
                '{' if self.peek_nth(1) == Some('{') => self.pos += 2,
                '{' => {
                    self.pos += 1;
                    if !self.interpolation_hole() {
                        return false;
                    }
                }
                '\r' | '\n' if !verbatim => return false,
                _ => {
                    self.bump_char();
                }
            }
        }
        false
    }

    /// Skip an interpolation hole up to its closing brace
    fn interpolation_hole(&mut self) -> bool {
        let mut depth = 1usize;
        while let Some(ch) = self.peek() {
            match ch {
                '{' => {
                    depth += 1;
                    self.pos += 1;
                }
                '}' => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return true;
                    }
                }
                '\'' => {
                    self.char_literal();
                }
                '"' | '$' | '@' if self.at_string_start() => {
                    self.string();
                }
                '/' if self.rest().starts_with("/*") => {
                    self.block_comment();
                }
                _ => {
                    self.bump_char();
                }
            }
        }
        false
    }

    fn char_literal(&mut self) -> CsSyntaxKind {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                Some('\\') => {
                    self.pos += 1;
                    self.bump_char();
                }
                Some('\'') => {
                    self.pos += 1;
                    break;
                }
                Some('\r') | Some('\n') | None => {
                    self.error("Unterminated character literal", start);
                    break;
                }
                Some(_) => {
                    self.bump_char();
                }
            }
        }
        CsSyntaxKind::CharLiteral
    }

    fn number(&mut self) -> CsSyntaxKind {
        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            self.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
            self.integer_suffix();
            return CsSyntaxKind::IntLiteral;
        }
        if rest.starts_with("0b") || rest.starts_with("0B") {
            self.pos += 2;
            self.eat_while(|c| c == '0' || c == '1' || c == '_');
            self.integer_suffix();
            return CsSyntaxKind::IntLiteral;
        }

        let mut real = false;
        self.eat_while(|c| c.is_ascii_digit() || c == '_');
        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            real = true;
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_nth(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                real = true;
                self.pos += digit_at;
                self.eat_while(|c| c.is_ascii_digit() || c == '_');
            }
        }
        match self.peek() {
            Some('f' | 'F' | 'd' | 'D' | 'm' | 'M') => {
                self.pos += 1;
                CsSyntaxKind::RealLiteral
            }
            _ if real => CsSyntaxKind::RealLiteral,
            _ => {
                self.integer_suffix();
                CsSyntaxKind::IntLiteral
            }
        }
    }

    fn integer_suffix(&mut self) {
        let mut seen = 0;
        while seen < 2 && matches!(self.peek(), Some('u' | 'U' | 'l' | 'L')) {
            self.pos += 1;
            seen += 1;
        }
    }

    fn operator(&mut self) -> CsSyntaxKind {
        let start = self.pos;
        let rest = self.rest();
        for (text, kind) in OPERATORS {
            if !rest.starts_with(text) {
                continue;
            }
            // `a ?.5 : b` is a conditional, not a conditional access
            if *kind == CsSyntaxKind::QuestionDot
                && rest[2..].starts_with(|c: char| c.is_ascii_digit())
            {
                continue;
            }
            self.pos += text.len();
            return *kind;
        }

        self.bump_char();
        self.error("Unexpected character", start);
        CsSyntaxKind::Error
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<CsSyntaxKind> {
        let (tokens, errors) = lex_with_trivia(input);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    fn texts(input: &str) -> Vec<String> {
        lex_with_trivia(input).0.into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_lossless() {
        let source = "namespace Foo;\r\n\tclass C { /* c */ int? x = a ?? b; } // end\n#region r\n";
        let (tokens, errors) = lex_with_trivia(source);
        assert!(errors.is_empty());
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_keywords_and_contextual_identifiers() {
        use CsSyntaxKind::*;
        assert_eq!(
            kinds("public record R"),
            vec![PublicKw, Whitespace, Ident, Whitespace, Ident]
        );
        assert_eq!(kinds("@class"), vec![Ident]);
    }

    #[test]
    fn test_leading_byte_order_mark_is_trivia() {
        use CsSyntaxKind::*;
        assert_eq!(
            kinds("\u{feff}namespace A;"),
            vec![ByteOrderMark, NamespaceKw, Whitespace, Ident, Semicolon]
        );
        assert_eq!(texts("\u{feff}#if X\n")[0], "\u{feff}");
        assert_eq!(kinds("\u{feff}#if X\n")[1], Directive);

        let (_, errors) = lex_with_trivia("a\u{feff}");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_crlf_is_one_newline() {
        use CsSyntaxKind::*;
        assert_eq!(kinds("a\r\nb"), vec![Ident, Newline, Ident]);
        assert_eq!(texts("a\r\nb")[1], "\r\n");
    }

    #[test]
    fn test_directive_only_at_line_start() {
        use CsSyntaxKind::*;
        assert_eq!(
            kinds("  #if DEBUG\nx"),
            vec![Whitespace, Directive, Newline, Ident]
        );
        let (_, errors) = lex_with_trivia("x #if");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_generic_closers_stay_separate() {
        use CsSyntaxKind::*;
        assert_eq!(
            kinds("A<B<C>>"),
            vec![Ident, Lt, Ident, Lt, Ident, Gt, Gt]
        );
        assert_eq!(kinds("a >= b"), vec![Ident, Whitespace, GtEq, Whitespace, Ident]);
    }

    #[test]
    fn test_null_operators() {
        use CsSyntaxKind::*;
        assert_eq!(kinds("a?.b"), vec![Ident, QuestionDot, Ident]);
        assert_eq!(kinds("a??b"), vec![Ident, QuestionQuestion, Ident]);
        assert_eq!(kinds("a??=b"), vec![Ident, QuestionQuestionEq, Ident]);
        assert_eq!(kinds("a!"), vec![Ident, Bang]);
        assert_eq!(kinds("c?.5:1"), vec![Ident, Question, RealLiteral, Colon, IntLiteral]);
    }

    #[test]
    fn test_strings() {
        use CsSyntaxKind::*;
        assert_eq!(kinds(r#""a\"b""#), vec![StringLiteral]);
        assert_eq!(kinds(r#"@"a""b""#), vec![StringLiteral]);
        assert_eq!(kinds(r#"$"x{a + "}"}y""#), vec![InterpolatedString]);
        assert_eq!(kinds(r#"$@"{{x}} {a}""#), vec![InterpolatedString]);
        assert_eq!(kinds("\"\"\"\nraw \" text\n\"\"\""), vec![StringLiteral]);
        assert_eq!(kinds(r#""abc"u8"#), vec![StringLiteral]);
    }

    #[test]
    fn test_unterminated_string_reports_error() {
        let (tokens, errors) = lex_with_trivia("\"abc\nx");
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens[0].kind, CsSyntaxKind::StringLiteral);
        assert_eq!(tokens[0].text, "\"abc");
    }

    #[test]
    fn test_numbers() {
        use CsSyntaxKind::*;
        assert_eq!(kinds("0x1F"), vec![IntLiteral]);
        assert_eq!(kinds("10UL"), vec![IntLiteral]);
        assert_eq!(kinds("1.5e-3f"), vec![RealLiteral]);
        assert_eq!(kinds("2m"), vec![RealLiteral]);
        assert_eq!(kinds("1..2"), vec![IntLiteral, DotDot, IntLiteral]);
        assert_eq!(kinds(".5"), vec![RealLiteral]);
    }

    #[test]
    fn test_char_literals() {
        use CsSyntaxKind::*;
        assert_eq!(kinds(r"'\''"), vec![CharLiteral]);
        assert_eq!(kinds("'a'"), vec![CharLiteral]);
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, errors) = lex_with_trivia("a ` b");
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens[2].kind, CsSyntaxKind::Error);
    }
}
