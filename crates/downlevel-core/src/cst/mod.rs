//! Concrete Syntax Tree (CST) for C#
//!
//! A lossless syntax tree built on the Rowan library. Every byte of the
//! source, including whitespace, comments and preprocessor lines, is kept in
//! the tree, so printing an unmodified tree reproduces the input exactly.
//!
//! ## Architecture
//!
//! - **Green tree**: immutable, position-independent storage. Rewrites build
//!   new green nodes and share every child they did not touch.
//! - **Red tree**: a cursor view with parent pointers, created on demand for
//!   traversal. Node identity is the address of the underlying green node.
//!
//! ## Trivia Handling
//!
//! Trivia is stored as trivia tokens next to the significant token it
//! belongs to:
//! - **Leading trivia**: everything since the previous token's trailing trivia
//! - **Trailing trivia**: everything up to and including the next line break
//!
//! An empty `EndOfFile` token carries whatever follows the last significant
//! token.
//!
//! ## Example
//!
//! ```rust,ignore
//! use downlevel_core::cst::parse;
//!
//! let parse = parse("class C { int? x; }\n");
//! assert!(parse.ok());
//! assert_eq!(parse.syntax().to_string(), "class C { int? x; }\n");
//! ```

mod language;
pub mod lexer;
mod parser;
mod syntax_kind;

pub mod ast;
pub mod tree;
pub mod trivia;

pub use language::CsLanguage;
pub use lexer::{CstLexResult, CstToken, LexerError, lex_with_trivia};
pub use parser::{Parse, ParseError, parse, parse_expression, parse_members, parse_statements};
pub use syntax_kind::CsSyntaxKind;

/// Red node over the C# language
pub type SyntaxNode = rowan::SyntaxNode<CsLanguage>;
/// Red token over the C# language
pub type SyntaxToken = rowan::SyntaxToken<CsLanguage>;
/// Red node or token
pub type SyntaxElement = rowan::SyntaxElement<CsLanguage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lossless_round_trip() {
        let sources = [
            "",
            "\n\n",
            "using System;\r\nclass C\r\n{\r\n}\r\n",
            "// only a comment",
            "#if DEBUG\nclass A { }\n#endif\n",
            "namespace N\n{\n    public record R(int X)\n    {\n    }\n}\n",
            "class C { int F() => x /* tail */; }   \n\n",
        ];

        for source in sources {
            let parse = parse(source);
            assert!(parse.ok(), "{source:?}: {:?}", parse.errors());
            assert_eq!(parse.syntax().to_string(), source);
        }
    }

    #[test]
    fn test_error_trees_still_print_their_source() {
        let source = "class C { int F( { }";
        let parse = parse(source);
        assert!(!parse.ok());
        assert_eq!(parse.syntax().to_string(), source);
    }
}
