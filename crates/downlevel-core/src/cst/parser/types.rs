//! Type syntax and the side-effect free scanners used for lookahead
//!
//! Every `scan_*` function mirrors a building function: it walks the same
//! grammar over significant tokens and returns the offset just past the
//! construct, so callers can decide between a declaration and an expression
//! before anything is emitted.

use super::{Parser, can_start_expression};
use crate::cst::CsSyntaxKind;
use CsSyntaxKind::*;

/// How an ambiguous `?` after a type is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TypeMode {
    /// `?` always makes the type nullable
    Declaration,
    /// `?` is nullable only when no expression can follow it
    Expression,
}

impl Parser<'_> {
    pub(super) fn type_(&mut self) {
        self.type_with(TypeMode::Declaration);
    }

    pub(super) fn type_with(&mut self, mode: TypeMode) {
        let cp = self.checkpoint();
        match self.current() {
            LParen => self.tuple_type(),
            RefKw => {
                self.start_node(RefType);
                self.bump();
                self.eat(ReadonlyKw);
                self.type_with(mode);
                self.finish_node();
                return;
            }
            kind if kind.is_predefined_type() => {
                self.start_node(PredefinedType);
                self.bump();
                self.finish_node();
            }
            Ident => self.type_name(),
            _ => {
                self.error(format!("Expected type, found {}", self.current()));
                return;
            }
        }

        loop {
            match self.current() {
                Question if self.nullable_question(0, mode) => {
                    self.start_node_at(cp, NullableType);
                    self.bump();
                    self.finish_node();
                }
                Star if mode == TypeMode::Declaration => {
                    self.start_node_at(cp, PointerType);
                    self.bump();
                    self.finish_node();
                }
                LBracket if matches!(self.nth(1), RBracket | Comma) => {
                    self.start_node_at(cp, ArrayType);
                    while self.at(LBracket) && matches!(self.nth(1), RBracket | Comma) {
                        self.rank_specifier();
                    }
                    self.finish_node();
                }
                _ => break,
            }
        }
    }

    /// Simple, generic, qualified or alias-qualified name
    pub(super) fn type_name(&mut self) {
        let cp = self.checkpoint();
        if self.nth_at(1, ColonColon) {
            self.start_node(AliasQualifiedName);
            self.start_node(IdentifierName);
            self.bump();
            self.finish_node();
            self.bump();
            self.simple_name(true);
            self.finish_node();
        } else {
            self.simple_name(true);
        }
        while self.at(Dot) && self.nth_at(1, Ident) {
            self.start_node_at(cp, QualifiedName);
            self.bump();
            self.simple_name(true);
            self.finish_node();
        }
    }

    /// `Name` or `Name<Args>`; in expressions the type argument list must be
    /// followed by a token that disambiguates it from a comparison
    pub(super) fn simple_name(&mut self, in_type: bool) {
        if !self.at(Ident) {
            self.error(format!("Expected identifier, found {}", self.current()));
            return;
        }
        let generic = self.nth_at(1, Lt)
            && if in_type {
                self.scan_type_args(1).is_some()
            } else {
                self.generic_follows(1)
            };
        if generic {
            self.start_node(GenericName);
            self.bump();
            self.type_argument_list();
            self.finish_node();
        } else {
            self.start_node(IdentifierName);
            self.bump();
            self.finish_node();
        }
    }

    fn type_argument_list(&mut self) {
        self.start_node(TypeArgumentList);
        self.expect(Lt);
        loop {
            if !matches!(self.current(), Comma | Gt) {
                self.type_();
            }
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Gt);
        self.finish_node();
    }

    fn tuple_type(&mut self) {
        self.start_node(TupleType);
        self.bump();
        loop {
            self.start_node(TupleElement);
            self.type_();
            if self.at(Ident) {
                self.bump();
            }
            self.finish_node();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(RParen);
        self.finish_node();
    }

    /// `[]` or `[,,]`
    pub(super) fn rank_specifier(&mut self) {
        self.start_node(ArrayRankSpecifier);
        self.bump();
        while self.eat(Comma) {}
        self.expect(RBracket);
        self.finish_node();
    }

    pub(super) fn nullable_question(&self, n: usize, mode: TypeMode) -> bool {
        match mode {
            TypeMode::Declaration => true,
            TypeMode::Expression => !can_start_expression(self.nth(n + 1)),
        }
    }

    // ---------------------------------------------------------------------
    // Scanners
    // ---------------------------------------------------------------------

    pub(super) fn scan_type(&self, n: usize, mode: TypeMode) -> Option<usize> {
        let mut i = match self.nth(n) {
            LParen => self.scan_tuple_type(n)?,
            RefKw => {
                let mut j = n + 1;
                if self.nth_at(j, ReadonlyKw) {
                    j += 1;
                }
                return self.scan_type(j, mode);
            }
            kind if kind.is_predefined_type() => n + 1,
            Ident => self.scan_type_name(n)?,
            _ => return None,
        };

        loop {
            match self.nth(i) {
                Question if self.nullable_question(i, mode) => i += 1,
                Star if mode == TypeMode::Declaration => i += 1,
                LBracket if matches!(self.nth(i + 1), RBracket | Comma) => {
                    i += 1;
                    while self.nth_at(i, Comma) {
                        i += 1;
                    }
                    if !self.nth_at(i, RBracket) {
                        return None;
                    }
                    i += 1;
                }
                _ => break,
            }
        }
        Some(i)
    }

    fn scan_type_name(&self, n: usize) -> Option<usize> {
        let mut i = n;
        if self.nth_at(i + 1, ColonColon) {
            if !self.nth_at(i + 2, Ident) {
                return None;
            }
            i += 2;
        }
        i = self.scan_simple_name(i)?;
        while self.nth_at(i, Dot) && self.nth_at(i + 1, Ident) {
            i = self.scan_simple_name(i + 1)?;
        }
        Some(i)
    }

    fn scan_simple_name(&self, n: usize) -> Option<usize> {
        if !self.nth_at(n, Ident) {
            return None;
        }
        if self.nth_at(n + 1, Lt)
            && let Some(end) = self.scan_type_args(n + 1)
        {
            return Some(end);
        }
        Some(n + 1)
    }

    /// Scan `<...>` starting at offset `n`
    pub(super) fn scan_type_args(&self, n: usize) -> Option<usize> {
        if !self.nth_at(n, Lt) {
            return None;
        }
        let mut i = n + 1;
        loop {
            if !matches!(self.nth(i), Comma | Gt) {
                i = self.scan_type(i, TypeMode::Declaration)?;
            }
            match self.nth(i) {
                Comma => i += 1,
                Gt => return Some(i + 1),
                _ => return None,
            }
        }
    }

    fn scan_tuple_type(&self, n: usize) -> Option<usize> {
        let mut i = n + 1;
        let mut elements = 0;
        loop {
            i = self.scan_type(i, TypeMode::Declaration)?;
            if self.nth_at(i, Ident) {
                i += 1;
            }
            elements += 1;
            match self.nth(i) {
                Comma => i += 1,
                RParen if elements >= 2 => return Some(i + 1),
                _ => return None,
            }
        }
    }

    /// `<` at offset `n` opens a type argument list inside an expression
    pub(super) fn generic_follows(&self, n: usize) -> bool {
        let Some(end) = self.scan_type_args(n) else {
            return false;
        };
        matches!(
            self.nth(end),
            LParen
                | RParen
                | RBracket
                | RBrace
                | Colon
                | Semicolon
                | Comma
                | Dot
                | Question
                | QuestionDot
                | QuestionQuestion
                | EqEq
                | BangEq
                | Pipe
                | Caret
                | AmpAmp
                | PipePipe
                | Amp
                | LBracket
                | EndOfFile
        )
    }

    /// Offset of the token matching the opener at offset `n`
    pub(super) fn scan_balanced(&self, n: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = n;
        loop {
            match self.nth(i) {
                LParen | LBracket | LBrace => depth += 1,
                RParen | RBracket | RBrace => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                EndOfFile => return None,
                _ => {}
            }
            i += 1;
        }
    }

    /// The group opened at offset `n` contains a comma at its own depth
    pub(super) fn has_top_level_comma(&self, n: usize) -> bool {
        let Some(close) = self.scan_balanced(n) else {
            return false;
        };
        let mut depth = 0usize;
        for i in n + 1..close {
            match self.nth(i) {
                LParen | LBracket | LBrace => depth += 1,
                RParen | RBracket | RBrace => depth = depth.saturating_sub(1),
                Comma if depth == 0 => return true,
                _ => {}
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::cst::{CsSyntaxKind, parse};

    fn field_type(source: &str) -> (CsSyntaxKind, String) {
        let parse = parse(source);
        assert!(parse.ok(), "{:?}", parse.errors());
        let declaration = parse
            .syntax()
            .descendants()
            .find(|n| n.kind() == CsSyntaxKind::VariableDeclaration)
            .expect("variable declaration");
        let ty = declaration.first_child().expect("type");
        (ty.kind(), ty.to_string().trim().to_string())
    }

    #[test]
    fn test_nullable_type() {
        assert_eq!(
            field_type("class A { string? name; }"),
            (CsSyntaxKind::NullableType, "string?".to_string())
        );
    }

    #[test]
    fn test_generic_with_nested_closers() {
        let (kind, text) = field_type("class A { Dictionary<string, List<int?>> map; }");
        assert_eq!(kind, CsSyntaxKind::GenericName);
        assert_eq!(text, "Dictionary<string, List<int?>>");
    }

    #[test]
    fn test_qualified_and_alias_names() {
        assert_eq!(field_type("class A { System.IO.Stream s; }").0, CsSyntaxKind::QualifiedName);
        assert_eq!(
            field_type("class A { global::System.Int32 s; }").0,
            CsSyntaxKind::QualifiedName
        );
    }

    #[test]
    fn test_array_of_nullable_and_nullable_array() {
        assert_eq!(field_type("class A { string?[] a; }").0, CsSyntaxKind::ArrayType);
        assert_eq!(field_type("class A { string[]? a; }").0, CsSyntaxKind::NullableType);
        assert_eq!(field_type("class A { int[,] grid; }").0, CsSyntaxKind::ArrayType);
    }

    #[test]
    fn test_tuple_type() {
        let (kind, text) = field_type("class A { (int Id, string? Name) pair; }");
        assert_eq!(kind, CsSyntaxKind::TupleType);
        assert_eq!(text, "(int Id, string? Name)");
    }
}
