//! Compilation units, namespaces, type declarations and members

use rowan::Checkpoint;

use super::Parser;
use super::types::TypeMode;
use crate::cst::CsSyntaxKind;
use CsSyntaxKind::*;

/// Contextual keywords that act as modifiers in front of a declaration
const CONTEXTUAL_MODIFIERS: &[&str] = &["async", "file", "partial", "required", "scoped"];

impl Parser<'_> {
    pub(super) fn compilation_unit_body(&mut self) {
        while !self.at_end() {
            self.with_progress(|p| p.namespace_member());
        }
    }

    fn namespace_member(&mut self) {
        match self.current() {
            ExternKw if self.nth_contextual(1, "alias") => {
                self.start_node(ExternAlias);
                self.bump();
                self.bump();
                self.expect(Ident);
                self.expect(Semicolon);
                self.finish_node();
            }
            UsingKw if self.using_directive_ahead() => self.using_directive(),
            Ident if self.at_contextual("global") && self.nth_at(1, UsingKw) => {
                self.using_directive()
            }
            NamespaceKw => self.namespace_declaration(),
            LBracket
                if matches!(self.nth_text(1), "assembly" | "module") && self.nth_at(2, Colon) =>
            {
                self.attribute_list()
            }
            _ => self.member(false),
        }
    }

    fn using_directive_ahead(&self) -> bool {
        match self.nth(1) {
            LParen => false,
            StaticKw => true,
            _ => !self
                .scan_type(1, TypeMode::Declaration)
                .is_some_and(|end| self.nth_at(end, Ident)),
        }
    }

    fn using_directive(&mut self) {
        self.start_node(UsingDirective);
        if self.at_contextual("global") {
            self.bump();
        }
        self.expect(UsingKw);
        self.eat(StaticKw);
        if self.at(Ident) && self.nth_at(1, Eq) {
            self.bump();
            self.bump();
        }
        self.type_();
        self.expect(Semicolon);
        self.finish_node();
    }

    fn namespace_declaration(&mut self) {
        let cp = self.checkpoint();
        self.bump();
        self.type_name();
        if self.at(Semicolon) {
            self.start_node_at(cp, FileScopedNamespaceDecl);
            self.bump();
            while !self.at_end() {
                self.with_progress(|p| p.namespace_member());
            }
        } else {
            self.start_node_at(cp, NamespaceDecl);
            self.expect(LBrace);
            while !self.at(RBrace) && !self.at_end() {
                self.with_progress(|p| p.namespace_member());
            }
            self.expect(RBrace);
            self.eat(Semicolon);
        }
        self.finish_node();
    }

    /// Members until `stop` holds; `in_type` enables constructors
    pub(super) fn member_list(&mut self, in_type: bool, stop: impl Fn(&Self) -> bool) {
        while !stop(self) && !self.at_end() {
            self.with_progress(|p| p.member(in_type));
        }
    }

    fn member(&mut self, in_type: bool) {
        let cp = self.checkpoint();
        let start = self.pos;
        while self.at(LBracket) {
            self.attribute_list();
        }
        self.modifiers(in_type);
        let has_prefix = self.pos != start;

        match self.current() {
            ClassKw => self.type_declaration(cp, ClassDecl),
            StructKw => self.type_declaration(cp, StructDecl),
            InterfaceKw => self.type_declaration(cp, InterfaceDecl),
            EnumKw => self.enum_declaration(cp),
            DelegateKw if !matches!(self.nth(1), LParen | LBrace) => {
                self.delegate_declaration(cp)
            }
            Ident if self.at_record() => self.record_declaration(cp),
            EventKw => self.event_declaration(cp),
            Tilde if in_type => self.destructor(cp),
            ImplicitKw | ExplicitKw => self.conversion_operator(cp),
            Ident if in_type && self.nth_at(1, LParen) => self.constructor(cp),
            NamespaceKw if !has_prefix => self.namespace_declaration(),
            _ if !has_prefix && !in_type => self.statement(),
            _ if self.member_declaration_ahead() => self.typed_member(cp),
            _ => {
                self.error(format!("Expected member declaration, found {}", self.current()));
                if has_prefix {
                    self.start_node_at(cp, Error);
                    self.finish_node();
                }
            }
        }
    }

    fn modifiers(&mut self, in_type: bool) {
        loop {
            let kind = self.current();
            if kind.is_modifier_keyword() {
                let modifier = match kind {
                    RefKw => {
                        matches!(self.nth(1), StructKw | ReadonlyKw)
                            || self.nth_contextual(1, "partial")
                    }
                    NewKw => in_type,
                    FixedKw => !self.nth_at(1, LParen),
                    UnsafeKw => !self.nth_at(1, LBrace),
                    _ => true,
                };
                if !modifier {
                    break;
                }
                self.bump();
            } else if self.at_contextual_modifier() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn at_contextual_modifier(&self) -> bool {
        if !CONTEXTUAL_MODIFIERS.contains(&self.nth_text(0)) || self.current() != Ident {
            return false;
        }
        let next = self.nth(1);
        next.is_keyword()
            || (next == Ident
                && (self.nth(2).is_keyword()
                    || matches!(self.nth(2), Ident | Lt | Dot | Question | LBracket)))
    }

    fn at_record(&self) -> bool {
        self.at_contextual("record")
            && (self.nth_at(1, Ident)
                || (matches!(self.nth(1), ClassKw | StructKw) && self.nth_at(2, Ident)))
    }

    /// A type followed by something that can only be a member name
    fn member_declaration_ahead(&self) -> bool {
        let Some(end) = self.scan_type(0, TypeMode::Declaration) else {
            return false;
        };
        match self.nth(end) {
            OperatorKw | ThisKw => true,
            Ident => {
                let segments = self.explicit_interface_segments(end);
                let name = self.name_offset_after_segments(end, segments);
                match self.nth(name) {
                    ThisKw => true,
                    Ident => matches!(
                        self.nth(name + 1),
                        LParen | Lt | LBrace | FatArrow | Eq | Semicolon | Comma | LBracket
                    ),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Number of `Name.` prefixes at offset `n` that name an interface
    fn explicit_interface_segments(&self, n: usize) -> usize {
        let mut segments = 0;
        let mut i = n;
        while self.nth_at(i, Ident) {
            let end = if self.nth_at(i + 1, Lt) {
                match self.scan_type_args(i + 1) {
                    Some(end) => end,
                    None => break,
                }
            } else {
                i + 1
            };
            if self.nth_at(end, Dot) && matches!(self.nth(end + 1), Ident | ThisKw) {
                segments += 1;
                i = end + 1;
            } else {
                break;
            }
        }
        segments
    }

    fn name_offset_after_segments(&self, n: usize, segments: usize) -> usize {
        let mut i = n;
        for _ in 0..segments {
            i = if self.nth_at(i + 1, Lt) {
                self.scan_type_args(i + 1).unwrap_or(i + 1)
            } else {
                i + 1
            } + 1;
        }
        i
    }

    fn typed_member(&mut self, cp: Checkpoint) {
        let ty = self.checkpoint();
        self.type_();
        match self.current() {
            OperatorKw => self.operator_declaration(cp),
            ThisKw => self.indexer(cp),
            _ => {
                let segments = self.explicit_interface_segments(0);
                if segments == 0
                    && !matches!(self.nth(1), LParen | Lt | LBrace | FatArrow)
                {
                    self.start_node_at(cp, FieldDecl);
                    self.start_node_at(ty, VariableDeclaration);
                    self.variable_declarators();
                    self.finish_node();
                    self.expect(Semicolon);
                    self.finish_node();
                    return;
                }
                if segments > 0 {
                    self.explicit_interface_specifier(segments);
                }
                if self.at(ThisKw) {
                    self.indexer(cp);
                } else if matches!(self.nth(1), LParen | Lt) {
                    self.method(cp);
                } else {
                    self.property(cp);
                }
            }
        }
    }

    fn explicit_interface_specifier(&mut self, segments: usize) {
        self.start_node(ExplicitInterfaceSpecifier);
        let name = self.checkpoint();
        self.simple_name(true);
        for _ in 1..segments {
            self.start_node_at(name, QualifiedName);
            self.bump();
            self.simple_name(true);
            self.finish_node();
        }
        self.expect(Dot);
        self.finish_node();
    }

    fn method(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, MethodDecl);
        self.expect(Ident);
        if self.at(Lt) {
            self.type_parameter_list();
        }
        self.parameter_list(false);
        self.constraint_clauses();
        self.body_or_arrow();
        self.finish_node();
    }

    fn property(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, PropertyDecl);
        self.expect(Ident);
        match self.current() {
            LBrace => {
                self.accessor_list();
                if self.at(Eq) {
                    self.equals_value();
                    self.expect(Semicolon);
                }
            }
            FatArrow => {
                self.arrow_clause();
                self.expect(Semicolon);
            }
            _ => self.error("Expected property body"),
        }
        self.finish_node();
    }

    fn indexer(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, IndexerDecl);
        self.bump();
        self.bracketed_parameter_list();
        if self.at(FatArrow) {
            self.arrow_clause();
            self.expect(Semicolon);
        } else {
            self.accessor_list();
        }
        self.finish_node();
    }

    fn operator_declaration(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, OperatorDecl);
        self.bump();
        self.eat(CheckedKw);
        if self.at(Gt) && self.nth_at(1, Gt) && self.nth_adjacent(1) {
            self.bump();
        }
        if self.at(LParen) {
            self.error("Expected overloadable operator");
        } else {
            self.bump();
        }
        self.parameter_list(false);
        self.body_or_arrow();
        self.finish_node();
    }

    fn conversion_operator(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, ConversionOperatorDecl);
        self.bump();
        self.expect(OperatorKw);
        self.eat(CheckedKw);
        self.type_();
        self.parameter_list(false);
        self.body_or_arrow();
        self.finish_node();
    }

    fn constructor(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, ConstructorDecl);
        self.bump();
        self.parameter_list(false);
        if self.at(Colon) {
            self.start_node(ConstructorInitializer);
            self.bump();
            if matches!(self.current(), ThisKw | BaseKw) {
                self.bump();
            } else {
                self.error("Expected 'this' or 'base'");
            }
            self.argument_list();
            self.finish_node();
        }
        self.body_or_arrow();
        self.finish_node();
    }

    fn destructor(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, DestructorDecl);
        self.bump();
        self.expect(Ident);
        self.parameter_list(false);
        self.body_or_arrow();
        self.finish_node();
    }

    fn event_declaration(&mut self, cp: Checkpoint) {
        self.bump();
        let ty = self.checkpoint();
        self.type_();
        let segments = self.explicit_interface_segments(0);
        let name = self.name_offset_after_segments(0, segments);
        if segments > 0 || self.nth_at(name + 1, LBrace) {
            self.start_node_at(cp, EventDecl);
            if segments > 0 {
                self.explicit_interface_specifier(segments);
            }
            self.expect(Ident);
            self.accessor_list();
        } else {
            self.start_node_at(cp, EventFieldDecl);
            self.start_node_at(ty, VariableDeclaration);
            self.variable_declarators();
            self.finish_node();
            self.expect(Semicolon);
        }
        self.finish_node();
    }

    pub(super) fn variable_declarators(&mut self) {
        loop {
            self.start_node(VariableDeclarator);
            self.expect(Ident);
            if self.at(LBracket) {
                self.bracketed_argument_list();
            }
            if self.at(Eq) {
                self.equals_value();
            }
            self.finish_node();
            if !self.eat(Comma) {
                break;
            }
        }
    }

    pub(super) fn equals_value(&mut self) {
        self.start_node(EqualsValue);
        self.bump();
        self.expression();
        self.finish_node();
    }

    fn arrow_clause(&mut self) {
        self.start_node(ArrowClause);
        self.bump();
        self.expression();
        self.finish_node();
    }

    /// Block, `=> expr;` or a bare `;`
    pub(super) fn body_or_arrow(&mut self) {
        match self.current() {
            LBrace => self.block(),
            FatArrow => {
                self.arrow_clause();
                self.expect(Semicolon);
            }
            Semicolon => self.bump(),
            _ => self.error(format!("Expected body, found {}", self.current())),
        }
    }

    fn accessor_list(&mut self) {
        self.start_node(AccessorList);
        self.expect(LBrace);
        while !self.at(RBrace) && !self.at_end() {
            self.with_progress(|p| p.accessor());
        }
        self.expect(RBrace);
        self.finish_node();
    }

    fn accessor(&mut self) {
        self.start_node(Accessor);
        while self.at(LBracket) {
            self.attribute_list();
        }
        while matches!(
            self.current(),
            PrivateKw | ProtectedKw | InternalKw | PublicKw | ReadonlyKw
        ) {
            self.bump();
        }
        if self.at(Ident) {
            self.bump();
        } else {
            self.error(format!("Expected accessor, found {}", self.current()));
        }
        self.body_or_arrow();
        self.finish_node();
    }

    // ---------------------------------------------------------------------
    // Type declarations
    // ---------------------------------------------------------------------

    fn type_declaration(&mut self, cp: Checkpoint, kind: CsSyntaxKind) {
        self.start_node_at(cp, kind);
        self.bump();
        self.expect(Ident);
        if self.at(Lt) {
            self.type_parameter_list();
        }
        if self.at(LParen) {
            self.parameter_list(false);
        }
        self.base_list();
        self.constraint_clauses();
        self.type_body();
        self.finish_node();
    }

    fn record_declaration(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, RecordDecl);
        self.bump();
        if matches!(self.current(), ClassKw | StructKw) {
            self.bump();
        }
        self.expect(Ident);
        if self.at(Lt) {
            self.type_parameter_list();
        }
        if self.at(LParen) {
            self.parameter_list(false);
        }
        self.base_list();
        self.constraint_clauses();
        self.type_body();
        self.finish_node();
    }

    fn type_body(&mut self) {
        if self.at(LBrace) {
            self.bump();
            self.member_list(true, |p| p.at(RBrace));
            self.expect(RBrace);
            self.eat(Semicolon);
        } else {
            self.expect(Semicolon);
        }
    }

    fn enum_declaration(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, EnumDecl);
        self.bump();
        self.expect(Ident);
        self.base_list();
        self.expect(LBrace);
        while !self.at(RBrace) && !self.at_end() {
            self.with_progress(|p| {
                p.start_node(EnumMember);
                while p.at(LBracket) {
                    p.attribute_list();
                }
                p.expect(Ident);
                if p.at(Eq) {
                    p.equals_value();
                }
                p.finish_node();
            });
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(RBrace);
        self.eat(Semicolon);
        self.finish_node();
    }

    fn delegate_declaration(&mut self, cp: Checkpoint) {
        self.start_node_at(cp, DelegateDecl);
        self.bump();
        self.type_();
        self.expect(Ident);
        if self.at(Lt) {
            self.type_parameter_list();
        }
        self.parameter_list(false);
        self.constraint_clauses();
        self.expect(Semicolon);
        self.finish_node();
    }

    fn base_list(&mut self) {
        if !self.at(Colon) {
            return;
        }
        self.start_node(BaseList);
        self.bump();
        loop {
            let cp = self.checkpoint();
            self.type_();
            if self.at(LParen) {
                self.start_node_at(cp, PrimaryConstructorBaseType);
                self.argument_list();
            } else {
                self.start_node_at(cp, SimpleBaseType);
            }
            self.finish_node();
            if !self.eat(Comma) {
                break;
            }
        }
        self.finish_node();
    }

    fn type_parameter_list(&mut self) {
        self.start_node(TypeParameterList);
        self.bump();
        loop {
            self.start_node(TypeParameter);
            while self.at(LBracket) {
                self.attribute_list();
            }
            if matches!(self.current(), InKw | OutKw) {
                self.bump();
            }
            self.expect(Ident);
            self.finish_node();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(Gt);
        self.finish_node();
    }

    pub(super) fn constraint_clauses(&mut self) {
        while self.at_contextual("where") && self.nth_at(1, Ident) && self.nth_at(2, Colon) {
            self.start_node(ConstraintClause);
            self.bump();
            self.bump();
            self.bump();
            loop {
                self.start_node(Constraint);
                match self.current() {
                    ClassKw | StructKw => {
                        self.bump();
                        self.eat(Question);
                    }
                    NewKw => {
                        self.bump();
                        self.expect(LParen);
                        self.expect(RParen);
                    }
                    DefaultKw => self.bump(),
                    _ => self.type_(),
                }
                self.finish_node();
                if !self.eat(Comma) {
                    break;
                }
            }
            self.finish_node();
        }
    }

    // ---------------------------------------------------------------------
    // Parameters and attributes
    // ---------------------------------------------------------------------

    /// `(...)`; lambda parameters may omit their type
    pub(super) fn parameter_list(&mut self, lambda: bool) {
        self.start_node(ParameterList);
        self.expect(LParen);
        while !self.at(RParen) && !self.at_end() {
            self.with_progress(|p| p.parameter(lambda));
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(RParen);
        self.finish_node();
    }

    fn bracketed_parameter_list(&mut self) {
        self.start_node(BracketedParameterList);
        self.expect(LBracket);
        while !self.at(RBracket) && !self.at_end() {
            self.with_progress(|p| p.parameter(false));
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(RBracket);
        self.finish_node();
    }

    fn parameter(&mut self, lambda: bool) {
        self.start_node(Parameter);
        while self.at(LBracket) {
            self.attribute_list();
        }
        loop {
            match self.current() {
                RefKw if !lambda || !matches!(self.nth(1), Comma | RParen) => self.bump(),
                OutKw | InKw | ParamsKw | ThisKw | ReadonlyKw => self.bump(),
                Ident if self.at_contextual("scoped") && matches!(self.nth(1), Ident | RefKw) => {
                    self.bump()
                }
                _ => break,
            }
        }
        if lambda && self.at(Ident) && matches!(self.nth(1), Comma | RParen) {
            self.bump();
        } else {
            self.type_();
            self.expect(Ident);
        }
        if self.at(Eq) {
            self.equals_value();
        }
        self.finish_node();
    }

    pub(super) fn attribute_list(&mut self) {
        self.start_node(AttributeList);
        self.bump();
        if (self.at(Ident) || self.current().is_keyword()) && self.nth_at(1, Colon) {
            self.start_node(AttributeTarget);
            self.bump();
            self.bump();
            self.finish_node();
        }
        loop {
            self.start_node(Attribute);
            self.type_name();
            if self.at(LParen) {
                self.argument_list();
            }
            self.finish_node();
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(RBracket);
        self.finish_node();
    }
}
