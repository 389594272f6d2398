//! Statements

use super::Parser;
use super::types::TypeMode;
use crate::cst::CsSyntaxKind;
use CsSyntaxKind::*;

impl Parser<'_> {
    pub(super) fn block(&mut self) {
        self.start_node(Block);
        self.expect(LBrace);
        while !self.at(RBrace) && !self.at_end() {
            self.with_progress(|p| p.statement());
        }
        self.expect(RBrace);
        self.finish_node();
    }

    pub(super) fn statement(&mut self) {
        match self.current() {
            LBrace => self.block(),
            Semicolon => {
                self.start_node(EmptyStatement);
                self.bump();
                self.finish_node();
            }
            IfKw => self.if_statement(),
            WhileKw => {
                self.start_node(WhileStatement);
                self.bump();
                self.parenthesized_condition();
                self.statement();
                self.finish_node();
            }
            DoKw => {
                self.start_node(DoStatement);
                self.bump();
                self.statement();
                self.expect(WhileKw);
                self.parenthesized_condition();
                self.expect(Semicolon);
                self.finish_node();
            }
            ForKw => self.for_statement(),
            ForeachKw => self.foreach_statement(),
            ReturnKw => self.keyword_with_optional_expression(ReturnStatement),
            ThrowKw => self.keyword_with_optional_expression(ThrowStatement),
            BreakKw => self.keyword_statement(BreakStatement),
            ContinueKw => self.keyword_statement(ContinueStatement),
            GotoKw => {
                self.start_node(GotoStatement);
                self.bump();
                if self.eat(CaseKw) {
                    self.expression();
                } else if !self.eat(DefaultKw) {
                    self.expect(Ident);
                }
                self.expect(Semicolon);
                self.finish_node();
            }
            TryKw => self.try_statement(),
            LockKw => {
                self.start_node(LockStatement);
                self.bump();
                self.parenthesized_condition();
                self.statement();
                self.finish_node();
            }
            SwitchKw => self.switch_statement(),
            CheckedKw | UncheckedKw if self.nth_at(1, LBrace) => {
                self.start_node(CheckedStatement);
                self.bump();
                self.block();
                self.finish_node();
            }
            UnsafeKw if self.nth_at(1, LBrace) => {
                self.start_node(UnsafeStatement);
                self.bump();
                self.block();
                self.finish_node();
            }
            FixedKw => {
                self.start_node(FixedStatement);
                self.bump();
                self.expect(LParen);
                self.local_variable_declaration();
                self.expect(RParen);
                self.statement();
                self.finish_node();
            }
            UsingKw => self.using_statement(),
            ConstKw => self.local_declaration(),
            Ident if self.at_contextual("yield") && matches!(self.nth(1), ReturnKw | BreakKw) => {
                self.start_node(YieldStatement);
                self.bump();
                if self.eat(ReturnKw) {
                    self.expression();
                } else {
                    self.bump();
                }
                self.expect(Semicolon);
                self.finish_node();
            }
            Ident if self.at_contextual("await") && self.nth_at(1, UsingKw) => {
                self.using_statement()
            }
            Ident if self.at_contextual("await") && self.nth_at(1, ForeachKw) => {
                self.foreach_statement()
            }
            Ident if self.nth_at(1, Colon) => {
                self.start_node(LabeledStatement);
                self.bump();
                self.bump();
                self.statement();
                self.finish_node();
            }
            _ if self.local_function_ahead() => self.local_function(),
            _ if self.local_declaration_ahead() => self.local_declaration(),
            _ => {
                self.start_node(ExpressionStatement);
                self.expression();
                self.expect(Semicolon);
                self.finish_node();
            }
        }
    }

    fn keyword_statement(&mut self, kind: CsSyntaxKind) {
        self.start_node(kind);
        self.bump();
        self.expect(Semicolon);
        self.finish_node();
    }

    fn keyword_with_optional_expression(&mut self, kind: CsSyntaxKind) {
        self.start_node(kind);
        self.bump();
        if !self.at(Semicolon) {
            self.expression();
        }
        self.expect(Semicolon);
        self.finish_node();
    }

    fn parenthesized_condition(&mut self) {
        self.expect(LParen);
        self.expression();
        self.expect(RParen);
    }

    fn if_statement(&mut self) {
        self.start_node(IfStatement);
        self.bump();
        self.parenthesized_condition();
        self.statement();
        if self.at(ElseKw) {
            self.start_node(ElseClause);
            self.bump();
            self.statement();
            self.finish_node();
        }
        self.finish_node();
    }

    fn for_statement(&mut self) {
        self.start_node(ForStatement);
        self.bump();
        self.expect(LParen);
        if !self.at(Semicolon) {
            if self.declaration_ahead() {
                self.local_variable_declaration();
            } else {
                self.expression_list();
            }
        }
        self.expect(Semicolon);
        if !self.at(Semicolon) {
            self.expression();
        }
        self.expect(Semicolon);
        if !self.at(RParen) {
            self.expression_list();
        }
        self.expect(RParen);
        self.statement();
        self.finish_node();
    }

    fn expression_list(&mut self) {
        loop {
            self.expression();
            if !self.eat(Comma) {
                break;
            }
        }
    }

    fn foreach_statement(&mut self) {
        self.start_node(ForEachStatement);
        if self.at_contextual("await") {
            self.bump();
        }
        self.bump();
        self.expect(LParen);
        let typed = self
            .scan_type(0, TypeMode::Declaration)
            .is_some_and(|end| self.nth_at(end, Ident) && self.nth_at(end + 1, InKw));
        if typed {
            self.type_();
            self.bump();
        } else {
            self.expression();
        }
        self.expect(InKw);
        self.expression();
        self.expect(RParen);
        self.statement();
        self.finish_node();
    }

    fn try_statement(&mut self) {
        self.start_node(TryStatement);
        self.bump();
        self.block();
        while self.at(CatchKw) {
            self.start_node(CatchClause);
            self.bump();
            if self.at(LParen) {
                self.start_node(CatchDeclaration);
                self.bump();
                self.type_();
                if self.at(Ident) {
                    self.bump();
                }
                self.expect(RParen);
                self.finish_node();
            }
            if self.at_contextual("when") {
                self.start_node(CatchFilter);
                self.bump();
                self.parenthesized_condition();
                self.finish_node();
            }
            self.block();
            self.finish_node();
        }
        if self.at(FinallyKw) {
            self.start_node(FinallyClause);
            self.bump();
            self.block();
            self.finish_node();
        }
        self.finish_node();
    }

    fn using_statement(&mut self) {
        let parenthesized = if self.at_contextual("await") {
            self.nth_at(2, LParen)
        } else {
            self.nth_at(1, LParen)
        };
        if !parenthesized {
            self.local_declaration();
            return;
        }

        self.start_node(UsingStatement);
        if self.at_contextual("await") {
            self.bump();
        }
        self.bump();
        self.expect(LParen);
        if self.declaration_ahead() {
            self.local_variable_declaration();
        } else {
            self.expression();
        }
        self.expect(RParen);
        self.statement();
        self.finish_node();
    }

    fn switch_statement(&mut self) {
        self.start_node(SwitchStatement);
        self.bump();
        if self.at(LParen) && self.has_top_level_comma(0) {
            self.expression();
        } else {
            self.parenthesized_condition();
        }
        self.expect(LBrace);
        while !self.at(RBrace) && !self.at_end() {
            self.with_progress(|p| p.switch_section());
        }
        self.expect(RBrace);
        self.finish_node();
    }

    fn at_switch_label(&self) -> bool {
        self.at(CaseKw) || (self.at(DefaultKw) && self.nth_at(1, Colon))
    }

    fn switch_section(&mut self) {
        if !self.at_switch_label() {
            self.error(format!("Expected case label, found {}", self.current()));
            return;
        }
        self.start_node(SwitchSection);
        while self.at_switch_label() {
            if self.at(CaseKw) {
                self.start_node(CaseLabel);
                self.bump();
                self.pattern();
                self.when_clause();
                self.expect(Colon);
                self.finish_node();
            } else {
                self.start_node(DefaultLabel);
                self.bump();
                self.bump();
                self.finish_node();
            }
        }
        while !self.at_switch_label() && !self.at(RBrace) && !self.at_end() {
            self.with_progress(|p| p.statement());
        }
        self.finish_node();
    }

    // ---------------------------------------------------------------------
    // Local declarations
    // ---------------------------------------------------------------------

    /// `Type name` at the cursor, as in `for`, `using` and `fixed` headers
    fn declaration_ahead(&self) -> bool {
        self.scan_type(0, TypeMode::Declaration)
            .is_some_and(|end| self.nth_at(end, Ident))
    }

    fn local_declaration_ahead(&self) -> bool {
        let mut n = 0;
        while self.nth_contextual(n, "scoped") || self.nth_at(n, ReadonlyKw) {
            n += 1;
        }
        self.scan_type(n, TypeMode::Declaration).is_some_and(|end| {
            self.nth_at(end, Ident)
                && matches!(self.nth(end + 1), Eq | Semicolon | Comma | LBracket)
        })
    }

    fn local_function_ahead(&self) -> bool {
        let mut n = 0;
        while matches!(self.nth(n), StaticKw | UnsafeKw | ExternKw)
            || (self.nth_contextual(n, "async") && !self.nth_at(n + 1, FatArrow))
        {
            n += 1;
        }
        let Some(end) = self.scan_type(n, TypeMode::Declaration) else {
            return false;
        };
        if !self.nth_at(end, Ident) {
            return false;
        }
        let mut open = end + 1;
        if self.nth_at(open, Lt) {
            match self.scan_type_args(open) {
                Some(after) => open = after,
                None => return false,
            }
        }
        if !self.nth_at(open, LParen) {
            return false;
        }
        self.scan_balanced(open).is_some_and(|close| {
            matches!(self.nth(close + 1), LBrace | FatArrow)
                || self.nth_contextual(close + 1, "where")
        })
    }

    fn local_function(&mut self) {
        self.start_node(LocalFunctionStatement);
        while matches!(self.current(), StaticKw | UnsafeKw | ExternKw)
            || self.at_contextual("async")
        {
            self.bump();
        }
        self.type_();
        self.expect(Ident);
        if self.at(Lt) {
            self.start_node(TypeParameterList);
            self.bump();
            loop {
                self.start_node(TypeParameter);
                self.expect(Ident);
                self.finish_node();
                if !self.eat(Comma) {
                    break;
                }
            }
            self.expect(Gt);
            self.finish_node();
        }
        self.parameter_list(false);
        self.constraint_clauses();
        self.body_or_arrow();
        self.finish_node();
    }

    fn local_declaration(&mut self) {
        self.start_node(LocalDeclStatement);
        if self.at_contextual("await") {
            self.bump();
        }
        while matches!(self.current(), UsingKw | ConstKw | ReadonlyKw)
            || self.at_contextual("scoped")
        {
            self.bump();
        }
        self.local_variable_declaration();
        self.expect(Semicolon);
        self.finish_node();
    }

    pub(super) fn local_variable_declaration(&mut self) {
        self.start_node(VariableDeclaration);
        self.type_();
        self.variable_declarators();
        self.finish_node();
    }
}

#[cfg(test)]
mod tests {
    use crate::cst::{CsSyntaxKind, SyntaxNode, parse_statements};

    fn statements(source: &str) -> SyntaxNode {
        let parse = parse_statements(source);
        assert!(parse.ok(), "errors for {source:?}: {:?}", parse.errors());
        assert_eq!(parse.syntax().to_string(), source);
        parse.syntax()
    }

    fn first_kind(source: &str) -> CsSyntaxKind {
        statements(source)
            .first_child()
            .map(|n| n.kind())
            .expect("statement")
    }

    #[test]
    fn test_declaration_versus_expression() {
        assert_eq!(first_kind("var x = 1;"), CsSyntaxKind::LocalDeclStatement);
        assert_eq!(first_kind("List<int> xs = new();"), CsSyntaxKind::LocalDeclStatement);
        assert_eq!(first_kind("string? s;"), CsSyntaxKind::LocalDeclStatement);
        assert_eq!(first_kind("x = 1;"), CsSyntaxKind::ExpressionStatement);
        assert_eq!(first_kind("a ? b : c;"), CsSyntaxKind::ExpressionStatement);
        assert_eq!(first_kind("Foo(x);"), CsSyntaxKind::ExpressionStatement);
        assert_eq!(first_kind("await Task.Delay(1);"), CsSyntaxKind::ExpressionStatement);
        assert_eq!(first_kind("var (a, b) = pair;"), CsSyntaxKind::ExpressionStatement);
    }

    #[test]
    fn test_local_function() {
        assert_eq!(
            first_kind("static int Twice(int v) => v * 2;"),
            CsSyntaxKind::LocalFunctionStatement
        );
        assert_eq!(
            first_kind("async Task RunAsync() { await Task.Yield(); }"),
            CsSyntaxKind::LocalFunctionStatement
        );
    }

    #[test]
    fn test_if_else_chain() {
        let root = statements("if (o is Foo f)\n    Use(f);\nelse if (x) { }\nelse return;\n");
        let statement = root.first_child().expect("if");
        assert_eq!(statement.kind(), CsSyntaxKind::IfStatement);
        assert_eq!(
            root.descendants()
                .filter(|n| n.kind() == CsSyntaxKind::ElseClause)
                .count(),
            2
        );
    }

    #[test]
    fn test_loops() {
        assert_eq!(
            first_kind("for (int i = 0, j = 1; i < 10; i++, j--) { }"),
            CsSyntaxKind::ForStatement
        );
        assert_eq!(
            first_kind("foreach (var (k, v) in map) { }"),
            CsSyntaxKind::ForEachStatement
        );
        assert_eq!(
            first_kind("foreach (string s in items) Console.WriteLine(s);"),
            CsSyntaxKind::ForEachStatement
        );
        assert_eq!(first_kind("do { } while (x);"), CsSyntaxKind::DoStatement);
    }

    #[test]
    fn test_switch_statement() {
        let root = statements(
            "switch (shape)\n{\n    case Circle c when c.R > 0:\n    case null:\n        break;\n    default:\n        return;\n}\n",
        );
        assert_eq!(
            root.descendants()
                .filter(|n| n.kind() == CsSyntaxKind::SwitchSection)
                .count(),
            2
        );
        assert_eq!(
            root.descendants()
                .filter(|n| n.kind() == CsSyntaxKind::CaseLabel)
                .count(),
            2
        );
    }

    #[test]
    fn test_try_using_and_misc() {
        assert_eq!(
            first_kind("try { } catch (IOException e) when (e.HResult != 0) { } finally { }"),
            CsSyntaxKind::TryStatement
        );
        assert_eq!(
            first_kind("using (var s = Open()) { }"),
            CsSyntaxKind::UsingStatement
        );
        assert_eq!(first_kind("using var s = Open();"), CsSyntaxKind::LocalDeclStatement);
        assert_eq!(first_kind("yield return 1;"), CsSyntaxKind::YieldStatement);
        assert_eq!(first_kind("lock (gate) { }"), CsSyntaxKind::LockStatement);
        assert_eq!(first_kind("done: return;"), CsSyntaxKind::LabeledStatement);
    }

    #[test]
    fn test_comments_and_directives_are_kept() {
        statements("#if DEBUG\nLog(); // trace\n#endif\n/* tail */\n");
    }
}
