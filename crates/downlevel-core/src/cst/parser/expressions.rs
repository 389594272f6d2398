//! Expressions and patterns
//!
//! Binary operators are parsed with precedence climbing. Each level below
//! matches one row of the C# operator table; left-associative operators
//! parse their right operand one level higher.

use super::types::TypeMode;
use super::{Parser, can_start_expression};
use crate::cst::CsSyntaxKind;
use CsSyntaxKind::*;

const ASSIGNMENT: u8 = 1;
const CONDITIONAL: u8 = 2;
const COALESCE: u8 = 3;
const LOGICAL_OR: u8 = 4;
const LOGICAL_AND: u8 = 5;
const BITWISE_OR: u8 = 6;
const BITWISE_XOR: u8 = 7;
const BITWISE_AND: u8 = 8;
const EQUALITY: u8 = 9;
const RELATIONAL: u8 = 10;
const SHIFT: u8 = 11;
const ADDITIVE: u8 = 12;
const MULTIPLICATIVE: u8 = 13;
const SWITCH: u8 = 14;
const RANGE: u8 = 15;

impl Parser<'_> {
    pub(super) fn expression(&mut self) {
        self.expr_bp(ASSIGNMENT);
    }

    fn expr_bp(&mut self, min_bp: u8) {
        let cp = self.checkpoint();
        self.unary();

        loop {
            let kind = self.current();

            if min_bp <= ASSIGNMENT && self.at_assignment_operator() {
                self.start_node_at(cp, AssignmentExpr);
                if kind == Gt {
                    // `>>=` arrives as `>` followed by `>=`
                    self.bump();
                }
                self.bump();
                self.expr_bp(ASSIGNMENT);
                self.finish_node();
                continue;
            }

            if kind == Question && min_bp <= CONDITIONAL {
                self.start_node_at(cp, ConditionalExpr);
                self.bump();
                self.expr_bp(ASSIGNMENT);
                self.expect(Colon);
                self.expr_bp(CONDITIONAL);
                self.finish_node();
                continue;
            }

            if kind == QuestionQuestion && min_bp <= COALESCE {
                self.start_node_at(cp, BinaryExpr);
                self.bump();
                self.expr_bp(COALESCE);
                self.finish_node();
                continue;
            }

            if kind == IsKw && min_bp <= RELATIONAL {
                self.start_node_at(cp, IsPatternExpr);
                self.bump();
                self.pattern();
                self.finish_node();
                continue;
            }

            if kind == AsKw && min_bp <= RELATIONAL {
                self.start_node_at(cp, BinaryExpr);
                self.bump();
                self.type_with(TypeMode::Expression);
                self.finish_node();
                continue;
            }

            if kind == SwitchKw && self.nth_at(1, LBrace) && min_bp <= SWITCH {
                self.start_node_at(cp, SwitchExpr);
                self.switch_expression_body();
                self.finish_node();
                continue;
            }

            if self.at_contextual("with") && self.nth_at(1, LBrace) && min_bp <= SWITCH {
                self.start_node_at(cp, WithExpr);
                self.bump();
                self.initializer();
                self.finish_node();
                continue;
            }

            if kind == DotDot && min_bp <= RANGE {
                self.start_node_at(cp, RangeExpr);
                self.bump();
                if can_start_expression(self.current()) {
                    self.unary();
                }
                self.finish_node();
                continue;
            }

            let Some((level, tokens)) = self.binary_operator() else {
                break;
            };
            if level < min_bp {
                break;
            }
            self.start_node_at(cp, BinaryExpr);
            for _ in 0..tokens {
                self.bump();
            }
            self.expr_bp(level + 1);
            self.finish_node();
        }
    }

    fn at_assignment_operator(&self) -> bool {
        match self.current() {
            Eq | PlusEq | MinusEq | StarEq | SlashEq | PercentEq | AmpEq | PipeEq | CaretEq
            | LtLtEq | QuestionQuestionEq => true,
            Gt => self.nth_at(1, GtEq) && self.nth_adjacent(1),
            _ => false,
        }
    }

    /// Level and token count of the left-associative operator at the cursor
    fn binary_operator(&self) -> Option<(u8, usize)> {
        let level = match self.current() {
            PipePipe => LOGICAL_OR,
            AmpAmp => LOGICAL_AND,
            Pipe => BITWISE_OR,
            Caret => BITWISE_XOR,
            Amp => BITWISE_AND,
            EqEq | BangEq => EQUALITY,
            Lt | LtEq | GtEq => RELATIONAL,
            Gt if self.nth_at(1, Gt) && self.nth_adjacent(1) => return Some((SHIFT, 2)),
            Gt => RELATIONAL,
            LtLt => SHIFT,
            Plus | Minus => ADDITIVE,
            Star | Slash | Percent => MULTIPLICATIVE,
            _ => return None,
        };
        Some((level, 1))
    }

    fn unary(&mut self) {
        match self.current() {
            Plus | Minus | Bang | Tilde | PlusPlus | MinusMinus | Amp | Star | Caret => {
                self.start_node(PrefixUnaryExpr);
                self.bump();
                self.unary();
                self.finish_node();
            }
            DotDot => {
                self.start_node(RangeExpr);
                self.bump();
                if can_start_expression(self.current()) {
                    self.unary();
                }
                self.finish_node();
            }
            Ident if self.at_await() => {
                self.start_node(AwaitExpr);
                self.bump();
                self.unary();
                self.finish_node();
            }
            LParen if self.cast_ahead() => {
                self.start_node(CastExpr);
                self.bump();
                self.type_();
                self.expect(RParen);
                self.unary();
                self.finish_node();
            }
            _ => {
                let cp = self.checkpoint();
                self.primary();
                self.postfix_operators(cp);
            }
        }
    }

    fn at_await(&self) -> bool {
        self.at_contextual("await")
            && can_start_expression(self.nth(1))
            && !matches!(
                self.nth(1),
                Minus | Plus | Star | Amp | Caret | DotDot | LBracket
            )
    }

    /// `(Type)` followed by something that can only be a cast operand
    fn cast_ahead(&self) -> bool {
        let Some(close) = self.scan_type(1, TypeMode::Declaration) else {
            return false;
        };
        if !self.nth_at(close, RParen) {
            return false;
        }
        let next = self.nth(close + 1);
        if self.nth(1).is_predefined_type() && close == 2 {
            return can_start_expression(next);
        }
        next.is_predefined_type()
            || matches!(
                next,
                Ident
                    | IntLiteral
                    | RealLiteral
                    | StringLiteral
                    | InterpolatedString
                    | CharLiteral
                    | LParen
                    | Bang
                    | Tilde
                    | ThisKw
                    | BaseKw
                    | NewKw
                    | TypeofKw
                    | DefaultKw
                    | NullKw
                    | TrueKw
                    | FalseKw
                    | SizeofKw
                    | CheckedKw
                    | UncheckedKw
            )
    }

    fn postfix_operators(&mut self, cp: rowan::Checkpoint) {
        loop {
            match self.current() {
                Dot | Arrow => {
                    self.start_node_at(cp, MemberAccessExpr);
                    self.bump();
                    self.simple_name(false);
                    self.finish_node();
                }
                LParen => {
                    self.start_node_at(cp, InvocationExpr);
                    self.argument_list();
                    self.finish_node();
                }
                LBracket => {
                    self.start_node_at(cp, ElementAccessExpr);
                    self.bracketed_argument_list();
                    self.finish_node();
                }
                PlusPlus | MinusMinus | Bang => {
                    self.start_node_at(cp, PostfixUnaryExpr);
                    self.bump();
                    self.finish_node();
                }
                QuestionDot => {
                    self.start_node_at(cp, ConditionalAccessExpr);
                    self.bump();
                    let binding = self.checkpoint();
                    self.start_node(MemberBindingExpr);
                    self.simple_name(false);
                    self.finish_node();
                    self.postfix_operators(binding);
                    self.finish_node();
                    return;
                }
                Question if self.nth_at(1, LBracket) && self.nth_adjacent(1) => {
                    self.start_node_at(cp, ConditionalAccessExpr);
                    self.bump();
                    let binding = self.checkpoint();
                    self.start_node(ElementBindingExpr);
                    self.bracketed_argument_list();
                    self.finish_node();
                    self.postfix_operators(binding);
                    self.finish_node();
                    return;
                }
                ColonColon => {
                    self.start_node_at(cp, AliasQualifiedName);
                    self.bump();
                    self.simple_name(false);
                    self.finish_node();
                }
                _ => return,
            }
        }
    }

    fn primary(&mut self) {
        match self.current() {
            IntLiteral | RealLiteral | StringLiteral | InterpolatedString | CharLiteral | TrueKw
            | FalseKw | NullKw => self.literal(),
            DefaultKw if self.nth_at(1, LParen) => {
                self.start_node(DefaultExpr);
                self.bump();
                self.bump();
                self.type_();
                self.expect(RParen);
                self.finish_node();
            }
            DefaultKw => self.literal(),
            ThisKw => self.single_token_node(ThisExpr),
            BaseKw => self.single_token_node(BaseExpr),
            kind if kind.is_predefined_type() => self.single_token_node(PredefinedType),
            Ident => self.identifier_expression(),
            LParen => self.parenthesized(),
            NewKw => self.new_expression(),
            TypeofKw => self.keyword_with_type(TypeOfExpr),
            SizeofKw => self.keyword_with_type(SizeOfExpr),
            CheckedKw | UncheckedKw => {
                self.start_node(CheckedExpr);
                self.bump();
                self.expect(LParen);
                self.expression();
                self.expect(RParen);
                self.finish_node();
            }
            DelegateKw => self.anonymous_method(),
            StaticKw if self.lambda_ahead() => self.lambda(),
            StackallocKw => self.stackalloc(),
            ThrowKw => {
                self.start_node(ThrowExpr);
                self.bump();
                self.expr_bp(COALESCE);
                self.finish_node();
            }
            RefKw => {
                self.start_node(RefExpr);
                self.bump();
                self.unary();
                self.finish_node();
            }
            LBrace => self.initializer(),
            _ => self.error(format!("Expected expression, found {}", self.current())),
        }
    }

    fn literal(&mut self) {
        self.single_token_node(LiteralExpr);
    }

    fn single_token_node(&mut self, kind: CsSyntaxKind) {
        self.start_node(kind);
        self.bump();
        self.finish_node();
    }

    fn keyword_with_type(&mut self, kind: CsSyntaxKind) {
        self.start_node(kind);
        self.bump();
        self.expect(LParen);
        self.type_();
        self.expect(RParen);
        self.finish_node();
    }

    fn identifier_expression(&mut self) {
        if self.lambda_ahead() {
            self.lambda();
        } else if self.at_contextual("async") && self.nth_at(1, DelegateKw) {
            self.anonymous_method();
        } else if self.query_ahead() {
            self.query();
        } else if self.at_contextual("var")
            && self.nth_at(1, LParen)
            && self.parenthesized_designation_ahead(1)
        {
            self.start_node(DeclarationExpr);
            self.start_node(IdentifierName);
            self.bump();
            self.finish_node();
            self.designation();
            self.finish_node();
        } else {
            self.simple_name(false);
        }
    }

    fn parenthesized_designation_ahead(&self, n: usize) -> bool {
        let Some(close) = self.scan_balanced(n) else {
            return false;
        };
        (n + 1..close).all(|i| matches!(self.nth(i), Ident | Comma | LParen | RParen))
            && matches!(self.nth(close + 1), Eq | InKw)
    }

    fn parenthesized(&mut self) {
        if self.lambda_ahead() {
            self.lambda();
        } else if self.has_top_level_comma(0) {
            self.start_node(TupleExpr);
            self.bump();
            loop {
                self.argument();
                if !self.eat(Comma) {
                    break;
                }
            }
            self.expect(RParen);
            self.finish_node();
        } else {
            self.start_node(ParenExpr);
            self.bump();
            self.expression();
            self.expect(RParen);
            self.finish_node();
        }
    }

    // ---------------------------------------------------------------------
    // Lambdas
    // ---------------------------------------------------------------------

    fn lambda_ahead(&self) -> bool {
        let mut n = 0;
        while (self.nth_contextual(n, "async") || self.nth_at(n, StaticKw))
            && !self.nth_at(n + 1, FatArrow)
        {
            n += 1;
        }
        match self.nth(n) {
            Ident => self.nth_at(n + 1, FatArrow),
            LParen => self
                .scan_balanced(n)
                .is_some_and(|close| self.nth_at(close + 1, FatArrow)),
            _ => false,
        }
    }

    fn lambda(&mut self) {
        self.start_node(LambdaExpr);
        while (self.at_contextual("async") || self.at(StaticKw)) && !self.nth_at(1, FatArrow) {
            self.bump();
        }
        if self.at(LParen) {
            self.parameter_list(true);
        } else {
            self.start_node(Parameter);
            self.bump();
            self.finish_node();
        }
        self.expect(FatArrow);
        if self.at(LBrace) {
            self.block();
        } else {
            self.expression();
        }
        self.finish_node();
    }

    fn anonymous_method(&mut self) {
        self.start_node(AnonymousMethodExpr);
        if self.at_contextual("async") {
            self.bump();
        }
        self.expect(DelegateKw);
        if self.at(LParen) {
            self.parameter_list(false);
        }
        self.block();
        self.finish_node();
    }

    // ---------------------------------------------------------------------
    // Creation expressions
    // ---------------------------------------------------------------------

    fn new_expression(&mut self) {
        match self.nth(1) {
            LBrace => {
                self.start_node(AnonymousObjectCreationExpr);
                self.bump();
                self.bump();
                while !self.at(RBrace) && !self.at_end() {
                    self.with_progress(|p| {
                        p.start_node(AnonymousObjectMember);
                        if p.at(Ident) && p.nth_at(1, Eq) {
                            p.bump();
                            p.bump();
                        }
                        p.expression();
                        p.finish_node();
                    });
                    if !self.eat(Comma) {
                        break;
                    }
                }
                self.expect(RBrace);
                self.finish_node();
            }
            LBracket if matches!(self.nth(2), RBracket | Comma) => {
                self.start_node(ImplicitArrayCreationExpr);
                self.bump();
                self.rank_specifier();
                self.initializer();
                self.finish_node();
            }
            LParen => {
                self.start_node(ObjectCreationExpr);
                self.bump();
                self.argument_list();
                if self.at(LBrace) {
                    self.initializer();
                }
                self.finish_node();
            }
            _ => {
                let cp = self.checkpoint();
                self.bump();
                self.type_();
                let array = self.at(LBracket) || self.prev_kind() == RBracket;
                if array {
                    self.start_node_at(cp, ArrayCreationExpr);
                    while self.at(LBracket) {
                        self.sized_rank_specifier();
                    }
                } else {
                    self.start_node_at(cp, ObjectCreationExpr);
                    if self.at(LParen) {
                        self.argument_list();
                    }
                }
                if self.at(LBrace) {
                    self.initializer();
                }
                self.finish_node();
            }
        }
    }

    fn prev_kind(&self) -> CsSyntaxKind {
        self.pos
            .checked_sub(1)
            .and_then(|p| self.significant.get(p))
            .map(|&raw| self.tokens[raw].kind)
            .unwrap_or(EndOfFile)
    }

    fn sized_rank_specifier(&mut self) {
        self.start_node(ArrayRankSpecifier);
        self.bump();
        loop {
            if !matches!(self.current(), Comma | RBracket) {
                self.expression();
            }
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(RBracket);
        self.finish_node();
    }

    fn stackalloc(&mut self) {
        self.start_node(StackAllocExpr);
        self.bump();
        if !self.at(LBracket) {
            self.type_();
        }
        while self.at(LBracket) {
            self.sized_rank_specifier();
        }
        if self.at(LBrace) {
            self.initializer();
        }
        self.finish_node();
    }

    /// `{ a, b }`, `{ X = 1 }`, `{ [k] = v }` or `{ { k, v } }`
    pub(super) fn initializer(&mut self) {
        self.start_node(InitializerExpr);
        self.expect(LBrace);
        while !self.at(RBrace) && !self.at_end() {
            self.with_progress(|p| {
                if p.at(LBracket) {
                    let cp = p.checkpoint();
                    p.bracketed_argument_list();
                    if p.at(Eq) {
                        p.start_node_at(cp, AssignmentExpr);
                        p.bump();
                        p.expression();
                        p.finish_node();
                    }
                } else {
                    p.expression();
                }
            });
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(RBrace);
        self.finish_node();
    }

    // ---------------------------------------------------------------------
    // Arguments
    // ---------------------------------------------------------------------

    pub(super) fn argument_list(&mut self) {
        self.start_node(ArgumentList);
        self.expect(LParen);
        self.arguments_until(RParen);
        self.expect(RParen);
        self.finish_node();
    }

    pub(super) fn bracketed_argument_list(&mut self) {
        self.start_node(BracketedArgumentList);
        self.expect(LBracket);
        self.arguments_until(RBracket);
        self.expect(RBracket);
        self.finish_node();
    }

    fn arguments_until(&mut self, close: CsSyntaxKind) {
        while !self.at(close) && !self.at_end() {
            self.with_progress(|p| p.argument());
            if !self.eat(Comma) {
                break;
            }
        }
    }

    fn argument(&mut self) {
        self.start_node(Argument);
        if self.at(Ident) && self.nth_at(1, Colon) {
            self.bump();
            self.bump();
        }
        if matches!(self.current(), RefKw | OutKw | InKw) {
            self.bump();
        }
        if self.declaration_expression_ahead() {
            self.start_node(DeclarationExpr);
            self.type_();
            self.designation();
            self.finish_node();
        } else {
            self.expression();
        }
        self.finish_node();
    }

    fn declaration_expression_ahead(&self) -> bool {
        self.scan_type(0, TypeMode::Declaration).is_some_and(|end| {
            end > 0
                && self.nth_at(end, Ident)
                && matches!(self.nth(end + 1), Comma | RParen | RBracket)
        }) || (self.at_contextual("var")
            && self.nth_at(1, LParen)
            && self
                .scan_balanced(1)
                .is_some_and(|close| matches!(self.nth(close + 1), Comma | RParen)))
    }

    pub(super) fn designation(&mut self) {
        match self.current() {
            Ident if self.nth_text(0) == "_" => self.single_token_node(DiscardDesignation),
            Ident => self.single_token_node(SingleVariableDesignation),
            LParen => {
                self.start_node(ParenthesizedDesignation);
                self.bump();
                loop {
                    self.designation();
                    if !self.eat(Comma) {
                        break;
                    }
                }
                self.expect(RParen);
                self.finish_node();
            }
            _ => self.error(format!("Expected designation, found {}", self.current())),
        }
    }

    // ---------------------------------------------------------------------
    // Switch expressions
    // ---------------------------------------------------------------------

    fn switch_expression_body(&mut self) {
        self.bump();
        self.expect(LBrace);
        while !self.at(RBrace) && !self.at_end() {
            self.with_progress(|p| {
                p.start_node(SwitchExprArm);
                p.pattern();
                p.when_clause();
                p.expect(FatArrow);
                p.expression();
                p.finish_node();
            });
            if !self.eat(Comma) {
                break;
            }
        }
        self.expect(RBrace);
    }

    pub(super) fn when_clause(&mut self) {
        if self.at_contextual("when") {
            self.start_node(WhenClause);
            self.bump();
            self.expression();
            self.finish_node();
        }
    }

    // ---------------------------------------------------------------------
    // Query expressions
    // ---------------------------------------------------------------------

    fn query_ahead(&self) -> bool {
        self.at_contextual("from")
            && ((self.nth_at(1, Ident) && self.nth_at(2, InKw))
                || self
                    .scan_type(1, TypeMode::Declaration)
                    .is_some_and(|end| self.nth_at(end, Ident) && self.nth_at(end + 1, InKw)))
    }

    fn query(&mut self) {
        self.start_node(QueryExpr);
        self.from_clause();
        loop {
            let clause = self.nth_text(0).to_string();
            if self.current() != Ident {
                break;
            }
            match clause.as_str() {
                "from" => self.from_clause(),
                "let" => {
                    self.start_node(QueryClause);
                    self.bump();
                    self.expect(Ident);
                    self.expect(Eq);
                    self.expression();
                    self.finish_node();
                }
                "where" | "select" => {
                    self.start_node(QueryClause);
                    self.bump();
                    self.expression();
                    self.finish_node();
                }
                "join" => {
                    self.start_node(QueryClause);
                    self.bump();
                    if !(self.at(Ident) && self.nth_at(1, InKw)) {
                        self.type_();
                    }
                    self.expect(Ident);
                    self.expect(InKw);
                    self.expression();
                    self.expect_contextual("on");
                    self.expression();
                    self.expect_contextual("equals");
                    self.expression();
                    if self.at_contextual("into") {
                        self.bump();
                        self.expect(Ident);
                    }
                    self.finish_node();
                }
                "orderby" => {
                    self.start_node(QueryClause);
                    self.bump();
                    loop {
                        self.expression();
                        if self.at_contextual("ascending") || self.at_contextual("descending") {
                            self.bump();
                        }
                        if !self.eat(Comma) {
                            break;
                        }
                    }
                    self.finish_node();
                }
                "group" => {
                    self.start_node(QueryClause);
                    self.bump();
                    self.expression();
                    self.expect_contextual("by");
                    self.expression();
                    self.finish_node();
                }
                "into" => {
                    self.start_node(QueryClause);
                    self.bump();
                    self.expect(Ident);
                    self.finish_node();
                }
                _ => break,
            }
        }
        self.finish_node();
    }

    fn from_clause(&mut self) {
        self.start_node(QueryClause);
        self.bump();
        if !(self.at(Ident) && self.nth_at(1, InKw)) {
            self.type_();
        }
        self.expect(Ident);
        self.expect(InKw);
        self.expression();
        self.finish_node();
    }

    fn expect_contextual(&mut self, text: &str) {
        if self.at_contextual(text) {
            self.bump();
        } else {
            self.error(format!("Expected '{text}'"));
        }
    }

    // ---------------------------------------------------------------------
    // Patterns
    // ---------------------------------------------------------------------

    pub(super) fn pattern(&mut self) {
        let cp = self.checkpoint();
        self.pattern_and();
        while self.at_contextual("or") {
            self.start_node_at(cp, BinaryPattern);
            self.bump();
            self.pattern_and();
            self.finish_node();
        }
    }

    fn pattern_and(&mut self) {
        let cp = self.checkpoint();
        self.pattern_not();
        while self.at_contextual("and") {
            self.start_node_at(cp, BinaryPattern);
            self.bump();
            self.pattern_not();
            self.finish_node();
        }
    }

    fn pattern_not(&mut self) {
        if self.at_contextual("not") && !matches!(self.nth(1), FatArrow | Colon | RParen | Comma) {
            self.start_node(UnaryPattern);
            self.bump();
            self.pattern_not();
            self.finish_node();
        } else {
            self.primary_pattern();
        }
    }

    fn at_pattern_keyword(&self, n: usize) -> bool {
        ["and", "or", "when"]
            .iter()
            .any(|keyword| self.nth_contextual(n, keyword))
    }

    fn primary_pattern(&mut self) {
        match self.current() {
            LParen if !self.has_top_level_comma(0) && !self.nth_at(1, RParen) => {
                let cp = self.checkpoint();
                self.bump();
                self.pattern();
                self.expect(RParen);
                if self.at(LBrace) || (self.at(Ident) && !self.at_pattern_keyword(0)) {
                    // A single positional subpattern after all
                    self.start_node_at(cp, RecursivePattern);
                    self.recursive_pattern_tail();
                    self.finish_node();
                } else {
                    self.start_node_at(cp, ParenthesizedPattern);
                    self.finish_node();
                }
            }
            LParen | LBrace => {
                self.start_node(RecursivePattern);
                self.recursive_pattern_tail();
                self.finish_node();
            }
            LBracket => {
                self.start_node(ListPattern);
                self.bump();
                while !self.at(RBracket) && !self.at_end() {
                    self.with_progress(|p| p.pattern());
                    if !self.eat(Comma) {
                        break;
                    }
                }
                self.expect(RBracket);
                if self.at(Ident) && !self.at_pattern_keyword(0) {
                    self.designation();
                }
                self.finish_node();
            }
            DotDot => {
                self.start_node(UnaryPattern);
                self.bump();
                if !matches!(self.current(), Comma | RBracket) {
                    self.pattern();
                }
                self.finish_node();
            }
            Lt | LtEq | Gt | GtEq | EqEq | BangEq => {
                self.start_node(RelationalPattern);
                self.bump();
                self.expr_bp(SHIFT);
                self.finish_node();
            }
            Ident if self.at_contextual("var") && matches!(self.nth(1), Ident | LParen) => {
                self.start_node(VarPattern);
                self.bump();
                self.designation();
                self.finish_node();
            }
            Ident
                if self.nth_text(0) == "_"
                    && !matches!(self.nth(1), Dot | Lt | LParen | LBrace | Ident) =>
            {
                self.single_token_node(DiscardPattern);
            }
            _ => self.type_or_constant_pattern(),
        }
    }

    fn type_or_constant_pattern(&mut self) {
        let Some(end) = self.scan_type(0, TypeMode::Expression) else {
            self.start_node(ConstantPattern);
            self.expr_bp(SHIFT);
            self.finish_node();
            return;
        };

        match self.nth(end) {
            Ident if !self.at_pattern_keyword(end) => {
                self.start_node(DeclarationPattern);
                self.type_with(TypeMode::Expression);
                self.designation();
                self.finish_node();
            }
            LParen | LBrace => {
                self.start_node(RecursivePattern);
                self.type_with(TypeMode::Expression);
                self.recursive_pattern_tail();
                self.finish_node();
            }
            Dot | LBracket | Plus | Minus | Star | Slash | Percent | LtLt => {
                self.start_node(ConstantPattern);
                self.expr_bp(SHIFT);
                self.finish_node();
            }
            _ => {
                self.start_node(TypePattern);
                self.type_with(TypeMode::Expression);
                self.finish_node();
            }
        }
    }

    /// Positional clause, property clause and designation of a recursive pattern
    fn recursive_pattern_tail(&mut self) {
        if self.at(LParen) {
            self.start_node(PositionalPatternClause);
            self.bump();
            self.subpatterns_until(RParen);
            self.expect(RParen);
            self.finish_node();
        }
        if self.at(LBrace) {
            self.start_node(PropertyPatternClause);
            self.bump();
            self.subpatterns_until(RBrace);
            self.expect(RBrace);
            self.finish_node();
        }
        if self.at(Ident) && !self.at_pattern_keyword(0) {
            self.designation();
        }
    }

    fn subpatterns_until(&mut self, close: CsSyntaxKind) {
        while !self.at(close) && !self.at_end() {
            self.with_progress(|p| {
                p.start_node(Subpattern);
                let mut n = 0;
                while p.nth_at(n, Ident) && p.nth_at(n + 1, Dot) {
                    n += 2;
                }
                if p.nth_at(n, Ident) && p.nth_at(n + 1, Colon) {
                    for _ in 0..n + 2 {
                        p.bump();
                    }
                }
                p.pattern();
                p.finish_node();
            });
            if !self.eat(Comma) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cst::{CsSyntaxKind, SyntaxNode, parse_expression};

    fn expr(source: &str) -> SyntaxNode {
        let parse = parse_expression(source);
        assert!(parse.ok(), "errors for {source:?}: {:?}", parse.errors());
        assert_eq!(parse.syntax().to_string(), source);
        parse.syntax().first_child().expect("expression")
    }

    #[test]
    fn test_precedence() {
        let node = expr("a + b * c");
        assert_eq!(node.kind(), CsSyntaxKind::BinaryExpr);
        let rhs = node.last_child().expect("rhs");
        assert_eq!(rhs.to_string(), "b * c");
    }

    #[test]
    fn test_coalesce_is_right_associative() {
        let node = expr("a ?? b ?? c");
        assert_eq!(node.kind(), CsSyntaxKind::BinaryExpr);
        assert_eq!(node.last_child().map(|n| n.to_string()), Some("b ?? c".into()));
    }

    #[test]
    fn test_generic_invocation_versus_comparison() {
        assert_eq!(expr("F<int>(x)").kind(), CsSyntaxKind::InvocationExpr);
        assert_eq!(expr("a < b").kind(), CsSyntaxKind::BinaryExpr);
        assert_eq!(expr("a >> 2").kind(), CsSyntaxKind::BinaryExpr);
    }

    #[test]
    fn test_conditional_access_chain() {
        let node = expr("a?.b.c()");
        assert_eq!(node.kind(), CsSyntaxKind::ConditionalAccessExpr);
        let when_not_null = node.last_child().expect("when not null");
        assert_eq!(when_not_null.kind(), CsSyntaxKind::InvocationExpr);
        assert_eq!(when_not_null.to_string(), "b.c()");

        let element = expr("items?[0]");
        assert_eq!(element.kind(), CsSyntaxKind::ConditionalAccessExpr);
    }

    #[test]
    fn test_null_forgiving() {
        let node = expr("name!.Length");
        assert_eq!(node.kind(), CsSyntaxKind::MemberAccessExpr);
        let target = node.first_child().expect("target");
        assert_eq!(target.kind(), CsSyntaxKind::PostfixUnaryExpr);
    }

    #[test]
    fn test_cast_versus_parenthesized() {
        assert_eq!(expr("(Foo)o").kind(), CsSyntaxKind::CastExpr);
        assert_eq!(expr("(int)-1").kind(), CsSyntaxKind::CastExpr);
        assert_eq!(expr("(a) - b").kind(), CsSyntaxKind::BinaryExpr);
        assert_eq!(expr("(a, b)").kind(), CsSyntaxKind::TupleExpr);
    }

    #[test]
    fn test_lambdas() {
        assert_eq!(expr("x => x + 1").kind(), CsSyntaxKind::LambdaExpr);
        assert_eq!(expr("async (a, b) => { }").kind(), CsSyntaxKind::LambdaExpr);
        assert_eq!(expr("delegate { return 1; }").kind(), CsSyntaxKind::AnonymousMethodExpr);
    }

    #[test]
    fn test_is_patterns() {
        let node = expr("o is Foo f && f.Ok");
        assert_eq!(node.kind(), CsSyntaxKind::BinaryExpr);
        let is = node.first_child().expect("is");
        assert_eq!(is.kind(), CsSyntaxKind::IsPatternExpr);
        assert_eq!(
            is.last_child().map(|n| n.kind()),
            Some(CsSyntaxKind::DeclarationPattern)
        );

        let typed = expr("o is string");
        assert_eq!(
            typed.last_child().map(|n| n.kind()),
            Some(CsSyntaxKind::TypePattern)
        );
        let constant = expr("o is null");
        assert_eq!(
            constant.last_child().map(|n| n.kind()),
            Some(CsSyntaxKind::ConstantPattern)
        );
        let combined = expr("c is >= 'a' and <= 'z' or '_'");
        assert_eq!(
            combined.last_child().map(|n| n.kind()),
            Some(CsSyntaxKind::BinaryPattern)
        );
        let recursive = expr("p is Point { X: 0 } origin");
        assert_eq!(
            recursive.last_child().map(|n| n.kind()),
            Some(CsSyntaxKind::RecursivePattern)
        );
    }

    #[test]
    fn test_switch_and_with_expressions() {
        assert_eq!(
            expr("x switch { 1 => \"one\", _ => \"many\" }").kind(),
            CsSyntaxKind::SwitchExpr
        );
        assert_eq!(expr("p with { X = 1 }").kind(), CsSyntaxKind::WithExpr);
    }

    #[test]
    fn test_creation_expressions() {
        assert_eq!(expr("new Foo(1) { X = 2 }").kind(), CsSyntaxKind::ObjectCreationExpr);
        assert_eq!(expr("new int[5]").kind(), CsSyntaxKind::ArrayCreationExpr);
        assert_eq!(expr("new[] { 1, 2 }").kind(), CsSyntaxKind::ImplicitArrayCreationExpr);
        assert_eq!(expr("new { A = 1, b }").kind(), CsSyntaxKind::AnonymousObjectCreationExpr);
        assert_eq!(expr("new()").kind(), CsSyntaxKind::ObjectCreationExpr);
    }

    #[test]
    fn test_query_expression() {
        let node = expr("from c in customers where c.Age > 5 orderby c.Name descending select c");
        assert_eq!(node.kind(), CsSyntaxKind::QueryExpr);
        let clauses = node
            .children()
            .filter(|n| n.kind() == CsSyntaxKind::QueryClause)
            .count();
        assert_eq!(clauses, 4);
    }

    #[test]
    fn test_out_var_argument() {
        let node = expr("int.TryParse(s, out var n)");
        assert!(
            node.descendants()
                .any(|n| n.kind() == CsSyntaxKind::DeclarationExpr)
        );
    }
}
