//! Typed AST layer over the CST
//!
//! Thin, zero-cost wrappers over red nodes exposing the pieces the rewrite
//! passes look at. A wrapper never owns data beyond its node; every accessor
//! is a child lookup.
//!
//! # Example
//!
//! ```ignore
//! use downlevel_core::cst::{parse_members, ast::{AstNode, PropertyDecl}};
//!
//! let parse = parse_members("int P { get; set; } = 5;");
//! let property = PropertyDecl::cast(parse.syntax().first_child().unwrap()).unwrap();
//! assert!(property.initializer().is_some());
//! ```

use super::{CsSyntaxKind, SyntaxNode, SyntaxToken};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: CsSyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

/// Helper function to find first child of a specific kind
fn child_of_kind(parent: &SyntaxNode, kind: CsSyntaxKind) -> Option<SyntaxNode> {
    parent.children().find(|n| n.kind() == kind)
}

/// Helper function to find first token of a specific kind
fn token_of_kind(parent: &SyntaxNode, kind: CsSyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

/// First child node that denotes a type
fn type_child(parent: &SyntaxNode) -> Option<SyntaxNode> {
    parent.children().find(|n| n.kind().is_type())
}

/// The expression wrapped by a clause
fn expression_child(parent: &SyntaxNode) -> Option<SyntaxNode> {
    parent.children().next()
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: CsSyntaxKind) -> bool {
                matches!(kind, $(CsSyntaxKind::$kind)|+)
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

// ============================================================================
// Shared clauses
// ============================================================================

ast_node!(
    /// `=> expr`
    ArrowClause,
    ArrowClause
);

impl ArrowClause {
    pub fn arrow(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::FatArrow)
    }

    pub fn expression(&self) -> Option<SyntaxNode> {
        expression_child(&self.syntax)
    }
}

ast_node!(
    /// `= value`
    EqualsValue,
    EqualsValue
);

impl EqualsValue {
    pub fn value(&self) -> Option<SyntaxNode> {
        expression_child(&self.syntax)
    }
}

/// Declarations whose body may be `=> expr;`
pub trait HasArrowBody: AstNode {
    fn arrow_clause(&self) -> Option<ArrowClause> {
        self.syntax().children().find_map(ArrowClause::cast)
    }

    /// The `;` closing an expression body
    fn semicolon(&self) -> Option<SyntaxToken> {
        token_of_kind(self.syntax(), CsSyntaxKind::Semicolon)
    }
}

// ============================================================================
// Members
// ============================================================================

ast_node!(
    /// Methods, operators, conversion operators, constructors, destructors
    MethodLike,
    MethodDecl | OperatorDecl | ConversionOperatorDecl | ConstructorDecl | DestructorDecl
);

impl HasArrowBody for MethodLike {}

impl MethodLike {
    pub fn body(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::Block)
    }

    pub fn return_type(&self) -> Option<SyntaxNode> {
        match self.syntax.kind() {
            CsSyntaxKind::MethodDecl | CsSyntaxKind::OperatorDecl => type_child(&self.syntax),
            _ => None,
        }
    }
}

ast_node!(PropertyDecl, PropertyDecl);

impl HasArrowBody for PropertyDecl {}

impl PropertyDecl {
    pub fn ty(&self) -> Option<SyntaxNode> {
        type_child(&self.syntax)
    }

    pub fn accessor_list(&self) -> Option<AccessorList> {
        self.syntax.children().find_map(AccessorList::cast)
    }

    pub fn initializer(&self) -> Option<EqualsValue> {
        self.syntax.children().find_map(EqualsValue::cast)
    }
}

ast_node!(IndexerDecl, IndexerDecl);

impl HasArrowBody for IndexerDecl {}

impl IndexerDecl {
    pub fn ty(&self) -> Option<SyntaxNode> {
        type_child(&self.syntax)
    }
}

ast_node!(AccessorList, AccessorList);

impl AccessorList {
    pub fn accessors(&self) -> impl Iterator<Item = Accessor> + use<> {
        self.syntax.children().filter_map(Accessor::cast)
    }

    pub fn r_brace(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::RBrace)
    }
}

ast_node!(
    /// `get`, `set`, `init`, `add` or `remove` with its body
    Accessor,
    Accessor
);

impl HasArrowBody for Accessor {}

impl Accessor {
    /// The accessor keyword, a contextual identifier
    pub fn keyword(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::Ident)
    }

    pub fn is_init(&self) -> bool {
        self.keyword().is_some_and(|t| t.text() == "init")
    }
}

ast_node!(
    /// Fields and event fields
    FieldDecl,
    FieldDecl | EventFieldDecl
);

impl FieldDecl {
    pub fn declaration(&self) -> Option<VariableDeclaration> {
        self.syntax.children().find_map(VariableDeclaration::cast)
    }

    pub fn is_const(&self) -> bool {
        token_of_kind(&self.syntax, CsSyntaxKind::ConstKw).is_some()
    }
}

ast_node!(VariableDeclaration, VariableDeclaration);

impl VariableDeclaration {
    pub fn ty(&self) -> Option<SyntaxNode> {
        type_child(&self.syntax)
    }

    pub fn declarators(&self) -> impl Iterator<Item = VariableDeclarator> + use<> {
        self.syntax.children().filter_map(VariableDeclarator::cast)
    }
}

ast_node!(VariableDeclarator, VariableDeclarator);

impl VariableDeclarator {
    pub fn name(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::Ident)
    }

    pub fn initializer(&self) -> Option<EqualsValue> {
        self.syntax.children().find_map(EqualsValue::cast)
    }
}

ast_node!(ParameterList, ParameterList | BracketedParameterList);

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + use<> {
        self.syntax.children().filter_map(Parameter::cast)
    }
}

ast_node!(Parameter, Parameter);

impl Parameter {
    pub fn ty(&self) -> Option<SyntaxNode> {
        type_child(&self.syntax)
    }

    /// The parameter name; `scoped` is an identifier too, so take the last
    pub fn name(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == CsSyntaxKind::Ident)
            .last()
    }

    pub fn default_value(&self) -> Option<EqualsValue> {
        self.syntax.children().find_map(EqualsValue::cast)
    }
}

// ============================================================================
// Declarations
// ============================================================================

ast_node!(RecordDecl, RecordDecl);

impl RecordDecl {
    /// The contextual `record` keyword
    pub fn record_keyword(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == CsSyntaxKind::Ident && t.text() == "record")
    }

    /// `class` or `struct` after `record`
    pub fn kind_keyword(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| matches!(t.kind(), CsSyntaxKind::ClassKw | CsSyntaxKind::StructKw))
    }

    pub fn is_struct(&self) -> bool {
        self.kind_keyword()
            .is_some_and(|t| t.kind() == CsSyntaxKind::StructKw)
    }

    /// The declared name, the identifier following the keywords
    pub fn name(&self) -> Option<SyntaxToken> {
        let mut tokens = self
            .syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token());
        tokens
            .by_ref()
            .find(|t| t.kind() == CsSyntaxKind::Ident && t.text() == "record")?;
        tokens.find(|t| t.kind() == CsSyntaxKind::Ident)
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        child_of_kind(&self.syntax, CsSyntaxKind::ParameterList).and_then(ParameterList::cast)
    }

    pub fn base_list(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::BaseList)
    }

    pub fn l_brace(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::LBrace)
    }

    pub fn r_brace(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::RBrace)
    }
}

ast_node!(
    /// `global using`, `using static`, alias and plain using directives
    UsingDirective,
    UsingDirective
);

impl UsingDirective {
    pub fn global_keyword(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia())
            .filter(|t| t.kind() == CsSyntaxKind::Ident && t.text() == "global")
    }
}

// ============================================================================
// Statements and expressions
// ============================================================================

ast_node!(IfStatement, IfStatement);

impl IfStatement {
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }

    pub fn body(&self) -> Option<SyntaxNode> {
        self.syntax.children().nth(1)
    }
}

ast_node!(
    /// `expr is pattern`
    IsPatternExpr,
    IsPatternExpr
);

impl IsPatternExpr {
    pub fn expression(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }

    pub fn pattern(&self) -> Option<SyntaxNode> {
        self.syntax.children().nth(1)
    }
}

ast_node!(
    /// `T x` or `T _` inside a pattern
    DeclarationPattern,
    DeclarationPattern
);

impl DeclarationPattern {
    pub fn ty(&self) -> Option<SyntaxNode> {
        type_child(&self.syntax)
    }

    pub fn designation(&self) -> Option<SyntaxNode> {
        self.syntax.children().find(|n| {
            matches!(
                n.kind(),
                CsSyntaxKind::SingleVariableDesignation
                    | CsSyntaxKind::DiscardDesignation
                    | CsSyntaxKind::ParenthesizedDesignation
            )
        })
    }
}

/// The operator token of a binary expression
pub fn binary_operator(node: &SyntaxNode) -> Option<SyntaxToken> {
    if node.kind() != CsSyntaxKind::BinaryExpr {
        return None;
    }
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| !t.kind().is_trivia())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{parse, parse_members};

    fn first<T: AstNode>(source: &str) -> T {
        let parse = parse(source);
        assert!(parse.ok(), "{:?}", parse.errors());
        parse
            .syntax()
            .descendants()
            .find_map(T::cast)
            .expect("node of the requested kind")
    }

    #[test]
    fn test_property_parts() {
        let property: PropertyDecl = first("class C { public string? Name { get; init; } = \"\"; }");
        assert_eq!(property.ty().map(|t| t.to_string()), Some("string? ".to_string()));
        assert!(property.initializer().is_some());
        let accessors: Vec<Accessor> = property
            .accessor_list()
            .expect("accessor list")
            .accessors()
            .collect();
        assert_eq!(accessors.len(), 2);
        assert!(!accessors[0].is_init());
        assert!(accessors[1].is_init());
    }

    #[test]
    fn test_arrow_bodies() {
        let method: MethodLike = first("class C { int F() => 42; }");
        let arrow = method.arrow_clause().expect("arrow");
        assert_eq!(arrow.expression().map(|e| e.to_string()), Some("42".to_string()));
        assert!(method.semicolon().is_some());
        assert!(method.body().is_none());

        let accessor: Accessor = first("class C { int P { get => 1; } }");
        assert_eq!(accessor.keyword().map(|t| t.text().to_string()), Some("get".into()));
        assert!(accessor.arrow_clause().is_some());
    }

    #[test]
    fn test_record_parts() {
        let record: RecordDecl = first("public partial record struct Point(int X, int Y) : IShape;");
        assert!(record.record_keyword().is_some());
        assert!(record.is_struct());
        assert_eq!(record.name().map(|t| t.text().to_string()), Some("Point".into()));
        assert_eq!(record.parameter_list().expect("parameters").parameters().count(), 2);
        assert!(record.base_list().is_some());
        assert!(record.l_brace().is_none());
    }

    #[test]
    fn test_field_and_declarators() {
        let parse = parse_members("const int A = 1, B = 2;");
        let field = FieldDecl::cast(parse.syntax().first_child().expect("field")).expect("field");
        assert!(field.is_const());
        let names: Vec<String> = field
            .declaration()
            .expect("declaration")
            .declarators()
            .filter_map(|d| d.name().map(|t| t.text().to_string()))
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_using_and_patterns() {
        let using: UsingDirective = first("global using System;");
        assert!(using.global_keyword().is_some());
        let plain: UsingDirective = first("using global::System;");
        assert!(plain.global_keyword().is_none());

        let is: IsPatternExpr = first("class C { void M(object o) { if (o is string s) { } } }");
        let pattern = DeclarationPattern::cast(is.pattern().expect("pattern")).expect("declaration");
        assert_eq!(
            pattern.designation().map(|d| d.kind()),
            Some(CsSyntaxKind::SingleVariableDesignation)
        );
        let statement = IfStatement::cast(is.syntax().parent().expect("if")).expect("if");
        assert_eq!(statement.body().map(|b| b.kind()), Some(CsSyntaxKind::Block));
    }
}
