//! Expression-bodied members
//!
//! `int F() => x;` becomes `int F() { } /* => x */`, `int P => x;` becomes
//! `int P { get; } /* => x */` and an accessor `get => x;` becomes
//! `get; /* => x */`. The body is dropped, not converted into a `return`:
//! the result is a declaration skeleton with the original body kept in the
//! comment. Local functions and lambdas are left alone.

use rowan::GreenNode;

use super::trailing_end;
use crate::cst::ast::{Accessor, ArrowClause, AstNode, HasArrowBody, IndexerDecl, MethodLike, PropertyDecl};
use crate::cst::tree::{self, GreenElement, text_without_trivia};
use crate::cst::trivia::{
    elision_tail, leading_trivia, space, to_green, token_leading, token_trailing,
    trailing_trivia,
};
use crate::cst::{CsSyntaxKind, SyntaxNode, SyntaxToken};
use crate::result::Result;
use crate::rewrite::{Pass, Rewrite, RewriteContext, walk, walk_then};

/// Lowers `=> expr` bodies to empty blocks and auto accessors
#[derive(Debug, Default)]
pub struct ExpressionBodies;

impl ExpressionBodies {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for ExpressionBodies {
    fn name(&self) -> &'static str {
        "expression-bodies"
    }

    fn visit(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<Rewrite> {
        match node.kind() {
            CsSyntaxKind::MethodDecl
            | CsSyntaxKind::OperatorDecl
            | CsSyntaxKind::ConversionOperatorDecl
            | CsSyntaxKind::ConstructorDecl
            | CsSyntaxKind::DestructorDecl => Ok(lower_method(node).into()),
            CsSyntaxKind::PropertyDecl | CsSyntaxKind::IndexerDecl => {
                walk_then(self, node, cx, |_, current, _| Ok(lower_property(current)))
            }
            CsSyntaxKind::Accessor => Ok(lower_accessor(node).into()),
            _ => walk(self, node, cx),
        }
    }
}

/// The pieces of an `=> expr;` body
struct ArrowBody {
    arrow: ArrowClause,
    fat_arrow: SyntaxToken,
    expression: SyntaxNode,
    semicolon: SyntaxToken,
}

impl ArrowBody {
    fn of<N: HasArrowBody>(owner: &N) -> Option<Self> {
        let arrow = owner.arrow_clause()?;
        let fat_arrow = arrow.arrow()?;
        let expression = arrow.expression()?;
        let semicolon = super::token_after(
            owner.syntax(),
            CsSyntaxKind::Semicolon,
            arrow.syntax().index(),
        )?;
        Some(Self {
            arrow,
            fat_arrow,
            expression,
            semicolon,
        })
    }

    /// `/* => expr */`, kept comments, then the `;`'s trailing trivia
    fn tail(&self, include_arrow_leading: bool) -> Vec<GreenElement> {
        let mut displaced = Vec::new();
        if include_arrow_leading {
            displaced.extend(token_leading(&self.fat_arrow));
        }
        displaced.extend(token_trailing(&self.fat_arrow));
        displaced.extend(leading_trivia(&self.expression));
        displaced.extend(trailing_trivia(&self.expression));
        displaced.extend(token_leading(&self.semicolon));

        let elided = format!("=> {}", text_without_trivia(&self.expression));
        elision_tail(&elided, &displaced, &token_trailing(&self.semicolon))
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// Child range of the owner covered by the arrow clause and the `;`
    fn range(&self) -> std::ops::RangeInclusive<usize> {
        self.arrow.syntax().index()..=trailing_end(&self.semicolon)
    }

    fn arrow_leading(&self) -> Vec<GreenElement> {
        to_green(&token_leading(&self.fat_arrow))
            .into_iter()
            .map(Into::into)
            .collect()
    }
}

fn lower_method(node: &SyntaxNode) -> Option<GreenNode> {
    let method = MethodLike::cast(node.clone())?;
    let body = ArrowBody::of(&method)?;

    let mut children = body.arrow_leading();
    children.push(tree::token(CsSyntaxKind::LBrace, "{").into());
    children.push(space().into());
    children.push(tree::token(CsSyntaxKind::RBrace, "}").into());
    children.extend(body.tail(false));
    let block = tree::node(CsSyntaxKind::Block, children);

    Some(tree::splice_children(&node.green(), body.range(), [block.into()]))
}

fn lower_property(node: &SyntaxNode) -> Option<GreenNode> {
    let body = match node.kind() {
        CsSyntaxKind::PropertyDecl => ArrowBody::of(&PropertyDecl::cast(node.clone())?)?,
        _ => ArrowBody::of(&IndexerDecl::cast(node.clone())?)?,
    };

    let getter = tree::node(
        CsSyntaxKind::Accessor,
        vec![
            tree::token(CsSyntaxKind::Ident, "get").into(),
            tree::token(CsSyntaxKind::Semicolon, ";").into(),
            space().into(),
        ],
    );
    let mut children = body.arrow_leading();
    children.push(tree::token(CsSyntaxKind::LBrace, "{").into());
    children.push(space().into());
    children.push(getter.into());
    children.push(tree::token(CsSyntaxKind::RBrace, "}").into());
    children.extend(body.tail(false));
    let accessors = tree::node(CsSyntaxKind::AccessorList, children);

    Some(tree::splice_children(&node.green(), body.range(), [accessors.into()]))
}

fn lower_accessor(node: &SyntaxNode) -> Option<GreenNode> {
    let accessor = Accessor::cast(node.clone())?;
    let body = ArrowBody::of(&accessor)?;

    // Keyword and whatever precedes it, minus the blanks before `=>`
    let mut children: Vec<GreenElement> = node
        .children_with_tokens()
        .take(body.arrow.syntax().index())
        .map(|element| tree::green_element(&element))
        .collect();
    while children
        .last()
        .is_some_and(|child| tree::is_kind(child, CsSyntaxKind::Whitespace))
    {
        children.pop();
    }
    children.push(tree::token(CsSyntaxKind::Semicolon, ";").into());
    children.extend(body.tail(true));

    Some(tree::node(CsSyntaxKind::Accessor, children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::passes::test_support::rewrite;

    fn lower(source: &str) -> String {
        rewrite(&mut ExpressionBodies::new(), source)
    }

    #[test]
    fn test_method() {
        assert_eq!(
            lower("class C { int F() => x; }"),
            "class C { int F() { } /* => x */ }"
        );
        assert_eq!(
            lower("class C\n{\n    int F() => x; // note\n}\n"),
            "class C\n{\n    int F() { } /* => x */ // note\n}\n"
        );
    }

    #[test]
    fn test_operators_constructors_destructors() {
        let source = "class C\n{\n    public C(int v) => value = v;\n    ~C() => Close();\n    public static C operator +(C a, C b) => a;\n    public static implicit operator int(C c) => c.value;\n}\n";
        assert_eq!(
            lower(source),
            "class C\n{\n    public C(int v) { } /* => value = v */\n    ~C() { } /* => Close() */\n    public static C operator +(C a, C b) { } /* => a */\n    public static implicit operator int(C c) { } /* => c.value */\n}\n"
        );
    }

    #[test]
    fn test_property_and_indexer() {
        assert_eq!(
            lower("class C { int P => x; }"),
            "class C { int P { get; } /* => x */ }"
        );
        assert_eq!(
            lower("class C { int this[int i] => items[i]; }"),
            "class C { int this[int i] { get; } /* => items[i] */ }"
        );
    }

    #[test]
    fn test_accessor() {
        assert_eq!(
            lower("class C { int P { get => x; set => x = value; } }"),
            "class C { int P { get; /* => x */ set; /* => x = value */ } }"
        );
    }

    #[test]
    fn test_comments_in_the_way_are_kept() {
        assert_eq!(
            lower("class C { int F() => x /* tail */; }"),
            "class C { int F() { } /* => x */ /* tail */ }"
        );
    }

    #[test]
    fn test_comment_closer_in_body_is_escaped() {
        assert_eq!(
            lower("class C { string F() => \"*/\"; }"),
            "class C { string F() { } /* => \"*\\/\" */ }"
        );
    }

    #[test]
    fn test_local_functions_and_lambdas_untouched() {
        let source = "class C\n{\n    void M()\n    {\n        int Twice(int v) => v * 2;\n        Func<int, int> f = v => v;\n    }\n}\n";
        assert_eq!(lower(source), source);
    }

    #[test]
    fn test_block_bodies_untouched() {
        let source = "class C { int F() { return 1; } int P { get { return 2; } } }";
        assert_eq!(lower(source), source);
    }

    #[test]
    fn test_idempotent() {
        let once = lower("class C { int F() => x; int P => y; int Q { get => z; } }");
        assert_eq!(lower(&once), once);
    }
}
