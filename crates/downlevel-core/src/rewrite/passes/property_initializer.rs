//! Auto-property initializers, and field initializers on request
//!
//! `int P { get; set; } = 5;` becomes `int P { get; set; } /* = 5 */`. With
//! field initializers enabled, `int f = 5;` becomes `int f; /* = 5 */`, one
//! comment per stripped declarator. Constants keep their values.

use rowan::GreenNode;

use super::{token_after, trailing_end};
use crate::cst::ast::{AstNode, EqualsValue, FieldDecl, PropertyDecl};
use crate::cst::tree::{self, GreenElement, text_without_trivia};
use crate::cst::trivia::{
    elision_tail, insert_after_last_token, leading_trivia, token_leading, token_trailing,
    trailing_trivia, with_trailing_trivia,
};
use crate::cst::{CsSyntaxKind, SyntaxNode, SyntaxToken};
use crate::error::DownlevelError;
use crate::result::Result;
use crate::rewrite::{Pass, Rewrite, RewriteContext, walk};

/// Moves member initializers into provenance comments
#[derive(Debug, Default)]
pub struct PropertyInitializers;

impl PropertyInitializers {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for PropertyInitializers {
    fn name(&self) -> &'static str {
        "property-initializers"
    }

    fn visit(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<Rewrite> {
        match node.kind() {
            CsSyntaxKind::PropertyDecl => self.lower_property(node),
            CsSyntaxKind::FieldDecl if cx.options().field_initializers => {
                Ok(lower_field(node).into())
            }
            _ => walk(self, node, cx),
        }
    }
}

impl PropertyInitializers {
    fn lower_property(&self, node: &SyntaxNode) -> Result<Rewrite> {
        let Some(property) = PropertyDecl::cast(node.clone()) else {
            return Ok(Rewrite::Unchanged);
        };
        let Some(initializer) = property.initializer() else {
            return Ok(Rewrite::Unchanged);
        };
        let Some(accessors) = property.accessor_list() else {
            return Err(DownlevelError::unsupported(
                self.name(),
                format!(
                    "initializer on a property without accessor list: {}",
                    text_without_trivia(node)
                ),
            ));
        };
        let Some(close) = accessors.r_brace() else {
            return Ok(Rewrite::Unchanged);
        };
        let semicolon = token_after(node, CsSyntaxKind::Semicolon, initializer.syntax().index());

        let mut displaced = token_trailing(&close);
        displaced.extend(initializer_trivia(&initializer));
        let after = match &semicolon {
            Some(semicolon) => {
                displaced.extend(token_leading(semicolon));
                token_trailing(semicolon)
            }
            None => Vec::new(),
        };
        let tail = elision_tail(&elided_text(&initializer), &displaced, &after);
        let accessors = with_trailing_trivia(&accessors.syntax().green().into_owned(), tail);

        let end = semicolon
            .as_ref()
            .map_or(initializer.syntax().index(), trailing_end);
        let list_index = property
            .accessor_list()
            .map_or(0, |list| list.syntax().index());
        let replaced = tree::splice_children(&node.green(), list_index..=end, [accessors.into()]);
        Ok(Rewrite::Replaced(replaced))
    }
}

fn lower_field(node: &SyntaxNode) -> Option<GreenNode> {
    let field = FieldDecl::cast(node.clone())?;
    if field.is_const() || node.kind() != CsSyntaxKind::FieldDecl {
        return None;
    }
    let declaration = field.declaration()?;

    let mut edits = Vec::new();
    let mut tail = Vec::new();
    for declarator in declaration.declarators() {
        let Some(initializer) = declarator.initializer() else {
            continue;
        };
        let kept: Vec<GreenElement> = trim_blanks(
            declarator
                .syntax()
                .children_with_tokens()
                .take(initializer.syntax().index())
                .map(|element| tree::green_element(&element))
                .collect(),
        );
        let stripped = tree::node(CsSyntaxKind::VariableDeclarator, kept);
        tail.extend(elision_tail(
            &elided_text(&initializer),
            &initializer_trivia(&initializer),
            &[],
        ));
        edits.push((declarator.syntax().clone(), stripped));
    }

    let stripped = tree::replace_all(node, edits)?;
    Some(insert_after_last_token(&stripped, tail))
}

/// `= value`, without outer trivia
fn elided_text(initializer: &EqualsValue) -> String {
    match initializer.value() {
        Some(value) => format!("= {}", text_without_trivia(&value)),
        None => text_without_trivia(initializer.syntax()),
    }
}

/// Trivia around the `=` and the value that the comment replaces
fn initializer_trivia(initializer: &EqualsValue) -> Vec<SyntaxToken> {
    let mut trivia = Vec::new();
    let equals = initializer
        .syntax()
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| token.kind() == CsSyntaxKind::Eq);
    if let Some(equals) = equals {
        trivia.extend(token_leading(&equals));
        trivia.extend(token_trailing(&equals));
    }
    if let Some(value) = initializer.value() {
        trivia.extend(leading_trivia(&value));
        trivia.extend(trailing_trivia(&value));
    }
    trivia
}

fn trim_blanks(mut elements: Vec<GreenElement>) -> Vec<GreenElement> {
    while elements
        .last()
        .is_some_and(|element| tree::is_kind(element, CsSyntaxKind::Whitespace))
    {
        elements.pop();
    }
    elements
}

#[cfg(test)]
mod tests {
    use rowan::GreenNodeBuilder;

    use super::*;
    use crate::error::ErrorKind;
    use crate::rewrite::passes::test_support::{rewrite, rewrite_with};
    use crate::rewrite::{RewriteOptions, run_pass};

    fn lower(source: &str) -> String {
        rewrite(&mut PropertyInitializers::new(), source)
    }

    fn lower_fields(source: &str) -> String {
        let options = RewriteOptions {
            field_initializers: true,
            ..RewriteOptions::default()
        };
        rewrite_with(&mut PropertyInitializers::new(), source, &options).0
    }

    #[test]
    fn test_property_initializer() {
        assert_eq!(
            lower("class C { int P { get; set; } = 5; }"),
            "class C { int P { get; set; } /* = 5 */ }"
        );
        assert_eq!(
            lower("class C\n{\n    public List<int> Items { get; } = new List<int>(); // cache\n}\n"),
            "class C\n{\n    public List<int> Items { get; } /* = new List<int>() */ // cache\n}\n"
        );
    }

    #[test]
    fn test_comment_inside_initializer_trivia_is_kept() {
        assert_eq!(
            lower("class C { int P { get; } = /* seed */ 1; }"),
            "class C { int P { get; } /* = 1 */ /* seed */ }"
        );
    }

    #[test]
    fn test_properties_without_initializer_untouched() {
        let source = "class C { int P { get; set; } int Q => 1; }";
        assert_eq!(lower(source), source);
    }

    #[test]
    fn test_fields_are_opt_in() {
        let source = "class C { int f = 5; }";
        assert_eq!(lower(source), source);
        assert_eq!(lower_fields(source), "class C { int f; /* = 5 */ }");
    }

    #[test]
    fn test_one_comment_per_declarator() {
        assert_eq!(
            lower_fields("class C\n{\n    private int a = 1, b, c = 3;\n}\n"),
            "class C\n{\n    private int a, b, c; /* = 1 */ /* = 3 */\n}\n"
        );
    }

    #[test]
    fn test_constants_keep_values() {
        let source = "class C { const int A = 1; }";
        assert_eq!(lower_fields(source), source);
    }

    #[test]
    fn test_property_without_accessor_list_aborts() {
        // `int P = 5;` shaped as a property cannot come out of the parser
        let mut builder = GreenNodeBuilder::new();
        builder.start_node(CsSyntaxKind::CompilationUnit.into());
        builder.start_node(CsSyntaxKind::PropertyDecl.into());
        builder.start_node(CsSyntaxKind::PredefinedType.into());
        builder.token(CsSyntaxKind::IntKw.into(), "int");
        builder.token(CsSyntaxKind::Whitespace.into(), " ");
        builder.finish_node();
        builder.token(CsSyntaxKind::Ident.into(), "P");
        builder.token(CsSyntaxKind::Whitespace.into(), " ");
        builder.start_node(CsSyntaxKind::EqualsValue.into());
        builder.token(CsSyntaxKind::Eq.into(), "=");
        builder.token(CsSyntaxKind::Whitespace.into(), " ");
        builder.start_node(CsSyntaxKind::LiteralExpr.into());
        builder.token(CsSyntaxKind::IntLiteral.into(), "5");
        builder.finish_node();
        builder.finish_node();
        builder.token(CsSyntaxKind::Semicolon.into(), ";");
        builder.finish_node();
        builder.finish_node();
        let root = builder.finish();
        assert_eq!(tree::green_text(&root), "int P = 5;");

        let err = run_pass(
            &mut PropertyInitializers::new(),
            &root,
            "\n",
            &RewriteOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_idempotent() {
        let once = lower("class C { int P { get; set; } = 5; string Q { get; } = \"q\"; }");
        assert_eq!(lower(&once), once);
    }
}
