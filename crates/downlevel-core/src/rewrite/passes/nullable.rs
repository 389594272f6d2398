//! Nullable reference and value type syntax
//!
//! Declaration signatures lose their `?` annotations and a `/* T? */`
//! comment records the original type. Initializer and default values lose
//! `!`, `??` and `?.` when the expression is simple enough; anything that
//! could run code is left intact behind a warning comment. Member bodies
//! are only touched when body rewriting is enabled.

use rowan::GreenNode;

use crate::cst::ast::{AstNode, EqualsValue, Parameter, binary_operator};
use crate::cst::tree::{self, text_without_trivia};
use crate::cst::trivia::{
    block_comment, insert_after_last_token, leading_trivia, prepend_leading_trivia, space,
    to_green, token_trailing, trailing_trivia, with_leading_trivia, with_trailing_trivia,
};
use crate::cst::{CsSyntaxKind, SyntaxNode, SyntaxToken, parse_expression};
use crate::result::Result;
use crate::rewrite::classify;
use crate::rewrite::provenance::{NULLABLE_WARNING, elided, has_marker, marker};
use crate::rewrite::{Pass, Rewrite, RewriteContext, walk, walk_then};

/// Erases nullable annotations and null operators
#[derive(Debug, Default)]
pub struct Nullable;

impl Nullable {
    pub fn new() -> Self {
        Self
    }
}

/// Where the `/* T? */` comment goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Annotation {
    /// After the last token of the declaration
    AfterDeclaration,
    /// Right after the erased type
    AfterType,
}

impl Pass for Nullable {
    fn name(&self) -> &'static str {
        "nullable"
    }

    fn visit(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<Rewrite> {
        let bodies = cx.options().nullable_bodies;
        match node.kind() {
            CsSyntaxKind::Parameter if is_lambda_parameter(node) => walk(self, node, cx),
            CsSyntaxKind::Parameter
            | CsSyntaxKind::FieldDecl
            | CsSyntaxKind::EventFieldDecl
            | CsSyntaxKind::PropertyDecl
            | CsSyntaxKind::EventDecl
            | CsSyntaxKind::DelegateDecl
            | CsSyntaxKind::MethodDecl
            | CsSyntaxKind::OperatorDecl
            | CsSyntaxKind::IndexerDecl
            | CsSyntaxKind::LocalFunctionStatement => {
                walk_then(self, node, cx, |_, current, cx| Ok(lower_declaration(current, cx)))
            }
            CsSyntaxKind::LocalDeclStatement
            | CsSyntaxKind::UsingStatement
            | CsSyntaxKind::TypeOfExpr
                if bodies =>
            {
                walk_then(self, node, cx, |_, current, cx| Ok(lower_declaration(current, cx)))
            }
            CsSyntaxKind::BinaryExpr if bodies && is_as_expression(node) => {
                walk_then(self, node, cx, |_, current, cx| Ok(lower_declaration(current, cx)))
            }
            _ => walk(self, node, cx),
        }
    }
}

fn is_lambda_parameter(node: &SyntaxNode) -> bool {
    let owner = node.parent().and_then(|parent| match parent.kind() {
        CsSyntaxKind::ParameterList => parent.parent(),
        _ => Some(parent),
    });
    owner.is_some_and(|owner| {
        matches!(
            owner.kind(),
            CsSyntaxKind::LambdaExpr | CsSyntaxKind::AnonymousMethodExpr
        )
    })
}

fn is_as_expression(node: &SyntaxNode) -> bool {
    binary_operator(node).is_some_and(|op| op.kind() == CsSyntaxKind::AsKw)
}

/// The declared type, the values to clean up and where the comment goes
fn lower_declaration(node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Option<GreenNode> {
    let type_of = |parent: &SyntaxNode| parent.children().find(|child| child.kind().is_type());
    let declaration = |parent: &SyntaxNode| {
        parent
            .children()
            .find(|child| child.kind() == CsSyntaxKind::VariableDeclaration)
    };
    let initializers = |declaration: &SyntaxNode| -> Vec<SyntaxNode> {
        declaration
            .children()
            .filter(|child| child.kind() == CsSyntaxKind::VariableDeclarator)
            .filter_map(|declarator| declarator.children().find_map(EqualsValue::cast))
            .filter_map(|initializer| initializer.value())
            .collect()
    };

    let (ty, values, annotation) = match node.kind() {
        CsSyntaxKind::Parameter => {
            let parameter = Parameter::cast(node.clone())?;
            let values = parameter
                .default_value()
                .and_then(|default| default.value())
                .into_iter()
                .collect();
            (parameter.ty(), values, Annotation::AfterDeclaration)
        }
        CsSyntaxKind::FieldDecl | CsSyntaxKind::EventFieldDecl => {
            let declaration = declaration(node)?;
            (type_of(&declaration), initializers(&declaration), Annotation::AfterDeclaration)
        }
        CsSyntaxKind::LocalDeclStatement => {
            (declaration(node).and_then(|d| type_of(&d)), Vec::new(), Annotation::AfterDeclaration)
        }
        CsSyntaxKind::UsingStatement => {
            (declaration(node).and_then(|d| type_of(&d)), Vec::new(), Annotation::AfterType)
        }
        CsSyntaxKind::PropertyDecl => {
            let values = node
                .children()
                .find_map(EqualsValue::cast)
                .and_then(|initializer| initializer.value())
                .into_iter()
                .collect();
            (type_of(node), values, Annotation::AfterDeclaration)
        }
        CsSyntaxKind::EventDecl | CsSyntaxKind::DelegateDecl => {
            (type_of(node), Vec::new(), Annotation::AfterDeclaration)
        }
        CsSyntaxKind::BinaryExpr => {
            // `x as T`: the type follows the operator
            let ty = node.children().nth(1).filter(|child| child.kind().is_type());
            (ty, Vec::new(), Annotation::AfterType)
        }
        _ => (type_of(node), Vec::new(), Annotation::AfterType),
    };

    let annotate = cx.options().nullable_annotations;
    let mut edits = Vec::new();
    let mut comment = None;
    if let Some(ty) = &ty
        && let Some(erased) = erase_type(ty)
    {
        let original = block_comment(&text_without_trivia(ty));
        match annotation {
            Annotation::AfterType if annotate => {
                edits.push((ty.clone(), insert_after_last_token(&erased, vec![space(), original])));
            }
            Annotation::AfterDeclaration if annotate => {
                edits.push((ty.clone(), erased));
                comment = Some(original);
            }
            _ => edits.push((ty.clone(), erased)),
        }
    }
    for value in &values {
        if let Some(lowered) = lower_value(value, cx) {
            edits.push((value.clone(), lowered));
        }
    }

    let replaced = tree::replace_all(node, edits)?;
    Some(match comment {
        Some(comment) => insert_after_last_token(&replaced, vec![space(), comment]),
        None => replaced,
    })
}

// ============================================================================
// Types
// ============================================================================

/// `T?` to `T` anywhere inside `ty`; `None` when there is nothing to erase
fn erase_type(ty: &SyntaxNode) -> Option<GreenNode> {
    if ty.kind() == CsSyntaxKind::NullableType {
        let inner = ty.children().next()?;
        let question = ty
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind() == CsSyntaxKind::Question)?;
        let erased = erase_type(&inner).unwrap_or_else(|| inner.green().into_owned());
        return Some(append_trailing(&erased, &token_trailing(&question)));
    }

    let mut rebuilt: Option<GreenNode> = None;
    for child in ty.children() {
        if let Some(erased) = erase_type(&child) {
            let base = rebuilt.get_or_insert_with(|| ty.green().into_owned());
            *base = tree::with_child(base, child.index(), erased);
        }
    }
    rebuilt
}

/// `node` with `extra` added after its own trailing trivia
fn append_trailing(node: &GreenNode, extra: &[SyntaxToken]) -> GreenNode {
    if extra.is_empty() {
        return node.clone();
    }
    let red = SyntaxNode::new_root(node.clone());
    let mut trailing = to_green(&trailing_trivia(&red));
    trailing.extend(to_green(extra));
    with_trailing_trivia(node, trailing)
}

// ============================================================================
// Expressions
// ============================================================================

fn lower_value(value: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Option<GreenNode> {
    if !has_null_operators(value) {
        return None;
    }
    if classify(value).is_complex() {
        return flag(value, cx);
    }

    let mut dropped = false;
    let erased = erase_expression(value, &mut dropped);
    if has_null_operators(&SyntaxNode::new_root(erased.clone())) {
        return flag(value, cx);
    }
    if !dropped {
        return Some(erased);
    }
    // The fallback or the null check is gone; keep the original in sight
    Some(insert_after_last_token(&erased, vec![space(), elided("", value)]))
}

/// Leave `value` alone behind a warning comment
fn flag(value: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Option<GreenNode> {
    cx.warn(format!(
        "complex nullable expression left intact: {}",
        text_without_trivia(value)
    ));
    if has_marker(value, NULLABLE_WARNING) {
        return None;
    }
    Some(prepend_leading_trivia(
        &value.green().into_owned(),
        vec![marker(NULLABLE_WARNING), space()],
    ))
}

fn has_null_operators(node: &SyntaxNode) -> bool {
    node.descendants().any(|descendant| match descendant.kind() {
        CsSyntaxKind::ConditionalAccessExpr => true,
        CsSyntaxKind::PostfixUnaryExpr => postfix_operator(&descendant)
            .is_some_and(|op| op.kind() == CsSyntaxKind::Bang),
        CsSyntaxKind::BinaryExpr => binary_operator(&descendant)
            .is_some_and(|op| op.kind() == CsSyntaxKind::QuestionQuestion),
        _ => false,
    })
}

fn postfix_operator(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| !token.kind().is_trivia())
}

/// `e!` to `e`, `a ?? b` to `a`, `a?.b` to `a.b`, recursively
///
/// Sets `dropped` when a fallback or null check disappeared.
fn erase_expression(node: &SyntaxNode, dropped: &mut bool) -> GreenNode {
    match node.kind() {
        CsSyntaxKind::PostfixUnaryExpr => {
            if let (Some(operand), Some(bang)) = (
                node.children().next(),
                postfix_operator(node).filter(|op| op.kind() == CsSyntaxKind::Bang),
            ) {
                let erased = erase_expression(&operand, dropped);
                return append_trailing(&erased, &token_trailing(&bang));
            }
        }
        CsSyntaxKind::BinaryExpr
            if binary_operator(node).is_some_and(|op| op.kind() == CsSyntaxKind::QuestionQuestion) =>
        {
            if let Some(left) = node.children().next() {
                *dropped = true;
                let erased = erase_expression(&left, dropped);
                return with_trailing_trivia(&erased, to_green(&trailing_trivia(node)));
            }
        }
        CsSyntaxKind::ConditionalAccessExpr => {
            if let Some(access) = member_access(node, dropped) {
                return access;
            }
        }
        _ => {}
    }

    let mut rebuilt: Option<GreenNode> = None;
    for child in node.children() {
        let erased = erase_expression(&child, dropped);
        if !tree::is_backed_by(&child, &erased) {
            let base = rebuilt.get_or_insert_with(|| node.green().into_owned());
            *base = tree::with_child(base, child.index(), erased);
        }
    }
    rebuilt.unwrap_or_else(|| node.green().into_owned())
}

/// `a?.b.c` as `a.b.c` when everything after `?.` is a plain member chain
fn member_access(node: &SyntaxNode, dropped: &mut bool) -> Option<GreenNode> {
    let mut parts = node.children();
    let target = parts.next()?;
    let chain = parts.next()?;
    let plain = chain.descendants().all(|part| {
        matches!(
            part.kind(),
            CsSyntaxKind::MemberBindingExpr
                | CsSyntaxKind::MemberAccessExpr
                | CsSyntaxKind::IdentifierName
        )
    });
    if !plain {
        return None;
    }

    let mut inner = false;
    let target = erase_expression(&target, &mut inner);
    let target_text = text_without_trivia(&SyntaxNode::new_root(target));
    let parse = parse_expression(&format!("{target_text}.{}", text_without_trivia(&chain)));
    if !parse.ok() {
        return None;
    }
    let access = parse.syntax().children().next()?.green().into_owned();
    *dropped = true;
    let access = with_leading_trivia(&access, to_green(&leading_trivia(node)));
    Some(with_trailing_trivia(&access, to_green(&trailing_trivia(node))))
}
