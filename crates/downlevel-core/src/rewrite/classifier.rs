//! Complexity classifier
//!
//! Decides whether an expression may be rewritten mechanically or must be
//! left intact with a warning. The check is purely syntactic: any construct
//! that can run code or branch makes the whole expression complex. False
//! positives only cost an annotation; a false negative could silently drop
//! behaviour, so the list errs on the side of "complex".

use crate::cst::{CsSyntaxKind, SyntaxNode};

/// Outcome of classifying an expression subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    /// Only names, member access, literals and operators
    Simple,
    /// Contains a call, branch, lambda or query
    Complex,
}

impl Complexity {
    pub fn is_complex(self) -> bool {
        self == Complexity::Complex
    }
}

/// Classify `expression` and everything below it
pub fn classify(expression: &SyntaxNode) -> Complexity {
    let complex_node = expression
        .descendants()
        .any(|node| is_complex_kind(node.kind()));
    if complex_node || has_complex_interpolation(expression) {
        Complexity::Complex
    } else {
        Complexity::Simple
    }
}

fn is_complex_kind(kind: CsSyntaxKind) -> bool {
    matches!(
        kind,
        CsSyntaxKind::ConditionalExpr
            | CsSyntaxKind::SwitchExpr
            | CsSyntaxKind::InvocationExpr
            | CsSyntaxKind::ObjectCreationExpr
            | CsSyntaxKind::AnonymousObjectCreationExpr
            | CsSyntaxKind::AwaitExpr
            | CsSyntaxKind::LambdaExpr
            | CsSyntaxKind::AnonymousMethodExpr
            | CsSyntaxKind::QueryExpr
    )
}

/// Interpolation holes are not parsed; a hole that may call or branch
/// counts as complex
fn has_complex_interpolation(expression: &SyntaxNode) -> bool {
    expression
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .filter(|token| token.kind() == CsSyntaxKind::InterpolatedString)
        .any(|token| token.text().contains(['(', '?']))
}
