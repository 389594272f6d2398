//! Construct lowering passes, in pipeline order

mod expression_body;
mod global_using;
mod init_accessor;
mod nullable;
mod pattern_binding;
mod property_initializer;
mod record;

pub use expression_body::ExpressionBodies;
pub use global_using::GlobalUsings;
pub use init_accessor::InitAccessors;
pub use nullable::Nullable;
pub use pattern_binding::PatternBindings;
pub use property_initializer::PropertyInitializers;
pub use record::Records;

use crate::cst::trivia::token_trailing;
use crate::cst::{CsSyntaxKind, SyntaxNode, SyntaxToken};

/// Index of the last child belonging to `token`: its final trailing trivia
/// token, or the token itself
fn trailing_end(token: &SyntaxToken) -> usize {
    token_trailing(token)
        .last()
        .map_or(token.index(), |trivia| trivia.index())
}

/// First direct child token of `kind` after child index `after`
fn token_after(node: &SyntaxNode, kind: CsSyntaxKind, after: usize) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .skip(after + 1)
        .filter_map(|element| element.into_token())
        .find(|token| token.kind() == kind)
}
