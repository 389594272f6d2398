//! Init-only accessors become ordinary setters

use crate::cst::ast::{Accessor, AstNode};
use crate::cst::tree;
use crate::cst::{CsSyntaxKind, SyntaxNode};
use crate::result::Result;
use crate::rewrite::{Pass, Rewrite, RewriteContext, walk};

/// `init;` to `set;`, a pure token swap
#[derive(Debug, Default)]
pub struct InitAccessors;

impl InitAccessors {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for InitAccessors {
    fn name(&self) -> &'static str {
        "init-accessors"
    }

    fn visit(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<Rewrite> {
        match node.kind() {
            CsSyntaxKind::Accessor => {
                let Some(accessor) = Accessor::cast(node.clone()) else {
                    return Ok(Rewrite::Unchanged);
                };
                match accessor.keyword() {
                    Some(keyword) if accessor.is_init() => Ok(Rewrite::Replaced(tree::with_child(
                        &node.green(),
                        keyword.index(),
                        tree::token(CsSyntaxKind::Ident, "set"),
                    ))),
                    _ => Ok(Rewrite::Unchanged),
                }
            }
            _ => walk(self, node, cx),
        }
    }
}
