//! `global using` directives become file-local usings

use super::trailing_end;
use crate::cst::ast::{AstNode, UsingDirective};
use crate::cst::trivia::space;
use crate::cst::tree;
use crate::cst::{CsSyntaxKind, SyntaxNode};
use crate::result::Result;
use crate::rewrite::provenance::{GLOBAL_MARKER, marker};
use crate::rewrite::{Pass, Rewrite, RewriteContext, walk};

/// Drops the `global` modifier and leaves `/* global */ ` in its place
#[derive(Debug, Default)]
pub struct GlobalUsings;

impl GlobalUsings {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for GlobalUsings {
    fn name(&self) -> &'static str {
        "global-usings"
    }

    fn visit(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<Rewrite> {
        match node.kind() {
            CsSyntaxKind::UsingDirective => {
                let Some(global) = UsingDirective::cast(node.clone())
                    .and_then(|directive| directive.global_keyword())
                else {
                    return Ok(Rewrite::Unchanged);
                };
                let replaced = tree::splice_children(
                    &node.green(),
                    global.index()..=trailing_end(&global),
                    [marker(GLOBAL_MARKER).into(), space().into()],
                );
                Ok(Rewrite::Replaced(replaced))
            }
            // Directives only live at these levels
            CsSyntaxKind::CompilationUnit
            | CsSyntaxKind::Fragment
            | CsSyntaxKind::NamespaceDecl
            | CsSyntaxKind::FileScopedNamespaceDecl => walk(self, node, cx),
            _ => Ok(Rewrite::Unchanged),
        }
    }
}
