//! Rewrite pass framework
//!
//! A pass is a visitor over red nodes that answers, for every node, whether
//! the subtree is untouched or replaced by a new green node:
//!
//! - [`Rewrite::Unchanged`] means the original green node stays in place by
//!   reference. Returning an equal copy instead is a bug.
//! - [`Rewrite::Replaced`] carries the new subtree.
//!
//! [`walk`] is the default rule: it visits every child and rebuilds the node
//! only when some child was replaced, sharing all other children. A pass
//! overrides the kinds it cares about in its `visit` match and delegates
//! everything else to `walk`.
//!
//! Changes to an ancestor of the visited node go through the pending edit
//! list on [`RewriteContext`] and are applied after the whole visit.

pub mod classifier;
pub mod passes;
pub mod pending;
pub mod pipeline;
pub mod provenance;

use rowan::GreenNode;

use crate::cst::SyntaxNode;
use crate::cst::tree;
use crate::diagnostics::Diagnostic;
use crate::result::Result;

pub use classifier::{Complexity, classify};
pub use pending::{PendingEdit, PendingEdits};
pub use pipeline::{PassKind, Pipeline, TransformOutput};

/// Result of visiting one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    Unchanged,
    Replaced(GreenNode),
}

impl Rewrite {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Rewrite::Unchanged)
    }

    /// The green node that now stands where `original` stood
    pub fn into_green(self, original: &SyntaxNode) -> GreenNode {
        match self {
            Rewrite::Unchanged => original.green().into_owned(),
            Rewrite::Replaced(green) => green,
        }
    }
}

impl From<Option<GreenNode>> for Rewrite {
    fn from(value: Option<GreenNode>) -> Self {
        value.map_or(Rewrite::Unchanged, Rewrite::Replaced)
    }
}

/// Knobs shared by all passes of one pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Strip field initializers as well as property initializers
    pub field_initializers: bool,
    /// Let the nullable pass rewrite locals, `typeof` and `as` in bodies
    pub nullable_bodies: bool,
    /// Leave `/* T? */` comments where a nullable annotation was erased
    pub nullable_annotations: bool,
    /// One level of indentation in generated record members
    pub indent_unit: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            field_initializers: false,
            nullable_bodies: false,
            nullable_annotations: true,
            indent_unit: "    ".to_string(),
        }
    }
}

/// A tree-to-tree rewrite
pub trait Pass {
    /// Stable name used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Rewrite `node`; delegate kinds the pass does not handle to [`walk`]
    fn visit(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<Rewrite>;
}

/// Default rule: visit all children, rebuild only if one was replaced
pub fn walk<P: Pass + ?Sized>(
    pass: &mut P,
    node: &SyntaxNode,
    cx: &mut RewriteContext<'_>,
) -> Result<Rewrite> {
    let mut rebuilt: Option<GreenNode> = None;
    for child in node.children() {
        if let Rewrite::Replaced(green) = pass.visit(&child, cx)? {
            let base = rebuilt.get_or_insert_with(|| node.green().into_owned());
            *base = tree::with_child(base, child.index(), green);
        }
    }
    Ok(rebuilt.into())
}

/// Visit the children of `node`, then hand the (possibly rebuilt) node to
/// `lower`
///
/// `lower` sees a detached red root. Returning `None` keeps whatever the
/// children produced.
pub fn walk_then<P, F>(
    pass: &mut P,
    node: &SyntaxNode,
    cx: &mut RewriteContext<'_>,
    lower: F,
) -> Result<Rewrite>
where
    P: Pass + ?Sized,
    F: FnOnce(&mut P, &SyntaxNode, &mut RewriteContext<'_>) -> Result<Option<GreenNode>>,
{
    let children = walk(pass, node, cx)?;
    let current = match &children {
        Rewrite::Unchanged => node.clone(),
        Rewrite::Replaced(green) => SyntaxNode::new_root(green.clone()),
    };
    match lower(pass, &current, cx)? {
        Some(lowered) => Ok(Rewrite::Replaced(lowered)),
        None => Ok(children),
    }
}

/// Per-pass state handed to every `visit` call
#[derive(Debug)]
pub struct RewriteContext<'a> {
    pass: &'static str,
    eol: &'static str,
    options: &'a RewriteOptions,
    pending: PendingEdits,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RewriteContext<'a> {
    pub fn new(pass: &'static str, eol: &'static str, options: &'a RewriteOptions) -> Self {
        Self {
            pass,
            eol,
            options,
            pending: PendingEdits::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn pass(&self) -> &'static str {
        self.pass
    }

    /// End-of-line sequence of the file being rewritten
    pub fn eol(&self) -> &'static str {
        self.eol
    }

    pub fn options(&self) -> &RewriteOptions {
        self.options
    }

    /// Ask for `target` to be replaced once the visit is over
    pub fn register_pending_edit(&mut self, target: &SyntaxNode, replacement: GreenNode) {
        self.pending
            .register(target.green().into_owned(), replacement);
    }

    /// The replacement already registered for `target`, if any
    pub fn pending_replacement(&self, target: &SyntaxNode) -> Option<GreenNode> {
        self.pending.find(&target.green()).cloned()
    }

    /// Update the replacement registered for `target`
    pub fn replace_pending_edit(&mut self, target: &SyntaxNode, replacement: GreenNode) -> bool {
        self.pending.replace(&target.green(), replacement)
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::info(self.pass, message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(pass = self.pass, "{message}");
        self.diagnostics.push(Diagnostic::warning(self.pass, message));
    }

    /// Apply pending edits to the visited tree
    pub fn finish(self, visited: GreenNode) -> (GreenNode, Vec<Diagnostic>) {
        let mut diagnostics = self.diagnostics;
        let root = if self.pending.is_empty() {
            visited
        } else {
            tracing::debug!(pass = self.pass, edits = self.pending.len(), "Applying pending edits");
            self.pending.apply(visited, self.pass, &mut diagnostics)
        };
        (root, diagnostics)
    }
}

/// Run a single pass over `root`
pub fn run_pass(
    pass: &mut dyn Pass,
    root: &GreenNode,
    eol: &'static str,
    options: &RewriteOptions,
) -> Result<(GreenNode, Vec<Diagnostic>)> {
    let mut cx = RewriteContext::new(pass.name(), eol, options);
    let red = SyntaxNode::new_root(root.clone());
    let visited = match pass.visit(&red, &mut cx)? {
        Rewrite::Unchanged => root.clone(),
        Rewrite::Replaced(green) => green,
    };
    Ok(cx.finish(visited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::tree::{is_backed_by, same_node, token};
    use crate::cst::{CsSyntaxKind, parse};

    /// Renames every identifier `old` to `new`
    struct Rename;

    impl Pass for Rename {
        fn name(&self) -> &'static str {
            "rename"
        }

        fn visit(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<Rewrite> {
            match node.kind() {
                CsSyntaxKind::IdentifierName if node.text() == "old" => {
                    let index = node
                        .children_with_tokens()
                        .position(|e| e.kind() == CsSyntaxKind::Ident)
                        .expect("identifier token");
                    Ok(Rewrite::Replaced(tree::with_child(
                        &node.green(),
                        index,
                        token(CsSyntaxKind::Ident, "new"),
                    )))
                }
                _ => walk(self, node, cx),
            }
        }
    }

    #[test]
    fn test_untouched_tree_is_returned_by_reference() {
        let parse = parse("class C { void M() { keep(); } }\n");
        let root = parse.green().clone();
        let (output, diagnostics) =
            run_pass(&mut Rename, &root, "\n", &RewriteOptions::default()).unwrap();
        assert!(same_node(&output, &root));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_only_the_changed_path_is_rebuilt() {
        let parse = parse("class A { void M() { old(); } }\nclass B { void N() { } }\n");
        let root = parse.green().clone();
        let original_b = parse
            .syntax()
            .children()
            .nth(1)
            .expect("class B")
            .green()
            .into_owned();

        let (output, _) = run_pass(&mut Rename, &root, "\n", &RewriteOptions::default()).unwrap();
        let output = SyntaxNode::new_root(output);
        assert_eq!(
            output.to_string(),
            "class A { void M() { new(); } }\nclass B { void N() { } }\n"
        );
        let class_b = output.children().nth(1).expect("class B");
        assert!(is_backed_by(&class_b, &original_b));
        let class_a = output.children().next().expect("class A");
        assert!(!is_backed_by(&class_a, &parse.syntax().children().next().unwrap().green()));
    }

    #[test]
    fn test_rewrite_from_option() {
        assert!(Rewrite::from(None).is_unchanged());
        let green = parse("").into_green();
        assert_eq!(Rewrite::from(Some(green.clone())), Rewrite::Replaced(green));
    }
}
