//! Deferred ancestor rewrites
//!
//! A visitor sitting on a node cannot replace one of that node's ancestors:
//! the ancestor is rebuilt by the traversal after the visitor returns. The
//! visitor instead records the ancestor it wants to change together with the
//! complete replacement. Once the traversal is done the edits are applied in
//! registration order, each one locating its target by identity in the
//! already rewritten tree.
//!
//! A target that no longer exists (because an earlier edit or the traversal
//! rebuilt it) is dropped with a warning. A stale edit is never applied to a
//! look-alike node.

use rowan::{GreenNode, GreenNodeData};
use tracing::warn;

use crate::cst::tree::{self, kind_of, same_node};
use crate::diagnostics::Diagnostic;

/// Replace `target`, found by identity, with `replacement`
#[derive(Debug, Clone)]
pub struct PendingEdit {
    target: GreenNode,
    replacement: GreenNode,
}

impl PendingEdit {
    pub fn target(&self) -> &GreenNode {
        &self.target
    }

    pub fn replacement(&self) -> &GreenNode {
        &self.replacement
    }
}

/// Edits recorded during one pass, in registration order
#[derive(Debug, Default)]
pub struct PendingEdits {
    edits: Vec<PendingEdit>,
}

impl PendingEdits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, target: GreenNode, replacement: GreenNode) {
        self.edits.push(PendingEdit {
            target,
            replacement,
        });
    }

    /// Replacement registered first for `target`
    pub fn find(&self, target: &GreenNodeData) -> Option<&GreenNode> {
        self.edits
            .iter()
            .find(|edit| same_node(&edit.target, target))
            .map(|edit| &edit.replacement)
    }

    /// Update the replacement of the first edit for `target` in place
    ///
    /// Returns `false` when nothing is registered for `target`.
    pub fn replace(&mut self, target: &GreenNodeData, replacement: GreenNode) -> bool {
        match self
            .edits
            .iter_mut()
            .find(|edit| same_node(&edit.target, target))
        {
            Some(edit) => {
                edit.replacement = replacement;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every edit to `root` and return the result
    ///
    /// Misses are logged and reported through `diagnostics`.
    pub fn apply(
        self,
        root: GreenNode,
        pass: &'static str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> GreenNode {
        let mut root = root;
        for edit in self.edits {
            match tree::replace_descendant(&root, &edit.target, edit.replacement) {
                Some(updated) => root = updated,
                None => {
                    let kind = kind_of(&edit.target);
                    warn!(pass, %kind, "Pending edit target no longer in tree, edit dropped");
                    diagnostics.push(Diagnostic::warning(
                        pass,
                        format!("pending edit for {kind} dropped: target was already rewritten"),
                    ));
                }
            }
        }
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::tree::{green_text, with_kind};
    use crate::cst::{CsSyntaxKind, parse};

    fn statements(source: &str) -> (GreenNode, Vec<GreenNode>) {
        let parse = parse(source);
        assert!(parse.ok(), "{:?}", parse.errors());
        let ifs = parse
            .syntax()
            .descendants()
            .filter(|n| n.kind() == CsSyntaxKind::IfStatement)
            .map(|n| n.green().into_owned())
            .collect();
        (parse.into_green(), ifs)
    }

    fn replacement_text(source: &str) -> GreenNode {
        crate::cst::parse_statements(source)
            .syntax()
            .first_child()
            .expect("statement")
            .green()
            .into_owned()
    }

    #[test]
    fn test_applies_in_registration_order() {
        let (root, ifs) = statements("if (a) { }\nif (b) { }\n");
        let mut edits = PendingEdits::new();
        edits.register(ifs[1].clone(), replacement_text("if (y) { }\n"));
        edits.register(ifs[0].clone(), replacement_text("if (x) { }\n"));

        let mut diagnostics = Vec::new();
        let rewritten = edits.apply(root, "test", &mut diagnostics);
        assert_eq!(green_text(&rewritten), "if (x) { }\nif (y) { }\n");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_conflicting_edits_first_wins() {
        let (root, ifs) = statements("if (a) { if (b) { } }\n");
        let outer = ifs[0].clone();
        let inner = ifs[1].clone();

        let mut edits = PendingEdits::new();
        // The outer replacement no longer contains the inner statement
        edits.register(outer, replacement_text("if (a) { }\n"));
        edits.register(inner, replacement_text("if (c) { }"));

        let mut diagnostics = Vec::new();
        let rewritten = edits.apply(root, "test", &mut diagnostics);

        let text = green_text(&rewritten);
        assert_eq!(text, "if (a) { }\n");
        assert!(parse(&text).ok());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_warning());
        assert!(diagnostics[0].message.contains("IfStatement"));
    }

    #[test]
    fn test_two_edits_for_one_target() {
        let (root, ifs) = statements("if (a) { }\nif (b) { }\n");
        let mut edits = PendingEdits::new();
        edits.register(ifs[0].clone(), replacement_text("if (first) { }\n"));
        edits.register(ifs[0].clone(), replacement_text("if (second) { }\n"));
        assert_eq!(edits.len(), 2);

        let mut diagnostics = Vec::new();
        let rewritten = edits.apply(root, "test", &mut diagnostics);

        let text = green_text(&rewritten);
        assert_eq!(text, "if (first) { }\nif (b) { }\n");
        assert!(parse(&text).ok());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_warning());
        assert_eq!(diagnostics[0].pass, "test");
    }

    #[test]
    fn test_nested_edit_survives_shared_subtree() {
        let (root, ifs) = statements("if (a) { if (b) { } }\n");
        let outer_replacement = with_kind(&ifs[0], CsSyntaxKind::IfStatement);

        let mut edits = PendingEdits::new();
        edits.register(ifs[0].clone(), outer_replacement);
        edits.register(ifs[1].clone(), replacement_text("if (c) { } "));

        let mut diagnostics = Vec::new();
        let rewritten = edits.apply(root, "test", &mut diagnostics);
        assert_eq!(green_text(&rewritten), "if (a) { if (c) { } }\n");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_replace_updates_registered_edit() {
        let (root, ifs) = statements("if (a) { }\n");
        let mut edits = PendingEdits::new();
        assert!(!edits.replace(&ifs[0], replacement_text("if (x) { }\n")));

        edits.register(ifs[0].clone(), replacement_text("if (x) { }\n"));
        assert!(edits.replace(&ifs[0], replacement_text("if (z) { }\n")));
        assert_eq!(edits.len(), 1);
        assert_eq!(
            edits.find(&ifs[0]).map(|g| green_text(g)),
            Some("if (z) { }\n".to_string())
        );

        let rewritten = edits.apply(root, "test", &mut Vec::new());
        assert_eq!(green_text(&rewritten), "if (z) { }\n");
    }
}
