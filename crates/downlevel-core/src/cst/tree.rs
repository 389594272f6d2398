//! Structural-sharing update primitives over the green tree
//!
//! Every function here returns a new green node and leaves its input
//! untouched. Children that are not replaced are carried over as the same
//! reference-counted nodes, so an update costs one allocation per ancestor
//! on the path to the change.

use std::ops::RangeBounds;

use rowan::{GreenNode, GreenNodeData, GreenToken, GreenTokenData, NodeOrToken};

use super::{CsSyntaxKind, SyntaxElement, SyntaxNode, SyntaxToken};

/// Owned green child
pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

/// Borrowed green child
pub type GreenElementRef<'a> = NodeOrToken<&'a GreenNodeData, &'a GreenTokenData>;

pub fn token(kind: CsSyntaxKind, text: &str) -> GreenToken {
    GreenToken::new(kind.into(), text)
}

pub fn node(kind: CsSyntaxKind, children: Vec<GreenElement>) -> GreenNode {
    GreenNode::new(kind.into(), children)
}

/// Kind of a green node
pub fn kind_of(node: &GreenNodeData) -> CsSyntaxKind {
    CsSyntaxKind::from_raw(node.kind().0)
}

/// Kind of a green child
pub fn element_kind(element: GreenElementRef<'_>) -> CsSyntaxKind {
    match element {
        NodeOrToken::Node(node) => kind_of(node),
        NodeOrToken::Token(token) => CsSyntaxKind::from_raw(token.kind().0),
    }
}

pub fn owned_element(element: GreenElementRef<'_>) -> GreenElement {
    match element {
        NodeOrToken::Node(node) => NodeOrToken::Node(node.to_owned()),
        NodeOrToken::Token(token) => NodeOrToken::Token(token.to_owned()),
    }
}

/// The children of `node`, sharing every child
pub fn children(node: &GreenNodeData) -> Vec<GreenElement> {
    node.children().map(owned_element).collect()
}

/// The red token's green storage, shared
pub fn green_token(token: &SyntaxToken) -> GreenToken {
    token.green().to_owned()
}

/// The red element's green storage, shared
pub fn green_element(element: &SyntaxElement) -> GreenElement {
    match element {
        NodeOrToken::Node(node) => NodeOrToken::Node(node.green().into_owned()),
        NodeOrToken::Token(token) => NodeOrToken::Token(green_token(token)),
    }
}

pub fn is_kind(element: &GreenElement, kind: CsSyntaxKind) -> bool {
    match element {
        NodeOrToken::Node(node) => kind_of(node) == kind,
        NodeOrToken::Token(token) => CsSyntaxKind::from_raw(token.kind().0) == kind,
    }
}

/// Same node except at `index`
pub fn with_child(node: &GreenNodeData, index: usize, child: impl Into<GreenElement>) -> GreenNode {
    node.replace_child(index, child.into())
}

pub fn insert_child(node: &GreenNodeData, index: usize, child: impl Into<GreenElement>) -> GreenNode {
    node.insert_child(index, child.into())
}

pub fn remove_child(node: &GreenNodeData, index: usize) -> GreenNode {
    node.remove_child(index)
}

pub fn splice_children<R, I>(node: &GreenNodeData, range: R, replacement: I) -> GreenNode
where
    R: RangeBounds<usize>,
    I: IntoIterator<Item = GreenElement>,
{
    node.splice_children(range, replacement)
}

/// Same children under a different kind
pub fn with_kind(node: &GreenNodeData, kind: CsSyntaxKind) -> GreenNode {
    GreenNode::new(kind.into(), node.children().map(owned_element))
}

/// Reference identity between two green nodes
pub fn same_node(a: &GreenNodeData, b: &GreenNodeData) -> bool {
    a.kind() == b.kind() && std::ptr::eq(a, b)
}

/// Red node `node` is backed by exactly `green`
pub fn is_backed_by(node: &SyntaxNode, green: &GreenNodeData) -> bool {
    same_node(&node.green(), green)
}

/// First node in pre-order backed by `target`
pub fn find_by_identity(root: &SyntaxNode, target: &GreenNodeData) -> Option<SyntaxNode> {
    root.descendants().find(|node| is_backed_by(node, target))
}

/// Replace the red node's green and return the new root of its tree
///
/// The replacement may have a different kind; each ancestor on the path is
/// rebuilt with the new child.
pub fn replace_node(node: &SyntaxNode, replacement: GreenNode) -> GreenNode {
    match node.parent() {
        None => replacement,
        Some(parent) => {
            let rebuilt = parent.green().replace_child(node.index(), replacement.into());
            replace_node(&parent, rebuilt)
        }
    }
}

/// Replace the subtree identical to `target` inside `root`
///
/// Returns `None` when `root` does not contain `target` by identity.
pub fn replace_descendant(
    root: &GreenNode,
    target: &GreenNodeData,
    replacement: GreenNode,
) -> Option<GreenNode> {
    let red = SyntaxNode::new_root(root.clone());
    let found = find_by_identity(&red, target)?;
    Some(replace_node(&found, replacement))
}

/// Child indices leading from `ancestor` down to `target`
pub fn path_from(ancestor: &SyntaxNode, target: &SyntaxNode) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut current = target.clone();
    while current != *ancestor {
        path.push(current.index());
        current = current.parent()?;
    }
    path.reverse();
    Some(path)
}

pub fn node_at_path(root: &SyntaxNode, path: &[usize]) -> Option<SyntaxNode> {
    let mut current = root.clone();
    for &index in path {
        current = current.children_with_tokens().nth(index)?.into_node()?;
    }
    Some(current)
}

/// Replace several disjoint descendants of `node` by position
///
/// Small identical subtrees may be interned to one green node, so edits
/// inside a single node are located by path rather than by identity.
/// Returns `None` when `edits` is empty.
pub fn replace_all(node: &SyntaxNode, edits: Vec<(SyntaxNode, GreenNode)>) -> Option<GreenNode> {
    if edits.is_empty() {
        return None;
    }
    let mut green = node.green().into_owned();
    for (target, replacement) in edits {
        let Some(path) = path_from(node, &target) else {
            continue;
        };
        if path.is_empty() {
            green = replacement;
            continue;
        }
        let root = SyntaxNode::new_root(green.clone());
        if let Some(found) = node_at_path(&root, &path) {
            green = replace_node(&found, replacement);
        }
    }
    Some(green)
}

/// Text of a green subtree
pub fn green_text(node: &GreenNodeData) -> String {
    fn collect(node: &GreenNodeData, out: &mut String) {
        for child in node.children() {
            match child {
                NodeOrToken::Node(node) => collect(node, out),
                NodeOrToken::Token(token) => out.push_str(token.text()),
            }
        }
    }

    let mut out = String::with_capacity(u32::from(node.text_len()) as usize);
    collect(node, &mut out);
    out
}

/// Text from the first to the last significant token of `node`
pub fn text_without_trivia(node: &SyntaxNode) -> String {
    let tokens: Vec<SyntaxToken> = node
        .descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .collect();
    let first = tokens.iter().position(|t| !t.kind().is_trivia());
    let last = tokens.iter().rposition(|t| !t.kind().is_trivia());
    match (first, last) {
        (Some(first), Some(last)) => tokens[first..=last].iter().map(|t| t.text()).collect(),
        _ => String::new(),
    }
}

/// Swap freshly parsed subtrees for textually identical originals
///
/// Generated code is built by printing and re-parsing; afterwards every
/// fresh subtree whose kind and text match one of `originals` is replaced
/// by that original, so untouched source stays shared by reference.
pub fn reshare(fresh: &GreenNode, originals: &[GreenNode]) -> GreenNode {
    let pool: Vec<(&GreenNode, String)> = originals
        .iter()
        .map(|original| (original, green_text(original)))
        .collect();
    reshare_node(fresh, &pool).unwrap_or_else(|| fresh.clone())
}

fn reshare_node(node: &GreenNodeData, pool: &[(&GreenNode, String)]) -> Option<GreenNode> {
    let mut text = None;
    for (original, original_text) in pool {
        if original.kind() != node.kind() || original.text_len() != node.text_len() {
            continue;
        }
        let text = text.get_or_insert_with(|| green_text(node));
        if *text == *original_text {
            return Some((*original).clone());
        }
    }

    let mut rebuilt: Option<GreenNode> = None;
    for (index, child) in node.children().enumerate() {
        if let NodeOrToken::Node(child) = child
            && let Some(shared) = reshare_node(child, pool)
        {
            let base = rebuilt.get_or_insert_with(|| node.to_owned());
            *base = base.replace_child(index, shared.into());
        }
    }
    rebuilt
}
