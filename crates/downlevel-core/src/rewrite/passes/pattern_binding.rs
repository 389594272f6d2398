//! Type patterns that bind a variable
//!
//! `if (o is T x) { ... }` becomes `if (o is T) { T x = (T)o; ... }`. The
//! declaration lands in the body of the enclosing `if`, an ancestor of the
//! pattern, so the rewrite is registered as a pending edit for that `if`.
//! All patterns of one condition share a single plan whose replacement is
//! rebuilt from the original statement every time the plan grows.

use rowan::{Direction, GreenNode, NodeOrToken};

use crate::cst::ast::{AstNode, DeclarationPattern, IfStatement, IsPatternExpr, binary_operator};
use crate::cst::tree::{self, GreenElement, text_without_trivia};
use crate::cst::trivia::{
    first_significant_token, indentation, line_indentation, newline, prepend_leading_trivia,
    space, starts_line, to_green, token_trailing, trailing_trivia, whitespace,
    with_trailing_trivia,
};
use crate::cst::{CsSyntaxKind, SyntaxNode, parse_statements};
use crate::result::Result;
use crate::rewrite::classify;
use crate::rewrite::provenance::{PATTERN_WARNING, has_marker, marker};
use crate::rewrite::{Pass, Rewrite, RewriteContext, walk};

/// Moves pattern variables into declarations at the top of the `if` body
#[derive(Debug, Default)]
pub struct PatternBindings {
    plans: Vec<Plan>,
}

/// Everything decided so far for one `if` statement
#[derive(Debug)]
struct Plan {
    anchor: SyntaxNode,
    condition_edits: Vec<(SyntaxNode, GreenNode)>,
    declarations: Vec<String>,
}

impl PatternBindings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pass for PatternBindings {
    fn name(&self) -> &'static str {
        "pattern-bindings"
    }

    fn visit(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<Rewrite> {
        // Every change goes through pending edits, so the children come back
        // unchanged and are passed on as they are
        let children = walk(self, node, cx)?;
        debug_assert!(children.is_unchanged());
        if node.kind() == CsSyntaxKind::IsPatternExpr {
            self.lower(node, cx)?;
        }
        Ok(children)
    }
}

impl PatternBindings {
    fn lower(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<()> {
        let Some(is) = IsPatternExpr::cast(node.clone()) else {
            return Ok(());
        };
        let Some(pattern) = is.pattern().and_then(DeclarationPattern::cast) else {
            return Ok(());
        };
        let (Some(operand), Some(ty), Some(designation)) =
            (is.expression(), pattern.ty(), pattern.designation())
        else {
            return Ok(());
        };
        let anchor = enclosing_if(node);

        // `T _` only loses its designation, wherever it is
        if designation.kind() == CsSyntaxKind::DiscardDesignation {
            let edit = (pattern.syntax().clone(), type_test(&ty, &designation));
            match anchor {
                Some(anchor) => self.update(&anchor, Some(edit), None, cx),
                None => {
                    if let Some(replaced) = tree::replace_all(node, vec![edit]) {
                        cx.register_pending_edit(node, replaced);
                    }
                }
            }
            return Ok(());
        }
        if designation.kind() != CsSyntaxKind::SingleVariableDesignation {
            return Ok(());
        }

        let name = text_without_trivia(&designation);
        let Some(anchor) = anchor.filter(|anchor| is_top_level_conjunct(anchor, node)) else {
            cx.info(format!(
                "pattern variable `{name}` left in place: not a top-level conjunct of an if condition"
            ));
            return Ok(());
        };
        if is_referenced(&anchor, &name) {
            cx.info(format!(
                "pattern variable `{name}` left in place: used in the condition or after the if"
            ));
            return Ok(());
        }

        if classify(&operand).is_complex() {
            cx.warn(format!(
                "pattern variable `{name}` left in place: operand `{}` is too complex to repeat",
                text_without_trivia(&operand)
            ));
            if !has_marker(node, PATTERN_WARNING) {
                let marked = prepend_leading_trivia(
                    &node.green().into_owned(),
                    vec![marker(PATTERN_WARNING), space()],
                );
                self.update(&anchor, Some((node.clone(), marked)), None, cx);
            }
            return Ok(());
        }

        let ty_text = text_without_trivia(&ty);
        let declaration = format!("{ty_text} {name} = ({ty_text}){};", cast_operand(&operand));
        let edit = (pattern.syntax().clone(), type_test(&ty, &designation));
        self.update(&anchor, Some(edit), Some(declaration), cx);
        Ok(())
    }

    /// Grow the plan for `anchor` and re-register its replacement
    fn update(
        &mut self,
        anchor: &SyntaxNode,
        edit: Option<(SyntaxNode, GreenNode)>,
        declaration: Option<String>,
        cx: &mut RewriteContext<'_>,
    ) {
        let index = match self.plans.iter().position(|plan| plan.anchor == *anchor) {
            Some(index) => index,
            None => {
                self.plans.push(Plan {
                    anchor: anchor.clone(),
                    condition_edits: Vec::new(),
                    declarations: Vec::new(),
                });
                self.plans.len() - 1
            }
        };
        let plan = &mut self.plans[index];
        plan.condition_edits.extend(edit);
        plan.declarations.extend(declaration);

        let Some(replacement) = plan.build(cx) else {
            return;
        };
        if !cx.replace_pending_edit(anchor, replacement.clone()) {
            cx.register_pending_edit(anchor, replacement);
        }
    }
}

impl Plan {
    fn build(&self, cx: &RewriteContext<'_>) -> Option<GreenNode> {
        let tested = tree::replace_all(&self.anchor, self.condition_edits.clone())
            .unwrap_or_else(|| self.anchor.green().into_owned());
        if self.declarations.is_empty() {
            return Some(tested);
        }

        let original = IfStatement::cast(self.anchor.clone())?;
        let original_body = original.body()?;
        let rebuilt = SyntaxNode::new_root(tested);
        let body = IfStatement::cast(rebuilt.clone())?.body()?;

        let layout = BodyLayout {
            if_indent: indentation(&self.anchor),
            unit: cx.options().indent_unit.clone(),
            eol: cx.eol(),
        };
        let new_body = if body.kind() == CsSyntaxKind::Block {
            layout.prepend_to_block(&body, &original_body, &self.declarations)?
        } else {
            layout.wrap_in_block(&body, &original_body, &self.declarations)?
        };
        Some(tree::with_child(&rebuilt.green(), body.index(), new_body))
    }
}

struct BodyLayout {
    if_indent: String,
    unit: String,
    eol: &'static str,
}

impl BodyLayout {
    fn prepend_to_block(
        &self,
        block: &SyntaxNode,
        original: &SyntaxNode,
        declarations: &[String],
    ) -> Option<GreenNode> {
        let open = block
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind() == CsSyntaxKind::LBrace)?;
        let open_trailing = token_trailing(&open);
        let at = open_trailing.last().map_or(open.index(), |t| t.index()) + 1;
        let multiline = open_trailing
            .last()
            .is_some_and(|token| token.kind() == CsSyntaxKind::Newline);

        let text: String = if multiline {
            let indent = match original.children().next() {
                Some(first) => indentation(&first),
                None => {
                    let brace = first_significant_token(original).map(|t| line_indentation(&t));
                    format!("{}{}", brace.unwrap_or_default(), self.unit)
                }
            };
            declarations
                .iter()
                .map(|declaration| format!("{indent}{declaration}{}", self.eol))
                .collect()
        } else {
            declarations
                .iter()
                .map(|declaration| format!("{declaration} "))
                .collect()
        };
        let statements = parse_declarations(&text)?;
        Some(tree::splice_children(&block.green(), at..at, statements))
    }

    fn wrap_in_block(
        &self,
        statement: &SyntaxNode,
        original: &SyntaxNode,
        declarations: &[String],
    ) -> Option<GreenNode> {
        let own_line = first_significant_token(original).is_some_and(|token| starts_line(&token));

        let mut children: Vec<GreenElement> = Vec::new();
        if own_line {
            let indent = indentation(original);
            let text: String = declarations
                .iter()
                .map(|declaration| format!("{indent}{declaration}{}", self.eol))
                .collect();
            if !self.if_indent.is_empty() {
                children.push(whitespace(&self.if_indent).into());
            }
            children.push(tree::token(CsSyntaxKind::LBrace, "{").into());
            children.push(newline(self.eol).into());
            children.extend(parse_declarations(&text)?);
            children.push(statement.green().into_owned().into());

            let ends_line = trailing_trivia(statement)
                .last()
                .is_some_and(|token| token.kind() == CsSyntaxKind::Newline);
            if !ends_line {
                children.push(newline(self.eol).into());
            }
            if !self.if_indent.is_empty() {
                children.push(whitespace(&self.if_indent).into());
            }
            children.push(tree::token(CsSyntaxKind::RBrace, "}").into());
            if ends_line {
                children.push(newline(self.eol).into());
            }
        } else {
            let text: String = declarations
                .iter()
                .map(|declaration| format!("{declaration} "))
                .collect();
            let trailing = to_green(&trailing_trivia(statement));
            children.push(tree::token(CsSyntaxKind::LBrace, "{").into());
            children.push(space().into());
            children.extend(parse_declarations(&text)?);
            children.push(with_trailing_trivia(&statement.green().into_owned(), Vec::new()).into());
            children.push(space().into());
            children.push(tree::token(CsSyntaxKind::RBrace, "}").into());
            children.extend(trailing.into_iter().map(NodeOrToken::Token));
        }
        Some(tree::node(CsSyntaxKind::Block, children))
    }
}

/// Statement nodes parsed from generated declarations
fn parse_declarations(text: &str) -> Option<Vec<GreenElement>> {
    let parse = parse_statements(text);
    if !parse.ok() {
        tracing::debug!(text, "Generated declaration does not parse");
        return None;
    }
    Some(
        parse
            .syntax()
            .children()
            .map(|statement| statement.green().into_owned().into())
            .collect(),
    )
}

/// The `if` whose condition contains `node`, stopping at statement,
/// lambda and local function boundaries
fn enclosing_if(node: &SyntaxNode) -> Option<SyntaxNode> {
    let mut current = node.clone();
    loop {
        let parent = current.parent()?;
        match parent.kind() {
            CsSyntaxKind::IfStatement => {
                let condition = IfStatement::cast(parent.clone())?.condition()?;
                return (condition == current).then_some(parent);
            }
            CsSyntaxKind::LambdaExpr | CsSyntaxKind::AnonymousMethodExpr => return None,
            kind if kind.is_statement() => return None,
            _ => current = parent,
        }
    }
}

/// `node` is the whole condition of `anchor` or sits under `&&` and
/// parentheses only
fn is_top_level_conjunct(anchor: &SyntaxNode, node: &SyntaxNode) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent == *anchor {
            return true;
        }
        let allowed = match parent.kind() {
            CsSyntaxKind::ParenExpr => true,
            CsSyntaxKind::BinaryExpr => {
                binary_operator(&parent).is_some_and(|op| op.kind() == CsSyntaxKind::AmpAmp)
            }
            _ => false,
        };
        if !allowed {
            return false;
        }
        current = parent.parent();
    }
    false
}

/// `name` is used in the condition of `anchor` or in a later statement of
/// the same block
fn is_referenced(anchor: &SyntaxNode, name: &str) -> bool {
    let uses = |node: &SyntaxNode| {
        node.descendants()
            .filter(|descendant| descendant.kind() == CsSyntaxKind::IdentifierName)
            .any(|identifier| text_without_trivia(&identifier) == name)
    };
    let in_condition = IfStatement::cast(anchor.clone())
        .and_then(|statement| statement.condition())
        .is_some_and(|condition| uses(&condition));
    in_condition
        || anchor
            .siblings(Direction::Next)
            .skip(1)
            .any(|sibling| uses(&sibling))
}

/// `T` carrying the designation's trailing trivia
fn type_test(ty: &SyntaxNode, designation: &SyntaxNode) -> GreenNode {
    let ty = with_trailing_trivia(&ty.green().into_owned(), to_green(&trailing_trivia(designation)));
    tree::node(CsSyntaxKind::TypePattern, vec![ty.into()])
}

/// The operand as written, parenthesized unless it binds tighter than a cast
fn cast_operand(operand: &SyntaxNode) -> String {
    let text = text_without_trivia(operand);
    match operand.kind() {
        CsSyntaxKind::IdentifierName
        | CsSyntaxKind::MemberAccessExpr
        | CsSyntaxKind::ElementAccessExpr
        | CsSyntaxKind::InvocationExpr
        | CsSyntaxKind::ThisExpr
        | CsSyntaxKind::BaseExpr
        | CsSyntaxKind::ParenExpr
        | CsSyntaxKind::LiteralExpr => text,
        _ => format!("({text})"),
    }
}
