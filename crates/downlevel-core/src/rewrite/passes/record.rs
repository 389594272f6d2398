//! Records become classes and structs
//!
//! A record without parameters keeps everything but its keyword. A
//! positional record is rebuilt from text: one `{ get; private set; }`
//! property per parameter, a constructor assigning them and then the
//! original members. The generated declaration is parsed back with
//! [`parse_members`] and carries the whole original declaration as a
//! leading comment.

use rowan::{GreenNode, NodeOrToken};

use crate::cst::ast::{AstNode, RecordDecl, VariableDeclarator};
use crate::cst::tree::{self, GreenElement, text_without_trivia};
use crate::cst::trivia::{
    block_comment, first_significant_token, indentation, leading_trivia, newline, space,
    to_green, token_leading, token_trailing, trailing_trivia, trim_trailing_whitespace,
    trivia_text, whitespace, with_leading_trivia,
};
use crate::cst::{CsSyntaxKind, SyntaxNode, SyntaxToken, parse_members};
use crate::error::DownlevelError;
use crate::result::Result;
use crate::rewrite::{Pass, Rewrite, RewriteContext, walk, walk_then};

/// Lowers `record`, `record class` and `record struct` declarations
#[derive(Debug, Default)]
pub struct Records;

impl Records {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for Records {
    fn name(&self) -> &'static str {
        "records"
    }

    fn visit(&mut self, node: &SyntaxNode, cx: &mut RewriteContext<'_>) -> Result<Rewrite> {
        match node.kind() {
            CsSyntaxKind::RecordDecl => {
                // Nested members are lowered first and the record is seen
                // detached afterwards, so take the layout and text now
                let indent = indentation(node);
                let original = text_without_trivia(node);
                walk_then(self, node, cx, |_, current, cx| {
                    let Some(record) = RecordDecl::cast(current.clone()) else {
                        return Ok(None);
                    };
                    let positional = record
                        .parameter_list()
                        .is_some_and(|list| list.parameters().next().is_some());
                    if positional {
                        let layout = Layout {
                            indent: &indent,
                            unit: &cx.options().indent_unit,
                            eol: cx.eol(),
                        };
                        lower_positional(&record, &original, &layout).map(Some)
                    } else {
                        Ok(Some(lower_plain(&record)))
                    }
                })
            }
            _ => walk(self, node, cx),
        }
    }
}

#[derive(Clone, Copy)]
struct Layout<'a> {
    indent: &'a str,
    unit: &'a str,
    eol: &'a str,
}

fn declaration_kind(record: &RecordDecl) -> (CsSyntaxKind, CsSyntaxKind, &'static str) {
    if record.is_struct() {
        (CsSyntaxKind::StructDecl, CsSyntaxKind::StructKw, "struct")
    } else {
        (CsSyntaxKind::ClassDecl, CsSyntaxKind::ClassKw, "class")
    }
}

/// Keyword swap; an empty `()` is dropped and `record Foo;` gets a body
fn lower_plain(record: &RecordDecl) -> GreenNode {
    let (kind, keyword_kind, keyword_text) = declaration_kind(record);
    let keyword = record.record_keyword();
    let kind_keyword = record.kind_keyword();
    let has_body = record.l_brace().is_some();

    let mut children: Vec<GreenElement> = Vec::new();
    let mut skip_blanks = false;
    for element in record.syntax().children_with_tokens() {
        match &element {
            NodeOrToken::Token(token) if Some(token) == keyword.as_ref() => {
                children.push(tree::token(keyword_kind, keyword_text).into());
            }
            NodeOrToken::Token(token) if Some(token) == kind_keyword.as_ref() => {
                skip_blanks = true;
                continue;
            }
            NodeOrToken::Token(token)
                if skip_blanks && token.kind() == CsSyntaxKind::Whitespace =>
            {
                continue;
            }
            NodeOrToken::Token(token) if token.kind() == CsSyntaxKind::Semicolon && !has_body => {
                let spaced = children
                    .last()
                    .is_some_and(|child| tree::is_kind(child, CsSyntaxKind::Whitespace));
                if !spaced {
                    children.push(space().into());
                }
                children.push(tree::token(CsSyntaxKind::LBrace, "{").into());
                children.push(space().into());
                children.push(tree::token(CsSyntaxKind::RBrace, "}").into());
            }
            NodeOrToken::Node(list) if list.kind() == CsSyntaxKind::ParameterList => {
                children.extend(
                    list.descendants_with_tokens()
                        .filter_map(|element| element.into_token())
                        .filter(|token| token.kind().is_trivia())
                        .map(|token| NodeOrToken::Token(tree::green_token(&token))),
                );
            }
            _ => children.push(tree::green_element(&element)),
        }
        skip_blanks = false;
    }
    tree::node(kind, children)
}

fn lower_positional(record: &RecordDecl, original: &str, layout: &Layout<'_>) -> Result<GreenNode> {
    let node = record.syntax();
    let name = record
        .name()
        .map(|token| token.text().to_string())
        .unwrap_or_default();
    let header = Header::of(record);

    let Layout { indent: i, unit: u, eol: e } = *layout;
    let members = declared_member_names(node);
    let mut text = format!("{}{e}{i}{{{e}", header.text);
    let mut assignments = String::new();
    for parameter in record.parameter_list().into_iter().flat_map(|list| list.parameters()) {
        let (Some(ty), Some(parameter_name)) = (parameter.ty(), parameter.name()) else {
            return Err(DownlevelError::unsupported(
                "records",
                format!("record parameter without type or name: {}", parameter.syntax()),
            ));
        };
        let parameter_name = parameter_name.text();
        let property = property_name(parameter_name);
        if members.contains(&property) {
            return Err(DownlevelError::unsupported(
                "records",
                format!("record {name} declares its own member `{property}` for a positional parameter"),
            ));
        }
        text.push_str(&format!(
            "{i}{u}public {} {property} {{ get; private set; }}{e}",
            text_without_trivia(&ty)
        ));
        assignments.push_str(&format!("{i}{u}{u}this.{property} = {parameter_name};{e}"));
    }
    let initializer = match (&header.base_arguments, record.is_struct()) {
        (Some(arguments), _) => format!(" : base{arguments}"),
        (None, true) => " : this()".to_string(),
        (None, false) => String::new(),
    };
    let parameters = record
        .parameter_list()
        .map(|list| text_without_trivia(list.syntax()))
        .unwrap_or_default();
    text.push_str(&format!(
        "{e}{i}{u}public {name}{parameters}{initializer}{e}{i}{u}{{{e}{assignments}{i}{u}}}{e}{i}}}"
    ));

    let parse = parse_members(&text);
    if !parse.ok() {
        let messages: Vec<String> = parse.errors().iter().map(|e| e.to_string()).collect();
        return Err(DownlevelError::generated_code(
            format!("record {name}"),
            messages.join("; "),
        ));
    }
    let Some(generated) = parse.syntax().children().find(|child| {
        matches!(child.kind(), CsSyntaxKind::ClassDecl | CsSyntaxKind::StructDecl)
    }) else {
        return Err(DownlevelError::generated_code(
            format!("record {name}"),
            "no type declaration in generated code",
        ));
    };
    let generated = tree::reshare(&generated.green().into_owned(), &shared_originals(node));

    let spliced = splice_body(generated, record, layout);

    let mut leading = Vec::new();
    if !layout.indent.is_empty() {
        leading.push(whitespace(layout.indent));
    }
    leading.push(block_comment(original));
    leading.push(newline(layout.eol));
    leading.extend(to_green(&leading_trivia(node)));
    Ok(with_leading_trivia(&spliced, leading))
}

/// The declaration line of a record, rewritten and as written
struct Header {
    /// Modifiers to constraints with the record keywords swapped and the
    /// parameter list and primary-constructor arguments dropped
    text: String,
    /// `(args)` of a primary-constructor base call
    base_arguments: Option<String>,
}

impl Header {
    fn of(record: &RecordDecl) -> Self {
        let node = record.syntax();
        let (_, _, keyword_text) = declaration_kind(record);
        let keyword = record.record_keyword();
        let kind_keyword = record.kind_keyword();

        let mut text = String::new();
        let mut base_arguments = None;
        let mut started = false;
        let mut skip_blanks = false;
        for element in node.children_with_tokens() {
            match element {
                NodeOrToken::Token(token) => {
                    if matches!(token.kind(), CsSyntaxKind::LBrace | CsSyntaxKind::Semicolon) {
                        break;
                    }
                    if token.kind().is_trivia() && (!started || skip_blanks) {
                        continue;
                    }
                    started = true;
                    skip_blanks = false;
                    if Some(&token) == keyword.as_ref() {
                        text.push_str(keyword_text);
                    } else if Some(&token) == kind_keyword.as_ref() {
                        skip_blanks = true;
                    } else {
                        text.push_str(token.text());
                    }
                }
                NodeOrToken::Node(child) => {
                    skip_blanks = false;
                    match child.kind() {
                        CsSyntaxKind::ParameterList => {
                            text.push_str(&trivia_text(&trailing_trivia(&child)));
                        }
                        CsSyntaxKind::BaseList => {
                            text.push_str(&base_list_text(&child, &mut base_arguments));
                        }
                        _ if !started => text.push_str(&text_from_first_token(&child)),
                        _ => text.push_str(&child.to_string()),
                    }
                    started = true;
                }
            }
        }

        Self {
            text: text.trim_end().to_string(),
            base_arguments,
        }
    }
}

/// `: Base(a), IFoo` as `: Base, IFoo`, remembering `(a)`
fn base_list_text(list: &SyntaxNode, arguments: &mut Option<String>) -> String {
    let mut text = String::new();
    for element in list.children_with_tokens() {
        match element {
            NodeOrToken::Token(token) => text.push_str(token.text()),
            NodeOrToken::Node(base) if base.kind() == CsSyntaxKind::PrimaryConstructorBaseType => {
                for part in base.children() {
                    if part.kind() == CsSyntaxKind::ArgumentList {
                        *arguments = Some(text_without_trivia(&part));
                        text.push_str(&trivia_text(&trailing_trivia(&part)));
                    } else {
                        text.push_str(&part.to_string());
                    }
                }
            }
            NodeOrToken::Node(base) => text.push_str(&base.to_string()),
        }
    }
    text
}

fn text_from_first_token(node: &SyntaxNode) -> String {
    let text = node.to_string();
    match first_significant_token(node) {
        Some(token) => {
            let offset = usize::from(token.text_range().start() - node.text_range().start());
            text[offset..].to_string()
        }
        None => String::new(),
    }
}

/// `x` to `X`; verbatim `@names` stay as written
fn property_name(parameter: &str) -> String {
    if parameter.starts_with('@') {
        return parameter.to_string();
    }
    let mut chars = parameter.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Names the record body declares directly, explicit interface
/// implementations excluded
fn declared_member_names(record: &SyntaxNode) -> Vec<String> {
    let mut names = Vec::new();
    for member in record.children() {
        match member.kind() {
            CsSyntaxKind::FieldDecl | CsSyntaxKind::EventFieldDecl => names.extend(
                member
                    .descendants()
                    .filter_map(VariableDeclarator::cast)
                    .filter_map(|declarator| declarator.name())
                    .map(|name| name.text().to_string()),
            ),
            CsSyntaxKind::RecordDecl => names.extend(
                RecordDecl::cast(member)
                    .and_then(|nested| nested.name())
                    .map(|name| name.text().to_string()),
            ),
            CsSyntaxKind::PropertyDecl
            | CsSyntaxKind::EventDecl
            | CsSyntaxKind::MethodDecl
            | CsSyntaxKind::ClassDecl
            | CsSyntaxKind::StructDecl
            | CsSyntaxKind::InterfaceDecl
            | CsSyntaxKind::EnumDecl
            | CsSyntaxKind::DelegateDecl => names.extend(member_name(&member)),
            _ => {}
        }
    }
    names
}

/// The last identifier before the member's parameters, accessors, body or
/// base list; modifiers such as `partial` and `async` are identifiers too
fn member_name(member: &SyntaxNode) -> Option<String> {
    let mut name = None;
    for element in member.children_with_tokens() {
        match element {
            NodeOrToken::Node(child) => match child.kind() {
                CsSyntaxKind::ExplicitInterfaceSpecifier => return None,
                CsSyntaxKind::ParameterList
                | CsSyntaxKind::TypeParameterList
                | CsSyntaxKind::AccessorList
                | CsSyntaxKind::BaseList
                | CsSyntaxKind::ArrowClause
                | CsSyntaxKind::EqualsValue => break,
                _ => {}
            },
            NodeOrToken::Token(token) => match token.kind() {
                CsSyntaxKind::Ident => name = Some(token.text().to_string()),
                CsSyntaxKind::LBrace | CsSyntaxKind::Semicolon => break,
                _ => {}
            },
        }
    }
    name
}

/// Original subtrees that generated code may share
fn shared_originals(node: &SyntaxNode) -> Vec<GreenNode> {
    node.descendants()
        .filter(|descendant| {
            matches!(
                descendant.kind(),
                CsSyntaxKind::Parameter
                    | CsSyntaxKind::AttributeList
                    | CsSyntaxKind::TypeParameterList
                    | CsSyntaxKind::ConstraintClause
                    | CsSyntaxKind::SimpleBaseType
            )
        })
        .map(|descendant| descendant.green().into_owned())
        .collect()
}

/// Move the record's members in front of the generated closing brace and
/// put the record's closing trivia after it
fn splice_body(generated: GreenNode, record: &RecordDecl, layout: &Layout<'_>) -> GreenNode {
    let red = SyntaxNode::new_root(generated.clone());
    let Some(close) = red
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .filter(|token| token.kind() == CsSyntaxKind::RBrace)
        .last()
    else {
        return generated;
    };

    let mut updated = generated.clone();
    if let Some(members) = body_members(record, layout) {
        let start = token_leading(&close)
            .first()
            .map_or(close.index(), SyntaxToken::index);
        updated = tree::splice_children(&updated, start..close.index(), members);
    }

    let end = updated.children().count();
    tree::splice_children(&updated, end..end, record_tail(record))
}

/// Everything between the record's braces, laid out to follow the
/// generated constructor, or `None` for an empty body
fn body_members(record: &RecordDecl, layout: &Layout<'_>) -> Option<Vec<GreenElement>> {
    let open = record.l_brace()?;
    let close = record.r_brace()?;
    let open_trailing = token_trailing(&open);
    let from = open_trailing.last().map_or(open.index(), SyntaxToken::index) + 1;

    let region: Vec<_> = record
        .syntax()
        .children_with_tokens()
        .skip(from)
        .take(close.index().saturating_sub(from))
        .collect();
    let meaningful = region.iter().any(|element| match element {
        NodeOrToken::Node(_) => true,
        NodeOrToken::Token(token) => {
            !matches!(token.kind(), CsSyntaxKind::Whitespace | CsSyntaxKind::Newline)
        }
    });
    if !meaningful {
        return None;
    }

    let mut members: Vec<GreenElement> = vec![newline(layout.eol).into()];
    let open_ends_line = open_trailing
        .last()
        .is_some_and(|token| token.kind() == CsSyntaxKind::Newline);
    if !open_ends_line {
        members.push(whitespace(&format!("{}{}", layout.indent, layout.unit)).into());
    }

    let region_text: String = region.iter().map(ToString::to_string).collect();
    let ends_line = region_text
        .trim_end_matches([' ', '\t'])
        .ends_with(['\n', '\r']);
    if ends_line {
        members.extend(region.iter().map(tree::green_element));
        return Some(members);
    }

    let mut elements: Vec<GreenElement> = region.iter().map(tree::green_element).collect();
    while elements
        .last()
        .is_some_and(|element| tree::is_kind(element, CsSyntaxKind::Whitespace))
    {
        elements.pop();
    }
    if let Some(NodeOrToken::Node(last)) = elements.last_mut() {
        *last = trim_trailing_whitespace(last);
    }
    members.extend(elements);
    members.push(newline(layout.eol).into());
    if !layout.indent.is_empty() {
        members.push(whitespace(layout.indent).into());
    }
    Some(members)
}

/// Trivia after the record's `}` (and a stray `;`), or after its `;`
fn record_tail(record: &RecordDecl) -> Vec<GreenElement> {
    let node = record.syntax();
    let after = record.r_brace().map_or(0, |close| close.index() + 1);
    let mut tail = Vec::new();
    let mut tokens = node
        .children_with_tokens()
        .skip(after)
        .filter_map(|element| element.into_token());
    if record.r_brace().is_some() {
        for token in tokens {
            tail.push(NodeOrToken::Token(tree::green_token(&token)));
        }
    } else if let Some(semicolon) = tokens.find(|token| token.kind() == CsSyntaxKind::Semicolon)
    {
        tail.extend(
            token_trailing(&semicolon)
                .iter()
                .map(|token| NodeOrToken::Token(tree::green_token(token))),
        );
    }
    tail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse;
    use crate::error::ErrorKind;
    use crate::rewrite::passes::test_support::{rewrite, rewrite_with};
    use crate::rewrite::{RewriteOptions, run_pass};

    fn lower(source: &str) -> String {
        rewrite(&mut Records::new(), source)
    }

    #[test]
    fn test_positional_record() {
        assert_eq!(
            lower("record Point(int X, int Y);\n"),
            "/* record Point(int X, int Y); */\n\
             class Point\n\
             {\n\
             \x20   public int X { get; private set; }\n\
             \x20   public int Y { get; private set; }\n\
             \n\
             \x20   public Point(int X, int Y)\n\
             \x20   {\n\
             \x20       this.X = X;\n\
             \x20       this.Y = Y;\n\
             \x20   }\n\
             }\n"
        );
    }

    #[test]
    fn test_nested_record_with_members_and_base_call() {
        let output = lower(
            "namespace Shapes\n{\n    public record Circle(double radius) : Shape(1), IShape\n    {\n        public double Area => Radius * Radius;\n    }\n}\n",
        );
        insta::assert_snapshot!(output, @r"
        namespace Shapes
        {
            /* public record Circle(double radius) : Shape(1), IShape
            {
                public double Area => Radius * Radius;
            } */
            public class Circle : Shape, IShape
            {
                public double Radius { get; private set; }

                public Circle(double radius) : base(1)
                {
                    this.Radius = radius;
                }

                public double Area => Radius * Radius;
            }
        }
        ");
    }

    #[test]
    fn test_record_struct_and_generics() {
        let output = lower("public readonly record struct Pair<T>(T First, T Second) where T : struct;\n");
        insta::assert_snapshot!(output, @r"
        /* public readonly record struct Pair<T>(T First, T Second) where T : struct; */
        public readonly struct Pair<T> where T : struct
        {
            public T First { get; private set; }
            public T Second { get; private set; }

            public Pair(T First, T Second) : this()
            {
                this.First = First;
                this.Second = Second;
            }
        }
        ");
    }

    #[test]
    fn test_one_line_body_and_indent_unit() {
        let options = RewriteOptions {
            indent_unit: "\t".to_string(),
            ..RewriteOptions::default()
        };
        let (output, _) = rewrite_with(
            &mut Records::new(),
            "record P(int X) { public int Y; }\n",
            &options,
        );
        assert_eq!(
            output,
            "/* record P(int X) { public int Y; } */\nclass P\n{\n\tpublic int X { get; private set; }\n\n\tpublic P(int X)\n\t{\n\t\tthis.X = X;\n\t}\n\n\tpublic int Y;\n}\n"
        );
    }

    #[test]
    fn test_parameterless_records() {
        assert_eq!(
            lower("public record Foo : Bar { int x; }"),
            "public class Foo : Bar { int x; }"
        );
        assert_eq!(lower("record struct S { }"), "struct S { }");
        assert_eq!(lower("record class C;\n"), "class C { }\n");
        assert_eq!(lower("record Foo() : Bar;"), "class Foo : Bar { }");
    }

    #[test]
    fn test_crlf_is_kept() {
        let output = lower("record P(int X);\r\n");
        assert!(output.contains("class P\r\n{\r\n"));
        assert!(!output.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_member_named_like_parameter_aborts() {
        for source in [
            "record R(int X) { public int X { get; init; } = X; }",
            "record R(int x) { private readonly int a, X; }",
            "record R(string name) { public string Name() { return name; } }",
            "record R(int Inner) { class Inner { } }",
        ] {
            let root = parse(source).into_green();
            let err = run_pass(&mut Records::new(), &root, "\n", &RewriteOptions::default())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unsupported, "{source}");
        }
    }

    #[test]
    fn test_explicit_implementation_is_not_a_clash() {
        let output = lower("record R(int Count) : ICounter { int ICounter.Count => Count; }");
        assert!(output.contains("public int Count { get; private set; }"));
        assert!(output.contains("int ICounter.Count => Count;"));
    }

    #[test]
    fn test_property_names() {
        assert_eq!(property_name("name"), "Name");
        assert_eq!(property_name("X"), "X");
        assert_eq!(property_name("@class"), "@class");
    }

    #[test]
    fn test_idempotent() {
        let once = lower("record Point(int X, int Y);\nrecord Tag;\n");
        assert_eq!(lower(&once), once);
    }
}
