//! Engine-level behavior over whole files
//!
//! Covers the properties that only make sense end to end: older code
//! passes through byte for byte, every lowering settles after one run,
//! synthesized comments hold re-parseable source, and input that does not
//! parse is handed back untouched.

use std::collections::HashSet;

use downlevel_core::cst::tree::{same_node, text_without_trivia};
use downlevel_core::cst::{CsSyntaxKind, SyntaxNode, parse, parse_expression, parse_members};
use downlevel_core::pretransform::block_namespace;
use downlevel_core::rewrite::provenance::recover;
use downlevel_core::{Downgrader, ErrorKind, Outcome, PassKind, Pipeline, RewriteOptions};

/// Code already valid in the older dialect
const NO_OP_CORPUS: &[&str] = &[
    "",
    "// only a comment\n",
    "\u{feff}using System;\r\n\r\nclass Bom { }\r\n",
    "using System;\nusing IO = System.IO;\n\nnamespace A.B\n{\n    class C { }\n}\n",
    r#"[Flags]
enum Color : byte { Red = 1, Green = 2, }
delegate void Handler<in T>(T value);
"#,
    r#"public sealed partial class Widget<T> : Base, IWidget where T : class, new()
{
    private const int Max = 10, Min = 0;
    private readonly List<T> items = new List<T>();
    public event EventHandler Changed;

    /// <summary>Size</summary>
    public int Size { get { return items.Count; } }

    public Widget(int size) : base(size) { }
    ~Widget() { }

    public static Widget<T> operator +(Widget<T> a, Widget<T> b) { return a; }

    void IWidget.Reset()
    {
#if DEBUG
        Log("reset"); // trace
#endif
        foreach (var item in items)
        {
            if (item == null) continue;
        }
        for (int i = 0; i < Max; i++) { }
        switch (Size)
        {
            case 0:
                break;
            default:
                return;
        }
        try { Run(x => x + 1); } catch (IOException e) { } finally { }
        using (var s = Open()) { }
        lock (gate) { }
    }
}
"#,
    "class Crlf\r\n{\r\n    int F() { return 1; }\r\n}\r\n",
];

/// One or more lowerings each
const MODERN_CORPUS: &[&str] = &[
    "global using System;\nnamespace App;\n\npublic record Point(int X, int Y);\n",
    "class C { int P { get; init; } = 5; public string? Name { get; set; } = other ?? \"none\"; }\n",
    "class C\n{\n    int F() => 1;\n    int P => 2;\n    string G(string? s = null) { return s; }\n}\n",
    "record Person(string? Name, int Age) : Base(Name)\n{\n    public int Twice => Age * 2;\n}\n",
    "class C\n{\n    void M(object o)\n    {\n        if (o is Foo f)\n            f.Run();\n        if (Load() is Bar b) { b.Run(); }\n    }\n}\n",
    "class C { string? s = x ?? Compute(); List<string?>? items; int? Length = text?.Length; }\n",
];

fn downgrade(source: &str) -> Outcome {
    Downgrader::default().downgrade(source).unwrap()
}

fn rewritten(source: &str) -> String {
    match downgrade(source) {
        Outcome::Rewritten { text, .. } => text,
        other => panic!("expected a rewrite of {source:?}, got {other:?}"),
    }
}

#[test]
fn test_older_code_round_trips() {
    for source in NO_OP_CORPUS {
        let parse = parse(source);
        assert!(parse.ok(), "{source:?}: {:?}", parse.errors());
        assert_eq!(parse.syntax().to_string(), *source);

        assert_eq!(
            downgrade(source),
            Outcome::Unchanged {
                diagnostics: vec![]
            },
            "{source:?}"
        );
    }
}

#[test]
fn test_every_lowering_is_idempotent() {
    for source in MODERN_CORPUS {
        let once = rewritten(source);
        assert!(parse(&once).ok(), "output does not parse:\n{once}");
        assert!(
            !downgrade(&once).is_changed(),
            "second run changed:\n{once}"
        );
    }
}

#[test]
fn test_each_pass_is_idempotent_alone() {
    for kind in PassKind::ALL {
        let downgrader = Downgrader::new(Pipeline::new(vec![kind], RewriteOptions::default()));
        for source in MODERN_CORPUS {
            let Outcome::Rewritten { text, .. } = downgrader.downgrade(source).unwrap() else {
                continue;
            };
            assert!(
                !downgrader.downgrade(&text).unwrap().is_changed(),
                "{} not idempotent on:\n{text}",
                kind.name()
            );
        }
    }
}

/// Texts of every node each pass saw, running the passes one by one
fn elidable_texts(source: &str) -> HashSet<String> {
    let text = block_namespace(source);
    let mut texts = HashSet::new();
    for count in 0..PassKind::ALL.len() {
        let pipeline = Pipeline::new(PassKind::ALL[..count].to_vec(), RewriteOptions::default());
        let output = pipeline.run(parse(&text).green(), "\n").unwrap();
        let tree = SyntaxNode::new_root(output.root);
        texts.extend(tree.descendants().map(|node| text_without_trivia(&node)));
    }
    texts
}

/// The comment text re-parses to a node of identical text
fn parses_back(text: &str) -> bool {
    let reparsed = [
        parse_expression(text),
        parse(text),
        parse_members(text),
        parse_members(&format!("{text} x;")),
    ];
    reparsed.iter().any(|parse| {
        parse.ok()
            && parse
                .syntax()
                .descendants()
                .any(|node| text_without_trivia(&node) == text)
    })
}

#[test]
fn test_comments_hold_the_elided_source() {
    for source in MODERN_CORPUS {
        let output = rewritten(source);
        let originals = elidable_texts(source);
        let tree = parse(&output).syntax();
        let recovered: Vec<String> = tree
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind() == CsSyntaxKind::BlockComment)
            .filter_map(|token| recover(token.text()))
            .filter(|text| text.as_str() != "global" && !text.starts_with("DOWNLEVEL WARNING"))
            .collect();
        for text in recovered {
            let elided = text
                .strip_prefix("= ")
                .or_else(|| text.strip_prefix("=> "))
                .unwrap_or(&text);
            assert!(originals.contains(elided), "{elided:?} is not an elided node of:\n{source}");
            assert!(parses_back(elided), "{elided:?} from:\n{output}");
        }
    }
}

#[test]
fn test_second_run_returns_the_same_tree() {
    let pipeline = Pipeline::default();
    for source in MODERN_CORPUS {
        let once = rewritten(source);
        let reparsed = parse(&once).into_green();
        let again = pipeline.run(&reparsed, "\n").unwrap();
        assert!(same_node(&again.root, &reparsed), "second run rebuilt:\n{once}");
        assert!(again.changed_passes.is_empty());
    }
}

#[test]
fn test_record_comment_holds_whole_declaration() {
    let source = "record R(int X)\n{\n    public int Twice() { return X * 2; }\n}\n";
    let output = rewritten(source);
    assert!(output.starts_with(
        "/* record R(int X)\n{\n    public int Twice() { return X * 2; }\n} */\nclass R\n"
    ));
}

#[test]
fn test_record_member_clash_aborts() {
    let error = Downgrader::default()
        .downgrade("record R(int X) { public int X { get; init; } = X; }\n")
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unsupported);
}

#[test]
fn test_byte_order_mark_file() {
    assert_eq!(
        rewritten("\u{feff}namespace A;\nclass C {}\n"),
        "\u{feff}namespace A\n{\nclass C {}\n}\n"
    );
}

#[test]
fn test_simple_nullable_erasure() {
    assert_eq!(
        rewritten("class C { int? Count = 5; }"),
        "class C { int Count = 5; /* int? */ }"
    );
}

#[test]
fn test_complex_nullable_keeps_warning() {
    let Outcome::Rewritten { text, diagnostics } =
        downgrade("class C { string s = x ?? Compute(); }")
    else {
        panic!("expected a rewrite");
    };
    assert_eq!(
        text,
        "class C { string s = /* DOWNLEVEL WARNING: complex nullable expression */ x ?? Compute(); }"
    );
    assert!(diagnostics.iter().any(|d| d.is_warning() && d.pass == "nullable"));
}

#[test]
fn test_positional_record() {
    assert_eq!(
        rewritten("record Point(int X, int Y);\n"),
        "/* record Point(int X, int Y); */\nclass Point\n{\n    public int X { get; private set; }\n    public int Y { get; private set; }\n\n    public Point(int X, int Y)\n    {\n        this.X = X;\n        this.Y = Y;\n    }\n}\n"
    );
}

#[test]
fn test_namespace_delimiter() {
    assert_eq!(
        rewritten("namespace Foo;\nclass C {}"),
        "namespace Foo\n{\nclass C {}\n}"
    );
}

#[test]
fn test_precedence_between_initializer_and_init_accessor() {
    assert_eq!(
        rewritten("class C { int P { get; init; } = 5; }"),
        "class C { int P { get; set; } /* = 5 */ }"
    );
}

#[test]
fn test_parse_failure_returns_nothing_to_write() {
    for broken in ["class C {", "class C { void M( }", "record R(int X"] {
        match downgrade(broken) {
            Outcome::ParseFailed { errors } => assert!(!errors.is_empty(), "{broken:?}"),
            other => panic!("{broken:?} should fail to parse, got {other:?}"),
        }
    }
}
