//! Syntax kind enumeration for the C# CST
//!
//! Every token and node in the tree is tagged with one `CsSyntaxKind`.
//! The set is closed: rewriters dispatch on it with `match`.

use std::fmt;

macro_rules! syntax_kinds {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        /// Syntax kind for C# tokens, trivia and nodes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum CsSyntaxKind {
            $($(#[$doc])* $name,)*
        }

        impl CsSyntaxKind {
            /// Every kind, indexed by its raw value
            pub const ALL: &'static [CsSyntaxKind] = &[$(CsSyntaxKind::$name,)*];
        }
    };
}

syntax_kinds! {
    // Trivia
    /// Spaces and tabs
    Whitespace,
    /// `\n`, `\r\n` or `\r`
    Newline,
    /// `// ...`
    LineComment,
    /// `/* ... */`
    BlockComment,
    /// A preprocessor line such as `#region` or `#if DEBUG`
    Directive,
    /// UTF-8 byte order mark at the start of a file
    ByteOrderMark,

    // Literals and names
    Ident,
    IntLiteral,
    RealLiteral,
    StringLiteral,
    InterpolatedString,
    CharLiteral,

    // Reserved keywords
    AbstractKw,
    AsKw,
    BaseKw,
    BoolKw,
    BreakKw,
    ByteKw,
    CaseKw,
    CatchKw,
    CharKw,
    CheckedKw,
    ClassKw,
    ConstKw,
    ContinueKw,
    DecimalKw,
    DefaultKw,
    DelegateKw,
    DoKw,
    DoubleKw,
    ElseKw,
    EnumKw,
    EventKw,
    ExplicitKw,
    ExternKw,
    FalseKw,
    FinallyKw,
    FixedKw,
    FloatKw,
    ForKw,
    ForeachKw,
    GotoKw,
    IfKw,
    ImplicitKw,
    InKw,
    IntKw,
    InterfaceKw,
    InternalKw,
    IsKw,
    LockKw,
    LongKw,
    NamespaceKw,
    NewKw,
    NullKw,
    ObjectKw,
    OperatorKw,
    OutKw,
    OverrideKw,
    ParamsKw,
    PrivateKw,
    ProtectedKw,
    PublicKw,
    ReadonlyKw,
    RefKw,
    ReturnKw,
    SbyteKw,
    SealedKw,
    ShortKw,
    SizeofKw,
    StackallocKw,
    StaticKw,
    StringKw,
    StructKw,
    SwitchKw,
    ThisKw,
    ThrowKw,
    TrueKw,
    TryKw,
    TypeofKw,
    UintKw,
    UlongKw,
    UncheckedKw,
    UnsafeKw,
    UshortKw,
    UsingKw,
    VirtualKw,
    VoidKw,
    VolatileKw,
    WhileKw,

    // Punctuation and operators
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    DotDot,
    Colon,
    ColonColon,
    Question,
    QuestionDot,
    QuestionQuestion,
    QuestionQuestionEq,
    Eq,
    EqEq,
    FatArrow,
    Bang,
    BangEq,
    Lt,
    LtEq,
    LtLt,
    LtLtEq,
    Gt,
    GtEq,
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Arrow,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,
    Tilde,

    // Special tokens
    /// Unlexable or unexpected input
    Error,
    /// Zero-width token carrying trivia after the last significant token
    EndOfFile,

    // Top level
    CompilationUnit,
    /// Root of a fragment parsed on its own (members, statements, expressions)
    Fragment,
    ExternAlias,
    UsingDirective,
    NamespaceDecl,
    FileScopedNamespaceDecl,
    AttributeList,
    AttributeTarget,
    Attribute,

    // Type declarations
    ClassDecl,
    StructDecl,
    InterfaceDecl,
    RecordDecl,
    EnumDecl,
    EnumMember,
    DelegateDecl,
    TypeParameterList,
    TypeParameter,
    ConstraintClause,
    Constraint,
    BaseList,
    SimpleBaseType,
    /// `Base(args)` in the base list of a positional record
    PrimaryConstructorBaseType,

    // Members
    FieldDecl,
    EventFieldDecl,
    EventDecl,
    PropertyDecl,
    IndexerDecl,
    MethodDecl,
    OperatorDecl,
    ConversionOperatorDecl,
    ConstructorDecl,
    ConstructorInitializer,
    DestructorDecl,
    ExplicitInterfaceSpecifier,
    AccessorList,
    Accessor,
    ArrowClause,
    EqualsValue,
    VariableDeclaration,
    VariableDeclarator,
    ParameterList,
    BracketedParameterList,
    Parameter,

    // Statements
    Block,
    LocalDeclStatement,
    LocalFunctionStatement,
    ExpressionStatement,
    EmptyStatement,
    LabeledStatement,
    IfStatement,
    ElseClause,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForEachStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    ThrowStatement,
    GotoStatement,
    YieldStatement,
    TryStatement,
    CatchClause,
    CatchDeclaration,
    CatchFilter,
    FinallyClause,
    UsingStatement,
    LockStatement,
    FixedStatement,
    CheckedStatement,
    UnsafeStatement,
    SwitchStatement,
    SwitchSection,
    CaseLabel,
    DefaultLabel,

    // Expressions
    LiteralExpr,
    ThisExpr,
    BaseExpr,
    ParenExpr,
    TupleExpr,
    MemberAccessExpr,
    ConditionalAccessExpr,
    MemberBindingExpr,
    ElementBindingExpr,
    InvocationExpr,
    ElementAccessExpr,
    ArgumentList,
    BracketedArgumentList,
    Argument,
    PrefixUnaryExpr,
    PostfixUnaryExpr,
    AwaitExpr,
    BinaryExpr,
    AssignmentExpr,
    ConditionalExpr,
    CastExpr,
    LambdaExpr,
    AnonymousMethodExpr,
    ObjectCreationExpr,
    ArrayCreationExpr,
    ImplicitArrayCreationExpr,
    AnonymousObjectCreationExpr,
    AnonymousObjectMember,
    InitializerExpr,
    StackAllocExpr,
    TypeOfExpr,
    SizeOfExpr,
    DefaultExpr,
    CheckedExpr,
    IsPatternExpr,
    SwitchExpr,
    SwitchExprArm,
    WhenClause,
    WithExpr,
    ThrowExpr,
    RangeExpr,
    RefExpr,
    DeclarationExpr,
    QueryExpr,
    QueryClause,

    // Patterns
    TypePattern,
    DeclarationPattern,
    ConstantPattern,
    VarPattern,
    DiscardPattern,
    RecursivePattern,
    PropertyPatternClause,
    PositionalPatternClause,
    Subpattern,
    RelationalPattern,
    UnaryPattern,
    BinaryPattern,
    ParenthesizedPattern,
    ListPattern,
    SingleVariableDesignation,
    DiscardDesignation,
    ParenthesizedDesignation,

    // Types
    PredefinedType,
    IdentifierName,
    GenericName,
    TypeArgumentList,
    QualifiedName,
    AliasQualifiedName,
    NullableType,
    ArrayType,
    ArrayRankSpecifier,
    PointerType,
    TupleType,
    TupleElement,
    RefType,
}

impl CsSyntaxKind {
    /// Convert a raw rowan value back into a kind
    pub fn from_raw(raw: u16) -> Self {
        Self::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(CsSyntaxKind::Error)
    }

    /// Whitespace, end-of-line, comments, directives and a leading BOM
    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::Whitespace
                | CsSyntaxKind::Newline
                | CsSyntaxKind::LineComment
                | CsSyntaxKind::BlockComment
                | CsSyntaxKind::Directive
                | CsSyntaxKind::ByteOrderMark
        )
    }

    pub const fn is_comment(self) -> bool {
        matches!(self, CsSyntaxKind::LineComment | CsSyntaxKind::BlockComment)
    }

    pub fn is_keyword(self) -> bool {
        self >= CsSyntaxKind::AbstractKw && self <= CsSyntaxKind::WhileKw
    }

    pub fn is_node(self) -> bool {
        self >= CsSyntaxKind::CompilationUnit
    }

    /// Keywords that name a built-in type (`int`, `string`, ...)
    pub const fn is_predefined_type(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::BoolKw
                | CsSyntaxKind::ByteKw
                | CsSyntaxKind::CharKw
                | CsSyntaxKind::DecimalKw
                | CsSyntaxKind::DoubleKw
                | CsSyntaxKind::FloatKw
                | CsSyntaxKind::IntKw
                | CsSyntaxKind::LongKw
                | CsSyntaxKind::ObjectKw
                | CsSyntaxKind::SbyteKw
                | CsSyntaxKind::ShortKw
                | CsSyntaxKind::StringKw
                | CsSyntaxKind::UintKw
                | CsSyntaxKind::UlongKw
                | CsSyntaxKind::UshortKw
                | CsSyntaxKind::VoidKw
        )
    }

    /// Reserved keywords that may appear in a declaration's modifier list
    pub const fn is_modifier_keyword(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::AbstractKw
                | CsSyntaxKind::ConstKw
                | CsSyntaxKind::ExternKw
                | CsSyntaxKind::InternalKw
                | CsSyntaxKind::NewKw
                | CsSyntaxKind::OverrideKw
                | CsSyntaxKind::PrivateKw
                | CsSyntaxKind::ProtectedKw
                | CsSyntaxKind::PublicKw
                | CsSyntaxKind::ReadonlyKw
                | CsSyntaxKind::RefKw
                | CsSyntaxKind::SealedKw
                | CsSyntaxKind::StaticKw
                | CsSyntaxKind::UnsafeKw
                | CsSyntaxKind::VirtualKw
                | CsSyntaxKind::VolatileKw
                | CsSyntaxKind::FixedKw
        )
    }

    /// Node kinds that denote a type
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::PredefinedType
                | CsSyntaxKind::IdentifierName
                | CsSyntaxKind::GenericName
                | CsSyntaxKind::QualifiedName
                | CsSyntaxKind::AliasQualifiedName
                | CsSyntaxKind::NullableType
                | CsSyntaxKind::ArrayType
                | CsSyntaxKind::PointerType
                | CsSyntaxKind::TupleType
                | CsSyntaxKind::RefType
        )
    }

    /// Node kinds that declare a type
    pub const fn is_type_declaration(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::ClassDecl
                | CsSyntaxKind::StructDecl
                | CsSyntaxKind::InterfaceDecl
                | CsSyntaxKind::RecordDecl
                | CsSyntaxKind::EnumDecl
                | CsSyntaxKind::DelegateDecl
        )
    }

    /// Node kinds that are statements
    pub const fn is_statement(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::Block
                | CsSyntaxKind::LocalDeclStatement
                | CsSyntaxKind::LocalFunctionStatement
                | CsSyntaxKind::ExpressionStatement
                | CsSyntaxKind::EmptyStatement
                | CsSyntaxKind::LabeledStatement
                | CsSyntaxKind::IfStatement
                | CsSyntaxKind::WhileStatement
                | CsSyntaxKind::DoStatement
                | CsSyntaxKind::ForStatement
                | CsSyntaxKind::ForEachStatement
                | CsSyntaxKind::ReturnStatement
                | CsSyntaxKind::BreakStatement
                | CsSyntaxKind::ContinueStatement
                | CsSyntaxKind::ThrowStatement
                | CsSyntaxKind::GotoStatement
                | CsSyntaxKind::YieldStatement
                | CsSyntaxKind::TryStatement
                | CsSyntaxKind::UsingStatement
                | CsSyntaxKind::LockStatement
                | CsSyntaxKind::FixedStatement
                | CsSyntaxKind::CheckedStatement
                | CsSyntaxKind::UnsafeStatement
                | CsSyntaxKind::SwitchStatement
        )
    }

    /// The source text of a reserved keyword
    pub fn keyword_text(self) -> Option<&'static str> {
        KEYWORDS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(text, _)| *text)
    }

    /// Look up a reserved keyword by its text
    pub fn from_keyword(text: &str) -> Option<Self> {
        KEYWORDS
            .binary_search_by(|(kw, _)| kw.cmp(&text))
            .ok()
            .map(|idx| KEYWORDS[idx].1)
    }
}

/// Reserved keywords, sorted by text for binary search
const KEYWORDS: &[(&str, CsSyntaxKind)] = &[
    ("abstract", CsSyntaxKind::AbstractKw),
    ("as", CsSyntaxKind::AsKw),
    ("base", CsSyntaxKind::BaseKw),
    ("bool", CsSyntaxKind::BoolKw),
    ("break", CsSyntaxKind::BreakKw),
    ("byte", CsSyntaxKind::ByteKw),
    ("case", CsSyntaxKind::CaseKw),
    ("catch", CsSyntaxKind::CatchKw),
    ("char", CsSyntaxKind::CharKw),
    ("checked", CsSyntaxKind::CheckedKw),
    ("class", CsSyntaxKind::ClassKw),
    ("const", CsSyntaxKind::ConstKw),
    ("continue", CsSyntaxKind::ContinueKw),
    ("decimal", CsSyntaxKind::DecimalKw),
    ("default", CsSyntaxKind::DefaultKw),
    ("delegate", CsSyntaxKind::DelegateKw),
    ("do", CsSyntaxKind::DoKw),
    ("double", CsSyntaxKind::DoubleKw),
    ("else", CsSyntaxKind::ElseKw),
    ("enum", CsSyntaxKind::EnumKw),
    ("event", CsSyntaxKind::EventKw),
    ("explicit", CsSyntaxKind::ExplicitKw),
    ("extern", CsSyntaxKind::ExternKw),
    ("false", CsSyntaxKind::FalseKw),
    ("finally", CsSyntaxKind::FinallyKw),
    ("fixed", CsSyntaxKind::FixedKw),
    ("float", CsSyntaxKind::FloatKw),
    ("for", CsSyntaxKind::ForKw),
    ("foreach", CsSyntaxKind::ForeachKw),
    ("goto", CsSyntaxKind::GotoKw),
    ("if", CsSyntaxKind::IfKw),
    ("implicit", CsSyntaxKind::ImplicitKw),
    ("in", CsSyntaxKind::InKw),
    ("int", CsSyntaxKind::IntKw),
    ("interface", CsSyntaxKind::InterfaceKw),
    ("internal", CsSyntaxKind::InternalKw),
    ("is", CsSyntaxKind::IsKw),
    ("lock", CsSyntaxKind::LockKw),
    ("long", CsSyntaxKind::LongKw),
    ("namespace", CsSyntaxKind::NamespaceKw),
    ("new", CsSyntaxKind::NewKw),
    ("null", CsSyntaxKind::NullKw),
    ("object", CsSyntaxKind::ObjectKw),
    ("operator", CsSyntaxKind::OperatorKw),
    ("out", CsSyntaxKind::OutKw),
    ("override", CsSyntaxKind::OverrideKw),
    ("params", CsSyntaxKind::ParamsKw),
    ("private", CsSyntaxKind::PrivateKw),
    ("protected", CsSyntaxKind::ProtectedKw),
    ("public", CsSyntaxKind::PublicKw),
    ("readonly", CsSyntaxKind::ReadonlyKw),
    ("ref", CsSyntaxKind::RefKw),
    ("return", CsSyntaxKind::ReturnKw),
    ("sbyte", CsSyntaxKind::SbyteKw),
    ("sealed", CsSyntaxKind::SealedKw),
    ("short", CsSyntaxKind::ShortKw),
    ("sizeof", CsSyntaxKind::SizeofKw),
    ("stackalloc", CsSyntaxKind::StackallocKw),
    ("static", CsSyntaxKind::StaticKw),
    ("string", CsSyntaxKind::StringKw),
    ("struct", CsSyntaxKind::StructKw),
    ("switch", CsSyntaxKind::SwitchKw),
    ("this", CsSyntaxKind::ThisKw),
    ("throw", CsSyntaxKind::ThrowKw),
    ("true", CsSyntaxKind::TrueKw),
    ("try", CsSyntaxKind::TryKw),
    ("typeof", CsSyntaxKind::TypeofKw),
    ("uint", CsSyntaxKind::UintKw),
    ("ulong", CsSyntaxKind::UlongKw),
    ("unchecked", CsSyntaxKind::UncheckedKw),
    ("unsafe", CsSyntaxKind::UnsafeKw),
    ("ushort", CsSyntaxKind::UshortKw),
    ("using", CsSyntaxKind::UsingKw),
    ("virtual", CsSyntaxKind::VirtualKw),
    ("void", CsSyntaxKind::VoidKw),
    ("volatile", CsSyntaxKind::VolatileKw),
    ("while", CsSyntaxKind::WhileKw),
];

impl fmt::Display for CsSyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<CsSyntaxKind> for rowan::SyntaxKind {
    fn from(kind: CsSyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        for (idx, kind) in CsSyntaxKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, idx);
            assert_eq!(CsSyntaxKind::from_raw(idx as u16), *kind);
        }
    }

    #[test]
    fn test_unknown_raw_is_error() {
        assert_eq!(CsSyntaxKind::from_raw(u16::MAX), CsSyntaxKind::Error);
    }

    #[test]
    fn test_keyword_table_is_sorted() {
        assert!(KEYWORDS.windows(2).all(|w| w[0].0 < w[1].0));
        for (text, kind) in KEYWORDS {
            assert!(kind.is_keyword(), "{text} should be a keyword kind");
            assert_eq!(CsSyntaxKind::from_keyword(text), Some(*kind));
            assert_eq!(kind.keyword_text(), Some(*text));
        }
    }

    #[test]
    fn test_contextual_keywords_are_not_reserved() {
        for text in ["record", "init", "global", "var", "get", "set", "when", "with"] {
            assert_eq!(CsSyntaxKind::from_keyword(text), None);
        }
    }

    #[test]
    fn test_classification() {
        assert!(CsSyntaxKind::Whitespace.is_trivia());
        assert!(CsSyntaxKind::Directive.is_trivia());
        assert!(CsSyntaxKind::ByteOrderMark.is_trivia());
        assert!(!CsSyntaxKind::Ident.is_trivia());
        assert!(CsSyntaxKind::IntKw.is_predefined_type());
        assert!(CsSyntaxKind::NullableType.is_type());
        assert!(CsSyntaxKind::IfStatement.is_statement());
        assert!(CsSyntaxKind::RecordDecl.is_type_declaration());
        assert!(CsSyntaxKind::CompilationUnit.is_node());
        assert!(!CsSyntaxKind::EndOfFile.is_node());
    }
}
