//! AST representing a template.
//!
//! The parser emits a flat list of [`Node`]s, one per region of the source.
//! Control tags are not nested into blocks here, see [`crate::validate`] for
//! the structural checks.

use std::borrow::Cow;
use std::fmt;

use crate::types::span::Span;

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Template<'source> {
    /// The top level nodes in document order.
    ///
    /// The node spans are contiguous and together cover the entire source.
    pub nodes: Vec<Node<'source>>,
}

/// A top level region of the template source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Node<'source> {
    /// Raw template text, e.g. `<p>Hello `
    Content(Content<'source>),
    /// A comment, e.g. `{# note {# nested #} #}`
    Comment(Comment),
    /// A control tag, e.g. `{% if cond %}`
    Tag(Tag<'source>),
    /// A render expression, e.g. `{{ user.name }}`
    Expr(InlineExpr<'source>),
    /// The verbatim text between `{% raw %}` and `{% endraw %}`.
    Raw(Raw<'source>),
    /// A tag that failed to parse.
    Error(Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Content<'source> {
    pub text: &'source str,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comment {
    pub ws: Ws,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tag<'source> {
    pub stmt: Stmt<'source>,
    pub ws: Ws,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InlineExpr<'source> {
    pub expr: Expr<'source>,
    pub ws: Ws,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Raw<'source> {
    pub text: &'source str,
    pub span: Span,
}

/// The whitespace modifiers on the opening and closing delimiter of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ws(pub Option<Whitespace>, pub Option<Whitespace>);

/// A whitespace control modifier adjacent to a delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Whitespace {
    /// `-`
    Suppress,
    /// `+`
    Preserve,
    /// `~`
    Minimize,
}

/// A statement inside a control tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Stmt<'source> {
    pub kind: StmtKind<'source>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StmtKind<'source> {
    /// `block name`
    Block(Ident<'source>),
    /// `endblock [name]`
    EndBlock(Option<Ident<'source>>),
    /// `extends "base.html"`
    Extends(Str<'source>),
    /// `include "item.html"`
    Include(Str<'source>),
    /// `import "macros.html" as scope`
    Import(Import<'source>),
    /// `let pattern [= expr]` or `set pattern [= expr]`
    Let(Let<'source>),
    /// `for pattern in expr [if cond]`
    For(For<'source>),
    EndFor,
    Break,
    Continue,
    /// `if cond`
    If(Cond<'source>),
    /// `else if cond` or `elif cond`
    ElseIf(Cond<'source>),
    Else,
    EndIf,
    /// `match expr`
    Match(Expr<'source>),
    EndMatch,
    /// `when pattern`
    When(Pattern<'source>),
    EndWhen,
    /// `macro name(params)`
    Macro(MacroDef<'source>),
    /// `endmacro [name]`
    EndMacro(Option<Ident<'source>>),
    /// `call [(bindings)] callee(args)`
    Call(CallBlock<'source>),
    EndCall,
    /// `filter name | name(args)`
    Filter(FilterBlock<'source>),
    EndFilter,
    Raw,
    EndRaw,
}

/// A string literal operand, e.g. the path in `include "item.html"`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Str<'source> {
    /// The unescaped value.
    pub value: Cow<'source, str>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Import<'source> {
    pub path: Str<'source>,
    pub alias: Ident<'source>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Let<'source> {
    pub keyword: LetKeyword,
    pub mutable: bool,
    pub pattern: Pattern<'source>,
    pub value: Option<Expr<'source>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LetKeyword {
    Let,
    Set,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct For<'source> {
    pub pattern: Pattern<'source>,
    pub iterable: Expr<'source>,
    /// An optional loop filter, e.g. `for x in xs if x > 0`.
    pub cond: Option<Expr<'source>>,
}

/// The condition of an `if` or `else if` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Cond<'source> {
    /// `if expr`
    Expr(Expr<'source>),
    /// `if let pattern = expr`
    Let {
        pattern: Pattern<'source>,
        value: Expr<'source>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MacroDef<'source> {
    pub name: Ident<'source>,
    pub params: Vec<Param<'source>>,
}

/// A macro parameter with an optional default value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Param<'source> {
    pub name: Ident<'source>,
    pub default: Option<Expr<'source>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CallBlock<'source> {
    /// The names bound for the caller body, e.g. `call(a, b) m(x)`.
    pub bindings: Vec<Ident<'source>>,
    /// The macro call, always an [`ExprKind::Call`].
    pub call: Expr<'source>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FilterBlock<'source> {
    pub filters: Vec<Filter<'source>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ident<'source> {
    pub name: &'source str,
    pub span: Span,
}

/// A `::` separated path, e.g. `std::cmp::max` or `::Global`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Path<'source> {
    /// Whether the path starts with `::`.
    pub global: bool,
    pub segments: Vec<Ident<'source>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Expr<'source> {
    pub kind: ExprKind<'source>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ExprKind<'source> {
    Lit(Lit<'source>),
    Var(&'source str),
    Path(Path<'source>),
    Binary {
        op: BinOp,
        left: Box<Expr<'source>>,
        right: Box<Expr<'source>>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr<'source>>,
    },
    /// `&expr`
    Ref(Box<Expr<'source>>),
    /// `expr?`
    Try(Box<Expr<'source>>),
    Call {
        callee: Box<Expr<'source>>,
        args: Args<'source>,
    },
    Field {
        object: Box<Expr<'source>>,
        key: Key<'source>,
    },
    Index {
        object: Box<Expr<'source>>,
        index: Box<Expr<'source>>,
    },
    Range {
        start: Option<Box<Expr<'source>>>,
        end: Option<Box<Expr<'source>>>,
        inclusive: bool,
    },
    Array(Vec<Expr<'source>>),
    Tuple(Vec<Expr<'source>>),
    Unit,
    Group(Box<Expr<'source>>),
    /// A chain of filters applied left to right.
    Filter {
        value: Box<Expr<'source>>,
        filters: Vec<Filter<'source>>,
    },
    IsDefined {
        expr: Box<Expr<'source>>,
        negated: bool,
    },
    /// `path!(args)`
    Macro {
        path: Path<'source>,
        args: Args<'source>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Lit<'source> {
    /// A string literal with escapes resolved.
    Str(Cow<'source, str>),
    Char(char),
    Num(Num<'source>),
    Bool(bool),
}

/// A number literal.
///
/// The value is not evaluated; `raw` holds the literal text without any sign,
/// including the radix prefix, digit separators and type suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Num<'source> {
    pub raw: &'source str,
    pub kind: NumKind,
    pub suffix: Option<&'source str>,
    pub negative: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NumKind {
    Int,
    Float,
}

/// The member in a field access, either a name or a tuple index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Key<'source> {
    Name(Ident<'source>),
    Index(Index),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Index {
    pub value: usize,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BinOp {
    Mul,
    Div,
    Rem,
    Concat,
    Add,
    Sub,
    Shl,
    Shr,
    BitAnd,
    Xor,
    BitOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum UnOp {
    /// `!`
    Not,
    /// `*`
    Deref,
    /// `-`
    Neg,
}

/// A filter application, e.g. `truncate(10)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Filter<'source> {
    pub name: Ident<'source>,
    pub args: Option<Args<'source>>,
    pub span: Span,
}

/// A parenthesized argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Args<'source> {
    pub items: Vec<Arg<'source>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Arg<'source> {
    Positional(Expr<'source>),
    /// `name = value`
    Named {
        name: Ident<'source>,
        value: Expr<'source>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Pattern<'source> {
    pub kind: PatternKind<'source>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PatternKind<'source> {
    Lit(Lit<'source>),
    Ident(&'source str),
    Path(Path<'source>),
    /// `_`
    Placeholder,
    /// `..`
    Rest,
    /// `Some(x)`
    TupleStruct {
        path: Path<'source>,
        elems: Vec<Pattern<'source>>,
    },
    /// `Point { x, y: 0, .. }`
    Struct {
        path: Path<'source>,
        fields: Vec<FieldPattern<'source>>,
    },
    Tuple(Vec<Pattern<'source>>),
    Slice(Vec<Pattern<'source>>),
    /// `a | b` or `a or b`
    Or(Vec<Pattern<'source>>),
    /// `Some with (x)`
    With {
        base: Box<Pattern<'source>>,
        destructure: Vec<Pattern<'source>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FieldPattern<'source> {
    /// `name` or `name: pattern`
    Field {
        name: Ident<'source>,
        pattern: Option<Pattern<'source>>,
    },
    /// `..`
    Rest(Span),
}

////////////////////////////////////////////////////////////////////////////////
// Accessors
////////////////////////////////////////////////////////////////////////////////

impl Node<'_> {
    pub fn span(&self) -> Span {
        match self {
            Self::Content(content) => content.span,
            Self::Comment(comment) => comment.span,
            Self::Tag(tag) => tag.span,
            Self::Expr(expr) => expr.span,
            Self::Raw(raw) => raw.span,
            Self::Error(span) => *span,
        }
    }
}

impl<'source> Template<'source> {
    /// Returns an iterator over the control tags in document order, along with
    /// their index in [`Template::nodes`].
    pub fn tags(&self) -> impl Iterator<Item = (usize, &Tag<'source>)> {
        self.nodes.iter().enumerate().filter_map(|(i, node)| match node {
            Node::Tag(tag) => Some((i, tag)),
            _ => None,
        })
    }
}

impl Whitespace {
    pub(crate) fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Suppress),
            '+' => Some(Self::Preserve),
            '~' => Some(Self::Minimize),
            _ => None,
        }
    }

    pub const fn as_char(&self) -> char {
        match self {
            Self::Suppress => '-',
            Self::Preserve => '+',
            Self::Minimize => '~',
        }
    }
}

impl Key<'_> {
    pub const fn span(&self) -> Span {
        match self {
            Key::Name(key) => key.span,
            Key::Index(key) => key.span,
        }
    }
}

impl BinOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Concat => "~",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::BitAnd => "bitand",
            Self::Xor => "xor",
            Self::BitOr => "bitor",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

impl UnOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Deref => "*",
            Self::Neg => "-",
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Display
////////////////////////////////////////////////////////////////////////////////

/// Writes the items separated by `, `.
fn comma_sep<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 || self.global {
                f.write_str("::")?;
            }
            f.write_str(seg.name)?;
        }
        Ok(())
    }
}

impl fmt::Display for Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl fmt::Display for Lit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Char(c) => write!(f, "{c:?}"),
            Self::Num(num) => {
                if num.negative {
                    f.write_str("-")?;
                }
                f.write_str(num.raw)
            }
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(ident) => f.write_str(ident.name),
            Self::Index(index) => write!(f, "{}", index.value),
        }
    }
}

impl fmt::Display for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional(expr) => write!(f, "{expr}"),
            Self::Named { name, value } => write!(f, "{name} = {value}"),
        }
    }
}

impl fmt::Display for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        comma_sep(f, &self.items)?;
        f.write_str(")")
    }
}

impl fmt::Display for Filter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.name)?;
        match &self.args {
            Some(args) => write!(f, "{args}"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Lit(lit) => write!(f, "{lit}"),
            ExprKind::Var(name) => f.write_str(name),
            ExprKind::Path(path) => write!(f, "{path}"),
            ExprKind::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.as_str())
            }
            ExprKind::Unary { op, operand } => write!(f, "({}{operand})", op.as_str()),
            ExprKind::Ref(operand) => write!(f, "(&{operand})"),
            ExprKind::Try(operand) => write!(f, "{operand}?"),
            ExprKind::Call { callee, args } => write!(f, "{callee}{args}"),
            ExprKind::Field { object, key } => write!(f, "{object}.{key}"),
            ExprKind::Index { object, index } => write!(f, "{object}[{index}]"),
            ExprKind::Range {
                start,
                end,
                inclusive,
            } => {
                f.write_str("(")?;
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_str(if *inclusive { "..=" } else { ".." })?;
                if let Some(end) = end {
                    write!(f, "{end}")?;
                }
                f.write_str(")")
            }
            ExprKind::Array(elems) => {
                f.write_str("[")?;
                comma_sep(f, elems)?;
                f.write_str("]")
            }
            ExprKind::Tuple(elems) => {
                f.write_str("(")?;
                comma_sep(f, elems)?;
                if elems.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            ExprKind::Unit => f.write_str("()"),
            ExprKind::Group(inner) => write!(f, "({inner})"),
            ExprKind::Filter { value, filters } => {
                write!(f, "({value}")?;
                for filter in filters {
                    write!(f, " | {filter}")?;
                }
                f.write_str(")")
            }
            ExprKind::IsDefined { expr, negated } => {
                let not = if *negated { "not " } else { "" };
                write!(f, "({expr} is {not}defined)")
            }
            ExprKind::Macro { path, args } => write!(f, "{path}!{args}"),
        }
    }
}

impl fmt::Display for Pattern<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PatternKind::Lit(lit) => write!(f, "{lit}"),
            PatternKind::Ident(name) => f.write_str(name),
            PatternKind::Path(path) => write!(f, "{path}"),
            PatternKind::Placeholder => f.write_str("_"),
            PatternKind::Rest => f.write_str(".."),
            PatternKind::TupleStruct { path, elems } => {
                write!(f, "{path}(")?;
                comma_sep(f, elems)?;
                f.write_str(")")
            }
            PatternKind::Struct { path, fields } => {
                if fields.is_empty() {
                    return write!(f, "{path} {{}}");
                }
                write!(f, "{path} {{ ")?;
                comma_sep(f, fields)?;
                f.write_str(" }")
            }
            PatternKind::Tuple(elems) => {
                f.write_str("(")?;
                comma_sep(f, elems)?;
                if elems.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            PatternKind::Slice(elems) => {
                f.write_str("[")?;
                comma_sep(f, elems)?;
                f.write_str("]")
            }
            PatternKind::Or(alts) => {
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alt}")?;
                }
                Ok(())
            }
            PatternKind::With { base, destructure } => {
                write!(f, "{base} with (")?;
                comma_sep(f, destructure)?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for FieldPattern<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field {
                name,
                pattern: Some(pattern),
            } => write!(f, "{name}: {pattern}"),
            Self::Field {
                name,
                pattern: None,
            } => write!(f, "{name}"),
            Self::Rest(_) => f.write_str(".."),
        }
    }
}

impl fmt::Display for Cond<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(expr) => write!(f, "{expr}"),
            Self::Let { pattern, value } => write!(f, "let {pattern} = {value}"),
        }
    }
}

impl fmt::Display for Param<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "{} = {default}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for Stmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Block(name) => write!(f, "block {name}"),
            StmtKind::EndBlock(Some(name)) => write!(f, "endblock {name}"),
            StmtKind::EndBlock(None) => f.write_str("endblock"),
            StmtKind::Extends(path) => write!(f, "extends {path}"),
            StmtKind::Include(path) => write!(f, "include {path}"),
            StmtKind::Import(Import { path, alias }) => write!(f, "import {path} as {alias}"),
            StmtKind::Let(Let {
                keyword,
                mutable,
                pattern,
                value,
            }) => {
                f.write_str(match keyword {
                    LetKeyword::Let => "let ",
                    LetKeyword::Set => "set ",
                })?;
                if *mutable {
                    f.write_str("mut ")?;
                }
                write!(f, "{pattern}")?;
                match value {
                    Some(value) => write!(f, " = {value}"),
                    None => Ok(()),
                }
            }
            StmtKind::For(For {
                pattern,
                iterable,
                cond,
            }) => {
                write!(f, "for {pattern} in {iterable}")?;
                match cond {
                    Some(cond) => write!(f, " if {cond}"),
                    None => Ok(()),
                }
            }
            StmtKind::EndFor => f.write_str("endfor"),
            StmtKind::Break => f.write_str("break"),
            StmtKind::Continue => f.write_str("continue"),
            StmtKind::If(cond) => write!(f, "if {cond}"),
            StmtKind::ElseIf(cond) => write!(f, "else if {cond}"),
            StmtKind::Else => f.write_str("else"),
            StmtKind::EndIf => f.write_str("endif"),
            StmtKind::Match(expr) => write!(f, "match {expr}"),
            StmtKind::EndMatch => f.write_str("endmatch"),
            StmtKind::When(pattern) => write!(f, "when {pattern}"),
            StmtKind::EndWhen => f.write_str("endwhen"),
            StmtKind::Macro(MacroDef { name, params }) => {
                write!(f, "macro {name}(")?;
                comma_sep(f, params)?;
                f.write_str(")")
            }
            StmtKind::EndMacro(Some(name)) => write!(f, "endmacro {name}"),
            StmtKind::EndMacro(None) => f.write_str("endmacro"),
            StmtKind::Call(CallBlock { bindings, call }) => {
                f.write_str("call ")?;
                if !bindings.is_empty() {
                    f.write_str("(")?;
                    comma_sep(f, bindings)?;
                    f.write_str(") ")?;
                }
                write!(f, "{call}")
            }
            StmtKind::EndCall => f.write_str("endcall"),
            StmtKind::Filter(FilterBlock { filters }) => {
                f.write_str("filter ")?;
                for (i, filter) in filters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{filter}")?;
                }
                Ok(())
            }
            StmtKind::EndFilter => f.write_str("endfilter"),
            StmtKind::Raw => f.write_str("raw"),
            StmtKind::EndRaw => f.write_str("endraw"),
        }
    }
}
