//! Binary and unary operators.

/// Binary operators, in no particular order.
///
/// Precedence lives in the parser; this type only names the operation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Power,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // Relational keywords
    InstanceOf,
    Matches,
    Between,
}

impl BinaryOp {
    /// Source-level symbol, as written back by the AST printer.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Power => "^",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "and",
            Self::Or => "or",
            Self::InstanceOf => "instanceof",
            Self::Matches => "matches",
            Self::Between => "between",
        }
    }

    #[inline]
    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod | Self::Power
        )
    }

    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    #[inline]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// `!x`, `not x`
    Not,
    /// `-x`
    Neg,
    /// `+x`
    Plus,
}

impl UnaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
            Self::Plus => "+",
        }
    }
}

/// Which matches a selection keeps.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SelectionKind {
    /// `?[..]`
    All,
    /// `^[..]`
    First,
    /// `$[..]`
    Last,
}

impl SelectionKind {
    /// Opening token, without the leading dot.
    pub const fn opener(self) -> &'static str {
        match self {
            Self::All => "?[",
            Self::First => "^[",
            Self::Last => "$[",
        }
    }
}
