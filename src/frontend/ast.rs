//! Abstract Syntax Tree definitions for Ember
//!
//! Two closed node families, [`Expr`] and [`Stmt`]. The parser owns node
//! construction; every consumer dispatches with an exhaustive `match`.

use crate::frontend::token::{Literal, Token};

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Binary operation
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    /// Prefix operation (`-x`, `not x`)
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    /// Literal value, decoded at scan time
    Literal {
        value: Option<Literal>,
    },
    /// Parenthesized expression
    Grouping {
        expression: Box<Expr>,
    },
    /// Identifier reference
    Variable {
        name: Token,
    },
    /// Function call
    Call {
        callee: Box<Expr>,
        /// Closing parenthesis, kept for diagnostics
        paren: Token,
        arguments: Vec<Expr>,
    },
    /// Single-target assignment
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    /// Multi-target assignment (`x, y = 1, 2`)
    MultiAssign {
        targets: Vec<Token>,
        values: Vec<Expr>,
    },
    /// Type-hinted variable declaration (`x: int = 42`)
    TypeHint {
        name: Token,
        ty: Box<Expr>,
        value: Box<Expr>,
    },
    /// Bracket application (`List[T]`, `items[0]`)
    GenericType {
        base: Box<Expr>,
        params: Vec<Expr>,
    },
}

impl Expr {
    /// Representative token for diagnostics.
    ///
    /// Total over the variant set; literals have no token of their own and
    /// fall back to the sentinel.
    pub fn token(&self) -> Token {
        match self {
            Expr::Binary { operator, .. } => operator.clone(),
            Expr::Unary { operator, .. } => operator.clone(),
            Expr::Literal { .. } => Token::sentinel(),
            Expr::Grouping { expression } => expression.token(),
            Expr::Variable { name } => name.clone(),
            Expr::Call { paren, .. } => paren.clone(),
            Expr::Assign { name, .. } => name.clone(),
            Expr::MultiAssign { targets, .. } => {
                targets.first().cloned().unwrap_or_else(Token::sentinel)
            }
            Expr::TypeHint { name, .. } => name.clone(),
            Expr::GenericType { base, .. } => base.token(),
        }
    }
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Bare expression statement
    Expression {
        expression: Expr,
    },
    /// Function declaration
    Function(FunctionDecl),
    /// return [expr]
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    /// if cond: then [else: else]; branches are single statements
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    /// with resource: body
    With {
        resource: Expr,
        body: Vec<Stmt>,
    },
    /// for target in iterator [if filter]: body
    For {
        target: Token,
        iterator: Expr,
        filter: Option<Expr>,
        body: Vec<Stmt>,
    },
    /// match scrutinee: case...
    PatternMatch {
        scrutinee: Expr,
        cases: Vec<PatternCase>,
    },
    /// Actor declaration
    Actor(ActorDecl),
}

/// Function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Decorator>,
    /// `<T, ...>` generic parameter names
    pub generic_params: Vec<Token>,
    /// `-> type` annotation
    pub return_type: Option<Expr>,
    pub is_async: bool,
}

/// Function parameter with its optional `: type` hint
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Token,
    pub type_hint: Option<Expr>,
}

/// `@name` or `@name(args)` attached to a function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub name: Token,
    pub arguments: Vec<Expr>,
}

/// One `case pattern [as binding] [if guard]: body` clause
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCase {
    pub pattern: Expr,
    pub guard: Option<Expr>,
    pub binding: Option<Token>,
    pub body: Vec<Stmt>,
}

/// Actor declaration: state variables plus methods
#[derive(Debug, Clone, PartialEq)]
pub struct ActorDecl {
    pub name: Token,
    pub state_vars: Vec<Stmt>,
    pub methods: Vec<FunctionDecl>,
}
