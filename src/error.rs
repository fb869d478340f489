// Error types for tslc

use crate::token::Span;
use crate::types::{ShaderStage, ShaderType};
use std::fmt;

/// Result type for the compiler crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors that can occur while parsing, converting, constructing IR
/// nodes, or generating shader source.
///
/// Unknown characters never show up here: both tokenizers degrade them to
/// `Unknown` tokens and keep scanning.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    /// Node-kind name for errors raised by IR construction or codegen,
    /// where no source span exists.
    pub node: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub enum ErrorKind {
    // Parser errors
    UnexpectedToken { expected: String, got: String },
    UnexpectedEof,

    // Conversion errors
    EmptyProgram,
    UndefinedVariable(String),
    UnknownFunction(String),
    UnsupportedExpr(String),
    MissingArguments(String),
    MissingElse,
    InvalidSwizzle(String),

    // Node construction errors
    InvalidOperator(String),
    InvalidMathFunction { name: String, arity: usize },
    InvalidAtomicOp(String),
    MissingCompareOperand,
    InvalidWorkgroupSize([u32; 3]),
    InvalidDispatchCount(u32),
    InvalidBarrierScope(String),
    InvalidSubgroupOp(String),

    // Analyze/generate errors
    WrongArgumentCount { required: usize, total: usize, got: usize },
    ArgumentTypeMismatch { param: String, expected: ShaderType, got: ShaderType },
    WrongStage { needed: ShaderStage, active: ShaderStage },
    UniformTypeConflict { name: String, declared: ShaderType, requested: ShaderType },
    NotAFunction,

    // General
    Message(String),
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
            node: None,
        }
    }

    /// An error raised by an IR node outside any source location.
    pub fn node(kind: ErrorKind, node: &'static str) -> Self {
        Self {
            kind,
            span: None,
            node: Some(node),
        }
    }

    pub fn msg(s: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Message(s.into()),
            span: None,
            node: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(span) = &self.span {
            write!(f, "[{}:{}] ", span.line, span.col)?;
        }
        if let Some(node) = self.node {
            write!(f, "[{node}] ")?;
        }
        match &self.kind {
            ErrorKind::UnexpectedToken { expected, got } => {
                write!(f, "expected {expected}, got {got}")
            }
            ErrorKind::UnexpectedEof => write!(f, "unexpected end of file"),
            ErrorKind::EmptyProgram => write!(f, "program has no statements"),
            ErrorKind::UndefinedVariable(name) => write!(f, "undefined variable '{name}'"),
            ErrorKind::UnknownFunction(name) => write!(f, "unknown function '{name}'"),
            ErrorKind::UnsupportedExpr(what) => write!(f, "unsupported expression: {what}"),
            ErrorKind::MissingArguments(name) => {
                write!(f, "'{name}' requires at least one argument")
            }
            ErrorKind::MissingElse => {
                write!(f, "if expression used as a value requires an else branch")
            }
            ErrorKind::InvalidSwizzle(s) => write!(f, "invalid swizzle '.{s}'"),
            ErrorKind::InvalidOperator(op) => write!(f, "invalid operator '{op}'"),
            ErrorKind::InvalidMathFunction { name, arity } => {
                write!(f, "no math function '{name}' taking {arity} argument(s)")
            }
            ErrorKind::InvalidAtomicOp(op) => write!(f, "invalid atomic operation '{op}'"),
            ErrorKind::MissingCompareOperand => {
                write!(f, "atomic compSwap requires a compare operand")
            }
            ErrorKind::InvalidWorkgroupSize(size) => {
                write!(
                    f,
                    "workgroup size [{}, {}, {}] must have three positive dimensions",
                    size[0], size[1], size[2]
                )
            }
            ErrorKind::InvalidDispatchCount(n) => {
                write!(f, "dispatch count {n} must be at least 1")
            }
            ErrorKind::InvalidBarrierScope(s) => write!(f, "invalid barrier scope '{s}'"),
            ErrorKind::InvalidSubgroupOp(s) => write!(f, "invalid subgroup operation '{s}'"),
            ErrorKind::WrongArgumentCount {
                required,
                total,
                got,
            } => {
                write!(f, "call takes {required} to {total} argument(s), got {got}")
            }
            ErrorKind::ArgumentTypeMismatch {
                param,
                expected,
                got,
            } => {
                write!(f, "argument '{param}' expects {expected}, got {got}")
            }
            ErrorKind::WrongStage { needed, active } => {
                write!(
                    f,
                    "operation requires the {needed} stage, but the active stage is {active}"
                )
            }
            ErrorKind::UniformTypeConflict {
                name,
                declared,
                requested,
            } => {
                write!(
                    f,
                    "uniform '{name}' already declared as {declared}, requested as {requested}"
                )
            }
            ErrorKind::NotAFunction => write!(f, "call target is not a function node"),
            ErrorKind::Message(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for Error {}
