// Conversion — AST → Node graph
//
// This pass walks a parsed AST (tslc::ast::Program) and emits the IR
// graph (tslc::node::NodeGraph). The conversion:
//
//   1. Resolves variable references through a flat symbol table
//      (name → already-converted node; re-declaring overwrites)
//   2. Resolves user function names to Function nodes
//   3. Routes binary operators by category: arithmetic becomes an
//      Operator node, comparison/logical becomes a Math node
//   4. Resolves built-in names to Math operations and vector
//      constructors, and type annotations to explicit conversions
//   5. Returns the node produced by the last top-level statement
//
// SCOPING: the symbol tables span the whole conversion run. There is no
// nested lexical scoping — a function parameter or block-local variable
// simply overwrites any same-named binding.
//
// ERRORS: conversion fails on an empty program, an undefined variable,
// an unknown function, a zero-argument constructor, or an `if` used as a
// value without an `else`. All errors carry the source span.

use std::collections::HashMap;

use crate::ast::*;
use crate::error::{Error, ErrorKind, Result};
use crate::node::{
    ConstantValue, FunctionBody, FunctionParameter, NodeGraph, NodeId, BINARY_MATH, TERNARY_MATH,
    UNARY_MATH,
};
use crate::token::Span;
use crate::types::{type_lookup, ShaderType};
use log::debug;

/// Convert a parsed AST program into a node graph. Returns the graph and
/// the node produced by the last top-level statement.
pub fn lower(program: &Program) -> Result<(NodeGraph, NodeId)> {
    let mut ctx = LowerCtx::new();
    let root = ctx.lower_program(program)?;
    debug!(
        "lowered {} statement(s) into {} node(s)",
        program.statements.len(),
        ctx.graph.len()
    );
    Ok((ctx.graph, root))
}

// Conversion context

struct LowerCtx {
    graph: NodeGraph,
    /// name → converted node. Flat; re-declaration overwrites.
    variables: HashMap<String, NodeId>,
    /// name → Function node.
    functions: HashMap<String, NodeId>,
}

impl LowerCtx {
    fn new() -> Self {
        Self {
            graph: NodeGraph::new(),
            variables: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    fn lower_program(&mut self, program: &Program) -> Result<NodeId> {
        let mut last = None;
        for stmt in &program.statements {
            if let Some(id) = self.lower_stmt(stmt)? {
                last = Some(id);
            }
        }
        last.ok_or_else(|| Error::new(ErrorKind::EmptyProgram, Span::new(0, 0, 1, 1)))
    }

    /// Lower one statement. `return;` with no value produces nothing.
    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<Option<NodeId>> {
        match stmt {
            Stmt::FunctionDecl(decl) => Ok(Some(self.lower_function_decl(decl)?)),
            Stmt::VarDecl(decl) => Ok(Some(self.lower_var_decl(decl)?)),
            Stmt::Return { value, .. } => match value {
                Some(expr) => Ok(Some(self.lower_expr(expr)?)),
                None => Ok(None),
            },
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                span,
            } => Ok(Some(self.lower_if(
                condition,
                then_branch,
                else_branch.as_ref(),
                *span,
            )?)),
            Stmt::Block(block) => self.lower_block(block),
            Stmt::Expression { expr, .. } => Ok(Some(self.lower_expr(expr)?)),
        }
    }

    /// `var x: float = expr;` — the annotation becomes an explicit
    /// conversion only when the initializer's statically-known type
    /// disagrees with it.
    fn lower_var_decl(&mut self, decl: &VarDecl) -> Result<NodeId> {
        let mut value = self.lower_expr(&decl.init)?;
        if let Some(annotation) = decl.ty {
            let inferred = self.graph.infer_type(value);
            if inferred != ShaderType::Auto && inferred != annotation {
                value = self.graph.convert(annotation, value);
            }
        }
        self.variables.insert(decl.name.clone(), value);
        Ok(value)
    }

    /// `fn name(float a, ...) -> float { ... }` — parameters bind
    /// Parameter nodes in the (flat) symbol table, the body lowers to an
    /// expression subgraph, and the whole thing becomes a Function node.
    fn lower_function_decl(&mut self, decl: &FunctionDecl) -> Result<NodeId> {
        let mut parameters = Vec::with_capacity(decl.parameters.len());
        for param in &decl.parameters {
            let node = self.graph.parameter(&param.name, param.ty);
            self.variables.insert(param.name.clone(), node);
            parameters.push(FunctionParameter::new(&param.name, param.ty));
        }

        let body = self
            .lower_block(&decl.body)?
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::Message(format!("function '{}' has an empty body", decl.name)),
                    decl.span,
                )
            })?;

        let node = self.graph.function(
            &decl.name,
            parameters,
            decl.return_type,
            FunctionBody::Expr(body),
        );
        self.functions.insert(decl.name.clone(), node);
        Ok(node)
    }

    /// Lower a block to the value of its last value-producing statement.
    fn lower_block(&mut self, block: &Block) -> Result<Option<NodeId>> {
        let mut last = None;
        for stmt in &block.statements {
            if let Some(id) = self.lower_stmt(stmt)? {
                last = Some(id);
            }
        }
        Ok(last)
    }

    /// `if` lowers to a ternary Conditional — the IR has no statement-
    /// level control flow. A missing `else` is an error: silently
    /// substituting a zero constant would change the meaning of the
    /// expression.
    fn lower_if(
        &mut self,
        condition: &Expr,
        then_branch: &Block,
        else_branch: Option<&Block>,
        span: Span,
    ) -> Result<NodeId> {
        let cond = self.lower_expr(condition)?;
        let then_value = self
            .lower_block(then_branch)?
            .ok_or_else(|| Error::new(ErrorKind::Message("empty if branch".into()), span))?;
        let else_block =
            else_branch.ok_or_else(|| Error::new(ErrorKind::MissingElse, span))?;
        let else_value = self
            .lower_block(else_block)?
            .ok_or_else(|| Error::new(ErrorKind::Message("empty else branch".into()), span))?;
        Ok(self.graph.conditional(cond, then_value, else_value))
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<NodeId> {
        match expr {
            Expr::Int(n, _) => Ok(self.graph.constant(ConstantValue::Int(*n))),
            Expr::Uint(n, _) => Ok(self.graph.constant(ConstantValue::Uint(*n))),
            Expr::Float(v, _) => Ok(self.graph.constant(ConstantValue::Float(*v))),
            Expr::Bool(b, _) => Ok(self.graph.constant(ConstantValue::Bool(*b))),

            Expr::Ident(name, span) => self
                .variables
                .get(name)
                .copied()
                .ok_or_else(|| Error::new(ErrorKind::UndefinedVariable(name.clone()), *span)),

            Expr::Assignment {
                target,
                value,
                span: _,
            } => {
                let node = self.lower_expr(value)?;
                self.variables.insert(target.clone(), node);
                Ok(node)
            }

            Expr::Binary {
                left,
                op,
                right,
                span,
            } => {
                let l = self.lower_expr(left)?;
                let r = self.lower_expr(right)?;
                if op.is_arithmetic() {
                    let symbol = match op {
                        BinOp::Add => "+",
                        BinOp::Sub => "-",
                        BinOp::Mul => "*",
                        BinOp::Div => "/",
                        _ => "%",
                    };
                    self.graph.operator(symbol, l, r).map_err(at(*span))
                } else {
                    // Comparison and logical operators route through
                    // Math, carrying the operation name as the method.
                    let method = match op {
                        BinOp::Eq => "equal",
                        BinOp::Ne => "notEqual",
                        BinOp::Lt => "lessThan",
                        BinOp::Le => "lessThanEqual",
                        BinOp::Gt => "greaterThan",
                        BinOp::Ge => "greaterThanEqual",
                        BinOp::And => "and",
                        _ => "or",
                    };
                    self.graph.math(method, vec![l, r]).map_err(at(*span))
                }
            }

            Expr::Unary { op, operand, span } => {
                let value = self.lower_expr(operand)?;
                match op {
                    // Unary minus is multiplication by -1.
                    UnaryOp::Neg => {
                        let neg_one = self.graph.constant(ConstantValue::Float(-1.0));
                        self.graph.operator("*", neg_one, value).map_err(at(*span))
                    }
                    UnaryOp::Not => self.graph.math("not", vec![value]).map_err(at(*span)),
                }
            }

            Expr::Member {
                object,
                field,
                span,
            } => {
                let value = self.lower_expr(object)?;
                self.graph.swizzle(value, field).map_err(at(*span))
            }

            Expr::Call { callee, args, span } => self.lower_call(callee, args, *span),
        }
    }

    /// Route a call: type constructors, then built-in math, then user
    /// functions. Anything else is unknown.
    fn lower_call(&mut self, callee: &str, args: &[Expr], span: Span) -> Result<NodeId> {
        // Type constructors: vec3(x), float(x), ...
        if let Some(ty) = type_lookup(callee) {
            if args.is_empty() {
                return Err(Error::new(
                    ErrorKind::MissingArguments(callee.to_string()),
                    span,
                ));
            }
            if args.len() == 1 {
                let value = self.lower_expr(&args[0])?;
                return Ok(self.graph.convert(ty, value));
            }
            if ty.vector_dim().is_some() {
                let parts = args
                    .iter()
                    .map(|a| self.lower_expr(a))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(self.graph.join(parts));
            }
            return Err(Error::new(
                ErrorKind::UnsupportedExpr(format!(
                    "multi-argument constructor for {ty}"
                )),
                span,
            ));
        }

        // Built-in math functions
        if UNARY_MATH.contains(&callee)
            || BINARY_MATH.contains(&callee)
            || TERNARY_MATH.contains(&callee)
        {
            if args.is_empty() {
                return Err(Error::new(
                    ErrorKind::MissingArguments(callee.to_string()),
                    span,
                ));
            }
            let lowered = args
                .iter()
                .map(|a| self.lower_expr(a))
                .collect::<Result<Vec<_>>>()?;
            return self.graph.math(callee, lowered).map_err(at(span));
        }

        // Previously declared user function
        if let Some(&function) = self.functions.get(callee) {
            let lowered = args
                .iter()
                .map(|a| self.lower_expr(a))
                .collect::<Result<Vec<_>>>()?;
            return Ok(self.graph.function_call(function, lowered));
        }

        Err(Error::new(
            ErrorKind::UnknownFunction(callee.to_string()),
            span,
        ))
    }
}

/// Attach a source span to a construction error.
fn at(span: Span) -> impl Fn(Error) -> Error {
    move |mut err| {
        err.span = Some(span);
        err
    }
}
