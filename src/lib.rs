//! # tslc
//!
//! Compiler for the TSL shading language.
//!
//! This crate handles the full TSL pipeline:
//
//   TSL source ──► Lexer ──► Tokens ──► Parser ──► AST ──► Lowering ──► Node graph
//                                                                            │
//                                                                  NodeBuilder.compile()
//                                                                            │
//                                                               staged GLSL source text
//
// The AST is a faithful, unvalidated representation of the TSL source.
// The node graph is a DAG of typed shader operations that can also be
// built directly, without any TSL in the picture. The builder runs an
// analyze pass (declaration discovery) and a generate pass (memoized
// text emission) and hands the grouped source fragments to the GPU
// backend.
//
// A separate GLSL scanner (`glsl`) tokenizes externally supplied shader
// fragments for analysis; it is a leaf, independent of the TSL pipeline.
//
// USAGE:
//   // Compile a TSL snippet to fragment-stage GLSL:
//   let ast = tslc::parse("var x: float = 1.0; var y = x + 2.0;")?;
//   let (graph, root) = tslc::lower(&ast)?;
//   let source = tslc::compile(&graph, root, ShaderStage::Fragment, ShaderType::Auto)?;
//   println!("{}", source.assemble());
//
//   // Or build a graph directly:
//   let mut graph = NodeGraph::new();
//   let a = graph.float(1.0);
//   let b = graph.float(2.0);
//   let sum = graph.operator("+", a, b)?;

pub mod ast;
pub mod builder;
pub mod codegen;
pub mod error;
pub mod glsl;
pub mod lexer;
pub mod lower;
pub mod node;
pub mod parser;
pub mod token;
pub mod types;

pub use ast::Program;
pub use builder::{compile, NodeBuilder, ShaderSource};
pub use error::{Error, ErrorKind, Result};
pub use lexer::tokenize;
pub use lower::lower;
pub use node::{ConstantValue, Node, NodeGraph, NodeId};
pub use parser::{parse, parse_with_recovery};
pub use types::{ShaderStage, ShaderType};
