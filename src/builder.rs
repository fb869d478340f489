// NodeBuilder — The per-compilation-unit code generation context
//
// One builder compiles one shader. It owns everything that must not leak
// across compilations: the active shader stage, the declaration
// registries (functions, outputs, uniforms — each declared at most once),
// the ordered flow statements, and the snippet cache.
//
// COMPILATION runs in two passes over the graph:
//
//   1. analyze  — walks every operand at Auto type, registering
//                 side-effecting declarations (uniforms, outputs) and
//                 validating call arity/argument types, so codegen never
//                 references something undeclared.
//   2. generate — emits text, memoized per (structural hash, output type).
//                 Value-equal subgraphs therefore share one generated
//                 snippet, which is the whole of the CSE story here.
//
// STAGE MACHINE: the builder starts in a caller-chosen stage. A Compute
// node is the only construct that changes it — it switches to Compute
// while its body builds and restores the previous stage on exit. Every
// other compute-family node merely asserts the current stage.

use crate::error::{Error, ErrorKind, Result};
use crate::node::{Node, NodeGraph, NodeId};
use crate::types::{ShaderStage, ShaderType};
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

/// Which of the two passes the builder is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Analyze,
    Generate,
}

/// The generated shader source for one stage, grouped the way the GPU
/// backend consumes it: declarations first, then library functions, then
/// the ordered flow statements, then the final expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    /// Uniform/output/shared-memory declarations, in emission order.
    pub declarations: Vec<String>,
    /// Library and user function definitions, in emission order.
    pub functions: Vec<String>,
    /// Ordinary executable statements, in emission order.
    pub flow: Vec<String>,
    /// The final expression (or output variable) of the compilation.
    pub result: String,
    /// Set when the graph contained a compute dispatch.
    pub workgroup_size: Option<[u32; 3]>,
    pub dispatch_count: Option<u32>,
}

impl ShaderSource {
    /// Join all sections into a single source string.
    pub fn assemble(&self) -> String {
        let mut out = String::new();
        for decl in &self.declarations {
            out.push_str(decl);
            out.push('\n');
        }
        if !self.declarations.is_empty() {
            out.push('\n');
        }
        for func in &self.functions {
            out.push_str(func);
            out.push_str("\n\n");
        }
        for stmt in &self.flow {
            out.push_str(stmt);
            out.push('\n');
        }
        if !self.result.is_empty() {
            out.push_str(&self.result);
            out.push('\n');
        }
        out
    }
}

/// The compilation context. Not shareable between compilations: build a
/// fresh one (or call `reset`) per shader.
pub struct NodeBuilder<'g> {
    pub(crate) graph: &'g NodeGraph,
    /// The active shader stage. Read by stage-gated nodes, written only
    /// by Compute.
    pub stage: ShaderStage,
    pub(crate) phase: Phase,

    pub(crate) declared_functions: HashSet<String>,
    pub(crate) declared_outputs: HashSet<String>,
    pub(crate) declared_uniforms: HashMap<String, ShaderType>,

    pub(crate) declarations: Vec<String>,
    pub(crate) functions: Vec<String>,
    pub(crate) flow: Vec<String>,

    /// Generated snippets memoized by (structural hash, output type).
    pub(crate) cache: HashMap<(u64, ShaderType), String>,
    /// Nodes already walked by the analyze pass.
    pub(crate) analyzed: HashSet<NodeId>,

    pub(crate) workgroup: Option<([u32; 3], u32)>,
}

impl<'g> NodeBuilder<'g> {
    pub fn new(graph: &'g NodeGraph, stage: ShaderStage) -> Self {
        Self {
            graph,
            stage,
            phase: Phase::Analyze,
            declared_functions: HashSet::new(),
            declared_outputs: HashSet::new(),
            declared_uniforms: HashMap::new(),
            declarations: Vec::new(),
            functions: Vec::new(),
            flow: Vec::new(),
            cache: HashMap::new(),
            analyzed: HashSet::new(),
            workgroup: None,
        }
    }

    /// Number of declared functions (stable across repeated builds of the
    /// same node).
    pub fn declared_function_count(&self) -> usize {
        self.declared_functions.len()
    }

    pub fn declared_uniform_count(&self) -> usize {
        self.declared_uniforms.len()
    }

    pub fn declared_output_count(&self) -> usize {
        self.declared_outputs.len()
    }

    /// Forget every declaration, cached snippet, and accumulated
    /// statement. After a reset the builder behaves like a fresh one and
    /// functions will declare themselves again.
    pub fn reset(&mut self) {
        self.phase = Phase::Analyze;
        self.declared_functions.clear();
        self.declared_outputs.clear();
        self.declared_uniforms.clear();
        self.declarations.clear();
        self.functions.clear();
        self.flow.clear();
        self.cache.clear();
        self.analyzed.clear();
        self.workgroup = None;
    }

    /// Compile a graph root: analyze pass, then generate pass, then
    /// collect the accumulated sections into a ShaderSource.
    pub fn compile(&mut self, root: NodeId, output: ShaderType) -> Result<ShaderSource> {
        debug!(
            "compiling {} ({} nodes) for the {} stage",
            root,
            self.graph.len(),
            self.stage
        );
        self.phase = Phase::Analyze;
        self.build(root, ShaderType::Auto)?;
        self.phase = Phase::Generate;
        let result = self.build(root, output)?;
        Ok(ShaderSource {
            stage: self.stage,
            declarations: self.declarations.clone(),
            functions: self.functions.clone(),
            flow: self.flow.clone(),
            result,
            workgroup_size: self.workgroup.map(|(size, _)| size),
            dispatch_count: self.workgroup.map(|(_, count)| count),
        })
    }

    /// The single public entry for building a node. During the analyze
    /// pass this walks operands and registers declarations; during the
    /// generate pass it returns the memoized snippet for
    /// (node, output type).
    pub fn build(&mut self, id: NodeId, output: ShaderType) -> Result<String> {
        match self.phase {
            Phase::Analyze => {
                self.analyze(id)?;
                Ok(String::new())
            }
            Phase::Generate => {
                let key = (self.graph.structural_hash(id), output);
                if let Some(code) = self.cache.get(&key) {
                    trace!("cache hit for {} as {}", id, output);
                    return Ok(code.clone());
                }
                let code = self.generate(id, output)?;
                self.cache.insert(key, code.clone());
                Ok(code)
            }
        }
    }

    /// The analyze pass for one node: recurse into every operand at Auto
    /// type, then run the node's own registration/validation hooks.
    fn analyze(&mut self, id: NodeId) -> Result<()> {
        if !self.analyzed.insert(id) {
            return Ok(());
        }
        for operand in self.graph.node(id).operands() {
            self.build(operand, ShaderType::Auto)?;
        }
        match self.graph.node(id) {
            Node::Uniform { name, ty } => {
                let (name, ty) = (name.clone(), *ty);
                self.register_uniform(&name, ty)?;
            }
            Node::FunctionCall { function, args } => {
                let (function, args) = (*function, args.clone());
                self.check_call(function, &args)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Arity and argument-type validation for a FunctionCall, run at
    /// analyze time.
    fn check_call(&self, function: NodeId, args: &[NodeId]) -> Result<()> {
        let Node::Function { parameters, .. } = self.graph.node(function) else {
            return Err(Error::node(ErrorKind::NotAFunction, "FunctionCall"));
        };
        let required = parameters.iter().filter(|p| p.required).count();
        let total = parameters.len();
        if args.len() < required || args.len() > total {
            return Err(Error::node(
                ErrorKind::WrongArgumentCount {
                    required,
                    total,
                    got: args.len(),
                },
                "FunctionCall",
            ));
        }
        for (arg, param) in args.iter().zip(parameters) {
            let got = self.graph.infer_type(*arg);
            if !got.is_compatible_with(param.ty) {
                return Err(Error::node(
                    ErrorKind::ArgumentTypeMismatch {
                        param: param.name.clone(),
                        expected: param.ty,
                        got,
                    },
                    "FunctionCall",
                ));
            }
        }
        Ok(())
    }

    // Registry operations. Nodes never touch builder state directly;
    // they go through these.

    /// Register a uniform, emitting its declaration the first time.
    /// Re-registering the same name with the same type is a no-op; a
    /// different type is an error.
    pub(crate) fn register_uniform(&mut self, name: &str, ty: ShaderType) -> Result<()> {
        if let Some(&declared) = self.declared_uniforms.get(name) {
            if declared != ty {
                return Err(Error::node(
                    ErrorKind::UniformTypeConflict {
                        name: name.to_string(),
                        declared,
                        requested: ty,
                    },
                    "Uniform",
                ));
            }
            return Ok(());
        }
        debug!("declaring uniform {} {}", ty, name);
        self.declared_uniforms.insert(name.to_string(), ty);
        self.declarations.push(format!("uniform {ty} {name};"));
        Ok(())
    }

    /// Emit an output declaration the first time the name is seen.
    pub(crate) fn declare_output(&mut self, name: &str, declaration: String) {
        if self.declared_outputs.insert(name.to_string()) {
            debug!("declaring output {name}");
            self.declarations.push(declaration);
        }
    }

    /// Emit a function definition the first time the name is seen.
    /// Returns true when the definition was actually added.
    pub(crate) fn declare_function(&mut self, name: &str, source: String) -> bool {
        if self.declared_functions.insert(name.to_string()) {
            debug!("declaring function {name}");
            self.functions.push(source);
            true
        } else {
            false
        }
    }

    pub(crate) fn is_function_declared(&self, name: &str) -> bool {
        self.declared_functions.contains(name)
    }

    /// Append an executable statement to the flow list.
    pub(crate) fn push_flow(&mut self, stmt: String) {
        self.flow.push(stmt);
    }

    /// Stage gate for the compute family.
    pub(crate) fn require_stage(&self, needed: ShaderStage, node: &'static str) -> Result<()> {
        if self.stage != needed {
            return Err(Error::node(
                ErrorKind::WrongStage {
                    needed,
                    active: self.stage,
                },
                node,
            ));
        }
        Ok(())
    }
}

/// Compile `root` of `graph` for `stage`, producing the final expression
/// at `output` type.
pub fn compile(
    graph: &NodeGraph,
    root: NodeId,
    stage: ShaderStage,
    output: ShaderType,
) -> Result<ShaderSource> {
    NodeBuilder::new(graph, stage).compile(root, output)
}
