// Node IR — The polymorphic intermediate representation
//
// The IR is a directed acyclic graph of typed shader operations. Like the
// AST it is a closed tagged enum, so conversion and codegen get
// exhaustiveness checking instead of runtime type inspection.
//
// ARCHITECTURE: nodes live in an arena (`NodeGraph`) and refer to their
// operands by `NodeId`. Ids always point at earlier entries, so the graph
// is a DAG by construction — a node can be shared by several parents
// (which is what makes common-subexpression reuse possible) but can never
// form a cycle, and serialization never sees a back-edge.
//
// VALIDATION: every constructor on `NodeGraph` checks its configuration
// up front (operator symbol, math-function arity, atomic operation name,
// workgroup dimensions, ...). A node that constructed successfully can
// only fail later for contextual reasons: wrong shader stage, call arity,
// or argument types. Those are checked by the builder.
//
// SERIALIZATION: the whole graph round-trips through serde_json. The enum
// is internally tagged with "nodeType", which doubles as the node-kind
// name used in error messages.

use crate::error::{Error, ErrorKind, Result};
use crate::types::ShaderType;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

// Node identifiers

/// Unique identifier for a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

// Scalar constants

/// A scalar constant embedded in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstantValue {
    Float(f64),
    Int(i64),
    Uint(u32),
    Bool(bool),
}

impl ConstantValue {
    /// The type this literal has before any contextual conversion.
    pub fn natural_type(self) -> ShaderType {
        match self {
            ConstantValue::Float(_) => ShaderType::Float,
            ConstantValue::Int(_) => ShaderType::Int,
            ConstantValue::Uint(_) => ShaderType::Uint,
            ConstantValue::Bool(_) => ShaderType::Bool,
        }
    }
}

impl fmt::Display for ConstantValue {
    /// The GLSL spelling of the literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e16 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            ConstantValue::Int(n) => write!(f, "{n}"),
            ConstantValue::Uint(n) => write!(f, "{n}u"),
            ConstantValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

// Operators

/// Binary operators an Operator node can carry: arithmetic, comparison,
/// logical, and bitwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    /// Parse an operator from its source symbol. Returns None for
    /// anything outside the fixed set.
    pub fn from_symbol(s: &str) -> Option<Self> {
        let op = match s {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }

    /// Whether the result type is boolean regardless of operand types.
    pub fn yields_bool(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::And
                | BinaryOp::Or
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// Fixed membership tables

/// Math operations taking one operand.
pub const UNARY_MATH: &[&str] = &[
    "abs",
    "acos",
    "asin",
    "atan",
    "ceil",
    "cos",
    "degrees",
    "exp",
    "exp2",
    "floor",
    "fract",
    "inversesqrt",
    "length",
    "log",
    "log2",
    "negate",
    "normalize",
    "not",
    "oneMinus",
    "radians",
    "round",
    "saturate",
    "sign",
    "sin",
    "sqrt",
    "tan",
    "trunc",
];

/// Math operations taking two operands.
pub const BINARY_MATH: &[&str] = &[
    "and",
    "atan2",
    "cross",
    "distance",
    "dot",
    "equal",
    "greaterThan",
    "greaterThanEqual",
    "lessThan",
    "lessThanEqual",
    "max",
    "min",
    "mod",
    "notEqual",
    "or",
    "pow",
    "reflect",
    "step",
];

/// Math operations taking three operands.
pub const TERNARY_MATH: &[&str] = &[
    "clamp",
    "faceforward",
    "fma",
    "mix",
    "refract",
    "smoothstep",
];

/// The atomic operations a compute shader can perform.
pub const ATOMIC_OPS: &[&str] = &[
    "add", "sub", "and", "or", "xor", "min", "max", "exchange", "compSwap",
];

/// Execution/memory barrier scopes.
pub const BARRIER_SCOPES: &[&str] = &["workgroup", "storage", "texture"];

/// Subgroup-wide operations.
pub const SUBGROUP_OPS: &[&str] = &[
    "add", "mul", "min", "max", "and", "or", "xor", "all", "any", "ballot", "elect",
];

/// Built-in compute inputs.
pub const COMPUTE_BUILTINS: &[&str] = &[
    "globalInvocationId",
    "localInvocationId",
    "localInvocationIndex",
    "workgroupId",
    "numWorkgroups",
];

/// Values the Screen node can expose.
pub const SCREEN_VALUES: &[&str] = &["coordinate", "uv", "size"];

// Function support types

/// A declared parameter of a Function node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionParameter {
    pub name: String,
    pub ty: ShaderType,
    /// Calls must supply this argument; optional parameters fall back to
    /// their default value.
    pub required: bool,
    pub default_value: Option<ConstantValue>,
}

impl FunctionParameter {
    pub fn new(name: impl Into<String>, ty: ShaderType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            default_value: None,
        }
    }

    pub fn optional(name: impl Into<String>, ty: ShaderType, default: ConstantValue) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            default_value: Some(default),
        }
    }
}

/// The body of a Function node: either an expression subgraph, or raw
/// source lines supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FunctionBody {
    Expr(NodeId),
    Source(String),
}

// The node variants

/// One operation in the IR graph. The serialized form tags each record
/// with its variant name under "nodeType".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum Node {
    /// A scalar literal.
    Constant { value: ConstantValue },
    /// `(left OP right)`.
    Operator {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    /// A call to a built-in math function; arity 1 to 3.
    Math { method: String, args: Vec<NodeId> },
    /// A scalar ternary: `(cond ? a : b)`.
    Conditional {
        condition: NodeId,
        if_true: NodeId,
        if_false: NodeId,
    },
    /// A vector-aware conditional built on a mix-by-mask, so selection
    /// works per component.
    Select {
        condition: NodeId,
        if_true: NodeId,
        if_false: NodeId,
    },
    /// A raw code template; `${name}` placeholders are replaced with the
    /// generated code of the named inputs.
    Code {
        template: String,
        inputs: Vec<(String, NodeId)>,
    },
    /// Like Code, but the result is parenthesized and every placeholder
    /// is built at the given output type.
    Expression {
        template: String,
        inputs: Vec<(String, NodeId)>,
        output_type: ShaderType,
    },
    /// A user-defined function, declared at most once per compilation
    /// unit.
    Function {
        name: String,
        parameters: Vec<FunctionParameter>,
        return_type: ShaderType,
        body: FunctionBody,
    },
    /// A reference to a parameter inside a function body.
    Parameter { name: String, ty: ShaderType },
    /// A call to a Function node.
    FunctionCall { function: NodeId, args: Vec<NodeId> },
    /// An explicit type conversion / single-argument constructor.
    Convert { target: ShaderType, input: NodeId },
    /// A vector built from components.
    Join { parts: Vec<NodeId> },
    /// Component extraction: `value.xyz`.
    Swizzle { input: NodeId, components: String },
    /// A uniform input, declared at most once per compilation unit.
    Uniform { name: String, ty: ShaderType },
    /// A compute dispatch: builds its body in the compute stage.
    Compute {
        workgroup_size: [u32; 3],
        dispatch_count: u32,
        body: NodeId,
    },
    /// gl_GlobalInvocationID and friends.
    ComputeBuiltin { builtin: String },
    /// atomicAdd / atomicCompSwap / ...; compSwap carries the compare
    /// operand.
    AtomicFunction {
        method: String,
        pointer: NodeId,
        value: NodeId,
        compare: Option<NodeId>,
    },
    /// An execution/memory barrier; emits a flow statement.
    Barrier { scope: String },
    /// A subgroup-wide reduction or vote.
    SubgroupFunction {
        method: String,
        value: Option<NodeId>,
    },
    /// A workgroup-shared array declaration.
    WorkgroupArray {
        name: String,
        element_type: ShaderType,
        count: u32,
    },
    /// Color-space conversion between known spaces; unknown pairs pass
    /// through with a comment.
    ColorSpace {
        from: String,
        to: String,
        input: NodeId,
    },
    /// Tone-mapping curve application; unknown curves pass through with
    /// a comment.
    ToneMapping {
        mapping: String,
        exposure: NodeId,
        input: NodeId,
    },
    /// Tangent-space normal perturbation from a normal-map sample.
    NormalMap {
        sample: NodeId,
        scale: Option<NodeId>,
    },
    /// Height-based normal perturbation from a bump-map sample.
    BumpMap { sample: NodeId, scale: NodeId },
    /// Screen-space values: fragment coordinate, normalized uv, size.
    Screen { value: String },
    /// The final color written to the render target.
    RenderOutput { color: NodeId },
    /// A sample of the viewport color texture.
    ViewportTexture { uv: NodeId },
}

impl Node {
    /// The node-kind name used in serialization and error messages.
    pub fn node_type(&self) -> &'static str {
        match self {
            Node::Constant { .. } => "Constant",
            Node::Operator { .. } => "Operator",
            Node::Math { .. } => "Math",
            Node::Conditional { .. } => "Conditional",
            Node::Select { .. } => "Select",
            Node::Code { .. } => "Code",
            Node::Expression { .. } => "Expression",
            Node::Function { .. } => "Function",
            Node::Parameter { .. } => "Parameter",
            Node::FunctionCall { .. } => "FunctionCall",
            Node::Convert { .. } => "Convert",
            Node::Join { .. } => "Join",
            Node::Swizzle { .. } => "Swizzle",
            Node::Uniform { .. } => "Uniform",
            Node::Compute { .. } => "Compute",
            Node::ComputeBuiltin { .. } => "ComputeBuiltin",
            Node::AtomicFunction { .. } => "AtomicFunction",
            Node::Barrier { .. } => "Barrier",
            Node::SubgroupFunction { .. } => "SubgroupFunction",
            Node::WorkgroupArray { .. } => "WorkgroupArray",
            Node::ColorSpace { .. } => "ColorSpace",
            Node::ToneMapping { .. } => "ToneMapping",
            Node::NormalMap { .. } => "NormalMap",
            Node::BumpMap { .. } => "BumpMap",
            Node::Screen { .. } => "Screen",
            Node::RenderOutput { .. } => "RenderOutput",
            Node::ViewportTexture { .. } => "ViewportTexture",
        }
    }

    /// Every operand this node owns, in a fixed order. The analyze pass
    /// walks these; the operand set never changes after construction.
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            Node::Constant { .. }
            | Node::Parameter { .. }
            | Node::Uniform { .. }
            | Node::ComputeBuiltin { .. }
            | Node::Barrier { .. }
            | Node::WorkgroupArray { .. }
            | Node::Screen { .. } => Vec::new(),
            Node::Operator { left, right, .. } => vec![*left, *right],
            Node::Math { args, .. } => args.clone(),
            Node::Conditional {
                condition,
                if_true,
                if_false,
            }
            | Node::Select {
                condition,
                if_true,
                if_false,
            } => vec![*condition, *if_true, *if_false],
            Node::Code { inputs, .. } | Node::Expression { inputs, .. } => {
                inputs.iter().map(|(_, id)| *id).collect()
            }
            Node::Function { body, .. } => match body {
                FunctionBody::Expr(id) => vec![*id],
                FunctionBody::Source(_) => Vec::new(),
            },
            Node::FunctionCall { function, args } => {
                let mut ids = vec![*function];
                ids.extend(args.iter().copied());
                ids
            }
            Node::Convert { input, .. } => vec![*input],
            Node::Join { parts } => parts.clone(),
            Node::Swizzle { input, .. } => vec![*input],
            Node::Compute { body, .. } => vec![*body],
            Node::AtomicFunction {
                pointer,
                value,
                compare,
                ..
            } => {
                let mut ids = vec![*pointer, *value];
                ids.extend(compare.iter().copied());
                ids
            }
            Node::SubgroupFunction { value, .. } => value.iter().copied().collect(),
            Node::ColorSpace { input, .. } => vec![*input],
            Node::ToneMapping {
                exposure, input, ..
            } => vec![*exposure, *input],
            Node::NormalMap { sample, scale } => {
                let mut ids = vec![*sample];
                ids.extend(scale.iter().copied());
                ids
            }
            Node::BumpMap { sample, scale } => vec![*sample, *scale],
            Node::RenderOutput { color } => vec![*color],
            Node::ViewportTexture { uv } => vec![*uv],
        }
    }
}

// The graph arena

/// The IR graph for one compilation unit. Nodes are appended once and
/// never mutated, so ids always reference earlier entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeGraph {
    pub nodes: Vec<Node>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    // Constructors. Fallible ones validate their configuration up front,
    // before any build is attempted.

    pub fn constant(&mut self, value: ConstantValue) -> NodeId {
        self.push(Node::Constant { value })
    }

    pub fn float(&mut self, v: f64) -> NodeId {
        self.constant(ConstantValue::Float(v))
    }

    pub fn int(&mut self, v: i64) -> NodeId {
        self.constant(ConstantValue::Int(v))
    }

    pub fn uint(&mut self, v: u32) -> NodeId {
        self.constant(ConstantValue::Uint(v))
    }

    pub fn bool(&mut self, v: bool) -> NodeId {
        self.constant(ConstantValue::Bool(v))
    }

    /// An Operator node. The symbol must be in the fixed operator set.
    pub fn operator(&mut self, symbol: &str, left: NodeId, right: NodeId) -> Result<NodeId> {
        let op = BinaryOp::from_symbol(symbol).ok_or_else(|| {
            Error::node(ErrorKind::InvalidOperator(symbol.to_string()), "Operator")
        })?;
        Ok(self.push(Node::Operator { op, left, right }))
    }

    /// A Math node. The method must be registered for the arity implied
    /// by the number of operands supplied.
    pub fn math(&mut self, method: &str, args: Vec<NodeId>) -> Result<NodeId> {
        let table = match args.len() {
            1 => UNARY_MATH,
            2 => BINARY_MATH,
            3 => TERNARY_MATH,
            _ => &[],
        };
        if !table.contains(&method) {
            return Err(Error::node(
                ErrorKind::InvalidMathFunction {
                    name: method.to_string(),
                    arity: args.len(),
                },
                "Math",
            ));
        }
        Ok(self.push(Node::Math {
            method: method.to_string(),
            args,
        }))
    }

    pub fn conditional(&mut self, condition: NodeId, if_true: NodeId, if_false: NodeId) -> NodeId {
        self.push(Node::Conditional {
            condition,
            if_true,
            if_false,
        })
    }

    pub fn select(&mut self, condition: NodeId, if_true: NodeId, if_false: NodeId) -> NodeId {
        self.push(Node::Select {
            condition,
            if_true,
            if_false,
        })
    }

    pub fn code(&mut self, template: impl Into<String>, inputs: Vec<(String, NodeId)>) -> NodeId {
        self.push(Node::Code {
            template: template.into(),
            inputs,
        })
    }

    pub fn expression(
        &mut self,
        template: impl Into<String>,
        inputs: Vec<(String, NodeId)>,
        output_type: ShaderType,
    ) -> NodeId {
        self.push(Node::Expression {
            template: template.into(),
            inputs,
            output_type,
        })
    }

    pub fn function(
        &mut self,
        name: impl Into<String>,
        parameters: Vec<FunctionParameter>,
        return_type: ShaderType,
        body: FunctionBody,
    ) -> NodeId {
        self.push(Node::Function {
            name: name.into(),
            parameters,
            return_type,
            body,
        })
    }

    pub fn parameter(&mut self, name: impl Into<String>, ty: ShaderType) -> NodeId {
        self.push(Node::Parameter {
            name: name.into(),
            ty,
        })
    }

    pub fn function_call(&mut self, function: NodeId, args: Vec<NodeId>) -> NodeId {
        self.push(Node::FunctionCall { function, args })
    }

    pub fn convert(&mut self, target: ShaderType, input: NodeId) -> NodeId {
        self.push(Node::Convert { target, input })
    }

    pub fn join(&mut self, parts: Vec<NodeId>) -> NodeId {
        self.push(Node::Join { parts })
    }

    /// Component extraction. Components must be 1–4 characters from one
    /// of the xyzw / rgba / stpq sets.
    pub fn swizzle(&mut self, input: NodeId, components: &str) -> Result<NodeId> {
        let valid = !components.is_empty()
            && components.len() <= 4
            && (components.chars().all(|c| "xyzw".contains(c))
                || components.chars().all(|c| "rgba".contains(c))
                || components.chars().all(|c| "stpq".contains(c)));
        if !valid {
            return Err(Error::node(
                ErrorKind::InvalidSwizzle(components.to_string()),
                "Swizzle",
            ));
        }
        Ok(self.push(Node::Swizzle {
            input,
            components: components.to_string(),
        }))
    }

    pub fn uniform(&mut self, name: impl Into<String>, ty: ShaderType) -> NodeId {
        self.push(Node::Uniform {
            name: name.into(),
            ty,
        })
    }

    /// A compute dispatch. The workgroup size needs three positive
    /// dimensions and the dispatch count must be at least 1.
    pub fn compute(
        &mut self,
        workgroup_size: [u32; 3],
        dispatch_count: u32,
        body: NodeId,
    ) -> Result<NodeId> {
        if workgroup_size.iter().any(|&d| d == 0) {
            return Err(Error::node(
                ErrorKind::InvalidWorkgroupSize(workgroup_size),
                "Compute",
            ));
        }
        if dispatch_count < 1 {
            return Err(Error::node(
                ErrorKind::InvalidDispatchCount(dispatch_count),
                "Compute",
            ));
        }
        Ok(self.push(Node::Compute {
            workgroup_size,
            dispatch_count,
            body,
        }))
    }

    pub fn compute_builtin(&mut self, builtin: &str) -> Result<NodeId> {
        if !COMPUTE_BUILTINS.contains(&builtin) {
            return Err(Error::node(
                ErrorKind::Message(format!("unknown compute builtin '{builtin}'")),
                "ComputeBuiltin",
            ));
        }
        Ok(self.push(Node::ComputeBuiltin {
            builtin: builtin.to_string(),
        }))
    }

    /// An atomic read-modify-write. `compSwap` requires the compare
    /// operand; every other operation ignores it.
    pub fn atomic(
        &mut self,
        method: &str,
        pointer: NodeId,
        value: NodeId,
        compare: Option<NodeId>,
    ) -> Result<NodeId> {
        if !ATOMIC_OPS.contains(&method) {
            return Err(Error::node(
                ErrorKind::InvalidAtomicOp(method.to_string()),
                "AtomicFunction",
            ));
        }
        if method == "compSwap" && compare.is_none() {
            return Err(Error::node(
                ErrorKind::MissingCompareOperand,
                "AtomicFunction",
            ));
        }
        Ok(self.push(Node::AtomicFunction {
            method: method.to_string(),
            pointer,
            value,
            compare,
        }))
    }

    pub fn barrier(&mut self, scope: &str) -> Result<NodeId> {
        if !BARRIER_SCOPES.contains(&scope) {
            return Err(Error::node(
                ErrorKind::InvalidBarrierScope(scope.to_string()),
                "Barrier",
            ));
        }
        Ok(self.push(Node::Barrier {
            scope: scope.to_string(),
        }))
    }

    /// A subgroup operation. `ballot`/`elect`/votes take their value
    /// operand as supplied; `elect` takes none.
    pub fn subgroup(&mut self, method: &str, value: Option<NodeId>) -> Result<NodeId> {
        if !SUBGROUP_OPS.contains(&method) {
            return Err(Error::node(
                ErrorKind::InvalidSubgroupOp(method.to_string()),
                "SubgroupFunction",
            ));
        }
        if method != "elect" && value.is_none() {
            return Err(Error::node(
                ErrorKind::Message(format!("subgroup '{method}' requires a value operand")),
                "SubgroupFunction",
            ));
        }
        Ok(self.push(Node::SubgroupFunction {
            method: method.to_string(),
            value,
        }))
    }

    pub fn workgroup_array(
        &mut self,
        name: impl Into<String>,
        element_type: ShaderType,
        count: u32,
    ) -> Result<NodeId> {
        if count == 0 {
            return Err(Error::node(
                ErrorKind::Message("workgroup array length must be at least 1".into()),
                "WorkgroupArray",
            ));
        }
        Ok(self.push(Node::WorkgroupArray {
            name: name.into(),
            element_type,
            count,
        }))
    }

    /// Color-space conversion. Unknown pairs are accepted here and
    /// degrade to a commented pass-through at generate time.
    pub fn color_space(&mut self, from: &str, to: &str, input: NodeId) -> NodeId {
        self.push(Node::ColorSpace {
            from: from.to_string(),
            to: to.to_string(),
            input,
        })
    }

    /// Tone mapping. Unknown curve names are accepted here and degrade
    /// to a commented pass-through at generate time.
    pub fn tone_mapping(&mut self, mapping: &str, exposure: NodeId, input: NodeId) -> NodeId {
        self.push(Node::ToneMapping {
            mapping: mapping.to_string(),
            exposure,
            input,
        })
    }

    pub fn normal_map(&mut self, sample: NodeId, scale: Option<NodeId>) -> NodeId {
        self.push(Node::NormalMap { sample, scale })
    }

    pub fn bump_map(&mut self, sample: NodeId, scale: NodeId) -> NodeId {
        self.push(Node::BumpMap { sample, scale })
    }

    pub fn screen(&mut self, value: &str) -> Result<NodeId> {
        if !SCREEN_VALUES.contains(&value) {
            return Err(Error::node(
                ErrorKind::Message(format!("unknown screen value '{value}'")),
                "Screen",
            ));
        }
        Ok(self.push(Node::Screen {
            value: value.to_string(),
        }))
    }

    pub fn render_output(&mut self, color: NodeId) -> NodeId {
        self.push(Node::RenderOutput { color })
    }

    pub fn viewport_texture(&mut self, uv: NodeId) -> NodeId {
        self.push(Node::ViewportTexture { uv })
    }

    /// Best-effort static type of a node, used for conversion decisions
    /// and call-argument checking. Returns Auto when the type depends on
    /// build context.
    pub fn infer_type(&self, id: NodeId) -> ShaderType {
        match self.node(id) {
            Node::Constant { value } => value.natural_type(),
            Node::Operator { op, left, right } => {
                if op.yields_bool() {
                    ShaderType::Bool
                } else {
                    let l = self.infer_type(*left);
                    if l != ShaderType::Auto {
                        l
                    } else {
                        self.infer_type(*right)
                    }
                }
            }
            Node::Math { method, args } => match method.as_str() {
                "equal" | "notEqual" | "lessThan" | "lessThanEqual" | "greaterThan"
                | "greaterThanEqual" | "and" | "or" | "not" => ShaderType::Bool,
                "length" | "distance" | "dot" => ShaderType::Float,
                _ => args
                    .first()
                    .map(|a| self.infer_type(*a))
                    .unwrap_or(ShaderType::Auto),
            },
            Node::Conditional { if_true, .. } | Node::Select { if_true, .. } => {
                self.infer_type(*if_true)
            }
            Node::Code { .. } => ShaderType::Auto,
            Node::Expression { output_type, .. } => *output_type,
            Node::Function { return_type, .. } => *return_type,
            Node::Parameter { ty, .. } | Node::Uniform { ty, .. } => *ty,
            Node::FunctionCall { function, .. } => match self.node(*function) {
                Node::Function { return_type, .. } => *return_type,
                _ => ShaderType::Auto,
            },
            Node::Convert { target, .. } => *target,
            Node::Join { parts } => {
                let total: usize = parts
                    .iter()
                    .map(|p| self.infer_type(*p).component_count().max(1))
                    .sum();
                ShaderType::float_vec(total.min(4))
            }
            Node::Swizzle { components, .. } => ShaderType::float_vec(components.len()),
            Node::Compute { .. } | Node::Barrier { .. } => ShaderType::Void,
            Node::ComputeBuiltin { builtin } => {
                if builtin == "localInvocationIndex" {
                    ShaderType::Uint
                } else {
                    ShaderType::UVec3
                }
            }
            Node::AtomicFunction { value, .. } => self.infer_type(*value),
            Node::SubgroupFunction { method, value } => match method.as_str() {
                "all" | "any" | "elect" => ShaderType::Bool,
                "ballot" => ShaderType::UVec4,
                _ => value
                    .map(|v| self.infer_type(v))
                    .unwrap_or(ShaderType::Auto),
            },
            Node::WorkgroupArray { element_type, .. } => *element_type,
            Node::ColorSpace { .. }
            | Node::ToneMapping { .. }
            | Node::NormalMap { .. }
            | Node::BumpMap { .. } => ShaderType::Vec3,
            Node::Screen { value } => {
                if value == "coordinate" || value == "uv" || value == "size" {
                    ShaderType::Vec2
                } else {
                    ShaderType::Auto
                }
            }
            Node::RenderOutput { .. } | Node::ViewportTexture { .. } => ShaderType::Vec4,
        }
    }

    // Structural hashing

    /// Value-based hash of a subgraph: variant tag + scalar fields +
    /// recursively hashed operands. Two nodes with equal fields and
    /// equal operand subgraphs hash the same, which is what lets the
    /// builder collapse duplicate subexpressions.
    pub fn structural_hash(&self, id: NodeId) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_node(id, &mut hasher);
        hasher.finish()
    }

    fn hash_node(&self, id: NodeId, hasher: &mut DefaultHasher) {
        let node = self.node(id);
        node.node_type().hash(hasher);
        match node {
            Node::Constant { value } => match value {
                ConstantValue::Float(v) => v.to_bits().hash(hasher),
                ConstantValue::Int(n) => n.hash(hasher),
                ConstantValue::Uint(n) => n.hash(hasher),
                ConstantValue::Bool(b) => b.hash(hasher),
            },
            Node::Operator { op, .. } => op.hash(hasher),
            Node::Math { method, .. } => method.hash(hasher),
            Node::Code { template, inputs } | Node::Expression {
                template, inputs, ..
            } => {
                template.hash(hasher);
                for (name, _) in inputs {
                    name.hash(hasher);
                }
                if let Node::Expression { output_type, .. } = node {
                    output_type.hash(hasher);
                }
            }
            Node::Function {
                name,
                parameters,
                return_type,
                body,
            } => {
                name.hash(hasher);
                return_type.hash(hasher);
                for p in parameters {
                    p.name.hash(hasher);
                    p.ty.hash(hasher);
                    p.required.hash(hasher);
                }
                if let FunctionBody::Source(src) = body {
                    src.hash(hasher);
                }
            }
            Node::Parameter { name, ty } => {
                name.hash(hasher);
                ty.hash(hasher);
            }
            Node::Convert { target, .. } => target.hash(hasher),
            Node::Swizzle { components, .. } => components.hash(hasher),
            Node::Uniform { name, ty } => {
                name.hash(hasher);
                ty.hash(hasher);
            }
            Node::Compute {
                workgroup_size,
                dispatch_count,
                ..
            } => {
                workgroup_size.hash(hasher);
                dispatch_count.hash(hasher);
            }
            Node::ComputeBuiltin { builtin } => builtin.hash(hasher),
            Node::AtomicFunction { method, .. } => method.hash(hasher),
            Node::Barrier { scope } => scope.hash(hasher),
            Node::SubgroupFunction { method, .. } => method.hash(hasher),
            Node::WorkgroupArray {
                name,
                element_type,
                count,
            } => {
                name.hash(hasher);
                element_type.hash(hasher);
                count.hash(hasher);
            }
            Node::ColorSpace { from, to, .. } => {
                from.hash(hasher);
                to.hash(hasher);
            }
            Node::ToneMapping { mapping, .. } => mapping.hash(hasher),
            Node::Screen { value } => value.hash(hasher),
            Node::Conditional { .. }
            | Node::Select { .. }
            | Node::FunctionCall { .. }
            | Node::Join { .. }
            | Node::NormalMap { .. }
            | Node::BumpMap { .. }
            | Node::RenderOutput { .. }
            | Node::ViewportTexture { .. } => {}
        }
        for operand in node.operands() {
            self.hash_node(operand, hasher);
        }
    }

    // Serialization

    /// Serialize the whole graph to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("node graph serialization cannot fail")
    }

    /// Reconstruct a graph from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::msg(format!("node graph deserialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_rejects_unknown_symbol() {
        let mut g = NodeGraph::new();
        let a = g.float(1.0);
        let b = g.float(2.0);
        let err = g.operator("**", a, b).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidOperator(_)));
        assert_eq!(err.node, Some("Operator"));
    }

    #[test]
    fn test_math_arity_membership() {
        let mut g = NodeGraph::new();
        let a = g.float(1.0);
        let b = g.float(2.0);
        assert!(g.math("sin", vec![a]).is_ok());
        assert!(g.math("atan2", vec![a, b]).is_ok());
        // `sin` is not a binary operation
        let err = g.math("sin", vec![a, b]).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::InvalidMathFunction { arity: 2, .. }
        ));
    }

    #[test]
    fn test_comp_swap_requires_compare() {
        let mut g = NodeGraph::new();
        let ptr = g.uniform("counter", ShaderType::Uint);
        let val = g.uint(1);
        let err = g.atomic("compSwap", ptr, val, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingCompareOperand));
        let cmp = g.uint(0);
        assert!(g.atomic("compSwap", ptr, val, Some(cmp)).is_ok());
    }

    #[test]
    fn test_compute_validates_configuration() {
        let mut g = NodeGraph::new();
        let body = g.float(0.0);
        assert!(g.compute([0, 1, 1], 1, body).is_err());
        assert!(g.compute([8, 8, 1], 0, body).is_err());
        assert!(g.compute([8, 8, 1], 64, body).is_ok());
    }

    #[test]
    fn test_swizzle_validation() {
        let mut g = NodeGraph::new();
        let v = g.uniform("color", ShaderType::Vec4);
        assert!(g.swizzle(v, "xyz").is_ok());
        assert!(g.swizzle(v, "rgba").is_ok());
        assert!(g.swizzle(v, "xr").is_err());
        assert!(g.swizzle(v, "xyzwx").is_err());
    }

    #[test]
    fn test_structural_hash_merges_equal_values() {
        let mut g = NodeGraph::new();
        let a1 = g.float(1.0);
        let a2 = g.float(1.0);
        let b = g.float(2.0);
        assert_eq!(g.structural_hash(a1), g.structural_hash(a2));
        assert_ne!(g.structural_hash(a1), g.structural_hash(b));

        let sum1 = g.operator("+", a1, b).unwrap();
        let sum2 = g.operator("+", a2, b).unwrap();
        let diff = g.operator("-", a1, b).unwrap();
        assert_eq!(g.structural_hash(sum1), g.structural_hash(sum2));
        assert_ne!(g.structural_hash(sum1), g.structural_hash(diff));
    }

    #[test]
    fn test_json_roundtrip_preserves_structure() {
        let mut g = NodeGraph::new();
        let a = g.float(1.0);
        let b = g.float(2.0);
        let sum = g.operator("+", a, b).unwrap();
        let json = g.to_json();
        assert!(json.contains("\"nodeType\":\"Operator\""));
        let restored = NodeGraph::from_json(&json).unwrap();
        assert_eq!(restored.len(), g.len());
        assert_eq!(restored.structural_hash(sum), g.structural_hash(sum));
    }
}
