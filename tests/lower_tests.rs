// Integration tests for AST → node graph conversion

use tslc::node::*;
use tslc::types::ShaderType;
use tslc::{lower, parse, ErrorKind};

fn lower_src(src: &str) -> (NodeGraph, NodeId) {
    let ast = parse(src).unwrap();
    lower(&ast).unwrap()
}

// Core routing

#[test]
fn test_addition_of_two_constants() {
    // The canonical scenario: the last statement's node is an Operator
    // with the two constants as operands.
    let src = "var x: float = 1.0; var y: float = 2.0; var result: float = x + y;";
    let (graph, root) = lower_src(src);
    match graph.node(root) {
        Node::Operator { op, left, right } => {
            assert_eq!(*op, BinaryOp::Add);
            assert!(matches!(
                graph.node(*left),
                Node::Constant {
                    value: ConstantValue::Float(v)
                } if *v == 1.0
            ));
            assert!(matches!(
                graph.node(*right),
                Node::Constant {
                    value: ConstantValue::Float(v)
                } if *v == 2.0
            ));
        }
        other => panic!("expected Operator, got {other:?}"),
    }
}

#[test]
fn test_function_declaration_shape() {
    let src = "fn f(float a, float b) -> float { return a + b; }";
    let (graph, root) = lower_src(src);
    match graph.node(root) {
        Node::Function {
            name,
            parameters,
            return_type,
            body,
        } => {
            assert_eq!(name, "f");
            assert_eq!(parameters.len(), 2);
            assert_eq!(parameters[0].name, "a");
            assert_eq!(parameters[0].ty, ShaderType::Float);
            assert!(parameters.iter().all(|p| p.required));
            assert_eq!(*return_type, ShaderType::Float);
            let FunctionBody::Expr(body) = body else {
                panic!("expected an expression body");
            };
            assert!(matches!(
                graph.node(*body),
                Node::Operator {
                    op: BinaryOp::Add,
                    ..
                }
            ));
        }
        other => panic!("expected Function, got {other:?}"),
    }
}

#[test]
fn test_comparison_routes_to_math() {
    let (graph, root) = lower_src("var r = 1.0 == 2.0;");
    match graph.node(root) {
        Node::Math { method, args } => {
            assert_eq!(method, "equal");
            assert_eq!(args.len(), 2);
        }
        other => panic!("expected Math, got {other:?}"),
    }
}

#[test]
fn test_logical_and_routes_to_math() {
    let (graph, root) = lower_src("var r = true && false;");
    match graph.node(root) {
        Node::Math { method, .. } => assert_eq!(method, "and"),
        other => panic!("expected Math, got {other:?}"),
    }
}

#[test]
fn test_unary_minus_is_multiplication_by_negative_one() {
    let (graph, root) = lower_src("var x = 3.0; var r = -x;");
    match graph.node(root) {
        Node::Operator { op, left, .. } => {
            assert_eq!(*op, BinaryOp::Mul);
            assert!(matches!(
                graph.node(*left),
                Node::Constant {
                    value: ConstantValue::Float(v)
                } if *v == -1.0
            ));
        }
        other => panic!("expected Operator, got {other:?}"),
    }
}

#[test]
fn test_logical_not_routes_to_math() {
    let (graph, root) = lower_src("var r = !true;");
    match graph.node(root) {
        Node::Math { method, args } => {
            assert_eq!(method, "not");
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected Math, got {other:?}"),
    }
}

#[test]
fn test_member_access_becomes_swizzle() {
    let (graph, root) = lower_src("var v = vec3(1.0, 2.0, 3.0); var r = v.xy;");
    match graph.node(root) {
        Node::Swizzle { components, input } => {
            assert_eq!(components, "xy");
            assert!(matches!(graph.node(*input), Node::Join { .. }));
        }
        other => panic!("expected Swizzle, got {other:?}"),
    }
}

// Constructors and conversions

#[test]
fn test_single_argument_constructor_is_conversion() {
    let (graph, root) = lower_src("var v = vec3(1.0);");
    match graph.node(root) {
        Node::Convert { target, .. } => assert_eq!(*target, ShaderType::Vec3),
        other => panic!("expected Convert, got {other:?}"),
    }
}

#[test]
fn test_multi_argument_constructor_is_join() {
    let (graph, root) = lower_src("var v = vec2(0.0, 1.0);");
    match graph.node(root) {
        Node::Join { parts } => assert_eq!(parts.len(), 2),
        other => panic!("expected Join, got {other:?}"),
    }
}

#[test]
fn test_annotation_mismatch_inserts_conversion() {
    // 1 is an int; the float annotation forces an explicit conversion
    let (graph, root) = lower_src("var x: float = 1;");
    match graph.node(root) {
        Node::Convert { target, input } => {
            assert_eq!(*target, ShaderType::Float);
            assert!(matches!(
                graph.node(*input),
                Node::Constant {
                    value: ConstantValue::Int(1)
                }
            ));
        }
        other => panic!("expected Convert, got {other:?}"),
    }
}

#[test]
fn test_matching_annotation_adds_nothing() {
    let (graph, root) = lower_src("var x: float = 1.0;");
    assert!(matches!(graph.node(root), Node::Constant { .. }));
}

#[test]
fn test_builtin_math_call() {
    let (graph, root) = lower_src("var r = clamp(0.5, 0.0, 1.0);");
    match graph.node(root) {
        Node::Math { method, args } => {
            assert_eq!(method, "clamp");
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected Math, got {other:?}"),
    }
}

#[test]
fn test_user_function_call() {
    let src = "fn double(float a) -> float { return a * 2.0; } var r = double(3.0);";
    let (graph, root) = lower_src(src);
    match graph.node(root) {
        Node::FunctionCall { function, args } => {
            assert_eq!(args.len(), 1);
            assert!(matches!(
                graph.node(*function),
                Node::Function { name, .. } if name == "double"
            ));
        }
        other => panic!("expected FunctionCall, got {other:?}"),
    }
}

// Control flow

#[test]
fn test_if_else_becomes_conditional() {
    let src = "var x = 1.0; if x > 0.0 { 2.0; } else { 3.0; }";
    let (graph, root) = lower_src(src);
    match graph.node(root) {
        Node::Conditional {
            condition,
            if_true,
            if_false,
        } => {
            assert!(matches!(
                graph.node(*condition),
                Node::Math { method, .. } if method == "greaterThan"
            ));
            assert!(matches!(graph.node(*if_true), Node::Constant { .. }));
            assert!(matches!(graph.node(*if_false), Node::Constant { .. }));
        }
        other => panic!("expected Conditional, got {other:?}"),
    }
}

#[test]
fn test_if_without_else_is_an_error() {
    let ast = parse("var x = 1.0; if x > 0.0 { 2.0; }").unwrap();
    let err = lower(&ast).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingElse));
}

// Symbol table behavior

#[test]
fn test_assignment_rebinds() {
    let src = "var x = 1.0; x = 2.0; var r = x;";
    let (graph, root) = lower_src(src);
    assert!(matches!(
        graph.node(root),
        Node::Constant {
            value: ConstantValue::Float(v)
        } if *v == 2.0
    ));
}

#[test]
fn test_redeclaration_overwrites() {
    let src = "var x = 1.0; var x = 2.0; var r = x;";
    let (graph, root) = lower_src(src);
    assert!(matches!(
        graph.node(root),
        Node::Constant {
            value: ConstantValue::Float(v)
        } if *v == 2.0
    ));
}

// Errors

#[test]
fn test_empty_program_is_an_error() {
    let ast = parse("").unwrap();
    let err = lower(&ast).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::EmptyProgram));
}

#[test]
fn test_undefined_variable() {
    let ast = parse("var r = missing + 1.0;").unwrap();
    let err = lower(&ast).unwrap_err();
    match err.kind {
        ErrorKind::UndefinedVariable(name) => assert_eq!(name, "missing"),
        other => panic!("expected UndefinedVariable, got {other:?}"),
    }
    assert!(err.span.is_some());
}

#[test]
fn test_unknown_function() {
    let ast = parse("var r = warble(1.0);").unwrap();
    let err = lower(&ast).unwrap_err();
    match err.kind {
        ErrorKind::UnknownFunction(name) => assert_eq!(name, "warble"),
        other => panic!("expected UnknownFunction, got {other:?}"),
    }
}

#[test]
fn test_zero_argument_constructor_is_an_error() {
    let ast = parse("var v = vec3();").unwrap();
    let err = lower(&ast).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingArguments(_)));
}

#[test]
fn test_zero_argument_math_is_an_error() {
    let ast = parse("var r = sin();").unwrap();
    let err = lower(&ast).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingArguments(_)));
}

#[test]
fn test_invalid_swizzle_carries_span() {
    let ast = parse("var v = vec3(1.0); var r = v.xq;").unwrap();
    let err = lower(&ast).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidSwizzle(_)));
    assert!(err.span.is_some());
}

#[test]
fn test_math_arity_mismatch_carries_span() {
    // `dot` needs two arguments
    let ast = parse("var r = dot(1.0);").unwrap();
    let err = lower(&ast).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::InvalidMathFunction { arity: 1, .. }
    ));
    assert!(err.span.is_some());
}
