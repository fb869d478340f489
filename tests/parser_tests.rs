// Integration tests for the TSL parser

use tslc::ast::*;
use tslc::types::ShaderType;
use tslc::{parse, parse_with_recovery};

// Declarations

#[test]
fn test_parse_var_decl() {
    let ast = parse("var x: float = 1.0;").unwrap();
    assert_eq!(ast.statements.len(), 1);
    match &ast.statements[0] {
        Stmt::VarDecl(decl) => {
            assert_eq!(decl.name, "x");
            assert_eq!(decl.ty, Some(ShaderType::Float));
            assert!(decl.mutable);
            assert!(matches!(decl.init, Expr::Float(v, _) if v == 1.0));
        }
        other => panic!("expected VarDecl, got {other:?}"),
    }
}

#[test]
fn test_parse_const_decl() {
    let ast = parse("const up: vec3 = vec3(0.0, 1.0, 0.0);").unwrap();
    match &ast.statements[0] {
        Stmt::VarDecl(decl) => {
            assert_eq!(decl.name, "up");
            assert_eq!(decl.ty, Some(ShaderType::Vec3));
            assert!(!decl.mutable);
        }
        other => panic!("expected VarDecl, got {other:?}"),
    }
}

#[test]
fn test_parse_var_without_annotation() {
    let ast = parse("var x = 2.0;").unwrap();
    match &ast.statements[0] {
        Stmt::VarDecl(decl) => assert_eq!(decl.ty, None),
        other => panic!("expected VarDecl, got {other:?}"),
    }
}

#[test]
fn test_parse_function_decl() {
    let ast = parse("fn f(float a, float b) -> float { return a + b; }").unwrap();
    match &ast.statements[0] {
        Stmt::FunctionDecl(decl) => {
            assert_eq!(decl.name, "f");
            assert_eq!(decl.parameters.len(), 2);
            assert_eq!(decl.parameters[0].name, "a");
            assert_eq!(decl.parameters[0].ty, ShaderType::Float);
            assert_eq!(decl.parameters[1].name, "b");
            assert_eq!(decl.return_type, ShaderType::Float);
            assert_eq!(decl.body.statements.len(), 1);
            assert!(matches!(decl.body.statements[0], Stmt::Return { .. }));
        }
        other => panic!("expected FunctionDecl, got {other:?}"),
    }
}

#[test]
fn test_parse_function_with_no_params() {
    let ast = parse("fn zero() -> float { return 0.0; }").unwrap();
    match &ast.statements[0] {
        Stmt::FunctionDecl(decl) => assert!(decl.parameters.is_empty()),
        other => panic!("expected FunctionDecl, got {other:?}"),
    }
}

// Expressions

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let ast = parse("var r = 1.0 + 2.0 * 3.0;").unwrap();
    let Stmt::VarDecl(decl) = &ast.statements[0] else {
        panic!("expected VarDecl");
    };
    match &decl.init {
        Expr::Binary {
            op: BinOp::Add,
            right,
            ..
        } => {
            assert!(matches!(
                right.as_ref(),
                Expr::Binary {
                    op: BinOp::Mul,
                    ..
                }
            ));
        }
        other => panic!("expected Add at the top, got {other:?}"),
    }
}

#[test]
fn test_additive_is_left_associative() {
    // a - b - c parses as (a - b) - c
    let ast = parse("var r = a - b - c;").unwrap();
    let Stmt::VarDecl(decl) = &ast.statements[0] else {
        panic!("expected VarDecl");
    };
    match &decl.init {
        Expr::Binary {
            op: BinOp::Sub,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                left.as_ref(),
                Expr::Binary {
                    op: BinOp::Sub,
                    ..
                }
            ));
            assert!(matches!(right.as_ref(), Expr::Ident(name, _) if name == "c"));
        }
        other => panic!("expected Sub at the top, got {other:?}"),
    }
}

#[test]
fn test_comparison_binds_tighter_than_logical() {
    // a < b && c < d parses as (a < b) && (c < d)
    let ast = parse("var r = a < b && c < d;").unwrap();
    let Stmt::VarDecl(decl) = &ast.statements[0] else {
        panic!("expected VarDecl");
    };
    match &decl.init {
        Expr::Binary {
            op: BinOp::And,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                left.as_ref(),
                Expr::Binary { op: BinOp::Lt, .. }
            ));
            assert!(matches!(
                right.as_ref(),
                Expr::Binary { op: BinOp::Lt, .. }
            ));
        }
        other => panic!("expected And at the top, got {other:?}"),
    }
}

#[test]
fn test_grouping_is_unwrapped() {
    // (1.0 + 2.0) * 3.0 — the parens leave no trace beyond the shape
    let ast = parse("var r = (1.0 + 2.0) * 3.0;").unwrap();
    let Stmt::VarDecl(decl) = &ast.statements[0] else {
        panic!("expected VarDecl");
    };
    match &decl.init {
        Expr::Binary {
            op: BinOp::Mul,
            left,
            ..
        } => {
            assert!(matches!(
                left.as_ref(),
                Expr::Binary {
                    op: BinOp::Add,
                    ..
                }
            ));
        }
        other => panic!("expected Mul at the top, got {other:?}"),
    }
}

#[test]
fn test_unary_operators() {
    let ast = parse("var r = -x + !flag;").unwrap();
    let Stmt::VarDecl(decl) = &ast.statements[0] else {
        panic!("expected VarDecl");
    };
    let Expr::Binary { left, right, .. } = &decl.init else {
        panic!("expected Binary");
    };
    assert!(matches!(
        left.as_ref(),
        Expr::Unary {
            op: UnaryOp::Neg,
            ..
        }
    ));
    assert!(matches!(
        right.as_ref(),
        Expr::Unary {
            op: UnaryOp::Not,
            ..
        }
    ));
}

#[test]
fn test_member_access() {
    let ast = parse("var r = color.xyz;").unwrap();
    let Stmt::VarDecl(decl) = &ast.statements[0] else {
        panic!("expected VarDecl");
    };
    match &decl.init {
        Expr::Member { object, field, .. } => {
            assert_eq!(field, "xyz");
            assert!(matches!(object.as_ref(), Expr::Ident(name, _) if name == "color"));
        }
        other => panic!("expected Member, got {other:?}"),
    }
}

#[test]
fn test_call_with_arguments() {
    let ast = parse("var r = clamp(x, 0.0, 1.0);").unwrap();
    let Stmt::VarDecl(decl) = &ast.statements[0] else {
        panic!("expected VarDecl");
    };
    match &decl.init {
        Expr::Call { callee, args, .. } => {
            assert_eq!(callee, "clamp");
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected Call, got {other:?}"),
    }
}

#[test]
fn test_type_name_as_constructor() {
    let ast = parse("var v = vec3(1.0, 2.0, 3.0);").unwrap();
    let Stmt::VarDecl(decl) = &ast.statements[0] else {
        panic!("expected VarDecl");
    };
    match &decl.init {
        Expr::Call { callee, args, .. } => {
            assert_eq!(callee, "vec3");
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected Call, got {other:?}"),
    }
}

#[test]
fn test_assignment_expression() {
    let ast = parse("x = y + 1.0;").unwrap();
    match &ast.statements[0] {
        Stmt::Expression { expr, .. } => {
            assert!(matches!(expr, Expr::Assignment { target, .. } if target == "x"));
        }
        other => panic!("expected Expression, got {other:?}"),
    }
}

// Control flow

#[test]
fn test_if_without_else_has_none_alternative() {
    let ast = parse("if x > 0.0 { y = 1.0; }").unwrap();
    match &ast.statements[0] {
        Stmt::If { else_branch, .. } => assert!(else_branch.is_none()),
        other => panic!("expected If, got {other:?}"),
    }
}

#[test]
fn test_if_with_else() {
    let ast = parse("if x > 0.0 { y = 1.0; } else { y = 2.0; }").unwrap();
    match &ast.statements[0] {
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            assert_eq!(then_branch.statements.len(), 1);
            assert_eq!(else_branch.as_ref().unwrap().statements.len(), 1);
        }
        other => panic!("expected If, got {other:?}"),
    }
}

// Errors and recovery

#[test]
fn test_missing_semicolon_is_an_error() {
    let err = parse("var x: float = 1.0").unwrap_err();
    let span = err.span.expect("parse errors carry a span");
    assert_eq!(span.line, 1);
}

#[test]
fn test_error_position_is_accurate() {
    let err = parse("var x: float =\n  @;").unwrap_err();
    let span = err.span.unwrap();
    assert_eq!(span.line, 2);
    assert_eq!(span.col, 3);
}

#[test]
fn test_recovery_continues_after_bad_statement() {
    let src = "var = 1.0;\nvar y: float = 2.0;";
    let (program, errors) = parse_with_recovery(src);
    assert_eq!(errors.len(), 1);
    assert_eq!(program.statements.len(), 1);
    match &program.statements[0] {
        Stmt::VarDecl(decl) => assert_eq!(decl.name, "y"),
        other => panic!("expected the second declaration, got {other:?}"),
    }
}

#[test]
fn test_recovery_synchronizes_on_declaration_keyword() {
    // No semicolon to sync on; the `fn` keyword is the boundary
    let src = "var x: float = + \nfn f() -> float { return 1.0; }";
    let (program, errors) = parse_with_recovery(src);
    assert!(!errors.is_empty());
    assert!(program
        .statements
        .iter()
        .any(|s| matches!(s, Stmt::FunctionDecl(f) if f.name == "f")));
}

#[test]
fn test_strict_parse_surfaces_first_error() {
    let src = "var = 1.0;\nvar = 2.0;";
    let err = parse(src).unwrap_err();
    assert_eq!(err.span.unwrap().line, 1);
}

#[test]
fn test_unknown_character_fails_at_parse_not_lex() {
    // The lexer degrades `@` to an Unknown token; the parser rejects it.
    let err = parse("var x: float = @;").unwrap_err();
    assert!(err.span.is_some());
}

// Serialization

#[test]
fn test_ast_roundtrips_through_json() {
    let ast = parse("fn f(float a) -> float { return a * 2.0; }").unwrap();
    let json = serde_json::to_string(&ast).unwrap();
    let back: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(back.statements.len(), ast.statements.len());
    match (&back.statements[0], &ast.statements[0]) {
        (Stmt::FunctionDecl(a), Stmt::FunctionDecl(b)) => {
            assert_eq!(a.name, b.name);
            assert_eq!(a.parameters.len(), b.parameters.len());
        }
        _ => panic!("round-trip changed the statement kind"),
    }
}
