use super::*;
use crate::ast::{BinaryOp, ExpressionKind, Literal, StatementKind, UnaryOp};

use indoc::indoc;

fn parse_ok(source: &str) -> Module {
    let mut parser = Parser::new(source);
    assert!(parser.parse(), "{}", parser.error());
    parser.into_module()
}

fn parse_err(source: &str) -> String {
    let mut parser = Parser::new(source);
    assert!(!parser.parse());
    parser.error()
}

#[test]
fn test_logical_or_parses() {
    let mut p = Parser::new("a || true");
    let e = p.logical_or_expression().unwrap().unwrap();
    assert!(!p.has_error());

    let module = p.module();
    let ExpressionKind::Binary { op, lhs, rhs } = &module.expressions[e].kind else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, BinaryOp::LogicalOr);
    assert_eq!(
        module.expressions[*lhs].kind,
        ExpressionKind::Identifier(vec!["a".to_string()])
    );
    assert_eq!(
        module.expressions[*rhs].kind,
        ExpressionKind::ScalarConstructor(Literal::Bool(true))
    );
}

#[test]
fn test_logical_or_without_operator() {
    let mut p = Parser::new("a true");
    let e = p.logical_or_expression().unwrap().unwrap();
    assert!(!p.has_error());
    assert_eq!(
        p.module().expressions[e].kind,
        ExpressionKind::Identifier(vec!["a".to_string()])
    );
}

#[test]
fn test_logical_or_invalid_lhs() {
    let mut p = Parser::new("if (a) {} || true");
    let e = p.logical_or_expression().unwrap();
    assert!(!p.has_error());
    assert!(e.is_none());
}

#[test]
fn test_logical_or_invalid_rhs() {
    let mut p = Parser::new("true || if (a) {}");
    let e = p.logical_or_expression();
    assert_eq!(e, Err(Failed));
    assert!(p.has_error());
    assert_eq!(p.error(), "1:9: unable to parse right side of || expression");
}

#[test]
fn test_right_side_error_at_end_of_input() {
    let mut p = Parser::new("a +");
    assert_eq!(p.additive_expression(), Err(Failed));
    assert_eq!(p.error(), "1:4: unable to parse right side of + expression");
}

#[test]
fn test_precedence_levels() {
    let mut p = Parser::new("a + b * c == d && e | f");
    let e = p.expression().unwrap().unwrap();
    let module = p.module();
    assert_eq!(
        module.expression_to_str(e, 0),
        indoc! {"
            Binary[not set]{
              Binary[not set]{
                Binary[not set]{
                  Identifier[not set]{a}
                  add
                  Binary[not set]{
                    Identifier[not set]{b}
                    multiply
                    Identifier[not set]{c}
                  }
                }
                equal
                Identifier[not set]{d}
              }
              logical_and
              Binary[not set]{
                Identifier[not set]{e}
                or
                Identifier[not set]{f}
              }
            }
        "}
    );
}

#[test]
fn test_left_associative() {
    let mut p = Parser::new("a - b - c");
    let e = p.expression().unwrap().unwrap();
    let module = p.module();
    let ExpressionKind::Binary { lhs, rhs, .. } = &module.expressions[e].kind else {
        panic!("expected binary expression");
    };
    assert!(matches!(
        module.expressions[*lhs].kind,
        ExpressionKind::Binary { op: BinaryOp::Subtract, .. }
    ));
    assert_eq!(module.expressions[*rhs].identifier_name().as_deref(), Some("c"));
}

#[test]
fn test_binary_position_is_operator() {
    let mut p = Parser::new("a  <  b");
    let e = p.relational_expression().unwrap().unwrap();
    let span = &p.module().expressions[e].span;
    assert_eq!(span.begin.to_string(), "1:4");
    assert_eq!(span.range, 0..7);
}

#[test]
fn test_unary_and_postfix() {
    let mut p = Parser::new("-a[1].x");
    let e = p.unary_expression().unwrap().unwrap();
    let module = p.module();
    let ExpressionKind::Unary { op, expr } = &module.expressions[e].kind else {
        panic!("expected unary expression");
    };
    assert_eq!(*op, UnaryOp::Negation);
    let ExpressionKind::MemberAccessor { structure, member } = &module.expressions[*expr].kind
    else {
        panic!("expected member accessor");
    };
    assert_eq!(member, "x");
    assert!(matches!(
        module.expressions[*structure].kind,
        ExpressionKind::ArrayAccessor { .. }
    ));
}

#[test]
fn test_unary_missing_operand() {
    let mut p = Parser::new("!;");
    assert_eq!(p.unary_expression(), Err(Failed));
    assert_eq!(p.error(), "1:2: unable to parse right side of ! expression");
}

#[test]
fn test_type_constructor_and_call() {
    let mut p = Parser::new("vec3<f32>(1.0, 2.0, 3.0) + std::glsl::sqrt(x)");
    let e = p.expression().unwrap().unwrap();
    assert_eq!(
        p.module().expression_to_str(e, 0),
        indoc! {"
            Binary[not set]{
              TypeConstructor[not set]{
                __vec_3__f32
                ScalarConstructor[not set]{1.0}
                ScalarConstructor[not set]{2.0}
                ScalarConstructor[not set]{3.0}
              }
              add
              Call[not set]{
                Identifier[not set]{std::glsl::sqrt}
                (
                  Identifier[not set]{x}
                )
              }
            }
        "}
    );
}

#[test]
fn test_nested_template_close() {
    let module = parse_ok("var<private> a : array<vec4<f32>>;");
    let var = &module.variables[module.global_variables[0]];
    assert_eq!(module.type_name(var.ty), "__array__vec_4__f32");
}

#[test]
fn test_global_declarations() {
    let module = parse_ok(indoc! {r#"
        import "GLSL.std.450" as std::glsl;
        diagnostic(off, unreachable_code);
        type Color = vec4<f32>;
        @location(0) var<private> frag_color : Color;
        const scale : f32 = 2.0;
        @binding(1) @group(0) var<uniform> tint : vec4<f32>;
        entry_point fragment = main;
        fn main() {
          frag_color = tint * scale;
        }
    "#});
    assert_eq!(module.imports.len(), 1);
    assert_eq!(module.diagnostic_directives[0].rule, "unreachable_code");
    assert_eq!(module.aliases.len(), 1);
    assert_eq!(module.global_variables.len(), 3);
    assert_eq!(module.entry_points[0].stage, PipelineStage::Fragment);
    assert_eq!(module.functions[0].name, "main");
    assert!(module.is_valid());

    let tint = &module.variables[module.global_variables[2]];
    assert_eq!(tint.space, AddressSpace::Uniform);
    assert_eq!(tint.binding(), Some(1));
}

#[test]
fn test_out_is_not_a_parseable_address_space() {
    assert_eq!(
        parse_err("var<out> a : f32;"),
        "1:5: invalid address space 'out'"
    );
}

#[test]
fn test_module_var_without_address_space() {
    let module = parse_ok("var a : i32;");
    assert_eq!(
        module.variables[module.global_variables[0]].space,
        AddressSpace::None
    );
}

#[test]
fn test_function_statements() {
    let module = parse_ok(indoc! {"
        fn f(a : i32, b : i32) -> i32 {
          var x : i32 = a;
          loop {
            if x > b {
              break;
            } else if x == 0 {
              continue;
            } else {
              x = x - 1;
            }
            continuing {
              x = x + 1;
            }
          }
          _ = g(x);
          g(x);
          return x;
        }
        fn g(v : i32) -> i32 {
          return v;
        }
    "});
    let f = &module.functions[0];
    assert_eq!(f.params.len(), 2);
    let kinds: Vec<_> = f.body.statements.iter().map(|s| &s.kind).collect();
    assert!(matches!(kinds[0], StatementKind::VariableDecl(_)));
    assert!(matches!(kinds[1], StatementKind::Loop { continuing: Some(_), .. }));
    assert!(matches!(kinds[2], StatementKind::Assign { .. }));
    assert!(matches!(kinds[3], StatementKind::Call(_)));
    assert!(matches!(kinds[4], StatementKind::Return(Some(_))));

    let StatementKind::Loop { body, .. } = kinds[1] else {
        unreachable!();
    };
    let StatementKind::If { reject: Some(reject), .. } = &body.statements[0].kind else {
        panic!("expected if statement");
    };
    assert!(matches!(reject.statements[0].kind, StatementKind::If { .. }));
}

#[test]
fn test_missing_semicolon() {
    assert_eq!(
        parse_err("fn f() {\n  discard\n}"),
        "3:1: expected ';' for discard statement"
    );
}

#[test]
fn test_unknown_type() {
    assert_eq!(parse_err("var<private> a : Foo;"), "1:18: unknown type alias 'Foo'");
}

#[test]
fn test_invalid_attribute() {
    assert_eq!(
        parse_err("@offset(4) var<private> a : f32;"),
        "1:2: invalid attribute 'offset'"
    );
}

#[test]
fn test_lexer_error_fails_parse() {
    let mut p = Parser::new("var<private> a : f32 = $;");
    assert!(!p.parse());
    assert_eq!(p.error(), "1:24: invalid character sequence '$'");
}
