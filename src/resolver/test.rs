use super::*;
use crate::ast::{ModuleBuilder, StatementKind};
use crate::parser::Parser;

use indoc::indoc;

fn resolve(source: &str) -> (Module, Diagnostics) {
    let mut parser = Parser::new(source);
    assert!(parser.parse(), "{}", parser.error());
    let mut module = parser.into_module();
    let diagnostics = {
        let mut resolver = Resolver::new(&mut module);
        resolver.resolve();
        resolver.into_diagnostics()
    };
    (module, diagnostics)
}

fn resolve_ok(source: &str) -> Module {
    let (module, diagnostics) = resolve(source);
    assert!(!diagnostics.has_error(), "{}", diagnostics.error());
    module
}

fn resolve_err(source: &str) -> String {
    let (_, diagnostics) = resolve(source);
    assert!(diagnostics.has_error());
    diagnostics.error()
}

/// Type name of the initializer of the `index`th statement of the first function.
fn init_type(module: &Module, index: usize) -> String {
    let StatementKind::VariableDecl(var) = module.functions[0].body.statements[index].kind else {
        panic!("expected a variable declaration");
    };
    let init = module.variables[var].initializer.unwrap();
    module.type_name(module.expressions[init].result_type.unwrap())
}

#[test]
fn test_identifier_of_var_is_pointer() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.ty_f32();
    let var = b.var("my_var", AddressSpace::Private, f32_);
    let expr = b.expr("my_var");
    let mut module = b.finish();

    let mut resolver = Resolver::new(&mut module);
    resolver.register_variable_for_testing(var);
    let ty = resolver.resolve_expression(expr).unwrap();
    assert!(!resolver.has_error());
    assert_eq!(module.type_name(ty), "__ptr_private__f32");
    assert_eq!(module.expressions[expr].result_type, Some(ty));
}

#[test]
fn test_identifier_of_const_is_value() {
    let mut b = ModuleBuilder::new();
    let i32_ = b.ty_i32();
    let init = b.sint(2);
    let var = b.constant("c", AddressSpace::None, i32_, init);
    let expr = b.expr("c");
    let mut module = b.finish();

    let mut resolver = Resolver::new(&mut module);
    resolver.register_variable_for_testing(var);
    let ty = resolver.resolve_expression(expr).unwrap();
    assert_eq!(module.type_name(ty), "__i32");
}

#[test]
fn test_arithmetic_and_comparisons() {
    let module = resolve_ok(indoc! {"
        fn f() {
          var a : i32 = 1;
          var b : i32 = a + 2 * a;
          var v : vec3<f32> = vec3<f32>(1.0, 2.0, 3.0);
          var w : vec3<f32> = v * 2.0;
          var eq : vec3<bool> = v == w;
          var lt : bool = a < b;
          var s : u32 = 1u << 2u;
        }
    "});
    assert_eq!(init_type(&module, 1), "__i32");
    assert_eq!(init_type(&module, 2), "__vec_3__f32");
    assert_eq!(init_type(&module, 3), "__vec_3__f32");
    assert_eq!(init_type(&module, 4), "__vec_3__bool");
    assert_eq!(init_type(&module, 5), "__bool");
    assert_eq!(init_type(&module, 6), "__u32");
}

#[test]
fn test_operand_mismatch() {
    assert_eq!(
        resolve_err(indoc! {"
            fn f() {
              var a : i32 = 1;
              var b : f32 = 2.0;
              var c : i32 = a + b;
            }
        "}),
        "4:19: cannot apply operator '+' to 'i32' and 'f32'"
    );
}

#[test]
fn test_logical_requires_bool() {
    assert_eq!(
        resolve_err("fn f() {\n  var a : bool = 1 || true;\n}"),
        "2:20: cannot apply operator '||' to 'i32' and 'bool'"
    );
}

#[test]
fn test_unknown_identifiers_reported_per_expression() {
    assert_eq!(
        resolve_err(indoc! {"
            fn f() {
              var a : i32 = b;
              var c : i32 = d + b;
            }
        "}),
        "2:17: unknown identifier 'b'\n3:17: unknown identifier 'd'\n3:21: unknown identifier 'b'"
    );
}

#[test]
fn test_shadowing_resolves_innermost() {
    let module = resolve_ok(indoc! {"
        fn f() {
          var a : i32 = 1;
          {
            var a : f32 = 2.0;
            var b : f32 = a;
          }
          var c : i32 = a;
        }
    "});
    assert_eq!(init_type(&module, 2), "__ptr_function__i32");
}

#[test]
fn test_redeclaration_in_same_scope() {
    assert_eq!(
        resolve_err("fn f() {\n  var a : i32;\n  var a : i32;\n}"),
        "3:3: redeclaration of 'a'"
    );
}

#[test]
fn test_function_var_classified_function() {
    let module = resolve_ok("fn f() {\n  var a : i32;\n}");
    let StatementKind::VariableDecl(var) = module.functions[0].body.statements[0].kind else {
        panic!("expected a variable declaration");
    };
    assert_eq!(module.variables[var].space, AddressSpace::Function);
}

#[test]
fn test_module_var_requires_address_space() {
    assert_eq!(
        resolve_err("var a : i32;"),
        "1:1: module-scope variable 'a' must declare an address space"
    );
}

#[test]
fn test_host_shareable_initializer() {
    assert_eq!(
        resolve_err("var<uniform> u : f32 = 1.0;"),
        "1:1: variables in the 'uniform' address space cannot have an initializer"
    );
    assert_eq!(
        resolve_err("var<workgroup> w : f32 = 1.0;"),
        "1:1: variables in the 'workgroup' address space cannot have an initializer"
    );
    resolve_ok("var<private> p : f32 = 1.0;");
}

#[test]
fn test_assign_to_const() {
    assert_eq!(
        resolve_err("fn f() {\n  const c : i32 = 1;\n  c = 2;\n}"),
        "3:3: cannot assign to value of type 'i32'"
    );
}

#[test]
fn test_assign_through_swizzle_and_index() {
    resolve_ok(indoc! {"
        var<private> arr : array<f32, 4>;
        fn f() {
          var v : vec4<f32>;
          v.x = 1.0;
          arr[2] = v.w;
          var s : vec2<f32> = v.zy;
        }
    "});
    assert_eq!(
        resolve_err("fn f() {\n  var v : vec2<f32>;\n  var s : f32 = v.z;\n}"),
        "3:18: invalid vector swizzle member 'z'"
    );
}

#[test]
fn test_module_initializer_must_be_constant() {
    assert_eq!(
        resolve_err("var<private> v : i32;\nconst c : i32 = v;"),
        "2:17: module-scope initializer of 'c' must be a constant expression"
    );
    resolve_ok(indoc! {"
        const a : i32 = 1;
        const b : vec2<i32> = vec2<i32>(a, 2);
        var<private> p : vec2<i32> = b;
    "});
}

#[test]
fn test_continue_in_continuing() {
    assert_eq!(
        resolve_err(indoc! {"
            fn f() {
              loop {
                break;
                continuing {
                  continue;
                }
              }
            }
        "}),
        "5:7: continue statement must not be in a continuing block"
    );
    resolve_ok(indoc! {"
        fn f() {
          loop {
            break;
            continuing {
              loop {
                continue;
              }
            }
          }
        }
    "});
}

#[test]
fn test_return_type_mismatch() {
    assert_eq!(
        resolve_err("fn f() -> i32 {\n  return 1.0;\n}"),
        "2:3: return statement type must match its function return type, returned 'f32', expected 'i32'"
    );
}

#[test]
fn test_break_outside_loop() {
    assert_eq!(
        resolve_err("fn f() {\n  break;\n}"),
        "2:3: break statement must be in a loop"
    );
    resolve_ok("fn f() {\n  loop {\n    break;\n  }\n}");
}

#[test]
fn test_calls() {
    resolve_ok(indoc! {r#"
        import "GLSL.std.450" as std::glsl;
        fn scale(v : vec3<f32>, s : f32) -> vec3<f32> {
          return v * s;
        }
        fn f() -> f32 {
          var v : vec3<f32> = scale(vec3<f32>(1.0, 2.0, 3.0), 2.0);
          return std::glsl::length(std::glsl::normalize(v));
        }
    "#});
    assert_eq!(
        resolve_err("fn g(a : i32) {}\nfn f() {\n  g(1.0);\n}"),
        "3:3: no matching call to 'g' with arguments (f32)"
    );
    assert_eq!(
        resolve_err(indoc! {r#"
            import "GLSL.std.450" as std::glsl;
            fn f() {
              var a : f32 = std::glsl::length(1);
            }
        "#}),
        "3:17: invalid arguments for 'std::glsl::length'"
    );
}

#[test]
fn test_missing_entry_point_function() {
    assert_eq!(
        resolve_err("entry_point vertex = main;"),
        "1:1: unable to find function 'main' for entry point"
    );
}

#[test]
fn test_unreachable_code_warning() {
    let source = "fn f() {\n  return;\n  var a : i32 = 1;\n  var b : i32 = 2;\n}";
    let (_, diagnostics) = resolve(source);
    assert!(!diagnostics.has_error());
    let warnings: Vec<_> = diagnostics.warnings().map(|w| w.to_string()).collect();
    assert_eq!(warnings, vec!["3:3: code is unreachable"]);
    let rule = diagnostics.warnings().next().and_then(|w| w.rule.clone());
    assert_eq!(rule.as_deref(), Some("unreachable_code"));

    let silenced = format!("diagnostic(off, unreachable_code);\n{}", source);
    let (_, diagnostics) = resolve(&silenced);
    assert!(diagnostics.is_empty());

    let promoted = format!("diagnostic(error, unreachable_code);\n{}", source);
    let (_, diagnostics) = resolve(&promoted);
    assert_eq!(diagnostics.error(), "4:3: code is unreachable");
}
