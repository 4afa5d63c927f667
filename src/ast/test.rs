use super::*;
use super::address_space::ADDRESS_SPACE_STRINGS;
use crate::source::Span;

use indoc::indoc;

fn sample_module() -> Module {
    let mut b = ModuleBuilder::new();
    b.module.imports.push(Import {
        path: "GLSL.std.450".to_string(),
        name: "std::glsl".to_string(),
        span: Span::at(1, 1),
    });
    let f32_ = b.ty_f32();
    let init = b.float(1.5);
    let color = b.var_init("color", AddressSpace::Private, f32_, init);
    b.module.variables[color]
        .decorations
        .push(Decoration::new(DecorationKind::Location(0), Span::at(2, 1)));
    b.global(color);

    let void = b.ty_void();
    let lhs = b.expr("color");
    let rhs = b.float(2.0);
    let sum = b.add_expr(lhs, rhs);
    let local = b.var_init("x", AddressSpace::Function, f32_, sum);
    let decl = b.decl(local);
    let discard = b.discard();
    b.func("main", vec![], void, vec![decl, discard]);
    b.module.entry_points.push(EntryPoint {
        stage: PipelineStage::Fragment,
        function: "main".to_string(),
        span: Span::at(9, 1),
    });
    b.finish()
}

#[test]
fn test_module_to_str() {
    let module = sample_module();
    let expected = indoc! {r#"
        Import{"GLSL.std.450" as std::glsl}
        Variable{
          color
          private
          __f32
          Decorations{
            LocationDecoration{0}
          }
          {
            ScalarConstructor[not set]{1.5}
          }
        }
        EntryPoint{fragment = main}
        Function main -> __void
        (
        )
        {
          VariableDeclStatement{
            Variable{
              x
              function
              __f32
              {
                Binary[not set]{
                  Identifier[not set]{color}
                  add
                  ScalarConstructor[not set]{2.0}
                }
              }
            }
          }
          Discard{}
        }
    "#};
    assert_eq!(module.to_str(), expected);
}

#[test]
fn test_clone_module_round_trip() {
    let src = sample_module();
    let mut dst = Module::new();
    {
        let mut ctx = CloneContext::new(&src, &mut dst);
        ctx.clone_module();
    }
    assert_eq!(src.to_str(), dst.to_str());
    assert!(dst.is_valid());
}

#[test]
fn test_clone_keeps_result_types() {
    let mut b = ModuleBuilder::new();
    let i32_ = b.ty_i32();
    let a = b.sint(3);
    b.module.expressions[a].result_type = Some(i32_);
    let src = b.finish();

    let mut dst = Module::new();
    let cloned = CloneContext::new(&src, &mut dst).clone(&a);
    assert_eq!(
        dst.expression_to_str(cloned, 0),
        "ScalarConstructor[__i32]{3}\n"
    );
}

#[test]
fn test_clone_replace_expr() {
    let mut b = ModuleBuilder::new();
    let lhs = b.expr("a");
    let rhs = b.expr("b");
    let sum = b.add_expr(lhs, rhs);
    let src = b.finish();

    let mut dst = Module::new();
    let replacement = dst.add_expression(
        ExpressionKind::ScalarConstructor(Literal::Sint(7)),
        Span::default(),
    );
    let mut ctx = CloneContext::new(&src, &mut dst);
    ctx.replace_expr(rhs, replacement);
    let cloned = ctx.clone(&sum);

    let expected = indoc! {"
        Binary[not set]{
          Identifier[not set]{a}
          add
          ScalarConstructor[not set]{7}
        }
    "};
    assert_eq!(dst.expression_to_str(cloned, 0), expected);
}

#[test]
fn test_clone_variable_is_shared() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.ty_f32();
    let var = b.var("v", AddressSpace::Function, f32_);
    let first = b.decl(var);
    let src = b.finish();

    let mut dst = Module::new();
    let mut ctx = CloneContext::new(&src, &mut dst);
    let a = ctx.clone(&var);
    let b = ctx.clone(&var);
    assert_eq!(a, b);
    let stmt = ctx.clone(&first);
    assert_eq!(stmt.kind, StatementKind::VariableDecl(a));
    assert_eq!(dst.variables.len(), 1);
}

#[test]
fn test_find_import_by_name() {
    let module = sample_module();
    assert_eq!(
        module.find_import_by_name("std::glsl").map(|i| i.path.as_str()),
        Some("GLSL.std.450")
    );
    assert!(module.find_import_by_name("glsl").is_none());
}

#[test]
fn test_is_valid_rejects_empty_import() {
    let mut module = sample_module();
    assert!(module.is_valid());
    module.imports.push(Import {
        path: String::new(),
        name: "x".to_string(),
        span: Span::default(),
    });
    assert!(!module.is_valid());
}

#[test]
fn test_is_valid_rejects_missing_entry_point_function() {
    let mut module = sample_module();
    module.entry_points.push(EntryPoint {
        stage: PipelineStage::Vertex,
        function: "vtx".to_string(),
        span: Span::default(),
    });
    assert!(!module.is_valid());
}

#[test]
fn test_is_valid_rejects_call_statement_without_call() {
    let mut b = ModuleBuilder::new();
    let void = b.ty_void();
    let not_a_call = b.expr("f");
    let stmt = Statement::new(StatementKind::Call(not_a_call), Span::default());
    b.func("main", vec![], void, vec![stmt]);
    assert!(!b.finish().is_valid());
}

#[test]
fn test_address_space_parse() {
    for name in ADDRESS_SPACE_STRINGS {
        let space = AddressSpace::parse(name);
        assert_ne!(space, AddressSpace::Invalid);
        assert_eq!(space.as_str(), name);
    }
    assert_eq!(AddressSpace::parse("in"), AddressSpace::Invalid);
    assert_eq!(AddressSpace::parse("handle"), AddressSpace::Invalid);
    assert_eq!(AddressSpace::parse(""), AddressSpace::Invalid);
}

#[test]
fn test_address_space_host_shareable() {
    assert!(AddressSpace::Uniform.is_host_shareable());
    assert!(AddressSpace::Storage.is_host_shareable());
    assert!(AddressSpace::PushConstant.is_host_shareable());
    assert!(!AddressSpace::Private.is_host_shareable());
    assert!(!AddressSpace::Workgroup.is_host_shareable());
    assert!(!AddressSpace::Function.is_host_shareable());
}

#[test]
fn test_type_names() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.ty_f32();
    let vec3 = b.ty_vec(3, f32_);
    let alias = b.ty_alias("Color", vec3);
    let ptr = b.ty_ptr(AddressSpace::Private, alias);
    let module = b.finish();

    assert_eq!(module.type_name(vec3), "__vec_3__f32");
    assert_eq!(module.type_name(alias), "__alias_Color__vec_3__f32");
    assert_eq!(module.type_name(ptr), "__ptr_private__alias_Color__vec_3__f32");
    assert_eq!(module.type_name_unaliased(ptr), "__ptr_private__vec_3__f32");
    assert_eq!(module.type_display(ptr), "ptr<private, Color>");
    assert!(module.same_type(alias, vec3));
    assert_eq!(module.unwrap_ptr(ptr), vec3);
}

#[test]
fn test_types_are_interned() {
    let mut b = ModuleBuilder::new();
    let a = b.ty_f32();
    let v1 = b.ty_vec(4, a);
    let c = b.ty_f32();
    let v2 = b.ty_vec(4, c);
    assert_eq!(a, c);
    assert_eq!(v1, v2);
}

#[test]
fn test_literal_names() {
    assert_eq!(Literal::Bool(true).name(), "__bool_true");
    assert_eq!(Literal::Sint(-2).name(), "__sint_-2");
    assert_eq!(Literal::Uint(2).name(), "__uint_2");
    assert_eq!(Literal::Float(1.0).name(), format!("__float_{}", 1.0f32.to_bits()));
    assert_eq!(Literal::Float(2.0).to_str(), "2.0");
    assert_eq!(Literal::Uint(4).to_str(), "4u");
}
