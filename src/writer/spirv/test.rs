use super::*;
use crate::ast::{AddressSpace, EntryPoint, Module, ModuleBuilder, PipelineStage};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::source::Span;

use indoc::indoc;

fn resolved(source: &str) -> Module {
    let mut parser = Parser::new(source);
    assert!(parser.parse(), "{}", parser.error());
    let mut module = parser.into_module();
    let mut resolver = Resolver::new(&mut module);
    assert!(resolver.resolve(), "{}", resolver.error());
    module
}

fn ops(instructions: &[Instruction]) -> Vec<Op> {
    instructions.iter().map(|i| i.op).collect()
}

#[test]
fn test_global_variable_identifier() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.ty_f32();
    let var = b.var("var", AddressSpace::Out, f32_);
    let expr = b.expr("var");
    let mut module = b.finish();
    {
        let mut resolver = Resolver::new(&mut module);
        resolver.register_variable_for_testing(var);
        resolver.resolve_expression(expr).unwrap();
    }

    let mut builder = Builder::new(&module);
    assert!(builder.generate_global_variable(var), "{}", builder.error());
    assert_eq!(builder.generate_identifier_expression(expr), Some(1));

    assert_eq!(dump_instructions(builder.debug()), "OpName %1 \"var\"\n");
    assert_eq!(
        dump_instructions(builder.types()),
        indoc! {"
            %3 = OpTypeFloat 32
            %2 = OpTypePointer Output %3
            %4 = OpConstantNull %3
            %1 = OpVariable %2 Output %4
        "}
    );
}

#[test]
fn test_global_constant_composite() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.ty_f32();
    let vec3 = b.ty_vec(3, f32_);
    let init = b.vec3_f32(1.0, 1.0, 3.0);
    let var = b.constant("var", AddressSpace::None, vec3, init);
    let expr = b.expr("var");
    let module = b.finish();

    let mut builder = Builder::new(&module);
    assert!(builder.generate_global_variable(var), "{}", builder.error());
    assert_eq!(builder.generate_identifier_expression(expr), Some(5));

    assert!(builder.debug().is_empty());
    assert_eq!(
        dump_instructions(builder.types()),
        indoc! {"
            %2 = OpTypeFloat 32
            %1 = OpTypeVector %2 3
            %3 = OpConstant %2 1
            %4 = OpConstant %2 3
            %5 = OpConstantComposite %1 %3 %3 %4
        "}
    );
}

#[test]
fn test_function_variable() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.ty_f32();
    let var = b.var("var", AddressSpace::Function, f32_);
    let module = b.finish();

    let mut builder = Builder::new(&module);
    builder.push_function(Function::default());
    assert!(builder.generate_function_variable(var), "{}", builder.error());

    assert_eq!(dump_instructions(builder.debug()), "OpName %1 \"var\"\n");
    assert_eq!(
        dump_instructions(builder.types()),
        indoc! {"
            %3 = OpTypeFloat 32
            %2 = OpTypePointer Function %3
            %4 = OpConstantNull %3
        "}
    );
    assert_eq!(
        dump_instructions(builder.functions()[0].variables()),
        "%1 = OpVariable %2 Function %4\n"
    );
    assert!(builder.functions()[0].instructions().is_empty());
}

#[test]
fn test_variable_read_twice_loads_twice() {
    let mut b = ModuleBuilder::new();
    let i32_ = b.ty_i32();
    let var = b.var("var", AddressSpace::Out, i32_);
    let lhs = b.expr("var");
    let rhs = b.expr("var");
    let add = b.add_expr(lhs, rhs);
    let mut module = b.finish();
    {
        let mut resolver = Resolver::new(&mut module);
        resolver.register_variable_for_testing(var);
        resolver.resolve_expression(add).unwrap();
    }

    let mut builder = Builder::new(&module);
    builder.push_function(Function::default());
    assert!(builder.generate_global_variable(var));
    assert_eq!(builder.generate_binary_expression(add), Some(7));

    assert_eq!(
        dump_instructions(builder.types()),
        indoc! {"
            %3 = OpTypeInt 32 1
            %2 = OpTypePointer Output %3
            %4 = OpConstantNull %3
            %1 = OpVariable %2 Output %4
        "}
    );
    assert_eq!(
        dump_instructions(builder.functions()[0].instructions()),
        indoc! {"
            %5 = OpLoad %3 %1
            %6 = OpLoad %3 %1
            %7 = OpIAdd %3 %5 %6
        "}
    );
}

#[test]
fn test_constant_read_twice_is_not_loaded() {
    let mut b = ModuleBuilder::new();
    let i32_ = b.ty_i32();
    let init = b.sint(2);
    let var = b.constant("var", AddressSpace::None, i32_, init);
    let lhs = b.expr("var");
    let rhs = b.expr("var");
    let add = b.add_expr(lhs, rhs);
    let mut module = b.finish();
    {
        let mut resolver = Resolver::new(&mut module);
        resolver.register_variable_for_testing(var);
        resolver.resolve_expression(add).unwrap();
    }

    let mut builder = Builder::new(&module);
    builder.push_function(Function::default());
    assert!(builder.generate_global_variable(var));
    assert_eq!(builder.generate_binary_expression(add), Some(3));

    assert_eq!(
        dump_instructions(builder.types()),
        indoc! {"
            %1 = OpTypeInt 32 1
            %2 = OpConstant %1 2
        "}
    );
    assert_eq!(
        dump_instructions(builder.functions()[0].instructions()),
        "%3 = OpIAdd %1 %2 %2\n"
    );
}

#[test]
fn test_function_constant_is_loaded_once() {
    let module = resolved(indoc! {"
        fn f() -> i32 {
          var a : i32 = 1;
          const c : i32 = a;
          return c + c;
        }
    "});
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());

    let body = builder.functions()[0].instructions();
    let loads = body.iter().filter(|i| i.op == Op::Load).count();
    assert_eq!(loads, 1);
    let body = dump_instructions(body);
    assert!(body.contains("= OpIAdd %2 %8 %8\n"), "{}", body);
}

#[test]
fn test_constants_deduplicated() {
    let mut b = ModuleBuilder::new();
    let two = b.sint(2);
    let other_two = b.sint(2);
    let three = b.uint(3);
    let module = b.finish();

    let mut builder = Builder::new(&module);
    builder.push_function(Function::default());
    let first = builder.generate_constant_expression(two);
    let second = builder.generate_constant_expression(other_two);
    assert_eq!(first, second);
    assert_ne!(builder.generate_constant_expression(three), first);
    assert_eq!(
        dump_instructions(builder.types()),
        indoc! {"
            %1 = OpTypeInt 32 1
            %2 = OpConstant %1 2
            %3 = OpTypeInt 32 0
            %4 = OpConstant %3 3
        "}
    );
}

#[test]
fn test_generate_fragment_shader() {
    let module = resolved(indoc! {"
        fn main() {
          var a : f32 = 1.0;
          if (a > 0.5) {
            discard;
          }
          return;
        }
        entry_point fragment = main;
    "});
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());
    assert_eq!(
        builder.dump(),
        indoc! {r#"
            OpCapability Shader
            OpMemoryModel Logical GLSL450
            OpEntryPoint Fragment %1 "main"
            OpExecutionMode %1 OriginUpperLeft
            OpName %1 "main"
            OpName %5 "a"
            %2 = OpTypeVoid
            %3 = OpTypeFunction %2
            %7 = OpTypeFloat 32
            %6 = OpTypePointer Function %7
            %8 = OpConstant %7 1
            %10 = OpConstant %7 0.5
            %11 = OpTypeBool
            %1 = OpFunction %2 None %3
            %4 = OpLabel
            %5 = OpVariable %6 Function %8
            %9 = OpLoad %7 %5
            %12 = OpFOrdGreaterThan %11 %9 %10
            OpSelectionMerge %13 None
            OpBranchConditional %12 %14 %13
            %14 = OpLabel
            OpKill
            %13 = OpLabel
            OpReturn
            OpFunctionEnd
        "#}
    );
}

#[test]
fn test_debug_names_can_be_disabled() {
    let module = resolved("fn main() {\n  var a : f32;\n}");
    let mut builder = Builder::with_options(
        &module,
        Options {
            emit_debug_names: false,
        },
    );
    assert!(builder.generate());
    assert!(builder.debug().is_empty());
}

#[test]
fn test_loop_structure() {
    let module = resolved(indoc! {"
        fn main() {
          var i : i32 = 0;
          loop {
            if (i > 4) {
              break;
            }
            continuing {
              i = i + 1;
            }
          }
        }
    "});
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());
    assert_eq!(
        ops(builder.functions()[0].instructions()),
        vec![
            Op::Branch,
            Op::Label,
            Op::LoopMerge,
            Op::Branch,
            Op::Label,
            Op::Load,
            Op::SGreaterThan,
            Op::SelectionMerge,
            Op::BranchConditional,
            Op::Label,
            Op::Branch,
            Op::Label,
            Op::Branch,
            Op::Label,
            Op::Load,
            Op::IAdd,
            Op::Store,
            Op::Branch,
            Op::Label,
            Op::Return,
        ]
    );
}

#[test]
fn test_accessors() {
    let module = resolved(indoc! {"
        fn main() -> f32 {
          var v : vec3<f32>;
          v.y = 2.0;
          return v.zy.x;
        }
    "});
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());
    assert_eq!(
        ops(builder.functions()[0].instructions()),
        vec![
            Op::AccessChain,
            Op::Store,
            Op::Load,
            Op::VectorShuffle,
            Op::CompositeExtract,
            Op::ReturnValue,
        ]
    );
}

#[test]
fn test_conversion_and_ext_inst() {
    let module = resolved(indoc! {r#"
        import "GLSL.std.450" as std::glsl;
        fn f() -> f32 {
          return std::glsl::sqrt(4.0);
        }
    "#});
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());
    assert_eq!(
        dump_instructions(builder.ext_imports()),
        "%1 = OpExtInstImport \"GLSL.std.450\"\n"
    );
    assert_eq!(
        dump_instructions(builder.functions()[0].instructions()),
        "%7 = OpExtInst %3 %1 31 %6\nOpReturnValue %7\n"
    );

    let module = resolved("fn f() {\n  var a : i32 = 1;\n  var b : f32 = f32(a);\n}");
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());
    assert!(ops(builder.functions()[0].instructions()).contains(&Op::ConvertSToF));
}

#[test]
fn test_decorations() {
    let module = resolved("@binding(0) @group(1) @access(read) var<storage> data : array<f32>;");
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());
    assert_eq!(
        dump_instructions(builder.annotations()),
        indoc! {"
            OpDecorate %3 Block
            OpMemberDecorate %3 0 Offset 0
            OpDecorate %4 ArrayStride 4
            OpDecorate %1 Binding 0
            OpDecorate %1 DescriptorSet 1
            OpDecorate %1 NonWritable
        "}
    );
    assert_eq!(
        dump_instructions(builder.types()),
        indoc! {"
            %5 = OpTypeFloat 32
            %4 = OpTypeRuntimeArray %5
            %3 = OpTypeStruct %4
            %2 = OpTypePointer StorageBuffer %3
            %1 = OpVariable %2 StorageBuffer
        "}
    );
}

#[test]
fn test_uniform_array_stride() {
    let module = resolved("@binding(0) @group(0) var<uniform> weights : array<f32, 4>;");
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());
    let annotations = dump_instructions(builder.annotations());
    assert!(annotations.contains("OpDecorate %3 Block\n"), "{}", annotations);
    assert!(annotations.contains("OpDecorate %4 ArrayStride 16\n"), "{}", annotations);

    let module = resolved("@binding(0) @group(0) var<storage> points : array<vec3<f32>, 4>;");
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());
    let annotations = dump_instructions(builder.annotations());
    assert!(annotations.contains("OpDecorate %4 ArrayStride 16\n"), "{}", annotations);
}

#[test]
fn test_matrix_member_layout() {
    for (space, stride) in [(AddressSpace::Uniform, 16), (AddressSpace::Storage, 8)] {
        let mut b = ModuleBuilder::new();
        let f32_ = b.ty_f32();
        let mat = b.ty_mat(3, 2, f32_);
        let var = b.var("m", space, mat);
        let module = b.finish();

        let mut builder = Builder::new(&module);
        assert!(builder.generate_global_variable(var), "{}", builder.error());
        assert_eq!(
            dump_instructions(builder.annotations()),
            format!(
                "OpDecorate %3 Block\n\
                 OpMemberDecorate %3 0 Offset 0\n\
                 OpMemberDecorate %3 0 ColMajor\n\
                 OpMemberDecorate %3 0 MatrixStride {stride}\n"
            )
        );
    }
}

#[test]
fn test_buffer_access_goes_through_block_member() {
    let module = resolved(indoc! {"
        @binding(0) @group(0) var<storage> data : array<f32>;
        fn main() {
          data[1] = 2.0;
        }
        entry_point compute = main;
    "});
    let mut builder = Builder::new(&module);
    assert!(builder.generate(), "{}", builder.error());
    let body = builder.functions()[0].instructions();
    assert_eq!(
        ops(body),
        vec![Op::AccessChain, Op::AccessChain, Op::Store, Op::Return]
    );
    let dump = dump_instructions(body);
    let first: Vec<&str> = dump.lines().next().unwrap_or_default().split(' ').collect();
    assert_eq!(first[2], "OpAccessChain", "{}", dump);
    assert_eq!(first[4], "%1", "{}", dump);
}

#[test]
fn test_module_words() {
    let module = resolved("fn main() {}\nentry_point vertex = main;");
    let mut builder = Builder::new(&module);
    assert!(builder.generate());
    let words = builder.module_words();
    assert_eq!(&words[..5], &[MAGIC_NUMBER, VERSION, 0, builder.id_bound(), 0]);
    // OpCapability Shader
    assert_eq!(&words[5..7], &[(2 << 16) | 17, 1]);
}

#[test]
fn test_string_operand_words() {
    let inst = Instruction::new(
        Op::Name,
        vec![Operand::Id(1), Operand::String("var".to_string())],
    );
    let mut words = vec![];
    inst.write_words(&mut words);
    assert_eq!(words, vec![(3 << 16) | 5, 1, u32::from_le_bytes(*b"var\0")]);

    let inst = Instruction::new(Op::Name, vec![Operand::Id(1), Operand::String("main".to_string())]);
    assert_eq!(inst.word_count(), 4);
}

#[test]
fn test_invalid_module_refused() {
    let mut module = Module::new();
    module.entry_points.push(EntryPoint {
        stage: PipelineStage::Vertex,
        function: "missing".to_string(),
        span: Span::default(),
    });
    let mut builder = Builder::new(&module);
    assert!(!builder.generate());
    assert!(builder.has_error());
    assert_eq!(builder.error(), "unable to generate an invalid module");
}

#[test]
fn test_unresolved_identifier_is_an_error() {
    let mut b = ModuleBuilder::new();
    let expr = b.expr("nope");
    let module = b.finish();
    let mut builder = Builder::new(&module);
    assert_eq!(builder.generate_identifier_expression(expr), None);
    assert_eq!(
        builder.error(),
        "unable to find variable with identifier 'nope'"
    );
}
