use super::*;
use crate::ast::{EntryPoint, Module, ModuleBuilder, PipelineStage, StatementKind};
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

fn generate(source: &str) -> String {
    let module = resolved(source);
    let mut generator = GeneratorImpl::with_options(
        &module,
        Options {
            include_header: false,
        },
    );
    assert!(generator.generate(), "{}", generator.error());
    generator.into_result()
}

fn generate_err(source: &str) -> String {
    let module = resolved(source);
    let mut generator = GeneratorImpl::new(&module);
    assert!(!generator.generate());
    generator.error()
}

#[test]
fn test_emit_block_statement() {
    let b = ModuleBuilder::new();
    let stmt = b.block(vec![b.discard()]);
    let module = b.finish();

    let mut generator = GeneratorImpl::new(&module);
    generator.increment_indent();
    assert!(generator.emit_statement(&stmt));
    assert_eq!(generator.result(), "  {\n    discard_fragment();\n  }\n");
}

#[test]
fn test_emit_block_without_newline() {
    let b = ModuleBuilder::new();
    let stmt = b.block(vec![b.discard()]);
    let module = b.finish();
    let StatementKind::Block(block) = &stmt.kind else {
        unreachable!();
    };

    let mut generator = GeneratorImpl::new(&module);
    generator.increment_indent();
    assert!(generator.emit_block(block));
    assert_eq!(generator.result(), "{\n    discard_fragment();\n  }");
}

#[test]
fn test_expressions() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.ty_f32();
    let arr = b.ty_array(f32_, Some(2));
    let one = b.float(1.0);
    let half = b.float(0.5);
    let array = b.construct(arr, vec![one, half]);
    let vector = b.vec3_f32(1.0, 2.0, 3.0);
    let a = b.expr("a");
    let three = b.uint(3);
    let sum = b.add_expr(a, three);
    let sqrt = b.call("std::glsl::sqrt", vec![half]);
    let module = b.finish();

    let cases = [
        (array, "metal::array<float, 2>{1.0f, 0.5f}"),
        (vector, "float3(1.0f, 2.0f, 3.0f)"),
        (sum, "(a + 3u)"),
        (sqrt, "metal::sqrt(0.5f)"),
    ];
    for (expr, expected) in cases {
        let mut generator = GeneratorImpl::new(&module);
        assert!(generator.emit_expression(expr), "{}", generator.error());
        assert_eq!(generator.result(), expected);
    }
}

#[test]
fn test_generate_compute_module() {
    let msl = generate(indoc! {r#"
        import "GLSL.std.450" as std::glsl;
        const scale : f32 = 2.0;
        @binding(0) @group(0) @access(read) var<storage> input : array<f32>;
        @binding(1) @group(0) var<storage> output : array<f32>;
        var<private> counter : i32;
        fn double(x : f32) -> f32 {
          return x * scale;
        }
        fn main() {
          counter = counter + 1;
          output[0] = std::glsl::sqrt(double(input[0]));
        }
        entry_point compute = main;
    "#});
    assert_eq!(
        msl,
        indoc! {"
            constant float scale = 2.0f;

            float double_1(float x) {
              return (x * scale);
            }

            kernel void main_1(const device float* input [[buffer(0)]], device float* output [[buffer(1)]]) {
              int counter = {};
              counter = (counter + 1);
              output[0] = metal::sqrt(double_1(input[0]));
            }
        "}
    );
}

#[test]
fn test_header_and_alias() {
    let module = resolved(indoc! {"
        type Color = vec4<f32>;
        fn main() {
          var c : Color;
        }
        entry_point fragment = main;
    "});
    let mut generator = GeneratorImpl::new(&module);
    assert!(generator.generate(), "{}", generator.error());
    assert_eq!(
        generator.result(),
        indoc! {"
            #include <metal_stdlib>

            typedef float4 Color;

            fragment void main_1() {
              Color c = {};
            }
        "}
    );
}

#[test]
fn test_uniform_and_workgroup_parameters() {
    let msl = generate(indoc! {"
        @binding(2) @group(0) var<uniform> offset : vec4<f32>;
        var<workgroup> tile : array<f32, 4>;
        fn main() {
          tile[1] = offset.x;
        }
        entry_point compute = main;
    "});
    assert_eq!(
        msl,
        indoc! {"
            kernel void main_1(constant float4& offset [[buffer(2)]], threadgroup metal::array<float, 4>& tile [[threadgroup(0)]]) {
              tile[1] = offset.x;
            }
        "}
    );
}

#[test]
fn test_workgroup_outside_compute() {
    let error = generate_err(indoc! {"
        var<workgroup> tile : array<f32, 4>;
        fn main() {}
        entry_point fragment = main;
    "});
    assert!(
        error.contains("workgroup variable 'tile' is only available to compute entry points"),
        "{}",
        error
    );
}

#[test]
fn test_if_else_and_loop_with_continuing() {
    let msl = generate(indoc! {"
        fn main() {
          var i : i32 = 0;
          loop {
            var step : i32 = 2;
            if (i > 4) {
              break;
            } else {
              i = i + step;
            }
            continuing {
              i = i + 1;
            }
          }
        }
        entry_point compute = main;
    "});
    assert_eq!(
        msl,
        indoc! {"
            kernel void main_1() {
              int i = 0;
              {
                bool loop_first_1 = true;
                int step = {};
                for(;;) {
                  if (!loop_first_1) {
                    i = (i + 1);
                  }
                  loop_first_1 = false;
                  step = 2;
                  if ((i > 4)) {
                    break;
                  } else {
                    i = (i + step);
                  }
                }
              }
            }
        "}
    );
}

#[test]
fn test_continuing_reads_body_variable() {
    let msl = generate(indoc! {"
        fn main() {
          var i : i32 = 0;
          loop {
            var next : i32 = i + 1;
            var scratch : f32;
            if (next > 3) {
              break;
            }
            continuing {
              i = next;
            }
          }
        }
        entry_point compute = main;
    "});
    assert_eq!(
        msl,
        indoc! {"
            kernel void main_1() {
              int i = 0;
              {
                bool loop_first_1 = true;
                int next = {};
                float scratch = {};
                for(;;) {
                  if (!loop_first_1) {
                    i = next;
                  }
                  loop_first_1 = false;
                  next = (i + 1);
                  scratch = {};
                  if ((next > 3)) {
                    break;
                  }
                }
              }
            }
        "}
    );
}

#[test]
fn test_float_modulo_uses_fmod() {
    let msl = generate(indoc! {"
        fn main() {
          var a : f32 = 5.0;
          var v : vec2<f32> = vec2<f32>(a, 1.0);
          var b : f32 = a % 2.0;
          var w : vec2<f32> = v % 2.0;
          var n : i32 = 7 % 3;
        }
        entry_point compute = main;
    "});
    assert!(msl.contains("float b = metal::fmod(a, 2.0f);\n"), "{}", msl);
    assert!(msl.contains("float2 w = metal::fmod(v, float2(2.0f));\n"), "{}", msl);
    assert!(msl.contains("int n = (7 % 3);\n"), "{}", msl);
}

#[test]
fn test_loop_without_continuing() {
    let msl = generate(indoc! {"
        fn main() {
          loop {
            break;
          }
          _ = 1;
        }
        entry_point vertex = main;
    "});
    assert_eq!(
        msl,
        indoc! {"
            vertex void main_1() {
              for(;;) {
                break;
              }
              (void) 1;
            }
        "}
    );
}

#[test]
fn test_module_variable_in_helper() {
    let error = generate_err(indoc! {"
        var<private> counter : i32;
        fn bump() {
          counter = counter + 1;
        }
        fn main() {
          bump();
        }
        entry_point compute = main;
    "});
    assert!(
        error.contains("module-scope variable 'counter' can only be used from an entry point"),
        "{}",
        error
    );
}

#[test]
fn test_invalid_module_is_refused() {
    let mut module = Module::new();
    module.entry_points.push(EntryPoint {
        stage: PipelineStage::Vertex,
        function: "missing".to_string(),
        span: Span::default(),
    });
    let mut generator = GeneratorImpl::new(&module);
    assert!(!generator.generate());
    assert_eq!(generator.error(), "unable to generate an invalid module");
}

#[test]
fn test_namer() {
    let mut namer = Namer::new();
    assert_eq!(namer.name_for("main"), "main_1");
    assert_eq!(namer.name_for("main"), "main_1");
    assert_eq!(namer.name_for("main_1"), "main_1_1");
    assert_eq!(namer.name_for("color"), "color");
    assert!(namer.is_remapped("main"));
    assert!(!namer.is_remapped("color"));
}
