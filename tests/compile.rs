use indoc::indoc;
use wgslc::writer::{msl, spirv};
use wgslc::{CompileOptions, Error, compile};

const FRAGMENT: &str = indoc! {"
    @location(0) var<private> color : vec4<f32>;
    fn shade(v : vec4<f32>) -> vec4<f32> {
      return v * 0.5;
    }
    fn main() {
      color = shade(vec4<f32>(1.0, 0.0, 0.0, 1.0));
    }
    entry_point fragment = main;
"};

fn both_backends() -> CompileOptions {
    CompileOptions {
        file_name: "shader.wgsl".to_string(),
        spirv: Some(spirv::Options::default()),
        msl: Some(msl::Options::default()),
    }
}

#[test]
fn compiles_to_both_backends() {
    let output = compile(FRAGMENT, &both_backends()).unwrap();

    let words = output.spirv.unwrap();
    assert_eq!(words[0], spirv::MAGIC_NUMBER);
    assert_eq!(words[1], spirv::VERSION);

    let dump = output.spirv_dump.unwrap();
    assert!(dump.starts_with("OpCapability Shader\nOpMemoryModel Logical GLSL450\n"));
    assert!(dump.contains("OpExecutionMode %1 OriginUpperLeft"), "{}", dump);
    assert!(dump.contains("OpFunctionCall"), "{}", dump);
    assert!(dump.contains("OpVectorTimesScalar"), "{}", dump);

    let msl = output.msl.unwrap();
    assert!(msl.starts_with("#include <metal_stdlib>\n"));
    assert!(msl.contains("float4 shade(float4 v) {\n  return (v * 0.5f);\n}\n"), "{}", msl);
    assert!(msl.contains("fragment void main_1() {\n  float4 color = {};\n"), "{}", msl);
    assert!(output.warnings.is_empty());
}

#[test]
fn default_options_only_generate_spirv() {
    let output = compile(FRAGMENT, &CompileOptions::default()).unwrap();
    assert!(output.spirv.is_some());
    assert!(output.msl.is_none());
}

#[test]
fn syntax_errors_stop_before_resolving() {
    let err = compile("fn main( {", &both_backends()).unwrap_err();
    let Error::Parse(diagnostics) = &err else {
        panic!("expected a syntax error, found {:?}", err);
    };
    assert!(diagnostics.has_error());
    assert!(err.to_string().starts_with("syntax error:\n"));
}

#[test]
fn semantic_errors_are_reported_with_positions() {
    let source = indoc! {"
        fn main() {
          var a : i32 = 1.0;
        }
    "};
    let err = compile(source, &both_backends()).unwrap_err();
    let Error::Resolve(diagnostics) = &err else {
        panic!("expected a semantic error, found {:?}", err);
    };
    assert!(diagnostics.error().starts_with("2:"), "{}", diagnostics.error());

    let report = err.report("shader.wgsl", source, false);
    assert!(report.contains("shader.wgsl"), "{}", report);
}

#[test]
fn warnings_are_kept_on_success() {
    let source = indoc! {"
        fn main() {
          return;
          discard;
        }
        entry_point fragment = main;
    "};
    let output = compile(source, &both_backends()).unwrap();
    let warnings: Vec<_> = output.warnings.warnings().map(|w| w.to_string()).collect();
    assert_eq!(warnings, vec!["3:3: code is unreachable"]);
}

#[test]
fn generator_errors_name_the_backend() {
    let source = indoc! {"
        var<workgroup> tile : array<f32, 4>;
        fn main() {}
        entry_point fragment = main;
    "};
    let options = CompileOptions {
        spirv: None,
        ..both_backends()
    };
    match compile(source, &options) {
        Err(Error::Generate { backend, message }) => {
            assert_eq!(backend, "msl");
            assert!(message.contains("tile"), "{}", message);
        }
        other => panic!("expected a generation error, found {:?}", other),
    }
}
