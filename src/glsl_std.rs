//! The subset of the `GLSL.std.450` extended instruction set callable through
//! an `import "GLSL.std.450" as <namespace>;` declaration.

pub const GLSL_STD_450: &str = "GLSL.std.450";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlslFunction {
    pub name: &'static str,
    /// Instruction number inside the extended set.
    pub id: u32,
    pub arity: usize,
    /// Result is the component type of the arguments rather than their type.
    pub returns_scalar: bool,
    /// Only defined on three-component vectors.
    pub vec3_only: bool,
    /// Spelling in the `metal::` namespace.
    pub msl_name: &'static str,
}

const fn f(name: &'static str, id: u32, arity: usize, msl_name: &'static str) -> GlslFunction {
    GlslFunction {
        name,
        id,
        arity,
        returns_scalar: false,
        vec3_only: false,
        msl_name,
    }
}

const fn scalar(name: &'static str, id: u32, arity: usize) -> GlslFunction {
    GlslFunction {
        name,
        id,
        arity,
        returns_scalar: true,
        vec3_only: false,
        msl_name: name,
    }
}

pub const FUNCTIONS: &[GlslFunction] = &[
    f("round", 1, 1, "round"),
    f("trunc", 3, 1, "trunc"),
    f("fabs", 4, 1, "fabs"),
    f("floor", 8, 1, "floor"),
    f("ceil", 9, 1, "ceil"),
    f("fract", 10, 1, "fract"),
    f("sin", 13, 1, "sin"),
    f("cos", 14, 1, "cos"),
    f("tan", 15, 1, "tan"),
    f("pow", 26, 2, "pow"),
    f("exp", 27, 1, "exp"),
    f("log", 28, 1, "log"),
    f("exp2", 29, 1, "exp2"),
    f("log2", 30, 1, "log2"),
    f("sqrt", 31, 1, "sqrt"),
    f("inversesqrt", 32, 1, "rsqrt"),
    f("fmin", 37, 2, "fmin"),
    f("fmax", 40, 2, "fmax"),
    f("fclamp", 43, 3, "clamp"),
    f("fmix", 46, 3, "mix"),
    f("step", 48, 2, "step"),
    f("smoothstep", 49, 3, "smoothstep"),
    scalar("length", 66, 1),
    scalar("distance", 67, 2),
    GlslFunction {
        name: "cross",
        id: 68,
        arity: 2,
        returns_scalar: false,
        vec3_only: true,
        msl_name: "cross",
    },
    f("normalize", 69, 1, "normalize"),
    f("reflect", 71, 2, "reflect"),
];

pub fn find(name: &str) -> Option<&'static GlslFunction> {
    FUNCTIONS.iter().find(|func| func.name == name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lookup() {
        let sqrt = find("sqrt").unwrap();
        assert_eq!(sqrt.id, 31);
        assert_eq!(sqrt.arity, 1);
        assert_eq!(find("inversesqrt").unwrap().msl_name, "rsqrt");
        assert!(find("length").unwrap().returns_scalar);
        assert!(find("unknown").is_none());
    }
}
