use std::collections::{HashMap, HashSet};

/// Words that cannot be used as identifiers in generated Metal code.
const RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "array", "as_type", "auto", "bool", "bool2", "bool3", "bool4",
    "break", "case", "char", "class", "const", "const_cast", "constant", "constexpr", "continue",
    "decltype", "default", "delete", "device", "discard_fragment", "do", "double", "else", "enum",
    "explicit", "extern", "false", "float", "float2", "float3", "float4", "for", "fragment",
    "friend", "goto", "half", "if", "inline", "int", "int2", "int3", "int4", "kernel", "long",
    "main", "metal", "mutable", "namespace", "new", "not", "nullptr", "operator", "or",
    "private", "protected", "public", "register", "reinterpret_cast", "return", "sampler",
    "short", "signed", "sizeof", "static", "static_assert", "static_cast", "struct", "switch",
    "template", "texture", "this", "thread", "threadgroup", "throw", "true", "try", "typedef",
    "typeid", "typename", "uint", "uint2", "uint3", "uint4", "union", "unsigned", "using",
    "vertex", "virtual", "void", "volatile", "while", "xor",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Maps source identifiers to unique names that are legal in Metal. A name
/// keeps its spelling unless it is reserved or already taken, in which case a
/// numeric suffix is appended. The mapping is stable.
#[derive(Debug, Default)]
pub struct Namer {
    remapped: HashMap<String, String>,
    used: HashSet<String>,
}

impl Namer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_for(&mut self, name: &str) -> String {
        if let Some(existing) = self.remapped.get(name) {
            return existing.clone();
        }
        let mut candidate = name.to_string();
        let mut i = 1;
        while is_reserved(&candidate) || self.used.contains(&candidate) {
            candidate = format!("{}_{}", name, i);
            i += 1;
        }
        self.used.insert(candidate.clone());
        self.remapped.insert(name.to_string(), candidate.clone());
        candidate
    }

    pub fn is_remapped(&self, name: &str) -> bool {
        self.remapped.get(name).is_some_and(|n| n != name)
    }
}
