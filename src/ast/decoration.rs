use std::fmt;

use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessControl {
    Read,
    Write,
    ReadWrite,
}

impl AccessControl {
    pub fn parse(text: &str) -> Option<AccessControl> {
        match text {
            "read" => Some(AccessControl::Read),
            "write" => Some(AccessControl::Write),
            "read_write" => Some(AccessControl::ReadWrite),
            _ => None,
        }
    }
}

impl fmt::Display for AccessControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessControl::Read => "read",
            AccessControl::Write => "write",
            AccessControl::ReadWrite => "read_write",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Position,
    FragCoord,
    FrontFacing,
    FragDepth,
    VertexIndex,
    InstanceIndex,
    LocalInvocationId,
    LocalInvocationIndex,
    GlobalInvocationId,
    WorkgroupId,
}

impl Builtin {
    pub fn parse(text: &str) -> Option<Builtin> {
        Some(match text {
            "position" => Builtin::Position,
            "frag_coord" => Builtin::FragCoord,
            "front_facing" => Builtin::FrontFacing,
            "frag_depth" => Builtin::FragDepth,
            "vertex_index" => Builtin::VertexIndex,
            "instance_index" => Builtin::InstanceIndex,
            "local_invocation_id" => Builtin::LocalInvocationId,
            "local_invocation_index" => Builtin::LocalInvocationIndex,
            "global_invocation_id" => Builtin::GlobalInvocationId,
            "workgroup_id" => Builtin::WorkgroupId,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Builtin::Position => "position",
            Builtin::FragCoord => "frag_coord",
            Builtin::FrontFacing => "front_facing",
            Builtin::FragDepth => "frag_depth",
            Builtin::VertexIndex => "vertex_index",
            Builtin::InstanceIndex => "instance_index",
            Builtin::LocalInvocationId => "local_invocation_id",
            Builtin::LocalInvocationIndex => "local_invocation_index",
            Builtin::GlobalInvocationId => "global_invocation_id",
            Builtin::WorkgroupId => "workgroup_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationKind {
    Access(AccessControl),
    Location(u32),
    Builtin(Builtin),
    Binding(u32),
    Group(u32),
}

/// Attribute attached to a variable, e.g. `@binding(0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub span: Span,
}

impl Decoration {
    pub fn new(kind: DecorationKind, span: Span) -> Self {
        Decoration { kind, span }
    }

    pub fn to_str(&self) -> String {
        match self.kind {
            DecorationKind::Access(access) => format!("AccessDecoration{{{}}}", access),
            DecorationKind::Location(n) => format!("LocationDecoration{{{}}}", n),
            DecorationKind::Builtin(b) => format!("BuiltinDecoration{{{}}}", b.as_str()),
            DecorationKind::Binding(n) => format!("BindingDecoration{{{}}}", n),
            DecorationKind::Group(n) => format!("GroupDecoration{{{}}}", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
    Off,
}

impl DiagnosticSeverity {
    pub fn parse(text: &str) -> Option<DiagnosticSeverity> {
        match text {
            "error" => Some(DiagnosticSeverity::Error),
            "warning" => Some(DiagnosticSeverity::Warning),
            "info" => Some(DiagnosticSeverity::Info),
            "off" => Some(DiagnosticSeverity::Off),
            _ => None,
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
            DiagnosticSeverity::Off => "off",
        })
    }
}

/// `diagnostic(<severity>, <rule>);` at module scope.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticDirective {
    pub severity: DiagnosticSeverity,
    pub rule: String,
    pub span: Span,
}
