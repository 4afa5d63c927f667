use std::fmt;

/// Memory region a variable lives in.
///
/// `Handle`, `In`, `None` and `Out` are internal: [`AddressSpace::parse`]
/// never produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressSpace {
    #[default]
    Invalid,
    Function,
    Handle,
    In,
    None,
    Out,
    Private,
    PushConstant,
    Storage,
    Uniform,
    Workgroup,
}

/// The spellings accepted by [`AddressSpace::parse`].
pub const ADDRESS_SPACE_STRINGS: [&str; 6] = [
    "function",
    "private",
    "push_constant",
    "storage",
    "uniform",
    "workgroup",
];

impl AddressSpace {
    pub fn parse(text: &str) -> AddressSpace {
        match text {
            "function" => AddressSpace::Function,
            "private" => AddressSpace::Private,
            "push_constant" => AddressSpace::PushConstant,
            "storage" => AddressSpace::Storage,
            "uniform" => AddressSpace::Uniform,
            "workgroup" => AddressSpace::Workgroup,
            _ => AddressSpace::Invalid,
        }
    }

    /// True if the backing memory can be populated from outside the shader.
    pub fn is_host_shareable(self) -> bool {
        matches!(
            self,
            AddressSpace::Uniform | AddressSpace::Storage | AddressSpace::PushConstant
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddressSpace::Invalid => "invalid",
            AddressSpace::Function => "function",
            AddressSpace::Handle => "handle",
            AddressSpace::In => "in",
            AddressSpace::None => "none",
            AddressSpace::Out => "out",
            AddressSpace::Private => "private",
            AddressSpace::PushConstant => "push_constant",
            AddressSpace::Storage => "storage",
            AddressSpace::Uniform => "uniform",
            AddressSpace::Workgroup => "workgroup",
        }
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
