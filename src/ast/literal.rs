use super::types::Type;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Bool(bool),
    Sint(i32),
    Uint(u32),
    Float(f32),
}

impl Literal {
    /// Canonical key for the value; equal literals share a name.
    pub fn name(&self) -> String {
        match self {
            Literal::Bool(true) => "__bool_true".to_string(),
            Literal::Bool(false) => "__bool_false".to_string(),
            Literal::Sint(v) => format!("__sint_{}", v),
            Literal::Uint(v) => format!("__uint_{}", v),
            Literal::Float(v) => format!("__float_{}", v.to_bits()),
        }
    }

    pub fn to_str(&self) -> String {
        match self {
            Literal::Bool(b) => b.to_string(),
            Literal::Sint(v) => v.to_string(),
            Literal::Uint(v) => format!("{}u", v),
            Literal::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    format!("{:.1}", v)
                } else {
                    v.to_string()
                }
            }
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Literal::Bool(true))
    }

    pub fn scalar_type(&self) -> Type {
        match self {
            Literal::Bool(_) => Type::Bool,
            Literal::Sint(_) => Type::I32,
            Literal::Uint(_) => Type::U32,
            Literal::Float(_) => Type::F32,
        }
    }
}
