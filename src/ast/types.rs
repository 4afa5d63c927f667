use crate::arena::Handle;

use super::Module;
use super::address_space::AddressSpace;

/// A type as written in source or derived by the resolver.
///
/// Types are interned in [`Module::types`], so two structurally equal types
/// share one handle within a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Bool,
    I32,
    U32,
    F32,
    Vector {
        size: u32,
        component: Handle<Type>,
    },
    Matrix {
        columns: u32,
        rows: u32,
        component: Handle<Type>,
    },
    Array {
        base: Handle<Type>,
        size: Option<u32>,
    },
    Pointer {
        space: AddressSpace,
        base: Handle<Type>,
    },
    Alias {
        name: String,
        base: Handle<Type>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Sint,
    Uint,
    Float,
}

impl ScalarKind {
    pub fn is_integer(self) -> bool {
        matches!(self, ScalarKind::Sint | ScalarKind::Uint)
    }

    pub fn is_numeric(self) -> bool {
        self != ScalarKind::Bool
    }
}

impl Module {
    pub fn intern_type(&mut self, ty: Type) -> Handle<Type> {
        self.types.insert(ty)
    }

    /// Follows alias chains down to the aliased type.
    pub fn unwrap_alias(&self, mut ty: Handle<Type>) -> Handle<Type> {
        while let Some(Type::Alias { base, .. }) = self.types.get(ty) {
            ty = *base;
        }
        ty
    }

    /// Strips aliases and one level of pointer, yielding the stored type.
    pub fn unwrap_ptr(&self, ty: Handle<Type>) -> Handle<Type> {
        let ty = self.unwrap_alias(ty);
        match self.types.get(ty) {
            Some(Type::Pointer { base, .. }) => self.unwrap_alias(*base),
            _ => ty,
        }
    }

    pub fn is_pointer(&self, ty: Handle<Type>) -> bool {
        matches!(
            self.types.get(self.unwrap_alias(ty)),
            Some(Type::Pointer { .. })
        )
    }

    /// Kind of a scalar, or of a vector's components.
    pub fn scalar_kind(&self, ty: Handle<Type>) -> Option<ScalarKind> {
        match self.types.get(self.unwrap_alias(ty))? {
            Type::Bool => Some(ScalarKind::Bool),
            Type::I32 => Some(ScalarKind::Sint),
            Type::U32 => Some(ScalarKind::Uint),
            Type::F32 => Some(ScalarKind::Float),
            Type::Vector { component, .. } => self.scalar_kind(*component),
            _ => None,
        }
    }

    pub fn is_scalar(&self, ty: Handle<Type>) -> bool {
        matches!(
            self.types.get(self.unwrap_alias(ty)),
            Some(Type::Bool | Type::I32 | Type::U32 | Type::F32)
        )
    }

    pub fn vector_size(&self, ty: Handle<Type>) -> Option<u32> {
        match self.types.get(self.unwrap_alias(ty))? {
            Type::Vector { size, .. } => Some(*size),
            _ => None,
        }
    }

    /// True if both types are the same after unwrapping aliases.
    pub fn same_type(&self, a: Handle<Type>, b: Handle<Type>) -> bool {
        self.type_name_unaliased(a) == self.type_name_unaliased(b)
    }

    /// Canonical structural name, e.g. `__vec_3__f32`. Aliases keep their name.
    pub fn type_name(&self, ty: Handle<Type>) -> String {
        self.build_type_name(ty, false)
    }

    /// Like [`Module::type_name`], with every alias replaced by its target.
    pub fn type_name_unaliased(&self, ty: Handle<Type>) -> String {
        self.build_type_name(ty, true)
    }

    fn build_type_name(&self, ty: Handle<Type>, unalias: bool) -> String {
        let Some(t) = self.types.get(ty) else {
            return "__invalid".to_string();
        };
        match t {
            Type::Void => "__void".to_string(),
            Type::Bool => "__bool".to_string(),
            Type::I32 => "__i32".to_string(),
            Type::U32 => "__u32".to_string(),
            Type::F32 => "__f32".to_string(),
            Type::Vector { size, component } => {
                format!("__vec_{}{}", size, self.build_type_name(*component, unalias))
            }
            Type::Matrix {
                columns,
                rows,
                component,
            } => format!(
                "__mat_{}_{}{}",
                columns,
                rows,
                self.build_type_name(*component, unalias)
            ),
            Type::Array { base, size } => match size {
                Some(n) => format!("__array{}_{}", self.build_type_name(*base, unalias), n),
                None => format!("__array{}", self.build_type_name(*base, unalias)),
            },
            Type::Pointer { space, base } => {
                format!("__ptr_{}{}", space, self.build_type_name(*base, unalias))
            }
            Type::Alias { name, base } => {
                if unalias {
                    self.build_type_name(*base, unalias)
                } else {
                    format!("__alias_{}{}", name, self.build_type_name(*base, unalias))
                }
            }
        }
    }

    /// Source spelling of a type, used in diagnostics.
    pub fn type_display(&self, ty: Handle<Type>) -> String {
        let Some(t) = self.types.get(ty) else {
            return "<invalid>".to_string();
        };
        match t {
            Type::Void => "void".to_string(),
            Type::Bool => "bool".to_string(),
            Type::I32 => "i32".to_string(),
            Type::U32 => "u32".to_string(),
            Type::F32 => "f32".to_string(),
            Type::Vector { size, component } => {
                format!("vec{}<{}>", size, self.type_display(*component))
            }
            Type::Matrix {
                columns,
                rows,
                component,
            } => format!(
                "mat{}x{}<{}>",
                columns,
                rows,
                self.type_display(*component)
            ),
            Type::Array { base, size } => match size {
                Some(n) => format!("array<{}, {}>", self.type_display(*base), n),
                None => format!("array<{}>", self.type_display(*base)),
            },
            Type::Pointer { space, base } => {
                format!("ptr<{}, {}>", space, self.type_display(*base))
            }
            Type::Alias { name, .. } => name.clone(),
        }
    }

    /// Checks that `ty` and every type it refers to are present in this module.
    pub fn is_valid_type(&self, ty: Handle<Type>) -> bool {
        match self.types.get(ty) {
            None => false,
            Some(Type::Void | Type::Bool | Type::I32 | Type::U32 | Type::F32) => true,
            Some(Type::Vector { size, component }) => {
                (2..=4).contains(size) && self.is_valid_type(*component)
            }
            Some(Type::Matrix {
                columns,
                rows,
                component,
            }) => {
                (2..=4).contains(columns) && (2..=4).contains(rows) && self.is_valid_type(*component)
            }
            Some(Type::Array { base, .. }) => self.is_valid_type(*base),
            Some(Type::Pointer { base, .. }) => self.is_valid_type(*base),
            Some(Type::Alias { name, base }) => !name.is_empty() && self.is_valid_type(*base),
        }
    }
}
