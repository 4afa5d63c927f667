use crate::arena::Handle;
use crate::ast::{
    BinaryOp, Expression, ExpressionKind, ScalarKind, Type, UnaryOp,
};
use crate::glsl_std;
use crate::resolver::{Mutability, Resolver};

pub(crate) fn swizzle_index(c: char) -> Option<u32> {
    match c {
        'x' | 'r' => Some(0),
        'y' | 'g' => Some(1),
        'z' | 'b' => Some(2),
        'w' | 'a' => Some(3),
        _ => None,
    }
}

impl Resolver<'_> {
    /// Resolves `expr` and records its type. `None` means an error was
    /// reported for it or for one of its operands.
    pub fn resolve_expression(&mut self, expr: Handle<Expression>) -> Option<Handle<Type>> {
        let kind = self.module.expressions[expr].kind.clone();
        let ty = match kind {
            ExpressionKind::Identifier(segments) => self.resolve_identifier(expr, &segments),
            ExpressionKind::ScalarConstructor(literal) => {
                Some(self.module.intern_type(literal.scalar_type()))
            }
            ExpressionKind::TypeConstructor { ty, values } => {
                self.resolve_type_constructor(expr, ty, &values)
            }
            ExpressionKind::Binary { op, lhs, rhs } => self.resolve_binary(expr, op, lhs, rhs),
            ExpressionKind::Unary { op, expr: operand } => self.resolve_unary(expr, op, operand),
            ExpressionKind::Call { function, args } => self.resolve_call(expr, function, &args),
            ExpressionKind::ArrayAccessor { array, index } => {
                self.resolve_array_accessor(expr, array, index)
            }
            ExpressionKind::MemberAccessor { structure, member } => {
                self.resolve_member_accessor(expr, structure, &member)
            }
            ExpressionKind::Phony => {
                self.error_at(expr, "'_' can only be used on the left of an assignment");
                None
            }
        };
        if let Some(ty) = ty {
            self.module.expressions[expr].result_type = Some(ty);
        }
        ty
    }

    /// Resolves `expr` and strips a pointer off the result, giving the type of
    /// the value that would be loaded.
    pub(crate) fn resolve_value(&mut self, expr: Handle<Expression>) -> Option<Handle<Type>> {
        let ty = self.resolve_expression(expr)?;
        Some(self.deref(ty))
    }

    pub(crate) fn deref(&self, ty: Handle<Type>) -> Handle<Type> {
        match &self.module.types[self.module.unwrap_alias(ty)] {
            Type::Pointer { base, .. } => *base,
            _ => ty,
        }
    }

    fn error_at(&mut self, expr: Handle<Expression>, message: impl Into<String>) {
        let span = self.module.expressions[expr].span.clone();
        self.add_error(span, message);
    }

    fn display(&self, ty: Handle<Type>) -> String {
        self.module.type_display(ty)
    }

    fn resolve_identifier(
        &mut self,
        expr: Handle<Expression>,
        segments: &[String],
    ) -> Option<Handle<Type>> {
        let name = segments.join("::");
        let symbol = match segments {
            [single] => self.lookup(single),
            _ => None,
        };
        let Some(symbol) = symbol else {
            self.error_at(expr, format!("unknown identifier '{}'", name));
            return None;
        };
        match symbol.mutability {
            Mutability::Const => Some(symbol.ty),
            Mutability::Var => {
                let space = self.module.variables[symbol.variable].space;
                Some(self.module.intern_type(Type::Pointer {
                    space,
                    base: symbol.ty,
                }))
            }
        }
    }

    fn resolve_type_constructor(
        &mut self,
        expr: Handle<Expression>,
        ty: Handle<Type>,
        values: &[Handle<Expression>],
    ) -> Option<Handle<Type>> {
        let mut value_types = Vec::with_capacity(values.len());
        let mut failed = false;
        for value in values {
            match self.resolve_value(*value) {
                Some(t) => value_types.push(t),
                None => failed = true,
            }
        }
        if failed {
            return None;
        }
        if values.is_empty() {
            return Some(ty);
        }

        let target = self.module.unwrap_alias(ty);
        let ok = match self.module.types[target].clone() {
            Type::Bool | Type::I32 | Type::U32 | Type::F32 => {
                value_types.len() == 1 && self.module.is_scalar(value_types[0])
            }
            Type::Vector { size, component } => {
                let kind = self.module.scalar_kind(component);
                let mut count = 0;
                let mut matches = true;
                for t in &value_types {
                    if self.module.scalar_kind(*t) != kind {
                        matches = false;
                    }
                    count += self.module.vector_size(*t).unwrap_or(1);
                }
                matches && (count == size || (value_types.len() == 1 && count == 1))
            }
            Type::Matrix {
                columns,
                rows,
                component,
            } => {
                let column = self.module.intern_type(Type::Vector {
                    size: rows,
                    component,
                });
                value_types.len() == columns as usize
                    && value_types.iter().all(|t| self.module.same_type(*t, column))
            }
            Type::Array {
                base,
                size: Some(n),
            } => {
                value_types.len() == n as usize
                    && value_types.iter().all(|t| self.module.same_type(*t, base))
            }
            _ => false,
        };
        if !ok {
            let args = value_types
                .iter()
                .map(|t| self.display(*t))
                .collect::<Vec<_>>()
                .join(", ");
            self.error_at(
                expr,
                format!("invalid arguments for {}({}) constructor", self.display(ty), args),
            );
            return None;
        }
        Some(ty)
    }

    fn resolve_binary(
        &mut self,
        expr: Handle<Expression>,
        op: BinaryOp,
        lhs: Handle<Expression>,
        rhs: Handle<Expression>,
    ) -> Option<Handle<Type>> {
        let lhs_ty = self.resolve_value(lhs);
        let rhs_ty = self.resolve_value(rhs);
        let (lhs_ty, rhs_ty) = (lhs_ty?, rhs_ty?);

        let result = self.binary_result(op, lhs_ty, rhs_ty);
        if result.is_none() {
            let message = format!(
                "cannot apply operator '{}' to '{}' and '{}'",
                op,
                self.display(lhs_ty),
                self.display(rhs_ty)
            );
            self.error_at(expr, message);
        }
        result
    }

    /// Operator table. `None` when no overload applies.
    fn binary_result(
        &mut self,
        op: BinaryOp,
        lhs: Handle<Type>,
        rhs: Handle<Type>,
    ) -> Option<Handle<Type>> {
        let m = &*self.module;
        let l = m.unwrap_alias(lhs);
        let r = m.unwrap_alias(rhs);
        let lk = m.scalar_kind(l);
        let rk = m.scalar_kind(r);
        let same = m.same_type(l, r);

        if op.is_logical() {
            return (lk == Some(ScalarKind::Bool) && same && m.is_scalar(l)).then_some(lhs);
        }

        if op.is_bitwise() {
            let kind = lk?;
            let allowed = kind.is_integer() || (kind == ScalarKind::Bool && op != BinaryOp::Xor);
            return (same && allowed).then_some(lhs);
        }

        if op.is_shift() {
            let shape_matches = m.vector_size(l) == m.vector_size(r);
            return (lk?.is_integer() && rk == Some(ScalarKind::Uint) && shape_matches)
                .then_some(lhs);
        }

        if op.is_relational() {
            let kind = lk?;
            let ordered = !matches!(op, BinaryOp::Equal | BinaryOp::NotEqual);
            if !same || (ordered && !kind.is_numeric()) {
                return None;
            }
            let bool_ty = self.module.intern_type(Type::Bool);
            return Some(match self.module.vector_size(l) {
                Some(size) => self.module.intern_type(Type::Vector {
                    size,
                    component: bool_ty,
                }),
                None => bool_ty,
            });
        }

        // arithmetic
        match (m.types[l].clone(), m.types[r].clone()) {
            (
                Type::Matrix {
                    columns,
                    rows,
                    component,
                },
                Type::Vector { size, .. },
            ) if op == BinaryOp::Multiply => {
                (size == columns && m.scalar_kind(component) == rk).then_some(())?;
                Some(self.module.intern_type(Type::Vector {
                    size: rows,
                    component,
                }))
            }
            (
                Type::Vector { size, .. },
                Type::Matrix {
                    columns,
                    rows,
                    component,
                },
            ) if op == BinaryOp::Multiply => {
                (size == rows && m.scalar_kind(component) == lk).then_some(())?;
                Some(self.module.intern_type(Type::Vector {
                    size: columns,
                    component,
                }))
            }
            (
                Type::Matrix {
                    columns: lc,
                    rows: lr,
                    component,
                },
                Type::Matrix {
                    columns: rc,
                    rows: rr,
                    component: rcomp,
                },
            ) => {
                if matches!(op, BinaryOp::Add | BinaryOp::Subtract) {
                    return same.then_some(lhs);
                }
                (op == BinaryOp::Multiply && lc == rr && m.same_type(component, rcomp))
                    .then_some(())?;
                Some(self.module.intern_type(Type::Matrix {
                    columns: rc,
                    rows: lr,
                    component,
                }))
            }
            (Type::Matrix { component, .. }, scalar) | (scalar, Type::Matrix { component, .. })
                if op == BinaryOp::Multiply =>
            {
                let is_matching_scalar = matches!(scalar, Type::F32)
                    && matches!(m.types[component], Type::F32);
                if !is_matching_scalar {
                    return None;
                }
                Some(if matches!(m.types[l], Type::Matrix { .. }) {
                    lhs
                } else {
                    rhs
                })
            }
            _ => {
                let kind = lk?;
                if !kind.is_numeric() || lk != rk {
                    return None;
                }
                if same {
                    Some(lhs)
                } else if m.vector_size(l).is_some() && m.is_scalar(r) {
                    Some(lhs)
                } else if m.is_scalar(l) && m.vector_size(r).is_some() {
                    Some(rhs)
                } else {
                    None
                }
            }
        }
    }

    fn resolve_unary(
        &mut self,
        expr: Handle<Expression>,
        op: UnaryOp,
        operand: Handle<Expression>,
    ) -> Option<Handle<Type>> {
        let ty = self.resolve_value(operand)?;
        let kind = self.module.scalar_kind(ty);
        let ok = match op {
            UnaryOp::Negation => matches!(kind, Some(ScalarKind::Sint | ScalarKind::Float)),
            UnaryOp::Not => kind == Some(ScalarKind::Bool),
            UnaryOp::Complement => kind.is_some_and(ScalarKind::is_integer),
        };
        if !ok {
            let message = format!("cannot apply operator '{}' to '{}'", op, self.display(ty));
            self.error_at(expr, message);
            return None;
        }
        Some(ty)
    }

    fn resolve_call(
        &mut self,
        expr: Handle<Expression>,
        function: Handle<Expression>,
        args: &[Handle<Expression>],
    ) -> Option<Handle<Type>> {
        let Some(segments) = (match &self.module.expressions[function].kind {
            ExpressionKind::Identifier(segments) => Some(segments.clone()),
            _ => None,
        }) else {
            self.error_at(expr, "called object is not a function");
            return None;
        };

        let mut arg_types = Vec::with_capacity(args.len());
        let mut failed = false;
        for arg in args {
            match self.resolve_value(*arg) {
                Some(t) => arg_types.push(t),
                None => failed = true,
            }
        }
        if failed {
            return None;
        }

        if let [namespace @ .., name] = segments.as_slice() {
            if !namespace.is_empty() {
                return self.resolve_imported_call(expr, &namespace.join("::"), name, &arg_types);
            }
        }

        let name = segments.join("::");
        let Some(signature) = self.functions.get(&name).cloned() else {
            self.error_at(expr, format!("unknown function '{}'", name));
            return None;
        };
        let matches = signature.params.len() == arg_types.len()
            && signature
                .params
                .iter()
                .zip(&arg_types)
                .all(|(p, a)| self.module.same_type(*p, *a));
        if !matches {
            let args = arg_types
                .iter()
                .map(|t| self.display(*t))
                .collect::<Vec<_>>()
                .join(", ");
            self.error_at(
                expr,
                format!("no matching call to '{}' with arguments ({})", name, args),
            );
            return None;
        }
        Some(signature.return_type)
    }

    fn resolve_imported_call(
        &mut self,
        expr: Handle<Expression>,
        namespace: &str,
        name: &str,
        arg_types: &[Handle<Type>],
    ) -> Option<Handle<Type>> {
        let path = self
            .module
            .find_import_by_name(namespace)
            .map(|import| import.path.clone());
        let Some(path) = path else {
            self.error_at(expr, format!("unknown import namespace '{}'", namespace));
            return None;
        };
        if path != glsl_std::GLSL_STD_450 {
            self.error_at(expr, format!("unknown import '{}'", path));
            return None;
        }
        let Some(func) = glsl_std::find(name) else {
            self.error_at(
                expr,
                format!("unknown function '{}' in import '{}'", name, namespace),
            );
            return None;
        };

        let first = arg_types.first().copied();
        let valid = arg_types.len() == func.arity
            && first.is_some_and(|first| {
                self.module.scalar_kind(first) == Some(ScalarKind::Float)
                    && arg_types.iter().all(|t| self.module.same_type(*t, first))
                    && (!func.vec3_only || self.module.vector_size(first) == Some(3))
            });
        let Some(first) = first.filter(|_| valid) else {
            self.error_at(
                expr,
                format!("invalid arguments for '{}::{}'", namespace, name),
            );
            return None;
        };

        if func.returns_scalar {
            return Some(self.module.intern_type(Type::F32));
        }
        Some(first)
    }

    fn resolve_array_accessor(
        &mut self,
        expr: Handle<Expression>,
        array: Handle<Expression>,
        index: Handle<Expression>,
    ) -> Option<Handle<Type>> {
        let array_ty = self.resolve_expression(array);
        let index_ty = self.resolve_value(index);
        let (array_ty, index_ty) = (array_ty?, index_ty?);

        let index_ok = self.module.is_scalar(index_ty)
            && self
                .module
                .scalar_kind(index_ty)
                .is_some_and(ScalarKind::is_integer);
        if !index_ok {
            let message = format!("array index must be an integer, found '{}'", self.display(index_ty));
            self.error_at(index, message);
            return None;
        }

        let pointer = match &self.module.types[self.module.unwrap_alias(array_ty)] {
            Type::Pointer { space, base } => Some((*space, *base)),
            _ => None,
        };
        let stored = self.deref(array_ty);
        let element = match self.module.types[self.module.unwrap_alias(stored)].clone() {
            Type::Array { base, .. } => base,
            Type::Vector { component, .. } => component,
            Type::Matrix {
                rows, component, ..
            } => self.module.intern_type(Type::Vector {
                size: rows,
                component,
            }),
            _ => {
                let message = format!("cannot index into value of type '{}'", self.display(stored));
                self.error_at(expr, message);
                return None;
            }
        };

        Some(match pointer {
            Some((space, _)) => self.module.intern_type(Type::Pointer {
                space,
                base: element,
            }),
            None => element,
        })
    }

    fn resolve_member_accessor(
        &mut self,
        expr: Handle<Expression>,
        structure: Handle<Expression>,
        member: &str,
    ) -> Option<Handle<Type>> {
        let ty = self.resolve_expression(structure)?;
        let pointer_space = match &self.module.types[self.module.unwrap_alias(ty)] {
            Type::Pointer { space, .. } => Some(*space),
            _ => None,
        };
        let stored = self.deref(ty);
        let (size, component) = match &self.module.types[self.module.unwrap_alias(stored)] {
            Type::Vector { size, component } => (*size, *component),
            _ => {
                let message = format!(
                    "cannot access member '{}' of type '{}'",
                    member,
                    self.display(stored)
                );
                self.error_at(expr, message);
                return None;
            }
        };

        let indices: Option<Vec<u32>> = member.chars().map(swizzle_index).collect();
        let valid = indices
            .as_ref()
            .is_some_and(|i| !i.is_empty() && i.len() <= 4 && i.iter().all(|i| *i < size));
        if !valid {
            self.error_at(expr, format!("invalid vector swizzle member '{}'", member));
            return None;
        }

        if member.len() == 1 {
            return Some(match pointer_space {
                Some(space) => self.module.intern_type(Type::Pointer {
                    space,
                    base: component,
                }),
                None => component,
            });
        }
        Some(self.module.intern_type(Type::Vector {
            size: member.len() as u32,
            component,
        }))
    }
}
