use crate::arena::Handle;
use crate::ast::{
    AddressSpace, BinaryOp, Expression, ExpressionKind, Literal, ScalarKind, Type, UnaryOp,
};
use crate::glsl_std;
use crate::resolver::expression::swizzle_index;

use super::builder::Builder;
use super::instruction::{Instruction, Op, Operand};

fn binary_opcode(op: BinaryOp, kind: ScalarKind) -> Option<Op> {
    use ScalarKind::*;
    Some(match (op, kind) {
        (BinaryOp::Add, Float) => Op::FAdd,
        (BinaryOp::Add, Sint | Uint) => Op::IAdd,
        (BinaryOp::Subtract, Float) => Op::FSub,
        (BinaryOp::Subtract, Sint | Uint) => Op::ISub,
        (BinaryOp::Multiply, Float) => Op::FMul,
        (BinaryOp::Multiply, Sint | Uint) => Op::IMul,
        (BinaryOp::Divide, Float) => Op::FDiv,
        (BinaryOp::Divide, Sint) => Op::SDiv,
        (BinaryOp::Divide, Uint) => Op::UDiv,
        (BinaryOp::Modulo, Float) => Op::FMod,
        (BinaryOp::Modulo, Sint) => Op::SMod,
        (BinaryOp::Modulo, Uint) => Op::UMod,
        (BinaryOp::And, Bool) | (BinaryOp::LogicalAnd, Bool) => Op::LogicalAnd,
        (BinaryOp::Or, Bool) | (BinaryOp::LogicalOr, Bool) => Op::LogicalOr,
        (BinaryOp::And, Sint | Uint) => Op::BitwiseAnd,
        (BinaryOp::Or, Sint | Uint) => Op::BitwiseOr,
        (BinaryOp::Xor, Sint | Uint) => Op::BitwiseXor,
        (BinaryOp::Equal, Bool) => Op::LogicalEqual,
        (BinaryOp::Equal, Sint | Uint) => Op::IEqual,
        (BinaryOp::Equal, Float) => Op::FOrdEqual,
        (BinaryOp::NotEqual, Bool) => Op::LogicalNotEqual,
        (BinaryOp::NotEqual, Sint | Uint) => Op::INotEqual,
        (BinaryOp::NotEqual, Float) => Op::FOrdNotEqual,
        (BinaryOp::LessThan, Sint) => Op::SLessThan,
        (BinaryOp::LessThan, Uint) => Op::ULessThan,
        (BinaryOp::LessThan, Float) => Op::FOrdLessThan,
        (BinaryOp::GreaterThan, Sint) => Op::SGreaterThan,
        (BinaryOp::GreaterThan, Uint) => Op::UGreaterThan,
        (BinaryOp::GreaterThan, Float) => Op::FOrdGreaterThan,
        (BinaryOp::LessThanEqual, Sint) => Op::SLessThanEqual,
        (BinaryOp::LessThanEqual, Uint) => Op::ULessThanEqual,
        (BinaryOp::LessThanEqual, Float) => Op::FOrdLessThanEqual,
        (BinaryOp::GreaterThanEqual, Sint) => Op::SGreaterThanEqual,
        (BinaryOp::GreaterThanEqual, Uint) => Op::UGreaterThanEqual,
        (BinaryOp::GreaterThanEqual, Float) => Op::FOrdGreaterThanEqual,
        (BinaryOp::ShiftLeft, Sint | Uint) => Op::ShiftLeftLogical,
        (BinaryOp::ShiftRight, Sint) => Op::ShiftRightArithmetic,
        (BinaryOp::ShiftRight, Uint) => Op::ShiftRightLogical,
        _ => return None,
    })
}

impl Builder<'_> {
    /// Type the resolver attached to `expr`.
    fn expression_type(&mut self, expr: Handle<Expression>) -> Option<Handle<Type>> {
        let module = self.module;
        let e = &module.expressions[expr];
        if e.result_type.is_none() {
            let span = e.span.clone();
            self.add_error(
                span,
                format!("missing type for {} expression", e.kind_name()),
            );
        }
        e.result_type
    }

    /// Generates `expr` as a value, loading through pointers.
    pub fn generate_expression(&mut self, expr: Handle<Expression>) -> Option<u32> {
        let id = self.generate_reference(expr)?;
        let ty = self.expression_type(expr)?;
        if self.module.is_pointer(ty) {
            return self.generate_load(ty, id);
        }
        Some(id)
    }

    /// Generates `expr` without loading through a pointer result, so
    /// variables yield their storage id.
    pub fn generate_reference(&mut self, expr: Handle<Expression>) -> Option<u32> {
        let module = self.module;
        let e = &module.expressions[expr];
        match &e.kind {
            ExpressionKind::Identifier(_) => self.generate_identifier_expression(expr),
            ExpressionKind::ScalarConstructor(literal) => Some(self.generate_literal(literal)),
            ExpressionKind::TypeConstructor { .. } => self.generate_constructor_expression(expr),
            ExpressionKind::Binary { .. } => self.generate_binary_expression(expr),
            ExpressionKind::Unary { .. } => self.generate_unary_expression(expr),
            ExpressionKind::Call { .. } => self.generate_call_expression(expr),
            ExpressionKind::ArrayAccessor { .. } => self.generate_array_accessor(expr),
            ExpressionKind::MemberAccessor { .. } => self.generate_member_accessor(expr),
            ExpressionKind::Phony => {
                self.add_error(e.span.clone(), "unexpected phony expression");
                None
            }
        }
    }

    /// Id bound to an identifier: the storage id of a variable or the value
    /// id of a constant. Never loads.
    pub fn generate_identifier_expression(&mut self, expr: Handle<Expression>) -> Option<u32> {
        let module = self.module;
        let e = &module.expressions[expr];
        let name = e.identifier_name().unwrap_or_default();
        match self.lookup(&name) {
            Some(id) => match self.block_variables.get(&id).copied() {
                Some((space, ty)) => self.generate_block_member(id, space, ty),
                None => Some(id),
            },
            None => {
                let span = e.span.clone();
                self.add_error(
                    span,
                    format!("unable to find variable with identifier '{}'", name),
                );
                None
            }
        }
    }

    /// Pointer to the only member of the buffer block `block`.
    fn generate_block_member(
        &mut self,
        block: u32,
        space: AddressSpace,
        ty: Handle<Type>,
    ) -> Option<u32> {
        let ptr = self.generate_pointer_type(space, ty)?;
        let zero = self.generate_literal(&Literal::Uint(0));
        let id = self.next_id();
        self.push_inst(Instruction::typed(
            Op::AccessChain,
            ptr,
            id,
            vec![Operand::Id(block), Operand::Id(zero)],
        ))?;
        Some(id)
    }

    /// Loads the value behind `pointer`, whose type is `ptr_ty`.
    pub fn generate_load(&mut self, ptr_ty: Handle<Type>, pointer: u32) -> Option<u32> {
        let value_ty = self.module.unwrap_ptr(ptr_ty);
        let ty = self.generate_type(value_ty)?;
        let id = self.next_id();
        self.push_inst(Instruction::typed(
            Op::Load,
            ty,
            id,
            vec![Operand::Id(pointer)],
        ))?;
        Some(id)
    }

    /// Replicates a scalar into a vector of type `vector_ty`.
    fn generate_splat(&mut self, vector_ty: u32, size: u32, scalar: u32) -> Option<u32> {
        let id = self.next_id();
        self.push_inst(Instruction::typed(
            Op::CompositeConstruct,
            vector_ty,
            id,
            vec![Operand::Id(scalar); size as usize],
        ))?;
        Some(id)
    }

    pub fn generate_binary_expression(&mut self, expr: Handle<Expression>) -> Option<u32> {
        let module = self.module;
        let e = &module.expressions[expr];
        let ExpressionKind::Binary { op, lhs, rhs } = e.kind else {
            return None;
        };

        let mut lhs_id = self.generate_expression(lhs)?;
        let mut rhs_id = self.generate_expression(rhs)?;
        let lhs_ty = module.unwrap_ptr(self.expression_type(lhs)?);
        let rhs_ty = module.unwrap_ptr(self.expression_type(rhs)?);
        let result_ty = self.expression_type(expr)?;
        let ty = self.generate_type(result_ty)?;

        let is_matrix = |t: Handle<Type>| matches!(module.types[t], Type::Matrix { .. });
        let kind = module.scalar_kind(lhs_ty).or_else(|| {
            // matrices carry the kind of their component
            match module.types[lhs_ty] {
                Type::Matrix { component, .. } => module.scalar_kind(component),
                _ => None,
            }
        });
        let lhs_size = module.vector_size(lhs_ty);
        let rhs_size = module.vector_size(rhs_ty);

        let opcode = if op == BinaryOp::Multiply && (is_matrix(lhs_ty) || is_matrix(rhs_ty)) {
            match (is_matrix(lhs_ty), is_matrix(rhs_ty)) {
                (true, true) => Op::MatrixTimesMatrix,
                (true, false) if rhs_size.is_some() => Op::MatrixTimesVector,
                (false, true) if lhs_size.is_some() => Op::VectorTimesMatrix,
                (true, false) => Op::MatrixTimesScalar,
                (false, _) => {
                    std::mem::swap(&mut lhs_id, &mut rhs_id);
                    Op::MatrixTimesScalar
                }
            }
        } else if op == BinaryOp::Multiply
            && kind == Some(ScalarKind::Float)
            && lhs_size.is_some() != rhs_size.is_some()
        {
            if lhs_size.is_none() {
                std::mem::swap(&mut lhs_id, &mut rhs_id);
            }
            Op::VectorTimesScalar
        } else {
            // mixed vector and scalar operands: widen the scalar
            match (lhs_size, rhs_size) {
                (Some(size), None) => rhs_id = self.generate_splat(ty, size, rhs_id)?,
                (None, Some(size)) => lhs_id = self.generate_splat(ty, size, lhs_id)?,
                _ => {}
            }
            match kind.and_then(|kind| binary_opcode(op, kind)) {
                Some(opcode) => opcode,
                None => {
                    self.add_error(
                        e.span.clone(),
                        format!("unable to generate binary operator '{}'", op),
                    );
                    return None;
                }
            }
        };

        let id = self.next_id();
        self.push_inst(Instruction::typed(
            opcode,
            ty,
            id,
            vec![Operand::Id(lhs_id), Operand::Id(rhs_id)],
        ))?;
        Some(id)
    }

    pub fn generate_unary_expression(&mut self, expr: Handle<Expression>) -> Option<u32> {
        let module = self.module;
        let e = &module.expressions[expr];
        let ExpressionKind::Unary { op, expr: operand } = e.kind else {
            return None;
        };
        let value = self.generate_expression(operand)?;
        let result_ty = self.expression_type(expr)?;
        let ty = self.generate_type(result_ty)?;
        let opcode = match (op, module.scalar_kind(result_ty)) {
            (UnaryOp::Negation, Some(ScalarKind::Float)) => Op::FNegate,
            (UnaryOp::Negation, _) => Op::SNegate,
            (UnaryOp::Not, _) => Op::LogicalNot,
            (UnaryOp::Complement, _) => Op::Not,
        };
        let id = self.next_id();
        self.push_inst(Instruction::typed(opcode, ty, id, vec![Operand::Id(value)]))?;
        Some(id)
    }

    pub fn generate_constructor_expression(&mut self, expr: Handle<Expression>) -> Option<u32> {
        if self.is_constant_expression(expr) {
            return self.generate_constant_expression(expr);
        }
        let module = self.module;
        let e = &module.expressions[expr];
        let ExpressionKind::TypeConstructor { ty, values } = &e.kind else {
            return None;
        };
        let target = module.unwrap_alias(*ty);
        if values.is_empty() {
            return self.generate_null(*ty);
        }

        let mut ids = vec![];
        for value in values {
            ids.push(self.generate_expression(*value)?);
        }
        let type_id = self.generate_type(*ty)?;

        if module.is_scalar(target) {
            let from_ty = module.unwrap_ptr(self.expression_type(values[0])?);
            let from = module.scalar_kind(from_ty)?;
            let to = module.scalar_kind(target)?;
            return self.generate_conversion(from, to, type_id, ids[0]);
        }

        if let Type::Vector { size, .. } = module.types[target] {
            let first_ty = module.unwrap_ptr(self.expression_type(values[0])?);
            if ids.len() == 1 && module.is_scalar(first_ty) {
                return self.generate_splat(type_id, size, ids[0]);
            }
        }

        let id = self.next_id();
        self.push_inst(Instruction::typed(
            Op::CompositeConstruct,
            type_id,
            id,
            ids.into_iter().map(Operand::Id).collect(),
        ))?;
        Some(id)
    }

    /// Converts a scalar `value` between scalar kinds.
    fn generate_conversion(
        &mut self,
        from: ScalarKind,
        to: ScalarKind,
        type_id: u32,
        value: u32,
    ) -> Option<u32> {
        use ScalarKind::*;
        let operands = match (from, to) {
            _ if from == to => return Some(value),
            (Bool, _) => {
                let (one, zero) = match to {
                    Sint => (Literal::Sint(1), Literal::Sint(0)),
                    Uint => (Literal::Uint(1), Literal::Uint(0)),
                    _ => (Literal::Float(1.0), Literal::Float(0.0)),
                };
                let one = self.generate_literal(&one);
                let zero = self.generate_literal(&zero);
                let id = self.next_id();
                self.push_inst(Instruction::typed(
                    Op::Select,
                    type_id,
                    id,
                    vec![Operand::Id(value), Operand::Id(one), Operand::Id(zero)],
                ))?;
                return Some(id);
            }
            (_, Bool) => {
                let (opcode, zero) = match from {
                    Float => (Op::FOrdNotEqual, Literal::Float(0.0)),
                    Uint => (Op::INotEqual, Literal::Uint(0)),
                    _ => (Op::INotEqual, Literal::Sint(0)),
                };
                let zero = self.generate_literal(&zero);
                (opcode, vec![Operand::Id(value), Operand::Id(zero)])
            }
            (Sint, Float) => (Op::ConvertSToF, vec![Operand::Id(value)]),
            (Uint, Float) => (Op::ConvertUToF, vec![Operand::Id(value)]),
            (Float, Sint) => (Op::ConvertFToS, vec![Operand::Id(value)]),
            (Float, Uint) => (Op::ConvertFToU, vec![Operand::Id(value)]),
            _ => (Op::Bitcast, vec![Operand::Id(value)]),
        };
        let id = self.next_id();
        self.push_inst(Instruction::typed(operands.0, type_id, id, operands.1))?;
        Some(id)
    }

    pub fn generate_call_expression(&mut self, expr: Handle<Expression>) -> Option<u32> {
        let module = self.module;
        let e = &module.expressions[expr];
        let ExpressionKind::Call { function, args } = &e.kind else {
            return None;
        };
        let ExpressionKind::Identifier(segments) = &module.expressions[*function].kind else {
            self.add_error(e.span.clone(), "called object is not a function");
            return None;
        };

        let mut arg_ids = vec![];
        for arg in args {
            arg_ids.push(Operand::Id(self.generate_expression(*arg)?));
        }
        let result_ty = self.expression_type(expr)?;
        let ty = self.generate_type(result_ty)?;

        let mut operands = vec![];
        let opcode = match segments.as_slice() {
            [namespace @ .., name] if !namespace.is_empty() => {
                let namespace = namespace.join("::");
                let set = self.import_ids.get(&namespace).copied();
                let (Some(set), Some(func)) = (set, glsl_std::find(name)) else {
                    self.add_error(
                        e.span.clone(),
                        format!("unable to find imported function '{}::{}'", namespace, name),
                    );
                    return None;
                };
                operands.push(Operand::Id(set));
                operands.push(Operand::Int(func.id));
                Op::ExtInst
            }
            _ => {
                let name = segments.join("::");
                operands.push(Operand::Id(self.function_id(&name)));
                Op::FunctionCall
            }
        };
        operands.extend(arg_ids);

        let id = self.next_id();
        self.push_inst(Instruction::typed(opcode, ty, id, operands))?;
        Some(id)
    }

    pub fn generate_array_accessor(&mut self, expr: Handle<Expression>) -> Option<u32> {
        let module = self.module;
        let e = &module.expressions[expr];
        let ExpressionKind::ArrayAccessor { array, index } = e.kind else {
            return None;
        };
        let array_ty = self.expression_type(array)?;

        if module.is_pointer(array_ty) {
            let base = self.generate_reference(array)?;
            let index = self.generate_expression(index)?;
            let result_ty = self.expression_type(expr)?;
            let ty = self.generate_type(result_ty)?;
            let id = self.next_id();
            self.push_inst(Instruction::typed(
                Op::AccessChain,
                ty,
                id,
                vec![Operand::Id(base), Operand::Id(index)],
            ))?;
            return Some(id);
        }

        let base = self.generate_expression(array)?;
        let result_ty = self.expression_type(expr)?;
        let ty = self.generate_type(result_ty)?;
        let constant_index = match &module.expressions[index].kind {
            ExpressionKind::ScalarConstructor(Literal::Sint(v)) => Some(*v as u32),
            ExpressionKind::ScalarConstructor(Literal::Uint(v)) => Some(*v),
            _ => None,
        };
        let (opcode, operands) = match constant_index {
            Some(i) => (
                Op::CompositeExtract,
                vec![Operand::Id(base), Operand::Int(i)],
            ),
            None if module.vector_size(array_ty).is_some() => {
                let index = self.generate_expression(index)?;
                (
                    Op::VectorExtractDynamic,
                    vec![Operand::Id(base), Operand::Id(index)],
                )
            }
            None => {
                self.add_error(
                    e.span.clone(),
                    "dynamic index into a non-pointer array is not supported",
                );
                return None;
            }
        };
        let id = self.next_id();
        self.push_inst(Instruction::typed(opcode, ty, id, operands))?;
        Some(id)
    }

    pub fn generate_member_accessor(&mut self, expr: Handle<Expression>) -> Option<u32> {
        let module = self.module;
        let e = &module.expressions[expr];
        let ExpressionKind::MemberAccessor { structure, member } = &e.kind else {
            return None;
        };
        let indices: Vec<u32> = member.chars().filter_map(swizzle_index).collect();
        let structure_ty = self.expression_type(*structure)?;
        let result_ty = self.expression_type(expr)?;

        if let [index] = indices.as_slice() {
            if module.is_pointer(structure_ty) {
                let base = self.generate_reference(*structure)?;
                let index = self.generate_literal(&Literal::Uint(*index));
                let ty = self.generate_type(result_ty)?;
                let id = self.next_id();
                self.push_inst(Instruction::typed(
                    Op::AccessChain,
                    ty,
                    id,
                    vec![Operand::Id(base), Operand::Id(index)],
                ))?;
                return Some(id);
            }
            let base = self.generate_expression(*structure)?;
            let ty = self.generate_type(result_ty)?;
            let id = self.next_id();
            self.push_inst(Instruction::typed(
                Op::CompositeExtract,
                ty,
                id,
                vec![Operand::Id(base), Operand::Int(*index)],
            ))?;
            return Some(id);
        }

        let base = self.generate_expression(*structure)?;
        let ty = self.generate_type(result_ty)?;
        let mut operands = vec![Operand::Id(base), Operand::Id(base)];
        operands.extend(indices.into_iter().map(Operand::Int));
        let id = self.next_id();
        self.push_inst(Instruction::typed(Op::VectorShuffle, ty, id, operands))?;
        Some(id)
    }
}
