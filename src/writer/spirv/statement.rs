use tracing::trace;

use crate::arena::Handle;
use crate::ast::{self, BlockStatement, ExpressionKind, Statement, StatementKind};

use super::builder::{Builder, NONE};
use super::function::Function;
use super::instruction::{Instruction, Op, Operand};

impl Builder<'_> {
    pub fn generate_function(&mut self, func: &ast::Function) -> bool {
        trace!(name = %func.name, "generating function");
        let module = self.module;

        let Some(ret) = self.generate_type(func.return_type) else {
            return false;
        };
        let mut param_types = vec![];
        for param in &func.params {
            let Some(ty) = self.generate_type(module.variables[*param].ty) else {
                return false;
            };
            param_types.push(ty);
        }
        let func_type = self.generate_function_type(ret, &param_types);
        let id = self.function_id(&func.name);
        self.push_debug_name(id, &func.name);

        let mut params = vec![];
        let mut bindings = vec![];
        for (param, ty) in func.params.iter().zip(&param_types) {
            let v = &module.variables[*param];
            let param_id = self.next_id();
            self.push_debug_name(param_id, &v.name);
            params.push(Instruction::typed(Op::FunctionParameter, *ty, param_id, vec![]));
            bindings.push((v.name.as_str(), param_id));
        }

        let label = self.next_id();
        let declaration = Instruction::typed(
            Op::Function,
            ret,
            id,
            vec![NONE, Operand::Id(func_type)],
        );
        self.push_function(Function::new(
            declaration,
            Instruction::with_result(Op::Label, label, vec![]),
            params,
        ));

        self.push_scope();
        for (name, param_id) in bindings {
            self.bind(name, param_id);
        }
        let ok = self.generate_statements(&func.body.statements);
        if !self.current_block_terminated() {
            let is_void = matches!(
                module.types.get(module.unwrap_alias(func.return_type)),
                Some(ast::Type::Void)
            );
            let end = if is_void { Op::Return } else { Op::Unreachable };
            self.push_inst(Instruction::new(end, vec![]));
        }
        self.pop_scope();
        self.loops.clear();
        ok
    }

    fn current_block_terminated(&self) -> bool {
        self.functions.last().is_some_and(Function::is_terminated)
    }

    fn push_label(&mut self, id: u32) -> Option<()> {
        self.push_inst(Instruction::with_result(Op::Label, id, vec![]))
    }

    fn push_branch(&mut self, target: u32) -> Option<()> {
        self.push_inst(Instruction::new(Op::Branch, vec![Operand::Id(target)]))
    }

    /// Generates statements until one ends the current block; anything after
    /// that is unreachable and dropped.
    pub fn generate_statements(&mut self, statements: &[Statement]) -> bool {
        let mut ok = true;
        for stmt in statements {
            if self.current_block_terminated() {
                break;
            }
            ok &= self.generate_statement(stmt);
        }
        ok
    }

    fn generate_block(&mut self, block: &BlockStatement) -> bool {
        self.push_scope();
        let ok = self.generate_statements(&block.statements);
        self.pop_scope();
        ok
    }

    pub fn generate_statement(&mut self, stmt: &Statement) -> bool {
        let module = self.module;
        match &stmt.kind {
            StatementKind::VariableDecl(var) => {
                let v = &module.variables[*var];
                if !v.is_const {
                    return self.generate_function_variable(*var);
                }
                let Some(init) = v.initializer else {
                    self.add_error(
                        v.span.clone(),
                        format!("constant '{}' requires an initializer", v.name),
                    );
                    return false;
                };
                let Some(id) = self.generate_expression(init) else {
                    return false;
                };
                self.bind(&v.name, id);
                true
            }
            StatementKind::Block(block) => self.generate_block(block),
            StatementKind::Discard => self.push_inst(Instruction::new(Op::Kill, vec![])).is_some(),
            StatementKind::Assign { lhs, rhs } => self.generate_assign(*lhs, *rhs).is_some(),
            StatementKind::If {
                condition,
                accept,
                reject,
            } => self
                .generate_if(*condition, accept, reject.as_ref())
                .is_some(),
            StatementKind::Loop { body, continuing } => {
                self.generate_loop(body, continuing.as_ref()).is_some()
            }
            StatementKind::Break => match self.loops.last().copied() {
                Some((merge, _)) => self.push_branch(merge).is_some(),
                None => {
                    self.add_error(stmt.span.clone(), "break statement outside of a loop");
                    false
                }
            },
            StatementKind::Continue => match self.loops.last().copied() {
                Some((_, continuing)) => self.push_branch(continuing).is_some(),
                None => {
                    self.add_error(stmt.span.clone(), "continue statement outside of a loop");
                    false
                }
            },
            StatementKind::Return(value) => {
                let inst = match value {
                    Some(value) => {
                        let Some(id) = self.generate_expression(*value) else {
                            return false;
                        };
                        Instruction::new(Op::ReturnValue, vec![Operand::Id(id)])
                    }
                    None => Instruction::new(Op::Return, vec![]),
                };
                self.push_inst(inst).is_some()
            }
            StatementKind::Call(call) => self.generate_expression(*call).is_some(),
        }
    }

    fn generate_assign(
        &mut self,
        lhs: Handle<ast::Expression>,
        rhs: Handle<ast::Expression>,
    ) -> Option<()> {
        let value = self.generate_expression(rhs)?;
        if matches!(self.module.expressions[lhs].kind, ExpressionKind::Phony) {
            return Some(());
        }
        let pointer = self.generate_reference(lhs)?;
        self.push_inst(Instruction::new(
            Op::Store,
            vec![Operand::Id(pointer), Operand::Id(value)],
        ))
    }

    fn generate_if(
        &mut self,
        condition: Handle<ast::Expression>,
        accept: &BlockStatement,
        reject: Option<&BlockStatement>,
    ) -> Option<()> {
        let cond = self.generate_expression(condition)?;
        let merge = self.next_id();
        let accept_label = self.next_id();
        let reject_label = match reject {
            Some(_) => self.next_id(),
            None => merge,
        };

        self.push_inst(Instruction::new(
            Op::SelectionMerge,
            vec![Operand::Id(merge), NONE],
        ))?;
        self.push_inst(Instruction::new(
            Op::BranchConditional,
            vec![
                Operand::Id(cond),
                Operand::Id(accept_label),
                Operand::Id(reject_label),
            ],
        ))?;

        self.push_label(accept_label)?;
        let mut ok = self.generate_block(accept);
        if !self.current_block_terminated() {
            self.push_branch(merge)?;
        }
        if let Some(reject) = reject {
            self.push_label(reject_label)?;
            ok &= self.generate_block(reject);
            if !self.current_block_terminated() {
                self.push_branch(merge)?;
            }
        }
        self.push_label(merge)?;
        ok.then_some(())
    }

    fn generate_loop(
        &mut self,
        body: &BlockStatement,
        continuing: Option<&BlockStatement>,
    ) -> Option<()> {
        let header = self.next_id();
        self.push_branch(header)?;
        self.push_label(header)?;

        let merge = self.next_id();
        let continue_target = self.next_id();
        let body_label = self.next_id();
        self.push_inst(Instruction::new(
            Op::LoopMerge,
            vec![Operand::Id(merge), Operand::Id(continue_target), NONE],
        ))?;
        self.push_branch(body_label)?;
        self.push_label(body_label)?;

        // body and continuing share one scope
        self.loops.push((merge, continue_target));
        self.push_scope();
        let mut ok = self.generate_statements(&body.statements);
        if !self.current_block_terminated() {
            self.push_branch(continue_target)?;
        }
        self.push_label(continue_target)?;
        if let Some(continuing) = continuing {
            ok &= self.generate_statements(&continuing.statements);
        }
        if !self.current_block_terminated() {
            self.push_branch(header)?;
        }
        self.pop_scope();
        self.loops.pop();

        self.push_label(merge)?;
        ok.then_some(())
    }
}
