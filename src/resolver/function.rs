use tracing::trace;

use crate::ast::{AddressSpace, BlockStatement, ExpressionKind, Statement, StatementKind, Type};
use crate::resolver::{Mutability, Resolver, Scope, Symbol};

impl Resolver<'_> {
    pub(crate) fn resolve_function(&mut self, index: usize) {
        let func = self.module.functions[index].clone();
        trace!(name = %func.name, "resolving function");

        self.push_scope();
        for param in &func.params {
            let v = &self.module.variables[*param];
            let symbol = Symbol {
                variable: *param,
                scope: Scope::Function,
                mutability: Mutability::Const,
                ty: v.ty,
            };
            let (name, span) = (v.name.clone(), v.span.clone());
            let duplicate = self
                .scopes
                .last_mut()
                .and_then(|top| top.insert(name.clone(), symbol))
                .is_some();
            if duplicate {
                self.add_error(span, format!("redeclaration of parameter '{}'", name));
            }
        }

        self.return_type = Some(func.return_type);
        self.resolve_statements(&func.body.statements);
        self.return_type = None;
        self.pop_scope();
    }

    pub(crate) fn resolve_block(&mut self, block: &BlockStatement) {
        self.push_scope();
        self.resolve_statements(&block.statements);
        self.pop_scope();
    }

    /// Resolves a statement list in the current scope. Only the first
    /// statement after a terminator is reported as unreachable.
    fn resolve_statements(&mut self, statements: &[Statement]) {
        let mut terminated = false;
        let mut reported = false;
        for stmt in statements {
            if terminated && !reported {
                self.add_rule_diagnostic("unreachable_code", stmt.span.clone(), "code is unreachable");
                reported = true;
            }
            self.resolve_statement(stmt);
            terminated |= stmt.is_terminator();
        }
    }

    pub fn resolve_statement(&mut self, stmt: &Statement) {
        match &stmt.kind {
            StatementKind::VariableDecl(var) => {
                let var = *var;
                let v = self.module.variables[var].clone();
                if !v.is_const {
                    match v.space {
                        AddressSpace::None => {
                            self.module.variables[var].space = AddressSpace::Function
                        }
                        AddressSpace::Function => {}
                        space => self.add_error(
                            v.span.clone(),
                            format!(
                                "function-scope variable '{}' cannot be in the '{}' address space",
                                v.name, space
                            ),
                        ),
                    }
                }
                let v = self.module.variables[var].clone();
                self.resolve_initializer(&v);
                self.declare(var, Scope::Function);
            }
            StatementKind::Block(block) => self.resolve_block(block),
            StatementKind::Discard => {}
            StatementKind::Assign { lhs, rhs } => {
                let rhs_ty = self.resolve_value(*rhs);
                if matches!(self.module.expressions[*lhs].kind, ExpressionKind::Phony) {
                    return;
                }
                let lhs_ty = self.resolve_expression(*lhs);
                let (Some(lhs_ty), Some(rhs_ty)) = (lhs_ty, rhs_ty) else {
                    return;
                };
                if !self.module.is_pointer(lhs_ty) {
                    let message = format!(
                        "cannot assign to value of type '{}'",
                        self.module.type_display(lhs_ty)
                    );
                    let span = self.module.expressions[*lhs].span.clone();
                    self.add_error(span, message);
                    return;
                }
                let store_ty = self.deref(lhs_ty);
                if !self.module.same_type(store_ty, rhs_ty) {
                    let message = format!(
                        "cannot assign '{}' to '{}'",
                        self.module.type_display(rhs_ty),
                        self.module.type_display(store_ty)
                    );
                    self.add_error(stmt.span.clone(), message);
                }
            }
            StatementKind::If {
                condition,
                accept,
                reject,
            } => {
                if let Some(ty) = self.resolve_value(*condition) {
                    let is_bool = matches!(
                        self.module.types[self.module.unwrap_alias(ty)],
                        Type::Bool
                    );
                    if !is_bool {
                        let message = format!(
                            "if statement condition must be bool, got '{}'",
                            self.module.type_display(ty)
                        );
                        let span = self.module.expressions[*condition].span.clone();
                        self.add_error(span, message);
                    }
                }
                self.resolve_block(accept);
                if let Some(reject) = reject {
                    self.resolve_block(reject);
                }
            }
            StatementKind::Loop { body, continuing } => {
                self.loop_depth += 1;
                let outer = std::mem::replace(&mut self.in_continuing, false);
                self.push_scope();
                self.resolve_statements(&body.statements);
                if let Some(continuing) = continuing {
                    self.in_continuing = true;
                    self.resolve_block(continuing);
                }
                self.pop_scope();
                self.in_continuing = outer;
                self.loop_depth -= 1;
            }
            StatementKind::Break => {
                if self.loop_depth == 0 {
                    self.add_error(stmt.span.clone(), "break statement must be in a loop");
                }
            }
            StatementKind::Continue => {
                if self.loop_depth == 0 {
                    self.add_error(stmt.span.clone(), "continue statement must be in a loop");
                } else if self.in_continuing {
                    self.add_error(
                        stmt.span.clone(),
                        "continue statement must not be in a continuing block",
                    );
                }
            }
            StatementKind::Return(value) => {
                let value_ty = match value {
                    Some(value) => match self.resolve_value(*value) {
                        Some(ty) => ty,
                        None => return,
                    },
                    None => self.module.intern_type(Type::Void),
                };
                let Some(expected) = self.return_type else {
                    self.add_error(stmt.span.clone(), "return statement outside of a function");
                    return;
                };
                if !self.module.same_type(value_ty, expected) {
                    let message = format!(
                        "return statement type must match its function return type, returned '{}', expected '{}'",
                        self.module.type_display(value_ty),
                        self.module.type_display(expected)
                    );
                    self.add_error(stmt.span.clone(), message);
                }
            }
            StatementKind::Call(call) => {
                self.resolve_expression(*call);
            }
        }
    }
}
