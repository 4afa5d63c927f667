//! Debug rendering of the AST. Spans are never printed, so a module and its
//! clone render identically.

use std::fmt::Write;

use crate::arena::Handle;

use super::{
    BlockStatement, Expression, ExpressionKind, Function, Module, Statement, StatementKind, Type,
    Variable,
};

struct Dumper<'a> {
    module: &'a Module,
    out: String,
}

impl Dumper<'_> {
    fn line(&mut self, indent: usize, text: &str) {
        let _ = writeln!(self.out, "{:indent$}{}", "", text, indent = indent);
    }

    fn result_type_str(&self, expr: &Expression) -> String {
        match expr.result_type {
            Some(ty) => self.module.type_name(ty),
            None => "not set".to_string(),
        }
    }

    fn expression(&mut self, handle: Handle<Expression>, indent: usize) {
        let Some(expr) = self.module.expressions.get(handle) else {
            self.line(indent, "<invalid expression>");
            return;
        };
        let ty = self.result_type_str(expr);
        match &expr.kind {
            ExpressionKind::Identifier(segments) => {
                self.line(indent, &format!("Identifier[{}]{{{}}}", ty, segments.join("::")))
            }
            ExpressionKind::ScalarConstructor(literal) => self.line(
                indent,
                &format!("ScalarConstructor[{}]{{{}}}", ty, literal.to_str()),
            ),
            ExpressionKind::TypeConstructor { ty: target, values } => {
                self.line(indent, &format!("TypeConstructor[{}]{{", ty));
                let name = self.module.type_name(*target);
                self.line(indent + 2, &name);
                for value in values {
                    self.expression(*value, indent + 2);
                }
                self.line(indent, "}");
            }
            ExpressionKind::Binary { op, lhs, rhs } => {
                self.line(indent, &format!("Binary[{}]{{", ty));
                self.expression(*lhs, indent + 2);
                self.line(indent + 2, op.name());
                self.expression(*rhs, indent + 2);
                self.line(indent, "}");
            }
            ExpressionKind::Unary { op, expr } => {
                self.line(indent, &format!("Unary[{}]{{", ty));
                self.line(indent + 2, op.name());
                self.expression(*expr, indent + 2);
                self.line(indent, "}");
            }
            ExpressionKind::Call { function, args } => {
                self.line(indent, &format!("Call[{}]{{", ty));
                self.expression(*function, indent + 2);
                self.line(indent + 2, "(");
                for arg in args {
                    self.expression(*arg, indent + 4);
                }
                self.line(indent + 2, ")");
                self.line(indent, "}");
            }
            ExpressionKind::ArrayAccessor { array, index } => {
                self.line(indent, &format!("ArrayAccessor[{}]{{", ty));
                self.expression(*array, indent + 2);
                self.expression(*index, indent + 2);
                self.line(indent, "}");
            }
            ExpressionKind::MemberAccessor { structure, member } => {
                self.line(indent, &format!("MemberAccessor[{}]{{", ty));
                self.expression(*structure, indent + 2);
                self.line(indent + 2, member);
                self.line(indent, "}");
            }
            ExpressionKind::Phony => self.line(indent, &format!("Phony[{}]{{}}", ty)),
        }
    }

    fn variable(&mut self, handle: Handle<Variable>, indent: usize) {
        let Some(var) = self.module.variables.get(handle) else {
            self.line(indent, "<invalid variable>");
            return;
        };
        self.line(
            indent,
            if var.is_const { "Const{" } else { "Variable{" },
        );
        self.line(indent + 2, &var.name);
        self.line(indent + 2, var.space.as_str());
        let ty = self.module.type_name(var.ty);
        self.line(indent + 2, &ty);
        if !var.decorations.is_empty() {
            self.line(indent + 2, "Decorations{");
            for decoration in &var.decorations {
                self.line(indent + 4, &decoration.to_str());
            }
            self.line(indent + 2, "}");
        }
        if let Some(init) = var.initializer {
            self.line(indent + 2, "{");
            self.expression(init, indent + 4);
            self.line(indent + 2, "}");
        }
        self.line(indent, "}");
    }

    fn block(&mut self, block: &BlockStatement, indent: usize) {
        self.line(indent, "{");
        for stmt in &block.statements {
            self.statement(stmt, indent + 2);
        }
        self.line(indent, "}");
    }

    fn statement(&mut self, stmt: &Statement, indent: usize) {
        match &stmt.kind {
            StatementKind::VariableDecl(var) => {
                self.line(indent, "VariableDeclStatement{");
                self.variable(*var, indent + 2);
                self.line(indent, "}");
            }
            StatementKind::Block(block) => {
                self.line(indent, "Block{");
                for s in &block.statements {
                    self.statement(s, indent + 2);
                }
                self.line(indent, "}");
            }
            StatementKind::Discard => self.line(indent, "Discard{}"),
            StatementKind::Break => self.line(indent, "Break{}"),
            StatementKind::Continue => self.line(indent, "Continue{}"),
            StatementKind::Assign { lhs, rhs } => {
                self.line(indent, "Assignment{");
                self.expression(*lhs, indent + 2);
                self.expression(*rhs, indent + 2);
                self.line(indent, "}");
            }
            StatementKind::If {
                condition,
                accept,
                reject,
            } => {
                self.line(indent, "If{");
                self.line(indent + 2, "(");
                self.expression(*condition, indent + 4);
                self.line(indent + 2, ")");
                self.block(accept, indent + 2);
                if let Some(reject) = reject {
                    self.line(indent + 2, "Else{");
                    self.block(reject, indent + 4);
                    self.line(indent + 2, "}");
                }
                self.line(indent, "}");
            }
            StatementKind::Loop { body, continuing } => {
                self.line(indent, "Loop{");
                self.block(body, indent + 2);
                if let Some(continuing) = continuing {
                    self.line(indent + 2, "Continuing{");
                    self.block(continuing, indent + 4);
                    self.line(indent + 2, "}");
                }
                self.line(indent, "}");
            }
            StatementKind::Return(value) => match value {
                Some(value) => {
                    self.line(indent, "Return{");
                    self.expression(*value, indent + 2);
                    self.line(indent, "}");
                }
                None => self.line(indent, "Return{}"),
            },
            StatementKind::Call(call) => {
                self.line(indent, "CallStatement{");
                self.expression(*call, indent + 2);
                self.line(indent, "}");
            }
        }
    }

    fn function(&mut self, func: &Function, indent: usize) {
        let ret = self.module.type_name(func.return_type);
        self.line(indent, &format!("Function {} -> {}", func.name, ret));
        self.line(indent, "(");
        for param in &func.params {
            self.variable(*param, indent + 2);
        }
        self.line(indent, ")");
        self.block(&func.body, indent);
    }
}

impl Module {
    /// Debug rendering of every member, in declaration-list order.
    pub fn to_str(&self) -> String {
        let mut d = Dumper {
            module: self,
            out: String::new(),
        };
        for import in &self.imports {
            d.line(0, &format!("Import{{\"{}\" as {}}}", import.path, import.name));
        }
        for directive in &self.diagnostic_directives {
            d.line(
                0,
                &format!(
                    "DiagnosticDirective{{{}, {}}}",
                    directive.severity, directive.rule
                ),
            );
        }
        for var in &self.global_variables {
            d.variable(*var, 0);
        }
        for ep in &self.entry_points {
            d.line(0, &format!("EntryPoint{{{} = {}}}", ep.stage, ep.function));
        }
        for alias in &self.aliases {
            if let Some(Type::Alias { name, base }) = self.types.get(*alias) {
                let base = self.type_name(*base);
                d.line(0, &format!("{} -> {}", name, base));
            }
        }
        for func in &self.functions {
            d.function(func, 0);
        }
        d.out
    }

    pub fn expression_to_str(&self, expr: Handle<Expression>, indent: usize) -> String {
        let mut d = Dumper {
            module: self,
            out: String::new(),
        };
        d.expression(expr, indent);
        d.out
    }

    pub fn statement_to_str(&self, stmt: &Statement, indent: usize) -> String {
        let mut d = Dumper {
            module: self,
            out: String::new(),
        };
        d.statement(stmt, indent);
        d.out
    }

    pub fn variable_to_str(&self, var: Handle<Variable>, indent: usize) -> String {
        let mut d = Dumper {
            module: self,
            out: String::new(),
        };
        d.variable(var, indent);
        d.out
    }
}
