pub mod expression;
pub mod function;

#[cfg(test)]
pub mod test;

use std::collections::HashMap;

use tracing::debug;

use crate::arena::Handle;
use crate::ast::{
    AddressSpace, DiagnosticSeverity, Expression, ExpressionKind, Module, Type, Variable,
};
use crate::diagnostic::{Diagnostic, Diagnostics, Severity};
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Const,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub variable: Handle<Variable>,
    pub scope: Scope,
    pub mutability: Mutability,
    /// Declared type, before any pointer wrapping.
    pub ty: Handle<Type>,
}

#[derive(Debug, Clone)]
pub(crate) struct Signature {
    pub params: Vec<Handle<Type>>,
    pub return_type: Handle<Type>,
}

/// Attaches a type to every expression of a module and classifies the
/// address space of function-scope variables.
pub struct Resolver<'m> {
    module: &'m mut Module,
    scopes: Vec<HashMap<String, Symbol>>,
    functions: HashMap<String, Signature>,
    return_type: Option<Handle<Type>>,
    loop_depth: usize,
    in_continuing: bool,
    diagnostics: Diagnostics,
}

impl<'m> Resolver<'m> {
    pub fn new(module: &'m mut Module) -> Self {
        Resolver {
            module,
            scopes: vec![HashMap::new()],
            functions: HashMap::new(),
            return_type: None,
            loop_depth: 0,
            in_continuing: false,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn module(&self) -> &Module {
        self.module
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    pub fn error(&self) -> String {
        self.diagnostics.error()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Makes `var` visible in the innermost scope without resolving it.
    pub fn register_variable_for_testing(&mut self, var: Handle<Variable>) {
        let scope = if self.scopes.len() == 1 {
            Scope::Global
        } else {
            Scope::Function
        };
        let v = &self.module.variables[var];
        let symbol = Symbol {
            variable: var,
            scope,
            mutability: if v.is_const {
                Mutability::Const
            } else {
                Mutability::Var
            },
            ty: v.ty,
        };
        let name = v.name.clone();
        if let Some(top) = self.scopes.last_mut() {
            top.insert(name, symbol);
        }
    }

    pub fn resolve(&mut self) -> bool {
        debug!(
            functions = self.module.functions.len(),
            globals = self.module.global_variables.len(),
            "resolving module"
        );

        for import in self.module.imports.clone() {
            if import.path != crate::glsl_std::GLSL_STD_450 {
                self.add_error(import.span, format!("unknown import '{}'", import.path));
            }
        }

        for i in 0..self.module.functions.len() {
            let func = &self.module.functions[i];
            let signature = Signature {
                params: func
                    .params
                    .iter()
                    .map(|p| self.module.variables[*p].ty)
                    .collect(),
                return_type: func.return_type,
            };
            let (name, span) = (func.name.clone(), func.span.clone());
            if self.functions.insert(name.clone(), signature).is_some() {
                self.add_error(span, format!("redefinition of function '{}'", name));
            }
        }

        for ep in self.module.entry_points.clone() {
            if !self.functions.contains_key(&ep.function) {
                self.add_error(
                    ep.span,
                    format!("unable to find function '{}' for entry point", ep.function),
                );
            }
        }

        for var in self.module.global_variables.clone() {
            self.resolve_global(var);
        }

        for i in 0..self.module.functions.len() {
            self.resolve_function(i);
        }

        debug!(
            errors = self.diagnostics.errors().count(),
            warnings = self.diagnostics.warnings().count(),
            "resolved module"
        );
        !self.has_error()
    }

    fn resolve_global(&mut self, var: Handle<Variable>) {
        let v = self.module.variables[var].clone();

        if !v.is_const {
            match v.space {
                AddressSpace::None => {
                    self.add_error(
                        v.span.clone(),
                        format!("module-scope variable '{}' must declare an address space", v.name),
                    );
                }
                AddressSpace::Function => {
                    self.add_error(
                        v.span.clone(),
                        format!(
                            "module-scope variable '{}' cannot be in the function address space",
                            v.name
                        ),
                    );
                }
                space if v.initializer.is_some()
                    && (space.is_host_shareable() || space == AddressSpace::Workgroup) =>
                {
                    self.add_error(
                        v.span.clone(),
                        format!(
                            "variables in the '{}' address space cannot have an initializer",
                            space
                        ),
                    );
                }
                _ => {}
            }
        }

        self.resolve_initializer(&v);
        if let Some(init) = v.initializer {
            let resolved = self.module.expressions[init].result_type.is_some();
            if resolved && !self.is_constant_expression(init) {
                let span = self.module.expressions[init].span.clone();
                self.add_error(
                    span,
                    format!(
                        "module-scope initializer of '{}' must be a constant expression",
                        v.name
                    ),
                );
            }
        }
        self.declare(var, Scope::Global);
    }

    /// Literals, constructors of constants, and module-scope constants.
    /// Conversions are only folded for literal arguments.
    fn is_constant_expression(&self, expr: Handle<Expression>) -> bool {
        let m = &*self.module;
        match &m.expressions[expr].kind {
            ExpressionKind::ScalarConstructor(_) => true,
            ExpressionKind::TypeConstructor { ty, values } => {
                let target = m.unwrap_alias(*ty);
                let converts = m.is_scalar(target)
                    && values.first().is_some_and(|v| {
                        !matches!(m.expressions[*v].kind, ExpressionKind::ScalarConstructor(_))
                            && m.expressions[*v]
                                .result_type
                                .is_none_or(|t| !m.same_type(t, target))
                    });
                !converts && values.iter().all(|v| self.is_constant_expression(*v))
            }
            ExpressionKind::Identifier(segments) => {
                segments.len() == 1
                    && self.lookup(&segments[0]).is_some_and(|symbol| {
                        symbol.scope == Scope::Global && symbol.mutability == Mutability::Const
                    })
            }
            _ => false,
        }
    }

    /// Resolves the initializer of `v` and checks it against the declared type.
    fn resolve_initializer(&mut self, v: &Variable) {
        let Some(init) = v.initializer else {
            return;
        };
        let Some(init_ty) = self.resolve_value(init) else {
            return;
        };
        if !self.module.same_type(v.ty, init_ty) {
            let message = format!(
                "cannot initialize '{}' of type '{}' with value of type '{}'",
                v.name,
                self.module.type_display(v.ty),
                self.module.type_display(init_ty)
            );
            let span = self.module.expressions[init].span.clone();
            self.add_error(span, message);
        }
    }

    fn declare(&mut self, var: Handle<Variable>, scope: Scope) {
        let v = &self.module.variables[var];
        let symbol = Symbol {
            variable: var,
            scope,
            mutability: if v.is_const {
                Mutability::Const
            } else {
                Mutability::Var
            },
            ty: v.ty,
        };
        let (name, span) = (v.name.clone(), v.span.clone());
        let redeclared = self
            .scopes
            .last()
            .is_some_and(|top| top.contains_key(&name));
        if redeclared {
            self.add_error(span, format!("redeclaration of '{}'", name));
            return;
        }
        if let Some(top) = self.scopes.last_mut() {
            top.insert(name, symbol);
        }
    }

    /// Innermost registration of `name`.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn add_error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.add_error(span, message);
    }

    /// Reports a rule-controlled diagnostic at the severity set by the
    /// module's `diagnostic(...)` directives.
    fn add_rule_diagnostic(&mut self, rule: &str, span: Span, message: &str) {
        let configured = self
            .module
            .diagnostic_directives
            .iter()
            .rev()
            .find(|d| d.rule == rule)
            .map(|d| d.severity);
        let severity = match configured {
            Some(DiagnosticSeverity::Off) => return,
            Some(DiagnosticSeverity::Error) => Severity::Error,
            Some(DiagnosticSeverity::Info) => Severity::Note,
            Some(DiagnosticSeverity::Warning) | None => Severity::Warning,
        };
        self.diagnostics
            .push(Diagnostic::new(severity, span, message).with_rule(rule));
    }
}
