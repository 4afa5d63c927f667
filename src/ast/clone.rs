//! Deep copies of AST subtrees into another module.
//!
//! Expressions are copied freshly at every reference unless a replacement was
//! registered with [`CloneContext::replace_expr`]. Variables are cloned once
//! per source variable and reused; types are re-interned in the destination.

use std::collections::HashMap;

use crate::arena::Handle;
use crate::source::Span;

use super::{
    BlockStatement, Decoration, DiagnosticDirective, EntryPoint, Expression, ExpressionKind,
    Function, Import, Literal, Module, Statement, StatementKind, Type, Variable,
};

pub struct CloneContext<'a> {
    pub src: &'a Module,
    pub dst: &'a mut Module,
    types: HashMap<Handle<Type>, Handle<Type>>,
    variables: HashMap<Handle<Variable>, Handle<Variable>>,
    replacements: HashMap<Handle<Expression>, Handle<Expression>>,
}

/// A node that can be deep-copied into the destination of a [`CloneContext`].
pub trait Clonable {
    type Output;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> Self::Output;
}

impl<'a> CloneContext<'a> {
    pub fn new(src: &'a Module, dst: &'a mut Module) -> Self {
        CloneContext {
            src,
            dst,
            types: HashMap::new(),
            variables: HashMap::new(),
            replacements: HashMap::new(),
        }
    }

    pub fn clone<T: Clonable + ?Sized>(&mut self, node: &T) -> T::Output {
        node.clone_with(self)
    }

    /// Every reference to `src` clones to `dst` instead of a fresh copy.
    pub fn replace_expr(&mut self, src: Handle<Expression>, dst: Handle<Expression>) {
        self.replacements.insert(src, dst);
    }

    /// Appends a copy of every top-level member of the source module.
    pub fn clone_module(&mut self) {
        let src = self.src;
        for import in &src.imports {
            let import = self.clone(import);
            self.dst.imports.push(import);
        }
        for directive in &src.diagnostic_directives {
            let directive = self.clone(directive);
            self.dst.diagnostic_directives.push(directive);
        }
        for var in &src.global_variables {
            let var = self.clone(var);
            self.dst.global_variables.push(var);
        }
        for ep in &src.entry_points {
            let ep = self.clone(ep);
            self.dst.entry_points.push(ep);
        }
        for alias in &src.aliases {
            let alias = self.clone(alias);
            self.dst.aliases.push(alias);
        }
        for func in &src.functions {
            let func = self.clone(func);
            self.dst.functions.push(func);
        }
    }
}

impl Clonable for Span {
    type Output = Span;

    fn clone_with(&self, _ctx: &mut CloneContext<'_>) -> Span {
        self.clone()
    }
}

impl Clonable for Literal {
    type Output = Literal;

    fn clone_with(&self, _ctx: &mut CloneContext<'_>) -> Literal {
        *self
    }
}

impl Clonable for Handle<Type> {
    type Output = Handle<Type>;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> Handle<Type> {
        if let Some(mapped) = ctx.types.get(self) {
            return *mapped;
        }
        let src = ctx.src;
        let ty = match &src.types[*self] {
            Type::Vector { size, component } => Type::Vector {
                size: *size,
                component: ctx.clone(component),
            },
            Type::Matrix {
                columns,
                rows,
                component,
            } => Type::Matrix {
                columns: *columns,
                rows: *rows,
                component: ctx.clone(component),
            },
            Type::Array { base, size } => Type::Array {
                base: ctx.clone(base),
                size: *size,
            },
            Type::Pointer { space, base } => Type::Pointer {
                space: *space,
                base: ctx.clone(base),
            },
            Type::Alias { name, base } => Type::Alias {
                name: name.clone(),
                base: ctx.clone(base),
            },
            scalar => scalar.clone(),
        };
        let handle = ctx.dst.intern_type(ty);
        ctx.types.insert(*self, handle);
        handle
    }
}

impl Clonable for Handle<Expression> {
    type Output = Handle<Expression>;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> Handle<Expression> {
        if let Some(replacement) = ctx.replacements.get(self) {
            return *replacement;
        }
        let src = ctx.src;
        let expr = &src.expressions[*self];
        let kind = match &expr.kind {
            ExpressionKind::Identifier(segments) => ExpressionKind::Identifier(segments.clone()),
            ExpressionKind::ScalarConstructor(literal) => {
                ExpressionKind::ScalarConstructor(ctx.clone(literal))
            }
            ExpressionKind::TypeConstructor { ty, values } => ExpressionKind::TypeConstructor {
                ty: ctx.clone(ty),
                values: values.iter().map(|v| ctx.clone(v)).collect(),
            },
            ExpressionKind::Binary { op, lhs, rhs } => ExpressionKind::Binary {
                op: *op,
                lhs: ctx.clone(lhs),
                rhs: ctx.clone(rhs),
            },
            ExpressionKind::Unary { op, expr } => ExpressionKind::Unary {
                op: *op,
                expr: ctx.clone(expr),
            },
            ExpressionKind::Call { function, args } => ExpressionKind::Call {
                function: ctx.clone(function),
                args: args.iter().map(|a| ctx.clone(a)).collect(),
            },
            ExpressionKind::ArrayAccessor { array, index } => ExpressionKind::ArrayAccessor {
                array: ctx.clone(array),
                index: ctx.clone(index),
            },
            ExpressionKind::MemberAccessor { structure, member } => {
                ExpressionKind::MemberAccessor {
                    structure: ctx.clone(structure),
                    member: member.clone(),
                }
            }
            ExpressionKind::Phony => ExpressionKind::Phony,
        };
        let result_type = expr.result_type.map(|ty| ctx.clone(&ty));
        let span = ctx.clone(&expr.span);
        ctx.dst.expressions.append(Expression {
            kind,
            span,
            result_type,
        })
    }
}

impl Clonable for Decoration {
    type Output = Decoration;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> Decoration {
        Decoration::new(self.kind, ctx.clone(&self.span))
    }
}

impl Clonable for Handle<Variable> {
    type Output = Handle<Variable>;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> Handle<Variable> {
        if let Some(mapped) = ctx.variables.get(self) {
            return *mapped;
        }
        let src = ctx.src;
        let var = &src.variables[*self];
        let cloned = Variable {
            name: var.name.clone(),
            ty: ctx.clone(&var.ty),
            space: var.space,
            is_const: var.is_const,
            initializer: var.initializer.map(|init| ctx.clone(&init)),
            decorations: var.decorations.iter().map(|d| ctx.clone(d)).collect(),
            span: ctx.clone(&var.span),
        };
        let handle = ctx.dst.add_variable(cloned);
        ctx.variables.insert(*self, handle);
        handle
    }
}

impl Clonable for BlockStatement {
    type Output = BlockStatement;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> BlockStatement {
        BlockStatement {
            statements: self.statements.iter().map(|s| ctx.clone(s)).collect(),
            span: ctx.clone(&self.span),
        }
    }
}

impl Clonable for Statement {
    type Output = Statement;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> Statement {
        let kind = match &self.kind {
            StatementKind::VariableDecl(var) => StatementKind::VariableDecl(ctx.clone(var)),
            StatementKind::Block(block) => StatementKind::Block(ctx.clone(block)),
            StatementKind::Discard => StatementKind::Discard,
            StatementKind::Break => StatementKind::Break,
            StatementKind::Continue => StatementKind::Continue,
            StatementKind::Assign { lhs, rhs } => StatementKind::Assign {
                lhs: ctx.clone(lhs),
                rhs: ctx.clone(rhs),
            },
            StatementKind::If {
                condition,
                accept,
                reject,
            } => StatementKind::If {
                condition: ctx.clone(condition),
                accept: ctx.clone(accept),
                reject: reject.as_ref().map(|r| ctx.clone(r)),
            },
            StatementKind::Loop { body, continuing } => StatementKind::Loop {
                body: ctx.clone(body),
                continuing: continuing.as_ref().map(|c| ctx.clone(c)),
            },
            StatementKind::Return(value) => StatementKind::Return(value.map(|v| ctx.clone(&v))),
            StatementKind::Call(call) => StatementKind::Call(ctx.clone(call)),
        };
        Statement::new(kind, ctx.clone(&self.span))
    }
}

impl Clonable for Function {
    type Output = Function;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> Function {
        Function {
            name: self.name.clone(),
            params: self.params.iter().map(|p| ctx.clone(p)).collect(),
            return_type: ctx.clone(&self.return_type),
            body: ctx.clone(&self.body),
            span: ctx.clone(&self.span),
        }
    }
}

impl Clonable for Import {
    type Output = Import;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> Import {
        Import {
            path: self.path.clone(),
            name: self.name.clone(),
            span: ctx.clone(&self.span),
        }
    }
}

impl Clonable for EntryPoint {
    type Output = EntryPoint;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> EntryPoint {
        EntryPoint {
            stage: self.stage,
            function: self.function.clone(),
            span: ctx.clone(&self.span),
        }
    }
}

impl Clonable for DiagnosticDirective {
    type Output = DiagnosticDirective;

    fn clone_with(&self, ctx: &mut CloneContext<'_>) -> DiagnosticDirective {
        let span = ctx.clone(&self.span);
        DiagnosticDirective {
            severity: self.severity,
            rule: self.rule.clone(),
            span,
        }
    }
}
