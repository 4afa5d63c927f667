//! Helpers for assembling modules in code, mostly from tests.

use crate::arena::Handle;
use crate::source::Span;

use super::{
    AddressSpace, BinaryOp, BlockStatement, Expression, ExpressionKind, Function, Literal, Module,
    Statement, StatementKind, Type, Variable,
};

#[derive(Debug, Default)]
pub struct ModuleBuilder {
    pub module: Module,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Module {
        self.module
    }

    pub fn ty_void(&mut self) -> Handle<Type> {
        self.module.intern_type(Type::Void)
    }

    pub fn ty_bool(&mut self) -> Handle<Type> {
        self.module.intern_type(Type::Bool)
    }

    pub fn ty_i32(&mut self) -> Handle<Type> {
        self.module.intern_type(Type::I32)
    }

    pub fn ty_u32(&mut self) -> Handle<Type> {
        self.module.intern_type(Type::U32)
    }

    pub fn ty_f32(&mut self) -> Handle<Type> {
        self.module.intern_type(Type::F32)
    }

    pub fn ty_vec(&mut self, size: u32, component: Handle<Type>) -> Handle<Type> {
        self.module.intern_type(Type::Vector { size, component })
    }

    pub fn ty_mat(&mut self, columns: u32, rows: u32, component: Handle<Type>) -> Handle<Type> {
        self.module.intern_type(Type::Matrix {
            columns,
            rows,
            component,
        })
    }

    pub fn ty_array(&mut self, base: Handle<Type>, size: Option<u32>) -> Handle<Type> {
        self.module.intern_type(Type::Array { base, size })
    }

    pub fn ty_ptr(&mut self, space: AddressSpace, base: Handle<Type>) -> Handle<Type> {
        self.module.intern_type(Type::Pointer { space, base })
    }

    /// Interns an alias and registers it as a module member.
    pub fn ty_alias(&mut self, name: &str, base: Handle<Type>) -> Handle<Type> {
        let alias = self.module.intern_type(Type::Alias {
            name: name.to_string(),
            base,
        });
        if !self.module.aliases.contains(&alias) {
            self.module.aliases.push(alias);
        }
        alias
    }

    fn add(&mut self, kind: ExpressionKind) -> Handle<Expression> {
        self.module.add_expression(kind, Span::default())
    }

    /// Identifier expression; `::` separates namespace segments.
    pub fn expr(&mut self, name: &str) -> Handle<Expression> {
        let segments = name.split("::").map(str::to_string).collect();
        self.add(ExpressionKind::Identifier(segments))
    }

    pub fn bool_(&mut self, value: bool) -> Handle<Expression> {
        self.add(ExpressionKind::ScalarConstructor(Literal::Bool(value)))
    }

    pub fn sint(&mut self, value: i32) -> Handle<Expression> {
        self.add(ExpressionKind::ScalarConstructor(Literal::Sint(value)))
    }

    pub fn uint(&mut self, value: u32) -> Handle<Expression> {
        self.add(ExpressionKind::ScalarConstructor(Literal::Uint(value)))
    }

    pub fn float(&mut self, value: f32) -> Handle<Expression> {
        self.add(ExpressionKind::ScalarConstructor(Literal::Float(value)))
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        lhs: Handle<Expression>,
        rhs: Handle<Expression>,
    ) -> Handle<Expression> {
        self.add(ExpressionKind::Binary { op, lhs, rhs })
    }

    pub fn add_expr(&mut self, lhs: Handle<Expression>, rhs: Handle<Expression>) -> Handle<Expression> {
        self.binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn construct(&mut self, ty: Handle<Type>, values: Vec<Handle<Expression>>) -> Handle<Expression> {
        self.add(ExpressionKind::TypeConstructor { ty, values })
    }

    /// `vec3<f32>(x, y, z)` from float literals.
    pub fn vec3_f32(&mut self, x: f32, y: f32, z: f32) -> Handle<Expression> {
        let f32_ = self.ty_f32();
        let ty = self.ty_vec(3, f32_);
        let values = vec![self.float(x), self.float(y), self.float(z)];
        self.construct(ty, values)
    }

    pub fn call(&mut self, function: &str, args: Vec<Handle<Expression>>) -> Handle<Expression> {
        let function = self.expr(function);
        self.add(ExpressionKind::Call { function, args })
    }

    pub fn var(&mut self, name: &str, space: AddressSpace, ty: Handle<Type>) -> Handle<Variable> {
        self.module.add_variable(Variable {
            name: name.to_string(),
            ty,
            space,
            is_const: false,
            initializer: None,
            decorations: Vec::new(),
            span: Span::default(),
        })
    }

    pub fn var_init(
        &mut self,
        name: &str,
        space: AddressSpace,
        ty: Handle<Type>,
        init: Handle<Expression>,
    ) -> Handle<Variable> {
        let var = self.var(name, space, ty);
        self.module.variables[var].initializer = Some(init);
        var
    }

    pub fn constant(
        &mut self,
        name: &str,
        space: AddressSpace,
        ty: Handle<Type>,
        init: Handle<Expression>,
    ) -> Handle<Variable> {
        let var = self.var_init(name, space, ty, init);
        self.module.variables[var].is_const = true;
        var
    }

    /// Registers `var` as a module-scope variable.
    pub fn global(&mut self, var: Handle<Variable>) -> Handle<Variable> {
        self.module.global_variables.push(var);
        var
    }

    pub fn decl(&self, var: Handle<Variable>) -> Statement {
        Statement::new(StatementKind::VariableDecl(var), Span::default())
    }

    pub fn block(&self, statements: Vec<Statement>) -> Statement {
        Statement::new(
            StatementKind::Block(BlockStatement::new(statements)),
            Span::default(),
        )
    }

    pub fn discard(&self) -> Statement {
        Statement::new(StatementKind::Discard, Span::default())
    }

    pub fn assign(&self, lhs: Handle<Expression>, rhs: Handle<Expression>) -> Statement {
        Statement::new(StatementKind::Assign { lhs, rhs }, Span::default())
    }

    pub fn ret(&self, value: Option<Handle<Expression>>) -> Statement {
        Statement::new(StatementKind::Return(value), Span::default())
    }

    /// Appends a function and returns its index in [`Module::functions`].
    pub fn func(
        &mut self,
        name: &str,
        params: Vec<Handle<Variable>>,
        return_type: Handle<Type>,
        statements: Vec<Statement>,
    ) -> usize {
        self.module.functions.push(Function {
            name: name.to_string(),
            params,
            return_type,
            body: BlockStatement::new(statements),
            span: Span::default(),
        });
        self.module.functions.len() - 1
    }
}
