use std::collections::HashSet;

use tracing::{debug, trace};

use crate::arena::Handle;
use crate::ast::{
    AccessControl, AddressSpace, BinaryOp, BlockStatement, Expression, ExpressionKind, Function,
    Literal, Module, PipelineStage, ScalarKind, Statement, StatementKind, Type, Variable,
};
use crate::diagnostic::Diagnostics;
use crate::glsl_std;
use crate::source::Span;

use super::Options;
use super::namer::Namer;

/// Spaces per indentation level.
pub const INDENT_WIDTH: usize = 2;

fn literal(l: &Literal) -> String {
    match l {
        Literal::Float(_) => format!("{}f", l.to_str()),
        _ => l.to_str(),
    }
}

/// Writes a resolved module as Metal source. Every emitted line is prefixed
/// with `indent * INDENT_WIDTH` spaces; callers move the indent around nested
/// scopes.
pub struct GeneratorImpl<'m> {
    module: &'m Module,
    options: Options,
    out: String,
    indent: usize,
    namer: Namer,
    /// Names declared by the enclosing function scopes.
    locals: Vec<HashSet<String>>,
    in_entry_point: bool,
    loops: usize,
    diagnostics: Diagnostics,
}

impl<'m> GeneratorImpl<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self::with_options(module, Options::default())
    }

    pub fn with_options(module: &'m Module, options: Options) -> Self {
        GeneratorImpl {
            module,
            options,
            out: String::new(),
            indent: 0,
            namer: Namer::new(),
            locals: vec![],
            in_entry_point: false,
            loops: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn result(&self) -> &str {
        &self.out
    }

    pub fn into_result(self) -> String {
        self.out
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

    pub fn increment_indent(&mut self) {
        self.indent += 1;
    }

    pub fn decrement_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    fn make_indent(&mut self) {
        self.out
            .extend(std::iter::repeat_n(' ', self.indent * INDENT_WIDTH));
    }

    fn add_error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.add_error(span, message);
    }

    fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.locals.last_mut() {
            scope.insert(name.to_string());
        }
    }

    /// True if `name` refers to a module-scope variable that is not shadowed.
    fn is_module_variable(&self, name: &str) -> bool {
        if self.locals.iter().any(|scope| scope.contains(name)) {
            return false;
        }
        self.module.global_variables.iter().any(|var| {
            let v = &self.module.variables[*var];
            !v.is_const && v.name == name
        })
    }

    pub fn generate(&mut self) -> bool {
        let module = self.module;
        if !module.is_valid() {
            self.add_error(Span::default(), "unable to generate an invalid module");
            return false;
        }
        debug!(functions = module.functions.len(), "generating msl");

        if self.options.include_header {
            self.out.push_str("#include <metal_stdlib>\n\n");
        }

        for alias in &module.aliases {
            let Some(Type::Alias { name, base }) = module.types.get(*alias) else {
                continue;
            };
            let Some(base) = self.type_name(*base) else {
                return false;
            };
            let name = self.namer.name_for(name);
            self.out.push_str(&format!("typedef {} {};\n", base, name));
        }
        if !module.aliases.is_empty() {
            self.out.push('\n');
        }

        let mut constants = 0;
        for var in &module.global_variables {
            let v = &module.variables[*var];
            if !v.is_const {
                continue;
            }
            let Some(decl) = self.variable_declaration(*var) else {
                return false;
            };
            self.out.push_str(&format!("constant {};\n", decl));
            constants += 1;
        }
        if constants > 0 {
            self.out.push('\n');
        }

        // helpers first so entry points can call them
        let (entry, helpers): (Vec<&Function>, Vec<&Function>) = module
            .functions
            .iter()
            .partition(|f| module.is_entry_point(&f.name));
        let mut ok = true;
        for (i, func) in helpers.iter().chain(entry.iter()).enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            ok &= self.emit_function(func);
        }

        debug!(bytes = self.out.len(), "generated msl");
        ok && !self.has_error()
    }

    fn type_name(&mut self, ty: Handle<Type>) -> Option<String> {
        let module = self.module;
        let Some(t) = module.types.get(ty) else {
            self.add_error(Span::default(), "unknown type handle");
            return None;
        };
        Some(match t {
            Type::Void => "void".to_string(),
            Type::Bool => "bool".to_string(),
            Type::I32 => "int".to_string(),
            Type::U32 => "uint".to_string(),
            Type::F32 => "float".to_string(),
            Type::Vector { size, component } => format!("{}{}", self.type_name(*component)?, size),
            Type::Matrix {
                columns,
                rows,
                component,
            } => format!("{}{}x{}", self.type_name(*component)?, columns, rows),
            Type::Array {
                base,
                size: Some(n),
            } => format!("metal::array<{}, {}>", self.type_name(*base)?, n),
            Type::Array { size: None, .. } => {
                self.add_error(
                    Span::default(),
                    "runtime-sized arrays are only supported in storage buffers",
                );
                return None;
            }
            Type::Pointer { .. } => {
                self.add_error(
                    Span::default(),
                    format!("unable to emit type '{}'", module.type_display(ty)),
                );
                return None;
            }
            Type::Alias { name, .. } => self.namer.name_for(name),
        })
    }

    /// `type name = initializer`, without the trailing semicolon. Variables
    /// without an initializer are zero-initialized.
    fn variable_declaration(&mut self, var: Handle<Variable>) -> Option<String> {
        let module = self.module;
        let v = &module.variables[var];
        let ty = self.type_name(v.ty)?;
        let init = match v.initializer {
            Some(init) => self.expression(init)?,
            None => "{}".to_string(),
        };
        let name = self.namer.name_for(&v.name);
        self.declare_local(&v.name);
        let qualifier = if v.is_const && !self.locals.is_empty() {
            "const "
        } else {
            ""
        };
        Some(format!("{}{} {} = {}", qualifier, ty, name, init))
    }

    /// Entry point parameter for a module-scope variable; `None` for
    /// variables that become locals of the entry point.
    fn entry_point_parameter(
        &mut self,
        var: Handle<Variable>,
        stage: PipelineStage,
        workgroup_index: &mut u32,
    ) -> Option<Option<String>> {
        let module = self.module;
        let v = &module.variables[var];
        let name = self.namer.name_for(&v.name);
        let buffer = v.binding().unwrap_or(0);
        let param = match v.space {
            AddressSpace::Private => return Some(None),
            AddressSpace::Uniform | AddressSpace::PushConstant => format!(
                "constant {}& {} [[buffer({})]]",
                self.type_name(v.ty)?,
                name,
                buffer
            ),
            AddressSpace::Storage => {
                let qualifier = match v.access() {
                    Some(AccessControl::Read) => "const device",
                    _ => "device",
                };
                match module.types.get(module.unwrap_alias(v.ty)) {
                    Some(Type::Array { base, size: None }) => format!(
                        "{} {}* {} [[buffer({})]]",
                        qualifier,
                        self.type_name(*base)?,
                        name,
                        buffer
                    ),
                    _ => format!(
                        "{} {}& {} [[buffer({})]]",
                        qualifier,
                        self.type_name(v.ty)?,
                        name,
                        buffer
                    ),
                }
            }
            AddressSpace::Workgroup if stage == PipelineStage::Compute => {
                let index = *workgroup_index;
                *workgroup_index += 1;
                format!(
                    "threadgroup {}& {} [[threadgroup({})]]",
                    self.type_name(v.ty)?,
                    name,
                    index
                )
            }
            AddressSpace::Workgroup => {
                self.add_error(
                    v.span.clone(),
                    format!(
                        "workgroup variable '{}' is only available to compute entry points",
                        v.name
                    ),
                );
                return None;
            }
            space => {
                self.add_error(
                    v.span.clone(),
                    format!("address space '{}' is not supported for '{}'", space, v.name),
                );
                return None;
            }
        };
        Some(Some(param))
    }

    pub fn emit_function(&mut self, func: &Function) -> bool {
        trace!(name = %func.name, "emitting function");
        let module = self.module;
        let stage = module
            .entry_points
            .iter()
            .find(|ep| ep.function == func.name)
            .map(|ep| ep.stage);
        self.in_entry_point = stage.is_some();

        let Some(ret) = self.type_name(func.return_type) else {
            return false;
        };
        let name = self.namer.name_for(&func.name);

        self.locals.push(HashSet::new());
        let mut params = vec![];
        for param in &func.params {
            let v = &module.variables[*param];
            let Some(ty) = self.type_name(v.ty) else {
                self.locals.pop();
                return false;
            };
            params.push(format!("{} {}", ty, self.namer.name_for(&v.name)));
            self.declare_local(&v.name);
        }

        let mut private = vec![];
        if let Some(stage) = stage {
            let mut workgroup_index = 0;
            for var in &module.global_variables {
                if module.variables[*var].is_const {
                    continue;
                }
                match self.entry_point_parameter(*var, stage, &mut workgroup_index) {
                    Some(Some(param)) => params.push(param),
                    Some(None) => private.push(*var),
                    None => {
                        self.locals.pop();
                        return false;
                    }
                }
            }
        }

        let qualifier = match stage {
            Some(PipelineStage::Vertex) => "vertex ",
            Some(PipelineStage::Fragment) => "fragment ",
            Some(PipelineStage::Compute) => "kernel ",
            None => "",
        };
        self.make_indent();
        self.out.push_str(&format!(
            "{}{} {}({}) {{\n",
            qualifier,
            ret,
            name,
            params.join(", ")
        ));

        self.increment_indent();
        let mut ok = true;
        for var in private {
            match self.variable_declaration(var) {
                Some(decl) => {
                    self.make_indent();
                    self.out.push_str(&decl);
                    self.out.push_str(";\n");
                }
                None => ok = false,
            }
        }
        ok &= self.emit_statements(&func.body.statements);
        self.decrement_indent();
        self.make_indent();
        self.out.push_str("}\n");

        self.locals.pop();
        self.in_entry_point = false;
        ok
    }

    fn emit_statements(&mut self, statements: &[Statement]) -> bool {
        let mut ok = true;
        for stmt in statements {
            ok &= self.emit_statement(stmt);
        }
        ok
    }

    /// Emits `{`, the statements one level deeper, and `}` at the current
    /// indent. Writes no leading indent and no trailing newline.
    pub fn emit_block(&mut self, block: &BlockStatement) -> bool {
        self.out.push_str("{\n");
        self.increment_indent();
        self.locals.push(HashSet::new());
        let ok = self.emit_statements(&block.statements);
        self.locals.pop();
        self.decrement_indent();
        self.make_indent();
        self.out.push('}');
        ok
    }

    /// Emits one statement as indented line(s) ending in a newline.
    pub fn emit_statement(&mut self, stmt: &Statement) -> bool {
        let module = self.module;
        match &stmt.kind {
            StatementKind::VariableDecl(var) => {
                let Some(decl) = self.variable_declaration(*var) else {
                    return false;
                };
                self.line(&format!("{};", decl));
            }
            StatementKind::Block(block) => {
                self.make_indent();
                let ok = self.emit_block(block);
                self.out.push('\n');
                return ok;
            }
            StatementKind::Discard => self.line("discard_fragment();"),
            StatementKind::Assign { lhs, rhs } => {
                let Some(rhs) = self.expression(*rhs) else {
                    return false;
                };
                if matches!(module.expressions[*lhs].kind, ExpressionKind::Phony) {
                    self.line(&format!("(void) {};", rhs));
                } else {
                    let Some(lhs) = self.expression(*lhs) else {
                        return false;
                    };
                    self.line(&format!("{} = {};", lhs, rhs));
                }
            }
            StatementKind::If {
                condition,
                accept,
                reject,
            } => {
                let Some(condition) = self.expression(*condition) else {
                    return false;
                };
                self.make_indent();
                self.out.push_str(&format!("if ({}) ", condition));
                let mut ok = self.emit_block(accept);
                if let Some(reject) = reject {
                    self.out.push_str(" else ");
                    ok &= self.emit_block(reject);
                }
                self.out.push('\n');
                return ok;
            }
            StatementKind::Loop { body, continuing } => {
                return self.emit_loop(body, continuing.as_ref());
            }
            StatementKind::Break => self.line("break;"),
            StatementKind::Continue => self.line("continue;"),
            StatementKind::Return(value) => match value {
                Some(value) => {
                    let Some(value) = self.expression(*value) else {
                        return false;
                    };
                    self.line(&format!("return {};", value));
                }
                None => self.line("return;"),
            },
            StatementKind::Call(call) => {
                let Some(call) = self.expression(*call) else {
                    return false;
                };
                self.line(&format!("{};", call));
            }
        }
        true
    }

    fn line(&mut self, text: &str) {
        self.make_indent();
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// `loop` has no direct counterpart. Without a continuing block it is a
    /// `for(;;)`; with one, the continuing statements run at the top of every
    /// iteration but the first, so `continue` still reaches them. Variables
    /// declared directly in the body are declared once outside the `for`, so
    /// the continuing block sees the values of the previous iteration.
    fn emit_loop(&mut self, body: &BlockStatement, continuing: Option<&BlockStatement>) -> bool {
        let Some(continuing) = continuing else {
            self.make_indent();
            self.out.push_str("for(;;) ");
            let ok = self.emit_block(body);
            self.out.push('\n');
            return ok;
        };

        let module = self.module;
        self.loops += 1;
        self.line("{");
        self.increment_indent();
        self.locals.push(HashSet::new());

        let flag = self.namer.name_for(&format!("loop_first_{}", self.loops));
        self.line(&format!("bool {} = true;", flag));
        let mut ok = true;
        for stmt in &body.statements {
            if let StatementKind::VariableDecl(var) = stmt.kind {
                let v = &module.variables[var];
                let Some(ty) = self.type_name(v.ty) else {
                    ok = false;
                    continue;
                };
                let name = self.namer.name_for(&v.name);
                self.declare_local(&v.name);
                self.line(&format!("{} {} = {{}};", ty, name));
            }
        }

        self.line("for(;;) {");
        self.increment_indent();
        self.make_indent();
        self.out.push_str(&format!("if (!{}) ", flag));
        ok &= self.emit_block(continuing);
        self.out.push('\n');
        self.line(&format!("{} = false;", flag));

        // body declarations become assignments
        for stmt in &body.statements {
            match stmt.kind {
                StatementKind::VariableDecl(var) => {
                    let v = &module.variables[var];
                    let init = match v.initializer {
                        Some(init) => self.expression(init),
                        None => Some("{}".to_string()),
                    };
                    match init {
                        Some(init) => {
                            let name = self.namer.name_for(&v.name);
                            self.line(&format!("{} = {};", name, init));
                        }
                        None => ok = false,
                    }
                }
                _ => ok &= self.emit_statement(stmt),
            }
        }
        self.decrement_indent();
        self.line("}");

        self.locals.pop();
        self.decrement_indent();
        self.line("}");
        ok
    }

    /// Appends the text of `expr` to the output.
    pub fn emit_expression(&mut self, expr: Handle<Expression>) -> bool {
        match self.expression(expr) {
            Some(text) => {
                self.out.push_str(&text);
                true
            }
            None => false,
        }
    }

    fn value_type(&self, expr: Handle<Expression>) -> Option<Handle<Type>> {
        let ty = self.module.expressions[expr].result_type?;
        Some(self.module.unwrap_ptr(ty))
    }

    fn is_float_value(&self, expr: Handle<Expression>) -> bool {
        self.value_type(expr)
            .and_then(|ty| self.module.scalar_kind(ty))
            == Some(ScalarKind::Float)
    }

    /// Widens a scalar operand to the vector type of `parent`, since
    /// `metal::fmod` takes two operands of one type.
    fn splat_to(
        &mut self,
        parent: Handle<Expression>,
        operand: Handle<Expression>,
        text: String,
    ) -> Option<String> {
        let module = self.module;
        let (Some(parent_ty), Some(operand_ty)) =
            (self.value_type(parent), self.value_type(operand))
        else {
            return Some(text);
        };
        if module.vector_size(parent_ty).is_some() && module.is_scalar(operand_ty) {
            return Some(format!("{}({})", self.type_name(parent_ty)?, text));
        }
        Some(text)
    }

    fn expression_list(&mut self, exprs: &[Handle<Expression>]) -> Option<String> {
        let mut parts = vec![];
        for expr in exprs {
            parts.push(self.expression(*expr)?);
        }
        Some(parts.join(", "))
    }

    fn expression(&mut self, expr: Handle<Expression>) -> Option<String> {
        let module = self.module;
        let e = &module.expressions[expr];
        Some(match &e.kind {
            ExpressionKind::Identifier(segments) => {
                let name = segments.join("::");
                if !self.in_entry_point && self.is_module_variable(&name) {
                    self.add_error(
                        e.span.clone(),
                        format!(
                            "module-scope variable '{}' can only be used from an entry point",
                            name
                        ),
                    );
                    return None;
                }
                self.namer.name_for(&name)
            }
            ExpressionKind::ScalarConstructor(l) => literal(l),
            ExpressionKind::TypeConstructor { ty, values } => {
                let ty_name = self.type_name(*ty)?;
                let args = self.expression_list(values)?;
                match module.types.get(module.unwrap_alias(*ty)) {
                    Some(Type::Array { .. }) => format!("{}{{{}}}", ty_name, args),
                    _ => format!("{}({})", ty_name, args),
                }
            }
            ExpressionKind::Binary { op, lhs, rhs } => {
                let (l, r) = (*lhs, *rhs);
                let lhs = self.expression(l)?;
                let rhs = self.expression(r)?;
                if *op == BinaryOp::Modulo && self.is_float_value(l) {
                    let lhs = self.splat_to(expr, l, lhs)?;
                    let rhs = self.splat_to(expr, r, rhs)?;
                    format!("metal::fmod({}, {})", lhs, rhs)
                } else {
                    format!("({} {} {})", lhs, op, rhs)
                }
            }
            ExpressionKind::Unary { op, expr } => format!("{}({})", op, self.expression(*expr)?),
            ExpressionKind::Call { function, args } => {
                let ExpressionKind::Identifier(segments) = &module.expressions[*function].kind
                else {
                    self.add_error(e.span.clone(), "called object is not a function");
                    return None;
                };
                let args = self.expression_list(args)?;
                match segments.as_slice() {
                    [namespace @ .., name] if !namespace.is_empty() => {
                        let Some(func) = glsl_std::find(name) else {
                            self.add_error(
                                e.span.clone(),
                                format!("unknown imported function '{}'", segments.join("::")),
                            );
                            return None;
                        };
                        format!("metal::{}({})", func.msl_name, args)
                    }
                    _ => format!("{}({})", self.namer.name_for(&segments.join("::")), args),
                }
            }
            ExpressionKind::ArrayAccessor { array, index } => {
                let array = self.expression(*array)?;
                let index = self.expression(*index)?;
                format!("{}[{}]", array, index)
            }
            ExpressionKind::MemberAccessor { structure, member } => {
                format!("{}.{}", self.expression(*structure)?, member)
            }
            ExpressionKind::Phony => {
                self.add_error(e.span.clone(), "unexpected phony expression");
                return None;
            }
        })
    }
}
