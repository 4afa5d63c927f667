pub mod address_space;
pub mod builder;
pub mod clone;
pub mod decoration;
pub mod dump;
pub mod literal;
pub mod types;

#[cfg(test)]
pub mod test;

use std::fmt;

use crate::arena::{Arena, Handle, UniqueArena};
use crate::source::Span;

pub use address_space::AddressSpace;
pub use builder::ModuleBuilder;
pub use clone::{Clonable, CloneContext};
pub use decoration::{
    AccessControl, Builtin, Decoration, DecorationKind, DiagnosticDirective, DiagnosticSeverity,
};
pub use literal::Literal;
pub use types::{ScalarKind, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    LogicalAnd,
    LogicalOr,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    ShiftLeft,
    ShiftRight,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    /// Name used by the debug dump.
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::LogicalAnd => "logical_and",
            BinaryOp::LogicalOr => "logical_or",
            BinaryOp::Equal => "equal",
            BinaryOp::NotEqual => "not_equal",
            BinaryOp::LessThan => "less_than",
            BinaryOp::GreaterThan => "greater_than",
            BinaryOp::LessThanEqual => "less_than_equal",
            BinaryOp::GreaterThanEqual => "greater_than_equal",
            BinaryOp::ShiftLeft => "shift_left",
            BinaryOp::ShiftRight => "shift_right",
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
            BinaryOp::Modulo => "modulo",
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::GreaterThan
                | BinaryOp::LessThanEqual
                | BinaryOp::GreaterThanEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::ShiftLeft | BinaryOp::ShiftRight)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::GreaterThan => ">",
            BinaryOp::LessThanEqual => "<=",
            BinaryOp::GreaterThanEqual => ">=",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negation,
    Not,
    Complement,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Negation => "negation",
            UnaryOp::Not => "not",
            UnaryOp::Complement => "complement",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negation => "-",
            UnaryOp::Not => "!",
            UnaryOp::Complement => "~",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// `a` or a namespaced path such as `std::glsl::sqrt`.
    Identifier(Vec<String>),
    ScalarConstructor(Literal),
    TypeConstructor {
        ty: Handle<Type>,
        values: Vec<Handle<Expression>>,
    },
    Binary {
        op: BinaryOp,
        lhs: Handle<Expression>,
        rhs: Handle<Expression>,
    },
    Unary {
        op: UnaryOp,
        expr: Handle<Expression>,
    },
    Call {
        function: Handle<Expression>,
        args: Vec<Handle<Expression>>,
    },
    ArrayAccessor {
        array: Handle<Expression>,
        index: Handle<Expression>,
    },
    MemberAccessor {
        structure: Handle<Expression>,
        member: String,
    },
    /// The `_` on the left of a phony assignment.
    Phony,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
    /// Attached by the resolver.
    pub result_type: Option<Handle<Type>>,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Expression {
            kind,
            span,
            result_type: None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ExpressionKind::Identifier(_) => "identifier",
            ExpressionKind::ScalarConstructor(_) => "scalar constructor",
            ExpressionKind::TypeConstructor { .. } => "type constructor",
            ExpressionKind::Binary { .. } => "binary",
            ExpressionKind::Unary { .. } => "unary",
            ExpressionKind::Call { .. } => "call",
            ExpressionKind::ArrayAccessor { .. } => "array accessor",
            ExpressionKind::MemberAccessor { .. } => "member accessor",
            ExpressionKind::Phony => "phony",
        }
    }

    /// Joined identifier path, if this is an identifier.
    pub fn identifier_name(&self) -> Option<String> {
        match &self.kind {
            ExpressionKind::Identifier(segments) => Some(segments.join("::")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl BlockStatement {
    pub fn new(statements: Vec<Statement>) -> Self {
        BlockStatement {
            statements,
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    VariableDecl(Handle<Variable>),
    Block(BlockStatement),
    Discard,
    Assign {
        lhs: Handle<Expression>,
        rhs: Handle<Expression>,
    },
    If {
        condition: Handle<Expression>,
        accept: BlockStatement,
        /// `else` body; an `else if` is a block holding a single `If`.
        reject: Option<BlockStatement>,
    },
    Loop {
        body: BlockStatement,
        continuing: Option<BlockStatement>,
    },
    Break,
    Continue,
    Return(Option<Handle<Expression>>),
    Call(Handle<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Statement { kind, span }
    }

    /// True for statements after which control never reaches the next one.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            StatementKind::Discard
                | StatementKind::Return(_)
                | StatementKind::Break
                | StatementKind::Continue
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: Handle<Type>,
    pub space: AddressSpace,
    pub is_const: bool,
    pub initializer: Option<Handle<Expression>>,
    pub decorations: Vec<Decoration>,
    pub span: Span,
}

impl Variable {
    pub fn location(&self) -> Option<u32> {
        self.decorations.iter().find_map(|d| match d.kind {
            DecorationKind::Location(n) => Some(n),
            _ => None,
        })
    }

    pub fn binding(&self) -> Option<u32> {
        self.decorations.iter().find_map(|d| match d.kind {
            DecorationKind::Binding(n) => Some(n),
            _ => None,
        })
    }

    pub fn access(&self) -> Option<AccessControl> {
        self.decorations.iter().find_map(|d| match d.kind {
            DecorationKind::Access(a) => Some(a),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Handle<Variable>>,
    pub return_type: Handle<Type>,
    pub body: BlockStatement,
    pub span: Span,
}

/// `import "GLSL.std.450" as std::glsl;`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: String,
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Vertex,
    Fragment,
    Compute,
}

impl PipelineStage {
    pub fn parse(text: &str) -> Option<PipelineStage> {
        match text {
            "vertex" => Some(PipelineStage::Vertex),
            "fragment" => Some(PipelineStage::Fragment),
            "compute" => Some(PipelineStage::Compute),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStage::Vertex => "vertex",
            PipelineStage::Fragment => "fragment",
            PipelineStage::Compute => "compute",
        })
    }
}

/// `entry_point fragment = main;`
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPoint {
    pub stage: PipelineStage,
    pub function: String,
    pub span: Span,
}

/// Root container. Owns every node through its arenas and member lists.
#[derive(Debug, Default)]
pub struct Module {
    pub types: UniqueArena<Type>,
    pub expressions: Arena<Expression>,
    pub variables: Arena<Variable>,

    pub imports: Vec<Import>,
    pub diagnostic_directives: Vec<DiagnosticDirective>,
    pub global_variables: Vec<Handle<Variable>>,
    pub entry_points: Vec<EntryPoint>,
    pub aliases: Vec<Handle<Type>>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expression(&mut self, kind: ExpressionKind, span: Span) -> Handle<Expression> {
        self.expressions.append(Expression::new(kind, span))
    }

    pub fn add_variable(&mut self, variable: Variable) -> Handle<Variable> {
        self.variables.append(variable)
    }

    pub fn find_import_by_name(&self, name: &str) -> Option<&Import> {
        self.imports.iter().find(|import| import.name == name)
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn find_alias(&self, name: &str) -> Option<Handle<Type>> {
        self.aliases.iter().copied().find(|alias| {
            matches!(self.types.get(*alias), Some(Type::Alias { name: n, .. }) if n == name)
        })
    }

    pub fn is_entry_point(&self, function: &str) -> bool {
        self.entry_points.iter().any(|ep| ep.function == function)
    }

    /// Module-wide validity check. Stops at the first invalid member.
    pub fn is_valid(&self) -> bool {
        for import in &self.imports {
            if import.path.is_empty() || import.name.is_empty() {
                return false;
            }
        }
        for var in &self.global_variables {
            if !self.is_valid_variable(*var) {
                return false;
            }
        }
        for ep in &self.entry_points {
            if ep.function.is_empty() || self.find_function(&ep.function).is_none() {
                return false;
            }
        }
        for alias in &self.aliases {
            match self.types.get(*alias) {
                Some(Type::Alias { .. }) if self.is_valid_type(*alias) => {}
                _ => return false,
            }
        }
        for func in &self.functions {
            if !self.is_valid_function(func) {
                return false;
            }
        }
        true
    }

    pub fn is_valid_variable(&self, var: Handle<Variable>) -> bool {
        let Some(v) = self.variables.get(var) else {
            return false;
        };
        if v.name.is_empty() || !self.is_valid_type(v.ty) {
            return false;
        }
        match v.initializer {
            Some(init) => self.is_valid_expression(init),
            None => true,
        }
    }

    pub fn is_valid_function(&self, func: &Function) -> bool {
        !func.name.is_empty()
            && self.is_valid_type(func.return_type)
            && func.params.iter().all(|p| self.is_valid_variable(*p))
            && self.is_valid_block(&func.body)
    }

    pub fn is_valid_block(&self, block: &BlockStatement) -> bool {
        block.statements.iter().all(|s| self.is_valid_statement(s))
    }

    pub fn is_valid_statement(&self, stmt: &Statement) -> bool {
        match &stmt.kind {
            StatementKind::VariableDecl(var) => self.is_valid_variable(*var),
            StatementKind::Block(block) => self.is_valid_block(block),
            StatementKind::Discard | StatementKind::Break | StatementKind::Continue => true,
            StatementKind::Assign { lhs, rhs } => {
                self.is_valid_expression(*lhs) && self.is_valid_expression(*rhs)
            }
            StatementKind::If {
                condition,
                accept,
                reject,
            } => {
                self.is_valid_expression(*condition)
                    && self.is_valid_block(accept)
                    && reject.as_ref().is_none_or(|r| self.is_valid_block(r))
            }
            StatementKind::Loop { body, continuing } => {
                self.is_valid_block(body)
                    && continuing.as_ref().is_none_or(|c| self.is_valid_block(c))
            }
            StatementKind::Return(value) => value.is_none_or(|v| self.is_valid_expression(v)),
            StatementKind::Call(call) => matches!(
                self.expressions.get(*call),
                Some(Expression { kind: ExpressionKind::Call { .. }, .. })
            ) && self.is_valid_expression(*call),
        }
    }

    pub fn is_valid_expression(&self, expr: Handle<Expression>) -> bool {
        let Some(e) = self.expressions.get(expr) else {
            return false;
        };
        if let Some(ty) = e.result_type {
            if !self.is_valid_type(ty) {
                return false;
            }
        }
        match &e.kind {
            ExpressionKind::Identifier(segments) => {
                !segments.is_empty() && segments.iter().all(|s| !s.is_empty())
            }
            ExpressionKind::ScalarConstructor(_) | ExpressionKind::Phony => true,
            ExpressionKind::TypeConstructor { ty, values } => {
                self.is_valid_type(*ty) && values.iter().all(|v| self.is_valid_expression(*v))
            }
            ExpressionKind::Binary { lhs, rhs, .. } => {
                self.is_valid_expression(*lhs) && self.is_valid_expression(*rhs)
            }
            ExpressionKind::Unary { expr, .. } => self.is_valid_expression(*expr),
            ExpressionKind::Call { function, args } => {
                matches!(
                    self.expressions.get(*function),
                    Some(Expression { kind: ExpressionKind::Identifier(_), .. })
                ) && args.iter().all(|a| self.is_valid_expression(*a))
            }
            ExpressionKind::ArrayAccessor { array, index } => {
                self.is_valid_expression(*array) && self.is_valid_expression(*index)
            }
            ExpressionKind::MemberAccessor { structure, member } => {
                !member.is_empty() && self.is_valid_expression(*structure)
            }
        }
    }
}
