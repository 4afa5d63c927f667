use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::arena::Handle;
use crate::ast::{
    AccessControl, AddressSpace, Builtin, DecorationKind, EntryPoint, ExpressionKind, Literal,
    Module, PipelineStage, ScalarKind, Type, Variable,
};
use crate::diagnostic::Diagnostics;
use crate::glsl_std;
use crate::source::Span;

use super::function::Function;
use super::instruction::{Instruction, Op, Operand, dump_instructions};
use super::{MAGIC_NUMBER, Options, VERSION};

/// SPIR-V storage class for an address space.
pub fn storage_class(space: AddressSpace) -> Option<Operand> {
    let (name, value) = match space {
        AddressSpace::Handle => ("UniformConstant", 0),
        AddressSpace::In => ("Input", 1),
        AddressSpace::Uniform => ("Uniform", 2),
        AddressSpace::Out => ("Output", 3),
        AddressSpace::Workgroup => ("Workgroup", 4),
        AddressSpace::Private => ("Private", 6),
        AddressSpace::Function => ("Function", 7),
        AddressSpace::PushConstant => ("PushConstant", 9),
        AddressSpace::Storage => ("StorageBuffer", 12),
        AddressSpace::None | AddressSpace::Invalid => return None,
    };
    Some(Operand::Enum(name, value))
}

fn builtin_operand(builtin: Builtin) -> Operand {
    let (name, value) = match builtin {
        Builtin::Position => ("Position", 0),
        Builtin::FragCoord => ("FragCoord", 15),
        Builtin::FrontFacing => ("FrontFacing", 17),
        Builtin::FragDepth => ("FragDepth", 22),
        Builtin::WorkgroupId => ("WorkgroupId", 26),
        Builtin::LocalInvocationId => ("LocalInvocationId", 27),
        Builtin::GlobalInvocationId => ("GlobalInvocationId", 28),
        Builtin::LocalInvocationIndex => ("LocalInvocationIndex", 29),
        Builtin::VertexIndex => ("VertexIndex", 42),
        Builtin::InstanceIndex => ("InstanceIndex", 43),
    };
    Operand::Enum(name, value)
}

/// Address spaces whose variables start out zeroed when no initializer is
/// given.
fn needs_null_initializer(space: AddressSpace) -> bool {
    matches!(
        space,
        AddressSpace::Private | AddressSpace::Out | AddressSpace::Function
    )
}

pub(crate) const NONE: Operand = Operand::Enum("None", 0);

pub struct Builder<'m> {
    pub(crate) module: &'m Module,
    options: Options,
    next_id: u32,

    capabilities: Vec<Instruction>,
    ext_imports: Vec<Instruction>,
    memory_model: Vec<Instruction>,
    entry_points: Vec<Instruction>,
    execution_modes: Vec<Instruction>,
    debug: Vec<Instruction>,
    annotations: Vec<Instruction>,
    types: Vec<Instruction>,
    pub(crate) functions: Vec<Function>,

    type_ids: HashMap<String, u32>,
    constant_ids: HashMap<String, u32>,
    /// Ids produced by constant instructions.
    constants: HashSet<u32>,
    /// Scalar constituents of constant vectors, for flattening.
    composite_parts: HashMap<u32, Vec<u32>>,
    function_ids: HashMap<String, u32>,
    pub(crate) import_ids: HashMap<String, u32>,
    variable_ids: HashMap<Handle<Variable>, u32>,
    /// Buffer variables wrapped in a one-member block, with the space and
    /// type of the member.
    pub(crate) block_variables: HashMap<u32, (AddressSpace, Handle<Type>)>,
    /// Array types that already carry an `ArrayStride`.
    strided: HashSet<u32>,
    scopes: Vec<HashMap<String, u32>>,
    /// Merge and continue targets of the enclosing loops.
    pub(crate) loops: Vec<(u32, u32)>,

    diagnostics: Diagnostics,
}

impl<'m> Builder<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self::with_options(module, Options::default())
    }

    pub fn with_options(module: &'m Module, options: Options) -> Self {
        Builder {
            module,
            options,
            next_id: 1,
            capabilities: vec![],
            ext_imports: vec![],
            memory_model: vec![],
            entry_points: vec![],
            execution_modes: vec![],
            debug: vec![],
            annotations: vec![],
            types: vec![],
            functions: vec![],
            type_ids: HashMap::new(),
            constant_ids: HashMap::new(),
            constants: HashSet::new(),
            composite_parts: HashMap::new(),
            function_ids: HashMap::new(),
            import_ids: HashMap::new(),
            variable_ids: HashMap::new(),
            block_variables: HashMap::new(),
            strided: HashSet::new(),
            scopes: vec![HashMap::new()],
            loops: vec![],
            diagnostics: Diagnostics::new(),
        }
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

    /// Upper bound of the ids handed out so far.
    pub fn id_bound(&self) -> u32 {
        self.next_id
    }

    pub fn capabilities(&self) -> &[Instruction] {
        &self.capabilities
    }

    pub fn ext_imports(&self) -> &[Instruction] {
        &self.ext_imports
    }

    pub fn entry_points(&self) -> &[Instruction] {
        &self.entry_points
    }

    pub fn execution_modes(&self) -> &[Instruction] {
        &self.execution_modes
    }

    pub fn debug(&self) -> &[Instruction] {
        &self.debug
    }

    pub fn annotations(&self) -> &[Instruction] {
        &self.annotations
    }

    pub fn types(&self) -> &[Instruction] {
        &self.types
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Makes `func` the function that instructions are appended to.
    pub fn push_function(&mut self, func: Function) {
        self.functions.push(func);
    }

    pub(crate) fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn add_error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.add_error(span, message);
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub(crate) fn bind(&mut self, name: &str, id: u32) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<u32> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    pub(crate) fn is_constant_id(&self, id: u32) -> bool {
        self.constants.contains(&id)
    }

    /// Appends to the function under construction.
    pub(crate) fn push_inst(&mut self, inst: Instruction) -> Option<()> {
        match self.functions.last_mut() {
            Some(func) => {
                func.push_inst(inst);
                Some(())
            }
            None => {
                self.add_error(Span::default(), "instruction generated outside of a function");
                None
            }
        }
    }

    pub(crate) fn push_debug_name(&mut self, id: u32, name: &str) {
        if self.options.emit_debug_names {
            self.debug.push(Instruction::new(
                Op::Name,
                vec![Operand::Id(id), Operand::String(name.to_string())],
            ));
        }
    }

    /// Lowers the whole module. Refuses a structurally invalid module.
    pub fn generate(&mut self) -> bool {
        let module = self.module;
        if !module.is_valid() {
            self.add_error(Span::default(), "unable to generate an invalid module");
            return false;
        }
        debug!(
            functions = module.functions.len(),
            globals = module.global_variables.len(),
            "generating spir-v"
        );

        self.capabilities
            .push(Instruction::new(Op::Capability, vec![Operand::Enum("Shader", 1)]));
        self.memory_model.push(Instruction::new(
            Op::MemoryModel,
            vec![Operand::Enum("Logical", 0), Operand::Enum("GLSL450", 1)],
        ));

        for import in &module.imports {
            self.generate_import(&import.path, &import.name, import.span.clone());
        }
        for func in &module.functions {
            self.function_id(&func.name);
        }
        for var in &module.global_variables {
            self.generate_global_variable(*var);
        }
        for ep in &module.entry_points {
            self.generate_entry_point(ep);
        }
        for func in &module.functions {
            self.generate_function(func);
        }

        debug!(
            bound = self.next_id,
            types = self.types.len(),
            functions = self.functions.len(),
            "generated spir-v"
        );
        !self.has_error()
    }

    pub fn generate_import(&mut self, path: &str, name: &str, span: Span) -> bool {
        if path != glsl_std::GLSL_STD_450 {
            self.add_error(span, format!("unknown import '{}'", path));
            return false;
        }
        let id = self.next_id();
        self.ext_imports.push(Instruction::with_result(
            Op::ExtInstImport,
            id,
            vec![Operand::String(path.to_string())],
        ));
        self.import_ids.insert(name.to_string(), id);
        true
    }

    /// Id of the named function, reserved on first request.
    pub(crate) fn function_id(&mut self, name: &str) -> u32 {
        if let Some(id) = self.function_ids.get(name) {
            return *id;
        }
        let id = self.next_id();
        self.function_ids.insert(name.to_string(), id);
        id
    }

    pub fn generate_entry_point(&mut self, ep: &EntryPoint) -> bool {
        let Some(func) = self.function_ids.get(&ep.function).copied() else {
            self.add_error(
                ep.span.clone(),
                format!("unable to find function '{}' for entry point", ep.function),
            );
            return false;
        };
        let model = match ep.stage {
            PipelineStage::Vertex => Operand::Enum("Vertex", 0),
            PipelineStage::Fragment => Operand::Enum("Fragment", 4),
            PipelineStage::Compute => Operand::Enum("GLCompute", 5),
        };

        let module = self.module;
        let mut operands = vec![model, Operand::Id(func), Operand::String(ep.function.clone())];
        for var in &module.global_variables {
            let v = &module.variables[*var];
            if matches!(v.space, AddressSpace::In | AddressSpace::Out) {
                if let Some(id) = self.variable_ids.get(var) {
                    operands.push(Operand::Id(*id));
                }
            }
        }
        self.entry_points.push(Instruction::new(Op::EntryPoint, operands));

        match ep.stage {
            PipelineStage::Fragment => self.execution_modes.push(Instruction::new(
                Op::ExecutionMode,
                vec![Operand::Id(func), Operand::Enum("OriginUpperLeft", 7)],
            )),
            PipelineStage::Compute => self.execution_modes.push(Instruction::new(
                Op::ExecutionMode,
                vec![
                    Operand::Id(func),
                    Operand::Enum("LocalSize", 17),
                    Operand::Int(1),
                    Operand::Int(1),
                    Operand::Int(1),
                ],
            )),
            PipelineStage::Vertex => {}
        }
        true
    }

    /// Declares a module-scope variable, or materializes a module-scope
    /// constant so later references use its id directly.
    pub fn generate_global_variable(&mut self, var: Handle<Variable>) -> bool {
        let module = self.module;
        let v = &module.variables[var];

        if v.is_const {
            let Some(init) = v.initializer else {
                self.add_error(
                    v.span.clone(),
                    format!("constant '{}' requires an initializer", v.name),
                );
                return false;
            };
            let Some(id) = self.generate_constant_expression(init) else {
                return false;
            };
            self.bind(&v.name, id);
            return true;
        }

        let Some(class) = storage_class(v.space) else {
            self.add_error(
                v.span.clone(),
                format!("invalid address space '{}' for variable '{}'", v.space, v.name),
            );
            return false;
        };

        let id = self.next_id();
        self.push_debug_name(id, &v.name);
        let is_block = v.space.is_host_shareable();
        let ptr = if is_block {
            self.generate_block_pointer_type(v.space, v.ty)
        } else {
            self.generate_pointer_type(v.space, v.ty)
        };
        let Some(ptr) = ptr else {
            return false;
        };
        if is_block {
            self.block_variables.insert(id, (v.space, v.ty));
        }

        let mut operands = vec![class];
        let init = match v.initializer {
            Some(init) => self.generate_constant_expression(init),
            None if needs_null_initializer(v.space) => self.generate_null(v.ty),
            None => None,
        };
        if let Some(init) = init {
            operands.push(Operand::Id(init));
        } else if v.initializer.is_some() {
            return false;
        }

        self.types
            .push(Instruction::typed(Op::Variable, ptr, id, operands));
        self.generate_decorations(id, v);
        self.variable_ids.insert(var, id);
        self.bind(&v.name, id);
        true
    }

    /// Declares a function-scope variable in the current function. Constant
    /// initializers become part of the declaration; anything else is stored
    /// after it.
    pub fn generate_function_variable(&mut self, var: Handle<Variable>) -> bool {
        let module = self.module;
        let v = &module.variables[var];
        let id = self.next_id();
        self.push_debug_name(id, &v.name);
        let Some(ptr) = self.generate_pointer_type(AddressSpace::Function, v.ty) else {
            return false;
        };

        let constant_init = v.initializer.filter(|init| self.is_constant_expression(*init));
        let init = match constant_init {
            Some(init) => self.generate_constant_expression(init),
            None => self.generate_null(v.ty),
        };
        let Some(init) = init else {
            return false;
        };

        let inst = Instruction::typed(
            Op::Variable,
            ptr,
            id,
            vec![Operand::Enum("Function", 7), Operand::Id(init)],
        );
        match self.functions.last_mut() {
            Some(func) => func.push_var(inst),
            None => {
                self.add_error(
                    v.span.clone(),
                    format!("function variable '{}' generated outside of a function", v.name),
                );
                return false;
            }
        }
        self.variable_ids.insert(var, id);

        if let (Some(init), None) = (v.initializer, constant_init) {
            let Some(value) = self.generate_expression(init) else {
                return false;
            };
            if self
                .push_inst(Instruction::new(
                    Op::Store,
                    vec![Operand::Id(id), Operand::Id(value)],
                ))
                .is_none()
            {
                return false;
            }
        }
        self.bind(&v.name, id);
        true
    }

    fn generate_decorations(&mut self, id: u32, v: &Variable) {
        for decoration in &v.decorations {
            let operands = match decoration.kind {
                DecorationKind::Location(n) => {
                    vec![Operand::Enum("Location", 30), Operand::Int(n)]
                }
                DecorationKind::Builtin(b) => {
                    vec![Operand::Enum("BuiltIn", 11), builtin_operand(b)]
                }
                DecorationKind::Binding(n) => vec![Operand::Enum("Binding", 33), Operand::Int(n)],
                DecorationKind::Group(n) => {
                    vec![Operand::Enum("DescriptorSet", 34), Operand::Int(n)]
                }
                DecorationKind::Access(AccessControl::Read) => {
                    vec![Operand::Enum("NonWritable", 24)]
                }
                DecorationKind::Access(AccessControl::Write) => {
                    vec![Operand::Enum("NonReadable", 25)]
                }
                DecorationKind::Access(AccessControl::ReadWrite) => continue,
            };
            let mut all = vec![Operand::Id(id)];
            all.extend(operands);
            self.annotations.push(Instruction::new(Op::Decorate, all));
        }
    }

    fn scalar_type_id(&mut self, kind: ScalarKind) -> u32 {
        let (key, op, operands) = match kind {
            ScalarKind::Bool => ("__bool", Op::TypeBool, vec![]),
            ScalarKind::Sint => ("__i32", Op::TypeInt, vec![Operand::Int(32), Operand::Int(1)]),
            ScalarKind::Uint => ("__u32", Op::TypeInt, vec![Operand::Int(32), Operand::Int(0)]),
            ScalarKind::Float => ("__f32", Op::TypeFloat, vec![Operand::Int(32)]),
        };
        if let Some(id) = self.type_ids.get(key) {
            return *id;
        }
        let id = self.next_id();
        self.types.push(Instruction::with_result(op, id, operands));
        self.type_ids.insert(key.to_string(), id);
        id
    }

    /// Declares `ty` once and returns its id. Aliases share the id of the
    /// aliased type.
    pub fn generate_type(&mut self, ty: Handle<Type>) -> Option<u32> {
        let module = self.module;
        let Some(t) = module.types.get(ty) else {
            self.add_error(Span::default(), "unknown type handle");
            return None;
        };
        match t {
            Type::Alias { base, .. } => return self.generate_type(*base),
            Type::Bool => return Some(self.scalar_type_id(ScalarKind::Bool)),
            Type::I32 => return Some(self.scalar_type_id(ScalarKind::Sint)),
            Type::U32 => return Some(self.scalar_type_id(ScalarKind::Uint)),
            Type::F32 => return Some(self.scalar_type_id(ScalarKind::Float)),
            Type::Vector { size, component } => {
                return self.generate_vector_type(*component, *size);
            }
            Type::Pointer { space, base } => return self.generate_pointer_type(*space, *base),
            _ => {}
        }

        let key = module.type_name_unaliased(ty);
        if let Some(id) = self.type_ids.get(&key) {
            return Some(*id);
        }
        let id = self.next_id();
        let inst = match t {
            Type::Void => Instruction::with_result(Op::TypeVoid, id, vec![]),
            Type::Matrix {
                columns,
                rows,
                component,
            } => {
                let column = self.generate_vector_type(*component, *rows)?;
                Instruction::with_result(
                    Op::TypeMatrix,
                    id,
                    vec![Operand::Id(column), Operand::Int(*columns)],
                )
            }
            Type::Array {
                base,
                size: Some(n),
            } => {
                let base = self.generate_type(*base)?;
                let len = self.generate_literal(&Literal::Uint(*n));
                Instruction::with_result(
                    Op::TypeArray,
                    id,
                    vec![Operand::Id(base), Operand::Id(len)],
                )
            }
            Type::Array { base, size: None } => {
                let base = self.generate_type(*base)?;
                Instruction::with_result(Op::TypeRuntimeArray, id, vec![Operand::Id(base)])
            }
            _ => {
                self.add_error(
                    Span::default(),
                    format!("unable to generate type '{}'", module.type_display(ty)),
                );
                return None;
            }
        };
        self.types.push(inst);
        self.type_ids.insert(key, id);
        Some(id)
    }

    pub(crate) fn generate_vector_type(
        &mut self,
        component: Handle<Type>,
        size: u32,
    ) -> Option<u32> {
        let key = format!("__vec_{}{}", size, self.module.type_name_unaliased(component));
        if let Some(id) = self.type_ids.get(&key) {
            return Some(*id);
        }
        let id = self.next_id();
        let component = self.generate_type(component)?;
        self.types.push(Instruction::with_result(
            Op::TypeVector,
            id,
            vec![Operand::Id(component), Operand::Int(size)],
        ));
        self.type_ids.insert(key, id);
        Some(id)
    }

    pub fn generate_pointer_type(&mut self, space: AddressSpace, base: Handle<Type>) -> Option<u32> {
        let key = format!("__ptr_{}{}", space, self.module.type_name_unaliased(base));
        if let Some(id) = self.type_ids.get(&key) {
            return Some(*id);
        }
        let Some(class) = storage_class(space) else {
            self.add_error(
                Span::default(),
                format!("no storage class for address space '{}'", space),
            );
            return None;
        };
        let id = self.next_id();
        let base = self.generate_type(base)?;
        self.types.push(Instruction::with_result(
            Op::TypePointer,
            id,
            vec![class, Operand::Id(base)],
        ));
        self.type_ids.insert(key, id);
        Some(id)
    }

    /// Pointer to the block wrapping a buffer variable of type `ty`.
    pub fn generate_block_pointer_type(
        &mut self,
        space: AddressSpace,
        ty: Handle<Type>,
    ) -> Option<u32> {
        let key = format!("__ptr_{}__block{}", space, self.module.type_name_unaliased(ty));
        if let Some(id) = self.type_ids.get(&key) {
            return Some(*id);
        }
        let Some(class) = storage_class(space) else {
            self.add_error(
                Span::default(),
                format!("no storage class for address space '{}'", space),
            );
            return None;
        };
        let id = self.next_id();
        let block = self.generate_block_type(space, ty)?;
        self.types.push(Instruction::with_result(
            Op::TypePointer,
            id,
            vec![class, Operand::Id(block)],
        ));
        self.type_ids.insert(key, id);
        Some(id)
    }

    /// `OpTypeStruct` with `ty` as its only member, decorated `Block` and
    /// laid out for `space`.
    fn generate_block_type(&mut self, space: AddressSpace, ty: Handle<Type>) -> Option<u32> {
        let key = format!("__block_{}{}", space, self.module.type_name_unaliased(ty));
        if let Some(id) = self.type_ids.get(&key) {
            return Some(*id);
        }
        let id = self.next_id();
        let member = self.generate_type(ty)?;
        self.types
            .push(Instruction::with_result(Op::TypeStruct, id, vec![Operand::Id(member)]));
        self.type_ids.insert(key, id);

        self.annotations.push(Instruction::new(
            Op::Decorate,
            vec![Operand::Id(id), Operand::Enum("Block", 2)],
        ));
        self.push_member_decoration(id, vec![Operand::Enum("Offset", 35), Operand::Int(0)]);
        self.generate_layout(space, ty)?;

        let mut element = self.module.unwrap_alias(ty);
        while let Some(Type::Array { base, .. }) = self.module.types.get(element) {
            element = self.module.unwrap_alias(*base);
        }
        if let Some(Type::Matrix { .. }) = self.module.types.get(element) {
            let (stride, _) = self.column_layout(space, element);
            self.push_member_decoration(id, vec![Operand::Enum("ColMajor", 5)]);
            self.push_member_decoration(
                id,
                vec![Operand::Enum("MatrixStride", 7), Operand::Int(stride)],
            );
        }
        Some(id)
    }

    fn push_member_decoration(&mut self, block: u32, decoration: Vec<Operand>) {
        let mut operands = vec![Operand::Id(block), Operand::Int(0)];
        operands.extend(decoration);
        self.annotations
            .push(Instruction::new(Op::MemberDecorate, operands));
    }

    /// Decorates every array type inside `ty` with its stride.
    fn generate_layout(&mut self, space: AddressSpace, ty: Handle<Type>) -> Option<()> {
        let ty = self.module.unwrap_alias(ty);
        let Some(Type::Array { base, .. }) = self.module.types.get(ty) else {
            return Some(());
        };
        let base = *base;
        let id = self.generate_type(ty)?;
        if self.strided.insert(id) {
            let (size, align) = self.layout(space, base);
            let mut stride = size.next_multiple_of(align);
            if space == AddressSpace::Uniform {
                stride = stride.next_multiple_of(16);
            }
            self.annotations.push(Instruction::new(
                Op::Decorate,
                vec![
                    Operand::Id(id),
                    Operand::Enum("ArrayStride", 6),
                    Operand::Int(stride),
                ],
            ));
        }
        self.generate_layout(space, base)
    }

    /// Stride and alignment of one column of the matrix `ty`.
    fn column_layout(&self, space: AddressSpace, ty: Handle<Type>) -> (u32, u32) {
        let Some(Type::Matrix { rows, .. }) = self.module.types.get(ty) else {
            return (0, 1);
        };
        let mut align = if *rows == 2 { 8 } else { 16 };
        if space == AddressSpace::Uniform {
            align = 16;
        }
        ((rows * 4).next_multiple_of(align), align)
    }

    /// Size and alignment in bytes of `ty` inside a buffer in `space`.
    fn layout(&self, space: AddressSpace, ty: Handle<Type>) -> (u32, u32) {
        let ty = self.module.unwrap_alias(ty);
        match self.module.types.get(ty) {
            Some(Type::Vector { size, .. }) => (size * 4, if *size == 2 { 8 } else { 16 }),
            Some(Type::Matrix { columns, .. }) => {
                let (stride, align) = self.column_layout(space, ty);
                (columns * stride, align)
            }
            Some(Type::Array { base, size }) => {
                let (elem_size, elem_align) = self.layout(space, *base);
                let mut stride = elem_size.next_multiple_of(elem_align);
                let mut align = elem_align;
                if space == AddressSpace::Uniform {
                    stride = stride.next_multiple_of(16);
                    align = align.max(16);
                }
                (stride * size.unwrap_or(1), align)
            }
            _ => (4, 4),
        }
    }

    pub(crate) fn generate_function_type(&mut self, ret: u32, params: &[u32]) -> u32 {
        let key = format!(
            "__func_{}_{}",
            ret,
            params
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join("_")
        );
        if let Some(id) = self.type_ids.get(&key) {
            return *id;
        }
        let id = self.next_id();
        let mut operands = vec![Operand::Id(ret)];
        operands.extend(params.iter().map(|p| Operand::Id(*p)));
        self.types
            .push(Instruction::with_result(Op::TypeFunction, id, operands));
        self.type_ids.insert(key, id);
        id
    }

    fn scalar_kind_of(literal: &Literal) -> ScalarKind {
        match literal {
            Literal::Bool(_) => ScalarKind::Bool,
            Literal::Sint(_) => ScalarKind::Sint,
            Literal::Uint(_) => ScalarKind::Uint,
            Literal::Float(_) => ScalarKind::Float,
        }
    }

    /// Declares a scalar constant once and returns its id.
    pub fn generate_literal(&mut self, literal: &Literal) -> u32 {
        let ty = self.scalar_type_id(Self::scalar_kind_of(literal));
        let key = literal.name();
        if let Some(id) = self.constant_ids.get(&key) {
            return *id;
        }
        let id = self.next_id();
        let inst = match literal {
            Literal::Bool(true) => Instruction::typed(Op::ConstantTrue, ty, id, vec![]),
            Literal::Bool(false) => Instruction::typed(Op::ConstantFalse, ty, id, vec![]),
            Literal::Sint(v) => Instruction::typed(Op::Constant, ty, id, vec![Operand::Sint(*v)]),
            Literal::Uint(v) => Instruction::typed(Op::Constant, ty, id, vec![Operand::Int(*v)]),
            Literal::Float(v) => {
                Instruction::typed(Op::Constant, ty, id, vec![Operand::Float(*v)])
            }
        };
        self.types.push(inst);
        self.constant_ids.insert(key, id);
        self.constants.insert(id);
        id
    }

    pub fn generate_null(&mut self, ty: Handle<Type>) -> Option<u32> {
        let type_id = self.generate_type(ty)?;
        let key = format!("__null{}", self.module.type_name_unaliased(ty));
        if let Some(id) = self.constant_ids.get(&key) {
            return Some(*id);
        }
        let id = self.next_id();
        self.types
            .push(Instruction::typed(Op::ConstantNull, type_id, id, vec![]));
        self.constant_ids.insert(key, id);
        self.constants.insert(id);
        Some(id)
    }

    fn generate_constant_composite(&mut self, ty: Handle<Type>, parts: Vec<u32>) -> Option<u32> {
        let type_id = self.generate_type(ty)?;
        let key = format!(
            "__composite{}_{}",
            self.module.type_name_unaliased(ty),
            parts
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join("_")
        );
        if let Some(id) = self.constant_ids.get(&key) {
            return Some(*id);
        }
        let id = self.next_id();
        self.types.push(Instruction::typed(
            Op::ConstantComposite,
            type_id,
            id,
            parts.iter().map(|p| Operand::Id(*p)).collect(),
        ));
        self.constant_ids.insert(key, id);
        self.constants.insert(id);
        self.composite_parts.insert(id, parts);
        Some(id)
    }

    /// True if `expr` can be emitted in the types and constants section.
    pub fn is_constant_expression(&self, expr: Handle<crate::ast::Expression>) -> bool {
        let module = self.module;
        match &module.expressions[expr].kind {
            ExpressionKind::ScalarConstructor(_) => true,
            ExpressionKind::TypeConstructor { ty, values } => {
                let target = module.unwrap_alias(*ty);
                let converts = module.is_scalar(target)
                    && values.first().is_some_and(|v| {
                        !matches!(
                            module.expressions[*v].kind,
                            ExpressionKind::ScalarConstructor(_)
                        ) && module.expressions[*v]
                            .result_type
                            .is_none_or(|t| !module.same_type(t, target))
                    });
                !converts && values.iter().all(|v| self.is_constant_expression(*v))
            }
            ExpressionKind::Identifier(segments) => {
                segments.len() == 1
                    && self
                        .lookup(&segments[0])
                        .is_some_and(|id| self.is_constant_id(id))
            }
            _ => false,
        }
    }

    /// Emits a constant expression into the types and constants section.
    pub fn generate_constant_expression(
        &mut self,
        expr: Handle<crate::ast::Expression>,
    ) -> Option<u32> {
        let module = self.module;
        let e = &module.expressions[expr];
        match &e.kind {
            ExpressionKind::ScalarConstructor(literal) => Some(self.generate_literal(literal)),
            ExpressionKind::Identifier(segments) if segments.len() == 1 => {
                match self.lookup(&segments[0]) {
                    Some(id) if self.is_constant_id(id) => Some(id),
                    _ => {
                        self.add_error(
                            e.span.clone(),
                            format!("'{}' is not a constant", segments[0]),
                        );
                        None
                    }
                }
            }
            ExpressionKind::TypeConstructor { ty, values } => {
                self.generate_constant_constructor(expr, *ty, values)
            }
            _ => {
                self.add_error(e.span.clone(), "initializer must be a constant expression");
                None
            }
        }
    }

    fn generate_constant_constructor(
        &mut self,
        expr: Handle<crate::ast::Expression>,
        ty: Handle<Type>,
        values: &[Handle<crate::ast::Expression>],
    ) -> Option<u32> {
        let module = self.module;
        if values.is_empty() {
            return self.generate_null(ty);
        }
        let target = module.unwrap_alias(ty);

        if module.is_scalar(target) {
            let value = values[0];
            if let ExpressionKind::ScalarConstructor(literal) = &module.expressions[value].kind {
                let kind = module.scalar_kind(target)?;
                return Some(self.generate_literal(&convert_literal(literal, kind)));
            }
            let same = module.expressions[value]
                .result_type
                .is_some_and(|t| module.same_type(t, target));
            if !same {
                let span = module.expressions[expr].span.clone();
                self.add_error(span, "unsupported conversion in constant expression");
                return None;
            }
            return self.generate_constant_expression(value);
        }

        // the composite type takes its id before the constituents
        self.generate_type(ty)?;
        let mut parts = vec![];
        for value in values {
            let id = self.generate_constant_expression(*value)?;
            parts.push(id);
        }

        if let Type::Vector { size, .. } = module.types[target] {
            let mut flat = vec![];
            for part in parts {
                match self.composite_parts.get(&part) {
                    Some(inner) => flat.extend(inner.iter().copied()),
                    None => flat.push(part),
                }
            }
            if flat.len() == 1 {
                flat = vec![flat[0]; size as usize];
            }
            if flat.len() != size as usize {
                let span = module.expressions[expr].span.clone();
                self.add_error(span, "wrong number of components in vector constant");
                return None;
            }
            parts = flat;
        }
        self.generate_constant_composite(ty, parts)
    }

    /// The whole module as a SPIR-V binary.
    pub fn module_words(&self) -> Vec<u32> {
        let mut words = vec![MAGIC_NUMBER, VERSION, 0, self.next_id, 0];
        for section in [
            &self.capabilities,
            &self.ext_imports,
            &self.memory_model,
            &self.entry_points,
            &self.execution_modes,
            &self.debug,
            &self.annotations,
            &self.types,
        ] {
            for inst in section {
                inst.write_words(&mut words);
            }
        }
        for func in &self.functions {
            func.write_words(&mut words);
        }
        words
    }

    /// Disassembly of the whole module in binary order.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for section in [
            &self.capabilities,
            &self.ext_imports,
            &self.memory_model,
            &self.entry_points,
            &self.execution_modes,
            &self.debug,
            &self.annotations,
            &self.types,
        ] {
            out.push_str(&dump_instructions(section));
        }
        for func in &self.functions {
            out.push_str(&dump_instructions(&func.all_instructions()));
        }
        out
    }
}

/// Converts a scalar literal to another scalar kind.
fn convert_literal(literal: &Literal, kind: ScalarKind) -> Literal {
    let as_f32 = match literal {
        Literal::Bool(b) => *b as u32 as f32,
        Literal::Sint(v) => *v as f32,
        Literal::Uint(v) => *v as f32,
        Literal::Float(v) => *v,
    };
    match (literal, kind) {
        (_, ScalarKind::Bool) => Literal::Bool(as_f32 != 0.0),
        (Literal::Uint(v), ScalarKind::Sint) => Literal::Sint(*v as i32),
        (Literal::Sint(v), ScalarKind::Uint) => Literal::Uint(*v as u32),
        (Literal::Sint(v), ScalarKind::Sint) => Literal::Sint(*v),
        (Literal::Uint(v), ScalarKind::Uint) => Literal::Uint(*v),
        (_, ScalarKind::Sint) => Literal::Sint(as_f32 as i32),
        (_, ScalarKind::Uint) => Literal::Uint(as_f32 as u32),
        (_, ScalarKind::Float) => Literal::Float(as_f32),
    }
}
