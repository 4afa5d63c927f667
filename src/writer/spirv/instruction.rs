use std::fmt::{self, Display, Formatter};

/// Opcodes emitted by the generator. Discriminants are the binary opcode
/// numbers; the `Debug` name prefixed with `Op` is the mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Op {
    Name = 5,
    ExtInstImport = 11,
    ExtInst = 12,
    MemoryModel = 14,
    EntryPoint = 15,
    ExecutionMode = 16,
    Capability = 17,
    TypeVoid = 19,
    TypeBool = 20,
    TypeInt = 21,
    TypeFloat = 22,
    TypeVector = 23,
    TypeMatrix = 24,
    TypeArray = 28,
    TypeRuntimeArray = 29,
    TypeStruct = 30,
    TypePointer = 32,
    TypeFunction = 33,
    ConstantTrue = 41,
    ConstantFalse = 42,
    Constant = 43,
    ConstantComposite = 44,
    ConstantNull = 46,
    Function = 54,
    FunctionParameter = 55,
    FunctionEnd = 56,
    FunctionCall = 57,
    Variable = 59,
    Load = 61,
    Store = 62,
    AccessChain = 65,
    Decorate = 71,
    MemberDecorate = 72,
    VectorExtractDynamic = 77,
    VectorShuffle = 79,
    CompositeConstruct = 80,
    CompositeExtract = 81,
    ConvertFToU = 109,
    ConvertFToS = 110,
    ConvertSToF = 111,
    ConvertUToF = 112,
    Bitcast = 124,
    SNegate = 126,
    FNegate = 127,
    IAdd = 128,
    FAdd = 129,
    ISub = 130,
    FSub = 131,
    IMul = 132,
    FMul = 133,
    UDiv = 134,
    SDiv = 135,
    FDiv = 136,
    UMod = 137,
    SMod = 139,
    FMod = 141,
    VectorTimesScalar = 142,
    MatrixTimesScalar = 143,
    VectorTimesMatrix = 144,
    MatrixTimesVector = 145,
    MatrixTimesMatrix = 146,
    LogicalEqual = 164,
    LogicalNotEqual = 165,
    LogicalOr = 166,
    LogicalAnd = 167,
    LogicalNot = 168,
    Select = 169,
    IEqual = 170,
    INotEqual = 171,
    UGreaterThan = 172,
    SGreaterThan = 173,
    UGreaterThanEqual = 174,
    SGreaterThanEqual = 175,
    ULessThan = 176,
    SLessThan = 177,
    ULessThanEqual = 178,
    SLessThanEqual = 179,
    FOrdEqual = 180,
    FOrdNotEqual = 182,
    FOrdLessThan = 184,
    FOrdGreaterThan = 186,
    FOrdLessThanEqual = 188,
    FOrdGreaterThanEqual = 190,
    ShiftRightLogical = 194,
    ShiftRightArithmetic = 195,
    ShiftLeftLogical = 196,
    BitwiseOr = 197,
    BitwiseXor = 198,
    BitwiseAnd = 199,
    Not = 200,
    LoopMerge = 246,
    SelectionMerge = 247,
    Label = 248,
    Branch = 249,
    BranchConditional = 250,
    Kill = 252,
    Return = 253,
    ReturnValue = 254,
    Unreachable = 255,
}

impl Op {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Ends a basic block.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            Op::Branch
                | Op::BranchConditional
                | Op::Kill
                | Op::Return
                | Op::ReturnValue
                | Op::Unreachable
        )
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Op{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Reference to a result id.
    Id(u32),
    /// Literal word.
    Int(u32),
    /// Signed literal, encoded as its two's complement word.
    Sint(i32),
    /// Float literal, encoded as its bit pattern.
    Float(f32),
    /// Named enumerant, e.g. a storage class or decoration.
    Enum(&'static str, u32),
    /// Null-terminated UTF-8 string literal padded to a word boundary.
    String(String),
}

impl Operand {
    fn write_words(&self, out: &mut Vec<u32>) {
        match self {
            Operand::Id(v) | Operand::Int(v) | Operand::Enum(_, v) => out.push(*v),
            Operand::Sint(v) => out.push(*v as u32),
            Operand::Float(v) => out.push(v.to_bits()),
            Operand::String(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                while bytes.len() % 4 != 0 {
                    bytes.push(0);
                }
                for chunk in bytes.chunks(4) {
                    out.push(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
                }
            }
        }
    }

    fn word_count(&self) -> usize {
        match self {
            Operand::String(s) => s.len() / 4 + 1,
            _ => 1,
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Operand::Id(id) => write!(f, "%{}", id),
            Operand::Int(v) => write!(f, "{}", v),
            Operand::Sint(v) => write!(f, "{}", v),
            Operand::Float(v) => write!(f, "{}", v),
            Operand::Enum(name, _) => write!(f, "{}", name),
            Operand::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: Op,
    pub result_type: Option<u32>,
    pub result_id: Option<u32>,
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// An instruction without a result, e.g. `OpStore`.
    pub fn new(op: Op, operands: Vec<Operand>) -> Self {
        Instruction {
            op,
            result_type: None,
            result_id: None,
            operands,
        }
    }

    /// An instruction that defines `id` without a result type, e.g. a type
    /// declaration.
    pub fn with_result(op: Op, id: u32, operands: Vec<Operand>) -> Self {
        Instruction {
            op,
            result_type: None,
            result_id: Some(id),
            operands,
        }
    }

    /// An instruction that defines `id` of type `ty`.
    pub fn typed(op: Op, ty: u32, id: u32, operands: Vec<Operand>) -> Self {
        Instruction {
            op,
            result_type: Some(ty),
            result_id: Some(id),
            operands,
        }
    }

    pub fn word_count(&self) -> usize {
        1 + self.result_type.is_some() as usize
            + self.result_id.is_some() as usize
            + self.operands.iter().map(Operand::word_count).sum::<usize>()
    }

    pub fn write_words(&self, out: &mut Vec<u32>) {
        out.push(((self.word_count() as u32) << 16) | self.op.code());
        if let Some(ty) = self.result_type {
            out.push(ty);
        }
        if let Some(id) = self.result_id {
            out.push(id);
        }
        for operand in &self.operands {
            operand.write_words(out);
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if let Some(id) = self.result_id {
            write!(f, "%{} = ", id)?;
        }
        write!(f, "{}", self.op)?;
        if let Some(ty) = self.result_type {
            write!(f, " %{}", ty)?;
        }
        for operand in &self.operands {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

/// Disassembly of `instructions`, one per line.
pub fn dump_instructions(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for inst in instructions {
        out.push_str(&inst.to_string());
        out.push('\n');
    }
    out
}
