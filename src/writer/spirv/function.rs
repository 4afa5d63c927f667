use super::instruction::{Instruction, Op};

/// A function body under construction.
///
/// Local `OpVariable`s must lead the first block, so they are collected apart
/// from the other instructions and only merged when the function is written.
#[derive(Debug, Clone, Default)]
pub struct Function {
    declaration: Option<Instruction>,
    label: Option<Instruction>,
    params: Vec<Instruction>,
    variables: Vec<Instruction>,
    instructions: Vec<Instruction>,
}

impl Function {
    pub fn new(declaration: Instruction, label: Instruction, params: Vec<Instruction>) -> Self {
        Function {
            declaration: Some(declaration),
            label: Some(label),
            params,
            variables: vec![],
            instructions: vec![],
        }
    }

    /// Result id of the `OpFunction`, if this function has a declaration.
    pub fn id(&self) -> Option<u32> {
        self.declaration.as_ref().and_then(|d| d.result_id)
    }

    pub fn variables(&self) -> &[Instruction] {
        &self.variables
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn push_var(&mut self, inst: Instruction) {
        self.variables.push(inst);
    }

    pub fn push_inst(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    /// True if the current block already ended with a branch, return or kill.
    pub fn is_terminated(&self) -> bool {
        self.instructions.last().is_some_and(|i| i.op.is_terminator())
    }

    /// Every instruction of the function in binary order, ending with
    /// `OpFunctionEnd`.
    pub fn all_instructions(&self) -> Vec<Instruction> {
        let mut out = vec![];
        out.extend(self.declaration.iter().cloned());
        out.extend(self.params.iter().cloned());
        out.extend(self.label.iter().cloned());
        out.extend(self.variables.iter().cloned());
        out.extend(self.instructions.iter().cloned());
        if self.declaration.is_some() {
            out.push(Instruction::new(Op::FunctionEnd, vec![]));
        }
        out
    }

    pub fn write_words(&self, out: &mut Vec<u32>) {
        for inst in self.all_instructions() {
            inst.write_words(out);
        }
    }
}
