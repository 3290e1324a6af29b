use std::fmt;

/// Opcodes of the three-address intermediate form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Func,
    EndFunc,
    Block,
    EndBlock,
    Alloc,
    Param,
    Add,
    Sub,
    Mult,
    Div,
    Comp,
    Brgt,
    Brgeq,
    Brlt,
    Brleq,
    Breq,
    Brneq,
    Disp,
    Arg,
    Call,
    Assign,
    Return,
}

impl Opcode {
    /// Branch-if-false opcode for a relational operator: the emitted branch
    /// is the logical inverse of the comparison.
    pub fn inverse_branch(rel_op: &str) -> Option<Opcode> {
        match rel_op {
            "<=" => Some(Opcode::Brgt),
            "<" => Some(Opcode::Brgeq),
            ">" => Some(Opcode::Brleq),
            ">=" => Some(Opcode::Brlt),
            "==" => Some(Opcode::Brneq),
            "!=" => Some(Opcode::Breq),
            _ => None,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Opcode::Brgt
                | Opcode::Brgeq
                | Opcode::Brlt
                | Opcode::Brleq
                | Opcode::Breq
                | Opcode::Brneq
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Opcode::Func => "func",
            Opcode::EndFunc => "end func",
            Opcode::Block => "block",
            Opcode::EndBlock => "end block",
            Opcode::Alloc => "alloc",
            Opcode::Param => "param",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mult => "mult",
            Opcode::Div => "div",
            Opcode::Comp => "comp",
            Opcode::Brgt => "BRGT",
            Opcode::Brgeq => "BRGEQ",
            Opcode::Brlt => "BRLT",
            Opcode::Brleq => "BRLEQ",
            Opcode::Breq => "BREQ",
            Opcode::Brneq => "BRNEQ",
            Opcode::Disp => "disp",
            Opcode::Arg => "arg",
            Opcode::Call => "call",
            Opcode::Assign => "assign",
            Opcode::Return => "return",
        };
        f.write_str(s)
    }
}

/// One emitted instruction. `index` is 1-based and never reused; only the
/// `result` field of a branch is ever rewritten, by backpatching.
#[derive(Clone, Debug, PartialEq)]
pub struct Quadruple {
    pub index: usize,
    pub opcode: Opcode,
    pub operand1: String,
    pub operand2: String,
    pub result: String,
}

/// The quadruple list together with the two pieces of codegen state that the
/// parsing routines share: the temporary arena and the backpatch stack. Both
/// are owned here, never ambient.
#[derive(Debug, Default)]
pub struct QuadTable {
    quads: Vec<Quadruple>,
    temps: usize,
    backpatches: Vec<usize>,
}

impl QuadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a quadruple, returning its 1-based index.
    pub fn emit(
        &mut self,
        opcode: Opcode,
        operand1: impl Into<String>,
        operand2: impl Into<String>,
        result: impl Into<String>,
    ) -> usize {
        let index = self.quads.len() + 1;
        self.quads.push(Quadruple {
            index,
            opcode,
            operand1: operand1.into(),
            operand2: operand2.into(),
            result: result.into(),
        });
        index
    }

    /// Allocates a fresh temporary name from the arena.
    pub fn new_temp(&mut self) -> String {
        let name = format!("_t{}", self.temps);
        self.temps += 1;
        name
    }

    /// Index one past the last emitted quadruple, the target a completed
    /// conditional block patches its branches to.
    pub fn next_index(&self) -> usize {
        self.quads.len() + 1
    }

    /// Records `index` as awaiting a branch target.
    pub fn push_backpatch(&mut self, index: usize) {
        self.backpatches.push(index);
    }

    pub fn backpatch_depth(&self) -> usize {
        self.backpatches.len()
    }

    /// Pops pending entries down to `depth`, rewriting each branch's result
    /// field to `target`. Most recent first; quadruples are never reordered.
    pub fn patch_to_depth(&mut self, depth: usize, target: usize) {
        while self.backpatches.len() > depth {
            let index = self.backpatches.pop().unwrap();
            self.quads[index - 1].result = target.to_string();
        }
    }

    pub fn quads(&self) -> &[Quadruple] {
        &self.quads
    }

    /// Overwrites the result field of an already-emitted quadruple. Used for
    /// the parameter count of a `func` quadruple.
    pub fn set_result(&mut self, index: usize, result: impl Into<String>) {
        self.quads[index - 1].result = result.into();
    }

    pub fn into_quads(self) -> Vec<Quadruple> {
        self.quads
    }
}
