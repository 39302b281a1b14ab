//! The loaded, validated program.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::instruction::Instruction;

/// A label declaration in parse order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDef {
    /// The label name.
    pub name: String,
    /// The instruction index the label points at. May equal the instruction
    /// count for a trailing label; jumping there halts the story.
    pub index: usize,
}

/// An immutable, fully resolved instruction sequence.
///
/// Produced once by the loader. Every branch target has been checked against
/// the label table, so the engine can treat a jump as an O(1) index lookup
/// and treat a missing label at runtime as an internal-consistency fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
    /// Declarations in parse order, kept for faithful re-serialization.
    label_order: Vec<LabelDef>,
}

impl Program {
    /// Assemble a program from loader output. Crate-internal: the loader is
    /// the only producer, and it guarantees label table consistency.
    pub(crate) fn new(
        instructions: Vec<Instruction>,
        labels: HashMap<String, usize>,
        label_order: Vec<LabelDef>,
    ) -> Self {
        Self {
            instructions,
            labels,
            label_order,
        }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program contains no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instruction at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// All instructions in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Resolve a label name to its instruction index.
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Label declarations in parse order.
    pub fn labels(&self) -> &[LabelDef] {
        &self.label_order
    }

    /// Render the program back to the textual stream format.
    ///
    /// Labels and instructions come out in their original order, so loading
    /// the result yields an identical program.
    pub fn to_stream(&self) -> String {
        let mut out = String::new();
        let mut next_label = 0;
        for (index, instruction) in self.instructions.iter().enumerate() {
            while next_label < self.label_order.len() && self.label_order[next_label].index == index
            {
                let _ = writeln!(out, "{}:", self.label_order[next_label].name);
                next_label += 1;
            }
            let _ = writeln!(out, "{instruction}");
        }
        // Trailing labels point one past the last instruction.
        while next_label < self.label_order.len() {
            let _ = writeln!(out, "{}:", self.label_order[next_label].name);
            next_label += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Program {
        let instructions = vec![
            Instruction::Narrate {
                text: "Hello".into(),
            },
            Instruction::Goto {
                label: "done".into(),
            },
            Instruction::End,
        ];
        let mut labels = HashMap::new();
        labels.insert("start".to_string(), 0);
        labels.insert("done".to_string(), 2);
        let label_order = vec![
            LabelDef {
                name: "start".into(),
                index: 0,
            },
            LabelDef {
                name: "done".into(),
                index: 2,
            },
        ];
        Program::new(instructions, labels, label_order)
    }

    #[test]
    fn label_lookup() {
        let program = sample();
        assert_eq!(program.label_index("start"), Some(0));
        assert_eq!(program.label_index("done"), Some(2));
        assert_eq!(program.label_index("missing"), None);
    }

    #[test]
    fn to_stream_preserves_order() {
        let program = sample();
        let stream = program.to_stream();
        assert_eq!(
            stream,
            "start:\nnarrate(\"Hello\")\ngoto(done)\ndone:\nend()\n"
        );
    }

    #[test]
    fn trailing_label_is_emitted() {
        let instructions = vec![Instruction::Narrate {
            text: "Hi".into(),
        }];
        let mut labels = HashMap::new();
        labels.insert("fin".to_string(), 1);
        let program = Program::new(
            instructions,
            labels,
            vec![LabelDef {
                name: "fin".into(),
                index: 1,
            }],
        );
        assert_eq!(program.to_stream(), "narrate(\"Hi\")\nfin:\n");
    }
}
