//! The closed instruction set understood by the execution engine.
//!
//! Every compiled statement becomes one variant of [`Instruction`]; the
//! engine matches the set exhaustively, so an unhandled command cannot slip
//! through as a string. `Display` renders an instruction back to the textual
//! stream format, which is what makes `Program::to_stream` a faithful
//! round-trip.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// An operand in argument position: a literal or a bare variable reference.
///
/// Quoted strings and integer tokens are literals; bare identifiers refer to
/// a variable and are resolved through the store at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A literal value.
    Literal(Value),
    /// A reference to a variable by name.
    Var(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(Value::Int(n)) => write!(f, "{n}"),
            Operand::Literal(Value::Bool(b)) => write!(f, "{b}"),
            Operand::Literal(Value::Text(s)) => write!(f, "\"{s}\""),
            Operand::Var(name) => write!(f, "{name}"),
        }
    }
}

/// One `value:label` pair in a `switch` target list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchArm {
    /// The literal value to match against.
    pub value: Value,
    /// The label to jump to on an exact match.
    pub target: String,
}

/// A single compiled StoryScript instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Emit narration text.
    Narrate {
        /// The text to narrate.
        text: String,
    },
    /// Emit spoken dialogue text.
    Say {
        /// The text spoken.
        text: String,
    },
    /// Emit `text` with every `{}` placeholder replaced by a variable's value.
    FormatText {
        /// The variable whose value is interpolated.
        var: String,
        /// The template text.
        text: String,
    },
    /// Advisory pause; the host decides whether to actually wait.
    Pause {
        /// Suggested pause length in seconds.
        seconds: u64,
    },
    /// Advisory wait for a keypress; the host decides how to collect it.
    WaitForKey,
    /// Suspend execution until the host supplies an integer.
    Input {
        /// The variable that receives the answer.
        var: String,
    },
    /// Unconditional jump.
    Goto {
        /// Target label.
        label: String,
    },
    /// Halt the story.
    End,
    /// No-op placeholder kept for compatibility with compiled output.
    Return,
    /// Reset all mutable state and re-enter the idle state at instruction 0.
    StoryRestart,
    /// Jump to `target` when the variable is truthy; fall through otherwise.
    If {
        /// The variable tested.
        var: String,
        /// Target label on a truthy value.
        target: String,
    },
    /// Two-way branch on a variable's truthiness.
    IfElse {
        /// The variable tested.
        var: String,
        /// Target label on a truthy value.
        when_true: String,
        /// Target label on a falsy value.
        when_false: String,
    },
    /// Ordered first-exact-match dispatch on a variable's value.
    Switch {
        /// The variable dispatched on.
        var: String,
        /// The `value:label` pairs, matched in declaration order.
        arms: Vec<SwitchArm>,
    },
    /// Suspend with N options; the answer picks the positionally matching label.
    Choice {
        /// Option texts shown to the player.
        options: Vec<String>,
        /// Jump targets, one per option.
        targets: Vec<String>,
    },
    /// Suspend with a yes/no prompt; answer 1 is yes, 2 is no.
    Confirm {
        /// The question shown to the player.
        prompt: String,
        /// Target label on yes.
        when_true: String,
        /// Target label on no.
        when_false: String,
    },
    /// Set a variable.
    Assign {
        /// The variable written.
        var: String,
        /// The value assigned.
        value: Operand,
    },
    /// Add to a variable (integer).
    Increase {
        /// The variable read and written.
        var: String,
        /// The amount added.
        amount: Operand,
    },
    /// Subtract from a variable (integer).
    Decrease {
        /// The variable read and written.
        var: String,
        /// The amount subtracted.
        amount: Operand,
    },
    /// Multiply a variable (integer).
    Scale {
        /// The variable read and written.
        var: String,
        /// The multiplication factor.
        factor: Operand,
    },
    /// Divide a variable (integer); division by zero is a runtime fault.
    DivideBy {
        /// The variable read and written.
        var: String,
        /// The divisor.
        divisor: Operand,
    },
    /// Store a uniform random integer from `[0, range)`.
    Randomize {
        /// The variable written.
        var: String,
        /// Exclusive upper bound of the random range.
        range: Operand,
    },
    /// Logical AND of two truthiness tests; writes 0 or 1.
    Both {
        /// The variable written.
        var: String,
        /// Left operand.
        left: Operand,
        /// Right operand.
        right: Operand,
    },
    /// Logical OR of two truthiness tests; writes 0 or 1.
    Either {
        /// The variable written.
        var: String,
        /// Left operand.
        left: Operand,
        /// Right operand.
        right: Operand,
    },
    /// Flip a variable's truthiness in place; writes 0 or 1.
    Invert {
        /// The variable read and written.
        var: String,
    },
    /// Store the combined length of two strings (the documented numeric result).
    Combine {
        /// The variable written.
        var: String,
        /// First string.
        left: Operand,
        /// Second string.
        right: Operand,
    },
    /// Store the character count of a string.
    LengthOf {
        /// The variable written.
        var: String,
        /// The measured string.
        text: Operand,
    },
    /// Test whether the variable's current text contains `needle`; writes 0 or 1.
    SubstringIn {
        /// The variable read and written.
        var: String,
        /// The substring searched for.
        needle: Operand,
    },
    /// Store the uppercased form of a string.
    Uppercase {
        /// The variable written.
        var: String,
        /// The source string.
        text: Operand,
    },
    /// Store the lowercased form of a string.
    Lowercase {
        /// The variable written.
        var: String,
        /// The source string.
        text: Operand,
    },
    /// Create a named, empty inventory.
    CreateInventory {
        /// Inventory name.
        inventory: String,
    },
    /// Append an item to an inventory (duplicates allowed).
    AddToInventory {
        /// Inventory name.
        inventory: String,
        /// Item name.
        item: String,
    },
    /// Remove the first occurrence of an item from an inventory.
    RemoveItem {
        /// Inventory name.
        inventory: String,
        /// Item name.
        item: String,
    },
    /// Test whether an inventory holds an item.
    HasItem {
        /// Inventory name.
        inventory: String,
        /// Item name.
        item: String,
        /// Variable that receives 0/1; narrates the answer when absent.
        var: Option<String>,
    },
    /// Store an inventory's item count.
    CountInventory {
        /// Inventory name.
        inventory: String,
        /// The variable written.
        var: String,
    },
    /// Remove every item from an inventory.
    ClearInventory {
        /// Inventory name.
        inventory: String,
    },
    /// Narrate an inventory's contents in insertion order.
    ShowInventory {
        /// Inventory name.
        inventory: String,
    },
    /// Register a character with empty emotion, description, and status.
    AddCharacter {
        /// Character name.
        name: String,
    },
    /// Remove a character from the registry.
    RemoveCharacter {
        /// Character name.
        name: String,
    },
    /// Set a character's emotion.
    SetCharacterEmotion {
        /// Character name.
        name: String,
        /// The new emotion.
        emotion: String,
    },
    /// Move a character's record to a new name.
    ChangeName {
        /// Existing character name.
        from: String,
        /// New character name.
        to: String,
    },
    /// Set a character's description.
    SetCharacterDescription {
        /// Character name.
        name: String,
        /// The new description.
        text: String,
    },
    /// Set a character's status.
    CharacterStatus {
        /// Character name.
        name: String,
        /// The new status.
        status: String,
    },
    /// Read a character's status into a variable, or narrate it.
    CheckStatus {
        /// Character name.
        name: String,
        /// Variable that receives the status text; narrates when absent.
        var: Option<String>,
    },
    /// Set the current background silently.
    SetBackground {
        /// Background name.
        name: String,
    },
    /// Set the current background and narrate the transition.
    TriggerScene {
        /// Background name.
        name: String,
    },
    /// Set the current time of day.
    SetTimeOfDay {
        /// Free-form time-of-day text.
        value: String,
    },
    /// Read the current time of day into a variable, or narrate it.
    CheckTimeOfDay {
        /// Variable that receives the time text; narrates when absent.
        var: Option<String>,
    },
    /// Jump to one of the declared labels, chosen uniformly at random.
    RandomEvent {
        /// Candidate jump targets.
        targets: Vec<String>,
    },
}

impl Instruction {
    /// Branch-target label names referenced by this instruction.
    ///
    /// Used by the loader to validate every target against the label table
    /// before execution begins.
    pub fn branch_targets(&self) -> Vec<&str> {
        match self {
            Instruction::Goto { label } => vec![label],
            Instruction::If { target, .. } => vec![target],
            Instruction::IfElse {
                when_true,
                when_false,
                ..
            }
            | Instruction::Confirm {
                when_true,
                when_false,
                ..
            } => vec![when_true, when_false],
            Instruction::Switch { arms, .. } => {
                arms.iter().map(|arm| arm.target.as_str()).collect()
            }
            Instruction::Choice { targets, .. } | Instruction::RandomEvent { targets } => {
                targets.iter().map(String::as_str).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn quoted_list(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "\"{item}\"")?;
    }
    Ok(())
}

fn label_list(f: &mut fmt::Formatter<'_>, labels: &[String]) -> fmt::Result {
    write!(f, "[")?;
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{label}")?;
    }
    write!(f, "]")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Narrate { text } => write!(f, "narrate(\"{text}\")"),
            Instruction::Say { text } => write!(f, "say(\"{text}\")"),
            Instruction::FormatText { var, text } => write!(f, "format_text({var}, \"{text}\")"),
            Instruction::Pause { seconds } => write!(f, "pause({seconds})"),
            Instruction::WaitForKey => write!(f, "wait_for_key()"),
            Instruction::Input { var } => write!(f, "input({var})"),
            Instruction::Goto { label } => write!(f, "goto({label})"),
            Instruction::End => write!(f, "end()"),
            Instruction::Return => write!(f, "return()"),
            Instruction::StoryRestart => write!(f, "story_restart()"),
            Instruction::If { var, target } => write!(f, "if({var}) -> {target}"),
            Instruction::IfElse {
                var,
                when_true,
                when_false,
            } => write!(f, "ifelse({var}) -> [{when_true}, {when_false}]"),
            Instruction::Switch { var, arms } => {
                write!(f, "switch({var}) -> [")?;
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match &arm.value {
                        Value::Text(s) => write!(f, "\"{s}\":{}", arm.target)?,
                        other => write!(f, "{other}:{}", arm.target)?,
                    }
                }
                write!(f, "]")
            }
            Instruction::Choice { options, targets } => {
                write!(f, "choice(")?;
                quoted_list(f, options)?;
                write!(f, ") -> ")?;
                label_list(f, targets)
            }
            Instruction::Confirm {
                prompt,
                when_true,
                when_false,
            } => write!(f, "confirm(\"{prompt}\") -> [{when_true}, {when_false}]"),
            Instruction::Assign { var, value } => write!(f, "assign({var}, {value})"),
            Instruction::Increase { var, amount } => write!(f, "increase({var}, {amount})"),
            Instruction::Decrease { var, amount } => write!(f, "decrease({var}, {amount})"),
            Instruction::Scale { var, factor } => write!(f, "scale({var}, {factor})"),
            Instruction::DivideBy { var, divisor } => write!(f, "divide_by({var}, {divisor})"),
            Instruction::Randomize { var, range } => write!(f, "randomize({var}, {range})"),
            Instruction::Both { var, left, right } => write!(f, "both({var}, {left}, {right})"),
            Instruction::Either { var, left, right } => {
                write!(f, "either({var}, {left}, {right})")
            }
            Instruction::Invert { var } => write!(f, "invert({var})"),
            Instruction::Combine { var, left, right } => {
                write!(f, "combine({var}, {left}, {right})")
            }
            Instruction::LengthOf { var, text } => write!(f, "length_of({var}, {text})"),
            Instruction::SubstringIn { var, needle } => {
                write!(f, "substring_in({var}, {needle})")
            }
            Instruction::Uppercase { var, text } => write!(f, "uppercase({var}, {text})"),
            Instruction::Lowercase { var, text } => write!(f, "lowercase({var}, {text})"),
            Instruction::CreateInventory { inventory } => {
                write!(f, "create_inventory(\"{inventory}\")")
            }
            Instruction::AddToInventory { inventory, item } => {
                write!(f, "add_to_inventory(\"{inventory}\", \"{item}\")")
            }
            Instruction::RemoveItem { inventory, item } => {
                write!(f, "remove_item(\"{inventory}\", \"{item}\")")
            }
            Instruction::HasItem {
                inventory,
                item,
                var,
            } => match var {
                Some(var) => write!(f, "has_item(\"{inventory}\", \"{item}\", {var})"),
                None => write!(f, "has_item(\"{inventory}\", \"{item}\")"),
            },
            Instruction::CountInventory { inventory, var } => {
                write!(f, "count_inventory(\"{inventory}\", {var})")
            }
            Instruction::ClearInventory { inventory } => {
                write!(f, "clear_inventory(\"{inventory}\")")
            }
            Instruction::ShowInventory { inventory } => {
                write!(f, "show_inventory(\"{inventory}\")")
            }
            Instruction::AddCharacter { name } => write!(f, "add_character(\"{name}\")"),
            Instruction::RemoveCharacter { name } => write!(f, "remove_character(\"{name}\")"),
            Instruction::SetCharacterEmotion { name, emotion } => {
                write!(f, "set_character_emotion(\"{name}\", \"{emotion}\")")
            }
            Instruction::ChangeName { from, to } => {
                write!(f, "change_name(\"{from}\", \"{to}\")")
            }
            Instruction::SetCharacterDescription { name, text } => {
                write!(f, "set_character_description(\"{name}\", \"{text}\")")
            }
            Instruction::CharacterStatus { name, status } => {
                write!(f, "character_status(\"{name}\", \"{status}\")")
            }
            Instruction::CheckStatus { name, var } => match var {
                Some(var) => write!(f, "check_status(\"{name}\", {var})"),
                None => write!(f, "check_status(\"{name}\")"),
            },
            Instruction::SetBackground { name } => write!(f, "set_background(\"{name}\")"),
            Instruction::TriggerScene { name } => write!(f, "trigger_scene(\"{name}\")"),
            Instruction::SetTimeOfDay { value } => write!(f, "set_time_of_day(\"{value}\")"),
            Instruction::CheckTimeOfDay { var } => match var {
                Some(var) => write!(f, "check_time_of_day({var})"),
                None => write!(f, "check_time_of_day()"),
            },
            Instruction::RandomEvent { targets } => {
                write!(f, "random_event() -> ")?;
                label_list(f, targets)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_targets_of_jumps() {
        let goto = Instruction::Goto {
            label: "done".into(),
        };
        assert_eq!(goto.branch_targets(), vec!["done"]);

        let choice = Instruction::Choice {
            options: vec!["A".into(), "B".into()],
            targets: vec!["la".into(), "lb".into()],
        };
        assert_eq!(choice.branch_targets(), vec!["la", "lb"]);

        let switch = Instruction::Switch {
            var: "mode".into(),
            arms: vec![
                SwitchArm {
                    value: Value::Text("a".into()),
                    target: "la".into(),
                },
                SwitchArm {
                    value: Value::Int(2),
                    target: "lb".into(),
                },
            ],
        };
        assert_eq!(switch.branch_targets(), vec!["la", "lb"]);
    }

    #[test]
    fn narration_has_no_targets() {
        let narrate = Instruction::Narrate {
            text: "Hello".into(),
        };
        assert!(narrate.branch_targets().is_empty());
    }

    #[test]
    fn display_round_trips_simple_forms() {
        let cases = [
            (
                Instruction::Narrate {
                    text: "Hello".into(),
                },
                "narrate(\"Hello\")",
            ),
            (
                Instruction::Goto {
                    label: "done".into(),
                },
                "goto(done)",
            ),
            (Instruction::End, "end()"),
            (
                Instruction::Assign {
                    var: "x".into(),
                    value: Operand::Literal(Value::Int(5)),
                },
                "assign(x, 5)",
            ),
            (
                Instruction::IfElse {
                    var: "flag".into(),
                    when_true: "yes".into(),
                    when_false: "no".into(),
                },
                "ifelse(flag) -> [yes, no]",
            ),
            (
                Instruction::HasItem {
                    inventory: "bag".into(),
                    item: "key".into(),
                    var: Some("found".into()),
                },
                "has_item(\"bag\", \"key\", found)",
            ),
        ];
        for (instruction, expected) in cases {
            assert_eq!(instruction.to_string(), expected);
        }
    }

    #[test]
    fn display_switch_arms() {
        let switch = Instruction::Switch {
            var: "mode".into(),
            arms: vec![
                SwitchArm {
                    value: Value::Text("a".into()),
                    target: "la".into(),
                },
                SwitchArm {
                    value: Value::Int(7),
                    target: "lb".into(),
                },
            ],
        };
        assert_eq!(switch.to_string(), "switch(mode) -> [\"a\":la, 7:lb]");
    }
}
