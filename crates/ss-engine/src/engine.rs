//! The step-at-a-time execution engine.
//!
//! The engine owns a loaded [`Program`], a [`StateStore`], a cursor, and a
//! seedable random source. Each [`Engine::step`] executes at most one
//! instruction; interactive instructions suspend the engine until the host
//! supplies an [`Answer`] through [`Engine::resume`]. Runtime errors are
//! returned as [`StepResult::Fault`] with the failing instruction's index;
//! they never mutate state, so the engine remains steppable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ss_program::{Instruction, Operand, Program, Value};

use crate::error::RuntimeError;
use crate::state::StateStore;

/// A pending choice shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoicePrompt {
    /// Question text, present for `confirm`, absent for a plain `choice`.
    pub prompt: Option<String>,
    /// Option texts in presentation order; answers are 1-based into this.
    pub options: Vec<String>,
    /// Jump targets, one per option.
    pub targets: Vec<String>,
}

/// What the host supplies to resolve a suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// A 1-based pick among a choice's options.
    Pick(usize),
    /// An integer for an `input` suspension.
    Number(i64),
}

/// Where the engine currently is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// Loaded, nothing executed yet.
    Idle,
    /// Mid-story; the next `step` executes the instruction at the cursor.
    Running,
    /// Suspended on a choice or confirm; waiting for a pick.
    AwaitingChoice(ChoicePrompt),
    /// Suspended on `input`; waiting for an integer for the named variable.
    AwaitingInput {
        /// The variable that receives the answer.
        var: String,
    },
    /// The story has ended; further steps are no-ops.
    Halted,
}

/// The observable outcome of one `step` or `resume` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// Text to show the player.
    Narration(String),
    /// Advisory pause of the given number of seconds; the host decides
    /// whether to actually wait.
    Pause(u64),
    /// Advisory wait for a keypress.
    WaitForKey,
    /// The engine suspended on a choice; answer with [`Answer::Pick`].
    AwaitingChoice(ChoicePrompt),
    /// The engine suspended on `input` for the named variable; answer with
    /// [`Answer::Number`].
    AwaitingInput(String),
    /// State changed silently; nothing to show.
    Advanced,
    /// The story has ended.
    Halted,
    /// The instruction at `index` failed; state and cursor are unchanged.
    Fault {
        /// What went wrong.
        error: RuntimeError,
        /// Index of the failing instruction.
        index: usize,
    },
}

/// Executes a loaded program one instruction at a time.
#[derive(Debug)]
pub struct Engine {
    program: Program,
    state: StateStore,
    cursor: usize,
    status: EngineStatus,
    rng: StdRng,
}

impl Engine {
    /// Create an idle engine with an OS-seeded random source.
    pub fn new(program: Program) -> Self {
        Self::from_rng(program, StdRng::from_os_rng())
    }

    /// Create an idle engine with a deterministic random source.
    ///
    /// The same seed and the same answers reproduce the same run exactly.
    pub fn with_seed(program: Program, seed: u64) -> Self {
        Self::from_rng(program, StdRng::seed_from_u64(seed))
    }

    fn from_rng(program: Program, rng: StdRng) -> Self {
        Self {
            program,
            state: StateStore::new(),
            cursor: 0,
            status: EngineStatus::Idle,
            rng,
        }
    }

    /// The loaded program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Read-only view of the mutable story state.
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// The engine's current lifecycle state.
    pub fn status(&self) -> &EngineStatus {
        &self.status
    }

    /// Index of the next instruction to execute.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Clear all state and return to idle at instruction 0.
    ///
    /// The program and the random source are kept.
    pub fn restart(&mut self) {
        self.state.reset();
        self.cursor = 0;
        self.status = EngineStatus::Idle;
    }

    /// Move past the instruction at the cursor without executing it.
    ///
    /// Lets a host continue after a [`StepResult::Fault`]. Does nothing
    /// while the engine is suspended or halted.
    pub fn skip(&mut self) {
        if matches!(self.status, EngineStatus::Idle | EngineStatus::Running)
            && self.cursor < self.program.len()
        {
            self.cursor += 1;
        }
    }

    /// Execute at most one instruction.
    ///
    /// While suspended, re-returns the pending prompt so a host loop can
    /// re-prompt without special-casing; while halted, returns
    /// [`StepResult::Halted`]. On a fault the cursor stays on the failing
    /// instruction.
    pub fn step(&mut self) -> StepResult {
        match &self.status {
            EngineStatus::Halted => return StepResult::Halted,
            EngineStatus::AwaitingChoice(prompt) => {
                return StepResult::AwaitingChoice(prompt.clone());
            }
            EngineStatus::AwaitingInput { var } => {
                return StepResult::AwaitingInput(var.clone());
            }
            EngineStatus::Idle => self.status = EngineStatus::Running,
            EngineStatus::Running => {}
        }

        let Some(instruction) = self.program.get(self.cursor) else {
            self.status = EngineStatus::Halted;
            return StepResult::Halted;
        };
        let instruction = instruction.clone();

        match self.execute(&instruction) {
            Ok(result) => result,
            Err(error) => StepResult::Fault {
                error,
                index: self.cursor,
            },
        }
    }

    /// Resolve a pending suspension with the host's answer.
    ///
    /// An answer of the wrong kind or out of range is returned as a fault
    /// and the suspension is preserved, so the host can retry.
    pub fn resume(&mut self, answer: Answer) -> StepResult {
        match self.status.clone() {
            EngineStatus::AwaitingChoice(prompt) => {
                let pick = match answer {
                    Answer::Pick(pick) => pick,
                    Answer::Number(_) => {
                        return StepResult::Fault {
                            error: RuntimeError::TypeMismatch {
                                expected: "a 1-based pick".into(),
                                found: "a number".into(),
                            },
                            index: self.cursor,
                        };
                    }
                };
                if pick == 0 || pick > prompt.targets.len() {
                    return StepResult::Fault {
                        error: RuntimeError::AnswerOutOfRange {
                            answer: pick,
                            limit: prompt.targets.len(),
                        },
                        index: self.cursor,
                    };
                }
                self.status = EngineStatus::Running;
                match self.jump(&prompt.targets[pick - 1]) {
                    Ok(result) => result,
                    Err(error) => StepResult::Fault {
                        error,
                        index: self.cursor,
                    },
                }
            }
            EngineStatus::AwaitingInput { var } => {
                let number = match answer {
                    Answer::Number(number) => number,
                    Answer::Pick(_) => {
                        return StepResult::Fault {
                            error: RuntimeError::TypeMismatch {
                                expected: "a number".into(),
                                found: "a choice pick".into(),
                            },
                            index: self.cursor,
                        };
                    }
                };
                self.state.set_var(var, Value::Int(number));
                self.status = EngineStatus::Running;
                self.cursor += 1;
                StepResult::Advanced
            }
            EngineStatus::Idle | EngineStatus::Running | EngineStatus::Halted => {
                StepResult::Fault {
                    error: RuntimeError::NothingPending,
                    index: self.cursor,
                }
            }
        }
    }

    // -- Instruction execution ---------------------------------------------

    fn execute(&mut self, instruction: &Instruction) -> Result<StepResult, RuntimeError> {
        match instruction {
            Instruction::Narrate { text } | Instruction::Say { text } => {
                self.cursor += 1;
                Ok(StepResult::Narration(text.clone()))
            }
            Instruction::FormatText { var, text } => {
                let value = self.state.var(var)?.to_string();
                self.cursor += 1;
                Ok(StepResult::Narration(text.replace("{}", &value)))
            }
            Instruction::Pause { seconds } => {
                self.cursor += 1;
                Ok(StepResult::Pause(*seconds))
            }
            Instruction::WaitForKey => {
                self.cursor += 1;
                Ok(StepResult::WaitForKey)
            }
            Instruction::Input { var } => {
                self.status = EngineStatus::AwaitingInput { var: var.clone() };
                Ok(StepResult::AwaitingInput(var.clone()))
            }
            Instruction::Goto { label } => self.jump(label),
            Instruction::End => {
                self.status = EngineStatus::Halted;
                Ok(StepResult::Halted)
            }
            Instruction::Return => {
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::StoryRestart => {
                self.restart();
                Ok(StepResult::Advanced)
            }
            Instruction::If { var, target } => {
                if self.state.var(var)?.truthy() {
                    self.jump(target)
                } else {
                    self.cursor += 1;
                    Ok(StepResult::Advanced)
                }
            }
            Instruction::IfElse {
                var,
                when_true,
                when_false,
            } => {
                let target = if self.state.var(var)?.truthy() {
                    when_true
                } else {
                    when_false
                };
                self.jump(target)
            }
            Instruction::Switch { var, arms } => {
                let value = self.state.var(var)?;
                let arm = arms.iter().find(|arm| arm.value == *value);
                match arm {
                    Some(arm) => {
                        let target = arm.target.clone();
                        self.jump(&target)
                    }
                    None => Err(RuntimeError::UnmatchedSwitchValue {
                        variable: var.clone(),
                        value: value.to_string(),
                    }),
                }
            }
            Instruction::Choice { options, targets } => {
                let prompt = ChoicePrompt {
                    prompt: None,
                    options: options.clone(),
                    targets: targets.clone(),
                };
                self.status = EngineStatus::AwaitingChoice(prompt.clone());
                Ok(StepResult::AwaitingChoice(prompt))
            }
            Instruction::Confirm {
                prompt,
                when_true,
                when_false,
            } => {
                let prompt = ChoicePrompt {
                    prompt: Some(prompt.clone()),
                    options: vec!["yes".into(), "no".into()],
                    targets: vec![when_true.clone(), when_false.clone()],
                };
                self.status = EngineStatus::AwaitingChoice(prompt.clone());
                Ok(StepResult::AwaitingChoice(prompt))
            }
            Instruction::Assign { var, value } => {
                let value = self.eval(value)?;
                self.set(var, value)
            }
            Instruction::Increase { var, amount } => {
                let amount = self.eval_int(amount)?;
                let current = self.var_int(var)?;
                self.set(var, Value::Int(current.saturating_add(amount)))
            }
            Instruction::Decrease { var, amount } => {
                let amount = self.eval_int(amount)?;
                let current = self.var_int(var)?;
                self.set(var, Value::Int(current.saturating_sub(amount)))
            }
            Instruction::Scale { var, factor } => {
                let factor = self.eval_int(factor)?;
                let current = self.var_int(var)?;
                self.set(var, Value::Int(current.saturating_mul(factor)))
            }
            Instruction::DivideBy { var, divisor } => {
                let divisor = self.eval_int(divisor)?;
                let current = self.var_int(var)?;
                let quotient = current
                    .checked_div(divisor)
                    .ok_or_else(|| RuntimeError::DivisionByZero(var.clone()))?;
                self.set(var, Value::Int(quotient))
            }
            Instruction::Randomize { var, range } => {
                let range = self.eval_int(range)?;
                if range <= 0 {
                    return Err(RuntimeError::EmptyRange {
                        variable: var.clone(),
                        range,
                    });
                }
                let drawn = self.rng.random_range(0..range);
                self.set(var, Value::Int(drawn))
            }
            Instruction::Both { var, left, right } => {
                let result = self.eval(left)?.truthy() && self.eval(right)?.truthy();
                self.set(var, Value::Int(i64::from(result)))
            }
            Instruction::Either { var, left, right } => {
                let result = self.eval(left)?.truthy() || self.eval(right)?.truthy();
                self.set(var, Value::Int(i64::from(result)))
            }
            Instruction::Invert { var } => {
                let flipped = !self.state.var(var)?.truthy();
                self.set(var, Value::Int(i64::from(flipped)))
            }
            Instruction::Combine { var, left, right } => {
                let combined = format!("{}{}", self.eval_text(left)?, self.eval_text(right)?);
                self.set(var, Value::Int(combined.chars().count() as i64))
            }
            Instruction::LengthOf { var, text } => {
                let text = self.eval_text(text)?;
                self.set(var, Value::Int(text.chars().count() as i64))
            }
            Instruction::SubstringIn { var, needle } => {
                let needle = self.eval_text(needle)?;
                let haystack = self.state.var(var)?.to_string();
                self.set(var, Value::Int(i64::from(haystack.contains(&needle))))
            }
            Instruction::Uppercase { var, text } => {
                let text = self.eval_text(text)?.to_uppercase();
                self.set(var, Value::Text(text))
            }
            Instruction::Lowercase { var, text } => {
                let text = self.eval_text(text)?.to_lowercase();
                self.set(var, Value::Text(text))
            }
            Instruction::CreateInventory { inventory } => {
                self.state.create_inventory(inventory.clone());
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::AddToInventory { inventory, item } => {
                self.state.add_item(inventory, item.clone())?;
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::RemoveItem { inventory, item } => {
                self.state.remove_item(inventory, item)?;
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::HasItem {
                inventory,
                item,
                var,
            } => {
                let held = self
                    .state
                    .inventory(inventory)?
                    .iter()
                    .any(|entry| entry == item);
                match var {
                    Some(var) => self.set(var, Value::Int(i64::from(held))),
                    None => {
                        self.cursor += 1;
                        let text = if held {
                            format!("{item} is in {inventory}.")
                        } else {
                            format!("{item} is not in {inventory}.")
                        };
                        Ok(StepResult::Narration(text))
                    }
                }
            }
            Instruction::CountInventory { inventory, var } => {
                let count = self.state.inventory(inventory)?.len() as i64;
                self.set(var, Value::Int(count))
            }
            Instruction::ClearInventory { inventory } => {
                self.state.clear_inventory(inventory)?;
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::ShowInventory { inventory } => {
                let items = self.state.inventory(inventory)?;
                let text = if items.is_empty() {
                    format!("{inventory} is empty.")
                } else {
                    format!("{inventory}: {}", items.join(", "))
                };
                self.cursor += 1;
                Ok(StepResult::Narration(text))
            }
            Instruction::AddCharacter { name } => {
                self.state.add_character(name.clone());
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::RemoveCharacter { name } => {
                self.state.remove_character(name)?;
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::SetCharacterEmotion { name, emotion } => {
                self.state.character_mut(name)?.emotion = emotion.clone();
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::ChangeName { from, to } => {
                self.state.rename_character(from, to.clone())?;
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::SetCharacterDescription { name, text } => {
                self.state.character_mut(name)?.description = text.clone();
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::CharacterStatus { name, status } => {
                self.state.character_mut(name)?.status = status.clone();
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::CheckStatus { name, var } => {
                let status = self.state.character(name)?.status.clone();
                match var {
                    Some(var) => self.set(var, Value::Text(status)),
                    None => {
                        self.cursor += 1;
                        Ok(StepResult::Narration(format!("{name} is {status}.")))
                    }
                }
            }
            Instruction::SetBackground { name } => {
                self.state.set_background(name.clone());
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::TriggerScene { name } => {
                self.state.set_background(name.clone());
                self.cursor += 1;
                Ok(StepResult::Narration(format!("The scene shifts to {name}.")))
            }
            Instruction::SetTimeOfDay { value } => {
                self.state.set_time_of_day(value.clone());
                self.cursor += 1;
                Ok(StepResult::Advanced)
            }
            Instruction::CheckTimeOfDay { var } => {
                let value = self.state.scene().time_of_day.clone();
                match var {
                    Some(var) => self.set(var, Value::Text(value)),
                    None => {
                        self.cursor += 1;
                        Ok(StepResult::Narration(format!("It is {value}.")))
                    }
                }
            }
            Instruction::RandomEvent { targets } => {
                // Non-empty by load-time validation.
                let pick = self.rng.random_range(0..targets.len());
                let target = targets[pick].clone();
                self.jump(&target)
            }
        }
    }

    fn jump(&mut self, label: &str) -> Result<StepResult, RuntimeError> {
        let index = self
            .program
            .label_index(label)
            .ok_or_else(|| RuntimeError::UnresolvedJump(label.to_string()))?;
        self.cursor = index;
        Ok(StepResult::Advanced)
    }

    fn set(&mut self, var: &str, value: Value) -> Result<StepResult, RuntimeError> {
        self.state.set_var(var, value);
        self.cursor += 1;
        Ok(StepResult::Advanced)
    }

    fn eval(&self, operand: &Operand) -> Result<Value, RuntimeError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Var(name) => self.state.var(name).cloned(),
        }
    }

    /// Evaluate an operand as an integer. Booleans coerce to 0/1 and numeric
    /// text parses; other text is a mismatch.
    fn eval_int(&self, operand: &Operand) -> Result<i64, RuntimeError> {
        as_int(&self.eval(operand)?)
    }

    /// Evaluate an operand as text; any value renders through its display
    /// form.
    fn eval_text(&self, operand: &Operand) -> Result<String, RuntimeError> {
        Ok(self.eval(operand)?.to_string())
    }

    fn var_int(&self, var: &str) -> Result<i64, RuntimeError> {
        as_int(self.state.var(var)?)
    }
}

/// Read a value as an integer. Compiled output quotes some numeric
/// arguments, so numeric text is accepted; non-numeric text is not.
fn as_int(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Text(s) => s.trim().parse().map_err(|_| RuntimeError::TypeMismatch {
            expected: "integer".into(),
            found: value.type_name().into(),
        }),
    }
}
