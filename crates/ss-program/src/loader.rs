//! Two-pass loader: compiled stream text in, validated [`Program`] out.
//!
//! Pass one parses every line into a label declaration or an instruction,
//! assigning label indices in file order. Pass two resolves every branch
//! target against the label table, so a malformed program fails before any
//! narration is shown and every runtime jump is an O(1) index lookup.

use std::collections::HashMap;
use std::ops::Range;

use crate::error::{ParseError, ProgramResult};
use crate::instruction::{Instruction, Operand, SwitchArm};
use crate::lexer::{Token, lex};
use crate::program::{LabelDef, Program};
use crate::value::Value;

/// Load compiled stream text into a validated program.
///
/// Fails with the first [`ParseError`] encountered; a failed load never
/// yields a partial program.
pub fn load(source: &str) -> ProgramResult<Program> {
    let (tokens, lex_errors) = lex(source);
    if let Some(err) = lex_errors.into_iter().next() {
        let line = 1 + source[..err.span.start.min(source.len())]
            .bytes()
            .filter(|b| *b == b'\n')
            .count();
        return Err(ParseError::MalformedLine {
            line,
            text: source[err.span.clone()].to_string(),
            reason: err.message,
            span: err.span,
        });
    }

    let mut instructions = Vec::new();
    let mut statement_spans: Vec<(usize, Range<usize>)> = Vec::new();
    let mut labels: HashMap<String, usize> = HashMap::new();
    let mut label_order = Vec::new();

    let mut line = 1;
    for statement in tokens.split(|(token, _)| matches!(token, Token::Newline)) {
        if !statement.is_empty() {
            let span = statement[0].1.start..statement[statement.len() - 1].1.end;
            let mut parser = StatementParser {
                tokens: statement,
                pos: 0,
                source,
                line,
                span: span.clone(),
            };
            match parser.parse()? {
                Statement::Label(name) => {
                    let index = instructions.len();
                    if labels.insert(name.clone(), index).is_some() {
                        return Err(ParseError::DuplicateLabel {
                            line,
                            label: name,
                            span,
                        });
                    }
                    label_order.push(LabelDef { name, index });
                }
                Statement::Instruction(instruction) => {
                    instructions.push(instruction);
                    statement_spans.push((line, span));
                }
            }
        }
        line += 1;
    }

    // Second pass: every branch target must resolve before execution begins.
    for (instruction, (line, span)) in instructions.iter().zip(&statement_spans) {
        for target in instruction.branch_targets() {
            if !labels.contains_key(target) {
                return Err(ParseError::UnresolvedLabel {
                    line: *line,
                    label: target.to_string(),
                    span: span.clone(),
                });
            }
        }
    }

    Ok(Program::new(instructions, labels, label_order))
}

/// A classified statement.
enum Statement {
    Label(String),
    Instruction(Instruction),
}

/// A parsed argument, before the command decides what kind it wants.
enum Arg {
    Text(String),
    Int(i64),
    Bool(bool),
    Word(String),
}

/// A parsed branch-target suffix.
enum TargetSuffix {
    None,
    Single(String),
    Labels(Vec<String>),
    Arms(Vec<SwitchArm>),
}

struct StatementParser<'a> {
    tokens: &'a [(Token, Range<usize>)],
    pos: usize,
    source: &'a str,
    line: usize,
    span: Range<usize>,
}

impl<'a> StatementParser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse(&mut self) -> ProgramResult<Statement> {
        let name = match self.next() {
            Some(Token::Word(w)) => w.clone(),
            _ => return Err(self.malformed("expected a command or label name")),
        };

        // `identifier:` with nothing else is a label declaration.
        if matches!(self.peek(), Some(Token::Colon)) {
            self.pos += 1;
            if self.peek().is_some() {
                return Err(self.malformed("a label declaration takes no other tokens"));
            }
            return Ok(Statement::Label(name));
        }

        if !matches!(self.next(), Some(Token::LParen)) {
            return Err(self.malformed("expected `(` after the command name"));
        }
        let args = self.parse_args()?;
        let targets = self.parse_target_suffix()?;
        if self.peek().is_some() {
            return Err(self.malformed("unexpected trailing tokens"));
        }

        self.build(&name, args, targets)
    }

    fn malformed(&self, reason: impl Into<String>) -> ParseError {
        ParseError::MalformedLine {
            line: self.line,
            text: self.source[self.span.clone()].to_string(),
            reason: reason.into(),
            span: self.span.clone(),
        }
    }

    /// Parse the comma-separated argument list up to and including `)`.
    fn parse_args(&mut self) -> ProgramResult<Vec<Arg>> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            let arg = match self.next() {
                Some(Token::Str(s)) => Arg::Text(s.clone()),
                Some(Token::Int(n)) => Arg::Int(*n),
                Some(Token::Word(w)) if w == "true" => Arg::Bool(true),
                Some(Token::Word(w)) if w == "false" => Arg::Bool(false),
                Some(Token::Word(w)) => Arg::Word(w.clone()),
                _ => return Err(self.malformed("expected an argument")),
            };
            args.push(arg);
            match self.next() {
                Some(Token::Comma) => {}
                Some(Token::RParen) => break,
                _ => return Err(self.malformed("expected `,` or `)` in the argument list")),
            }
        }
        Ok(args)
    }

    /// Parse the optional `-> target` suffix.
    fn parse_target_suffix(&mut self) -> ProgramResult<TargetSuffix> {
        if !matches!(self.peek(), Some(Token::Arrow)) {
            return Ok(TargetSuffix::None);
        }
        self.pos += 1;

        match self.next() {
            Some(Token::Word(label)) => Ok(TargetSuffix::Single(label.clone())),
            Some(Token::LBracket) => self.parse_target_list(),
            _ => Err(self.malformed("expected a label or `[` after `->`")),
        }
    }

    /// Parse a bracketed label list or `value:label` arm list.
    fn parse_target_list(&mut self) -> ProgramResult<TargetSuffix> {
        let mut labels: Vec<String> = Vec::new();
        let mut arms: Vec<SwitchArm> = Vec::new();
        loop {
            match self.next() {
                Some(Token::Word(word)) => {
                    let word = word.clone();
                    if matches!(self.peek(), Some(Token::Colon)) {
                        return Err(self.malformed("switch values must be quoted or integers"));
                    }
                    labels.push(word);
                }
                Some(Token::Str(value)) => {
                    let value = Value::Text(value.clone());
                    arms.push(self.parse_arm_tail(value)?);
                }
                Some(Token::Int(value)) => {
                    let value = Value::Int(*value);
                    arms.push(self.parse_arm_tail(value)?);
                }
                _ => return Err(self.malformed("expected a label or `value:label` pair")),
            }
            match self.next() {
                Some(Token::Comma) => {}
                Some(Token::RBracket) => break,
                _ => return Err(self.malformed("expected `,` or `]` in the target list")),
            }
        }

        if !arms.is_empty() {
            if !labels.is_empty() {
                return Err(self.malformed("cannot mix plain labels with `value:label` pairs"));
            }
            return Ok(TargetSuffix::Arms(arms));
        }
        if labels.is_empty() {
            return Err(self.malformed("a branch-target arrow requires at least one label"));
        }
        Ok(TargetSuffix::Labels(labels))
    }

    fn parse_arm_tail(&mut self, value: Value) -> ProgramResult<SwitchArm> {
        if !matches!(self.next(), Some(Token::Colon)) {
            return Err(self.malformed("expected `:` after a switch value"));
        }
        match self.next() {
            Some(Token::Word(target)) => Ok(SwitchArm {
                value,
                target: target.clone(),
            }),
            _ => Err(self.malformed("expected a label after `:`")),
        }
    }

    // -- Command construction ----------------------------------------------

    fn build(
        &self,
        command: &str,
        args: Vec<Arg>,
        targets: TargetSuffix,
    ) -> ProgramResult<Statement> {
        let branching = matches!(
            command,
            "if" | "ifelse" | "switch" | "choice" | "confirm" | "random_event"
        );
        if !branching && !matches!(targets, TargetSuffix::None) {
            return Err(self.malformed(format!("`{command}` does not take a branch target")));
        }

        let instruction = match command {
            "narrate" => Instruction::Narrate {
                text: self.one_text(args)?,
            },
            "say" => Instruction::Say {
                text: self.one_text(args)?,
            },
            "format_text" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::FormatText {
                    var: self.var(a)?,
                    text: self.text(b)?,
                }
            }
            "pause" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::Pause {
                    seconds: self.seconds(a)?,
                }
            }
            "wait_for_key" => {
                self.arity::<0>(args)?;
                Instruction::WaitForKey
            }
            "input" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::Input { var: self.var(a)? }
            }
            "goto" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::Goto {
                    label: self.label_name(a)?,
                }
            }
            "end" => {
                self.arity::<0>(args)?;
                Instruction::End
            }
            "return" => {
                self.arity::<0>(args)?;
                Instruction::Return
            }
            "story_restart" => {
                self.arity::<0>(args)?;
                Instruction::StoryRestart
            }
            "if" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::If {
                    var: self.var(a)?,
                    target: self.single_target(targets)?,
                }
            }
            "ifelse" => {
                let [a] = self.arity::<1>(args)?;
                let (when_true, when_false) = self.two_targets(targets)?;
                Instruction::IfElse {
                    var: self.var(a)?,
                    when_true,
                    when_false,
                }
            }
            "switch" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::Switch {
                    var: self.var(a)?,
                    arms: self.arm_targets(targets)?,
                }
            }
            "choice" => {
                if args.is_empty() {
                    return Err(self.malformed("choice requires at least one option"));
                }
                let options = args
                    .into_iter()
                    .map(|arg| self.text(arg))
                    .collect::<ProgramResult<Vec<_>>>()?;
                let targets = self.label_targets(targets)?;
                if targets.len() != options.len() {
                    return Err(self.malformed(format!(
                        "choice has {} options but {} labels",
                        options.len(),
                        targets.len()
                    )));
                }
                Instruction::Choice { options, targets }
            }
            "confirm" => {
                let [a] = self.arity::<1>(args)?;
                let (when_true, when_false) = self.two_targets(targets)?;
                Instruction::Confirm {
                    prompt: self.text(a)?,
                    when_true,
                    when_false,
                }
            }
            "assign" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::Assign {
                    var: self.var(a)?,
                    value: self.operand(b)?,
                }
            }
            "increase" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::Increase {
                    var: self.var(a)?,
                    amount: self.operand(b)?,
                }
            }
            "decrease" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::Decrease {
                    var: self.var(a)?,
                    amount: self.operand(b)?,
                }
            }
            "scale" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::Scale {
                    var: self.var(a)?,
                    factor: self.operand(b)?,
                }
            }
            "divide_by" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::DivideBy {
                    var: self.var(a)?,
                    divisor: self.operand(b)?,
                }
            }
            "randomize" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::Randomize {
                    var: self.var(a)?,
                    range: self.operand(b)?,
                }
            }
            "both" => {
                let [a, b, c] = self.arity::<3>(args)?;
                Instruction::Both {
                    var: self.var(a)?,
                    left: self.operand(b)?,
                    right: self.operand(c)?,
                }
            }
            "either" => {
                let [a, b, c] = self.arity::<3>(args)?;
                Instruction::Either {
                    var: self.var(a)?,
                    left: self.operand(b)?,
                    right: self.operand(c)?,
                }
            }
            "invert" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::Invert { var: self.var(a)? }
            }
            "combine" => {
                let [a, b, c] = self.arity::<3>(args)?;
                Instruction::Combine {
                    var: self.var(a)?,
                    left: self.operand(b)?,
                    right: self.operand(c)?,
                }
            }
            "length_of" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::LengthOf {
                    var: self.var(a)?,
                    text: self.operand(b)?,
                }
            }
            "substring_in" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::SubstringIn {
                    var: self.var(a)?,
                    needle: self.operand(b)?,
                }
            }
            "uppercase" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::Uppercase {
                    var: self.var(a)?,
                    text: self.operand(b)?,
                }
            }
            "lowercase" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::Lowercase {
                    var: self.var(a)?,
                    text: self.operand(b)?,
                }
            }
            "create_inventory" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::CreateInventory {
                    inventory: self.name(a)?,
                }
            }
            "add_to_inventory" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::AddToInventory {
                    inventory: self.name(a)?,
                    item: self.name(b)?,
                }
            }
            "remove_item" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::RemoveItem {
                    inventory: self.name(a)?,
                    item: self.name(b)?,
                }
            }
            "has_item" => {
                let mut args = args.into_iter();
                let (Some(a), Some(b)) = (args.next(), args.next()) else {
                    return Err(self.malformed("has_item takes 2 or 3 arguments"));
                };
                let var = match args.next() {
                    Some(arg) => Some(self.var(arg)?),
                    None => None,
                };
                if args.next().is_some() {
                    return Err(self.malformed("has_item takes 2 or 3 arguments"));
                }
                Instruction::HasItem {
                    inventory: self.name(a)?,
                    item: self.name(b)?,
                    var,
                }
            }
            "count_inventory" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::CountInventory {
                    inventory: self.name(a)?,
                    var: self.var(b)?,
                }
            }
            "clear_inventory" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::ClearInventory {
                    inventory: self.name(a)?,
                }
            }
            "show_inventory" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::ShowInventory {
                    inventory: self.name(a)?,
                }
            }
            "add_character" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::AddCharacter {
                    name: self.name(a)?,
                }
            }
            "remove_character" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::RemoveCharacter {
                    name: self.name(a)?,
                }
            }
            "set_character_emotion" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::SetCharacterEmotion {
                    name: self.name(a)?,
                    emotion: self.name(b)?,
                }
            }
            "change_name" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::ChangeName {
                    from: self.name(a)?,
                    to: self.name(b)?,
                }
            }
            "set_character_description" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::SetCharacterDescription {
                    name: self.name(a)?,
                    text: self.text(b)?,
                }
            }
            "character_status" => {
                let [a, b] = self.arity::<2>(args)?;
                Instruction::CharacterStatus {
                    name: self.name(a)?,
                    status: self.name(b)?,
                }
            }
            "check_status" => {
                let mut args = args.into_iter();
                let Some(a) = args.next() else {
                    return Err(self.malformed("check_status takes 1 or 2 arguments"));
                };
                let var = match args.next() {
                    Some(arg) => Some(self.var(arg)?),
                    None => None,
                };
                if args.next().is_some() {
                    return Err(self.malformed("check_status takes 1 or 2 arguments"));
                }
                Instruction::CheckStatus {
                    name: self.name(a)?,
                    var,
                }
            }
            "set_background" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::SetBackground {
                    name: self.name(a)?,
                }
            }
            "trigger_scene" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::TriggerScene {
                    name: self.name(a)?,
                }
            }
            "set_time_of_day" => {
                let [a] = self.arity::<1>(args)?;
                Instruction::SetTimeOfDay {
                    value: self.name(a)?,
                }
            }
            "check_time_of_day" => {
                let mut args = args.into_iter();
                let var = match args.next() {
                    Some(arg) => Some(self.var(arg)?),
                    None => None,
                };
                if args.next().is_some() {
                    return Err(self.malformed("check_time_of_day takes 0 or 1 arguments"));
                }
                Instruction::CheckTimeOfDay { var }
            }
            "random_event" => {
                self.arity::<0>(args)?;
                Instruction::RandomEvent {
                    targets: self.label_targets(targets)?,
                }
            }
            _ => {
                return Err(ParseError::UnknownCommand {
                    line: self.line,
                    command: command.to_string(),
                    span: self.span.clone(),
                });
            }
        };

        Ok(Statement::Instruction(instruction))
    }

    fn arity<const N: usize>(&self, args: Vec<Arg>) -> ProgramResult<[Arg; N]> {
        let count = args.len();
        args.try_into()
            .map_err(|_| self.malformed(format!("expected {N} arguments, found {count}")))
    }

    fn one_text(&self, args: Vec<Arg>) -> ProgramResult<String> {
        let [a] = self.arity::<1>(args)?;
        self.text(a)
    }

    fn text(&self, arg: Arg) -> ProgramResult<String> {
        match arg {
            Arg::Text(s) => Ok(s),
            _ => Err(self.malformed("expected a quoted string")),
        }
    }

    /// A name-position argument: inventories, items, characters, scenes.
    /// Quoted in compiled output, but bare identifiers are tolerated.
    fn name(&self, arg: Arg) -> ProgramResult<String> {
        match arg {
            Arg::Text(s) | Arg::Word(s) => Ok(s),
            _ => Err(self.malformed("expected a name")),
        }
    }

    fn var(&self, arg: Arg) -> ProgramResult<String> {
        match arg {
            Arg::Word(w) => Ok(w),
            _ => Err(self.malformed("expected a variable name")),
        }
    }

    fn label_name(&self, arg: Arg) -> ProgramResult<String> {
        match arg {
            Arg::Word(w) => Ok(w),
            _ => Err(self.malformed("expected a label name")),
        }
    }

    fn seconds(&self, arg: Arg) -> ProgramResult<u64> {
        match arg {
            Arg::Int(n) if n >= 0 => Ok(n as u64),
            _ => Err(self.malformed("expected a non-negative integer")),
        }
    }

    fn operand(&self, arg: Arg) -> ProgramResult<Operand> {
        Ok(match arg {
            Arg::Text(s) => Operand::Literal(Value::Text(s)),
            Arg::Int(n) => Operand::Literal(Value::Int(n)),
            Arg::Bool(b) => Operand::Literal(Value::Bool(b)),
            Arg::Word(w) => Operand::Var(w),
        })
    }

    fn single_target(&self, targets: TargetSuffix) -> ProgramResult<String> {
        match targets {
            TargetSuffix::Single(label) => Ok(label),
            TargetSuffix::Labels(labels) if labels.len() == 1 => {
                Ok(labels.into_iter().next().unwrap_or_default())
            }
            _ => Err(self.malformed("expected `-> label`")),
        }
    }

    fn two_targets(&self, targets: TargetSuffix) -> ProgramResult<(String, String)> {
        match targets {
            TargetSuffix::Labels(labels) if labels.len() == 2 => {
                let mut labels = labels.into_iter();
                Ok((
                    labels.next().unwrap_or_default(),
                    labels.next().unwrap_or_default(),
                ))
            }
            _ => Err(self.malformed("expected `-> [trueLabel, falseLabel]`")),
        }
    }

    fn label_targets(&self, targets: TargetSuffix) -> ProgramResult<Vec<String>> {
        match targets {
            TargetSuffix::Labels(labels) => Ok(labels),
            TargetSuffix::Single(label) => Ok(vec![label]),
            _ => Err(self.malformed("expected `-> [label, ...]`")),
        }
    }

    fn arm_targets(&self, targets: TargetSuffix) -> ProgramResult<Vec<SwitchArm>> {
        match targets {
            TargetSuffix::Arms(arms) => Ok(arms),
            _ => Err(self.malformed("expected `-> [\"value\":label, ...]`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_minimal_program() {
        let program = load("start:\nnarrate(\"Hello\")\ngoto(done)\ndone:\nend()\n").unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(program.label_index("start"), Some(0));
        assert_eq!(program.label_index("done"), Some(2));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let program = load("\n\nnarrate(\"Hi\")\n\nend()\n").unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn forward_references_resolve() {
        let program = load("goto(later)\nlater:\nend()").unwrap();
        assert_eq!(program.label_index("later"), Some(1));
    }

    #[test]
    fn trailing_label_is_valid() {
        let program = load("goto(fin)\nfin:").unwrap();
        assert_eq!(program.label_index("fin"), Some(1));
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn unknown_command() {
        let err = load("frobnicate(\"x\")").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownCommand { ref command, line: 1, .. } if command == "frobnicate"
        ));
    }

    #[test]
    fn duplicate_label() {
        let err = load("start:\nend()\nstart:\nend()").unwrap_err();
        assert!(matches!(
            err,
            ParseError::DuplicateLabel { ref label, line: 3, .. } if label == "start"
        ));
    }

    #[test]
    fn unresolved_label() {
        let err = load("goto(nowhere)\nend()").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnresolvedLabel { ref label, line: 1, .. } if label == "nowhere"
        ));
    }

    #[test]
    fn unresolved_choice_target() {
        let err = load("start:\nchoice(\"A\", \"B\") -> [start, missing]").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnresolvedLabel { ref label, .. } if label == "missing"
        ));
    }

    #[test]
    fn label_with_extra_tokens_is_malformed() {
        let err = load("start: end()").unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { .. }));
    }

    #[test]
    fn arrow_without_labels_is_malformed() {
        let err = load("start:\nchoice(\"A\") -> []").unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { .. }));
    }

    #[test]
    fn choice_count_mismatch() {
        let err = load("la:\nchoice(\"A\", \"B\") -> [la]").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedLine { ref reason, .. } if reason.contains("2 options")
        ));
    }

    #[test]
    fn non_branching_command_rejects_target() {
        let err = load("la:\nnarrate(\"Hi\") -> la").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedLine { ref reason, .. } if reason.contains("branch target")
        ));
    }

    #[test]
    fn switch_arms_parse() {
        let source = "la:\nlb:\nswitch(mode) -> [\"a\":la, 2:lb]";
        let program = load(source).unwrap();
        let Some(Instruction::Switch { var, arms }) = program.get(0) else {
            panic!("expected a switch instruction");
        };
        assert_eq!(var, "mode");
        assert_eq!(arms.len(), 2);
        assert_eq!(arms[0].value, Value::Text("a".into()));
        assert_eq!(arms[0].target, "la");
        assert_eq!(arms[1].value, Value::Int(2));
    }

    #[test]
    fn switch_rejects_bare_word_values() {
        let err = load("la:\nswitch(mode) -> [a:la]").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedLine { ref reason, .. } if reason.contains("quoted or integers")
        ));
    }

    #[test]
    fn operands_classify_literals_and_vars() {
        let program = load("assign(x, 5)\nassign(y, \"text\")\nassign(z, x)\nassign(w, true)")
            .unwrap();
        assert_eq!(
            program.get(0),
            Some(&Instruction::Assign {
                var: "x".into(),
                value: Operand::Literal(Value::Int(5)),
            })
        );
        assert_eq!(
            program.get(1),
            Some(&Instruction::Assign {
                var: "y".into(),
                value: Operand::Literal(Value::Text("text".into())),
            })
        );
        assert_eq!(
            program.get(2),
            Some(&Instruction::Assign {
                var: "z".into(),
                value: Operand::Var("x".into()),
            })
        );
        assert_eq!(
            program.get(3),
            Some(&Instruction::Assign {
                var: "w".into(),
                value: Operand::Literal(Value::Bool(true)),
            })
        );
    }

    #[test]
    fn has_item_optional_var() {
        let program =
            load("has_item(\"bag\", \"key\")\nhas_item(\"bag\", \"key\", found)").unwrap();
        assert_eq!(
            program.get(0),
            Some(&Instruction::HasItem {
                inventory: "bag".into(),
                item: "key".into(),
                var: None,
            })
        );
        assert_eq!(
            program.get(1),
            Some(&Instruction::HasItem {
                inventory: "bag".into(),
                item: "key".into(),
                var: Some("found".into()),
            })
        );
    }

    #[test]
    fn wrong_arity_is_malformed() {
        let err = load("pause()").unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { .. }));

        let err = load("assign(x)").unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { .. }));
    }

    #[test]
    fn error_reports_line_numbers() {
        let err = load("narrate(\"ok\")\nnarrate(\"ok\")\nbogus(\"x\")").unwrap_err();
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn lex_error_becomes_malformed_line() {
        let err = load("narrate(\"ok\")\n@@").unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn round_trip_preserves_stream() {
        let source = "start:\nnarrate(\"Hello\")\nchoice(\"A\", \"B\") -> [start, done]\ndone:\nend()\n";
        let program = load(source).unwrap();
        assert_eq!(program.to_stream(), source);
        // And the re-serialized stream loads to an identical program.
        let reloaded = load(&program.to_stream()).unwrap();
        assert_eq!(reloaded, program);
    }
}
