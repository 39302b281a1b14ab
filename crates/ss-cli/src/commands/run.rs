//! The interactive step/resume loop over stdin/stdout.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use colored::Colorize;

use ss_engine::{Answer, ChoicePrompt, Engine, StepResult};

pub fn run(file: &Path, seed: Option<u64>, show_state: bool) -> Result<(), String> {
    let program = super::load_file(file)?;
    let mut engine = match seed {
        Some(seed) => Engine::with_seed(program, seed),
        None => Engine::new(program),
    };

    let stdin = io::stdin();
    let mut reader = stdin.lock();

    loop {
        match engine.step() {
            StepResult::Narration(text) => println!("{text}"),
            StepResult::Advanced => {}
            StepResult::Pause(seconds) => thread::sleep(Duration::from_secs(seconds)),
            StepResult::WaitForKey => {
                print!("{}", "[press Enter]".dimmed());
                flush()?;
                let _ = read_line(&mut reader)?;
                // EOF here just means no key will ever come; keep going.
            }
            StepResult::AwaitingChoice(prompt) => {
                show_choice(&prompt);
                let Some(line) = read_line(&mut reader)? else {
                    return Err("input ended while a choice was pending".into());
                };
                let Ok(pick) = line.trim().parse::<usize>() else {
                    eprintln!("{}", "enter an option number".yellow());
                    continue;
                };
                if let StepResult::Fault { error, .. } = engine.resume(Answer::Pick(pick)) {
                    eprintln!("{}", error.to_string().yellow());
                }
            }
            StepResult::AwaitingInput(var) => {
                print!("{} ", format!("{var}?").bold());
                flush()?;
                let Some(line) = read_line(&mut reader)? else {
                    return Err("input ended while a number was pending".into());
                };
                let Ok(number) = line.trim().parse::<i64>() else {
                    eprintln!("{}", "enter a whole number".yellow());
                    continue;
                };
                if let StepResult::Fault { error, .. } = engine.resume(Answer::Number(number)) {
                    eprintln!("{}", error.to_string().yellow());
                }
            }
            StepResult::Fault { error, index } => {
                eprintln!(
                    "{}",
                    format!("runtime error at instruction {index}: {error}").yellow()
                );
                engine.skip();
            }
            StepResult::Halted => break,
        }
    }

    if show_state {
        let snapshot =
            serde_json::to_string_pretty(engine.state()).map_err(|e| e.to_string())?;
        println!("{snapshot}");
    }

    Ok(())
}

fn show_choice(prompt: &ChoicePrompt) {
    if let Some(question) = &prompt.prompt {
        println!("{}", question.bold());
    }
    for (i, option) in prompt.options.iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
    print!("> ");
    let _ = flush();
}

fn flush() -> Result<(), String> {
    io::stdout().flush().map_err(|e| e.to_string())
}

/// Read one line from the player; `None` on end of input.
fn read_line(reader: &mut impl BufRead) -> Result<Option<String>, String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(line)),
        Err(e) => Err(e.to_string()),
    }
}
