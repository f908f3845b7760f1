//! [`UserPrompt`] backed by a real terminal: `dialoguer::Confirm` for
//! yes/no, a numbered menu read via `dialoguer::Input` for the
//! multi-candidate case.

use reftx_core::UserPrompt;

/// Interactive terminal prompts for dependency-expansion disambiguation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl UserPrompt for TerminalPrompt {
    fn yes_no(&self, question: &str) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .wait_for_newline(true)
            .interact()
            .unwrap_or(false)
    }

    fn choose_number(&self, lo: i32, hi: i32, question: &str) -> i32 {
        loop {
            let input: String = match dialoguer::Input::new().with_prompt(question).interact_text() {
                Ok(input) => input,
                Err(_) => return lo,
            };
            match input.trim().parse::<i32>() {
                Ok(n) if n >= lo && n <= hi => return n,
                _ => println!("Please enter a number between {lo} and {hi}."),
            }
        }
    }
}
