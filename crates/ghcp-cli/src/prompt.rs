use std::io::ErrorKind;

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};

/// Source of menu answers.
///
/// The menu and demos only talk to this trait, so a scripted implementation
/// can walk them without a terminal.
pub trait Prompter {
    /// Pick one of `items`, returning its index.
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<usize>;

    /// Read one line of non-empty text.
    fn text(&mut self, prompt: &str) -> Result<String>;

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
}

/// Interactive prompts on the controlling terminal.
///
/// dialoguer blocks, so each prompt runs under `block_in_place` and needs the
/// multi-threaded runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<usize> {
        let selection = tokio::task::block_in_place(|| {
            Select::new()
                .with_prompt(prompt)
                .items(items)
                .default(0)
                .interact()
        })?;
        Ok(selection)
    }

    fn text(&mut self, prompt: &str) -> Result<String> {
        let input: String =
            tokio::task::block_in_place(|| Input::new().with_prompt(prompt).interact_text())?;
        Ok(input)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let answer = tokio::task::block_in_place(|| {
            Confirm::new()
                .with_prompt(prompt)
                .default(default)
                .interact()
        })?;
        Ok(answer)
    }
}

/// Whether `err` means the user left the prompt (Ctrl-C or end of input).
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| matches!(io.kind(), ErrorKind::Interrupted | ErrorKind::UnexpectedEof))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::*;

    #[derive(Debug)]
    pub enum Answer {
        Select(usize),
        Text(&'static str),
        Confirm(bool),
    }

    /// Replays canned answers; once they run out every prompt reports an
    /// interrupt, like Ctrl-C at the terminal.
    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        answers: VecDeque<Answer>,
        pub prompts: Vec<String>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
            Self {
                answers: answers.into_iter().collect(),
                prompts: Vec::new(),
            }
        }

        pub fn remaining(&self) -> usize {
            self.answers.len()
        }

        fn next(&mut self, prompt: &str) -> Result<Answer> {
            self.prompts.push(prompt.to_string());
            self.answers.pop_front().ok_or_else(|| {
                dialoguer::Error::from(std::io::Error::new(
                    ErrorKind::Interrupted,
                    "read interrupted",
                ))
                .into()
            })
        }
    }

    impl Prompter for ScriptedPrompter {
        fn select(&mut self, prompt: &str, items: &[String]) -> Result<usize> {
            match self.next(prompt)? {
                Answer::Select(index) if index < items.len() => Ok(index),
                other => anyhow::bail!("unexpected answer {other:?} for select {prompt:?}"),
            }
        }

        fn text(&mut self, prompt: &str) -> Result<String> {
            match self.next(prompt)? {
                Answer::Text(text) => Ok(text.to_string()),
                other => anyhow::bail!("unexpected answer {other:?} for text {prompt:?}"),
            }
        }

        fn confirm(&mut self, prompt: &str, _default: bool) -> Result<bool> {
            match self.next(prompt)? {
                Answer::Confirm(answer) => Ok(answer),
                other => anyhow::bail!("unexpected answer {other:?} for confirm {prompt:?}"),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::testing::{Answer, ScriptedPrompter};
    use super::*;

    #[test]
    fn exhausted_script_reads_as_interrupt() {
        let mut prompter = ScriptedPrompter::new([]);
        let err = prompter.text("You").unwrap_err();
        assert!(is_interrupted(&err));
    }

    #[test]
    fn eof_counts_as_interrupt() {
        let err = anyhow::Error::from(std::io::Error::new(ErrorKind::UnexpectedEof, "eof"));
        assert!(is_interrupted(&err));
    }

    #[test]
    fn other_errors_are_not_interrupts() {
        let err = anyhow::anyhow!("upstream returned 500");
        assert!(!is_interrupted(&err));

        let mut prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
        let err = prompter.text("You").unwrap_err();
        assert!(!is_interrupted(&err));
    }
}
