//! Main menu loop.

use anyhow::Result;
use tracing::{debug, warn};

use crate::console;
use crate::demos::{ChatDemo, CodegenDemo, ContextDemo, DemoKind};
use crate::live::LiveChat;
use crate::prompt::{Prompter, is_interrupted};

pub const EXIT_MESSAGE: &str = "Exiting the demo application. Thanks for trying it!";

const EXIT_LABEL: &str = "❌ Exit";

pub struct App<P> {
    prompter: P,
    live: Option<LiveChat>,
}

impl<P: Prompter> App<P> {
    pub const fn new(prompter: P, live: Option<LiveChat>) -> Self {
        Self { prompter, live }
    }

    /// Welcome screen, then menu until the user exits.
    ///
    /// Errors from the prompts (including interrupts) are returned; a demo
    /// that fails for any other reason is reported and the menu continues.
    pub async fn run(&mut self) -> Result<()> {
        show_welcome();

        let mut items: Vec<String> = DemoKind::ALL.iter().map(|k| k.label().to_string()).collect();
        items.push(EXIT_LABEL.to_string());

        loop {
            let choice = self.prompter.select("Pick a demo", &items)?;
            let Some(&kind) = DemoKind::ALL.get(choice) else {
                console::success(EXIT_MESSAGE);
                return Ok(());
            };

            self.run_demo(kind).await?;

            console::line("\n");
            if !self.prompter.confirm("Try another demo?", true)? {
                console::success(EXIT_MESSAGE);
                return Ok(());
            }
        }
    }

    /// Run one demo. Only interrupts propagate.
    pub async fn run_demo(&mut self, kind: DemoKind) -> Result<()> {
        debug!(demo = %kind, "Running demo");
        let result = match kind {
            DemoKind::Chat => ChatDemo::new(self.live.clone()).run(&mut self.prompter).await,
            DemoKind::Codegen => CodegenDemo.run(&mut self.prompter).await,
            DemoKind::Context => ContextDemo.run(&mut self.prompter).await,
        };
        match result {
            Err(e) if is_interrupted(&e) => Err(e),
            Err(e) => {
                warn!(demo = %kind, error = %e, "Demo failed");
                console::error(&format!("An error occurred while running the demo: {e:#}"));
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }
}

fn show_welcome() {
    console::clear_screen();
    console::header("Chat SDK demo application");

    console::line("Try out these features of the chat SDK:\n");
    console::line("  💬 Interactive chat");
    console::line("     └ development help through natural conversation\n");
    console::line("  🔨 Code generation");
    console::line("     └ quality code from natural language\n");
    console::line("  🧠 Context awareness");
    console::line("     └ suggestions that understand your project structure\n");

    console::info("Each demo runs on its own. Try them in any order!\n");
}
