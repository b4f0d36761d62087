use std::time::Duration;

use anyhow::Result;
use rand::RngExt;
use tracing::warn;

use crate::console;
use crate::live::LiveChat;
use crate::prompt::Prompter;

const MOCK_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Message counts shown when the chat ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: usize,
    pub user: usize,
    pub assistant: usize,
}

/// Interactive chat: mock replies by default, streamed replies with `--live`.
pub struct ChatDemo {
    history: Vec<Message>,
    live: Option<LiveChat>,
}

impl ChatDemo {
    pub const fn new(live: Option<LiveChat>) -> Self {
        Self {
            history: Vec::new(),
            live,
        }
    }

    pub async fn run(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
        console::header("Chat SDK - chat demo");
        console::info("Have a conversation with the assistant.");
        if let Some(live) = &self.live {
            console::info(&format!("Live mode: replies stream from {}.", live.model()));
        }
        console::info("Type \"exit\" to finish.\n");

        loop {
            let user_message = prompter.text("You")?;
            if user_message.trim().eq_ignore_ascii_case("exit") {
                console::success("Ending the chat.");
                break;
            }

            console::section("Assistant:");
            let reply = match &self.live {
                Some(live) => {
                    let reply = live.reply(&user_message, console::stream).await;
                    console::line("\n");
                    match reply {
                        Ok(reply) => reply,
                        Err(e) => {
                            warn!(error = %e, "Live chat turn failed");
                            console::error(&format!("{e:#}"));
                            continue;
                        }
                    }
                }
                None => {
                    let reply = mock_response(&user_message).await;
                    console::line(&format!("{reply}\n"));
                    reply
                }
            };
            // A turn is recorded only once it has a reply.
            self.push(Role::User, user_message);
            self.push(Role::Assistant, reply);
        }

        self.show_summary();
        Ok(())
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn summary(&self) -> Summary {
        let user = self.history.iter().filter(|m| m.role == Role::User).count();
        Summary {
            total: self.history.len(),
            user,
            assistant: self.history.len() - user,
        }
    }

    fn push(&mut self, role: Role, content: String) {
        self.history.push(Message { role, content });
    }

    fn show_summary(&self) {
        let summary = self.summary();
        console::section("Conversation summary");
        console::result("Total messages", &summary.total.to_string());
        console::result("User messages", &summary.user.to_string());
        console::result("Assistant replies", &summary.assistant.to_string());
    }
}

/// The canned replies for `user_message`.
pub fn mock_replies(user_message: &str) -> [String; 3] {
    [
        format!(
            "Got it: \"{user_message}\". With the Copilot SDK a conversation like this takes only a few lines to build."
        ),
        format!(
            "I see, \"{user_message}\". The SDK's chat sessions keep the context so the conversation can carry on."
        ),
        format!(
            "On \"{user_message}\": the Copilot SDK brings powerful AI features that developers can build intelligent applications on."
        ),
    ]
}

/// One of [`mock_replies`] at random, after a short delay.
pub async fn mock_response(user_message: &str) -> String {
    tokio::time::sleep(MOCK_DELAY).await;
    let [a, b, c] = mock_replies(user_message);
    match rand::rng().random_range(0..3) {
        0 => a,
        1 => b,
        _ => c,
    }
}
