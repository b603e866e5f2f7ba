use anyhow::Result;
use tokio::task::JoinHandle;

use crate::backend::BackendClient;
use crate::config::{Config, DEFAULT_SERVER_URL};
use crate::transcript::{Message, Transcript};

/// Fixed text shown in place of a reply when an exchange fails. A 500, a
/// refused connection, and a garbled body all surface as this same bubble.
pub const EXCHANGE_ERROR_TEXT: &str = "Error: Unable to get response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
    User,
    Assistant,
    Error,
}

/// One rendered entry in the chat view. Error bubbles exist only here; the
/// transcript never carries them, so a failed exchange is never replayed to
/// the server as assistant output.
#[derive(Debug, Clone)]
pub struct Bubble {
    pub kind: BubbleKind,
    pub content: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation state
    pub transcript: Transcript,
    pub bubbles: Vec<Bubble>,

    // Input line state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Exchange state
    pub loading: bool,
    pub exchange: Option<JoinHandle<Result<String>>>,

    // Chat view scroll state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Session
    pub backend: BackendClient,
    pub server_url: String,
    pub can_logout: bool,
    pub logout_requested: bool,
}

impl App {
    pub fn new(config: &Config) -> Self {
        // Env vars take precedence over the config file
        let server_url = std::env::var("CHAT_SERVER_URL")
            .ok()
            .or_else(|| config.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let api_key = std::env::var("CHAT_API_KEY")
            .ok()
            .or_else(|| config.api_key.clone());

        let backend = BackendClient::new(&server_url);

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            transcript: Transcript::new(),
            bubbles: Vec::new(),

            input: String::new(),
            cursor: 0,

            loading: false,
            exchange: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            backend,
            server_url,
            can_logout: api_key.is_some(),
            logout_requested: false,
        }
    }

    /// Validates the current input line and, if acceptable, records the user
    /// message and returns the payload for the exchange task: the entire
    /// transcript up to and including this message. Returns None when the
    /// trimmed input is empty or an exchange is already in flight; neither
    /// case touches the transcript.
    pub fn begin_exchange(&mut self) -> Option<Vec<Message>> {
        if self.exchange.is_some() {
            return None;
        }

        let text = self.input.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();

        self.transcript.push_user(&text);
        self.bubbles.push(Bubble {
            kind: BubbleKind::User,
            content: text,
        });

        self.input.clear();
        self.cursor = 0;
        self.loading = true;

        // Scroll to bottom so "Thinking..." is visible
        self.scroll_chat_to_bottom();

        Some(self.transcript.messages().to_vec())
    }

    /// Applies the outcome of an exchange. A reply becomes an assistant turn
    /// in both transcript and view; a failure becomes a view-only error
    /// bubble. Either way the typing indicator goes away.
    pub fn complete_exchange(&mut self, result: Result<String>) {
        self.loading = false;

        match result {
            Ok(reply) => {
                self.transcript.push_assistant(&reply);
                self.bubbles.push(Bubble {
                    kind: BubbleKind::Assistant,
                    content: reply,
                });
            }
            Err(_) => {
                self.bubbles.push(Bubble {
                    kind: BubbleKind::Error,
                    content: EXCHANGE_ERROR_TEXT.to_string(),
                });
            }
        }

        self.scroll_chat_to_bottom();
    }

    /// Picks up the in-flight exchange once its task has finished. Called
    /// from the event loop between events; the tick event guarantees this
    /// runs shortly after completion even when the user is idle.
    pub async fn poll_exchange(&mut self) {
        let finished = self
            .exchange
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.exchange.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("Exchange task failed: {}", e)),
            };
            self.complete_exchange(result);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn request_logout(&mut self) {
        if self.can_logout {
            self.logout_requested = true;
            self.should_quit = true;
        }
    }

    // Chat view scrolling
    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    /// Scroll the chat view so the latest entry (or the typing indicator)
    /// is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for bubble in &self.bubbles {
            total_lines += 1; // Label line ("You:" or "AI:")
            // Calculate wrapped lines for each line of content
            for line in bubble.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after bubble
        }

        if self.loading {
            total_lines += 2; // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}
