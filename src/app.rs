use tokio::sync::mpsc::UnboundedSender;

use crate::conversation::{Conversation, Turn};
use crate::relay::{RelayOutcome, WebhookClient};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Session state: the transcript, the input line, and the single in-flight
/// relay call. Owned by the event loop, mutated by one task only.
pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Transcript
    pub conversation: Conversation,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_total_lines: u16,

    // Input line
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Relay state
    pub relay: WebhookClient,
    pub relay_pending: bool,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Operator-facing failure notice, shown in the footer until dismissed
    pub notification: Option<String>,

    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(webhook_url: &str, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            conversation: Conversation::seeded(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_total_lines: 0,

            input: String::new(),
            cursor: 0,

            relay: WebhookClient::new(webhook_url),
            relay_pending: false,
            animation_frame: 0,

            notification: None,

            events,
        }
    }

    /// Appends the typed message and spawns the relay call. Blank input and
    /// an in-flight call are both no-ops, so the transcript never holds more
    /// than one unanswered user turn.
    pub fn submit_message(&mut self) {
        if self.input.trim().is_empty() || self.relay_pending {
            return;
        }

        let message = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.conversation.append(Turn::user(message.clone()));
        self.relay_pending = true;
        self.notification = None;

        // Scroll to bottom so "Thinking..." is visible
        self.scroll_chat_to_bottom();

        let relay = self.relay.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = relay.relay(&message).await;
            let _ = events.send(AppEvent::Relay(outcome));
        });
    }

    /// Lands a relay outcome as the assistant turn answering the pending
    /// user turn.
    pub fn resolve_relay(&mut self, outcome: RelayOutcome) {
        if let Some(detail) = outcome.failure_detail() {
            self.notification = Some(format!("Webhook error: {detail}"));
        }
        self.conversation.append(Turn::assistant(outcome.reply_text()));
        self.relay_pending = false;
        self.scroll_chat_to_bottom();
    }

    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
        self.notification = None;
        self.chat_scroll = 0;
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.relay_pending {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Transcript scrolling
    pub fn scroll_chat_down(&mut self) {
        if self.chat_scroll < self.chat_total_lines.saturating_sub(self.chat_height) {
            self.chat_scroll = self.chat_scroll.saturating_add(1);
        }
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.chat_height / 2;
        let max_scroll = self.chat_total_lines.saturating_sub(self.chat_height);
        self.chat_scroll = (self.chat_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.chat_height / 2;
        self.chat_scroll = self.chat_scroll.saturating_sub(half_page);
    }

    pub fn scroll_chat_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    /// Estimated wrapped line count of the rendered transcript, including
    /// the thinking indicator while a call is pending.
    pub fn transcript_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for turn in self.conversation.turns() {
            total_lines += 1; // Role line ("You:" or "Assistant:")
            for line in turn.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after turn
        }

        if self.relay_pending {
            total_lines += 2; // "Assistant:" + "Thinking..."
        }

        total_lines
    }

    /// Scroll the transcript so the latest turn (or the thinking indicator)
    /// is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.transcript_line_count();

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }
}
