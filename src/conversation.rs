/// Greeting seeded into every fresh conversation.
pub const GREETING: &str =
    "Hello! I'm the workflow assistant. How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One message in the transcript. Immutable once appended.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered transcript for the current session. Append-only between clears,
/// mutated by the single app task.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh conversation holding only the greeting.
    pub fn seeded() -> Self {
        let mut conversation = Self::new();
        conversation.seed_greeting();
        conversation
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn latest(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Drops the transcript and reseeds the greeting so the next render
    /// starts from the same state as first load.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.seed_greeting();
    }

    /// Seeds the fixed assistant greeting, only when the transcript is empty.
    pub fn seed_greeting(&mut self) {
        if self.turns.is_empty() {
            self.turns.push(Turn::assistant(GREETING));
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_conversation_starts_with_greeting() {
        let conversation = Conversation::seeded();
        assert_eq!(conversation.len(), 1);
        let turn = conversation.latest().unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, GREETING);
    }

    #[test]
    fn seed_greeting_is_a_noop_on_nonempty_transcript() {
        let mut conversation = Conversation::seeded();
        conversation.append(Turn::user("hi"));
        conversation.seed_greeting();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.latest().unwrap().content, "hi");
    }

    #[test]
    fn append_preserves_order() {
        let mut conversation = Conversation::seeded();
        conversation.append(Turn::user("first"));
        conversation.append(Turn::assistant("second"));
        let contents: Vec<&str> = conversation
            .turns()
            .iter()
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(contents, vec![GREETING, "first", "second"]);
    }

    #[test]
    fn clear_reseeds_the_greeting() {
        let mut conversation = Conversation::seeded();
        conversation.append(Turn::user("hi"));
        conversation.append(Turn::assistant("hello"));
        conversation.clear();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.latest().unwrap().content, GREETING);
    }

    #[test]
    fn latest_on_empty_is_none() {
        let conversation = Conversation::new();
        assert!(conversation.latest().is_none());
        assert!(conversation.is_empty());
    }
}
