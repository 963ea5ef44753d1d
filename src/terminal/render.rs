//! Incremental transcript rendering from store snapshots.

use std::io::{self, Write};

use crate::conversations::{ConversationId, Message, Sender, StoreSnapshot};

/// Tracks what has already been printed so each snapshot only adds the delta.
#[derive(Debug, Default)]
pub struct Renderer {
    active: Option<ConversationId>,
    title: String,
    shown: usize,
    pending_shown: bool,
}

impl Renderer {
    /// Print whatever changed since the previous snapshot.
    ///
    /// # Errors
    /// Returns an error if writing to `out` fails.
    pub fn render<W: Write>(&mut self, snapshot: &StoreSnapshot, out: &mut W) -> io::Result<()> {
        let Some(conversation) = snapshot.active_conversation() else {
            return Ok(());
        };

        if self.active != Some(conversation.id) || conversation.messages.len() < self.shown {
            self.active = Some(conversation.id);
            self.title.clear();
            self.shown = 0;
            self.pending_shown = false;
        }

        // Also reprinted once the first user message names the conversation.
        if self.title != conversation.title {
            writeln!(out)?;
            writeln!(out, "── ✈️  {} ──", conversation.title)?;
            self.title.clone_from(&conversation.title);
        }

        for message in &conversation.messages[self.shown..] {
            write_message(message, out)?;
        }
        self.shown = conversation.messages.len();

        if snapshot.pending && !self.pending_shown {
            writeln!(out, "  wingman › …")?;
        }
        self.pending_shown = snapshot.pending;

        out.flush()
    }
}

fn write_message<W: Write>(message: &Message, out: &mut W) -> io::Result<()> {
    let label = match message.sender {
        Sender::User => "    you",
        Sender::Assistant => "wingman",
    };
    writeln!(out, "{label} › {}", message.text)
}

/// Print the flight logs with the active one marked.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub fn write_list<W: Write>(snapshot: &StoreSnapshot, out: &mut W) -> io::Result<()> {
    let t = snapshot.language.translations();
    writeln!(out, "{}", t.flight_logs)?;
    if snapshot.conversations.is_empty() {
        writeln!(out, "  {}", t.no_logs)?;
    }
    for (idx, conversation) in snapshot.conversations.iter().enumerate() {
        let marker = if idx == snapshot.active_index { '*' } else { ' ' };
        writeln!(out, "{marker} {:>2}. ✈️ {}", idx + 1, conversation.title)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversations::Conversation;
    use crate::i18n::Language;

    const fn snapshot(
        conversations: Vec<Conversation>,
        active_index: usize,
        pending: bool,
    ) -> StoreSnapshot {
        StoreSnapshot {
            conversations,
            active_index,
            pending,
            language: Language::En,
        }
    }

    fn conversation(id: i64, title: &str, messages: Vec<Message>) -> Conversation {
        Conversation {
            id: ConversationId(id),
            title: title.to_string(),
            messages,
        }
    }

    fn render(renderer: &mut Renderer, snapshot: &StoreSnapshot) -> String {
        let mut out = Vec::new();
        renderer.render(snapshot, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_prints_only_new_messages() {
        let mut renderer = Renderer::default();
        let mut conv = conversation(1, "Current Flight", vec![Message::assistant("welcome")]);

        let first = render(&mut renderer, &snapshot(vec![conv.clone()], 0, false));
        assert!(first.contains("Current Flight"));
        assert!(first.contains("wingman › welcome"));

        conv.messages.push(Message::user("Tokyo"));
        let second = render(&mut renderer, &snapshot(vec![conv.clone()], 0, true));
        assert!(!second.contains("welcome"));
        assert!(second.contains("you › Tokyo"));
        assert!(second.contains('…'));

        let again = render(&mut renderer, &snapshot(vec![conv.clone()], 0, true));
        assert!(again.is_empty());

        conv.messages.push(Message::assistant("Sushi!"));
        let third = render(&mut renderer, &snapshot(vec![conv], 0, false));
        assert_eq!(third, "wingman › Sushi!\n");
    }

    #[test]
    fn test_renamed_conversation_gets_new_header() {
        let mut renderer = Renderer::default();
        let mut conv = conversation(1, "New Mission", vec![Message::assistant("welcome")]);
        render(&mut renderer, &snapshot(vec![conv.clone()], 0, false));

        conv.messages.push(Message::user("Lisbon"));
        conv.title = "Lisbon".to_string();
        let renamed = render(&mut renderer, &snapshot(vec![conv], 0, true));
        assert!(renamed.contains("── ✈️  Lisbon ──"));
        assert!(renamed.contains("you › Lisbon"));
        assert!(!renamed.contains("welcome"));
    }

    #[test]
    fn test_switching_conversation_reprints_transcript() {
        let mut renderer = Renderer::default();
        let a = conversation(1, "Oslo", vec![Message::assistant("hi"), Message::user("Oslo")]);
        let b = conversation(2, "New Mission", vec![Message::assistant("hi")]);

        render(&mut renderer, &snapshot(vec![b.clone(), a.clone()], 1, false));
        let switched = render(&mut renderer, &snapshot(vec![b, a], 0, false));
        assert!(switched.contains("New Mission"));
        assert!(switched.contains("wingman › hi"));
    }

    #[test]
    fn test_list_marks_active() {
        let snap = snapshot(
            vec![
                conversation(2, "Rome", vec![]),
                conversation(1, "Tokyo", vec![]),
            ],
            1,
            false,
        );
        let mut out = Vec::new();
        write_list(&snap, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("FLIGHT LOGS"));
        assert!(text.contains("   1. ✈️ Rome"));
        assert!(text.contains("*  2. ✈️ Tokyo"));
    }
}
