//! Line-oriented chat front end.
//!
//! Reads commands from stdin and drives the [`ConversationStore`]; the
//! transcript is redrawn from the store's snapshot stream, so replies show up
//! while the prompt stays usable.

pub mod command;
pub mod render;

pub use command::{Command, CommandError};
pub use render::Renderer;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};

use crate::conversations::{ConversationStore, SubmitOutcome};

/// Printed when a line arrives while the previous one is still being answered.
pub const BUSY_NOTICE: &str = "  wingman is still answering, wait for the reply";

/// Run the interactive loop on stdin/stdout until `/quit` or end of input.
///
/// # Errors
/// Returns an error if reading stdin or writing stdout fails.
pub async fn run(store: &Arc<ConversationStore>) -> anyhow::Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    drive(store, input, &mut std::io::stdout()).await
}

async fn drive<R, W>(store: &Arc<ConversationStore>, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    let mut renderer = Renderer::default();
    let mut submissions = JoinSet::new();

    let interacted = interact(store, input, &mut renderer, &mut submissions, out).await;
    // Submissions cannot be cancelled; every one must land so it gets saved.
    let settled = settle(&mut submissions, out).await;
    interacted?;
    settled?;

    let snapshot = store.snapshot();
    renderer.render(&snapshot, out)?;
    writeln!(out, "{}", snapshot.language.translations().quit)?;
    Ok(())
}

async fn interact<R, W>(
    store: &Arc<ConversationStore>,
    input: R,
    renderer: &mut Renderer,
    submissions: &mut JoinSet<SubmitOutcome>,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    let mut updates = store.subscribe();
    let mut lines = input.lines();

    let initial = updates.borrow_and_update().clone();
    writeln!(out, "{}  (/help)", initial.language.translations().placeholder)?;
    renderer.render(&initial, out)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    return Ok(());
                };
                match command::parse(&line) {
                    Ok(Some(Command::Quit)) => return Ok(()),
                    Ok(Some(command)) => dispatch(store, command, submissions, out).await?,
                    Ok(None) => {}
                    Err(err) => writeln!(out, "  {err}")?,
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let snapshot = updates.borrow_and_update().clone();
                renderer.render(&snapshot, out)?;
            }
            Some(joined) = submissions.join_next() => report(joined, out)?,
        }
    }
}

/// Wait for every submission still running.
async fn settle<W: Write + Send>(
    submissions: &mut JoinSet<SubmitOutcome>,
    out: &mut W,
) -> anyhow::Result<()> {
    if !submissions.is_empty() {
        tracing::info!(count = submissions.len(), "waiting for pending replies before leaving");
    }

    let mut first_error = None;
    while let Some(joined) = submissions.join_next().await {
        let reported = report(joined, out);
        if first_error.is_none() {
            first_error = reported.err();
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn report<W: Write>(joined: Result<SubmitOutcome, JoinError>, out: &mut W) -> anyhow::Result<()> {
    let outcome = joined.context("submission task failed")?;
    tracing::debug!(?outcome, "submission settled");
    if outcome == SubmitOutcome::Ignored {
        writeln!(out, "{BUSY_NOTICE}")?;
    }
    Ok(())
}

async fn dispatch<W: Write + Send>(
    store: &Arc<ConversationStore>,
    command: Command,
    submissions: &mut JoinSet<SubmitOutcome>,
    out: &mut W,
) -> anyhow::Result<()> {
    let snapshot = store.snapshot();
    let t = snapshot.language.translations();

    match command {
        Command::Say(text) => submit(store, submissions, text, None),
        Command::QuickAirbnb => {
            submit(store, submissions, String::new(), Some(t.quick_action_airbnb));
        }
        Command::QuickActivities => {
            submit(store, submissions, String::new(), Some(t.quick_action_activities));
        }
        Command::New => {
            writeln!(out, "{}", t.new_flight)?;
            store.new_conversation().await;
        }
        Command::List => render::write_list(&snapshot, out)?,
        Command::Open(position) => {
            if let Err(err) = store.select_conversation(position.saturating_sub(1)).await {
                writeln!(out, "  {err}")?;
            }
        }
        Command::Delete(position) => {
            let Some(conversation) = snapshot.conversations.get(position.saturating_sub(1))
            else {
                writeln!(out, "  no flight #{position}")?;
                return Ok(());
            };
            match store.delete_conversation(conversation.id).await {
                Ok(_) => writeln!(out, "  deleted: {}", conversation.title)?,
                Err(err) => writeln!(out, "  {err}")?,
            }
        }
        Command::Lang(language) => {
            store.set_language(language).await;
            writeln!(out, "  language: {language}")?;
        }
        Command::Help => writeln!(out, "{}", command::HELP)?,
        Command::Quit => {}
    }
    Ok(())
}

fn submit(
    store: &Arc<ConversationStore>,
    submissions: &mut JoinSet<SubmitOutcome>,
    text: String,
    explicit: Option<&'static str>,
) {
    let store = Arc::clone(store);
    submissions.spawn(async move { store.submit_message(&text, explicit).await });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::chat::{ChatClient, ChatError, ChatFuture, ChatRequest, ChatResponse, ChatResult};
    use crate::conversations::{ERROR_MESSAGE, MemoryStorage, StoreOptions};
    use crate::i18n::Language;

    struct EchoClient;

    impl ChatClient for EchoClient {
        fn send(&self, request: ChatRequest) -> ChatFuture<'_, ChatResult<ChatResponse>> {
            Box::pin(async move {
                if request.message == "fail" {
                    return Err(ChatError::Status(502));
                }
                Ok(ChatResponse {
                    answer: format!("echo {}", request.message),
                    session_id: None,
                })
            })
        }
    }

    struct SlowClient;

    impl ChatClient for SlowClient {
        fn send(&self, request: ChatRequest) -> ChatFuture<'_, ChatResult<ChatResponse>> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(ChatResponse {
                    answer: format!("late {}", request.message),
                    session_id: None,
                })
            })
        }
    }

    async fn store_with(
        storage: MemoryStorage,
        client: Arc<dyn ChatClient>,
    ) -> Arc<ConversationStore> {
        Arc::new(
            ConversationStore::initialize(Box::new(storage), client, StoreOptions::default()).await,
        )
    }

    async fn next_outcome(submissions: &mut JoinSet<SubmitOutcome>) -> SubmitOutcome {
        submissions.join_next().await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_quick_action_uses_current_language() {
        let store = store_with(MemoryStorage::new(), Arc::new(EchoClient)).await;
        let mut submissions = JoinSet::new();
        let mut out = Vec::new();

        dispatch(&store, Command::Lang(Language::Fr), &mut submissions, &mut out)
            .await
            .unwrap();
        dispatch(&store, Command::QuickAirbnb, &mut submissions, &mut out)
            .await
            .unwrap();
        assert_eq!(next_outcome(&mut submissions).await, SubmitOutcome::Answered);

        let snapshot = store.snapshot();
        let messages = &snapshot.conversations[0].messages;
        assert_eq!(messages[1].text, Language::Fr.translations().quick_action_airbnb);
        assert_eq!(
            messages[2].text,
            format!("echo {}", Language::Fr.translations().quick_action_airbnb)
        );
    }

    #[tokio::test]
    async fn test_dispatch_positions_are_one_based() {
        let store = store_with(MemoryStorage::new(), Arc::new(EchoClient)).await;
        let mut submissions = JoinSet::new();
        let mut out = Vec::new();

        dispatch(&store, Command::New, &mut submissions, &mut out).await.unwrap();
        dispatch(&store, Command::Open(2), &mut submissions, &mut out).await.unwrap();
        assert_eq!(store.snapshot().active_index, 1);

        dispatch(&store, Command::Delete(1), &mut submissions, &mut out).await.unwrap();
        assert_eq!(store.snapshot().conversations.len(), 1);
        assert_eq!(store.snapshot().active_index, 0);

        dispatch(&store, Command::Open(5), &mut submissions, &mut out).await.unwrap();
        dispatch(&store, Command::Delete(5), &mut submissions, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("deleted: New Mission"));
        assert!(text.contains("out of range"));
        assert!(text.contains("no flight #5"));
        assert!(submissions.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_shows_error_notice() {
        let store = store_with(MemoryStorage::new(), Arc::new(EchoClient)).await;
        let mut submissions = JoinSet::new();
        let mut out = Vec::new();

        dispatch(&store, Command::Say("fail".to_string()), &mut submissions, &mut out)
            .await
            .unwrap();
        assert_eq!(next_outcome(&mut submissions).await, SubmitOutcome::Failed);
        assert_eq!(
            store.snapshot().conversations[0].messages.last().map(|m| m.text.as_str()),
            Some(ERROR_MESSAGE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_for_reply_behind_ignored_line() {
        let storage = MemoryStorage::new();
        let store = store_with(storage.clone(), Arc::new(SlowClient)).await;
        let mut updates = store.subscribe();
        let mut submissions = JoinSet::new();
        let mut out = Vec::new();

        dispatch(&store, Command::Say("a".to_string()), &mut submissions, &mut out)
            .await
            .unwrap();
        updates.wait_for(|s| s.pending).await.unwrap();
        dispatch(&store, Command::Say("b".to_string()), &mut submissions, &mut out)
            .await
            .unwrap();

        settle(&mut submissions, &mut out).await.unwrap();

        assert!(submissions.is_empty());
        assert!(String::from_utf8(out).unwrap().contains(BUSY_NOTICE));
        assert!(!store.snapshot().pending);
        let persisted = storage.payload().await.unwrap();
        assert!(persisted.contains("late a"));
        assert!(!persisted.contains("late b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_lands_reply_before_leaving() {
        let storage = MemoryStorage::new();
        let store = store_with(storage.clone(), Arc::new(SlowClient)).await;
        let mut out = Vec::new();

        drive(&store, &b"Tokyo\n/quit\n"[..], &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("── ✈️  Tokyo ──"));
        assert!(text.contains("you › Tokyo"));
        assert!(text.contains("wingman › late Tokyo"));
        assert!(text.trim_end().ends_with(Language::En.translations().quit));
        assert!(storage.payload().await.unwrap().contains("late Tokyo"));
    }
}
