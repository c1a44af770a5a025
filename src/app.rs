use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;

use crate::client::{BackendClient, Translation};
use crate::message::{Message, MessageKind};

/// A dispatched translation request. The generation it was dispatched under
/// is compared on completion so a result landing after teardown or
/// supersession is discarded instead of committed against stale state.
pub struct PendingQuery {
    pub generation: u64,
    pub task: JoinHandle<Result<Translation>>,
}

pub struct App {
    pub should_quit: bool,

    // Transcript (append-only for the life of the session)
    pub transcript: Vec<Message>,

    // Input state
    pub draft: String,
    pub cursor: usize, // char position in draft

    // At most one request in flight; `pending.is_some()` is the busy flag
    pub pending: Option<PendingQuery>,
    generation: u64,

    // Transcript viewport
    pub scroll: u16,
    pub chat_height: u16, // inner height of chat area, set during render
    pub chat_width: u16,  // inner width of chat area, for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub client: BackendClient,
}

impl App {
    pub fn new(client: BackendClient) -> Self {
        Self {
            should_quit: false,
            transcript: Vec::new(),
            draft: String::new(),
            cursor: 0,
            pending: None,
            generation: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            client,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Submit the current draft. A no-op while a request is in flight or
    /// when the draft is empty/whitespace-only. Appends the user record
    /// immediately and dispatches the request; the draft stays visible (but
    /// uneditable) until the round trip completes.
    pub fn submit(&mut self) {
        if self.is_busy() || self.draft.trim().is_empty() {
            return;
        }

        let query = self.draft.clone();
        self.transcript.push(Message::user(query.clone()));

        self.generation += 1;
        let generation = self.generation;
        tracing::info!(%query, generation, "dispatching query");

        let client = self.client.clone();
        let task = tokio::spawn(async move { client.translate(&query).await });
        self.pending = Some(PendingQuery { generation, task });

        // Scroll so the "Thinking..." indicator is visible
        self.scroll_to_bottom();
    }

    /// Reap a finished request, if any. Called from the event loop on every
    /// iteration; tick events guarantee it runs at least every 300ms.
    pub async fn poll_pending(&mut self) {
        let finished = matches!(&self.pending, Some(p) if p.task.is_finished());
        if !finished {
            return;
        }

        if let Some(pending) = self.pending.take() {
            let outcome = pending
                .task
                .await
                .unwrap_or_else(|err| Err(anyhow!("query task panicked: {err}")));
            self.finish_submission(pending.generation, outcome);
        }
    }

    /// Commit the outcome of a dispatched request: exactly one bot or error
    /// record per user record, then the cleanup step (clear draft, clear
    /// busy) that runs on both paths. Outcomes from a stale generation are
    /// dropped without touching the transcript.
    pub fn finish_submission(&mut self, generation: u64, outcome: Result<Translation>) {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding stale query result"
            );
            return;
        }

        match outcome {
            Ok(translation) => {
                self.transcript
                    .push(Message::bot(translation.explanation, translation.sql_query));
            }
            Err(err) => {
                tracing::error!(error = %err, "query failed");
                self.transcript.push(Message::request_failed());
            }
        }

        self.pending = None;
        self.draft.clear();
        self.cursor = 0;
        self.scroll_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Transcript scrolling
    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max_scroll = self.transcript_lines().saturating_sub(self.chat_height);
        if self.scroll < max_scroll {
            self.scroll = self.scroll.saturating_add(1);
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(self.chat_height / 2);
    }

    pub fn scroll_half_page_down(&mut self) {
        let max_scroll = self.transcript_lines().saturating_sub(self.chat_height);
        self.scroll = (self.scroll + self.chat_height / 2).min(max_scroll);
    }

    /// Scroll so the newest record (or the thinking indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        let total_lines = self.transcript_lines();
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.scroll = 0;
        }
    }

    /// Rendered line count of the transcript, mirroring the layout produced
    /// by the renderer: a header line per record, wrapped text lines, an SQL
    /// line when present, and a blank separator.
    fn transcript_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.transcript {
            total_lines += 1; // Header line ("You:", "Bot:", "Error:")
            for line in msg.text.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            if msg.kind == MessageKind::Bot && msg.sql.is_some() {
                total_lines += 1; // "SQL: ..." line
            }
            total_lines += 1; // Blank line after message
        }

        if self.is_busy() {
            total_lines += 2; // "Bot:" + "Thinking..."
        }

        total_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        // Nothing listens on this address; dispatched requests fail, which
        // is fine for tests that drive finish_submission directly.
        App::new(BackendClient::new("http://127.0.0.1:9"))
    }

    fn translation(explanation: &str, sql: Option<&str>) -> Translation {
        Translation {
            explanation: explanation.to_string(),
            sql_query: sql.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn submit_appends_user_record_immediately() {
        let mut app = test_app();
        app.draft = "show all users".to_string();

        app.submit();

        assert_eq!(app.transcript.len(), 1);
        assert_eq!(app.transcript[0], Message::user("show all users"));
        assert!(app.is_busy());
        // Draft is only cleared after the round trip completes
        assert_eq!(app.draft, "show all users");
    }

    #[tokio::test]
    async fn submit_with_whitespace_draft_is_a_noop() {
        let mut app = test_app();
        app.draft = "   ".to_string();

        app.submit();

        assert!(app.transcript.is_empty());
        assert!(!app.is_busy());
        assert_eq!(app.draft, "   ");
    }

    #[tokio::test]
    async fn submit_while_busy_is_a_noop() {
        let mut app = test_app();
        app.draft = "first".to_string();
        app.submit();
        assert_eq!(app.transcript.len(), 1);

        app.draft = "second".to_string();
        app.submit();

        assert_eq!(app.transcript.len(), 1, "busy submit must not append");
        assert_eq!(app.draft, "second");
        assert_eq!(app.generation(), 1);
    }

    #[tokio::test]
    async fn successful_round_trip_appends_one_bot_record() {
        let mut app = test_app();
        app.draft = "show all users".to_string();
        app.submit();

        app.finish_submission(
            app.generation(),
            Ok(translation(
                "This returns all users.",
                Some("SELECT * FROM users"),
            )),
        );

        assert_eq!(
            app.transcript,
            vec![
                Message::user("show all users"),
                Message::bot("This returns all users.", Some("SELECT * FROM users".into())),
            ]
        );
        assert!(!app.is_busy());
        assert_eq!(app.draft, "");
        assert_eq!(app.cursor, 0);
    }

    #[tokio::test]
    async fn failed_round_trip_appends_one_error_record() {
        let mut app = test_app();
        app.draft = "asdkfj".to_string();
        app.submit();

        app.finish_submission(app.generation(), Err(anyhow!("connection refused")));

        assert_eq!(
            app.transcript,
            vec![Message::user("asdkfj"), Message::request_failed()]
        );
        assert!(!app.is_busy());
        assert_eq!(app.draft, "");
    }

    #[tokio::test]
    async fn bot_record_omits_sql_when_backend_did() {
        let mut app = test_app();
        app.draft = "hello".to_string();
        app.submit();

        app.finish_submission(app.generation(), Ok(translation("No SQL needed.", None)));

        assert_eq!(app.transcript[1].kind, MessageKind::Bot);
        assert_eq!(app.transcript[1].sql, None);
    }

    #[tokio::test]
    async fn stale_generation_result_is_discarded() {
        let mut app = test_app();
        app.draft = "query".to_string();
        app.submit();
        let stale = app.generation() - 1;

        app.finish_submission(stale, Ok(translation("late answer", None)));

        assert_eq!(app.transcript.len(), 1, "stale result must not append");
        assert!(app.is_busy(), "stale result must not clear the live request");
    }

    #[tokio::test]
    async fn session_accepts_new_submissions_after_an_error() {
        let mut app = test_app();
        app.draft = "bad".to_string();
        app.submit();
        app.finish_submission(app.generation(), Err(anyhow!("boom")));

        app.draft = "good".to_string();
        app.submit();
        app.finish_submission(app.generation(), Ok(translation("ok", None)));

        let kinds: Vec<MessageKind> = app.transcript.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MessageKind::User,
                MessageKind::Error,
                MessageKind::User,
                MessageKind::Bot,
            ]
        );
    }

    #[tokio::test]
    async fn poll_pending_reaps_a_finished_request() {
        let mut app = test_app();
        app.draft = "unreachable".to_string();
        app.submit();

        // The endpoint refuses connections, so the task resolves to an error
        while app.is_busy() {
            app.poll_pending().await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert_eq!(app.transcript.len(), 2);
        assert_eq!(app.transcript[1], Message::request_failed());
        assert_eq!(app.draft, "");
    }

    #[test]
    fn animation_is_frozen_while_idle() {
        let mut app = test_app();
        app.animation_frame = 2;
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
    }

    #[tokio::test]
    async fn animation_advances_while_busy() {
        let mut app = test_app();
        app.draft = "query".to_string();
        app.submit();

        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }
}
