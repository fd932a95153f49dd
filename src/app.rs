use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::backend::BackendClient;
use crate::config::Config;
use crate::interviewer::ResponseProvider;
use crate::tui::AppEvent;

/// Greeting the interviewer opens every call with.
pub const SEED_MESSAGE: &str =
    "Hello! I'm your AI interviewer. Let's begin with your interview. Tell me about yourself.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Inactive,
    Connecting,
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Agent,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
    pub sent_at: DateTime<Local>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            sender: Sender::User,
            content: content.to_string(),
            sent_at: Local::now(),
        }
    }

    pub fn agent(content: &str) -> Self {
        Self {
            sender: Sender::Agent,
            content: content.to_string(),
            sent_at: Local::now(),
        }
    }

    /// Clock label shown next to the sender, e.g. "14:32"
    pub fn time_label(&self) -> String {
        self.sent_at.format("%H:%M").to_string()
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub call_state: CallState,
    pub input_mode: InputMode,

    // Chat state
    pub chat_messages: Vec<ChatMessage>,
    pub show_chat: bool,
    pub input_text: String,
    pub input_cursor: usize, // cursor position in input_text (chars)
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of message area for scroll calculations
    pub chat_width: u16,  // Width of message area for wrap calculations

    // Reply state
    pub pending_responses: usize,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Candidate identity shown on the call card
    pub user_name: String,
    pub user_id: Option<String>,
    pub interview_kind: Option<String>,

    // Scheduled timers (aborted on end-call, re-start, and teardown)
    connect_delay: Duration,
    connect_task: Option<JoinHandle<()>>,
    response_tasks: Vec<JoinHandle<()>>,

    // Collaborators
    events: mpsc::UnboundedSender<AppEvent>,
    interviewer: Arc<dyn ResponseProvider>,
    pub backend: Arc<BackendClient>,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(
        config: &Config,
        interviewer: Arc<dyn ResponseProvider>,
        backend: Arc<BackendClient>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let user_name = config
            .user_name
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "Candidate".to_string());

        Self {
            should_quit: false,
            call_state: CallState::Inactive,
            input_mode: InputMode::Normal,

            chat_messages: Vec::new(),
            show_chat: false,
            input_text: String::new(),
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            pending_responses: 0,

            animation_frame: 0,

            user_name,
            user_id: config.user_id.clone(),
            interview_kind: config.interview_kind.clone(),

            connect_delay: config.connect_delay(),
            connect_task: None,
            response_tasks: Vec::new(),

            events,
            interviewer,
            backend,

            chat_area: None,
        }
    }

    /// True while at least one interviewer reply is in flight
    pub fn is_speaking(&self) -> bool {
        self.pending_responses > 0
    }

    /// Start a call from Inactive or Finished. Schedules the connect timer;
    /// the Connecting -> Active transition happens when it fires.
    pub fn start_call(&mut self) {
        if !matches!(self.call_state, CallState::Inactive | CallState::Finished) {
            return;
        }
        info!("starting call");
        self.call_state = CallState::Connecting;

        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
        let tx = self.events.clone();
        let delay = self.connect_delay;
        self.connect_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AppEvent::CallConnected);
        }));
    }

    /// Connect timer completion. Resets the chat to the seed greeting.
    pub fn call_connected(&mut self) {
        // A completion from a canceled timer can still be queued
        if self.call_state != CallState::Connecting {
            debug!("dropping stale connect completion");
            return;
        }
        info!("call connected");
        self.call_state = CallState::Active;
        self.connect_task = None;

        self.chat_messages.clear();
        self.chat_messages.push(ChatMessage::agent(SEED_MESSAGE));
        self.pending_responses = 0;
        self.scroll_chat_to_bottom();
    }

    /// End the call. While Connecting this cancels the pending connect
    /// timer and returns to Inactive instead of Finished.
    pub fn end_call(&mut self) {
        match self.call_state {
            CallState::Active => {
                info!("ending call");
                self.call_state = CallState::Finished;
                self.input_mode = InputMode::Normal;
                for task in self.response_tasks.drain(..) {
                    task.abort();
                }
                self.pending_responses = 0;
            }
            CallState::Connecting => {
                info!("canceling call while connecting");
                self.call_state = CallState::Inactive;
                if let Some(task) = self.connect_task.take() {
                    task.abort();
                }
            }
            CallState::Inactive | CallState::Finished => {}
        }
    }

    /// Send the current draft. Whitespace-only drafts are ignored.
    pub fn send_message(&mut self) {
        if self.call_state != CallState::Active {
            return;
        }
        let text = self.input_text.trim().to_string();
        if text.is_empty() {
            return;
        }

        // The user message lands before the reply is scheduled, so message
        // order per send is deterministic
        self.chat_messages.push(ChatMessage::user(&text));
        self.input_text.clear();
        self.input_cursor = 0;
        self.schedule_response();
        self.scroll_chat_to_bottom();
    }

    fn schedule_response(&mut self) {
        self.pending_responses += 1;

        let interviewer = Arc::clone(&self.interviewer);
        let history = self.chat_messages.clone();
        let tx = self.events.clone();

        self.response_tasks.retain(|task| !task.is_finished());
        self.response_tasks.push(tokio::spawn(async move {
            let reply = interviewer.next_message(&history).await;
            let _ = tx.send(AppEvent::AgentReply(reply));
        }));
    }

    /// Reply timer completion. Replies landing after the call ended are
    /// dropped.
    pub fn agent_reply(&mut self, reply: anyhow::Result<String>) {
        if self.call_state != CallState::Active {
            debug!("dropping reply for ended call");
            return;
        }
        self.pending_responses = self.pending_responses.saturating_sub(1);

        match reply {
            Ok(text) => self.chat_messages.push(ChatMessage::agent(&text)),
            Err(e) => {
                warn!("interviewer reply failed: {e}");
                self.chat_messages
                    .push(ChatMessage::agent(&format!("Error: {}", e)));
            }
        }
        self.scroll_chat_to_bottom();
    }

    pub fn toggle_chat(&mut self) {
        self.show_chat = !self.show_chat;
        if self.show_chat {
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_speaking() || self.call_state == CallState::Connecting {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll the chat so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.chat_messages {
            total_lines = total_lines.saturating_add(1); // Sender line ("You:" or "AI:")
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let rows = if char_count == 0 {
                    1 // Empty line still takes one line
                } else {
                    ((char_count / wrap_width) + 1).min(u16::MAX as usize) as u16
                };
                total_lines = total_lines.saturating_add(rows);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.is_speaking() {
            total_lines = total_lines.saturating_add(2); // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    /// Abort outstanding timers so nothing fires after teardown
    pub fn shutdown(&mut self) {
        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
        for task in self.response_tasks.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::backend::{BackendClient, BackendSettings};
    use crate::interviewer::ScriptedInterviewer;

    /// App wired to an in-test event channel with millisecond timers.
    pub(crate) fn fixture(
        connect_ms: u64,
        think_ms: u64,
    ) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = Config {
            user_name: Some("Alex".to_string()),
            user_id: Some("candidate-42".to_string()),
            interview_kind: None,
            connect_delay_ms: Some(connect_ms),
            think_delay_ms: Some(think_ms),
            backend: None,
        };
        let interviewer = Arc::new(ScriptedInterviewer::new(
            "general",
            Duration::from_millis(think_ms),
        ));
        let backend = Arc::new(
            BackendClient::connect(&BackendSettings::default())
                .expect("default settings are valid"),
        );
        let app = App::new(&config, interviewer, backend, tx);
        (app, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::fixture;
    use super::*;
    use crate::interviewer::GENERAL_QUESTIONS;
    use tokio::time::timeout;

    #[test]
    fn new_session_is_inactive_with_empty_chat() {
        let (app, _rx) = fixture(5, 5);
        assert_eq!(app.call_state, CallState::Inactive);
        assert!(app.chat_messages.is_empty());
        assert!(!app.show_chat);
        assert!(!app.is_speaking());
    }

    #[tokio::test]
    async fn call_goes_active_after_connect_delay() {
        let (mut app, mut rx) = fixture(5, 5);

        app.start_call();
        assert_eq!(app.call_state, CallState::Connecting);

        let event = rx.recv().await.expect("connect completion");
        assert!(matches!(event, AppEvent::CallConnected));
        app.call_connected();

        assert_eq!(app.call_state, CallState::Active);
        assert_eq!(app.chat_messages.len(), 1);
        assert_eq!(app.chat_messages[0].sender, Sender::Agent);
        assert_eq!(app.chat_messages[0].content, SEED_MESSAGE);
    }

    #[tokio::test]
    async fn start_call_is_ignored_mid_call() {
        let (mut app, mut rx) = fixture(5, 5);

        app.start_call();
        rx.recv().await.expect("connect completion");
        app.call_connected();

        app.start_call();
        assert_eq!(app.call_state, CallState::Active);
    }

    #[tokio::test]
    async fn restart_resets_chat_to_seed() {
        let (mut app, mut rx) = fixture(5, 5);

        app.start_call();
        rx.recv().await.expect("connect completion");
        app.call_connected();
        app.input_text = "Hi there".to_string();
        app.send_message();
        app.end_call();
        assert_eq!(app.call_state, CallState::Finished);

        app.start_call();
        assert_eq!(app.call_state, CallState::Connecting);
        loop {
            match rx.recv().await.expect("connect completion") {
                AppEvent::CallConnected => break,
                // The aborted reply may have completed first
                _ => continue,
            }
        }
        app.call_connected();
        assert_eq!(app.chat_messages.len(), 1);
        assert_eq!(app.chat_messages[0].content, SEED_MESSAGE);
    }

    #[tokio::test]
    async fn blank_draft_is_not_sent() {
        let (mut app, mut rx) = fixture(5, 5);

        app.start_call();
        rx.recv().await.expect("connect completion");
        app.call_connected();

        app.input_text = String::new();
        app.send_message();
        app.input_text = "   ".to_string();
        app.send_message();

        assert_eq!(app.chat_messages.len(), 1);
        assert!(!app.is_speaking());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_appends_user_then_one_canned_reply() {
        let (mut app, mut rx) = fixture(5, 5);

        app.start_call();
        rx.recv().await.expect("connect completion");
        app.call_connected();

        app.input_text = "I have 5 years of experience".to_string();
        app.send_message();

        assert_eq!(app.chat_messages.len(), 2);
        assert_eq!(app.chat_messages[1].sender, Sender::User);
        assert_eq!(app.chat_messages[1].content, "I have 5 years of experience");
        assert!(app.input_text.is_empty());
        assert!(app.is_speaking());

        let event = rx.recv().await.expect("reply completion");
        let reply = match event {
            AppEvent::AgentReply(reply) => reply,
            other => panic!("unexpected event: {:?}", other),
        };
        app.agent_reply(reply);

        assert_eq!(app.chat_messages.len(), 3);
        assert_eq!(app.chat_messages[2].sender, Sender::Agent);
        assert!(GENERAL_QUESTIONS.contains(&app.chat_messages[2].content.as_str()));
        assert!(!app.is_speaking());

        for pair in app.chat_messages.windows(2) {
            assert!(pair[0].sent_at <= pair[1].sent_at);
        }
    }

    #[tokio::test]
    async fn overlapping_sends_each_get_a_reply() {
        let (mut app, mut rx) = fixture(5, 5);

        app.start_call();
        rx.recv().await.expect("connect completion");
        app.call_connected();

        app.input_text = "First answer".to_string();
        app.send_message();
        app.input_text = "Second answer".to_string();
        app.send_message();

        assert_eq!(app.pending_responses, 2);
        assert!(app.is_speaking());

        let reply = match rx.recv().await.expect("first reply") {
            AppEvent::AgentReply(reply) => reply,
            other => panic!("unexpected event: {:?}", other),
        };
        app.agent_reply(reply);
        assert!(app.is_speaking(), "one reply is still in flight");

        let reply = match rx.recv().await.expect("second reply") {
            AppEvent::AgentReply(reply) => reply,
            other => panic!("unexpected event: {:?}", other),
        };
        app.agent_reply(reply);
        assert!(!app.is_speaking());

        // Seed, both user messages, then one agent reply per send
        assert_eq!(app.chat_messages.len(), 5);
        assert_eq!(app.chat_messages[1].sender, Sender::User);
        assert_eq!(app.chat_messages[2].sender, Sender::User);
        for msg in &app.chat_messages[3..] {
            assert_eq!(msg.sender, Sender::Agent);
            assert!(GENERAL_QUESTIONS.contains(&msg.content.as_str()));
        }
    }

    #[tokio::test]
    async fn ending_while_connecting_cancels_the_timer() {
        let (mut app, mut rx) = fixture(60_000, 5);

        app.start_call();
        assert_eq!(app.call_state, CallState::Connecting);

        app.end_call();
        assert_eq!(app.call_state, CallState::Inactive);

        let quiet = timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(quiet.is_err(), "canceled connect timer still fired");
    }

    #[test]
    fn stale_connect_completion_is_dropped() {
        let (mut app, _rx) = fixture(5, 5);
        app.call_connected();
        assert_eq!(app.call_state, CallState::Inactive);
    }

    #[tokio::test]
    async fn reply_after_end_call_is_dropped() {
        let (mut app, mut rx) = fixture(5, 60_000);

        app.start_call();
        rx.recv().await.expect("connect completion");
        app.call_connected();

        app.input_text = "Hello".to_string();
        app.send_message();
        assert!(app.is_speaking());

        app.end_call();
        assert_eq!(app.call_state, CallState::Finished);
        assert!(!app.is_speaking());

        // The task was aborted mid-sleep; nothing should arrive
        let quiet = timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(quiet.is_err(), "aborted reply task still fired");

        // A completion that already reached the queue is ignored too
        app.agent_reply(Ok("late".to_string()));
        assert_eq!(app.chat_messages.len(), 2);
    }

    #[tokio::test]
    async fn end_call_keeps_chat_visibility() {
        let (mut app, mut rx) = fixture(5, 5);

        app.start_call();
        rx.recv().await.expect("connect completion");
        app.call_connected();
        app.toggle_chat();
        assert!(app.show_chat);

        app.end_call();
        assert!(app.show_chat);
    }

    #[test]
    fn toggle_chat_twice_round_trips() {
        let (mut app, _rx) = fixture(5, 5);
        let before = app.show_chat;
        app.toggle_chat();
        app.toggle_chat();
        assert_eq!(app.show_chat, before);
    }

    #[test]
    fn scroll_to_bottom_saturates_on_oversized_histories() {
        let (mut app, _rx) = fixture(5, 5);
        app.chat_width = 40;
        app.chat_height = 20;
        app.chat_messages
            .push(ChatMessage::agent(&"line\n".repeat(70_000)));

        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, u16::MAX - 20);
    }

    #[test]
    fn time_label_is_hours_and_minutes() {
        let msg = ChatMessage::user("hi");
        let label = msg.time_label();
        assert_eq!(label.len(), 5);
        assert_eq!(label.as_bytes()[2], b':');
    }
}
