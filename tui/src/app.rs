//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - ConductorClient for the conversation
//! - Rendering of transcript, input line and status bar
//!
//! Every frame the App drains finished replies from the conductor and
//! redraws; it never waits on the network itself.

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use chatbox_conductor::{ChatBackend, ConductorState, HttpChatBackend, ReplyOutcome};

use crate::conductor_client::ConductorClient;
use crate::display::wrap_messages;
use crate::theme::{
    message_style, ATTACHMENT_YELLOW, BOT_MAGENTA, DIM_GRAY, ERROR_RED, USER_GREEN,
};

/// Input box height (lines, including the separator)
const INPUT_HEIGHT: u16 = 4;

/// Redraw interval while idle
const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Shown in the empty input line
pub const INPUT_PLACEHOLDER: &str = "Type your message...";

/// What the input line is editing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Composing a chat message
    Chat,
    /// Typing space-separated file paths to attach
    PickFiles,
}

/// Main application state
pub struct App<B: ChatBackend + 'static = HttpChatBackend> {
    // === Core State ===
    /// Is the app still running?
    running: bool,

    // === Conductor Integration ===
    /// The embedded conductor
    conductor: ConductorClient<B>,
    /// Label shown next to bot replies
    bot_label: String,

    // === Input State ===
    /// Which buffer keystrokes go to
    mode: InputMode,
    /// Paths typed in the file picker
    picker_buffer: String,
    /// One-line message above the input (picker errors, request failures)
    notice: Option<String>,
    /// Scroll offset (lines from bottom, 0 = latest)
    scroll_offset: usize,
    /// Total rendered lines (for scroll bounds)
    total_lines: usize,
    /// Height of the transcript pane at the last draw
    pane_height: u16,
}

impl<B: ChatBackend + 'static> App<B> {
    /// Create a new App around a conductor client
    pub fn new(conductor: ConductorClient<B>, bot_label: impl Into<String>) -> Self {
        Self {
            running: true,
            conductor,
            bot_label: bot_label.into(),
            mode: InputMode::Chat,
            picker_buffer: String::new(),
            notice: None,
            scroll_offset: 0,
            total_lines: 0,
            pane_height: 0,
        }
    }

    /// Whether the event loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current input mode
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// The embedded conductor client
    pub fn conductor(&self) -> &ConductorClient<B> {
        &self.conductor
    }

    /// Main event loop
    pub async fn run<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so user sees UI
        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Terminal event error");
                        }
                        None => self.quit(),
                    }
                }

                // Frame tick
                () = tokio::time::sleep(FRAME_INTERVAL) => {}
            }

            self.process_replies();
            terminal.draw(|frame| self.draw(frame))?;
        }

        Ok(())
    }

    /// Drain finished replies from the conductor
    pub fn process_replies(&mut self) {
        for outcome in self.conductor.poll_replies() {
            match outcome {
                ReplyOutcome::Answered { .. } => self.notice = None,
                ReplyOutcome::Failed { error, .. } => {
                    self.notice = Some(format!("Request failed: {}", error.kind().label()));
                }
            }
        }
    }

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            InputMode::Chat => self.handle_chat_key(key),
            InputMode::PickFiles => self.handle_picker_key(key).await,
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            // Quit
            KeyCode::Esc => self.quit(),
            KeyCode::Char('c') if ctrl => self.quit(),

            // Attachments
            KeyCode::Char('o') if ctrl => {
                self.mode = InputMode::PickFiles;
                self.picker_buffer.clear();
            }
            KeyCode::Char('x') if ctrl => {
                self.conductor.clear_attachments();
            }

            // Submit message
            KeyCode::Enter => {
                if self.conductor.send().is_some() {
                    self.notice = None;
                    self.scroll_offset = 0;
                }
            }

            // Typing
            KeyCode::Char(c) if !ctrl => self.conductor.push_char(c),
            KeyCode::Backspace => self.conductor.pop_char(),

            // Conversation scrolling
            KeyCode::PageUp => {
                let page = (self.pane_height / 2).max(1) as usize;
                let max_scroll = self.total_lines.saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + page).min(max_scroll);
            }
            KeyCode::PageDown => {
                let page = (self.pane_height / 2).max(1) as usize;
                self.scroll_offset = self.scroll_offset.saturating_sub(page);
            }

            _ => {}
        }
    }

    async fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Chat;
                self.picker_buffer.clear();
            }
            KeyCode::Enter => {
                let paths: Vec<String> = self
                    .picker_buffer
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                self.mode = InputMode::Chat;
                self.picker_buffer.clear();

                if paths.is_empty() {
                    self.conductor.clear_attachments();
                    return;
                }
                match self.conductor.select_files(paths.as_slice()).await {
                    Ok(_) => self.notice = None,
                    Err(e) => {
                        tracing::warn!(error = %e, "File selection failed");
                        self.notice = Some(e.to_string());
                    }
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.picker_buffer.push(c);
            }
            KeyCode::Backspace => {
                self.picker_buffer.pop();
            }
            _ => {}
        }
    }

    fn quit(&mut self) {
        self.conductor.shutdown();
        self.running = false;
    }

    /// Render the UI
    pub fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),               // Transcript
                Constraint::Length(1),            // Attachments / notices
                Constraint::Length(INPUT_HEIGHT), // Input
                Constraint::Length(1),            // Status bar
            ])
            .split(frame.area());

        self.render_conversation(frame, chunks[0]);
        self.render_notice(frame, chunks[1]);
        self.render_input(frame, chunks[2]);
        self.render_status(frame, chunks[3]);
    }

    fn render_conversation(&mut self, frame: &mut Frame, area: Rect) {
        self.pane_height = area.height;
        let height = area.height as usize;
        let width = area.width.saturating_sub(1) as usize;

        let messages = self.conductor.messages(&self.bot_label);
        let all_lines = wrap_messages(&messages, width);
        self.total_lines = all_lines.len();

        // Clamp scroll offset
        let max_scroll = self.total_lines.saturating_sub(height);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }

        let visible_end = self.total_lines.saturating_sub(self.scroll_offset);
        let visible_start = visible_end.saturating_sub(height);

        let lines: Vec<Line> = all_lines[visible_start..visible_end]
            .iter()
            .map(|l| Line::from(Span::styled(l.text.clone(), message_style(l.role))))
            .collect();

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_notice(&self, frame: &mut Frame, area: Rect) {
        let line = if let Some(ref notice) = self.notice {
            Line::from(Span::styled(notice.clone(), Style::default().fg(ERROR_RED)))
        } else if let Some(summary) = self.conductor.attachments().summary() {
            Line::from(Span::styled(summary, Style::default().fg(ATTACHMENT_YELLOW)))
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(DIM_GRAY));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let text_height = inner.height as usize;
        let text_width = inner.width.saturating_sub(1) as usize;
        if text_width < 5 || text_height < 1 {
            return;
        }

        let (full_input, style) = match self.mode {
            InputMode::PickFiles => (
                format!("Attach (space-separated paths): {}_", self.picker_buffer),
                Style::default().fg(ATTACHMENT_YELLOW),
            ),
            InputMode::Chat if self.conductor.input().is_empty() => (
                INPUT_PLACEHOLDER.to_string(),
                Style::default().fg(DIM_GRAY),
            ),
            InputMode::Chat => (
                format!("{}_", self.conductor.input()),
                Style::default().fg(USER_GREEN),
            ),
        };

        // Keep the tail of long input visible
        let wrapped: Vec<String> = textwrap::wrap(&full_input, text_width)
            .iter()
            .map(ToString::to_string)
            .collect();
        let skip = wrapped.len().saturating_sub(text_height);
        let lines: Vec<Line> = wrapped
            .into_iter()
            .skip(skip)
            .map(|l| Line::from(Span::styled(l, style)))
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let state = self.conductor.state();
        let state_style = match state {
            ConductorState::Waiting => Style::default().fg(BOT_MAGENTA),
            ConductorState::Ready | ConductorState::ShutDown => Style::default().fg(DIM_GRAY),
        };

        let scroll_info = if self.scroll_offset > 0 {
            format!(" [^{} lines]", self.scroll_offset)
        } else {
            String::new()
        };

        let hints = match self.mode {
            InputMode::Chat => "Enter send | Ctrl+O attach | Ctrl+X clear | PgUp/PgDn | Esc quit",
            InputMode::PickFiles => "Enter confirm | Esc cancel",
        };

        let line = Line::from(vec![
            Span::styled(format!(" {}", state.description()), state_style),
            Span::styled(
                format!(
                    " | session {} | {} | {hints}{scroll_info}",
                    self.conductor.session_id(),
                    self.conductor.variant()
                ),
                Style::default().fg(DIM_GRAY),
            ),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbox_conductor::{
        ChatError, ChatReply, ChatRequest, ConductorConfig, SessionId, VariantKind,
    };
    use ratatui::backend::TestBackend;
    use tempfile::NamedTempFile;

    struct FixedBackend(Result<String, ChatError>);

    #[async_trait::async_trait]
    impl ChatBackend for FixedBackend {
        fn name(&self) -> &str {
            "Fixed"
        }

        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, ChatError> {
            self.0.clone().map(|response| ChatReply { response })
        }
    }

    /// Hands out scripted replies in call order
    struct ScriptedBackend(std::sync::Mutex<Vec<Result<String, ChatError>>>);

    #[async_trait::async_trait]
    impl ChatBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, ChatError> {
            let next = self.0.lock().unwrap().remove(0);
            next.map(|response| ChatReply { response })
        }
    }

    fn app(variant: VariantKind, reply: Result<String, ChatError>) -> App<FixedBackend> {
        let config = ConductorConfig {
            session_id: Some(SessionId::from("tui00001")),
            ..Default::default()
        };
        App::new(
            ConductorClient::new(FixedBackend(reply), variant, config),
            "Gemini",
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    async fn type_text<B: ChatBackend + 'static>(app: &mut App<B>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await;
        }
    }

    fn screen<B: ChatBackend + 'static>(app: &mut App<B>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_enter_sends_and_clears_input() {
        let mut app = app(VariantKind::RoleTagged, Ok("Hi there".into()));
        type_text(&mut app, "Hello").await;
        assert_eq!(app.conductor().input(), "Hello");

        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.conductor().input(), "");
        assert_eq!(app.conductor().state(), ConductorState::Waiting);
    }

    #[tokio::test]
    async fn test_placeholder_and_status_rendered() {
        let mut app = app(VariantKind::Paired, Ok("Hi".into()));
        let text = screen(&mut app);

        assert!(text.contains(INPUT_PLACEHOLDER));
        assert!(text.contains("session tui00001"));
        assert!(text.contains("paired"));
        assert!(text.contains("Ready"));
    }

    #[tokio::test]
    async fn test_reply_rendered_after_processing() {
        let mut app = app(VariantKind::Paired, Ok("Hi there".into()));
        type_text(&mut app, "Hello").await;
        app.handle_key(key(KeyCode::Enter)).await;

        // Let the request task finish
        for _ in 0..100 {
            app.process_replies();
            if app.conductor().state() == ConductorState::Ready {
                break;
            }
            tokio::task::yield_now().await;
        }

        let text = screen(&mut app);
        assert!(text.contains("User: Hello"));
        assert!(text.contains("Gemini: Hi there"));
    }

    #[tokio::test]
    async fn test_failure_sets_notice() {
        let mut app = app(
            VariantKind::RoleTagged,
            Err(ChatError::Status {
                status: 500,
                body: String::new(),
            }),
        );
        type_text(&mut app, "Hello").await;
        app.handle_key(key(KeyCode::Enter)).await;

        for _ in 0..100 {
            app.process_replies();
            if app.conductor().state() == ConductorState::Ready {
                break;
            }
            tokio::task::yield_now().await;
        }

        let text = screen(&mut app);
        assert!(text.contains("Request failed: server error"));
        assert!(text.contains("Sorry, I encountered an error. Please try again."));
    }

    #[tokio::test]
    async fn test_file_picker_stages_files() {
        let file = NamedTempFile::new().unwrap();
        let mut app = app(VariantKind::RoleTagged, Ok("ok".into()));

        app.handle_key(ctrl('o')).await;
        assert_eq!(app.mode(), InputMode::PickFiles);

        type_text(&mut app, &file.path().display().to_string()).await;
        app.handle_key(key(KeyCode::Enter)).await;

        assert_eq!(app.mode(), InputMode::Chat);
        assert_eq!(app.conductor().attachments().len(), 1);
        assert!(screen(&mut app).contains("1 file(s) selected"));

        app.handle_key(ctrl('x')).await;
        assert!(app.conductor().attachments().is_empty());
    }

    #[tokio::test]
    async fn test_file_picker_error_keeps_running() {
        let mut app = app(VariantKind::RoleTagged, Ok("ok".into()));

        app.handle_key(ctrl('o')).await;
        type_text(&mut app, "/nonexistent/chatbox/file.txt").await;
        app.handle_key(key(KeyCode::Enter)).await;

        assert!(app.is_running());
        assert!(app.conductor().attachments().is_empty());
        assert!(screen(&mut app).contains("File not found"));
    }

    #[tokio::test]
    async fn test_esc_in_picker_cancels() {
        let mut app = app(VariantKind::RoleTagged, Ok("ok".into()));

        app.handle_key(ctrl('o')).await;
        type_text(&mut app, "a.txt").await;
        app.handle_key(key(KeyCode::Esc)).await;

        assert_eq!(app.mode(), InputMode::Chat);
        assert!(app.is_running());
        assert_eq!(app.conductor().input(), "");
    }

    #[tokio::test]
    async fn test_esc_quits_and_shuts_down() {
        let mut app = app(VariantKind::Paired, Ok("ok".into()));
        app.handle_key(key(KeyCode::Esc)).await;

        assert!(!app.is_running());
        assert_eq!(app.conductor().state(), ConductorState::ShutDown);
    }

    #[tokio::test]
    async fn test_answer_clears_failure_notice() {
        let backend = ScriptedBackend(std::sync::Mutex::new(vec![
            Err(ChatError::Transport("connection refused".into())),
            Ok("Hi there".into()),
        ]));
        let client = ConductorClient::new(backend, VariantKind::Paired, ConductorConfig::default());
        let mut app = App::new(client, "Gemini");

        type_text(&mut app, "first").await;
        app.handle_key(key(KeyCode::Enter)).await;
        type_text(&mut app, "second").await;
        app.handle_key(key(KeyCode::Enter)).await;

        for _ in 0..100 {
            app.process_replies();
            if app.conductor().state() == ConductorState::Ready {
                break;
            }
            tokio::task::yield_now().await;
        }

        let text = screen(&mut app);
        assert!(text.contains("(no reply: network error)"));
        assert!(text.contains("Gemini: Hi there"));
        assert!(!text.contains("Request failed"));
    }
}
