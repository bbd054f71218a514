use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::backend::AnswerService;
use crate::conversation::Conversation;
use crate::error::{ChatError, ChatResult};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online,
    Offline,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    pub conversation: Conversation,
    pub cursor: usize, // char position in the draft

    // Chat log layout, updated during render
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_lines: u16, // wrapped row count of the log at the last render
    pub follow_tail: bool, // keep the newest entry in view

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub send_area: Option<Rect>,

    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub backend_status: BackendStatus,
    pub endpoint: String,

    reply_task: Option<(u64, JoinHandle<ChatResult<Option<String>>>)>,
    next_request_id: u64,
    service: Arc<dyn AnswerService>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        service: Arc<dyn AnswerService>,
        endpoint: impl Into<String>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            conversation: Conversation::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_lines: 0,
            follow_tail: true,

            chat_area: None,
            send_area: None,

            animation_frame: 0,
            backend_status: BackendStatus::Checking,
            endpoint: endpoint.into(),

            reply_task: None,
            next_request_id: 0,
            service,
            events,
        }
    }

    /// Submit the current draft; a blank draft or a pending request is ignored.
    pub fn submit(&mut self) {
        let Some(message) = self.conversation.begin_submit() else {
            return;
        };
        self.cursor = 0;
        self.scroll_to_bottom();

        info!(chars = message.chars().count(), "submitting message");

        let id = self.next_request_id;
        self.next_request_id += 1;

        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let outcome = service.ask(&message).await;
            let _ = events.send(AppEvent::ReplyReady(id));
            outcome
        });
        self.reply_task = Some((id, task));
    }

    /// Reap the request task if it has already finished.
    pub async fn poll_reply(&mut self) {
        if self.reply_task.as_ref().is_some_and(|(_, task)| task.is_finished()) {
            self.finish_reply().await;
        }
    }

    /// Handle the wake-up sent by request `id` as it completes.
    ///
    /// A wake-up from a request that was already reaped by a tick is
    /// ignored, so the run loop never waits on a newer request.
    pub async fn reply_ready(&mut self, id: u64) {
        if self.reply_task.as_ref().is_some_and(|(current, _)| *current == id) {
            self.finish_reply().await;
        }
    }

    /// Wait for the request task and settle the conversation with its outcome.
    pub async fn finish_reply(&mut self) {
        let Some((_, task)) = self.reply_task.take() else {
            return;
        };

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "chat request task did not complete");
                Err(ChatError::Task(e.to_string()))
            }
        };

        self.conversation.settle(outcome);
        self.scroll_to_bottom();
    }

    /// Probe the backend in the background; the result arrives as [`AppEvent::Health`].
    pub fn check_health(&self) {
        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        tokio::spawn(async move {
            let online = match service.health().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "backend health check failed");
                    false
                }
            };
            let _ = events.send(AppEvent::Health(online));
        });
    }

    pub fn set_health(&mut self, online: bool) {
        self.backend_status = if online {
            BackendStatus::Online
        } else {
            BackendStatus::Offline
        };
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        } else {
            self.animation_frame = 0;
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if self.conversation.is_pending() {
            return;
        }
        self.cursor = self.conversation.insert_char(self.cursor, c);
    }

    pub fn backspace(&mut self) {
        if self.conversation.is_pending() {
            return;
        }
        self.cursor = self.conversation.delete_before(self.cursor);
    }

    pub fn delete(&mut self) {
        if self.conversation.is_pending() {
            return;
        }
        self.conversation.delete_at(self.cursor);
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.conversation.draft().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.conversation.draft().chars().count();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.min(self.max_scroll()).saturating_sub(lines);
        self.follow_tail = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_tail = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_tail = self.max_scroll() == 0;
    }

    /// Scroll chat to bottom so the latest entry (or "Thinking...") is visible.
    /// Stays pinned there on later renders until the user scrolls up.
    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
        self.chat_scroll = self.max_scroll();
    }

    /// Record the wrapped size of the log; called by the renderer.
    pub fn set_chat_layout(&mut self, visible_height: u16, total_lines: u16) {
        self.chat_height = visible_height;
        self.chat_lines = total_lines;
        if self.follow_tail {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }

    fn max_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }
}
