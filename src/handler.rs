use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_reply().await;
        }
        AppEvent::ReplyReady(id) => app.reply_ready(id).await,
        AppEvent::Health(online) => app.set_health(online),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let half_page = (app.chat_height / 2).max(1);

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(half_page);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(half_page);
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(half_page),
        KeyCode::PageUp => app.scroll_up(half_page),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        // Shift/Alt+Enter asks for a literal newline; plain Enter sends
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.insert_char('\n');
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up((app.chat_height / 2).max(1)),
        KeyCode::PageDown => app.scroll_down((app.chat_height / 2).max(1)),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.insert_char(c);
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let on_send = app.send_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown if in_chat => app.scroll_down(3),
        MouseEventKind::ScrollUp if in_chat => app.scroll_up(3),
        MouseEventKind::Down(MouseButton::Left) if on_send => app.submit(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::app_with;
    use crate::backend::MockAnswerService;
    use crate::backend::AnswerService;
    use crate::conversation::ChatRole;
    use crate::error::ChatResult;
    use async_trait::async_trait;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c), KeyModifiers::NONE)).await;
        }
    }

    fn idle_service() -> MockAnswerService {
        let mut service = MockAnswerService::new();
        service.expect_ask().never();
        service
    }

    #[tokio::test]
    async fn enter_submits_once_and_reply_settles() {
        let mut service = MockAnswerService::new();
        service
            .expect_ask()
            .withf(|message| message == "weather in Pune")
            .times(1)
            .returning(|_| Ok(Some("Sunny, 24°C".to_string())));
        let (mut app, mut events) = app_with(service);

        type_text(&mut app, "weather in Pune").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await;
        assert!(app.conversation.is_pending());
        assert_eq!(app.conversation.draft(), "");

        let ready = events.recv().await.unwrap();
        handle_event(&mut app, ready).await;

        let history = app.conversation.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, ChatRole::Assistant);
        assert_eq!(history[1].content, "Sunny, 24°C");
        assert!(!app.conversation.is_pending());
    }

    #[tokio::test]
    async fn shift_enter_inserts_newline_without_sending() {
        let (mut app, _events) = app_with(idle_service());

        type_text(&mut app, "line one").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::SHIFT)).await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::ALT)).await;
        type_text(&mut app, "two").await;

        assert_eq!(app.conversation.draft(), "line one\n\ntwo");
        assert!(app.conversation.history().is_empty());
        assert!(!app.conversation.is_pending());
    }

    #[tokio::test]
    async fn enter_on_blank_draft_does_nothing() {
        let (mut app, _events) = app_with(idle_service());

        type_text(&mut app, "   ").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await;

        assert!(app.conversation.history().is_empty());
        assert_eq!(app.conversation.draft(), "   ");
    }

    #[tokio::test]
    async fn cursor_editing_keys() {
        let (mut app, _events) = app_with(idle_service());

        type_text(&mut app, "Pne").await;
        handle_event(&mut app, key(KeyCode::Left, KeyModifiers::NONE)).await;
        handle_event(&mut app, key(KeyCode::Left, KeyModifiers::NONE)).await;
        type_text(&mut app, "u").await;
        handle_event(&mut app, key(KeyCode::End, KeyModifiers::NONE)).await;
        handle_event(&mut app, key(KeyCode::Backspace, KeyModifiers::NONE)).await;
        handle_event(&mut app, key(KeyCode::Home, KeyModifiers::NONE)).await;
        handle_event(&mut app, key(KeyCode::Delete, KeyModifiers::NONE)).await;

        assert_eq!(app.conversation.draft(), "un");
        assert_eq!(app.cursor, 0);
    }

    #[tokio::test]
    async fn mode_switching_and_quit() {
        let (mut app, _events) = app_with(idle_service());

        handle_event(&mut app, key(KeyCode::Esc, KeyModifiers::NONE)).await;
        assert_eq!(app.input_mode, InputMode::Normal);

        // 'q' types in editing mode but quits in normal mode
        handle_event(&mut app, key(KeyCode::Char('i'), KeyModifiers::NONE)).await;
        assert_eq!(app.input_mode, InputMode::Editing);
        type_text(&mut app, "q").await;
        assert!(!app.should_quit);
        assert_eq!(app.conversation.draft(), "q");

        handle_event(&mut app, key(KeyCode::Esc, KeyModifiers::NONE)).await;
        handle_event(&mut app, key(KeyCode::Char('q'), KeyModifiers::NONE)).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn ctrl_c_quits_while_editing() {
        let (mut app, _events) = app_with(idle_service());

        handle_event(&mut app, key(KeyCode::Char('c'), KeyModifiers::CONTROL)).await;

        assert!(app.should_quit);
        assert_eq!(app.conversation.draft(), "");
    }

    #[tokio::test]
    async fn clicking_send_submits() {
        let mut service = MockAnswerService::new();
        service.expect_ask().times(1).returning(|_| Ok(None));
        let (mut app, _events) = app_with(service);
        app.send_area = Some(Rect::new(70, 20, 10, 3));
        type_text(&mut app, "hi").await;

        let click = |column, row| {
            AppEvent::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                modifiers: KeyModifiers::NONE,
            })
        };
        handle_event(&mut app, click(5, 5)).await;
        assert!(app.conversation.history().is_empty());

        handle_event(&mut app, click(72, 21)).await;
        assert_eq!(app.conversation.history().len(), 1);
        assert!(app.conversation.is_pending());

        app.finish_reply().await;
        assert!(!app.conversation.is_pending());
    }

    /// Answers the first message and never answers any later one.
    struct StallsAfterFirst {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnswerService for StallsAfterFirst {
        async fn ask(&self, _message: &str) -> ChatResult<Option<String>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Some("first answer".to_string()))
            } else {
                std::future::pending().await
            }
        }

        async fn health(&self) -> ChatResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn stale_reply_wakeup_does_not_wait_on_newer_request() {
        let (mut app, mut events) = app_with(StallsAfterFirst {
            calls: AtomicUsize::new(0),
        });

        type_text(&mut app, "one").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await;
        let stale = events.recv().await.unwrap();
        assert!(matches!(stale, AppEvent::ReplyReady(_)));

        // The tick reaps the finished first request before its wake-up is handled
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle_event(&mut app, AppEvent::Tick).await;
        assert_eq!(app.conversation.history().len(), 2);
        assert!(!app.conversation.is_pending());

        type_text(&mut app, "two").await;
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)).await;
        assert!(app.conversation.is_pending());

        let handled = tokio::time::timeout(Duration::from_secs(2), handle_event(&mut app, stale)).await;
        assert!(handled.is_ok(), "run loop waited on the in-flight request");
        assert!(app.conversation.is_pending());
        assert_eq!(app.conversation.history().len(), 3);

        // Input still flows while the second request hangs
        handle_event(&mut app, key(KeyCode::Char('c'), KeyModifiers::CONTROL)).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn health_event_updates_status() {
        let (mut app, _events) = app_with(idle_service());

        handle_event(&mut app, AppEvent::Health(true)).await;

        assert_eq!(app.backend_status, crate::app::BackendStatus::Online);
    }
}
