use crate::auth::{valid_email, AuthClient, Session};
use crate::calendar::{self, Cell};
use crate::diary_state::DiaryState;
use crate::item_board::ItemBoard;
use chrono::{DateTime, Datelike, Local};
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{stdout, Stdout};
use std::time::Duration;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TICK: Duration = Duration::from_millis(50);

pub enum AuthOutcome {
    SignedIn(Session),
    Quit,
}

pub enum AppOutcome {
    SignOut,
    Quit,
}

#[derive(Clone, Copy, PartialEq)]
enum AuthField {
    Email,
    Password,
}

#[derive(Clone, Copy, PartialEq)]
enum SignUpField {
    Email,
    Password,
    Confirm,
}

#[derive(Clone, Copy, PartialEq)]
enum Tab {
    Items,
    Diary,
}

#[derive(Clone, Copy, PartialEq)]
enum BoardPane {
    Items,
    Comments,
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI { terminal })
    }

    pub async fn auth_screen(&mut self, auth: &AuthClient) -> Result<AuthOutcome> {
        let mut email = String::new();
        let mut password = String::new();
        let mut focus = AuthField::Email;
        let mut error: Option<String> = None;
        let mut notice: Option<String> = None;

        loop {
            self.draw_auth(&email, &password, focus, error.as_deref(), notice.as_deref(), None)?;

            if !event::poll(TICK)? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };

            if key.modifiers.contains(KeyModifiers::CONTROL) {
                match key.code {
                    KeyCode::Char('n') => {
                        if let Some(message) = self.sign_up_screen(auth).await? {
                            error = None;
                            notice = Some(message);
                        }
                    }
                    KeyCode::Char('r') => {
                        error = None;
                        notice = None;
                        if email.is_empty() {
                            error = Some("enter your email first".to_string());
                        } else if !valid_email(&email) {
                            error = Some("enter a valid email address".to_string());
                        } else {
                            self.draw_auth(
                                &email,
                                &password,
                                focus,
                                None,
                                None,
                                Some("Sending reset email..."),
                            )?;
                            match auth.send_password_reset(&email).await {
                                Ok(()) => notice = Some("password reset email sent".to_string()),
                                Err(e) => error = Some(e.to_string()),
                            }
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match key.code {
                KeyCode::Esc => return Ok(AuthOutcome::Quit),
                KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                    focus = match focus {
                        AuthField::Email => AuthField::Password,
                        AuthField::Password => AuthField::Email,
                    };
                }
                KeyCode::Backspace => {
                    match focus {
                        AuthField::Email => email.pop(),
                        AuthField::Password => password.pop(),
                    };
                }
                KeyCode::Enter => {
                    error = None;
                    notice = None;
                    if email.is_empty() || password.is_empty() {
                        error = Some("enter email and password".to_string());
                    } else if !valid_email(&email) {
                        error = Some("enter a valid email address".to_string());
                    } else {
                        self.draw_auth(&email, &password, focus, None, None, Some("Signing in..."))?;
                        match auth.sign_in(&email, &password).await {
                            Ok(session) => return Ok(AuthOutcome::SignedIn(session)),
                            Err(e) => error = Some(e.to_string()),
                        }
                    }
                }
                KeyCode::Char(c) => match focus {
                    AuthField::Email => email.push(c),
                    AuthField::Password => password.push(c),
                },
                _ => {}
            }
        }
    }

    fn draw_auth(
        &mut self,
        email: &str,
        password: &str,
        focus: AuthField,
        error: Option<&str>,
        notice: Option<&str>,
        busy: Option<&str>,
    ) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            let title = Paragraph::new("Sign In")
                .style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(Alignment::Center);
            f.render_widget(title, chunks[0]);

            let status = status_line(error, notice, busy);
            f.render_widget(status.alignment(Alignment::Center), chunks[1]);

            let email_input = Paragraph::new(email.to_string())
                .block(field_block("Email", focus == AuthField::Email));
            f.render_widget(email_input, chunks[2]);

            let password_input = Paragraph::new(masked(password))
                .block(field_block("Password", focus == AuthField::Password));
            f.render_widget(password_input, chunks[3]);

            let controls = Line::from(vec![
                Span::raw("Press "),
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to sign in, "),
                Span::styled("Ctrl+n", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to create an account, "),
                Span::styled("Ctrl+r", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to reset password, "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to quit"),
            ]);
            let controls_paragraph = Paragraph::new(controls)
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center);
            f.render_widget(controls_paragraph, chunks[6]);
        })?;

        Ok(())
    }

    async fn sign_up_screen(&mut self, auth: &AuthClient) -> Result<Option<String>> {
        let mut email = String::new();
        let mut password = String::new();
        let mut confirm = String::new();
        let mut agreed = false;
        let mut focus = SignUpField::Email;
        let mut error: Option<String> = None;

        loop {
            self.draw_sign_up(&email, &password, &confirm, agreed, focus, error.as_deref(), None)?;

            if !event::poll(TICK)? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };

            if key.modifiers.contains(KeyModifiers::CONTROL) {
                if key.code == KeyCode::Char('t') {
                    agreed = !agreed;
                }
                continue;
            }

            match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Tab | KeyCode::Down => {
                    focus = match focus {
                        SignUpField::Email => SignUpField::Password,
                        SignUpField::Password => SignUpField::Confirm,
                        SignUpField::Confirm => SignUpField::Email,
                    };
                }
                KeyCode::Up | KeyCode::BackTab => {
                    focus = match focus {
                        SignUpField::Email => SignUpField::Confirm,
                        SignUpField::Password => SignUpField::Email,
                        SignUpField::Confirm => SignUpField::Password,
                    };
                }
                KeyCode::Backspace => {
                    match focus {
                        SignUpField::Email => email.pop(),
                        SignUpField::Password => password.pop(),
                        SignUpField::Confirm => confirm.pop(),
                    };
                }
                KeyCode::Enter => {
                    error = None;
                    if email.is_empty() || password.is_empty() {
                        error = Some("enter email and password".to_string());
                    } else if !valid_email(&email) {
                        error = Some("enter a valid email address".to_string());
                    } else if password.chars().count() < 6 {
                        error = Some("password must be at least 6 characters".to_string());
                    } else if password != confirm {
                        error = Some("passwords do not match".to_string());
                    } else if !agreed {
                        error = Some("you must agree to the terms".to_string());
                    } else {
                        self.draw_sign_up(
                            &email,
                            &password,
                            &confirm,
                            agreed,
                            focus,
                            None,
                            Some("Creating account..."),
                        )?;
                        match auth.sign_up(&email, &password).await {
                            Ok(_) => {
                                self.draw_welcome_overlay()?;
                                tokio::time::sleep(Duration::from_millis(900)).await;
                                return Ok(Some("account created, sign in".to_string()));
                            }
                            Err(e) => error = Some(e.to_string()),
                        }
                    }
                }
                KeyCode::Char(c) => match focus {
                    SignUpField::Email => email.push(c),
                    SignUpField::Password => password.push(c),
                    SignUpField::Confirm => confirm.push(c),
                },
                _ => {}
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_sign_up(
        &mut self,
        email: &str,
        password: &str,
        confirm: &str,
        agreed: bool,
        focus: SignUpField,
        error: Option<&str>,
        busy: Option<&str>,
    ) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            let title = Paragraph::new("Create Account")
                .style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(Alignment::Center);
            f.render_widget(title, chunks[0]);

            let status = status_line(error, None, busy);
            f.render_widget(status.alignment(Alignment::Center), chunks[1]);

            let email_input = Paragraph::new(email.to_string())
                .block(field_block("Email", focus == SignUpField::Email));
            f.render_widget(email_input, chunks[2]);

            let password_input = Paragraph::new(masked(password))
                .block(field_block("Password", focus == SignUpField::Password));
            f.render_widget(password_input, chunks[3]);

            let confirm_input = Paragraph::new(masked(confirm))
                .block(field_block("Confirm password", focus == SignUpField::Confirm));
            f.render_widget(confirm_input, chunks[4]);

            let terms = Line::from(vec![
                Span::raw(if agreed { "[x] " } else { "[ ] " }),
                Span::raw("I agree to the terms of service and privacy policy"),
            ]);
            f.render_widget(Paragraph::new(terms), chunks[5]);

            let controls = Line::from(vec![
                Span::raw("Press "),
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to sign up, "),
                Span::styled("Ctrl+t", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to toggle terms, "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" to go back"),
            ]);
            let controls_paragraph = Paragraph::new(controls)
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center);
            f.render_widget(controls_paragraph, chunks[7]);
        })?;

        Ok(())
    }

    fn draw_welcome_overlay(&mut self) -> Result<()> {
        self.terminal.draw(|f| {
            let area = centered_rect(40, 30, f.area());
            f.render_widget(Clear, area);
            let message = Paragraph::new("Welcome!")
                .style(
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(message, area);
        })?;
        Ok(())
    }

    pub fn main_screen(
        &mut self,
        diary: &mut DiaryState,
        board: &mut ItemBoard,
    ) -> Result<AppOutcome> {
        let today = calendar::today_key();
        let mut tab = Tab::Items;
        let mut diary_view = DiaryView::new(&today);
        let mut items_view = ItemsView::new();

        loop {
            self.terminal.draw(|f| {
                render_main(f, tab, &diary_view, &items_view, diary, board, &today);
            })?;

            if !event::poll(TICK)? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };

            let captured = match tab {
                Tab::Diary => diary_view.capturing(),
                Tab::Items => items_view.capturing(),
            };
            if !captured {
                match key.code {
                    KeyCode::Tab => {
                        tab = match tab {
                            Tab::Items => Tab::Diary,
                            Tab::Diary => Tab::Items,
                        };
                        continue;
                    }
                    KeyCode::Char('q') => return Ok(AppOutcome::SignOut),
                    KeyCode::Esc => return Ok(AppOutcome::Quit),
                    _ => {}
                }
            }

            match tab {
                Tab::Diary => diary_view.handle_key(key, diary),
                Tab::Items => items_view.handle_key(key, board),
            }
        }
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

struct EditDraft {
    date_key: String,
    id: String,
    text: String,
}

/// Ephemeral diary-screen state: displayed month, keyboard cursor,
/// selected day, composer buffer and the edit-modal draft. None of this
/// survives a restart.
struct DiaryView {
    year: i32,
    month: u32,
    cursor_day: u32,
    selected: Option<String>,
    input: String,
    input_active: bool,
    entry_cursor: usize,
    editing: Option<EditDraft>,
}

impl DiaryView {
    fn new(today: &str) -> Self {
        let date = calendar::parse_key(today).unwrap_or_else(|| Local::now().date_naive());
        DiaryView {
            year: date.year(),
            month: date.month(),
            cursor_day: date.day(),
            selected: Some(today.to_string()),
            input: String::new(),
            input_active: false,
            entry_cursor: 0,
            editing: None,
        }
    }

    fn capturing(&self) -> bool {
        self.editing.is_some() || self.input_active
    }

    fn cursor_key(&self) -> String {
        calendar::make_key(self.year, self.month, self.cursor_day)
    }

    /// The composer and the edit modal are independent flows; the modal
    /// takes the keyboard while open, composing takes it otherwise.
    fn handle_key(&mut self, key: KeyEvent, diary: &mut DiaryState) {
        if let Some(draft) = &mut self.editing {
            match key.code {
                KeyCode::Esc => self.editing = None,
                KeyCode::Enter => {
                    if diary.edit_entry(&draft.date_key, &draft.id, &draft.text) {
                        self.editing = None;
                    }
                }
                KeyCode::Backspace => {
                    draft.text.pop();
                }
                KeyCode::Char(c) => draft.text.push(c),
                _ => {}
            }
            return;
        }

        if self.input_active {
            match key.code {
                KeyCode::Esc => self.input_active = false,
                KeyCode::Enter => {
                    if let Some(selected) = self.selected.clone() {
                        if diary.add_entry(&selected, &self.input) {
                            self.input.clear();
                            self.entry_cursor = 0;
                        }
                    }
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Left => self.cursor_day = self.cursor_day.saturating_sub(1).max(1),
            KeyCode::Right => {
                self.cursor_day = (self.cursor_day + 1).min(calendar::days_in_month(self.year, self.month));
            }
            KeyCode::Up => self.cursor_day = self.cursor_day.saturating_sub(7).max(1),
            KeyCode::Down => {
                self.cursor_day =
                    (self.cursor_day + 7).min(calendar::days_in_month(self.year, self.month));
            }
            KeyCode::Char('[') => {
                let (year, month) = calendar::prev_month(self.year, self.month);
                self.set_month(year, month);
            }
            KeyCode::Char(']') => {
                let (year, month) = calendar::next_month(self.year, self.month);
                self.set_month(year, month);
            }
            KeyCode::Char('t') => {
                let today = Local::now().date_naive();
                self.year = today.year();
                self.month = today.month();
                self.cursor_day = today.day();
                self.select(Some(calendar::date_key(today)));
            }
            KeyCode::Enter => {
                let key = self.cursor_key();
                if self.selected.as_deref() == Some(key.as_str()) {
                    self.select(None);
                } else {
                    self.select(Some(key));
                }
            }
            KeyCode::Char('i') => {
                if self.selected.is_some() {
                    self.input_active = true;
                }
            }
            KeyCode::Char('j') => {
                if let Some(selected) = &self.selected {
                    let len = diary.entries_for(selected).len();
                    if self.entry_cursor + 1 < len {
                        self.entry_cursor += 1;
                    }
                }
            }
            KeyCode::Char('k') => self.entry_cursor = self.entry_cursor.saturating_sub(1),
            KeyCode::Char('e') => {
                if let Some(selected) = self.selected.clone() {
                    if let Some(entry) = diary.entries_for(&selected).get(self.entry_cursor) {
                        self.editing = Some(EditDraft {
                            date_key: selected,
                            id: entry.id.clone(),
                            text: entry.text.clone(),
                        });
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(selected) = self.selected.clone() {
                    if let Some(entry) = diary.entries_for(&selected).get(self.entry_cursor) {
                        let id = entry.id.clone();
                        diary.remove_entry(&selected, &id);
                        let len = diary.entries_for(&selected).len();
                        if len == 0 {
                            self.entry_cursor = 0;
                        } else if self.entry_cursor >= len {
                            self.entry_cursor = len - 1;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn set_month(&mut self, year: i32, month: u32) {
        self.year = year;
        self.month = month;
        self.cursor_day = self.cursor_day.min(calendar::days_in_month(year, month)).max(1);
    }

    /// Changing the selected day resets the composer and the list cursor.
    fn select(&mut self, selected: Option<String>) {
        self.selected = selected;
        self.input.clear();
        self.input_active = false;
        self.entry_cursor = 0;
    }
}

/// Ephemeral item-board state: pane focus, cursors, the shared input
/// buffers and which item/comment an edit is rewriting.
struct ItemsView {
    focus: BoardPane,
    item_cursor: usize,
    comment_cursor: usize,
    selected: Option<String>,
    input: String,
    input_active: bool,
    editing_item: Option<String>,
    comment_input: String,
    comment_input_active: bool,
    editing_comment: Option<String>,
}

impl ItemsView {
    fn new() -> Self {
        ItemsView {
            focus: BoardPane::Items,
            item_cursor: 0,
            comment_cursor: 0,
            selected: None,
            input: String::new(),
            input_active: false,
            editing_item: None,
            comment_input: String::new(),
            comment_input_active: false,
            editing_comment: None,
        }
    }

    fn capturing(&self) -> bool {
        self.input_active || self.comment_input_active
    }

    fn handle_key(&mut self, key: KeyEvent, board: &mut ItemBoard) {
        if self.input_active {
            match key.code {
                KeyCode::Esc => {
                    self.input_active = false;
                    self.editing_item = None;
                    self.input.clear();
                }
                KeyCode::Enter => {
                    if let Some(id) = self.editing_item.clone() {
                        if board.rename_item(&id, &self.input) {
                            self.input.clear();
                            self.editing_item = None;
                            self.input_active = false;
                        }
                    } else if board.add_item(&self.input) {
                        self.input.clear();
                        self.item_cursor = 0;
                    }
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            }
            return;
        }

        if self.comment_input_active {
            match key.code {
                KeyCode::Esc => {
                    self.comment_input_active = false;
                    self.editing_comment = None;
                    self.comment_input.clear();
                }
                KeyCode::Enter => {
                    if let Some(id) = self.editing_comment.clone() {
                        if board.edit_comment(&id, &self.comment_input) {
                            self.comment_input.clear();
                            self.editing_comment = None;
                            self.comment_input_active = false;
                        }
                    } else if let Some(item_id) = self.selected.clone() {
                        if board.add_comment(&item_id, &self.comment_input) {
                            self.comment_input.clear();
                            self.comment_cursor = 0;
                        }
                    }
                }
                KeyCode::Backspace => {
                    self.comment_input.pop();
                }
                KeyCode::Char(c) => self.comment_input.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.focus = BoardPane::Items,
            KeyCode::Right | KeyCode::Char('l') => {
                if self.selected.is_some() {
                    self.focus = BoardPane::Comments;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(board, 1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(board, -1),
            KeyCode::Enter => {
                if self.focus == BoardPane::Items {
                    let target = board.items().get(self.item_cursor).map(|i| i.id.clone());
                    if let Some(id) = target {
                        if self.selected.as_deref() == Some(id.as_str()) {
                            self.selected = None;
                            self.focus = BoardPane::Items;
                        } else {
                            self.selected = Some(id);
                        }
                        self.comment_cursor = 0;
                    }
                }
            }
            KeyCode::Char('i') => match self.focus {
                BoardPane::Items => {
                    self.editing_item = None;
                    self.input.clear();
                    self.input_active = true;
                }
                BoardPane::Comments => {
                    if self.selected.is_some() {
                        self.editing_comment = None;
                        self.comment_input.clear();
                        self.comment_input_active = true;
                    }
                }
            },
            KeyCode::Char('e') => match self.focus {
                BoardPane::Items => {
                    let target = board
                        .items()
                        .get(self.item_cursor)
                        .map(|i| (i.id.clone(), i.title.clone()));
                    if let Some((id, title)) = target {
                        self.input = title;
                        self.editing_item = Some(id);
                        self.input_active = true;
                    }
                }
                BoardPane::Comments => {
                    if let Some(selected) = &self.selected {
                        let target = board
                            .comments_for(selected)
                            .get(self.comment_cursor)
                            .map(|c| (c.id.clone(), c.text.clone()));
                        if let Some((id, text)) = target {
                            self.comment_input = text;
                            self.editing_comment = Some(id);
                            self.comment_input_active = true;
                        }
                    }
                }
            },
            KeyCode::Char('d') => match self.focus {
                BoardPane::Items => {
                    let target = board.items().get(self.item_cursor).map(|i| i.id.clone());
                    if let Some(id) = target {
                        board.remove_item(&id);
                        if self.selected.as_deref() == Some(id.as_str()) {
                            self.selected = None;
                            self.focus = BoardPane::Items;
                        }
                        let len = board.items().len();
                        if len == 0 {
                            self.item_cursor = 0;
                        } else if self.item_cursor >= len {
                            self.item_cursor = len - 1;
                        }
                    }
                }
                BoardPane::Comments => {
                    if let Some(selected) = &self.selected {
                        let target = board
                            .comments_for(selected)
                            .get(self.comment_cursor)
                            .map(|c| c.id.clone());
                        if let Some(id) = target {
                            board.remove_comment(&id);
                            let len = board.comments_for(selected).len();
                            if len == 0 {
                                self.comment_cursor = 0;
                            } else if self.comment_cursor >= len {
                                self.comment_cursor = len - 1;
                            }
                        }
                    }
                }
            },
            _ => {}
        }
    }

    fn move_cursor(&mut self, board: &ItemBoard, delta: i32) {
        match self.focus {
            BoardPane::Items => {
                let len = board.items().len();
                self.item_cursor = step_cursor(self.item_cursor, len, delta);
            }
            BoardPane::Comments => {
                if let Some(selected) = &self.selected {
                    let len = board.comments_for(selected).len();
                    self.comment_cursor = step_cursor(self.comment_cursor, len, delta);
                }
            }
        }
    }
}

fn step_cursor(cursor: usize, len: usize, delta: i32) -> usize {
    if len == 0 {
        return 0;
    }
    if delta < 0 {
        cursor.saturating_sub(1)
    } else {
        (cursor + 1).min(len - 1)
    }
}

fn render_main(
    f: &mut Frame,
    tab: Tab,
    diary_view: &DiaryView,
    items_view: &ItemsView,
    diary: &DiaryState,
    board: &ItemBoard,
    today: &str,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    let tab_style = |active| {
        if active {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    let tabs = Line::from(vec![
        Span::styled(" Items ", tab_style(tab == Tab::Items)),
        Span::raw("|"),
        Span::styled(" Diary ", tab_style(tab == Tab::Diary)),
    ]);
    f.render_widget(Paragraph::new(tabs).alignment(Alignment::Center), chunks[0]);

    match tab {
        Tab::Items => render_items(f, chunks[1], items_view, board),
        Tab::Diary => render_diary(f, chunks[1], diary_view, diary, today),
    }

    let footer = match tab {
        Tab::Items => {
            if items_view.capturing() {
                "Enter: save, Esc: cancel"
            } else {
                "j/k: move, Enter: select, i: new, e: edit, d: delete, h/l: pane, Tab: diary, q: sign out, Esc: quit"
            }
        }
        Tab::Diary => {
            if diary_view.editing.is_some() {
                "Enter: save, Esc: cancel"
            } else if diary_view.input_active {
                "Enter: add entry, Esc: done"
            } else {
                "arrows: move day, [/]: month, t: today, Enter: select, i: write, j/k e d: entries, Tab: items, q: sign out, Esc: quit"
            }
        }
    };
    f.render_widget(
        Paragraph::new(footer)
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center),
        chunks[2],
    );

    if tab == Tab::Diary {
        if let Some(draft) = &diary_view.editing {
            render_edit_modal(f, draft);
        }
    }
}

fn render_diary(f: &mut Frame, area: Rect, view: &DiaryView, diary: &DiaryState, today: &str) {
    let grid = calendar::month_grid(view.year, view.month);
    let grid_rows = grid.len().div_ceil(7) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(grid_rows),
                Constraint::Length(3),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let header = Line::from(vec![
        Span::styled(
            format!("{} {}", calendar::month_name(view.month), view.year),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(header).alignment(Alignment::Center), chunks[0]);

    let weekday_header = Line::from(
        calendar::WEEKDAY_LABELS
            .iter()
            .flat_map(|label| {
                vec![
                    Span::styled(
                        format!(" {label:>2}"),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                ]
            })
            .collect::<Vec<_>>(),
    );
    f.render_widget(
        Paragraph::new(weekday_header).alignment(Alignment::Center),
        chunks[1],
    );

    let mut lines = Vec::with_capacity(grid_rows as usize);
    for week in grid.chunks(7) {
        let mut spans = Vec::with_capacity(14);
        for cell in week {
            match cell {
                Cell::Empty => {
                    spans.push(Span::raw("   "));
                    spans.push(Span::raw("  "));
                }
                Cell::Day { day, key } => {
                    let mut style = Style::default();
                    if calendar::is_weekend(view.year, view.month, *day) {
                        style = style.fg(Color::Red);
                    }
                    if key == today {
                        style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
                    }
                    if view.selected.as_deref() == Some(key.as_str()) {
                        style = Style::default()
                            .bg(Color::Blue)
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD);
                    }
                    if *day == view.cursor_day {
                        style = style.add_modifier(Modifier::UNDERLINED);
                    }
                    spans.push(Span::styled(format!("{day:>3}"), style));
                    spans.push(Span::styled(
                        if diary.has_entries(key) { "• " } else { "  " },
                        Style::default().fg(Color::Yellow),
                    ));
                }
            }
        }
        lines.push(Line::from(spans));
    }
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), chunks[2]);

    match &view.selected {
        Some(selected) => {
            let composer = Paragraph::new(view.input.clone())
                .block(field_block("New entry", view.input_active));
            f.render_widget(composer, chunks[3]);

            let entries = diary.entries_for(selected);
            if entries.is_empty() {
                let empty = Paragraph::new("no entries")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().borders(Borders::ALL).title(selected.clone()));
                f.render_widget(empty, chunks[4]);
            } else {
                let width = chunks[4].width.saturating_sub(12) as usize;
                let items: Vec<ListItem> = entries
                    .iter()
                    .map(|entry| {
                        ListItem::new(Line::from(vec![
                            Span::styled(
                                format!("[{}] ", clock_time(entry.created_at)),
                                Style::default().fg(Color::DarkGray),
                            ),
                            Span::raw(truncate_to_width(
                                entry.text.lines().next().unwrap_or(""),
                                width,
                            )),
                        ]))
                    })
                    .collect();
                let list = List::new(items)
                    .block(Block::default().borders(Borders::ALL).title(selected.clone()))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    chunks[4],
                    &mut ListState::default().with_selected(Some(view.entry_cursor)),
                );
            }
        }
        None => {
            let hint = Paragraph::new("Select a day with Enter to read or write entries")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            f.render_widget(hint, chunks[3]);
        }
    }
}

fn render_edit_modal(f: &mut Frame, draft: &EditDraft) {
    let area = centered_rect(60, 40, f.area());
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)].as_ref())
        .split(area);

    let editor = Paragraph::new(draft.text.clone())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title("Edit entry"),
        );
    f.render_widget(editor, chunks[0]);

    let hint = Paragraph::new("Enter: save, Esc: cancel")
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(hint, chunks[1]);
}

fn render_items(f: &mut Frame, area: Rect, view: &ItemsView, board: &ItemBoard) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(panes[0]);

    let input_title = if view.editing_item.is_some() {
        "Rename item"
    } else {
        "New item"
    };
    let item_input =
        Paragraph::new(view.input.clone()).block(field_block(input_title, view.input_active));
    f.render_widget(item_input, left[0]);

    let items_focused = view.focus == BoardPane::Items;
    if board.items().is_empty() {
        let empty = Paragraph::new("no items yet, press i to add one")
            .style(Style::default().fg(Color::DarkGray))
            .block(pane_block("Items", items_focused));
        f.render_widget(empty, left[1]);
    } else {
        let width = left[1].width.saturating_sub(6) as usize;
        let items: Vec<ListItem> = board
            .items()
            .iter()
            .map(|item| {
                let marker = if view.selected.as_deref() == Some(item.id.as_str()) {
                    Span::styled("● ", Style::default().fg(Color::Green))
                } else {
                    Span::raw("  ")
                };
                let mut lines = vec![Line::from(vec![
                    marker,
                    Span::raw(truncate_to_width(&item.title, width)),
                ])];
                if let Some(description) = &item.description {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", truncate_to_width(description, width)),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();
        let list = List::new(items)
            .block(pane_block("Items", items_focused))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        f.render_stateful_widget(
            list,
            left[1],
            &mut ListState::default().with_selected(Some(view.item_cursor)),
        );
    }

    match &view.selected {
        Some(selected) => {
            let right = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
                .split(panes[1]);

            let comment_title = if view.editing_comment.is_some() {
                "Edit comment"
            } else {
                "New comment"
            };
            let comment_input = Paragraph::new(view.comment_input.clone())
                .block(field_block(comment_title, view.comment_input_active));
            f.render_widget(comment_input, right[0]);

            let comments_focused = view.focus == BoardPane::Comments;
            let comments = board.comments_for(selected);
            if comments.is_empty() {
                let empty = Paragraph::new("no comments")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(pane_block("Comments", comments_focused));
                f.render_widget(empty, right[1]);
            } else {
                let width = right[1].width.saturating_sub(6) as usize;
                let rows: Vec<ListItem> = comments
                    .iter()
                    .map(|comment| {
                        ListItem::new(vec![
                            Line::from(Span::raw(truncate_to_width(&comment.text, width))),
                            Line::from(Span::styled(
                                format!("  {}", date_time(comment.created_at)),
                                Style::default().fg(Color::DarkGray),
                            )),
                        ])
                    })
                    .collect();
                let list = List::new(rows)
                    .block(pane_block("Comments", comments_focused))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    right[1],
                    &mut ListState::default().with_selected(Some(view.comment_cursor)),
                );
            }
        }
        None => {
            let hint = Paragraph::new("Select an item to read or write comments")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(hint, panes[1]);
        }
    }
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    if focused {
        block.border_style(Style::default().fg(Color::Cyan))
    } else {
        block
    }
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    field_block(title, focused)
}

fn status_line(error: Option<&str>, notice: Option<&str>, busy: Option<&str>) -> Paragraph<'static> {
    if let Some(busy) = busy {
        Paragraph::new(busy.to_string()).style(Style::default().fg(Color::Yellow))
    } else if let Some(error) = error {
        Paragraph::new(error.to_string()).style(Style::default().fg(Color::Red))
    } else if let Some(notice) = notice {
        Paragraph::new(notice.to_string()).style(Style::default().fg(Color::Green))
    } else {
        Paragraph::new("")
    }
}

fn masked(password: &str) -> String {
    "*".repeat(password.chars().count())
}

fn clock_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}

fn date_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max.saturating_sub(1) {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn chars(view: &mut DiaryView, diary: &mut DiaryState, text: &str) {
        for c in text.chars() {
            view.handle_key(press(KeyCode::Char(c)), diary);
        }
    }

    #[test]
    fn composer_flow_adds_an_entry_and_returns_to_idle() {
        let mut diary = DiaryState::new();
        let mut view = DiaryView::new("2024-03-15");

        view.handle_key(press(KeyCode::Char('i')), &mut diary);
        assert!(view.capturing());
        chars(&mut view, &mut diary, "walked the dog");
        view.handle_key(press(KeyCode::Enter), &mut diary);

        assert_eq!(diary.entries_for("2024-03-15").len(), 1);
        assert!(view.input.is_empty());
        // composer stays open for the next entry until Esc
        assert!(view.capturing());
        view.handle_key(press(KeyCode::Esc), &mut diary);
        assert!(!view.capturing());
    }

    #[test]
    fn blank_composer_submit_is_a_no_op() {
        let mut diary = DiaryState::new();
        let mut view = DiaryView::new("2024-03-15");

        view.handle_key(press(KeyCode::Char('i')), &mut diary);
        chars(&mut view, &mut diary, "   ");
        view.handle_key(press(KeyCode::Enter), &mut diary);

        assert!(diary.entries_for("2024-03-15").is_empty());
        assert_eq!(view.input, "   ");
    }

    #[test]
    fn edit_modal_commits_draft_on_enter() {
        let mut diary = DiaryState::new();
        diary.add_entry("2024-03-15", "first draft");
        let mut view = DiaryView::new("2024-03-15");

        view.handle_key(press(KeyCode::Char('e')), &mut diary);
        assert!(view.editing.is_some());
        chars(&mut view, &mut diary, "!");
        view.handle_key(press(KeyCode::Enter), &mut diary);

        assert!(view.editing.is_none());
        assert_eq!(diary.entries_for("2024-03-15")[0].text, "first draft!");
    }

    #[test]
    fn edit_modal_cancel_discards_the_draft() {
        let mut diary = DiaryState::new();
        diary.add_entry("2024-03-15", "untouched");
        let mut view = DiaryView::new("2024-03-15");

        view.handle_key(press(KeyCode::Char('e')), &mut diary);
        chars(&mut view, &mut diary, " changed");
        view.handle_key(press(KeyCode::Esc), &mut diary);

        assert!(view.editing.is_none());
        assert_eq!(diary.entries_for("2024-03-15")[0].text, "untouched");
    }

    #[test]
    fn selecting_another_day_resets_the_composer() {
        let mut diary = DiaryState::new();
        let mut view = DiaryView::new("2024-03-15");

        view.handle_key(press(KeyCode::Char('i')), &mut diary);
        chars(&mut view, &mut diary, "half-typed");
        view.handle_key(press(KeyCode::Esc), &mut diary);

        view.handle_key(press(KeyCode::Right), &mut diary);
        view.handle_key(press(KeyCode::Enter), &mut diary);
        assert_eq!(view.selected.as_deref(), Some("2024-03-16"));
        assert!(view.input.is_empty());
    }

    #[test]
    fn enter_on_selected_day_deselects() {
        let mut diary = DiaryState::new();
        let mut view = DiaryView::new("2024-03-15");

        view.handle_key(press(KeyCode::Enter), &mut diary);
        assert!(view.selected.is_none());
        // composer cannot open without a selection
        view.handle_key(press(KeyCode::Char('i')), &mut diary);
        assert!(!view.capturing());
    }

    #[test]
    fn month_paging_clamps_the_cursor() {
        let mut diary = DiaryState::new();
        let mut view = DiaryView::new("2024-03-31");
        assert_eq!(view.cursor_day, 31);

        view.handle_key(press(KeyCode::Char('[')), &mut diary);
        assert_eq!((view.year, view.month), (2024, 2));
        assert_eq!(view.cursor_day, 29);

        view.handle_key(press(KeyCode::Char(']')), &mut diary);
        assert_eq!((view.year, view.month), (2024, 3));
    }

    #[test]
    fn delete_key_removes_the_entry_under_the_cursor() {
        let mut diary = DiaryState::new();
        diary.add_entry("2024-03-15", "only one");
        let mut view = DiaryView::new("2024-03-15");

        view.handle_key(press(KeyCode::Char('d')), &mut diary);
        assert!(diary.entries_for("2024-03-15").is_empty());
        assert!(!diary.has_entries("2024-03-15"));
    }

    #[test]
    fn board_flow_add_select_comment() {
        let mut board = ItemBoard::new();
        let mut view = ItemsView::new();

        view.handle_key(press(KeyCode::Char('i')), &mut board);
        for c in "groceries".chars() {
            view.handle_key(press(KeyCode::Char(c)), &mut board);
        }
        view.handle_key(press(KeyCode::Enter), &mut board);
        view.handle_key(press(KeyCode::Esc), &mut board);
        assert_eq!(board.items().len(), 1);

        view.handle_key(press(KeyCode::Enter), &mut board);
        assert!(view.selected.is_some());

        view.handle_key(press(KeyCode::Char('l')), &mut board);
        view.handle_key(press(KeyCode::Char('i')), &mut board);
        for c in "buy milk".chars() {
            view.handle_key(press(KeyCode::Char(c)), &mut board);
        }
        view.handle_key(press(KeyCode::Enter), &mut board);

        let id = board.items()[0].id.clone();
        assert_eq!(board.comments_for(&id).len(), 1);
        assert_eq!(board.comments_for(&id)[0].text, "buy milk");
    }

    #[test]
    fn deleting_the_selected_item_clears_the_selection() {
        let mut board = ItemBoard::new();
        board.add_item("doomed");
        let mut view = ItemsView::new();

        view.handle_key(press(KeyCode::Enter), &mut board);
        assert!(view.selected.is_some());
        view.handle_key(press(KeyCode::Char('d')), &mut board);
        assert!(board.items().is_empty());
        assert!(view.selected.is_none());
    }

    #[test]
    fn truncation_honors_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        let out = truncate_to_width("a very long line of text", 10);
        assert!(out.width() <= 10);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn centered_rect_stays_inside_the_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(60, 40, area);
        assert!(rect.x >= area.x && rect.right() <= area.right());
        assert!(rect.y >= area.y && rect.bottom() <= area.bottom());
    }
}
