use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::{io, time::Duration};
use textwrap::wrap;
use tui_input::{backend::crossterm::EventHandler, Input, InputRequest};

use saidus::models::{Contact, Message};
use saidus::session::Session;

// Export types needed by main module
pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

const INPUT_POLL: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Auth screen
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthField {
    Username,
    Email,
    Password,
}

/// What the auth form hands back to the event loop.
pub enum AuthEvent {
    Quit,
    Submit(AuthSubmission),
}

/// A single credentials submission; exactly one request is issued per
/// submission, with no retry.
pub struct AuthSubmission {
    pub mode: AuthMode,
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct AuthUI {
    mode: AuthMode,
    username: Input,
    email: Input,
    password: Input,
    focus: AuthField,
    in_flight: bool,
    notice: Option<String>,
}

impl AuthUI {
    pub fn new() -> Self {
        AuthUI {
            mode: AuthMode::Login,
            username: Input::default(),
            email: Input::default(),
            password: Input::default(),
            focus: AuthField::Username,
            in_flight: false,
            notice: None,
        }
    }

    /// Marks a request as outstanding; Enter is ignored until
    /// `finish_request` so at most one request is ever in flight.
    pub fn begin_request(&mut self) {
        self.in_flight = true;
        self.notice = None;
    }

    pub fn finish_request(&mut self) {
        self.in_flight = false;
    }

    pub fn show_error(&mut self, message: String) {
        self.notice = Some(message);
    }

    fn fields(&self) -> Vec<AuthField> {
        match self.mode {
            AuthMode::Login => vec![AuthField::Username, AuthField::Password],
            AuthMode::Register => vec![AuthField::Username, AuthField::Email, AuthField::Password],
        }
    }

    fn focus_next(&mut self, backwards: bool) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if backwards {
            (pos + fields.len() - 1) % fields.len()
        } else {
            (pos + 1) % fields.len()
        };
        self.focus = fields[next];
    }

    fn focused_input(&mut self) -> &mut Input {
        match self.focus {
            AuthField::Username => &mut self.username,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    fn submission(&mut self) -> Option<AuthEvent> {
        let complete = match self.mode {
            AuthMode::Login => !self.username.value().is_empty() && !self.password.value().is_empty(),
            AuthMode::Register => {
                !self.username.value().is_empty()
                    && !self.email.value().is_empty()
                    && !self.password.value().is_empty()
            }
        };
        if !complete {
            // Same wording the backend uses for missing fields.
            self.notice = Some("Все поля обязательны".to_string());
            return None;
        }
        Some(AuthEvent::Submit(AuthSubmission {
            mode: self.mode,
            username: self.username.value().to_string(),
            email: self.email.value().to_string(),
            password: self.password.value().to_string(),
        }))
    }

    pub fn handle_input(&mut self) -> Result<Option<AuthEvent>> {
        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.on_key(key));
                }
            }
        }
        Ok(None)
    }

    fn on_key(&mut self, key: KeyEvent) -> Option<AuthEvent> {
        match key.code {
            KeyCode::Esc => Some(AuthEvent::Quit),
            KeyCode::Enter => {
                // Submit stays disabled while a request is outstanding.
                if self.in_flight {
                    None
                } else {
                    self.submission()
                }
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus_next(false);
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_next(true);
                None
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.mode = match self.mode {
                    AuthMode::Login => AuthMode::Register,
                    AuthMode::Register => AuthMode::Login,
                };
                self.focus = AuthField::Username;
                self.notice = None;
                None
            }
            _ => {
                if !self.in_flight {
                    self.focused_input().handle_event(&Event::Key(key));
                }
                None
            }
        }
    }

    pub fn draw<B: Backend>(&self, frame: &mut Frame<B>) {
        let size = frame.size();

        let fields = self.fields();
        let card_height = (fields.len() as u16 * 3 + 4).min(size.height.saturating_sub(2));
        let card_width = 52.min(size.width.saturating_sub(2));
        let card = Rect::new(
            (size.width.saturating_sub(card_width)) / 2,
            (size.height.saturating_sub(card_height)) / 2,
            card_width,
            card_height,
        );

        let title = match self.mode {
            AuthMode::Login => "SAIDUS — Вход",
            AuthMode::Register => "SAIDUS — Регистрация",
        };
        let card_block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta));
        frame.render_widget(card_block, card);

        let inner = card.inner(&Margin { vertical: 1, horizontal: 2 });
        let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
        constraints.push(Constraint::Length(1)); // notice
        constraints.push(Constraint::Length(1)); // help line
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (i, field) in fields.iter().enumerate() {
            let (label, value, cursor) = match field {
                AuthField::Username => ("Имя пользователя", self.username.value().to_string(), self.username.cursor()),
                AuthField::Email => ("Email", self.email.value().to_string(), self.email.cursor()),
                AuthField::Password => (
                    "Пароль",
                    "•".repeat(self.password.value().chars().count()),
                    self.password.cursor(),
                ),
            };
            let focused = *field == self.focus;
            let block = Block::default()
                .title(label)
                .borders(Borders::ALL)
                .border_style(if focused {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                });
            frame.render_widget(Paragraph::new(value).block(block), chunks[i]);
            if focused && !self.in_flight {
                frame.set_cursor(chunks[i].x + cursor as u16 + 1, chunks[i].y + 1);
            }
        }

        let notice_row = chunks[fields.len()];
        if let Some(notice) = &self.notice {
            let widget = Paragraph::new(notice.as_str()).style(Style::default().fg(Color::Red));
            frame.render_widget(widget, notice_row);
        }

        let help = if self.in_flight {
            Line::from(Span::styled("Загрузка...", Style::default().fg(Color::Yellow)))
        } else {
            let toggle_hint = match self.mode {
                AuthMode::Login => "Ctrl+R регистрация",
                AuthMode::Register => "Ctrl+R вход",
            };
            Line::from(Span::styled(
                format!("Enter отправить | Tab поле | {} | ESC выход", toggle_hint),
                Style::default().fg(Color::Gray),
            ))
        };
        frame.render_widget(Paragraph::new(help), chunks[fields.len() + 1]);
    }
}

// ---------------------------------------------------------------------------
// Messenger screen
// ---------------------------------------------------------------------------

enum Tab {
    Messages,
    Contacts,
}

/// What the messenger screen hands back to the event loop.
pub enum ChatEvent {
    Quit,
    /// Switch the conversation to this contact id.
    Select(u32),
    /// Send the composer content; the session decides whether a
    /// blank buffer actually produces a message.
    Submit(String),
}

pub struct MessengerUI {
    input: Input,
    active_tab: Tab,
    notice: Option<(String, std::time::Instant)>,
}

impl MessengerUI {
    pub fn new() -> Self {
        MessengerUI {
            input: Input::default(),
            active_tab: Tab::Messages,
            notice: None,
        }
    }

    /// Shows a transient line in the status area (e.g. the welcome
    /// text right after login).
    pub fn show_notice(&mut self, text: String) {
        self.notice = Some((text, std::time::Instant::now()));
    }

    /// Drops the transient notice once it has been visible long enough.
    pub fn clean_notice(&mut self, timeout_secs: u64) {
        if let Some((_, shown_at)) = &self.notice {
            if shown_at.elapsed().as_secs() >= timeout_secs {
                self.notice = None;
            }
        }
    }

    pub fn clear_input(&mut self) {
        self.input = Input::default();
    }

    fn neighbour_contact(session: &Session, backwards: bool) -> Option<u32> {
        let contacts = session.directory().list();
        if contacts.is_empty() {
            return None;
        }
        let pos = contacts
            .iter()
            .position(|c| c.id == session.current().id)
            .unwrap_or(0);
        let next = if backwards {
            (pos + contacts.len() - 1) % contacts.len()
        } else {
            (pos + 1) % contacts.len()
        };
        Some(contacts[next].id)
    }

    pub fn handle_input(&mut self, session: &Session) -> Result<Option<ChatEvent>> {
        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.on_key(key, session));
                }
            }
        }
        Ok(None)
    }

    fn on_key(&mut self, key: KeyEvent, session: &Session) -> Option<ChatEvent> {
        match key.code {
            KeyCode::Esc => Some(ChatEvent::Quit),
            // The composer only reacts while it has focus; Enter in the
            // contacts panel is as inert as character input there.
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                // Shift+Enter is a soft newline, never a send.
                if let Tab::Messages = self.active_tab {
                    self.input.handle(InputRequest::InsertChar('\n'));
                }
                None
            }
            KeyCode::Enter => {
                if let Tab::Messages = self.active_tab {
                    Some(ChatEvent::Submit(self.input.value().to_string()))
                } else {
                    None
                }
            }
            KeyCode::Tab => {
                self.active_tab = match self.active_tab {
                    Tab::Messages => Tab::Contacts,
                    Tab::Contacts => Tab::Messages,
                };
                None
            }
            KeyCode::Up => {
                if let Tab::Contacts = self.active_tab {
                    Self::neighbour_contact(session, true).map(ChatEvent::Select)
                } else {
                    None
                }
            }
            KeyCode::Down => {
                if let Tab::Contacts = self.active_tab {
                    Self::neighbour_contact(session, false).map(ChatEvent::Select)
                } else {
                    None
                }
            }
            _ => {
                if let Tab::Messages = self.active_tab {
                    self.input.handle_event(&Event::Key(key));
                }
                None
            }
        }
    }

    pub fn draw<B: Backend>(&self, frame: &mut Frame<B>, session: &Session) {
        let size = frame.size();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30), // Contacts panel
                Constraint::Percentage(70), // Chat panel
            ])
            .split(size);

        self.draw_contacts(frame, session, chunks[0]);

        let chat_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Conversation header
                Constraint::Min(5),    // Messages area
                Constraint::Length(3), // Input box
                Constraint::Length(1), // Help / notice line
            ])
            .split(chunks[1]);

        draw_conversation_header(frame, session.current(), chat_chunks[0]);
        draw_messages(frame, session.current(), session.messages(), chat_chunks[1]);
        self.draw_input(frame, chat_chunks[2]);
        self.draw_status_line(frame, chat_chunks[3]);
    }

    fn draw_contacts<B: Backend>(&self, frame: &mut Frame<B>, session: &Session, area: Rect) {
        let items: Vec<ListItem> = session
            .directory()
            .list()
            .iter()
            .map(|c| contact_row(c, c.id == session.current().id))
            .collect();

        let title = format!("SAIDUS · @{}", session.identity().display_name);
        let list = List::new(items).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(match self.active_tab {
                    Tab::Contacts => Style::default().fg(Color::Yellow),
                    _ => Style::default(),
                }),
        );
        frame.render_widget(list, area);
    }

    fn draw_input<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let input_block = Block::default()
            .title("Введите сообщение...")
            .borders(Borders::ALL)
            .border_style(match self.active_tab {
                Tab::Messages => Style::default().fg(Color::Yellow),
                _ => Style::default(),
            });

        // The buffer may hold soft newlines; show it wrapped and keep
        // the last line in view by letting the paragraph clip the top.
        let input_widget = Paragraph::new(self.input.value())
            .block(input_block)
            .wrap(Wrap { trim: false });
        frame.render_widget(input_widget, area);

        if let Tab::Messages = self.active_tab {
            let width = area.width.saturating_sub(2).max(1) as usize;
            let (row, col) = cursor_position(self.input.value(), self.input.cursor(), width);
            frame.set_cursor(area.x + col + 1, area.y + row + 1);
        }
    }

    fn draw_status_line<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let line = if let Some((notice, _)) = &self.notice {
            Line::from(Span::styled(notice.clone(), Style::default().fg(Color::Green)))
        } else {
            Line::from(Span::styled(
                "ESC выход | Tab контакты | Enter отправить | Shift+Enter новая строка",
                Style::default().fg(Color::Gray),
            ))
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Row and column of the cursor inside the composer box, counting
/// soft newlines as line breaks on top of plain width wrapping.
fn cursor_position(value: &str, cursor: usize, width: usize) -> (u16, u16) {
    let width = width.max(1);
    let (mut row, mut col) = (0usize, 0usize);
    for c in value.chars().take(cursor) {
        if c == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
            if col == width {
                row += 1;
                col = 0;
            }
        }
    }
    (row as u16, col as u16)
}

fn contact_row(contact: &Contact, selected: bool) -> ListItem<'static> {
    let marker = if selected { "> " } else { "  " };
    let mut header = vec![
        Span::styled(
            format!("{}{} ", marker, contact.avatar),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            contact.name.clone(),
            if selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            },
        ),
    ];
    if let Some(unread) = contact.unread {
        header.push(Span::styled(
            format!(" [{}]", unread),
            Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD),
        ));
    }

    let preview = Line::from(Span::styled(
        format!("    {} · {}", contact.last_message, contact.last_message_time),
        Style::default().fg(Color::Gray),
    ));

    ListItem::new(Text::from(vec![Line::from(header), preview]))
}

fn draw_conversation_header<B: Backend>(frame: &mut Frame<B>, contact: &Contact, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            format!("{} {}", contact.avatar, contact.name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            contact.status.clone(),
            Style::default().fg(Color::Gray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_messages<B: Backend>(frame: &mut Frame<B>, contact: &Contact, messages: &[Message], area: Rect) {
    let wrap_width = area.width.saturating_sub(2).max(8) as usize;

    let items: Vec<ListItem> = messages
        .iter()
        .flat_map(|m| {
            // Direction is the authoritative datum: outgoing lines sit
            // on the right in their own color, incoming on the left.
            let (who, style, alignment) = if m.is_outgoing() {
                ("Вы", Style::default().fg(Color::Cyan), Alignment::Right)
            } else {
                (contact.name.as_str(), Style::default(), Alignment::Left)
            };

            let full_content = format!("[{}] {}: {}", m.time, who, m.text);
            let wrapped: Vec<String> = wrap(&full_content, wrap_width)
                .into_iter()
                .map(|l| l.into_owned())
                .collect();

            wrapped.into_iter().map(move |line| {
                ListItem::new(Line::from(Span::styled(line, style)).alignment(alignment))
            })
        })
        .collect();

    // Keep the newest message in view without highlighting it.
    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(items.len() - 1));
    }

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Сообщения"))
        .highlight_style(Style::default());
    frame.render_stateful_widget(list, area, &mut list_state);
}

// ---------------------------------------------------------------------------
// Terminal plumbing
// ---------------------------------------------------------------------------

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
