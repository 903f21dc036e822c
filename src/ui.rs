use crate::app::{Action, App, Focus, Notice, View};
use crate::blog_post::{BlogPost, PostStatus, Tone};
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::Duration,
};
use unicode_width::UnicodeWidthChar;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

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

    pub fn display(&mut self, app: &App) -> Result<()> {
        self.terminal.draw(|f| match app.view {
            View::List => draw_list(f, app),
            View::Detail(_) => draw_detail(f, app),
        })?;
        Ok(())
    }

    /// Waits one poll interval for a key press so the caller can keep redrawing.
    pub fn next_action(&self, app: &App) -> Result<Option<Action>> {
        if !event::poll(POLL_INTERVAL)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(map_key(app, key)),
            _ => Ok(None),
        }
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

pub fn map_key(app: &App, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    match (app.view, app.focus) {
        (View::Detail(_), _) => match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => Some(Action::Back),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
        (View::List, Focus::Topic) => match key.code {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Tab | KeyCode::Down => Some(Action::ToggleFocus),
            KeyCode::Right => Some(Action::NextTone),
            KeyCode::Left | KeyCode::BackTab => Some(Action::PreviousTone),
            KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char(c) if key.modifiers.difference(KeyModifiers::SHIFT).is_empty() => {
                Some(Action::Input(c))
            }
            _ => None,
        },
        (View::List, Focus::History) => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
            KeyCode::Enter | KeyCode::Char('o') => Some(Action::Open),
            KeyCode::Tab => Some(Action::ToggleFocus),
            KeyCode::Right => Some(Action::NextTone),
            KeyCode::Left | KeyCode::BackTab => Some(Action::PreviousTone),
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
    }
}

fn heading(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
}

fn focused_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(Style::default().fg(Color::Cyan))
    } else {
        block
    }
}

fn draw_list(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    f.render_widget(heading("Blog Generator"), chunks[0]);
    draw_form(f, app, chunks[1]);
    draw_generate_button(f, app, chunks[2]);
    draw_history(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);
}

fn draw_form(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Topic;
    let cursor = if focused && !app.is_generating() { "|" } else { "" };
    let topic = if app.topic.is_empty() && !focused {
        Span::styled(
            "e.g. Benefits of Vitamin D",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::raw(format!("{}{}", app.topic, cursor))
    };

    let tones: Vec<Span> = Tone::ALL
        .iter()
        .flat_map(|tone| {
            let style = if *tone == app.tone {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            [Span::styled(format!(" {} ", tone), style), Span::raw(" ")]
        })
        .collect();

    let label = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(vec![Span::styled("Topic: ", label), topic]),
        Line::from([vec![Span::styled("Tone:  ", label)], tones].concat()),
    ];
    f.render_widget(
        Paragraph::new(lines).block(focused_block("Create New Post", focused)),
        area,
    );
}

fn draw_generate_button(f: &mut Frame, app: &App, area: Rect) {
    let (label, style) = if app.is_generating() {
        (
            "Generating...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::SLOW_BLINK),
        )
    } else if app.can_submit() {
        (
            "[ Enter ] Generate Post",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("Generate Post", Style::default().fg(Color::DarkGray))
    };
    f.render_widget(
        Paragraph::new(label)
            .style(style)
            .alignment(Alignment::Right)
            .block(Block::default().borders(Borders::TOP)),
        area,
    );
}

fn draw_history(f: &mut Frame, app: &App, area: Rect) {
    let posts = app.store().posts();
    let title_width = (area.width as usize).saturating_sub(40).max(10);
    let items: Vec<ListItem> = posts
        .iter()
        .map(|post| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{}  ", post.date.format("%Y-%m-%d")),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(format!(
                    "{:<width$}",
                    truncate_to_width(&post.title, title_width),
                    width = title_width
                )),
                Span::styled(
                    format!("  {:<12}", post.tone),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(post.status.to_string(), status_style(post)),
            ]))
        })
        .collect();

    let focused = app.focus == Focus::History;
    let title = format!("History ({})", posts.len());
    let list = List::new(items)
        .block(focused_block(&title, focused))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(if focused { "> " } else { "  " });

    let selected = if posts.is_empty() {
        None
    } else {
        Some(app.selected)
    };
    f.render_stateful_widget(
        list,
        area,
        &mut ListState::default().with_selected(selected),
    );
}

fn status_style(post: &BlogPost) -> Style {
    match post.status {
        PostStatus::Published => Style::default().fg(Color::Green),
        PostStatus::Draft => Style::default().fg(Color::Yellow),
        PostStatus::Generating => Style::default().fg(Color::Magenta),
    }
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let line = match &app.notice {
        Some(Notice::Info(msg)) => {
            Line::from(Span::styled(msg.as_str(), Style::default().fg(Color::Green)))
        }
        Some(Notice::Error(msg)) => {
            Line::from(Span::styled(msg.as_str(), Style::default().fg(Color::Red)))
        }
        None if app.focus == Focus::Topic => Line::from(
            "Type a topic, Left/Right: Tone, Enter: Generate, Tab: History, Esc: Quit",
        ),
        None => Line::from("Up/Down: Navigate, Enter: Open, Tab: Topic, q: Quit"),
    };
    f.render_widget(
        Paragraph::new(line)
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_detail(f: &mut Frame, app: &App) {
    let Some(post) = app.detail_post() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    f.render_widget(heading(&post.title), chunks[0]);

    let meta = Line::from(vec![
        Span::raw(format!("{}  ·  ", post.date.format("%B %-d, %Y"))),
        Span::styled(post.tone.to_string(), Style::default().fg(Color::Cyan)),
        Span::raw("  ·  "),
        Span::styled(post.status.to_string(), status_style(post)),
        Span::raw(format!(
            "  ·  {} words  ·  {} read",
            post.word_count_label(),
            post.reading_time_label()
        )),
    ]);
    let chips: Vec<Span> = post
        .tags()
        .iter()
        .flat_map(|tag| {
            [
                Span::styled(
                    format!(" #{} ", tag),
                    Style::default().fg(Color::Black).bg(Color::Blue),
                ),
                Span::raw(" "),
            ]
        })
        .collect();
    f.render_widget(
        Paragraph::new(vec![meta, Line::from(chips)])
            .block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );

    let content = Paragraph::new(markdown_lines(&post.content))
        .block(Block::default().borders(Borders::ALL).title("Content"))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    f.render_widget(content, chunks[2]);

    let instructions = Paragraph::new("Up/Down: Scroll, Esc: Back to list, q: Quit")
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[3]);
}

/// Renders Markdown as styled plain lines: headings bold, bullets and emphasis markers kept.
pub fn markdown_lines(content: &str) -> Vec<Line<'_>> {
    content
        .trim()
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                let level = trimmed.chars().take_while(|c| *c == '#').count();
                let text = trimmed[level..].trim();
                let color = if level == 1 { Color::Cyan } else { Color::LightBlue };
                Line::from(Span::styled(
                    text,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(line.trim_end())
            }
        })
        .collect()
}

/// Cuts `text` to at most `width` terminal columns, marking the cut with an ellipsis.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
