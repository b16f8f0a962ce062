//! Terminal UI for the chat.
//!
//! Responsibilities:
//! - switch the terminal into and out of raw/alternate-screen mode
//! - render the transcript, the peer list and the input line
//!
//! Rendering is a pure function of the state handed in; the client decides
//! when to draw.

use std::io::{self, stdout, Stdout};

use crossterm::{execute, terminal::{enable_raw_mode, disable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use ratatui::{prelude::*, widgets::*};

use crate::roster::PeerRoster;

/// Width of the peer list column.
const PEER_LIST_WIDTH: u16 = 42;
const INPUT_HEIGHT: u16 = 3;
const BORDER_SIZE: u16 = 2;

const ACCENT: Color = Color::Rgb(50, 230, 230);
const FOREGROUND: Color = Color::Rgb(200, 200, 210);
const BACKGROUND: Color = Color::Rgb(20, 18, 28);
const SELECTED: Color = Color::Rgb(198, 120, 221);

/// Put the terminal in raw mode on the alternate screen.
pub fn enter() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Undo [`enter`].
pub fn leave(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Draw the whole screen.
pub fn draw(f: &mut Frame, transcript: &[String], roster: &PeerRoster, input: &str) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(BORDER_SIZE + 1), Constraint::Length(INPUT_HEIGHT)])
        .split(f.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(PEER_LIST_WIDTH)])
        .split(rows[0]);

    draw_transcript(f, transcript, columns[0]);
    draw_peers(f, roster, columns[1]);
    draw_input(f, input, rows[1]);
}

fn panel(title: &str) -> Block<'_> {
    let style = Style::default().fg(ACCENT).add_modifier(Modifier::BOLD);
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, style))
        .title_alignment(Alignment::Center)
        .border_style(style)
}

fn draw_transcript(f: &mut Frame, transcript: &[String], area: Rect) {
    let block = panel(" Chat ");
    let inner = block.inner(area);
    let visible = usize::from(inner.height);
    let wrap = Wrap { trim: false };

    // walk back from the newest line until the wrapped rows fill the view
    let mut start = transcript.len();
    let mut rows = 0;
    while start > 0 && rows < visible {
        start -= 1;
        rows += Paragraph::new(transcript[start].as_str()).wrap(wrap).line_count(inner.width).max(1);
    }
    let scroll = u16::try_from(rows.saturating_sub(visible)).unwrap_or(u16::MAX);

    let lines: Vec<Line> = transcript[start..].iter().map(|l| Line::raw(l.as_str())).collect();
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().fg(FOREGROUND).bg(BACKGROUND))
        .wrap(wrap)
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);

    let mut scrollbar_state = ScrollbarState::new(transcript.len())
        .viewport_content_length(visible)
        .position(start);
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));
    f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
}

fn draw_peers(f: &mut Frame, roster: &PeerRoster, area: Rect) {
    let items: Vec<ListItem> = roster
        .peers()
        .iter()
        .map(|p| ListItem::new(format!("{} {}:{}", p.address, p.host, p.port)))
        .collect();

    let list = List::new(items)
        .block(panel(" Peers "))
        .style(Style::default().fg(FOREGROUND).bg(BACKGROUND))
        .highlight_style(Style::default().fg(SELECTED).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(roster.selected_index());
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_input(f: &mut Frame, input: &str, area: Rect) {
    let block = panel(" Message ");
    let inner = block.inner(area);

    // keep the end of a long draft in view, with a cell left for the cursor
    let fit = usize::from(inner.width.saturating_sub(1));
    let skip = input.chars().count().saturating_sub(fit);
    let shown: String = input.chars().skip(skip).collect();
    let width = u16::try_from(shown.chars().count()).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(shown)
        .block(block)
        .style(Style::default().fg(FOREGROUND).bg(BACKGROUND));
    f.render_widget(paragraph, area);

    f.set_cursor_position((inner.x.saturating_add(width), inner.y));
}
