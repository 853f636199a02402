//! TUI rendering logic for the search screen.

use cinefind_core::search::SearchPhase;
use cinefind_core::view::{DetailView, EmptyState, MovieCard, SearchBody, TrendingCard};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use super::state::{DetailPane, SearchScreenState, Snapshot};

/// Draws the search screen.
#[allow(clippy::indexing_slicing)]
pub fn draw(
    frame: &mut Frame,
    state: &SearchScreenState,
    snapshot: &Snapshot,
    trending: &[TrendingCard],
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // query input
            Constraint::Min(5),    // results or details
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], state);
    match &snapshot.details {
        Some(pane) => draw_details(frame, chunks[1], pane),
        None => draw_main(frame, chunks[1], state, snapshot, trending),
    }
    draw_footer(frame, chunks[2], snapshot);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &SearchScreenState) {
    let input = Paragraph::new(state.query.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(" Search "));
    frame.render_widget(input, area);
}

/// Draws results on the left and trending searches on the right.
#[allow(clippy::indexing_slicing)]
fn draw_main(
    frame: &mut Frame,
    area: Rect,
    state: &SearchScreenState,
    snapshot: &Snapshot,
    trending: &[TrendingCard],
) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    match &snapshot.body {
        SearchBody::Loading => draw_message(frame, panes[0], " Results ", &["Loading..."]),
        SearchBody::Error(text) => {
            let error = Paragraph::new(text.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(" Results "));
            frame.render_widget(error, panes[0]);
        }
        SearchBody::Results { heading, cards } => {
            let title = heading
                .as_deref()
                .map_or_else(|| String::from(" Results "), |h| format!(" {h} "));
            draw_cards(frame, panes[0], &title, cards, state.cursor);
        }
        SearchBody::Empty(empty) => draw_empty(frame, panes[0], empty),
    }

    draw_trending(frame, panes[1], trending);
}

fn draw_message(frame: &mut Frame, area: Rect, title: &str, lines: &[&str]) {
    let text: Vec<Line> = lines.iter().map(|l| Line::from(*l)).collect();
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn draw_empty(frame: &mut Frame, area: Rect, empty: &EmptyState) {
    let message = empty.message();
    draw_message(
        frame,
        area,
        &format!(" {} ", empty.title()),
        &[message.as_str(), "", empty.hint()],
    );
}

fn draw_cards(frame: &mut Frame, area: Rect, title: &str, cards: &[MovieCard], cursor: usize) {
    let items: Vec<ListItem> = cards
        .iter()
        .enumerate()
        .map(|(i, card)| {
            let highlighted = i == cursor;
            let marker = if highlighted { "\u{25b8} " } else { "  " };
            let title_style = if highlighted {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let stars = "\u{2605}".repeat(usize::from(card.stars));
            let mut spans = vec![
                Span::raw(String::from(marker)),
                Span::styled(card.title.clone(), title_style),
                Span::raw(format!("  {}  {}  ", card.year, card.language)),
                Span::styled(stars, Style::default().fg(Color::Yellow)),
            ];
            if card.hot {
                spans.push(Span::styled(" HOT", Style::default().fg(Color::Red)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(String::from(title)),
    );
    frame.render_widget(list, area);
}

fn draw_trending(frame: &mut Frame, area: Rect, trending: &[TrendingCard]) {
    let items: Vec<ListItem> = trending
        .iter()
        .map(|card| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>2}. ", card.rank), Style::default().fg(Color::Green)),
                Span::raw(card.search_term.clone()),
                Span::raw(format!(" ({})", card.count)),
            ]))
        })
        .collect();

    let list =
        List::new(items).block(Block::default().borders(Borders::ALL).title(" Trending "));
    frame.render_widget(list, area);
}

fn draw_details(frame: &mut Frame, area: Rect, pane: &DetailPane) {
    match pane {
        DetailPane::Loading => draw_message(frame, area, " Details ", &["Loading..."]),
        DetailPane::Error(text) => {
            let error = Paragraph::new(text.as_str())
                .style(Style::default().fg(Color::Red))
                .block(Block::default().borders(Borders::ALL).title(" Details "));
            frame.render_widget(error, area);
        }
        DetailPane::Ready(view) => {
            let paragraph = Paragraph::new(detail_lines(view))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Cyan))
                        .title(format!(" {} ", view.title)),
                );
            frame.render_widget(paragraph, area);
        }
    }
}

fn detail_lines(view: &DetailView) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::Cyan);
    let field = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("{name:<12}"), label), Span::raw(value)])
    };

    let mut lines = Vec::new();
    if let Some(tagline) = &view.tagline {
        lines.push(Line::from(Span::styled(
            tagline.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));
    }
    lines.push(field("Released", view.year.clone()));
    lines.push(field("Runtime", view.runtime.clone()));
    lines.push(field(
        "Rating",
        format!("{} ({} votes)", view.rating, view.vote_count),
    ));
    lines.push(field("Genres", view.genres.join(", ")));
    if let Some(director) = &view.director {
        lines.push(field("Director", director.clone()));
    }
    if !view.cast.is_empty() {
        lines.push(field("Cast", view.cast.join(", ")));
    }
    lines.push(field("Budget", view.budget.clone()));
    lines.push(field("Revenue", view.revenue.clone()));
    lines.push(field("Production", view.production.clone()));
    lines.push(field("Languages", view.languages.clone()));
    if let Some(trailer) = &view.trailer_url {
        lines.push(field("Trailer", trailer.clone()));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(view.overview.clone()));
    lines
}

fn draw_footer(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let status = match snapshot.phase {
        SearchPhase::Idle => "idle",
        SearchPhase::PendingDebounce => "typing",
        SearchPhase::Loading => "searching",
        SearchPhase::Loaded => "ready",
        SearchPhase::Errored => "error",
    };
    let keys = if snapshot.details.is_some() {
        "Esc: back  Ctrl-C: quit"
    } else {
        "Type to search  \u{2191}\u{2193}: move  Enter: details  Esc: clear/quit"
    };
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(format!("[{status}] "), Style::default().fg(Color::Green)),
        Span::raw(keys),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
