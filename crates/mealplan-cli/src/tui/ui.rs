//! Dashboard rendering using ratatui.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use mealplan_core::{CLEAR_PROMPT, DetailOverlay, GroupBody, RowView};
use mealplan_store::{Category, KeyValueStore};

use super::app::{App, Focus, Mode};

/// Render the whole dashboard.
pub fn render<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // main content
            Constraint::Length(3), // input line
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[0]);

    render_plan(f, app, panes[0]);
    render_results(f, app, panes[1]);
    render_input(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    if app.mode == Mode::Help {
        render_help(f, overlay_area(f.area()));
    }
    if app.detail.overlay().is_visible() {
        render_detail(f, app, overlay_area(f.area()));
    }
}

/// Centered box used for the detail and help overlays.
pub fn overlay_area(area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(70)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Percentage(70)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

fn pane_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!(" {title} "))
}

// -- Plan --

fn render_plan<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let listing = app.view.render(app.store.plan());
    let mut lines = Vec::new();

    for group in listing.groups() {
        let selected_group = group.category == app.category;
        let header_style = if selected_group {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let marker = if selected_group { "> " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!("{marker}{}", group.header()),
            header_style,
        )));

        match &group.body {
            GroupBody::Empty { placeholder } => {
                lines.push(Line::from(Span::styled(
                    format!("    {placeholder}"),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )));
            }
            GroupBody::Rows(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    let highlighted =
                        app.focus == Focus::Plan && selected_group && i == app.selected_row;
                    lines.push(row_line(row, highlighted));
                }
            }
        }
        lines.push(Line::from(""));
    }

    let plan = Paragraph::new(lines).block(pane_block("Meal Plan", app.focus == Focus::Plan));
    f.render_widget(plan, area);
}

fn row_line(row: &RowView, highlighted: bool) -> Line<'static> {
    let style = if highlighted {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![Span::raw("    ")];
    if row.is_editing() {
        spans.push(Span::styled(
            format!("{}_", row.text()),
            style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        ));
    } else {
        spans.push(Span::styled(row.text().to_string(), style));
    }
    if row.recipe_ref.is_some() {
        spans.push(Span::styled(" *", Style::default().fg(Color::Green)));
    }
    for action in row.actions() {
        spans.push(Span::styled(
            format!("  [{}]", action.label()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

// -- Recipes --

fn render_results<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let panel = app.search.panel();
    let lines: Vec<Line> = match panel.message() {
        Some(message) => vec![Line::from(Span::styled(
            message,
            Style::default().fg(Color::DarkGray),
        ))],
        None if panel.results().is_empty() => vec![Line::from(Span::styled(
            "Press / to search recipes.",
            Style::default().fg(Color::DarkGray),
        ))],
        None => panel
            .results()
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let style = if app.focus == Focus::Results && i == app.selected_result {
                    Style::default()
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(truncate(&item.name, 48), style))
            })
            .collect(),
    };

    let results = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(pane_block("Recipes", app.focus == Focus::Results));
    f.render_widget(results, area);
}

fn render_detail<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let overlay = app.detail.overlay();
    let (title, lines) = match overlay {
        DetailOverlay::Loaded(detail) => {
            let mut lines = vec![Line::from(Span::styled(
                "Ingredients",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))];
            lines.extend(detail.ingredients.iter().map(|i| {
                if i.measure.is_empty() {
                    Line::from(format!("  - {}", i.name))
                } else {
                    Line::from(format!("  - {} {}", i.measure, i.name))
                }
            }));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Instructions",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            lines.extend(detail.instructions.lines().map(|l| Line::from(l.to_string())));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("i: add to {}   Esc: close", app.category),
                Style::default().fg(Color::DarkGray),
            )));
            (detail.name.clone(), lines)
        }
        other => (
            "Recipe".to_string(),
            vec![
                Line::from(other.message().unwrap_or_default()),
                Line::from(""),
                Line::from(Span::styled("Esc: close", Style::default().fg(Color::DarkGray))),
            ],
        ),
    };

    let popup = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(format!(" {title} ")));
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

// -- Input line --

fn render_input<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let (title, text) = match &app.mode {
        Mode::Adding { input } => (format!("Add to {}", app.category), format!("{input}_")),
        Mode::Searching { input } => ("Search recipes".to_string(), format!("{input}_")),
        Mode::Editing => (
            "Edit".to_string(),
            "Enter: save   Esc: cancel   Up/Down: edit another row".to_string(),
        ),
        Mode::ConfirmClear => ("Clear".to_string(), format!("{CLEAR_PROMPT} (y/n)")),
        Mode::Browse | Mode::Help => (
            format!("Adding to {}", app.category),
            "a: add   /: search   ?: help".to_string(),
        ),
    };
    let input = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {title} ")),
    );
    f.render_widget(input, area);
}

// -- Help --

fn render_help(f: &mut Frame, area: Rect) {
    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    };
    let text = vec![
        Line::from(""),
        heading("  Navigation"),
        Line::from("    j/Down    Move down"),
        Line::from("    k/Up      Move up"),
        Line::from("    Tab       Next category (S-Tab: previous)"),
        Line::from("    h/l       Focus plan / recipe results"),
        Line::from(""),
        heading("  Plan"),
        Line::from("    a         Add a meal to the selected category"),
        Line::from("    e         Edit the selected meal (Enter saves, Esc cancels)"),
        Line::from("    d         Delete the selected meal"),
        Line::from("    C         Clear the whole plan"),
        Line::from(""),
        heading("  Recipes"),
        Line::from("    /         Search recipes"),
        Line::from("    Enter     Show recipe details"),
        Line::from("    i         Add recipe to the selected category"),
        Line::from("    x         Clear search results"),
        Line::from(""),
        heading("  Other"),
        Line::from("    ?         Show this help"),
        Line::from("    q         Quit"),
    ];

    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Help "));
    f.render_widget(Clear, area);
    f.render_widget(help, area);
}

// -- Status bar --

fn render_status_bar<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let mode_name = match &app.mode {
        Mode::Browse => "BROWSE",
        Mode::Adding { .. } => "ADD",
        Mode::Editing => "EDIT",
        Mode::Searching { .. } => "SEARCH",
        Mode::ConfirmClear => "CLEAR",
        Mode::Help => "HELP",
    };

    let total = app.store.plan().len();
    let status_msg = app.status_message.as_deref().unwrap_or("");
    let status_style = if status_msg.starts_with("Error") {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    let bar = Line::from(vec![
        Span::styled(
            format!(" {mode_name} "),
            Style::default().bg(Color::Blue).fg(Color::White),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{total} {}", if total == 1 { "meal" } else { "meals" }),
            Style::default().fg(category_color(app.category)),
        ),
        Span::raw("  "),
        Span::styled(status_msg, status_style),
        Span::raw("  q:quit  ?:help  Tab:category"),
    ]);

    f.render_widget(Paragraph::new(bar), area);
}

// -- Helpers --

fn category_color(category: Category) -> Color {
    match category {
        Category::Breakfast => Color::Yellow,
        Category::Lunch => Color::Green,
        Category::Dinner => Color::Magenta,
        Category::Snack => Color::Cyan,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_is_centered_inside_frame() {
        let frame = Rect::new(0, 0, 100, 40);
        let overlay = overlay_area(frame);
        assert_eq!(overlay.width, 70);
        assert_eq!(overlay.height, 28);
        assert_eq!(overlay.x, 15);
        assert_eq!(overlay.y, 6);
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Crème brûlée", 20), "Crème brûlée");
        assert_eq!(truncate("Crème brûlée", 5), "Crème...");
    }
}
