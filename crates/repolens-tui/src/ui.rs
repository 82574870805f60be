// UI rendering logic
use crate::app::{App, DateField, InputMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use repolens_core::RepositorySummary;

pub fn render(frame: &mut Frame, app: &mut App) {
    let screen_height = frame.area().height;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3.min(screen_height / 6)), // Header
            Constraint::Length(3.min(screen_height / 6)), // Search form
            Constraint::Min(5),                           // Results
            Constraint::Length(1),                        // Pagination
            Constraint::Length(1),                        // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_search_form(frame, app, chunks[1]);
    render_results_list(frame, app, chunks[2]);
    render_pagination(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    if app.show_readme {
        render_readme_overlay(frame, app, chunks[2]);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let logo = Paragraph::new(Line::from(vec![Span::styled(
        "🔍 RepoLens",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(logo, header_chunks[0]);

    let stats = Paragraph::new(Line::from(vec![
        Span::styled("📊 ", Style::default().fg(Color::Green)),
        Span::styled(
            format!("{}", app.results.repositories.len()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" shown"),
    ]))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Right);
    frame.render_widget(stats, header_chunks[1]);
}

fn render_search_form(frame: &mut Frame, app: &App, area: Rect) {
    let form_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(20),    // Search
            Constraint::Length(14), // From
            Constraint::Length(14), // To
            Constraint::Length(11), // Sort
            Constraint::Length(14), // Order
        ])
        .split(area);

    let active = Style::default().fg(Color::Yellow);

    let search_style = if app.input_mode == InputMode::Searching {
        active
    } else {
        Style::default()
    };
    let input = Paragraph::new(app.params.search_term.as_str())
        .style(search_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search (/)")
                .border_style(search_style),
        );
    frame.render_widget(input, form_chunks[0]);

    if app.input_mode == InputMode::Searching {
        frame.set_cursor_position((
            form_chunks[0].x + app.params.search_term.chars().count() as u16 + 1,
            form_chunks[0].y + 1,
        ));
    }

    for (field, chunk, key) in [
        (DateField::From, form_chunks[1], 'f'),
        (DateField::To, form_chunks[2], 't'),
    ] {
        let editing = app.input_mode == InputMode::EditingDate(field);
        let text = if editing {
            app.date_edit_buffer.clone()
        } else {
            app.date(field).format("%Y-%m-%d").to_string()
        };
        let style = if editing { active } else { Style::default() };
        let widget = Paragraph::new(text).style(style).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ({})", field.label(), key))
                .border_style(style),
        );
        frame.render_widget(widget, chunk);

        if editing {
            frame.set_cursor_position((
                chunk.x + app.date_edit_buffer.chars().count() as u16 + 1,
                chunk.y + 1,
            ));
        }
    }

    let sort = Paragraph::new(app.params.sort_by.label())
        .block(Block::default().borders(Borders::ALL).title("Sort (s)"));
    frame.render_widget(sort, form_chunks[3]);

    let order = Paragraph::new(app.params.order_by.label())
        .block(Block::default().borders(Borders::ALL).title("Order (o)"));
    frame.render_widget(order, form_chunks[4]);
}

fn render_results_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = if app.results.is_loading {
        " Results (Loading...) ".to_string()
    } else {
        format!(" Results ({}) ", app.results.repositories.len())
    };

    if let Some(message) = app.placeholder() {
        let style = if app.results.error.is_some() {
            Style::default().fg(Color::Red)
        } else if app.results.is_loading {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let text = vec![
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled(message, style)),
        ];
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .results
        .repositories
        .iter()
        .enumerate()
        .map(|(i, repo)| ListItem::new(repository_card(repo, i == app.selected_index)))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    // Use stateful rendering for proper scrolling
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn repository_card(repo: &RepositorySummary, is_selected: bool) -> Vec<Line<'_>> {
    let name_style = if is_selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };

    // Line 1: Stats + Name
    let line1 = Line::from(vec![
        Span::styled(
            format!("⭐{}", format_number(repo.stargazers_count)),
            Style::default().fg(Color::Rgb(255, 215, 0)),
        ),
        Span::raw("  "),
        Span::styled(
            format!("🍴{}", format_number(repo.forks_count)),
            Style::default().fg(Color::Rgb(100, 149, 237)),
        ),
        Span::raw("  "),
        Span::styled(
            format!("❗{}", format_number(repo.open_issues_count)),
            Style::default().fg(Color::Rgb(255, 99, 71)),
        ),
        Span::raw("  "),
        Span::styled(repo.full_name.as_str(), name_style),
    ]);

    // Line 2: Owner
    let owner = match &repo.owner {
        Some(owner) => Span::styled(
            format!("by {}", owner.login),
            Style::default().fg(Color::Rgb(147, 112, 219)),
        ),
        None => Span::styled(
            "No owner information",
            Style::default().fg(Color::Rgb(128, 128, 128)),
        ),
    };
    let line2 = Line::from(vec![Span::raw("     "), owner]);

    // Line 3: Link
    let link = match &repo.html_url {
        Some(url) => Span::styled(url.as_str(), Style::default().fg(Color::Rgb(105, 105, 105))),
        None => Span::styled("Repository unavailable", Style::default().fg(Color::Red)),
    };
    let line3 = Line::from(vec![Span::raw("     "), link]);

    vec![line1, line2, line3]
}

// Helper function to format numbers with k/M suffixes
pub fn format_number(num: u64) -> String {
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}k", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

fn render_pagination(frame: &mut Frame, app: &App, area: Rect) {
    let prev = if app.pagination.can_go_back(app.params.page) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let next = if app
        .pagination
        .can_go_forward(app.params.page, app.results.total_count)
    {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let line = Line::from(vec![
        Span::styled("◀ p ", prev),
        Span::raw(app.pagination_summary()),
        Span::styled(" n ▶", next),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn render_readme_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect(90, 90, area);
    frame.render_widget(Clear, popup);

    let title = match app.selected_repository() {
        Some(repo) => format!(" README · {} ", repo.full_name),
        None => " README ".to_string(),
    };

    let paragraph = Paragraph::new(readme_lines(app))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.readme_scroll, 0));
    frame.render_widget(paragraph, popup);
}

fn readme_lines(app: &App) -> Vec<Line<'_>> {
    if app.readme.is_loading {
        return vec![
            Line::from(""),
            Line::from(Span::styled(
                "⏳ Loading README…",
                Style::default().fg(Color::Yellow),
            )),
        ];
    }

    if let Some(error) = &app.readme.error {
        return vec![
            Line::from(""),
            Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))),
        ];
    }

    if app.readme.readme.is_empty() {
        return vec![
            Line::from(""),
            Line::from(Span::styled(
                "No README available.",
                Style::default().fg(Color::Gray),
            )),
        ];
    }

    // Simple markdown-to-text conversion
    app.readme
        .readme
        .lines()
        .map(|line| {
            if let Some(heading) = line.strip_prefix("# ") {
                Line::from(Span::styled(
                    heading,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
            } else if let Some(heading) = line.strip_prefix("## ") {
                Line::from(Span::styled(
                    heading,
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else if let Some(heading) = line.strip_prefix("### ") {
                Line::from(Span::styled(
                    heading,
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ))
            } else if line.starts_with("```") {
                Line::from(Span::styled(
                    line,
                    Style::default().fg(Color::DarkGray).bg(Color::Black),
                ))
            } else if line.starts_with("- ") || line.starts_with("* ") {
                Line::from(Span::styled(line, Style::default().fg(Color::Blue)))
            } else {
                Line::from(line)
            }
        })
        .collect()
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error_message {
        Span::styled(error.as_str(), Style::default().fg(Color::Red))
    } else {
        match app.input_mode {
            InputMode::Searching => Span::styled(
                "SEARCH | type to search | ESC/ENTER: results",
                Style::default().fg(Color::Yellow),
            ),
            InputMode::EditingDate(_) => Span::styled(
                "EDITING DATE | YYYY-MM-DD | ENTER: save | ESC: cancel",
                Style::default().fg(Color::Green),
            ),
            InputMode::Normal if app.show_readme => Span::styled(
                "README | j/k: scroll | R: refetch | r/ESC: close | q: quit",
                Style::default().fg(Color::Cyan),
            ),
            InputMode::Normal => Span::raw(
                "j/k: navigate | /: search | f/t: dates | s: sort | o: order | n/p: page | r: README | ENTER: open | q: quit",
            ),
        }
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}

/// Rectangle of `percent_x` by `percent_y` centred in `area`
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use repolens_core::{Owner, ReadmeState, ResultPage};

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut screen = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                screen.push_str(buffer[(x, y)].symbol());
            }
            screen.push('\n');
        }
        screen
    }

    fn sample_results() -> ResultPage {
        ResultPage {
            repositories: vec![
                RepositorySummary {
                    id: 1,
                    name: "tokio".into(),
                    full_name: "tokio-rs/tokio".into(),
                    html_url: Some("https://github.com/tokio-rs/tokio".into()),
                    owner: Some(Owner {
                        login: "tokio-rs".into(),
                        html_url: "https://github.com/tokio-rs".into(),
                    }),
                    stargazers_count: 27_500,
                    forks_count: 2_500,
                    open_issues_count: 300,
                },
                RepositorySummary {
                    id: 2,
                    full_name: "ghost/orphan".into(),
                    ..RepositorySummary::default()
                },
            ],
            total_count: 1234,
            is_loading: false,
            error: None,
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_500), "1.5k");
        assert_eq!(format_number(27_500), "27.5k");
        assert_eq!(format_number(2_000_000), "2.0M");
    }

    #[test]
    fn test_empty_form_shows_hint() {
        let mut app = App::default();
        let screen = draw(&mut app);
        assert!(screen.contains("Search for repositories using the form above."));
        assert!(screen.contains("Page 1 of 1"));
        assert!(screen.contains("Descending"));
    }

    #[test]
    fn test_cards_and_pagination() {
        let mut app = App::default();
        app.params.search_term = "tokio".into();
        app.set_results(sample_results());

        let screen = draw(&mut app);
        assert!(screen.contains("tokio-rs/tokio"));
        assert!(screen.contains("27.5k"));
        assert!(screen.contains("by tokio-rs"));
        assert!(screen.contains("No owner information"));
        assert!(screen.contains("Repository unavailable"));
        assert!(screen.contains("Page 1 of 34 • 1,234 total results"));
    }

    #[test]
    fn test_no_results_and_error_messages() {
        let mut app = App::default();
        app.params.search_term = "zzzz".into();
        assert!(draw(&mut app).contains("No repositories found for \"zzzz\"."));

        app.set_results(ResultPage::failed(
            "Failed to fetch repositories: HTTP status 503".into(),
        ));
        assert!(draw(&mut app).contains("Failed to fetch repositories: HTTP status 503"));

        app.set_results(ResultPage::loading());
        assert!(draw(&mut app).contains("Loading repositories…"));
    }

    #[test]
    fn test_readme_overlay_states() {
        let mut app = App::default();
        app.set_results(sample_results());
        app.show_readme = true;

        app.set_readme(ReadmeState {
            is_loading: true,
            ..ReadmeState::default()
        });
        assert!(draw(&mut app).contains("Loading README…"));

        app.set_readme(ReadmeState::default());
        assert!(draw(&mut app).contains("No README available."));

        app.set_readme(ReadmeState {
            error: Some("README download URL not found".into()),
            ..ReadmeState::default()
        });
        assert!(draw(&mut app).contains("README download URL not found"));

        app.set_readme(ReadmeState {
            readme: "# Tokio\n\nAn async runtime".into(),
            ..ReadmeState::default()
        });
        let screen = draw(&mut app);
        assert!(screen.contains("README · tokio-rs/tokio"));
        assert!(screen.contains("An async runtime"));
    }
}
