use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use team_stats_terminal::config::{self, AppConfig};
use team_stats_terminal::export::export_stats;
use team_stats_terminal::http_cache::CachedRowSource;
use team_stats_terminal::metrics::{Performer, PlayerProfile, TeamSummary};
use team_stats_terminal::pipeline;
use team_stats_terminal::registry::{RegistryStore, load_registry, save_registry_file};
use team_stats_terminal::sheets_fetch::{RowSource, source_from_config};
use team_stats_terminal::state::{AppState, FormField, View};

struct App {
    state: AppState,
    source: CachedRowSource<Box<dyn RowSource>>,
    config: AppConfig,
    pending_load: Option<bool>,
    should_quit: bool,
}

impl App {
    fn new(state: AppState, source: CachedRowSource<Box<dyn RowSource>>, config: AppConfig) -> Self {
        Self {
            state,
            source,
            config,
            pending_load: None,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.form.is_some() {
            self.on_form_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.state.toggle_view(),
            KeyCode::Char(']') | KeyCode::Char('n') => {
                if self.state.select_next_sheet() {
                    self.request_load(false);
                }
            }
            KeyCode::Char('[') | KeyCode::Char('p') => {
                if self.state.select_prev_sheet() {
                    self.request_load(false);
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next_player(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev_player(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_load(true),
            KeyCode::Char('a') | KeyCode::Char('A') => self.state.open_form(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.cancel_form(),
            KeyCode::Tab => self.state.form_next_field(),
            KeyCode::Backspace => self.state.form_backspace(),
            KeyCode::Enter => {
                if self.state.submit_form().is_some() {
                    self.persist_registry();
                    self.request_load(false);
                }
            }
            KeyCode::Char(ch) => self.state.form_input(ch),
            _ => {}
        }
    }

    fn request_load(&mut self, force: bool) {
        let Some(label) = self.state.selected_label() else {
            self.state
                .push_log("[INFO] No sheets configured; press a to add one");
            return;
        };
        let verb = if force { "Reloading" } else { "Loading" };
        self.state.push_log(format!("[INFO] {verb} {label}"));
        self.pending_load = Some(force);
    }

    /// Blocks until the row source answers.
    fn load_selected(&mut self, force: bool) {
        let Some(label) = self.state.selected_label() else {
            return;
        };
        let registry = self.state.sheets();
        if force {
            if let Ok(sheet) = registry.lookup(&label) {
                if let Err(err) = self.source.reload(&sheet.id, &sheet.range) {
                    self.state.apply_load(Err(err.into()));
                    return;
                }
            }
        }
        let result = pipeline::load_sheet(&self.source, &registry, &label);
        if let Err(err) = &result {
            log::warn!("load {label} failed: {err}");
        }
        self.state.apply_load(result);
    }

    fn export(&mut self) {
        let Some(loaded) = self.state.loaded.as_ref() else {
            self.state.push_log("[INFO] Nothing loaded to export");
            return;
        };
        let path = export_path(&loaded.label);
        match export_stats(&path, &loaded.table) {
            Ok(report) => self.state.push_log(format!(
                "[INFO] Exported {} players to {}",
                report.players,
                path.display()
            )),
            Err(err) => self.state.push_log(format!("[WARN] Export failed: {err:#}")),
        }
    }

    fn persist_registry(&mut self) {
        if !self.config.persist_added {
            return;
        }
        let registry = self.state.sheets();
        if let Err(err) = save_registry_file(&self.config.registry_file, &registry) {
            self.state
                .push_log(format!("[WARN] Could not save sheet registry: {err:#}"));
        }
    }
}

fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging();

    let registry = load_registry(&config.registry_file, &config.default_range)?;
    let source = CachedRowSource::new(source_from_config(&config)?);
    let mut state = AppState::new(RegistryStore::new(registry, config.default_range.clone()));
    state.push_log(format!(
        "[INFO] {} sheet(s) from {}",
        state.sheets().len(),
        config.registry_file.display()
    ));
    let mut app = App::new(state, source, config);
    app.request_load(false);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn init_logging() {
    let Some(dir) = config::app_cache_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("dashboard.log"))
    else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui(f, &app.state))?;

        if let Some(force) = app.pending_load.take() {
            app.load_selected(force);
            continue;
        }

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn export_path(label: &str) -> PathBuf {
    let slug: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    PathBuf::from(format!("team_stats_{}.xlsx", slug.trim_matches('_')))
}

fn ui(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(40)])
        .split(chunks[1]);

    render_sidebar(frame, body[0], state);
    match state.view {
        View::Player => render_player_view(frame, body[1], state),
        View::Team => render_team_view(frame, body[1], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    if state.form.is_some() {
        render_add_sheet_form(frame, frame.size(), state);
    }
}

fn header_text(state: &AppState) -> String {
    let label = state
        .selected_label()
        .unwrap_or_else(|| "no sheet".to_string());
    let view = match state.view {
        View::Player => "PLAYER STATISTICS",
        View::Team => "TEAM STATISTICS",
    };
    let loaded = state
        .loaded
        .as_ref()
        .map(|l| format!(" | loaded {}", l.loaded_at.format("%H:%M:%S UTC")))
        .unwrap_or_default();
    format!(" TEAM STATS | {label} | {view}{loaded}")
}

fn footer_text(state: &AppState) -> String {
    match state.view {
        View::Player => {
            " Tab Team | [/] Sheet | j/k Player | r Reload | a Add sheet | e Export | ? Help | q Quit"
                .to_string()
        }
        View::Team => {
            " Tab Players | [/] Sheet | r Reload | a Add sheet | e Export | ? Help | q Quit".to_string()
        }
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let registry = state.sheets();
    let sheets_text = if registry.is_empty() {
        "No sheets\npress a to add".to_string()
    } else {
        registry
            .labels()
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let prefix = if idx == state.sheet_index { "> " } else { "  " };
                format!("{prefix}{label}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let sheets = Paragraph::new(sheets_text)
        .block(Block::default().title("Sheets").borders(Borders::ALL));
    frame.render_widget(sheets, sections[0]);

    let list_area = sections[1];
    let block = Block::default().title("Players").borders(Borders::ALL);
    let inner = block.inner(list_area);
    frame.render_widget(block, list_area);
    if inner.height == 0 {
        return;
    }
    if state.players.is_empty() {
        let empty = Paragraph::new("No players").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let (start, end) = visible_range(
        state.selected_player,
        state.players.len(),
        inner.height as usize,
    );
    let lines: Vec<Line> = (start..end)
        .map(|idx| {
            let name = state.players[idx].as_str();
            if idx == state.selected_player {
                Line::styled(
                    format!("> {name}"),
                    Style::default().fg(Color::White).bg(Color::DarkGray),
                )
            } else {
                Line::raw(format!("  {name}"))
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_player_view(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(profile) = state.player_profile() else {
        render_empty(frame, area, state, "Player Statistics");
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Min(4),
        ])
        .split(area);

    let top = three_columns(rows[0]);
    render_metrics(
        frame,
        top[0],
        "Scoring",
        &[
            ("Goals", profile.goals.to_string()),
            ("Assists", profile.assists.to_string()),
        ],
    );
    render_metrics(
        frame,
        top[1],
        "Shooting",
        &[
            ("Shot Accuracy", format!("{:.1}%", profile.shooting.accuracy)),
            ("Total Shots", profile.shooting.total.to_string()),
            ("Shots on Target", profile.shooting.on_target.to_string()),
            ("Shots off Target", profile.shooting.off_target.to_string()),
        ],
    );
    render_metrics(
        frame,
        top[2],
        "Performance",
        &[
            ("Key Passes", profile.key_passes.to_string()),
            ("Dribbles", profile.dribbles.to_string()),
        ],
    );

    let middle = three_columns(rows[1]);
    render_metrics(
        frame,
        middle[0],
        "Tackles & Fouls",
        &[
            ("Tackles Won", profile.tackles_won.to_string()),
            ("Fouls Committed", profile.fouls_committed.to_string()),
            ("Fouls Won", profile.fouls_won.to_string()),
        ],
    );
    render_metrics(
        frame,
        middle[1],
        "Defensive Actions",
        &[("Clearances/Saves", profile.clearances_saves.to_string())],
    );
    render_metrics(
        frame,
        middle[2],
        "Possession",
        &[
            ("Ball Lost", profile.ball_lost.to_string()),
            ("Failed Passes", profile.failed_passes.to_string()),
            ("Crosses to Box", profile.crosses_to_box.to_string()),
        ],
    );

    frame.render_widget(radar_chart(&profile), rows[2]);
}

fn render_team_view(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.loaded.is_none() {
        render_empty(frame, area, state, "Team Statistics");
        return;
    }
    let summary = state.team_summary();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(7),
            Constraint::Length(6),
        ])
        .split(area);

    let top = three_columns(rows[0]);
    render_metrics(
        frame,
        top[0],
        "Goals & Assists",
        &[
            ("Total Team Goals", summary.goals.to_string()),
            ("Total Team Assists", summary.assists.to_string()),
        ],
    );
    render_metrics(
        frame,
        top[1],
        "Shooting",
        &[
            ("Team Shot Accuracy", format!("{:.1}%", summary.shooting.accuracy)),
            ("Total Shots", summary.shooting.total.to_string()),
        ],
    );
    render_metrics(
        frame,
        top[2],
        "Performance",
        &[
            ("Total Key Passes", summary.key_passes.to_string()),
            ("Total Dribbles", summary.dribbles.to_string()),
        ],
    );

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    frame.render_widget(
        performers_chart("Top Goalscorers", &summary.top_scorers),
        charts[0],
    );
    frame.render_widget(
        performers_chart("Top Assisters", &summary.top_assisters),
        charts[1],
    );

    render_team_defence(frame, rows[2], &summary);
}

fn render_team_defence(frame: &mut Frame, area: Rect, summary: &TeamSummary) {
    let cols = three_columns(area);
    render_metrics(
        frame,
        cols[0],
        "Team Tackles & Fouls",
        &[
            ("Total Tackles Won", summary.tackles_won.to_string()),
            ("Total Fouls Committed", summary.fouls_committed.to_string()),
            ("Total Fouls Won", summary.fouls_won.to_string()),
        ],
    );
    render_metrics(
        frame,
        cols[1],
        "Team Defensive Actions",
        &[("Total Clearances/Saves", summary.clearances_saves.to_string())],
    );
    render_metrics(
        frame,
        cols[2],
        "Team Possession",
        &[
            ("Total Ball Lost", summary.ball_lost.to_string()),
            ("Total Failed Passes", summary.failed_passes.to_string()),
            ("Total Crosses to Box", summary.crosses_to_box.to_string()),
        ],
    );
}

fn render_empty(frame: &mut Frame, area: Rect, state: &AppState, title: &str) {
    let (text, style) = match &state.last_error {
        Some(err) => (
            format!("{err}\n\nCheck the sheet id and credentials, then press r."),
            Style::default().fg(Color::Red),
        ),
        None => (
            "No data loaded".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn three_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area)
}

fn render_metrics(frame: &mut Frame, area: Rect, title: &str, metrics: &[(&str, String)]) {
    let lines: Vec<Line> = metrics
        .iter()
        .map(|(name, value)| {
            Line::from(vec![
                Span::raw(format!("{name}: ")),
                Span::styled(value.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();
    let paragraph = Paragraph::new(lines)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn radar_chart(profile: &PlayerProfile) -> BarChart<'static> {
    let bars: Vec<Bar> = profile
        .radar
        .iter()
        .map(|(name, value)| {
            Bar::default()
                .label(Line::from(name.to_string()))
                .value((*value).max(0) as u64)
                .text_value(value.to_string())
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();

    BarChart::default()
        .block(
            Block::default()
                .title(format!("{} - Performance Radar", profile.name))
                .borders(Borders::ALL),
        )
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .max(profile.radar_max().max(1) as u64)
}

fn performers_chart(title: &str, performers: &[Performer]) -> BarChart<'static> {
    let bars: Vec<Bar> = performers
        .iter()
        .map(|p| {
            Bar::default()
                .label(Line::from(p.name.clone()))
                .value(p.value.max(0) as u64)
                .text_value(p.value.to_string())
                .style(Style::default().fg(Color::Green))
        })
        .collect();
    let max = performers.iter().map(|p| p.value).max().unwrap_or(0).max(1);

    BarChart::default()
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .max(max as u64)
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_add_sheet_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(form) = state.form.as_ref() else {
        return;
    };
    let popup_area = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup_area);

    let marker = |field: FormField| if form.field == field { "> " } else { "  " };
    let text = [
        format!("{}Game Name:      {}", marker(FormField::Label), form.label),
        format!("{}Spreadsheet ID: {}", marker(FormField::SheetId), form.sheet_id),
        String::new(),
        format!("Range: {}", state.registry.default_range()),
        "Tab switch field | Enter add | Esc cancel".to_string(),
    ]
    .join("\n");

    let paragraph = Paragraph::new(text)
        .block(Block::default().title("Add New Game Sheet").borders(Borders::ALL));
    frame.render_widget(paragraph, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Team Stats - Help",
        "",
        "  Tab          Player / Team view",
        "  [ / ]        Previous / next sheet",
        "  j/k or ↑/↓   Select player",
        "  r            Reload sheet (skip cache)",
        "  a            Add game sheet",
        "  e            Export to xlsx",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
