use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};

use flashvocab::app::{App, AppScreen, SearchKind, now_ms};
use flashvocab::audio::{CommandRecorder, CommandSpeaker};
use flashvocab::config::Config;
use flashvocab::engine::due::BUCKET_COUNT;
use flashvocab::engine::scheduler::Rating;
use flashvocab::item::ReviewableItem;
use flashvocab::event::{AppEvent, EventHandler};
use flashvocab::logging::{default_log_dir, init_file_logging};
use flashvocab::lookup::LookupService;
use flashvocab::lookup::cache::{CachedLookup, DiskCache};
use flashvocab::lookup::gemini::{GeminiClient, GeminiConfig};
use flashvocab::session::study::{
    CardFace, PronunciationStatus, StudyMode, StudySession, StudyState,
};
use flashvocab::store::json_store::JsonStore;
use flashvocab::ui::components::bucket_bar::BucketBar;
use flashvocab::ui::components::item_card::{CardView, ItemCard};
use flashvocab::ui::components::progress_bar::ProgressBar;
use flashvocab::ui::components::quiz_options::QuizOptions;
use flashvocab::ui::components::session_summary::SessionSummary;
use flashvocab::ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use flashvocab::ui::theme::Theme;

#[derive(Parser)]
#[command(
    name = "flashvocab",
    version,
    about = "Terminal vocabulary and sentence flashcards with spaced repetition"
)]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Gemini model used for lookups")]
    model: Option<String>,

    #[arg(long, value_name = "PATH", help = "Write all collections to a JSON file and exit")]
    export: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Replace all collections from a JSON export and exit")]
    import: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_file_logging(&default_log_dir());

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: could not read config, using defaults: {e:#}");
        Config::default()
    });
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    let themes = Theme::available_themes();
    let theme_names: Vec<&str> = themes.iter().map(String::as_str).collect();
    config.validate(&theme_names);

    let store = JsonStore::new().context("could not open the data directory")?;
    let recovery = store.check_interrupted_import();
    if !recovery.restored.is_empty() {
        eprintln!(
            "Recovered from an interrupted import; restored {}.",
            recovery.restored.join(", ")
        );
    } else if !recovery.discarded.is_empty() {
        eprintln!("Removed leftover backups from an interrupted import.");
    }

    if let Some(path) = cli.export {
        store.export_to(&path)?;
        println!("Exported collections to {}", path.display());
        return Ok(());
    }
    if let Some(path) = cli.import {
        store.import_from(&path)?;
        println!("Imported collections from {}", path.display());
        return Ok(());
    }

    let theme: &'static Theme = Box::leak(Box::new(Theme::load(&config.theme).unwrap_or_default()));

    let gemini = GeminiClient::new(GeminiConfig::from_config(&config));
    let lookup_ready = gemini.is_available();
    let disk_cache = if config.lookup_cache_enabled {
        DiskCache::new()
    } else {
        None
    };
    let lookup: Arc<dyn LookupService> = Arc::new(CachedLookup::new(gemini, disk_cache));
    let speaker = CommandSpeaker::new(config.tts_command.clone());
    let recorder = CommandRecorder::new(config.record_command.clone(), &config.record_mime_type);

    let events = EventHandler::new(Duration::from_millis(100));
    let api_key_env = config.api_key_env.clone();
    let mut app = App::new(
        config,
        theme,
        store,
        lookup,
        Box::new(speaker),
        Box::new(recorder),
        events.sender(),
    );
    if !lookup_ready {
        app.notice = Some(format!("Set {api_key_env} to enable lookups."));
    }

    tracing::info!(theme = %app.theme.name, "starting flashvocab");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = %err, "exiting after error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            other => app.handle_event(other),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    app.notice = None;
    if app.quick.is_some() {
        handle_quick_key(app, key);
        return;
    }
    match app.screen {
        AppScreen::Search => handle_search_key(app, key),
        AppScreen::Collection => handle_collection_key(app, key),
        AppScreen::Study => handle_study_key(app, key),
    }
}

fn handle_quick_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.close_quick_lookup(),
        KeyCode::F(2) => app.toggle_save_quick_result(),
        KeyCode::Char('s') if ctrl => app.toggle_save_quick_result(),
        KeyCode::Char('v') => app.speak_quick_result(),
        KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') | KeyCode::Char('j') => app.quick_next(),
        KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Char('k') => {
            app.quick_prev()
        }
        KeyCode::Enter => app.quick_lookup_selected(),
        _ => {}
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Tab => app.toggle_search_kind(),
        KeyCode::Char('l') if ctrl => app.open_quick_lookup(),
        KeyCode::F(2) => app.toggle_save_result(),
        KeyCode::Char('s') if ctrl => app.toggle_save_result(),
        KeyCode::Char('v') if ctrl => app.speak_search_result(),
        _ => app.search_input(key, Instant::now()),
    }
}

fn handle_collection_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('/') | KeyCode::Esc => app.go_to_search(),
        KeyCode::Down | KeyCode::Char('j') => app.collection_next(),
        KeyCode::Up | KeyCode::Char('k') => app.collection_prev(),
        KeyCode::Tab => app.cycle_bucket_filter(),
        KeyCode::Char('a') => app.set_bucket_filter(None),
        KeyCode::Char(ch @ '0'..='4') => {
            let bucket = ch as usize - '0' as usize;
            if bucket < BUCKET_COUNT {
                app.set_bucket_filter(Some(bucket));
            }
        }
        KeyCode::Char('x') | KeyCode::Delete => app.remove_selected(),
        KeyCode::Char('l') => app.open_quick_lookup(),
        KeyCode::Char('s') | KeyCode::Enter => app.start_study(),
        _ => {}
    }
}

fn handle_study_key(app: &mut App, key: KeyEvent) {
    let Some(study) = app.study.as_ref() else {
        app.go_to_collection();
        return;
    };
    let state = study.state();
    let mode = study.mode();
    let answered = study.item_state().answered;
    let can_rate = study.can_rate();
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if key.code == KeyCode::Esc {
        app.exit_study();
        return;
    }

    match state {
        StudyState::Empty | StudyState::Complete | StudyState::Exited => {
            if key.code == KeyCode::Enter || key.code == KeyCode::Char('q') {
                app.exit_study();
            }
            return;
        }
        StudyState::ChoosingMode => {
            if let KeyCode::Char(ch) = key.code
                && let Some(mode) = StudyMode::from_digit(ch)
            {
                app.with_study(|s| s.select_mode(mode));
            }
            return;
        }
        StudyState::Transitioning => return,
        StudyState::Reviewing => {}
    }

    // Free text entry owns the keyboard until the answer is checked.
    if mode == Some(StudyMode::Typing) && !answered {
        match key.code {
            KeyCode::Char('r') if ctrl => app.toggle_recording(Instant::now()),
            KeyCode::Char('v') if ctrl => app.with_study(|s| s.speak_current()),
            KeyCode::Enter => app.with_study(|s| {
                s.check_typing();
            }),
            KeyCode::Backspace => app.with_study(|s| s.backspace()),
            KeyCode::Char(ch) if !ctrl => app.with_study(|s| s.type_char(ch)),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char(ch @ '1'..='9') if mode == Some(StudyMode::Quiz) && !answered => {
            let index = ch as usize - '1' as usize;
            app.with_study(|s| {
                s.select_option(index);
            });
        }
        KeyCode::Char(ch) if can_rate && Rating::from_digit(ch).is_some() => {
            if let Some(rating) = Rating::from_digit(ch) {
                app.study_rate(rating, Instant::now());
            }
        }
        KeyCode::Char(' ') | KeyCode::Enter if mode == Some(StudyMode::Flashcard) => {
            app.with_study(|s| s.flip());
        }
        KeyCode::Char('v') => app.with_study(|s| s.speak_current()),
        KeyCode::Char('r') => app.toggle_recording(Instant::now()),
        KeyCode::Char('a') => app.toggle_auto_read(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    let layout = AppLayout::new(area);
    render_header(frame, app, layout.header);

    match app.screen {
        AppScreen::Search => render_search(frame, app, &layout),
        AppScreen::Collection => render_collection(frame, app, &layout),
        AppScreen::Study => render_study(frame, app, &layout),
    }

    if app.quick.is_some() {
        render_quick_lookup(frame, app, layout.main.union(layout.sidebar.unwrap_or(layout.main)));
    }
}

fn render_quick_lookup(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let Some(quick) = app.quick.as_ref() else {
        return;
    };
    let colors = &app.theme.colors;
    let popup = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);

    let block = Block::bordered()
        .title(" Quick lookup ")
        .border_style(Style::default().fg(colors.border_focused()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let mut picks: Vec<Span> = Vec::new();
    for (i, word) in quick.candidates.iter().enumerate() {
        let style = if i == quick.selected {
            Style::default()
                .fg(colors.bg())
                .bg(colors.accent())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.fg())
        };
        picks.push(Span::styled(format!(" {word} "), style));
        picks.push(Span::raw(" "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(picks)).wrap(Wrap { trim: true }),
        rows[0],
    );

    match &quick.result {
        Some(word) if !quick.is_loading() => {
            let item = ReviewableItem::Word(word.clone());
            let title = if app.quick_result_saved() { "saved" } else { "not saved" };
            frame.render_widget(
                ItemCard::new(&item, CardView::Full, app.theme).title(title),
                rows[1],
            );
        }
        _ => {
            let (text, color) = if quick.is_loading() {
                ("Looking up...", colors.muted())
            } else if let Some(error) = quick.error {
                (error, colors.error())
            } else {
                ("Pick a word and press Enter.", colors.muted())
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
                    .wrap(Wrap { trim: false }),
                rows[1],
            );
        }
    }

    let hints = pack_hint_lines(
        &["[h/l] Pick", "[Enter] Look up", "[Ctrl-s] Save/Unsave", "[v] Speak", "[Esc] Close"],
        rows[2].width as usize,
    );
    if let Some(line) = hints.into_iter().next() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(line, Style::default().fg(colors.muted())))),
            rows[2],
        );
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let screen = match app.screen {
        AppScreen::Search => "Search",
        AppScreen::Collection => "Collection",
        AppScreen::Study => "Study",
    };
    let info = format!(
        " {screen} | {} words | {} sentences | {} due",
        app.collections.words().len(),
        app.collections.sentences().len(),
        app.collections.due_count(now_ms()),
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " flashvocab ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(info, Style::default().fg(colors.muted()).bg(colors.header_bg())),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, hints: &[&str]) {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = match &app.notice {
        Some(notice) => vec![Line::from(Span::styled(
            format!("  {notice}"),
            Style::default().fg(colors.warning()),
        ))],
        None => pack_hint_lines(hints, area.width as usize)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.muted()))))
            .collect(),
    };
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_search(frame: &mut ratatui::Frame, app: &App, layout: &AppLayout) {
    let colors = &app.theme.colors;
    let area = Rect {
        width: layout.main.width + layout.sidebar.map_or(0, |s| s.width),
        ..layout.main
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let (before, cursor, after) = app.search.input.render_parts();
    let cursor_text = cursor.map_or(" ".to_string(), |c| c.to_string());
    let input = Paragraph::new(Line::from(vec![
        Span::styled(before.to_string(), Style::default().fg(colors.fg())),
        Span::styled(
            cursor_text,
            Style::default().fg(colors.bg()).bg(colors.accent()),
        ),
        Span::styled(after.to_string(), Style::default().fg(colors.fg())),
    ]))
    .block(
        Block::bordered()
            .title(format!(" Look up {} ", app.search.kind.label().to_lowercase()))
            .border_style(Style::default().fg(colors.border_focused())),
    );
    frame.render_widget(input, rows[0]);

    if let Some(result) = &app.search.result {
        let title = format!(
            "{} · {}",
            result.kind().as_str(),
            if app.search_result_saved() { "saved" } else { "not saved" }
        );
        frame.render_widget(
            ItemCard::new(result, CardView::Full, app.theme).title(&title),
            rows[1],
        );
    } else {
        let (text, color) = if app.search.is_loading() {
            ("Looking up...".to_string(), colors.muted())
        } else if let Some(error) = app.search.error {
            (error.to_string(), colors.error())
        } else {
            let hint = match app.search.kind {
                SearchKind::Word => "Type an English or Vietnamese word.",
                SearchKind::Sentence => "Type a sentence in English or Vietnamese.",
            };
            (hint.to_string(), colors.muted())
        };
        let placeholder = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .block(Block::bordered().border_style(Style::default().fg(colors.border())))
            .wrap(Wrap { trim: false });
        frame.render_widget(placeholder, rows[1]);
    }

    render_footer(
        frame,
        app,
        layout.footer,
        &[
            "[Enter] Look up",
            "[Tab] Word/Sentence",
            "[Ctrl-s] Save/Unsave",
            "[Ctrl-v] Speak",
            "[Ctrl-l] Word lookup",
            "[Esc] Collection",
        ],
    );
}

fn render_collection(frame: &mut ratatui::Frame, app: &App, layout: &AppLayout) {
    let colors = &app.theme.colors;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(layout.main);

    let buckets = app.collections.buckets();
    frame.render_widget(
        BucketBar::new(&buckets, app.collection_view.bucket_filter, app.theme),
        rows[0],
    );

    let items = app.collection_items();
    let title = match app.collection_view.bucket_filter {
        Some(b) => format!(" {} · {} items ", buckets[b].label(), items.len()),
        None => format!(" All · {} items ", items.len()),
    };
    let list_block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(colors.border()));
    let list_inner = list_block.inner(rows[1]);
    frame.render_widget(list_block, rows[1]);

    if items.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  Nothing here yet. Press / to search and save items.",
            Style::default().fg(colors.muted()),
        )));
        frame.render_widget(empty, list_inner);
    } else {
        let visible = list_inner.height.max(1) as usize;
        let selected = app.collection_view.selected;
        let offset = selected.saturating_sub(visible - 1);
        let lines: Vec<Line> = items
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(i, item)| {
                let is_selected = i == selected;
                let style = if is_selected {
                    Style::default()
                        .fg(colors.accent())
                        .bg(colors.selected_bg())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Line::from(vec![
                    Span::styled(if is_selected { " > " } else { "   " }, style),
                    Span::styled(item.primary_text().to_string(), style),
                    Span::styled(
                        format!("  {}", item.meaning()),
                        Style::default().fg(colors.muted()),
                    ),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), list_inner);
    }

    if let Some(sidebar) = layout.sidebar
        && let Some(item) = items.get(app.collection_view.selected)
    {
        frame.render_widget(ItemCard::new(item, CardView::Full, app.theme), sidebar);
    }

    render_footer(
        frame,
        app,
        layout.footer,
        &[
            "[s] Study due",
            "[j/k] Move",
            "[Tab] Filter",
            "[0-4/a] Level",
            "[x] Remove",
            "[l] Word lookup",
            "[/] Search",
            "[q] Quit",
        ],
    );
}

fn render_study(frame: &mut ratatui::Frame, app: &App, layout: &AppLayout) {
    let Some(study) = app.study.as_ref() else {
        return;
    };
    let area = Rect {
        width: layout.main.width + layout.sidebar.map_or(0, |s| s.width),
        ..layout.main
    };

    match study.state() {
        StudyState::Empty | StudyState::Complete | StudyState::Exited => {
            let centered = centered_rect(50, 50, area);
            frame.render_widget(SessionSummary::new(study.summary(), app.theme), centered);
            render_footer(frame, app, layout.footer, &["[Enter/Esc] Back to collection"]);
        }
        StudyState::ChoosingMode => {
            render_mode_picker(frame, app, study, area);
            render_footer(frame, app, layout.footer, &["[1-3] Choose mode", "[Esc] Back"]);
        }
        StudyState::Reviewing | StudyState::Transitioning => {
            render_review(frame, app, study, area);
            let hints = study_hints(study);
            render_footer(frame, app, layout.footer, &hints);
        }
    }
}

fn render_mode_picker<R: rand::Rng>(
    frame: &mut ratatui::Frame,
    app: &App,
    study: &StudySession<R>,
    area: Rect,
) {
    let colors = &app.theme.colors;
    let centered = centered_rect(40, 40, area);
    let block = Block::bordered()
        .title(format!(" {} due ", study.queue().len()))
        .border_style(Style::default().fg(colors.accent()));
    let inner = block.inner(centered);
    frame.render_widget(block, centered);

    let mut lines = vec![Line::from("")];
    for (i, mode) in StudyMode::ALL.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", i + 1), Style::default().fg(colors.accent())),
            Span::styled(mode.label(), Style::default().fg(colors.fg())),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_review<R: rand::Rng>(
    frame: &mut ratatui::Frame,
    app: &App,
    study: &StudySession<R>,
    area: Rect,
) {
    let colors = &app.theme.colors;
    let Some(item) = study.current() else {
        return;
    };
    let state = study.item_state();
    let mode = study.mode();

    let answer_height = match mode {
        Some(StudyMode::Typing) => 3,
        Some(StudyMode::Quiz) => state.quiz_options.len() as u16 + 2,
        _ => 0,
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(answer_height),
            Constraint::Length(3),
        ])
        .split(area);

    frame.render_widget(
        ProgressBar::new(study.queue().position(), study.queue().len(), app.theme),
        rows[0],
    );

    let view = match mode {
        Some(StudyMode::Flashcard) if state.face == CardFace::Front => CardView::Front,
        Some(StudyMode::Typing) | Some(StudyMode::Quiz) if !state.answered => CardView::Prompt,
        _ => CardView::Back,
    };
    frame.render_widget(ItemCard::new(item, view, app.theme), rows[1]);

    match mode {
        Some(StudyMode::Typing) => {
            let (border, label) = match state.correct {
                Some(true) => (colors.success(), " Correct "),
                Some(false) => (colors.error(), " Not quite "),
                None => (colors.border_focused(), " Your answer "),
            };
            let input = Paragraph::new(Line::from(Span::styled(
                format!("{}_", state.input),
                Style::default().fg(colors.fg()),
            )))
            .block(
                Block::bordered()
                    .title(label)
                    .border_style(Style::default().fg(border)),
            );
            frame.render_widget(input, rows[2]);
        }
        Some(StudyMode::Quiz) => {
            let marks = (0..state.quiz_options.len())
                .map(|i| study.option_mark(i))
                .collect();
            frame.render_widget(
                QuizOptions::new(&state.quiz_options, marks, app.theme),
                rows[2],
            );
        }
        _ => {}
    }

    let mut status: Vec<Span> = Vec::new();
    if let Some(remaining) = study.recording_remaining(Instant::now()) {
        status.push(Span::styled(
            format!(" Recording... {:.1}s ", remaining.as_secs_f64()),
            Style::default().fg(colors.error()).add_modifier(Modifier::BOLD),
        ));
    }
    match &state.pronunciation {
        PronunciationStatus::Idle => {}
        PronunciationStatus::Checking => {
            status.push(Span::styled(" Checking pronunciation...", Style::default().fg(colors.muted())));
        }
        PronunciationStatus::Ready(feedback) => {
            let color = if feedback.is_correct {
                colors.success()
            } else {
                colors.warning()
            };
            status.push(Span::styled(
                format!(" {:.0}/100 ", feedback.score),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
            status.push(Span::styled(
                format!("heard \"{}\"  {}", feedback.detected_speech, feedback.feedback_text),
                Style::default().fg(colors.fg()),
            ));
        }
        PronunciationStatus::Failed => {
            status.push(Span::styled(" Pronunciation check failed.", Style::default().fg(colors.error())));
        }
    }
    if study.can_rate() {
        status.push(Span::styled("  Rate: ", Style::default().fg(colors.muted())));
        for (i, rating) in Rating::ALL.iter().enumerate() {
            status.push(Span::styled(
                format!("[{}] {}  ", i + 1, rating.label()),
                Style::default().fg(colors.accent()),
            ));
        }
    }
    let status_line = Paragraph::new(Line::from(status))
        .block(Block::bordered().border_style(Style::default().fg(colors.border())))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_line, rows[3]);
}

fn study_hints<R: rand::Rng>(study: &StudySession<R>) -> Vec<&'static str> {
    let state = study.item_state();
    let mut hints = Vec::new();
    match study.mode() {
        Some(StudyMode::Flashcard) => hints.push("[Space] Flip"),
        Some(StudyMode::Typing) if !state.answered => {
            hints.push("[Enter] Check");
            hints.push("[Ctrl-v] Speak");
            hints.push("[Ctrl-r] Record");
        }
        Some(StudyMode::Quiz) if !state.answered => hints.push("[1-4] Choose"),
        _ => {}
    }
    if study.can_rate() {
        hints.push("[1-4] Rate");
    }
    let typing_open = study.mode() == Some(StudyMode::Typing) && !state.answered;
    if !typing_open {
        hints.push("[v] Speak");
        hints.push(if study.is_recording() { "[r] Stop" } else { "[r] Record" });
        hints.push(if study.auto_read() {
            "[a] Auto-read on"
        } else {
            "[a] Auto-read off"
        });
    }
    hints.push("[Esc] End session");
    hints
}
