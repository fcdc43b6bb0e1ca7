//! sqlgrid demo
//!
//! Loads a query result set (CSV path as the first argument, or built-in
//! sample data), renders it through the engine with the terminal host, and
//! demonstrates mutation previews, refresh broadcasting, visibility-driven
//! re-rendering, and recreation.
//!
//! Keys: j/k scroll · r refresh · R hint-refresh · p update preview ·
//! b batch preview · 1-9 expand batch row · a apply · c cancel ·
//! v toggle visibility · q quit

use anyhow::{anyhow, Result};
use chrono::Local;
use crossterm::event::{Event, KeyCode};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use sqlgrid::components::TermHost;
use sqlgrid::model::operation::SqlStatement;
use sqlgrid::tui::Tui;
use sqlgrid::{
    GridEngine, GridEvent, GridOptions, GridWidget, InstanceId, NodeId, OperationDescriptor,
    OperationKind, PreviewContext, PreviewId, QueryDescriptor, RenderContext, Row, SurfaceEvent,
    Value,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let rows = match std::env::args().nth(1) {
        Some(path) => load_csv(&path)?,
        None => sample_rows(),
    };

    let tui = Rc::new(RefCell::new(
        Tui::new()?.with_tick_rate(Duration::from_millis(50)),
    ));
    tui.borrow_mut().enter()?;

    let result = run_demo(tui.clone(), rows);

    tui.borrow_mut().exit()?;
    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
    Ok(())
}

fn run_demo(tui: Rc<RefCell<Tui>>, rows: Vec<Row>) -> Result<()> {
    let mut host = TermHost::with_tui(tui.clone());
    let root = host.arena.create_root();
    let grid_panel = host.arena.create_child(root);
    let preview_panel = host.arena.create_child(root);
    let mut engine = GridEngine::new(host);

    let refresh_count = Rc::new(Cell::new(0u32));
    let refreshed_at = Rc::new(RefCell::new(Local::now()));
    let applied = Rc::new(RefCell::new(None::<String>));

    let mut query = QueryDescriptor::new("SELECT * FROM files ORDER BY path");
    query.table = Some("files".to_string());
    query.scoped_to_current_document = true;

    let mut ctx = RenderContext::new(rows.clone(), query, grid_panel);
    ctx.options = Some(term_options());
    ctx.source_path = Some("/demo.md".to_string());
    let count = refresh_count.clone();
    let stamp = refreshed_at.clone();
    ctx.on_refresh = Some(Box::new(move || {
        count.set(count.get() + 1);
        *stamp.borrow_mut() = Local::now();
        Ok(())
    }));

    let grid_id = engine
        .render(ctx)?
        .ok_or_else(|| anyhow!("grid failed to build"))?;

    let mut preview: Option<PreviewId> = None;
    let mut hidden = false;
    let mut grid_height: usize = 20;

    loop {
        if let Some(widget) = engine.widget_mut(grid_id) {
            widget.set_viewport_rows(grid_height);
            if widget.visual_lines().is_empty() && !hidden {
                let _ = widget.render();
            }
        }

        let grid_lines: Vec<Line> = engine
            .widget(grid_id)
            .map(|w| w.visual_lines().to_vec())
            .unwrap_or_default();
        let preview_lines = collect_preview_lines(&engine, grid_id, preview_panel);
        let status = format!(
            " {} instance(s) · refreshes: {} · last {} {}{}",
            engine.count(),
            refresh_count.get(),
            refreshed_at.borrow().format("%H:%M:%S"),
            if hidden { "· grid hidden " } else { "" },
            match (&*applied.borrow(), &engine.host().status) {
                (Some(msg), _) => format!("· {}", msg),
                (None, Some(msg)) => format!("· {}", msg),
                (None, None) => String::new(),
            },
        );

        tui.borrow_mut().draw(|frame| {
            draw_frame(frame, &grid_lines, &preview_lines, &status, preview.is_some())
        })?;

        let event = tui.borrow().next_event()?;
        if let Some(event) = event {
            match event {
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') => break,
                    KeyCode::Char('j') | KeyCode::Down => {
                        if let Some(widget) = engine.widget_mut(grid_id) {
                            widget.scroll_by(1);
                            let _ = widget.render();
                        }
                        engine.handle_grid_event(grid_id, GridEvent::Scroll);
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        if let Some(widget) = engine.widget_mut(grid_id) {
                            widget.scroll_by(-1);
                            let _ = widget.render();
                        }
                        engine.handle_grid_event(grid_id, GridEvent::Scroll);
                    }
                    KeyCode::Char('r') => engine.refresh_all(None),
                    KeyCode::Char('R') => {
                        // Hint set without our document: the refresh is skipped.
                        let hint: HashSet<String> =
                            ["/other.md".to_string()].into_iter().collect();
                        engine.refresh_all(Some(&hint));
                    }
                    KeyCode::Char('p') if preview.is_none() => {
                        preview = Some(open_preview(
                            &mut engine,
                            build_update_op(&rows),
                            &rows,
                            preview_panel,
                            applied.clone(),
                        )?);
                    }
                    KeyCode::Char('b') if preview.is_none() => {
                        preview = Some(open_preview(
                            &mut engine,
                            build_batch_op(&rows),
                            &rows,
                            preview_panel,
                            applied.clone(),
                        )?);
                    }
                    KeyCode::Char('a') => {
                        if let Some(id) = preview {
                            if engine.apply_preview(id) {
                                preview = None;
                            }
                        }
                    }
                    KeyCode::Char('c') | KeyCode::Esc => {
                        if let Some(id) = preview.take() {
                            engine.cancel_preview(id);
                        }
                    }
                    KeyCode::Char('v') => {
                        hidden = !hidden;
                        engine.handle_surface_event(SurfaceEvent::VisibilityChanged {
                            instance: grid_id,
                            intersecting: !hidden,
                        });
                    }
                    KeyCode::Char(digit @ '1'..='9') => {
                        // Expand a batch summary row. No logical index is
                        // passed, exercising the pixel-offset fallback.
                        let offset = digit as u16 - b'1' as u16;
                        for id in engine.instance_ids() {
                            if id == grid_id {
                                continue;
                            }
                            let Some(mount) = engine.instance_mount(id) else {
                                continue;
                            };
                            if engine.host().arena.contains(preview_panel, mount) {
                                engine.handle_grid_event(
                                    id,
                                    GridEvent::Click {
                                        row: None,
                                        column: None,
                                        y_offset: Some(offset),
                                    },
                                );
                                break;
                            }
                        }
                    }
                    _ => {}
                },
                Event::Resize(_, h) => {
                    grid_height = h.saturating_sub(7) as usize;
                    engine.resize(None);
                }
                _ => {}
            }
        }

        engine.tick(Instant::now());
    }

    engine.cleanup();
    Ok(())
}

/// Terminal host measures in character cells: one row is one line.
fn term_options() -> GridOptions {
    GridOptions {
        row_height: 1,
        ..GridOptions::default()
    }
}

/// Lines of every preview grid mounted under the preview panel.
fn collect_preview_lines(
    engine: &GridEngine<TermHost>,
    grid_id: InstanceId,
    preview_panel: NodeId,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for text in engine.host().blocks_within(preview_panel) {
        for line in text.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::from(""));
    }
    for id in engine.instance_ids() {
        if id == grid_id {
            continue;
        }
        let Some(mount) = engine.instance_mount(id) else {
            continue;
        };
        if engine.host().arena.contains(preview_panel, mount) {
            if let Some(widget) = engine.widget(id) {
                lines.extend(widget.visual_lines().to_vec());
                lines.push(Line::from(""));
            }
        }
    }
    lines
}

fn draw_frame(
    frame: &mut Frame,
    grid_lines: &[Line<'static>],
    preview_lines: &[Line<'static>],
    status: &str,
    preview_open: bool,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let panels = if preview_open {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[0])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(chunks[0])
    };

    let grid = Paragraph::new(grid_lines.to_vec()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Results ")
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(grid, panels[0]);

    if preview_open && panels.len() > 1 {
        let preview = Paragraph::new(preview_lines.to_vec()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Pending changes ")
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(preview, panels[1]);
    }

    frame.render_widget(
        Paragraph::new(status.to_string()).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );

    let help = Line::from(vec![
        Span::styled("j/k", Style::default().fg(Color::Cyan)),
        Span::raw(" Scroll  "),
        Span::styled("r/R", Style::default().fg(Color::Cyan)),
        Span::raw(" Refresh  "),
        Span::styled("p/b", Style::default().fg(Color::Cyan)),
        Span::raw(" Preview  "),
        Span::styled("1-9", Style::default().fg(Color::Cyan)),
        Span::raw(" Expand  "),
        Span::styled("a/c", Style::default().fg(Color::Cyan)),
        Span::raw(" Apply/Cancel  "),
        Span::styled("v", Style::default().fg(Color::Cyan)),
        Span::raw(" Hide  "),
        Span::styled("q", Style::default().fg(Color::Cyan)),
        Span::raw(" Quit"),
    ]);
    frame.render_widget(
        Paragraph::new(help).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        ),
        chunks[2],
    );
}

fn open_preview(
    engine: &mut GridEngine<TermHost>,
    op: OperationDescriptor,
    rows: &[Row],
    preview_panel: NodeId,
    applied: Rc<RefCell<Option<String>>>,
) -> Result<PreviewId> {
    let relevant: Vec<String> = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();
    let table = op.table.clone();

    let ctx = PreviewContext {
        mount: preview_panel,
        relevant_columns: relevant,
        source_path: Some("/demo.md".to_string()),
        on_apply: Box::new(move |op| {
            *applied.borrow_mut() = Some(format!(
                "applied {} on `{}`",
                op.kind.verb(),
                if op.table.is_empty() { &table } else { &op.table }
            ));
            Ok(())
        }),
        on_cancel: None,
    };
    Ok(engine.render_preview(op, ctx)?)
}

/// Pending update: mark the first row's status as done.
fn build_update_op(rows: &[Row]) -> OperationDescriptor {
    let before = rows.to_vec();
    let mut after = rows.to_vec();
    if let Some(first) = after.first_mut() {
        first.insert("status".to_string(), Value::String("done".to_string()));
    }
    OperationDescriptor {
        kind: OperationKind::Update,
        table: "files".to_string(),
        primary_keys: vec!["path".to_string()],
        before,
        after,
        statements: vec![SqlStatement {
            sql: "UPDATE files SET status = ? WHERE path = ?".to_string(),
            params: vec![],
        }],
        nested: vec![],
    }
}

/// Pending batch: insert one row, update one, delete the last.
fn build_batch_op(rows: &[Row]) -> OperationDescriptor {
    let mut inserted = Row::new();
    inserted.insert("path".to_string(), Value::String("/new.md".to_string()));
    inserted.insert("name".to_string(), Value::String("new".to_string()));
    inserted.insert("status".to_string(), Value::String("open".to_string()));

    let insert = OperationDescriptor {
        kind: OperationKind::Insert,
        table: "files".to_string(),
        primary_keys: vec!["path".to_string()],
        before: vec![],
        after: vec![inserted],
        statements: vec![SqlStatement {
            sql: "INSERT INTO files (path, name, status) VALUES (?, ?, ?)".to_string(),
            params: vec![],
        }],
        nested: vec![],
    };

    let delete = OperationDescriptor {
        kind: OperationKind::Delete,
        table: "files".to_string(),
        primary_keys: vec!["path".to_string()],
        before: rows.last().cloned().into_iter().collect(),
        after: vec![],
        statements: vec![SqlStatement {
            sql: "DELETE FROM files WHERE path = ?".to_string(),
            params: vec![],
        }],
        nested: vec![],
    };

    OperationDescriptor {
        kind: OperationKind::Multi,
        table: String::new(),
        primary_keys: vec![],
        before: vec![],
        after: vec![],
        statements: vec![],
        nested: vec![insert, build_update_op(rows), delete],
    }
}

/// Load a result set from a CSV file, parsing scalar types where possible.
fn load_csv(path: &str) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.clone(), parse_cell(cell)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn parse_cell(cell: &str) -> Value {
    if let Ok(n) = cell.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = cell.parse::<f64>() {
        return Value::from(f);
    }
    match cell {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    }
}

fn sample_rows() -> Vec<Row> {
    let data = [
        ("/notes/roadmap.md", "roadmap", "open", 2),
        ("/notes/retro.md", "retro", "done", 1),
        ("/notes/ideas.md", "ideas", "open", 3),
        ("/notes/budget.md", "budget", "blocked", 5),
        ("/notes/launch.md", "launch", "open", 1),
    ];
    data.iter()
        .map(|(path, name, status, priority)| {
            let mut row = Row::new();
            row.insert("path".to_string(), Value::String(path.to_string()));
            row.insert("name".to_string(), Value::String(name.to_string()));
            row.insert("status".to_string(), Value::String(status.to_string()));
            row.insert("priority".to_string(), Value::from(*priority as i64));
            row
        })
        .collect()
}
