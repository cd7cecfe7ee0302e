use crate::app::{App, CELL_PIXELS_X, CELL_PIXELS_Y};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};
use tui_polymap::canvas::{RasterCanvas, Rgba};
use tui_polymap::map::{FrameStats, LabelAnchor};

const BACKGROUND: Rgba = Rgba::rgb(10, 14, 26);

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let stats = render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, &stats, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) -> FrameStats {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Polygons ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Snapshot of the view for this redraw, sized to the map area
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * CELL_PIXELS_X;
    viewport.height = inner.height as usize * CELL_PIXELS_Y;

    let mut canvas = RasterCanvas::new(viewport.width, viewport.height);
    canvas.clear(BACKGROUND);
    let rendered = app.layer.render(&mut canvas, &viewport);

    let cursor_pos = app.mouse_pos.and_then(|(col, row)| {
        let cx = col.checked_sub(inner.x)?;
        let cy = row.checked_sub(inner.y)?;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    let map_widget = MapWidget {
        canvas,
        labels: rendered.labels,
        cursor_pos,
    };
    frame.render_widget(map_widget, inner);

    rendered.stats
}

/// Paints the raster with half blocks (top pixel as foreground, bottom as
/// background) and overlays labels
struct MapWidget {
    canvas: RasterCanvas,
    labels: Vec<LabelAnchor>,
    cursor_pos: Option<(u16, u16)>,
}

fn to_color(pixel: Rgba) -> Color {
    Color::Rgb(pixel.r, pixel.g, pixel.b)
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            let top = self.canvas.row(row as usize * CELL_PIXELS_Y);
            let bottom = self.canvas.row(row as usize * CELL_PIXELS_Y + 1);
            let y = area.y + row;

            for (col, (upper, lower)) in top.iter().zip(bottom).enumerate().take(area.width as usize) {
                let x = area.x + col as u16;
                buf[(x, y)]
                    .set_char('▀')
                    .set_fg(to_color(*upper))
                    .set_bg(to_color(*lower));
            }
        }

        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

        for label in &self.labels {
            let lx = (label.position.x / CELL_PIXELS_X as f64) as u16;
            let ly = (label.position.y / CELL_PIXELS_Y as f64) as u16;
            if ly >= area.height || lx >= area.width {
                continue;
            }

            // Centre on the anchor, clipped to the map area
            let width = label.text.chars().count().min(24) as u16;
            let start = lx.saturating_sub(width / 2);
            let y = area.y + ly;

            for (i, ch) in label.text.chars().take(width as usize).enumerate() {
                let x = start + i as u16;
                if x < area.width {
                    buf[(area.x + x, y)].set_char(ch).set_style(label_style);
                }
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

fn toggle(label: &'static str, on: bool) -> Span<'static> {
    Span::styled(
        label,
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, stats: &FrameStats, area: Rect) {
    let options = app.layer.options();
    let settings = &app.layer.settings;

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        // Toggle indicators
        toggle("[c]ull ", options.culling),
        toggle("[s]implify ", options.simplify),
        toggle("[H]Q ", options.high_quality),
        toggle("[f]ill ", settings.show_fill),
        toggle("[b]order ", settings.show_borders),
        toggle("[L]abels ", settings.show_labels),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}/{} polys ", stats.drawn, stats.total),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("{}/{} pts ", stats.vertices_drawn, stats.vertices_in),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}
