//! Drawing the editor surface and the error banner.

use querypad_core::{Compartment, Editor, Theme};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Clear, Paragraph, Widget, Wrap};

use crate::wrap::{char_width, display_width, segment_for_col, wrap_line, Segment};

/// Areas of one render: the editor surface and, when an error is shown,
/// the banner right below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLayout {
    pub editor: Rect,
    pub banner: Option<Rect>,
}

/// Splits `area` between editor and error banner. The banner is as tall as
/// the wrapped error text, capped at a third of the area (but at least one
/// row).
pub fn split(area: Rect, error: Option<&str>) -> ViewLayout {
    let Some(error) = error.filter(|e| !e.is_empty()) else {
        return ViewLayout {
            editor: area,
            banner: None,
        };
    };

    let needed: usize = error
        .lines()
        .map(|line| {
            let chars: Vec<char> = line.chars().collect();
            wrap_line(&chars, area.width as usize, 1).len()
        })
        .sum::<usize>()
        .max(1);
    let cap = (area.height / 3).max(1);
    let height = (needed.min(u16::MAX as usize) as u16).min(cap).min(area.height);

    ViewLayout {
        editor: Rect {
            height: area.height - height,
            ..area
        },
        banner: Some(Rect {
            y: area.y + area.height - height,
            height,
            ..area
        }),
    }
}

/// Draws the error text verbatim on the banner colours.
pub fn render_error_banner(error: &str, theme: &Theme, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
        return;
    }
    let style = Style::default()
        .fg(rgb(theme.chrome.error_foreground))
        .bg(rgb(theme.chrome.error_background));
    Clear.render(area, buf);
    Paragraph::new(error)
        .style(style)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

/// Draws the visible part of the document. When `follow_cursor` is set
/// the scroll offset is first adjusted so the caret row is on screen.
/// Returns the caret's screen position when it is visible.
pub fn render_editor(
    editor: &mut Editor,
    area: Rect,
    buf: &mut Buffer,
    follow_cursor: bool,
) -> Option<(u16, u16)> {
    if area.is_empty() {
        return None;
    }

    let config = editor.configuration();
    let wrapping = config.flag(Compartment::LINE_WRAPPING);
    let line_numbers = config.flag(Compartment::LINE_NUMBERS);
    let active_line = config.flag(Compartment::ACTIVE_LINE);
    let tab_size = config.tab_size();

    let total_lines = editor.buffer().len_lines();
    let gutter_width = if line_numbers {
        (digits(total_lines).max(3) as u16 + 1).min(area.width)
    } else {
        0
    };
    let text_area = Rect {
        x: area.x + gutter_width,
        width: area.width - gutter_width,
        ..area
    };
    let text_width = text_area.width as usize;
    let height = area.height as usize;

    let cursor = editor.cursor_position();
    let cursor_chars = line_chars(editor, cursor.line);

    if follow_cursor {
        let first = first_visible_line(editor, cursor.line, text_width, height, wrapping, tab_size);
        editor.set_scroll_offset(first);
    }
    let first_line = editor.scroll_offset();

    // Without wrapping every line shares one horizontal offset that keeps
    // the caret column visible.
    let skip = if wrapping || text_width == 0 {
        0
    } else {
        horizontal_skip(&cursor_chars, cursor.col, text_width, tab_size)
    };

    let theme = editor.theme();
    let chrome = &theme.chrome;
    let selection = editor.selected_range();
    let bracket = editor.bracket_match();

    Clear.render(area, buf);
    buf.set_style(
        area,
        Style::default()
            .fg(rgb(theme.foreground))
            .bg(rgb(theme.background)),
    );
    if gutter_width > 0 {
        buf.set_style(
            Rect {
                width: gutter_width,
                ..area
            },
            Style::default()
                .fg(rgb(chrome.gutter_foreground))
                .bg(rgb(chrome.gutter_background)),
        );
    }

    let mut caret = None;
    let mut y = area.y;
    let bottom = area.y + area.height;
    let mut line = first_line;

    while y < bottom && line < total_lines {
        let chars = line_chars(editor, line);
        let line_start = editor.buffer().line_start(line);
        let segments = layout_line(&chars, text_width, wrapping, skip, tab_size);
        let is_cursor_line = line == cursor.line;
        let row_bg = if active_line && is_cursor_line {
            chrome.active_line
        } else {
            theme.background
        };

        for (index, segment) in segments.iter().enumerate() {
            if y >= bottom {
                break;
            }

            buf.set_style(
                Rect {
                    y,
                    height: 1,
                    ..text_area
                },
                Style::default().bg(rgb(row_bg)),
            );

            if gutter_width > 0 && index == 0 {
                let fg = if is_cursor_line {
                    chrome.gutter_active
                } else {
                    chrome.gutter_foreground
                };
                let number = format!(
                    "{:>width$} ",
                    line + 1,
                    width = gutter_width.saturating_sub(1) as usize
                );
                buf.set_stringn(
                    area.x,
                    y,
                    number,
                    gutter_width as usize,
                    Style::default()
                        .fg(rgb(fg))
                        .bg(rgb(chrome.gutter_background)),
                );
            }

            let mut x = text_area.x;
            let right = text_area.x + text_area.width;
            for col in segment.start..segment.end {
                let ch = chars[col];
                let width = char_width(ch, tab_size);
                if x as usize + width > right as usize {
                    break;
                }

                let idx = line_start + col;
                let mut bg = row_bg;
                if let Some(m) = bracket {
                    if m.bracket == idx || m.partner == Some(idx) {
                        bg = if m.is_matched() {
                            chrome.bracket_match
                        } else {
                            chrome.bracket_mismatch
                        };
                    }
                }
                if selection.is_some_and(|(from, to)| idx >= from && idx < to) {
                    bg = chrome.selection;
                }

                let style = Style::default()
                    .fg(rgb(editor.highlighter().color_at(line, col)))
                    .bg(rgb(bg));
                buf.set_stringn(x, y, glyph(ch, width), width, style);
                x += width as u16;
            }

            let on_this_row = is_cursor_line
                && if wrapping {
                    segment_for_col(&segments, cursor.col) == index
                } else {
                    cursor.col >= segment.start
                };
            if on_this_row && text_width > 0 {
                let offset = display_width(&chars[segment.start..cursor.col], tab_size);
                let cx = (text_area.x as usize + offset).min(right as usize - 1) as u16;
                if let Some(cell) = buf.cell_mut((cx, y)) {
                    cell.set_bg(rgb(chrome.cursor));
                }
                caret = Some((cx, y));
            }

            y += 1;
        }
        line += 1;
    }

    caret
}

fn layout_line(
    chars: &[char],
    width: usize,
    wrapping: bool,
    skip: usize,
    tab_size: usize,
) -> Vec<Segment> {
    if wrapping {
        wrap_line(chars, width, tab_size)
    } else {
        vec![Segment::new(skip.min(chars.len()), chars.len())]
    }
}

/// Smallest scroll offset at or after the current one that still shows
/// the caret row, or the caret line itself when it is above the view.
fn first_visible_line(
    editor: &Editor,
    cursor_line: usize,
    width: usize,
    height: usize,
    wrapping: bool,
    tab_size: usize,
) -> usize {
    let mut first = editor.scroll_offset().min(cursor_line);
    if !wrapping {
        if cursor_line >= first + height {
            first = cursor_line + 1 - height;
        }
        return first;
    }

    let rows = |line: usize| wrap_line(&line_chars(editor, line), width, tab_size).len();
    let cursor = editor.cursor_position();
    let cursor_segments = wrap_line(&line_chars(editor, cursor_line), width, tab_size);
    let cursor_row = segment_for_col(&cursor_segments, cursor.col) + 1;

    let mut used: usize = (first..cursor_line).map(&rows).sum::<usize>() + cursor_row;
    while used > height && first < cursor_line {
        used -= rows(first);
        first += 1;
    }
    first
}

fn horizontal_skip(chars: &[char], col: usize, width: usize, tab_size: usize) -> usize {
    let col = col.min(chars.len());
    let mut skip = 0;
    while skip < col && display_width(&chars[skip..col], tab_size) >= width {
        skip += 1;
    }
    skip
}

fn line_chars(editor: &Editor, line: usize) -> Vec<char> {
    editor
        .buffer()
        .line(line)
        .map(|text| text.chars().collect())
        .unwrap_or_default()
}

fn glyph(ch: char, width: usize) -> String {
    match ch {
        '\t' => " ".repeat(width),
        c if c.is_control() => '\u{FFFD}'.to_string(),
        c => c.to_string(),
    }
}

fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

fn rgb([r, g, b]: querypad_core::Color) -> Color {
    Color::Rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use querypad_core::{Configuration, Selection, Setting};

    fn row_text(buf: &Buffer, y: u16) -> String {
        let area = buf.area;
        (area.x..area.x + area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    fn draw(editor: &mut Editor, width: u16, height: u16) -> (Buffer, Option<(u16, u16)>) {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        let caret = render_editor(editor, area, &mut buf, true);
        (buf, caret)
    }

    #[test]
    fn test_split_without_error() {
        let area = Rect::new(0, 0, 40, 12);
        assert_eq!(split(area, None).banner, None);
        assert_eq!(split(area, Some("")).banner, None);
        assert_eq!(split(area, None).editor, area);
    }

    #[test]
    fn test_split_with_error() {
        let area = Rect::new(0, 0, 40, 12);
        let layout = split(area, Some("no such table: users"));
        assert_eq!(layout.editor, Rect::new(0, 0, 40, 11));
        assert_eq!(layout.banner, Some(Rect::new(0, 11, 40, 1)));

        // Long errors wrap but never take more than a third.
        let long = "x".repeat(400);
        let layout = split(area, Some(&long));
        assert_eq!(layout.banner.map(|b| b.height), Some(4));
    }

    #[test]
    fn test_gutter_and_text() {
        let mut editor = Editor::new("SELECT 1;\nSELECT 2;", Configuration::default());
        let (buf, caret) = draw(&mut editor, 20, 3);
        assert_eq!(row_text(&buf, 0), "  1 SELECT 1;       ");
        assert_eq!(row_text(&buf, 1), "  2 SELECT 2;       ");
        assert_eq!(row_text(&buf, 2).trim(), "");
        assert_eq!(caret, Some((4, 0)));
    }

    #[test]
    fn test_without_line_numbers() {
        let config = Configuration::default().with(Compartment::LINE_NUMBERS, Setting::Flag(false));
        let mut editor = Editor::new("SELECT 1", config);
        let (buf, _) = draw(&mut editor, 10, 1);
        assert_eq!(row_text(&buf, 0), "SELECT 1  ");
    }

    #[test]
    fn test_soft_wrap_rows() {
        let mut editor = Editor::new("SELECT name FROM users", Configuration::default());
        let (buf, _) = draw(&mut editor, 18, 3);
        assert_eq!(row_text(&buf, 0), "  1 SELECT name   ");
        assert_eq!(row_text(&buf, 1), "    FROM users    ");
    }

    #[test]
    fn test_no_wrap_scrolls_horizontally() {
        let config = Configuration::default()
            .with(Compartment::LINE_WRAPPING, Setting::Flag(false))
            .with(Compartment::LINE_NUMBERS, Setting::Flag(false));
        let mut editor = Editor::new("abcdefghij", config);
        editor.set_selection(Selection::new(10));
        let (buf, caret) = draw(&mut editor, 5, 1);
        assert_eq!(row_text(&buf, 0), "ghij ");
        assert_eq!(caret, Some((4, 0)));
    }

    #[test]
    fn test_follow_cursor_scrolls_down() {
        let doc = (1..=10).map(|n| format!("SELECT {n};")).collect::<Vec<_>>().join("\n");
        let mut editor = Editor::new(&doc, Configuration::default());
        let end = editor.buffer().len_chars();
        editor.set_selection(Selection::new(end));
        let (buf, caret) = draw(&mut editor, 20, 3);
        assert_eq!(editor.scroll_offset(), 7);
        assert!(row_text(&buf, 2).contains("SELECT 10;"));
        assert_eq!(caret.map(|(_, y)| y), Some(2));
    }

    #[test]
    fn test_selection_background() {
        let mut editor = Editor::new("SELECT 1", Configuration::default());
        editor.set_selection(Selection::with_range(0, 6));
        let (buf, _) = draw(&mut editor, 20, 1);
        let selection = rgb(editor.theme().chrome.selection);
        assert_eq!(buf[(4, 0)].bg, selection);
        assert_eq!(buf[(9, 0)].bg, selection);
        assert_ne!(buf[(10, 0)].bg, selection);
    }

    #[test]
    fn test_bracket_match_highlight() {
        let mut editor = Editor::new("(1)", Configuration::default());
        editor.set_selection(Selection::new(1));
        let (buf, _) = draw(&mut editor, 10, 1);
        let matched = rgb(editor.theme().chrome.bracket_match);
        assert_eq!(buf[(4, 0)].bg, matched);
        assert_eq!(buf[(6, 0)].bg, matched);
    }

    #[test]
    fn test_error_banner_text() {
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);
        render_error_banner("near \"SELEC\": syntax error", &Theme::dark(), area, &mut buf);
        assert_eq!(row_text(&buf, 0), "near \"SELEC\": syntax error    ");
        assert_eq!(buf[(0, 0)].bg, rgb(Theme::dark().chrome.error_background));
    }

    #[test]
    fn test_digits() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(1234), 4);
    }
}
