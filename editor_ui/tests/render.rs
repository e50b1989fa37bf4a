use querypad_core::Theme;
use querypad_ui::{Container, EditorProps, SqlEditor};
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::style::Color;
use ratatui::Terminal;

fn create_test_terminal() -> Terminal<TestBackend> {
    Terminal::new(TestBackend::new(30, 6)).unwrap()
}

fn row(buffer: &Buffer, y: u16) -> String {
    (0..buffer.area.width)
        .map(|x| buffer[(x, y)].symbol().to_string())
        .collect()
}

fn draw(terminal: &mut Terminal<TestBackend>, editor: &mut SqlEditor) {
    terminal
        .draw(|frame| frame.render_widget(&mut *editor, frame.area()))
        .unwrap();
}

#[test]
fn test_editor_fills_area_without_banner() {
    let mut terminal = create_test_terminal();
    let mut editor = SqlEditor::new();
    editor.update(&EditorProps::new("SELECT 1"), Some(Container::new(30, 6)));
    draw(&mut terminal, &mut editor);

    let buffer = terminal.backend().buffer();
    assert_eq!(row(buffer, 0).trim_end(), "  1 SELECT 1");
    let error_bg = {
        let [r, g, b] = Theme::dark().chrome.error_background;
        Color::Rgb(r, g, b)
    };
    for y in 0..6 {
        assert_ne!(buffer[(0, y)].bg, error_bg);
    }
    assert_eq!(editor.cursor_screen_position(), Some((4, 0)));
}

#[test]
fn test_error_banner_below_editor() {
    let mut terminal = create_test_terminal();
    let mut editor = SqlEditor::new();
    let props = EditorProps::new("SELEC 1").with_error("syntax error");
    editor.update(&props, Some(Container::new(30, 6)));
    draw(&mut terminal, &mut editor);

    let buffer = terminal.backend().buffer();
    assert_eq!(row(buffer, 0).trim_end(), "  1 SELEC 1");
    assert_eq!(row(buffer, 5).trim_end(), "syntax error");
    // The banner takes a row from the editor surface.
    assert_eq!(editor.container(), Some(Container::new(30, 6)));
    assert_eq!(editor.editor().map(|e| e.visible_lines()), Some(5));

    // An empty error draws no banner.
    editor.update(&EditorProps::new("SELEC 1").with_error(""), None);
    draw(&mut terminal, &mut editor);
    let buffer = terminal.backend().buffer();
    assert!(!row(buffer, 5).contains("syntax error"));
    assert_eq!(editor.editor().map(|e| e.visible_lines()), Some(6));
}

#[test]
fn test_unmounted_editor_draws_only_banner() {
    let mut terminal = create_test_terminal();
    let mut editor = SqlEditor::new();
    editor.update(&EditorProps::new("SELECT 1").with_error("boom"), None);
    draw(&mut terminal, &mut editor);

    let buffer = terminal.backend().buffer();
    assert!(!editor.is_mounted());
    assert_eq!(row(buffer, 0).trim(), "");
    assert_eq!(row(buffer, 5).trim_end(), "boom");
    assert_eq!(editor.cursor_screen_position(), None);
}

#[test]
fn test_external_value_is_drawn() {
    let mut terminal = create_test_terminal();
    let mut editor = SqlEditor::new();
    let container = Some(Container::new(30, 6));
    editor.update(&EditorProps::new("SELECT 1"), container);
    draw(&mut terminal, &mut editor);

    editor.update(&EditorProps::new("SELECT 2;\nSELECT 3;"), container);
    draw(&mut terminal, &mut editor);

    let buffer = terminal.backend().buffer();
    assert_eq!(row(buffer, 0).trim_end(), "  1 SELECT 2;");
    assert_eq!(row(buffer, 1).trim_end(), "  2 SELECT 3;");
}
