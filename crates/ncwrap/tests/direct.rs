//! Direct mode: styled text at the terminal cursor, no planes.

use ncwrap::prelude::*;
use ncwrap_engine::DirectMonitor;

fn direct(rows: u32, cols: u32) -> (Direct, DirectMonitor) {
    let engine = SoftDirect::headless(rows, cols);
    let monitor = engine.monitor();
    (Direct::init(engine).unwrap(), monitor)
}

#[test]
fn colours_and_text_reach_the_screen() {
    let (mut direct, monitor) = direct(4, 20);
    assert!(monitor.is_started());
    assert_eq!(direct.dim_yx(), (4, 20));
    assert_eq!((direct.rows(), direct.columns()), (4, 20));

    direct.set_fg_rgb8(0xff, 0x80, 0x00).unwrap();
    direct.set_bg_packed(0xAB_00_00_FF).unwrap();
    assert_eq!(direct.put_str("hi").unwrap(), 2);
    direct.flush().unwrap();
    assert_eq!(monitor.flushes(), 1);

    let screen = monitor.screen();
    assert_eq!(screen.row_text(0).trim_end(), "hi");
    let cell = screen.get(0, 0).unwrap();
    assert_eq!(cell.channels.fg_rgb(), Color::rgb(0xff, 0x80, 0x00));
    assert_eq!(cell.channels.bg_rgb(), Color::BLUE);
    assert_eq!(direct.cursor_yx().unwrap(), (0, 2));
}

#[test]
fn channel_write_leaves_current_colours() {
    let (mut direct, monitor) = direct(2, 10);
    direct.set_fg_rgb(Color::WHITE).unwrap();
    let ink = Channels::from_colors(Color::RED, Color::GREEN);
    direct.put_str_channels(ink, "x").unwrap();
    direct.put_str("y").unwrap();

    let screen = monitor.screen();
    assert_eq!(screen.get(0, 0).unwrap().channels.bg_rgb(), Color::GREEN);
    assert_eq!(screen.get(0, 1).unwrap().channels.fg_rgb(), Color::WHITE);
    assert!(direct.channels().bg_default());
}

#[test]
fn styled_write_moves_then_restores() {
    let (mut direct, monitor) = direct(4, 20);
    direct.set_fg_rgb(Color::WHITE).unwrap();
    direct.set_styles(Style::ITALIC).unwrap();
    let before = direct.channels();

    let ink = Ink::fg(Color::RED).on(Color::BLUE).styled(Style::BOLD);
    assert_eq!(direct.put_str_styled(Some(2), Some(3), ink, "hot").unwrap(), 3);
    assert_eq!(direct.channels(), before);
    assert_eq!(direct.styles(), Style::ITALIC);
    assert!(direct.channels().bg_default());

    let cell = monitor.screen().get(2, 3).cloned().unwrap();
    assert_eq!(cell.egc, "h");
    assert_eq!(cell.styles, Style::BOLD);
    assert_eq!(cell.channels.fg_rgb(), Color::RED);
    assert_eq!(cell.channels.bg_rgb(), Color::BLUE);
    assert_eq!(direct.cursor_yx().unwrap(), (2, 6));
}

#[test]
fn styled_write_restores_even_when_the_move_fails() {
    let (mut direct, _monitor) = direct(4, 20);
    direct.set_styles(Style::UNDERLINE).unwrap();
    let err = direct
        .put_str_styled(Some(9), None, Ink::default().styled(Style::BOLD), "x")
        .unwrap_err();
    assert!(matches!(err, DirectError::Engine(_)), "{err}");
    assert_eq!(direct.styles(), Style::UNDERLINE);
}

#[test]
fn relative_cursor_moves() {
    let (mut direct, _monitor) = direct(10, 40);
    direct.cursor_move_yx(Some(5), Some(10)).unwrap();
    direct.cursor_up(2).unwrap();
    direct.cursor_right(3).unwrap();
    assert_eq!(direct.cursor_yx().unwrap(), (3, 13));
    direct.cursor_down(1).unwrap();
    direct.cursor_left(13).unwrap();
    assert_eq!(direct.cursor_yx().unwrap(), (4, 0));
    direct.cursor_move_yx(None, Some(7)).unwrap();
    assert_eq!(direct.cursor_yx().unwrap(), (4, 7));
}

#[test]
fn cursor_visibility() {
    let (mut direct, monitor) = direct(2, 10);
    direct.cursor_disable().unwrap();
    assert!(!monitor.cursor_visible());
    direct.cursor_enable().unwrap();
    assert!(monitor.cursor_visible());
}

#[test]
fn stop_is_final() {
    let (mut direct, monitor) = direct(2, 10);
    direct.stop().unwrap();
    assert!(direct.is_stopped());
    assert!(!monitor.is_started());
    assert!(matches!(direct.put_str("x"), Err(DirectError::Stopped)));
    assert!(matches!(direct.cursor_yx(), Err(DirectError::Stopped)));
    assert!(matches!(direct.stop(), Err(DirectError::Stopped)));
}

#[test]
fn dropping_stops_the_terminal() {
    let (mut direct, monitor) = direct(2, 10);
    direct.cursor_disable().unwrap();
    drop(direct);
    assert!(!monitor.is_started());
    assert!(monitor.cursor_visible());
}
