//! Session lifecycle, drawing through wrappers and the input loop.

use std::ops::ControlFlow;

use ncwrap::prelude::*;
use ncwrap_engine::EngineMonitor;

fn session(rows: u32, cols: u32) -> (Session, EngineMonitor) {
    let engine = SoftEngine::headless(rows, cols);
    let monitor = engine.monitor();
    let session = Session::init(engine, &InitOptions::default()).unwrap();
    (session, monitor)
}

fn blend(color: Color) -> Channels {
    Channels::combine(Channel::DEFAULT, Channel::from_color_alpha(color, Alpha::Blend))
}

#[test]
fn gradient_plane_renders_at_its_offset() {
    let (session, monitor) = session(24, 80);
    let root = session.std_plane();
    assert_eq!(session.term_dim_yx(), (24, 80));
    assert_eq!(root.dim_yx(), (24, 80));

    let child = Plane::create_at(&root, 5, 5, 6, 30).unwrap();
    child.set_base(" ", Style::NONE, blend(Color::BLUE)).unwrap();
    let filled = child
        .gradient(
            0,
            0,
            6,
            30,
            " ",
            Style::NONE,
            [
                blend(Color::BLUE),
                blend(Color::GREEN),
                blend(Color::RED),
                blend(Color::WHITE),
            ],
        )
        .unwrap();
    assert_eq!(filled, 180);
    session.render().unwrap();

    assert_eq!((child.rows(), child.columns()), (6, 30));
    assert_eq!(child.abs_yx(), (5, 5));
    assert_eq!(monitor.stats().renders, 1);
    assert_eq!(session.at(5, 5).unwrap().channels.bg_rgb(), Color::BLUE);
}

#[test]
fn plane_channels_pack_colour_and_alpha() {
    let (session, _monitor) = session(4, 10);
    let plane = Plane::create_at(&session.std_plane(), 0, 0, 1, 1).unwrap();
    assert_eq!(plane.channels(), Channels::DEFAULT);

    plane.set_fg_rgb(Color::RED);
    plane.set_fg_alpha(Alpha::Blend).unwrap();
    plane.set_bg_rgb(Color::BLACK);
    let channels = plane.channels();
    assert_eq!(channels.fg_channel().raw(), 0x50FF_0000);
    assert_eq!(channels.bg_channel().raw(), 0x4000_0000);
    assert_eq!(plane.fg_rgb(), Color::RED);
    assert!(!channels.bg_default());

    plane.reverse_channels();
    assert_eq!(plane.bg_rgb(), Color::RED);
    assert_eq!(plane.fg_rgb(), Color::BLACK);
}

#[test]
fn styled_write_restores_the_plane_ink() {
    let (session, _monitor) = session(4, 20);
    let plane = Plane::create_at(&session.std_plane(), 0, 0, 2, 20).unwrap();
    plane.set_channels(Channels::from_colors(Color::WHITE, Color::BLACK));
    let before = plane.channels();

    let ink = Ink::fg(Color::RED).on(Color::BLUE).styled(Style::BOLD);
    assert_eq!(plane.put_str_styled(0, 0, ink, "hot").unwrap(), 3);
    assert_eq!(plane.channels(), before);
    assert_eq!(plane.styles(), Style::NONE);

    let cell = plane.at(0, 0).unwrap();
    assert_eq!(cell.egc, "h");
    assert_eq!(cell.channels.fg_rgb(), Color::RED);
    assert_eq!(cell.channels.bg_rgb(), Color::BLUE);
    assert!(cell.styles.contains(Style::BOLD));

    plane.put_str_yx(1, 0, "cold").unwrap();
    let plain = plane.at(1, 0).unwrap();
    assert_eq!(plain.channels.fg_rgb(), Color::WHITE);
    assert_eq!(plain.styles, Style::NONE);
}

#[test]
fn aligned_text_is_centred() {
    let (session, monitor) = session(3, 11);
    let root = session.std_plane();
    root.put_str_aligned(Some(1), Align::Center, "abc").unwrap();
    session.render().unwrap();
    assert_eq!(monitor.frame().row_text(1).trim_end(), "    abc");
}

#[test]
fn stop_invalidates_every_wrapper() {
    let (session, monitor) = session(24, 80);
    let root = session.std_plane();
    let child = Plane::create_at(&root, 0, 0, 2, 2).unwrap();
    let child_handle = child.handle();

    session.stop().unwrap();
    assert!(session.is_stopped());
    assert!(!monitor.is_started());
    assert!(!root.is_valid());
    assert!(!child.is_valid());
    assert!(session.registry().is_empty());
    assert!(!monitor.is_plane_live(child_handle));

    assert!(matches!(child.destroy(), Err(PlaneError::Invalidated)));
    assert!(matches!(session.render(), Err(SessionError::Stopped)));
    assert!(matches!(session.try_std_plane(), Err(SessionError::Stopped)));
    assert!(matches!(session.stop(), Err(SessionError::Stopped)));

    let destroys = monitor.stats().plane_destroys;
    drop(child);
    assert_eq!(monitor.stats().plane_destroys, destroys);
}

#[test]
fn dropping_the_session_stops_the_engine() {
    let (session, monitor) = session(24, 80);
    let child = Plane::create_at(&session.std_plane(), 0, 0, 2, 2).unwrap();
    assert!(monitor.is_started());
    drop(session);
    assert!(!monitor.is_started());
    assert!(!child.is_valid());
    drop(child);
}

#[test]
fn run_loop_feeds_events_until_the_handler_breaks() {
    let (session, monitor) = session(24, 80);
    for c in ['a', 'b', 'q', 'z'] {
        monitor.push_input(InputEvent::key(c));
    }

    let mut seen = Vec::new();
    session
        .run_loop(|_, event| {
            if event.is_char('q') {
                return ControlFlow::Break(());
            }
            seen.push(event.key);
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(seen, [Key::Char('a'), Key::Char('b')]);

    // The unread event is still queued.
    assert_eq!(session.get_nonblocking().unwrap().map(|e| e.key), Some(Key::Char('z')));
}

#[test]
fn run_loop_returns_when_input_closes() {
    let (session, monitor) = session(24, 80);
    monitor.push_input(InputEvent::key(Key::Up));
    monitor.close_input();

    let mut count = 0;
    session
        .run_loop(|_, _| {
            count += 1;
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(session.get_blocking().unwrap(), None);
}

#[test]
fn handler_may_stop_the_session() {
    let (session, monitor) = session(24, 80);
    monitor.push_input(InputEvent::key('x'));
    monitor.push_input(InputEvent::key('y'));

    let mut count = 0;
    session
        .run_loop(|session, _| {
            count += 1;
            session.stop().unwrap();
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(count, 1);
    assert!(session.is_stopped());
}

#[test]
fn mice_and_cursor_toggle() {
    let (session, monitor) = session(24, 80);
    session.mice_disable().unwrap();
    assert!(!monitor.mice_enabled());
    session.mice_enable().unwrap();
    assert!(monitor.mice_enabled());

    assert_eq!(session.cursor_yx(), None);
    session.cursor_enable(2, 3).unwrap();
    assert_eq!(session.cursor_yx(), Some((2, 3)));
    session.cursor_disable().unwrap();
    assert_eq!(session.cursor_yx(), None);
}

#[test]
fn wide_text_width() {
    let (session, _monitor) = session(24, 80);
    assert_eq!(session.str_width("abc"), 3);
    assert_eq!(session.str_width("日本"), 4);
}
