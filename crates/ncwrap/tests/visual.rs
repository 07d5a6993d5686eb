//! Loading images and blitting them onto planes.

use image::{Rgba, RgbaImage};
use ncwrap::prelude::*;
use ncwrap_engine::EngineMonitor;

fn session(rows: u32, cols: u32) -> (Session, EngineMonitor) {
    let engine = SoftEngine::headless(rows, cols);
    let monitor = engine.monitor();
    let session = Session::init(engine, &InitOptions::default()).unwrap();
    (session, monitor)
}

fn one_by_one() -> BlitOptions {
    BlitOptions {
        blitter: Blitter::OneByOne,
        ..BlitOptions::default()
    }
}

#[test]
fn missing_file_yields_none() {
    let (session, monitor) = session(24, 80);
    assert!(Visual::from_file(&session, "/nonexistent/ncwrap/missing.png").is_none());
    assert_eq!(monitor.stats().visual_creates, 0);
}

#[test]
fn png_from_disk_blits_to_a_new_owned_plane() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stripe.png");
    let mut img = RgbaImage::new(4, 2);
    for (x, _y, px) in img.enumerate_pixels_mut() {
        *px = if x < 2 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        };
    }
    img.save(&path).unwrap();

    let (session, monitor) = session(24, 80);
    let visual = Visual::from_file(&session, &path).expect("png should load");
    assert_eq!(visual.dim_yx().unwrap(), (2, 4));

    let plane = visual
        .blit(&BlitOptions {
            y: 2,
            x: 3,
            ..one_by_one()
        })
        .unwrap();
    assert_eq!(plane.owner(), Owner::Wrapper);
    assert_eq!(plane.dim_yx(), (2, 4));
    assert!(plane.parent().unwrap().ptr_eq(&session.std_plane()));

    session.render().unwrap();
    assert_eq!(session.at(2, 3).unwrap().channels.bg_rgb(), Color::RED);
    assert_eq!(session.at(3, 6).unwrap().channels.bg_rgb(), Color::BLUE);

    let handle = plane.handle();
    drop(plane);
    assert!(!monitor.is_plane_live(handle));
}

#[test]
fn blit_onto_returns_the_target_wrapper() {
    let (session, monitor) = session(24, 80);
    let target = Plane::create_at(&session.std_plane(), 0, 0, 4, 4).unwrap();
    let pixels = [0u8, 255, 0, 255];
    let visual = Visual::from_rgba(&session, 1, 1, &pixels).unwrap();

    let drawn = visual.blit_onto(&target, &one_by_one()).unwrap();
    assert!(drawn.ptr_eq(&target));
    assert_eq!(drawn.at(0, 0).unwrap().channels.bg_rgb(), Color::GREEN);

    let child = visual
        .blit_onto(
            &target,
            &BlitOptions {
                flags: BlitFlags::CHILDPLANE,
                ..one_by_one()
            },
        )
        .unwrap();
    assert!(!child.ptr_eq(&target));
    assert!(child.parent().unwrap().ptr_eq(&target));
    assert_eq!(child.owner(), Owner::Wrapper);

    let handle = visual.handle();
    drop(visual);
    assert!(!monitor.is_visual_live(handle));
    assert!(target.is_valid());
    assert!(child.is_valid());
}

#[test]
fn visual_after_stop_is_released() {
    let (session, monitor) = session(24, 80);
    let visual = Visual::from_rgba(&session, 1, 1, &[1, 2, 3, 255]).unwrap();
    session.stop().unwrap();
    assert!(matches!(visual.dim_yx(), Err(VisualError::Released)));
    assert!(matches!(visual.blit(&one_by_one()), Err(VisualError::Released)));
    drop(visual);
    assert_eq!(monitor.stats().visual_destroys, 0);
    assert!(Visual::from_file(&session, "anything.png").is_none());
}

#[test]
fn short_pixel_buffer_is_rejected() {
    let (session, _monitor) = session(24, 80);
    let err = Visual::from_rgba(&session, 2, 2, &[0; 8]).unwrap_err();
    assert!(matches!(err, VisualError::Engine(_)), "{err}");
}
