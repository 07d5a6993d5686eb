//! Plane identity: one wrapper per live native plane, and loud failure
//! after release.

use ncwrap::prelude::*;
use ncwrap_engine::EngineMonitor;
use proptest::prelude::*;

fn session(rows: u32, cols: u32) -> (Session, EngineMonitor) {
    let engine = SoftEngine::headless(rows, cols);
    let monitor = engine.monitor();
    let session = Session::init(engine, &InitOptions::default()).unwrap();
    (session, monitor)
}

#[test]
fn wrapping_a_live_handle_returns_the_same_wrapper() {
    let (session, _monitor) = session(24, 80);
    let root = session.std_plane();
    assert!(session.std_plane().ptr_eq(&root));
    assert!(session.wrap_plane(root.handle()).ptr_eq(&root));
    assert_eq!(root.owner(), Owner::Engine);

    let child = Plane::create_at(&root, 5, 5, 6, 30).unwrap();
    assert_eq!(child.owner(), Owner::Wrapper);
    assert!(session.registry().contains(child.handle()));
    assert!(session.wrap_plane(child.handle()).ptr_eq(&child));
    assert!(child.parent().unwrap().ptr_eq(&root));
}

#[test]
#[should_panic(expected = "invalidated plane")]
fn accessor_after_destroy_panics() {
    let (session, _monitor) = session(24, 80);
    let child = Plane::create_at(&session.std_plane(), 0, 0, 2, 2).unwrap();
    child.destroy().unwrap();
    let _ = child.rows();
}

#[test]
fn second_destroy_reports_invalidated() {
    let (session, monitor) = session(24, 80);
    let child = Plane::create_at(&session.std_plane(), 0, 0, 2, 2).unwrap();
    let handle = child.handle();
    let alias = child.clone();

    child.destroy().unwrap();
    assert!(!monitor.is_plane_live(handle));
    assert!(!alias.is_valid());
    assert!(matches!(alias.destroy(), Err(PlaneError::Invalidated)));
    assert!(matches!(child.try_handle(), Err(PlaneError::Invalidated)));
    assert!(!session.registry().contains(handle));
    assert_eq!(monitor.stats().plane_destroys, 1);
}

#[test]
fn standard_plane_cannot_be_destroyed() {
    let (session, monitor) = session(24, 80);
    let root = session.std_plane();
    assert!(matches!(
        root.destroy(),
        Err(PlaneError::NotOwner(Owner::Engine))
    ));
    assert!(root.is_valid());
    assert!(monitor.is_plane_live(root.handle()));
}

#[test]
fn dropping_the_last_owning_clone_destroys_the_plane() {
    let (session, monitor) = session(24, 80);
    let child = Plane::create_at(&session.std_plane(), 0, 0, 2, 2).unwrap();
    let handle = child.handle();
    let alias = child.clone();

    drop(child);
    assert!(monitor.is_plane_live(handle));
    drop(alias);
    assert!(!monitor.is_plane_live(handle));
    assert!(!session.registry().contains(handle));
}

#[test]
fn transferred_plane_survives_its_wrapper() {
    let (session, monitor) = session(24, 80);
    let child = Plane::create_at(&session.std_plane(), 1, 1, 2, 2).unwrap();
    let handle = child.handle();
    child.transfer_ownership().unwrap();
    assert!(!child.owns_resource());
    assert_eq!(child.owner(), Owner::Engine);
    assert!(matches!(
        child.destroy(),
        Err(PlaneError::NotOwner(Owner::Engine))
    ));

    drop(child);
    assert!(monitor.is_plane_live(handle));
    assert!(!session.registry().contains(handle));

    let again = session.wrap_plane(handle);
    assert_eq!(again.owner(), Owner::Engine);
    assert_eq!(again.yx(), (1, 1));
}

#[test]
fn ownership_cannot_be_taken_back() {
    let (session, monitor) = session(24, 80);
    let root = session.std_plane();
    assert!(matches!(
        root.transfer_ownership(),
        Err(PlaneError::NotOwner(Owner::Engine))
    ));
    assert_eq!(root.owner(), Owner::Engine);
    assert!(!root.owns_resource());

    let child = Plane::create_at(&root, 0, 0, 1, 1).unwrap();
    child.transfer_ownership().unwrap();
    assert!(matches!(
        child.transfer_ownership(),
        Err(PlaneError::NotOwner(Owner::Engine))
    ));
    assert!(matches!(child.destroy(), Err(PlaneError::NotOwner(_))));
    assert_eq!(monitor.stats().plane_destroys, 0);
}

#[test]
fn reused_handle_gets_a_fresh_wrapper() {
    let (session, _monitor) = session(24, 80);
    let root = session.std_plane();
    let first = Plane::create_at(&root, 0, 0, 1, 1).unwrap();
    let handle = first.handle();
    first.destroy().unwrap();

    let second = Plane::create_at(&root, 0, 0, 1, 1).unwrap();
    assert_eq!(second.handle(), handle);
    assert!(!second.ptr_eq(&first));
    assert!(!first.is_valid());
    assert!(session.wrap_plane(handle).ptr_eq(&second));
}

#[test]
fn invalidate_keeps_the_native_plane() {
    let (session, monitor) = session(24, 80);
    let child = Plane::create_at(&session.std_plane(), 0, 0, 1, 1).unwrap();
    let handle = child.handle();
    child.invalidate();
    child.invalidate();
    assert!(!child.is_valid());
    assert!(monitor.is_plane_live(handle));
    assert!(!session.wrap_plane(handle).ptr_eq(&child));
}

#[test]
fn geometry_accessors() {
    let (session, _monitor) = session(24, 80);
    let root = session.std_plane();
    assert_eq!(root.dim_yx(), (24, 80));

    let child = Plane::create_at(&root, 5, 5, 6, 30).unwrap();
    assert_eq!((child.rows(), child.columns()), (6, 30));
    assert_eq!(child.bottom_y(), 10);
    assert_eq!(child.right_x(), 34);
    assert!(child.contains(5, 5));
    assert!(child.contains(10, 34));
    assert!(!child.contains(11, 5));
    assert!(!child.contains(5, 35));

    let grandchild = Plane::create_at(&child, 1, 1, 2, 2).unwrap();
    assert_eq!(grandchild.yx(), (1, 1));
    assert_eq!(grandchild.abs_yx(), (6, 6));
    assert!(grandchild.abs_contains(7, 7));
    assert!(!grandchild.abs_contains(8, 7));
}

proptest! {
    #[test]
    fn registry_tracks_exactly_the_live_wrappers(keep in proptest::collection::vec(any::<bool>(), 1..12)) {
        let (session, monitor) = session(24, 80);
        let root = session.std_plane();
        let mut live = Vec::new();
        for (i, keep) in keep.iter().enumerate() {
            let plane = Plane::create_at(&root, i as i32, 0, 1, 1).unwrap();
            if *keep {
                live.push(plane);
            }
        }
        // The standard plane is cached too.
        prop_assert_eq!(session.registry().len(), live.len() + 1);
        prop_assert_eq!(monitor.live_plane_count(), live.len() + 1);
        for plane in &live {
            prop_assert!(session.wrap_plane(plane.handle()).ptr_eq(plane));
        }
    }
}
