//! End-to-end tests for the surface lifecycle and watchdog recovery.

use scrim_harness::Session;
use scrim_surface::{SurfaceEvent, SurfacePhase};
use std::time::{Duration, Instant};

const WATCHDOG_INTERVAL: Duration = Duration::from_millis(50);

fn session() -> Session {
    Session::with_watchdog_interval(WATCHDOG_INTERVAL)
}

/// Poll until `predicate` holds or the deadline passes.
fn wait_for(predicate: impl Fn() -> bool, deadline: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}

#[test]
fn test_first_surface_lifecycle() {
    let session = session();
    let controller = &session.controller;

    assert_eq!(controller.phase(), SurfacePhase::Uninitialized);

    controller.on_surface_created(session.surface.clone());
    assert_eq!(controller.phase(), SurfacePhase::SurfaceReady);
    assert!(!controller.can_render());
    // The first surface needs no forced present.
    assert!(!controller.renderer().take_needs_swap());

    controller.on_surface_changed(100, 200);
    assert_eq!(controller.phase(), SurfacePhase::Rendering);
    assert!(controller.can_render());
    assert!(controller.on_draw_frame());

    assert_eq!(session.engine.context_losses(), 1);
    assert_eq!(session.engine.resize_calls(), vec![(100, 200)]);
    // Initial sizing is not a resize event.
    assert!(session.events.try_recv().is_err());
}

#[test]
fn test_resize_event_emitted_exactly_once() {
    let session = session();
    let controller = &session.controller;

    controller.on_surface_created(session.surface.clone());
    controller.on_surface_changed(100, 200);
    controller.on_surface_changed(150, 200);
    controller.on_surface_changed(150, 200);

    assert_eq!(
        session.events.try_recv(),
        Ok(SurfaceEvent::Resized {
            width: 150,
            height: 200
        })
    );
    assert!(session.events.try_recv().is_err());

    // The engine still saw every viewport update.
    assert_eq!(
        session.engine.resize_calls(),
        vec![(100, 200), (150, 200), (150, 200)]
    );
}

#[test]
fn test_surface_recreation_forces_swap() {
    let session = session();
    let controller = &session.controller;

    controller.on_surface_created(session.surface.clone());
    controller.on_surface_changed(100, 200);

    controller.on_surface_destroyed();
    assert_eq!(controller.phase(), SurfacePhase::SurfaceLost);
    assert!(!controller.can_render());

    controller.on_surface_created(session.surface.clone());
    // The replacement surface must present even an unchanged frame.
    assert!(controller.renderer().take_needs_swap());
    assert_eq!(session.engine.context_losses(), 2);

    // Re-arming the cold-start token suppresses the forced present.
    controller.on_surface_destroyed();
    controller.clear_first_surface();
    controller.on_surface_created(session.surface.clone());
    assert!(!controller.renderer().take_needs_swap());
}

#[test]
fn test_watchdog_recovers_a_silently_dropped_surface() {
    let session = session();
    let controller = session.controller.clone();

    controller.on_surface_created(session.surface.clone());
    controller.on_surface_changed(100, 200);
    assert!(controller.can_render());
    controller.resume();

    // The pipeline dies without a destroy callback.
    controller.renderer().invalidate();
    assert!(!controller.can_render());

    // Within about one interval the watchdog re-runs the changed path with
    // the current dimensions.
    let recovered = wait_for(|| controller.can_render(), WATCHDOG_INTERVAL * 20);
    assert!(recovered);
    assert_eq!(controller.phase(), SurfacePhase::Rendering);
    let resizes = session.engine.resize_calls();
    assert!(resizes.len() >= 2);
    assert_eq!(*resizes.last().unwrap(), (100, 200));

    controller.suspend();
}

#[test]
fn test_watchdog_leaves_a_healthy_surface_alone() {
    let session = session();
    let controller = session.controller.clone();

    controller.on_surface_created(session.surface.clone());
    controller.on_surface_changed(100, 200);
    controller.resume();

    std::thread::sleep(WATCHDOG_INTERVAL * 4);

    assert_eq!(session.engine.resize_calls(), vec![(100, 200)]);
    controller.suspend();
}

#[test]
fn test_destroy_stops_the_watchdog() {
    let session = session();
    let controller = session.controller.clone();

    controller.on_surface_created(session.surface.clone());
    controller.on_surface_changed(100, 200);
    controller.resume();

    controller.on_surface_destroyed();
    controller.renderer().invalidate();
    std::thread::sleep(WATCHDOG_INTERVAL * 4);

    // No surface handle, no recovery attempts.
    assert_eq!(session.engine.resize_calls(), vec![(100, 200)]);
    assert!(!controller.can_render());
}

#[test]
fn test_watchdog_ignores_an_invalid_os_handle() {
    let session = session();
    let controller = session.controller.clone();

    controller.on_surface_created(session.surface.clone());
    controller.on_surface_changed(100, 200);
    controller.resume();

    // The OS handle itself is gone; recreation cannot help until a real
    // created callback arrives.
    session.surface.set_valid(false);
    std::thread::sleep(WATCHDOG_INTERVAL * 4);

    assert_eq!(session.engine.resize_calls(), vec![(100, 200)]);
    controller.suspend();
}

#[test]
fn test_frames_are_requested_with_current_readiness() {
    let session = session();
    let controller = &session.controller;

    controller.on_surface_created(session.surface.clone());
    assert!(!controller.on_draw_frame());

    controller.on_surface_changed(100, 200);
    assert!(controller.on_draw_frame());

    session.engine.set_render_ready(false);
    assert!(!controller.on_draw_frame());
}

#[test]
fn test_watchdog_recovery_after_rotation() {
    let session = session();
    let controller = session.controller.clone();

    controller.on_surface_created(session.surface.clone());
    controller.on_surface_changed(100, 200);
    // Rotation: the surface reports swapped dimensions from now on.
    session.surface.set_size(200, 100);
    controller.on_surface_changed(200, 100);
    assert_eq!(
        session.events.try_recv(),
        Ok(SurfaceEvent::Resized {
            width: 200,
            height: 100
        })
    );

    controller.resume();
    controller.renderer().invalidate();
    let recovered = wait_for(|| controller.can_render(), WATCHDOG_INTERVAL * 20);
    assert!(recovered);

    // Recovery re-used the rotated dimensions and emitted no stale resize.
    assert_eq!(*session.engine.resize_calls().last().unwrap(), (200, 100));
    assert!(session.events.try_recv().is_err());
    controller.suspend();
}
