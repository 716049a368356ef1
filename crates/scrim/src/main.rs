//! scrim demo: drives the overlay registry and the surface lifecycle
//! against the headless toolkit, including a silently dropped surface that
//! the watchdog recovers.

use anyhow::Result;
use scrim_harness::{Session, TextFieldFactory, VideoFactory};
use scrim_overlay::{Bounds, OverlayId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

// Use mimalloc as the global allocator for reduced memory fragmentation
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const WATCHDOG_INTERVAL: Duration = Duration::from_millis(250);

const TEXT_ID: OverlayId = OverlayId(1);
const VIDEO_ID: OverlayId = OverlayId(2);

fn main() -> Result<()> {
    // Initialize logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .compact()
        .init();

    info!("scrim demo starting");
    let session = Session::with_watchdog_interval(WATCHDOG_INTERVAL);

    // Overlays requested before the compositor exists are dropped quietly.
    session.registry.create_object(
        Arc::new(TextFieldFactory::new(true)),
        TEXT_ID,
        Bounds::new(24, 16, 200, 32),
    );
    session.sync();
    info!(
        "create before attach: {} objects registered",
        session.registry.len()
    );

    session.attach_compositor();
    info!("compositor attached");

    // A text field and a video overlay, mutated from this (non-UI) thread.
    session.registry.create_object(
        Arc::new(TextFieldFactory::new(true)),
        TEXT_ID,
        Bounds::new(24, 16, 200, 32),
    );
    session.registry.set_text(TEXT_ID, "hello overlay".to_string());
    session.registry.set_selection(TEXT_ID, 6, 99);
    session.registry.set_alpha(TEXT_ID, 0.85);

    session.registry.create_object(
        Arc::new(VideoFactory::new()),
        VIDEO_ID,
        Bounds::new(0, 64, 320, 180),
    );
    session.registry.video_load(VIDEO_ID, "demo.mp4".to_string());
    session.registry.video_play(VIDEO_ID);
    session.sync();
    info!(
        "registered {} overlays, text={:?} selection={:?}",
        session.registry.len(),
        session.registry.text(TEXT_ID),
        session.registry.selection(TEXT_ID),
    );

    // Surface lifecycle: create, size, render, rotate.
    let controller = session.controller.clone();
    controller.on_surface_created(session.surface.clone());
    controller.on_surface_changed(100, 200);
    controller.resume();
    info!(
        "surface up, can_render={}, frame drawn={}",
        controller.can_render(),
        controller.on_draw_frame()
    );

    session.surface.set_size(200, 100);
    controller.on_surface_changed(200, 100);
    while let Ok(event) = session.events.try_recv() {
        info!("surface event: {:?}", event);
    }

    // A silent driver drop: no destroy callback, rendering just stops.
    controller.renderer().invalidate();
    info!("simulated silent surface drop, waiting for the watchdog");
    std::thread::sleep(WATCHDOG_INTERVAL * 3);
    info!("recovered: can_render={}", controller.can_render());

    // Backgrounding: pause overlays, drop the surface, come back.
    session.registry.suspend_all();
    controller.suspend();
    controller.on_surface_destroyed();

    controller.on_surface_created(session.surface.clone());
    controller.on_surface_changed(200, 100);
    controller.resume();
    session.registry.resume_all();
    session.sync();
    info!(
        "resumed: video playing={}, forced present={}",
        session.registry.video_is_playing(VIDEO_ID),
        controller.renderer().take_needs_swap(),
    );

    // Teardown in reverse creation order, then release the stack.
    controller.suspend();
    session.registry.remove_all();
    let compositor = session.compositor.clone();
    session.ui.dispatcher().run_on_ui(move || compositor.release());
    session.sync();
    info!("torn down, {} objects remain", session.registry.len());

    info!("scrim demo shutting down");
    Ok(())
}
