use egui::{pos2, Color32};
use inkboard::{
    CanvasSnapshot, CheckpointGateway, DeviceKind, FrameDriver, MemoryStore, PointerSample,
    PointerState, SurfaceManager, TickOutcome, ToolMode, ToolState,
};

fn mouse(x: f32, y: f32) -> PointerSample {
    PointerSample {
        pos: pos2(x, y),
        ..Default::default()
    }
}

fn touch(x: f32, y: f32, contact_width: f32) -> PointerSample {
    PointerSample {
        pos: pos2(x, y),
        contact_width: Some(contact_width),
        device: DeviceKind::Touch,
        ctrl: false,
    }
}

#[test]
fn each_move_extends_the_stroke_by_one_segment() {
    let mut driver = FrameDriver::new();
    let mut pointer = PointerState::default();
    let mut manager = SurfaceManager::new(200, 200);
    let tool = ToolState::default();

    pointer.pointer_down(mouse(20.0, 20.0), 0.0);
    assert_eq!(
        driver.tick(&mut pointer, &mut manager, &tool, 0.0),
        TickOutcome::StrokeStarted
    );
    let after_down = manager.main().version();

    let moves = 5;
    for i in 1..=moves {
        pointer.pointer_move(mouse(20.0 + i as f32 * 20.0, 20.0), &[]);
        assert_eq!(
            driver.tick(&mut pointer, &mut manager, &tool, i as f64 * 0.016),
            TickOutcome::StrokeExtended
        );
    }
    // One surface mutation per move, no more.
    assert_eq!(manager.main().version(), after_down + moves);

    // The whole polyline is connected: every segment midpoint is painted.
    for i in 0..moves {
        let mid_x = 30 + i as u32 * 20;
        assert_eq!(manager.main().pixel(mid_x, 20), tool.color);
    }
}

#[test]
fn mouse_stroke_is_red_and_ten_pixels_wide() {
    let mut driver = FrameDriver::new();
    let mut pointer = PointerState::default();
    let mut manager = SurfaceManager::new(100, 60);
    let tool = ToolState::default();

    pointer.pointer_down(mouse(10.0, 30.0), 0.0);
    driver.tick(&mut pointer, &mut manager, &tool, 0.0);
    pointer.pointer_move(mouse(80.0, 30.0), &[]);
    driver.tick(&mut pointer, &mut manager, &tool, 0.016);

    assert_eq!(manager.main().pixel(40, 30), Color32::RED);
    // 4.5px off the spine is inside the 5px radius; 6.5px is outside.
    assert_eq!(manager.main().pixel(40, 34), Color32::RED);
    assert_eq!(manager.main().pixel(40, 36), Color32::WHITE);
}

#[test]
fn eraser_cuts_strokes_down_to_transparency() {
    let mut driver = FrameDriver::new();
    let mut pointer = PointerState::default();
    let mut manager = SurfaceManager::new(100, 60);
    let mut tool = ToolState::default();

    pointer.pointer_down(mouse(10.0, 30.0), 0.0);
    driver.tick(&mut pointer, &mut manager, &tool, 0.0);
    pointer.pointer_move(mouse(80.0, 30.0), &[]);
    driver.tick(&mut pointer, &mut manager, &tool, 0.016);
    pointer.pointer_up();
    driver.tick(&mut pointer, &mut manager, &tool, 0.032);

    tool.mode = ToolMode::Erase;
    pointer.pointer_down(mouse(30.0, 30.0), 0.1);
    driver.tick(&mut pointer, &mut manager, &tool, 0.1);
    pointer.pointer_move(mouse(50.0, 30.0), &[]);
    driver.tick(&mut pointer, &mut manager, &tool, 0.116);

    // Erased pixels are transparent, not white.
    assert_eq!(manager.main().pixel(40, 30).a(), 0);
    // The rest of the pen stroke survives.
    assert_eq!(manager.main().pixel(70, 30), Color32::RED);
}

#[test]
fn touch_contact_width_widens_the_stroke() {
    let mut driver = FrameDriver::new();
    let mut pointer = PointerState::default();
    let mut manager = SurfaceManager::new(120, 60);
    let tool = ToolState::default();

    // Touch strokes wait out the debounce before drawing starts.
    pointer.pointer_down(touch(20.0, 30.0, 60.0), 0.0);
    assert_eq!(
        driver.tick(&mut pointer, &mut manager, &tool, 0.0),
        TickOutcome::Idle
    );

    assert_eq!(
        driver.tick(&mut pointer, &mut manager, &tool, 0.02),
        TickOutcome::StrokeStarted
    );
    pointer.pointer_move(touch(90.0, 30.0, 60.0), &[]);
    driver.tick(&mut pointer, &mut manager, &tool, 0.036);

    // Contact width 60 minus the 40px sensor bias gives a 20px stroke,
    // twice the mouse default.
    assert_eq!(manager.main().pixel(50, 38), Color32::RED);
    assert_eq!(manager.main().pixel(50, 42), Color32::WHITE);
}

#[test]
fn predicted_samples_drive_the_segment_endpoint() {
    let mut driver = FrameDriver::new();
    let mut pointer = PointerState::default();
    let mut manager = SurfaceManager::new(120, 60);
    let tool = ToolState::default();

    pointer.pointer_down(mouse(10.0, 30.0), 0.0);
    driver.tick(&mut pointer, &mut manager, &tool, 0.0);

    let predicted = [mouse(80.0, 30.0)];
    pointer.pointer_move(mouse(60.0, 30.0), &predicted);
    driver.tick(&mut pointer, &mut manager, &tool, 0.016);

    // The stroke reaches the predicted point, past the raw sample.
    assert_eq!(manager.main().pixel(75, 30), Color32::RED);
}

#[test]
fn finished_stroke_survives_a_checkpoint_round_trip() {
    let mut driver = FrameDriver::new();
    let mut pointer = PointerState::default();
    let mut manager = SurfaceManager::new(100, 60);
    let tool = ToolState::default();

    pointer.pointer_down(mouse(10.0, 30.0), 0.0);
    driver.tick(&mut pointer, &mut manager, &tool, 0.0);
    pointer.pointer_move(mouse(80.0, 30.0), &[]);
    driver.tick(&mut pointer, &mut manager, &tool, 0.016);
    driver.flush(&mut pointer, &mut manager, &tool);
    assert!(pointer.pointer_up());

    let gateway = CheckpointGateway::new(Box::new(MemoryStore::new()));
    gateway
        .write_checkpoint(&CanvasSnapshot::of_surface(manager.main()).unwrap())
        .unwrap();

    // A later session sharing the store restores the identical bitmap.
    let restored = gateway.clone().restore().unwrap();
    let mut fresh = SurfaceManager::new(100, 60);
    fresh.load_snapshot(&restored).unwrap();
    assert_eq!(fresh.main().image().as_raw(), manager.main().image().as_raw());
}
