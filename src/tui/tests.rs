//! Integration tests for the TUI module.

use super::orrery_app::{OrreryApp, VIEW_SIZE};
use crate::config::OrreryConfig;
use crate::render::RenderCommand;
use crossterm::event::KeyCode;

fn light_config() -> OrreryConfig {
    OrreryConfig::builder()
        .seed(9)
        .trail_steps(150)
        .spine_samples(40)
        .star_count(30)
        .texture_divisor(16)
        .build()
}

#[test]
fn test_orrery_app_lifecycle() {
    let mut app = OrreryApp::from_config(light_config());

    assert!(!app.paused);
    assert!(!app.should_quit());

    for _ in 0..5 {
        app.update();
    }
    assert_eq!(app.frame_count, 5);

    // Pause
    app.handle_key(KeyCode::Char(' '));
    let before = app.frame_count;
    app.update();
    assert_eq!(app.frame_count, before);

    app.handle_key(KeyCode::Char(' '));
    app.update();
    assert_eq!(app.frame_count, before + 1);

    app.handle_key(KeyCode::Esc);
    assert!(app.should_quit());
}

#[test]
fn test_commands_fit_view() {
    let mut app = OrreryApp::from_config(light_config());
    app.update();
    let (w, h) = (f64::from(VIEW_SIZE.0), f64::from(VIEW_SIZE.1));
    for command in app.commands() {
        if let RenderCommand::DrawCircle { x, y, radius, .. } = command {
            assert!(x.is_finite() && y.is_finite());
            assert!(x + radius >= 0.0 && x - radius <= w);
            assert!(y + radius >= 0.0 && y - radius <= h);
        }
    }
}

#[test]
fn test_z_scale_keys() {
    let mut app = OrreryApp::from_config(light_config());
    let start = app.hud().z_scale;
    app.handle_key(KeyCode::Char(']'));
    assert!((app.hud().z_scale - (start + 1.0)).abs() < 1e-9);
    for _ in 0..40 {
        app.handle_key(KeyCode::Char('['));
    }
    assert!((app.hud().z_scale - 1.0).abs() < 1e-9);
}
