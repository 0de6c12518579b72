//! D10 Tray entry point
//!
//! On the web this only installs the logger; the page drives `WebTray`.
//! Natively it runs a headless roll through both presentations.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub use d10_tray::web::WebTray;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
    log::info!("D10 Tray ready");
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use d10_tray::{RollConfiguration, RollSession, StatKey, StatSnapshot, TraySettings};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(7);
    log::info!("D10 Tray (native) headless roll, seed {}", seed);

    let snapshot = StatSnapshot::default()
        .with_stat(StatKey::Charisme, 2)
        .with_stat(StatKey::Persuasion, 3)
        .with_distress(2);
    let config = RollConfiguration::default();

    let mut session = RollSession::new(TraySettings::load(), seed);
    if session.roll(&snapshot, &config).is_none() {
        println!("Nothing to roll");
        return;
    }

    // 60 Hz host frames, capped at 30 s
    let frame_dt = 1.0 / 60.0;
    let mut frames = 0;
    while session.is_animating() && frames < 30 * 60 {
        for event in session.frame(frame_dt) {
            println!(
                "  {} ({}) settled on {}, rolled {}",
                event.die,
                event.kind.as_str(),
                event.observed,
                event.authoritative
            );
        }
        frames += 1;
    }
    println!("Simulated {:.2} s", frames as f32 * frame_dt);

    for view in session.scene().views() {
        println!(
            "  {}: {} {}{}",
            view.id,
            view.authoritative_value,
            view.glow.as_str(),
            if view.mismatch() { " (face differs)" } else { "" }
        );
    }

    match session.tally_3d() {
        Some(t) => println!(
            "Successes: {}  10s: {}  1s: {}  Sum: {}",
            t.successes, t.criticals, t.ones, t.sum
        ),
        None => println!("Still in progress"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
