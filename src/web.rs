//! Browser entry point
//!
//! Exposes a `RollSession` to JavaScript. The page drives `frame` from
//! `requestAnimationFrame` and reads everything it renders back as JSON.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::consts::{MAX_DISTRESS, MAX_STAT, MIN_DISTRESS};
use crate::pool::{DieId, DieKind, compute_pool};
use crate::session::RollSession;
use crate::settings::TraySettings;
use crate::stats::{RollConfiguration, StatSnapshot};
use crate::tier::Tier;

/// One spinner digit as the page sees it
#[derive(Serialize)]
struct DigitJson {
    id: DieId,
    kind: DieKind,
    shown: u8,
    tier: Tier,
    rolling: bool,
}

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("JSON encoding failed: {}", e);
        String::from("null")
    })
}

/// Dice roller handle owned by the page
#[wasm_bindgen]
pub struct WebTray {
    session: RollSession,
    last_ms: Option<f64>,
}

#[wasm_bindgen]
impl WebTray {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebTray {
        WebTray {
            session: RollSession::from_entropy(TraySettings::load()),
            last_ms: None,
        }
    }

    /// Roll from raw stat values. Returns false if the pool is empty.
    pub fn roll(
        &mut self,
        stat_a: u32,
        stat_b: u32,
        modifier: i32,
        distress: u8,
        include_distress: bool,
    ) -> bool {
        // Same clamps the character sheet applies
        let pool = compute_pool(
            stat_a.min(u32::from(MAX_STAT)),
            stat_b.min(u32::from(MAX_STAT)),
            modifier,
            distress.clamp(MIN_DISTRESS, MAX_DISTRESS),
            include_distress,
        );
        self.session.roll_pool(pool).is_some()
    }

    /// Roll from a character snapshot and a roll configuration, both JSON
    #[wasm_bindgen(js_name = rollCharacter)]
    pub fn roll_character(&mut self, snapshot: &str, config: &str) -> Result<bool, JsValue> {
        let snapshot: StatSnapshot = serde_json::from_str(snapshot).map_err(to_js)?;
        let config: RollConfiguration = if config.trim().is_empty() {
            RollConfiguration::default()
        } else {
            serde_json::from_str(config).map_err(to_js)?
        };
        Ok(self.session.roll(&snapshot, &config).is_some())
    }

    /// Throw the current dice again
    pub fn reroll(&mut self) {
        self.session.reroll_3d();
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// Advance to `now_ms` (a rAF timestamp). Returns true while anything
    /// is still animating.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        let dt = self
            .last_ms
            .map(|last| ((now_ms - last) / 1000.0) as f32)
            .unwrap_or(0.0);
        self.last_ms = Some(now_ms);
        self.session.frame(dt);
        self.session.is_animating()
    }

    /// Replace the tuning, persist it and start a fresh session
    #[wasm_bindgen(js_name = setSettings)]
    pub fn set_settings(&mut self, settings: &str) -> Result<(), JsValue> {
        let settings = TraySettings::from_json(settings).map_err(to_js)?;
        settings.save();
        self.session = RollSession::from_entropy(settings);
        self.last_ms = None;
        Ok(())
    }

    #[wasm_bindgen(js_name = settingsJson)]
    pub fn settings_json(&self) -> String {
        json(self.session.settings())
    }

    #[wasm_bindgen(js_name = rollJson)]
    pub fn roll_json(&self) -> String {
        json(self.session.current())
    }

    /// Spinner digits for the 2D view
    #[wasm_bindgen(js_name = digitsJson)]
    pub fn digits_json(&self) -> String {
        let digits: Vec<DigitJson> = self
            .session
            .spinner()
            .digits()
            .iter()
            .map(|d| DigitJson {
                id: d.id(),
                kind: d.kind(),
                shown: d.shown(),
                tier: d.tier(),
                rolling: d.is_rolling(),
            })
            .collect();
        json(&digits)
    }

    /// Poses, glow tiers and settled faces for the 3D view
    #[wasm_bindgen(js_name = viewsJson)]
    pub fn views_json(&self) -> String {
        json(&self.session.scene().views())
    }

    #[wasm_bindgen(js_name = settledJson)]
    pub fn settled_json(&self) -> String {
        json(self.session.scene().settled())
    }

    /// Authoritative tallies, or `null` with no dice
    #[wasm_bindgen(js_name = tallyJson)]
    pub fn tally_json(&self) -> String {
        json(&self.session.tally())
    }

    /// 3D tallies, `null` until every die has settled
    #[wasm_bindgen(js_name = tally3dJson)]
    pub fn tally_3d_json(&self) -> String {
        json(&self.session.tally_3d())
    }
}

impl Default for WebTray {
    fn default() -> Self {
        Self::new()
    }
}
