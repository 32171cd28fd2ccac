//! WebAssembly bindings for the browser presentation layer.
//!
//! Everything crosses the boundary as JSON strings; tile ids are UUID
//! strings.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::config::GameConfig;
#[cfg(feature = "wasm")]
use crate::hint::{HintStrategy, Hinter};
#[cfg(feature = "wasm")]
use crate::session::{GameSession, SessionAction};
#[cfg(feature = "wasm")]
use crate::tile::TileId;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[cfg(feature = "wasm")]
fn parse_tile(id: &str) -> Result<TileId, JsValue> {
    uuid::Uuid::parse_str(id)
        .map(TileId::from)
        .map_err(|e| JsValue::from_str(&format!("Invalid tile id: {}", e)))
}

/// WASM-exposed session wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmGame {
    session: GameSession,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmGame {
    /// Create a session from a JSON config (`"{}"` for defaults). A seed
    /// overrides the one in the config.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, seed: Option<u32>) -> Result<WasmGame, JsValue> {
        let mut config = GameConfig::from_json_str(config_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        if let Some(seed) = seed {
            config.seed = Some(u64::from(seed));
        }
        let session =
            GameSession::new(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmGame { session })
    }

    /// Start (or restart) the round; returns the prerun events as JSON
    pub fn restart(&mut self) -> Result<String, JsValue> {
        self.apply(SessionAction::Restart)
    }

    /// Get board state as JSON (for rendering)
    #[wasm_bindgen(js_name = getBoard)]
    pub fn get_board(&self) -> String {
        serde_json::to_string(&self.session.board().snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Commit a swap; returns the resulting events as JSON
    pub fn swap(&mut self, initiator: &str, opponent: &str) -> Result<String, JsValue> {
        let initiator = parse_tile(initiator)?;
        let opponent = parse_tile(opponent)?;
        self.apply(SessionAction::Swap {
            initiator,
            opponent,
        })
    }

    /// Advance the clock
    pub fn tick(&mut self, seconds: f32) -> Result<String, JsValue> {
        self.apply(SessionAction::Tick { seconds })
    }

    /// Force-release any dragged tile
    pub fn release(&mut self) -> Result<String, JsValue> {
        self.apply(SessionAction::Release)
    }

    /// Tell the session the last swap's animations have finished
    #[wasm_bindgen(js_name = replayDone)]
    pub fn replay_done(&mut self) -> Result<String, JsValue> {
        self.apply(SessionAction::ReplayDone)
    }

    /// Available swap directions for a tile as a JSON array
    #[wasm_bindgen(js_name = availableDirections)]
    pub fn available_directions(&self, tile: &str) -> Result<String, JsValue> {
        let tile = parse_tile(tile)?;
        let dirs = self.session.board().available_directions(tile);
        Ok(serde_json::to_string(&dirs).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Suggest a scoring swap, or `null`
    #[wasm_bindgen(js_name = getHint)]
    pub fn get_hint(&self) -> String {
        let mut hinter = Hinter::new(HintStrategy::Greedy);
        match hinter.suggest(self.session.board()) {
            Some(hint) => serde_json::to_string(&hint).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    #[wasm_bindgen(js_name = isProcessing)]
    pub fn is_processing(&self) -> bool {
        self.session.is_processing()
    }

    pub fn score(&self) -> u32 {
        self.session.score()
    }

    /// Seconds left on the clock
    pub fn remaining(&self) -> f32 {
        self.session.remaining()
    }

    /// Session state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.session.state()).unwrap_or_else(|_| "null".to_string())
    }

    fn apply(&mut self, action: SessionAction) -> Result<String, JsValue> {
        match self.session.apply_action(action) {
            Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(&format!("Action failed: {}", e))),
        }
    }
}
