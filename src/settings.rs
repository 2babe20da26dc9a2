use bevy::prelude::*;

/// Tunables for the card, loaded once at startup. Defaults match the shipped
/// experience; every field can be overridden through `CARD_*` env vars (or a
/// `.env` file), with unparseable values falling back to the default.
#[derive(Resource, Clone)]
pub struct Settings {
    pub window_w: f32,
    pub window_h: f32,
    /// Seconds between ambient heart spawns once the opening batch is out.
    pub spawn_secs: f32,
    /// Opening batch: count and per-heart stagger.
    pub batch_count: u32,
    pub batch_secs: f32,
    /// Ceiling on live ambient hearts; spawns past it are dropped.
    pub max_hearts: usize,
    pub rise_secs_min: f32,
    pub rise_secs_max: f32,
    pub rise_delay_max: f32,
    pub heart_size_min: f32,
    pub heart_size_max: f32,
    /// Margin the runaway button keeps from every viewport edge.
    pub edge_padding: f32,
    /// Cadence of the recurring celebration burst.
    pub loop_secs: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_w: 1280.0,
            window_h: 720.0,
            spawn_secs: 0.6,
            batch_count: 8,
            batch_secs: 0.3,
            max_hearts: 25,
            rise_secs_min: 4.0,
            rise_secs_max: 8.0,
            rise_delay_max: 2.0,
            heart_size_min: 18.0,
            heart_size_max: 42.0,
            edge_padding: 20.0,
            loop_secs: 3.0,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let mut s = Self::default();
        if let Some(w) = env_f32("CARD_WINDOW_W") {
            s.window_w = w;
        }
        if let Some(h) = env_f32("CARD_WINDOW_H") {
            s.window_h = h;
        }
        if let Some(ms) = env_f32("CARD_SPAWN_MS") {
            s.spawn_secs = ms / 1000.0;
        }
        if let Some(n) = env_usize("CARD_MAX_HEARTS") {
            s.max_hearts = n;
        }
        if let Some(p) = env_f32("CARD_EDGE_PADDING") {
            s.edge_padding = p;
        }
        if let Some(ms) = env_f32("CARD_LOOP_MS") {
            s.loop_secs = ms / 1000.0;
        }
        s
    }
}

fn env_f32(key: &str) -> Option<f32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
