//! The configuration contract exposed to the (out-of-scope) config loader.

/// Read-only key/value source the core pulls its tunables from. The loader
/// that parses an actual config file is out of scope (spec §1); this trait
/// is the seam it implements.
pub trait ConfigSource {
    /// A string-valued key, or `default` if unset.
    fn get_str(&self, key: &str, default: &str) -> String;
    /// An integer-valued key, or `default` if unset or unparsable.
    fn get_int(&self, key: &str, default: i64) -> i64;
}

/// A resolved decoration palette preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    /// Resolve per-portal from its content (luminance-adaptive border only;
    /// titlebar palette still needs an external theme layer to pick one).
    Adaptive,
    Light,
    Dark,
}

impl ThemeMode {
    fn parse(s: &str) -> Self {
        match s {
            "light" => ThemeMode::Light,
            "dark" => ThemeMode::Dark,
            _ => ThemeMode::Adaptive,
        }
    }
}

/// The subset of configuration the core itself reads (spec §6). Everything
/// else recognized by the key list (shortcuts, background mode/path,
/// terminal command) belongs to the out-of-scope collaborators and is not
/// represented here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Compositor/event-loop tick rate. Read once at `Initialize` (spec §9
    /// Open Questions: the event loop does not pick up a runtime change).
    pub framerate: u32,
    /// Decoration palette preference.
    pub theme: ThemeMode,
    /// Gap, in pixels, around and between tiled cells.
    pub tile_gap: u32,
}

impl Config {
    /// Build a [`Config`] by reading every key the core recognizes from
    /// `source`, falling back to spec defaults.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let framerate = source.get_int("framerate", 60).clamp(1, 1000) as u32;
        let theme = ThemeMode::parse(&source.get_str("theme", "adaptive"));
        let tile_gap = source.get_int("tile_gap", 6).max(0) as u32;
        Config {
            framerate,
            theme,
            tile_gap,
        }
    }

    /// Milliseconds between throttled updates (drag/resize/compositor),
    /// `⌊1000/framerate⌋` per spec §4.6/§4.11.
    pub fn throttle_ms(&self) -> u64 {
        1000 / self.framerate.max(1) as u64
    }
}
