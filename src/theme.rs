//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::piece::ColorId;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Theme keys for the seven piece colours, in color-id order (1..=7).
const PIECE_KEYS: [&str; 7] = [
    "piece_i", "piece_o", "piece_s", "piece_z", "piece_j", "piece_l", "piece_t",
];

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Block colours and UI colours.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece colours, index = color-id - 1.
    pub pieces: [Color; 7],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (controls help).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Theme {
    /// Built-in colours: one bright colour per piece on a black board.
    pub fn classic() -> Self {
        Self {
            pieces: [
                rgb(0xFF6B6B), // I red
                rgb(0xFFD166), // O yellow
                rgb(0x06D6A0), // S green
                rgb(0x118AB2), // Z blue
                rgb(0x073B4C), // J navy
                rgb(0x7209B7), // L purple
                rgb(0xF72585), // T pink
            ],
            bg: rgb(0x000000),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xFFD166),
            inactive_fg: rgb(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the built-in colours if path is None or missing; unknown keys are ignored.
    /// `palette` then overrides piece colours for high-contrast or colorblind play.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))?
            }
            _ => Self::classic(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override piece colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pieces = [
                    rgb(0x00FFFF), // cyan
                    rgb(0xFFFF00), // yellow
                    rgb(0x00FF00), // green
                    rgb(0xFF0000), // red
                    rgb(0x0088FF), // blue
                    rgb(0xFF8800), // orange
                    rgb(0xFF00FF), // magenta
                ];
            }
            crate::Palette::Colorblind => {
                // Okabe-Ito style: avoid red/green pairs.
                self.pieces = [
                    rgb(0x56B4E9), // sky blue
                    rgb(0xF0E442), // yellow
                    rgb(0x009E73), // bluish green
                    rgb(0xD55E00), // vermillion
                    rgb(0x0072B2), // blue
                    rgb(0xE69F00), // orange
                    rgb(0xCC79A7), // reddish purple
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let defaults = Self::classic();
        let get = |key: &str, fallback: Color| -> Result<Color, ThemeError> {
            map.get(key).map_or(Ok(fallback), |v| parse_hex(v))
        };
        let mut pieces = defaults.pieces;
        for (slot, key) in pieces.iter_mut().zip(PIECE_KEYS) {
            *slot = get(key, *slot)?;
        }
        Ok(Self {
            pieces,
            bg: get("main_bg", defaults.bg)?,
            div_line: get("div_line", defaults.div_line)?,
            main_fg: get("main_fg", defaults.main_fg)?,
            title: get("title", defaults.title)?,
            inactive_fg: get("inactive_fg", defaults.inactive_fg)?,
        })
    }

    /// Colour for a locked block or piece color-id (1..=7).
    #[inline]
    pub fn piece_color(&self, id: ColorId) -> Color {
        self.pieces[(id.saturating_sub(1) as usize) % 7]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}
