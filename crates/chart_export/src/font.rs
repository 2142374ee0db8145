//! TrueType font lookup for chart text.
//!
//! plotters renders text through ab_glyph, which needs a font registered at
//! runtime. The first readable font from `CHART_FONT` or the usual system
//! locations is registered once per process. When none is found the charts
//! are still drawn, without titles, tick labels or legends.

use std::path::PathBuf;
use std::sync::OnceLock;

use plotters::style::{register_font, FontStyle};
use tracing::{info, warn};

pub const FONT_FAMILY: &str = "sans-serif";

/// Overrides the font search with an explicit .ttf path.
pub const FONT_ENV: &str = "CHART_FONT";

const SYSTEM_FONTS: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// True once a font is registered under [`FONT_FAMILY`].
pub fn labels_available() -> bool {
    *FONT_READY.get_or_init(register_first_font)
}

fn candidates() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = std::env::var_os(FONT_ENV)
        .map(PathBuf::from)
        .into_iter()
        .collect();
    paths.extend(SYSTEM_FONTS.iter().map(PathBuf::from));
    paths
}

fn register_first_font() -> bool {
    for path in candidates() {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // registered fonts live for the rest of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                info!(font = %path.display(), "chart labels enabled");
                return true;
            }
            Err(_) => warn!(font = %path.display(), "unusable font file, trying next"),
        }
    }
    warn!(env = FONT_ENV, "no font found, charts are drawn without text");
    false
}
