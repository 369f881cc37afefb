use std::collections::BTreeMap;
use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

use verification_void::analysis::flow::{AQUA, HexColor, PINK};

// ---------------------------------------------------------------------------
// Site palette
// ---------------------------------------------------------------------------

pub const ACCENT: Color32 = Color32::from_rgb(0xFF, 0x00, 0x50);
pub const NODE_GRAY: Color32 = Color32::from_rgb(0x33, 0x33, 0x33);

/// Convert a `#RRGGBB` colour from the engine into an egui colour.
/// Unparseable strings come out gray.
pub fn hex_to_color32(hex: HexColor) -> Color32 {
    match Srgb::<u8>::from_str(hex.0) {
        Ok(rgb) => Color32::from_rgb(rgb.red, rgb.green, rgb.blue),
        Err(e) => {
            log::warn!("bad colour {:?}: {e}", hex.0);
            Color32::GRAY
        }
    }
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            to_color32(hsl.into_color())
        })
        .collect()
}

/// Pink → aqua → white ramp used by the word cloud, `t` in `[0, 1]`.
pub fn cloud_ramp(t: f64) -> Color32 {
    let stops: [Srgb; 3] = [
        Srgb::new(1.0, 0.0, 80.0 / 255.0),
        Srgb::new(0.0, 242.0 / 255.0, 234.0 / 255.0),
        Srgb::new(1.0, 1.0, 1.0),
    ];
    let t = t.clamp(0.0, 1.0) as f32 * 2.0;
    let (from, to, local) = if t <= 1.0 {
        (stops[0], stops[1], t)
    } else {
        (stops[1], stops[2], t - 1.0)
    };
    let mixed = from.into_linear::<f32>().mix(to.into_linear(), local);
    to_color32(Srgb::from_linear(mixed))
}

// ---------------------------------------------------------------------------
// Color mapping: group value → Color32
// ---------------------------------------------------------------------------

/// Maps the values of a chosen column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from a column's distinct values.
    pub fn new(values: &[String]) -> Self {
        let palette = generate_palette(values.len());
        let mapping: BTreeMap<String, Color32> = values
            .iter()
            .zip(palette)
            .map(|(v, c)| (v.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Claims pink, opinions aqua, anything else from the generated palette.
    pub fn for_claim_status(values: &[String]) -> Self {
        let mut map = Self::new(values);
        for (value, hex) in [("claim", PINK), ("opinion", AQUA)] {
            if let Some(slot) = map.mapping.get_mut(value) {
                *slot = hex_to_color32(hex);
            }
        }
        map
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}
