use std::fmt;

use serde::{Deserialize, Serialize};

/// Display-order color triple. Serializes as a `[r, g, b]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Hue in degrees (0..360), saturation and lightness in integer percent.
/// Serializes as a `[h, s, l]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsl(pub u16, pub u8, pub u8);

impl Rgb {
    /// Reorder a capture-order (blue, green, red) triple into display order.
    pub fn from_bgr(bgr: [u8; 3]) -> Self {
        Self(bgr[2], bgr[1], bgr[0])
    }

    /// Zero-padded lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Standard min/max/chroma conversion. Components are truncated to
    /// integers, not rounded; achromatic input yields hue 0 and saturation 0.
    pub fn to_hsl(self) -> Hsl {
        let r = f64::from(self.0) / 255.0;
        let g = f64::from(self.1) / 255.0;
        let b = f64::from(self.2) / 255.0;

        let cmax = r.max(g).max(b);
        let cmin = r.min(g).min(b);
        let diff = cmax - cmin;

        let h = if diff == 0.0 {
            0.0
        } else if cmax == r {
            (60.0 * ((g - b) / diff) + 360.0) % 360.0
        } else if cmax == g {
            (60.0 * ((b - r) / diff) + 120.0) % 360.0
        } else {
            (60.0 * ((r - g) / diff) + 240.0) % 360.0
        };

        let l = (cmax + cmin) / 2.0;
        let s = if diff == 0.0 {
            0.0
        } else if l <= 0.5 {
            diff / (cmax + cmin)
        } else {
            diff / (2.0 - cmax - cmin)
        };

        Hsl(h as u16, (s * 100.0) as u8, (l * 100.0) as u8)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_zero_padded_lowercase() {
        assert_eq!(Rgb(255, 0, 0).to_hex(), "#ff0000");
        assert_eq!(Rgb(0, 10, 171).to_hex(), "#000aab");
        for rgb in [Rgb(0, 0, 0), Rgb(255, 255, 255), Rgb(17, 130, 9)] {
            let hex = rgb.to_hex();
            assert_eq!(hex.len(), 7);
            assert!(hex.starts_with('#'));
            assert!(hex[1..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn primary_colors_to_hsl() {
        assert_eq!(Rgb(255, 0, 0).to_hsl(), Hsl(0, 100, 50));
        assert_eq!(Rgb(0, 255, 0).to_hsl(), Hsl(120, 100, 50));
        assert_eq!(Rgb(0, 0, 255).to_hsl(), Hsl(240, 100, 50));
    }

    #[test]
    fn grayscale_is_achromatic() {
        assert_eq!(Rgb(128, 128, 128).to_hsl(), Hsl(0, 0, 50));
        assert_eq!(Rgb(0, 0, 0).to_hsl(), Hsl(0, 0, 0));
        assert_eq!(Rgb(255, 255, 255).to_hsl(), Hsl(0, 0, 100));
        assert_eq!(Rgb(192, 192, 192).to_hsl(), Hsl(0, 0, 75));
    }

    #[test]
    fn hsl_components_stay_in_range() {
        let samples = [
            Rgb(1, 2, 3),
            Rgb(250, 3, 120),
            Rgb(3, 250, 120),
            Rgb(120, 3, 250),
            Rgb(128, 0, 0),
            Rgb(254, 255, 255),
        ];
        for rgb in samples {
            let Hsl(h, s, l) = rgb.to_hsl();
            assert!(h < 360, "hue out of range for {rgb:?}");
            assert!(s <= 100, "saturation out of range for {rgb:?}");
            assert!(l <= 100, "lightness out of range for {rgb:?}");
        }
        assert_eq!(Rgb(128, 0, 0).to_hsl(), Hsl(0, 100, 25));
    }

    #[test]
    fn bgr_channel_order_is_swapped() {
        assert_eq!(Rgb::from_bgr([10, 20, 30]), Rgb(30, 20, 10));
    }

    #[test]
    fn tuples_format_like_the_export_rows() {
        assert_eq!(Rgb(1, 22, 255).to_string(), "(1, 22, 255)");
        assert_eq!(Hsl(359, 4, 99).to_string(), "(359, 4, 99)");
    }

    #[test]
    fn color_arrays_serialize_as_json_arrays() {
        assert_eq!(serde_json::to_string(&Rgb(1, 2, 3)).unwrap(), "[1,2,3]");
        assert_eq!(serde_json::to_string(&Hsl(240, 50, 60)).unwrap(), "[240,50,60]");
    }
}
