//! Common types shared across hardware device implementations.

use portalbox_core::{Rgb, constants::DEFAULT_BRIGHTNESS};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::HardwareError;

/// One LED of the strip: a color plus its 5-bit global brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub color: Rgb,
    pub brightness: u8,
}

impl Pixel {
    pub const OFF: Pixel = Pixel {
        color: Rgb::BLACK,
        brightness: DEFAULT_BRIGHTNESS,
    };

    #[must_use]
    pub const fn new(color: Rgb, brightness: u8) -> Self {
        Self { color, brightness }
    }
}

impl Default for Pixel {
    fn default() -> Self {
        Self::OFF
    }
}

/// Byte order of the color channels on the wire.
///
/// It varies between Dotstar revisions: the original strips take `RBG`,
/// the strips in V3 boxes take `BRG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorOrder {
    Rgb,
    Rbg,
    #[default]
    Brg,
}

impl ColorOrder {
    /// Reorder a color into the three bytes sent after the brightness byte.
    #[must_use]
    pub fn arrange(&self, color: Rgb) -> [u8; 3] {
        match self {
            ColorOrder::Rgb => [color.r, color.g, color.b],
            ColorOrder::Rbg => [color.r, color.b, color.g],
            ColorOrder::Brg => [color.b, color.g, color.r],
        }
    }
}

impl fmt::Display for ColorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColorOrder::Rgb => "RGB",
            ColorOrder::Rbg => "RBG",
            ColorOrder::Brg => "BRG",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ColorOrder {
    type Err = HardwareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RGB" => Ok(ColorOrder::Rgb),
            "RBG" => Ok(ColorOrder::Rbg),
            "BRG" => Ok(ColorOrder::Brg),
            other => Err(HardwareError::configuration(format!(
                "unknown color order: {other}"
            ))),
        }
    }
}

/// Card reader information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name (e.g., "MFRC522").
    pub name: String,

    /// Raw content of the chip version register.
    pub version: u8,
}

impl ReaderInfo {
    /// Create a new ReaderInfo.
    pub fn new(name: impl Into<String>, version: u8) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ColorOrder::Rgb, [1, 2, 3])]
    #[case(ColorOrder::Rbg, [1, 3, 2])]
    #[case(ColorOrder::Brg, [3, 2, 1])]
    fn test_color_order_arrange(#[case] order: ColorOrder, #[case] expected: [u8; 3]) {
        assert_eq!(order.arrange(Rgb::new(1, 2, 3)), expected);
    }

    #[test]
    fn test_color_order_parse() {
        assert_eq!("brg".parse::<ColorOrder>().unwrap(), ColorOrder::Brg);
        assert_eq!("RBG".parse::<ColorOrder>().unwrap(), ColorOrder::Rbg);
        assert!("GRB".parse::<ColorOrder>().is_err());
        assert_eq!(ColorOrder::default().to_string(), "BRG");
    }

    #[test]
    fn test_pixel_serialization() {
        let pixel = Pixel::new(Rgb::RED, 30);
        let json = serde_json::to_string(&pixel).unwrap();
        let back: Pixel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pixel);
    }
}
