//! `#rrggbb` colour strings.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisualError};

/// True if `s` is `#` followed by exactly six hex digits.
pub fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(digits) => digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Parse a `#rrggbb` string.
    pub fn from_hex(s: &str) -> Result<Self> {
        if !is_hex_color(s) {
            return Err(VisualError::InvalidColor(s.to_owned()));
        }
        let value = u32::from_str_radix(&s[1..], 16)
            .map_err(|_| VisualError::InvalidColor(s.to_owned()))?;
        Ok(Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        })
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Components scaled to `[0, 1]`.
    pub fn to_unit(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}
