//! Color module (RGB, CMYK or grayscale)

use std::fmt::Write;

use serde_derive::{Deserialize, Serialize};

fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// RGB color, channels in [0, 1]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: clamp01(r),
            g: clamp01(g),
            b: clamp01(b),
        }
    }
}

/// CMYK color, channels in [0, 1]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cmyk {
    pub c: f32,
    pub m: f32,
    pub y: f32,
    pub k: f32,
}

impl Cmyk {
    pub fn new(c: f32, m: f32, y: f32, k: f32) -> Self {
        Self {
            c: clamp01(c),
            m: clamp01(m),
            y: clamp01(y),
            k: clamp01(k),
        }
    }
}

/// Grayscale color, 0 = black, 1 = white
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Greyscale {
    pub percent: f32,
}

impl Greyscale {
    pub fn new(percent: f32) -> Self {
        Self {
            percent: clamp01(percent),
        }
    }
}

/// Wrapper for Rgb, Cmyk and grayscale color types
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "data")]
pub enum Color {
    Rgb(Rgb),
    Cmyk(Cmyk),
    Greyscale(Greyscale),
}

impl Default for Color {
    fn default() -> Self {
        Color::Rgb(Rgb::new(0.0, 0.0, 0.0))
    }
}

impl Color {
    /// Consumes the color and converts it into a vector of channel values
    pub fn into_vec(self) -> Vec<f32> {
        match self {
            Color::Rgb(rgb) => vec![rgb.r, rgb.g, rgb.b],
            Color::Cmyk(cmyk) => vec![cmyk.c, cmyk.m, cmyk.y, cmyk.k],
            Color::Greyscale(gs) => vec![gs.percent],
        }
    }

    /// Approximate the color as RGB. CMYK uses the additive-ink
    /// approximation `1 - min(1, channel + k)`.
    pub fn to_rgb(&self) -> Rgb {
        match self {
            Color::Rgb(rgb) => *rgb,
            Color::Greyscale(gs) => Rgb::new(gs.percent, gs.percent, gs.percent),
            Color::Cmyk(cmyk) => Rgb::new(
                1.0 - (cmyk.c + cmyk.k).min(1.0),
                1.0 - (cmyk.m + cmyk.k).min(1.0),
                1.0 - (cmyk.y + cmyk.k).min(1.0),
            ),
        }
    }

    /// Approximate the color as CMYK (naive complement, no undercolor removal).
    pub fn to_cmyk(&self) -> Cmyk {
        match self {
            Color::Cmyk(cmyk) => *cmyk,
            Color::Rgb(rgb) => Cmyk::new(1.0 - rgb.r, 1.0 - rgb.g, 1.0 - rgb.b, 0.0),
            Color::Greyscale(gs) => Cmyk::new(0.0, 0.0, 0.0, 1.0 - gs.percent),
        }
    }

    /// Approximate the color as a gray level (0.3 / 0.59 / 0.11 luma weights).
    pub fn to_greyscale(&self) -> f32 {
        match self {
            Color::Greyscale(gs) => gs.percent,
            Color::Rgb(rgb) => 0.3 * rgb.r + 0.59 * rgb.g + 0.11 * rgb.b,
            Color::Cmyk(cmyk) => {
                1.0 - (0.3 * cmyk.c + 0.59 * cmyk.m + 0.11 * cmyk.y + cmyk.k).min(1.0)
            }
        }
    }

    /// Emit the stroke color operator (`RG`, `K` or `G`).
    pub(crate) fn write_stroke(&self, stream: &mut String) {
        let _ = match self {
            Color::Rgb(rgb) => writeln!(stream, "{:.2} {:.2} {:.2} RG", rgb.r, rgb.g, rgb.b),
            Color::Cmyk(cmyk) => writeln!(
                stream,
                "{:.2} {:.2} {:.2} {:.2} K",
                cmyk.c, cmyk.m, cmyk.y, cmyk.k
            ),
            Color::Greyscale(gs) => writeln!(stream, "{:.2} G", gs.percent),
        };
    }

    /// Emit the fill color operator (`rg`, `k` or `g`).
    pub(crate) fn write_fill(&self, stream: &mut String) {
        let _ = match self {
            Color::Rgb(rgb) => writeln!(stream, "{:.2} {:.2} {:.2} rg", rgb.r, rgb.g, rgb.b),
            Color::Cmyk(cmyk) => writeln!(
                stream,
                "{:.2} {:.2} {:.2} {:.2} k",
                cmyk.c, cmyk.m, cmyk.y, cmyk.k
            ),
            Color::Greyscale(gs) => writeln!(stream, "{:.2} g", gs.percent),
        };
    }
}

#[test]
fn channels_are_clamped() {
    let rgb = Rgb::new(-0.5, 1.5, 0.25);
    assert_eq!(rgb.r, 0.0);
    assert_eq!(rgb.g, 1.0);
    assert_eq!(rgb.b, 0.25);

    let cmyk = Cmyk::new(2.0, -1.0, 0.5, 0.0);
    assert_eq!(cmyk.c, 1.0);
    assert_eq!(cmyk.m, 0.0);
}

#[test]
fn cmyk_to_rgb_saturates() {
    let col = Color::Cmyk(Cmyk::new(0.6, 0.2, 0.0, 0.5));
    let rgb = col.to_rgb();
    assert!((rgb.r - 0.0).abs() < 1e-6); // 0.6 + 0.5 saturates
    assert!((rgb.g - 0.3).abs() < 1e-6);
    assert!((rgb.b - 0.5).abs() < 1e-6);
}

#[test]
fn gray_conversions() {
    let col = Color::Rgb(Rgb::new(1.0, 1.0, 1.0));
    assert!((col.to_greyscale() - 1.0).abs() < 1e-6);
    let col = Color::Greyscale(Greyscale::new(0.75));
    assert_eq!(col.to_cmyk(), Cmyk::new(0.0, 0.0, 0.0, 0.25));
}

#[test]
fn color_operator_emission() {
    let mut buf = String::new();
    Color::Rgb(Rgb::new(0.0, 0.5, 0.75)).write_fill(&mut buf);
    assert_eq!(buf, "0.00 0.50 0.75 rg\n");

    let mut buf = String::new();
    Color::Greyscale(Greyscale::new(0.75)).write_stroke(&mut buf);
    assert_eq!(buf, "0.75 G\n");
}
