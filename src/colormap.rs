//! IPS color scale and legend
//!
//! A nine-stop linear colormap, red for the lowest score through yellow and
//! green to blue for the highest. The domain is the score range of the whole
//! joined table, so a school keeps its color whatever the checkboxes say.

use std::fmt;

use serde::Serialize;

use crate::error::{IpsMapError, Result};
use crate::join::SchoolTable;

/// Legend caption
pub const IPS_CAPTION: &str = "Indice de Position Sociale (IPS)";

/// Number of tick labels under the legend gradient
pub const LEGEND_TICKS: usize = 6;

/// RGB color, displayed and serialised as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Low to high score
pub const IPS_PALETTE: [Rgb; 9] = [
    Rgb::new(0xd7, 0x19, 0x1c),
    Rgb::new(0xe7, 0x68, 0x18),
    Rgb::new(0xf2, 0x9e, 0x2e),
    Rgb::new(0xf9, 0xd0, 0x57),
    Rgb::new(0xff, 0xff, 0x8c),
    Rgb::new(0x90, 0xeb, 0x9d),
    Rgb::new(0x00, 0xcc, 0xbc),
    Rgb::new(0x00, 0xa6, 0xca),
    Rgb::new(0x2c, 0x7b, 0xb6),
];

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(f64::from(c1.r), f64::from(c2.r), t).round() as u8,
        lerp(f64::from(c1.g), f64::from(c2.g), t).round() as u8,
        lerp(f64::from(c1.b), f64::from(c2.b), t).round() as u8,
    )
}

/// Piecewise-linear colormap over evenly spaced stops between `vmin` and `vmax`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearColormap {
    pub colors: Vec<Rgb>,
    pub vmin: f64,
    pub vmax: f64,
    pub caption: String,
}

impl LinearColormap {
    /// Colormap over `colors`, which must not be empty
    pub fn new(colors: &[Rgb], vmin: f64, vmax: f64, caption: &str) -> Result<Self> {
        if colors.is_empty() {
            return Err(IpsMapError::Config(
                "a colormap needs at least one color".to_string(),
            ));
        }
        Ok(Self {
            colors: colors.to_vec(),
            vmin,
            vmax,
            caption: caption.to_string(),
        })
    }

    /// The IPS scale over the score range of the whole joined table
    ///
    /// An empty table gets the degenerate domain `[0, 0]`.
    pub fn for_schools(table: &SchoolTable) -> Result<Self> {
        let (vmin, vmax) = table.score_range()?.unwrap_or((0.0, 0.0));
        log::debug!("IPS color scale over [{vmin}, {vmax}]");
        Self::new(&IPS_PALETTE, vmin, vmax, IPS_CAPTION)
    }

    /// Fractional stop position of `value`, from 0 (first color) to `colors.len() - 1`
    ///
    /// Non-decreasing in `value`; values outside the domain clamp to the ends.
    #[must_use]
    pub fn position(&self, value: f64) -> f64 {
        let last = (self.colors.len() - 1) as f64;
        if self.vmax <= self.vmin || value.is_nan() || value <= self.vmin {
            return 0.0;
        }
        if value >= self.vmax {
            return last;
        }
        (value - self.vmin) / (self.vmax - self.vmin) * last
    }

    /// Color of `value`
    #[must_use]
    pub fn color(&self, value: f64) -> Rgb {
        let position = self.position(value);
        let lower = position.floor() as usize;
        if lower + 1 >= self.colors.len() {
            return self.colors[self.colors.len() - 1];
        }
        lerp_color(self.colors[lower], self.colors[lower + 1], position - lower as f64)
    }

    /// Legend description: gradient stops and evenly spaced ticks
    #[must_use]
    pub fn legend(&self) -> Legend {
        let ticks = (0..LEGEND_TICKS)
            .map(|i| lerp(self.vmin, self.vmax, i as f64 / (LEGEND_TICKS - 1) as f64))
            .collect();
        Legend {
            caption: self.caption.clone(),
            vmin: self.vmin,
            vmax: self.vmax,
            colors: self.colors.clone(),
            ticks,
        }
    }
}

/// What the legend widget shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub caption: String,
    pub vmin: f64,
    pub vmax: f64,
    pub colors: Vec<Rgb>,
    pub ticks: Vec<f64>,
}
