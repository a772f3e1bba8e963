//! Pitch classes, the 12-slot pitch ring, and pitch-driven marker colour.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// One of the 12 equal-tempered pitch classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D#")]
    DSharp,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "G#")]
    GSharp,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A#")]
    ASharp,
    #[serde(rename = "B")]
    B,
}

pub const PITCH_CLASS_COUNT: usize = 12;

impl PitchClass {
    pub const ALL: [PitchClass; PITCH_CLASS_COUNT] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Parse a label such as `"F#"`; flats are accepted as their enharmonic sharp.
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim();
        let found = Self::ALL.iter().copied().find(|p| p.label() == l);
        found.or(match l {
            "Db" => Some(PitchClass::CSharp),
            "Eb" => Some(PitchClass::DSharp),
            "Gb" => Some(PitchClass::FSharp),
            "Ab" => Some(PitchClass::GSharp),
            "Bb" => Some(PitchClass::ASharp),
            _ => None,
        })
    }

    /// Angle of the centre of this class's segment on the pitch ring.
    #[inline]
    pub fn ring_angle(self) -> f32 {
        let seg = TAU / PITCH_CLASS_COUNT as f32;
        self.index() as f32 * seg + seg * 0.5
    }

    #[inline]
    pub fn ring_direction(self) -> Vec2 {
        Vec2::from_angle(self.ring_angle())
    }
}

impl std::fmt::Display for PitchClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Strength per pitch class, indexed by [`PitchClass::index`].
pub type PitchStrengths = [f32; PITCH_CLASS_COUNT];

/// The single pitch class that clearly dominates, if any.
///
/// Active only when exactly one class is at or above `high` and every other
/// class is at or below `low`.
pub fn dominant_override(strengths: &PitchStrengths, high: f32, low: f32) -> Option<PitchClass> {
    let mut winner = None;
    for (i, &s) in strengths.iter().enumerate() {
        if s >= high {
            if winner.is_some() {
                return None;
            }
            winner = Some(i);
        } else if s > low {
            return None;
        }
    }
    winner.and_then(PitchClass::from_index)
}

/// Visual magnitude of each ring segment, a clamped linear remap of strength
/// from `[low, high]` to `[0, 1]`.
pub fn ring_levels(strengths: &PitchStrengths, low: f32, high: f32) -> PitchStrengths {
    let span = (high - low).max(f32::EPSILON);
    strengths.map(|s| ((s - low) / span).clamp(0.0, 1.0))
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Default for Hsl {
    // #4a90e2, the idle marker colour
    fn default() -> Self {
        Self {
            hue: 212.0,
            saturation: 72.0,
            lightness: 59.0,
        }
    }
}

impl Hsl {
    pub fn from_strength(
        strength: f32,
        saturation: f32,
        lightness_base: f32,
        lightness_span: f32,
    ) -> Self {
        let s = strength.clamp(0.0, 1.0);
        Self {
            hue: s * 360.0,
            saturation,
            lightness: lightness_base + s * lightness_span,
        }
    }

    /// sRGB components in `[0, 1]`.
    pub fn to_rgb(self) -> Vec3 {
        let h = (self.hue.rem_euclid(360.0)) / 360.0;
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);
        if s == 0.0 {
            return Vec3::splat(l);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Vec3::new(
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
