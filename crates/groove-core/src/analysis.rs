//! Pre-computed audio analysis: spectral features, pitch content, beats and onsets.
//!
//! The JSON layout is the one written by the offline analysis script:
//!
//! ```json
//! {
//!   "pitch_analysis": [{ "time": 0.0, "dominant_pitches": [{"note": "C", "strength": 0.9}],
//!                        "all_pitches": {"C": 0.9, "C#": 0.1, "...": 0.0} }],
//!   "temporal_features": { "beats": [0.5, 1.0], "onsets": [0.49],
//!                          "spectral_features": [{ "time": 0.0, "spectral_centroid": 1800.0,
//!                                                  "spectral_rolloff": 4200.0,
//!                                                  "zero_crossing_rate": 0.08, "rms_energy": 0.2 }] },
//!   "metadata": { "duration": 180.0, "tempo": 120.0 }
//! }
//! ```

use crate::error::AnalysisError;
use crate::pitch::{PitchClass, PitchStrengths, PITCH_CLASS_COUNT};
use crate::timeline::{self, Timed};
use fnv::FnvHashMap;
use serde::{Deserialize, Deserializer};
use smallvec::SmallVec;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SpectralSample {
    pub time: f64,
    pub spectral_centroid: f32,
    pub spectral_rolloff: f32,
    #[serde(default)]
    pub zero_crossing_rate: f32,
    pub rms_energy: f32,
}

impl Timed for SpectralSample {
    #[inline]
    fn time(&self) -> f64 {
        self.time
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DominantPitch {
    pub pitch: PitchClass,
    pub strength: f32,
}

#[derive(Deserialize)]
struct DominantLabel {
    #[serde(alias = "note")]
    pitch: String,
    strength: f32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PitchSample {
    pub time: f64,
    #[serde(default, deserialize_with = "dominant_from_labels")]
    pub dominant_pitches: SmallVec<[DominantPitch; 3]>,
    #[serde(default, deserialize_with = "strengths_from_labels")]
    pub all_pitches: PitchStrengths,
}

impl PitchSample {
    /// Strength of the strongest listed pitch, if any.
    #[inline]
    pub fn dominant_strength(&self) -> Option<f32> {
        self.dominant_pitches.first().map(|d| d.strength)
    }
}

impl Timed for PitchSample {
    #[inline]
    fn time(&self) -> f64 {
        self.time
    }
}

fn dominant_from_labels<'de, D>(de: D) -> Result<SmallVec<[DominantPitch; 3]>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels: Vec<DominantLabel> = Vec::deserialize(de)?;
    Ok(labels
        .into_iter()
        .filter_map(|d| match PitchClass::from_label(&d.pitch) {
            Some(pitch) => Some(DominantPitch {
                pitch,
                strength: d.strength,
            }),
            None => {
                log::warn!("[analysis] ignoring unknown dominant pitch '{}'", d.pitch);
                None
            }
        })
        .collect())
}

fn strengths_from_labels<'de, D>(de: D) -> Result<PitchStrengths, D::Error>
where
    D: Deserializer<'de>,
{
    let map: FnvHashMap<String, f32> = FnvHashMap::deserialize(de)?;
    let mut out = [0.0; PITCH_CLASS_COUNT];
    for (label, strength) in map {
        match PitchClass::from_label(&label) {
            Some(p) => out[p.index()] = strength,
            None => log::warn!("[analysis] ignoring unknown pitch label '{}'", label),
        }
    }
    Ok(out)
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TemporalFeatures {
    #[serde(default)]
    pub beats: Vec<f64>,
    #[serde(default)]
    pub onsets: Vec<f64>,
    #[serde(default)]
    pub spectral_features: Vec<SpectralSample>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisMetadata {
    pub filename: Option<String>,
    pub duration: Option<f64>,
    pub sample_rate: Option<u32>,
    pub tempo: Option<f64>,
    pub total_onsets: Option<usize>,
    pub total_beats: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSummary {
    pub avg_spectral_centroid: Option<f64>,
    pub avg_rms_energy: Option<f64>,
    pub onset_density: Option<f64>,
    pub beat_consistency: Option<f64>,
}

/// Raw analysis document as found on disk or over HTTP.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AnalysisDocument {
    #[serde(default)]
    pub pitch_analysis: Vec<PitchSample>,
    #[serde(default)]
    pub temporal_features: TemporalFeatures,
    #[serde(default)]
    pub metadata: Option<AnalysisMetadata>,
    #[serde(default)]
    pub analysis_summary: Option<AnalysisSummary>,
}

/// Validated, read-only analysis. All series are sorted by time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Analysis {
    pub spectral: Vec<SpectralSample>,
    pub pitch: Vec<PitchSample>,
    pub beats: Vec<f64>,
    pub onsets: Vec<f64>,
    pub metadata: Option<AnalysisMetadata>,
    pub summary: Option<AnalysisSummary>,
}

impl Analysis {
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let doc: AnalysisDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, AnalysisError> {
        let doc: AnalysisDocument = serde_json::from_slice(bytes)?;
        Self::from_document(doc)
    }

    pub fn from_document(doc: AnalysisDocument) -> Result<Self, AnalysisError> {
        let AnalysisDocument {
            pitch_analysis,
            temporal_features,
            metadata,
            analysis_summary,
        } = doc;
        check_series("spectral_features", &temporal_features.spectral_features)?;
        check_series("pitch_analysis", &pitch_analysis)?;
        check_series("beats", &temporal_features.beats)?;
        check_series("onsets", &temporal_features.onsets)?;
        Ok(Self {
            spectral: temporal_features.spectral_features,
            pitch: pitch_analysis,
            beats: temporal_features.beats,
            onsets: temporal_features.onsets,
            metadata,
            summary: analysis_summary,
        })
    }

    #[inline]
    pub fn spectral_at(&self, t: f64) -> Option<&SpectralSample> {
        timeline::nearest_sample(&self.spectral, t)
    }

    #[inline]
    pub fn pitch_at(&self, t: f64) -> Option<&PitchSample> {
        timeline::nearest_sample(&self.pitch, t)
    }

    /// Track length: the declared duration, else the latest timestamp in any series.
    pub fn duration(&self) -> f64 {
        if let Some(d) = self.metadata.as_ref().and_then(|m| m.duration) {
            return d;
        }
        [
            self.spectral.last().map(|s| s.time),
            self.pitch.last().map(|s| s.time),
            self.beats.last().copied(),
            self.onsets.last().copied(),
        ]
        .into_iter()
        .flatten()
        .fold(0.0, f64::max)
    }

    /// Mean RMS energy of spectral samples with `from <= time <= to`.
    pub fn mean_rms(&self, from: f64, to: f64) -> Option<f32> {
        let lo = timeline::first_at_or_after(&self.spectral, from);
        let hi = self.spectral.partition_point(|s| s.time <= to);
        let window = self.spectral.get(lo..hi).filter(|w| !w.is_empty())?;
        let sum: f32 = window.iter().map(|s| s.rms_energy).sum();
        Some(sum / window.len() as f32)
    }

    /// Inter-beat statistics, `None` with fewer than two beats.
    pub fn beat_stats(&self) -> Option<BeatStats> {
        if self.beats.len() < 2 {
            return None;
        }
        let intervals: Vec<f64> = self.beats.windows(2).map(|w| w[1] - w[0]).collect();
        let n = intervals.len() as f64;
        let mean = intervals.iter().sum::<f64>() / n;
        let var = intervals.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
        Some(BeatStats {
            count: self.beats.len(),
            mean_interval: mean,
            interval_std: var.sqrt(),
            tempo_bpm: if mean > 0.0 { 60.0 / mean } else { 0.0 },
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatStats {
    pub count: usize,
    pub mean_interval: f64,
    pub interval_std: f64,
    pub tempo_bpm: f64,
}

fn check_series<T: Timed>(series: &'static str, items: &[T]) -> Result<(), AnalysisError> {
    if let Some(index) = timeline::first_non_finite(items) {
        return Err(AnalysisError::NonFinite { series, index });
    }
    if let Some(index) = timeline::first_unsorted(items) {
        return Err(AnalysisError::Unsorted { series, index });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "pitch_analysis": [
            {"time": 0.0, "dominant_pitches": [{"note": "A", "strength": 0.9}, {"pitch": "E", "strength": 0.4}],
             "all_pitches": {"A": 0.9, "E": 0.4, "X": 1.0}}
        ],
        "temporal_features": {
            "beats": [0.5, 1.0, 1.5],
            "spectral_features": [
                {"time": 0.0, "spectral_centroid": 1000.0, "spectral_rolloff": 2000.0, "zero_crossing_rate": 0.1, "rms_energy": 0.2},
                {"time": 0.5, "spectral_centroid": 1100.0, "spectral_rolloff": 2100.0, "zero_crossing_rate": 0.1, "rms_energy": 0.4}
            ]
        },
        "metadata": {"duration": 2.0, "tempo": 120.0}
    }"#;

    #[test]
    fn parses_note_and_pitch_keys() {
        let a = Analysis::from_json_str(DOC).unwrap();
        let p = &a.pitch[0];
        assert_eq!(p.dominant_pitches[0].pitch, PitchClass::A);
        assert_eq!(p.dominant_pitches[1].pitch, PitchClass::E);
        assert_eq!(p.all_pitches[PitchClass::A.index()], 0.9);
        assert_eq!(p.all_pitches[PitchClass::C.index()], 0.0);
        assert!(a.onsets.is_empty());
    }

    #[test]
    fn flat_and_unknown_dominant_labels_do_not_reject_the_document() {
        let doc = r#"{"pitch_analysis": [{"time": 0.0,
            "dominant_pitches": [{"note": "Bb", "strength": 0.8}, {"note": "H", "strength": 0.5},
                                 {"note": "Eb", "strength": 0.3}],
            "all_pitches": {"Bb": 0.8}}]}"#;
        let a = Analysis::from_json_str(doc).unwrap();
        let p = &a.pitch[0];
        assert_eq!(p.dominant_pitches.len(), 2);
        assert_eq!(p.dominant_pitches[0].pitch, PitchClass::ASharp);
        assert_eq!(p.dominant_pitches[1].pitch, PitchClass::DSharp);
        assert_eq!(p.all_pitches[PitchClass::ASharp.index()], 0.8);
    }

    #[test]
    fn duration_prefers_metadata() {
        let mut a = Analysis::from_json_str(DOC).unwrap();
        assert_eq!(a.duration(), 2.0);
        a.metadata = None;
        assert_eq!(a.duration(), 1.5);
    }

    #[test]
    fn mean_rms_over_inclusive_window() {
        let a = Analysis::from_json_str(DOC).unwrap();
        assert!((a.mean_rms(0.0, 0.5).unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(a.mean_rms(0.6, 0.9), None);
    }

    #[test]
    fn rejects_unsorted_beats() {
        let doc = r#"{"temporal_features": {"beats": [1.0, 0.5]}}"#;
        match Analysis::from_json_str(doc) {
            Err(AnalysisError::Unsorted { series, index }) => {
                assert_eq!(series, "beats");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn beat_stats_tempo() {
        let a = Analysis::from_json_str(DOC).unwrap();
        let s = a.beat_stats().unwrap();
        assert_eq!(s.count, 3);
        assert!((s.tempo_bpm - 120.0).abs() < 1e-9);
        assert!(s.interval_std.abs() < 1e-12);
    }
}
