use groove_core::{Analysis, PitchClass, PITCH_CLASS_COUNT};
use serde::Serialize;
use std::io::Write;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub duration: f64,
    pub spectral_samples: usize,
    pub pitch_samples: usize,
    pub beats: usize,
    pub onsets: usize,
    /// Declared tempo, else derived from the mean beat interval.
    pub tempo_bpm: Option<f64>,
    pub beat_interval_mean: Option<f64>,
    pub beat_interval_std: Option<f64>,
    pub mean_rms: Option<f32>,
    /// How often each pitch class is listed first, in `C..B` order.
    pub dominant_counts: Vec<(String, usize)>,
}

pub fn summarize(a: &Analysis) -> Summary {
    let stats = a.beat_stats();
    let declared_tempo = a.metadata.as_ref().and_then(|m| m.tempo);

    let mut counts = [0usize; PITCH_CLASS_COUNT];
    for p in a.pitch.iter().filter_map(|s| s.dominant_pitches.first()) {
        counts[p.pitch.index()] += 1;
    }

    let mean_rms = (!a.spectral.is_empty()).then(|| {
        a.spectral.iter().map(|s| s.rms_energy).sum::<f32>() / a.spectral.len() as f32
    });

    Summary {
        duration: a.duration(),
        spectral_samples: a.spectral.len(),
        pitch_samples: a.pitch.len(),
        beats: a.beats.len(),
        onsets: a.onsets.len(),
        tempo_bpm: declared_tempo.or(stats.map(|s| s.tempo_bpm)),
        beat_interval_mean: stats.map(|s| s.mean_interval),
        beat_interval_std: stats.map(|s| s.interval_std),
        mean_rms,
        dominant_counts: PitchClass::ALL
            .iter()
            .map(|p| (p.label().to_string(), counts[p.index()]))
            .collect(),
    }
}

fn opt(v: Option<f64>, unit: &str) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.3}{}", v, unit))
}

pub fn write_text(out: &mut impl Write, s: &Summary) -> std::io::Result<()> {
    writeln!(out, "duration        {}", groove_core::format_time(s.duration))?;
    writeln!(out, "spectral        {}", s.spectral_samples)?;
    writeln!(out, "pitch           {}", s.pitch_samples)?;
    writeln!(out, "beats           {}", s.beats)?;
    writeln!(out, "onsets          {}", s.onsets)?;
    writeln!(out, "tempo           {}", opt(s.tempo_bpm, " bpm"))?;
    writeln!(out, "beat interval   {}", opt(s.beat_interval_mean, "s"))?;
    writeln!(out, "interval std    {}", opt(s.beat_interval_std, "s"))?;
    writeln!(out, "mean rms        {}", opt(s.mean_rms.map(f64::from), ""))?;
    let total: usize = s.dominant_counts.iter().map(|(_, n)| n).sum();
    if total > 0 {
        writeln!(out, "dominant pitch")?;
        for (label, n) in s.dominant_counts.iter().filter(|(_, n)| *n > 0) {
            writeln!(out, "  {:<3} {:>6}  {:>5.1}%", label, n, *n as f64 * 100.0 / total as f64)?;
        }
    }
    Ok(())
}
