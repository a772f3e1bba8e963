use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use groove_core::{Analysis, BoundaryPolicy, SynthConfig};
use std::path::{Path, PathBuf};

mod frames;
mod summary;
mod trace;

/// Offline companion to the groove-viz web front end
#[derive(Parser)]
#[command(name = "groove")]
#[command(version)]
struct Cli {
    /// Log at debug level (beats, seeks)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the motion synthesizer over an analysis and print the marker path
    Trace {
        analysis: PathBuf,
        /// Samples per second of playback
        #[arg(long, default_value_t = groove_core::constants::DEFAULT_FPS)]
        fps: f64,
        /// JSON tuning overrides
        #[arg(long)]
        config: Option<PathBuf>,
        /// reflect | reset
        #[arg(long)]
        boundary: Option<BoundaryPolicy>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// Counts, duration, tempo and beat regularity of an analysis
    Summary {
        analysis: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Check a directory of per-frame documents for gaps and parse errors
    Frames {
        dir: PathBuf,
        #[arg(long)]
        count: usize,
        #[arg(long, value_enum, default_value_t = frames::FrameKind::Keypoints)]
        kind: frames::FrameKind,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn read_analysis(path: &Path) -> Result<Analysis> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Analysis::from_json_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn read_config(path: Option<&Path>) -> Result<SynthConfig> {
    let Some(path) = path else {
        return Ok(SynthConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    SynthConfig::from_json_str(&text).with_context(|| format!("config {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::builder()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Trace {
            analysis,
            fps,
            config,
            boundary,
            format,
        } => {
            let a = read_analysis(&analysis)?;
            let mut cfg = read_config(config.as_deref())?;
            if let Some(b) = boundary {
                cfg = cfg.with_boundary(b);
            }
            let rows = trace::trace(a, cfg, fps);
            log::info!("[trace] {} samples at {} fps", rows.len(), fps);
            match format {
                OutputFormat::Csv => trace::write_csv(&mut out, &rows)?,
                OutputFormat::Json => serde_json::to_writer_pretty(&mut out, &rows)?,
            }
        }
        Commands::Summary { analysis, json } => {
            let s = summary::summarize(&read_analysis(&analysis)?);
            if json {
                serde_json::to_writer_pretty(&mut out, &s)?;
            } else {
                summary::write_text(&mut out, &s)?;
            }
        }
        Commands::Frames { dir, count, kind } => {
            let report = frames::check_dir(&dir, count, kind);
            frames::write_report(&mut out, &report)?;
            if report.progress.loaded == 0 && count > 0 {
                anyhow::bail!("no frames could be loaded from {}", dir.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_arguments_parse() {
        let cli = Cli::try_parse_from([
            "groove", "trace", "a.json", "--fps", "60", "--boundary", "reflect", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Trace {
                fps,
                boundary,
                format,
                config,
                ..
            } => {
                assert_eq!(fps, 60.0);
                assert_eq!(boundary, Some(BoundaryPolicy::ReflectAtBoundary));
                assert_eq!(format, OutputFormat::Json);
                assert!(config.is_none());
            }
            _ => panic!("expected trace"),
        }
    }

    #[test]
    fn unknown_boundary_is_rejected() {
        assert!(Cli::try_parse_from(["groove", "trace", "a.json", "--boundary", "wrap"]).is_err());
    }

    #[test]
    fn frames_requires_a_count() {
        assert!(Cli::try_parse_from(["groove", "frames", "dir"]).is_err());
        let cli =
            Cli::try_parse_from(["groove", "frames", "dir", "--count", "3", "--kind", "mesh"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Frames {
                count: 3,
                kind: frames::FrameKind::Mesh,
                ..
            }
        ));
    }

    #[test]
    fn missing_config_means_defaults() {
        assert_eq!(read_config(None).unwrap(), SynthConfig::default());
    }
}
