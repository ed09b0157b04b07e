//! Track command - replay recorded location samples.
//!
//! Input is one sample per line as `lat,lon`. `#off` stops tracking and `#on`
//! starts a fresh path; other lines starting with `#` and blank lines are ignored.
//! Tracking starts on.

use std::fs;
use std::path::Path;

use offlinemap::region::Extent;
use offlinemap::track::{Position, TrackRecorder};
use offlinemap::view::{HeadlessView, MapViewSurface};

use crate::error::CliError;
use crate::runner::CliRunner;

/// One parsed input line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackLine {
    Sample { latitude: f64, longitude: f64 },
    Tracking(bool),
    Skip,
}

/// Parse one input line.
pub fn parse_track_line(line: &str) -> Result<TrackLine, String> {
    let line = line.trim();
    match line {
        "" => return Ok(TrackLine::Skip),
        "#on" => return Ok(TrackLine::Tracking(true)),
        "#off" => return Ok(TrackLine::Tracking(false)),
        _ if line.starts_with('#') => return Ok(TrackLine::Skip),
        _ => {}
    }

    let (lat, lon) = line
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lon', got '{}'", line))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {} out of range", latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {} out of range", longitude));
    }

    Ok(TrackLine::Sample {
        latitude,
        longitude,
    })
}

/// Counts from a replay.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub recorded: usize,
    pub dropped: usize,
}

/// Feed parsed lines through a recorder.
pub fn replay<V: MapViewSurface>(
    lines: &[TrackLine],
    recorder: &mut TrackRecorder,
    view: &mut V,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for line in lines {
        match *line {
            TrackLine::Sample {
                latitude,
                longitude,
            } => {
                if recorder.on_position_sample(Position::new(latitude, longitude), view) {
                    summary.recorded += 1;
                } else {
                    summary.dropped += 1;
                }
            }
            TrackLine::Tracking(enabled) => {
                recorder.set_tracking(enabled, view);
            }
            TrackLine::Skip => {}
        }
    }
    summary
}

/// Read and parse a track file.
pub fn read_track_file(input: &Path) -> Result<Vec<TrackLine>, CliError> {
    let content = fs::read_to_string(input).map_err(|e| CliError::Input {
        path: input.to_path_buf(),
        reason: e.to_string(),
    })?;
    content
        .lines()
        .enumerate()
        .map(|(i, line)| {
            parse_track_line(line).map_err(|reason| CliError::Input {
                path: input.to_path_buf(),
                reason: format!("line {}: {}", i + 1, reason),
            })
        })
        .collect()
}

/// Run the track command.
pub fn run(input: &Path, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug)?;
    runner.log_startup("track");

    let lines = read_track_file(input)?;

    let mut view = HeadlessView::new(Extent::new(-180.0, -85.0, 180.0, 85.0), 0.0);
    let mut recorder = TrackRecorder::new();
    recorder.set_tracking(true, &mut view);

    let summary = replay(&lines, &mut recorder, &mut view);
    let path = view.track();

    println!("Samples recorded: {}", summary.recorded);
    println!("Samples dropped:  {}", summary.dropped);
    println!("Tracking:         {}", if recorder.is_tracking() { "on" } else { "off" });
    println!("Auto-pan:         {}", view.auto_pan_mode());
    println!("Path length:      {:.1} m", path.length_meters());
    println!();
    for (lon, lat) in path.points() {
        println!("{:.6},{:.6}", lat, lon);
    }

    Ok(())
}
