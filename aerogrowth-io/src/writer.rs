//! JSON result writers.
//!
//! Artifacts are written as maps keyed by event label in event order. Times
//! are converted to `YYYY-MM-DD HH:MM:SS` strings on the way out; the events
//! themselves are never modified.

use crate::plan::RenderPlan;
use crate::Result;
use aerogrowth_core::time::JSON_TIME_FORMAT;
use aerogrowth_core::{Epoch, Event, EventTimestamps, GrowthLine, Point, RequestedWindow};
use log::info;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Builds the artifact prefix: the first three characters of the input file
/// name followed by the window start as `YYMMDD`.
#[must_use]
pub fn output_prefix(input: &Path, window: &RequestedWindow) -> String {
    let stem: String = input
        .file_name()
        .map(|name| name.to_string_lossy().chars().take(3).collect())
        .unwrap_or_default();
    format!("{stem}{}", window.start().format("%y%m%d"))
}

/// Writer for the result artifacts of one run.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    dir: PathBuf,
    prefix: String,
}

impl ResultWriter {
    /// Creates a writer placing `<prefix>_*.json` files in `dir`.
    pub fn new<P: AsRef<Path>>(dir: P, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.into(),
        }
    }

    /// Creates a writer named after the input file and requested window.
    pub fn for_run<P: AsRef<Path>>(dir: P, input: &Path, window: &RequestedWindow) -> Self {
        Self::new(dir, output_prefix(input, window))
    }

    /// Returns the artifact prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path of the final-events artifact.
    #[must_use]
    pub fn final_events_path(&self) -> PathBuf {
        self.dir.join(format!("{}_final_events.json", self.prefix))
    }

    /// Path of the per-timestamp artifact.
    #[must_use]
    pub fn ts_info_path(&self) -> PathBuf {
        self.dir.join(format!("{}_ts_info.json", self.prefix))
    }

    /// Path of the render plan.
    #[must_use]
    pub fn plot_path(&self) -> PathBuf {
        self.dir.join(format!("{}_plot.json", self.prefix))
    }

    /// Writes final events.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn write_final_events(&self, events: &[Event], epoch: &Epoch) -> Result<PathBuf> {
        let document = EventsDocument {
            events,
            epoch: *epoch,
        };
        self.write_json(self.final_events_path(), &document)
    }

    /// Writes the per-timestamp breakdown.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn write_ts_info(&self, timestamps: &[EventTimestamps<'_>], epoch: &Epoch) -> Result<PathBuf> {
        let document = TimestampsDocument {
            timestamps,
            epoch: *epoch,
        };
        self.write_json(self.ts_info_path(), &document)
    }

    /// Writes the render plan.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn write_plan(&self, plan: &RenderPlan) -> Result<PathBuf> {
        self.write_json(self.plot_path(), plan)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: PathBuf, value: &T) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        info!("wrote {}", path.display());
        Ok(path)
    }
}

struct Points<'a> {
    points: &'a [Point],
    epoch: Epoch,
}

impl Serialize for Points<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.points
                .iter()
                .map(|p| (self.epoch.format(p.time, JSON_TIME_FORMAT), p.diameter)),
        )
    }
}

struct LineRecord<'a> {
    line: &'a GrowthLine,
    epoch: Epoch,
}

impl Serialize for LineRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let raw = Points {
            points: &self.line.points,
            epoch: self.epoch,
        };
        let fitted = Points {
            points: &self.line.fitted_points,
            epoch: self.epoch,
        };
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("id", &self.line.id)?;
        map.serialize_entry("points", &raw)?;
        map.serialize_entry("fitted points", &fitted)?;
        map.serialize_entry("growth rate", &self.line.growth_rate)?;
        map.serialize_entry("method", &self.line.method)?;
        map.end()
    }
}

fn line_records<'a, I>(lines: I, epoch: Epoch) -> Vec<LineRecord<'a>>
where
    I: IntoIterator<Item = &'a GrowthLine>,
{
    lines
        .into_iter()
        .map(|line| LineRecord { line, epoch })
        .collect()
}

struct EventRecord<'a> {
    event: &'a Event,
    epoch: Epoch,
}

impl Serialize for EventRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let event = self.event;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("lines", &line_records(&event.lines, self.epoch))?;
        map.serialize_entry("num of lines", &event.num_lines())?;
        map.serialize_entry("avg growth rate", &event.rates.avg)?;
        map.serialize_entry("min growth rate", &event.rates.min)?;
        map.serialize_entry("max growth rate", &event.rates.max)?;
        if let Some(mafe) = event.mafe {
            map.serialize_entry("MAFE", &mafe)?;
        }
        if !event.afes.is_empty() {
            let afes: Vec<(&str, f64)> = event
                .afes
                .iter()
                .map(|afe| (afe.line_id.as_str(), afe.value))
                .collect();
            map.serialize_entry("respective AFEs", &afes)?;
        }
        let mid = event.mid_location;
        map.serialize_entry(
            "mid location",
            &(self.epoch.format(mid.time, JSON_TIME_FORMAT), mid.diameter),
        )?;
        map.end()
    }
}

struct EventsDocument<'a> {
    events: &'a [Event],
    epoch: Epoch,
}

impl Serialize for EventsDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.events.iter().map(|event| {
            (
                event.label.as_str(),
                EventRecord {
                    event,
                    epoch: self.epoch,
                },
            )
        }))
    }
}

struct TimestampsRecord<'a> {
    event: &'a EventTimestamps<'a>,
    epoch: Epoch,
}

impl Serialize for TimestampsRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut outer = serializer.serialize_map(Some(self.event.records.len()))?;
        for record in &self.event.records {
            let rates = record.rates.as_ref();
            let entry = TimestampEntry {
                lines: line_records(record.lines.iter().copied(), self.epoch),
                avg: rates.map(|r| r.avg),
                min: rates.map(|r| r.min),
                max: rates.map(|r| r.max),
            };
            outer.serialize_entry(&self.epoch.format(record.time, JSON_TIME_FORMAT), &entry)?;
        }
        outer.end()
    }
}

struct TimestampEntry<'a> {
    lines: Vec<LineRecord<'a>>,
    avg: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

impl Serialize for TimestampEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("lines", &self.lines)?;
        map.serialize_entry("avg growth rate", &self.avg)?;
        map.serialize_entry("min growth rate", &self.min)?;
        map.serialize_entry("max growth rate", &self.max)?;
        map.end()
    }
}

struct TimestampsDocument<'a> {
    timestamps: &'a [EventTimestamps<'a>],
    epoch: Epoch,
}

impl Serialize for TimestampsDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.timestamps.iter().map(|event| {
            (
                event.label,
                TimestampsRecord {
                    event,
                    epoch: self.epoch,
                },
            )
        }))
    }
}
