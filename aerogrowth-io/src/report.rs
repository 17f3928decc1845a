//! Reporter: point filtering, render plan and printed reports.

use crate::plan::{
    is_incomplete, Annotation, LineColor, LineTrace, PointSeries, RenderPlan, RenderedPointSets,
    Selection, NO_EVENTS_TEXT,
};
use crate::writer::ResultWriter;
use crate::Result;
use aerogrowth_algorithms::EventSets;
use aerogrowth_core::time::{JSON_TIME_FORMAT, TEXT_TIME_FORMAT};
use aerogrowth_core::{
    Detections, Epoch, Event, EventTimestamps, GrowthLine, LoadedSurfaces, Method, Point,
    RateSummary, ResultConfig,
};
use chrono::{Duration, NaiveTime};
use log::warn;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Separator line of printed reports.
const RULE_WIDTH: usize = 70;

/// Outcome of a run as seen by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// Final events were found.
    Events(usize),
    /// Synthesis produced no final events.
    NoEvents,
}

/// Formats a rate range as `avg (min–max)`.
///
/// A negative maximum gets a leading space so the dash stays readable.
#[must_use]
pub fn format_rate_range(rates: &RateSummary) -> String {
    let sign = if rates.max < 0.0 { " " } else { "" };
    format!(
        "{:.2} ({:.2}–{sign}{:.2})",
        rates.avg, rates.min, rates.max
    )
}

fn format_endpoint(point: Point, epoch: &Epoch) -> String {
    format!(
        "({}, {:.2})",
        epoch.format(point.time, TEXT_TIME_FORMAT),
        point.diameter
    )
}

fn format_line(line: &GrowthLine, epoch: &Epoch) -> String {
    format!(
        "{} → {} | {:.2}nm/h | {}",
        format_endpoint(line.start(), epoch),
        format_endpoint(line.end(), epoch),
        line.growth_rate,
        line.method
    )
}

/// Turns synthesized events into plans, text and a status.
#[derive(Debug, Clone, Copy)]
pub struct Reporter<'a> {
    results: &'a ResultConfig,
    surfaces: &'a LoadedSurfaces,
    detections: &'a Detections,
}

impl<'a> Reporter<'a> {
    /// Creates a reporter for one run.
    #[must_use]
    pub fn new(
        results: &'a ResultConfig,
        surfaces: &'a LoadedSurfaces,
        detections: &'a Detections,
    ) -> Self {
        Self {
            results,
            surfaces,
            detections,
        }
    }

    fn epoch(&self) -> Epoch {
        self.surfaces.epoch()
    }

    /// Classifies the run by its final events.
    #[must_use]
    pub fn status(&self, sets: &EventSets) -> ReportStatus {
        if sets.final_events.is_empty() {
            ReportStatus::NoEvents
        } else {
            ReportStatus::Events(sets.final_events.len())
        }
    }

    fn selection(&self) -> Selection {
        if self.results.plot_all_lines {
            Selection::AllLines
        } else if self.results.plot_all_events {
            Selection::AllEvents
        } else if self.results.plot_final_events {
            Selection::FinalEvents
        } else {
            Selection::Nothing
        }
    }

    /// Builds the render plan, or `None` if no plot toggle is set.
    #[must_use]
    pub fn render_plan(&self, sets: &EventSets) -> Option<RenderPlan> {
        if !self.results.renders_anything() {
            return None;
        }
        let epoch = self.epoch();
        let selection = self.selection();

        let events: &[Event] = match selection {
            Selection::AllEvents => &sets.all_events,
            Selection::FinalEvents => &sets.final_events,
            Selection::AllLines | Selection::Nothing => &[],
        };
        let lines: Vec<&GrowthLine> = match selection {
            Selection::AllLines => Method::ALL
                .iter()
                .flat_map(|&method| &self.detections.method(method).lines)
                .collect(),
            _ => events.iter().flat_map(|event| &event.lines).collect(),
        };

        let traces = lines
            .iter()
            .map(|line| {
                let markers = &self.detections.method(line.method).incomplete;
                LineTrace::new(line, is_incomplete(line, markers, &epoch), &epoch)
            })
            .collect();

        let event_info = if self.results.plot_event_info {
            events
                .iter()
                .filter(|event| !event.rates.is_single_rate())
                .map(|event| Annotation::at(format_rate_range(&event.rates), event.mid_location, &epoch))
                .collect()
        } else {
            Vec::new()
        };

        let events_selected = matches!(selection, Selection::AllEvents | Selection::FinalEvents);
        let no_events = if events_selected && events.is_empty() {
            self.centre_annotation()
        } else {
            None
        };

        if self.results.plot_disappearance_times {
            warn!("disappearance times are not part of the recorded detections; skipping");
        }

        Some(RenderPlan {
            selection,
            lines: traces,
            event_info,
            points: self.point_series(&lines, &epoch),
            day_boundaries: self.day_boundaries(),
            no_events,
        })
    }

    fn point_series(&self, lines: &[&GrowthLine], epoch: &Epoch) -> Vec<PointSeries> {
        let sets = RenderedPointSets::collect(lines.iter().copied(), epoch);
        Method::ALL
            .iter()
            .map(|&method| PointSeries {
                method,
                color: LineColor::for_method(method),
                points: self
                    .detections
                    .method(method)
                    .peaks
                    .iter()
                    .filter(|&&peak| {
                        self.results.plot_all_points || sets.admits(method, peak, epoch)
                    })
                    .map(|p| (epoch.format(p.time, JSON_TIME_FORMAT), p.diameter))
                    .collect(),
            })
            .collect()
    }

    fn day_boundaries(&self) -> Vec<String> {
        let Some((first, last)) = self.surfaces.display.time_range() else {
            return Vec::new();
        };
        let mut midnight = (first.date() + Duration::days(1)).and_time(NaiveTime::MIN);
        let mut boundaries = Vec::new();
        while midnight <= last {
            boundaries.push(midnight.format(JSON_TIME_FORMAT).to_string());
            midnight += Duration::days(1);
        }
        boundaries
    }

    fn centre_annotation(&self) -> Option<Annotation> {
        let display = &self.surfaces.display;
        let time = display.times().get(display.n_times() / 2)?;
        let diameter = display.diameters().get(display.n_diameters() / 2)?;
        Some(Annotation {
            text: NO_EVENTS_TEXT.to_string(),
            time: time.format(JSON_TIME_FORMAT).to_string(),
            diameter: *diameter,
        })
    }

    /// Writes the JSON artifacts selected by the save toggles.
    ///
    /// Nothing is written when there are no final events.
    ///
    /// # Errors
    /// Returns an error if an artifact cannot be written.
    pub fn save(
        &self,
        sets: &EventSets,
        timestamps: &[EventTimestamps<'_>],
        writer: &ResultWriter,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if self.status(sets) == ReportStatus::NoEvents {
            return Ok(written);
        }
        let epoch = self.epoch();
        if self.results.save_final_event_info {
            written.push(writer.write_final_events(&sets.final_events, &epoch)?);
        }
        if self.results.save_ts_info && !timestamps.is_empty() {
            written.push(writer.write_ts_info(timestamps, &epoch)?);
        }
        Ok(written)
    }

    /// Text report of final events.
    #[must_use]
    pub fn final_event_report(&self, events: &[Event]) -> String {
        let epoch = self.epoch();
        let mut out = String::new();
        let _ = writeln!(out, "\n{}", "*".repeat(RULE_WIDTH));
        let _ = writeln!(out, "Found {} growth events:", events.len());
        if events.is_empty() {
            let _ = writeln!(out, "{NO_EVENTS_TEXT}");
        }

        for (i, event) in events.iter().enumerate() {
            let _ = writeln!(out, "\n*Event{}*", i + 1);
            for line in &event.lines {
                let _ = writeln!(out, "{}", format_line(line, &epoch));
            }
            let _ = writeln!(
                out,
                "Estimated event growth rate: {} nm/h",
                format_rate_range(&event.rates)
            );
            if let Some(mafe) = event.mafe {
                let _ = writeln!(out, "MAFE: {mafe:.3}");
            }
            if !event.afes.is_empty() {
                let _ = writeln!(out, "AFEs:");
                for afe in &event.afes {
                    let _ = writeln!(out, "{}: {:.3}", afe.line_id, afe.value);
                }
            }
        }
        out
    }

    /// Text report of the per-timestamp breakdown.
    #[must_use]
    pub fn timestamp_report(&self, timestamps: &[EventTimestamps<'_>]) -> String {
        let epoch = self.epoch();
        let mut out = String::new();
        let _ = writeln!(out, "\n{}", "*".repeat(RULE_WIDTH));
        let _ = writeln!(out, "Growth lines in each timestamp.");

        for event in timestamps {
            let _ = writeln!(out, "\n{}:", event.label);
            for record in &event.records {
                let _ = writeln!(out, "{}:", epoch.format(record.time, TEXT_TIME_FORMAT));
                for line in &record.lines {
                    let _ = writeln!(out, "{}", format_line(line, &epoch));
                }
                match &record.rates {
                    Some(rates) => {
                        let _ = writeln!(
                            out,
                            "Estimated growth rate for timestamp: {} nm/h",
                            format_rate_range(rates)
                        );
                    }
                    None => {
                        let _ = writeln!(out, "No lines in this timestamp!");
                    }
                }
            }
        }
        out
    }
}
