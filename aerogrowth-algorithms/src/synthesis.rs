//! Event synthesis: clustering growth lines from all methods into events.

use crate::graph::connected_components;
use crate::linking::{LinkPolicy, OverlapLinking};
use crate::statistics::build_event;
use aerogrowth_core::{
    ConcentrationSurface, Epoch, Event, EventConfig, GrowthLine, Method, PeakAreaEdge,
};
use log::{debug, info};
use std::collections::BTreeSet;

/// Every detected event and the quality-filtered subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSets {
    /// Every cluster of linked lines.
    pub all_events: Vec<Event>,
    /// Events passing the quality gate; the authoritative result.
    pub final_events: Vec<Event>,
}

impl EventSets {
    /// Returns true if no event was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all_events.is_empty()
    }
}

/// Line sets from the three methods.
#[derive(Debug, Clone, Copy)]
struct MethodLines<'a> {
    mode_fitting: &'a [GrowthLine],
    max_concentration: &'a [GrowthLine],
    appearance_time: &'a [GrowthLine],
}

impl<'a> MethodLines<'a> {
    fn iter(&self) -> impl Iterator<Item = (Method, &'a GrowthLine)> {
        let tag = |method: Method, lines: &'a [GrowthLine]| lines.iter().map(move |l| (method, l));
        tag(Method::ModeFitting, self.mode_fitting)
            .chain(tag(Method::MaxConcentration, self.max_concentration))
            .chain(tag(Method::AppearanceTime, self.appearance_time))
    }
}

/// Clusters growth lines into events and applies the quality gate.
#[derive(Debug, Clone)]
pub struct EventSynthesizer<P = OverlapLinking> {
    policy: P,
    config: EventConfig,
}

impl EventSynthesizer<OverlapLinking> {
    /// Creates a synthesizer with the default overlap policy.
    #[must_use]
    pub fn new(config: EventConfig) -> Self {
        Self {
            policy: OverlapLinking,
            config,
        }
    }
}

impl<P: LinkPolicy> EventSynthesizer<P> {
    /// Creates a synthesizer with a custom linking policy.
    #[must_use]
    pub fn with_policy(policy: P, config: EventConfig) -> Self {
        Self { policy, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EventConfig {
        &self.config
    }

    /// Builds all events and the final events.
    ///
    /// `surface` is the padded surface the lines were detected on and is
    /// used to snap line starts to diameter channels. `display_surface`
    /// bounds the period an event must touch to be final. `epoch` maps
    /// surface timestamps onto the lines' day offsets.
    ///
    /// # Panics
    /// Panics if a line breaks the line contract or is filed under the
    /// wrong method.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn init_events(
        &self,
        surface: &ConcentrationSurface,
        display_surface: &ConcentrationSurface,
        epoch: &Epoch,
        mf_lines: &[GrowthLine],
        mc_lines: &[GrowthLine],
        at_lines: &[GrowthLine],
        mc_area_edges: &[PeakAreaEdge],
        max_growth_start_channel: f64,
    ) -> EventSets {
        let method_lines = MethodLines {
            mode_fitting: mf_lines,
            max_concentration: mc_lines,
            appearance_time: at_lines,
        };

        let lines: Vec<GrowthLine> = method_lines
            .iter()
            .map(|(method, line)| {
                assert_eq!(
                    line.method, method,
                    "growth line {} is tagged {} but was passed as {}",
                    line.id, line.method, method
                );
                line.assert_contract();
                line.clone()
            })
            .collect();

        let components = connected_components(&lines, &self.policy, &self.config);
        debug!(
            "{} policy linked {} lines into {} clusters",
            self.policy.name(),
            lines.len(),
            components.len()
        );

        let clusters: Vec<Vec<GrowthLine>> = components
            .into_iter()
            .map(|indices| indices.into_iter().map(|i| lines[i].clone()).collect())
            .collect();
        let all_events = label_events(clusters);

        let gate = QualityGate {
            surface,
            display_range: display_surface.day_range(epoch),
            mc_area_edges,
            max_growth_start_channel,
            config: &self.config,
        };
        let final_clusters: Vec<Vec<GrowthLine>> = all_events
            .iter()
            .filter_map(|event| gate.admit(event))
            .collect();
        let final_events = label_events(final_clusters);

        info!(
            "Found {} events ({} final)",
            all_events.len(),
            final_events.len()
        );
        EventSets {
            all_events,
            final_events,
        }
    }
}

/// Builds events and labels them `event1..` in start-time order.
fn label_events(clusters: Vec<Vec<GrowthLine>>) -> Vec<Event> {
    let mut events: Vec<Event> = clusters
        .into_iter()
        .filter_map(|lines| build_event(String::new(), lines))
        .collect();
    events.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
    for (i, event) in events.iter_mut().enumerate() {
        event.label = format!("event{}", i + 1);
    }
    events
}

/// Quality criteria separating final events from all events.
struct QualityGate<'a> {
    surface: &'a ConcentrationSurface,
    display_range: Option<(f64, f64)>,
    mc_area_edges: &'a [PeakAreaEdge],
    max_growth_start_channel: f64,
    config: &'a EventConfig,
}

impl QualityGate<'_> {
    /// Returns the lines of `event` that make it a final event, if any.
    fn admit(&self, event: &Event) -> Option<Vec<GrowthLine>> {
        let lines: Vec<GrowthLine> = event
            .lines
            .iter()
            .filter(|line| self.starts_low_enough(line))
            .cloned()
            .collect();
        if lines.is_empty() {
            debug!("{}: every line starts above the start channel limit", event.label);
            return None;
        }

        let (lo, hi) = self.display_range?;
        let visible = lines
            .iter()
            .flat_map(|line| &line.fitted_points)
            .any(|p| p.time >= lo && p.time <= hi);
        if !visible {
            debug!("{}: outside the display window", event.label);
            return None;
        }

        let methods: BTreeSet<Method> = lines.iter().map(|line| line.method).collect();
        if methods.len() < self.config.min_methods && !self.has_area_support(&lines) {
            debug!(
                "{}: {} method(s) and no peak-area support",
                event.label,
                methods.len()
            );
            return None;
        }

        Some(lines)
    }

    fn starts_low_enough(&self, line: &GrowthLine) -> bool {
        let start = line.start().diameter;
        let channel = self.surface.nearest_diameter(start).unwrap_or(start);
        channel <= self.max_growth_start_channel
    }

    fn has_area_support(&self, lines: &[GrowthLine]) -> bool {
        lines
            .iter()
            .filter(|line| line.method != Method::ModeFitting)
            .any(|line| {
                self.mc_area_edges
                    .iter()
                    .any(|area| area.contains(line.start(), self.config.area_channel_tolerance))
            })
    }
}
