use aerogrowth_algorithms::{timestamp_info, EventSynthesizer, LinkPolicy};
use aerogrowth_core::{
    ConcentrationSurface, Epoch, EventConfig, GrowthLine, Method, PeakAreaEdge, Point,
};
use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use ndarray::Array2;

const DIAMETERS: [f64; 11] = [3.0, 5.0, 7.0, 10.0, 15.0, 20.0, 30.0, 40.0, 50.0, 60.0, 80.0];
const MAX_START: f64 = 40.0;

fn epoch_origin() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2004, 9, 20)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn hourly_surface(from: NaiveDateTime, hours: i64) -> ConcentrationSurface {
    let times: Vec<NaiveDateTime> = (0..hours).map(|h| from + Duration::hours(h)).collect();
    let values = Array2::from_elem((times.len(), DIAMETERS.len()), 1.0);
    ConcentrationSurface::new(times, DIAMETERS.to_vec(), values).unwrap()
}

/// Padded surface from 2004-09-19 12:00 to 2004-09-21 11:00, display surface
/// covering 2004-09-20.
fn surfaces() -> (ConcentrationSurface, ConcentrationSurface, Epoch) {
    let origin = epoch_origin();
    let padded = hourly_surface(origin - Duration::hours(12), 48);
    let display = hourly_surface(origin, 24);
    (padded, display, Epoch::new(origin))
}

fn line(id: &str, method: Method, fitted: &[(f64, f64)], rate: f64) -> GrowthLine {
    let points: Vec<Point> = fitted.iter().copied().map(Point::from).collect();
    GrowthLine::new(id, method, points.clone(), points, rate)
}

#[test]
fn test_no_lines_no_events() {
    let (padded, display, epoch) = surfaces();
    let synthesizer = EventSynthesizer::new(EventConfig::default());
    let sets = synthesizer.init_events(&padded, &display, &epoch, &[], &[], &[], &[], MAX_START);

    assert!(sets.is_empty());
    assert!(sets.all_events.is_empty());
    assert!(sets.final_events.is_empty());
    assert!(timestamp_info(&sets.final_events).is_empty());
}

#[test]
fn test_multi_method_cluster_is_final() {
    let (padded, display, epoch) = surfaces();
    let mf = [line("MF1", Method::ModeFitting, &[(0.3, 5.0), (0.5, 10.0)], 1.1)];
    let mc = [line("MC1", Method::MaxConcentration, &[(0.32, 5.2), (0.52, 10.3)], 1.3)];
    let at = [line("AT1", Method::AppearanceTime, &[(0.8, 40.0), (0.9, 45.0)], 2.0)];

    let synthesizer = EventSynthesizer::new(EventConfig::default());
    let sets = synthesizer.init_events(&padded, &display, &epoch, &mf, &mc, &at, &[], MAX_START);

    assert_eq!(sets.all_events.len(), 2);
    assert_eq!(sets.all_events[0].label, "event1");
    assert_eq!(sets.all_events[0].num_lines(), 2);
    assert_eq!(sets.all_events[1].label, "event2");
    assert_eq!(sets.all_events[1].lines[0].id, "AT1");

    // the lone appearance-time line has neither a second method nor a peak area
    assert_eq!(sets.final_events.len(), 1);
    let event = &sets.final_events[0];
    assert_eq!(event.label, "event1");
    assert_eq!(event.methods().len(), 2);
    assert_relative_eq!(event.rates.avg, 1.2);
    assert!(event.mafe.is_some());
    assert!(event.afes.is_empty());
}

#[test]
fn test_lines_starting_above_start_channel_are_excluded() {
    let (padded, display, epoch) = surfaces();
    let mf = [line("MF1", Method::ModeFitting, &[(0.3, 5.0), (0.5, 10.0)], 1.0)];
    let mc = [line("MC1", Method::MaxConcentration, &[(0.32, 5.2), (0.52, 10.3)], 1.2)];
    // starts at 11 nm, which snaps to the 10 nm channel
    let at = [line("AT1", Method::AppearanceTime, &[(0.55, 11.0), (0.7, 14.0)], 3.0)];

    let synthesizer = EventSynthesizer::new(EventConfig::default());
    let sets = synthesizer.init_events(&padded, &display, &epoch, &mf, &mc, &at, &[], 8.0);

    assert_eq!(sets.all_events.len(), 1);
    assert_eq!(sets.all_events[0].num_lines(), 3);

    assert_eq!(sets.final_events.len(), 1);
    let event = &sets.final_events[0];
    assert_eq!(event.num_lines(), 2);
    assert!(event.lines.iter().all(|l| l.method != Method::AppearanceTime));
    assert_relative_eq!(event.rates.max, 1.2);
}

#[test]
fn test_high_start_event_only_in_all_events() {
    let (padded, display, epoch) = surfaces();
    // 48 nm snaps to the 50 nm channel
    let mf = [line("MF1", Method::ModeFitting, &[(0.3, 48.0), (0.5, 60.0)], 1.0)];
    let mc = [line("MC1", Method::MaxConcentration, &[(0.3, 49.0), (0.5, 61.0)], 1.1)];

    let synthesizer = EventSynthesizer::new(EventConfig::default());
    let sets = synthesizer.init_events(&padded, &display, &epoch, &mf, &mc, &[], &[], MAX_START);

    assert_eq!(sets.all_events.len(), 1);
    assert!(sets.final_events.is_empty());
}

#[test]
fn test_peak_area_supports_single_method_event() {
    let (padded, display, epoch) = surfaces();
    let mc = [
        line("MC1", Method::MaxConcentration, &[(0.3, 10.0), (0.5, 15.0)], 1.0),
        line("MC2", Method::MaxConcentration, &[(0.31, 10.5), (0.5, 16.0)], 1.4),
    ];
    let synthesizer = EventSynthesizer::new(EventConfig::default());

    let sets = synthesizer.init_events(&padded, &display, &epoch, &[], &mc, &[], &[], MAX_START);
    assert_eq!(sets.all_events.len(), 1);
    assert!(sets.final_events.is_empty());

    let area = PeakAreaEdge {
        diameter: 10.0,
        start: 0.25,
        end: 0.6,
    };
    let sets = synthesizer.init_events(&padded, &display, &epoch, &[], &mc, &[], &[area], MAX_START);
    assert_eq!(sets.final_events.len(), 1);
    assert_eq!(sets.final_events[0].num_lines(), 2);
}

#[test]
fn test_event_outside_display_window_is_not_final() {
    let (padded, display, epoch) = surfaces();
    // 2004-09-21 02:24 to 07:12, inside the padding only
    let mf = [line("MF1", Method::ModeFitting, &[(1.1, 5.0), (1.3, 10.0)], 1.0)];
    let mc = [line("MC1", Method::MaxConcentration, &[(1.1, 5.1), (1.3, 10.2)], 1.0)];

    let synthesizer = EventSynthesizer::new(EventConfig::default());
    let sets = synthesizer.init_events(&padded, &display, &epoch, &mf, &mc, &[], &[], MAX_START);

    assert_eq!(sets.all_events.len(), 1);
    assert!(sets.final_events.is_empty());
}

#[test]
fn test_three_line_event_statistics() {
    let (padded, display, epoch) = surfaces();
    let mf = [line("MF1", Method::ModeFitting, &[(0.30, 5.0), (0.50, 10.0)], 10.0)];
    let mc = [line("MC1", Method::MaxConcentration, &[(0.31, 5.1), (0.51, 10.2)], 12.0)];
    let at = [line("AT1", Method::AppearanceTime, &[(0.32, 5.3), (0.52, 10.4)], 8.0)];

    let synthesizer = EventSynthesizer::new(EventConfig::default());
    let sets = synthesizer.init_events(&padded, &display, &epoch, &mf, &mc, &at, &[], MAX_START);

    assert_eq!(sets.final_events.len(), 1);
    let event = &sets.final_events[0];
    assert_relative_eq!(event.rates.avg, 10.0);
    assert_relative_eq!(event.rates.min, 8.0);
    assert_relative_eq!(event.rates.max, 12.0);
    assert_relative_eq!(event.mafe.unwrap(), 4.0 / 30.0, epsilon = 1e-12);
    assert_eq!(event.afes.len(), 3);

    let ids: Vec<&str> = event.lines.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["MF1", "MC1", "AT1"]);

    let info = timestamp_info(&sets.final_events);
    let middle = info[0]
        .records
        .iter()
        .find(|r| (r.time - 0.5).abs() < 1e-9)
        .unwrap();
    assert_eq!(middle.lines.len(), 3);
}

struct NeverLink;

impl LinkPolicy for NeverLink {
    fn links(&self, _a: &GrowthLine, _b: &GrowthLine, _config: &EventConfig) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "Never"
    }
}

#[test]
fn test_custom_link_policy() {
    let (padded, display, epoch) = surfaces();
    let mf = [line("MF1", Method::ModeFitting, &[(0.3, 5.0), (0.5, 10.0)], 1.0)];
    let mc = [line("MC1", Method::MaxConcentration, &[(0.3, 5.0), (0.5, 10.0)], 1.0)];

    let synthesizer = EventSynthesizer::with_policy(NeverLink, EventConfig::default());
    let sets = synthesizer.init_events(&padded, &display, &epoch, &mf, &mc, &[], &[], MAX_START);

    assert_eq!(sets.all_events.len(), 2);
    assert!(sets.final_events.is_empty());

    let lenient = EventSynthesizer::with_policy(NeverLink, EventConfig::new().with_min_methods(1));
    let sets = lenient.init_events(&padded, &display, &epoch, &mf, &mc, &[], &[], MAX_START);
    assert_eq!(sets.final_events.len(), 2);
}

#[test]
#[should_panic(expected = "is tagged MC but was passed as MF")]
fn test_mislabelled_line_panics() {
    let (padded, display, epoch) = surfaces();
    let mf = [line("MC1", Method::MaxConcentration, &[(0.3, 5.0), (0.5, 10.0)], 1.0)];
    let synthesizer = EventSynthesizer::new(EventConfig::default());
    let _ = synthesizer.init_events(&padded, &display, &epoch, &mf, &[], &[], &[], MAX_START);
}

#[test]
#[should_panic(expected = "expected at least 2")]
fn test_short_line_panics() {
    let (padded, display, epoch) = surfaces();
    let broken = GrowthLine {
        id: "AT1".to_string(),
        method: Method::AppearanceTime,
        points: vec![Point::new(0.3, 5.0)],
        fitted_points: vec![Point::new(0.3, 5.0)],
        growth_rate: 1.0,
    };
    let synthesizer = EventSynthesizer::new(EventConfig::default());
    let _ = synthesizer.init_events(&padded, &display, &epoch, &[], &[], &[broken], &[], MAX_START);
}
