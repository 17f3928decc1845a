//! End-to-end runs over a delimited record and recorded detections.

use aerogrowth_algorithms::{timestamp_info, EventSynthesizer};
use aerogrowth_core::{
    AnalysisConfig, Error as CoreError, EventConfig, GrowthDetector, ResultConfig,
};
use aerogrowth_io::{open_loader, Error, RecordedDetections, ReportStatus, Reporter, ResultWriter};
use chrono::{Duration, NaiveDate};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const HEADER: &str = "Year,Month,Day,Hour,Minute,Second,\
HYY_DMPS.d300e1,HYY_DMPS.d700e1,HYY_DMPS.d150e2,HYY_DMPS.d400e2,HYY_DMPS.d1000e4";

const DETECTIONS: &str = r#"{
    "mode_fitting": {
        "peaks": [[0.25, 4.0], [0.375, 8.0], [0.8, 30.0]],
        "lines": [{"id": "MF1", "method": "MF", "growth_rate": 1.0,
                   "points": [[0.25, 4.0], [0.3125, 6.0], [0.375, 8.0]],
                   "fitted_points": [[0.25, 4.0], [0.3125, 6.0], [0.375, 8.0]]}]
    },
    "max_concentration": {
        "peaks": [[0.26, 4.2], [0.36, 8.1]],
        "lines": [{"id": "MC1", "method": "MC", "growth_rate": 1.5,
                   "points": [[0.26, 4.2], [0.36, 8.1]],
                   "fitted_points": [[0.26, 4.2], [0.36, 8.1]]}]
    }
}"#;

/// Half-hourly rows from 2004-09-19 12:05 to 2004-09-21 11:35.
fn record() -> String {
    let start = NaiveDate::from_ymd_opt(2004, 9, 19)
        .unwrap()
        .and_hms_opt(12, 5, 0)
        .unwrap();
    let mut text = format!("{HEADER}\n");
    for step in 0..96 {
        let t = start + Duration::minutes(30 * step);
        writeln!(
            text,
            "{},{},{},{},{},0,120,340,80,15,1",
            t.format("%Y"),
            t.format("%-m"),
            t.format("%-d"),
            t.format("%-H"),
            t.format("%-M")
        )
        .unwrap();
    }
    text
}

fn write_input(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("HYY_DMPS.csv");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_delimited_record_to_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &record());
    let config = AnalysisConfig::new(&input, "2004-09-20", "2004-09-20").with_results(ResultConfig {
        save_final_event_info: true,
        save_ts_info: true,
        ..ResultConfig::default()
    });
    config.validate().unwrap();
    let window = config.window().unwrap();

    let surfaces = open_loader(&input).unwrap().load(&window).unwrap();
    assert_eq!(surfaces.display.n_times(), 48);
    assert_eq!(surfaces.padded.n_times(), 96);
    assert_eq!(surfaces.display.diameters().last().copied(), Some(1000.0));

    let detector = RecordedDetections::from_reader(DETECTIONS.as_bytes()).unwrap();
    let detections = detector
        .detect(&surfaces.padded, &config.thresholds())
        .unwrap();
    let sets = EventSynthesizer::new(EventConfig::default()).init_events(
        &surfaces.padded,
        &surfaces.display,
        &surfaces.epoch(),
        &detections.mode_fitting.lines,
        &detections.max_concentration.lines,
        &detections.appearance_time.lines,
        &detections.mc_area_edges,
        config.maximum_growth_start_channel,
    );
    assert_eq!(sets.final_events.len(), 1);

    let timestamps = timestamp_info(&sets.all_events);
    let reporter = Reporter::new(&config.results, &surfaces, &detections);
    assert_eq!(reporter.status(&sets), ReportStatus::Events(1));

    let writer = ResultWriter::for_run(dir.path().join("out"), &input, &window);
    let written = reporter.save(&sets, &timestamps, &writer).unwrap();
    assert_eq!(
        written,
        vec![
            dir.path().join("out/HYY040920_final_events.json"),
            dir.path().join("out/HYY040920_ts_info.json"),
        ]
    );

    let events: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(events["event1"]["num of lines"], 2);
    assert_eq!(events["event1"]["avg growth rate"], 1.25);
    assert_eq!(events["event1"]["lines"][0]["id"], "MF1");

    let plan = reporter.render_plan(&sets).unwrap();
    // the stray 30 nm peak is not drawn
    assert_eq!(plan.points[0].points.len(), 2);
    assert!(plan.no_events.is_none());
}

#[test]
fn test_reload_is_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &record());
    let window = aerogrowth_core::RequestedWindow::parse("2004-09-20", "2004-09-20").unwrap();

    let first = open_loader(&input).unwrap().load(&window).unwrap();
    let again = open_loader(&input).unwrap().load(&window).unwrap();
    assert!(again.padded.bitwise_eq(&first.padded));
    assert!(again.display.bitwise_eq(&first.display));
    assert_eq!(again.epoch(), first.epoch());
}

#[test]
fn test_duplicate_timestamps_abort_loading() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &format!("{HEADER}\n2004,9,20,0,5,0,1,2,3,4,5\n2004,9,20,0,10,0,1,2,3,4,5\n"),
    );
    let window = aerogrowth_core::RequestedWindow::parse("2004-09-20", "2004-09-20").unwrap();

    let err = open_loader(&input).unwrap().load(&window).unwrap_err();
    match err {
        Error::CoreError(CoreError::DuplicateTimestamp {
            original,
            duplicates,
        }) => {
            assert_eq!(original.len(), 2);
            assert_eq!(duplicates.len(), 1);
        }
        other => panic!("expected duplicate timestamps, got {other}"),
    }
}

#[test]
fn test_empty_detections_report_no_events() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &record());
    let window = aerogrowth_core::RequestedWindow::parse("2004-09-20", "2004-09-20").unwrap();
    let surfaces = open_loader(&input).unwrap().load(&window).unwrap();

    let detections = RecordedDetections::from_reader("{}".as_bytes())
        .unwrap()
        .detect(&surfaces.padded, &AnalysisConfig::default().thresholds())
        .unwrap();
    let sets = EventSynthesizer::new(EventConfig::default()).init_events(
        &surfaces.padded,
        &surfaces.display,
        &surfaces.epoch(),
        &[],
        &[],
        &[],
        &[],
        40.0,
    );
    assert!(sets.is_empty());

    let results = ResultConfig {
        save_final_event_info: true,
        ..ResultConfig::default()
    };
    let reporter = Reporter::new(&results, &surfaces, &detections);
    assert_eq!(reporter.status(&sets), ReportStatus::NoEvents);
    let writer = ResultWriter::for_run(dir.path(), &input, &window);
    assert!(reporter.save(&sets, &[], &writer).unwrap().is_empty());
    assert!(reporter.render_plan(&sets).unwrap().no_events.is_some());
}
