//! Planning a capture job: selection, catalog, negotiation and descriptor together.

mod common;

use std::io::Cursor;
use std::path::PathBuf;

use common::{listing_with_screens, settings, settings_with, Fakes};
use screenrec::config::{Overrides, Settings};
use screenrec::error::RecorderError;
use screenrec::modes::{CatalogSource, Resolution};
use screenrec::negotiate::{Fallback, ResolutionRequest};
use screenrec::selection::SelectionMode;
use screenrec::session::{plan, PlannedJob};

fn plan_with(
    settings: &Settings,
    mode: Option<SelectionMode>,
    fakes: &Fakes,
    input: &str,
) -> Result<PlannedJob, RecorderError> {
    let mut input = Cursor::new(input.as_bytes().to_vec());
    let mut output = Vec::new();
    plan(settings, mode, &fakes.toolkit(), &mut input, &mut output)
}

fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[test]
fn test_plan_default_device_from_query() {
    let fakes = Fakes {
        modes: Some("1280x720 30.000000fps\n1920x1080 30.000000fps\n".to_string()),
        ..Default::default()
    };
    let job = plan_with(&settings(), None, &fakes, "").unwrap();

    assert_eq!(job.catalog.source(), CatalogSource::DeviceQuery);
    assert!(job.negotiation.is_exact());
    assert!(job.selection.is_none());

    let args = job.descriptor.to_args();
    assert_eq!(arg_after(&args, "-video_size"), Some("1920x1080"));
    assert_eq!(arg_after(&args, "-framerate"), Some("30"));
    assert_eq!(arg_after(&args, "-i"), Some("1:none"));
    assert_eq!(arg_after(&args, "-vf"), None);
    assert_eq!(args.last().map(String::as_str), Some("screen-recording.mp4"));
}

#[test]
fn test_plan_monitor_selection_uses_screen_table() {
    let fakes = Fakes {
        listing: listing_with_screens(2),
        display_report: Some("Resolution: 2560 x 1440\nResolution: 1920 x 1080\n".to_string()),
        ..Default::default()
    };
    let job = plan_with(&settings(), Some(SelectionMode::Monitor), &fakes, "1\n").unwrap();

    assert_eq!(job.descriptor.device(), 4);
    assert_eq!(job.catalog.source(), CatalogSource::ReferenceTable);
    assert_eq!(
        job.descriptor.mode().resolution,
        Resolution::new(2560, 1440).unwrap()
    );
    assert_eq!(job.descriptor.region(), None);
}

#[test]
fn test_plan_area_selection_adds_crop() {
    let fakes = Fakes {
        picked: Some((400, 200)),
        pointer: Some((1000, 600)),
        modes: Some("1920x1080 30fps\n".to_string()),
        ..Default::default()
    };
    let job = plan_with(&settings(), Some(SelectionMode::Area), &fakes, "").unwrap();

    let args = job.descriptor.to_args();
    assert_eq!(arg_after(&args, "-vf"), Some("crop=400:200:800:500"));
    assert_eq!(job.descriptor.device(), 1);
}

#[test]
fn test_plan_reports_fallbacks() {
    let settings = settings_with(Overrides {
        resolution: Some(ResolutionRequest::Exact(Resolution::new(3840, 2160).unwrap())),
        ..Default::default()
    });
    let fakes = Fakes {
        modes: None,
        ..Default::default()
    };
    let job = plan_with(&settings, None, &fakes, "").unwrap();

    assert!(job.negotiation.fallbacks.contains(&Fallback::SyntheticCatalog));
    assert!(job
        .negotiation
        .fallbacks
        .iter()
        .any(|f| matches!(f, Fallback::Resolution { .. })));
    assert_eq!(job.descriptor.mode().resolution, Resolution::FULL_HD);
}

#[test]
fn test_plan_carries_encoding_settings() {
    let settings = settings_with(Overrides {
        audio_device: Some("0".to_string()),
        codec: Some("hevc_videotoolbox".to_string()),
        quality: Some(65),
        output: Some(PathBuf::from("out dir/clip.mp4")),
        ..Default::default()
    });
    let fakes = Fakes {
        modes: Some("1920x1080 30fps\n".to_string()),
        ..Default::default()
    };
    let job = plan_with(&settings, None, &fakes, "").unwrap();

    let args = job.descriptor.to_args();
    assert_eq!(arg_after(&args, "-i"), Some("1:0"));
    assert_eq!(arg_after(&args, "-q:v"), Some("65"));
    assert_eq!(arg_after(&args, "-tag:v"), Some("hvc1"));
    assert_eq!(arg_after(&args, "-c:a"), Some("aac"));
    assert!(job.descriptor.command_line().ends_with("'out dir/clip.mp4'"));
}

#[test]
fn test_plan_stops_on_cancelled_selection() {
    let fakes = Fakes {
        picked: None,
        ..Default::default()
    };
    let result = plan_with(&settings(), Some(SelectionMode::Window), &fakes, "");
    assert!(matches!(result, Err(RecorderError::SelectionCancelled { .. })));
}
