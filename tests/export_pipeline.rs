mod common;

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use common::{rig, rig_full, rig_with, FakeCapture, RecordingAssembler};
use slidedeck::platform::NoticeLevel;
use slidedeck::{
    Button, Error, ExportStatus, KeyEvent, Orientation, PageFormat, Theme, ViewerConfig,
    VisibilityPolicy,
};

const EPS: f64 = 1e-9;

#[tokio::test]
async fn exports_every_slide_in_deck_order() {
    let rig = rig(3, FakeCapture::new());
    let status = rig.viewer.export_deck().await;

    let report = match status {
        ExportStatus::Completed(report) => report,
        other => panic!("expected completion, got {:?}", other),
    };
    assert_eq!(report.pages, 3);
    assert!(report.path.ends_with("test_A4.pdf"));

    let calls = rig.capture.calls();
    assert_eq!(calls.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(calls.iter().map(|c| c.slide_id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(rig.capture.max_in_flight.load(Ordering::SeqCst), 1);

    let log = rig.assembler.log();
    assert_eq!(log.documents, 1);
    assert_eq!(log.pages, 3);
    assert_eq!(log.saved, vec!["test_A4.pdf".to_string()]);
    // bitmap widths encode the slide index
    let drawn: Vec<(usize, u32)> = log.draws.iter().map(|d| (d.0, d.1)).collect();
    assert_eq!(drawn, vec![(1, 100), (2, 101), (3, 102)]);

    assert!(!rig.viewer.is_exporting());
    assert!(rig.notices.notices().is_empty());
}

#[tokio::test]
async fn capture_options_and_page_fill_use_the_export_background() {
    let rig = rig(2, FakeCapture::new());
    assert!(rig.viewer.export_deck().await.is_completed());

    let bg = Theme::default().export_background;
    for call in rig.capture.calls() {
        assert_eq!(call.scale, 2.0);
        assert_eq!(call.background, bg);
        assert!(call.cors_safe);
    }
    let log = rig.assembler.log();
    assert_eq!(log.fills, vec![(1, bg), (2, bg)]);
}

#[tokio::test]
async fn slides_are_scaled_to_fit_and_centered() {
    let rig = rig(1, FakeCapture::new());
    assert!(rig.viewer.export_deck().await.is_completed());

    // 100x50 bitmap on 297x210: width bound, scale 2.97
    let (_, _, x, y, w, h) = rig.assembler.log().draws[0];
    assert!((w - 297.0).abs() < EPS);
    assert!((h - 148.5).abs() < EPS);
    assert!(x.abs() < EPS);
    assert!((y - (210.0 - y - h)).abs() < EPS);
}

#[tokio::test]
async fn page_format_and_orientation_come_from_config() {
    let config = ViewerConfig {
        page_format: PageFormat::Letter,
        orientation: Orientation::Portrait,
        ..Default::default()
    };
    let rig = rig_with(2, FakeCapture::new(), config);
    assert!(rig.viewer.export_deck().await.is_completed());
    for (_, _, x, _, w, _) in rig.assembler.log().draws {
        assert!((w - 215.9).abs() < 1e-6);
        assert!(x.abs() < 1e-6);
    }
}

#[tokio::test]
async fn concurrent_second_export_is_rejected() {
    let rig = rig(3, FakeCapture::new());
    let (a, b) = tokio::join!(rig.viewer.export_deck(), rig.viewer.export_deck());

    assert!(a.is_completed());
    assert!(matches!(b, ExportStatus::AlreadyRunning));
    assert_eq!(rig.assembler.log().documents, 1);
    assert_eq!(rig.capture.calls().len(), 3);
    assert!(!rig.viewer.is_exporting());
}

#[tokio::test]
async fn failure_on_second_slide_saves_nothing() {
    let rig = rig(3, FakeCapture::failing_at(1));
    let status = rig.viewer.export_deck().await;

    assert!(matches!(status, ExportStatus::Failed(Error::CaptureError(_))));
    // remaining slides are not attempted
    assert_eq!(rig.capture.calls().len(), 2);
    assert!(rig.assembler.log().saved.is_empty());
    assert!(!rig.viewer.is_exporting());

    let notices = rig.notices.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0]
        .message
        .starts_with("Failed to generate the PDF document:"));
    assert!(notices[0].message.contains("boom on slide 2"));
}

#[tokio::test]
async fn retry_after_failure_restarts_from_first_slide() {
    let rig = rig(3, FakeCapture::failing_at(1));
    assert!(!rig.viewer.export_deck().await.is_completed());
    assert!(!rig.viewer.export_deck().await.is_completed());

    let indices: Vec<usize> = rig.capture.calls().iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 0, 1]);
    assert_eq!(rig.assembler.log().documents, 2);
    assert_eq!(rig.notices.notices().len(), 2);
}

#[tokio::test]
async fn save_failure_is_reported_and_clears_the_flag() {
    let assembler = RecordingAssembler { fail_save: true, ..Default::default() };
    let rig = rig_full(2, FakeCapture::new(), assembler, ViewerConfig::default());
    let status = rig.viewer.export_deck().await;

    assert!(matches!(status, ExportStatus::Failed(Error::AssemblyError(_))));
    assert!(!rig.viewer.is_exporting());
    assert_eq!(rig.notices.notices().len(), 1);
}

#[tokio::test]
async fn navigation_is_blocked_while_export_is_suspended() {
    let rig = rig(3, FakeCapture::holding_first());

    let observer = async {
        rig.capture.started.notified().await;
        assert!(rig.viewer.is_exporting());
        assert!(!rig.viewer.handle_key(&KeyEvent::press("ArrowRight")));
        assert!(!rig.viewer.handle_key(&KeyEvent::new(" ", "Space")));
        assert!(!rig.viewer.press_button(Button::Next));
        assert_eq!(rig.viewer.current_index(), 0);

        let bar = rig.viewer.control_bar();
        assert!(bar.export_busy);
        assert_eq!(bar.export_label, "Generating A4...");
        rig.capture.release.notify_one();
    };
    let (status, ()) = tokio::join!(rig.viewer.export_deck(), observer);

    assert!(status.is_completed());
    assert!(rig.viewer.handle_key(&KeyEvent::press("ArrowRight")));
    assert_eq!(rig.viewer.current_index(), 1);
}

#[tokio::test]
async fn every_slide_is_measurable_under_all_slides_policy() {
    let rig = rig(3, FakeCapture::holding_first());

    let observer = async {
        rig.capture.started.notified().await;
        assert!((0..3).all(|i| rig.viewer.is_slide_visible(i)));
        rig.capture.release.notify_one();
    };
    let (status, ()) = tokio::join!(rig.viewer.export_deck(), observer);

    assert!(status.is_completed());
    assert!(rig.capture.calls().iter().all(|c| c.measurable));
    assert!(!rig.viewer.is_slide_visible(1));
}

#[tokio::test]
async fn one_at_a_time_policy_shows_only_the_captured_slide() {
    let config = ViewerConfig {
        visibility_policy: VisibilityPolicy::OneAtATime,
        ..Default::default()
    };
    let rig = rig_with(3, FakeCapture::holding_first(), config);
    rig.viewer.navigate(slidedeck::NavCommand::Next);

    let observer = async {
        rig.capture.started.notified().await;
        assert_eq!(rig.viewer.state().capturing, Some(0));
        assert!(rig.viewer.is_slide_visible(0));
        // current slide stays on screen
        assert!(rig.viewer.is_slide_visible(1));
        assert!(!rig.viewer.is_slide_visible(2));
        rig.capture.release.notify_one();
    };
    let (status, ()) = tokio::join!(rig.viewer.export_deck(), observer);

    assert!(status.is_completed());
    assert!(rig.capture.calls().iter().all(|c| c.measurable));
    // initial settle plus one per slide
    assert_eq!(rig.capture.settle_calls.load(Ordering::SeqCst), 4);
    assert_eq!(rig.viewer.state().capturing, None);
}

#[tokio::test]
async fn falls_back_to_fixed_settle_delay() {
    let capture = FakeCapture { settle_signal: false, ..FakeCapture::new() };
    let config = ViewerConfig { settle_delay_ms: 40, ..Default::default() };
    let rig = rig_with(1, capture, config);

    let started = Instant::now();
    assert!(rig.viewer.export_deck().await.is_completed());
    assert!(started.elapsed() >= Duration::from_millis(40));
}

#[tokio::test]
async fn dropping_an_export_midway_clears_the_flag() {
    let rig = rig(3, FakeCapture::holding_first());

    let res = tokio::time::timeout(Duration::from_millis(50), rig.viewer.export_deck()).await;
    assert!(res.is_err(), "export should still be waiting on the first capture");
    assert!(!rig.viewer.is_exporting());
    assert!(rig.assembler.log().saved.is_empty());
}
