use std::time::Duration;

use quasselo_lib::controller::PlaybackController;
use quasselo_lib::engine::timed::TimedSpeechEngine;
use quasselo_lib::engine::EventReceiver;
use quasselo_lib::session::ReadingSession;
use quasselo_lib::{EventOutcome, PlaybackState, ReaderError, Settings, ToggleOutcome};

fn timed_controller(text: &str) -> (PlaybackController<TimedSpeechEngine>, EventReceiver) {
    let mut settings = Settings::default();
    settings.speech.rate = 1.0;
    settings.playback.words_per_minute = 60;
    let (mut controller, events) = PlaybackController::new(TimedSpeechEngine::new(60), settings);
    controller.text_changed(text);
    (controller, events)
}

/// Feed events until `stop` matches, returning every outcome seen
async fn drive_until(
    controller: &mut PlaybackController<TimedSpeechEngine>,
    events: &mut EventReceiver,
    stop: impl Fn(&EventOutcome) -> bool,
) -> Vec<EventOutcome> {
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        let outcome = controller.handle_event(event).unwrap();
        let done = stop(&outcome);
        seen.push(outcome);
        if done {
            break;
        }
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn reads_a_text_to_the_end_and_rewinds() {
    let (mut controller, mut events) = timed_controller("Ein Satz. Noch einer!");
    assert_eq!(controller.prepare().unwrap(), 4);

    controller.start_reading().unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);

    let seen = drive_until(&mut controller, &mut events, |o| *o == EventOutcome::Done).await;
    let advanced: Vec<usize> = seen
        .iter()
        .filter_map(|o| match o {
            EventOutcome::Advanced(i) => Some(*i),
            _ => None,
        })
        .collect();
    assert_eq!(advanced, vec![0, 1, 2, 3]);
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert_eq!(controller.cursor().index(), 0);
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_continue_from_the_same_word() {
    let (mut controller, mut events) = timed_controller("eins zwei drei vier");
    controller.prepare().unwrap();
    controller.toggle_play_pause().unwrap();

    drive_until(&mut controller, &mut events, |o| *o == EventOutcome::Advanced(1)).await;
    tokio::time::advance(Duration::from_millis(400)).await;
    assert_eq!(controller.toggle_play_pause().unwrap(), ToggleOutcome::Paused);

    // nothing advances while paused
    tokio::time::sleep(Duration::from_secs(20)).await;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(controller.handle_event(event).unwrap(), EventOutcome::Advanced(_)));
    }
    assert_eq!(controller.cursor().index(), 1);

    assert_eq!(controller.toggle_play_pause().unwrap(), ToggleOutcome::Resumed);
    let seen = drive_until(&mut controller, &mut events, |o| *o == EventOutcome::Done).await;
    assert!(seen.contains(&EventOutcome::Advanced(2)));
    assert!(seen.contains(&EventOutcome::Advanced(3)));
}

#[tokio::test(start_paused = true)]
async fn toggles_inside_the_debounce_window_are_dropped() {
    let (mut controller, _events) = timed_controller("eins zwei drei");
    controller.prepare().unwrap();

    assert_eq!(controller.toggle_play_pause().unwrap(), ToggleOutcome::Started);
    tokio::time::advance(Duration::from_millis(100)).await;
    assert_eq!(controller.toggle_play_pause().unwrap(), ToggleOutcome::Debounced);
    assert_eq!(controller.state(), PlaybackState::Playing);

    tokio::time::advance(Duration::from_millis(250)).await;
    assert_eq!(controller.toggle_play_pause().unwrap(), ToggleOutcome::Paused);
}

#[tokio::test(start_paused = true)]
async fn stepping_mid_read_discards_the_old_utterance() {
    let (mut controller, mut events) = timed_controller("a b c d e f");
    controller.prepare().unwrap();
    controller.start_reading().unwrap();
    drive_until(&mut controller, &mut events, |o| *o == EventOutcome::Advanced(2)).await;

    assert_eq!(controller.jump_to_position(6).unwrap(), 5);
    assert_eq!(controller.state(), PlaybackState::Idle);

    tokio::time::sleep(Duration::from_secs(30)).await;
    while let Ok(event) = events.try_recv() {
        controller.handle_event(event).unwrap();
    }
    assert_eq!(controller.cursor().index(), 5);
    assert_eq!(controller.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn export_then_import_restores_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let (mut original, _events) = timed_controller("Hallo  Welt. Wie geht's?");
    original.set_name("Gruss");
    original.prepare().unwrap();
    original.next_word().unwrap();
    let path = original.export_session(dir.path()).unwrap();
    assert!(path.ends_with("Gruss_quasselo.json"));

    let (mut restored, _events) = timed_controller("");
    restored.import_file(&path).unwrap();

    assert!(restored.is_prepared());
    assert_eq!(restored.cursor().index(), 0);
    assert_eq!(restored.document(), original.document());
    assert_eq!(restored.words(), original.words());
}

#[tokio::test]
async fn malformed_import_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken_quasselo.json");
    std::fs::write(&path, r#"{"name":"x","text":"neu","version":"1.0"}"#).unwrap();

    let (mut controller, _events) = timed_controller("alter Text");
    controller.set_name("alt");
    controller.prepare().unwrap();

    let err = controller.import_file(&path).unwrap_err();
    assert!(matches!(err, ReaderError::ImportMalformed(_)));
    assert_eq!(controller.document().text, "alter Text");
    assert_eq!(controller.words(), ["alter", "Text"]);
    assert!(controller.is_prepared());

    let session = ReadingSession::new("leer", "", Vec::new());
    assert!(controller.apply_session(session).is_err());
    assert_eq!(controller.document().name, "alt");
}
