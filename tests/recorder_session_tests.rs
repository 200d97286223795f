// Integration tests for the recorder session state machine
//
// A scripted device stands in for the microphone; tests push chunks by hand
// and run on a paused clock so elapsed ticks are exact.

mod common;

use common::ScriptedProvider;
use plant_chat::{RecorderConfig, RecorderError, RecorderSession, RecorderState};
use std::time::Duration;
use tokio::time::sleep;

fn session(devices: &std::sync::Arc<ScriptedProvider>) -> RecorderSession {
    RecorderSession::new(devices.clone(), RecorderConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_start_then_stop_yields_empty_artifact() {
    let devices = ScriptedProvider::new();
    let mut recorder = session(&devices);

    assert!(recorder.start().await.unwrap());
    assert_eq!(recorder.state(), RecorderState::Recording);

    let artifact = recorder.stop().await.expect("artifact");
    assert!(artifact.is_empty());
    assert_eq!(artifact.chunk_count, 0);
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(devices.released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_chunks_produced_while_paused_are_dropped() {
    let devices = ScriptedProvider::new();
    let mut recorder = session(&devices);

    recorder.start().await.unwrap();
    assert!(devices.push(&[1]));

    assert!(recorder.pause());
    assert_eq!(recorder.status().chunks_count, 1);
    assert!(devices.push(&[2]));

    assert!(recorder.resume());
    assert!(devices.push(&[3]));

    let artifact = recorder.stop().await.unwrap();
    assert_eq!(artifact.data, vec![1, 3]);
    assert_eq!(artifact.chunk_count, 2);
    assert_eq!(artifact.media_type(), "audio/webm");
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_paused_keeps_only_recorded_chunks() {
    let devices = ScriptedProvider::new();
    let mut recorder = session(&devices);

    recorder.start().await.unwrap();
    devices.push(&[7, 7]);
    recorder.pause();
    devices.push(&[8]);

    let artifact = recorder.stop().await.unwrap();
    assert_eq!(artifact.data, vec![7, 7]);
    assert!(!devices.is_held());
}

#[tokio::test(start_paused = true)]
async fn test_one_artifact_per_cycle() {
    let devices = ScriptedProvider::new();
    let mut recorder = session(&devices);

    recorder.start().await.unwrap();
    devices.push(b"first");
    let first = recorder.stop().await.unwrap();

    // stopping again has nothing to deliver
    assert!(recorder.stop().await.is_none());

    recorder.start().await.unwrap();
    devices.push(b"second");
    let second = recorder.stop().await.unwrap();

    assert_eq!(first.data, b"first".to_vec());
    assert_eq!(second.data, b"second".to_vec());
    assert_eq!(devices.acquired(), 2);
    assert_eq!(devices.released(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_device_unavailable_leaves_session_idle() {
    let devices = ScriptedProvider::denied();
    let mut recorder = session(&devices);

    let err = recorder.start().await.unwrap_err();
    assert!(matches!(err, RecorderError::DeviceUnavailable(_)));

    let status = recorder.status();
    assert_eq!(status.state, RecorderState::Idle);
    assert_eq!(status.elapsed_secs, 0);
    assert!(status.device.is_none());

    // the ticker never started
    sleep(Duration::from_secs(3)).await;
    assert_eq!(recorder.elapsed_secs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_while_active_is_ignored() {
    let devices = ScriptedProvider::new();
    let mut recorder = session(&devices);

    assert!(recorder.start().await.unwrap());
    assert!(!recorder.start().await.unwrap());

    recorder.pause();
    assert!(!recorder.start().await.unwrap());
    assert_eq!(recorder.state(), RecorderState::Paused);
    assert_eq!(devices.acquired(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_actions_outside_their_state_are_noops() {
    let devices = ScriptedProvider::new();
    let mut recorder = session(&devices);

    assert!(!recorder.pause());
    assert!(!recorder.resume());
    assert!(recorder.stop().await.is_none());
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(devices.acquired(), 0);
    assert_eq!(devices.released(), 0);

    recorder.start().await.unwrap();
    assert!(!recorder.resume());
    assert!(recorder.pause());
    assert!(!recorder.pause());
    assert_eq!(recorder.state(), RecorderState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_ticks_only_while_recording() {
    let devices = ScriptedProvider::new();
    let mut recorder = session(&devices);

    recorder.start().await.unwrap();
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(recorder.elapsed_secs(), 2);

    recorder.pause();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(recorder.elapsed_secs(), 2);

    recorder.resume();
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(recorder.elapsed_secs(), 3);

    let artifact = recorder.stop().await.unwrap();
    assert_eq!(artifact.elapsed, Duration::from_secs(3));
    assert_eq!(recorder.elapsed_secs(), 0);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(recorder.elapsed_secs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_status_reports_held_device() {
    let devices = ScriptedProvider::new();
    let mut recorder = session(&devices);

    recorder.start().await.unwrap();
    devices.push(&[0; 4]);
    recorder.pause();

    let status = recorder.status();
    assert_eq!(status.state, RecorderState::Paused);
    assert_eq!(status.device.as_deref(), Some("scripted"));
    assert_eq!(status.chunks_count, 1);
}
