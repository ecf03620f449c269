//! End-to-end tests for the three loops running on one runtime
//!
//! Time is paused, so rests complete as soon as every task is idle and the
//! assertions below are exact.

mod common;

use common::{note_then_rest, s};
use magnon::config::Config;
use magnon::cue::{Cue, CueBus};
use magnon::engine::SynthEngine;
use magnon::loops::Session;
use magnon::test_utils::RecordingEngine;
use magnon::token::Token;
use rosc::{OscArray, OscType};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const SEQUENCE_PATH: &str = "/osc:127.0.0.1:50123/synth";
const AMBIENT_PATH: &str = "/osc:127.0.0.1:50123/ambient";

fn session(config: Config) -> (Session, Arc<RecordingEngine>) {
    let engine = Arc::new(RecordingEngine::default());
    let dyn_engine: Arc<dyn SynthEngine> = engine.clone();
    (Session::new(config, dyn_engine).unwrap(), engine)
}

fn seeded_config() -> Config {
    let mut config = Config::default();
    config.ambient.seed = Some(11);
    config
}

fn send(bus: &CueBus, path: &str, args: Vec<OscType>) {
    bus.publish(Cue::new(path, args));
}

#[tokio::test(start_paused = true)]
async fn test_sequence_plays_in_a_loop() {
    let (session, engine) = session(seeded_config());
    let bus = session.bus();
    let _tasks = session.spawn_loops();

    let notes = [("piano", "C4", 1.0, 0.5), ("bass", "E2", 2.0, 0.75)];
    send(&bus, SEQUENCE_PATH, note_then_rest(&notes));

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(engine.instruments(), vec!["piano", "bass"]);

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(engine.instruments(), vec!["piano", "bass", "piano"]);
    assert!(!session.slot().is_updated());
}

#[tokio::test(start_paused = true)]
async fn test_new_sequence_waits_for_current_pass() {
    let (session, engine) = session(seeded_config());
    let bus = session.bus();
    let _tasks = session.spawn_loops();

    let notes = [("first", "C4", 1.0, 0.5), ("second", "D4", 1.0, 0.5)];
    send(&bus, SEQUENCE_PATH, note_then_rest(&notes));
    sleep(Duration::from_millis(500)).await;

    send(&bus, SEQUENCE_PATH, note_then_rest(&[("replacement", "E4", 1.0, 0.5)]));
    sleep(Duration::from_millis(1000)).await;

    // The pass that was running finishes on the old sequence
    assert_eq!(engine.instruments(), vec!["first", "second"]);
    assert!(session.slot().is_updated());

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(engine.instruments(), vec!["first", "second", "replacement"]);
    assert!(!session.slot().is_updated());
}

#[tokio::test(start_paused = true)]
async fn test_incorrect_format_keeps_previous_sequence() {
    let (session, _engine) = session(seeded_config());
    let bus = session.bus();
    let slot = session.slot();
    let _tasks = session.spawn_loops();

    send(&bus, SEQUENCE_PATH, note_then_rest(&[("piano", "C4", 1.0, 0.5)]));
    sleep(Duration::from_millis(10)).await;
    let before = slot.current();

    send(
        &bus,
        SEQUENCE_PATH,
        vec![s("START"), OscType::Array(OscArray { content: vec![s("synth")] })],
    );
    sleep(Duration::from_millis(10)).await;

    assert_eq!(*slot.current(), *before);
    assert_eq!(slot.current()[0][1], Token::from("piano"));
}

#[tokio::test(start_paused = true)]
async fn test_empty_payload_silences_player() {
    let (session, engine) = session(seeded_config());
    let bus = session.bus();
    let _tasks = session.spawn_loops();

    send(&bus, SEQUENCE_PATH, note_then_rest(&[("piano", "C4", 1.0, 0.5)]));
    sleep(Duration::from_millis(500)).await;
    send(&bus, SEQUENCE_PATH, vec![]);
    sleep(Duration::from_millis(3000)).await;

    assert_eq!(engine.instruments(), vec!["piano"]);
    assert!(session.slot().current().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_ambient_runs_alongside_sequence() {
    let (session, engine) = session(seeded_config());
    let bus = session.bus();
    let _tasks = session.spawn_loops();

    send(&bus, SEQUENCE_PATH, note_then_rest(&[("piano", "C4", 1.0, 0.5)]));
    sleep(Duration::from_millis(300)).await;
    send(&bus, AMBIENT_PATH, vec![s("G3")]);
    sleep(Duration::from_millis(10)).await;

    let commands = engine.commands();
    assert_eq!(commands.len(), 2);
    let drone = &commands[1];
    assert_eq!(drone.synth, "prophet");
    assert_eq!(drone.note, "G3");
    assert_eq!(drone.attack, Some(1.0));
    assert_eq!(drone.release, Some(10.0));
    let cutoff = drone.cutoff.unwrap();
    assert!((60.0..=90.0).contains(&cutoff));
}

#[tokio::test(start_paused = true)]
async fn test_unmatched_paths_are_ignored() {
    let (session, engine) = session(seeded_config());
    let bus = session.bus();
    let slot = session.slot();
    let _tasks = session.spawn_loops();

    // Not prefixed the way inbound OSC is, so the default patterns skip it
    send(&bus, "/synth", note_then_rest(&[("piano", "C4", 1.0, 0.5)]));
    send(&bus, "/osc:127.0.0.1:1/other", vec![s("C4")]);
    sleep(Duration::from_millis(500)).await;

    assert!(slot.current().is_empty());
    assert!(engine.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tempo_scales_rests() {
    let mut config = seeded_config();
    config.player.bpm = 120.0;
    let (session, engine) = session(config);
    let bus = session.bus();
    let _tasks = session.spawn_loops();

    send(&bus, SEQUENCE_PATH, note_then_rest(&[("tick", "60", 0.1, 0.5)]));
    // One beat is 500ms at 120 BPM: passes start at ~0, 0.5, 1.0 and 1.5s
    sleep(Duration::from_millis(1750)).await;

    assert_eq!(engine.commands().len(), 4);
}
