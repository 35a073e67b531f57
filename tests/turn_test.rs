// tests/turn_test.rs — Integration test: turn runner with a mock simulation service

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use chronos::audio::{AudioPlayer, SilentOutput};
use chronos::client::{SimulationApi, SimulationRequest};
use chronos::core::turn::{apply_side_effect, SideEffect, TurnRunner, WORLD_UPDATED_NOTICE};
use chronos::infra::clock::ManualClock;
use chronos::infra::config::AudioConfig;
use chronos::infra::errors::ChronosError;
use chronos::session::{HistoryPoint, Role, SessionStore, SimulationTurn, WorldState};
use chronos::storage::MemoryStore;

/// A mock service that replays scripted turns without any network calls.
struct ScriptedApi {
    turns: Mutex<Vec<Result<SimulationTurn, ChronosError>>>,
    audio: Option<String>,
    image: Option<String>,
    seen: Mutex<Vec<SimulationRequest>>,
}

impl ScriptedApi {
    fn new(turns: Vec<Result<SimulationTurn, ChronosError>>) -> Self {
        Self {
            turns: Mutex::new(turns),
            audio: None,
            image: None,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SimulationApi for ScriptedApi {
    async fn simulate_turn(
        &self,
        request: SimulationRequest,
    ) -> Result<SimulationTurn, ChronosError> {
        self.seen.lock().unwrap().push(request);
        self.turns.lock().unwrap().remove(0)
    }

    async fn generate_audio(&self, _narrative: &str) -> Result<Option<String>, ChronosError> {
        Ok(self.audio.clone())
    }

    async fn generate_image(&self, _scenario: &str) -> Result<Option<String>, ChronosError> {
        Ok(self.image.clone())
    }
}

fn turn(year: i64, chaos: u8, suggestions: &[&str]) -> SimulationTurn {
    SimulationTurn {
        narrative: format!("Dispatch from {year}."),
        world_state_update: WorldState {
            year,
            chaos_level: chaos,
            deviations: vec!["Tesla funds the grid".into()],
            population_mood: "Electric".into(),
            geopolitical_stability: 70,
        },
        suggested_actions: suggestions.iter().map(|s| s.to_string()).collect(),
    }
}

fn fixtures(clock: &ManualClock) -> (SessionStore, AudioPlayer) {
    let store = SessionStore::open(Box::new(MemoryStore::new()), Arc::new(clock.clone())).unwrap();
    let audio = AudioPlayer::new(Box::new(SilentOutput), &AudioConfig::default());
    (store, audio)
}

#[tokio::test]
async fn test_second_turn_sends_state_and_history() {
    let api = Arc::new(ScriptedApi::new(vec![
        Ok(turn(1900, 10, &["Advance 5 years"])),
        Ok(turn(1905, 30, &[])),
    ]));
    let (runner, _rx) = TurnRunner::new(api.clone(), false);
    let clock = ManualClock::new(1_000);
    let (mut store, mut audio) = fixtures(&clock);

    runner.run(&mut store, &mut audio, "Tesla wins").await.unwrap();
    clock.advance(1_000);
    let outcome = runner
        .run(&mut store, &mut audio, "Advance 5 years")
        .await
        .unwrap();

    assert!(outcome.year_changed);
    assert_eq!(
        store.active().history_points,
        vec![
            HistoryPoint { year: 1900, chaos: 10 },
            HistoryPoint { year: 1905, chaos: 30 },
        ]
    );

    let seen = api.seen.lock().unwrap();
    assert_eq!(seen[1].current_state.as_ref().map(|w| w.year), Some(1900));
    let roles: Vec<Role> = seen[1].history.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Ai, Role::User]);
    assert!(store.active().suggested_actions.is_empty());
}

#[tokio::test]
async fn test_same_year_turn_is_not_a_jump() {
    let api = Arc::new(ScriptedApi::new(vec![
        Ok(turn(1900, 10, &[])),
        Ok(turn(1900, 15, &[])),
    ]));
    let (runner, _rx) = TurnRunner::new(api, false);
    let (mut store, mut audio) = fixtures(&ManualClock::new(1_000));

    runner.run(&mut store, &mut audio, "Begin").await.unwrap();
    let outcome = runner.run(&mut store, &mut audio, "Wait").await.unwrap();
    assert!(!outcome.year_changed);
    assert_eq!(store.active().history_points.len(), 2);
}

#[tokio::test]
async fn test_failed_turn_leaves_state_unchanged() {
    let api = Arc::new(ScriptedApi::new(vec![
        Ok(turn(1900, 10, &["Advance 5 years"])),
        Err(ChronosError::Api {
            status: 500,
            message: "Model overloaded".into(),
        }),
    ]));
    let (runner, _rx) = TurnRunner::new(api, false);
    let (mut store, mut audio) = fixtures(&ManualClock::new(1_000));

    runner.run(&mut store, &mut audio, "Tesla wins").await.unwrap();
    let world_before = store.active().world_state.clone();
    let points_before = store.active().history_points.clone();

    let err = runner
        .run(&mut store, &mut audio, "Advance 5 years")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Temporal sync failed. Try again.");
    assert_eq!(store.active().world_state, world_before);
    assert_eq!(store.active().history_points, points_before);
}

#[tokio::test]
async fn test_illustration_follows_its_session() {
    let mut api = ScriptedApi::new(vec![Ok(turn(1900, 10, &[]))]);
    api.image = Some("data:image/png;base64,iVBORw0K".into());
    api.audio = Some("AAAAAA==".into());
    let (runner, mut rx) = TurnRunner::new(Arc::new(api), true);
    let clock = ManualClock::new(1_000);
    let (mut store, mut audio) = fixtures(&clock);

    runner.run(&mut store, &mut audio, "Tesla wins").await.unwrap();
    let played_in = store.active_id().to_string();

    // Player moves on before the media arrives.
    clock.advance(10);
    store.create().unwrap();

    let mut notices = Vec::new();
    for _ in 0..2 {
        let effect = rx.recv().await.unwrap();
        if let SideEffect::Narration { ref session_id, .. } = effect {
            assert_eq!(session_id, &played_in);
        }
        if let Some(notice) = apply_side_effect(&mut store, &mut audio, effect).unwrap() {
            notices.push(notice);
        }
    }

    assert_eq!(notices, vec![WORLD_UPDATED_NOTICE]);
    assert!(audio.current_state().is_none(), "stale narration must not play");
    assert!(store.active().background_image.is_none());
    let record = store.read(&played_in).unwrap().unwrap();
    assert_eq!(
        record.background_image.as_deref(),
        Some("data:image/png;base64,iVBORw0K")
    );
}

#[tokio::test]
async fn test_no_audio_request_when_disabled() {
    let mut api = ScriptedApi::new(vec![Ok(turn(1900, 10, &[]))]);
    api.audio = Some("AAAAAA==".into());
    let (runner, mut rx) = TurnRunner::new(Arc::new(api), false);
    let (mut store, _) = fixtures(&ManualClock::new(1_000));
    let config = AudioConfig {
        enabled: false,
        ..AudioConfig::default()
    };
    let mut audio = AudioPlayer::new(Box::new(SilentOutput), &config);

    runner.run(&mut store, &mut audio, "Quietly").await.unwrap();
    drop(runner);
    assert!(rx.recv().await.is_none());
}
