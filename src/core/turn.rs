// src/core/turn.rs — One simulation turn, end to end
//
// The turn itself is sequential: record the player's message, ask the service,
// fold the answer into the session. Narration audio and the illustration are
// requested afterwards on their own tasks and come back as `SideEffect`s for
// the caller to apply whenever they arrive.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::audio::AudioPlayer;
use crate::client::{history_from, SimulationApi, SimulationRequest};
use crate::infra::errors::ChronosError;
use crate::session::{HistoryPoint, SessionStore};

/// Shown when a generated illustration lands.
pub const WORLD_UPDATED_NOTICE: &str = "World scenario updated";

/// Late results of a turn, tagged with the session that asked for them.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Narration { session_id: String, audio: String },
    Illustration { session_id: String, image: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub narrative: String,
    pub point: HistoryPoint,
    /// First turn, or the simulation moved to a different year.
    pub year_changed: bool,
}

pub struct TurnRunner {
    api: Arc<dyn SimulationApi>,
    side_effects: mpsc::UnboundedSender<SideEffect>,
    illustrations: bool,
    pending: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter however the task ends.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TurnRunner {
    pub fn new(
        api: Arc<dyn SimulationApi>,
        illustrations: bool,
    ) -> (Self, mpsc::UnboundedReceiver<SideEffect>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = Self {
            api,
            side_effects: tx,
            illustrations,
            pending: Arc::new(AtomicUsize::new(0)),
        };
        (runner, rx)
    }

    /// Side-effect requests still in flight.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Play one turn against the active session. On failure the world state is
    /// left as it was and the caller gets `TurnFailed`; the cause is logged.
    pub async fn run(
        &self,
        store: &mut SessionStore,
        audio: &mut AudioPlayer,
        input: &str,
    ) -> Result<TurnOutcome, ChronosError> {
        let input = input.trim();
        store.record_user_message(input)?;
        audio.stop_audio();

        let active = store.active();
        let previous_year = active.world_state.as_ref().map(|w| w.year);
        let request = SimulationRequest {
            input: input.to_string(),
            history: history_from(&active.messages),
            current_state: active.world_state.clone(),
        };

        let turn = match self.api.simulate_turn(request).await {
            Ok(turn) => turn,
            Err(e) => {
                error!(origin = failure_origin(&e), "Simulation turn failed: {e}");
                return Err(ChronosError::TurnFailed);
            }
        };

        let year_changed = previous_year != Some(turn.world_state_update.year);
        if year_changed {
            audio.play_tick(true);
        }

        let point = store.apply_turn(&turn)?;
        info!(
            year = point.year,
            chaos = point.chaos,
            "Turn applied to session {}",
            store.active_id()
        );

        self.spawn_side_effects(store.active_id(), &turn.narrative, audio.is_enabled());

        Ok(TurnOutcome {
            narrative: turn.narrative,
            point,
            year_changed,
        })
    }

    fn spawn_side_effects(&self, session_id: &str, narrative: &str, want_audio: bool) {
        if want_audio {
            let api = Arc::clone(&self.api);
            let tx = self.side_effects.clone();
            let guard = self.track();
            let session_id = session_id.to_string();
            let narrative = narrative.to_string();
            tokio::spawn(async move {
                let _guard = guard;
                match api.generate_audio(&narrative).await {
                    Ok(Some(audio)) => {
                        let _ = tx.send(SideEffect::Narration { session_id, audio });
                    }
                    Ok(None) => debug!("Service returned no narration"),
                    Err(e) => {
                        error!(origin = failure_origin(&e), "Audio generation failed: {e}")
                    }
                }
            });
        }

        if self.illustrations {
            let api = Arc::clone(&self.api);
            let tx = self.side_effects.clone();
            let guard = self.track();
            let session_id = session_id.to_string();
            let narrative = narrative.to_string();
            tokio::spawn(async move {
                let _guard = guard;
                match api.generate_image(&narrative).await {
                    Ok(Some(image)) => {
                        let _ = tx.send(SideEffect::Illustration { session_id, image });
                    }
                    Ok(None) => debug!("Service returned no illustration"),
                    Err(e) => {
                        error!(origin = failure_origin(&e), "Image generation failed: {e}")
                    }
                }
            });
        }
    }

    fn track(&self) -> PendingGuard {
        self.pending.fetch_add(1, Ordering::SeqCst);
        PendingGuard(Arc::clone(&self.pending))
    }
}

/// Where a failed request broke: at the service boundary or on our side.
fn failure_origin(e: &ChronosError) -> &'static str {
    if e.is_remote() {
        "service"
    } else {
        "local"
    }
}

/// Apply a finished side effect. Returns a notice for the player, if any.
/// Narration for a session that is no longer active is dropped.
pub fn apply_side_effect(
    store: &mut SessionStore,
    audio: &mut AudioPlayer,
    effect: SideEffect,
) -> Result<Option<&'static str>, ChronosError> {
    match effect {
        SideEffect::Narration {
            session_id,
            audio: payload,
        } => {
            if store.active_id() != session_id {
                debug!("Dropping narration for inactive session {session_id}");
                return Ok(None);
            }
            audio.play_audio(&payload)?;
            Ok(None)
        }
        SideEffect::Illustration { session_id, image } => {
            if store.set_background_image(&session_id, image)? {
                Ok(Some(WORLD_UPDATED_NOTICE))
            } else {
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentOutput;
    use crate::infra::clock::ManualClock;
    use crate::infra::config::AudioConfig;
    use crate::session::{SimulationTurn, WorldState};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned service that remembers what it was asked.
    struct MockApi {
        turn: Option<SimulationTurn>,
        audio: Option<String>,
        image: Option<String>,
        requests: Mutex<Vec<SimulationRequest>>,
    }

    #[async_trait]
    impl SimulationApi for MockApi {
        async fn simulate_turn(
            &self,
            request: SimulationRequest,
        ) -> Result<SimulationTurn, ChronosError> {
            self.requests.lock().unwrap().push(request);
            self.turn.clone().ok_or(ChronosError::Api {
                status: 500,
                message: "model unavailable".into(),
            })
        }

        async fn generate_audio(&self, _: &str) -> Result<Option<String>, ChronosError> {
            Ok(self.audio.clone())
        }

        async fn generate_image(&self, _: &str) -> Result<Option<String>, ChronosError> {
            Ok(self.image.clone())
        }
    }

    fn turn(year: i64, chaos: u8) -> SimulationTurn {
        SimulationTurn {
            narrative: format!("It is {year}."),
            world_state_update: WorldState {
                year,
                chaos_level: chaos,
                deviations: vec!["The Archduke survives".into()],
                population_mood: "Tense".into(),
                geopolitical_stability: 60,
            },
            suggested_actions: vec!["Advance 10 years".into()],
        }
    }

    fn fixtures() -> (SessionStore, AudioPlayer) {
        let store = SessionStore::open(
            Box::new(MemoryStore::new()),
            Arc::new(ManualClock::new(1_000)),
        )
        .unwrap();
        let audio = AudioPlayer::new(Box::new(SilentOutput), &AudioConfig::default());
        (store, audio)
    }

    #[tokio::test]
    async fn test_successful_turn_updates_session() {
        let api = Arc::new(MockApi {
            turn: Some(turn(1914, 25)),
            audio: None,
            image: None,
            requests: Mutex::new(Vec::new()),
        });
        let (runner, _rx) = TurnRunner::new(api.clone(), false);
        let (mut store, mut audio) = fixtures();

        let outcome = runner
            .run(&mut store, &mut audio, "  Gavrilo Princip misses  ")
            .await
            .unwrap();

        assert!(outcome.year_changed);
        assert_eq!(outcome.point, HistoryPoint { year: 1914, chaos: 25 });

        let active = store.active();
        assert_eq!(active.messages.len(), 2);
        assert_eq!(active.messages[0].content, "Gavrilo Princip misses");
        assert_eq!(active.suggested_actions, vec!["Advance 10 years".to_string()]);

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].input, "Gavrilo Princip misses");
        assert_eq!(requests[0].history.len(), 1);
        assert!(requests[0].current_state.is_none());
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_world_state() {
        let api = Arc::new(MockApi {
            turn: None,
            audio: None,
            image: None,
            requests: Mutex::new(Vec::new()),
        });
        let (runner, _rx) = TurnRunner::new(api, false);
        let (mut store, mut audio) = fixtures();

        let err = runner
            .run(&mut store, &mut audio, "Carthage wins")
            .await
            .unwrap_err();

        assert!(matches!(err, ChronosError::TurnFailed));
        assert_eq!(err.to_string(), "Temporal sync failed. Try again.");
        assert!(store.active().world_state.is_none());
        assert!(store.active().history_points.is_empty());
        // The player's message stays so the transcript shows what was tried.
        assert_eq!(store.active().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_side_effects_delivered_and_applied() {
        let api = Arc::new(MockApi {
            turn: Some(turn(1914, 25)),
            audio: Some("data:audio/L16;base64,AAAAAA==".into()),
            image: Some("data:image/png;base64,iVBORw0K".into()),
            requests: Mutex::new(Vec::new()),
        });
        let (runner, mut rx) = TurnRunner::new(api, true);
        let (mut store, mut audio) = fixtures();

        runner.run(&mut store, &mut audio, "Go").await.unwrap();

        let mut notices = Vec::new();
        for _ in 0..2 {
            let effect = rx.recv().await.unwrap();
            if let Some(notice) = apply_side_effect(&mut store, &mut audio, effect).unwrap() {
                notices.push(notice);
            }
        }

        assert_eq!(notices, vec![WORLD_UPDATED_NOTICE]);
        assert_eq!(
            store.active().background_image.as_deref(),
            Some("data:image/png;base64,iVBORw0K")
        );
        assert!(audio.current_state().is_some());
    }

    #[tokio::test]
    async fn test_narration_for_inactive_session_dropped() {
        let (mut store, mut audio) = fixtures();
        let effect = SideEffect::Narration {
            session_id: "someone-else".into(),
            audio: "AAAA".into(),
        };
        assert_eq!(apply_side_effect(&mut store, &mut audio, effect).unwrap(), None);
        assert!(audio.current_state().is_none());
    }

    #[test]
    fn test_failure_origin_separates_service_from_local() {
        let down = ChronosError::Api {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(failure_origin(&down), "service");
        assert_eq!(
            failure_origin(&ChronosError::Transport("connection reset".into())),
            "service"
        );
        assert_eq!(failure_origin(&ChronosError::TurnFailed), "local");
        assert_eq!(
            failure_origin(&ChronosError::AudioDevice("no sink".into())),
            "local"
        );
    }
}
