use std::future::Future;
use std::pin::Pin;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

use pairquiz_common::decoy::{self, DECOY_COUNT};
use pairquiz_common::game::{GamePhase, RoundPhase};
use pairquiz_common::player::Player;
use pairquiz_common::protocol::{
    ClientMessage, ErrorCode, FinalScore, GuessResult, ServerMessage,
};
use pairquiz_common::scoring::{NO_ANSWER, NO_GUESS};

use crate::registry::RegistryError;
use crate::server::SharedState;

pub async fn handle_message(
    player_id: Uuid,
    msg: ClientMessage,
    state: &SharedState,
) -> anyhow::Result<()> {
    match msg {
        ClientMessage::CreateRoom { player_name } => {
            let mut registry = state.registry.write().await;
            let mut rng = StdRng::from_entropy();
            let code = registry.create(Player::new(player_id, player_name), &mut rng);
            let players = match registry.get(&code) {
                Some(room) => room.player_infos(),
                None => return Ok(()),
            };
            drop(registry);

            tracing::info!(room = %code, player = %player_id, "room created");
            send_to_player(
                player_id,
                ServerMessage::RoomCreated {
                    room_code: code,
                    player_id,
                    players,
                },
                state,
            )
            .await;
        }

        ClientMessage::JoinRoom {
            room_code,
            player_name,
        } => {
            let mut registry = state.registry.write().await;
            match registry.join(&room_code, Player::new(player_id, player_name)) {
                Ok(room) => {
                    let players = room.player_infos();
                    let partner_ids: Vec<Uuid> = room
                        .player_ids()
                        .into_iter()
                        .filter(|id| *id != player_id)
                        .collect();
                    drop(registry);

                    tracing::info!(room = %room_code, player = %player_id, "player joined");
                    send_to_player(
                        player_id,
                        ServerMessage::RoomJoined {
                            room_code,
                            player_id,
                            players: players.clone(),
                        },
                        state,
                    )
                    .await;
                    send_to_room(
                        &partner_ids,
                        &ServerMessage::PlayerJoined { players },
                        state,
                    )
                    .await;
                }
                Err(e) => {
                    drop(registry);
                    let (code, message) = registry_error_to_protocol(&e);
                    send_to_player(player_id, ServerMessage::Error { code, message }, state).await;
                }
            }
        }

        ClientMessage::Ready { room_code, ready } => {
            let mut registry = state.registry.write().await;
            // Unknown room: a stale message for a destroyed room, not an error.
            let Some(room) = registry.get_mut(&room_code) else {
                return Ok(());
            };
            let Some(player) = room.player_mut(player_id) else {
                return Ok(());
            };
            player.ready = ready;

            let players = room.player_infos();
            let member_ids = room.player_ids();
            let should_start = room.game.phase == GamePhase::Waiting && room.all_ready();
            drop(registry);

            send_to_room(
                &member_ids,
                &ServerMessage::PlayerReadyUpdate { players },
                state,
            )
            .await;

            if should_start {
                start_game(state, room_code).await;
            }
        }

        ClientMessage::SubmitAnswer { room_code, answer } => {
            let mut registry = state.registry.write().await;
            let Some(room) = registry.get_mut(&room_code) else {
                return Ok(());
            };
            if !room.contains_player(player_id) {
                return Ok(());
            }
            if let Err(e) = room.game.record_answer(player_id, answer) {
                tracing::debug!(room = %room_code, player = %player_id, error = %e, "answer dropped");
                return Ok(());
            }

            let member_ids = room.player_ids();
            if room.game.all_answered(&member_ids) {
                room.answer_timer.cancel();
                drop(registry);
                begin_guess_phase(state, room_code).await;
            }
        }

        ClientMessage::SubmitGuess { room_code, guess } => {
            let mut registry = state.registry.write().await;
            let Some(room) = registry.get_mut(&room_code) else {
                return Ok(());
            };
            if !room.contains_player(player_id) {
                return Ok(());
            }
            if let Err(e) = room.game.record_guess(player_id, guess) {
                tracing::debug!(room = %room_code, player = %player_id, error = %e, "guess dropped");
                return Ok(());
            }

            let member_ids = room.player_ids();
            if room.game.all_guessed(&member_ids) {
                room.guess_timer.cancel();
                drop(registry);
                end_round(state, room_code).await;
            }
        }

        ClientMessage::PlayAgain { room_code } => {
            let mut registry = state.registry.write().await;
            let Some(room) = registry.get_mut(&room_code) else {
                return Ok(());
            };
            if !room.contains_player(player_id) || room.game.phase != GamePhase::Finished {
                return Ok(());
            }

            room.game.reset();
            for p in &mut room.players {
                p.reset_for_new_game();
            }
            let players = room.player_infos();
            let member_ids = room.player_ids();
            drop(registry);

            tracing::info!(room = %room_code, "room reset for a rematch");
            send_to_room(
                &member_ids,
                &ServerMessage::PlayerReadyUpdate { players },
                state,
            )
            .await;
        }

        ClientMessage::Ping => {
            send_to_player(player_id, ServerMessage::Pong, state).await;
        }

        ClientMessage::Disconnect => {
            handle_disconnect(player_id, state).await;
        }

        // Consumed during the handshake; a repeat is ignored.
        ClientMessage::Hello { .. } => {}
    }

    Ok(())
}

// -- Phase flow --
//
// Each step acquires the registry lock, mutates, collects outbound messages,
// then delivers after releasing the lock. Deadline tasks re-validate the
// room, phase, and round number when they fire, so a fire that lost the race
// against player submissions (or a room teardown) is a no-op.

async fn start_game(state: &SharedState, code: String) {
    let mut registry = state.registry.write().await;
    let Some(room) = registry.get_mut(&code) else {
        return;
    };
    let mut rng = StdRng::from_entropy();
    if let Err(e) = room.game.start(&mut rng) {
        tracing::debug!(room = %code, error = %e, "start skipped");
        return;
    }
    for p in &mut room.players {
        p.score = 0;
    }

    let total_rounds = room.game.total_rounds();
    let member_ids = room.player_ids();
    let grace = room.timing.start_grace;
    drop(registry);

    tracing::info!(room = %code, total_rounds, "game starting");
    send_to_room(
        &member_ids,
        &ServerMessage::GameStarting { total_rounds },
        state,
    )
    .await;

    let state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        start_round(&state, code).await;
    });
}

async fn start_round(state: &SharedState, code: String) {
    let mut registry = state.registry.write().await;
    let Some(room) = registry.get_mut(&code) else {
        return;
    };
    let question = match room.game.begin_round() {
        Ok(q) => q,
        Err(e) => {
            // The game was torn down (or reset) while this was scheduled.
            tracing::debug!(room = %code, error = %e, "round not started");
            return;
        }
    };

    let round = room.game.current_round;
    let member_ids = room.player_ids();
    let time_limit = room.timing.answer_limit_secs;

    let deadline_state = state.clone();
    let deadline_code = code.clone();
    if let Err(e) = room.answer_timer.arm(room.timing.answer_deadline, async move {
        on_answer_deadline(&deadline_state, deadline_code, round).await;
    }) {
        tracing::error!(room = %code, round, error = %e, "answer timer conflict");
    }
    drop(registry);

    tracing::debug!(room = %code, round, "answer phase");
    send_to_room(
        &member_ids,
        &ServerMessage::QuestionPhase {
            round,
            question: question.for_answerer.to_string(),
            time_limit,
        },
        state,
    )
    .await;
}

async fn on_answer_deadline(state: &SharedState, code: String, round: usize) {
    {
        let mut registry = state.registry.write().await;
        let Some(room) = registry.get_mut(&code) else {
            return;
        };
        if room.game.phase != GamePhase::Playing
            || room.game.current_round != round
            || room.game.round_phase != Some(RoundPhase::Answer)
        {
            return;
        }
        let member_ids = room.player_ids();
        room.game.fill_missing_answers(&member_ids);
        tracing::debug!(room = %code, round, "answer deadline reached");
    }
    begin_guess_phase(state, code).await;
}

async fn begin_guess_phase(state: &SharedState, code: String) {
    let mut registry = state.registry.write().await;
    let Some(room) = registry.get_mut(&code) else {
        return;
    };
    if room.game.begin_guess_phase().is_err() {
        return;
    }
    let Some(question) = room.game.current_question() else {
        return;
    };

    let round = room.game.current_round;
    let time_limit = room.timing.guess_limit_secs;
    let mut rng = StdRng::from_entropy();

    // Each player sees the partner's answer hidden among decoys, so the
    // option sets are built and delivered per player.
    let mut unicasts = Vec::new();
    for pid in room.player_ids() {
        let Some(partner) = room.partner_of(pid) else {
            continue;
        };
        let Some(correct) = room.game.answers.get(&partner.id).cloned() else {
            continue;
        };
        let mut options = vec![correct.clone()];
        options.extend(decoy::select(
            question.category,
            &correct,
            DECOY_COUNT,
            &mut rng,
        ));
        options.shuffle(&mut rng);
        unicasts.push((
            pid,
            ServerMessage::GuessPhase {
                question: question.for_guesser.to_string(),
                answers: options,
                time_limit,
            },
        ));
    }

    let deadline_state = state.clone();
    let deadline_code = code.clone();
    if let Err(e) = room.guess_timer.arm(room.timing.guess_deadline, async move {
        on_guess_deadline(&deadline_state, deadline_code, round).await;
    }) {
        tracing::error!(room = %code, round, error = %e, "guess timer conflict");
    }
    drop(registry);

    tracing::debug!(room = %code, round, "guess phase");
    for (pid, msg) in unicasts {
        send_to_player(pid, msg, state).await;
    }
}

async fn on_guess_deadline(state: &SharedState, code: String, round: usize) {
    {
        let mut registry = state.registry.write().await;
        let Some(room) = registry.get_mut(&code) else {
            return;
        };
        if room.game.phase != GamePhase::Playing
            || room.game.current_round != round
            || room.game.round_phase != Some(RoundPhase::Guess)
        {
            return;
        }
        let member_ids = room.player_ids();
        room.game.fill_missing_guesses(&member_ids);
        tracing::debug!(room = %code, round, "guess deadline reached");
    }
    end_round(state, code).await;
}

async fn end_round(state: &SharedState, code: String) {
    let mut registry = state.registry.write().await;
    let Some(room) = registry.get_mut(&code) else {
        return;
    };
    if room.game.begin_result_phase().is_err() {
        return;
    }

    let round = room.game.current_round;
    let is_last_round = room.game.is_last_round();

    let mut unicasts = Vec::new();
    for pid in room.player_ids() {
        let Some(partner) = room.partner_of(pid) else {
            continue;
        };
        let partner_id = partner.id;
        let yours = room.game.round_outcome(pid, partner_id);
        let theirs = room.game.round_outcome(partner_id, pid);

        if yours.correct {
            if let Some(p) = room.player_mut(pid) {
                p.score += 1;
            }
        }

        let your_answer = room
            .game
            .answers
            .get(&pid)
            .cloned()
            .unwrap_or_else(|| NO_ANSWER.into());
        let partner_answer = room
            .game
            .answers
            .get(&partner_id)
            .cloned()
            .unwrap_or_else(|| NO_ANSWER.into());
        unicasts.push((
            pid,
            ServerMessage::RoundResult {
                your_result: GuessResult {
                    correct: yours.correct,
                    guess: yours.guess.unwrap_or_else(|| NO_GUESS.into()),
                },
                partner_result: GuessResult {
                    correct: theirs.correct,
                    guess: theirs.guess.unwrap_or_else(|| NO_GUESS.into()),
                },
                your_answer,
                partner_answer,
                is_last_round,
            },
        ));
    }

    let delay = room.timing.result_delay;
    drop(registry);

    tracing::debug!(room = %code, round, is_last_round, "round finished");
    for (pid, msg) in unicasts {
        send_to_player(pid, msg, state).await;
    }

    let state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        after_result_delay(&state, code, round).await;
    });
}

// Returns a boxed future with an explicit `Send` bound rather than being a
// plain `async fn`. The phase-advance functions form a cycle through the
// `tokio::spawn`/`PhaseTimer::arm` `Send` bounds
// (start_round -> on_answer_deadline -> begin_guess_phase -> on_guess_deadline
// -> end_round -> after_result_delay -> start_round), which rustc cannot
// resolve while inferring each opaque future's auto-traits. Declaring the
// `Send` bound here once makes that inference graph acyclic.
fn after_result_delay<'a>(
    state: &'a SharedState,
    code: String,
    round: usize,
) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        let is_last_round = {
            let registry = state.registry.read().await;
            let Some(room) = registry.get(&code) else {
                return;
            };
            // A disconnect (or a full rematch) may have reset the room while the
            // result screen was up; this delayed advance no longer applies.
            if room.game.phase != GamePhase::Playing
                || room.game.current_round != round
                || room.game.round_phase != Some(RoundPhase::Result)
            {
                return;
            }
            room.game.is_last_round()
        };

        if is_last_round {
            end_game(state, code).await;
        } else {
            start_round(state, code).await;
        }
    })
}

async fn end_game(state: &SharedState, code: String) {
    let mut registry = state.registry.write().await;
    let Some(room) = registry.get_mut(&code) else {
        return;
    };
    room.game.finish();

    let results: Vec<FinalScore> = room
        .players
        .iter()
        .map(|p| FinalScore {
            id: p.id,
            name: p.name.clone(),
            score: p.score,
        })
        .collect();
    let member_ids = room.player_ids();
    drop(registry);

    tracing::info!(room = %code, "game over");
    send_to_room(&member_ids, &ServerMessage::GameOver { results }, state).await;
}

// -- Disconnect --

pub async fn handle_disconnect(player_id: Uuid, state: &SharedState) {
    let mut registry = state.registry.write().await;
    let mut notify = None;

    if let Some(code) = registry.find_player_room(player_id) {
        let mut destroy = false;
        if let Some(room) = registry.get_mut(&code) {
            room.remove_player(player_id);
            // Any in-flight round is discarded either way.
            room.cancel_timers();
            if room.is_empty() {
                destroy = true;
            } else {
                room.game.reset();
                for p in &mut room.players {
                    p.ready = false;
                }
                notify = Some((
                    room.player_ids(),
                    ServerMessage::PlayerLeft {
                        players: room.player_infos(),
                    },
                ));
            }
        }
        if destroy {
            registry.remove(&code);
            tracing::info!(room = %code, "room destroyed");
        } else {
            tracing::info!(room = %code, player = %player_id, "player left");
        }
    }
    drop(registry);

    if let Some((member_ids, msg)) = notify {
        send_to_room(&member_ids, &msg, state).await;
    }

    state.connections.write().await.remove(&player_id);
}

// -- Delivery primitives --

/// Unicast to one connection. Unknown/closed connections are skipped.
pub async fn send_to_player(player_id: Uuid, msg: ServerMessage, state: &SharedState) {
    let conns = state.connections.read().await;
    if let Some(conn) = conns.get(&player_id) {
        let _ = conn.tx.send(msg).await;
    }
}

/// Broadcast to every listed room member.
pub async fn send_to_room(member_ids: &[Uuid], msg: &ServerMessage, state: &SharedState) {
    let conns = state.connections.read().await;
    for id in member_ids {
        if let Some(conn) = conns.get(id) {
            let _ = conn.tx.send(msg.clone()).await;
        }
    }
}

fn registry_error_to_protocol(e: &RegistryError) -> (ErrorCode, String) {
    let code = match e {
        RegistryError::RoomNotFound => ErrorCode::RoomNotFound,
        RegistryError::RoomFull => ErrorCode::RoomFull,
        RegistryError::GameInProgress => ErrorCode::GameInProgress,
    };
    (code, e.to_string())
}
