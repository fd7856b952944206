use std::time::Duration;

use uuid::Uuid;

use pairquiz_common::game::GameState;
use pairquiz_common::player::Player;
use pairquiz_common::protocol::PlayerInfo;

use crate::timer::PhaseTimer;

pub const MAX_PLAYERS: usize = 2;

/// Phase durations for a room. The client-visible limits are what the UI
/// counts down from; the server deadlines run 2s longer to absorb delivery
/// latency before force-filling.
#[derive(Debug, Clone)]
pub struct RoundTiming {
    /// Pause between `GameStarting` and the first question.
    pub start_grace: Duration,
    /// Answer countdown shown to clients, in seconds.
    pub answer_limit_secs: u64,
    /// Server-side answer deadline.
    pub answer_deadline: Duration,
    /// Guess countdown shown to clients, in seconds.
    pub guess_limit_secs: u64,
    /// Server-side guess deadline.
    pub guess_deadline: Duration,
    /// Pause on the result screen before the next round or game over.
    pub result_delay: Duration,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            start_grace: Duration::from_millis(1500),
            answer_limit_secs: 30,
            answer_deadline: Duration::from_secs(32),
            guess_limit_secs: 20,
            guess_deadline: Duration::from_secs(22),
            result_delay: Duration::from_secs(4),
        }
    }
}

/// A match context for up to two players, identified by its code. Owns the
/// round state machine and the two outstanding phase timers.
#[derive(Debug)]
pub struct Room {
    pub code: String,
    pub players: Vec<Player>,
    pub game: GameState,
    pub timing: RoundTiming,
    pub answer_timer: PhaseTimer,
    pub guess_timer: PhaseTimer,
}

impl Room {
    pub fn new(code: String, first_player: Player, timing: RoundTiming) -> Self {
        Self {
            code,
            players: vec![first_player],
            game: GameState::new(),
            timing,
            answer_timer: PhaseTimer::new(),
            guess_timer: PhaseTimer::new(),
        }
    }

    pub fn add_player(&mut self, player: Player) {
        debug_assert!(self.players.len() < MAX_PLAYERS);
        self.players.push(player);
    }

    pub fn remove_player(&mut self, player_id: Uuid) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == player_id)?;
        Some(self.players.remove(idx))
    }

    pub fn contains_player(&self, player_id: Uuid) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: Uuid) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn partner_of(&self, player_id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id != player_id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn all_ready(&self) -> bool {
        self.players.len() == MAX_PLAYERS && self.players.iter().all(|p| p.ready)
    }

    pub fn player_ids(&self) -> Vec<Uuid> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.players.iter().map(PlayerInfo::from).collect()
    }

    pub fn cancel_timers(&mut self) {
        self.answer_timer.cancel();
        self.guess_timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with(names: &[&str]) -> Room {
        let mut players = names
            .iter()
            .map(|n| Player::new(Uuid::new_v4(), n.to_string()));
        let mut room = Room::new(
            "ABC234".into(),
            players.next().expect("at least one player"),
            RoundTiming::default(),
        );
        for p in players {
            room.add_player(p);
        }
        room
    }

    #[test]
    fn test_room_capacity() {
        let mut room = room_with(&["Alice"]);
        assert!(!room.is_full());
        room.add_player(Player::new(Uuid::new_v4(), "Bob".into()));
        assert!(room.is_full());
        assert_eq!(room.players.len(), MAX_PLAYERS);
    }

    #[test]
    fn test_partner_lookup() {
        let room = room_with(&["Alice", "Bob"]);
        let alice = room.players[0].id;
        let bob = room.players[1].id;
        assert_eq!(room.partner_of(alice).unwrap().id, bob);
        assert_eq!(room.partner_of(bob).unwrap().id, alice);
    }

    #[test]
    fn test_all_ready_requires_two_players() {
        let mut room = room_with(&["Alice"]);
        room.players[0].ready = true;
        assert!(!room.all_ready());

        room.add_player(Player::new(Uuid::new_v4(), "Bob".into()));
        assert!(!room.all_ready());
        room.players[1].ready = true;
        assert!(room.all_ready());
    }

    #[test]
    fn test_remove_player() {
        let mut room = room_with(&["Alice", "Bob"]);
        let alice = room.players[0].id;
        let removed = room.remove_player(alice).unwrap();
        assert_eq!(removed.name, "Alice");
        assert!(!room.contains_player(alice));
        assert!(room.remove_player(alice).is_none());
        assert!(!room.is_empty());
    }

    #[test]
    fn test_default_timing_matches_round_contract() {
        let timing = RoundTiming::default();
        // Server deadlines trail the client countdowns by 2 seconds.
        assert_eq!(
            timing.answer_deadline.as_secs(),
            timing.answer_limit_secs + 2
        );
        assert_eq!(timing.guess_deadline.as_secs(), timing.guess_limit_secs + 2);
    }
}
