use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use pairquiz_common::game::GamePhase;
use pairquiz_common::player::Player;

use crate::room::{Room, RoundTiming};

pub const CODE_LENGTH: usize = 6;

/// 32 symbols; 0/O/1/I are excluded as visually ambiguous.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("room not found")]
    RoomNotFound,
    #[error("room is full")]
    RoomFull,
    #[error("game already in progress")]
    GameInProgress,
}

/// Owns every live room, keyed by code. One instance per server; handed
/// around explicitly so tests can run against their own registry.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    timing: RoundTiming,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_timing(RoundTiming::default())
    }

    pub fn with_timing(timing: RoundTiming) -> Self {
        Self {
            rooms: HashMap::new(),
            timing,
        }
    }

    /// Draw codes until one is free. Collisions are vanishingly rare with a
    /// 32^6 space but would silently cross-wire two rooms, so they are
    /// checked against the live set.
    fn generate_code(&self, rng: &mut impl Rng) -> String {
        loop {
            let code: String = (0..CODE_LENGTH)
                .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    /// Create a room containing its first player; returns the room code.
    pub fn create(&mut self, first_player: Player, rng: &mut impl Rng) -> String {
        let code = self.generate_code(rng);
        let room = Room::new(code.clone(), first_player, self.timing.clone());
        self.rooms.insert(code.clone(), room);
        code
    }

    /// Append a second player to a waiting room.
    pub fn join(&mut self, code: &str, player: Player) -> Result<&mut Room, RegistryError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or(RegistryError::RoomNotFound)?;
        if room.is_full() {
            return Err(RegistryError::RoomFull);
        }
        if room.game.phase != GamePhase::Waiting {
            return Err(RegistryError::GameInProgress);
        }
        room.add_player(player);
        Ok(room)
    }

    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn remove(&mut self, code: &str) -> Option<Room> {
        self.rooms.remove(code)
    }

    /// Which room, if any, a player currently occupies.
    pub fn find_player_room(&self, player_id: Uuid) -> Option<String> {
        self.rooms
            .iter()
            .find(|(_, room)| room.contains_player(player_id))
            .map(|(code, _)| code.clone())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn player(name: &str) -> Player {
        Player::new(Uuid::new_v4(), name.into())
    }

    #[test]
    fn test_create_produces_wellformed_code() {
        let mut registry = RoomRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);
        let code = registry.create(player("Alice"), &mut rng);
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert_eq!(registry.get(&code).unwrap().players.len(), 1);
    }

    #[test]
    fn test_code_collision_retries() {
        let mut registry = RoomRegistry::new();
        let mut rng = StdRng::seed_from_u64(9);
        let first = registry.create(player("Alice"), &mut rng);

        // Same seed replays the same draw sequence, forcing a collision on
        // the first attempt; the registry must keep drawing.
        let mut rng = StdRng::seed_from_u64(9);
        let second = registry.create(player("Carol"), &mut rng);
        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_join_appends_second_player() {
        let mut registry = RoomRegistry::new();
        let mut rng = StdRng::seed_from_u64(2);
        let code = registry.create(player("Alice"), &mut rng);
        let room = registry.join(&code, player("Bob")).unwrap();
        assert_eq!(room.players.len(), 2);
    }

    #[test]
    fn test_join_unknown_room() {
        let mut registry = RoomRegistry::new();
        assert!(matches!(
            registry.join("ZZZZZZ", player("Bob")),
            Err(RegistryError::RoomNotFound)
        ));
    }

    #[test]
    fn test_join_full_room() {
        let mut registry = RoomRegistry::new();
        let mut rng = StdRng::seed_from_u64(3);
        let code = registry.create(player("Alice"), &mut rng);
        registry.join(&code, player("Bob")).unwrap();
        assert!(matches!(
            registry.join(&code, player("Carol")),
            Err(RegistryError::RoomFull)
        ));
        // The failed join left the room untouched.
        assert_eq!(registry.get(&code).unwrap().players.len(), 2);
    }

    #[test]
    fn test_join_game_in_progress() {
        let mut registry = RoomRegistry::new();
        let mut rng = StdRng::seed_from_u64(4);
        let code = registry.create(player("Alice"), &mut rng);
        {
            let room = registry.get_mut(&code).unwrap();
            // One player left, so a join would otherwise be allowed.
            room.game.start(&mut rng).unwrap();
        }
        assert!(matches!(
            registry.join(&code, player("Bob")),
            Err(RegistryError::GameInProgress)
        ));
    }

    #[test]
    fn test_find_player_room_and_remove() {
        let mut registry = RoomRegistry::new();
        let mut rng = StdRng::seed_from_u64(5);
        let alice = player("Alice");
        let alice_id = alice.id;
        let code = registry.create(alice, &mut rng);

        assert_eq!(registry.find_player_room(alice_id), Some(code.clone()));
        assert_eq!(registry.find_player_room(Uuid::new_v4()), None);

        registry.remove(&code);
        assert!(registry.get(&code).is_none());
        assert_eq!(registry.find_player_room(alice_id), None);
        assert!(registry.is_empty());
    }
}
