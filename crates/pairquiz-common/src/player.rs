use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub ready: bool,
    pub score: u32,
}

impl Player {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            ready: false,
            score: 0,
        }
    }

    /// Back to the pre-game state: not ready, nothing scored.
    pub fn reset_for_new_game(&mut self) {
        self.ready = false;
        self.score = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_starts_unready_with_zero_score() {
        let p = Player::new(Uuid::new_v4(), "Alice".into());
        assert!(!p.ready);
        assert_eq!(p.score, 0);
    }

    #[test]
    fn test_reset_for_new_game() {
        let mut p = Player::new(Uuid::new_v4(), "Bob".into());
        p.ready = true;
        p.score = 4;
        p.reset_for_new_game();
        assert!(!p.ready);
        assert_eq!(p.score, 0);
    }
}
