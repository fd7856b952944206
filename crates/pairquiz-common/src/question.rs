use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How many questions a single game runs through.
pub const ROUNDS_PER_GAME: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Movie,
    Destination,
    Food,
    Fear,
    Superpower,
    Generic,
}

/// An immutable prompt pair: one wording for the player answering about
/// themselves, one for the partner guessing. The category drives decoy
/// selection and is fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub for_answerer: &'static str,
    pub for_guesser: &'static str,
    pub category: Category,
}

pub const POOL: [Question; 15] = [
    Question {
        for_answerer: "What's your favorite movie?",
        for_guesser: "What's their favorite movie?",
        category: Category::Movie,
    },
    Question {
        for_answerer: "What's your dream vacation destination?",
        for_guesser: "What's their dream vacation destination?",
        category: Category::Destination,
    },
    Question {
        for_answerer: "What's your favorite food?",
        for_guesser: "What's their favorite food?",
        category: Category::Food,
    },
    Question {
        for_answerer: "What's your biggest fear?",
        for_guesser: "What's their biggest fear?",
        category: Category::Fear,
    },
    Question {
        for_answerer: "What's your favorite song right now?",
        for_guesser: "What's their favorite song right now?",
        category: Category::Generic,
    },
    Question {
        for_answerer: "If you could have any superpower, what would it be?",
        for_guesser: "What superpower would they want?",
        category: Category::Superpower,
    },
    Question {
        for_answerer: "What's your favorite memory of us?",
        for_guesser: "What's their favorite memory of you two?",
        category: Category::Generic,
    },
    Question {
        for_answerer: "What's something you've always wanted to try?",
        for_guesser: "What's something they've always wanted to try?",
        category: Category::Generic,
    },
    Question {
        for_answerer: "What's your comfort show?",
        for_guesser: "What's their comfort show?",
        category: Category::Generic,
    },
    Question {
        for_answerer: "What makes you happiest?",
        for_guesser: "What makes them happiest?",
        category: Category::Generic,
    },
    Question {
        for_answerer: "What's your favorite season?",
        for_guesser: "What's their favorite season?",
        category: Category::Generic,
    },
    Question {
        for_answerer: "What's your love language?",
        for_guesser: "What's their love language?",
        category: Category::Generic,
    },
    Question {
        for_answerer: "What's your ideal date night?",
        for_guesser: "What's their ideal date night?",
        category: Category::Generic,
    },
    Question {
        for_answerer: "What's a song that reminds you of us?",
        for_guesser: "What song reminds them of you two?",
        category: Category::Generic,
    },
    Question {
        for_answerer: "What's your guilty pleasure?",
        for_guesser: "What's their guilty pleasure?",
        category: Category::Generic,
    },
];

/// Sample `count` questions without replacement: Fisher-Yates shuffle of the
/// full pool, keeping the first `count` of the shuffled order.
pub fn sample(rng: &mut impl Rng, count: usize) -> Vec<Question> {
    let mut shuffled = POOL.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(count);
    shuffled
}
