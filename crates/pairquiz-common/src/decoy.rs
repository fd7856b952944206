use rand::seq::SliceRandom;
use rand::Rng;

use crate::question::Category;

/// Decoys offered alongside the true answer during the guess phase.
pub const DECOY_COUNT: usize = 3;

const MOVIES: &[&str] = &[
    "The Notebook",
    "Titanic",
    "Inception",
    "Avengers",
    "Harry Potter",
    "The Lion King",
    "Frozen",
    "Interstellar",
];

const DESTINATIONS: &[&str] = &[
    "Paris", "Tokyo", "Maldives", "New York", "Bali", "Iceland", "Hawaii", "Italy",
];

const FOODS: &[&str] = &[
    "Pizza",
    "Sushi",
    "Pasta",
    "Tacos",
    "Ice Cream",
    "Chocolate",
    "Burgers",
    "Thai Food",
];

const FEARS: &[&str] = &[
    "Spiders",
    "Heights",
    "Dark",
    "Failure",
    "Being alone",
    "Public speaking",
    "Deep water",
    "Losing loved ones",
];

const SUPERPOWERS: &[&str] = &[
    "Flying",
    "Invisibility",
    "Time travel",
    "Mind reading",
    "Super strength",
    "Teleportation",
    "Healing",
    "Super speed",
];

const GENERIC: &[&str] = &[
    "Something sweet",
    "Quality time",
    "Adventures",
    "Cozy nights in",
    "Music",
    "Nature",
    "Art",
    "Movies",
    "Reading",
    "Traveling",
    "Cooking",
    "Dancing",
    "Gaming",
    "Photography",
];

fn pool_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::Movie => MOVIES,
        Category::Destination => DESTINATIONS,
        Category::Food => FOODS,
        Category::Fear => FEARS,
        Category::Superpower => SUPERPOWERS,
        Category::Generic => GENERIC,
    }
}

/// Pick up to `count` plausible wrong answers for a question.
///
/// The candidate pool for the question's category is filtered against the
/// true answer (case-insensitive), shuffled, and truncated. A pool smaller
/// than `count` after filtering yields fewer decoys, never an error.
pub fn select(category: Category, correct: &str, count: usize, rng: &mut impl Rng) -> Vec<String> {
    let correct_lower = correct.to_lowercase();
    let mut candidates: Vec<&str> = pool_for(category)
        .iter()
        .copied()
        .filter(|c| c.to_lowercase() != correct_lower)
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates.into_iter().map(String::from).collect()
}
