use rand::Rng;
use rand::seq::SliceRandom;

pub const QUIZ_OPTION_COUNT: usize = 4;

/// Build the answer choices for one quiz prompt: the correct text plus up to three
/// distinct distractors from `pool`, shuffled. A pool with nothing but the correct
/// answer yields a single option.
pub fn quiz_options<R: Rng + ?Sized>(correct: &str, pool: &[&str], rng: &mut R) -> Vec<String> {
    let mut candidates: Vec<&str> = Vec::new();
    for &text in pool {
        if text != correct && !text.trim().is_empty() && !candidates.contains(&text) {
            candidates.push(text);
        }
    }

    if candidates.is_empty() {
        return vec![correct.to_string()];
    }

    let mut options: Vec<String> = candidates
        .choose_multiple(rng, QUIZ_OPTION_COUNT - 1)
        .map(|s| s.to_string())
        .collect();
    options.push(correct.to_string());
    options.shuffle(rng);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_four_distinct_options_with_correct_once() {
        let pool = ["apple", "river", "stone", "cloud", "exit", "brave"];
        for seed in 0..50 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let options = quiz_options("exit", &pool, &mut rng);
            assert_eq!(options.len(), 4);
            assert_eq!(options.iter().filter(|o| *o == "exit").count(), 1);
            let mut sorted = options.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), 4);
        }
    }

    #[test]
    fn test_duplicates_in_pool_are_ignored() {
        let pool = ["exit", "raw", "raw", "raw"];
        let mut rng = SmallRng::seed_from_u64(7);
        let mut options = quiz_options("exit", &pool, &mut rng);
        options.sort();
        assert_eq!(options, vec!["exit".to_string(), "raw".to_string()]);
    }

    #[test]
    fn test_degenerate_pool_gives_single_option() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(quiz_options("exit", &["exit"], &mut rng), vec!["exit"]);
        assert_eq!(quiz_options("exit", &[], &mut rng), vec!["exit"]);
    }

    #[test]
    fn test_same_seed_same_options() {
        let pool = ["a1", "b2", "c3", "d4", "e5", "f6", "g7"];
        let mut rng_a = SmallRng::seed_from_u64(99);
        let mut rng_b = SmallRng::seed_from_u64(99);
        assert_eq!(
            quiz_options("d4", &pool, &mut rng_a),
            quiz_options("d4", &pool, &mut rng_b)
        );
    }
}
