use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use tracing::info;

/// Load a newline-delimited wordpool, skipping blank lines.
pub fn load_wordpool(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read wordpool: {}", path.display()))?;

    let words: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    info!(count = words.len(), path = %path.display(), "wordpool loaded");
    Ok(words)
}

/// In-place Fisher-Yates shuffle, walking from the last unprocessed index
/// down to the front.
pub fn shuffle<T>(rng: &mut impl Rng, items: &mut [T]) {
    let mut n = items.len();
    while n > 1 {
        let k = rng.gen_range(0..n);
        n -= 1;
        items.swap(n, k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..500).collect();
        let mut rng = StdRng::seed_from_u64(42);
        shuffle(&mut rng, &mut items);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..500).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_is_deterministic_for_a_seed() {
        let mut a: Vec<u32> = (0..100).collect();
        let mut b: Vec<u32> = (0..100).collect();
        shuffle(&mut StdRng::seed_from_u64(7), &mut a);
        shuffle(&mut StdRng::seed_from_u64(7), &mut b);

        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_give_different_orders() {
        let mut a: Vec<u32> = (0..100).collect();
        let mut b: Vec<u32> = (0..100).collect();
        shuffle(&mut StdRng::seed_from_u64(1), &mut a);
        shuffle(&mut StdRng::seed_from_u64(2), &mut b);

        assert_ne!(a, b);
    }

    #[test]
    fn shuffle_preserves_duplicates() {
        let mut items = vec!["DOG", "DOG", "CAT"];
        shuffle(&mut StdRng::seed_from_u64(3), &mut items);

        assert_eq!(items.iter().filter(|w| **w == "DOG").count(), 2);
        assert_eq!(items.iter().filter(|w| **w == "CAT").count(), 1);
    }

    #[test]
    fn empty_and_singleton_are_untouched() {
        let mut empty: Vec<u32> = vec![];
        shuffle(&mut StdRng::seed_from_u64(0), &mut empty);
        assert!(empty.is_empty());

        let mut one = vec![9];
        shuffle(&mut StdRng::seed_from_u64(0), &mut one);
        assert_eq!(one, vec![9]);
    }
}
