//! Unbiased shuffling and sampling without replacement.
//!
//! Both entry points copy their input; the caller's slice is never reordered.

use rand::Rng;

/// Returns a uniformly random permutation of `items`.
pub(crate) fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with(items, &mut rand::thread_rng())
}

/// Fisher-Yates from the last index down, swapping `i` with a uniform index in `[0, i]`.
pub(crate) fn shuffle_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.gen_range(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}

/// Draws `n` distinct positions of `items` in random order.
///
/// Callers check `n <= items.len()` beforehand; a larger `n` yields every item.
pub(crate) fn sample<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    sample_with(items, n, &mut rand::thread_rng())
}

pub(crate) fn sample_with<T: Clone, R: Rng + ?Sized>(items: &[T], n: usize, rng: &mut R) -> Vec<T> {
    debug_assert!(n <= items.len(), "sample size {n} exceeds {} items", items.len());
    let mut drawn = shuffle_with(items, rng);
    drawn.truncate(n);
    drawn
}
