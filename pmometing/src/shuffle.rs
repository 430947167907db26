//! Fisher–Yates shuffling
//!
//! Each call draws from the thread-local generator and is independently
//! random. Use [`permute_with`] with a seeded generator for reproducible
//! orders.

use rand::Rng;

/// Returns a uniformly random permutation of `items`
///
/// The input is left untouched; length and multiset are preserved.
pub fn permute<T: Clone>(items: &[T]) -> Vec<T> {
    permute_with(items, &mut rand::rng())
}

/// Same as [`permute`] with an explicit generator
pub fn permute_with<T: Clone, R: Rng>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.random_range(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}

/// A random permutation of `0..len`
///
/// Lets a caller keep an exact mapping between an ordered list and its
/// shuffled view, even when the list holds duplicates.
pub fn permuted_indices(len: usize) -> Vec<usize> {
    let indices: Vec<usize> = (0..len).collect();
    permute(&indices)
}
