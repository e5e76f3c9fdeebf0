//! Randomness helpers and the [`Range`] sampler.
//!
//! Every random decision of the generators, the composer and the stream
//! factory is drawn from the generator owned by the [`Context`], so a
//! topology is fully reproducible from its seed. The helpers below only
//! need [`Rng::next_u64`] and therefore accept any generator.
//!
//! [`Context`]: crate::Context

mod range;

use rand_core::Rng;

pub use self::range::{Range, RangeError, RangeItem, RangeParseError, Sample};

/// uniform float in `[0, 1)` with 53 bits of precision
pub fn unit_f64<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// uniform integer in `[0, n)`
///
/// Uses the widening multiply reduction; the bias is below `n / 2^64`
/// and irrelevant for topology sizes.
///
/// # Panics
///
/// in debug builds if `n == 0`
pub fn below<R: Rng + ?Sized>(rng: &mut R, n: u64) -> u64 {
    debug_assert!(n > 0, "cannot draw below 0");
    ((rng.next_u64() as u128 * n as u128) >> 64) as u64
}

/// uniform integer in `[min, max]`, both inclusive
pub fn between<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64) -> u64 {
    debug_assert!(min <= max);
    match (max - min).checked_add(1) {
        Some(span) => min + below(rng, span),
        None => rng.next_u64(),
    }
}

/// uniform float in `[min, max)`
pub fn uniform_f64<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    unit_f64(rng) * (max - min) + min
}

/// Draw uniformly over the natural logarithms of the bounds and
/// exponentiate: every order of magnitude between `min` and `max` is
/// equally likely.
pub fn log_uniform_f64<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    uniform_f64(rng, min.ln(), max.ln()).exp()
}

/// `true` with probability `p`
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    unit_f64(rng) < p
}

/// pick one element uniformly, `None` if `items` is empty
pub fn choose<'a, R: Rng + ?Sized, T>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(below(rng, items.len() as u64) as usize)
    }
}

/// Pick `k` distinct positions out of `0..len`, in random order.
///
/// This is a partial Fisher-Yates shuffle; `k` is clamped to `len`.
pub fn sample_indices<R: Rng + ?Sized>(rng: &mut R, len: usize, k: usize) -> Vec<usize> {
    let k = k.min(len);
    let mut indices: Vec<usize> = (0..len).collect();
    for i in 0..k {
        let j = i + below(rng, (len - i) as u64) as usize;
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

/// Pick `k` distinct elements of `items` (without replacement), in
/// random order.
pub fn sample<R: Rng + ?Sized, T: Clone>(rng: &mut R, items: &[T], k: usize) -> Vec<T> {
    sample_indices(rng, items.len(), k)
        .into_iter()
        .map(|i| items[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng as _;

    fn rng() -> ChaChaRng {
        ChaChaRng::seed_from_u64(42)
    }

    #[test]
    fn unit_is_in_bounds() {
        let mut rng = rng();
        for _ in 0..10_000 {
            let v = unit_f64(&mut rng);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn between_is_inclusive() {
        let mut rng = rng();
        let mut seen = [false; 4];
        for _ in 0..1_000 {
            let v = between(&mut rng, 2, 5);
            assert!((2..=5).contains(&v));
            seen[(v - 2) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "every value should be drawn: {seen:?}");
    }

    #[test]
    fn between_single_value() {
        let mut rng = rng();
        assert_eq!(between(&mut rng, 7, 7), 7);
    }

    #[test]
    fn between_full_range_does_not_overflow() {
        let mut rng = rng();
        let _ = between(&mut rng, 0, u64::MAX);
    }

    #[test]
    fn log_uniform_bounds() {
        let mut rng = rng();
        for _ in 0..1_000 {
            let v = log_uniform_f64(&mut rng, 10e3, 50e6);
            assert!((10e3..=50e6).contains(&v), "{v}");
        }
    }

    #[test]
    fn log_uniform_favours_small_magnitudes() {
        // half of the draws should land below the geometric mean
        let mut rng = rng();
        let below_mean = (0..10_000)
            .filter(|_| log_uniform_f64(&mut rng, 1.0, 10_000.0) < 100.0)
            .count();
        assert!((4_500..5_500).contains(&below_mean), "{below_mean}");
    }

    #[test]
    fn choose_empty() {
        let mut rng = rng();
        let empty: [u8; 0] = [];
        assert!(choose(&mut rng, &empty).is_none());
        assert_eq!(choose(&mut rng, &[3]), Some(&3));
    }

    #[test]
    fn sample_without_replacement() {
        let mut rng = rng();
        let items: Vec<u32> = (0..20).collect();
        let mut picked = sample(&mut rng, &items, 10);
        assert_eq!(picked.len(), 10);
        picked.sort();
        picked.dedup();
        assert_eq!(picked.len(), 10, "sampled elements must be distinct");
    }

    #[test]
    fn sample_clamps_to_len() {
        let mut rng = rng();
        assert_eq!(sample_indices(&mut rng, 3, 10).len(), 3);
        assert!(sample_indices(&mut rng, 0, 1).is_empty());
    }

    #[test]
    fn same_seed_same_draws() {
        let a: Vec<u64> = {
            let mut rng = rng();
            (0..16).map(|_| between(&mut rng, 0, 1_000)).collect()
        };
        let b: Vec<u64> = {
            let mut rng = rng();
            (0..16).map(|_| between(&mut rng, 0, 1_000)).collect()
        };
        assert_eq!(a, b);
    }
}
