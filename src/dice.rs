use rand::Rng;

/// True with probability `1/n`; `n == 0` means "never".
#[inline]
pub(crate) fn one_in<R: Rng + ?Sized>(rng: &mut R, n: u32) -> bool {
    n > 0 && rng.gen_range(0..n) == 0
}

/// Inclusive range that tolerates reversed bounds.
#[inline]
pub(crate) fn span<R: Rng + ?Sized>(rng: &mut R, a: i32, b: i32) -> i32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.gen_range(lo..=hi)
}

/// -1 or +1.
#[inline]
pub(crate) fn sign<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    if rng.gen_bool(0.5) {
        1
    } else {
        -1
    }
}
