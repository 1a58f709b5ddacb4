//! Utilities.

/// Moving average of `x` over a window of `n` values.
///
/// The `i`-th output is the mean of `x[i..i + n]`, so the output has
/// `x.len() - n + 1` values. It is empty if `x` is shorter than the window or `n == 0`.
pub fn running_mean(x: &[f32], n: usize) -> Vec<f32> {
    if n == 0 || x.len() < n {
        return vec![];
    }

    let mut cumsum = Vec::with_capacity(x.len() + 1);
    cumsum.push(0f64);
    for v in x.iter() {
        let last = cumsum[cumsum.len() - 1];
        cumsum.push(last + *v as f64);
    }

    (n..cumsum.len())
        .map(|i| ((cumsum[i] - cumsum[i - n]) / n as f64) as f32)
        .collect()
}
