//! YIN numeric kernels: difference function, CMNDF, dip picking and
//! parabolic lag refinement.

use rustfft::{num_complex::Complex, FftPlanner};

/// YIN difference function d(tau) for tau in [0, max_lag].
///
/// Computed through FFT autocorrelation instead of the quadratic nested loop:
/// d(tau) = E(0..n-tau) + E(tau..n) - 2*r(tau), where E is signal energy over
/// the given index range and r the raw autocorrelation.
pub fn difference(frame: &[f32], max_lag: usize) -> Vec<f32> {
    let n = frame.len();
    let mut d = vec![0.0f32; max_lag + 1];
    if n < 2 || max_lag == 0 {
        return d;
    }

    // Zero-padded power spectrum -> inverse transform gives autocorrelation.
    let padded = (2 * n).next_power_of_two();
    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(padded);
    let inverse = planner.plan_fft_inverse(padded);

    let mut spectrum: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); padded];
    for (slot, &s) in spectrum.iter_mut().zip(frame.iter()) {
        slot.re = s;
    }
    forward.process(&mut spectrum);
    for c in spectrum.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    inverse.process(&mut spectrum);
    let norm = 1.0 / padded as f32;

    // Cumulative energy lets both tail sums come out of one prefix table.
    let mut energy = vec![0.0f32; n + 1];
    for (i, &s) in frame.iter().enumerate() {
        energy[i + 1] = energy[i] + s * s;
    }

    for lag in 1..=max_lag.min(n - 1) {
        let head = energy[n - lag];
        let tail = energy[n] - energy[lag];
        let r = spectrum[lag].re * norm;
        let power = head + tail;
        let raw = power - 2.0 * r;
        // A DC-only frame (constant samples) has d(tau) = 0 at every lag; the
        // f32 FFT leaves cancellation noise there instead, which the CMNDF
        // normalization would amplify into spurious dips. Anything below a
        // small fraction of the frame power is that noise, not structure;
        // genuine off-period lags in the search band sit orders of magnitude
        // above it.
        d[lag] = if raw < power * 1e-4 { 0.0 } else { raw };
    }
    d
}

/// Cumulative mean normalized difference: d'(tau) = d(tau) * tau / sum_{1..tau} d.
/// d'(0) is defined as 1; a zero running sum (silence) also maps to 1.
pub fn cmndf(diff: &[f32]) -> Vec<f32> {
    let mut out = vec![1.0f32; diff.len()];
    let mut acc = 0.0f32;
    for (lag, &d) in diff.iter().enumerate().skip(1) {
        acc += d;
        out[lag] = if acc > 0.0 { d * lag as f32 / acc } else { 1.0 };
    }
    out
}

/// Local minima of the CMNDF restricted to the lag band [min_lag, max_lag],
/// in ascending lag order.
pub fn local_dips(cmnd: &[f32], min_lag: usize, max_lag: usize) -> Vec<usize> {
    let mut dips = Vec::new();
    let hi = max_lag.min(cmnd.len().saturating_sub(2));
    for lag in min_lag.max(1)..=hi {
        if cmnd[lag] < cmnd[lag - 1] && cmnd[lag] <= cmnd[lag + 1] {
            dips.push(lag);
        }
    }
    dips
}

/// Refine an integer dip lag by fitting a parabola through its neighbors.
pub fn refine_lag(cmnd: &[f32], lag: usize) -> f32 {
    if lag == 0 || lag + 1 >= cmnd.len() {
        return lag as f32;
    }
    let (a, b, c) = (cmnd[lag - 1], cmnd[lag], cmnd[lag + 1]);
    let curvature = a - 2.0 * b + c;
    if curvature.abs() < 1e-12 {
        return lag as f32;
    }
    lag as f32 + 0.5 * (a - c) / curvature
}
