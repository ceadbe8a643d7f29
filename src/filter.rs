use num_traits::{Float, FloatConst};

/// Smoothing factor of a first order low pass filter for a timestep and cutoff frequency (Hz).
/// A non-positive cutoff disables filtering.
pub fn alpha<T: Float + FloatConst>(dt: T, cutoff_freq: T) -> T {
    if cutoff_freq <= T::zero() || dt <= T::zero() {
        return T::one();
    }

    let rc = T::one() / (T::TAU() * cutoff_freq);
    (dt / (dt + rc)).min(T::one()).max(T::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn disabled_cutoff_passes_samples() {
        assert_eq!(alpha(0.01f64, 0.), 1.);
        assert_eq!(alpha(0.0f64, 10.), 1.);
    }

    #[test]
    fn smoothing_factor() {
        let rc = 1. / (core::f64::consts::TAU * 10.);
        assert_relative_eq!(alpha(0.001f64, 10.), 0.001 / (0.001 + rc));

        // a slow filter settles on a constant input
        let mut output = 0.;
        for _ in 0..2000 {
            output += alpha(0.001, 10.) * (1. - output);
        }
        assert_relative_eq!(output, 1., epsilon = 1e-6);
    }
}
