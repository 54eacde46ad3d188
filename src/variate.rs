//! Gaussian random variates.

use crate::utils::{check_finite, check_num};
use anyhow::{Context, Result, bail};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Gaussian-distributed quantity with an optional non-negativity constraint.
///
/// When `non_neg` is set, [`RandomVariate::sample`] resamples until it draws
/// a value `>= 0`. A non-negative variate must have a non-negative mean, so
/// every draw is accepted with probability at least one half.
#[derive(Debug, Clone)]
pub struct RandomVariate {
    mean: f64,
    std_dev: f64,
    non_neg: bool,
    dist: Normal<f64>,
}

impl RandomVariate {
    /// Create a new variate with the given mean and standard deviation.
    ///
    /// # Errors
    /// Returns an error if the parameters are not finite, if the standard
    /// deviation is negative, or if `non_neg` is set with a negative mean.
    pub fn new(mean: f64, std_dev: f64, non_neg: bool) -> Result<Self> {
        check_finite(mean).context("invalid mean")?;
        check_finite(std_dev).context("invalid standard deviation")?;
        check_num(std_dev, 0.0..).context("invalid standard deviation")?;
        if non_neg && mean < 0.0 {
            bail!("non-negative variate must have a non-negative mean, but mean is {mean}");
        }

        let dist = Normal::new(mean, std_dev).context("failed to construct normal distribution")?;

        Ok(Self {
            mean,
            std_dev,
            non_neg,
            dist,
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Draw one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let val = self.dist.sample(rng);
            if !self.non_neg || val >= 0.0 {
                return val;
            }
        }
    }
}
