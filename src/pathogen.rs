use crate::utils::{check_finite, check_num, check_prob};
use crate::variate::RandomVariate;
use anyhow::{Context, Result};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};
use std::{fmt, ops::Bound};

/// Disease parameters of an outbreak.
///
/// The per-contact infection probability decays exponentially with the time
/// the infector has been infectious:
/// `prob_inf(t) = prob_inf_init * exp(-rate_inf_decay * t)`, clamped to `[0, 1]`.
/// A negative rate makes the probability grow instead.
#[derive(Debug, Clone)]
pub struct Pathogen {
    dur: RandomVariate,
    prob_inf_init: f64,
    rate_inf_decay: f64,
    prob_death: f64,
    death_dist: Bernoulli,
}

impl Pathogen {
    /// Create a new pathogen.
    ///
    /// # Errors
    /// Returns an error if a probability is outside `[0, 1]`, if the mean
    /// duration is not positive, or if the decay rate is not finite.
    pub fn new(
        mean_dur: f64,
        std_dev_dur: f64,
        prob_inf_init: f64,
        rate_inf_decay: f64,
        prob_death: f64,
    ) -> Result<Self> {
        check_num(mean_dur, (Bound::Excluded(0.0), Bound::Unbounded))
            .context("invalid mean duration")?;
        let dur = RandomVariate::new(mean_dur, std_dev_dur, true)
            .context("invalid duration distribution")?;

        check_prob(prob_inf_init).context("invalid initial infection probability")?;
        check_finite(rate_inf_decay).context("invalid infection probability decay rate")?;
        check_prob(prob_death).context("invalid death probability")?;

        let death_dist = Bernoulli::new(prob_death).context("failed to construct death dist")?;

        Ok(Self {
            dur,
            prob_inf_init,
            rate_inf_decay,
            prob_death,
            death_dist,
        })
    }

    /// Infection probability of a contact with an agent infectious for `t` days.
    pub fn prob_inf(&self, t: f64) -> f64 {
        if self.prob_inf_init == 0.0 {
            return 0.0;
        }
        (self.prob_inf_init * (-self.rate_inf_decay * t).exp()).clamp(0.0, 1.0)
    }

    /// Perform one transmission trial.
    pub fn expose<R: Rng + ?Sized>(&self, t: f64, rng: &mut R) -> bool {
        rng.random_bool(self.prob_inf(t))
    }

    /// Draw the infectious duration of a newly infected agent.
    pub fn draw_duration<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.dur.sample(rng)
    }

    /// Decide whether an infection that ran its course is fatal.
    pub fn is_fatal<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.death_dist.sample(rng)
    }
}

impl fmt::Display for Pathogen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "duration: {} +- {}, prob_inf: {} (decay rate {}), prob_death: {}",
            self.dur.mean(),
            self.dur.std_dev(),
            self.prob_inf_init,
            self.rate_inf_decay,
            self.prob_death
        )
    }
}
