use crate::utils::{check_num, check_prob};
use crate::variate::RandomVariate;
use anyhow::{Context, Result};
use rand::Rng;
use std::fmt;

/// Daily contact behaviour shared by a class of agents.
///
/// Contacts are addressed relative to the agent's own id: a family contact
/// lies within the next `n_family` ids, a work contact within the next
/// `n_work` ids (wrapping around the population).
#[derive(Debug, Clone)]
pub struct SocialProfile {
    cont: RandomVariate,
    n_family: usize,
    n_work: usize,
    ratio_family: f64,
}

impl SocialProfile {
    /// Create a new social profile.
    ///
    /// # Errors
    /// Returns an error if the contact distribution is invalid, if a group
    /// is empty, or if `ratio_family` is outside `[0, 1]`.
    pub fn new(
        mean_cont: f64,
        std_dev_cont: f64,
        n_family: usize,
        n_work: usize,
        ratio_family: f64,
    ) -> Result<Self> {
        check_num(mean_cont, 0.0..).context("invalid mean number of contacts")?;
        let cont = RandomVariate::new(mean_cont, std_dev_cont, true)
            .context("invalid contact distribution")?;
        check_num(n_family, 1..).context("invalid family size")?;
        check_num(n_work, 1..).context("invalid work group size")?;
        check_prob(ratio_family).context("invalid family contact ratio")?;

        Ok(Self {
            cont,
            n_family,
            n_work,
            ratio_family,
        })
    }

    /// Draw today's contacts as offsets relative to the agent's id.
    ///
    /// The buffer is cleared before being filled.
    pub fn daily_contacts<R: Rng + ?Sized>(&self, rng: &mut R, offsets: &mut Vec<usize>) {
        offsets.clear();

        let n_cont = self.cont.sample(rng) as usize;
        for _ in 0..n_cont {
            let offset = if rng.random_bool(self.ratio_family) {
                rng.random_range(0..self.n_family)
            } else {
                rng.random_range(0..self.n_work)
            };
            offsets.push(offset);
        }
    }
}

impl fmt::Display for SocialProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "contacts: {} +- {}, n_family: {}, n_work: {}, ratio_family: {}",
            self.cont.mean(),
            self.cont.std_dev(),
            self.n_family,
            self.n_work,
            self.ratio_family
        )
    }
}
