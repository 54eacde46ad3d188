use crate::model::{Agent, Status};
use crate::pathogen::Pathogen;
use crate::social::SocialProfile;
use crate::utils::check_num;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rand::{Rng, seq::index};
use rand_distr::{Distribution, weighted::WeightedIndex};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// Way a simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every agent recovered or died.
    Resolved,
    /// No infected agents remain.
    Extinct,
    /// The day limit was reached while the pathogen was still active.
    Incomplete,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Outcome::Resolved => "pathogen completed",
            Outcome::Extinct => "pathogen is dead",
            Outcome::Incomplete => "pathogen still active",
        };
        f.write_str(msg)
    }
}

/// Fixed-size population of agents.
///
/// Besides the agents themselves, the population keeps the ids of infected,
/// recovered and deceased agents in ordered index sets. These sets always
/// agree with the agents' statuses: every transition goes through the
/// methods below, which update both.
pub struct Population {
    agt_vec: Vec<Agent>,
    profiles: Vec<SocialProfile>,

    infected: BTreeSet<usize>,
    recovered: BTreeSet<usize>,
    deceased: BTreeSet<usize>,
}

impl Population {
    /// Generate a population of `n_agt` susceptible agents.
    ///
    /// Each agent is assigned one of `profiles`, chosen with probability
    /// proportional to `weights`.
    pub fn generate<R: Rng + ?Sized>(
        n_agt: usize,
        profiles: Vec<SocialProfile>,
        weights: &[f64],
        rng: &mut R,
    ) -> Result<Self> {
        check_num(n_agt, 1..).context("invalid number of agents")?;
        if profiles.is_empty() {
            bail!("population needs at least one social profile");
        }
        if profiles.len() != weights.len() {
            bail!(
                "number of weights must be {}, but is {}",
                profiles.len(),
                weights.len()
            );
        }

        let profile_dist = WeightedIndex::new(weights).context("invalid profile weights")?;
        let agt_vec = (0..n_agt)
            .map(|id| Agent::new(id, profile_dist.sample(rng)))
            .collect();

        Ok(Self {
            agt_vec,
            profiles,
            infected: BTreeSet::new(),
            recovered: BTreeSet::new(),
            deceased: BTreeSet::new(),
        })
    }

    #[cfg(test)]
    pub fn agent(&self, id: usize) -> &Agent {
        &self.agt_vec[id]
    }

    pub fn n_agt(&self) -> usize {
        self.agt_vec.len()
    }

    pub fn n_sus(&self) -> usize {
        self.n_agt() - self.n_inf() - self.n_rec() - self.n_dec()
    }

    pub fn n_inf(&self) -> usize {
        self.infected.len()
    }

    pub fn n_rec(&self) -> usize {
        self.recovered.len()
    }

    pub fn n_dec(&self) -> usize {
        self.deceased.len()
    }

    /// Infect `n_inf` distinct agents chosen uniformly at random.
    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        n_inf: usize,
        pathogen: &Pathogen,
        rng: &mut R,
    ) -> Result<()> {
        check_num(n_inf, 0..=self.n_agt()).context("invalid number of seeded infections")?;

        let ids = index::sample(rng, self.n_agt(), n_inf);
        for id in ids {
            self.infect(id, pathogen, rng)?;
        }
        log::debug!("seeded {n_inf} infections");

        Ok(())
    }

    /// Infect an agent regardless of its current status.
    ///
    /// Recovered and deceased agents are taken out of their index sets first.
    /// An agent that is already infected starts a new infection.
    pub fn infect<R: Rng + ?Sized>(
        &mut self,
        id: usize,
        pathogen: &Pathogen,
        rng: &mut R,
    ) -> Result<()> {
        let n_agt = self.n_agt();
        let agt = self
            .agt_vec
            .get_mut(id)
            .with_context(|| format!("agent id must be less than {n_agt}, but is {id}"))?;

        match agt.status() {
            Status::Recovered => {
                self.recovered.remove(&id);
            }
            Status::Deceased => {
                self.deceased.remove(&id);
            }
            Status::Susceptible | Status::Infected { .. } => {}
        }

        agt.infect(pathogen.draw_duration(rng));
        self.infected.insert(id);

        Ok(())
    }

    /// Simulate one day of the outbreak.
    pub fn spread<R: Rng + ?Sized>(&mut self, pathogen: &Pathogen, rng: &mut R) {
        let n_agt = self.n_agt();

        // Agents infected today only become active tomorrow.
        let active: Vec<usize> = self.infected.iter().copied().collect();

        let mut offsets = Vec::new();
        for &id in &active {
            let agt = &self.agt_vec[id];
            let t = agt.days_infected().map_or(0, |days| days.saturating_sub(1)) as f64;
            self.profiles[agt.profile()].daily_contacts(rng, &mut offsets);

            for &offset in &offsets {
                self.expose((id + offset) % n_agt, t, pathogen, rng);
            }
        }

        for &id in &active {
            let agt = &mut self.agt_vec[id];
            agt.advance_day();
            if !agt.is_expired() {
                continue;
            }

            self.infected.remove(&id);
            if pathogen.is_fatal(rng) {
                agt.die();
                self.deceased.insert(id);
            } else {
                agt.recover();
                self.recovered.insert(id);
            }
        }
    }

    /// Expose a susceptible agent to an agent infectious for `t` days.
    fn expose<R: Rng + ?Sized>(&mut self, id: usize, t: f64, pathogen: &Pathogen, rng: &mut R) {
        let agt = &mut self.agt_vec[id];
        if !agt.is_susceptible() {
            return;
        }
        if !pathogen.expose(t, rng) {
            return;
        }

        agt.infect(pathogen.draw_duration(rng));
        self.infected.insert(id);
    }

    /// Reason the outbreak is over, if it is.
    pub fn termination(&self) -> Option<Outcome> {
        if self.n_rec() + self.n_dec() >= self.n_agt() {
            Some(Outcome::Resolved)
        } else if self.n_inf() < 1 {
            Some(Outcome::Extinct)
        } else {
            None
        }
    }

    /// Check whether the outbreak is still going on at day `i_day`.
    pub fn is_active(&self, today: NaiveDate, i_day: usize) -> bool {
        match self.termination() {
            None => true,
            Some(outcome) => {
                log::info!("day {i_day} ({today}): {self}");
                log::info!("{outcome} after {i_day} days");
                false
            }
        }
    }

    /// Rebuild the index sets from the agents' statuses and compare them.
    pub fn verify(&self) -> Result<()> {
        let mut infected = BTreeSet::new();
        let mut recovered = BTreeSet::new();
        let mut deceased = BTreeSet::new();

        for (i_agt, agt) in self.agt_vec.iter().enumerate() {
            if agt.id() != i_agt {
                bail!("agent at index {i_agt} has id {}", agt.id());
            }
            match agt.status() {
                Status::Susceptible => {}
                Status::Infected { .. } => {
                    infected.insert(i_agt);
                }
                Status::Recovered => {
                    recovered.insert(i_agt);
                }
                Status::Deceased => {
                    deceased.insert(i_agt);
                }
            }
        }

        if infected != self.infected {
            bail!("infected ids do not match agent statuses");
        }
        if recovered != self.recovered {
            bail!("recovered ids do not match agent statuses");
        }
        if deceased != self.deceased {
            bail!("deceased ids do not match agent statuses");
        }

        Ok(())
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n_agt: {}, n_sus: {}, n_inf: {}, n_rec: {}, n_dec: {}",
            self.n_agt(),
            self.n_sus(),
            self.n_inf(),
            self.n_rec(),
            self.n_dec()
        )
    }
}
