use crate::pathogen::Pathogen;
use crate::social::SocialProfile;
use crate::utils::{check_finite, check_num};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fs, ops::Bound, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub population: PopulationConfig,
    pub pathogen: PathogenConfig,
    /// Social profiles the agents are drawn from.
    pub social: Vec<SocialConfig>,
    pub run: RunConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopulationConfig {
    /// Number of agents.
    pub n_agt: usize,
    /// Number of initially infected agents that are reported.
    pub n_inf_init: usize,
    /// Number of actual infections per reported one at the start.
    #[serde(default = "default_factor_unreported")]
    pub factor_unreported: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathogenConfig {
    /// Mean of the infectious duration in days.
    pub mean_dur: f64,
    /// Standard deviation of the infectious duration in days.
    pub std_dev_dur: f64,
    /// Infection probability per contact on the first infectious day.
    pub prob_inf_init: f64,
    /// Daily exponential decay rate of the infection probability.
    pub rate_inf_decay: f64,
    /// Probability that an infection is fatal.
    pub prob_death: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocialConfig {
    /// Mean number of daily contacts.
    pub mean_cont: f64,
    /// Standard deviation of the number of daily contacts.
    pub std_dev_cont: f64,
    /// Number of family members.
    pub n_family: usize,
    /// Number of work colleagues.
    pub n_work: usize,
    /// Fraction of contacts within the family.
    pub ratio_family: f64,
    /// Relative share of agents with this profile.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Maximum number of simulated days.
    pub n_days_max: usize,
    /// Seed of the first run.
    pub seed: u64,
    /// Date of the first recorded day.
    pub start_date: NaiveDate,
    /// Prefix of the output time series files.
    pub output_prefix: String,
}

fn default_factor_unreported() -> usize {
    1
}

fn default_weight() -> f64 {
    1.0
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Total number of agents infected at the start.
    pub fn n_inf_seed(&self) -> usize {
        self.population.n_inf_init * self.population.factor_unreported
    }

    fn validate(&self) -> Result<()> {
        let pop = &self.population;
        check_num(pop.n_agt, 1..).context("invalid number of agents")?;
        check_num(pop.factor_unreported, 1..).context("invalid unreported factor")?;
        check_num(pop.n_inf_init, 1..=pop.n_agt)
            .context("invalid initial number of infected agents")?;
        let n_inf_seed = pop
            .n_inf_init
            .checked_mul(pop.factor_unreported)
            .context("initial number of infections overflows")?;
        check_num(n_inf_seed, 1..=pop.n_agt)
            .context("invalid initial number of infections including unreported ones")?;

        self.pathogen
            .to_pathogen()
            .context("invalid pathogen parameters")?;

        if self.social.is_empty() {
            bail!("at least one social profile is required");
        }
        for (i_prof, social) in self.social.iter().enumerate() {
            social
                .to_profile()
                .with_context(|| format!("invalid social profile {i_prof}"))?;
            check_finite(social.weight)
                .and_then(|_| check_num(social.weight, (Bound::Excluded(0.0), Bound::Unbounded)))
                .with_context(|| format!("invalid weight of social profile {i_prof}"))?;
        }

        check_num(self.run.n_days_max, 1..).context("invalid maximum number of days")?;
        if self.run.output_prefix.is_empty() {
            bail!("output prefix must not be empty");
        }

        Ok(())
    }
}

impl PathogenConfig {
    pub fn to_pathogen(&self) -> Result<Pathogen> {
        Pathogen::new(
            self.mean_dur,
            self.std_dev_dur,
            self.prob_inf_init,
            self.rate_inf_decay,
            self.prob_death,
        )
    }
}

impl SocialConfig {
    pub fn to_profile(&self) -> Result<SocialProfile> {
        SocialProfile::new(
            self.mean_cont,
            self.std_dev_cont,
            self.n_family,
            self.n_work,
            self.ratio_family,
        )
    }
}
