use crate::config::Config;
use crate::history::EpidemicHistory;
use crate::pathogen::Pathogen;
use crate::population::{Outcome, Population};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;

/// Simulation engine.
///
/// Holds the configuration, the pathogen, the population and the random
/// number generator, and steps the outbreak one day at a time.
pub struct Engine {
    cfg: Config,
    pathogen: Pathogen,
    pop: Population,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with a freshly generated population and the
    /// initial infections seeded, all drawn from `seed`.
    pub fn generate_initial_condition(cfg: Config, seed: u64) -> Result<Self> {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);

        let pathogen = cfg.pathogen.to_pathogen().context("failed to construct pathogen")?;

        let profiles = cfg
            .social
            .iter()
            .map(|social| social.to_profile())
            .collect::<Result<Vec<_>>>()
            .context("failed to construct social profiles")?;
        let weights: Vec<_> = cfg.social.iter().map(|social| social.weight).collect();

        let mut pop = Population::generate(cfg.population.n_agt, profiles, &weights, &mut rng)
            .context("failed to generate population")?;
        log::info!("day -1: {pop}");

        pop.seed(cfg.n_inf_seed(), &pathogen, &mut rng)
            .context("failed to seed infections")?;
        log::info!("pathogen: {pathogen}");

        Ok(Self {
            cfg,
            pathogen,
            pop,
            rng,
        })
    }

    #[cfg(test)]
    pub fn population(&self) -> &Population {
        &self.pop
    }

    /// Run the outbreak until it ends or the day limit is reached.
    ///
    /// Every simulated day is recorded, including the initial condition and
    /// the last day.
    pub fn perform_simulation(&mut self) -> Result<(EpidemicHistory, Outcome)> {
        let n_days_max = self.cfg.run.n_days_max;
        let mut hist = EpidemicHistory::new();
        let mut today = self.cfg.run.start_date;
        let mut i_day = 0;

        self.record_day(&mut hist, today, i_day)?;

        while self.pop.is_active(today, i_day) && i_day < n_days_max {
            self.pop.spread(&self.pathogen, &mut self.rng);
            debug_assert!(self.pop.verify().is_ok());

            i_day += 1;
            today = today.succ_opt().context("date out of range")?;
            self.record_day(&mut hist, today, i_day)?;
        }

        let outcome = self.pop.termination().unwrap_or(Outcome::Incomplete);
        if outcome == Outcome::Incomplete {
            log::info!("{outcome} after {i_day} days: {}", self.pop);
        }

        Ok((hist, outcome))
    }

    fn record_day(
        &self,
        hist: &mut EpidemicHistory,
        today: NaiveDate,
        i_day: usize,
    ) -> Result<()> {
        hist.add_day(today, self.pop.n_inf(), self.pop.n_rec(), self.pop.n_dec())
            .context("failed to record day")?;
        log::info!("day {i_day} ({today}): {}", self.pop);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PathogenConfig, PopulationConfig, RunConfig, SocialConfig};
    use std::fs;

    fn config() -> Config {
        Config {
            population: PopulationConfig {
                n_agt: 2_000,
                n_inf_init: 10,
                factor_unreported: 1,
            },
            pathogen: PathogenConfig {
                mean_dur: 6.0,
                std_dev_dur: 2.0,
                prob_inf_init: 0.1,
                rate_inf_decay: 0.05,
                prob_death: 0.05,
            },
            social: vec![SocialConfig {
                mean_cont: 5.0,
                std_dev_cont: 2.0,
                n_family: 4,
                n_work: 200,
                ratio_family: 0.1,
                weight: 1.0,
            }],
            run: RunConfig {
                n_days_max: 60,
                seed: 1000,
                start_date: NaiveDate::from_ymd_opt(2020, 3, 31).unwrap(),
                output_prefix: "sim".to_string(),
            },
        }
    }

    fn n_touched(hist: &EpidemicHistory, i_day: usize) -> usize {
        hist.infected()[i_day] + hist.recovered()[i_day] + hist.deceased()[i_day]
    }

    fn zero_contacts(cfg: &mut Config) {
        cfg.social[0].mean_cont = 0.0;
        cfg.social[0].std_dev_cont = 0.0;
    }

    #[test]
    fn zero_contact_scenario_burns_out() {
        let mut cfg = config();
        cfg.population.n_agt = 100;
        cfg.population.n_inf_init = 5;
        cfg.pathogen.mean_dur = 3.0;
        cfg.pathogen.std_dev_dur = 0.0;
        cfg.run.n_days_max = 10;
        zero_contacts(&mut cfg);

        let mut engine = Engine::generate_initial_condition(cfg, 7).unwrap();
        let (hist, outcome) = engine.perform_simulation().unwrap();

        assert_eq!(outcome, Outcome::Extinct);
        assert_eq!(hist.infected(), &[5, 5, 5, 0]);
        assert_eq!(hist.len(), 4);

        let pop = engine.population();
        assert_eq!(pop.n_inf(), 0);
        assert_eq!(pop.n_rec() + pop.n_dec(), 5);
        assert_eq!(pop.n_sus(), 95);
    }

    #[test]
    fn zero_contacts_never_exceed_seeded_infections() {
        for seed in 0..5 {
            let mut cfg = config();
            zero_contacts(&mut cfg);
            cfg.run.n_days_max = 1_000;

            let mut engine = Engine::generate_initial_condition(cfg, seed).unwrap();
            let (hist, outcome) = engine.perform_simulation().unwrap();

            assert_eq!(outcome, Outcome::Extinct);
            assert!(hist.infected().iter().all(|&n_inf| n_inf <= 10));
            for i_day in 0..hist.len() {
                let n_tot = n_touched(&hist, i_day);
                assert_eq!(n_tot, 10);
            }
        }
    }

    #[test]
    fn day_limit_gives_incomplete_outcome() {
        let mut cfg = config();
        cfg.pathogen.mean_dur = 50.0;
        cfg.pathogen.std_dev_dur = 0.0;
        cfg.run.n_days_max = 5;

        let mut engine = Engine::generate_initial_condition(cfg, 1).unwrap();
        let (hist, outcome) = engine.perform_simulation().unwrap();

        assert_eq!(outcome, Outcome::Incomplete);
        assert_eq!(hist.len(), 6);
        assert_eq!(hist.dates()[5], NaiveDate::from_ymd_opt(2020, 4, 5).unwrap());
        assert!(engine.population().n_inf() > 0);
    }

    #[test]
    fn zero_fatality_never_kills() {
        let mut cfg = config();
        cfg.pathogen.prob_death = 0.0;
        cfg.pathogen.prob_inf_init = 0.3;

        for seed in 0..3 {
            let mut engine = Engine::generate_initial_condition(cfg.clone(), seed).unwrap();
            let (hist, _) = engine.perform_simulation().unwrap();
            assert!(hist.deceased().iter().all(|&n_dec| n_dec == 0));
        }
    }

    #[test]
    fn outbreak_conserves_agents_every_day() {
        let mut cfg = config();
        cfg.pathogen.prob_inf_init = 0.3;
        cfg.run.n_days_max = 200;

        let mut engine = Engine::generate_initial_condition(cfg, 11).unwrap();
        let (hist, outcome) = engine.perform_simulation().unwrap();

        assert_ne!(outcome, Outcome::Incomplete);
        assert!(hist.infected().iter().max().unwrap() > &10);
        for i_day in 0..hist.len() {
            let n_tot = n_touched(&hist, i_day);
            assert!(n_tot <= 2_000);
        }
        engine.population().verify().unwrap();
    }

    #[test]
    fn same_seed_gives_identical_output() {
        let dir = tempfile::tempdir().unwrap();

        let mut contents = Vec::new();
        for i_run in 0..2 {
            let mut engine = Engine::generate_initial_condition(config(), 42).unwrap();
            let (hist, _) = engine.perform_simulation().unwrap();
            let prefix = dir.path().join(format!("run{i_run}"));
            hist.write(&prefix).unwrap();
            for series in ["confirmed", "deaths"] {
                let file = dir.path().join(format!("run{i_run}_{series}_SIMUS.csv"));
                contents.push(fs::read(file).unwrap());
            }
        }
        assert_eq!(contents[0], contents[2]);
        assert_eq!(contents[1], contents[3]);
    }
}
