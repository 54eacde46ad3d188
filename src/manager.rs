use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Engine;
use crate::population::Outcome;
use anyhow::{Context, Result};
use glob::glob;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Summary of a finished run, stored next to its time series.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub outcome: Outcome,
    pub n_days: usize,
}

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Simulate a new run in its own directory.
    ///
    /// Run `i` is seeded with the configured seed plus `i`.
    pub fn create_run(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let seed = self.cfg.run.seed.wrapping_add(run_idx as u64);
        let mut engine = Engine::generate_initial_condition(self.cfg.clone(), seed)
            .context("failed to generate initial condition")?;

        let (hist, outcome) = engine
            .perform_simulation()
            .context("failed to perform simulation")?;

        hist.write(self.output_prefix(run_idx))
            .context("failed to write history")?;
        if let (Some(first), Some(last)) = (hist.dates().first(), hist.dates().last()) {
            log::info!("recorded {outcome} outbreak from {first} to {last}");
        }

        let report = RunReport {
            seed,
            outcome,
            n_days: hist.len() - 1,
        };
        let report_file = self.report_file(run_idx);
        let report_str = toml::to_string(&report).context("failed to serialize run report")?;
        fs::write(&report_file, report_str)
            .with_context(|| format!("failed to write {report_file:?}"))?;

        Ok(())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let mut analyzer = Analyzer::new();

        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let report = self
                .read_report(run_idx)
                .context("failed to read run report")?;
            analyzer
                .add_run(self.output_prefix(run_idx), &report)
                .with_context(|| format!("failed to add run {run_idx}"))?;
        }

        analyzer
            .save_results(self.results_file())
            .context("failed to save results")?;

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        let run_dirs = self.run_dirs().context("failed to list run dirs")?;
        for run_dir in run_dirs {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }

        let results_file = self.results_file();
        if results_file.exists() {
            fs::remove_file(&results_file)
                .with_context(|| format!("failed to remove {results_file:?}"))?;
            log::info!("removed {results_file:?}");
        }

        Ok(())
    }

    fn read_report(&self, run_idx: usize) -> Result<RunReport> {
        let report_file = self.report_file(run_idx);
        let report_str = fs::read_to_string(&report_file)
            .with_context(|| format!("failed to read {report_file:?}"))?;
        toml::from_str(&report_str).context("failed to deserialize run report")
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let run_dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(run_dirs)
    }

    fn count_run_dirs(&self) -> Result<usize> {
        Ok(self.run_dirs()?.len())
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn output_prefix(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join(&self.cfg.run.output_prefix)
    }

    fn report_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("report.toml")
    }

    fn results_file(&self) -> PathBuf {
        self.sim_dir.join("analysis.json")
    }
}
