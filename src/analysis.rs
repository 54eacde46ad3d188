use crate::history::EpidemicHistory;
use crate::manager::RunReport;
use crate::population::Outcome;
use crate::stats::Accumulator;
use anyhow::{Context, Result, bail};
use std::{fs::File, io::BufWriter, path::Path};

/// Observable accumulated over the runs of a simulation.
pub trait Obs {
    fn update(&mut self, hist: &EpidemicHistory, report: &RunReport) -> Result<()>;
    fn report(&self) -> serde_json::Value;
}

/// Height and timing of the infection peak.
pub struct Peak {
    n_inf: Accumulator,
    i_day: Accumulator,
}

impl Peak {
    pub fn new() -> Self {
        Self {
            n_inf: Accumulator::new(),
            i_day: Accumulator::new(),
        }
    }
}

impl Obs for Peak {
    fn update(&mut self, hist: &EpidemicHistory, _report: &RunReport) -> Result<()> {
        // First day with the maximum count.
        let (i_day, &n_inf) = hist
            .infected()
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|&(_, n_inf)| n_inf)
            .context("history is empty")?;
        self.n_inf.add(n_inf as f64);
        self.i_day.add(i_day as f64);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "peak": {
            "n_inf": self.n_inf.report(),
            "i_day": self.i_day.report(),
        }})
    }
}

/// Recovered and deceased agents at the end of a run.
pub struct FinalToll {
    n_rec: Accumulator,
    n_dec: Accumulator,
    frac_dec: Accumulator,
}

impl FinalToll {
    pub fn new() -> Self {
        Self {
            n_rec: Accumulator::new(),
            n_dec: Accumulator::new(),
            frac_dec: Accumulator::new(),
        }
    }
}

impl Obs for FinalToll {
    fn update(&mut self, hist: &EpidemicHistory, _report: &RunReport) -> Result<()> {
        let n_rec = *hist.recovered().last().context("history is empty")?;
        let n_dec = *hist.deceased().last().context("history is empty")?;
        self.n_rec.add(n_rec as f64);
        self.n_dec.add(n_dec as f64);
        if n_rec + n_dec > 0 {
            self.frac_dec.add(n_dec as f64 / (n_rec + n_dec) as f64);
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "final_toll": {
            "n_rec": self.n_rec.report(),
            "n_dec": self.n_dec.report(),
            "frac_dec": self.frac_dec.report(),
        }})
    }
}

/// Length of the runs and the way they ended.
pub struct Duration {
    n_days: Accumulator,
    n_resolved: usize,
    n_extinct: usize,
    n_incomplete: usize,
}

impl Duration {
    pub fn new() -> Self {
        Self {
            n_days: Accumulator::new(),
            n_resolved: 0,
            n_extinct: 0,
            n_incomplete: 0,
        }
    }
}

impl Obs for Duration {
    fn update(&mut self, hist: &EpidemicHistory, report: &RunReport) -> Result<()> {
        if hist.len() != report.n_days + 1 {
            bail!(
                "report has {} days, but history has {} records",
                report.n_days,
                hist.len()
            );
        }
        self.n_days.add(report.n_days as f64);
        match report.outcome {
            Outcome::Resolved => self.n_resolved += 1,
            Outcome::Extinct => self.n_extinct += 1,
            Outcome::Incomplete => self.n_incomplete += 1,
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "duration": {
            "n_days": self.n_days.report(),
            "n_resolved": self.n_resolved,
            "n_extinct": self.n_extinct,
            "n_incomplete": self.n_incomplete,
        }})
    }
}

pub struct Analyzer {
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new() -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(Peak::new()),
            Box::new(FinalToll::new()),
            Box::new(Duration::new()),
        ];
        Self { obs_ptr_vec }
    }

    /// Add the run whose time series were written with `prefix`.
    pub fn add_run<P: AsRef<Path>>(&mut self, prefix: P, report: &RunReport) -> Result<()> {
        let hist = EpidemicHistory::read(prefix).context("failed to read history")?;
        if hist.is_empty() {
            bail!("history is empty");
        }
        for obs in &mut self.obs_ptr_vec {
            obs.update(&hist, report)
                .context("failed to update observable")?;
        }
        Ok(())
    }

    pub fn results(&self) -> Vec<serde_json::Value> {
        self.obs_ptr_vec.iter().map(|obs| obs.report()).collect()
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, &self.results())
            .context("failed to serialize results")?;
        Ok(())
    }
}
