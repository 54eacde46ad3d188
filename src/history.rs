//! Daily record of an outbreak and its CSV time series format.
//!
//! Each series is written to its own file with two lines: a header made of
//! fixed location fields followed by the dates, and a data line made of a
//! fixed synthetic location followed by the daily counts. This is the layout
//! of public surveillance time series, so simulated and real data can be
//! compared with the same tools.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::{
    ffi::OsString,
    fs::File,
    path::{Path, PathBuf},
};

const DATE_FMT: &str = "%Y-%m-%d";

const HEADER_BASE: [&str; 11] = [
    "UID",
    "iso2",
    "iso3",
    "code3",
    "FIPS",
    "Admin2",
    "Province_State",
    "Country_Region",
    "Lat",
    "Long_",
    "Combined_Key",
];

const DATA_BASE: [&str; 11] = [
    "84025017",
    "US",
    "USA",
    "840",
    "25017.0",
    "Middlesex",
    "Massachusetts",
    "US",
    "42.48607732",
    "-71.39049229",
    "Middlesex, Massachusetts, US",
];

/// Counted quantity of a series file.
#[derive(Debug, Clone, Copy)]
enum Series {
    Confirmed,
    Recovered,
    Deaths,
}

impl Series {
    const ALL: [Series; 3] = [Series::Confirmed, Series::Recovered, Series::Deaths];

    fn file<P: AsRef<Path>>(self, prefix: P) -> PathBuf {
        let suffix = match self {
            Series::Confirmed => "_confirmed_SIMUS.csv",
            Series::Recovered => "_recovered_SIMUS.csv",
            Series::Deaths => "_deaths_SIMUS.csv",
        };
        let mut file = OsString::from(prefix.as_ref());
        file.push(suffix);
        PathBuf::from(file)
    }
}

/// Append-only record of the daily state of an outbreak.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpidemicHistory {
    dates: Vec<NaiveDate>,
    infected: Vec<usize>,
    recovered: Vec<usize>,
    deceased: Vec<usize>,
}

impl EpidemicHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn infected(&self) -> &[usize] {
        &self.infected
    }

    pub fn recovered(&self) -> &[usize] {
        &self.recovered
    }

    pub fn deceased(&self) -> &[usize] {
        &self.deceased
    }

    /// Append the counts of one day.
    ///
    /// # Errors
    /// Returns an error unless `date` is the day after the last recorded date.
    pub fn add_day(
        &mut self,
        date: NaiveDate,
        n_inf: usize,
        n_rec: usize,
        n_dec: usize,
    ) -> Result<()> {
        if let Some(&last) = self.dates.last() {
            let next = last.succ_opt().context("date out of range")?;
            if date != next {
                bail!("date must be {next}, but is {date}");
            }
        }

        self.dates.push(date);
        self.infected.push(n_inf);
        self.recovered.push(n_rec);
        self.deceased.push(n_dec);

        Ok(())
    }

    fn counts(&self, series: Series) -> &[usize] {
        match series {
            Series::Confirmed => &self.infected,
            Series::Recovered => &self.recovered,
            Series::Deaths => &self.deceased,
        }
    }

    /// Write the three series files next to each other, named after `prefix`.
    pub fn write<P: AsRef<Path>>(&self, prefix: P) -> Result<()> {
        let prefix = prefix.as_ref();
        for series in Series::ALL {
            let file = series.file(prefix);
            self.write_series(series, &file)
                .with_context(|| format!("failed to write {file:?}"))?;
            log::info!("wrote {file:?}");
        }
        Ok(())
    }

    fn write_series(&self, series: Series, file: &Path) -> Result<()> {
        let file = File::create(file).context("failed to create file")?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        let mut header = StringRecord::from(HEADER_BASE.to_vec());
        for date in &self.dates {
            header.push_field(&date.format(DATE_FMT).to_string());
        }
        writer.write_record(&header).context("failed to write header")?;

        let mut data = StringRecord::from(DATA_BASE.to_vec());
        for count in self.counts(series) {
            data.push_field(&count.to_string());
        }
        writer.write_record(&data).context("failed to write data")?;

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Read back the three series files written by [`EpidemicHistory::write`].
    pub fn read<P: AsRef<Path>>(prefix: P) -> Result<Self> {
        let prefix = prefix.as_ref();
        let read = |series: Series| {
            let file = series.file(prefix);
            read_series(&file).with_context(|| format!("failed to read {file:?}"))
        };

        let (dates, infected) = read(Series::Confirmed)?;
        let (dates_rec, recovered) = read(Series::Recovered)?;
        let (dates_dec, deceased) = read(Series::Deaths)?;
        if dates_rec != dates || dates_dec != dates {
            bail!("series of {prefix:?} have different dates");
        }

        for pair in dates.windows(2) {
            if pair[0].succ_opt() != Some(pair[1]) {
                bail!("dates must be consecutive, but {} follows {}", pair[1], pair[0]);
            }
        }

        Ok(Self {
            dates,
            infected,
            recovered,
            deceased,
        })
    }
}

fn read_series(file: &Path) -> Result<(Vec<NaiveDate>, Vec<usize>)> {
    let file = File::open(file).context("failed to open file")?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut records = reader.records();
    let header = records
        .next()
        .context("missing header line")?
        .context("failed to parse header line")?;
    let data = records
        .next()
        .context("missing data line")?
        .context("failed to parse data line")?;

    let n_base = HEADER_BASE.len();
    if header.len() < n_base || header.iter().zip(HEADER_BASE).any(|(a, b)| a != b) {
        bail!("header line must start with {}", HEADER_BASE.join(","));
    }
    if data.len() != header.len() {
        bail!(
            "data line must have {} fields, but has {}",
            header.len(),
            data.len()
        );
    }

    let dates: Vec<NaiveDate> = header
        .iter()
        .skip(n_base)
        .map(|field| {
            NaiveDate::parse_from_str(field, DATE_FMT)
                .with_context(|| format!("failed to parse date {field:?}"))
        })
        .collect::<Result<_>>()?;
    let counts: Vec<usize> = data
        .iter()
        .skip(n_base)
        .map(|field| {
            field
                .parse::<usize>()
                .with_context(|| format!("failed to parse count {field:?}"))
        })
        .collect::<Result<_>>()?;

    Ok((dates, counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_history() -> EpidemicHistory {
        let mut hist = EpidemicHistory::new();
        hist.add_day(date(2020, 2, 28), 5, 0, 0).unwrap();
        hist.add_day(date(2020, 2, 29), 9, 1, 0).unwrap();
        hist.add_day(date(2020, 3, 1), 14, 2, 1).unwrap();
        hist
    }

    #[test]
    fn add_day_requires_consecutive_dates() {
        let mut hist = sample_history();
        assert!(hist.add_day(date(2020, 3, 1), 1, 1, 1).is_err());
        assert!(hist.add_day(date(2020, 3, 3), 1, 1, 1).is_err());
        assert!(hist.add_day(date(2020, 2, 27), 1, 1, 1).is_err());
        assert_eq!(hist.len(), 3);
        assert!(hist.add_day(date(2020, 3, 2), 1, 1, 1).is_ok());
        assert_eq!(hist.len(), 4);
    }

    #[test]
    fn write_produces_the_time_series_layout() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sim");
        sample_history().write(&prefix).unwrap();

        let header = "UID,iso2,iso3,code3,FIPS,Admin2,Province_State,Country_Region,Lat,Long_,\
                      Combined_Key,2020-02-28,2020-02-29,2020-03-01\n";
        let data_base = "84025017,US,USA,840,25017.0,Middlesex,Massachusetts,US,\
                         42.48607732,-71.39049229,\"Middlesex, Massachusetts, US\"";

        let confirmed = fs::read_to_string(dir.path().join("sim_confirmed_SIMUS.csv")).unwrap();
        assert_eq!(confirmed, format!("{header}{data_base},5,9,14\n"));

        let recovered = fs::read_to_string(dir.path().join("sim_recovered_SIMUS.csv")).unwrap();
        assert_eq!(recovered, format!("{header}{data_base},0,1,2\n"));

        let deaths = fs::read_to_string(dir.path().join("sim_deaths_SIMUS.csv")).unwrap();
        assert_eq!(deaths, format!("{header}{data_base},0,0,1\n"));
    }

    #[test]
    fn read_reconstructs_written_history() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sim");
        let hist = sample_history();
        hist.write(&prefix).unwrap();

        let read = EpidemicHistory::read(&prefix).unwrap();
        assert_eq!(read, hist);
        assert_eq!(read.dates()[2], date(2020, 3, 1));
        assert_eq!(read.infected(), &[5, 9, 14]);
    }

    #[test]
    fn empty_history_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("empty");
        EpidemicHistory::new().write(&prefix).unwrap();
        let read = EpidemicHistory::read(&prefix).unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn read_rejects_inconsistent_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sim");
        sample_history().write(&prefix).unwrap();

        let mut other = EpidemicHistory::new();
        other.add_day(date(2021, 1, 1), 1, 0, 0).unwrap();
        let other_prefix = dir.path().join("other");
        other.write(&other_prefix).unwrap();
        fs::copy(
            dir.path().join("other_deaths_SIMUS.csv"),
            dir.path().join("sim_deaths_SIMUS.csv"),
        )
        .unwrap();
        assert!(EpidemicHistory::read(&prefix).is_err());

        fs::write(dir.path().join("other_deaths_SIMUS.csv"), "UID,iso2\n1,2\n").unwrap();
        assert!(EpidemicHistory::read(&other_prefix).is_err());

        assert!(EpidemicHistory::read(dir.path().join("missing")).is_err());
    }
}
