use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use log::{debug, info, warn};

use crate::error::LogError;
use crate::metric::{Metric, Series};
use crate::parse::parse_line;
use crate::report::{PeriodicReport, TimedReport};

/// Extension of the emulator output files picked up by [`detect_runs`].
pub const RUN_EXTENSION: &str = "dat";

/// All periodic reports of one emulator run.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub label: String,
    pub reports: Vec<TimedReport>,
}

impl Run {
    pub fn series(&self, metric: Metric) -> Series {
        Series::from_reports(&self.label, &self.reports, metric)
    }
}

/// Reads every periodic report from `reader`, in order, and normalizes their times.
pub fn parse_log(reader: impl BufRead) -> Result<Vec<TimedReport>, LogError> {
    let mut reports = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LogError::Read {
            line: index + 1,
            source,
        })?;

        if let Some(report) = parse_line(&line).map_err(|source| LogError::Line {
            line: index + 1,
            source,
        })? {
            reports.push(report);
        }
    }

    debug!("parsed {} periodic reports", reports.len());
    normalize(reports)
}

pub fn parse_log_file(path: impl AsRef<Path>) -> Result<Vec<TimedReport>, LogError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LogError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    parse_log(BufReader::new(file)).map_err(|source| LogError::InFile {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

/// Offsets every report from the earliest report in `reports`, in minutes.
pub fn normalize(reports: Vec<PeriodicReport>) -> Result<Vec<TimedReport>, LogError> {
    let start = reports
        .iter()
        .map(|report| report.time)
        .min()
        .ok_or(LogError::Empty)?;

    Ok(reports
        .into_iter()
        .map(|report| TimedReport {
            minutes: (report.time - start) as f64 / 60.0,
            report,
        })
        .collect())
}

/// Lists the runs in `directory` as `(path, label)`, sorted by path.
pub fn detect_runs(directory: impl AsRef<Path>) -> Result<Vec<(PathBuf, String)>, LogError> {
    let directory = glob::Pattern::escape(&directory.as_ref().to_string_lossy());
    let pattern = Path::new(&directory)
        .join(format!("*.{RUN_EXTENSION}"))
        .to_string_lossy()
        .into_owned();
    // hidden files (e.g. `._run.dat` AppleDouble files) are not runs
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut runs = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        let path = entry?;
        let Some(label) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!("skipping run with a non UTF-8 name: {}", path.display());
            continue;
        };
        let label = label.to_string();
        runs.push((path, label));
    }

    Ok(runs)
}

/// Parses every run in `directory`, one file after another.
pub fn load_runs(directory: impl AsRef<Path>) -> Result<Vec<Run>, LogError> {
    let directory = directory.as_ref();
    let detected = detect_runs(directory)?;
    if detected.is_empty() {
        warn!("no *.{RUN_EXTENSION} files in {}", directory.display());
    }

    detected
        .into_iter()
        .map(|(path, label)| {
            info!("loading run '{label}' from {}", path.display());
            let reports = parse_log_file(&path)?;
            Ok(Run { label, reports })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use std::fs;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::error::ParseError;

    fn line(time: u64, hit_ratio: f64) -> String {
        format!(
            "emulator_periodic_reporting {time} 0 10  |\tghr {hit_ratio} 0.4 0.6 0.45  \
             |\tcache 0.7 0.6 70 30 700 300 10 5 0 1000  : 2hc 0.5  : lru 500 120.5\n"
        )
    }

    #[test]
    fn reports_keep_file_order_and_skip_other_lines() {
        let log = format!(
            "starting emulator\n{}cache_id 0 max_cache_item_count 10\n{}\n{}",
            line(1000, 0.1),
            line(1060, 0.2),
            line(1180, 0.3)
        );

        let reports = parse_log(log.as_bytes()).unwrap();

        let times: Vec<_> = reports.iter().map(|r| r.report.time).collect();
        assert_eq!(times, vec![1000, 1060, 1180]);
        let minutes: Vec<_> = reports.iter().map(|r| r.minutes).collect();
        assert_eq!(minutes, vec![0.0, 1.0, 3.0]);
    }

    #[test]
    fn normalization_is_relative_to_the_minimum() {
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..20 {
            let times: Vec<u64> = (0..rng.random_range(1..30))
                .map(|_| rng.random_range(1_600_000_000..1_700_000_000))
                .collect();
            let log: String = times.iter().map(|t| line(*t, 0.5)).collect();

            let reports = parse_log(log.as_bytes()).unwrap();
            let min = *times.iter().min().unwrap();

            assert_eq!(reports.len(), times.len());
            for (timed, raw) in reports.iter().zip(&times) {
                assert_eq!(timed.report.time, *raw);
                assert_eq!(timed.minutes, (raw - min) as f64 / 60.0);
            }
            assert!(reports.iter().any(|timed| timed.minutes == 0.0));
        }
    }

    #[test]
    fn empty_log_is_an_error() {
        let log = "starting emulator\ncache_id 0 max_cache_item_count 10\n";
        assert!(matches!(parse_log(log.as_bytes()), Err(LogError::Empty)));
        assert!(matches!(parse_log(&b""[..]), Err(LogError::Empty)));
    }

    #[test]
    fn parse_errors_carry_the_line_number() {
        let log = format!("{}\n{}", line(0, 0.5), line(60, 0.5).replace("2hc", "xyz"));

        match parse_log(log.as_bytes()) {
            Err(LogError::Line { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(source, ParseError::UnknownPolicy("xyz".into()));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            parse_log_file(dir.path().join("nope.dat")),
            Err(LogError::Open { .. })
        ));
    }

    #[test]
    fn runs_are_labelled_by_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("runB.dat"), line(60, 0.2)).unwrap();
        fs::write(dir.path().join("runA.dat"), line(0, 0.1)).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a run").unwrap();
        fs::write(dir.path().join(".hidden.dat"), [0xb0, 0x00, 0xff]).unwrap();

        let labels: Vec<_> = detect_runs(dir.path())
            .unwrap()
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        assert_eq!(labels, vec!["runA", "runB"]);

        let runs = load_runs(dir.path()).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].label, "runA");
        assert_eq!(runs[1].reports[0].minutes, 0.0);
        assert_eq!(runs[1].reports[0].report.global.total_hit_ratio, 0.2);
    }

    #[test]
    fn directory_names_are_not_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let runs_dir = dir.path().join("exp[1]");
        fs::create_dir(&runs_dir).unwrap();
        fs::write(runs_dir.join("runA.dat"), line(0, 0.1)).unwrap();

        let detected = detect_runs(&runs_dir).unwrap();
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].0, runs_dir.join("runA.dat"));
        assert_eq!(detected[0].1, "runA");
    }

    #[test]
    fn one_bad_run_fails_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.dat"), line(0, 0.1)).unwrap();
        fs::write(dir.path().join("empty.dat"), "").unwrap();

        match load_runs(dir.path()) {
            Err(LogError::InFile { path, source }) => {
                assert!(path.ends_with("empty.dat"));
                assert!(matches!(*source, LogError::Empty));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn series_in_days() {
        let log = format!("{}{}", line(0, 0.1), line(86_400, 0.3));
        let run = Run {
            label: "base".into(),
            reports: parse_log(log.as_bytes()).unwrap(),
        };

        let series = run.series(Metric::TotalHitRatio);
        assert_eq!(series.label, "base");
        assert_eq!(series.points, vec![(0.0, 0.1), (1.0, 0.3)]);
        assert!(run.series(Metric::CacheHitRatio(3)).points.is_empty());
    }
}
