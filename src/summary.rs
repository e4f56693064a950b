use crate::metric::{Metric, Series};
use crate::report::TimedReport;
use crate::run::Run;

pub fn format_summary(label: &str, reports: &[TimedReport]) -> String {
    let total = Series::from_reports(label, reports, Metric::TotalHitRatio);
    let span_days = reports.iter().map(TimedReport::days).fold(0.0, f64::max);

    let mut result = vec![
        format!("Run: {label}"),
        format!("Periodic Reports: {}", reports.len()),
        format!("Span: {span_days:.3} days"),
    ];

    if let (Some(first), Some(last), Some(mean)) =
        (total.points.first(), total.points.last(), total.mean())
    {
        result.push(format!(
            "Total Hit Ratio: first {:.4}, last {:.4}, mean {mean:.4}",
            first.1, last.1
        ));
    }

    let cache_count = reports
        .iter()
        .map(|timed| timed.report.caches.len())
        .max()
        .unwrap_or(0);
    for cache in 0..cache_count {
        let series = Series::from_reports(label, reports, Metric::CacheHitRatio(cache));
        let latest = reports
            .iter()
            .rev()
            .find_map(|timed| timed.report.caches.get(cache));
        if let (Some(mean), Some(latest)) = (series.mean(), latest) {
            result.push(format!(
                "\tCache {cache}: mean hit ratio {mean:.4}, admission {} {}, eviction {} {}",
                latest.admission_kind,
                latest.admission_policy,
                latest.eviction_kind,
                latest.eviction_policy
            ));
        }
    }

    result.join("\n")
}

/// Summaries of every run, best mean total hit ratio first.
pub fn compare(runs: &[Run]) -> String {
    let mut results = runs
        .iter()
        .map(|run| {
            let mean = run.series(Metric::TotalHitRatio).mean().unwrap_or(0.0);
            (run, mean)
        })
        .collect::<Vec<_>>();

    // NaN means rank last
    results.sort_by(|(_, a), (_, b)| a.is_nan().cmp(&b.is_nan()).then(b.total_cmp(a)));
    let Some((_, best)) = results.first().copied() else {
        return String::from("No runs");
    };

    results
        .into_iter()
        .flat_map(|(run, mean)| {
            vec![
                format_summary(&run.label, &run.reports),
                format!("Relative Hit Ratio: {:+.4}\n", mean - best),
            ]
        })
        .collect::<Vec<_>>()
        .join("\n")
}
