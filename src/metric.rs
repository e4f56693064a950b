use crate::report::{PeriodicReport, PolicyReport, TimedReport};

/// A value that can be read off every periodic report of a run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Metric {
    TotalHitRatio,
    TotalByteHitRatio,
    InfiniteHitRatio,
    InfiniteByteHitRatio,
    CacheHitRatio(usize),
    CacheByteHitRatio(usize),
    OriginReads(usize),
    /// fill percentage of a second-hit admission filter
    AdmissionFill(usize),
}

impl Metric {
    /// `None` when the report has no such cache, or the cache runs another admission policy.
    pub fn value(&self, report: &PeriodicReport) -> Option<f64> {
        let global = &report.global;
        match *self {
            Metric::TotalHitRatio => Some(global.total_hit_ratio),
            Metric::TotalByteHitRatio => Some(global.total_byte_hit_ratio),
            Metric::InfiniteHitRatio => Some(global.infinite_hit_ratio),
            Metric::InfiniteByteHitRatio => Some(global.infinite_byte_hit_ratio),
            Metric::CacheHitRatio(cache) => report.caches.get(cache).map(|c| c.hit_ratio),
            Metric::CacheByteHitRatio(cache) => report.caches.get(cache).map(|c| c.byte_hit_ratio),
            Metric::OriginReads(cache) => report.caches.get(cache).map(|c| c.origin_reads as f64),
            Metric::AdmissionFill(cache) => match report.caches.get(cache)?.admission_policy {
                PolicyReport::SecondHitCounting { fill_percentage } => Some(fill_percentage),
                _ => None,
            },
        }
    }

    pub fn axis_label(&self) -> String {
        match self {
            Metric::TotalHitRatio => "Overall hit-ratio".to_string(),
            Metric::TotalByteHitRatio => "Overall byte hit-ratio".to_string(),
            Metric::InfiniteHitRatio => "Infinite cache hit-ratio".to_string(),
            Metric::InfiniteByteHitRatio => "Infinite cache byte hit-ratio".to_string(),
            Metric::CacheHitRatio(cache) => format!("Cache {cache} hit-ratio"),
            Metric::CacheByteHitRatio(cache) => format!("Cache {cache} byte hit-ratio"),
            Metric::OriginReads(cache) => format!("Cache {cache} origin reads (bytes)"),
            Metric::AdmissionFill(cache) => format!("Cache {cache} admission fill"),
        }
    }
}

/// Named `(x, y)` points, ready for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    /// `metric` over time in days, skipping reports that lack it.
    pub fn from_reports(label: &str, reports: &[TimedReport], metric: Metric) -> Self {
        Self {
            label: label.to_string(),
            points: reports
                .iter()
                .filter_map(|timed| metric.value(&timed.report).map(|y| (timed.days(), y)))
                .collect(),
        }
    }

    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, y)| *y)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.ys().sum::<f64>() / self.points.len() as f64)
    }
}
