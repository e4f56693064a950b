/// One `emulator_periodic_reporting` line.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicReport {
    /// raw timestamp in seconds, as printed by the emulator
    pub time: u64,
    /// the emulator does not reliably reset this counter, so it is carried as-is
    pub traffic: u64,
    pub url_count: u64,
    pub global: GlobalCacheStats,
    pub caches: Vec<CacheStats>,
}

/// A report paired with its offset from the first report of the same file.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedReport {
    pub minutes: f64,
    pub report: PeriodicReport,
}

impl TimedReport {
    pub fn days(&self) -> f64 {
        self.minutes / 1440.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlobalCacheStats {
    pub total_hit_ratio: f64,
    pub total_byte_hit_ratio: f64,
    pub infinite_hit_ratio: f64,
    pub infinite_byte_hit_ratio: f64,
}

/// Per-cache counters for one reporting interval.
///
/// `num_reads`, `num_writes` and `num_purges` count 512 byte storage operations,
/// `origin_reads` is in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub hit_ratio: f64,
    pub byte_hit_ratio: f64,
    pub hits: u64,
    pub misses: u64,
    pub byte_hits: u64,
    pub byte_misses: u64,
    pub num_reads: u64,
    pub num_writes: u64,
    pub num_purges: u64,
    pub origin_reads: u64,
    pub admission_kind: PolicyKind,
    pub admission_policy: PolicyReport,
    pub eviction_kind: PolicyKind,
    pub eviction_policy: PolicyReport,
}

/// Policy state as printed after the policy name.
///
/// Policies sharing a layout decode to the same variant, so `2hc` and `2hc_rot`
/// reports with equal fields compare equal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PolicyReport {
    Lru {
        size: u64,
        oldest_file_age_seconds: f64,
    },
    SecondHitCounting {
        fill_percentage: f64,
    },
    Segmented {
        size: u64,
    },
    Marker,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Lru,
    Fifo,
    CostLru,
    S4Lru,
    SecondHit,
    SecondHitRot,
    Null,
    Size,
    Prob,
    ProbSize,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 10] = [
        PolicyKind::Lru,
        PolicyKind::Fifo,
        PolicyKind::CostLru,
        PolicyKind::S4Lru,
        PolicyKind::SecondHit,
        PolicyKind::SecondHitRot,
        PolicyKind::Null,
        PolicyKind::Size,
        PolicyKind::Prob,
        PolicyKind::ProbSize,
    ];
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(crate::policy::name_of(*self))
    }
}

impl std::fmt::Display for PolicyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyReport::Lru {
                size,
                oldest_file_age_seconds,
            } => f.write_fmt(format_args!(
                "size={size} oldest_file_age={oldest_file_age_seconds}"
            )),
            PolicyReport::SecondHitCounting { fill_percentage } => {
                f.write_fmt(format_args!("fill={fill_percentage}"))
            }
            PolicyReport::Segmented { size } => f.write_fmt(format_args!("size={size}")),
            PolicyReport::Marker => f.write_str("-"),
        }
    }
}
