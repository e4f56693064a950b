use std::path::PathBuf;

use thiserror::Error;

/// Failure to decode a single periodic report line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("malformed {field}: '{token}'")]
    MalformedField { field: String, token: String },

    #[error("missing {0}")]
    MissingField(String),

    #[error("unexpected trailing input '{0}'")]
    Trailing(String),

    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),

    #[error("cache segment must carry an admission and an eviction report, found {0} policy reports")]
    PolicySegments(usize),

    #[error("unknown segment '{0}'")]
    UnknownChunk(String),

    #[error("empty segment")]
    EmptyChunk,

    #[error("line has no 'ghr' segment")]
    MissingGlobal,

    #[error("line has more than one 'ghr' segment")]
    DuplicateGlobal,

    #[error("'emulator_periodic_reporting' segment must come first")]
    MisplacedHeader,
}

/// Failure to load a log file or a directory of runs.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error("failed to open '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("no periodic reports found")]
    Empty,

    #[error("'{}': {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<LogError>,
    },

    #[error("invalid run pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to list runs: {0}")]
    Glob(#[from] glob::GlobError),
}

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("{series} series need {series} labels, got {labels}")]
    Labels { series: usize, labels: usize },

    #[error("series {index} has {len} values, the x axis has {expected}")]
    Length {
        index: usize,
        len: usize,
        expected: usize,
    },

    #[error("nothing to plot")]
    NoData,

    #[error("drawing failed: {0}")]
    Drawing(String),
}
