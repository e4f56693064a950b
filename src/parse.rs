use std::str::FromStr;

use winnow::ascii::space1;
use winnow::combinator::preceded;
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::token::{rest, take_till};
use winnow::{ModalResult, Parser};

use crate::error::ParseError;
use crate::policy::decode_policy;
use crate::report::{CacheStats, GlobalCacheStats, PeriodicReport};

/// Leading token of every periodic report line.
pub const REPORT_KEYWORD: &str = "emulator_periodic_reporting";

pub fn is_periodic_report(line: &str) -> bool {
    line.trim_start().starts_with(REPORT_KEYWORD)
}

/// Splits a report line into its `|` delimited segments, in order.
pub fn split_chunks(line: &str) -> impl Iterator<Item = &str> {
    line.trim().split('|')
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub time: u64,
    pub traffic: u64,
    pub url_count: u64,
}

/// A decoded segment, tagged with what it describes.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Periodic(Header),
    Global(GlobalCacheStats),
    Cache(CacheStats),
}

/// Parses one log line.
///
/// Lines that are not periodic reports yield `Ok(None)`. A periodic report that fails to
/// decode is an error, never a partial report.
pub fn parse_line(line: &str) -> Result<Option<PeriodicReport>, ParseError> {
    if !is_periodic_report(line) {
        return Ok(None);
    }

    let mut chunks = split_chunks(line).map(decode_chunk);

    let header = match chunks.next().transpose()? {
        Some(Chunk::Periodic(header)) => header,
        _ => return Err(ParseError::MisplacedHeader),
    };

    let mut global = None;
    let mut caches = Vec::new();
    for chunk in chunks {
        match chunk? {
            Chunk::Periodic(_) => return Err(ParseError::MisplacedHeader),
            Chunk::Global(stats) => {
                if global.replace(stats).is_some() {
                    return Err(ParseError::DuplicateGlobal);
                }
            }
            Chunk::Cache(stats) => caches.push(stats),
        }
    }

    Ok(Some(PeriodicReport {
        time: header.time,
        traffic: header.traffic,
        url_count: header.url_count,
        global: global.ok_or(ParseError::MissingGlobal)?,
        caches,
    }))
}

pub fn decode_chunk(chunk: &str) -> Result<Chunk, ParseError> {
    let chunk = chunk.trim();
    let Some(keyword) = chunk.split_whitespace().next() else {
        return Err(ParseError::EmptyChunk);
    };
    let fields = &chunk[keyword.len()..];

    match keyword {
        REPORT_KEYWORD => decode(header, fields).map(Chunk::Periodic),
        "ghr" => decode(global_stats, fields).map(Chunk::Global),
        "cache" => cache_stats(fields).map(Chunk::Cache),
        _ => Err(ParseError::UnknownChunk(keyword.to_string())),
    }
}

fn header(input: &mut &str) -> ModalResult<Header> {
    (
        field::<u64>("time"),
        field::<u64>("traffic"),
        field::<u64>("url count"),
    )
        .map(|(time, traffic, url_count)| Header {
            time,
            traffic,
            url_count,
        })
        .parse_next(input)
}

fn global_stats(input: &mut &str) -> ModalResult<GlobalCacheStats> {
    (
        field::<f64>("total hit ratio"),
        field::<f64>("total byte hit ratio"),
        field::<f64>("infinite hit ratio"),
        field::<f64>("infinite byte hit ratio"),
    )
        .map(
            |(total_hit_ratio, total_byte_hit_ratio, infinite_hit_ratio, infinite_byte_hit_ratio)| {
                GlobalCacheStats {
                    total_hit_ratio,
                    total_byte_hit_ratio,
                    infinite_hit_ratio,
                    infinite_byte_hit_ratio,
                }
            },
        )
        .parse_next(input)
}

type Counters = (f64, f64, u64, u64, u64, u64, u64, u64, u64, u64);

fn generic_counters(input: &mut &str) -> ModalResult<Counters> {
    (
        field::<f64>("hit ratio"),
        field::<f64>("byte hit ratio"),
        field::<u64>("hits"),
        field::<u64>("misses"),
        field::<u64>("byte hits"),
        field::<u64>("byte misses"),
        field::<u64>("reads"),
        field::<u64>("writes"),
        field::<u64>("purges"),
        field::<u64>("origin reads"),
    )
        .parse_next(input)
}

/// `cache <10 counters> : <admission> : <eviction>`
///
/// Tokens left over after the counters, before the first `:`, start the admission report.
fn cache_stats(input: &str) -> Result<CacheStats, ParseError> {
    let mut parts = input.split(':');
    let generic = parts.next().unwrap_or(input);

    let (counters, leftover) = decode((generic_counters, rest), generic)?;

    let mut policies = Vec::with_capacity(2);
    if !leftover.trim().is_empty() {
        policies.push(leftover);
    }
    policies.extend(parts);

    let [admission, eviction] = policies.as_slice() else {
        return Err(ParseError::PolicySegments(policies.len()));
    };
    let (admission_kind, admission_policy) = decode_policy(admission)?;
    let (eviction_kind, eviction_policy) = decode_policy(eviction)?;

    let (
        hit_ratio,
        byte_hit_ratio,
        hits,
        misses,
        byte_hits,
        byte_misses,
        num_reads,
        num_writes,
        num_purges,
        origin_reads,
    ) = counters;

    Ok(CacheStats {
        hit_ratio,
        byte_hit_ratio,
        hits,
        misses,
        byte_hits,
        byte_misses,
        num_reads,
        num_writes,
        num_purges,
        origin_reads,
        admission_kind,
        admission_policy,
        eviction_kind,
        eviction_policy,
    })
}

/// One whitespace separated value, labelled with the name of the field it fills.
pub(crate) fn field<'a, T>(name: &'static str) -> impl Parser<&'a str, T, ErrMode<ContextError>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    preceded(space1, take_till(1.., (' ', '\t')).try_map(str::parse::<T>))
        .context(StrContext::Label(name))
}

/// Runs `parser` over the whole of `input`, turning winnow's error into a [`ParseError`].
pub(crate) fn decode<'a, O>(
    mut parser: impl Parser<&'a str, O, ErrMode<ContextError>>,
    input: &'a str,
) -> Result<O, ParseError> {
    parser.parse(input).map_err(|e| {
        let remaining = &input[e.offset()..];
        let token = remaining
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        let label = e.inner().context().find_map(|context| match context {
            StrContext::Label(label) => Some(*label),
            _ => None,
        });

        match label {
            Some(field) if token.is_empty() => ParseError::MissingField(field.to_string()),
            Some(field) => ParseError::MalformedField {
                field: field.to_string(),
                token,
            },
            None => ParseError::Trailing(remaining.trim().to_string()),
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::report::{PolicyKind, PolicyReport};

    const LINE: &str = "emulator_periodic_reporting 100 500 20|ghr 0.5 0.4 0.6 0.45|cache 0.7 0.6 70 30 700 300 10 5 0 1000 lru 500 120.5:lru 500 120.5";

    #[test]
    fn representative_line() {
        let report = parse_line(LINE).unwrap().unwrap();

        assert_eq!(report.time, 100);
        assert_eq!(report.traffic, 500);
        assert_eq!(report.url_count, 20);
        assert_eq!(report.global.total_hit_ratio, 0.5);
        assert_eq!(report.global.infinite_byte_hit_ratio, 0.45);
        assert_eq!(report.caches.len(), 1);

        let cache = &report.caches[0];
        assert_eq!(cache.hit_ratio, 0.7);
        assert_eq!(cache.hits, 70);
        assert_eq!(cache.misses, 30);
        assert_eq!(cache.num_purges, 0);
        assert_eq!(cache.origin_reads, 1000);

        let lru = PolicyReport::Lru {
            size: 500,
            oldest_file_age_seconds: 120.5,
        };
        assert_eq!(cache.admission_kind, PolicyKind::Lru);
        assert_eq!(cache.admission_policy, lru);
        assert_eq!(cache.eviction_policy, lru);
    }

    #[test]
    fn emulator_formatted_line() {
        let line = "emulator_periodic_reporting 1609459200  0  1532  |\tghr 0.61  0.52   0.8  0.7  \
                    |\tcache 0.61 0.52 610 390 61000 39000 12 40 3 39000  : 2hc_rot 0.125  : lru 1024 0.75  \
                    |\tcache 0.4 0.3 40 60 400 600 1 2 0 600  : null  : s4lru 77 ";

        let report = parse_line(line).unwrap().unwrap();

        assert_eq!(report.time, 1_609_459_200);
        assert_eq!(report.traffic, 0);
        assert_eq!(report.caches.len(), 2);

        assert_eq!(report.caches[0].admission_kind, PolicyKind::SecondHitRot);
        assert_eq!(
            report.caches[0].admission_policy,
            PolicyReport::SecondHitCounting {
                fill_percentage: 0.125
            }
        );
        assert_eq!(
            report.caches[0].eviction_policy,
            PolicyReport::Lru {
                size: 1024,
                oldest_file_age_seconds: 0.75
            }
        );
        assert_eq!(report.caches[1].admission_policy, PolicyReport::Marker);
        assert_eq!(
            report.caches[1].eviction_policy,
            PolicyReport::Segmented { size: 77 }
        );
    }

    #[test]
    fn nan_ratios_are_accepted() {
        let line = "emulator_periodic_reporting 0 0 0 | ghr 0 0 nan nan";
        let report = parse_line(line).unwrap().unwrap();

        assert!(report.global.infinite_hit_ratio.is_nan());
        assert!(report.caches.is_empty());
    }

    #[test]
    fn other_lines_are_skipped() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("cache_id 1 max_cache_item_count 10"), Ok(None));
        assert_eq!(parse_line("ghr 0.5 0.4 0.6 0.45"), Ok(None));
    }

    #[test]
    fn chunk_kinds() {
        assert_eq!(
            decode_chunk("emulator_periodic_reporting 1 2 3"),
            Ok(Chunk::Periodic(Header {
                time: 1,
                traffic: 2,
                url_count: 3
            }))
        );
        assert!(matches!(
            decode_chunk("\tghr 0.5 0.4 0.6 0.45  "),
            Ok(Chunk::Global(_))
        ));
        assert_eq!(
            decode_chunk("disk 1 2"),
            Err(ParseError::UnknownChunk("disk".into()))
        );
        assert_eq!(decode_chunk("  "), Err(ParseError::EmptyChunk));
    }

    #[test]
    fn unknown_policy_rejects_the_line() {
        let line = LINE.replacen("lru", "xyz", 1);
        assert_eq!(
            parse_line(&line),
            Err(ParseError::UnknownPolicy("xyz".into()))
        );
    }

    #[test]
    fn malformed_field_rejects_the_line() {
        let line = LINE.replace(" 70 30 ", " 7.0 30 ");
        assert_eq!(
            parse_line(&line),
            Err(ParseError::MalformedField {
                field: "hits".into(),
                token: "7.0".into()
            })
        );

        let line = "emulator_periodic_reporting 100 abc 20|ghr 0.5 0.4 0.6 0.45";
        assert_eq!(
            parse_line(line),
            Err(ParseError::MalformedField {
                field: "traffic".into(),
                token: "abc".into()
            })
        );
    }

    #[test]
    fn policy_segment_count() {
        let line = "emulator_periodic_reporting 1 2 3|ghr 0 0 0 0|cache 0 0 0 0 0 0 0 0 0 0 : lru 1 1";
        assert_eq!(parse_line(line), Err(ParseError::PolicySegments(1)));

        let line = "emulator_periodic_reporting 1 2 3|ghr 0 0 0 0|cache 0 0 0 0 0 0 0 0 0 0 : null : null : null";
        assert_eq!(parse_line(line), Err(ParseError::PolicySegments(3)));
    }

    #[test]
    fn global_segment_is_required_once() {
        assert_eq!(
            parse_line("emulator_periodic_reporting 1 2 3"),
            Err(ParseError::MissingGlobal)
        );
        assert_eq!(
            parse_line("emulator_periodic_reporting 1 2 3|ghr 0 0 0 0|ghr 0 0 0 0"),
            Err(ParseError::DuplicateGlobal)
        );
        assert_eq!(
            parse_line("emulator_periodic_reporting 1 2 3|ghr 0 0 0 0|emulator_periodic_reporting 1 2 3"),
            Err(ParseError::MisplacedHeader)
        );
    }

    #[test]
    fn short_and_long_segments() {
        assert_eq!(
            parse_line("emulator_periodic_reporting 1 2|ghr 0 0 0 0"),
            Err(ParseError::MissingField("url count".into()))
        );
        assert_eq!(
            parse_line("emulator_periodic_reporting 1 2 3 4|ghr 0 0 0 0"),
            Err(ParseError::Trailing("4".into()))
        );
    }
}
