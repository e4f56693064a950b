use winnow::{ModalResult, Parser};

use crate::error::ParseError;
use crate::parse::{decode, field};
use crate::report::{PolicyKind, PolicyReport};

/// Decodes the fields following a policy name.
pub type PolicyDecoder = fn(&mut &str) -> ModalResult<PolicyReport>;

/// Every policy the emulator reports on, with the name it prints and the layout of its fields.
const REGISTRY: [(PolicyKind, &str, PolicyDecoder); 10] = [
    (PolicyKind::Lru, "lru", lru),
    (PolicyKind::Fifo, "fifo", lru),
    (PolicyKind::CostLru, "cost_lru", lru),
    (PolicyKind::S4Lru, "s4lru", segmented),
    (PolicyKind::SecondHit, "2hc", second_hit),
    (PolicyKind::SecondHitRot, "2hc_rot", second_hit),
    (PolicyKind::Null, "null", marker),
    (PolicyKind::Size, "size", marker),
    (PolicyKind::Prob, "prob", marker),
    (PolicyKind::ProbSize, "prob_size", marker),
];

pub fn kind_of(name: &str) -> Option<PolicyKind> {
    REGISTRY
        .iter()
        .find(|(_, policy_name, _)| *policy_name == name)
        .map(|(kind, _, _)| *kind)
}

pub fn name_of(kind: PolicyKind) -> &'static str {
    REGISTRY
        .iter()
        .find(|(registered, _, _)| *registered == kind)
        .map(|(_, name, _)| *name)
        .unwrap_or("unregistered")
}

pub fn decoder(kind: PolicyKind) -> Option<PolicyDecoder> {
    REGISTRY
        .iter()
        .find(|(registered, _, _)| *registered == kind)
        .map(|(_, _, decoder)| *decoder)
}

/// Decodes one admission or eviction report, e.g. `lru 500 120.5`.
pub fn decode_policy(segment: &str) -> Result<(PolicyKind, PolicyReport), ParseError> {
    let segment = segment.trim();
    let Some(name) = segment.split_whitespace().next() else {
        return Err(ParseError::EmptyChunk);
    };

    let kind = kind_of(name).ok_or_else(|| ParseError::UnknownPolicy(name.to_string()))?;
    let decoder = decoder(kind).ok_or_else(|| ParseError::UnknownPolicy(name.to_string()))?;

    decode(decoder, &segment[name.len()..]).map(|report| (kind, report))
}

fn lru(input: &mut &str) -> ModalResult<PolicyReport> {
    (field::<u64>("size"), field::<f64>("oldest file age"))
        .map(|(size, oldest_file_age_seconds)| PolicyReport::Lru {
            size,
            oldest_file_age_seconds,
        })
        .parse_next(input)
}

fn second_hit(input: &mut &str) -> ModalResult<PolicyReport> {
    field::<f64>("fill percentage")
        .map(|fill_percentage| PolicyReport::SecondHitCounting { fill_percentage })
        .parse_next(input)
}

fn segmented(input: &mut &str) -> ModalResult<PolicyReport> {
    field::<u64>("size")
        .map(|size| PolicyReport::Segmented { size })
        .parse_next(input)
}

fn marker(_input: &mut &str) -> ModalResult<PolicyReport> {
    Ok(PolicyReport::Marker)
}
