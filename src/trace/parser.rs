//! Traceroute output parsing.
//!
//! Converts the probe's raw multi-line text into an ordered sequence of
//! [`HopRecord`]s. The parser is stateless and total over strings: any input
//! produces a (possibly empty) result, never an error.

use tracing::debug;

use crate::state::{HopRecord, SAMPLES_PER_HOP};

/// Marker printed when all three attempts at a hop time out
const FULL_TIMEOUT: &str = "* * *";

/// Parse raw traceroute output into hop records, one per hop line.
///
/// Lines that do not start with a hop number are skipped; the banner line
/// (`traceroute to …`) is dropped up front so a stray leading word is never
/// mistaken for a hostname.
pub fn parse_output(raw: &str) -> Vec<HopRecord> {
    let mut records = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if idx == 0 && !line.starts_with(|c: char| c.is_ascii_digit()) {
            // Header line; a genuine first hop starts with its hop number
            continue;
        }
        if line.is_empty() {
            continue;
        }
        let Some((hop, rest)) = split_hop_number(line) else {
            continue;
        };

        let mut record = HopRecord::new(hop);
        if rest.contains(FULL_TIMEOUT) {
            records.push(record);
            continue;
        }

        let tokens: Vec<&str> = rest.split_whitespace().collect();
        if let Some(pos) = tokens.iter().position(|t| dotted_quad(t).is_some()) {
            let address = dotted_quad(tokens[pos]).unwrap_or(tokens[pos]);
            record.hostname = hostname_before(&tokens[..pos], address);
            record.address = Some(address.to_string());
        }
        record.samples = collect_samples(&tokens);
        records.push(record);
    }

    records
}

/// Split the leading run of ASCII digits off a hop line.
///
/// Returns None when the line does not start with a digit (continuation
/// lines, banners) or the number does not fit a u32.
fn split_hop_number(line: &str) -> Option<(u32, &str)> {
    let end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    if end == 0 {
        return None;
    }
    let hop = line[..end].parse().ok()?;
    Some((hop, &line[end..]))
}

/// Strip one layer of wrapping parentheses and check for a dotted quad:
/// four `.`-separated groups of 1-3 ASCII digits. Octet range is not
/// validated; the hop text is trusted verbatim.
fn dotted_quad(token: &str) -> Option<&str> {
    let token = token.strip_prefix('(').unwrap_or(token);
    let token = token.strip_suffix(')').unwrap_or(token);

    let mut groups = 0;
    for group in token.split('.') {
        if group.is_empty() || group.len() > 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        groups += 1;
    }
    (groups == 4).then_some(token)
}

/// Hostname heuristic: the last word before the address token, unless it is
/// purely numeric (a stray hop-number artifact) or repeats the address.
/// Multi-word reverse-DNS names lose everything but their last word; that
/// matches the probe output format this parser targets.
fn hostname_before(preceding: &[&str], address: &str) -> Option<String> {
    let last = preceding.last()?;
    if last.bytes().all(|b| b.is_ascii_digit()) || *last == address {
        return None;
    }
    Some((*last).to_string())
}

/// Collect up to three timing tokens in order of appearance: a lone `*` is a
/// timed-out attempt, a number with an `ms` unit (split or fused) is one
/// sample. Tokens past the third are ignored; unfilled slots stay absent.
fn collect_samples(tokens: &[&str]) -> [Option<f64>; SAMPLES_PER_HOP] {
    let mut samples = [None; SAMPLES_PER_HOP];
    let mut slot = 0;
    let mut i = 0;

    while i < tokens.len() && slot < SAMPLES_PER_HOP {
        let token = tokens[i];
        if token == "*" {
            slot += 1;
        } else if looks_numeric(token) && tokens.get(i + 1) == Some(&"ms") {
            samples[slot] = parse_rtt(token);
            slot += 1;
            i += 1; // consume the unit token
        } else if let Some(value) = token.strip_suffix("ms").filter(|v| looks_numeric(v)) {
            samples[slot] = parse_rtt(value);
            slot += 1;
        }
        i += 1;
    }

    samples
}

/// Digits and dots only, at least one character
fn looks_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

/// Parse the numeric part of a timing token. A malformed number (e.g.
/// `1.2.3`) leaves its slot absent rather than failing the whole line.
fn parse_rtt(value: &str) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(rtt) => Some(rtt),
        Err(_) => {
            debug!(token = value, "unparseable rtt token, treating as missing");
            None
        }
    }
}
