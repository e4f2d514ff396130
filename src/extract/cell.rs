use tracing::warn;

/// How to treat a month cell that does not parse as a count.
///
/// `CoerceZero` reproduces the upstream grid's behavior of rendering dashes
/// and blanks for months with no registrations; `FailRow` drops the whole
/// row instead, for callers that would rather lose the row than conflate
/// "no data" with zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPolicy {
    CoerceZero,
    FailRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed {
    Count(u64),
    Unparsable,
}

/// Parse one month cell. Thousands separators are stripped; only a
/// pure-digit remainder counts as a number.
pub fn parse_count(raw: &str) -> Parsed {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return Parsed::Unparsable;
    }
    match cleaned.parse::<u64>() {
        Ok(v) => Parsed::Count(v),
        Err(_) => Parsed::Unparsable,
    }
}

/// Resolve a slice of raw month cells into counts under the given policy.
/// Returns `None` when the policy is `FailRow` and any cell is unparsable.
pub fn resolve_cells(label: &str, cells: &[String], policy: CellPolicy) -> Option<Vec<u64>> {
    let mut values = Vec::with_capacity(cells.len());
    for raw in cells {
        match parse_count(raw) {
            Parsed::Count(v) => values.push(v),
            Parsed::Unparsable => match policy {
                CellPolicy::CoerceZero => {
                    warn!(label = %label, cell = %raw, "unparsable cell coerced to zero");
                    values.push(0);
                }
                CellPolicy::FailRow => return None,
            },
        }
    }
    Some(values)
}
