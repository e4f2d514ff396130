/// Month codes as they appear in the grid's header row, in calendar order.
pub const MONTH_CODES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Map a three-letter month code to its 1-based month number.
/// Case-insensitive; surrounding whitespace is ignored.
pub fn number(code: &str) -> Option<u32> {
    let code = code.trim().to_uppercase();
    MONTH_CODES
        .iter()
        .position(|&m| m == code)
        .map(|i| i as u32 + 1)
}

/// Map a 1-based month number back to its three-letter code.
pub fn code(number: u32) -> Option<&'static str> {
    if (1..=12).contains(&number) {
        Some(MONTH_CODES[number as usize - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_1_through_12() {
        for (i, &m) in MONTH_CODES.iter().enumerate() {
            assert_eq!(number(m), Some(i as u32 + 1));
            assert_eq!(code(i as u32 + 1), Some(m));
        }
    }

    #[test]
    fn parsing_is_case_and_whitespace_insensitive() {
        assert_eq!(number(" jan "), Some(1));
        assert_eq!(number("Dec"), Some(12));
    }

    #[test]
    fn rejects_unknown_codes() {
        assert_eq!(number("TOTAL"), None);
        assert_eq!(number(""), None);
        assert_eq!(code(0), None);
        assert_eq!(code(13), None);
    }
}
