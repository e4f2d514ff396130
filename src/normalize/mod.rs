use tracing::warn;

use crate::extract::RawRow;

/// One canonical bucket and the label substrings that select it.
#[derive(Debug, Clone, Copy)]
pub struct GroupingRule {
    pub bucket: &'static str,
    pub keywords: &'static [&'static str],
}

/// The detailed registration categories collapsed into 4W/3W/2W.
///
/// The keyword sets are neither mutually exclusive nor exhaustive: a label
/// containing several keywords is counted into every bucket it matches, and
/// a label matching none is excluded from all totals. Both conditions are
/// logged rather than corrected.
pub const VEHICLE_GROUPS: &[GroupingRule] = &[
    GroupingRule {
        bucket: "4W",
        keywords: &[
            "FOUR WHEELER (INVALID CARRIAGE)",
            "HEAVY GOODS VEHICLE",
            "HEAVY MOTOR VEHICLE",
            "HEAVY PASSENGER VEHICLE",
            "LIGHT GOODS VEHICLE",
            "LIGHT MOTOR VEHICLE",
            "LIGHT PASSENGER VEHICLE",
            "MEDIUM GOODS VEHICLE",
            "MEDIUM MOTOR VEHICLE",
            "MEDIUM PASSENGER VEHICLE",
            "OTHER THAN MENTIONED ABOVE",
        ],
    },
    GroupingRule {
        bucket: "3W",
        keywords: &[
            "THREE WHEELER (INVALID CARRIAGE)",
            "THREE WHEELER(NT)",
            "THREE WHEELER(T)",
        ],
    },
    GroupingRule {
        bucket: "2W",
        keywords: &[
            "TWO WHEELER (INVALID CARRIAGE)",
            "TWO WHEELER(NT)",
            "TWO WHEELER(T)",
        ],
    },
];

/// Per-month sums for one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTotals {
    pub bucket: &'static str,
    pub totals: Vec<u64>,
}

/// Buckets a raw label belongs to, in rule order.
pub fn matching_buckets(label: &str) -> Vec<&'static str> {
    VEHICLE_GROUPS
        .iter()
        .filter(|rule| rule.keywords.iter().any(|k| label.contains(k)))
        .map(|rule| rule.bucket)
        .collect()
}

/// Collapse raw category rows into per-bucket monthly totals, in rule
/// declaration order. Buckets that match no row are omitted, mirroring the
/// grid's behavior of not rendering empty groups.
pub fn bucket_totals(rows: &[RawRow], months: usize) -> Vec<BucketTotals> {
    for row in rows {
        let hits = matching_buckets(&row.label);
        match hits.len() {
            0 => warn!(label = %row.label, "label matches no bucket; excluded from all totals"),
            1 => {}
            _ => warn!(
                label = %row.label,
                buckets = ?hits,
                "label matches multiple buckets; counted into each"
            ),
        }
    }

    let mut out = Vec::new();
    for rule in VEHICLE_GROUPS {
        let matched: Vec<&RawRow> = rows
            .iter()
            .filter(|row| rule.keywords.iter().any(|k| row.label.contains(k)))
            .collect();
        if matched.is_empty() {
            continue;
        }
        let mut totals = vec![0u64; months];
        for row in &matched {
            for (slot, value) in totals.iter_mut().zip(&row.values) {
                *slot += value;
            }
        }
        out.push(BucketTotals {
            bucket: rule.bucket,
            totals,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, values: &[u64]) -> RawRow {
        RawRow {
            label: label.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn sums_matching_rows_per_month() {
        let rows = vec![
            row("TWO WHEELER(T)", &[10, 20]),
            row("TWO WHEELER(NT)", &[1, 2]),
            row("THREE WHEELER(T)", &[5, 5]),
        ];
        let buckets = bucket_totals(&rows, 2);
        assert_eq!(
            buckets,
            vec![
                BucketTotals {
                    bucket: "3W",
                    totals: vec![5, 5]
                },
                BucketTotals {
                    bucket: "2W",
                    totals: vec![11, 22]
                },
            ]
        );
    }

    #[test]
    fn unmatched_labels_are_excluded_everywhere() {
        let rows = vec![
            row("AGRICULTURAL TRACTOR", &[100, 100]),
            row("TWO WHEELER(T)", &[1, 1]),
        ];
        assert!(matching_buckets("AGRICULTURAL TRACTOR").is_empty());
        let buckets = bucket_totals(&rows, 2);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].bucket, "2W");
        assert_eq!(buckets[0].totals, vec![1, 1]);
    }

    #[test]
    fn multi_bucket_labels_are_double_counted() {
        // Contains both a 2W and a 3W keyword; the grouping rules do not
        // make buckets exclusive, so the counts land in both.
        let label = "TWO WHEELER(T) / THREE WHEELER(T) COMBINED";
        assert_eq!(matching_buckets(label), vec!["3W", "2W"]);
        let buckets = bucket_totals(&[row(label, &[7])], 1);
        assert_eq!(buckets.len(), 2);
        assert!(buckets.iter().all(|b| b.totals == vec![7]));
    }

    #[test]
    fn empty_buckets_are_omitted_and_order_is_stable() {
        let rows = vec![
            row("LIGHT MOTOR VEHICLE", &[3]),
            row("TWO WHEELER(NT)", &[4]),
        ];
        let buckets = bucket_totals(&rows, 1);
        let names: Vec<_> = buckets.iter().map(|b| b.bucket).collect();
        assert_eq!(names, vec!["4W", "2W"]);
    }
}
