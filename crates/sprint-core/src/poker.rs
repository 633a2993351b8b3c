use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Consensus {
    pub votes_counted: usize,
    pub average: f64,
    /// Average rounded to the nearest half hour; the value applied as estimate.
    pub estimate: f64,
}

/// Planning poker: average every numeric vote and round to the nearest 0.5h.
/// Blank, non-numeric and negative votes are ignored.
pub fn consensus<S: AsRef<str>>(votes: &[S]) -> Consensus {
    let numeric: Vec<f64> = votes
        .iter()
        .filter_map(|v| v.as_ref().trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .collect();
    if numeric.is_empty() {
        return Consensus {
            votes_counted: 0,
            average: 0.0,
            estimate: 0.0,
        };
    }
    let average = numeric.iter().sum::<f64>() / numeric.len() as f64;
    Consensus {
        votes_counted: numeric.len(),
        average,
        estimate: (average * 2.0).round() / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_half_hours() {
        let c = consensus(&["3", "5", "8"]);
        assert_eq!(c.votes_counted, 3);
        assert!((c.average - 16.0 / 3.0).abs() < 1e-9);
        assert_eq!(c.estimate, 5.5);
    }

    #[test]
    fn ignores_garbage_votes() {
        let c = consensus(&["", "?", "2", "-1", "4"]);
        assert_eq!(c.votes_counted, 2);
        assert_eq!(c.estimate, 3.0);
    }

    #[test]
    fn no_votes_is_zero() {
        let empty: [&str; 0] = [];
        assert_eq!(consensus(&empty).estimate, 0.0);
    }
}
