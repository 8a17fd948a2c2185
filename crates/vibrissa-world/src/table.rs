//! Comma-separated sample tables: a `time,...` header then numeric rows.

use std::path::Path;

use crate::{Result, TrajectoryError};

#[derive(Debug, Clone)]
pub(crate) struct Table {
    /// Column names after `time`.
    pub columns: Vec<String>,
    pub times: Vec<f64>,
    /// One row per sample, `columns.len()` values each.
    pub rows: Vec<Vec<f64>>,
}

pub(crate) fn read(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).map_err(|source| TrajectoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

pub(crate) fn parse(text: &str) -> Result<Table> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    let (_, header) = lines.next().ok_or(TrajectoryError::MissingHeader)?;
    let mut names = header.split(',').map(|s| s.trim().to_string());
    match names.next() {
        Some(first) if first.eq_ignore_ascii_case("time") => {}
        other => return Err(TrajectoryError::BadHeader(other.unwrap_or_default())),
    }
    let columns: Vec<String> = names.collect();

    let mut times = Vec::new();
    let mut rows = Vec::new();
    for (line, content) in lines {
        let values = content
            .split(',')
            .map(|field| {
                let field = field.trim();
                let value = field.parse::<f64>().map_err(|_| TrajectoryError::Parse {
                    line,
                    value: field.to_string(),
                })?;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(TrajectoryError::NonFinite { line })
                }
            })
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != columns.len() + 1 {
            return Err(TrajectoryError::ColumnCount {
                line,
                expected: columns.len() + 1,
                found: values.len(),
            });
        }
        let time = values[0];
        if times.last().is_some_and(|&prev| time <= prev) {
            return Err(TrajectoryError::NonIncreasingTime { line, time });
        }
        times.push(time);
        rows.push(values[1..].to_vec());
    }

    if times.is_empty() {
        return Err(TrajectoryError::Empty);
    }
    Ok(Table {
        columns,
        times,
        rows,
    })
}

/// Index of the sample to hold at `t`, and whether `t` lies before the
/// first or after the last sample.
pub(crate) fn hold_index(times: &[f64], t: f64) -> (usize, Position) {
    let after = times.partition_point(|&s| s <= t);
    if after == 0 {
        (0, Position::Before)
    } else if after == times.len() && t > times[after - 1] {
        (after - 1, Position::After)
    } else {
        (after - 1, Position::Inside)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    Before,
    Inside,
    After,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let t = parse("# whisking\n\ntime, LA0 ,RA0\n0.0,0.1,0.2\n# mid\n0.5,0.3,0.4\n").unwrap();
        assert_eq!(t.columns, vec!["LA0", "RA0"]);
        assert_eq!(t.times, vec![0.0, 0.5]);
        assert_eq!(t.rows[1], vec![0.3, 0.4]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("# only\n"), Err(TrajectoryError::MissingHeader)));
        assert!(matches!(parse("t,LA0\n0,1\n"), Err(TrajectoryError::BadHeader(_))));
        assert!(matches!(parse("time,LA0\n"), Err(TrajectoryError::Empty)));
        assert!(matches!(
            parse("time,LA0\n0,1,2\n"),
            Err(TrajectoryError::ColumnCount { line: 2, expected: 2, found: 3 })
        ));
        assert!(matches!(
            parse("time,LA0\n0,abc\n"),
            Err(TrajectoryError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse("time,LA0\n0,NaN\n"),
            Err(TrajectoryError::NonFinite { line: 2 })
        ));
        assert!(matches!(
            parse("time,LA0\n0.1,0\n0.1,1\n"),
            Err(TrajectoryError::NonIncreasingTime { line: 3, .. })
        ));
    }

    #[test]
    fn test_hold_index() {
        let times = [0.0, 1.0, 2.0];
        assert_eq!(hold_index(&times, -1.0), (0, Position::Before));
        assert_eq!(hold_index(&times, 0.0), (0, Position::Inside));
        assert_eq!(hold_index(&times, 1.5), (1, Position::Inside));
        assert_eq!(hold_index(&times, 2.0), (2, Position::Inside));
        assert_eq!(hold_index(&times, 2.5), (2, Position::After));
    }
}
