//! Parsing of the plain-text ephemeris tables embedded in Horizons responses
//!
//! The table body sits between the `$$SOE` and `$$EOE` markers. With
//! `CSV_FORMAT=YES` the column header is the last non-separator line above
//! `$$SOE`, and every row is a comma separated record in the same order.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::models::{EquatorialCoords, HorizontalCoords, ObserverRow, StateVector};
use crate::{AstroViewError, Result};

const START_MARKER: &str = "$$SOE";
const END_MARKER: &str = "$$EOE";
const MISSING: &str = "n.a.";
const MAX_CANDIDATES: usize = 25;

const OBSERVER_DATE_FORMATS: [&str; 3] = [
    "%Y-%b-%d %H:%M:%S%.f",
    "%Y-%b-%d %H:%M:%S",
    "%Y-%b-%d %H:%M",
];

/// Header names and raw rows of one ephemeris table
#[derive(Debug)]
struct Table<'a> {
    header: Vec<String>,
    rows: Vec<Vec<&'a str>>,
}

impl Table<'_> {
    fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    fn column_prefixed(&self, prefix: &str) -> Option<usize> {
        self.header.iter().position(|h| h.starts_with(prefix))
    }

    fn require(&self, index: Option<usize>, name: &str) -> Result<usize> {
        index.ok_or_else(|| {
            AstroViewError::parse(format!("column '{name}' missing from ephemeris header"))
        })
    }
}

fn split_record(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Detect the lookup failures Horizons reports inside an otherwise
/// successful response
pub fn check_lookup(result: &str, target: &str) -> Result<()> {
    if result.contains("No matches found") || result.contains("No ephemeris for target") {
        return Err(AstroViewError::TargetNotFound {
            target: target.to_string(),
        });
    }
    if result.contains("Multiple major-bodies match")
        || result.contains("Matching small-bodies")
    {
        return Err(AstroViewError::AmbiguousTarget {
            target: target.to_string(),
            candidates: candidate_lines(result),
        });
    }
    Ok(())
}

/// Rows of the match list that follows the dashed separator line
fn candidate_lines(result: &str) -> Vec<String> {
    result
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("---"))
        .skip(1)
        .map(str::trim)
        .take_while(|line| !line.is_empty())
        .take(MAX_CANDIDATES)
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

fn extract_table<'a>(result: &'a str, target: &str) -> Result<Table<'a>> {
    check_lookup(result, target)?;

    let lines: Vec<&str> = result.lines().collect();
    let Some(start) = lines.iter().position(|l| l.trim() == START_MARKER) else {
        let informative = result
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('*'))
            .unwrap_or("response contained no ephemeris table");
        return Err(AstroViewError::parse(format!(
            "no ephemeris table in response: {informative}"
        )));
    };
    let end = lines[start..]
        .iter()
        .position(|l| l.trim() == END_MARKER)
        .map(|offset| start + offset)
        .ok_or_else(|| AstroViewError::parse("ephemeris table is not terminated"))?;

    let header_line = lines[..start]
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with('*'))
        .ok_or_else(|| AstroViewError::parse("ephemeris table has no column header"))?;
    let header = split_record(header_line)
        .into_iter()
        .map(str::to_string)
        .collect();

    let rows: Vec<Vec<&str>> = lines[start + 1..end]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| split_record(l))
        .collect();

    debug!("Extracted {} ephemeris rows for {}", rows.len(), target);
    if rows.is_empty() {
        return Err(AstroViewError::no_data(format!(
            "Horizons returned an empty table for '{target}'"
        )));
    }
    Ok(Table { header, rows })
}

fn field<'a>(row: &[&'a str], index: usize) -> Result<&'a str> {
    row.get(index)
        .copied()
        .ok_or_else(|| AstroViewError::parse(format!("row has no column {index}: {row:?}")))
}

fn number(row: &[&str], index: usize) -> Result<f64> {
    let raw = field(row, index)?;
    raw.parse()
        .map_err(|_| AstroViewError::parse(format!("'{raw}' is not a number")))
}

/// Numeric cell that Horizons may leave blank or mark `n.a.`
fn optional_number(row: &[&str], index: Option<usize>) -> Result<Option<f64>> {
    let Some(index) = index else {
        return Ok(None);
    };
    match row.get(index).copied() {
        None | Some("") | Some(MISSING) => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AstroViewError::parse(format!("'{raw}' is not a number"))),
    }
}

/// Parse a `VECTORS` table
pub fn parse_vectors(result: &str, target: &str) -> Result<Vec<StateVector>> {
    let table = extract_table(result, target)?;
    let jd = table.require(table.column("JDTDB"), "JDTDB")?;
    let x = table.require(table.column("X"), "X")?;
    let y = table.require(table.column("Y"), "Y")?;
    let z = table.require(table.column("Z"), "Z")?;
    let calendar = table.column("Calendar Date (TDB)");
    let velocity = match (table.column("VX"), table.column("VY"), table.column("VZ")) {
        (Some(vx), Some(vy), Some(vz)) => Some([vx, vy, vz]),
        _ => None,
    };

    table
        .rows
        .iter()
        .map(|row| {
            let velocity = match velocity {
                Some([vx, vy, vz]) => Some([number(row, vx)?, number(row, vy)?, number(row, vz)?]),
                None => None,
            };
            Ok(StateVector {
                epoch_jd: number(row, jd)?,
                calendar: calendar
                    .and_then(|i| row.get(i))
                    .map(|s| (*s).to_string()),
                position: [number(row, x)?, number(row, y)?, number(row, z)?],
                velocity,
            })
        })
        .collect()
}

fn parse_observer_time(raw: &str) -> Result<DateTime<Utc>> {
    OBSERVER_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AstroViewError::parse(format!("unrecognised table date '{raw}'")))
}

/// Parse an `OBSERVER` table with quantities 1 (RA/Dec) and 4 (Az/El)
pub fn parse_observer(result: &str, target: &str) -> Result<Vec<ObserverRow>> {
    let table = extract_table(result, target)?;
    let date = table.require(table.column_prefixed("Date"), "Date")?;
    let ra = table.column_prefixed("R.A.");
    let dec = table.column_prefixed("DEC");
    let azimuth = table.column_prefixed("Azi");
    let elevation = table.column_prefixed("Elev");

    table
        .rows
        .iter()
        .map(|row| {
            let equatorial = match (optional_number(row, ra)?, optional_number(row, dec)?) {
                (Some(ra_deg), Some(dec_deg)) => Some(EquatorialCoords { ra_deg, dec_deg }),
                _ => None,
            };
            let horizontal =
                match (optional_number(row, elevation)?, optional_number(row, azimuth)?) {
                    (Some(altitude_deg), Some(azimuth_deg)) => Some(HorizontalCoords {
                        altitude_deg,
                        azimuth_deg,
                    }),
                    _ => None,
                };
            Ok(ObserverRow {
                time: parse_observer_time(field(row, date)?)?,
                equatorial,
                horizontal,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    const VECTORS: &str = r"
*******************************************************************************
Ephemeris / API_USER Mon Aug  4 10:00:00 2025 Pasadena, USA      / Horizons
*******************************************************************************
Target body name: 1 Ceres (A801 AA)               {source: JPL#48}
Center body name: Sun (10)                        {source: DE441}
*******************************************************************************
            JDTDB,            Calendar Date (TDB),                      X,                      Y,                      Z,                     VX,                     VY,                     VZ,
**************************************************************************************************************************************************************************************************
$$SOE
2460676.500000000, A.D. 2025-Jan-01 00:00:00.0000, -1.500000000000000E+00,  2.500000000000000E+00,  5.000000000000000E-01, -9.1E-03, -5.2E-03, 1.4E-03,
2460677.500000000, A.D. 2025-Jan-02 00:00:00.0000, -1.400000000000000E+00,  2.600000000000000E+00,  4.000000000000000E-01, -9.0E-03, -5.3E-03, 1.5E-03,
$$EOE
**************************************************************************************************************************************************************************************************
";

    const OBSERVER: &str = r"
*******************************************************************************
 Date__(UT)__HR:MN, , , R.A._(ICRF), DEC_(ICRF), Azi____(a-app), Elev___(a-app),
***************************************************************************************
$$SOE
 2025-Aug-05 10:00, *, ,  135.12345,  16.54321,  120.000000,  30.000000,
 2025-Aug-05 11:00:30, *, ,  135.16000,  16.53000,  n.a.,  n.a.,
$$EOE
***************************************************************************************
";

    #[test]
    fn test_parse_vectors() {
        let vectors = parse_vectors(VECTORS, "Ceres").unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].epoch_jd, 2_460_676.5);
        assert_eq!(vectors[0].position, [-1.5, 2.5, 0.5]);
        assert_eq!(vectors[1].position, [-1.4, 2.6, 0.4]);
        assert_eq!(
            vectors[0].calendar.as_deref(),
            Some("A.D. 2025-Jan-01 00:00:00.0000")
        );
        assert_eq!(vectors[1].velocity, Some([-9.0e-3, -5.3e-3, 1.5e-3]));
    }

    #[test]
    fn test_parse_observer() {
        let rows = parse_observer(OBSERVER, "Sun").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].time,
            Utc.with_ymd_and_hms(2025, 8, 5, 10, 0, 0).unwrap()
        );
        let horizontal = rows[0].horizontal.unwrap();
        assert_eq!(horizontal.altitude_deg, 30.0);
        assert_eq!(horizontal.azimuth_deg, 120.0);
        assert_eq!(rows[0].equatorial.unwrap().ra_deg, 135.12345);

        assert_eq!(rows[1].time.second(), 30);
        assert!(rows[1].horizontal.is_none());
        assert!(rows[1].equatorial.is_some());
    }

    #[test]
    fn test_target_not_found() {
        let result = "\n No matches found.\n";
        assert!(matches!(
            parse_vectors(result, "Planet Nine"),
            Err(AstroViewError::TargetNotFound { .. })
        ));
    }

    #[test]
    fn test_ambiguous_target_lists_candidates() {
        let result = "\
*******************************************************************************
 JPL/DASTCOM            Small-body Index Search Results
*******************************************************************************

 Comet AND asteroid index search:

    NAME = Apollo;

 Matching small-bodies:

    Record #  Epoch-yr  >MATCH NAME<   Primary Desig  Name
    --------  --------  -------------  -------------  -------------------------
        1862            Apollo         1932 HA        Apollo
    90001862  1985      Apollo         1932 HA        Apollo

 (2 matches. To SELECT, enter record # (integer), followed by semi-colon.)
";
        match parse_vectors(result, "Apollo") {
            Err(AstroViewError::AmbiguousTarget { candidates, .. }) => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0], "1862 Apollo 1932 HA Apollo");
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_table_quotes_first_line() {
        let result = "****\n Cannot interpret date. Type \"?!\" for more information.\n";
        match parse_observer(result, "Sun") {
            Err(AstroViewError::Parse { message }) => {
                assert!(message.contains("Cannot interpret date"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_table_is_no_data() {
        let result = " JDTDB, X, Y, Z,\n$$SOE\n$$EOE\n";
        assert!(matches!(
            parse_vectors(result, "Ceres"),
            Err(AstroViewError::NoData { .. })
        ));
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let result = " JDTDB, X, Y,\n$$SOE\n2460676.5, 1.0, 2.0,\n$$EOE\n";
        assert!(matches!(
            parse_vectors(result, "Ceres"),
            Err(AstroViewError::Parse { .. })
        ));
    }
}
