//! NORAD two-line element set parsing and formatting
//!
//! Fields are read at their fixed columns (1-based, inclusive, as in the
//! published format). Every line must carry exactly 69 columns with a valid
//! mod-10 checksum in column 69.

use crate::error::TleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const LINE_LENGTH: usize = 69;

/// Element set fields in the units printed on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSet {
    pub satellite_number: u32,
    pub classification: char,
    pub international_designator: String,
    /// Four-digit year
    pub epoch_year: i32,
    /// Day of year with fraction, 1.0 = January 1st 00:00 UTC
    pub epoch_day: f64,
    /// First derivative of mean motion divided by two, rev/day²
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion divided by six, rev/day³
    pub mean_motion_ddot: f64,
    /// B* drag term, 1/earth radii
    pub bstar: f64,
    pub ephemeris_type: u8,
    pub element_set_number: u32,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Revolutions per day
    pub mean_motion: f64,
    pub revolution_number: u32,
}

/// A validated element set together with the lines it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tle {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
    pub elements: ElementSet,
}

impl Tle {
    /// Parse a title (optional) and the two element lines.
    pub fn parse(name: Option<&str>, line1: &str, line2: &str) -> Result<Self, TleError> {
        let line1 = normalize(line1);
        let line2 = normalize(line2);
        check_line(line1, 1)?;
        check_line(line2, 2)?;

        let satellite_number: u32 = number(line1, 1, 3, 7, "satellite number")?;
        let line2_number: u32 = number(line2, 2, 3, 7, "satellite number")?;
        if satellite_number != line2_number {
            return Err(TleError::SatelliteNumberMismatch {
                line1: satellite_number,
                line2: line2_number,
            });
        }

        let two_digit_year: i32 = number(line1, 1, 19, 20, "epoch year")?;
        let epoch_year = if two_digit_year < 57 {
            2000 + two_digit_year
        } else {
            1900 + two_digit_year
        };
        let epoch_day: f64 = number(line1, 1, 21, 32, "epoch day")?;
        if !(1.0..367.0).contains(&epoch_day) {
            return Err(TleError::OutOfRange {
                field: "epoch day",
                value: epoch_day,
            });
        }

        let eccentricity_raw = columns(line2, 27, 33).trim();
        if eccentricity_raw.is_empty() || !eccentricity_raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(field_error(line2, 2, 27, 33, "eccentricity"));
        }
        let eccentricity: f64 = format!("0.{}", eccentricity_raw)
            .parse()
            .map_err(|_| field_error(line2, 2, 27, 33, "eccentricity"))?;

        let elements = ElementSet {
            satellite_number,
            classification: columns(line1, 8, 8).chars().next().unwrap_or('U'),
            international_designator: columns(line1, 10, 17).trim().to_string(),
            epoch_year,
            epoch_day,
            mean_motion_dot: number(line1, 1, 34, 43, "first derivative of mean motion")?,
            mean_motion_ddot: implied_decimal(line1, 1, 45, 52, "second derivative of mean motion")?,
            bstar: implied_decimal(line1, 1, 54, 61, "B* drag term")?,
            ephemeris_type: number_or_zero(line1, 1, 63, 63, "ephemeris type")?,
            element_set_number: number_or_zero(line1, 1, 65, 68, "element set number")?,
            inclination_deg: number(line2, 2, 9, 16, "inclination")?,
            raan_deg: angle(line2, 18, 25, "right ascension of ascending node")?,
            eccentricity,
            arg_perigee_deg: angle(line2, 35, 42, "argument of perigee")?,
            mean_anomaly_deg: angle(line2, 44, 51, "mean anomaly")?,
            mean_motion: number(line2, 2, 53, 63, "mean motion")?,
            revolution_number: number_or_zero(line2, 2, 64, 68, "revolution number")?,
        };

        Ok(Tle {
            name: name.map(clean_title).filter(|n| !n.is_empty()),
            line1: line1.to_string(),
            line2: line2.to_string(),
            elements,
        })
    }

    /// Write the two fixed-width lines for `set`, checksums included.
    pub fn format_lines(set: &ElementSet) -> (String, String) {
        let line1 = format!(
            "1 {:05}{} {:<8} {:02}{:012.8} {} {} {} {} {:>4}",
            set.satellite_number % 100_000,
            set.classification,
            truncate(&set.international_designator, 8),
            set.epoch_year.rem_euclid(100),
            set.epoch_day,
            format_first_derivative(set.mean_motion_dot),
            format_implied_decimal(set.mean_motion_ddot),
            format_implied_decimal(set.bstar),
            set.ephemeris_type % 10,
            set.element_set_number % 10_000,
        );
        let line2 = format!(
            "2 {:05} {:8.4} {:8.4} {:07} {:8.4} {:8.4} {:11.8}{:05}",
            set.satellite_number % 100_000,
            set.inclination_deg,
            wrap_angle(set.raan_deg),
            ((set.eccentricity * 1e7).round() as u32).min(9_999_999),
            wrap_angle(set.arg_perigee_deg),
            wrap_angle(set.mean_anomaly_deg),
            set.mean_motion,
            set.revolution_number % 100_000,
        );

        let line1 = format!("{}{}", line1, checksum_digit(&line1));
        let line2 = format!("{}{}", line2, checksum_digit(&line2));
        (line1, line2)
    }

    /// Format `set` and read it back, so the result is a valid element set
    /// at the printed precision.
    pub fn from_element_set(name: Option<&str>, set: &ElementSet) -> Result<Self, TleError> {
        let (line1, line2) = Self::format_lines(set);
        Self::parse(name, &line1, &line2)
    }

    pub fn satellite_number(&self) -> u32 {
        self.elements.satellite_number
    }

    /// Title if present, otherwise the catalog number.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{:05}", self.elements.satellite_number),
        }
    }
}

impl FromStr for Tle {
    type Err = TleError;

    /// Accepts a two-line block or a three-line block with a title first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().filter(|l| !l.trim().is_empty()).collect();
        match lines.as_slice() {
            [line1, line2] => Tle::parse(None, line1, line2),
            [title, line1, line2] => Tle::parse(Some(title), line1, line2),
            _ => Err(TleError::Incomplete {
                line_no: lines.len(),
            }),
        }
    }
}

impl fmt::Display for Tle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "{}", name)?;
        }
        writeln!(f, "{}", self.line1)?;
        write!(f, "{}", self.line2)
    }
}

/// Read every record of a catalog file. Title lines are optional per record
/// and blank lines are ignored. Fails on the first bad record.
pub fn parse_catalog(text: &str) -> Result<Vec<Tle>, TleError> {
    let mut records = Vec::new();
    for record in records_of(text) {
        let (line_no, name, line1, line2) = record?;
        let tle = Tle::parse(name, line1, line2).map_err(|source| TleError::Catalog {
            line_no,
            source: Box::new(source),
        })?;
        records.push(tle);
    }
    Ok(records)
}

/// Like [`parse_catalog`] but skips bad records, returning them alongside.
pub fn parse_catalog_lossy(text: &str) -> (Vec<Tle>, Vec<TleError>) {
    let mut records = Vec::new();
    let mut rejected = Vec::new();
    for record in records_of(text) {
        let parsed = record.and_then(|(line_no, name, line1, line2)| {
            Tle::parse(name, line1, line2).map_err(|source| TleError::Catalog {
                line_no,
                source: Box::new(source),
            })
        });
        match parsed {
            Ok(tle) => records.push(tle),
            Err(e) => {
                warn!("Skipping catalog record: {}", e);
                rejected.push(e);
            }
        }
    }
    (records, rejected)
}

type RawRecord<'a> = (usize, Option<&'a str>, &'a str, &'a str);

fn records_of(text: &str) -> Vec<Result<RawRecord<'_>, TleError>> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let (line_no, first) = lines[i];
        let (name, start) = if first.starts_with("1 ") {
            (None, i)
        } else {
            (Some(first), i + 1)
        };
        if start + 1 >= lines.len() {
            out.push(Err(TleError::Incomplete { line_no }));
            break;
        }
        // a title followed by another title means the first record is broken
        if !lines[start].1.starts_with("1 ") {
            out.push(Err(TleError::Incomplete { line_no }));
            i = start;
            continue;
        }
        out.push(Ok((line_no, name, lines[start].1, lines[start + 1].1)));
        i = start + 2;
    }
    out
}

/// Column-69 checksum: digits of columns 1-68 summed, `-` counting as one.
pub fn checksum_digit(line: &str) -> u32 {
    let sum: u32 = line
        .chars()
        .take(LINE_LENGTH - 1)
        .map(|c| match c {
            '0'..='9' => c as u32 - '0' as u32,
            '-' => 1,
            _ => 0,
        })
        .sum();
    sum % 10
}

fn normalize(line: &str) -> &str {
    line.trim_end()
}

fn clean_title(title: &str) -> String {
    let title = title.trim();
    title.strip_prefix("0 ").unwrap_or(title).trim().to_string()
}

fn check_line(line: &str, line_no: u8) -> Result<(), TleError> {
    if !line.is_ascii() || line.len() != LINE_LENGTH {
        return Err(TleError::LineLength {
            line: line_no,
            found: line.chars().count(),
        });
    }
    let first = line.chars().next().unwrap_or(' ');
    if first.to_digit(10) != Some(u32::from(line_no)) {
        return Err(TleError::LineNumber {
            line: line_no,
            found: first,
        });
    }
    let found = line.chars().nth(LINE_LENGTH - 1).unwrap_or(' ');
    let expected = checksum_digit(line);
    if found.to_digit(10) != Some(expected) {
        return Err(TleError::Checksum {
            line: line_no,
            expected,
            found,
        });
    }
    Ok(())
}

fn columns(line: &str, start: usize, end: usize) -> &str {
    &line[start - 1..end]
}

fn field_error(line: &str, line_no: u8, start: usize, end: usize, field: &'static str) -> TleError {
    TleError::Field {
        line: line_no,
        start,
        end,
        field,
        raw: columns(line, start, end).to_string(),
    }
}

fn number<T: FromStr>(
    line: &str,
    line_no: u8,
    start: usize,
    end: usize,
    field: &'static str,
) -> Result<T, TleError> {
    let raw = columns(line, start, end).trim();
    // Rust's float parser also takes `inf`, `NaN` and exponents
    if !raw
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-'))
    {
        return Err(field_error(line, line_no, start, end, field));
    }
    raw.parse()
        .map_err(|_| field_error(line, line_no, start, end, field))
}

/// Line 2 angle in degrees, within [0, 360).
fn angle(line: &str, start: usize, end: usize, field: &'static str) -> Result<f64, TleError> {
    let value: f64 = number(line, 2, start, end, field)?;
    if !(0.0..360.0).contains(&value) {
        return Err(TleError::OutOfRange { field, value });
    }
    Ok(value)
}

/// Angle rounded to the four printed decimals and folded back into [0, 360).
fn wrap_angle(deg: f64) -> f64 {
    let wrapped = ((deg * 1e4).round() / 1e4).rem_euclid(360.0);
    // no "-0.0000" in the output
    if wrapped == 0.0 {
        0.0
    } else {
        wrapped
    }
}

fn number_or_zero<T: FromStr + Default>(
    line: &str,
    line_no: u8,
    start: usize,
    end: usize,
    field: &'static str,
) -> Result<T, TleError> {
    if columns(line, start, end).trim().is_empty() {
        Ok(T::default())
    } else {
        number(line, line_no, start, end, field)
    }
}

/// Fields like ` 28098-4` meaning 0.28098e-4.
fn implied_decimal(
    line: &str,
    line_no: u8,
    start: usize,
    end: usize,
    field: &'static str,
) -> Result<f64, TleError> {
    parse_implied_decimal(columns(line, start, end))
        .ok_or_else(|| field_error(line, line_no, start, end, field))
}

fn parse_implied_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    let (sign, rest) = match s.as_bytes()[0] {
        b'-' => (-1.0, &s[1..]),
        b'+' => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    let (mantissa, exponent) = match rest.rfind(|c| c == '-' || c == '+') {
        Some(i) if i > 0 => (&rest[..i], rest[i..].parse::<i32>().ok()?),
        _ => (rest, 0),
    };
    if mantissa.is_empty() || !mantissa.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: f64 = format!("0.{}", mantissa).parse().ok()?;
    Some(sign * value * 10f64.powi(exponent))
}

fn format_first_derivative(value: f64) -> String {
    let body = format!("{:.8}", value.abs());
    let body = body.strip_prefix('0').unwrap_or(&body);
    let sign = if value < 0.0 { '-' } else { ' ' };
    format!("{}{:>9}", sign, body)
}

fn format_implied_decimal(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return " 00000-0".to_string();
    }
    let sign = if value < 0.0 { '-' } else { ' ' };
    let mut exponent = value.abs().log10().floor() as i32 + 1;
    let mut mantissa = (value.abs() / 10f64.powi(exponent) * 1e5).round() as u64;
    if mantissa >= 100_000 {
        mantissa /= 10;
        exponent += 1;
    }
    if exponent < -9 {
        return " 00000-0".to_string();
    }
    let exponent = exponent.min(9);
    let exp_sign = if exponent < 0 { '-' } else { '+' };
    format!("{}{:05}{}{}", sign, mantissa, exp_sign, exponent.abs())
}

fn truncate(s: &str, width: usize) -> &str {
    match s.char_indices().nth(width) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LINE1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const LINE2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    #[test]
    fn test_parse_vanguard() {
        let tle = Tle::parse(Some("VANGUARD 1"), LINE1, LINE2).unwrap();
        let e = &tle.elements;
        assert_eq!(e.satellite_number, 5);
        assert_eq!(e.classification, 'U');
        assert_eq!(e.international_designator, "58002B");
        assert_eq!(e.epoch_year, 2000);
        assert_relative_eq!(e.epoch_day, 179.784_950_62);
        assert_relative_eq!(e.mean_motion_dot, 0.000_000_23);
        assert_eq!(e.mean_motion_ddot, 0.0);
        assert_relative_eq!(e.bstar, 0.280_98e-4);
        assert_eq!(e.element_set_number, 475);
        assert_relative_eq!(e.inclination_deg, 34.2682);
        assert_relative_eq!(e.eccentricity, 0.185_966_7);
        assert_relative_eq!(e.mean_motion, 10.824_191_57);
        assert_eq!(e.revolution_number, 41366);
        assert_eq!(tle.name.as_deref(), Some("VANGUARD 1"));
    }

    #[test]
    fn test_checksum_corruption_rejected() {
        let mut bad = LINE1.to_string();
        bad.replace_range(68..69, "4");
        let err = Tle::parse(None, &bad, LINE2).unwrap_err();
        assert_eq!(
            err,
            TleError::Checksum {
                line: 1,
                expected: 3,
                found: '4'
            }
        );
    }

    #[test]
    fn test_short_line_rejected() {
        let err = Tle::parse(None, &LINE1[..60], LINE2).unwrap_err();
        assert!(matches!(err, TleError::LineLength { line: 1, found: 60 }));
    }

    #[test]
    fn test_swapped_lines_rejected() {
        let err = Tle::parse(None, LINE2, LINE1).unwrap_err();
        assert!(matches!(err, TleError::LineNumber { line: 1, found: '2' }));
    }

    #[test]
    fn test_trailing_carriage_return_accepted() {
        let l1 = format!("{}\r", LINE1);
        assert!(Tle::parse(None, &l1, LINE2).is_ok());
    }

    #[test]
    fn test_implied_decimal_forms() {
        assert_relative_eq!(parse_implied_decimal(" 28098-4").unwrap(), 2.8098e-5);
        assert_relative_eq!(parse_implied_decimal("-31515-4").unwrap(), -3.1515e-5);
        assert_relative_eq!(parse_implied_decimal("+12345+1").unwrap(), 1.2345);
        assert_eq!(parse_implied_decimal(" 00000-0").unwrap(), 0.0);
        assert_eq!(parse_implied_decimal("        ").unwrap(), 0.0);
        assert!(parse_implied_decimal(" 2a098-4").is_none());
    }

    #[test]
    fn test_format_matches_published_lines() {
        let tle = Tle::parse(None, LINE1, LINE2).unwrap();
        let (l1, l2) = Tle::format_lines(&tle.elements);
        assert_eq!(l1, LINE1);
        assert_eq!(l2, LINE2);
    }

    #[test]
    fn test_format_negative_drag() {
        assert_eq!(format_implied_decimal(-3.1515e-5), "-31515-4");
        assert_eq!(format_first_derivative(-0.000_022_18), "-.00002218");
        assert_eq!(format_first_derivative(0.000_000_99), " .00000099");
    }

    #[test]
    fn test_from_str_with_title() {
        let text = format!("ISS (ZARYA)\n{}\n{}\n", LINE1, LINE2);
        let tle: Tle = text.parse().unwrap();
        assert_eq!(tle.display_name(), "ISS (ZARYA)");
        let untitled: Tle = format!("{}\n{}", LINE1, LINE2).parse().unwrap();
        assert_eq!(untitled.display_name(), "00005");
    }

    #[test]
    fn test_catalog_reports_line_of_bad_record() {
        let mut bad = LINE2.to_string();
        bad.replace_range(68..69, "0");
        let text = format!("A\n{}\n{}\n\nB\n{}\n{}\n", LINE1, LINE2, LINE1, bad);
        match parse_catalog(&text).unwrap_err() {
            TleError::Catalog { line_no, .. } => assert_eq!(line_no, 5),
            other => panic!("unexpected error {other:?}"),
        }
        let (ok, rejected) = parse_catalog_lossy(&text);
        assert_eq!(ok.len(), 1);
        assert_eq!(rejected.len(), 1);
    }

    /// LINE2 with columns `start..=end` replaced and the checksum redone.
    fn line2_with(start: usize, end: usize, text: &str) -> String {
        let mut line = LINE2.to_string();
        line.replace_range(start - 1..end, text);
        let digit = checksum_digit(&line);
        line.replace_range(68..69, &digit.to_string());
        line
    }

    #[test]
    fn test_non_numeric_float_spellings_rejected() {
        for raw in ["     inf", "     NaN", "-    inf", "  1.5e02"] {
            let line2 = line2_with(18, 25, raw);
            match Tle::parse(None, LINE1, &line2).unwrap_err() {
                TleError::Field { line, start, field, .. } => {
                    assert_eq!((line, start), (2, 18));
                    assert_eq!(field, "right ascension of ascending node");
                }
                other => panic!("{raw:?}: unexpected error {other:?}"),
            }
        }
        let line2 = line2_with(53, 63, "        inf");
        assert!(matches!(
            Tle::parse(None, LINE1, &line2).unwrap_err(),
            TleError::Field { field: "mean motion", .. }
        ));
    }

    #[test]
    fn test_angles_outside_circle_rejected() {
        let cases = [
            (18, 25, "999.9999", "right ascension of ascending node"),
            (35, 42, "360.0000", "argument of perigee"),
            (44, 51, " -0.5000", "mean anomaly"),
        ];
        for (start, end, raw, name) in cases {
            let line2 = line2_with(start, end, raw);
            match Tle::parse(None, LINE1, &line2).unwrap_err() {
                TleError::OutOfRange { field, .. } => assert_eq!(field, name),
                other => panic!("{raw:?}: unexpected error {other:?}"),
            }
        }
        let edge = line2_with(44, 51, "359.9999");
        assert_relative_eq!(
            Tle::parse(None, LINE1, &edge).unwrap().elements.mean_anomaly_deg,
            359.9999
        );
    }

    #[test]
    fn test_format_folds_angles_into_circle() {
        let mut set = Tle::parse(None, LINE1, LINE2).unwrap().elements;
        set.raan_deg = 359.999_98;
        set.mean_anomaly_deg = -10.0;
        let tle = Tle::from_element_set(None, &set).unwrap();
        assert_eq!(tle.elements.raan_deg, 0.0);
        assert_relative_eq!(tle.elements.mean_anomaly_deg, 350.0);
        assert_eq!(&tle.line2[17..25], "  0.0000");
    }

    #[test]
    fn test_catalog_incomplete_record() {
        let text = format!("{}\n{}\nLONELY TITLE\n", LINE1, LINE2);
        assert!(matches!(
            parse_catalog(&text).unwrap_err(),
            TleError::Incomplete { line_no: 3 }
        ));
    }
}
