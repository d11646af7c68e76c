use sgp4::{Constants, Elements};

use crate::elements::error::ElementsError;

/// The two lines of a NORAD two-line element set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleLines {
    pub line1: String,
    pub line2: String,
}

impl TleLines {
    pub fn new(line1: String, line2: String) -> Self {
        Self { line1, line2 }
    }

    /// Parses the lines into SGP4 elements and propagation constants.
    pub fn to_sgp4(&self, name: Option<String>) -> Result<(Elements, Constants), ElementsError> {
        let elements = Elements::from_tle(name, self.line1.as_bytes(), self.line2.as_bytes())
            .map_err(|e| ElementsError::InvalidTle(e.to_string()))?;
        let constants = Constants::from_elements(&elements)
            .map_err(|e| ElementsError::InvalidTle(e.to_string()))?;
        Ok((elements, constants))
    }
}

/// Splits a TLE file into entries. Both the bare 2-line form and the 3-line
/// form with a leading name are accepted, mixed freely; stray lines are skipped.
pub fn parse_multi_tle(content: &str) -> Vec<(Option<String>, TleLines)> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut entries = Vec::new();
    let mut rest = lines.as_slice();
    loop {
        rest = match rest {
            [l1, l2, tail @ ..] if is_element_line(l1, '1') && is_element_line(l2, '2') => {
                entries.push((None, TleLines::new(l1.to_string(), l2.to_string())));
                tail
            }
            [name, l1, l2, tail @ ..] if is_element_line(l1, '1') && is_element_line(l2, '2') => {
                entries.push((
                    Some(name.to_string()),
                    TleLines::new(l1.to_string(), l2.to_string()),
                ));
                tail
            }
            [_, tail @ ..] => tail,
            [] => break,
        };
    }
    entries
}

fn is_element_line(line: &str, number: char) -> bool {
    line.strip_prefix(number)
        .is_some_and(|r| r.starts_with(' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_1: &str = "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
    const ISS_2: &str = "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    #[test]
    fn parses_two_and_three_line_entries() {
        let content = format!("{ISS_1}\n{ISS_2}\n\nISS (ZARYA)\n{ISS_1}\n{ISS_2}\ngarbage\n");
        let parsed = parse_multi_tle(&content);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, None);
        assert_eq!(parsed[1].0.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(parsed[1].1.line1, ISS_1);
    }

    #[test]
    fn valid_lines_parse_into_sgp4() {
        let (elements, _) = TleLines::new(ISS_1.into(), ISS_2.into())
            .to_sgp4(None)
            .unwrap();
        assert_eq!(elements.norad_id, 25544);
    }

    #[test]
    fn invalid_lines_are_rejected() {
        let err = TleLines::new("1 bad".into(), "2 bad".into())
            .to_sgp4(None)
            .unwrap_err();
        assert!(matches!(err, ElementsError::InvalidTle(_)));
    }
}
