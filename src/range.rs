use std::collections::BTreeSet;

/// Largest number of values one range item may expand to.
const MAX_SPAN: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("numbering starts at 1")]
    Zero,
    #[error("range `{0}` is too large")]
    TooLarge(String),
}

/// Parses `1,3-5,7..8,10...12` into the set of numbers it names. Dashes and
/// `..` are inclusive, `...` excludes the end. Ranges may run backwards.
pub fn parse(expr: &str) -> Result<BTreeSet<usize>, RangeError> {
    let mut out = BTreeSet::new();
    for item in expr.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (start, end) = parse_item(item)?;
        if start.abs_diff(end) > MAX_SPAN {
            return Err(RangeError::TooLarge(item.to_string()));
        }
        out.extend(start.min(end)..=start.max(end));
    }
    Ok(out)
}

fn parse_item(item: &str) -> Result<(usize, usize), RangeError> {
    if let Some((a, b)) = item.split_once("...") {
        let (start, end) = (number(a)?, number(b)?);
        if start == end {
            return Err(RangeError::InvalidNumber(item.to_string()));
        }
        // Exclusive end, in whichever direction the range runs.
        let end = if end > start { end - 1 } else { end + 1 };
        return Ok((start, end));
    }
    if let Some((a, b)) = item.split_once("..").or_else(|| item.split_once('-')) {
        return Ok((number(a)?, number(b)?));
    }
    let n = number(item)?;
    Ok((n, n))
}

fn number(raw: &str) -> Result<usize, RangeError> {
    let raw = raw.trim();
    let n: usize = raw
        .parse()
        .map_err(|_| RangeError::InvalidNumber(raw.to_string()))?;
    if n == 0 {
        return Err(RangeError::Zero);
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::{parse, RangeError};

    fn set(values: &[usize]) -> Vec<usize> {
        values.to_vec()
    }

    #[test]
    fn parses_singles_and_ranges() {
        let parsed = parse("1, 3-5,7..8,10...12").expect("valid range");
        assert_eq!(parsed.into_iter().collect::<Vec<_>>(), set(&[1, 3, 4, 5, 7, 8, 10, 11]));
    }

    #[test]
    fn backwards_ranges_expand() {
        let parsed = parse("5-3,9...7").expect("valid range");
        assert_eq!(parsed.into_iter().collect::<Vec<_>>(), set(&[3, 4, 5, 8, 9]));
    }

    #[test]
    fn empty_expression_is_empty_set() {
        assert!(parse("").expect("empty").is_empty());
        assert!(parse(" , ").expect("empty").is_empty());
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse("a"), Err(RangeError::InvalidNumber("a".to_string())));
        assert_eq!(parse("0-2"), Err(RangeError::Zero));
        assert_eq!(parse("2...2"), Err(RangeError::InvalidNumber("2...2".to_string())));
        assert!(matches!(parse("1-999999999"), Err(RangeError::TooLarge(_))));
    }
}
