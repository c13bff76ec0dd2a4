//! CSV Result Parsing
//!
//! Engines emit comparable output as CSV with a header row. The parser
//! handles quoted fields with embedded commas and doubled-quote escapes;
//! it does not re-sort or otherwise normalize rows, because ordering is part
//! of what validation compares.

/// Parse a CSV payload into rows of string cells. The header row, when
/// present, is the first returned row; callers compare it like any other.
pub fn parse_csv(payload: &str) -> Vec<Vec<String>> {
    payload
        .lines()
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                // Doubled quote inside a quoted field is a literal quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    cells.push(current);

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rows() {
        let rows = parse_csv("device,avg_hr\nvs14,51.3\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["device", "avg_hr"]);
        assert_eq!(rows[1], vec!["vs14", "51.3"]);
    }

    #[test]
    fn quoted_field_with_comma() {
        let rows = parse_csv("\"a,b\",c\n");
        assert_eq!(rows[0], vec!["a,b", "c"]);
    }

    #[test]
    fn doubled_quote_escape() {
        let rows = parse_csv("\"say \"\"hi\"\"\",x\n");
        assert_eq!(rows[0], vec!["say \"hi\"", "x"]);
    }

    #[test]
    fn empty_cells_preserved() {
        let rows = parse_csv("a,,c\n");
        assert_eq!(rows[0], vec!["a", "", "c"]);
    }

    #[test]
    fn empty_payload_is_no_rows() {
        assert!(parse_csv("").is_empty());
    }
}
