//! Parser for numbered menu options embedded in assistant messages
//!
//! Assistant replies mix free-form prose with enumerated menus like
//! `1) Create a request`. Lines matching the menu pattern become
//! clickable choices; everything else is left alone.

/// A single numbered option parsed out of an assistant message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub number: u32,
    pub label: String,
}

/// Scan a message line-by-line for `<digits>) <label>` entries.
///
/// Lines are trimmed before matching. Non-matching lines are skipped
/// silently - that is how prose and menus coexist in one message.
/// Source order is preserved and duplicate numbers are kept as-is.
pub fn parse_choices(text: &str) -> Vec<Choice> {
    text.lines().filter_map(parse_choice_line).collect()
}

fn parse_choice_line(line: &str) -> Option<Choice> {
    let line = line.trim();
    let digits_end = line.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let rest = &line[digits_end..];
    let rest = rest.strip_prefix(')')?;
    let label = rest.trim_start();
    if label.is_empty() {
        return None;
    }
    // Absurdly long digit runs don't fit u32; treat them as prose.
    let number = line[..digits_end].parse::<u32>().ok()?;
    Some(Choice {
        number,
        label: label.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(number: u32, label: &str) -> Choice {
        Choice {
            number,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_menu_mixed_with_prose() {
        let parsed = parse_choices("Hi there\n1) Requests\n2) Courses\nbye");
        assert_eq!(parsed, vec![choice(1, "Requests"), choice(2, "Courses")]);
    }

    #[test]
    fn test_no_matching_lines() {
        assert_eq!(parse_choices("Just a plain answer."), vec![]);
        assert_eq!(parse_choices(""), vec![]);
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let parsed = parse_choices("  3) Benefits  \n\t4)\tLibrary booking");
        assert_eq!(
            parsed,
            vec![choice(3, "Benefits"), choice(4, "Library booking")]
        );
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        let parsed = parse_choices("5) Last\n1) First\n1) First again");
        assert_eq!(
            parsed,
            vec![choice(5, "Last"), choice(1, "First"), choice(1, "First again")]
        );
    }

    #[test]
    fn test_requires_label_after_paren() {
        assert_eq!(parse_choices("1)"), vec![]);
        assert_eq!(parse_choices("1)   "), vec![]);
        assert_eq!(parse_choices("1) x"), vec![choice(1, "x")]);
    }

    #[test]
    fn test_rejects_non_menu_shapes() {
        // No closing paren, paren before digits, digits mid-line
        assert_eq!(parse_choices("1. Requests"), vec![]);
        assert_eq!(parse_choices(") Requests"), vec![]);
        assert_eq!(parse_choices("see 1) Requests"), vec![]);
    }

    #[test]
    fn test_label_kept_verbatim_after_leading_whitespace() {
        let parsed = parse_choices("2)   On-duty pharmacies (24h)");
        assert_eq!(parsed, vec![choice(2, "On-duty pharmacies (24h)")]);
    }

    #[test]
    fn test_overflowing_number_is_skipped() {
        assert_eq!(parse_choices("99999999999999999999) too big"), vec![]);
    }
}
