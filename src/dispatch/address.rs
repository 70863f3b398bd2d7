//! Delivery-address normalization for the `collect_address` command.
//!
//! Voice transcripts arrive in arbitrary casing and often spell house
//! numbers out ("one twenty three main street"). Normalization title-cases
//! every word and folds a leading run of number words into digits.

/// Value of a single spoken number word, if it is one.
fn number_word(word: &str) -> Option<u32> {
    let value = match word {
        "zero" | "oh" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        _ => return None,
    };
    Some(value)
}

/// Fold a leading run of number words into a digit string.
///
/// Tens followed by a unit combine ("twenty three" -> 23); every other
/// group concatenates in order ("one twenty three" -> "123"). Returns the
/// digit string and how many words were consumed, or None if the address
/// does not start with a number word.
fn fold_house_number(words: &[&str]) -> Option<(String, usize)> {
    let mut groups: Vec<u32> = Vec::new();
    let mut pending_tens: Option<u32> = None;
    let mut consumed = 0;

    for word in words {
        let Some(value) = number_word(&word.to_lowercase()) else {
            break;
        };
        consumed += 1;

        match pending_tens.take() {
            Some(tens) if value < 10 => groups.push(tens + value),
            Some(tens) => {
                groups.push(tens);
                if value >= 20 && value % 10 == 0 {
                    pending_tens = Some(value);
                } else {
                    groups.push(value);
                }
            }
            None if value >= 20 && value % 10 == 0 => pending_tens = Some(value),
            None => groups.push(value),
        }
    }

    if let Some(tens) = pending_tens {
        groups.push(tens);
    }

    if consumed == 0 {
        return None;
    }

    let digits = groups
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .concat();
    Some((digits, consumed))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Normalize a spoken delivery address.
pub fn normalize_address(raw: &str) -> String {
    let words: Vec<&str> = raw.split_whitespace().collect();

    let (mut parts, rest) = match fold_house_number(&words) {
        Some((digits, consumed)) => (vec![digits], &words[consumed..]),
        None => (Vec::new(), &words[..]),
    };

    parts.extend(rest.iter().map(|w| title_case(w)));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_clean_address_unchanged() {
        assert_eq!(normalize_address("123 Main Street"), "123 Main Street");
    }

    #[test]
    fn test_lowercase_input_title_cased() {
        assert_eq!(normalize_address("123 main street"), "123 Main Street");
    }

    #[test]
    fn test_uppercase_input_title_cased() {
        assert_eq!(normalize_address("123 MAIN STREET"), "123 Main Street");
    }

    #[test]
    fn test_spelled_out_house_number_tens_unit() {
        assert_eq!(
            normalize_address("one twenty three main street"),
            "123 Main Street"
        );
    }

    #[test]
    fn test_spelled_out_digit_run() {
        assert_eq!(
            normalize_address("four five six oak avenue"),
            "456 Oak Avenue"
        );
    }

    #[test]
    fn test_plain_tens_number() {
        assert_eq!(normalize_address("twenty elm road"), "20 Elm Road");
        assert_eq!(normalize_address("twenty three elm road"), "23 Elm Road");
    }

    #[test]
    fn test_teens_are_single_group() {
        assert_eq!(
            normalize_address("seventeen birch lane"),
            "17 Birch Lane"
        );
    }

    #[test]
    fn test_no_number_words() {
        assert_eq!(normalize_address("main street apt b"), "Main Street Apt B");
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(normalize_address(""), "");
        assert_eq!(normalize_address("   "), "");
    }
}
