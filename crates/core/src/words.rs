//! Portuguese cardinal numbers for the days-off field.
//!
//! Only 1 to 99 are spelled out. Larger values come back as plain digits, which covers
//! every realistic leave length without a full number speller.

const UNITS: [&str; 10] = [
    "", "um", "dois", "três", "quatro", "cinco", "seis", "sete", "oito", "nove",
];

const TEENS: [&str; 10] = [
    "dez",
    "onze",
    "doze",
    "treze",
    "catorze",
    "quinze",
    "dezesseis",
    "dezessete",
    "dezoito",
    "dezenove",
];

const TENS: [&str; 10] = [
    "", "", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta",
    "noventa",
];

/// Returned for empty, unparsable or non-positive input.
pub const NO_WORDS: &str = "...";

/// Spells out a days-off value in Portuguese.
///
/// # Examples
///
/// ```
/// use atestado_core::words::number_to_words;
///
/// assert_eq!(number_to_words("5"), "cinco");
/// assert_eq!(number_to_words("21"), "vinte e um");
/// assert_eq!(number_to_words("0"), "...");
/// assert_eq!(number_to_words("100"), "100");
/// ```
pub fn number_to_words(value: &str) -> String {
    let Some(num) = parse_leading_int(value).filter(|n| *n > 0) else {
        return NO_WORDS.to_string();
    };

    match num {
        1..=9 => UNITS[num as usize].to_string(),
        10..=19 => TEENS[(num - 10) as usize].to_string(),
        20..=99 => {
            let ten = TENS[(num / 10) as usize];
            match num % 10 {
                0 => ten.to_string(),
                unit => format!("{} e {}", ten, UNITS[unit as usize]),
            }
        }
        _ => leading_digits(value).trim_start_matches('0').to_string(),
    }
}

/// The sign and the run of ASCII digits at the start of `value`, after leading whitespace.
fn split_leading_int(value: &str) -> (bool, &str) {
    let value = value.trim_start();
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    (negative, &rest[..end])
}

fn leading_digits(value: &str) -> &str {
    split_leading_int(value).1
}

/// Lenient integer parse: skips leading whitespace, accepts an optional sign, then reads
/// the leading run of ASCII digits. `"7 dias"` parses as 7; `"dias"` does not parse.
pub(crate) fn parse_leading_int(value: &str) -> Option<i64> {
    let (negative, digits) = split_leading_int(value);
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}
