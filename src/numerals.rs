//! Number formatting for amounts printed in documents and captions.
//!
//! Covers digit grouping (`15 000`) and Russian amount-in-words rendering
//! with the grammatical agreement rules for thousands and larger groups.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SERVICE_DATE_RX: Regex =
        Regex::new(r"\b(\d{1,2}\.\d{1,2}\.(?:\d{2}|\d{4}))\b").expect("valid date regex");
}

const UNITS_MASCULINE: [&str; 10] = [
    "", "один", "два", "три", "четыре", "пять", "шесть", "семь", "восемь", "девять",
];
const UNITS_FEMININE: [&str; 10] = [
    "", "одна", "две", "три", "четыре", "пять", "шесть", "семь", "восемь", "девять",
];
const TEENS: [&str; 10] = [
    "десять",
    "одиннадцать",
    "двенадцать",
    "тринадцать",
    "четырнадцать",
    "пятнадцать",
    "шестнадцать",
    "семнадцать",
    "восемнадцать",
    "девятнадцать",
];
const TENS: [&str; 10] = [
    "",
    "",
    "двадцать",
    "тридцать",
    "сорок",
    "пятьдесят",
    "шестьдесят",
    "семьдесят",
    "восемьдесят",
    "девяносто",
];
const HUNDREDS: [&str; 10] = [
    "",
    "сто",
    "двести",
    "триста",
    "четыреста",
    "пятьсот",
    "шестьсот",
    "семьсот",
    "восемьсот",
    "девятьсот",
];

/// Name forms of a base-1000 group: singular, "few" (2-4), "many".
struct GroupName {
    one: &'static str,
    few: &'static str,
    many: &'static str,
    feminine: bool,
}

const GROUPS: [GroupName; 7] = [
    GroupName { one: "", few: "", many: "", feminine: false },
    GroupName { one: "тысяча", few: "тысячи", many: "тысяч", feminine: true },
    GroupName { one: "миллион", few: "миллиона", many: "миллионов", feminine: false },
    GroupName { one: "миллиард", few: "миллиарда", many: "миллиардов", feminine: false },
    GroupName { one: "триллион", few: "триллиона", many: "триллионов", feminine: false },
    GroupName { one: "квадриллион", few: "квадриллиона", many: "квадриллионов", feminine: false },
    GroupName { one: "квинтиллион", few: "квинтиллиона", many: "квинтиллионов", feminine: false },
];

/// Render an integer with a space as the thousands separator, e.g. `1 234 567`.
pub fn group_digits(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

/// Convert an integer to Russian words (lowercase), e.g. `2001` -> `две тысячи один`.
///
/// The currency name is not appended; callers add `руб.` themselves.
pub fn amount_to_words(n: i64) -> String {
    if n == 0 {
        return "ноль".to_string();
    }

    let mut rest = n.unsigned_abs();
    let mut parts: Vec<String> = Vec::new();

    for group in GROUPS.iter() {
        if rest == 0 {
            break;
        }
        let value = (rest % 1000) as usize;
        rest /= 1000;
        if value == 0 {
            continue;
        }

        let words = hundreds_to_words(value, group.feminine);
        if group.one.is_empty() {
            parts.push(words);
        } else {
            let name = plural_form(value, group.one, group.few, group.many);
            parts.push(format!("{words} {name}").trim().to_string());
        }
    }

    let mut words = parts
        .into_iter()
        .rev()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if n < 0 {
        words = format!("минус {words}");
    }
    words
}

/// Pick the grammatical form of a counted noun from the last two digits of `value`.
pub fn plural_form<'a>(value: usize, one: &'a str, few: &'a str, many: &'a str) -> &'a str {
    let last_two = value % 100;
    let last = value % 10;
    if (11..=14).contains(&last_two) {
        many
    } else if last == 1 {
        one
    } else if (2..=4).contains(&last) {
        few
    } else {
        many
    }
}

fn hundreds_to_words(value: usize, feminine: bool) -> String {
    debug_assert!(value < 1000);
    let mut words: Vec<&str> = Vec::with_capacity(3);

    let h = value / 100;
    if h > 0 {
        words.push(HUNDREDS[h]);
    }

    let r = value % 100;
    if (10..=19).contains(&r) {
        words.push(TEENS[r - 10]);
    } else {
        let t = r / 10;
        let u = r % 10;
        if t > 0 {
            words.push(TENS[t]);
        }
        if u > 0 {
            let units = if feminine { &UNITS_FEMININE } else { &UNITS_MASCULINE };
            words.push(units[u]);
        }
    }

    words.join(" ")
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse the digits of a free-form amount (`15 000`, `15.000`), ignoring everything else.
///
/// Returns 0 when no digit is present and saturates at `u64::MAX`.
pub fn only_digits(raw: &str) -> u64 {
    raw.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(d as u64))
}

/// Extract the first `D.M.YY` / `D.M.YYYY` date from free text.
///
/// A short `dd.mm.yy` date is widened to `dd.mm.20yy`.
pub fn normalize_service_date(raw: &str) -> Option<String> {
    let found = SERVICE_DATE_RX.captures(raw)?.get(1)?.as_str();
    if found.len() == 8 {
        let mut pieces = found.split('.');
        if let (Some(dd), Some(mm), Some(yy)) = (pieces.next(), pieces.next(), pieces.next()) {
            return Some(format!("{dd}.{mm}.20{yy}"));
        }
    }
    Some(found.to_string())
}
