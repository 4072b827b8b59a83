//! Fake data helpers.
//!
//! Identifier words, lorem text, dates and contact details. Every helper takes
//! the caller's RNG so a seeded run stays reproducible end to end.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::Rng;

/// Lorem ipsum words for text generation
const LOREM_WORDS: &[&str] = &[
    "lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
    "dolore",
    "magna",
    "aliqua",
    "enim",
    "ad",
    "minim",
    "veniam",
    "quis",
    "nostrud",
    "exercitation",
    "ullamco",
    "laboris",
    "nisi",
    "aliquip",
    "ex",
    "ea",
    "commodo",
    "consequat",
    "duis",
    "aute",
    "irure",
    "in",
    "reprehenderit",
    "voluptate",
    "velit",
    "esse",
    "cillum",
    "fugiat",
    "nulla",
    "pariatur",
    "excepteur",
    "sint",
    "occaecat",
    "cupidatat",
    "non",
    "proident",
    "sunt",
    "culpa",
    "qui",
    "officia",
    "deserunt",
    "mollit",
    "anim",
    "est",
    "laborum",
];

/// Length of generated identifier words
pub const WORD_LEN: usize = 8;

/// 1970-01-01T00:00:00
const EARLIEST_SECS: i64 = 0;
/// 2025-12-31T23:59:59
const LATEST_SECS: i64 = 1_767_225_599;

/// Random lowercase ASCII word of `len` letters
pub fn word<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| rng.random_range(b'a'..=b'z') as char)
        .collect()
}

/// Lorem text of at most `max_chars` characters, capitalized and ending in a period.
///
/// Always produces at least one word; a word longer than the bound is cut.
pub fn text<R: Rng + ?Sized>(rng: &mut R, max_chars: usize) -> String {
    let budget = max_chars.saturating_sub(1).max(1);
    let mut out = String::with_capacity(max_chars);

    loop {
        let word = LOREM_WORDS[rng.random_range(0..LOREM_WORDS.len())];
        let needed = if out.is_empty() {
            word.len()
        } else {
            word.len() + 1
        };
        if out.len() + needed > budget {
            if out.is_empty() {
                out.push_str(&word[..budget.min(word.len())]);
            }
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }

    if let Some(first) = out.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    if out.len() < max_chars {
        out.push('.');
    }
    out
}

/// Random date-time with second precision between 1970 and the end of 2025
pub fn datetime<R: Rng + ?Sized>(rng: &mut R) -> NaiveDateTime {
    let secs = rng.random_range(EARLIEST_SECS..=LATEST_SECS);
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

/// Random calendar date in the same window as [`datetime`]
pub fn date<R: Rng + ?Sized>(rng: &mut R) -> NaiveDate {
    datetime(rng).date()
}

/// `n` random bytes
pub fn bytes<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    rng.fill(buf.as_mut_slice());
    buf
}

/// Full person name
pub fn full_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    Name().fake_with_rng(rng)
}

/// Email address on a reserved example domain
pub fn email<R: Rng + ?Sized>(rng: &mut R) -> String {
    SafeEmail().fake_with_rng(rng)
}

/// Short lorem sentence
pub fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    Sentence(3..8).fake_with_rng(rng)
}

/// URL on a numbered example domain
pub fn url<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "https://example{}.com/{}",
        rng.random_range(1..1000),
        word(rng, 6)
    )
}

/// Price with two decimals in `[min, max)`
pub fn price<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    let value = rng.random_range(min..max);
    (value * 100.0).round() / 100.0
}
