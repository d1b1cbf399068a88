//! Date normalization for loosely written date/time phrases.
//!
//! Turns input such as "tomorrow lunch", "6 July" or "next friday 3pm" into an
//! unambiguous local timestamp. Everything is relative to an explicit
//! `reference_now`; nothing here reads the clock.
//!
//! Pipeline:
//! 1. lower-case and trim
//! 2. whole-word relative days (`today`, `tomorrow`, `yesterday`) become `day month year`
//! 3. whole-word time-of-day keywords (`lunch`, `evening`, ...) become clock times
//! 4. the reference year is appended when no four-digit year is present
//! 5. the result is parsed preferring future dates
//! 6. a past result with an inferred year is retried with the following year

use std::fmt;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use thiserror::Error;

/// Output format of [`CanonicalTimestamp`].
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Fixed time-of-day vocabulary, matched on whole words only.
const TIME_OF_DAY_KEYWORDS: [(&str, &str); 6] = [
    ("morning", "9 am"),
    ("afternoon", "2 pm"),
    ("evening", "6 pm"),
    ("lunch", "1 pm"),
    ("dinner", "8 pm"),
    ("tonight", "9 pm"),
];

/// Words that carry no date information and are skipped by the parser.
const FILLER_WORDS: [&str; 7] = ["at", "on", "the", "of", "this", "next", "for"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not interpret '{input}' as a date or time")]
pub struct DateParseError {
    /// The string that failed, after keyword expansion.
    pub input: String,
}

impl DateParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// A local timestamp without offset, rendered as `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalTimestamp(NaiveDateTime);

impl CanonicalTimestamp {
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }
}

impl fmt::Display for CanonicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl From<CanonicalTimestamp> for NaiveDateTime {
    fn from(value: CanonicalTimestamp) -> Self {
        value.0
    }
}

/// Normalizes a human date/time phrase relative to `reference_now`.
pub fn normalize(
    raw: &str,
    reference_now: NaiveDateTime,
) -> Result<CanonicalTimestamp, DateParseError> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(CanonicalTimestamp(dt.naive_local()));
    }

    let lowered = trimmed.to_lowercase();
    let expanded = expand_keywords(&lowered, reference_now.date());

    let year_inferred = !has_four_digit_run(&expanded);
    let query = if year_inferred {
        with_year(&expanded, reference_now.year())
    } else {
        expanded.clone()
    };

    let parsed = match parse_with_future_bias(&query, reference_now) {
        Ok(parsed) => parsed,
        // "sunday 15 march" may only name a real day in the following year
        Err(err) if year_inferred => {
            let retry_query = with_year(&expanded, reference_now.year() + 1);
            return parse_with_future_bias(&retry_query, reference_now)
                .ok()
                .filter(|retry| retry.value > reference_now)
                .map(|retry| CanonicalTimestamp(retry.value))
                .ok_or(err);
        }
        Err(err) => return Err(err),
    };
    if parsed.is_before(reference_now) && year_inferred {
        let retry_query = with_year(&expanded, reference_now.year() + 1);
        if let Ok(retry) = parse_with_future_bias(&retry_query, reference_now) {
            if retry.value > reference_now {
                return Ok(CanonicalTimestamp(retry.value));
            }
        }
    }

    Ok(CanonicalTimestamp(parsed.value))
}

/// Like [`normalize`] but keeps only the calendar day.
pub fn normalize_date(raw: &str, reference_now: NaiveDateTime) -> Result<NaiveDate, DateParseError> {
    normalize(raw, reference_now).map(|ts| ts.date())
}

/// Like [`normalize`], but a timestamp carrying a UTC offset is converted
/// to `zone` instead of keeping its own wall-clock time.
pub fn normalize_in_zone(
    raw: &str,
    reference_now: NaiveDateTime,
    zone: Tz,
) -> Result<CanonicalTimestamp, DateParseError> {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(dt) => Ok(CanonicalTimestamp(dt.with_timezone(&zone).naive_local())),
        Err(_) => normalize(raw, reference_now),
    }
}

/// Like [`normalize_in_zone`] but keeps only the calendar day.
pub fn normalize_date_in_zone(
    raw: &str,
    reference_now: NaiveDateTime,
    zone: Tz,
) -> Result<NaiveDate, DateParseError> {
    normalize_in_zone(raw, reference_now, zone).map(|ts| ts.date())
}

fn with_year(text: &str, year: i32) -> String {
    if text.is_empty() {
        year.to_string()
    } else {
        format!("{text} {year}")
    }
}

// --- Keyword expansion ---

/// Rewrites keywords on word boundaries, leaving separators untouched.
pub(crate) fn expand_keywords(input: &str, today: NaiveDate) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    let mut word = String::new();

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            word.push(ch);
        } else {
            flush_word(&mut out, &mut word, today);
            out.push(ch);
        }
    }
    flush_word(&mut out, &mut word, today);
    out
}

fn flush_word(out: &mut String, word: &mut String, today: NaiveDate) {
    if word.is_empty() {
        return;
    }
    match substitute_keyword(word, today) {
        Some(replacement) => out.push_str(&replacement),
        None => out.push_str(word),
    }
    word.clear();
}

fn substitute_keyword(word: &str, today: NaiveDate) -> Option<String> {
    match word {
        "today" => Some(day_literal(today)),
        "tomorrow" => today.succ_opt().map(day_literal),
        "yesterday" => today.pred_opt().map(day_literal),
        _ => TIME_OF_DAY_KEYWORDS
            .iter()
            .find(|(keyword, _)| *keyword == word)
            .map(|(_, time)| time.to_string()),
    }
}

fn day_literal(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string().to_lowercase()
}

pub(crate) fn has_four_digit_run(text: &str) -> bool {
    let mut run = 0;
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            run += 1;
        } else {
            if run == 4 {
                return true;
            }
            run = 0;
        }
    }
    run == 4
}

// --- Parsing ---

#[derive(Debug, Clone, Copy)]
struct Parsed {
    value: NaiveDateTime,
    has_time: bool,
}

impl Parsed {
    /// Date-only results are compared by day: "today" is not in the past.
    fn is_before(&self, now: NaiveDateTime) -> bool {
        if self.has_time {
            self.value < now
        } else {
            self.value.date() < now.date()
        }
    }
}

#[derive(Debug, Default)]
struct Fields {
    iso_date: Option<NaiveDate>,
    day: Option<u32>,
    month: Option<u32>,
    year: Option<i32>,
    weekday: Option<Weekday>,
    time: Option<NaiveTime>,
}

fn parse_with_future_bias(text: &str, now: NaiveDateTime) -> Result<Parsed, DateParseError> {
    let text = text.trim();
    let fields = scan_fields(text).ok_or_else(|| DateParseError::new(text))?;
    resolve(&fields, now).ok_or_else(|| DateParseError::new(text))
}

fn scan_fields(text: &str) -> Option<Fields> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim_end_matches('.'))
        .filter(|t| !t.is_empty())
        .collect();

    let mut fields = Fields::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let meridiem = tokens.get(i + 1).and_then(|next| parse_meridiem(next));

        if FILLER_WORDS.contains(&token) {
            i += 1;
            continue;
        }

        if let Some(time) = named_time(token) {
            set_once(&mut fields.time, time)?;
        } else if let Some(time) = parse_suffixed_clock(token) {
            set_once(&mut fields.time, time)?;
        } else if token.contains('-') {
            let (date, time) = parse_iso_token(token)?;
            set_once(&mut fields.iso_date, date)?;
            if let Some(time) = time {
                set_once(&mut fields.time, time)?;
            }
        } else if token.contains(':') {
            let time = parse_clock(token, meridiem)?;
            set_once(&mut fields.time, time)?;
            if meridiem.is_some() {
                i += 1;
            }
        } else if token.chars().all(|c| c.is_ascii_digit()) {
            if token.len() == 4 {
                set_once(&mut fields.year, token.parse().ok()?)?;
            } else if let Some(is_pm) = meridiem {
                let hour: u32 = token.parse().ok()?;
                set_once(&mut fields.time, meridiem_time(hour, 0, 0, is_pm)?)?;
                i += 1;
            } else {
                set_once(&mut fields.day, parse_day(token)?)?;
            }
        } else if let Some(day) = parse_ordinal(token) {
            set_once(&mut fields.day, day)?;
        } else if let Some(month) = month_number(token) {
            set_once(&mut fields.month, month)?;
        } else if let Some(weekday) = weekday_from_name(token) {
            set_once(&mut fields.weekday, weekday)?;
        } else {
            return None;
        }
        i += 1;
    }
    Some(fields)
}

/// Sets a field that may appear only once; a second, different value is a contradiction.
fn set_once<T: PartialEq>(slot: &mut Option<T>, value: T) -> Option<()> {
    match slot {
        Some(existing) if *existing != value => None,
        _ => {
            *slot = Some(value);
            Some(())
        }
    }
}

fn resolve(fields: &Fields, now: NaiveDateTime) -> Option<Parsed> {
    let today = now.date();
    let has_date_part = fields.iso_date.is_some()
        || fields.day.is_some()
        || fields.month.is_some()
        || fields.weekday.is_some();
    if !has_date_part && fields.time.is_none() {
        return None;
    }

    let time = match fields.time {
        Some(time) => time,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    let has_time = fields.time.is_some();

    let date = if let Some(iso) = fields.iso_date {
        if fields.day.is_some() || fields.month.is_some() {
            return None;
        }
        if fields.year.is_some_and(|year| year != iso.year()) {
            return None;
        }
        iso
    } else if fields.day.is_some() || fields.month.is_some() {
        resolve_calendar_date(fields, today)?
    } else if let Some(weekday) = fields.weekday {
        let mut date = next_weekday(today, weekday);
        if date.and_time(time) < now {
            date = date.checked_add_days(Days::new(7))?;
        }
        date
    } else {
        let year = fields.year.unwrap_or(today.year());
        if year == today.year() {
            if today.and_time(time) < now {
                today.succ_opt()?
            } else {
                today
            }
        } else {
            clamped_date(year, today.month(), today.day())?
        }
    };

    // A weekday next to an explicit date must agree with it
    if fields.weekday.is_some_and(|weekday| weekday != date.weekday()) {
        return None;
    }

    Some(Parsed {
        value: date.and_time(time),
        has_time,
    })
}

fn resolve_calendar_date(fields: &Fields, today: NaiveDate) -> Option<NaiveDate> {
    let year = fields.year.unwrap_or(today.year());
    match (fields.day, fields.month) {
        (Some(day), Some(month)) => NaiveDate::from_ymd_opt(year, month, day),
        (None, Some(month)) => clamped_date(year, month, today.day()),
        (Some(day), None) => {
            // Day of month alone: the next month (from the reference month) that has it
            let mut candidate_month = NaiveDate::from_ymd_opt(year, today.month(), 1)?;
            for _ in 0..12 {
                if let Some(date) =
                    NaiveDate::from_ymd_opt(candidate_month.year(), candidate_month.month(), day)
                {
                    if year != today.year() || date >= today {
                        return Some(date);
                    }
                }
                candidate_month = candidate_month.checked_add_months(chrono::Months::new(1))?;
            }
            None
        }
        (None, None) => None,
    }
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (1..=day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from + chrono::Duration::days(i64::from(ahead))
}

// --- Token helpers ---

fn parse_meridiem(token: &str) -> Option<bool> {
    match token.trim_end_matches('.') {
        "am" | "a.m" => Some(false),
        "pm" | "p.m" => Some(true),
        _ => None,
    }
}

fn named_time(token: &str) -> Option<NaiveTime> {
    match token {
        "noon" | "midday" => NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => NaiveTime::from_hms_opt(0, 0, 0),
        _ => None,
    }
}

fn meridiem_time(hour: u32, minute: u32, second: u32, is_pm: bool) -> Option<NaiveTime> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// "13:00", "9:30:15", or "1:30" followed by a meridiem token.
fn parse_clock(token: &str, meridiem: Option<bool>) -> Option<NaiveTime> {
    let parts: Vec<u32> = token
        .split(':')
        .map(|p| p.parse().ok())
        .collect::<Option<Vec<_>>>()?;
    let (hour, minute, second) = match parts.as_slice() {
        [h, m] => (*h, *m, 0),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };
    match meridiem {
        Some(is_pm) => meridiem_time(hour, minute, second, is_pm),
        None => NaiveTime::from_hms_opt(hour, minute, second),
    }
}

/// "1pm", "1:30pm", "11am"
fn parse_suffixed_clock(token: &str) -> Option<NaiveTime> {
    let (clock, is_pm) = if let Some(clock) = token.strip_suffix("pm") {
        (clock, true)
    } else if let Some(clock) = token.strip_suffix("am") {
        (clock, false)
    } else {
        return None;
    };
    if clock.is_empty() {
        return None;
    }
    if clock.contains(':') {
        parse_clock(clock, Some(is_pm))
    } else {
        meridiem_time(clock.parse().ok()?, 0, 0, is_pm)
    }
}

/// "2025-07-06" or "2025-07-06t10:00:00"
fn parse_iso_token(token: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let (date_part, time_part) = match token.split_once('t') {
        Some((date, time)) => (date, Some(time)),
        None => (token, None),
    };
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let time = match time_part {
        Some(time) => Some(parse_clock(time, None)?),
        None => None,
    };
    Some((date, time))
}

fn parse_day(token: &str) -> Option<u32> {
    let day: u32 = token.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

fn parse_ordinal(token: &str) -> Option<u32> {
    ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .and_then(parse_day)
}

fn month_number(token: &str) -> Option<u32> {
    let month = match token {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday_from_name(token: &str) -> Option<Weekday> {
    let weekday = match token {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}
