//! Calendar resolution for the loose date phrases that show up in filter values.
//!
//! Everything here is a pure function of its input and an explicit `now`; nothing reads the
//! wall clock.

use std::sync::LazyLock;

use regex::Regex;
use time::{Date, Duration, Month, OffsetDateTime};

// Leap days recur at most eight years apart (e.g. 2096 to 2104).
const LEAP_DAY_HORIZON: i32 = 8;

const MONTHS: [(&str, Month); 12] = [
	("january", Month::January),
	("february", Month::February),
	("march", Month::March),
	("april", Month::April),
	("may", Month::May),
	("june", Month::June),
	("july", Month::July),
	("august", Month::August),
	("september", Month::September),
	("october", Month::October),
	("november", Month::November),
	("december", Month::December),
];

static DATE_EXPRESSION: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(
		r"(?i)(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?(january|february|march|april|may|june|july|august|september|october|november|december)(?:\s+(\d{4}))?",
	)
	.ok()
});

/// Where a week range is anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeekAnchor<'a> {
	/// The coming week, starting on the next Monday (today when today is Monday).
	Upcoming,
	Date(Date),
	/// Free text, resolved through [`resolve_date`].
	Text(&'a str),
}

/// Half-open `[start, end)` range of calendar days.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekRange {
	pub start: Date,
	pub end: Date,
}

pub fn format_date(date: Date) -> String {
	format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

/// Parses `<day>[st|nd|rd|th] [of] <Month> [<year>]` anywhere in `text`.
///
/// Without a year the date lands in `now`'s year, moving one year ahead when its midnight (in
/// `now`'s offset) is already behind `now`. A yearless 29 February moves on to the next leap
/// year instead. Returns `None` when nothing matches or the day never exists in the named month.
pub fn parse_date(text: &str, now: OffsetDateTime) -> Option<Date> {
	let captures = DATE_EXPRESSION.as_ref()?.captures(text)?;
	let day: u8 = captures.get(1)?.as_str().parse().ok()?;
	let month = month_from_name(captures.get(2)?.as_str())?;

	if let Some(year) = captures.get(3) {
		let year: i32 = year.as_str().parse().ok()?;

		return Date::from_calendar_date(year, month, day).ok();
	}

	(now.year()..=now.year() + LEAP_DAY_HORIZON)
		.filter_map(|year| Date::from_calendar_date(year, month, day).ok())
		.find(|date| date.midnight().assume_offset(now.offset()) >= now)
}

/// Like [`parse_date`], but falls back to `now`'s calendar day when the text is not a date.
pub fn resolve_date(text: &str, now: OffsetDateTime) -> Date {
	match parse_date(text, now) {
		Some(date) => date,
		None => {
			tracing::debug!(input = text, "Date expression not recognized, using the current day.");

			now.date()
		},
	}
}

pub fn resolve_week(anchor: WeekAnchor<'_>, now: OffsetDateTime) -> WeekRange {
	let start = match anchor {
		WeekAnchor::Upcoming => upcoming_monday(now.date()),
		WeekAnchor::Date(date) => date,
		WeekAnchor::Text(text) => resolve_date(text, now),
	};

	WeekRange { start, end: start.saturating_add(Duration::days(7)) }
}

fn upcoming_monday(today: Date) -> Date {
	let days_until = (8 - i64::from(today.weekday().number_days_from_sunday())) % 7;

	today.saturating_add(Duration::days(days_until))
}

fn month_from_name(name: &str) -> Option<Month> {
	let name = name.to_ascii_lowercase();

	MONTHS.iter().find(|(candidate, _)| *candidate == name).map(|(_, month)| *month)
}
