use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Value parser for `--now` style arguments, so runs can be pinned to a fixed instant.
pub fn parse_instant(raw: &str) -> Result<OffsetDateTime, String> {
	OffsetDateTime::parse(raw.trim(), &Rfc3339)
		.map_err(|err| format!("Expected an RFC 3339 timestamp such as 2024-06-05T09:00:00Z: {err}."))
}
