use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use notiq_domain::{FilterSpec, SortDirection, SortSpec};
use notiq_service::{Answer, NotiqService, QueryParams, QueryRequest, SearchRequest};

#[derive(Debug, Parser)]
#[command(
	version = notiq_cli::VERSION,
	rename_all = "kebab",
	styles = notiq_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Pin "now" for date resolution instead of reading the clock.
	#[arg(long, global = true, value_name = "RFC3339", value_parser = notiq_cli::parse_instant)]
	pub now: Option<OffsetDateTime>,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Fetch every configured database schema and replace the local snapshot.
	Refresh,
	/// Print the compiled query without executing it.
	Compile(QueryArgs),
	/// Compile, execute and print one line per page.
	Query(QueryArgs),
	/// Full-text search over pages and print one line per hit.
	Search { query: String },
	/// Run an interpreter reply: a query object, a search object or NO_QUERY_NEEDED.
	Answer {
		#[arg(value_name = "FILE")]
		reply: PathBuf,
	},
	/// Print the cached schema of one database.
	Schema { database: String },
	/// Print the interpreter system prompt for the cached schemas.
	Prompt,
}

#[derive(Debug, clap::Args)]
pub struct QueryArgs {
	pub database: String,
	/// JSON array of filters, e.g. `[{"property":"Status","filterType":"select","operator":"equals","value":"Done"}]`.
	#[arg(long, value_name = "FILE")]
	pub filters: Option<PathBuf>,
	#[arg(long, value_name = "PROPERTY")]
	pub sort_property: Option<String>,
	#[arg(long, value_enum, default_value = "descending", requires = "sort_property")]
	pub direction: Direction,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Direction {
	Ascending,
	Descending,
}
impl From<Direction> for SortDirection {
	fn from(direction: Direction) -> Self {
		match direction {
			Direction::Ascending => Self::Ascending,
			Direction::Descending => Self::Descending,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = notiq_config::load(&args.config)?;

	init_tracing(&config)?;

	let now = args.now.unwrap_or_else(now_local);
	let service = NotiqService::with_notion(config)?;

	match args.command {
		Command::Refresh => {
			let outcome = service.refresh(now).await?;

			println!(
				"Cached {} database schema(s) at {}.",
				outcome.schemas.len(),
				service.store.path().display()
			);

			for failure in &outcome.failures {
				println!("Skipped {}: {}", failure.database, failure.error);
			}
		},
		Command::Compile(query) => {
			service.load_cache()?;

			let compiled = service.compile(&query_request(query)?, now)?;

			println!("{}", serde_json::to_string_pretty(&compiled)?);
		},
		Command::Query(query) => {
			if service.load_cache()?.is_none() {
				return Err(eyre::eyre!("No schema snapshot found; run `notiq refresh` first."));
			}

			let response = service.query(&query_request(query)?, now).await?;

			println!("{}", response.formatted);
		},
		Command::Search { query } => {
			let response = service.search(&SearchRequest { query }).await?;

			println!("{}", response.formatted);
		},
		Command::Answer { reply } => {
			let reply = fs::read_to_string(&reply)
				.map_err(|err| eyre::eyre!("Failed to read reply at {reply:?}: {err}."))?;

			service.load_cache()?;

			match service.answer(&reply, now).await? {
				Some(Answer::Query(response)) => println!("{}", response.formatted),
				Some(Answer::Search(response)) => println!("{}", response.formatted),
				None => println!("No lookup needed."),
			}
		},
		Command::Schema { database } => {
			service.load_cache()?;

			println!("{}", serde_json::to_string_pretty(&service.schema(&database)?)?);
		},
		Command::Prompt => {
			service.load_cache()?;

			println!("{}", service.system_prompt()?);
		},
	}

	Ok(())
}

pub fn query_request(args: QueryArgs) -> color_eyre::Result<QueryRequest> {
	let filters = match &args.filters {
		Some(path) => {
			let raw = fs::read_to_string(path)
				.map_err(|err| eyre::eyre!("Failed to read filters at {path:?}: {err}."))?;

			serde_json::from_str::<Vec<FilterSpec>>(&raw)?
		},
		None => Vec::new(),
	};
	let sort = args
		.sort_property
		.map(|property| SortSpec { property, direction: args.direction.into() });

	Ok(QueryRequest { database: args.database, params: QueryParams { filters, sort } })
}

fn now_local() -> OffsetDateTime {
	OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn init_tracing(config: &notiq_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
