use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ora2tsql::config::{
	CONFIG_FILE_NAME, discover_configs, init_template, load_merged_config, merge_configs,
	user_config_path,
};
use ora2tsql::qa::run_checklist;
use ora2tsql::sqlfile::{is_sql_file, read_sql_file, write_sql_file};
use ora2tsql::{Converter, Direction, Warning};

/// Environment variable holding an env_logger filter, e.g. `ora2tsql=debug`.
const LOG_ENV: &str = "ORA2TSQL_LOG";

#[derive(Parser)]
#[command(name = "ora2tsql")]
#[command(
	author,
	version,
	about = "CLI tool for rewriting Oracle SELECT queries as T-SQL (Azure SQL / SQL Server) and back"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// SQL query to convert
	#[arg(short, long, value_name = "SQL", conflicts_with = "file")]
	query: Option<String>,

	/// File containing the query to convert (`-` reads stdin)
	#[arg(short, long, value_name = "PATH")]
	file: Option<PathBuf>,

	/// Write the converted query to this file instead of stdout
	#[arg(short, long, value_name = "PATH")]
	output: Option<PathBuf>,

	/// Convert T-SQL to Oracle instead of Oracle to T-SQL
	#[arg(short, long)]
	reverse: bool,

	/// Do not print conversion warnings
	#[arg(long)]
	no_warnings: bool,

	/// Run the QA checklist on the converted query (exit code 1 on FAIL)
	#[arg(long, conflicts_with = "reverse")]
	check: bool,

	/// Ignore .ora2tsql.toml configuration files
	#[arg(long)]
	no_config: bool,

	/// Log each rule that rewrites the query
	#[arg(short, long)]
	verbose: bool,

	/// Create a template .ora2tsql.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .ora2tsql.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the configuration files in cascade order
	Show,
	/// Check all config files for errors without converting anything
	Validate,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	if cli.init {
		return handle_init(cli.force);
	}

	if let Some(command) = cli.command {
		return match command {
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(),
				ConfigAction::Validate => handle_config_validate(),
			},
		};
	}

	handle_convert(&cli)
}

fn init_logging(verbose: bool) {
	let level = if verbose { "debug" } else { "warn" };
	env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, level))
		.format_timestamp(None)
		.init();
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let configs = discover_configs(&cwd).context("Failed to discover config files")?;

	if configs.is_empty() {
		println!("No configuration files found.");
	} else {
		println!("Configuration files (in cascade order):\n");
	}

	for loaded in &configs {
		let config = &loaded.config;
		println!("# Source: {}", loaded.path.display());
		println!("# root: {}", config.root);
		if let Some(ref placeholder) = config.source_table_placeholder {
			println!("# source-table-placeholder: {placeholder}");
		}
		if !config.suppress_warnings.is_empty() {
			let categories: Vec<_> = config.suppress_warnings.iter().map(|c| c.as_str()).collect();
			println!("# suppress-warnings: {}", categories.join(", "));
		}
		println!("# rules: {}", config.rules.len());
		println!();

		for (i, rule) in config.rules.iter().enumerate() {
			println!("  Rule {}: {}", i + 1, rule.display_name());
			if let Some(direction) = rule.direction {
				println!("    direction: {direction}");
			}
			if let Some(ref substitution) = rule.substitution {
				println!("    substitution: {substitution}");
			}
			if let Some(ref detect) = rule.detect {
				println!("    detect: {detect}");
			}
			if let Some(ref warning) = rule.warning {
				println!("    warning: {warning}");
			}
			println!();
		}
	}

	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	// Regexes are only checked once the rules are compiled.
	let checked = discover_configs(&cwd).and_then(|configs| {
		Converter::from_config(&merge_configs(&configs))?;
		Ok(configs)
	});

	match checked {
		Ok(configs) => {
			if configs.is_empty() {
				println!("No configuration files found.");
			} else {
				println!("All configuration files are valid:");
				for loaded in &configs {
					println!(
						"  {} ({} rules)",
						loaded.path.display(),
						loaded.config.rules.len()
					);
				}
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {e}");
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_convert(cli: &Cli) -> Result<ExitCode> {
	let query = read_query(cli)?;

	let converter = if cli.no_config {
		Converter::new()
	} else {
		let cwd = std::env::current_dir().context("Failed to get current directory")?;
		let config = load_merged_config(&cwd).context("Failed to load configuration")?;
		Converter::from_config(&config).context("Failed to compile rules")?
	};

	let direction = if cli.reverse {
		Direction::TsqlToOracle
	} else {
		Direction::OracleToTsql
	};
	let (converted, warnings) = converter.convert(&query, direction).into_parts();
	let show_warnings = !warnings.is_empty() && !cli.no_warnings;

	if show_warnings {
		print_warnings(&warnings);
	}

	match cli.output {
		Some(ref path) => {
			if !is_sql_file(path) {
				log::warn!("Output file {} does not end in .sql", path.display());
			}
			write_sql_file(path, &converted)
				.with_context(|| format!("Failed to write {}", path.display()))?;
			println!("Conversion complete. Output written to: {}", path.display());
			if show_warnings {
				println!("{} warning(s) generated.", warnings.len());
			}
		}
		None => {
			if show_warnings {
				print_banner("CONVERTED QUERY");
			}
			println!("{converted}");
		}
	}

	if cli.check {
		let report = run_checklist(&converted, &warnings, converter.source_table_placeholder());
		println!();
		println!("{report}");
		if !report.overall_pass() {
			return Ok(ExitCode::FAILURE);
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn read_query(cli: &Cli) -> Result<String> {
	if let Some(ref query) = cli.query {
		return Ok(query.clone());
	}

	match cli.file.as_deref() {
		Some(path) if path == Path::new("-") => {
			let mut query = String::new();
			std::io::stdin()
				.read_to_string(&mut query)
				.context("Failed to read query from stdin")?;
			Ok(query)
		}
		Some(path) => {
			read_sql_file(path).with_context(|| format!("Failed to read {}", path.display()))
		}
		None => anyhow::bail!("No query given. Use --query <SQL> or --file <PATH>."),
	}
}

fn print_banner(title: &str) {
	let rule = "=".repeat(70);
	println!("{rule}");
	println!("{title}");
	println!("{rule}");
}

fn print_warnings(warnings: &[Warning]) {
	print_banner("CONVERSION WARNINGS");
	for warning in warnings {
		println!("{warning}");
	}
	println!();
}
