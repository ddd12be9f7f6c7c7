//! `threatx` — command-line front end for the threat-exchange graph API.
//!
//! # Usage
//!
//! ```
//! export TX_ACCESS_TOKEN=...
//! threatx --tagged-since -1day tag-to-details media_type_video
//! threatx ids-to-details 4036655176350945 < more-ids.txt
//! threatx submit --field indicator=evil.example --field type=DOMAIN ...
//! threatx update --stdin --dry-run < edits.jsonl
//! ```
//!
//! Settings come from `threatx.toml` (or `--config`), then `THREATX_*`
//! environment variables, then flags.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use commands::Session;
use settings::CliSettings;
use threatx_client::{QueryOptions, ThreatExchangeClient, WriteOptions};
use threatx_core::{
  time::parse_time_expression, validate::MutationKind, window::CreatedWindow,
};
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "threatx", version, about = "Query and edit threat descriptors")]
struct Cli {
  /// Path to a TOML settings file.
  #[arg(short, long, value_name = "FILE", default_value = "threatx.toml")]
  config: PathBuf,

  /// Graph API root, e.g. https://graph.facebook.com/v6.0.
  #[arg(long)]
  base_url: Option<String>,

  /// Environment variable holding the access token.
  #[arg(long, value_name = "VAR")]
  token_env: Option<String>,

  /// Log every item and per-page counts.
  #[arg(short, long)]
  verbose: bool,

  /// Log each request URL (token redacted).
  #[arg(short = 's', long)]
  show_urls: bool,

  /// Strip indicator text from output.
  #[arg(long)]
  no_print_indicator: bool,

  #[arg(long)]
  page_size: Option<u32>,

  /// Epoch seconds, a timestamp, or a relative offset like -3days.
  #[arg(long, value_name = "WHEN", allow_hyphen_values = true)]
  tagged_since: Option<String>,

  #[arg(long, value_name = "WHEN", allow_hyphen_values = true)]
  tagged_until: Option<String>,

  /// Only print descriptors added at or after this time.
  #[arg(long, value_name = "WHEN", allow_hyphen_values = true)]
  created_since: Option<String>,

  /// Only print descriptors added at or before this time.
  #[arg(long, value_name = "WHEN", allow_hyphen_values = true)]
  created_until: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the ids of descriptors carrying a tag.
  TagToIds { tag: String },
  /// Print details for ids given as arguments, or one per line on stdin.
  IdsToDetails { ids: Vec<String> },
  /// Print details for every descriptor carrying a tag.
  TagToDetails { tag: String },
  /// Search descriptors with raw query parameters.
  Search {
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    params: Vec<(String, String)>,
  },
  /// Create a descriptor.
  Submit(MutationArgs),
  /// Edit an existing descriptor.
  Update(MutationArgs),
  /// Create a descriptor seeded from an existing one.
  Copy(MutationArgs),
}

#[derive(Args, Debug)]
struct MutationArgs {
  /// A post field, e.g. `status=MALICIOUS`. Repeatable.
  #[arg(long = "field", value_name = "KEY=VALUE")]
  fields: Vec<String>,

  /// Read one JSON object of post fields per line from stdin.
  #[arg(long, conflicts_with = "fields")]
  stdin: bool,

  /// Show what would be posted without posting it.
  #[arg(long)]
  dry_run: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
  s.split_once('=')
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .ok_or_else(|| format!("expected KEY=VALUE, got \"{s}\""))
}

/// Resolve a time flag, warning about and dropping values that do not parse.
fn resolve_time(flag: &str, value: Option<&str>) -> Option<i64> {
  let value = value?;
  let resolved = parse_time_expression(value);
  if resolved.is_none() {
    warn!(flag, value, "could not parse time expression; ignoring");
  }
  resolved
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Flags override the settings file and environment.
  let mut settings = CliSettings::load(&cli.config)?;
  if let Some(base_url) = cli.base_url {
    settings.base_url = base_url;
  }
  if let Some(token_env) = cli.token_env {
    settings.token_env = token_env;
  }
  if let Some(page_size) = cli.page_size {
    settings.page_size = page_size;
  }

  let client = ThreatExchangeClient::new(settings.client_config()?)
    .context("failed to build HTTP client")?;

  let session = Session {
    client,
    query: QueryOptions {
      page_size: settings.page_size,
      tagged_since: resolve_time("--tagged-since", cli.tagged_since.as_deref()),
      tagged_until: resolve_time("--tagged-until", cli.tagged_until.as_deref()),
      include_indicator_in_output: !cli.no_print_indicator,
      verbose: cli.verbose,
      show_urls: cli.show_urls,
    },
    created: CreatedWindow {
      since: resolve_time("--created-since", cli.created_since.as_deref()),
      until: resolve_time("--created-until", cli.created_until.as_deref()),
    },
  };

  let (kind, args) = match cli.command {
    Command::TagToIds { tag } => return commands::tag_to_ids(&session, &tag).await,
    Command::IdsToDetails { ids } => return commands::ids_to_details(&session, ids).await,
    Command::TagToDetails { tag } => {
      return commands::tag_to_details(&session, &tag).await;
    }
    Command::Search { params } => return commands::search(&session, &params).await,
    Command::Submit(args) => (MutationKind::Submit, args),
    Command::Update(args) => (MutationKind::Update, args),
    Command::Copy(args) => (MutationKind::Copy, args),
  };

  let opts = WriteOptions { dry_run: args.dry_run, show_urls: cli.show_urls };
  commands::mutate(&session, kind, &args.fields, args.stdin, opts).await
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() { Cli::command().debug_assert(); }

  #[test]
  fn relative_time_flags_are_accepted() {
    let cli = Cli::try_parse_from([
      "threatx",
      "--tagged-since",
      "-1week",
      "--created-until",
      "2020-06-08T14:27:53Z",
      "tag-to-ids",
      "media_type_video",
    ])
    .unwrap();
    assert_eq!(cli.tagged_since.as_deref(), Some("-1week"));
    assert!(matches!(cli.command, Command::TagToIds { ref tag } if tag == "media_type_video"));
  }

  #[test]
  fn mutation_flags_parse() {
    let cli = Cli::try_parse_from([
      "threatx",
      "update",
      "--field",
      "descriptor_id=12",
      "--field",
      "status=UNKNOWN",
      "--dry-run",
    ])
    .unwrap();
    let Command::Update(args) = cli.command else { panic!("expected update") };
    assert_eq!(args.fields, vec!["descriptor_id=12", "status=UNKNOWN"]);
    assert!(args.dry_run);
    assert!(!args.stdin);
  }

  #[test]
  fn search_params_need_an_equals_sign() {
    assert!(Cli::try_parse_from(["threatx", "search", "--param", "text"]).is_err());
  }

  #[test]
  fn unparseable_time_is_dropped() {
    assert_eq!(resolve_time("--tagged-since", Some("nonesuch")), None);
    assert_eq!(resolve_time("--tagged-since", Some("1591626448")), Some(1591626448));
    assert_eq!(resolve_time("--tagged-since", None), None);
  }
}
