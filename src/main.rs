use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vault::metadata::{Enrichment, MetadataFetcherBuilder};
use vault::utils::ensure_database_directory;
use vault::{
    Config, ContentKind, Database, IngestRequest, Ingested, ItemFilter, ItemId, VaultError,
    VaultItem, VaultService, VaultStore,
};

/// vault - save links and notes, resurface them later
#[derive(Parser)]
#[command(name = "vault")]
#[command(about = "A personal content vault for links and notes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Save a link or text (type is auto-detected)
    Save(SaveCommand),
    /// Save a quick note, even if it looks like a URL
    Note(SaveCommand),
    /// List saved items
    List(ListCommand),
    /// Show one item as JSON
    Show { id: i64 },
    /// Resurface a random non-archived item
    Random,
    /// Pin an item
    Pin { id: i64 },
    /// Unpin an item
    Unpin { id: i64 },
    /// Archive an item
    Archive { id: i64 },
    /// Unarchive an item
    Unarchive { id: i64 },
    /// Delete an item
    Rm { id: i64 },
    /// List all tags
    Tags,
    /// Replace the tags of an item
    Tag {
        id: i64,
        /// Comma-separated tags; an empty string clears them
        #[arg(value_name = "TAGS")]
        tags: String,
    },
    /// Classify content and preview its metadata without saving
    Detect {
        #[arg(value_name = "CONTENT")]
        content: String,
    },
}

#[derive(Parser)]
struct SaveCommand {
    /// URL or text to save
    #[arg(value_name = "CONTENT")]
    content: String,

    /// Comma-separated tags
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    /// Display title
    #[arg(long)]
    title: Option<String>,

    /// Pin the item
    #[arg(short, long)]
    pin: bool,
}

#[derive(Parser)]
struct ListCommand {
    /// Only items of this type (note, article, tweet, tiktok, youtube)
    #[arg(short = 'k', long = "type", value_name = "TYPE")]
    kind: Option<ContentKind>,

    /// Only items with any of these comma-separated tags
    #[arg(long, value_name = "TAGS")]
    tags: Option<String>,

    /// Case-insensitive text search
    #[arg(short, long)]
    search: Option<String>,

    /// Only pinned items
    #[arg(long)]
    pinned: bool,

    /// Show archived items instead of active ones
    #[arg(long)]
    archived: bool,

    /// Maximum number of items
    #[arg(short, long, default_value_t = 0)]
    limit: i64,

    /// Items to skip
    #[arg(long, default_value_t = 0)]
    offset: i64,
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let result = open_service().and_then(|service| {
        let stdout = io::stdout();
        execute(&cli.command, &service, &mut stdout.lock())
    });

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vault=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Validation and not-found errors are the caller's; everything else is
/// internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<VaultError>()
        .is_some_and(VaultError::is_user_error)
}

fn open_service() -> Result<VaultService> {
    let config = Config::from_env().context("Invalid configuration")?;

    ensure_database_directory(&config.db_path)?;
    let db = Database::open(&config.db_path).context("Failed to open database")?;

    let fetcher = MetadataFetcherBuilder::new()
        .config(config.fetch)
        .build()
        .context("Failed to create HTTP client")?;

    Ok(VaultService::new(VaultStore::new(db), fetcher))
}

/// Runs one command against `service`, writing user-facing output to `out`.
///
/// Separated from `main` so commands can be tested against an in-memory
/// database.
fn execute(command: &Commands, service: &VaultService, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Save(cmd) => {
            let ingested = service.ingest(ingest_request(cmd))?;
            print_saved(out, &ingested)
        }
        Commands::Note(cmd) => {
            let ingested = service.ingest_note(ingest_request(cmd))?;
            writeln!(out, "Saved note [{}]", ingested.item.id)?;
            print_tag_line(out, &ingested.item)?;
            print_failed_tags(out, &ingested.failed_tags)
        }
        Commands::List(cmd) => {
            let items = service.list(&list_filter(cmd))?;
            print_list(out, &items)
        }
        Commands::Show { id } => {
            let item = service.get(ItemId::new(*id))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&item)?)?;
            Ok(())
        }
        Commands::Random => match service.resurface()? {
            Some(item) => print_resurfaced(out, &item),
            None => {
                writeln!(out, "No items in vault to resurface")?;
                Ok(())
            }
        },
        Commands::Pin { id } => {
            let item = service.set_pinned(ItemId::new(*id), true)?;
            writeln!(out, "Pinned [{}] {}", item.id, item.display_title())?;
            Ok(())
        }
        Commands::Unpin { id } => {
            let item = service.set_pinned(ItemId::new(*id), false)?;
            writeln!(out, "Unpinned [{}] {}", item.id, item.display_title())?;
            Ok(())
        }
        Commands::Archive { id } => {
            let item = service.set_archived(ItemId::new(*id), true)?;
            writeln!(out, "Archived [{}] {}", item.id, item.display_title())?;
            Ok(())
        }
        Commands::Unarchive { id } => {
            let item = service.set_archived(ItemId::new(*id), false)?;
            writeln!(out, "Unarchived [{}] {}", item.id, item.display_title())?;
            Ok(())
        }
        Commands::Rm { id } => {
            let id = ItemId::new(*id);
            let item = service.get(id)?;
            service.delete(id)?;
            writeln!(out, "Deleted [{}] {}", id, item.display_title())?;
            Ok(())
        }
        Commands::Tags => {
            let tags = service.tags_catalog()?;
            if tags.is_empty() {
                writeln!(out, "No tags yet")?;
                return Ok(());
            }
            writeln!(out, "\nTags:")?;
            for tag in &tags {
                writeln!(out, "  #{}", tag.name())?;
            }
            writeln!(out)?;
            Ok(())
        }
        Commands::Tag { id, tags } => {
            let names = parse_tags(tags);
            let updated = service.set_tags(ItemId::new(*id), &names)?;
            writeln!(
                out,
                "Updated tags for [{}]: {}",
                updated.item.id,
                updated.item.tag_names().join(", ")
            )?;
            print_failed_tags(out, &updated.failed_tags)
        }
        Commands::Detect { content } => {
            let detection = service.detect(content)?;
            writeln!(out, "Detected: {}", detection.kind)?;
            if detection.kind.is_link() {
                print_enrichment(out, &detection.enrichment)?;
            }
            Ok(())
        }
    }
}

fn ingest_request(cmd: &SaveCommand) -> IngestRequest {
    let mut request = IngestRequest::new(cmd.content.as_str())
        .tags(cmd.tags.as_deref().map(parse_tags).unwrap_or_default())
        .pinned(cmd.pin);
    if let Some(title) = &cmd.title {
        request = request.title(title.as_str());
    }
    request
}

fn list_filter(cmd: &ListCommand) -> ItemFilter {
    ItemFilter {
        kind: cmd.kind,
        tags: cmd.tags.as_deref().map(parse_tags).unwrap_or_default(),
        pinned: cmd.pinned.then_some(true),
        archived: Some(cmd.archived),
        search: cmd.search.clone(),
        limit: cmd.limit,
        offset: cmd.offset,
    }
}

/// Short type marker shown in listings.
fn kind_icon(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Tweet => "[X]",
        ContentKind::TikTok => "[TT]",
        ContentKind::YouTube => "[YT]",
        ContentKind::Article => "[ART]",
        ContentKind::Note => "[NOTE]",
    }
}

fn hashtags(item: &VaultItem) -> String {
    item.tags
        .iter()
        .map(|tag| format!("#{}", tag.name()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_saved(out: &mut impl Write, ingested: &Ingested) -> Result<()> {
    let item = &ingested.item;
    writeln!(out, "Saved [{}] {}", item.id, item.kind)?;
    if let Some(title) = &item.metadata.title {
        writeln!(out, "  {title}")?;
    }
    if let Some(author) = &item.metadata.author {
        writeln!(out, "  by {author}")?;
    }
    print_tag_line(out, item)?;
    if item.pinned {
        writeln!(out, "  Pinned")?;
    }
    if let Some(reason) = &ingested.enrichment.degradation {
        writeln!(out, "  Metadata incomplete: {reason}")?;
    }
    print_failed_tags(out, &ingested.failed_tags)
}

fn print_tag_line(out: &mut impl Write, item: &VaultItem) -> Result<()> {
    if !item.tags.is_empty() {
        writeln!(out, "  Tags: {}", item.tag_names().join(", "))?;
    }
    Ok(())
}

fn print_failed_tags(out: &mut impl Write, failed: &[String]) -> Result<()> {
    if !failed.is_empty() {
        writeln!(out, "  Could not attach tags: {}", failed.join(", "))?;
    }
    Ok(())
}

fn print_list(out: &mut impl Write, items: &[VaultItem]) -> Result<()> {
    if items.is_empty() {
        writeln!(out, "No items in vault. Save something with: vault save <url>")?;
        return Ok(());
    }

    writeln!(out)?;
    for item in items {
        let pin = if item.pinned { " [pinned]" } else { "" };
        writeln!(
            out,
            "  {} {}. {}{}",
            kind_icon(item.kind),
            item.id,
            item.display_title(),
            pin
        )?;
        if !item.tags.is_empty() {
            writeln!(out, "     {}", hashtags(item))?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn print_resurfaced(out: &mut impl Write, item: &VaultItem) -> Result<()> {
    writeln!(out, "\nFrom your vault:")?;
    writeln!(out, "  {} {}", kind_icon(item.kind), item.display_title())?;
    if let Some(author) = &item.metadata.author {
        writeln!(out, "     by {author}")?;
    }
    if let Some(url) = &item.source_url {
        writeln!(out, "     {url}")?;
    }
    if !item.tags.is_empty() {
        writeln!(out, "     {}", hashtags(item))?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_enrichment(out: &mut impl Write, enrichment: &Enrichment) -> Result<()> {
    let meta = &enrichment.metadata;
    let fields = [
        ("Title", &meta.title),
        ("Description", &meta.description),
        ("Thumbnail", &meta.thumbnail),
        ("Author", &meta.author),
        ("Site", &meta.site_name),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            writeln!(out, "  {label}: {value}")?;
        }
    }
    if let Some(reason) = &enrichment.degradation {
        writeln!(out, "  Metadata incomplete: {reason}")?;
    }
    Ok(())
}

/// Parses comma-separated tags from a string.
///
/// Splits on commas, trims whitespace from each tag, and filters out empty strings.
fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
