use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::Input;
use humansize::{DECIMAL, format_size};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use thumb_grabber::{
    Action, AssetSource, CachedMetadataProvider, DEFAULT_CACHE_NAME, DEFAULT_CDN_BASE,
    DEFAULT_METADATA_ENDPOINT, DEFAULT_NAME_FORMAT, DisplayState, DownloadOutcome, ERROR_MESSAGE,
    GrabberConfig, HttpAssetNetwork, HttpImageFetcher, MetadataProvider, NoEmbedProvider,
    OfflineCache, ProgressEvent, QUALITY_VARIANTS, Session, SystemOpener, VideoId, VideoMetadata,
    action_for, candidates_with_base, download_thumbnails, grab_thumbnails, install_offline_cache,
    parse_event, render, render_cards, render_event_json, render_metadata_panel, save_candidates,
};

#[derive(Parser)]
#[command(
    name = "thumb-grabber",
    version,
    about = "Grab the thumbnails of a video in every available quality"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the oEmbed metadata service
    #[arg(long, global = true, default_value = DEFAULT_METADATA_ENDPOINT)]
    metadata_endpoint: String,

    /// Base path of the thumbnail CDN
    #[arg(long, global = true, default_value = DEFAULT_CDN_BASE)]
    cdn_base: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List the thumbnails of a video
    Show {
        /// Video URL
        url: String,

        /// Print one JSON object per line as results arrive
        #[arg(long)]
        json: bool,

        /// Skip the title lookup
        #[arg(long)]
        no_metadata: bool,
    },

    /// Save thumbnails of a video to disk
    Download {
        /// Video URL
        url: String,

        /// Which quality to save
        #[arg(short, long, value_enum, default_value_t = QualityArg::All)]
        quality: QualityArg,

        /// Target directory (defaults to your download folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Filename format; placeholders: {id}, {quality}, {title}, {ext}
        #[arg(long, default_value = DEFAULT_NAME_FORMAT)]
        name_format: String,

        /// Skip the title lookup
        #[arg(long)]
        no_metadata: bool,
    },

    /// Paste URLs one after another and pick thumbnails to save
    Interactive {
        /// Target directory (defaults to your download folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the title lookup
        #[arg(long)]
        no_metadata: bool,
    },

    /// Manage the offline asset cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Store the core assets of ORIGIN in the cache
    Install {
        /// Origin serving the assets, e.g. http://localhost:8000
        #[arg(long)]
        origin: String,

        /// Cache name
        #[arg(long, default_value = DEFAULT_CACHE_NAME)]
        name: String,
    },

    /// Print an asset, from the cache when present
    Get {
        /// Asset path, e.g. /style.css
        path: String,

        /// Origin used on a cache miss
        #[arg(long)]
        origin: String,

        /// Cache name
        #[arg(long, default_value = DEFAULT_CACHE_NAME)]
        name: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QualityArg {
    Max,
    Standard,
    High,
    Medium,
    All,
}

impl QualityArg {
    /// Candidate indices in catalog order
    fn indices(self) -> Vec<usize> {
        let suffix = match self {
            QualityArg::Max => "maxresdefault",
            QualityArg::Standard => "sddefault",
            QualityArg::High => "hqdefault",
            QualityArg::Medium => "mqdefault",
            QualityArg::All => return (0..QUALITY_VARIANTS.len()).collect(),
        };

        QUALITY_VARIANTS
            .iter()
            .position(|v| v.suffix == suffix)
            .into_iter()
            .collect()
    }
}

const INTERACTIVE_HELP: &str = "\
Paste a video URL and press Enter to list its thumbnails.
  d <n>, download <n>   save thumbnail number <n>
  ?, help               show this help
  q, quit               leave";

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::InvalidInput { .. } => {
            eprintln!("Error: {}", ERROR_MESSAGE);
        }
        ProgressEvent::CandidatesReady { id, candidates } => {
            println!("Thumbnails for {}:\n", id);
            print!("{}", render_cards(&candidates));
        }
        ProgressEvent::MetadataReady { metadata, .. } => {
            println!();
            print!("{}", render_metadata_panel(&metadata, None));
        }
        ProgressEvent::Downloading { index, total, url } => {
            println!("[{}/{}] Downloading {}", index + 1, total, url);
        }
        ProgressEvent::Downloaded { outcome } => print_outcome(&outcome),
    }
}

fn print_outcome(outcome: &DownloadOutcome) {
    match outcome {
        DownloadOutcome::Saved { path, bytes } => {
            println!("  Saved {} ({})", path.display(), format_size(*bytes, DECIMAL));
        }
        DownloadOutcome::OpenedExternally { url } => {
            println!("  Could not save the image, opened {} instead", url);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "warn,thumb_grabber=debug"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .init();
}

fn metadata_provider(config: &GrabberConfig, no_metadata: bool) -> Option<NoEmbedProvider> {
    (!no_metadata).then(|| NoEmbedProvider::with_base_url(&config.metadata_endpoint))
}

/// Prints an event as a JSON line, candidates before metadata
fn print_event_json(event: ProgressEvent) {
    match render_event_json(&event) {
        Ok(line) => println!("{}", line),
        Err(e) => log::error!("Failed to serialize progress event: {}", e),
    }
}

fn run_show(config: &GrabberConfig, url: &str, json: bool, no_metadata: bool) -> i32 {
    let provider = metadata_provider(config, no_metadata);
    let provider = provider.as_ref().map(|p| p as &dyn MetadataProvider);

    let state = if json {
        grab_thumbnails(url, config, provider, print_event_json)
    } else {
        grab_thumbnails(url, config, provider, handle_progress_event)
    };

    if state.display() == DisplayState::Error { 1 } else { 0 }
}

fn run_download(config: &GrabberConfig, url: &str, quality: QualityArg, no_metadata: bool) -> i32 {
    let provider = metadata_provider(config, no_metadata);
    let provider = provider.as_ref().map(|p| p as &dyn MetadataProvider);

    let (state, outcomes) = download_thumbnails(
        url,
        config,
        provider,
        &quality.indices(),
        &HttpImageFetcher::new(),
        &SystemOpener,
        |event| {
            if let ProgressEvent::Downloading { index: 0, .. } = event {
                println!("\nSaving to {}", config.output_dir.display());
            }
            handle_progress_event(event);
        },
    );

    if state.display() == DisplayState::Error {
        return 1;
    }

    let saved = outcomes
        .iter()
        .filter(|o| matches!(o, DownloadOutcome::Saved { .. }))
        .count();
    println!("\nSaved {} of {} thumbnail(s).", saved, outcomes.len());

    0
}

fn run_interactive(config: &GrabberConfig, no_metadata: bool) -> i32 {
    // Resubmitting a URL reuses the earlier lookup
    let provider = metadata_provider(config, no_metadata)
        .map(|p| Arc::new(CachedMetadataProvider::new(p)) as Arc<dyn MetadataProvider>);
    let cdn_base = config.cdn_base.clone();
    let show_panel = move |id: &VideoId, metadata: &VideoMetadata| {
        let candidates = candidates_with_base(id, &cdn_base);
        print!("\n{}", render_metadata_panel(metadata, candidates.first()));
    };
    let mut session = Session::new(provider, &config.cdn_base).on_metadata(show_panel);
    let fetcher = HttpImageFetcher::new();

    print!("{}", render(session.state()));
    println!("Type 'help' for commands.\n");

    loop {
        // The listener already printed the panel; this keeps titles current for saving
        session.poll_metadata();

        let line = match Input::<String>::new()
            .with_prompt("Video URL")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error: cannot read input: {}", e);
                return 1;
            }
        };

        let Some(action) = action_for(&parse_event(&line)) else {
            println!("Unknown command. Type 'help' for commands.");
            continue;
        };

        match action {
            Action::ProcessUrl(url) => {
                let state = session.submit(&url);
                println!();
                print!("{}", render(state));
                if session.pending_lookups() > 0 {
                    println!("(looking up the title in the background)");
                }
            }
            Action::Download(index) => {
                if session.candidate(index).is_none() {
                    println!("There is no thumbnail number {}.", index + 1);
                    continue;
                }

                save_candidates(
                    session.state(),
                    &[index],
                    config,
                    &fetcher,
                    &SystemOpener,
                    handle_progress_event,
                );
            }
            Action::ShowHelp => println!("{}", INTERACTIVE_HELP),
            Action::Quit => return 0,
        }
    }
}

fn run_cache(config: &GrabberConfig, action: CacheCommand) -> i32 {
    let network = HttpAssetNetwork::new();

    match action {
        CacheCommand::Install { origin, name } => {
            let config = GrabberConfig {
                cache_name: name,
                ..config.clone()
            };

            match install_offline_cache(&config, &network, &origin) {
                Ok(count) => {
                    println!("Cached {} asset(s) in '{}'.", count, config.cache_name);
                    if let Ok(cache) = OfflineCache::open(&config.cache_name) {
                        println!("Location: {}", cache.location().display());
                    }
                    0
                }
                Err(e) => {
                    log::error!("Offline cache registration failed: {}", e);
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        CacheCommand::Get { path, origin, name } => {
            let cache = match OfflineCache::open(&name) {
                Ok(cache) => cache,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            };

            match cache.respond(&network, &origin, &path) {
                Ok((asset, source)) => {
                    let source = match source {
                        AssetSource::Cache => "cache",
                        AssetSource::Network => "network",
                    };
                    eprintln!("Served {} from {}", asset.path, source);
                    print!("{}", asset.body);
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = GrabberConfig {
        cdn_base: cli.cdn_base,
        metadata_endpoint: cli.metadata_endpoint,
        ..GrabberConfig::default()
    };

    let code = match cli.command.unwrap_or(Commands::Interactive {
        output: None,
        no_metadata: false,
    }) {
        Commands::Show {
            url,
            json,
            no_metadata,
        } => run_show(&config, url.trim(), json, no_metadata),
        Commands::Download {
            url,
            quality,
            output,
            name_format,
            no_metadata,
        } => {
            if let Some(output) = output {
                config.output_dir = output;
            }
            config.name_format = name_format;

            if let Err(e) = config.validate() {
                eprintln!("Error: {}", e);
                process::exit(1);
            }

            run_download(&config, url.trim(), quality, no_metadata)
        }
        Commands::Interactive {
            output,
            no_metadata,
        } => {
            if let Some(output) = output {
                config.output_dir = output;
            }
            run_interactive(&config, no_metadata)
        }
        Commands::Cache { action } => run_cache(&config, action),
    };

    process::exit(code);
}
