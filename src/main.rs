use album_browser::{config, output, scan, thumbnail::ThumbnailService};
use clap::{Parser, Subcommand};
use std::path::{PathBuf, absolute};

/// Shared flag for commands that can emit the host-boundary JSON.
#[derive(clap::Args, Clone)]
struct JsonArgs {
    /// Print the JSON response instead of the text summary
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
#[command(name = "album-browser")]
#[command(about = "Browse photo folders and cache their thumbnails")]
#[command(long_about = "\
Browse photo folders and cache their thumbnails

Directories are classified one level at a time, without walking whole trees:

  Trip/              album   images, no subdirectories
  Travel/            folder  has subdirectories (image count is estimated)
  scans/             empty   neither

Thumbnails are generated on demand into a per-user cache directory and
expire after `ttl_days`. Run 'album-browser gen-config' to generate a
documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Thumbnail cache directory, overriding the config
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify the entries of one directory level
    Scan {
        path: PathBuf,
        #[command(flatten)]
        json: JsonArgs,
    },
    /// Show the directory tree used by the navigation panel
    Tree {
        path: PathBuf,
        /// Levels below the root to list
        #[arg(long, default_value_t = scan::DEFAULT_TREE_DEPTH)]
        depth: usize,
    },
    /// List every image in an album
    Images {
        album: PathBuf,
        #[command(flatten)]
        json: JsonArgs,
    },
    /// Generate (or fetch from cache) one thumbnail
    Thumbnail {
        image: PathBuf,
        #[arg(long, default_value_t = 300)]
        width: u32,
        #[arg(long, default_value_t = 300)]
        height: u32,
    },
    /// Prefetch grid thumbnails at the configured resolution
    Batch {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Delete every cached thumbnail
    ClearCache,
    /// Apply the TTL and size limits to the cache now
    Sweep,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut app_config = config::load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.cache_dir {
        app_config.cache.dir = Some(dir);
    }
    init_thread_pool(&app_config.processing);

    match cli.command {
        Command::Scan { path, json } => {
            let limits = scan::ScanLimits::from(&app_config.scan);
            let response = scan::scan_level(&absolute(&path)?, &limits);
            if json.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                output::print_navigation(&response);
            }
        }
        Command::Tree { path, depth } => {
            let root = absolute(&path)?;
            let entries = scan::scan_tree(&root, depth);
            output::print_tree(&root, &entries);
        }
        Command::Images { album, json } => {
            let album = absolute(&album)?;
            let images = scan::list_album_images(&album);
            if json.json {
                println!("{}", serde_json::to_string_pretty(&images)?);
            } else {
                output::print_album_images(&album, &images);
            }
        }
        Command::Thumbnail {
            image,
            width,
            height,
        } => {
            let service = ThumbnailService::new(&app_config)?;
            let image = absolute(&image)?;
            let thumbnail = service.get_thumbnail(&image, width, height);
            output::print_thumbnail(&image, thumbnail.as_ref());
        }
        Command::Batch { images } => {
            let service = ThumbnailService::new(&app_config)?;
            let images = images
                .iter()
                .map(absolute)
                .collect::<Result<Vec<_>, _>>()?;
            let results = service.get_batch_thumbnails(&images);
            output::print_batch(&results);
        }
        Command::ClearCache => {
            let service = ThumbnailService::new(&app_config)?;
            let outcome = service.clear_cache();
            output::print_clear(service.cache_dir(), &outcome);
        }
        Command::Sweep => {
            let service = ThumbnailService::new(&app_config)?;
            let report = service.run_maintenance()?;
            output::print_sweep(service.cache_dir(), &report);
        }
        Command::GenConfig => unreachable!("handled before config loading"),
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
