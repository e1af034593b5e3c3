use clap::{Parser, Subcommand};
use lazy_gal::discover::DiscoverOptions;
use lazy_gal::store::DirStore;
use lazy_gal::types::LogicalPhoto;
use lazy_gal::{compress, config, discover, output};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // leaked once; the version string lives as long as the process
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "lazy-gal")]
#[command(about = "Asset toolkit for static photo gallery sites")]
#[command(long_about = "\
Asset toolkit for static photo gallery sites

The photo directory doubles as the static host's docroot. Galleries are
plain folders of sequentially numbered images; the site discovers them at
runtime by probing, so publishing a photo is just dropping a file in:

  photos/
  ├── photos.toml                  # Config (optional): categories, ceilings
  ├── venue/
  │   ├── image1.jpg
  │   ├── image2.png               # Mixed extensions are fine
  │   └── image3.jpg               # Numbering must be contiguous from 1
  └── ceremony/
      └── image1.jpg

'compress' prepares photos for publishing: shrinks them to display size,
re-encodes the JPEGs, and writes a WebP sibling next to each one so capable
browsers get the smaller variant.

'discover' probes a docroot exactly the way the site will and lists what
each configured gallery would show. Use it to check numbering gaps before
deploying.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Shrink and re-encode photos, writing WebP siblings
    Compress(CompressArgs),
    /// Probe a docroot the way the site will and list what galleries see
    Discover(DiscoverArgs),
}

#[derive(clap::Args)]
struct CompressArgs {
    /// Directory of source photos
    input: PathBuf,

    /// Output directory (ignored with --replace)
    #[arg(long, default_value = "photos-compressed")]
    output: PathBuf,

    /// Overwrite source files in place
    #[arg(long)]
    replace: bool,

    /// JPEG re-encode quality, 1-100 (default from photos.toml)
    #[arg(long)]
    quality: Option<u8>,

    /// Bounding box width (default from photos.toml)
    #[arg(long)]
    max_width: Option<u32>,

    /// Bounding box height (default from photos.toml)
    #[arg(long)]
    max_height: Option<u32>,

    /// Skip WebP siblings
    #[arg(long)]
    no_webp: bool,
}

#[derive(clap::Args)]
struct DiscoverArgs {
    /// Docroot the static host serves
    docroot: PathBuf,

    /// Probe a single ad-hoc prefix instead of the configured categories
    #[arg(long)]
    prefix: Option<String>,

    /// Probe ceiling for --prefix (default from photos.toml)
    #[arg(long)]
    ceiling: Option<u32>,

    /// Emit JSON instead of the human listing
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Compress(args) => {
            let file_config = config::load_config(&args.input)?;
            let compress_config = compress::CompressConfig {
                quality: args.quality.unwrap_or(file_config.compression.quality),
                max_width: args.max_width.unwrap_or(file_config.compression.max_width),
                max_height: args
                    .max_height
                    .unwrap_or(file_config.compression.max_height),
                webp_siblings: !args.no_webp,
                replace: args.replace,
            };
            let report = compress::compress_dir(&args.input, &args.output, &compress_config)?;
            output::print_compress_report(&report);
        }
        Command::Discover(args) => {
            let file_config = config::load_config(&args.docroot)?;
            let store = DirStore::new(&args.docroot);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;

            let results: Vec<(String, Vec<LogicalPhoto>)> = runtime.block_on(async {
                let mut results = Vec::new();
                if let Some(prefix) = &args.prefix {
                    let options = DiscoverOptions {
                        ceiling: args.ceiling.unwrap_or(file_config.discovery.ceiling),
                    };
                    let photos =
                        discover::discover(&store, prefix, &options, |i| format!("Photo {i}"))
                            .await;
                    results.push((prefix.clone(), photos));
                } else {
                    for (name, category) in &file_config.discovery.categories {
                        let options = DiscoverOptions {
                            ceiling: category.ceiling.unwrap_or(file_config.discovery.ceiling),
                        };
                        let photos = discover::discover(&store, &category.prefix, &options, |i| {
                            format!("{name} {i}")
                        })
                        .await;
                        results.push((name.clone(), photos));
                    }
                }
                results
            });

            if results.is_empty() {
                eprintln!(
                    "No categories configured. Add [discovery.categories.*] to photos.toml \
                     or pass --prefix."
                );
            } else if args.json {
                let by_category: BTreeMap<&str, &Vec<LogicalPhoto>> = results
                    .iter()
                    .map(|(name, photos)| (name.as_str(), photos))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&by_category)?);
            } else {
                output::print_discovery(&results);
            }
        }
    }

    Ok(())
}

/// Route library diagnostics to stderr: warnings by default, probe traces
/// with `RUST_LOG=lazy_gal=debug`.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lazy_gal=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
