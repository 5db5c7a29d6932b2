use blog_manifest::{config, output, pipeline, scan};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Shared flags for commands that run the pipeline.
#[derive(clap::Args, Clone)]
struct PublishArgs {
    /// Include posts marked `draft: true`
    #[arg(long)]
    drafts: bool,

    /// Include posts whose publish date is after the build time
    #[arg(long)]
    future: bool,

    /// Include posts whose expiry date has passed
    #[arg(long)]
    expired: bool,

    /// Evaluate publication as of this time instead of now
    #[arg(long, value_name = "TIMESTAMP")]
    build_time: Option<String>,
}

#[derive(Parser)]
#[command(name = "blog-manifest")]
#[command(about = "Turn a directory of Markdown posts into a site manifest")]
#[command(long_about = "\
Turn a directory of Markdown posts into a site manifest

Every .md file under the content root is a post. Its metadata lives in a
front matter header, YAML between --- lines or TOML between +++ lines:

  ---
  title: Azure Landing Zones
  date: 2024-05-10
  tags: [azure, bicep]
  series: azure-landing-zones
  ---
  Post body in Markdown.

Required: title, date. Optional: publishdate, lastmod, expirydate, draft,
slug, summary, tags, categories, series, series_order. Anything else is
passed through to the manifest untouched.

Content structure:

  content/
  ├── config.toml          # Site config (optional)
  ├── about.md             # id: about.md
  ├── posts/
  │   ├── first-post.md    # id: posts/first-post.md
  │   └── _index.md        # Leading underscore = skipped
  └── .drafts/             # Hidden = skipped

Run 'blog-manifest gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the manifest and write it to <output>/manifest.json
    Build(PublishArgs),
    /// Validate content without writing anything
    Check(PublishArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build(args) => {
            println!("==> Building {}", cli.source.display());
            let Some(report) = run(&cli.source, &args)? else {
                return Ok(ExitCode::FAILURE);
            };
            std::fs::create_dir_all(&cli.output)?;
            let manifest_path = cli.output.join("manifest.json");
            std::fs::write(&manifest_path, report.manifest.to_json()?)?;
            output::print_build_report(&report);
            println!(
                "==> Wrote {} ({})",
                manifest_path.display(),
                report.manifest.fingerprint()?
            );
            Ok(exit_code(&report))
        }
        Command::Check(args) => {
            println!("==> Checking {}", cli.source.display());
            let Some(report) = run(&cli.source, &args)? else {
                return Ok(ExitCode::FAILURE);
            };
            output::print_build_report(&report);
            if report.is_clean() {
                println!("==> Content is valid");
            }
            Ok(exit_code(&report))
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load config, apply CLI overrides, scan, and build.
///
/// Returns `Ok(None)` after printing a whole-build failure.
fn run(
    source: &Path,
    args: &PublishArgs,
) -> Result<Option<pipeline::BuildReport>, Box<dyn std::error::Error>> {
    let mut site_config = config::load_config(source)?;
    site_config.publish.drafts |= args.drafts;
    site_config.publish.future |= args.future;
    site_config.publish.expired |= args.expired;
    if let Some(build_time) = &args.build_time {
        site_config.build_time = Some(build_time.clone());
    }

    init_thread_pool(&site_config.processing);
    let build_time = site_config.resolve_build_time(Utc::now())?;
    let content = scan::scan(source)?;

    match pipeline::build_content(&content, &site_config, build_time) {
        Ok(report) => Ok(Some(report)),
        Err(e) => {
            output::print_build_error(&e);
            Ok(None)
        }
    }
}

fn exit_code(report: &pipeline::BuildReport) -> ExitCode {
    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Install the log subscriber. `RUST_LOG` still applies on top of `-v`.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never more threads than available cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
