use anyhow::Context;
use clap::Parser;
use pgerd::dialect::DatabaseKind;
use pgerd::render::RenderOptions;
use pgerd::snapshot::LoadOptions;
use std::fs;
use std::path::PathBuf;

/// Render a database catalog snapshot as a PlantUML ER diagram
#[derive(Parser, Debug)]
#[command(name = "pgerd")]
#[command(version, about)]
struct Args {
    /// Catalog snapshot (JSON)
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Database kind: postgres, mysql, generic (default: taken from the snapshot)
    #[arg(short, long, value_parser = parse_kind)]
    database: Option<DatabaseKind>,

    /// Use short spellings for verbose type names
    #[arg(long)]
    short_types: bool,

    /// Diagram title
    #[arg(short, long)]
    title: Option<String>,

    /// Leave out relationship lines
    #[arg(long)]
    no_relationships: bool,
}

impl Args {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            database: self.database,
            short_types: self.short_types,
        }
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            relationships: !self.no_relationships,
            title: self.title.clone(),
        }
    }
}

fn parse_kind(s: &str) -> Result<DatabaseKind, String> {
    DatabaseKind::from_str(s).ok_or_else(|| format!("invalid database kind: {}", s))
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pgerd=warn")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let input = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    tracing::info!(input = %args.input.display(), "rendering catalog snapshot");
    let document = pgerd::render_snapshot(&input, &args.load_options(), args.render_options())?;

    match &args.output {
        Some(path) => fs::write(path, &document)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", document),
    }
    Ok(())
}
