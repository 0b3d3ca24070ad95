mod cli;

use trackprobe::{config, session, Track};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "trackprobe=trace,trackprobe_container=trace".to_string()
        } else {
            "trackprobe=info,trackprobe_container=info".to_string()
        }
    });

    // Logs go to stderr so stdout only carries results
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Tracks {
            input,
            json,
            max_bytes,
            chunk_size,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(list_tracks(
                &input,
                cli.config.as_deref(),
                json,
                max_bytes,
                chunk_size,
            ))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("trackprobe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn list_tracks(
    input: &str,
    config_path: Option<&std::path::Path>,
    json: bool,
    max_bytes: Option<u64>,
    chunk_size: Option<u64>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let mut options = config::ExtractOptions::from(&config);
    if max_bytes.is_some() {
        options.max_bytes = max_bytes;
    }
    if let Some(size) = chunk_size {
        if size == 0 {
            anyhow::bail!("--chunk-size cannot be 0");
        }
        options.chunk_size = size;
    }

    tracing::info!("Reading tracks from {}", input);
    let tracks = session::extract_with_config(input, &config, &options)
        .await
        .with_context(|| format!("Failed to read tracks from {}", input))?;

    if json {
        let json_str = serde_json::to_string_pretty(&tracks)?;
        println!("{}", json_str);
    } else {
        println!("Tracks: {}", tracks.len());
        for track in &tracks {
            println!("  {}", describe(track));
        }
    }

    Ok(())
}

fn describe(track: &Track) -> String {
    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    let mut line = format!(
        "[{}] {} {} {}",
        or_dash(track.id.map(|id| id.to_string())),
        or_dash(track.track_type.map(|t| t.to_string())),
        or_dash(track.lang.clone()),
        or_dash(track.codec.clone()),
    );
    if let Some(ref label) = track.label {
        line.push_str(&format!(" \"{}\"", label));
    }
    line
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Chunk size: {} bytes", config.source.chunk_size);
    match config.source.max_bytes {
        Some(limit) => println!("  Max bytes: {}", limit),
        None => println!("  Max bytes: unlimited"),
    }
    println!("  HTTP timeout: {}s", config.http.timeout_secs);
    println!("  HTTP redirects: {}", config.http.max_redirects);
    println!("  User agent: {}", config.http.user_agent);

    Ok(())
}
