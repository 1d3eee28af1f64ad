//! Event dump tool
//!
//! Replays a capture file or runs a plugin source through the test driver
//! and prints the requested fields of every event, one line per event.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use inspect_config::DriverConfig;
use inspect_driver::{Driver, Error, EventHandle, Status};
use inspect_engine::GENERIC_FIELDS;
use std::path::PathBuf;
use tracing::{debug, info};

const DEFAULT_FIELDS: &[&str] = &["evt.num", "evt.time", "evt.source", "evt.plugininfo"];

#[derive(Parser)]
#[command(name = "inspect-dump")]
#[command(about = "Print extracted fields for every event of a capture or plugin source")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Driver configuration file (YAML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Field to extract; may be repeated
    #[arg(long = "field", value_name = "NAME", global = true)]
    fields: Vec<String>,

    /// Plugin whose fields should be available; may be repeated
    #[arg(long = "extractor", value_name = "PLUGIN", global = true)]
    extractors: Vec<String>,

    /// Print the byte range each value was taken from
    #[arg(long, global = true)]
    offsets: bool,

    /// Stop after this many events
    #[arg(long, value_name = "N", global = true)]
    limit: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a capture file
    Capture {
        /// Path to the capture file
        path: PathBuf,
        /// Event source the extractor plugins are added for
        #[arg(long, default_value = "syscall")]
        source: String,
    },

    /// List the built-in fields and the fields of every bundled plugin
    Fields,

    /// Run a bundled source plugin
    Plugin {
        /// Plugin name
        name: String,
        /// Initialization config passed to the plugin
        #[arg(long, default_value = "")]
        init_config: String,
        /// Parameters passed when opening the source
        #[arg(long, default_value = "")]
        open_params: String,
        /// Attach host metadata to every event
        #[arg(long)]
        platform: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DriverConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => DriverConfig::default(),
    };
    if cli.verbose {
        config.log_level = "debug".to_string();
    }

    let mut driver = Driver::with_config(&config)?;
    let mut registered = Vec::new();
    let fields: Vec<String> = if cli.fields.is_empty() {
        DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
    } else {
        cli.fields.clone()
    };

    let source = match &cli.command {
        Commands::Capture { path, source } => {
            add_extractors(&mut driver, &mut registered, &cli.extractors, source)?;
            driver
                .open_capture_file(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            info!("Replaying {}", path.display());
            source.clone()
        }
        Commands::Plugin {
            name,
            init_config,
            open_params,
            platform,
        } => {
            let descriptor = find_plugin(name)?;
            let plugin = driver.register_plugin(descriptor, init_config)?;
            registered.push(plugin.name().to_string());
            let source = plugin
                .event_source()
                .with_context(|| format!("plugin {} is not an event source", name))?
                .to_string();
            driver.add_extractors(&plugin, &source);
            add_extractors(&mut driver, &mut registered, &cli.extractors, &source)?;

            let platform = *platform || config.engine.platform_metadata_default;
            driver.open_plugin_source(name, open_params, platform)?;
            info!("Reading from plugin {}", name);
            source
        }
        Commands::Fields => {
            print!("{}", field_listing());
            return Ok(());
        }
    };
    debug!("Extracting {:?} for source {}", fields, source);

    let mut printed = 0u64;
    while cli.limit.is_none_or(|limit| printed < limit) {
        let (status, event) = driver.next();
        match status {
            Status::Ok => {
                println!("{}", format_event(&mut driver, &event, &fields, cli.offsets)?);
                printed += 1;
            }
            Status::Timeout => continue,
            Status::Eof => break,
            Status::Error => bail!("capture failed after {} events", printed),
        }
    }

    info!("Printed {} events", printed);
    Ok(())
}

fn find_plugin(name: &str) -> Result<&'static inspect_driver::PluginDescriptor> {
    inspect_plugins::find(name).with_context(|| {
        let known: Vec<_> = inspect_plugins::all().iter().map(|d| d.name).collect();
        format!("unknown plugin {} (known: {})", name, known.join(", "))
    })
}

/// Register each named plugin once and add its extractors for `source`
fn add_extractors(
    driver: &mut Driver,
    registered: &mut Vec<String>,
    names: &[String],
    source: &str,
) -> Result<()> {
    for name in names {
        if registered.contains(name) {
            debug!("Plugin {} already registered", name);
            continue;
        }
        let plugin = driver.register_plugin(find_plugin(name)?, "")?;
        registered.push(name.clone());
        driver.add_extractors(&plugin, source);
    }
    Ok(())
}

fn field_listing() -> String {
    let mut out = String::from("built-in:\n");
    for (name, description) in GENERIC_FIELDS {
        out.push_str(&format!("  {:<24} {}\n", name, description));
    }
    for descriptor in inspect_plugins::all() {
        if descriptor.fields.is_empty() {
            continue;
        }
        out.push_str(&format!("{}:\n", descriptor.name));
        for field in descriptor.fields {
            out.push_str(&format!("  {:<24} {}\n", field.name, field.description));
        }
    }
    out
}

fn format_event(
    driver: &mut Driver,
    event: &EventHandle,
    fields: &[String],
    offsets: bool,
) -> Result<String> {
    let mut parts = Vec::with_capacity(fields.len() + 1);
    if let Some(seq) = event.seq() {
        parts.push(format!("#{}", seq));
    }
    for field in fields {
        let part = if offsets {
            match driver.extract_field_with_offsets(field, event) {
                Ok((value, start, len)) => format!("{}={} [{}+{}]", field, value, start, len),
                Err(Error::NullValue(_)) => format!("{}=<NA>", field),
                Err(e) => return Err(e.into()),
            }
        } else {
            match driver.extract_field_as_string(field, event) {
                Ok(value) => format!("{}={}", field, value),
                Err(Error::NullValue(_)) => format!("{}=<NA>", field),
                Err(e) => return Err(e.into()),
            }
        };
        parts.push(part);
    }
    Ok(parts.join(" "))
}
