use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use kashaf_core::config_file::{self, ApiKeysConfig, ConfigFile, ExportConfig, ModelConfig};
use kashaf_core::llm::ReplayBackend;
use kashaf_core::{Config, InferenceBackend, ProgressEvent};
use kashaf_ingest::DocumentReader;
use kashaf_reporting::ExportFormat;
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Kashaf - extract categorized scholarly-index entries from Arabic texts
#[derive(Parser, Debug)]
#[command(name = "kashaf", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a .docx (or plain-text) document and export the index
    Analyze {
        /// Path to the document to analyze
        file_path: PathBuf,

        /// Model identifier (default: gpt-4)
        #[arg(long)]
        model: Option<String>,

        /// OpenAI API key
        #[arg(long)]
        api_key: Option<String>,

        /// Base URL of an OpenAI-compatible API
        #[arg(long)]
        base_url: Option<String>,

        /// Path to write the export to (default: kashafaat.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format: xlsx, csv, json or markdown
        #[arg(long)]
        format: Option<String>,

        /// Parse a saved model reply instead of calling the API
        #[arg(long)]
        reply_file: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Dry run: print the page chunks found in a document
    Pages {
        /// Path to the document
        file_path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show or initialize the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a template config file to the platform config directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Values given on the command line, before env and config file fallbacks.
#[derive(Debug, Default)]
struct ConfigFlags {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            file_path,
            model,
            api_key,
            base_url,
            output,
            format,
            reply_file,
            no_color,
        } => {
            let flags = ConfigFlags {
                model,
                api_key,
                base_url,
            };
            analyze(file_path, flags, output, format, reply_file, no_color).await
        }
        Command::Pages {
            file_path,
            no_color,
        } => pages(&file_path, no_color),
        Command::Config { action } => match action {
            ConfigAction::Show => config_show(),
            ConfigAction::Init { force } => config_init(force),
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(
    file: &ConfigFile,
    flags: ConfigFlags,
    env: impl Fn(&str) -> Option<String>,
) -> Config {
    let mut config = Config::default();
    config.apply_file(file);
    config.apply_env(env);

    if let Some(key) = flags.api_key {
        config.api_key = Some(key);
    }
    if let Some(model) = flags.model {
        config.model = model;
    }
    if let Some(url) = flags.base_url {
        config.base_url = url;
    }
    config
}

/// Pick the export format and path. An explicit `--format` wins, then the
/// output path's extension, then the config file.
fn resolve_export(
    output: Option<PathBuf>,
    format: Option<String>,
    file: &ConfigFile,
) -> anyhow::Result<(PathBuf, ExportFormat)> {
    let export = file.export.as_ref();
    let output = output.or_else(|| export.and_then(|e| e.output.as_ref()).map(PathBuf::from));

    let format = match format {
        Some(f) => f.parse::<ExportFormat>().map_err(anyhow::Error::msg)?,
        None => match output.as_deref().and_then(ExportFormat::from_path) {
            Some(f) => f,
            None => match export.and_then(|e| e.format.as_deref()) {
                Some(f) => f
                    .parse::<ExportFormat>()
                    .map_err(anyhow::Error::msg)
                    .context("invalid [export] format in config file")?,
                None => ExportFormat::default(),
            },
        },
    };

    let path = output.unwrap_or_else(|| match format {
        ExportFormat::Xlsx => PathBuf::from(kashaf_reporting::DEFAULT_FILENAME),
        other => PathBuf::from(format!("kashafaat.{}", other.extension())),
    });
    Ok((path, format))
}

fn spinner(color: ColorMode) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    let template = if color.enabled() {
        "{spinner:.cyan} {msg} ({elapsed})"
    } else {
        "{spinner} {msg} ({elapsed})"
    };
    bar.set_style(
        ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

async fn analyze(
    file_path: PathBuf,
    flags: ConfigFlags,
    output: Option<PathBuf>,
    format: Option<String>,
    reply_file: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }

    let file_config = config_file::load_config();
    let config = resolve_config(&file_config, flags, |name| std::env::var(name).ok());
    let (export_path, export_format) = resolve_export(output, format, &file_config)?;
    tracing::debug!(?config, path = %export_path.display(), "resolved configuration");

    let backend: Box<dyn InferenceBackend> = match reply_file {
        Some(ref path) => {
            let reply = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read reply file {}", path.display()))?;
            Box::new(ReplayBackend::new(reply))
        }
        None => match kashaf_core::analyze::openai_backend(&config) {
            Ok(b) => Box::new(b),
            Err(_) => anyhow::bail!(
                "No API key. Pass --api-key, set OPENAI_API_KEY, or add [api_keys] openai_key to the config file"
            ),
        },
    };

    let color = ColorMode(!no_color);
    let bar = spinner(color);
    let progress_bar = bar.clone();
    let progress = move |event: ProgressEvent| {
        progress_bar.set_message(output::progress_message(&event));
    };

    let client = reqwest::Client::new();
    let reader = DocumentReader::new();
    let result = kashaf_core::analyze_document(
        &file_path,
        &reader,
        &config,
        backend.as_ref(),
        &client,
        progress,
    )
    .await;
    bar.finish_and_clear();
    let analysis = result?;

    let mut stdout = std::io::stdout();
    output::print_records(&mut stdout, &analysis.records, color)?;
    output::print_summary(&mut stdout, &analysis.summary(), analysis.pages.len(), color)?;

    kashaf_reporting::export_records(&analysis.records, export_format, &export_path)
        .with_context(|| format!("failed to write {}", export_path.display()))?;
    writeln!(
        stdout,
        "Saved {} entries to {} ({})",
        analysis.records.len(),
        export_path.display(),
        export_format.label()
    )?;
    Ok(())
}

fn pages(file_path: &Path, no_color: bool) -> anyhow::Result<()> {
    let text = kashaf_ingest::read_document(file_path)
        .with_context(|| format!("failed to read {}", file_path.display()))?;
    let chunks = kashaf_core::split_pages(&text)?;

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    let mut stdout = std::io::stdout();
    output::print_pages(&mut stdout, &file_name, &chunks, ColorMode(!no_color))?;
    Ok(())
}

fn config_show() -> anyhow::Result<()> {
    let file_config = config_file::load_config();
    let config = resolve_config(&file_config, ConfigFlags::default(), |name| {
        std::env::var(name).ok()
    });

    let mut stdout = std::io::stdout();
    let platform = config_file::config_path();
    output::print_config(&mut stdout, &config, &file_config, platform.as_deref())?;
    Ok(())
}

fn config_template() -> ConfigFile {
    ConfigFile {
        api_keys: Some(ApiKeysConfig { openai_key: None }),
        model: Some(ModelConfig {
            name: Some(kashaf_core::DEFAULT_MODEL.to_string()),
            base_url: Some(kashaf_core::DEFAULT_BASE_URL.to_string()),
            temperature: Some(kashaf_core::DEFAULT_TEMPERATURE),
        }),
        export: Some(ExportConfig {
            format: Some(ExportFormat::Xlsx.extension().to_string()),
            output: Some(kashaf_reporting::DEFAULT_FILENAME.to_string()),
        }),
    }
}

fn config_init(force: bool) -> anyhow::Result<()> {
    if let Some(path) = config_file::config_path()
        && path.exists()
        && !force
    {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    let path = config_file::save_config(&config_template()).map_err(anyhow::Error::msg)?;
    println!("Wrote config template to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn file_with_model(name: &str) -> ConfigFile {
        ConfigFile {
            model: Some(ModelConfig {
                name: Some(name.to_string()),
                ..Default::default()
            }),
            api_keys: Some(ApiKeysConfig {
                openai_key: Some("sk-file".to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "kashaf",
            "analyze",
            "book.docx",
            "--model",
            "gpt-4o",
            "-o",
            "out.csv",
            "--reply-file",
            "reply.txt",
            "--no-color",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                file_path,
                model,
                output,
                reply_file,
                no_color,
                api_key,
                ..
            } => {
                assert_eq!(file_path, PathBuf::from("book.docx"));
                assert_eq!(model.as_deref(), Some("gpt-4o"));
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert_eq!(reply_file, Some(PathBuf::from("reply.txt")));
                assert!(no_color);
                assert!(api_key.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_config_subcommands() {
        let cli = Cli::try_parse_from(["kashaf", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
        assert!(Cli::try_parse_from(["kashaf", "pages"]).is_err());
    }

    #[test]
    fn defaults_without_any_source() {
        let config = resolve_config(&ConfigFile::default(), ConfigFlags::default(), env_from(&[]));
        assert_eq!(config.model, kashaf_core::DEFAULT_MODEL);
        assert_eq!(config.base_url, kashaf_core::DEFAULT_BASE_URL);
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn env_overrides_file_and_flags_override_env() {
        let file = file_with_model("from-file");
        let env = env_from(&[("KASHAF_MODEL", "from-env"), ("OPENAI_API_KEY", "sk-env")]);

        let config = resolve_config(&file, ConfigFlags::default(), &env);
        assert_eq!(config.model, "from-env");
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));

        let flags = ConfigFlags {
            model: Some("from-flag".into()),
            ..Default::default()
        };
        let config = resolve_config(&file, flags, &env);
        assert_eq!(config.model, "from-flag");
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn file_values_used_when_nothing_else_set() {
        let config = resolve_config(
            &file_with_model("from-file"),
            ConfigFlags::default(),
            env_from(&[]),
        );
        assert_eq!(config.model, "from-file");
        assert_eq!(config.credential(), Some("sk-file"));
    }

    #[test]
    fn export_defaults_to_xlsx() {
        let (path, format) = resolve_export(None, None, &ConfigFile::default()).unwrap();
        assert_eq!(path, PathBuf::from("kashafaat.xlsx"));
        assert_eq!(format, ExportFormat::Xlsx);
    }

    #[test]
    fn export_format_from_flag_extension_and_file() {
        let (path, format) =
            resolve_export(None, Some("json".into()), &ConfigFile::default()).unwrap();
        assert_eq!(path, PathBuf::from("kashafaat.json"));
        assert_eq!(format, ExportFormat::Json);

        let (_, format) =
            resolve_export(Some("out/index.md".into()), None, &ConfigFile::default()).unwrap();
        assert_eq!(format, ExportFormat::Markdown);

        let file = ConfigFile {
            export: Some(ExportConfig {
                format: Some("csv".into()),
                output: None,
            }),
            ..Default::default()
        };
        let (path, format) = resolve_export(None, None, &file).unwrap();
        assert_eq!(format, ExportFormat::Csv);
        assert_eq!(path, PathBuf::from("kashafaat.csv"));
    }

    #[test]
    fn bad_format_flag_is_rejected() {
        assert!(resolve_export(None, Some("pdf".into()), &ConfigFile::default()).is_err());
    }

    #[test]
    fn template_serializes_without_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        config_file::save_to_path(&config_template(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[model]"));
        assert!(content.contains("gpt-4"));
        assert!(!content.contains("openai_key"));

        let loaded = config_file::load_from_path(&path).unwrap();
        let config = resolve_config(&loaded, ConfigFlags::default(), env_from(&[]));
        assert_eq!(config.temperature, kashaf_core::DEFAULT_TEMPERATURE);
    }
}
