//! CareWeb help CLI
//!
//! Inspects installed help modules without a browser:
//! - List registered modules
//! - Print a module's table of contents or keyword index
//! - Resolve topics to their urls and files
//! - Full-text search across modules

use std::path::PathBuf;
use std::sync::{Arc, PoisonError};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cwf_help_core::helpset::{HelpSet, resource_path};
use cwf_help_core::{
    Directories, HelpConfig, HelpModule, HelpServices, HelpViewType, KeywordIndex, LoggingLauncher,
    NodeId, Relevance, TopicTree,
};
use cwf_help_types::encode_url;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// CareWeb help CLI
#[derive(Parser)]
#[command(name = "cwf-help")]
#[command(about = "Browse and search CareWeb help modules")]
#[command(version)]
#[command(after_help = "\
Examples:
  cwf-help modules                       List registered help modules
  cwf-help toc patients                  Print the table of contents
  cwf-help keywords patients --find all  Jump to the first keyword starting with 'all'
  cwf-help topic patients select         Show where a topic lives
  cwf-help search patient chart          Search every module
  cwf-help search allergy -m patients    Search one module
")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory that /web paths resolve against
    #[arg(long, global = true, value_name = "DIR")]
    content_root: Option<PathBuf>,

    /// Also write logs to a file (timestamped in the temp directory if no path is given)
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered help modules
    Modules,

    /// Print a module's table of contents
    Toc {
        /// Module id (locale suffixes fall back to the base module)
        module: String,
    },

    /// Print a module's keyword index
    Keywords {
        module: String,

        /// Show only the first keyword starting with this prefix
        #[arg(long, value_name = "PREFIX")]
        find: Option<String>,
    },

    /// Show a topic's label, url and file
    Topic {
        module: String,

        /// Topic id or url (defaults to the module's home topic)
        topic: Option<String>,
    },

    /// Expand a help set path to its servable url
    EncodeUrl { path: String },

    /// Search help content, indexing modules first if needed
    Search {
        /// Words that must all occur in a page
        #[arg(required = true)]
        words: Vec<String>,

        /// Limit the search to these module ids
        #[arg(short, long = "module", value_name = "ID")]
        modules: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn setup_logging(verbose: u8, log_file: Option<Option<PathBuf>>) -> Result<()> {
    let default_level = match verbose {
        0 if cfg!(debug_assertions) => "info",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cwf_help_core={default_level},cwf_help_ipc={default_level},cwf_help={default_level}"
        ))
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose > 0);

    let Some(log_file) = log_file else {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(filter)
            .init();
        return Ok(());
    };

    let log_path = log_file.unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        std::env::temp_dir().join(format!("cwf-help-{timestamp}.log"))
    });
    let dir = match log_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = log_path
        .file_name()
        .context("Log file path has no file name")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes on process exit
    std::mem::forget(guard);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter)
        .init();

    eprintln!("Logging to: {}", log_path.display());
    Ok(())
}

fn load_config(cli: &Cli) -> Result<HelpConfig> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Directories::new()?.config_file,
    };
    debug!("Loading config from {}", path.display());

    let mut config = HelpConfig::load(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;

    if let Some(root) = &cli.content_root {
        config.content_root = Some(root.clone());
    }

    if config.search.enabled && config.search.index_directory.is_none() {
        config.search.index_directory = Some(Directories::new()?.index_dir);
    }
    Ok(config)
}

fn find_module(services: &HelpServices, id: &str) -> Result<HelpModule> {
    services
        .modules()
        .get(id)
        .cloned()
        .with_context(|| format!("Unknown help module: {id}"))
}

fn load_help_set(services: &HelpServices, id: &str) -> Result<Arc<HelpSet>> {
    let module = find_module(services, id)?;
    let help_set = services
        .help_sets()
        .factory()
        .try_create(&module)
        .with_context(|| format!("Failed to load help set for {}", module.key()))?;
    Ok(Arc::new(help_set))
}

fn print_tree(tree: &TopicTree, node: NodeId, depth: usize) {
    for &child in tree.children(node) {
        let topic = tree.topic(child);
        match topic.url() {
            Some(url) => println!("{:indent$}{}  {url}", "", topic.label, indent = depth * 2),
            None => println!("{:indent$}{}", "", topic.label, indent = depth * 2),
        }
        print_tree(tree, child, depth + 1);
    }
}

fn cmd_modules(services: &HelpServices) {
    if services.modules().is_empty() {
        println!("No help modules registered");
        return;
    }

    for module in services.modules().iter() {
        let version = if module.version.is_empty() {
            String::new()
        } else {
            format!(" v{}", module.version)
        };
        println!("{:<24} {}{version}  {}", module.key(), module.title, encode_url(&module.url));
    }
}

fn cmd_toc(services: &HelpServices, id: &str) -> Result<()> {
    let help_set = load_help_set(services, id)?;
    let views: Vec<_> = help_set
        .views()
        .iter()
        .filter(|view| view.view_type == HelpViewType::Toc)
        .collect();

    if views.is_empty() {
        bail!("Help set {} has no table of contents", help_set.name());
    }

    println!("{}", help_set.name());
    for view in views {
        print_tree(&view.tree, view.tree.root(), 1);
    }
    Ok(())
}

fn cmd_keywords(services: &HelpServices, id: &str, find: Option<&str>) -> Result<()> {
    let help_set = load_help_set(services, id)?;
    let mut index = KeywordIndex::new();
    for view in help_set
        .views()
        .iter()
        .filter(|view| matches!(view.view_type, HelpViewType::Keyword | HelpViewType::Index))
    {
        index.add_view(view);
    }

    if index.is_empty() {
        bail!("Help set {} has no keywords", help_set.name());
    }

    let keywords: Vec<&str> = match find {
        Some(prefix) => match index.find(prefix) {
            Some(keyword) => vec![keyword],
            None => bail!("No keyword starts with '{prefix}'"),
        },
        None => index.keywords().collect(),
    };

    for keyword in keywords {
        println!("{keyword}");
        for topic in index.topics(keyword) {
            println!("  {}  {}", topic.label, topic.url().unwrap_or(""));
        }
    }
    Ok(())
}

fn cmd_topic(services: &HelpServices, id: &str, topic_id: Option<&str>) -> Result<()> {
    let help_set = load_help_set(services, id)?;
    let topic_id = topic_id.unwrap_or(help_set.home_id());
    let topic = help_set
        .topic(topic_id)
        .with_context(|| format!("Topic {topic_id} not found in {}", help_set.name()))?;

    println!("label:  {}", topic.label);
    println!("source: {}", topic.source);
    if let Some(url) = topic.url() {
        let file = resource_path(services.content_root(), url);
        println!("url:    {url}");
        println!("file:   {}", file.display());
    }
    Ok(())
}

fn cmd_search(services: &HelpServices, words: &[String], ids: &[String], json: bool) -> Result<()> {
    let Some(search) = services.search() else {
        bail!("Search is disabled in the configuration");
    };

    let indexed = services.index_help_modules()?;
    if indexed > 0 {
        info!("Indexed {indexed} pages");
    }

    let modules: Vec<HelpModule> = if ids.is_empty() {
        services.modules().iter().cloned().collect()
    } else {
        ids.iter()
            .map(|id| find_module(services, id))
            .collect::<Result<_>>()?
    };

    let query = words.join(" ");
    let hits = search
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .search(&query, &modules);

    if json {
        let results: Vec<_> = hits
            .iter()
            .zip(Relevance::tiers(&hits))
            .map(|(hit, relevance)| {
                serde_json::json!({
                    "label": hit.topic.label,
                    "url": hit.topic.url,
                    "source": hit.topic.source,
                    "confidence": hit.confidence,
                    "relevance": format!("{relevance:?}").to_lowercase(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No matches for '{query}'");
        return Ok(());
    }

    for (hit, relevance) in hits.iter().zip(Relevance::tiers(&hits)) {
        let marker = match relevance {
            Relevance::High => "***",
            Relevance::Medium => "** ",
            Relevance::Low => "*  ",
        };
        println!(
            "{marker} {}  [{}]  {}",
            hit.topic.label,
            hit.topic.source,
            hit.topic.url().unwrap_or("")
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.log_file.clone())?;

    if let Commands::EncodeUrl { path } = &cli.command {
        println!("{}", encode_url(path));
        return Ok(());
    }

    let config = load_config(&cli)?;
    let services = HelpServices::from_config(config, Arc::new(LoggingLauncher))
        .context("Failed to initialize help services")?;

    match &cli.command {
        Commands::Modules => cmd_modules(&services),
        Commands::Toc { module } => cmd_toc(&services, module)?,
        Commands::Keywords { module, find } => cmd_keywords(&services, module, find.as_deref())?,
        Commands::Topic { module, topic } => cmd_topic(&services, module, topic.as_deref())?,
        Commands::Search {
            words,
            modules,
            json,
        } => cmd_search(&services, words, modules, *json)?,
        Commands::EncodeUrl { .. } => {}
    }

    Ok(())
}
