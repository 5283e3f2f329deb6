use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use quicktrans::config::Config;
use quicktrans::dispatch::{DispatchOptions, Dispatcher, Trigger};
use quicktrans::interactive::{print_outcome, run_session, run_setup_wizard, with_spinner};
use quicktrans::language::language_name;
use quicktrans::provider::{ProviderKind, ProviderRouter, MODELS};
use quicktrans::store::{FileStorage, PreferenceStore, ResultLanguageMode};
use quicktrans::DispatchOutcome;
use std::io::{IsTerminal, Read};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "quicktrans")]
#[command(version, about = "Translate text with OpenAI, Google, DeepSeek or Aliyun Qwen")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Translate TEXT, or standard input when TEXT is omitted
    Translate {
        text: Option<String>,

        /// Model to use for this call (see `quicktrans prefs models`)
        #[arg(short, long)]
        model: Option<String>,

        /// Treat the input as this language instead of detecting it
        #[arg(short, long)]
        from: Option<String>,

        /// Translate into this language for this call
        #[arg(short, long)]
        to: Option<String>,

        /// System prompt text
        #[arg(long, conflicts_with = "prompt")]
        system: Option<String>,

        /// Saved prompt template, by name or id
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Interactive translate session
    Session {
        /// Saved prompt template, by name or id
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Guided setup of languages, model and API key
    Setup,

    /// Show or manage translation history
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Manage saved prompt templates
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },

    /// Manage provider API keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsAction>,
    },

    /// Run the CORS proxy endpoints
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:3000
        #[arg(short, long)]
        listen: Option<String>,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List entries, newest first
    List {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Remove one entry
    Remove { id: String },
    /// Remove every entry
    Clear,
    /// Toggle whether history is shown after translating
    Toggle,
}

#[derive(Subcommand)]
enum PromptAction {
    List,
    Add { name: String, content: String },
    Remove { id: String },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store an API key for a provider
    Set { provider: ProviderKind, key: String },
    /// Forget a provider's API key
    Clear { provider: ProviderKind },
    /// Check whether the stored key looks usable
    Test { provider: ProviderKind },
    Enable { provider: ProviderKind },
    Disable { provider: ProviderKind },
    /// Show key and enabled status for every provider
    Status,
}

#[derive(Subcommand)]
enum PrefsAction {
    Show,
    /// List available model identifiers
    Models,
    /// Set the language pair
    Lang { source: String, target: String },
    /// Result language: auto, or a language code
    Mode { mode: ResultLanguageMode },
    Model { model: String },
    FontSize {
        #[arg(allow_negative_numbers = true)]
        size: i64,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quicktrans={},tower_http=info,warn", level)));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn open_store(config: &Config) -> Result<PreferenceStore> {
    let path = config
        .store_path()
        .context("Could not determine a data directory; set QUICKTRANS_DATA_DIR")?;
    debug!("Store: {}", path.display());
    let storage = FileStorage::open(&path)
        .with_context(|| format!("Failed to open store {}", path.display()))?;
    Ok(PreferenceStore::open(Box::new(storage)))
}

fn read_input(text: Option<String>) -> Result<(String, Trigger)> {
    if let Some(text) = text {
        return Ok((text, Trigger::Manual));
    }
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!("No text given. Pass TEXT or pipe text on standard input");
    }
    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer).context("Failed to read standard input")?;
    Ok((buffer, Trigger::Paste))
}

fn template_content(store: &PreferenceStore, prompt: Option<&str>) -> Result<Option<String>> {
    match prompt {
        Some(id_or_name) => store
            .find_prompt_template(id_or_name)
            .map(|t| Some(t.content.clone()))
            .with_context(|| format!("No saved prompt named '{}'", id_or_name)),
        None => Ok(None),
    }
}

fn print_history(store: &PreferenceStore, limit: usize) {
    if store.history().is_empty() {
        println!("No history");
        return;
    }
    for entry in store.history().iter().take(limit) {
        let when = chrono::DateTime::from_timestamp_millis(entry.created_at)
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{} {} → {} | {} {}",
            style(&entry.id).dim(),
            language_name(&entry.source_language),
            language_name(&entry.target_language),
            when,
            entry.model.as_deref().map(|m| format!("[{}]", m)).unwrap_or_default()
        );
        println!("  {}", entry.source_text);
        println!("  {}", style(&entry.translated_text).green());
    }
}

fn print_prefs(store: &PreferenceStore) {
    let prefs = store.preferences();
    println!("Language pair:   {} → {}", prefs.source_language, prefs.target_language);
    println!("Result language: {}", prefs.result_language_mode);
    println!("Model:           {}", prefs.selected_model);
    println!("Font size:       {}", prefs.font_size);
    println!("Show history:    {}", prefs.show_history);
    println!("Saved prompts:   {}", prefs.prompt_templates.len());
    println!("History entries: {}", store.history().len());
}

/// Apply a `--listen` override and check the result.
fn with_listen_addr(mut config: Config, listen: Option<String>) -> Result<Config> {
    if let Some(listen) = listen {
        config.listen_addr = listen;
        config.validate().context("Configuration validation failed")?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let router = ProviderRouter::new(&config);

    match cli.command {
        Command::Serve { listen } => {
            let config = with_listen_addr(config, listen)?;
            quicktrans::proxy::serve(&config).await?;
        }

        Command::Translate {
            text,
            model,
            from,
            to,
            system,
            prompt,
        } => {
            let mut store = open_store(&config)?;
            let (input, trigger) = read_input(text)?;
            let system_prompt = match system {
                Some(system) => Some(system),
                None => template_content(&store, prompt.as_deref())?,
            };

            let options = DispatchOptions {
                source_language: from,
                target_language: to,
                system_prompt,
                model,
            };
            let mut dispatcher = Dispatcher::new(router);
            let outcome = with_spinner(
                "Translating...",
                dispatcher.submit(&mut store, input.trim_end_matches('\n'), trigger, &options),
            )
            .await?;
            print_outcome(&outcome);

            if store.preferences().show_history {
                println!();
                print_history(&store, 5);
            }
            if matches!(outcome, DispatchOutcome::Failed { .. }) {
                std::process::exit(1);
            }
        }

        Command::Session { prompt } => {
            let mut store = open_store(&config)?;
            let options = DispatchOptions {
                system_prompt: template_content(&store, prompt.as_deref())?,
                ..DispatchOptions::default()
            };
            let mut dispatcher = Dispatcher::new(router);
            run_session(&mut dispatcher, &mut store, options).await?;
        }

        Command::Setup => {
            let mut store = open_store(&config)?;
            run_setup_wizard(&mut store, &router).await?;
        }

        Command::History { action } => {
            let mut store = open_store(&config)?;
            match action.unwrap_or(HistoryAction::List { limit: 20 }) {
                HistoryAction::List { limit } => print_history(&store, limit),
                HistoryAction::Remove { id } => {
                    if store.remove_history(&id)? {
                        println!("{} Removed {}", style("✓").green(), id);
                    } else {
                        anyhow::bail!("No history entry with id {}", id);
                    }
                }
                HistoryAction::Clear => {
                    store.clear_history()?;
                    println!("{} History cleared", style("✓").green());
                }
                HistoryAction::Toggle => {
                    let shown = store.toggle_show_history()?;
                    println!("Show history: {}", shown);
                }
            }
        }

        Command::Prompt { action } => {
            let mut store = open_store(&config)?;
            match action {
                PromptAction::List => {
                    for template in &store.preferences().prompt_templates {
                        println!("{} {}", style(&template.id).dim(), style(&template.name).bold());
                        println!("  {}", template.content);
                    }
                }
                PromptAction::Add { name, content } => {
                    let template = store.add_prompt_template(&name, &content)?;
                    println!("{} Saved prompt {} ({})", style("✓").green(), template.name, template.id);
                }
                PromptAction::Remove { id } => {
                    if !store.remove_prompt_template(&id)? {
                        anyhow::bail!("No saved prompt with id {}", id);
                    }
                    println!("{} Removed {}", style("✓").green(), id);
                }
            }
        }

        Command::Key { action } => {
            let mut store = open_store(&config)?;
            match action {
                KeyAction::Set { provider, key } => {
                    store.set_api_key(provider, &key)?;
                    println!("{} {} API key saved", style("✓").green(), provider);
                }
                KeyAction::Clear { provider } => {
                    store.clear_api_key(provider)?;
                    println!("{} {} API key removed", style("✓").green(), provider);
                }
                KeyAction::Test { provider } => {
                    let key = store.preferences().api_key(provider);
                    let translator = router.for_provider(provider, key)?;
                    if with_spinner("Checking key...", translator.verify_key()).await {
                        println!("{} {} key looks usable", style("✓").green(), provider);
                    } else {
                        println!("{} {} key is invalid or unusable", style("✗").red(), provider);
                        std::process::exit(1);
                    }
                }
                KeyAction::Enable { provider } => store.set_provider_enabled(provider, true)?,
                KeyAction::Disable { provider } => store.set_provider_enabled(provider, false)?,
                KeyAction::Status => {
                    let prefs = store.preferences();
                    for kind in ProviderKind::ALL {
                        let key = if !kind.requires_key() {
                            "not needed".to_string()
                        } else if let Some(key) = prefs.api_key(kind) {
                            format!("{}***", key.chars().take(4).collect::<String>())
                        } else {
                            "not set".to_string()
                        };
                        let enabled = if prefs.is_enabled(kind) { "enabled" } else { "disabled" };
                        println!("{:<9} {:<9} {}", kind.as_str(), enabled, key);
                    }
                }
            }
        }

        Command::Prefs { action } => {
            let mut store = open_store(&config)?;
            match action.unwrap_or(PrefsAction::Show) {
                PrefsAction::Show => print_prefs(&store),
                PrefsAction::Models => {
                    let selected = &store.preferences().selected_model;
                    for model in MODELS {
                        let marker = if model.id == selected.as_str() { "*" } else { " " };
                        println!("{} {:<17} {:<9} {}", marker, model.id, model.provider.as_str(), model.label);
                    }
                }
                PrefsAction::Lang { source, target } => store.set_language_pair(&source, &target)?,
                PrefsAction::Mode { mode } => store.set_result_language_mode(mode)?,
                PrefsAction::Model { model } => store.set_model(&model)?,
                PrefsAction::FontSize { size } => {
                    let stored = store.set_font_size(size)?;
                    println!("Font size: {}", stored);
                }
            }
        }
    }

    Ok(())
}
