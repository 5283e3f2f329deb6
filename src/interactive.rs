use crate::dispatch::{DispatchOptions, DispatchOutcome, Dispatcher, LanguageChange, Trigger};
use crate::error::QuicktransError;
use crate::language::{language_name, LANGUAGES};
use crate::provider::{lookup_model, ProviderRouter, MODELS};
use crate::store::{PreferenceStore, ResultLanguageMode};
use console::style;
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

/// Run `future` behind a terminal spinner.
pub async fn with_spinner<F: Future>(message: &str, future: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = future.await;
    spinner.finish_and_clear();
    output
}

pub fn print_outcome(outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Translated {
            source_language,
            target_language,
            text,
            ..
        } => {
            eprintln!(
                "{}",
                style(format!(
                    "{} → {}",
                    language_name(source_language),
                    language_name(target_language)
                ))
                .dim()
            );
            println!("{}", text);
        }
        DispatchOutcome::Unchanged { language, text } => {
            eprintln!(
                "{}",
                style(format!("Already {}, returned unchanged", language_name(language))).dim()
            );
            println!("{}", text);
        }
        DispatchOutcome::Failed { failure, .. } => {
            eprintln!("{} {}", style("✗").red(), failure);
        }
    }
}

fn print_header(title: &str) {
    println!();
    println!("{}", style("╔═══════════════════════════════════════════════════╗").cyan());
    println!("{}", style(format!("║{:^51}║", title)).cyan());
    println!("{}", style("╚═══════════════════════════════════════════════════╝").cyan());
    println!();
}

/// Guided setup: language pair, model and that model's API key.
pub async fn run_setup_wizard(store: &mut PreferenceStore, router: &ProviderRouter) -> anyhow::Result<()> {
    print_header("quicktrans - setup");

    let source = select_language("Your language:", &store.preferences().source_language)?;
    let target = select_language("Translate into:", &store.preferences().target_language)?;
    store.set_language_pair(source, target)?;

    let model = select_model(&store.preferences().selected_model)?;
    store.set_model(model)?;

    let spec = lookup_model(model).ok_or_else(|| QuicktransError::validation("Unknown model"))?;
    if spec.provider.requires_key() {
        setup_api_key(store, router, spec.provider).await?;
    }

    println!();
    println!(
        "{} {} → {} with {}",
        style("✓").green(),
        language_name(source),
        language_name(target),
        spec.label
    );
    Ok(())
}

fn select_language(prompt: &str, current: &str) -> anyhow::Result<&'static str> {
    let items: Vec<String> = LANGUAGES
        .iter()
        .map(|(code, name)| format!("{} ({})", name, code))
        .collect();
    let default = LANGUAGES.iter().position(|(c, _)| *c == current).unwrap_or(0);

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default)
        .interact()?;

    Ok(LANGUAGES[selection].0)
}

fn select_model(current: &str) -> anyhow::Result<&'static str> {
    let items: Vec<String> = MODELS
        .iter()
        .map(|m| format!("{} ({})", m.label, m.id))
        .collect();
    let default = MODELS.iter().position(|m| m.id == current).unwrap_or(0);

    let selection = Select::new()
        .with_prompt("Select model")
        .items(&items)
        .default(default)
        .interact()?;

    Ok(MODELS[selection].id)
}

async fn setup_api_key(
    store: &mut PreferenceStore,
    router: &ProviderRouter,
    kind: crate::provider::ProviderKind,
) -> anyhow::Result<()> {
    if store.preferences().api_key(kind).is_some() {
        println!("{} {} API key configured", style("✓").green(), kind);
        if !Confirm::new()
            .with_prompt("Replace it?")
            .default(false)
            .interact()?
        {
            return Ok(());
        }
    }

    let api_key: String = Password::new()
        .with_prompt(format!("Enter your {} API key", kind))
        .interact()?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key is required");
    }

    if Confirm::new()
        .with_prompt("Test the key now?")
        .default(true)
        .interact()?
    {
        let provider = router.for_provider(kind, Some(api_key.trim()))?;
        if with_spinner("Checking key...", provider.verify_key()).await {
            println!("{} Key looks usable", style("✓").green());
        } else {
            println!("{} Key looks invalid or unusable", style("!").yellow());
        }
    }

    store.set_api_key(kind, &api_key)?;
    println!("{} API key saved", style("✓").green());
    Ok(())
}

/// Interactive translate loop. Lines starting with `:` change settings;
/// language changes translate the last text again.
pub async fn run_session(
    dispatcher: &mut Dispatcher,
    store: &mut PreferenceStore,
    options: DispatchOptions,
) -> anyhow::Result<()> {
    print_header("quicktrans - session");
    println!(
        "{}",
        style("Type text to translate. Commands: :to L  :from L  :mode auto|L  :model M  :quit").dim()
    );

    loop {
        let line: String = Input::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let change = match line.split_once(' ').unwrap_or((line, "")) {
            (":quit" | ":q", _) => break,
            (":to", code) => Some(LanguageChange::Target(code.trim().to_string())),
            (":from", code) => Some(LanguageChange::Source(code.trim().to_string())),
            (":mode", mode) => match mode.parse::<ResultLanguageMode>() {
                Ok(mode) => Some(LanguageChange::Mode(mode)),
                Err(e) => {
                    eprintln!("{} {}", style("✗").red(), e);
                    continue;
                }
            },
            (":model", model) => {
                match store.set_model(model.trim()) {
                    Ok(()) => println!("{} Model set to {}", style("✓").green(), model.trim()),
                    Err(e) => eprintln!("{} {}", style("✗").red(), e),
                }
                continue;
            }
            _ if line.starts_with(':') => {
                eprintln!("{} Unknown command: {}", style("✗").red(), line);
                continue;
            }
            _ => None,
        };

        let result = match change {
            Some(change) => {
                with_spinner("Translating...", dispatcher.apply_language_change(store, change))
                    .await
            }
            None => with_spinner(
                "Translating...",
                dispatcher.submit(store, line, Trigger::Manual, &options),
            )
            .await
            .map(Some),
        };

        match result {
            Ok(Some(outcome)) => print_outcome(&outcome),
            Ok(None) => println!("{} Settings updated", style("✓").green()),
            Err(e) => eprintln!("{} {}", style("✗").red(), e),
        }
    }

    Ok(())
}
