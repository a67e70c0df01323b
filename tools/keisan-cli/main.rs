use clap::{Parser, Subcommand};
use itertools::Itertools;
use keisan::ast::DisplayFormula;
use keisan::catalog;
use keisan::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

/// Drive the derived-field form engine against a local record store
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to an engine config JSON file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the catalog forms
    List,
    /// Print a form's fields, and optionally its calculation rules
    Show {
        form: String,
        #[arg(long)]
        rules: bool,
    },
    /// Replay an edit script against a stored record
    Run {
        form: String,
        /// Record identifier, e.g. a patient or staff ID
        #[arg(long)]
        id: String,
        /// Directory holding one JSON file per record
        #[arg(long, default_value = "records")]
        store: String,
        /// Path to the edit script JSON file
        #[arg(long)]
        script: Option<String>,
        /// Save the record after the edits
        #[arg(long)]
        save: bool,
    },
    /// Edit a stored record interactively
    Edit {
        form: String,
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "records")]
        store: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => EngineConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start runtime: {}", e)));

    match cli.command {
        Command::List => list_forms(),
        Command::Show { form, rules } => show_form(&form, rules),
        Command::Run {
            form,
            id,
            store,
            script,
            save,
        } => runtime.block_on(run_script(&form, &id, &store, script, save, config)),
        Command::Edit { form, id, store } => {
            runtime.block_on(run_interactive(&form, &id, &store, config))
        }
    }
}

fn load_form(id: &str) -> FormDefinition {
    match catalog::get_form(id) {
        Ok(Some(form)) => form,
        Ok(None) => exit_with_error(&format!(
            "Unknown form '{}'. Run `keisan-cli list` to see the catalog.",
            id
        )),
        Err(e) => exit_with_error(&format!("Catalog form is invalid: {}", e)),
    }
}

fn list_forms() {
    let forms = catalog::all_forms()
        .unwrap_or_else(|e| exit_with_error(&format!("Catalog form is invalid: {}", e)));
    for form in forms {
        println!(
            "{:<18} {} ({} fields, {} rules)",
            form.id,
            form.title,
            form.fields().len(),
            form.rules().len()
        );
    }
}

fn show_form(id: &str, show_rules: bool) {
    let form = load_form(id);
    println!("--- {} ({}) ---", form.title, form.id);
    for field in form.fields() {
        let mut flags = Vec::new();
        if field.read_only {
            flags.push("read-only".to_string());
        }
        if !field.options.is_empty() {
            flags.push(format!("options: {}", field.options.join(" | ")));
        }
        println!(
            "  {:<22} {:<10} {}{}",
            field.name,
            format!("{:?}", field.kind).to_lowercase(),
            field.label,
            if flags.is_empty() {
                String::new()
            } else {
                format!("  [{}]", flags.join(", "))
            }
        );
    }

    if show_rules {
        println!("\n--- Calculation Rules ---");
        for rule in form.rules() {
            println!(
                "{} <- [{}]{}",
                rule.target,
                rule.dependencies.join(", "),
                rule.precision()
                    .map_or(String::new(), |p| format!(" ({} decimals)", p))
            );
            match rule.as_formula() {
                Some(formula) => print!("{}", DisplayFormula { formula }),
                None => println!("└── <custom>"),
            }
        }
    }
}

async fn run_script(
    form_id: &str,
    record_id: &str,
    store: &str,
    script_path: Option<String>,
    save: bool,
    config: EngineConfig,
) {
    let total_start = Instant::now();
    let service = JsonFileRecordService::new(store);
    let engine = FormEngine::with_config(load_form(form_id), config);

    let record = engine.load_from(&service, record_id).await;
    println!(
        "Loaded '{}' for '{}' ({} stored fields)",
        form_id,
        record_id,
        record.len()
    );

    let script = match script_path {
        Some(path) => EditScript::from_file(&path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load edit script '{}': {}", path, e))
        }),
        None => {
            println!("No edit script provided. Recalculating the stored record.");
            EditScript::default()
        }
    };

    for (field, value) in script.initial.sorted() {
        engine.apply_edit(field, &value.to_string());
    }

    let report = engine.recalculate();
    print_updates("recalculate", &engine, &report);

    let edit_start = Instant::now();
    for edit in &script.edits {
        let report = engine.apply_edit_with_report(&edit.field, &edit.value);
        print_updates(&format!("{} = {:?}", edit.field, edit.value), &engine, &report);
    }
    let edit_duration = edit_start.elapsed();

    print_record(&engine.record());

    if save {
        match engine.save_to(&service).await {
            Ok(()) => println!("\nSaved to '{}'", store),
            Err(e) => exit_with_error(&e.user_message()),
        }
    }

    println!("\n--- Summary ---");
    println!("Edits Applied:        {}", script.edits.len());
    println!("Edit Processing:      {:?}", edit_duration);
    println!("Total Execution:      {:?}", total_start.elapsed());
}

/// Runs an edit session, reading `field=value` lines from stdin.
async fn run_interactive(form_id: &str, record_id: &str, store: &str, config: EngineConfig) {
    let service = JsonFileRecordService::new(store);
    let engine = FormEngine::with_config(load_form(form_id), config);
    engine.load_from(&service, record_id).await;

    println!("--- Keisan Interactive Mode: {} ---", engine.definition().title);
    println!("Enter `field=value` to edit, `show`, `save`, or `quit`.");
    print_bindings(&engine);

    loop {
        let line = prompt_for_input("edit");
        match line.as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "show" => print_bindings(&engine),
            "save" => match engine.save_to(&service).await {
                Ok(()) => println!("Saved."),
                Err(e) => println!("Error: {}", e.user_message()),
            },
            _ => match line.split_once('=') {
                Some((field, value)) => {
                    let field = field.trim();
                    if let Some(binding) = engine
                        .bindings()
                        .into_iter()
                        .find(|b| b.descriptor.name == field)
                        && !binding.editable
                    {
                        println!("'{}' is calculated and cannot be edited.", field);
                        continue;
                    }
                    let report = engine.apply_edit_with_report(field, value.trim());
                    print_updates(field, &engine, &report);
                }
                None => println!("Expected `field=value`, `show`, `save`, or `quit`."),
            },
        }
    }
}

fn print_updates(label: &str, engine: &FormEngine, report: &Convergence) {
    if report.updates.is_empty() {
        return;
    }
    println!("\n{} ({} passes)", label, report.passes);
    for field in report.updates.iter().map(|u| &u.field).unique() {
        let explanation = engine.explain(field).unwrap_or_default();
        println!("  -> {} = {}    {}", field, report.record.get(field), explanation);
    }
    if report.capped {
        println!("  !! rules did not converge; derived values may be incomplete");
    }
}

fn print_record(record: &FormRecord) {
    println!("\n--- Record ---");
    for (field, value) in record.sorted() {
        println!("  {:<22} {}", field, value);
    }
}

fn print_bindings(engine: &FormEngine) {
    for binding in engine.bindings() {
        println!(
            "  {:<22} {:<12} {}{}",
            binding.descriptor.name,
            binding.value.to_string(),
            binding.descriptor.label,
            if binding.editable { "" } else { " (calculated)" }
        );
    }
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str) -> String {
    let mut line = String::new();
    print!("> {}: ", prompt_text);
    if io::stdout().flush().is_err() || io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
        return "quit".to_string();
    }
    line.trim().to_string()
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
