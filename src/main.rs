use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{error, info, warn};

use powerbank_admin::{
    admin_tui,
    admin_tui::screens::detail::detail_lines,
    api::ApiClient,
    cli::{Cli, Commands},
    config::Config,
    export::{self, ExportFormat},
    forms::{FormError, FormModal},
    listing::{filter::matches_search, ListQuery},
    resources::{Resource, ResourceHandle},
    session::{Session, TokenStore},
};

fn init_tui_logging() -> Result<()> {
    // The dashboard owns the terminal, so logs go to the file only
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("pb-admin.log")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    Ok(())
}

fn init_cli_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "pb-admin.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "powerbank_admin=info,pb_admin=info");
    }

    if matches!(cli.command, Commands::Tui) {
        init_tui_logging()?;
    } else {
        init_cli_logging();
    }

    let config = Config::from_env()?;
    config.validate()?;
    let store = TokenStore::new(&config.storage_path);

    match cli.command {
        Commands::Login { token, csrf } => {
            store.save_tokens(&token, csrf.as_deref())?;
            println!("Tokens saved to {}", store.path().display());
        }

        Commands::Logout => {
            store.clear_tokens()?;
            println!("Signed out");
        }

        Commands::Resources => {
            for resource in Resource::ALL {
                let mut traits = Vec::new();
                if resource.paginated() {
                    traits.push("paginated");
                }
                if resource.form().is_some() {
                    traits.push("editable");
                }
                if resource.can_delete() {
                    traits.push("deletable");
                }
                if resource.auto_refresh() {
                    traits.push("auto-refresh");
                }
                println!(
                    "{:<22} {:<28} {}",
                    resource.slug(),
                    resource.path(),
                    traits.join(", ")
                );
            }
        }

        command => {
            let api = ApiClient::new(&config, load_session(&store))?;
            if let Err(e) = run_api_command(command, &config, api).await {
                error!("{}", e);
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// A broken storage file is logged and treated as signed out
fn load_session(store: &TokenStore) -> Session {
    match store.load_session() {
        Ok(session) => session,
        Err(e) => {
            warn!("Could not read stored tokens: {}", e);
            Session::Unauthenticated
        }
    }
}

async fn run_api_command(command: Commands, config: &Config, api: ApiClient) -> Result<()> {
    match command {
        Commands::Tui => {
            info!("Launching admin TUI against {}", config.api_url);
            admin_tui::run(config.clone(), api).await?;
        }

        Commands::List {
            resource,
            page,
            search,
            filters,
            format,
        } => {
            let resource = Commands::parse_resource(&resource)?;
            let format = Commands::parse_format(&format)?;
            let handle = ResourceHandle::new(api, resource);

            let mut query = ListQuery::first_page(config.listing.page_size);
            query.page = page.max(1);
            query.filters = Commands::parse_filters(&filters)?.into_iter().collect();
            let needle = search.filter(|s| !s.trim().is_empty());
            if resource.server_search() {
                query.search = needle.clone();
            }

            let listed = handle.list(&query).await?;
            let mut rows = listed.items;
            if let (false, Some(needle)) = (resource.server_search(), &needle) {
                let fields: Vec<String> = resource.search_fields().iter().map(|f| f.to_string()).collect();
                rows.retain(|row| matches_search(row, &fields, needle));
            }

            let stdout = io::stdout();
            let table = resource.table();
            match format {
                ExportFormat::Table => {
                    export::write_table(&table, &rows, stdout.lock())?;
                    if let Some(cursor) = listed.pagination {
                        println!("\n{}", cursor.summary());
                    } else {
                        println!("\n{} {}", rows.len(), resource.title().to_lowercase());
                    }
                }
                ExportFormat::Csv => export::write_csv(&table, &rows, stdout.lock())?,
                ExportFormat::Json => export::write_json(&rows, stdout.lock())?,
            }
        }

        Commands::Show { resource, key } => {
            let resource = Commands::parse_resource(&resource)?;
            let record = ResourceHandle::new(api, resource).get(&key).await?;
            let lines = detail_lines(&record);
            let width = lines.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (label, value) in lines {
                println!("{:<width$}  {}", label, value, width = width);
            }
        }

        Commands::Create { resource, fields } => {
            let resource = Commands::parse_resource(&resource)?;
            let kind = resource
                .form()
                .ok_or_else(|| anyhow!("{} are read-only", resource.title()))?;
            let handle = ResourceHandle::new(api, resource);

            let mut modal = FormModal::create(kind);
            modal.apply_pairs(&fields)?;
            report_submit(modal.submit(&handle).await)?;
        }

        Commands::Update { resource, key, fields } => {
            let resource = Commands::parse_resource(&resource)?;
            let kind = resource
                .form()
                .ok_or_else(|| anyhow!("{} are read-only", resource.title()))?;
            let handle = ResourceHandle::new(api, resource);

            let current = handle.get(&key).await?;
            let mut modal = FormModal::edit(kind, &key, &current);
            modal.apply_pairs(&fields)?;
            report_submit(modal.submit(&handle).await)?;
        }

        Commands::Delete { resource, key, yes } => {
            let resource = Commands::parse_resource(&resource)?;
            if !resource.can_delete() {
                return Err(anyhow!("{} cannot be deleted", resource.title()));
            }
            if !yes && !confirm(&format!("Delete {} '{}'?", resource.slug(), key))? {
                println!("Cancelled");
                return Ok(());
            }
            let message = ResourceHandle::new(api, resource).delete(&key).await?;
            println!("{}", message.unwrap_or_else(|| format!("Deleted {} {}", resource.slug(), key)));
        }

        Commands::Login { .. } | Commands::Logout | Commands::Resources => {}
    }

    Ok(())
}

/// Print the outcome of a form submission; validation failures list every field
fn report_submit(result: Result<String, FormError>) -> Result<()> {
    match result {
        Ok(message) => {
            println!("{}", message);
            Ok(())
        }
        Err(FormError::Invalid { message, violations }) => {
            for (field, problem) in violations.iter() {
                eprintln!("  {}: {}", field, problem);
            }
            Err(anyhow!(message))
        }
        Err(e) => Err(e.into()),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
