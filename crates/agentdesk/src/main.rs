//! `agentdesk` - CLI and HTTP server for the client book
//!
//! This binary serves the client API and manages the client files directly.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use agentdesk::cli::{
    AddClientCommand, Cli, ClientsCommand, Command, ConfigCommand, NotesCommand, OutputFormat,
    ServeCommand, UpdateClientCommand,
};
use agentdesk::{init_logging, server, AdditionalField, Client, ClientId, ClientStore, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(cmd) => handle_serve(config, cmd).await,
        Command::Clients(cmd) => handle_clients(&config, cmd).await,
        Command::Notes(cmd) => handle_notes(&config, cmd).await,
        Command::Status(cmd) => handle_status(&config, cmd.json).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn open_store(config: &Config) -> anyhow::Result<ClientStore> {
    let store = ClientStore::open(config.data_dir())
        .await
        .with_context(|| format!("opening client store at {}", config.data_dir().display()))?;
    Ok(store.with_detail_files(config.storage.write_detail_files))
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    let store = Arc::new(open_store(&config).await?);
    server::serve(&config, store, server::shutdown_signal()).await?;
    Ok(())
}

async fn handle_clients(config: &Config, cmd: ClientsCommand) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    match cmd {
        ClientsCommand::List { format } => {
            let clients = store.get_all_clients().await;
            print_clients(&clients, format)?;
        }
        ClientsCommand::Show { id, json } => {
            let Some(client) = store.get_client(&ClientId::from(id.as_str())).await else {
                bail!("client not found: {id}");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&client)?);
            } else {
                print_client(&client);
            }
        }
        ClientsCommand::Add(cmd) => {
            let client = build_client(cmd);
            client.validate_mobile_number(&config.mobile_number_regex()?)?;
            let client = store.add_client(client).await?;
            println!("Added client {} ({})", client.id, client.name);
        }
        ClientsCommand::Update(cmd) => {
            let id = ClientId::from(cmd.id.as_str());
            let Some(existing) = store.get_client(&id).await else {
                bail!("client not found: {id}");
            };
            let client = apply_update(existing, cmd);
            client.validate_mobile_number(&config.mobile_number_regex()?)?;
            let client = store.update_client(&id, client).await?;
            println!("Updated client {} ({})", client.id, client.name);
        }
        ClientsCommand::Find { mobile } => {
            let clients = store.find_by_mobile_number(&mobile).await;
            if clients.is_empty() {
                println!("No client with mobile number {mobile}");
            } else {
                print_clients(&clients, OutputFormat::Table)?;
            }
        }
    }
    Ok(())
}

fn build_client(cmd: AddClientCommand) -> Client {
    let mut client = Client::new(cmd.name, cmd.mobile);
    client.age = cmd.age;
    client.additional_fields = cmd
        .fields
        .into_iter()
        .map(|(title, description)| AdditionalField::new(title, description))
        .collect();
    client.documents = cmd.documents;
    client
}

fn apply_update(mut client: Client, cmd: UpdateClientCommand) -> Client {
    if let Some(name) = cmd.name {
        client.name = name;
    }
    if let Some(mobile) = cmd.mobile {
        client.mobile_number = mobile;
    }
    if let Some(age) = cmd.age {
        client.age = Some(age);
    }
    client.additional_fields.extend(
        cmd.fields
            .into_iter()
            .map(|(title, description)| AdditionalField::new(title, description)),
    );
    client.documents.extend(cmd.documents);
    client
}

fn print_clients(clients: &[Client], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(clients)?),
        OutputFormat::Plain => {
            for client in clients {
                println!("{}\t{}\t{}", client.id, client.name, client.mobile_number);
            }
        }
        OutputFormat::Table => {
            let id_width = clients
                .iter()
                .map(|c| c.id.as_str().len())
                .chain([2])
                .max()
                .unwrap_or(2);
            let name_width = clients
                .iter()
                .map(|c| c.name.chars().count())
                .chain([4])
                .max()
                .unwrap_or(4);

            println!("{:<id_width$}  {:<name_width$}  MOBILE", "ID", "NAME");
            for client in clients {
                println!(
                    "{:<id_width$}  {:<name_width$}  {}",
                    client.id.as_str(),
                    client.name,
                    client.mobile_number
                );
            }
            println!();
            println!("{} client(s)", clients.len());
        }
    }
    Ok(())
}

fn print_client(client: &Client) {
    println!("Client {}", client.id);
    println!("---------------");
    println!("Name:          {}", client.name);
    println!("Mobile:        {}", client.mobile_number);
    if let Some(age) = client.age {
        println!("Age:           {age}");
    }
    if !client.additional_fields.is_empty() {
        println!();
        println!("[Additional fields]");
        for field in &client.additional_fields {
            println!("  {}: {}", field.title, field.description);
        }
    }
    if !client.documents.is_empty() {
        println!();
        println!("[Documents]");
        for doc in &client.documents {
            println!("  {doc}");
        }
    }
}

async fn handle_notes(config: &Config, cmd: NotesCommand) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    match cmd {
        NotesCommand::Show { id } => {
            let notes = store.get_notes(&ClientId::from(id)).await?;
            if notes.notes.is_empty() {
                println!("(no notes for client {})", notes.client_id);
            } else {
                println!("{}", notes.notes);
            }
        }
        NotesCommand::Set { id, text } => {
            let notes = store.save_notes(&ClientId::from(id), text).await?;
            println!("Saved notes for client {}", notes.client_id);
        }
    }
    Ok(())
}

async fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let stats = store.stats().await?;

    if json {
        let status = serde_json::json!({
            "listen_addr": config.listen_addr().to_string(),
            "store": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("agentdesk status");
        println!("----------------");
        println!("Data directory: {}", stats.data_dir.display());
        println!("Clients:        {}", stats.total_clients);
        println!("clients.json:   {} bytes", stats.clients_file_bytes);
        println!("Listen address: {}", config.listen_addr());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Listen address:     {}", config.listen_addr());
                println!();
                println!("[Storage]");
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Detail files:       {}", config.storage.write_detail_files);
                println!();
                println!("[Validation]");
                println!(
                    "  Strict mobile:      {}",
                    config.validation.strict_mobile_number
                );
                println!(
                    "  Mobile pattern:     {}",
                    config.validation.mobile_number_pattern
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
