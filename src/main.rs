use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::{Commands, QueryArgs, ToolCommands};
use toolbind::ToolbindError;
use toolbind::api::{ApiRequest, ToolService};
use toolbind::config::Config;
use toolbind::domain::{AgentId, Membership, NewTool, Page, Tool, ToolStatus};
use toolbind::id::{CategoryId, ToolId};
use toolbind::store::SqliteStore;

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toolbind")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("toolbind.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none()
        && let Some(level) = config.log_level.as_deref()
    {
        builder.parse_filters(level);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
        println!("  Database: {}", config.storage.db_path.display());
    }

    let store = Arc::new(
        SqliteStore::open(&config.storage.db_path, config.storage.busy_timeout())
            .context("Failed to open database")?,
    );

    match &cli.command {
        Commands::Tool { command } => handle_tool_command(command, &store),
        Commands::Bind { agent, tool_ids } => handle_bind_command(agent, tool_ids, store, config),
        Commands::Bound(args) => handle_query_command(Membership::Bound, args, store, config),
        Commands::Unbound(args) => handle_query_command(Membership::Unbound, args, store, config),
        Commands::Call { method, params } => handle_call_command(method, params, store, config),
    }
}

fn parse_tool_id(id: &str) -> Result<ToolId> {
    id.parse::<ToolId>().wrap_err_with(|| format!("Invalid tool ID: {}", id))
}

fn parse_category_id(id: Option<&str>) -> Result<Option<CategoryId>> {
    id.map(|c| c.parse::<CategoryId>().wrap_err_with(|| format!("Invalid category ID: {}", c)))
        .transpose()
}

fn print_tool(tool: &Tool) {
    let status = match tool.status {
        ToolStatus::Active => tool.status.as_str().green(),
        ToolStatus::Inactive => tool.status.as_str().red(),
    };
    println!("{} {} [{}]", tool.id.to_string().dimmed(), tool.name.bold(), status);
    if !tool.description.is_empty() {
        println!("    {}", tool.description);
    }
}

fn handle_tool_command(command: &ToolCommands, store: &SqliteStore) -> Result<()> {
    info!("Handling tool command: {:?}", command);
    match command {
        ToolCommands::Add {
            name,
            description,
            category,
            inactive,
        } => {
            let mut new_tool = NewTool::new(name.as_str()).with_description(description.as_str());
            if let Some(category_id) = parse_category_id(category.as_deref())? {
                new_tool = new_tool.with_category(category_id);
            }
            if *inactive {
                new_tool = new_tool.inactive();
            }
            let tool = store.create_tool(new_tool).context("Failed to create tool")?;
            println!("{} {}", "Created:".green(), tool.id);
        }
        ToolCommands::Get { id } => {
            let tool_id = parse_tool_id(id)?;
            let tool = store
                .get_tool(&tool_id)?
                .ok_or_else(|| eyre!("Tool not found: {}", tool_id))?;
            print_tool(&tool);
        }
        ToolCommands::Status { id, status } => {
            let tool_id = parse_tool_id(id)?;
            let status = ToolStatus::from_str(status).ok_or_else(|| eyre!("Unknown status: {}", status))?;
            let tool = store.set_tool_status(&tool_id, status)?;
            print_tool(&tool);
        }
        ToolCommands::Delete { id } => {
            let tool_id = parse_tool_id(id)?;
            store.delete_tool(&tool_id)?;
            println!("{} {}", "Deleted:".red(), tool_id);
        }
    }
    Ok(())
}

fn handle_bind_command(agent: &str, tool_ids: &[String], store: Arc<SqliteStore>, config: &Config) -> Result<()> {
    let agent_id = AgentId::new(agent)?;
    let ids = tool_ids.iter().map(|id| parse_tool_id(id)).collect::<Result<Vec<_>>>()?;
    let service = ToolService::new(store, config);

    match service.reconciler().bind(&agent_id, &ids) {
        Ok(result) => {
            println!(
                "{} {} now has {} tool(s)",
                "Bound:".green(),
                result.agent_id,
                result.bound_tool_count
            );
            Ok(())
        }
        Err(ToolbindError::Validation { message, invalid_ids }) => {
            println!("{} {}", "Rejected:".red(), message);
            for id in &invalid_ids {
                println!("  {}", id);
            }
            Err(eyre!("{} invalid tool ID(s)", invalid_ids.len()))
        }
        Err(e) => Err(e).context("Bind failed"),
    }
}

fn handle_query_command(
    membership: Membership,
    args: &QueryArgs,
    store: Arc<SqliteStore>,
    config: &Config,
) -> Result<()> {
    info!("Listing {} tools for {}", membership, args.agent);
    let agent_id = AgentId::new(args.agent.as_str())?;
    let service = ToolService::new(store, config);
    let queries = service.queries();

    let filter = queries.filter(args.keyword.as_deref(), parse_category_id(args.category.as_deref())?)?;
    let page = queries.page_request(args.page, args.size)?;
    let result: Page<Tool> = queries.query(membership, &agent_id, &filter, page)?;

    for tool in &result.content {
        print_tool(tool);
    }
    println!(
        "{}",
        format!(
            "page {}/{} ({} total)",
            result.page, result.total_pages, result.total_elements
        )
        .dimmed()
    );
    Ok(())
}

fn handle_call_command(method: &str, params: &str, store: Arc<SqliteStore>, config: &Config) -> Result<()> {
    let params = serde_json::from_str(params).context("Params must be valid JSON")?;
    let service = ToolService::new(store, config);
    let response = service.dispatch(&ApiRequest::new(method, params));
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
