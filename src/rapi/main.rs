use clap::Parser;
use colored::*;
use rapi::client::ApiClient;
use rapi::entity::{ListOptions, SortDirection};
use rapi::error::{RapiError, Result};
use rapi::profile::{config_dir, ProfileStore};
use rapi::transport::http::HttpTransport;
use rapi::transport::Method;
use serde_json::Value;

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

struct AppContext {
    client: ApiClient<HttpTransport>,
    store: ProfileStore,
    verbose: bool,
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Config management works without a reachable API.
    if let Commands::Config { key, value } = &cli.command {
        return handle_config(cli.profile.as_deref(), key.clone(), value.clone());
    }

    let ctx = init_context(&cli)?;

    match cli.command {
        Commands::List {
            resource,
            filters,
            sort,
            desc,
            page,
            page_size,
            all,
            max_pages,
        } => handle_list(
            &ctx, &resource, &filters, sort, desc, page, page_size, all, max_pages,
        ),
        Commands::Get { resource, id } => handle_get(&ctx, &resource, &id),
        Commands::Create { resource, data } => handle_create(&ctx, &resource, &data),
        Commands::Update { resource, id, data } => handle_update(&ctx, &resource, &id, &data),
        Commands::Delete { resource, id } => handle_delete(&ctx, &resource, &id),
        Commands::Action {
            resource,
            id,
            action,
            method,
            data,
        } => handle_action(&ctx, &resource, &id, &action, &method, data.as_deref()),
        Commands::Ping => handle_ping(&ctx),
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let store = ProfileStore::load(config_dir()?)?;
    let mut profile = store.resolve(cli.profile.as_deref())?;

    // Explicit flags win over environment and file.
    if let Some(url) = &cli.url {
        profile.url = url.trim_end_matches('/').to_string();
    }
    if let Some(username) = &cli.username {
        profile.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        profile.password = Some(password.clone());
    }

    let verbose = cli.verbose || profile.debug;
    let client = ApiClient::from_settings(&profile)?;

    Ok(AppContext {
        client,
        store,
        verbose,
    })
}

#[allow(clippy::too_many_arguments)]
fn handle_list(
    ctx: &AppContext,
    resource: &str,
    filters: &[String],
    sort: Option<String>,
    desc: bool,
    page: Option<usize>,
    page_size: Option<usize>,
    all: bool,
    max_pages: Option<usize>,
) -> Result<()> {
    let options = build_options(filters, sort, desc, page, page_size)?;
    let entity = ctx.client.entity(ctx.store.entity(resource));

    if all {
        trace(ctx, &format!("GET {} (paginated)", resource));
        let mut count: usize = 0;
        for item in entity.paginate(&options, max_pages)? {
            print_value(&item?);
            count += 1;
        }
        eprintln!("{}", format!("{} items", count).dimmed());
        return Ok(());
    }

    trace(ctx, &format!("GET {}", resource));
    let response = entity.list(&options)?;
    if let Some(data) = response.into_result()? {
        print_value(&data);
    }
    Ok(())
}

fn handle_get(ctx: &AppContext, resource: &str, id: &str) -> Result<()> {
    trace(ctx, &format!("GET {}/{}", resource, id));
    let entity = ctx.client.entity(ctx.store.entity(resource));
    if let Some(data) = entity.get(id).into_result()? {
        print_value(&data);
    }
    Ok(())
}

fn handle_create(ctx: &AppContext, resource: &str, data: &str) -> Result<()> {
    let body = parse_json(data)?;
    trace(ctx, &format!("POST {}", resource));
    let entity = ctx.client.entity(ctx.store.entity(resource));
    if let Some(data) = entity.create(body).into_result()? {
        print_value(&data);
    }
    println!("{}", format!("Created {}", singular(resource)).green());
    Ok(())
}

fn handle_update(ctx: &AppContext, resource: &str, id: &str, data: &str) -> Result<()> {
    let body = parse_json(data)?;
    trace(ctx, &format!("PUT {}/{}", resource, id));
    let entity = ctx.client.entity(ctx.store.entity(resource));
    if let Some(data) = entity.update(id, body).into_result()? {
        print_value(&data);
    }
    println!("{}", format!("Updated {} {}", singular(resource), id).green());
    Ok(())
}

fn handle_delete(ctx: &AppContext, resource: &str, id: &str) -> Result<()> {
    trace(ctx, &format!("DELETE {}/{}", resource, id));
    let entity = ctx.client.entity(ctx.store.entity(resource));
    entity.delete(id).into_result()?;
    println!("{}", format!("Deleted {} {}", singular(resource), id).green());
    Ok(())
}

fn handle_action(
    ctx: &AppContext,
    resource: &str,
    id: &str,
    action: &str,
    method: &str,
    data: Option<&str>,
) -> Result<()> {
    let method: Method = method.parse()?;
    let body = data.map(parse_json).transpose()?;
    trace(ctx, &format!("{} {}/{}/{}", method, resource, id, action));

    let entity = ctx.client.entity(ctx.store.entity(resource));
    if let Some(data) = entity.custom_action(id, action, method, body).into_result()? {
        print_value(&data);
    }
    println!("{}", format!("{} {} {}: ok", action, singular(resource), id).green());
    Ok(())
}

fn handle_ping(ctx: &AppContext) -> Result<()> {
    trace(ctx, &format!("GET {}", ctx.client.base_url()));
    let response = ctx.client.get("", &[]);
    let status = response.status_code;
    response.into_result()?;
    println!("{}", format!("OK ({})", status).green());
    Ok(())
}

const PROFILE_KEYS: [&str; 7] = [
    "url",
    "username",
    "password",
    "timeout",
    "debug",
    "max-retries",
    "backoff",
];

fn handle_config(profile: Option<&str>, key: Option<String>, value: Option<String>) -> Result<()> {
    let dir = config_dir()?;
    let mut store = ProfileStore::load(&dir)?;
    let name = profile.unwrap_or("default");

    match (key, value) {
        (None, _) => {
            let profile = store.profile(name).cloned().unwrap_or_default();
            for key in PROFILE_KEYS {
                println!("{} = {}", key, display_value(&profile, key));
            }
            Ok(())
        }
        (Some(key), None) => {
            let profile = store.profile(name).cloned().unwrap_or_default();
            if profile.get(&key).is_none() && !PROFILE_KEYS.contains(&key.as_str()) {
                return Err(RapiError::Config(format!("Unknown config key: {}", key)));
            }
            println!("{} = {}", key, display_value(&profile, &key));
            Ok(())
        }
        (Some(key), Some(value)) => {
            store.profile_mut(name).set(&key, &value)?;
            store.save(&dir)?;
            println!("{}", format!("Set {} on profile {}", key, name).green());
            Ok(())
        }
    }
}

/// Render a profile value for display. Passwords are never echoed.
fn display_value(profile: &rapi::Profile, key: &str) -> String {
    if key == "password" {
        return if profile.password.is_some() {
            "********".to_string()
        } else {
            "(unset)".to_string()
        };
    }
    match profile.get(key) {
        Some(value) if !value.is_empty() => value,
        _ => "(unset)".to_string(),
    }
}

fn build_options(
    filters: &[String],
    sort: Option<String>,
    desc: bool,
    page: Option<usize>,
    page_size: Option<usize>,
) -> Result<ListOptions> {
    let mut options = ListOptions::new();
    for raw in filters {
        let (key, value) = raw.split_once('=').ok_or_else(|| {
            RapiError::Validation(format!("Invalid filter `{}` (expected key=value)", raw))
        })?;
        options.filters.insert(key.to_string(), value.to_string());
    }
    options.sort = sort;
    if desc {
        options.order = Some(SortDirection::Desc);
    }
    options.page = page;
    options.page_size = page_size;
    Ok(options)
}

fn parse_json(data: &str) -> Result<Value> {
    serde_json::from_str(data)
        .map_err(|e| RapiError::Validation(format!("Invalid JSON body: {}", e)))
}

fn print_value(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => println!("{}", pretty),
        Err(_) => println!("{}", value),
    }
}

fn trace(ctx: &AppContext, line: &str) {
    if ctx.verbose {
        eprintln!("{}", line.dimmed());
    }
}

/// "users 7" reads better as "user 7" in status messages.
fn singular(resource: &str) -> &str {
    resource.strip_suffix('s').unwrap_or(resource)
}
