//! `logo`: command-line access to the Logo Objects REST API.
//!
//! ```text
//! logo --base-url http://erp:32001/api/v1 search items --where CODE=KB --limit 5
//! logo action salesOrders ApplyCampaign --id 12 --post --param SUMMER
//! ```

mod logger;
mod transport;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use logo_core::{
    entities, ActionCall, ClientConfig, HttpMethod, HttpResponse, ListQuery, LogoClient, SearchQuery,
    Value,
};

use transport::Transport;

#[derive(Debug, Parser)]
#[command(name = "logo")]
#[command(about = "Query and modify Logo Objects entities")]
struct Cli {
    /// TOML file with `base_url`, `timeout_secs` and `[headers]`.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured base URL and `LOGO_BASE_URL`.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Raw filter expression, e.g. "CODE eq 'A'".
    #[arg(long)]
    q: Option<String>,
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    offset: Option<u32>,
    #[arg(long)]
    expand_level: Option<u32>,
    /// Ask the server for the total match count.
    #[arg(long)]
    count: bool,
}

impl ListArgs {
    fn to_query(&self) -> ListQuery {
        let mut query = ListQuery::new();
        if let Some(q) = &self.q {
            query = query.filter(q.as_str());
        }
        if !self.fields.is_empty() {
            query = query.fields(&self.fields);
        }
        if let Some(sort) = &self.sort {
            query = query.sort(sort.as_str());
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if let Some(level) = self.expand_level {
            query = query.expand_level(level);
        }
        if self.count {
            query = query.with_count(true);
        }
        query
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List records.
    List {
        entity: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Fetch one record by internal reference.
    Get {
        entity: String,
        id: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Create a record from JSON (`--data '{...}'` or `--data @file.json`).
    Create {
        entity: String,
        #[arg(long)]
        data: String,
    },
    /// Replace a record.
    Update {
        entity: String,
        id: String,
        #[arg(long)]
        data: String,
    },
    /// Change selected fields of a record.
    Patch {
        entity: String,
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        entity: String,
        id: String,
    },
    /// Search by example: text values match as prefixes, others exactly.
    Search {
        entity: String,
        #[arg(long = "where", value_name = "FIELD=VALUE", value_parser = parse_where)]
        criteria: Vec<(String, Value)>,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Call a verb endpoint such as ExportToXML or ApplyCampaign.
    Action {
        entity: String,
        name: String,
        #[arg(long)]
        id: Option<String>,
        /// Send as POST instead of GET.
        #[arg(long)]
        post: bool,
        #[arg(long = "param")]
        params: Vec<String>,
        #[arg(long)]
        data: Option<String>,
    },
    /// Show column metadata.
    Columns { entity: String },
    Track { entity: String },
    Untrack { entity: String },
    CheckTrack { entity: String },
}

/// `FIELD=VALUE`. Plain decimal numbers and `true`/`false` are typed; anything
/// else, including codes with leading zeros, stays text. `FIELD='...'` forces
/// text.
fn parse_where(raw: &str) -> Result<(String, Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {raw:?}"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in {raw:?}"));
    }
    Ok((field.to_string(), typed_value(value)))
}

fn typed_value(raw: &str) -> Value {
    if let Some(quoted) = raw
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return Value::Str(quoted.to_string());
    }
    if is_plain_number(raw) {
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
    }
    match raw.parse::<bool>() {
        Ok(b) => Value::Bool(b),
        Err(_) => Value::Str(raw.to_string()),
    }
}

/// `-?(0|[1-9][0-9]*)(\.[0-9]+)?`
fn is_plain_number(raw: &str) -> bool {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(int)
        && (int == "0" || !int.starts_with('0'))
        && frac.is_none_or(digits)
}

/// Known entity names resolve to their path; anything else is used verbatim.
fn entity_path(name: &str) -> &str {
    match entities::resolve(name) {
        Ok(info) => info.path,
        Err(_) => {
            tracing::debug!(entity = name, "not in catalogue, using as path");
            name
        }
    }
}

fn read_data(raw: &str) -> anyhow::Result<serde_json::Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("--data is not valid JSON")
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::new(String::new()),
    };
    let mut config = config.apply_env();
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if config.base_url.is_empty() {
        bail!("no base URL: pass --base-url, set LOGO_BASE_URL or use --config");
    }
    config.validate()?;
    Ok(config)
}

/// Records and parameter lists alike come back as JSON; an empty success
/// body prints nothing.
fn parse_any(client: &LogoClient, response: HttpResponse) -> logo_core::Result<Option<serde_json::Value>> {
    if response.is_success() && response.body.trim().is_empty() {
        return client.parse_empty(response).map(|_| None);
    }
    client.parse_record(response).map(Some)
}

fn run(cli: Cli) -> anyhow::Result<Option<serde_json::Value>> {
    let config = load_config(&cli)?;
    let client = LogoClient::from_config(&config);
    let transport = Transport::new(Duration::from_secs(config.timeout_secs));
    let exec = |req: logo_core::HttpRequest| transport.execute(req);

    let output = match cli.command {
        Command::List { entity, list } => {
            let req = client.build_list(entity_path(&entity), &list.to_query())?;
            let page = client.parse_page::<serde_json::Value>(exec(req)?)?;
            Some(serde_json::to_value(page)?)
        }
        Command::Get { entity, id, list } => {
            let req = client.build_get(entity_path(&entity), &id, &list.to_query())?;
            Some(client.parse_record(exec(req)?)?)
        }
        Command::Create { entity, data } => {
            let req = client.build_create(entity_path(&entity), &read_data(&data)?)?;
            Some(client.parse_record(exec(req)?)?)
        }
        Command::Update { entity, id, data } => {
            let req = client.build_update(entity_path(&entity), &id, &read_data(&data)?)?;
            Some(client.parse_record(exec(req)?)?)
        }
        Command::Patch { entity, id, data } => {
            let req = client.build_patch(entity_path(&entity), &id, &read_data(&data)?)?;
            Some(client.parse_record(exec(req)?)?)
        }
        Command::Delete { entity, id } => {
            let req = client.build_delete(entity_path(&entity), &id)?;
            client.parse_empty(exec(req)?)?;
            tracing::info!(entity = %entity, id = %id, "deleted");
            None
        }
        Command::Search {
            entity,
            criteria,
            list,
        } => {
            let search = SearchQuery::from_pairs(criteria);
            let req = client.build_search(entity_path(&entity), &search, &list.to_query())?;
            let page = client.parse_page::<serde_json::Value>(exec(req)?)?;
            Some(serde_json::to_value(page)?)
        }
        Command::Action {
            entity,
            name,
            id,
            post,
            params,
            data,
        } => {
            let method = if post { HttpMethod::Post } else { HttpMethod::Get };
            let mut call = ActionCall::new(method, name);
            if let Some(id) = id {
                call = call.on(id);
            }
            for param in params {
                call = call.param(param);
            }
            if let Some(data) = data {
                call = call.json(read_data(&data)?);
            }
            let req = client.build_action(entity_path(&entity), &call)?;
            parse_any(&client, exec(req)?)?
        }
        Command::Columns { entity } => {
            let req = client.build_db_columns(entity_path(&entity))?;
            Some(serde_json::to_value(client.parse_db_columns(exec(req)?)?)?)
        }
        Command::Track { entity } => {
            let req = client.build_track(entity_path(&entity))?;
            client.parse_empty(exec(req)?)?;
            None
        }
        Command::Untrack { entity } => {
            let req = client.build_untrack(entity_path(&entity))?;
            client.parse_empty(exec(req)?)?;
            None
        }
        Command::CheckTrack { entity } => {
            let req = client.build_check_track(entity_path(&entity))?;
            Some(serde_json::to_value(client.parse_track_status(exec(req)?)?)?)
        }
    };
    Ok(output)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    if let Some(output) = run(cli)? {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
