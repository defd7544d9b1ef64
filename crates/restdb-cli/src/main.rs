use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "restdb", version, about = "RestDB CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push request-bound predicates from a SQL statement into its virtual table.
    Rewrite {
        /// Virtual table the statement reads from.
        #[arg(long)]
        uri: String,

        /// SQL statement to rewrite.
        #[arg(long)]
        sql: String,

        /// Configuration file (YAML).
        #[arg(long, short = 'c', env = "RESTDB_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Decode a virtual table and print its parts as JSON.
    Parse {
        uri: String,

        /// One value per query parameter and header.
        #[arg(long, default_value_t = false)]
        single_valued: bool,
    },

    /// Build a virtual table from its parts.
    Encode {
        /// Endpoint path, e.g. /reports/v2.0/ledgers
        #[arg(long)]
        path: String,

        /// Query parameter as key=value (repeatable).
        #[arg(long = "param")]
        params: Vec<String>,

        /// Header as name:value (repeatable).
        #[arg(long = "header")]
        headers: Vec<String>,

        /// JSON request body.
        #[arg(long)]
        body: Option<String>,

        /// JSONPath selecting rows from the response.
        #[arg(long)]
        fragment: Option<String>,
    },

    /// Print the HTTP request a virtual table stands for.
    Request {
        uri: String,

        /// Host serving the endpoint, e.g. api.example.com
        #[arg(long)]
        host: String,

        /// Use plain HTTP instead of HTTPS.
        #[arg(long, default_value_t = false)]
        http: bool,

        /// Configuration file (YAML).
        #[arg(long, short = 'c', env = "RESTDB_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Validate a configuration file.
    Check {
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Rewrite { uri, sql, config } => {
            commands::rewrite::run(&uri, &sql, config.as_deref())?
        }
        Command::Parse { uri, single_valued } => commands::parse::run(&uri, single_valued)?,
        Command::Encode {
            path,
            params,
            headers,
            body,
            fragment,
        } => commands::encode::run(&path, &params, &headers, body.as_deref(), fragment)?,
        Command::Request {
            uri,
            host,
            http,
            config,
        } => commands::request::run(&uri, &host, http, config.as_deref())?,
        Command::Check { config } => commands::check::run(&config)?,
    }

    Ok(())
}
