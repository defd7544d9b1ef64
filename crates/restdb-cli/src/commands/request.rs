//! `restdb request` - print the HTTP request for a virtual table.

use restdb_rewrite::RestAdapter;
use std::path::Path;

use super::{load_config, print_json};

pub fn run(uri: &str, host: &str, http: bool, config: Option<&Path>) -> anyhow::Result<()> {
    let adapter = RestAdapter::new(&load_config(config)?);
    let request = adapter.request(uri, host, Some(!http))?;
    print_json(&request)
}
