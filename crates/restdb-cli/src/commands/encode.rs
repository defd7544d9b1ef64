//! `restdb encode` - build a virtual table from its parts.

use anyhow::{Context, Result, bail};
use restdb_core::{HttpHeader, VirtualTableUri};

pub fn run(
    path: &str,
    params: &[String],
    headers: &[String],
    body: Option<&str>,
    fragment: Option<String>,
) -> Result<()> {
    println!("{}", build(path, params, headers, body, fragment)?.encode());
    Ok(())
}

fn build(
    path: &str,
    params: &[String],
    headers: &[String],
    body: Option<&str>,
    fragment: Option<String>,
) -> Result<VirtualTableUri> {
    let mut table = VirtualTableUri::new(path);

    for param in params {
        let Some((key, value)) = param.split_once('=') else {
            bail!("Query parameter '{param}' must be of the form key=value");
        };
        table = table.with_param(key, value);
    }

    for header in headers {
        let header = HttpHeader::parse(header)?;
        table = table.with_header(header.key, header.value);
    }

    if let Some(body) = body {
        let body = serde_json::from_str(body).context("Request body is not valid JSON")?;
        table = table.with_body(body);
    }

    if let Some(fragment) = fragment {
        table = table.with_fragment(fragment);
    }

    Ok(table)
}
