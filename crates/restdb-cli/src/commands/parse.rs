//! `restdb parse` - decode a virtual table.

use restdb_rewrite::RestAdapter;

use super::print_json;

pub fn run(uri: &str, single_valued: bool) -> anyhow::Result<()> {
    let adapter = RestAdapter::default();
    if single_valued {
        print_json(&adapter.decompose_uri(uri)?)
    } else {
        print_json(&adapter.parse_uri(uri)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_and_invalid() {
        assert!(run("/ledgers?page=1&header=x-id:a#$.data[*]", false).is_ok());
        assert!(run("/ledgers?page=1&page=2", true).is_ok());
        assert!(run("/ledgers?body=%7Bnot-json", false).is_err());
    }
}
