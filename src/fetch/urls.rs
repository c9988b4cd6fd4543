// src/fetch/urls.rs
use anyhow::{Context, Result};
use url::Url;

use crate::config::PREFIX_PLACEHOLDER;

/// Three-digit, zero-padded form of a postal-code prefix (`7` → `"007"`).
pub fn prefix_code(prefix: u16) -> String {
    format!("{:03}", prefix)
}

/// Substitute `prefix` into the download template and parse the result.
pub fn prefix_url(template: &str, prefix: u16) -> Result<Url> {
    let expanded = template.replace(PREFIX_PLACEHOLDER, &prefix_code(prefix));
    Url::parse(&expanded).with_context(|| format!("parsing download URL {}", expanded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_code_pads() {
        assert_eq!(prefix_code(1), "001");
        assert_eq!(prefix_code(42), "042");
        assert_eq!(prefix_code(999), "999");
    }

    #[test]
    fn test_prefix_url() -> Result<()> {
        let url = prefix_url(
            "https://www.ups.com/media/us/currentrates/zone-csv/{post_code_prefix}.xls",
            4,
        )?;
        assert_eq!(
            url.as_str(),
            "https://www.ups.com/media/us/currentrates/zone-csv/004.xls"
        );
        Ok(())
    }

    #[test]
    fn test_prefix_url_rejects_garbage() {
        assert!(prefix_url("not a url {post_code_prefix}", 10).is_err());
    }
}
