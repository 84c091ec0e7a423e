use anyhow::Result;

use crate::config::Config;

/// Print the configured source archives and their endpoint status.
pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<10} {:<44} STATUS", "SOURCE", "ENDPOINT");

    for (name, base) in [
        ("ia", config.ia.download_base.as_str()),
        ("hathi", config.hathi.metadata_base.as_str()),
    ] {
        let status = if reqwest::Url::parse(base).is_ok() {
            "OK"
        } else {
            "BAD ENDPOINT"
        };
        println!("{:<10} {:<44} {}", name, base, status);
    }

    Ok(())
}
