//! `curl2cookies`: write a Netscape cookie file from a curl command line.
//!
//! ```bash
//! curl2cookies cookies.txt curl 'https://example.com/' -H 'Cookie: a=1; b=2'
//! ```
//!
//! Paste the browser's "Copy as cURL" output after the file name. The
//! shell does the tokenizing; the first argument starting with `Cookie: `
//! is converted.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crustula_core::cookies_txt::convert_header_to_cookies_str;
use crustula_core::curl::cookie_header_from_args;

#[derive(Parser)]
#[command(
    name = "curl2cookies",
    about = "Write a Netscape cookie file from a copied curl command",
    version
)]
struct Cli {
    /// Cookie file to write.
    cookiefile: PathBuf,

    /// The curl command, starting with the literal word `curl`.
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true,
        value_name = "CURL_ARGS"
    )]
    curl: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.curl.first().map(String::as_str) != Some("curl") {
        bail!("expected a curl command after the cookie file, starting with `curl`");
    }
    let Some(header) = cookie_header_from_args(&cli.curl[1..]) else {
        bail!("no `Cookie: ` header found in the curl command");
    };

    let text = convert_header_to_cookies_str(header);
    std::fs::write(&cli.cookiefile, text)
        .with_context(|| format!("Failed to write cookie file: {}", cli.cookiefile.display()))?;
    Ok(())
}
