use clap::Args;
use felines_core::content::{ConfiguredSource, ContentCache};
use felines_core::{Config, Event};

use super::{print_event, runtime};

#[derive(Args)]
pub struct FactArgs {
    /// Content key to request (defaults to content.default_key)
    #[arg(long)]
    pub key: Option<String>,
    /// Serve a built-in fact instead of calling the network
    #[arg(long)]
    pub offline: bool,
}

pub fn run(args: FactArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if args.offline {
        config.content.offline = true;
    }
    let key = args.key.unwrap_or_else(|| config.content.default_key.clone());
    let source = ConfiguredSource::from_config(&config.content)?;
    let cache = ContentCache::with_field(source, config.content.field.clone());

    let result = runtime()?.block_on(cache.fetch(&key));
    match result {
        Ok(item) => print_event(&Event::ContentFetched {
            key: item.key,
            text: item.text,
            at: item.fetched_at,
        }),
        Err(e) => Err(e.into()),
    }
}
