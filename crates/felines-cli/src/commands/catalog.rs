use clap::Subcommand;
use felines_core::catalog::{self, BREEDS, DID_YOU_KNOW, FACTS};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List cat breeds
    Breeds {
        /// Only show this breed
        #[arg(long)]
        name: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the built-in facts
    Facts,
    /// The "Did you know?" fact
    DidYouKnow,
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CatalogAction::Breeds { name, json } => {
            let breeds: Vec<_> = match name {
                Some(name) => vec![*catalog::find_breed(&name)
                    .ok_or_else(|| format!("unknown breed: {name}"))?],
                None => BREEDS.to_vec(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&breeds)?);
            } else {
                for breed in &breeds {
                    println!("{} (origin: {})", breed.name, breed.origin);
                    println!("  temperament: {}", breed.traits().collect::<Vec<_>>().join(", "));
                }
            }
        }
        CatalogAction::Facts => {
            for fact in FACTS {
                println!("- {fact}");
            }
        }
        CatalogAction::DidYouKnow => println!("{DID_YOU_KNOW}"),
    }
    Ok(())
}
