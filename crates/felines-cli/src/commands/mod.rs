pub mod catalog;
pub mod config;
pub mod fact;
pub mod session;
pub mod simulate;

use felines_core::Event;

/// Runtime for commands that talk to the network or schedule hides.
pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// One event per line, as JSON.
pub fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
