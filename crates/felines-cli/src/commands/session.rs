use std::str::FromStr;
use std::sync::Arc;

use clap::Args;
use felines_core::content::ContentSource;
use felines_core::{Clock, Config, Cue, LiveSession, PlaybackBackend, SystemClock, VirtualBackend};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::{print_event, runtime};

const HELP: &str = "commands: like [n] | fact | refetch | mute | unmute | volume <0..1> | \
cue <meow|purr|trill> | dismiss | status | help | quit";

#[derive(Args)]
pub struct SessionArgs {
    /// Serve built-in facts instead of calling the network
    #[arg(long)]
    pub offline: bool,
    /// Seed for cue selection
    #[arg(long)]
    pub seed: Option<u64>,
    /// Run without a playback backend
    #[arg(long)]
    pub no_audio: bool,
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Like(u32),
    Fact,
    Refetch,
    Mute,
    Unmute,
    Volume(f32),
    Cue(Cue),
    Dismiss,
    Status,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| HELP.to_string())?;
        let arg = words.next();

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("like", None) => SessionCommand::Like(1),
            ("like", Some(n)) => SessionCommand::Like(
                n.parse()
                    .map_err(|_| format!("like expects a count, got '{n}'"))?,
            ),
            ("fact", None) => SessionCommand::Fact,
            ("refetch", None) => SessionCommand::Refetch,
            ("mute", None) => SessionCommand::Mute,
            ("unmute", None) => SessionCommand::Unmute,
            ("volume", Some(v)) => SessionCommand::Volume(
                v.parse()
                    .map_err(|_| format!("volume expects a number, got '{v}'"))?,
            ),
            ("cue", Some(id)) => SessionCommand::Cue(id.parse().map_err(|e| format!("{e}"))?),
            ("dismiss", None) => SessionCommand::Dismiss,
            ("status", None) => SessionCommand::Status,
            ("help", _) => SessionCommand::Help,
            ("quit" | "exit", None) => SessionCommand::Quit,
            _ => return Err(format!("unrecognised input '{}'; {HELP}", line.trim())),
        };
        if words.next().is_some() {
            return Err(format!("too many arguments; {HELP}"));
        }
        Ok(command)
    }
}

pub fn run(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if args.offline {
        config.content.offline = true;
    }
    if args.seed.is_some() {
        config.audio.seed = args.seed;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = (!args.no_audio)
        .then(|| Box::new(VirtualBackend::new(clock.clone())) as Box<dyn PlaybackBackend>);

    let rt = runtime()?;
    let session = LiveSession::from_config(&config, clock, backend)?;
    rt.block_on(repl(session))
}

async fn repl<S: ContentSource>(session: LiveSession<S>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut background = session.subscribe();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<SessionCommand>() {
                    Ok(SessionCommand::Quit) => break,
                    Ok(command) => execute(&session, command).await?,
                    Err(message) => eprintln!("{message}"),
                }
            }
            event = background.recv() => match event {
                Ok(event) => print_event(&event)?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "background events dropped"),
                // The session owns the sender, so this cannot close first.
                Err(RecvError::Closed) => break,
            },
        }
    }

    let snapshot = session.snapshot().await;
    info!(likes = snapshot.likes, "session ended");
    Ok(())
}

async fn execute<S: ContentSource>(
    session: &LiveSession<S>,
    command: SessionCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        SessionCommand::Like(n) => {
            for _ in 0..n {
                for event in &session.like().await.events {
                    print_event(event)?;
                }
            }
        }
        SessionCommand::Fact => {
            let result = session.fact().await;
            print_event(&session.content_event(&result))?;
        }
        SessionCommand::Refetch => {
            let result = session.refetch_fact().await;
            print_event(&session.content_event(&result))?;
        }
        SessionCommand::Mute => print_event(&session.set_muted(true).await)?,
        SessionCommand::Unmute => print_event(&session.set_muted(false).await)?,
        SessionCommand::Volume(v) => print_event(&session.set_volume(v).await)?,
        SessionCommand::Cue(cue) => match session.select_cue(cue).await {
            Ok(event) => print_event(&event)?,
            Err(e) => eprintln!("{e}"),
        },
        SessionCommand::Dismiss => match session.dismiss().await {
            Some(event) => print_event(&event)?,
            None => eprintln!("no notification to dismiss"),
        },
        SessionCommand::Status => {
            let snapshot = session.snapshot().await;
            println!("{}", serde_json::to_string(&snapshot)?);
            if let Some(item) = session.content().current().value() {
                println!("{}", serde_json::to_string(item)?);
            }
        }
        SessionCommand::Help => eprintln!("{HELP}"),
        SessionCommand::Quit => {}
    }
    Ok(())
}
