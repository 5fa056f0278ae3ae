use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use groupin_client::config::ClientConfig;
use groupin_client::{Session, SessionUpdate, transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging; stdout is the chat, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "groupin=info".into()),
        )
        .init();

    let config = ClientConfig::from_env()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let name = match config.display_name.clone() {
        Some(name) => name,
        None => match prompt_name(&mut lines).await? {
            Some(name) => name,
            None => return Ok(()),
        },
    };
    let mut session = Session::new(&name, config.key)?;

    let (relay, mut events) = transport::connect(&config.server_url).await?;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    info!("Relay went away, exiting");
                    break;
                };
                match session.handle_event(event) {
                    SessionUpdate::Joined(id) => println!("-- you are #{id}"),
                    SessionUpdate::Members(_) => {
                        let ids: Vec<String> = session.members().iter().map(|id| format!("#{id}")).collect();
                        println!("-- online: {}", ids.join(" "));
                    }
                    SessionUpdate::Appended => {
                        if let Some(entry) = session.timeline().latest() {
                            println!("{entry}");
                        }
                    }
                }
            }
            line = lines.next_line() => {
                let Some(text) = line? else { break };
                match session.compose(&text) {
                    Ok(Some(envelope)) => relay.send(envelope)?,
                    Ok(None) => {}
                    Err(e) => warn!("Message not sent: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// Ask for a display name until a non-blank one is given. `None` on EOF.
async fn prompt_name(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<String>> {
    loop {
        println!("Enter your name:");
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let name = line.trim();
        if !name.is_empty() {
            return Ok(Some(name.to_string()));
        }
    }
}
