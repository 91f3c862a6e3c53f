use anyhow::Result;
use clap::Parser;
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::{env, io};
use tokio::sync::mpsc;

mod ui;
mod utils;

use saidus::auth::{AuthClient, AuthError};
use saidus::models::Identity;
use saidus::session::Session;
use ui::{AuthEvent, AuthMode, AuthUI, ChatEvent, MessengerUI};

const DEFAULT_SERVER: &str = "http://localhost:8080";

/// Command line arguments for Saidus
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Saidus: a terminal messaging client.",
    long_about = "Saidus is a terminal messaging client: sign in or register against the \
    Saidus backend, pick a contact and chat.\n\n\
    The backend base URL comes from --server, the SAIDUS_SERVER environment variable, \
    or a localhost default, in that order."
)]
struct Args {
    /// Base URL of the authentication backend
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// File the application log is appended to
    #[arg(long, value_name = "PATH", default_value = "saidus.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    utils::setup_logging(args.log_file.to_str(), LevelFilter::Debug)?;
    info!("Saidus client starting up");
    info!("Logging to file: {}", args.log_file.display());

    let server = args
        .server
        .or_else(|| env::var("SAIDUS_SERVER").ok())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    info!("Auth backend: {}", server);
    let auth_client = AuthClient::new(&server);

    let mut terminal = ui::setup_terminal()?;
    let outcome = run(&mut terminal, auth_client).await;
    ui::restore_terminal(terminal)?;
    outcome?;

    println!("Chat session ended.");
    Ok(())
}

async fn run(
    terminal: &mut ui::Terminal<ui::CrosstermBackend<io::Stdout>>,
    auth_client: AuthClient,
) -> Result<()> {
    // Authentication gates everything: no identity, no messenger.
    let Some(identity) = run_auth_screen(terminal, &auth_client).await? else {
        return Ok(());
    };

    let welcome = format!("Добро пожаловать, {}!", identity.display_name);
    let mut session = Session::new(identity);
    run_messenger(terminal, &mut session, welcome).await
}

/// Drives the auth form until the user authenticates or quits.
///
/// The HTTP call runs as a background task feeding a channel the loop
/// polls, so drawing never blocks on the network; the form itself
/// keeps further submits disabled while one request is outstanding.
async fn run_auth_screen(
    terminal: &mut ui::Terminal<ui::CrosstermBackend<io::Stdout>>,
    auth_client: &AuthClient,
) -> Result<Option<Identity>> {
    let mut auth_ui = AuthUI::new();
    let (result_tx, mut result_rx) = mpsc::channel::<Result<Identity, AuthError>>(1);

    loop {
        terminal.draw(|f| auth_ui.draw(f))?;

        if let Ok(outcome) = result_rx.try_recv() {
            auth_ui.finish_request();
            match outcome {
                Ok(identity) => return Ok(Some(identity)),
                Err(e) => {
                    // Both rejections and connectivity failures render
                    // as their Display text; the identity stays unset
                    // and the user may resubmit.
                    auth_ui.show_error(e.to_string());
                }
            }
        }

        match auth_ui.handle_input()? {
            Some(AuthEvent::Quit) => return Ok(None),
            Some(AuthEvent::Submit(submission)) => {
                auth_ui.begin_request();
                let client = auth_client.clone();
                let tx = result_tx.clone();
                tokio::spawn(async move {
                    let outcome = match submission.mode {
                        AuthMode::Login => {
                            client.login(&submission.username, &submission.password).await
                        }
                        AuthMode::Register => {
                            client
                                .register(&submission.username, &submission.email, &submission.password)
                                .await
                        }
                    };
                    let _ = tx.send(outcome).await;
                });
            }
            None => {}
        }
    }
}

/// The messenger event loop: draw, read one input event, apply it to
/// the session.
async fn run_messenger(
    terminal: &mut ui::Terminal<ui::CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    welcome: String,
) -> Result<()> {
    let mut chat_ui = MessengerUI::new();
    chat_ui.show_notice(welcome);

    loop {
        terminal.draw(|f| chat_ui.draw(f, session))?;
        chat_ui.clean_notice(5);

        match chat_ui.handle_input(session)? {
            Some(ChatEvent::Quit) => return Ok(()),
            Some(ChatEvent::Select(contact_id)) => {
                // The list only offers directory ids, so a failure here
                // is a bug; log it and keep the current conversation.
                if let Err(e) = session.select(contact_id) {
                    error!("contact selection failed: {}", e);
                }
            }
            Some(ChatEvent::Submit(draft)) => {
                session.set_draft(&draft);
                if session.submit().is_some() {
                    chat_ui.clear_input();
                }
            }
            None => {}
        }
    }
}
