//! Line-oriented console front end over the handlers and the auth gate.

mod commands;
mod console;

use std::sync::Arc;

use inline_colorization::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

pub use commands::{Command, UnknownCommand, HELP};
pub use console::{describe, ConsoleAlerts, ConsoleNavigator};

use crate::gate::Navigator;
use crate::handlers::{AlertPresenter, LoginHandler, SignOutHandler, SignupHandler};
use crate::providers::IdentityProvider;
use crate::session::AuthHandle;

pub struct Shell {
    navigator: Arc<dyn Navigator>,
    auth: AuthHandle,
    login: LoginHandler,
    signup: SignupHandler,
    sign_out: SignOutHandler,
}

impl Shell {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        alerts: Arc<dyn AlertPresenter>,
        auth: AuthHandle,
    ) -> Self {
        Self {
            login: LoginHandler::new(provider.clone(), navigator.clone(), alerts.clone()),
            signup: SignupHandler::new(provider.clone(), navigator.clone(), alerts.clone()),
            sign_out: SignOutHandler::new(provider, alerts),
            navigator,
            auth,
        }
    }

    /// Execute one command. Returns `false` when the shell should stop.
    pub async fn execute(&self, command: Command) -> bool {
        debug!("shell command: {:?}", command);
        match command {
            Command::Login(form) => {
                self.login.submit(&form).await;
            }
            Command::Signup(form) => {
                self.signup.submit(&form).await;
            }
            Command::Logout => {
                self.sign_out.submit().await;
            }
            Command::SignupScreen => self.login.navigate_to_signup(),
            Command::Back => self.signup.navigate_to_login(),
            Command::Where => match self.auth.current() {
                Ok(state) => println!(
                    "  {} ({})",
                    self.navigator.current(),
                    describe(&state)
                ),
                Err(e) => {
                    warn!("{}", e);
                    return false;
                }
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
        }
        true
    }

    /// Read commands from `input` until it ends or `quit` is entered.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, input: R) -> std::io::Result<()> {
        println!("{style_bold}Felony Fitness{style_reset} (type 'help' for commands)");
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match Command::parse(&line) {
                Ok(Some(command)) => {
                    if !self.execute(command).await {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => println!("  {color_yellow}{e}{color_reset}"),
            }
        }
        Ok(())
    }
}
