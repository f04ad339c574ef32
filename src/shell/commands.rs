use std::fmt;

use crate::handlers::{LoginForm, SignupForm};

/// One line of shell input.
#[derive(Debug, Clone)]
pub enum Command {
    Login(LoginForm),
    Signup(SignupForm),
    Logout,
    /// Print the current location and auth state.
    Where,
    /// Follow the login screen's "Sign up" link.
    SignupScreen,
    /// Follow the signup screen's "Sign in" link.
    Back,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command '{}', try 'help'", self.0)
    }
}

pub const HELP: &str = "\
commands:
  login <email> <password>
  signup <first name> <last name> <email> <password> <confirm password>
  logout
  signup-screen            open the signup screen from login
  back                     return from signup to login
  where                    show the current screen and session
  help
  quit";

impl Command {
    /// Parse a whitespace-separated line. Missing form arguments are left
    /// empty so the form's own validation reports them. `Ok(None)` for a
    /// blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, UnknownCommand> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();
        let arg = |i: usize| args.get(i).copied().unwrap_or_default().to_string();

        let command = match name.to_lowercase().as_str() {
            "login" => Command::Login(LoginForm::new(arg(0), arg(1))),
            "signup" => Command::Signup(SignupForm {
                first_name: arg(0),
                last_name: arg(1),
                email: arg(2),
                password: arg(3),
                confirm_password: arg(4),
            }),
            "logout" | "signout" => Command::Logout,
            "where" => Command::Where,
            "signup-screen" => Command::SignupScreen,
            "back" => Command::Back,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}
