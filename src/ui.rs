// UI layer: terminal prompts, spinners and paging built on `dialoguer`,
// `indicatif` and `crossterm`. Command flows go through these helpers and
// never read stdin directly.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::io::{self, BufRead, Write};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable that supplies the registration password instead of
/// prompting for it.
pub const PASSWORD_ENV: &str = "SLYFT_USER_REGISTRATION_PWD";

const DEFAULT_HEIGHT: u16 = 24;
const MIN_PASSWORD_LEN: usize = 6;

/// Bare-minimum email shape: something, `@`, something, `.`, something.
pub fn is_valid_email(s: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^.+@.+\..+$").expect("static regex"))
        .is_match(s)
}

pub fn is_valid_password(s: &str) -> bool {
    s.chars().count() >= MIN_PASSWORD_LEN
}

/// Ask a yes/no question. Defaults to "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("reading confirmation")
}

/// Free-text input. Empty answers are allowed when `allow_empty` is set.
pub fn read_line(prompt: &str, allow_empty: bool) -> Result<String> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(allow_empty)
        .interact_text()
        .context("reading input")?;
    Ok(answer.trim().to_string())
}

/// Ask for a row number in `1..=count` and return it zero-based.
pub fn choose_row(prompt: &str, count: usize) -> Result<usize> {
    let choice: usize = Input::new()
        .with_prompt(prompt)
        .validate_with(|n: &usize| -> Result<(), String> {
            if (1..=count).contains(n) {
                Ok(())
            } else {
                Err(format!("Please choose a number from the first column (1-{count})"))
            }
        })
        .interact_text()
        .context("reading choice")?;
    Ok(choice - 1)
}

pub fn read_email() -> Result<String> {
    Input::new()
        .with_prompt("Email")
        .validate_with(|s: &String| -> Result<(), &str> {
            if is_valid_email(s.trim()) {
                Ok(())
            } else {
                Err("Not a valid email address. Please try again.")
            }
        })
        .interact_text()
        .map(|s: String| s.trim().to_string())
        .context("reading email")
}

/// Read a password, hidden. With `confirm` the user types it twice. The
/// registration password may come from `SLYFT_USER_REGISTRATION_PWD`.
pub fn read_password(confirm: bool) -> Result<String> {
    if let Ok(pwd) = std::env::var(PASSWORD_ENV) {
        if !pwd.is_empty() {
            println!("Password: <<SUPPLIED BY ENV VARIABLE>>");
            return Ok(pwd);
        }
    }
    loop {
        let mut prompt = Password::new();
        prompt.with_prompt(format!("Password (min. {MIN_PASSWORD_LEN} characters)"));
        if confirm {
            prompt.with_confirmation("Please confirm password", "Passwords do not match");
        }
        let pwd = prompt.interact().context("reading password")?;
        let pwd = pwd.trim();
        if is_valid_password(pwd) {
            return Ok(pwd.to_string());
        }
        println!("Not a valid password. Please try again.");
    }
}

/// Spinner shown while a request is in flight. Call `finish_and_clear`
/// when done.
pub fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

pub fn terminal_height() -> u16 {
    crossterm::terminal::size()
        .map(|(_, h)| h)
        .unwrap_or(DEFAULT_HEIGHT)
}

/// Print `text` a screen at a time, waiting for Enter between pages.
pub fn page(text: &str) -> Result<()> {
    let page_len = usize::from(terminal_height().saturating_sub(2).max(1));
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for (idx, line) in text.lines().enumerate() {
        writeln!(stdout, "{line}")?;
        if (idx + 1) % page_len == 0 {
            write!(stdout, "-- Hit [ENTER] for next page >")?;
            stdout.flush()?;
            let mut buf = String::new();
            stdin.lock().read_line(&mut buf)?;
        }
    }
    Ok(())
}

/// Report a failed step in the `<context>: failed.` form.
pub fn report_error(context: &str, err: &anyhow::Error) {
    println!("{context}: failed.");
    println!("Details: {err:#}");
    tracing::debug!("{context} - failed - {err:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length() {
        assert!(is_valid_password("123456"));
        assert!(!is_valid_password("1234"));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("foo@bar.boo"));
        assert!(!is_valid_email("foobar.boo"));
        assert!(!is_valid_email("foobar@boo"));
    }
}
