// Account flows: register, login, logout and account deletion. A
// successful register/login stores the session headers in the config
// store; logout and deletion clear them.

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::{debug, error};

use super::Session;
use crate::api::{ApiError, AuthFlow};
use crate::cli::UserCommand;
use crate::models::{Credentials, TermsAcceptance};
use crate::ui;

pub fn run(session: &mut Session<'_>, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::Register => register(session),
        UserCommand::Login => login(session),
        UserCommand::Logout => logout(session),
        UserCommand::Delete => delete_account(session),
    }
}

fn read_credentials(confirm: bool) -> Result<Credentials> {
    let email = ui::read_email()?;
    let password = ui::read_password(confirm)?;
    let password_confirmation = if confirm { password.clone() } else { String::new() };
    Ok(Credentials {
        email,
        password,
        password_confirmation,
        terms_acceptance: TermsAcceptance::default(),
    })
}

/// Show the current terms page by page and ask for acceptance.
fn accept_terms(session: &Session<'_>) -> Result<bool> {
    println!();
    println!("For a successful registration, we kindly ask you to read and accept our");
    println!("Terms and Conditions.");
    ui::read_line("Press [ENTER] to view them", true)?;

    let terms_url = session.api.terms_url()?;
    let terms = session.api.fetch_text(&terms_url)?;
    println!("\n-------------------------------------------------");
    ui::page(&terms)?;
    println!("-------------------------------------------------");

    ui::confirm("Do you accept the Terms and Conditions?")
}

fn authenticate(session: &mut Session<'_>, flow: AuthFlow, creds: &Credentials) -> Result<()> {
    let spinner = ui::spinner(match flow {
        AuthFlow::Register => "Registering...",
        AuthFlow::Login => "Logging in...",
    })?;
    let result = session.api.authenticate(flow, creds);
    spinner.finish_and_clear();

    match result {
        Ok(auth) => {
            session.store.write_auth(&auth)?;
            session.api.set_auth(auth);
            Ok(())
        }
        Err(ApiError::Rejected { status, messages }) => {
            let what = match flow {
                AuthFlow::Register => "registration",
                AuthFlow::Login => "login",
            };
            println!("\nWe're sorry, but your {what} failed due to the following errors:");
            for msg in &messages {
                println!("* {msg}");
            }
            bail!("Server returned failure: {status}")
        }
        Err(e) => Err(e.into()),
    }
}

fn register(session: &mut Session<'_>) -> Result<()> {
    println!("\nThank you for your interest in Slyft! Please provide us your email address and");
    println!("a password (min. 6 characters). Please make sure you have access to the email account given");
    println!("as we will send you a confirmation email to this address.\n");

    let mut creds = read_credentials(true)?;
    if !accept_terms(session)? {
        bail!("You need to accept the terms first.");
    }
    creds.terms_acceptance = TermsAcceptance {
        accepted: true,
        timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%z").to_string(),
    };

    if let Err(e) = authenticate(session, AuthFlow::Register, &creds) {
        println!("We're very sorry, but your registration failed.");
        return Err(e);
    }
    println!("\nRegistration successful. We've sent you a confirmation email to the email address");
    println!("you have given. Please have a look at your inbox for a new message from");
    println!("`info@slyft.io` and follow the instructions presented there to activate your account.\n");
    Ok(())
}

fn login(session: &mut Session<'_>) -> Result<()> {
    let creds = read_credentials(false)?;
    if let Err(e) = authenticate(session, AuthFlow::Login, &creds) {
        println!("Sorry, login failed");
        return Err(e);
    }
    println!("Login successful, have fun! For documentation, please have a look at www.slyft.io/docs");
    Ok(())
}

/// DELETE an auth endpoint and forget the local session whatever the
/// server says.
fn end_session(session: &Session<'_>, endpoint: &str) -> Result<()> {
    let result = session.api.end_session(endpoint);
    if let Err(e) = session.store.clear_auth() {
        error!("cannot clear stored session: {e:#}");
    }
    debug!(endpoint, ok = result.is_ok(), "session ended");
    Ok(result?)
}

fn logout(session: &Session<'_>) -> Result<()> {
    match end_session(session, "/auth/sign_out") {
        Ok(()) => {
            println!("Bye for now. Looking forward to seeing you soon...");
            Ok(())
        }
        Err(e) => {
            println!("Sorry, logout failed.");
            Err(e)
        }
    }
}

fn delete_account(session: &Session<'_>) -> Result<()> {
    if !session.api.has_auth() {
        println!("You do not seem to be logged in. Please do a `slyft user login`");
        return Ok(());
    }

    println!("You may choose to delete your Slyft account at any time. Please be aware");
    println!("that all previously processed data under your account will be deleted.\n");

    if !ui::confirm("Are you sure to delete your user account?")? {
        println!("Account left unchanged.");
        return Ok(());
    }
    end_session(session, "/auth")?;
    println!("Deleted the account. We are sorry to see you go. Come back soon...");
    Ok(())
}
