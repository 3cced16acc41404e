#![warn(missing_docs)]
//! # ponto-app binary
//!
//! Terminal entry point: a line-driven prompt over one clock-in session.

use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ponto_api::{ClockApiClient, HttpClockTransport};
use ponto_app::{
    AppConfig, DEFAULT_TICK_INTERVAL, PersistencePolicy, SessionController, SubmitFailure,
    SubmitOutcome, app_version,
};
use ponto_core::{DEFAULT_DEVICE_ID, FunctionCode, VIRTUAL_CLOCKS};
use ponto_prefs::FilePreferenceStore;
use ponto_ui::{Alert, AlertPresenter, ScreenView, function_options};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ponto-app", version = app_version(), about = "Electronic time-clock session")]
struct Cli {
    /// Base URL of the timekeeping API (https only).
    #[arg(long, env = "PONTO_API_BASE_URL")]
    api_base_url: String,

    /// Virtual clock device selected at startup.
    #[arg(long, env = "PONTO_DEVICE", default_value_t = DEFAULT_DEVICE_ID)]
    device: u32,

    /// File holding saved credentials.
    #[arg(long, env = "PONTO_PREFS_PATH", default_value = "ponto-preferences.json")]
    prefs_path: PathBuf,

    /// Log file; the terminal is kept for the prompt.
    #[arg(long, env = "PONTO_LOG_PATH", default_value = "ponto-app.log")]
    log_path: PathBuf,

    /// When saved credentials are written: `on-toggle` or `on-submit`.
    #[arg(
        long,
        env = "PONTO_PERSISTENCE",
        default_value = "on-toggle",
        value_parser = PersistencePolicy::from_str
    )]
    persistence: PersistencePolicy,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "PONTO_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

struct TerminalPresenter;

impl AlertPresenter for TerminalPresenter {
    fn present(&self, alert: &Alert) {
        println!();
        println!("[{}] {}", alert.title, alert.body);
        println!();
    }
}

enum Flow {
    Continue,
    Quit,
}

/// CLI entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_to_file(&cli.log_path)?;
    info!(version = app_version(), device_id = cli.device, "ponto-app starting");

    let transport = HttpClockTransport::new(Duration::from_secs(cli.timeout_secs))
        .context("build http transport")?;
    let api = ClockApiClient::new(&cli.api_base_url, Arc::new(transport))
        .context("configure api client")?;
    let store = Arc::new(FilePreferenceStore::new(&cli.prefs_path));
    let config = AppConfig {
        device_id: cli.device,
        persistence: cli.persistence,
        tick_interval: DEFAULT_TICK_INTERVAL,
    };

    let mut controller = SessionController::new(config, api, store, Arc::new(TerminalPresenter))
        .context("create session")?;
    controller.initialize().context("initialize session")?;

    println!("ponto-app {}", app_version());
    render(&controller.view());
    print_help();

    let run_result = run_prompt(&mut controller);
    controller.shutdown();
    run_result
}

fn init_tracing_to_file(log_path: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn run_prompt(controller: &mut SessionController) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("ponto> ");
        io::stdout().flush().context("flush prompt")?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.context("read command")?;

        match dispatch(controller, line.trim()) {
            Flow::Continue => {}
            Flow::Quit => return Ok(()),
        }
    }
}

fn dispatch(controller: &mut SessionController, line: &str) -> Flow {
    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "function" => match argument.parse::<FunctionCode>() {
            Ok(function) => {
                controller.select_function(function);
                println!("function: {}", function.label());
            }
            Err(error) => println!("{error}"),
        },
        "device" => match argument.parse::<u32>() {
            Ok(device_id) => match controller.select_device(device_id) {
                Ok(()) => render(&controller.view()),
                Err(error) => println!("{error}"),
            },
            Err(_) => println!("device expects a numeric id"),
        },
        "user" => controller.edit_username(argument),
        "password" => controller.edit_password(argument),
        "captcha" => controller.edit_captcha_answer(argument),
        "remember" => {
            let remember = controller.toggle_remember_credentials();
            println!("remember credentials: {}", if remember { "on" } else { "off" });
        }
        "reveal" => {
            let hidden = controller.toggle_password_visibility();
            println!("password {}", if hidden { "hidden" } else { "visible" });
        }
        "reload" => {
            controller.load_device_info_and_captcha();
            render(&controller.view());
        }
        "submit" => {
            if let SubmitOutcome::Failed(failure) = controller.submit() {
                match failure {
                    SubmitFailure::Transport => println!("submit failed: server unreachable"),
                    SubmitFailure::Decode => println!("submit failed: unreadable server response"),
                }
            }
            render(&controller.view());
        }
        "show" => render(&controller.view()),
        "help" => print_help(),
        "quit" | "exit" => return Flow::Quit,
        other => println!("unknown command {other:?}; type help"),
    }

    Flow::Continue
}

fn render(view: &ScreenView) {
    println!("{} | {}", view.clock_title, view.clock_text);
    println!("  function : {}", view.function_label);
    println!("  user     : {}", view.username);
    println!("  password : {}", view.password);
    println!(
        "  remember : {}",
        if view.remember_credentials { "[x]" } else { "[ ]" }
    );
    println!("  captcha  : {}", view.captcha_image);
    println!("  answer   : {}", view.captcha_answer);
    println!("  status   : {}", view.load_status);
}

fn print_help() {
    println!("commands:");
    for (code, label) in function_options() {
        println!("  function {code:<6} {label}");
    }
    for clock in VIRTUAL_CLOCKS {
        println!("  device {:<8} {}", clock.device_id, clock.title);
    }
    println!("  user <text> | password <text> | captcha <text>");
    println!("  remember | reveal | reload | submit | show | help | quit");
}
