use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;

use fraudboard::dashboard::Dashboard;
use fraudboard::error::ClientError;
use fraudboard::logging::{log_system, run_id, v_str};
use fraudboard::notify::Notice;
use fraudboard::service::{HttpPredictor, PredictionService};
use fraudboard::session::form::{Credentials, FormMode};
use fraudboard::session::{guard, Outcome, Route, View};
use fraudboard::state::{AppContext, Config};

#[derive(Debug, Parser)]
#[command(name = "fraudboard", version, about = "Fraud detection dashboard client")]
struct Cli {
    /// Prediction endpoint (overrides FRAUD_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Session database path (overrides SESSION_DB)
    #[arg(long, global = true)]
    session_db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and unlock the dashboard
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FRAUDBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account (local only)
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "FRAUDBOARD_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Sign out
    Logout,
    /// Show session and service status
    Status,
    /// Upload a transaction file and show predictions
    Upload {
        file: PathBuf,
        /// Print the mapped result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the processed dataset kept by the service
    Data,
}

fn print_notice(notice: &Notice) {
    if notice.is_error() {
        eprintln!("{}", notice);
    } else {
        println!("{}", notice);
    }
}

fn form_failed(err: ClientError) -> Result<ExitCode> {
    match err {
        ClientError::Validation(errs) => {
            for (field, msg) in errs.iter() {
                eprintln!("{}: {}", field.as_str(), msg);
            }
            Ok(ExitCode::from(2))
        }
        other => Err(other.into()),
    }
}

fn guarded(ctx: &AppContext, view: View) -> bool {
    match guard(&ctx.session, view) {
        Route::Render(_) => true,
        Route::Redirect(_) => {
            print_notice(&Notice::warning("Not signed in. Run `fraudboard login` first."));
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut cfg = Config::from_env();
    if let Some(endpoint) = cli.endpoint {
        cfg.endpoint = endpoint;
    }
    if let Some(path) = cli.session_db {
        cfg.session_db = path;
    }
    log_system(
        "startup",
        &[
            ("run_id", v_str(&run_id())),
            ("endpoint", v_str(&cfg.endpoint)),
            ("session_db", v_str(&cfg.session_db)),
        ],
    );

    let mut ctx = AppContext::open(cfg)?;

    match cli.command {
        Command::Login { email, password } => {
            let creds = Credentials::login(email, password);
            match ctx.session.submit(FormMode::Login, &creds) {
                Ok(Outcome::NavigateToDashboard) => {
                    print_notice(&Notice::success("Signed in. The dashboard is available."));
                }
                Ok(Outcome::AccountCreated) => {}
                Err(err) => return form_failed(err),
            }
        }
        Command::Signup { name, email, password, confirm } => {
            let creds = Credentials::signup(name, email, password, confirm);
            match ctx.session.submit(FormMode::Signup, &creds) {
                Ok(_) => {
                    print_notice(&Notice::success("Account created successfully!"));
                    println!("Sign in with `fraudboard login`.");
                }
                Err(err) => return form_failed(err),
            }
        }
        Command::Logout => {
            ctx.session.logout()?;
            print_notice(&Notice::info("Signed out."));
        }
        Command::Status => {
            let signed_in = ctx.session.is_authenticated();
            println!("session: {}", if signed_in { "signed in" } else { "signed out" });
            if let Some(ts) = ctx.session.authenticated_since() {
                if let Some(at) = chrono::DateTime::from_timestamp(ts, 0) {
                    println!("since:   {}", at.to_rfc3339());
                }
            }
            let predictor = HttpPredictor::new(&ctx.config)?;
            println!("endpoint: {}", predictor.endpoint());
            let up = predictor.health().await;
            println!("api:     {}", if up { "connected" } else { "disconnected" });
        }
        Command::Upload { file, json } => {
            if !guarded(&ctx, View::Dashboard) {
                return Ok(ExitCode::FAILURE);
            }
            let predictor = HttpPredictor::new(&ctx.config)?;
            let dash: &mut Dashboard = &mut ctx.dashboard;
            if let Err(err) = dash.select_path(&file).await {
                print_notice(&Notice::error(format!("Cannot read {}: {}", file.display(), err)));
                return Ok(ExitCode::FAILURE);
            }
            let notice = dash.upload(&predictor).await;
            if notice.is_error() {
                print_notice(&notice);
                return Ok(ExitCode::FAILURE);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(dash.result())?);
            } else {
                print_notice(&notice);
                println!();
                print!("{}", dash.render_kpis());
                println!();
                print!("{}", dash.render_table());
            }
        }
        Command::Data => {
            if !guarded(&ctx, View::Data) {
                return Ok(ExitCode::FAILURE);
            }
            let predictor = HttpPredictor::new(&ctx.config)?;
            match predictor.fetch_data().await {
                Ok(rows) if rows.is_empty() => println!("No processed data."),
                Ok(rows) => {
                    for (i, row) in rows.iter().enumerate() {
                        let cells: Vec<String> = row
                            .iter()
                            .map(|(k, v)| match v {
                                Value::String(s) => format!("{}={}", k, s),
                                other => format!("{}={}", k, other),
                            })
                            .collect();
                        println!("{:>5}  {}", i + 1, cells.join(" "));
                    }
                }
                Err(err) => {
                    print_notice(&Notice::error(err.user_message()));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
