//! Admin provisioning CLI.
//!
//! Creates an admin account directly against the configured persistence
//! backend, outside the HTTP surface. Prompts for the password when it is
//! not passed as a flag.

use clap::Parser;

use devfest_backend::auth;
use devfest_backend::config::Config;
use devfest_backend::store;

#[derive(Parser)]
#[command(name = "add_admin", about = "Create an admin account")]
struct Args {
    /// Username for the new admin
    username: String,

    /// Password (prompted interactively when omitted)
    #[arg(long)]
    password: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let username = args.username.trim().to_string();
    if username.is_empty() {
        return Err("username must not be empty".into());
    }

    let password = match args.password {
        Some(p) => p,
        None => {
            let first = rpassword::prompt_password("Password: ")?;
            let second = rpassword::prompt_password("Confirm password: ")?;
            if first != second {
                return Err("passwords do not match".into());
            }
            first
        }
    };

    if password.len() < 6 {
        return Err("password must be at least 6 characters".into());
    }

    let config = Config::from_env();
    let store = store::from_config(&config).await?;

    if store.get_admin_by_username(&username).await?.is_some() {
        return Err(format!("admin '{}' already exists", username).into());
    }

    let hash = auth::hash_password(&password)?;
    let admin = store.create_admin(&username, &hash).await?;

    println!(
        "Created admin '{}' ({}) in the {} backend",
        admin.username,
        admin.id,
        config.storage.as_str()
    );
    Ok(())
}
