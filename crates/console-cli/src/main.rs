//! Console CLI
//!
//! Command line front end over the console core: sign in, pick a project
//! and inspect provider resources and Kubernetes services.
//!
//! # Usage
//! ```bash
//! console [--config console.json] [--base-url URL] [--verbose] <COMMAND>
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console_core::client::models::{ApplicationBundle, ControlPlane};
use console_core::menu::MenuNode;
use console_core::{format, time, Console, ConsoleConfig, CredentialState};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Console - cloud and Kubernetes service console
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// API endpoint, overrides the configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Directory holding persisted state, overrides the configuration
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and scope the session to a project
    Login {
        /// Username for password authentication
        #[arg(short, long, conflicts_with = "token")]
        username: Option<String>,

        /// Password for password authentication
        #[arg(short, long, requires = "username")]
        password: Option<String>,

        /// Externally issued access token
        #[arg(long, requires = "email")]
        token: Option<String>,

        /// Email to record with an access token
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget all credentials
    Logout,

    /// Show the current session
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List projects
    Projects,

    /// Rescope the session to another project
    UseProject { id: String },

    /// List compute flavors
    Flavors,

    /// List images
    Images,

    /// List SSH key pairs
    KeyPairs,

    /// List availability zones
    Zones,

    /// List external networks
    Networks,

    /// Manage control planes
    ControlPlanes {
        #[command(subcommand)]
        action: ControlPlaneAction,
    },

    /// Manage clusters
    Clusters {
        #[command(subcommand)]
        action: ClusterAction,
    },

    /// Download a cluster kubeconfig
    Kubeconfig {
        control_plane: String,
        cluster: String,

        /// Output file
        #[arg(short, long, default_value = "kubeconfig.yaml")]
        output: PathBuf,
    },

    /// List application bundles
    Bundles {
        /// Show cluster bundles instead of control plane bundles
        #[arg(long)]
        cluster: bool,
    },

    /// List applications
    Applications,

    /// Navigation menu
    Menu {
        #[command(subcommand)]
        action: MenuAction,
    },
}

#[derive(Subcommand)]
enum ControlPlaneAction {
    List,
    Create {
        name: String,

        /// Application bundle name
        #[arg(long)]
        bundle: Option<String>,
    },
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
enum ClusterAction {
    List { control_plane: String },
    Delete { control_plane: String, name: String },
}

#[derive(Subcommand)]
enum MenuAction {
    /// Print the menu with the selected entry's ancestors expanded
    Show,
    /// Select a menu entry
    Select { id: String },
    /// Print the path to the selected entry
    Breadcrumbs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    let config = load_config(&cli)?;
    tracing::debug!("Using API endpoint {}", config.base_url);
    let console = Console::open(config).context("failed to open console state")?;

    let result = run(&console, cli.command).await;
    console.close();
    result
}

fn load_config(cli: &Cli) -> anyhow::Result<ConsoleConfig> {
    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::from_file(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?,
        None => ConsoleConfig::default(),
    }
    .with_env();

    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(dir) = &cli.state_dir {
        config = config.with_state_dir(dir.clone());
    }
    Ok(config)
}

async fn run(console: &Console, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login {
            username,
            password,
            token,
            email,
        } => {
            let project = match (username, password, token, email) {
                (Some(username), Some(password), _, _) => {
                    console.login_with_password(&username, &password).await?
                }
                (_, _, Some(token), Some(email)) => {
                    console.login_with_token(&token, &email).await?
                }
                _ => bail!("either --username/--password or --token/--email is required"),
            };
            println!("{} scoped to project {}", "Signed in".green(), project.bold());
        }
        Commands::Logout => {
            console.logout().await?;
            println!("Signed out");
        }
        Commands::Status { json } => {
            let bundle = console.credentials().bundle();
            if json {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            } else {
                let state = match console.credentials().state() {
                    CredentialState::Anonymous => "signed out".red(),
                    CredentialState::Unscoped => "unscoped".yellow(),
                    CredentialState::Scoped => "scoped".green(),
                };
                println!("STATE:   {state}");
                println!(
                    "EMAIL:   {}",
                    console.credentials().email().unwrap_or_default()
                );
                println!("PROJECT: {}", bundle.project.unwrap_or_default());
                println!("API:     {}", console.config().base_url);
            }
        }
        Commands::Projects => {
            let token = console.token()?;
            let current = console.credentials().project();
            for project in console.client().list_projects(&token).await? {
                let marker = if current.as_deref() == Some(project.id.as_str()) {
                    "*".green()
                } else {
                    " ".normal()
                };
                println!("{marker} {:<36} {}", project.id, format::named_object(&project));
            }
        }
        Commands::UseProject { id } => {
            console.switch_project(&id).await?;
            println!("Now using project {}", id.bold());
        }
        Commands::Flavors => {
            let token = console.token()?;
            for flavor in console.client().list_flavors(&token).await? {
                println!("{}", format::flavor(&flavor));
            }
        }
        Commands::Images => {
            let token = console.token()?;
            for image in console.client().list_images(&token).await? {
                println!("{:<36} {}", image.id, format::named_object(&image));
            }
        }
        Commands::KeyPairs => {
            let token = console.token()?;
            for key_pair in console.client().list_key_pairs(&token).await? {
                println!("{}", format::named_object(&key_pair));
            }
        }
        Commands::Zones => {
            let token = console.token()?;
            let client = console.client();
            println!("{}", "COMPUTE".bold());
            for zone in client.list_compute_availability_zones(&token).await? {
                println!("  {}", format::named_object(&zone));
            }
            println!("{}", "BLOCK STORAGE".bold());
            for zone in client.list_block_storage_availability_zones(&token).await? {
                println!("  {}", format::named_object(&zone));
            }
        }
        Commands::Networks => {
            let token = console.token()?;
            for network in console.client().list_external_networks(&token).await? {
                println!("{:<36} {}", network.id, format::named_object(&network));
            }
        }
        Commands::ControlPlanes { action } => control_planes(console, action).await?,
        Commands::Clusters { action } => {
            let token = console.token()?;
            match action {
                ClusterAction::List { control_plane } => {
                    for cluster in console.client().list_clusters(&token, &control_plane).await? {
                        print_resource(
                            &cluster.name,
                            cluster.application_bundle.as_ref(),
                            cluster.status.as_ref().map(|s| (s.status.as_str(), s.creation_time)),
                        );
                    }
                }
                ClusterAction::Delete {
                    control_plane,
                    name,
                } => {
                    console
                        .client()
                        .delete_cluster(&token, &control_plane, &name)
                        .await?;
                    println!("Deleting cluster {}", name.bold());
                }
            }
        }
        Commands::Kubeconfig {
            control_plane,
            cluster,
            output,
        } => {
            let token = console.token()?;
            let data = console
                .client()
                .get_cluster_kubeconfig(&token, &control_plane, &cluster)
                .await?;
            std::fs::write(&output, data)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Wrote {}", output.display());
        }
        Commands::Bundles { cluster } => {
            let token = console.token()?;
            let bundles = if cluster {
                console.client().list_cluster_bundles(&token).await?
            } else {
                console.client().list_control_plane_bundles(&token).await?
            };
            for bundle in bundles {
                println!("{:<32} {}", bundle.name, format::application_bundle(&bundle));
            }
        }
        Commands::Applications => {
            let token = console.token()?;
            for application in console.client().list_applications(&token).await? {
                println!(
                    "{:<24} {}",
                    format::named_object(&application),
                    application.description.as_deref().unwrap_or_default()
                );
            }
        }
        Commands::Menu { action } => {
            let navigation = console.navigation();
            match action {
                MenuAction::Show => print_menu(&navigation.menu()?, navigation.selected(), 0),
                MenuAction::Select { id } => {
                    navigation.select(&id)?;
                    println!("Selected {}", id.bold());
                }
                MenuAction::Breadcrumbs => {
                    let path: Vec<_> = navigation
                        .breadcrumbs()?
                        .into_iter()
                        .map(|node| node.value)
                        .collect();
                    println!("{}", path.join(" / "));
                }
            }
        }
    }

    Ok(())
}

async fn control_planes(console: &Console, action: ControlPlaneAction) -> anyhow::Result<()> {
    let token = console.token()?;
    let client = console.client();

    match action {
        ControlPlaneAction::List => {
            for control_plane in client.list_control_planes(&token).await? {
                print_resource(
                    &control_plane.name,
                    control_plane.application_bundle.as_ref(),
                    control_plane
                        .status
                        .as_ref()
                        .map(|s| (s.status.as_str(), s.creation_time)),
                );
            }
        }
        ControlPlaneAction::Create { name, bundle } => {
            let mut control_plane = ControlPlane::new(&name);
            if let Some(bundle) = bundle {
                let found = client
                    .list_control_plane_bundles(&token)
                    .await?
                    .into_iter()
                    .find(|b| b.name == bundle)
                    .with_context(|| format!("unknown bundle {bundle}"))?;
                control_plane.application_bundle = Some(found);
            }
            client.create_control_plane(&token, &control_plane).await?;
            println!("Creating control plane {}", name.bold());
        }
        ControlPlaneAction::Delete { name } => {
            client.delete_control_plane(&token, &name).await?;
            println!("Deleting control plane {}", name.bold());
        }
    }

    Ok(())
}

fn print_resource(
    name: &str,
    bundle: Option<&ApplicationBundle>,
    status: Option<(&str, chrono::DateTime<chrono::Utc>)>,
) {
    let version = bundle.map(format::application_bundle).unwrap_or_default();
    let (state, age) = match status {
        Some((state, created)) => (state.to_string(), time::age_since(created)),
        None => (String::new(), String::new()),
    };
    println!("{name:<24} {version:<28} {state:<14} {age}");
}

fn print_menu(node: &MenuNode, selected: Option<String>, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = if selected.as_deref() == Some(node.id.as_str()) {
        node.value.green().bold()
    } else {
        node.value.normal()
    };
    if depth > 0 {
        let fold = if node.is_leaf() {
            " "
        } else if node.expanded {
            "-"
        } else {
            "+"
        };
        println!("{indent}{fold} {label}");
    }
    if depth == 0 || node.expanded {
        for child in &node.children {
            print_menu(child, selected.clone(), depth + 1);
        }
    }
}
