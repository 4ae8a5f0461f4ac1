//! sky_drive CLI - Interact with SkyDrive.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sky_drive::{extract_code, ClientConfig, Credentials, Scope, SkyDriveClient};

/// CLI tool for interacting with SkyDrive.
#[derive(Parser)]
#[command(name = "sky_drive")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the application JSON file (client_id, client_secret, redirect_uri).
    #[arg(long, env = "SKYDRIVE_APP_CREDENTIALS")]
    credentials: PathBuf,

    /// Access token from a previous login.
    #[arg(long, env = "SKYDRIVE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Refresh token from a previous login.
    #[arg(long, env = "SKYDRIVE_REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the URL to open in a browser to authorize this application.
    Authorize {
        /// Scopes to request.
        #[arg(long, short = 's', value_delimiter = ',', default_values = ["wl.skydrive_update", "wl.offline_access"])]
        scopes: Vec<Scope>,
    },

    /// Exchange an authorization code (or the full redirect URL) for tokens.
    Login {
        /// Redirect URL or bare authorization code.
        code: String,
    },

    /// Exchange the refresh token for a new access token.
    Refresh,

    /// List files in a folder.
    List {
        /// Folder ID (root folder if omitted).
        folder: Option<String>,
    },

    /// Show metadata of a file or folder.
    Info {
        /// Resource ID (root folder if omitted).
        id: Option<String>,
    },

    /// Create a folder.
    Mkdir {
        /// Folder name.
        name: String,

        /// Parent folder ID.
        #[arg(long, short = 'p', default_value = sky_drive::ROOT_FOLDER)]
        parent: String,

        /// Folder description.
        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Upload files to a folder.
    Upload {
        /// File patterns to upload (supports glob patterns like *.tar, file_{1,2,3}.txt).
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Destination folder ID.
        #[arg(long, short = 't', default_value = sky_drive::ROOT_FOLDER)]
        to: String,
    },

    /// Download a file to local filesystem.
    Download {
        /// File ID to download.
        file: String,

        /// Local destination path (file or directory).
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,
    },

    /// Print a byte range of a file to stdout.
    Read {
        /// File ID.
        file: String,

        /// First byte.
        start: u64,

        /// Last byte, inclusive.
        end: u64,
    },

    /// Copy a file into a folder.
    Copy {
        /// File ID.
        id: String,

        /// Destination folder ID.
        #[arg(long, short = 't')]
        to: String,
    },

    /// Move a file or folder into a folder.
    Move {
        /// Resource ID.
        id: String,

        /// Destination folder ID.
        #[arg(long, short = 't')]
        to: String,
    },

    /// Rename a file or folder.
    Rename {
        /// Resource ID.
        id: String,

        /// New name.
        name: String,
    },

    /// Delete a file or folder.
    Delete {
        /// Resource ID.
        id: String,
    },

    /// Show the storage quota.
    Quota,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sky_drive=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::from_file(&cli.credentials)
        .with_context(|| format!("Failed to load application credentials from {:?}", cli.credentials))?
        .with_tokens(cli.access_token, cli.refresh_token);

    let client = SkyDriveClient::new(config).context("Failed to create client")?;

    match cli.command {
        Commands::Authorize { scopes } => {
            let url = client.authorization_url(&scopes)?;
            println!("Open this URL in a browser and paste the redirect URL into `sky_drive login`:");
            println!("{}", url);
        }

        Commands::Login { code } => {
            let code = extract_code(&code).context("Invalid authorization code")?;
            let credentials = client
                .get_access_token(&code)
                .await
                .context("Failed to exchange authorization code")?;
            print_credentials(&credentials);
        }

        Commands::Refresh => {
            let credentials = client
                .refresh_access_token()
                .await
                .context("Failed to refresh access token")?;
            print_credentials(&credentials);
        }

        Commands::List { folder } => {
            let files = client
                .get_contents(folder.as_deref())
                .await
                .with_context(|| format!("Failed to list folder: {}", folder.as_deref().unwrap_or("root")))?;

            if files.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<44} {:>10} {:<10} {}", "ID", "SIZE", "TYPE", "NAME");
                println!("{}", "-".repeat(100));
                for file in files {
                    println!("{}", file);
                }
            }
        }

        Commands::Info { id } => {
            let resource = client
                .get(id.as_deref())
                .await
                .with_context(|| format!("Failed to get: {}", id.as_deref().unwrap_or("root")))?;
            println!("{}", serde_json::to_string_pretty(&resource)?);
        }

        Commands::Mkdir {
            name,
            parent,
            description,
        } => {
            let folder = client
                .create_folder(&parent, &name, description.as_deref())
                .await
                .with_context(|| format!("Failed to create folder {} in {}", name, parent))?;
            println!("{}", folder);
        }

        Commands::Upload { patterns, to } => {
            // Expand glob patterns
            let mut files_to_upload: Vec<PathBuf> = Vec::new();

            for pattern in &patterns {
                // Handle brace expansion manually for patterns like file_{1,2,3}.txt
                let expanded_patterns = expand_braces(pattern);

                for expanded_pattern in expanded_patterns {
                    let matches: Vec<PathBuf> = glob(&expanded_pattern)
                        .with_context(|| format!("Invalid glob pattern: {}", expanded_pattern))?
                        .filter_map(|r| r.ok())
                        .filter(|p| p.is_file())
                        .collect();

                    if matches.is_empty() {
                        // If no glob matches, treat as literal path
                        let path = PathBuf::from(&expanded_pattern);
                        if path.is_file() {
                            files_to_upload.push(path);
                        } else {
                            eprintln!("Warning: No files matched pattern: {}", expanded_pattern);
                        }
                    } else {
                        files_to_upload.extend(matches);
                    }
                }
            }

            // Remove duplicates
            files_to_upload.sort();
            files_to_upload.dedup();

            if files_to_upload.is_empty() {
                anyhow::bail!("No files to upload");
            }

            upload_all(&client, &files_to_upload, &to).await?;
        }

        Commands::Download { file, to } => {
            // Ensure destination directory exists
            if to.is_dir() || to.to_string_lossy().ends_with('/') {
                std::fs::create_dir_all(&to)
                    .with_context(|| format!("Failed to create directory: {:?}", to))?;
            } else if let Some(parent) = to.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create directory: {:?}", parent))?;
                }
            }

            print!("Downloading {}... ", file);

            let metadata = client
                .download_file(&file, &to)
                .await
                .with_context(|| format!("Failed to download file: {}", file))?;

            let final_path = if to.is_dir() {
                to.join(&metadata.name)
            } else {
                to
            };

            println!("OK");
            println!("Saved to: {:?}", final_path);
        }

        Commands::Read { file, start, end } => {
            use std::io::Write;

            let bytes = client
                .read(&file, start, end)
                .await
                .with_context(|| format!("Failed to read bytes {}-{} of {}", start, end, file))?;
            std::io::stdout().write_all(&bytes)?;
        }

        Commands::Copy { id, to } => {
            let copy = client
                .copy_to(&id, &to)
                .await
                .with_context(|| format!("Failed to copy {} to {}", id, to))?;
            println!("{}", copy);
        }

        Commands::Move { id, to } => {
            let moved = client
                .move_to(&id, &to)
                .await
                .with_context(|| format!("Failed to move {} to {}", id, to))?;
            println!("{}", moved);
        }

        Commands::Rename { id, name } => {
            let renamed = client
                .rename(&id, &name)
                .await
                .with_context(|| format!("Failed to rename {}", id))?;
            println!("{}", renamed);
        }

        Commands::Delete { id } => {
            client
                .delete(&id)
                .await
                .with_context(|| format!("Failed to delete {}", id))?;
            println!("Deleted {}", id);
        }

        Commands::Quota => {
            let quota = client.get_quota().await.context("Failed to get quota")?;
            println!(
                "{} used of {} ({} available)",
                sky_drive::models::format_size(quota.used()),
                sky_drive::models::format_size(quota.quota),
                sky_drive::models::format_size(quota.available)
            );
        }
    }

    Ok(())
}

/// Upload each file in turn; fails after the loop if any upload failed.
async fn upload_all(client: &SkyDriveClient, files: &[PathBuf], to: &str) -> Result<()> {
    println!("Uploading {} file(s) to {}...", files.len(), to);

    let mut failed = 0;
    for (idx, file_path) in files.iter().enumerate() {
        let filename = file_path.file_name().unwrap_or_default().to_string_lossy();
        print!("[{}/{}] {}... ", idx + 1, files.len(), filename);

        match client.upload_file(file_path, to).await {
            Ok(resource) => println!("OK ({})", resource.id),
            Err(e) => {
                failed += 1;
                println!("FAILED");
                eprintln!("  Error: {}", e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} upload(s) failed", failed, files.len());
    }
    println!("Done.");
    Ok(())
}

/// Print tokens as environment assignments for the next invocation.
fn print_credentials(credentials: &Credentials) {
    println!("export SKYDRIVE_ACCESS_TOKEN={}", credentials.access_token);
    match &credentials.refresh_token {
        Some(refresh_token) => println!("export SKYDRIVE_REFRESH_TOKEN={}", refresh_token),
        None => eprintln!("Warning: no refresh token returned; request the wl.offline_access scope"),
    }
    if let Some(expires_in) = credentials.expires_in {
        eprintln!("Access token expires in {}s", expires_in);
    }
}

/// Expand brace patterns like file_{1,2,3}.txt into multiple patterns.
fn expand_braces(pattern: &str) -> Vec<String> {
    // Find brace expression
    if let Some(start) = pattern.find('{') {
        if let Some(end) = pattern[start..].find('}') {
            let end = start + end;
            let prefix = &pattern[..start];
            let suffix = &pattern[end + 1..];
            let alternatives = &pattern[start + 1..end];

            return alternatives
                .split(',')
                .flat_map(|alt| {
                    let expanded = format!("{}{}{}", prefix, alt.trim(), suffix);
                    expand_braces(&expanded)
                })
                .collect();
        }
    }

    vec![pattern.to_string()]
}
