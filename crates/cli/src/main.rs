use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use stowage_core::config::core_config_from_env;
use stowage_core::{paths, DirectoryService, FileService, SearchService, TenantRoot, ViewEntry};
use stowage_storage::{body, ObjectStore, S3Config, S3ObjectStore};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stowage")]
#[command(about = "Stowage per-user file store CLI")]
struct Cli {
    /// User id whose files are addressed
    #[arg(long, short)]
    user: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory
    Ls {
        /// Directory path ending in '/' (empty for the root)
        #[arg(default_value = "")]
        path: String,
    },
    /// Create a directory
    Mkdir {
        name: String,
        /// Parent directory
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Upload a local file
    Put {
        /// Local file to upload
        local: PathBuf,
        /// Target directory
        #[arg(long, default_value = "")]
        path: String,
        /// Stored name (defaults to the local file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Download a file
    Get {
        file: String,
        /// Directory holding the file
        #[arg(long, default_value = "")]
        path: String,
        /// Write to this local file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Rename a file (the extension is kept)
    Mv {
        old_name: String,
        new_name: String,
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Rename a directory and everything below it
    Mvdir {
        old_name: String,
        new_name: String,
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Delete a file
    Rm {
        name: String,
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Delete a directory and everything below it
    Rmdir {
        name: String,
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Search file and directory names
    Search { query: String },
}

fn print_entries(entries: &[ViewEntry]) {
    if entries.is_empty() {
        println!("No entries found.");
        return;
    }
    for entry in entries {
        println!("{:>10}  {}", entry.human_size, entry.relative_path);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stowage=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'stowage --help' for commands");
        return Ok(());
    };

    let env = |name: &str| std::env::var(name).ok();
    let cfg = Arc::new(core_config_from_env(env)?);
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::connect(S3Config::from_env(env)?).await?);
    let root: TenantRoot = cfg.tenant_layout().root_for(&cli.user)?;

    let files = FileService::new(store.clone(), cfg.clone());
    let directories = DirectoryService::new(store.clone(), cfg.clone());

    match command {
        Commands::Ls { path } => {
            let entries = files.list(&root, &path).await?;
            let crumbs = paths::breadcrumbs(&path);
            println!("/{}", crumbs.links.last().map(String::as_str).unwrap_or(""));
            print_entries(&entries);
        }
        Commands::Mkdir { name, path } => {
            let created = directories.create(&root, &path, &name).await?;
            println!("Created directory {}", created);
        }
        Commands::Put { local, path, name } => {
            let name = match name {
                Some(name) => name,
                None => local
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_owned)
                    .ok_or_else(|| anyhow::anyhow!("cannot derive a name from {}", local.display()))?,
            };
            let file = tokio::fs::File::open(&local).await?;
            let size = file.metadata().await?.len();
            let written = files
                .upload(
                    &root,
                    &path,
                    &name,
                    body::from_reader(file, local.display().to_string()),
                    Some(size),
                )
                .await?;
            println!("Uploaded {}{} ({} bytes)", path, name, written);
        }
        Commands::Get { file, path, out } => {
            let mut body = files.download(&root, &path, &file).await?;
            match out {
                Some(out) => {
                    let mut target = tokio::fs::File::create(&out).await?;
                    while let Some(chunk) = body.try_next().await? {
                        target.write_all(&chunk).await?;
                    }
                    target.flush().await?;
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    while let Some(chunk) = body.try_next().await? {
                        stdout.write_all(&chunk).await?;
                    }
                    stdout.flush().await?;
                }
            }
        }
        Commands::Mv {
            old_name,
            new_name,
            path,
        } => {
            let renamed = files.rename(&root, &path, &old_name, &new_name).await?;
            println!("Renamed to {}", renamed);
        }
        Commands::Mvdir {
            old_name,
            new_name,
            path,
        } => {
            let moved = directories
                .rename(&root, &path, &old_name, &new_name)
                .await?;
            println!("Moved {} object(s)", moved);
        }
        Commands::Rm { name, path } => {
            files.delete(&root, &path, &name).await?;
            println!("Deleted {}{}", path, name);
        }
        Commands::Rmdir { name, path } => {
            let deleted = directories.delete(&root, &path, &name).await?;
            println!("Deleted {} object(s)", deleted);
        }
        Commands::Search { query } => {
            let results = SearchService::new(store).search(&root, &query).await?;
            print_entries(&results);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_global_user_and_subcommand() {
        let cli = Cli::try_parse_from(["stowage", "--user", "42", "mvdir", "a", "b", "--path", "x/"])
            .unwrap();
        assert_eq!(cli.user, "42");
        assert!(matches!(
            cli.command,
            Some(Commands::Mvdir { ref old_name, ref new_name, ref path })
                if old_name == "a" && new_name == "b" && path == "x/"
        ));
    }

    #[test]
    fn test_ls_defaults_to_root() {
        let cli = Cli::try_parse_from(["stowage", "-u", "1", "ls"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Ls { ref path }) if path.is_empty()));
    }

    #[test]
    fn test_user_is_required() {
        assert!(Cli::try_parse_from(["stowage", "ls"]).is_err());
    }
}
