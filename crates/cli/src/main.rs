//! quire-ctl: authoring and moderation from the terminal.
//!
//! Authoring commands work on the local content tree; `dash`, `comments` and
//! `subscribers` talk to a running server through its admin API.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::admin::{AdminClient, Moderation};
use crate::scaffold::Scaffold;

mod admin;
mod scaffold;

#[derive(Debug, Parser)]
#[command(name = "quire-ctl", version, about = "Manage a quire site")]
struct Cli {
    /// Root of the content tree.
    #[arg(long, env = "QUIRE_CONTENT_DIR", default_value = "content", global = true)]
    content_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new post or project.
    New {
        #[command(subcommand)]
        kind: NewKind,
    },
    /// Move a private post into posts/.
    Publish { slug: String },
    /// Post, page and comment counts.
    Dash,
    /// List or moderate comments.
    Comments {
        #[command(subcommand)]
        action: Option<CommentAction>,
    },
    /// Subscriber counts.
    Subscribers,
}

#[derive(Debug, Subcommand)]
enum NewKind {
    /// New private post dated today.
    Post { title: String },
    /// New project page.
    Project { name: String },
}

#[derive(Debug, Subcommand)]
enum CommentAction {
    List,
    Toggle { id: i64 },
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scaffold = Scaffold::new(&cli.content_dir);

    match cli.command {
        Command::New { kind } => {
            let path = match kind {
                NewKind::Post { title } => scaffold.new_post(&title, chrono::Local::now().date_naive())?,
                NewKind::Project { name } => scaffold.new_project(&name)?,
            };
            println!("created {}", path.display());
            scaffold::open_editor(&path)?;
        }
        Command::Publish { slug } => {
            let (from, to) = scaffold.publish(&slug)?;
            println!("published {} -> {}", from.display(), to.display());
        }
        Command::Dash => {
            let stats = AdminClient::from_env()?.stats().await?;
            print!("{}", admin::render_stats(&stats));
        }
        Command::Comments { action } => {
            let client = AdminClient::from_env()?;
            match action.unwrap_or(CommentAction::List) {
                CommentAction::List => print!("{}", admin::render_comments(&client.comments().await?)),
                CommentAction::Toggle { id } => {
                    client.moderate(id, Moderation::Toggle).await?;
                    println!("comment {id}: toggled");
                }
                CommentAction::Delete { id } => {
                    client.moderate(id, Moderation::Delete).await?;
                    println!("comment {id}: deleted");
                }
            }
        }
        Command::Subscribers => {
            let counts = AdminClient::from_env()?.subscribers().await?;
            print!("{}", admin::render_subscribers(&counts));
        }
    }

    Ok(())
}
