//! labelctl - manage repository labels from the command line.

mod snapshot;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use labels::{
    commit, resync, CommitReport, EditBuffer, Field, Label, LabelClient, PendingAction, RepoId,
};

/// Manage repository labels: list, snapshot, apply and copy.
#[derive(Parser)]
#[command(name = "labelctl")]
#[command(about = "View, edit and copy repository labels via the hosting service API")]
#[command(version)]
struct Cli {
    /// Personal access token (or set `GITHUB_TOKEN`). Only required for
    /// committing changes; reads of public repositories work without one.
    #[arg(long, env = "GITHUB_TOKEN", default_value = "", global = true)]
    token: String,

    /// API base URL (or set `GITHUB_API_URL`), for enterprise installs.
    #[arg(
        long,
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com",
        global = true
    )]
    api_url: String,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a repository's labels.
    List {
        /// Target repository as owner/repo (owner:repo also accepted).
        repo: String,
    },

    /// Write a repository's labels to a snapshot file.
    Pull {
        /// Target repository as owner/repo.
        repo: String,

        /// Where to write the snapshot.
        #[arg(long, short, default_value = "labels.toml")]
        output: PathBuf,
    },

    /// Apply a snapshot file to a repository.
    Apply {
        /// Target repository as owner/repo.
        repo: String,

        /// Snapshot to apply.
        #[arg(long, short, default_value = "labels.toml")]
        file: PathBuf,

        /// Also delete remote labels missing from the snapshot.
        #[arg(long)]
        prune: bool,

        /// Print the plan without committing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Copy labels from one repository into another.
    Copy {
        /// Source repository as owner/repo.
        from: String,

        /// Target repository as owner/repo.
        to: String,

        /// Print the plan without committing anything.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let token = (!cli.token.trim().is_empty()).then(|| cli.token.clone());
    let client = LabelClient::with_base_url(cli.api_url.clone(), token.clone())
        .context("Failed to create API client")?;

    match cli.command {
        Commands::List { repo } => list(&client, &repo).await,
        Commands::Pull { repo, output } => pull(&client, &repo, &output).await,
        Commands::Apply {
            repo,
            file,
            prune,
            dry_run,
        } => apply(&client, token.as_deref(), &repo, &file, prune, dry_run).await,
        Commands::Copy { from, to, dry_run } => {
            copy(&client, token.as_deref(), &from, &to, dry_run).await
        }
    }
}

async fn list(client: &LabelClient, repo: &str) -> Result<()> {
    let repo = parse_repo(repo)?;
    let fetched = client.list_labels(&repo).await?;

    if fetched.is_empty() {
        println!("No labels in {repo}.");
        return Ok(());
    }

    println!("{} labels in {repo}:", fetched.len());
    for label in &fetched {
        print_label(label);
    }
    Ok(())
}

async fn pull(client: &LabelClient, repo: &str, output: &Path) -> Result<()> {
    let repo = parse_repo(repo)?;
    let fetched = client.list_labels(&repo).await?;

    let document = snapshot::render(&repo, &fetched)?;
    std::fs::write(output, document)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} labels from {repo} to {}",
        fetched.len(),
        output.display()
    );
    Ok(())
}

async fn apply(
    client: &LabelClient,
    token: Option<&str>,
    repo: &str,
    file: &Path,
    prune: bool,
    dry_run: bool,
) -> Result<()> {
    let repo = parse_repo(repo)?;
    let snapshot = snapshot::parse(file)?;
    snapshot::validate(&snapshot)?;

    let mut buffer = EditBuffer::new();
    buffer.load(client.list_labels(&repo).await?);
    stage(&mut buffer, &snapshot.labels, prune)?;

    if !buffer.has_pending_changes() {
        println!("{repo} already matches {}; nothing to commit.", file.display());
        return Ok(());
    }

    print_plan(&buffer);
    if dry_run {
        return Ok(());
    }
    ensure_token(token, &repo)?;

    let report = commit(client, &repo, &buffer).await;
    resync(client, &repo, &mut buffer)
        .await
        .context("Failed to reload labels after commit")?;
    finish(client, &report, &buffer)
}

async fn copy(
    client: &LabelClient,
    token: Option<&str>,
    from: &str,
    to: &str,
    dry_run: bool,
) -> Result<()> {
    let from = parse_repo(from)?;
    let to = parse_repo(to)?;

    let source = client.list_labels(&from).await?;
    if source.is_empty() {
        println!("No labels to copy from {from}.");
        return Ok(());
    }

    let mut buffer = EditBuffer::new();
    buffer.load(client.list_labels(&to).await?);
    stage(&mut buffer, &source, false)?;

    if !buffer.has_pending_changes() {
        println!("{to} already has all {} labels from {from}.", source.len());
        return Ok(());
    }

    print_plan(&buffer);
    if dry_run {
        return Ok(());
    }
    ensure_token(token, &to)?;

    let report = commit(client, &to, &buffer).await;
    resync(client, &to, &mut buffer)
        .await
        .context("Failed to reload labels after commit")?;
    finish(client, &report, &buffer)
}

/// Stage desired labels onto a buffer freshly loaded from the server:
/// unknown names become creates, known names with differing fields become
/// updates, and with `prune` everything not desired is marked deleted.
fn stage(buffer: &mut EditBuffer, desired: &[Label], prune: bool) -> Result<()> {
    for label in desired {
        match buffer.find_by_name(&label.name) {
            Some(index) => {
                buffer.edit_field(index, Field::Color, label.color.to_ascii_uppercase())?;
                buffer.edit_field(index, Field::Description, label.description.clone())?;
            }
            None => {
                let mut label = label.clone();
                label.color.make_ascii_uppercase();
                buffer.add_new(label);
            }
        }
    }

    if prune {
        // walk backwards so removals cannot shift unvisited indices
        for index in (0..buffer.len()).rev() {
            let name = buffer.entries()[index].draft().name.clone();
            if !desired.iter().any(|l| l.name == name) {
                buffer.mark_deleted(index)?;
            }
        }
    }
    Ok(())
}

fn print_plan(buffer: &EditBuffer) {
    println!("Pending changes:");
    for entry in buffer.entries() {
        let draft = entry.draft();
        match entry.pending_action() {
            PendingAction::None => {}
            PendingAction::Create => println!("  {} {}", "+ create".green(), draft.name),
            PendingAction::Update => {
                if entry.original_name() == draft.name {
                    println!("  {} {}", "~ update".yellow(), draft.name);
                } else {
                    println!(
                        "  {} {} => {}",
                        "~ update".yellow(),
                        entry.original_name(),
                        draft.name
                    );
                }
            }
            PendingAction::Delete => println!("  {} {}", "- delete".red(), draft.name),
        }
    }
}

fn finish(client: &LabelClient, report: &CommitReport, buffer: &EditBuffer) -> Result<()> {
    for line in client.log().lines() {
        println!("{line}");
    }

    let failed = report.failed().count();
    if failed > 0 {
        bail!(
            "{failed} of {} operations failed; the label list was reloaded from the server",
            report.outcomes.len()
        );
    }

    println!(
        "{} operations committed; {} labels now on the server.",
        report.succeeded(),
        buffer.len()
    );
    Ok(())
}

fn ensure_token(token: Option<&str>, repo: &RepoId) -> Result<()> {
    if token.is_none() {
        bail!("You need to enter your token for repo: {repo} in order to commit labels (use --token or GITHUB_TOKEN)");
    }
    Ok(())
}

fn parse_repo(input: &str) -> Result<RepoId> {
    input
        .parse()
        .with_context(|| format!("Please follow the format: owner/repo or owner:repo (got `{input}`)"))
}

fn print_label(label: &Label) {
    let swatch = format!("#{}", label.color).bold();
    if label.description.is_empty() {
        println!("  {:<24} {swatch}", label.name);
    } else {
        println!("  {:<24} {swatch} {}", label.name, label.description.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str, color: &str, description: &str) -> Label {
        Label {
            name: name.to_string(),
            color: color.to_string(),
            description: description.to_string(),
        }
    }

    fn server_buffer() -> EditBuffer {
        let mut buffer = EditBuffer::new();
        buffer.load(vec![
            label("bug", "EE0701", "Something is broken"),
            label("docs", "0052CC", ""),
        ]);
        buffer
    }

    #[test]
    fn stage_matches_by_name_and_diffs_fields() {
        let mut buffer = server_buffer();
        let desired = vec![
            label("bug", "ee0701", "Something is broken"),
            label("triage", "D93F0B", "Needs a first look"),
        ];

        stage(&mut buffer, &desired, false).unwrap();

        // identical (case-insensitive color) -> untouched
        assert_eq!(buffer.entries()[0].pending_action(), PendingAction::None);
        // absent from the snapshot, prune off -> untouched
        assert_eq!(buffer.entries()[1].pending_action(), PendingAction::None);
        // unknown name -> create
        let index = buffer.find_by_name("triage").unwrap();
        assert_eq!(buffer.entries()[index].pending_action(), PendingAction::Create);
    }

    #[test]
    fn stage_with_prune_deletes_remote_only_labels() {
        let mut buffer = server_buffer();
        let desired = vec![label("bug", "B60205", "Something is broken")];

        stage(&mut buffer, &desired, true).unwrap();

        assert_eq!(buffer.entries()[0].pending_action(), PendingAction::Update);
        let index = buffer.find_by_name("docs").unwrap();
        assert_eq!(buffer.entries()[index].pending_action(), PendingAction::Delete);
    }

    #[test]
    fn ensure_token_blocks_commits_without_a_token() {
        let repo: RepoId = "octo/widgets".parse().unwrap();
        assert!(ensure_token(None, &repo).is_err());
        assert!(ensure_token(Some("sekrit"), &repo).is_ok());
    }

    #[test]
    fn parse_repo_reports_the_expected_format() {
        let err = parse_repo("not-a-repo").unwrap_err();
        assert!(format!("{err:#}").contains("owner/repo"));
    }
}
