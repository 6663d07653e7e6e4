#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use premier_site::backend::LocalBackend;
use premier_site::charts::{initialize_charts, sankey_chart, ChartRenderer, FigureBundle, SankeyFlows};
use premier_site::config::SiteConfig;
use premier_site::forms::FileAttachment;
use premier_site::page::{Page, PageLayout};
use premier_site::replay::ReplayScript;

/// Premier Research Club site tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for the local back end
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the dashboard figures as JSON keyed by container id
    Charts {
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pathway counts: opportunity+uptake, opportunity only, uptake only, neither
        #[arg(long, value_name = "A,B,C,D")]
        sankey: Option<SankeyFlows>,
    },

    /// Replay timed page events and print the resulting view snapshots
    Replay {
        script: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Submit the contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long)]
        message: String,
    },

    /// Submit a project, optionally with an attachment
    Project {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Sign up for the newsletter
    Newsletter {
        #[arg(long)]
        email: String,
    },

    /// List submitted projects
    Projects {
        /// Render the projects grid HTML instead of JSON
        #[arg(long)]
        html: bool,
    },
}

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

/// LOG_LEVEL wins over the config file
fn init_logging(config: &SiteConfig) -> Result<()> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| config.log_level.clone());

    // stdout carries command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&level))
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn write_output(contents: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write output to {:?}", path))?;
            info!(path = %path.display(), "Wrote output");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    write_output(&text, None)
}

async fn open_backend(args: &Args, config: &SiteConfig) -> Result<LocalBackend> {
    let dir = args.data_dir.clone().unwrap_or_else(|| config.data_dir());
    LocalBackend::open(dir).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SiteConfig::load_from(path)?,
        None => SiteConfig::load()?,
    };
    init_logging(&config)?;

    match &args.command {
        Command::Charts { output, sankey } => {
            let mut bundle = FigureBundle::new();
            initialize_charts(&mut bundle);
            if let Some(flows) = sankey {
                bundle.new_plot("sankeyChart", &sankey_chart(flows))?;
            }
            write_output(&bundle.to_json()?, output.as_deref())?;
        }

        Command::Replay { script, output } => {
            let script = ReplayScript::load(script)?;
            let snapshots = script.run(&config);
            let json = serde_json::to_string_pretty(&snapshots).context("Failed to serialize snapshots")?;
            write_output(&json, output.as_deref())?;
        }

        Command::Contact {
            name,
            email,
            subject,
            message,
        } => {
            let backend = open_backend(&args, &config).await?;
            let mut page = Page::new(&PageLayout::default(), &config);
            let form = page.contact_form_mut();
            form.set_field("name", name);
            form.set_field("email", email);
            form.set_field("subject", subject);
            form.set_field("message", message);

            let result = page.submit_contact(&backend, Duration::ZERO).await;
            print_json(&json!({
                "errors": page.contact_form().errors(),
                "notifications": page.notices().active(),
            }))?;
            result.context("Contact form not sent")?;
        }

        Command::Project {
            title,
            description,
            file,
        } => {
            let backend = open_backend(&args, &config).await?;
            let mut page = Page::new(&PageLayout::default(), &config);
            let form = page.project_form_mut();
            form.set_field("title", title);
            form.set_field("description", description);

            let result = async {
                if let Some(path) = file {
                    let attachment = FileAttachment::from_path(path).await?;
                    page.select_project_file(attachment, Duration::ZERO)?;
                }
                let id = page.submit_project(&backend, Duration::ZERO).await?;
                anyhow::Ok(id)
            }
            .await;

            print_json(&json!({
                "id": result.as_ref().ok(),
                "errors": page.project_form().errors(),
                "notifications": page.notices().active(),
                "projects": page.projects().state(),
            }))?;
            result.context("Project not submitted")?;
        }

        Command::Newsletter { email } => {
            let mut page = Page::new(&PageLayout::default(), &config);
            page.newsletter_form_mut().set_email(email);

            let result = page.submit_newsletter(Duration::ZERO);
            print_json(&json!({ "notifications": page.notices().active() }))?;
            result.context("Newsletter signup rejected")?;
        }

        Command::Projects { html } => {
            let backend = open_backend(&args, &config).await?;
            let mut page = Page::new(&PageLayout::default(), &config);
            let refreshed = page.refresh_projects(&backend).await;

            let panel = page.projects();
            if *html {
                write_output(&panel.render_html(), None)?;
            } else {
                print_json(&serde_json::to_value(panel.state()).context("Failed to serialize projects")?)?;
            }
            refreshed.context("Failed to load projects")?;
        }
    }

    Ok(())
}
