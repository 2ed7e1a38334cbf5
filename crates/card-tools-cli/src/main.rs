mod logger;

use anyhow::{Context, Result};
use card_paginate::{
    ComponentInstance, HeaderStatus, Page, Project, analyse_template, calculate_statistics,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use logger::CliLogger;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cardt", about = "Card sheet pagination tools", version)]
struct Cli {
    /// More log output (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List what every slot of every page holds
    Paginate {
        /// Project file (JSON)
        #[arg(short, long)]
        project: PathBuf,

        /// Output format
        #[arg(long, default_value = "text", value_enum)]
        format: FormatArg,
    },

    /// Show pagination statistics
    Stats {
        /// Project file (JSON)
        #[arg(short, long)]
        project: PathBuf,
    },

    /// Check templates and their data files
    Check {
        /// Project file (JSON)
        #[arg(short, long)]
        project: PathBuf,
    },

    /// Render a proof PDF of the paginated sheets
    Proof {
        /// Project file (JSON)
        #[arg(short, long)]
        project: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Output paper size
        #[arg(long, default_value = "letter", value_enum)]
        paper: PaperArg,

        /// Output orientation
        #[arg(long, default_value = "portrait", value_enum)]
        orientation: OrientationArg,

        /// Sheet margin in mm (uniform on all sides)
        #[arg(long, default_value = "10.0")]
        margin: f32,

        /// Gap between cards in mm
        #[arg(long, default_value = "3.0")]
        spacing: f32,

        /// Label font size in points
        #[arg(long, default_value = "9.0")]
        font_size: f32,

        /// Mark empty slots
        #[arg(long)]
        label_empty: bool,

        /// Leave out the page number footer
        #[arg(long)]
        no_page_numbers: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<PaperArg> for card_proof::PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A4 => Self::A4,
            PaperArg::A5 => Self::A5,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
            PaperArg::Tabloid => Self::Tabloid,
        }
    }
}

impl From<OrientationArg> for card_proof::Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    CliLogger::new(CliLogger::level_for(cli.verbose, cli.quiet)).init()?;

    match cli.command {
        Commands::Paginate { project, format } => {
            let project = open_project(&project).await?;
            let pages = paginate(&project)?;
            match format {
                FormatArg::Text => print_pages_text(&pages),
                FormatArg::Json => {
                    println!("{}", serde_json::to_string_pretty(&pages_json(&pages))?)
                }
            }
        }

        Commands::Stats { project } => {
            let project = open_project(&project).await?;
            let mut allocator = project.allocator().context("Nothing to paginate")?;
            let stats = calculate_statistics(&mut allocator);

            println!("Pagination Statistics:");
            println!("  Pages: {}", stats.pages);
            println!("  Slots per page: {}", stats.slots_per_page);
            println!("  Filled slots: {}", stats.filled_slots);
            println!("  Empty slots: {}", stats.empty_slots);
            println!("  Fill ratio: {:.1}%", stats.fill_ratio() * 100.0);
            for usage in &stats.templates {
                let span = match (usage.first_page, usage.last_page) {
                    (Some(first), Some(last)) => format!("pages {}-{}", first + 1, last + 1),
                    _ => "not placed".to_string(),
                };
                println!(
                    "  {} ({}): {}/{} placed, {}",
                    usage.name,
                    usage.mode.name(),
                    usage.emitted,
                    usage.required,
                    span
                );
            }
        }

        Commands::Check { project } => {
            let project = open_project(&project).await?;
            println!(
                "Layout: {}x{} ({} slots)",
                project.grid.rows(),
                project.grid.columns(),
                project.grid.slot_count()
            );
            for (id, template) in project.registry.iter() {
                let analysis = analyse_template(&project.grid, id, template, &project.merge);
                println!(
                    "  {} ({}): {} required, {} initial slots, ~{} pages",
                    template.name,
                    analysis.mode.name(),
                    analysis.required_instances,
                    analysis.slots_per_page,
                    analysis.estimated_pages
                );
                for (field, status) in project.merge.validate_headers(id, template) {
                    let note = match status {
                        HeaderStatus::Ok => "ok",
                        HeaderStatus::Missing => "missing from data",
                        HeaderStatus::Unused => "not used by template",
                    };
                    println!("    {}: {}", field, note);
                }
            }
        }

        Commands::Proof {
            project,
            output,
            paper,
            orientation,
            margin,
            spacing,
            font_size,
            label_empty,
            no_page_numbers,
        } => {
            let options = card_proof::ProofOptions {
                paper_size: paper.into(),
                orientation: orientation.into(),
                margin_mm: margin,
                spacing_mm: spacing,
                font_size_pt: font_size,
                label_empty,
                page_numbers: !no_page_numbers,
            };

            let project = open_project(&project).await?;
            let pages = paginate(&project)?;
            card_proof::generate_proof(&pages, &project.grid, &options, &output).await?;
            println!("Proof ({} pages) → {}", pages.len(), output.display());
        }
    }

    Ok(())
}

/// Load a project. Data files that could not be used are reported by the
/// library through `log::warn!`.
async fn open_project(path: &Path) -> Result<Project> {
    Project::open(path)
        .await
        .with_context(|| format!("Failed to open project {}", path.display()))
}

fn paginate(project: &Project) -> Result<Vec<Page<ComponentInstance>>> {
    let mut allocator = project.allocator().context("Nothing to paginate")?;
    allocator.generate();
    Ok(allocator.pages().to_vec())
}

fn print_pages_text(pages: &[Page<ComponentInstance>]) {
    for page in pages {
        println!(
            "Page {} ({}/{} filled)",
            page.index + 1,
            page.filled_count(),
            page.placements.len()
        );
        for placement in &page.placements {
            let label = placement
                .instance
                .as_deref()
                .map_or_else(|| "-".to_string(), card_proof::slot_label);
            println!(
                "  ({}, {}) {}",
                placement.slot.row, placement.slot.col, label
            );
        }
    }
}

fn pages_json(pages: &[Page<ComponentInstance>]) -> serde_json::Value {
    let pages: Vec<serde_json::Value> = pages
        .iter()
        .map(|page| {
            let slots: Vec<serde_json::Value> = page
                .placements
                .iter()
                .map(|placement| {
                    let instance = placement.instance.as_deref();
                    json!({
                        "row": placement.slot.row,
                        "column": placement.slot.col,
                        "template": instance.map(|i| i.name.clone()),
                        "serial": instance.map(|i| i.serial),
                        "fields": instance.and_then(|i| i.row.clone()),
                    })
                })
                .collect();
            json!({ "page": page.index + 1, "slots": slots })
        })
        .collect();
    json!({ "pages": pages })
}
