//! Metarig CLI - retarget character skeletons onto a meta-rig template.
//!
//! Usage: metarig <COMMAND> [OPTIONS]
//!
//! Run `metarig --help` for available commands. Set `RUST_LOG` or pass `-v`
//! for more output.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use metarig::io;
use metarig::retarget::{
    cc3_metarig_tables, BoundingBox, FaceMode, FaceSurface, MappingTables, Progress, RetargetOptions, Retargeter,
};
use metarig::skeleton::{RegionId, Skeleton};
use metarig::surface::{MeshSurface, NearestMode};

#[derive(Parser)]
#[command(name = "metarig")]
#[command(author, version, about = "Skeleton retargeting CLI", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retarget a source skeleton onto a template
    Retarget {
        /// Source skeleton (JSON)
        source: PathBuf,

        /// Destination template skeleton (JSON)
        template: PathBuf,

        /// Output skeleton (JSON)
        output: PathBuf,

        /// Face mesh surface (JSON) for UV landmarks
        #[arg(long)]
        face: Option<PathBuf>,

        /// Material region of the face mesh, by name or index
        #[arg(long, default_value = "0")]
        region: String,

        /// Mapping tables (JSON); the built-in CC3 tables when absent
        #[arg(long)]
        tables: Option<PathBuf>,

        /// Retarget options (JSON)
        #[arg(long)]
        options: Option<PathBuf>,

        /// Skip landmarks and place the jaw from the source skeleton
        #[arg(long)]
        basic_face: bool,

        /// Nearest-corner fallback mode
        #[arg(long, value_enum)]
        nearest: Option<NearestArg>,

        /// UV distance for the first-within fallback
        #[arg(long)]
        threshold: Option<f64>,

        /// Write the warning report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Display skeleton or surface information
    Info {
        /// Input file (JSON)
        input: PathBuf,

        /// What the file contains
        #[arg(short, long, value_enum, default_value = "skeleton")]
        kind: InfoKind,
    },

    /// Write the built-in mapping tables as JSON
    Tables {
        /// Output file
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum NearestArg {
    /// Globally nearest corner
    Strict,
    /// First corner within the threshold
    FirstWithin,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum InfoKind {
    /// Skeleton document
    Skeleton,
    /// Mesh surface document
    Surface,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Retarget {
            source,
            template,
            output,
            face,
            region,
            tables,
            options,
            basic_face,
            nearest,
            threshold,
            report,
        } => {
            let mut opts = match options {
                Some(path) => io::load_options(path)?,
                None => RetargetOptions::default(),
            };
            if basic_face {
                opts.face_mode = FaceMode::Basic;
            }
            match nearest {
                Some(NearestArg::Strict) => opts.projection.nearest = NearestMode::Strict,
                Some(NearestArg::FirstWithin) => opts.projection.nearest = NearestMode::FirstWithin,
                None => {}
            }
            if let Some(threshold) = threshold {
                opts.projection.threshold = threshold;
            }
            let tables = match tables {
                Some(path) => io::load_tables(path)?,
                None => cc3_metarig_tables(),
            };
            cmd_retarget(
                &source,
                &template,
                &output,
                face.as_deref(),
                &region,
                tables,
                opts,
                report.as_deref(),
            )?;
        }

        Commands::Info { input, kind } => match kind {
            InfoKind::Skeleton => cmd_info_skeleton(&input)?,
            InfoKind::Surface => cmd_info_surface(&input)?,
        },

        Commands::Tables { output } => {
            io::save_tables(&cc3_metarig_tables(), &output)?;
            println!("Wrote built-in tables to {}", output.display());
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }
        let percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Monotonic: never redraw a smaller value.
        let previous = max_percent.fetch_max(percent, Ordering::Relaxed);
        if percent < previous {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);
        eprint!("\r[{}{}] {:3}% {:<20}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn resolve_region(surface: &MeshSurface, region: &str) -> Result<RegionId, Box<dyn std::error::Error>> {
    if let Some(id) = surface.region_by_name(region) {
        return Ok(id);
    }
    match region.parse::<usize>() {
        Ok(index) => Ok(RegionId::new(index)),
        Err(_) => Err(format!("no material region named {}", region).into()),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_retarget(
    source: &Path,
    template: &Path,
    output: &Path,
    face: Option<&Path>,
    region: &str,
    tables: MappingTables,
    options: RetargetOptions,
    report_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source_skeleton = io::load_skeleton(source)?;
    let template_skeleton = io::load_skeleton(template)?;
    println!(
        "Loaded: source {} joints, template {} joints",
        source_skeleton.len(),
        template_skeleton.len()
    );

    let surface = match face {
        Some(path) => {
            let surface = io::load_surface(path)?;
            println!("Face surface: {} triangles", surface.num_triangles());
            Some(surface)
        }
        None => None,
    };
    let face_surface = match &surface {
        Some(surface) => Some(FaceSurface::new(surface, resolve_region(surface, region)?)),
        None => None,
    };

    let retargeter = Retargeter::new(tables, options)?;
    let progress = create_progress();

    let start = Instant::now();
    let result = retargeter.retarget_with_progress(&source_skeleton, &template_skeleton, face_surface, &progress)?;
    let elapsed = start.elapsed();

    io::save_skeleton(&result.skeleton, output)?;
    println!(
        "Result: {} joints in {:.2?}, written to {}",
        result.skeleton.len(),
        elapsed,
        output.display()
    );
    println!("{}", result.report.summary());

    if let Some(path) = report_path {
        std::fs::write(path, result.report.to_string())?;
    }
    Ok(())
}

fn cmd_info_skeleton(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let skeleton: Skeleton = io::load_skeleton(input)?;

    println!("File: {}", input.display());
    println!("Joints: {}", skeleton.len());

    let roots: Vec<&str> = skeleton.roots().map(|id| skeleton.joint(id).name.as_str()).collect();
    println!("Roots: {}", roots.join(", "));

    let connected = skeleton.joints().filter(|(_, j)| j.connected).count();
    println!("Connected joints: {}", connected);

    let with_params = skeleton.joints().filter(|(_, j)| !j.params.is_empty()).count();
    println!("Joints with rig parameters: {}", with_params);

    let bbox = BoundingBox::from_points(skeleton.joints().flat_map(|(_, j)| [&j.head, &j.tail]));
    if !bbox.is_empty() {
        let (min, max) = (bbox.min, bbox.max);
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        println!("Height: {:.3}", bbox.extent().z);
    }

    Ok(())
}

fn cmd_info_surface(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let surface = io::load_surface(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", surface.positions().len());
    println!("Triangles: {}", surface.num_triangles());
    println!("UV layer: {}", if surface.has_uvs() { "yes" } else { "no" });

    let regions = surface
        .triangles()
        .iter()
        .map(|t| t.region.index() + 1)
        .max()
        .unwrap_or(0);
    for index in 0..regions {
        let id = RegionId::new(index);
        let count = surface.region_triangles(id).count();
        let name = surface.region_name(id).unwrap_or("(unnamed)");
        println!("  region {} {}: {} triangles", index, name, count);
    }

    let cleaned = surface.cleaned(1e-5);
    let dropped = surface.num_triangles() - cleaned.num_triangles();
    if dropped > 0 {
        println!("Degenerate triangles: {}", dropped);
    }

    Ok(())
}
