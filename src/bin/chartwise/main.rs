//! Chartwise CLI - automatic UV unwrapping from the command line.
//!
//! Usage: chartwise <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `chartwise --help` for available commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};

use chartwise::algo::islands::extract_islands;
use chartwise::algo::metrics::{MetricsOptions, QualityMetrics};
use chartwise::algo::seams::select_seams;
use chartwise::algo::{Event, Observer};
use chartwise::io;
use chartwise::mesh::{build_topology, primitives, Mesh};
use chartwise::unwrap::{unwrap_with_observer, ChartStatus, UnwrapParams, UnwrapResult};

#[derive(Parser)]
#[command(name = "chartwise")]
#[command(author, version, about = "Automatic UV unwrapping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unwrap a mesh and write it with UVs
    Unwrap {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        /// Compute exact quality metrics instead of placeholders
        #[arg(long)]
        metrics: bool,
    },

    /// Display mesh topology and the charts an unwrap would produce
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Unwrap a built-in shape
    Demo {
        /// Shape to generate
        #[arg(value_enum)]
        shape: Shape,

        /// Output mesh file
        output: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        /// Compute exact quality metrics instead of placeholders
        #[arg(long)]
        metrics: bool,
    },
}

#[derive(Args)]
struct ParamArgs {
    /// Angular defect threshold in degrees (used with --curvature-refinement)
    #[arg(long, default_value = "30.0")]
    angle: f64,

    /// Minimum faces for a chart to be parameterized
    #[arg(long, default_value = "5")]
    min_faces: usize,

    /// Gap between packed charts
    #[arg(long, default_value = "0.02")]
    margin: f64,

    /// Leave every chart in its own unit square
    #[arg(long)]
    no_pack: bool,

    /// Add seams around high-curvature vertices
    #[arg(long)]
    curvature_refinement: bool,

    /// Solver iteration limit per chart
    #[arg(long, default_value = "10000")]
    max_iterations: usize,
}

impl ParamArgs {
    fn to_params(&self) -> UnwrapParams {
        let defaults = UnwrapParams::default();
        let seam = defaults
            .seam
            .clone()
            .with_curvature_refinement(self.curvature_refinement);
        let lscm = defaults
            .lscm
            .clone()
            .with_max_iterations(self.max_iterations);

        defaults
            .with_angle_threshold(self.angle)
            .with_min_island_faces(self.min_faces)
            .with_island_margin(self.margin)
            .with_packing(!self.no_pack)
            .with_seam_options(seam)
            .with_lscm_options(lscm)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Shape {
    /// Unit cube
    Cube,
    /// Icosphere with two subdivision levels
    Sphere,
    /// Open cylinder
    Cylinder,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Unwrap {
            input,
            output,
            params,
            metrics,
        } => {
            let mesh = io::load(&input)?;
            println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
            cmd_unwrap(&mesh, &output, &params.to_params(), metrics)?;
        }

        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Demo {
            shape,
            output,
            params,
            metrics,
        } => {
            let mesh = match shape {
                Shape::Cube => primitives::cube(),
                Shape::Sphere => primitives::icosphere(2),
                Shape::Cylinder => primitives::open_cylinder(24, 6),
            };
            println!("Generated: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
            cmd_unwrap(&mesh, &output, &params.to_params(), metrics)?;
        }
    }

    Ok(())
}

/// Create an observer that draws stage progress on the terminal.
fn create_progress() -> Observer {
    Observer::new(|event| {
        if let Event::Stage { stage, index, total } = event {
            draw_bar(*index * 100 / *total, stage.label());
        }
    })
}

fn draw_bar(percent: usize, message: &str) {
    let bar_width = 30;
    let filled = (percent * bar_width) / 100;
    let bar = "=".repeat(filled);
    let space = " ".repeat(bar_width - filled);

    // Pad so a shorter label fully overwrites a longer one
    eprint!("\r[{}{}] {:3}% {:<24}", bar, space, percent, message);
    let _ = std::io::stderr().flush();

    if percent >= 100 {
        eprintln!();
    }
}

fn cmd_unwrap(
    mesh: &Mesh,
    output: &Path,
    params: &UnwrapParams,
    exact_metrics: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let progress = create_progress();

    let start = Instant::now();
    let (unwrapped, mut result) = unwrap_with_observer(mesh, params, &progress)?;
    if exact_metrics {
        QualityMetrics::compute(&unwrapped, &MetricsOptions::default())?.apply(&mut result);
    }
    draw_bar(100, "Done");
    let elapsed = start.elapsed();

    print_summary(&result, exact_metrics);
    io::save(&unwrapped, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn print_summary(result: &UnwrapResult, exact: bool) {
    let count = |status: ChartStatus| result.charts.iter().filter(|c| c.status == status).count();

    println!("Islands: {}", result.num_charts);
    println!(
        "  parameterized: {}, skipped: {}, failed: {}",
        count(ChartStatus::Parameterized),
        count(ChartStatus::Skipped),
        count(ChartStatus::Failed)
    );
    println!("Avg stretch: {:.3}", result.avg_stretch);
    println!("Max stretch: {:.3}", result.max_stretch);
    println!("Coverage: {:.1}%", result.coverage * 100.0);
    if exact {
        println!("Angle distortion: {:.4} rad", result.angle_distortion);
    }
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    mesh.validate()?;

    let params = UnwrapParams::default();
    let topology = build_topology(&mesh);
    let check = topology.validate(&mesh);
    let seams = select_seams(&mesh, &topology, params.angle_threshold, &params.seam);
    let islands = extract_islands(&mesh, &topology, &seams);

    println!("File: {}", input.display());
    println!("Vertices: {}", check.vertices);
    println!("Edges: {}", check.edges);
    println!("Faces: {}", check.faces);
    println!("Euler characteristic: {}", check.characteristic);
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    if topology.is_closed() {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary edges)", topology.boundary_edge_count());
    }
    if topology.non_manifold_edges() > 0 {
        println!("Non-manifold edges: {}", topology.non_manifold_edges());
    }

    println!("Seams: {} of {} candidates", seams.len(), seams.candidates());
    println!("Charts: {}", islands.num_charts());

    Ok(())
}
