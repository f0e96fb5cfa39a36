mod export_build;
mod profile;
mod project;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use stk_export::FileType;
use stk_pipeline::{stack_bottom_zs, CancelToken, LayerJob};
use project::ProjectFile;
use profile::CamProfile;

#[derive(Parser)]
#[command(name = "stackup", version, about = "Compute per-layer stackup geometry and export DXF/SVG/STL")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every stackup layer's manifold/toolpath and export files for each
    Generate {
        /// Path to the project JSON file
        project_file: PathBuf,
        /// Output directory for generated files
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
        /// File format(s) to export
        #[arg(short, long, value_enum, default_value = "all")]
        format: ExportFormat,
        /// Path to a CAM profile TOML file (tool diameter, step-down, step-over, chuck clearance)
        #[arg(short, long)]
        profile: Option<PathBuf>,
        /// Footprint id to compute (defaults to the project's board footprint)
        #[arg(long)]
        board: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ExportFormat {
    Svg,
    Dxf,
    Stl,
    All,
}

impl ExportFormat {
    fn file_types(self) -> Vec<FileType> {
        match self {
            ExportFormat::Svg => vec![FileType::Svg],
            ExportFormat::Dxf => vec![FileType::Dxf],
            ExportFormat::Stl => vec![FileType::Stl],
            ExportFormat::All => vec![FileType::Svg, FileType::Dxf, FileType::Stl],
        }
    }

    fn extension(file_type: FileType) -> &'static str {
        match file_type {
            FileType::Svg => "svg",
            FileType::Dxf => "dxf",
            FileType::Stl => "stl",
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Generate { project_file, output_dir, format, profile, board } => {
            run_generate(project_file, output_dir, *format, profile.as_deref(), board.as_deref())
        }
    }
}

fn run_generate(
    project_path: &PathBuf,
    output_dir: &PathBuf,
    format: ExportFormat,
    profile_path: Option<&std::path::Path>,
    board_id: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let project_text = fs::read_to_string(project_path)?;
    let project = ProjectFile::from_json(&project_text)?;

    let cam_profile = match profile_path {
        Some(path) => CamProfile::from_toml(&fs::read_to_string(path)?)?,
        None => CamProfile::default(),
    };
    info!(profile = %cam_profile.name, "loaded CAM profile");

    let (scope, resolved) = stk_pipeline::resolve_scope(&project.params);
    for param in resolved.iter().filter(|p| p.error.is_some()) {
        warn!(key = %param.key, error = ?param.error, "parameter failed to resolve; value defaulted to 0");
    }

    let library = project.library();
    let board = project.board_footprint(board_id)?;

    let layers: Vec<&stk_model::StackupLayer> = project.stackup.iter().collect();
    let bottom_zs = stack_bottom_zs(&layers, &scope);
    let jobs: Vec<LayerJob> = project
        .stackup
        .iter()
        .zip(bottom_zs.iter())
        .map(|(layer, &bottom_z)| LayerJob { footprint: board, layer, bottom_z })
        .collect();

    fs::create_dir_all(output_dir)?;
    let cancel = CancelToken::new();
    let reporter = stk_pipeline::FnReporter(|event: stk_pipeline::ProgressEvent| {
        info!(layer = event.layer_index, percent = event.percent, "{}", event.message);
    });

    let results = stk_pipeline::compute_batch(&jobs, &library, &scope, cam_profile.to_cam_config(), &reporter, "stackup-cli", &cancel);

    let mut failures = 0usize;
    for (layer, result) in project.stackup.iter().zip(results.into_iter()) {
        match result {
            Ok(computation) => {
                info!(layer = %layer.id, volume_mm3 = computation.signed_volume, moves = computation.toolpath.len(), "layer computed");
                for file_type in format.file_types() {
                    let ext = ExportFormat::extension(file_type);
                    let filepath = output_dir.join(format!("{}.{}", slugify(&layer.name), ext)).to_string_lossy().to_string();
                    let request = export_build::build_layer_export(board, &library, layer, &scope, &computation, filepath.clone(), file_type)?;
                    match stk_export::export(&request) {
                        Ok(()) => info!(path = %filepath, "exported"),
                        Err(err) => {
                            warn!(layer = %layer.id, %err, "export failed");
                            failures += 1;
                        }
                    }
                }
            }
            Err(err) => {
                warn!(layer = %layer.id, %err, "layer computation failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        eprintln!("{} layer/export operations failed; see log output above", failures);
        std::process::exit(1);
    }
    Ok(())
}

fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}
