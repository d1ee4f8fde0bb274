use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mesh_particles::prelude::*;

/// Mesh-sampled GPU particles drifting in a flow field, with snow.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// glTF/GLB model to sample. Without one a procedural sphere is used.
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON preset with camera, colours and tunables.
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Vertex count of the procedural sphere.
    #[arg(long, default_value_t = 20_000)]
    points: u32,

    /// Disable the snow.
    #[arg(long)]
    no_snow: bool,
}

fn run(cli: Cli) -> Result<(), ExperienceError> {
    let preset = match &cli.preset {
        Some(path) => ModelPreset::from_json_file(path)?,
        None => ModelPreset::default(),
    };

    let mut experience = Experience::new()
        .with_title(&preset.name)
        .with_preset(preset)
        .with_fallback_points(cli.points);
    if let Some(model) = cli.model {
        experience = experience.with_model_path(model);
    }
    if cli.no_snow {
        experience = experience.without_snow();
    }
    experience.run()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
