use crate::cli::ColorArgs;
use crate::config::PartialColorConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use plddtpaint::{
    core::io::{atom_table::AtomTable, traits::StructureFile},
    engine::{error::PassError, progress::ProgressReporter, scene::Scene},
    workflows,
};
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: ColorArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialColorConfig::from_file(path)?,
        None => PartialColorConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args)?;

    info!("Loading atom table from {:?}", &args.atoms);
    let structure = AtomTable::read_from_path(&args.atoms).map_err(|e| CliError::FileParsing {
        path: args.atoms.clone(),
        source: e.into(),
    })?;
    info!(
        "Loaded {} atom(s) in {} object(s).",
        structure.atom_count(),
        structure.objects_iter().count()
    );
    let mut scene = Scene::new(structure);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the coloring pass...");
    let outcome = workflows::color::run(&mut scene, &final_config, &reporter);

    if let Some(path) = &args.script {
        write_script(&scene, path)?;
    }

    match outcome {
        Ok(report) => {
            println!("{}", report.summary);
            Ok(())
        }
        Err(e) => {
            for line in report_failures(&final_config.scope, &e) {
                eprintln!("{}", line);
            }
            if let PassError::StepsFailed {
                summary: Some(summary),
                ..
            } = &e
            {
                println!("{}", summary);
            }
            Err(e.into())
        }
    }
}

/// Logs one line per failed step, whether or not the counts survived.
fn report_failures(scope: &str, error: &PassError) -> Vec<String> {
    let lines = workflows::color::failure_lines(scope, error);
    for line in &lines {
        warn!("{}", line);
    }
    lines
}

fn write_script(scene: &Scene, path: &Path) -> Result<()> {
    info!(
        "Writing {} host command(s) to {:?}",
        scene.command_log().len(),
        path
    );
    std::fs::write(path, scene.script())?;
    println!("Host script written to: {}", path.display());
    Ok(())
}
