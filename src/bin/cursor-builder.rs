use anyhow::{bail, Result};

use cursor_builder::config::BuildConfig;
use cursor_builder::pipeline::run_build;
use cursor_builder::preflight::check_host_tools;
use cursor_builder::target::{resolve_target, ADVERTISED_TARGETS};

fn usage() -> String {
    format!(
        "Usage:\n  cursor-builder <target>\n\nTargets:\n  {}",
        ADVERTISED_TARGETS.join("\n  ")
    )
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let target_id = match args.as_slice() {
        [target_id] => target_id,
        _ => bail!(usage()),
    };

    check_host_tools()?;

    let target = resolve_target(target_id)?;
    let base_dir = std::env::current_dir()?;
    let config = BuildConfig::load(&base_dir)?;

    let artifact = run_build(&config, target, &base_dir)?;

    println!(
        "[build:{}] done; artifacts in {}",
        target.id,
        artifact
            .tar_path
            .parent()
            .unwrap_or(&artifact.tar_path)
            .display()
    );
    println!("  {}", artifact.tar_path.display());
    println!("  {}", artifact.image_path.display());

    Ok(())
}
