//! Check the ffmpeg toolchain and configured paths.

use reelsmith_common::{config_file_path, AppConfig};
use reelsmith_render_engine::ffmpeg::command_exists;
use reelsmith_render_engine::Toolchain;

/// Filters the render stages rely on, and whether each is required.
const FILTERS: [(&str, bool); 8] = [
    ("scale", true),
    ("zoompan", true),
    ("xfade", false),
    ("concat", true),
    ("amix", false),
    ("adelay", false),
    ("ass", false),
    ("gradients", false),
];

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelsmith System Check");
    println!("{}", "=".repeat(50));

    let toolchain = Toolchain::from_config(&config.pipeline);
    let mut all_required_ok = true;

    for binary in [&toolchain.ffmpeg, &toolchain.ffprobe] {
        let name = binary.to_string_lossy();
        if command_exists(&name) {
            println!("[OK] {name} found");
        } else {
            println!("[MISSING] {name} not found on PATH");
            all_required_ok = false;
        }
    }

    if all_required_ok {
        println!();
        for (filter, required) in FILTERS {
            if toolchain.has_filter(filter).await {
                println!("[OK] filter: {filter}");
            } else if required {
                println!("[MISSING] filter: {filter}");
                all_required_ok = false;
            } else {
                println!("[WARN] filter: {filter} (stage will degrade)");
            }
        }
    }

    println!();
    println!("Config: {}", config_file_path().display());
    println!("  Work dir: {}", config.paths.work_dir.display());
    println!("  Output dir: {}", config.paths.output_dir.display());
    println!("  Workers: {}", config.pipeline.workers);
    if config.pipeline.allowed_hosts.is_empty() {
        println!("  Remote assets: disabled (no allowed hosts)");
    } else {
        println!("  Allowed hosts: {}", config.pipeline.allowed_hosts.join(", "));
    }

    println!();
    if all_required_ok {
        println!("All required tools are available. Reelsmith is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg with libass support.");
    }

    Ok(())
}
