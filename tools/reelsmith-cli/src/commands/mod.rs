pub mod captions;
pub mod check;
pub mod plan;
pub mod render;

use std::path::{Path, PathBuf};

use reelsmith_project_model::job::RenderRequest;
use reelsmith_project_model::scene::SourceRef;
use reelsmith_project_model::style::CaptionStyle;

/// Read a request file. Relative local paths inside it are taken relative
/// to the file's directory.
pub fn load_request(path: &Path) -> anyhow::Result<RenderRequest> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read request {}: {e}", path.display()))?;
    let mut request: RenderRequest = serde_json::from_str(&json)
        .map_err(|e| anyhow::anyhow!("Invalid request {}: {e}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for scene in &mut request.scenes {
        if let SourceRef::Path(local) = &mut scene.source {
            *local = resolve(base, local);
        }
    }
    if let Some(voiceover) = &mut request.voiceover {
        *voiceover = resolve(base, voiceover);
    }
    Ok(request)
}

pub fn style_preset(name: &str) -> anyhow::Result<CaptionStyle> {
    CaptionStyle::preset(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown caption style: {name}. Use one of: {}",
            CaptionStyle::PRESETS.join(", ")
        )
    })
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
