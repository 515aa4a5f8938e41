//! Entry point: logging + CLI options, then hand over to the platform loop.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "splatview")]
#[command(about = "Real-time viewer for colored OFF triangle meshes", long_about = None)]
struct Cli {
    /// Mesh file to load
    #[arg(long, default_value = "room.off")]
    mesh: PathBuf,

    /// GPU backend: auto|vulkan|dx12|metal|gl
    #[arg(long = "gpu-backend", default_value = "auto")]
    gpu_backend: String,

    /// Window width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Frame-rate cap, 0 = uncapped
    #[arg(long = "max-fps", default_value_t = 60)]
    max_fps: u32,

    /// Log frames per second once a second
    #[arg(long = "show-fps", default_value = "false")]
    show_fps: bool,
}

fn parse_backend(name: &str) -> wgpu::Backends {
    match name.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            log::warn!("Unknown backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}

impl Cli {
    fn into_config(self) -> platform::Config {
        platform::Config {
            backends: parse_backend(&self.gpu_backend),
            mesh_path: self.mesh,
            width: self.width.max(1),
            height: self.height.max(1),
            max_fps: self.max_fps,
            show_fps: self.show_fps,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();
    log::info!(
        "Starting splatview. Mesh: {}, backend: {:?}, window_size={}x{}, max_fps={}",
        config.mesh_path.display(),
        config.backends,
        config.width,
        config.height,
        config.max_fps
    );
    log::info!("Controls: WASD move, mouse look, Space up, L-Ctrl/L-Shift down, Escape exit");

    platform::run(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_gives_defaults() {
        let config = Cli::parse_from(["splatview"]).into_config();
        assert_eq!(config.mesh_path, PathBuf::from("room.off"));
        assert_eq!(config.backends, wgpu::Backends::all());
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.max_fps, 60);
        assert!(!config.show_fps);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Cli::parse_from([
            "splatview",
            "--mesh",
            "scene.off",
            "--gpu-backend",
            "VK",
            "--width",
            "0",
            "--max-fps",
            "0",
            "--show-fps",
        ])
        .into_config();
        assert_eq!(config.mesh_path, PathBuf::from("scene.off"));
        assert_eq!(config.backends, wgpu::Backends::VULKAN);
        assert_eq!(config.width, 1);
        assert_eq!(config.max_fps, 0);
        assert!(config.show_fps);
    }

    #[test]
    fn unknown_backend_falls_back_to_auto() {
        assert_eq!(parse_backend("glide"), wgpu::Backends::all());
        assert_eq!(parse_backend("Metal"), wgpu::Backends::METAL);
    }
}
