use std::path::{Path, PathBuf};

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "vboxmenu.toml";

/// Per-user config file: `~/.config/vboxmenu/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vboxmenu").join("config.toml"))
}

/// Directory holding everything for one VM: `<base>/<name>/`
pub fn vm_dir(base: &Path, name: &str) -> PathBuf {
    base.join(name)
}

/// Disk image handed to `createhd` and `storageattach`: `<base>/<name>/<name>.vdi`
pub fn disk_path(base: &Path, name: &str) -> PathBuf {
    vm_dir(base, name).join(format!("{name}.vdi"))
}
