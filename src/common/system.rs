use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysinfo::{Disks, System};

/// Static facts about the machine, for summaries and the info command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub platform: String,
    pub os_version: Option<String>,
    pub arch: String,
    pub hostname: Option<String>,
    pub cpu_brand: String,
    pub cpu_count: usize,
    pub total_memory: u64,
    pub available_memory: u64,
    pub home_dir: PathBuf,
    pub tmp_dir: PathBuf,
}

/// Capacity of the volume holding a path, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpace {
    pub total: u64,
    pub free: u64,
}

impl DiskSpace {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }
}

/// Reads machine facts. Stateless; every call queries the OS afresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInfoProbe;

impl SystemInfoProbe {
    pub fn system_info(&self) -> SystemInfo {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();

        let cpu_brand = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_default();

        SystemInfo {
            platform: std::env::consts::OS.to_string(),
            os_version: System::long_os_version(),
            arch: std::env::consts::ARCH.to_string(),
            hostname: System::host_name(),
            cpu_brand,
            cpu_count: sys.cpus().len(),
            total_memory: sys.total_memory(),
            available_memory: sys.available_memory(),
            home_dir: dirs::home_dir().unwrap_or_default(),
            tmp_dir: std::env::temp_dir(),
        }
    }

    /// Capacity of the mounted volume that contains `path`.
    /// Zero on both fields when no mount point matches.
    pub fn disk_space(&self, path: &Path) -> DiskSpace {
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().components().count())
            .map(|disk| DiskSpace {
                total: disk.total_space(),
                free: disk.available_space(),
            })
            .unwrap_or_default()
    }
}
