use std::collections::HashSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use sysinfo::Disks;

use super::{Measurement, Probe, RawReading, ResourceKind};
use crate::error::ProbeUnavailable;

/// Filesystems that never back a real, writable volume
static VIRTUAL_FILESYSTEMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "tmpfs", "devtmpfs", "ramfs", "proc", "sysfs", "cgroup", "cgroup2", "devpts", "overlay",
        "squashfs", "autofs", "debugfs", "tracefs", "securityfs", "pstore", "efivarfs", "fusectl",
        "configfs", "hugetlbfs", "mqueue", "bpf", "binfmt_misc", "nsfs",
    ]
    .into_iter()
    .collect()
});

/// Filesystems used by optical media
static OPTICAL_FILESYSTEMS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["iso9660", "udf", "cdfs"].into_iter().collect());

/// What the storage filter needs to know about one mounted volume
#[derive(Debug, Clone)]
pub struct VolumeInfo {
    pub device: String,
    pub mount_point: String,
    pub file_system: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl VolumeInfo {
    /// Check whether this volume counts towards the storage score.
    /// Skips optical drives, virtual filesystems, loop/ram devices and
    /// entries without a filesystem type.
    pub fn is_eligible(&self) -> bool {
        let fs = self.file_system.trim().to_ascii_lowercase();
        if fs.is_empty() {
            return false;
        }
        if VIRTUAL_FILESYSTEMS.contains(fs.as_str()) || OPTICAL_FILESYSTEMS.contains(fs.as_str()) {
            return false;
        }

        let device_name = self
            .device
            .rsplit('/')
            .next()
            .unwrap_or(self.device.as_str());
        !(device_name.starts_with("loop")
            || device_name.starts_with("ram")
            || device_name.starts_with("sr")
            || device_name.starts_with("cdrom"))
    }

    /// Used space in percent of total, where used is `total - available`.
    ///
    /// Blocks reserved for root are not available to ordinary users, so they
    /// count as used here. `df`-style tools that divide by `used + available`
    /// report a slightly lower figure on filesystems with a reserve.
    pub fn usage_percent(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        let used = self.total_bytes.saturating_sub(self.available_bytes);
        Some(used as f64 / self.total_bytes as f64 * 100.0)
    }

    pub fn to_reading(&self) -> RawReading {
        match self.usage_percent() {
            Some(percent) => Measurement::Storage {
                volume: self.mount_point.clone(),
                percent,
            }
            .into(),
            None => RawReading::unavailable(format!("{} reports zero capacity", self.mount_point)),
        }
    }
}

/// Usage of every eligible mounted volume
pub struct StorageProbe {
    disks: Disks,
}

impl StorageProbe {
    pub fn new() -> Self {
        Self {
            disks: Disks::new(),
        }
    }

    /// Enumerate mounted volumes in the order the OS reports them
    pub fn volumes(&mut self) -> Vec<VolumeInfo> {
        self.disks.refresh_list();
        self.disks
            .list()
            .iter()
            .map(|disk| VolumeInfo {
                device: disk.name().to_string_lossy().into_owned(),
                mount_point: disk.mount_point().display().to_string(),
                file_system: disk.file_system().to_string_lossy().into_owned(),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
            })
            .collect()
    }
}

impl Default for StorageProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for StorageProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Storage
    }

    fn read(&mut self, _window: Duration) -> Result<Vec<RawReading>, ProbeUnavailable> {
        let volumes = self.volumes();
        let eligible: Vec<RawReading> = volumes
            .iter()
            .filter(|v| {
                let keep = v.is_eligible();
                if !keep {
                    tracing::debug!(device = %v.device, fs = %v.file_system, "skipping volume");
                }
                keep
            })
            .map(VolumeInfo::to_reading)
            .collect();

        if eligible.is_empty() {
            return Err(ProbeUnavailable::new(
                ResourceKind::Storage,
                "no eligible volumes mounted",
            ));
        }
        Ok(eligible)
    }
}
