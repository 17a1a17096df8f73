//! Hardware inventory: probing, vendor classification and the
//! `hardware.json` artifact consumed by driver installation.
//!
//! Probing is read-only and runs in dry-run too. A probe that fails only
//! leaves its section empty and logs a warning.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use super::registry::ModuleId;
use super::{Context, Handoff, Module, Outcome};
use crate::error::HandOffError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Os;

/// File name of the report inside the artifact directory.
pub const ARTIFACT_FILE: &str = "hardware.json";

/// Hardware vendor, as used by driver rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// NVIDIA.
    Nvidia,
    /// AMD / ATI.
    Amd,
    /// Intel.
    Intel,
    /// Realtek.
    Realtek,
    /// Qualcomm (including Atheros).
    Qualcomm,
    /// MediaTek.
    Mediatek,
    /// Broadcom.
    Broadcom,
    /// Microsoft (virtual and in-box devices).
    Microsoft,
    /// Anything else.
    Other,
}

impl Vendor {
    /// Classify a manufacturer string (or a device name when the
    /// manufacturer is generic).
    ///
    /// ```
    /// use provision_cli::modules::hardware::Vendor;
    ///
    /// assert_eq!(Vendor::classify("NVIDIA Corporation"), Vendor::Nvidia);
    /// assert_eq!(Vendor::classify("Advanced Micro Devices, Inc. [AMD/ATI]"), Vendor::Amd);
    /// assert_eq!(Vendor::classify("GenuineIntel"), Vendor::Intel);
    /// assert_eq!(Vendor::classify("Samsung"), Vendor::Other);
    /// ```
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        let has_token = |token: &str| {
            lower
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|t| t == token)
        };
        if lower.contains("nvidia") {
            Self::Nvidia
        } else if lower.contains("advanced micro devices")
            || lower.contains("authenticamd")
            || has_token("amd")
            || has_token("ati")
        {
            Self::Amd
        } else if lower.contains("intel") {
            Self::Intel
        } else if lower.contains("realtek") {
            Self::Realtek
        } else if lower.contains("qualcomm") || lower.contains("atheros") {
            Self::Qualcomm
        } else if lower.contains("mediatek") {
            Self::Mediatek
        } else if lower.contains("broadcom") {
            Self::Broadcom
        } else if lower.contains("microsoft") {
            Self::Microsoft
        } else {
            Self::Other
        }
    }
}

/// Section of the hardware report a device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Machine make and model.
    System,
    /// CPU.
    Processor,
    /// Display adapters.
    Graphics,
    /// Sound devices.
    Audio,
    /// Network adapters.
    Network,
    /// Disks and storage controllers.
    Storage,
}

/// One detected device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Model or device name.
    pub name: String,
    /// Manufacturer as reported by the OS.
    pub manufacturer: String,
    /// Classified vendor.
    pub vendor: Vendor,
}

impl DeviceRecord {
    /// Build a record, classifying the vendor from the manufacturer and
    /// falling back to the name.
    #[must_use]
    pub fn new(name: impl Into<String>, manufacturer: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        let manufacturer = manufacturer.into().trim().to_string();
        let vendor = match Vendor::classify(&manufacturer) {
            Vendor::Other => Vendor::classify(&name),
            vendor => vendor,
        };
        Self {
            name,
            manufacturer,
            vendor,
        }
    }
}

/// Inventory written to `hardware.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareReport {
    /// Machine make and model.
    pub system: Option<DeviceRecord>,
    /// CPU.
    pub processor: Option<DeviceRecord>,
    /// Display adapters.
    pub graphics: Vec<DeviceRecord>,
    /// Sound devices.
    pub audio: Vec<DeviceRecord>,
    /// Network adapters.
    pub network: Vec<DeviceRecord>,
    /// Disks.
    pub storage: Vec<DeviceRecord>,
}

impl HardwareReport {
    /// Every device with its class.
    pub fn devices(&self) -> impl Iterator<Item = (DeviceClass, &DeviceRecord)> {
        let single = [
            (DeviceClass::System, self.system.as_ref()),
            (DeviceClass::Processor, self.processor.as_ref()),
        ]
        .into_iter()
        .filter_map(|(class, record)| record.map(|r| (class, r)));
        let lists = [
            (DeviceClass::Graphics, &self.graphics),
            (DeviceClass::Audio, &self.audio),
            (DeviceClass::Network, &self.network),
            (DeviceClass::Storage, &self.storage),
        ]
        .into_iter()
        .flat_map(|(class, list)| list.iter().map(move |r| (class, r)));
        single.chain(lists)
    }

    /// `true` if any device of `class` (any class when `None`) comes from
    /// `vendor`.
    #[must_use]
    pub fn has_vendor(&self, vendor: Vendor, class: Option<DeviceClass>) -> bool {
        self.devices()
            .any(|(c, r)| r.vendor == vendor && class.is_none_or(|want| want == c))
    }

    /// Write the report as pretty JSON, creating the parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing hardware report")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }

    /// Read a report written by [`write`](Self::write).
    ///
    /// # Errors
    ///
    /// Returns [`HandOffError::MissingArtifact`] when the file is absent and
    /// [`HandOffError::Unreadable`] when it cannot be read or parsed.
    pub fn read(path: &Path) -> Result<Self, HandOffError> {
        if !path.exists() {
            return Err(HandOffError::MissingArtifact(path.to_path_buf()));
        }
        let unreadable = |message: String| HandOffError::Unreadable {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| unreadable(e.to_string()))
    }
}

/// Path of the hardware artifact for a run.
#[must_use]
pub fn artifact_path(ctx: &Context) -> PathBuf {
    ctx.artifacts_dir().join(ARTIFACT_FILE)
}

/// Detect installed hardware and export the inventory.
#[derive(Debug)]
pub struct DetectHardware;

impl Module for DetectHardware {
    fn id(&self) -> ModuleId {
        ModuleId::HardwareDetect
    }

    fn execute(&self, ctx: &Context, handoff: &mut Handoff) -> Result<Outcome> {
        let report = match probe(ctx.platform.os, ctx.executor.as_ref(), Path::new("/"), &*ctx.log)
        {
            Ok(report) => report,
            Err(e) if ctx.is_dry_run() => {
                ctx.log.warn(&format!("hardware inventory failed: {e:#}"));
                HardwareReport::default()
            }
            Err(e) => return Err(e.context("hardware inventory failed")),
        };
        for (class, device) in report.devices() {
            ctx.log.info(&format!(
                "{class:?}: {} ({:?})",
                device.name, device.vendor
            ));
        }

        let path = artifact_path(ctx);
        ctx.perform(&format!("write {}", path.display()), || report.write(&path))?;

        ctx.set_summary(format!("{} devices detected", report.devices().count()));
        handoff.hardware = Some(report);
        Ok(if ctx.is_dry_run() {
            Outcome::DryRun
        } else {
            Outcome::Ok
        })
    }
}

/// Probe the machine. `fs_root` prefixes the Linux `/proc` and `/sys`
/// paths.
///
/// Missing Linux sources only warn and leave their section empty.
///
/// # Errors
///
/// Returns an error when the Windows inventory query fails or its output
/// cannot be parsed.
pub fn probe(
    os: Os,
    executor: &dyn Executor,
    fs_root: &Path,
    log: &dyn Log,
) -> Result<HardwareReport> {
    match os {
        Os::Windows => probe_windows(executor),
        Os::Linux => Ok(probe_linux(executor, fs_root, log)),
    }
}

// ---------------------------------------------------------------------------
// Windows: one CIM query through PowerShell, returned as JSON
// ---------------------------------------------------------------------------

const CIM_SCRIPT: &str = "$ErrorActionPreference='SilentlyContinue'\n\
function Pick($items, $name, $maker) { @($items | ForEach-Object { @{ name = [string]$_.$name; manufacturer = [string]$_.$maker } }) }\n\
@{\n\
  system = Pick (Get-CimInstance Win32_ComputerSystem) 'Model' 'Manufacturer'\n\
  processor = Pick (Get-CimInstance Win32_Processor) 'Name' 'Manufacturer'\n\
  graphics = Pick (Get-CimInstance Win32_VideoController) 'Name' 'AdapterCompatibility'\n\
  audio = Pick (Get-CimInstance Win32_SoundDevice) 'Name' 'Manufacturer'\n\
  network = Pick (Get-CimInstance Win32_NetworkAdapter -Filter 'PhysicalAdapter=True') 'Name' 'Manufacturer'\n\
  storage = Pick (Get-CimInstance Win32_DiskDrive) 'Model' 'Manufacturer'\n\
} | ConvertTo-Json -Depth 4 -Compress";

/// PowerShell collapses single-element arrays into objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(CimRecord),
    Many(Vec<CimRecord>),
}

impl OneOrMany {
    fn into_records(section: Option<Self>) -> Vec<DeviceRecord> {
        let items = match section {
            Some(Self::One(one)) => vec![one],
            Some(Self::Many(many)) => many,
            None => Vec::new(),
        };
        items
            .into_iter()
            .filter(|r| !r.name.trim().is_empty())
            .map(|r| DeviceRecord::new(r.name, r.manufacturer))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct CimRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    manufacturer: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CimInventory {
    system: Option<OneOrMany>,
    processor: Option<OneOrMany>,
    graphics: Option<OneOrMany>,
    audio: Option<OneOrMany>,
    network: Option<OneOrMany>,
    storage: Option<OneOrMany>,
}

fn probe_windows(executor: &dyn Executor) -> Result<HardwareReport> {
    let result = executor.run("powershell", &["-NoProfile", "-Command", CIM_SCRIPT])?;
    parse_cim_inventory(&result.stdout)
}

fn parse_cim_inventory(json: &str) -> Result<HardwareReport> {
    let inventory: CimInventory =
        serde_json::from_str(json.trim()).context("parsing CIM inventory")?;
    Ok(HardwareReport {
        system: OneOrMany::into_records(inventory.system).into_iter().next(),
        processor: OneOrMany::into_records(inventory.processor).into_iter().next(),
        graphics: OneOrMany::into_records(inventory.graphics),
        audio: OneOrMany::into_records(inventory.audio),
        network: OneOrMany::into_records(inventory.network),
        storage: OneOrMany::into_records(inventory.storage),
    })
}

// ---------------------------------------------------------------------------
// Linux: DMI and cpuinfo from the filesystem, devices from `lspci -mm`
// ---------------------------------------------------------------------------

fn probe_linux(executor: &dyn Executor, fs_root: &Path, log: &dyn Log) -> HardwareReport {
    let mut report = HardwareReport::default();

    let dmi = fs_root.join("sys/class/dmi/id");
    let read_dmi = |field: &str| {
        std::fs::read_to_string(dmi.join(field))
            .map(|s| s.trim().to_string())
            .ok()
            .filter(|s| !s.is_empty())
    };
    match (read_dmi("product_name"), read_dmi("sys_vendor")) {
        (Some(model), maker) => {
            report.system = Some(DeviceRecord::new(model, maker.unwrap_or_default()));
        }
        (None, _) => log.warn("system model unavailable (no DMI data)"),
    }

    match std::fs::read_to_string(fs_root.join("proc/cpuinfo")) {
        Ok(cpuinfo) => report.processor = parse_cpuinfo(&cpuinfo),
        Err(e) => log.warn(&format!("cannot read cpuinfo: {e}")),
    }

    if !executor.which("lspci") {
        log.warn("lspci not found; PCI devices not inventoried");
        return report;
    }
    match executor.run_unchecked("lspci", &["-mm"]) {
        Ok(result) if result.success => {
            for (class, record) in parse_lspci(&result.stdout) {
                match class {
                    DeviceClass::Graphics => report.graphics.push(record),
                    DeviceClass::Audio => report.audio.push(record),
                    DeviceClass::Network => report.network.push(record),
                    DeviceClass::Storage => report.storage.push(record),
                    DeviceClass::System | DeviceClass::Processor => {}
                }
            }
        }
        Ok(result) => log.warn(&format!("lspci failed: {}", result.stderr.trim())),
        Err(e) => log.warn(&format!("lspci failed: {e:#}")),
    }
    report
}

/// First processor's model and vendor from `/proc/cpuinfo`.
fn parse_cpuinfo(cpuinfo: &str) -> Option<DeviceRecord> {
    let field = |key: &str| {
        cpuinfo.lines().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            (k.trim() == key).then(|| v.trim().to_string())
        })
    };
    let name = field("model name").or_else(|| field("Model"))?;
    Some(DeviceRecord::new(name, field("vendor_id").unwrap_or_default()))
}

/// Map an `lspci` class description to a report section.
fn pci_class(description: &str) -> Option<DeviceClass> {
    let d = description.to_lowercase();
    if d.contains("vga") || d.contains("3d controller") || d.contains("display controller") {
        Some(DeviceClass::Graphics)
    } else if d.contains("audio") {
        Some(DeviceClass::Audio)
    } else if d.contains("ethernet") || d.contains("network controller") {
        Some(DeviceClass::Network)
    } else if d.contains("non-volatile memory")
        || d.contains("sata controller")
        || d.contains("raid bus")
        || d.contains("mass storage")
    {
        Some(DeviceClass::Storage)
    } else {
        None
    }
}

/// Parse `lspci -mm` output:
/// `00:02.0 "VGA compatible controller" "Intel Corporation" "UHD Graphics 620" -r07 ...`
fn parse_lspci(output: &str) -> Vec<(DeviceClass, DeviceRecord)> {
    output
        .lines()
        .filter_map(|line| {
            let quoted: Vec<&str> = line.split('"').skip(1).step_by(2).collect();
            let (class, vendor, device) = match quoted.as_slice() {
                [class, vendor, device, ..] => (*class, *vendor, *device),
                _ => return None,
            };
            Some((pci_class(class)?, DeviceRecord::new(device, vendor)))
        })
        .collect()
}
