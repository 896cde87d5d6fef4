//! Downloads a Geofabrik extract and preprocesses it for `osrm-routed`.
//!
//! Steps are skipped when their output already exists, so the expensive
//! extract/partition/customize run happens once per data directory.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct Region {
    /// Geofabrik region path, e.g. "north-america/us/nevada".
    pub path: String,
}

impl Region {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("region")
    }

    pub fn url(&self) -> String {
        format!("https://download.geofabrik.de/{}-latest.osm.pbf", self.path)
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub data_dir: PathBuf,
    pub osrm_base: PathBuf,
}

#[derive(Debug)]
pub enum DatasetError {
    Io(io::Error),
    Http(reqwest::Error),
    Process(String),
}

impl From<io::Error> for DatasetError {
    fn from(err: io::Error) -> Self {
        DatasetError::Io(err)
    }
}

impl From<reqwest::Error> for DatasetError {
    fn from(err: reqwest::Error) -> Self {
        DatasetError::Http(err)
    }
}

impl Dataset {
    /// Prepares an MLD dataset for `region` under `data_root`.
    pub fn ensure(region: &Region, data_root: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let data_dir = std::env::current_dir()?.join(data_root).join(region.name());
        fs::create_dir_all(&data_dir)?;

        let pbf_path = data_dir.join(format!("{}-latest.osm.pbf", region.name()));
        if !pbf_path.exists() {
            download(&region.url(), &pbf_path)?;
        }

        let osrm_base = data_dir.join(format!("{}-latest.osrm", region.name()));
        if !osrm_base.exists() {
            osrm_tool(&data_dir, &["osrm-extract", "-p", "/opt/car.lua", &container_path(&pbf_path)])?;
        }
        if !mld_ready(&osrm_base) {
            osrm_tool(&data_dir, &["osrm-partition", &container_path(&osrm_base)])?;
            osrm_tool(&data_dir, &["osrm-customize", &container_path(&osrm_base)])?;
        }

        Ok(Self {
            data_dir,
            osrm_base,
        })
    }

    pub fn routed_file(&self) -> String {
        container_path(&self.osrm_base)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), DatasetError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    writer.write_all(&response.bytes()?)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}

fn mld_ready(osrm_base: &Path) -> bool {
    ["osrm.partition", "osrm.mldgr", "osrm.cells"]
        .iter()
        .all(|ext| osrm_base.with_extension(ext).exists())
}

fn osrm_tool(data_dir: &Path, args: &[&str]) -> Result<(), DatasetError> {
    let status = Command::new("docker")
        .args(["run", "--rm", "-t", "-v"])
        .arg(format!("{}:/data", data_dir.display()))
        .arg("osrm/osrm-backend")
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(DatasetError::Process(format!("docker exited with status {}", status)))
    }
}

fn container_path(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    format!("/data/{}", name)
}
