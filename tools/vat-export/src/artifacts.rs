//! Writing bake artifacts
//!
//! All three artifacts of a bake are encoded in memory first, written to
//! `*.tmp` siblings and then renamed into place. If anything fails, every
//! file written so far is removed, so an output directory holds either a
//! complete set or none of it.
//!
//! A `<name>.vat.lock` file, created exclusively, keeps two bakes from
//! writing the same output name at once. It records the owner's PID so a
//! lock orphaned by a killed bake can be reclaimed.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use sysinfo::{Pid, ProcessesToUpdate, System};
use vat_common::{ArtifactNames, TextureEncoding, is_bare_file_name};

use crate::bake::BakeOutput;
use crate::error::BakeError;

/// Lock file extension (appended to the bake name)
pub const LOCK_EXT: &str = "vat.lock";

/// Where the artifacts of one bake live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub texture: PathBuf,
    pub mesh: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, name: &str, encoding: TextureEncoding) -> Self {
        let names = ArtifactNames::new(name, encoding);
        Self {
            texture: dir.join(names.texture),
            mesh: dir.join(names.mesh),
            metadata: dir.join(names.metadata),
        }
    }

    pub fn all(&self) -> [&Path; 3] {
        [&self.texture, &self.mesh, &self.metadata]
    }
}

fn validate_name(name: &str) -> Result<(), BakeError> {
    if is_bare_file_name(name) {
        Ok(())
    } else {
        Err(BakeError::Configuration(format!(
            "'{}' is not a valid output name",
            name
        )))
    }
}

/// Create the lock file and record the owning process in it
fn create_lock(path: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(e) = write!(file, "{}", std::process::id()) {
        if let Err(remove) = fs::remove_file(path) {
            tracing::warn!("Failed to remove unwritten lock {:?}: {}", path, remove);
        }
        return Err(e);
    }
    Ok(())
}

/// PID recorded in a lock whose owner is no longer running.
///
/// Unreadable or empty lock files count as held: the owner may be between
/// creating the file and writing its PID.
fn stale_owner(path: &Path) -> Option<u32> {
    let pid: u32 = fs::read_to_string(path).ok()?.trim().parse().ok()?;
    let pid_handle = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid_handle]));
    system.process(pid_handle).is_none().then_some(pid)
}

/// Exclusive claim on one output name. Released on drop.
///
/// The lock file holds the owner's PID. A lock left behind by a process
/// that is no longer running is reclaimed.
#[derive(Debug)]
pub struct OutputLock {
    dir: PathBuf,
    name: String,
    path: PathBuf,
}

impl OutputLock {
    /// Claim `name` in `dir`, creating the directory if needed.
    ///
    /// Fails with [`BakeError::OutputLocked`] while a running process holds
    /// the lock on the same name.
    pub fn acquire(dir: &Path, name: &str) -> Result<Self, BakeError> {
        validate_name(name)?;
        fs::create_dir_all(dir).map_err(|e| BakeError::io(dir, e))?;

        let path = dir.join(format!("{}.{}", name, LOCK_EXT));
        let mut reclaimed = false;
        loop {
            match create_lock(&path) {
                Ok(()) => {
                    return Ok(Self {
                        dir: dir.to_path_buf(),
                        name: name.to_string(),
                        path,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    let stale = if reclaimed { None } else { stale_owner(&path) };
                    let Some(pid) = stale else {
                        return Err(BakeError::OutputLocked(path));
                    };
                    tracing::warn!(
                        "Reclaiming lock {:?} left by process {}, which is no longer running",
                        path,
                        pid
                    );
                    match fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => return Err(BakeError::io(&path, e)),
                    }
                    reclaimed = true;
                }
                Err(e) => return Err(BakeError::io(path, e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the artifacts of `output` under the locked name
    pub fn write(
        &self,
        output: &BakeOutput,
        encoding: TextureEncoding,
    ) -> Result<ArtifactPaths, BakeError> {
        let paths = ArtifactPaths::new(&self.dir, &self.name, encoding);

        let texture = output.texture.encode(encoding)?;
        let mesh = output.mesh.to_bytes()?;
        let metadata = output.metadata(&self.name, encoding).to_json_pretty()?;
        let contents: [&[u8]; 3] = [&texture, &mesh, metadata.as_bytes()];

        let mut staged: Vec<PathBuf> = Vec::with_capacity(3);
        for (path, bytes) in paths.all().into_iter().zip(contents) {
            let tmp = tmp_path(path);
            staged.push(tmp.clone());
            if let Err(e) = fs::write(&tmp, bytes) {
                remove_all(&staged);
                return Err(BakeError::io(tmp, e));
            }
        }

        let mut committed: Vec<PathBuf> = Vec::with_capacity(3);
        for (tmp, path) in staged.iter().zip(paths.all()) {
            if let Err(e) = fs::rename(tmp, path) {
                remove_all(&committed);
                remove_all(&staged);
                return Err(BakeError::io(path, e));
            }
            committed.push(path.to_path_buf());
        }

        tracing::info!(
            "Wrote {:?}, {:?}, {:?}",
            paths.texture,
            paths.mesh,
            paths.metadata
        );
        Ok(paths)
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release lock {:?}: {}", self.path, e);
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                tracing::warn!("Failed to remove partial artifact {:?}: {}", path, e);
            }
        }
    }
}

/// Lock `name` in `dir`, write all artifacts of `output` and release the lock
pub fn write_artifacts(
    output: &BakeOutput,
    dir: &Path,
    name: &str,
    encoding: TextureEncoding,
) -> Result<ArtifactPaths, BakeError> {
    let lock = OutputLock::acquire(dir, name)?;
    lock.write(output, encoding)
}
