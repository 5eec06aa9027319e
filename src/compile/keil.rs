use super::{AsmCompiler, CompileError};
use crate::preprocess::extract_code_from_listing;
use log::debug;
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub const COMPILE_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

const INSTALL_ENV_VARS: &[&str] = &["C51ROOT", "KEIL_C51"];

const COMMON_INSTALL_PATHS: &[&str] = &[
    r"C:\Keil_v5\C51",
    r"C:\Keil\C51",
    r"C:\Program Files\Keil_v5\C51",
    r"C:\Program Files (x86)\Keil_v5\C51",
    r"C:\Program Files\Keil\C51",
    r"C:\Program Files (x86)\Keil\C51",
];

fn compiler_binary(root: &Path) -> PathBuf {
    root.join("BIN").join("C51.exe")
}

/// Search the environment variables and the usual install locations for a
/// C51 root containing `BIN/C51.exe`.
pub fn find_installation() -> Option<PathBuf> {
    INSTALL_ENV_VARS
        .iter()
        .filter_map(|var| env::var_os(var))
        .map(PathBuf::from)
        .chain(COMMON_INSTALL_PATHS.iter().map(PathBuf::from))
        .find(|root| compiler_binary(root).is_file())
}

/// Keil C51 command-line compiler.
#[derive(Debug, Clone)]
pub struct KeilC51 {
    root: PathBuf,
    timeout: Duration,
}

impl KeilC51 {
    /// Use `explicit` when given, otherwise search for an installation.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, CompileError> {
        let root = match explicit {
            Some(root) => {
                if !compiler_binary(root).is_file() {
                    return Err(CompileError::NotInstalled(format!(
                        "C51 compiler not found at {}",
                        compiler_binary(root).display()
                    )));
                }
                root.to_path_buf()
            }
            None => find_installation().ok_or_else(|| {
                CompileError::NotInstalled(
                    "Keil C51 compiler not found. Pass --keil-path or set C51ROOT.".to_string(),
                )
            })?,
        };

        Ok(Self {
            root,
            timeout: COMPILE_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AsmCompiler for KeilC51 {
    fn name(&self) -> &str {
        "keil-c51"
    }

    fn compile(&self, c_file: &Path) -> Result<String, CompileError> {
        let work_dir = tempfile::tempdir()
            .map_err(|e| CompileError::io("Failed to create build directory", e))?;

        let file_name = c_file.file_name().ok_or_else(|| {
            CompileError::MissingOutput(format!("not a file: {}", c_file.display()))
        })?;
        let stem = c_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let staged = work_dir.path().join(file_name);
        fs::copy(c_file, &staged).map_err(|e| {
            CompileError::io(format!("Failed to stage {}", c_file.display()), e)
        })?;

        let log_path = work_dir.path().join("c51.log");
        let log = File::create(&log_path)
            .map_err(|e| CompileError::io("Failed to create compiler log", e))?;
        let log_err = log
            .try_clone()
            .map_err(|e| CompileError::io("Failed to create compiler log", e))?;

        debug!("Compiling {} with {}", c_file.display(), self.root.display());
        let mut child = Command::new(compiler_binary(&self.root))
            .arg(&staged)
            .arg("LST")
            .arg(format!("OBJ({}.obj)", stem))
            .arg("DEBUG")
            .arg("OPTIMIZE(LEVEL(9))")
            .current_dir(work_dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()
            .map_err(|e| CompileError::io("Failed to start C51", e))?;

        let status = wait_with_timeout(&mut child, self.timeout)?;
        if !status.success() {
            let output = fs::read(&log_path)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default();
            return Err(CompileError::Failed {
                status: status.to_string(),
                output,
            });
        }

        let listing_path = ["lst", "a51"]
            .iter()
            .map(|ext| work_dir.path().join(format!("{}.{}", stem, ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| CompileError::MissingOutput(format!("{}.lst", stem)))?;

        let listing = fs::read(&listing_path)
            .map_err(|e| CompileError::io("Failed to read listing", e))?;

        Ok(extract_code_from_listing(&String::from_utf8_lossy(&listing)))
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus, CompileError> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CompileError::Timeout {
                    seconds: timeout.as_secs(),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(CompileError::io("Failed to wait for C51", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_rejects_missing_binary() {
        let dir = TempDir::new().unwrap();
        let err = KeilC51::locate(Some(dir.path())).unwrap_err();
        assert!(matches!(err, CompileError::NotInstalled(_)));
        assert!(err.to_string().contains("C51.exe"));
    }

    #[test]
    fn test_locate_accepts_explicit_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("BIN")).unwrap();
        fs::write(dir.path().join("BIN").join("C51.exe"), b"").unwrap();

        let compiler = KeilC51::locate(Some(dir.path())).unwrap();
        assert_eq!(compiler.root(), dir.path());
        assert_eq!(compiler.timeout, COMPILE_TIMEOUT);
    }

    #[cfg(unix)]
    fn fake_installation(script: &str) -> TempDir {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("BIN");
        fs::create_dir_all(&bin).unwrap();
        let exe = bin.join("C51.exe");
        fs::write(&exe, script).unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        dir
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_reads_listing() {
        let install = fake_installation(
            "#!/bin/sh\nstem=$(basename \"$1\" .c)\nprintf '   1 0000        MOV A,#01H\\n   2 0002        RET\\n' > \"$stem.lst\"\n",
        );
        let sources = TempDir::new().unwrap();
        let c_file = sources.path().join("main.c");
        fs::write(&c_file, "void main(void) {}").unwrap();

        let compiler = KeilC51::locate(Some(install.path())).unwrap();
        let asm = compiler.compile(&c_file).unwrap();
        assert_eq!(asm, "MOV A,#01H\nRET");
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_reports_failure_output() {
        let install = fake_installation("#!/bin/sh\necho '*** ERROR C141: syntax error'\nexit 2\n");
        let sources = TempDir::new().unwrap();
        let c_file = sources.path().join("broken.c");
        fs::write(&c_file, "void main(void) {").unwrap();

        let compiler = KeilC51::locate(Some(install.path())).unwrap();
        match compiler.compile(&c_file) {
            Err(CompileError::Failed { output, .. }) => assert!(output.contains("C141")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_times_out() {
        let install = fake_installation("#!/bin/sh\nsleep 5\n");
        let sources = TempDir::new().unwrap();
        let c_file = sources.path().join("slow.c");
        fs::write(&c_file, "").unwrap();

        let compiler = KeilC51::locate(Some(install.path()))
            .unwrap()
            .with_timeout(Duration::from_millis(200));
        assert_eq!(
            compiler.compile(&c_file),
            Err(CompileError::Timeout { seconds: 0 })
        );
    }
}
