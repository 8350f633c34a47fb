//! Linux process registry reading procfs.

use std::path::{Path, PathBuf};

use procfs::process::Process;
use procfs::{FromRead, Meminfo, ProcError};
use tokio::fs;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};
use crate::ports::{ProcessHandle, ProcessRegistry};

/// Longest name the kernel keeps in `comm`.
const COMM_LEN: usize = 15;

/// Linux-specific process registry.
///
/// Total memory is read from `meminfo` on first use and cached for the
/// lifetime of the registry.
pub struct ProcfsRegistry {
    root: PathBuf,
    mem_total: OnceCell<u64>,
}

impl ProcfsRegistry {
    /// Create a registry reading the live `/proc`.
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Create a registry reading a procfs tree rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mem_total: OnceCell::new(),
        }
    }

    /// Total memory in bytes.
    async fn mem_total(&self) -> Result<u64> {
        let root = &self.root;
        let total = self
            .mem_total
            .get_or_try_init(|| async move {
                let path = root.join("meminfo");
                let content = fs::read(&path).await?;
                let meminfo = Meminfo::from_read(content.as_slice())
                    .map_err(|e| Error::ParseError(format!("{}: {}", path.display(), e)))?;
                match meminfo.mem_total {
                    0 => Err(Error::ParseError(format!(
                        "no usable MemTotal in {}",
                        path.display()
                    ))),
                    total => Ok(total),
                }
            })
            .await?;
        Ok(*total)
    }
}

impl Default for ProcfsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRegistry for ProcfsRegistry {
    type Handle = ProcfsProcess;

    async fn resolve(&self, pid: u32) -> Result<ProcfsProcess> {
        let mem_total = self.mem_total().await?;
        let process = Process::new_with_root(self.root.join(pid.to_string()))
            .map_err(|e| Error::from_proc_error(pid, e))?;

        Ok(ProcfsProcess {
            pid,
            process,
            mem_total,
        })
    }
}

/// A process backed by its `<root>/<pid>` directory.
pub struct ProcfsProcess {
    pid: u32,
    process: Process,
    mem_total: u64,
}

impl ProcfsProcess {
    /// Full executable name when `comm` was cut at the kernel limit.
    ///
    /// `argv[0]` is only trusted when its basename extends `comm`.
    fn untruncated_name(&self, comm: &str) -> Result<Option<String>> {
        let cmdline = match self.process.cmdline() {
            Ok(cmdline) => cmdline,
            Err(ProcError::PermissionDenied(_)) => return Ok(None),
            Err(e) => return Err(Error::from_proc_error(self.pid, e)),
        };

        let name = cmdline
            .first()
            .and_then(|arg0| Path::new(arg0).file_name())
            .and_then(|name| name.to_str())
            .filter(|name| name.starts_with(comm))
            .map(str::to_string);
        Ok(name)
    }
}

impl ProcessHandle for ProcfsProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    async fn name(&self) -> Result<String> {
        let comm = self
            .process
            .status()
            .map_err(|e| Error::from_proc_error(self.pid, e))?
            .name;
        if comm.len() < COMM_LEN {
            return Ok(comm);
        }

        Ok(self.untruncated_name(&comm)?.unwrap_or(comm))
    }

    async fn memory_percent(&self) -> Result<f64> {
        let status = self
            .process
            .status()
            .map_err(|e| Error::from_proc_error(self.pid, e))?;
        // Kernel threads have no VmRSS line
        let rss_bytes = status.vmrss.unwrap_or(0) * 1024;
        Ok(rss_bytes as f64 / self.mem_total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MEMINFO: &str = "\
MemTotal:        8000000 kB
MemFree:         4000000 kB
MemAvailable:    6000000 kB
Buffers:          100000 kB
Cached:          1000000 kB
SwapCached:            0 kB
Active:          2000000 kB
Inactive:        1000000 kB
Active(anon):    1000000 kB
Inactive(anon):        0 kB
Active(file):    1000000 kB
Inactive(file):  1000000 kB
Unevictable:           0 kB
Mlocked:               0 kB
SwapTotal:       2000000 kB
SwapFree:        2000000 kB
Dirty:               100 kB
Writeback:             0 kB
AnonPages:       1000000 kB
Mapped:           200000 kB
Shmem:             10000 kB
KReclaimable:      50000 kB
Slab:             100000 kB
SReclaimable:      50000 kB
SUnreclaim:        50000 kB
KernelStack:       10000 kB
PageTables:        20000 kB
NFS_Unstable:          0 kB
Bounce:                0 kB
WritebackTmp:          0 kB
CommitLimit:     6000000 kB
Committed_AS:    3000000 kB
VmallocTotal:   34359738367 kB
VmallocUsed:       30000 kB
VmallocChunk:          0 kB
Percpu:             5000 kB
HardwareCorrupted:     0 kB
AnonHugePages:         0 kB
ShmemHugePages:        0 kB
ShmemPmdMapped:        0 kB
FileHugePages:         0 kB
FilePmdMapped:         0 kB
HugePages_Total:       0
HugePages_Free:        0
HugePages_Rsvd:        0
HugePages_Surp:        0
Hugepagesize:       2048 kB
Hugetlb:               0 kB
DirectMap4k:      200000 kB
DirectMap2M:     8000000 kB
";

    /// A `status` file as the kernel writes it; `vm` holds the `Vm*`/`Rss*`
    /// block, which kernel threads lack.
    fn status(name: &str, pid: u32, vm: &str) -> String {
        format!(
            "Name:\t{name}\n\
             Umask:\t0022\n\
             State:\tS (sleeping)\n\
             Tgid:\t{pid}\n\
             Ngid:\t0\n\
             Pid:\t{pid}\n\
             PPid:\t1\n\
             TracerPid:\t0\n\
             Uid:\t0\t0\t0\t0\n\
             Gid:\t0\t0\t0\t0\n\
             FDSize:\t64\n\
             Groups:\t0 \n\
             NStgid:\t{pid}\n\
             NSpid:\t{pid}\n\
             NSpgid:\t{pid}\n\
             NSsid:\t{pid}\n\
             {vm}\
             Threads:\t1\n\
             SigQ:\t0/63445\n\
             SigPnd:\t0000000000000000\n\
             ShdPnd:\t0000000000000000\n\
             SigBlk:\t0000000000000000\n\
             SigIgn:\t0000000000001000\n\
             SigCgt:\t0000000180000000\n\
             CapInh:\t0000000000000000\n\
             CapPrm:\t000001ffffffffff\n\
             CapEff:\t000001ffffffffff\n\
             CapBnd:\t000001ffffffffff\n\
             CapAmb:\t0000000000000000\n\
             NoNewPrivs:\t0\n\
             Seccomp:\t0\n\
             Cpus_allowed:\tff\n\
             Cpus_allowed_list:\t0-7\n\
             Mems_allowed:\t00000000,00000001\n\
             Mems_allowed_list:\t0\n\
             voluntary_ctxt_switches:\t10\n\
             nonvoluntary_ctxt_switches:\t2\n"
        )
    }

    fn user_vm(rss_kb: u64) -> String {
        format!(
            "VmPeak:\t   20000 kB\n\
             VmSize:\t   20000 kB\n\
             VmLck:\t       0 kB\n\
             VmPin:\t       0 kB\n\
             VmHWM:\t{rss_kb:>8} kB\n\
             VmRSS:\t{rss_kb:>8} kB\n\
             RssAnon:\t{rss_kb:>8} kB\n\
             RssFile:\t       0 kB\n\
             RssShmem:\t       0 kB\n\
             VmData:\t    1000 kB\n\
             VmStk:\t     132 kB\n\
             VmExe:\t     100 kB\n\
             VmLib:\t    2000 kB\n\
             VmPTE:\t      60 kB\n\
             VmSwap:\t       0 kB\n"
        )
    }

    fn add_process(root: &Path, pid: u32, status: &str, cmdline: &str) {
        let dir = root.join(pid.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("status"), status).unwrap();
        std::fs::write(dir.join("cmdline"), cmdline).unwrap();
    }

    fn fake_procfs() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("meminfo"), MEMINFO).unwrap();

        add_process(
            root,
            42,
            &status("nginx", 42, &user_vm(40_000)),
            "nginx: master process\0",
        );
        add_process(root, 2, &status("kthreadd", 2, ""), "");
        add_process(
            root,
            300,
            &status("systemd-resolve", 300, &user_vm(8_000)),
            "/lib/systemd/systemd-resolved\0",
        );
        add_process(
            root,
            301,
            &status("containerd-shim", 301, &user_vm(8_000)),
            "/usr/bin/dockerd\0--debug\0",
        );

        dir
    }

    #[tokio::test]
    async fn test_resolve_and_query() {
        let dir = fake_procfs();
        let registry = ProcfsRegistry::with_root(dir.path());

        let process = registry.resolve(42).await.unwrap();
        assert_eq!(process.pid(), 42);
        assert_eq!(process.name().await.unwrap(), "nginx");

        let percent = process.memory_percent().await.unwrap();
        assert!((percent - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_truncated_name_recovered_from_cmdline() {
        let dir = fake_procfs();
        let registry = ProcfsRegistry::with_root(dir.path());

        let process = registry.resolve(300).await.unwrap();
        assert_eq!(process.name().await.unwrap(), "systemd-resolved");
    }

    #[tokio::test]
    async fn test_unrelated_cmdline_keeps_comm() {
        let dir = fake_procfs();
        let registry = ProcfsRegistry::with_root(dir.path());

        let process = registry.resolve(301).await.unwrap();
        assert_eq!(process.name().await.unwrap(), "containerd-shim");
    }

    #[tokio::test]
    async fn test_kernel_thread_uses_no_memory() {
        let dir = fake_procfs();
        let registry = ProcfsRegistry::with_root(dir.path());

        let process = registry.resolve(2).await.unwrap();
        assert_eq!(process.name().await.unwrap(), "kthreadd");
        assert_eq!(process.memory_percent().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_missing_process_is_not_found() {
        let dir = fake_procfs();
        let registry = ProcfsRegistry::with_root(dir.path());

        let err = registry.resolve(9999).await.err().unwrap();
        assert!(matches!(err, Error::ProcessNotFound(9999)));
    }

    #[tokio::test]
    async fn test_process_exiting_after_resolve_is_not_found() {
        let dir = fake_procfs();
        let registry = ProcfsRegistry::with_root(dir.path());

        let process = registry.resolve(42).await.unwrap();
        std::fs::remove_file(dir.path().join("42/status")).unwrap();

        assert!(process.name().await.unwrap_err().is_process_not_found());
        assert!(process.memory_percent().await.unwrap_err().is_process_not_found());
    }

    #[tokio::test]
    async fn test_missing_meminfo_is_fatal() {
        let dir = fake_procfs();
        std::fs::remove_file(dir.path().join("meminfo")).unwrap();
        let registry = ProcfsRegistry::with_root(dir.path());

        let err = registry.resolve(42).await.err().unwrap();
        assert!(!err.is_process_not_found());
    }
}
