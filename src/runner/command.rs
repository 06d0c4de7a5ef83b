//! Invocation shape selection for the simulator binary.
use std::ffi::OsString;
use std::path::Path;

/// Lowercased filename fragment identifying the console build.
pub const CONSOLE_MARKER: &str = "gmatconsole";

/// Log file the console build writes inside the sandbox.
pub const LOG_FILE_NAME: &str = "gmat.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationShape {
    /// `binary script`
    Direct,
    /// `binary --startup_file ... --logfile ... --run script --exit`
    Console,
}

impl InvocationShape {
    /// Decided by filename alone; unknown names fall back to `Direct`.
    pub fn for_binary(binary: &Path) -> Self {
        let name = binary
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.contains(CONSOLE_MARKER) {
            InvocationShape::Console
        } else {
            InvocationShape::Direct
        }
    }

    pub fn needs_startup_file(self) -> bool {
        matches!(self, InvocationShape::Console)
    }
}

/// Assemble argv (including argv[0]) for the given shape.
///
/// `startup_file` is only consulted for the console shape.
pub fn build_command(
    shape: InvocationShape,
    binary: &Path,
    script: &Path,
    work_dir: &Path,
    startup_file: Option<&Path>,
) -> Vec<OsString> {
    match (shape, startup_file) {
        (InvocationShape::Console, Some(startup_file)) => vec![
            binary.as_os_str().to_owned(),
            OsString::from("--startup_file"),
            startup_file.as_os_str().to_owned(),
            OsString::from("--logfile"),
            work_dir.join(LOG_FILE_NAME).into_os_string(),
            OsString::from("--run"),
            script.as_os_str().to_owned(),
            OsString::from("--exit"),
        ],
        _ => vec![binary.as_os_str().to_owned(), script.as_os_str().to_owned()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn plain_gui_binary_gets_direct_invocation() {
        let binary = PathBuf::from("/opt/GMAT/bin/GMAT");
        let script = PathBuf::from("/tmp/sb/mission.script");
        let shape = InvocationShape::for_binary(&binary);
        assert_eq!(shape, InvocationShape::Direct);
        assert_eq!(
            build_command(shape, &binary, &script, Path::new("/tmp/sb"), None),
            vec![OsString::from("/opt/GMAT/bin/GMAT"), OsString::from("/tmp/sb/mission.script")]
        );
    }

    #[test]
    fn console_marker_is_case_insensitive() {
        for name in ["GmatConsole", "gmatconsole-R2025a", "GMATCONSOLE.exe"] {
            let binary = PathBuf::from("/opt/GMAT/bin").join(name);
            assert_eq!(
                InvocationShape::for_binary(&binary),
                InvocationShape::Console,
                "{name}"
            );
        }
        assert_eq!(
            InvocationShape::for_binary(Path::new("/opt/gmatconsole/bin/GMAT-R2025a")),
            InvocationShape::Direct
        );
    }

    #[test]
    fn console_command_carries_startup_log_run_exit() {
        let binary = PathBuf::from("/opt/GMAT/bin/GmatConsole");
        let work_dir = PathBuf::from("/tmp/sb");
        let startup = work_dir.join("gmat_startup_file.txt");
        let script = work_dir.join("mission.script");
        let argv = build_command(
            InvocationShape::Console,
            &binary,
            &script,
            &work_dir,
            Some(&startup),
        );
        let argv: Vec<String> = argv
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            argv,
            vec![
                "/opt/GMAT/bin/GmatConsole",
                "--startup_file",
                "/tmp/sb/gmat_startup_file.txt",
                "--logfile",
                "/tmp/sb/gmat.log",
                "--run",
                "/tmp/sb/mission.script",
                "--exit",
            ]
        );
    }
}
