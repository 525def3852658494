//! Host modules exposed to plugin scripts.
//!
//! Two groups of modules exist:
//!
//! - **Always bound**: `console`, `timer`, `process` and `buffer` are
//!   registered as static modules on every engine, so scripts call them
//!   directly (`console::log("hi")`).
//! - **Importable**: `fs`, `shell` and `path` form the host's built-in module
//!   namespace and are reached through `import "fs" as fs;`.
//!
//! Every native function returns a [`HostResult`] so a failing host call
//! surfaces as a catchable script error instead of a panic.

use crate::logger::{LogLevel, PluginLogger};
use rhai::{Array, Blob, Dynamic, EvalAltResult, ImmutableString, Map, Module, INT};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

/// Result type for native functions registered on host modules.
pub type HostResult<T> = Result<T, Box<EvalAltResult>>;

/// Logging proxy bound to one script file.
///
/// Every line is prefixed with `[Script <filename>]` before it reaches the
/// host logger.
#[derive(Clone)]
pub struct ScriptConsole {
    prefix: String,
    logger: Arc<dyn PluginLogger>,
}

impl ScriptConsole {
    pub fn new(filename: &str, logger: Arc<dyn PluginLogger>) -> Self {
        Self {
            prefix: format!("[Script {}]", filename),
            logger,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn emit(&self, level: LogLevel, message: &str) {
        self.logger.emit(level, &format!("{} {}", self.prefix, message));
    }

    pub fn log(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }
}

/// `console::log`, `console::warn`, `console::error`.
pub fn console_module(console: &ScriptConsole) -> Module {
    let mut module = Module::new();

    for (name, level) in [
        ("log", LogLevel::Info),
        ("warn", LogLevel::Warn),
        ("error", LogLevel::Error),
    ] {
        let console = console.clone();
        module.set_native_fn(name, move |value: Dynamic| -> HostResult<()> {
            console.emit(level, &value.to_string());
            Ok(())
        });
    }

    module
}

/// `timer::sleep(ms)` and `timer::now()`.
pub fn timer_module() -> Module {
    let mut module = Module::new();

    module.set_native_fn("sleep", |millis: INT| -> HostResult<()> {
        std::thread::sleep(Duration::from_millis(millis.max(0) as u64));
        Ok(())
    });

    module.set_native_fn("now", || -> HostResult<INT> {
        Ok(chrono::Utc::now().timestamp_millis())
    });

    module
}

/// Read-only handle on the host process.
pub fn process_module() -> Module {
    let mut module = Module::new();

    module.set_native_fn("pid", || -> HostResult<INT> { Ok(std::process::id() as INT) });

    module.set_native_fn("platform", || -> HostResult<ImmutableString> {
        Ok(std::env::consts::OS.into())
    });

    module.set_native_fn("cwd", || -> HostResult<ImmutableString> {
        let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
        Ok(cwd.to_string_lossy().into_owned().into())
    });

    module.set_native_fn("env", |name: ImmutableString| -> HostResult<Dynamic> {
        Ok(std::env::var(name.as_str())
            .map(Dynamic::from)
            .unwrap_or(Dynamic::UNIT))
    });

    module.set_native_fn("argv", || -> HostResult<Array> {
        Ok(std::env::args().map(Dynamic::from).collect())
    });

    module
}

/// Conversions between strings and byte blobs.
pub fn buffer_module() -> Module {
    let mut module = Module::new();

    module.set_native_fn("from_utf8", |text: ImmutableString| -> HostResult<Blob> {
        Ok(text.as_bytes().to_vec())
    });

    module.set_native_fn("to_utf8", |bytes: Blob| -> HostResult<ImmutableString> {
        Ok(String::from_utf8_lossy(&bytes).into_owned().into())
    });

    module
}

/// Filesystem access.
pub fn fs_module() -> Module {
    let mut module = Module::new();

    module.set_native_fn("read", |path: ImmutableString| -> HostResult<ImmutableString> {
        let text = std::fs::read_to_string(path.as_str())
            .map_err(|e| format!("Failed to read {}: {}", path, e))?;
        Ok(text.into())
    });

    module.set_native_fn(
        "write",
        |path: ImmutableString, contents: ImmutableString| -> HostResult<()> {
            std::fs::write(path.as_str(), contents.as_bytes())
                .map_err(|e| format!("Failed to write {}: {}", path, e))?;
            Ok(())
        },
    );

    module.set_native_fn("exists", |path: ImmutableString| -> HostResult<bool> {
        Ok(std::path::Path::new(path.as_str()).exists())
    });

    module.set_native_fn("list", |path: ImmutableString| -> HostResult<Array> {
        let entries = std::fs::read_dir(path.as_str())
            .map_err(|e| format!("Failed to list {}: {}", path, e))?;
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names.into_iter().map(Dynamic::from).collect())
    });

    module
}

/// Child process execution.
///
/// Both functions block until the child exits and return
/// `#{ stdout, stderr, code }`.
pub fn shell_module() -> Module {
    let mut module = Module::new();

    module.set_native_fn("exec", |command_line: ImmutableString| -> HostResult<Map> {
        let output = shell_command(command_line.as_str())
            .output()
            .map_err(|e| format!("Failed to run `{}`: {}", command_line, e))?;
        Ok(output_to_map(output))
    });

    module.set_native_fn(
        "run",
        |program: ImmutableString, args: Array| -> HostResult<Map> {
            let args: Vec<String> = args.into_iter().map(|arg| arg.to_string()).collect();
            let output = Command::new(program.as_str())
                .args(&args)
                .output()
                .map_err(|e| format!("Failed to run {}: {}", program, e))?;
            Ok(output_to_map(output))
        },
    );

    module
}

/// Path manipulation.
pub fn path_module() -> Module {
    let mut module = Module::new();

    module.set_native_fn(
        "join",
        |base: ImmutableString, child: ImmutableString| -> HostResult<ImmutableString> {
            let joined = PathBuf::from(base.as_str()).join(child.as_str());
            Ok(joined.to_string_lossy().into_owned().into())
        },
    );

    module.set_native_fn("file_name", |path: ImmutableString| -> HostResult<Dynamic> {
        Ok(std::path::Path::new(path.as_str())
            .file_name()
            .map(|name| Dynamic::from(name.to_string_lossy().into_owned()))
            .unwrap_or(Dynamic::UNIT))
    });

    module.set_native_fn("home", || -> HostResult<Dynamic> {
        Ok(directories::BaseDirs::new()
            .map(|dirs| Dynamic::from(dirs.home_dir().to_string_lossy().into_owned()))
            .unwrap_or(Dynamic::UNIT))
    });

    module
}

/// The host's built-in module namespace, keyed by import path.
pub fn builtin_modules() -> BTreeMap<&'static str, Arc<Module>> {
    let mut modules = BTreeMap::new();
    modules.insert("fs", Arc::new(fs_module()));
    modules.insert("shell", Arc::new(shell_module()));
    modules.insert("path", Arc::new(path_module()));
    modules
}

#[cfg(unix)]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    command
}

#[cfg(not(unix))]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(command_line);
    command
}

fn output_to_map(output: Output) -> Map {
    let mut map = Map::new();
    map.insert(
        "stdout".into(),
        Dynamic::from(String::from_utf8_lossy(&output.stdout).into_owned()),
    );
    map.insert(
        "stderr".into(),
        Dynamic::from(String::from_utf8_lossy(&output.stderr).into_owned()),
    );
    map.insert(
        "code".into(),
        Dynamic::from_int(output.status.code().unwrap_or(-1) as INT),
    );
    map
}
