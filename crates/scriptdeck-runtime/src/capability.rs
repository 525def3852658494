//! The capability set injected into every plugin execution context.
//!
//! Every plugin receives exactly the same bindings. The only per-plugin
//! input is the filename, which the logging proxy and the module resolver
//! use to attribute their messages.

use crate::host::{self, ScriptConsole};
use crate::logger::PluginLogger;
use rhai::{Engine, EvalAltResult, Module, ModuleResolver, Position};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A binding granted to plugin scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `import` statements resolved against the host module namespace.
    ModuleResolution,

    /// `console::log/warn/error`, `print` and `debug`.
    Logging,

    /// `timer::sleep` and `timer::now`.
    Timers,

    /// Read-only host process handle (`process::*`).
    Process,

    /// String/blob conversions (`buffer::*`).
    Buffer,
}

impl Capability {
    /// Every capability, in the order they are installed.
    pub const ALL: [Capability; 5] = [
        Capability::ModuleResolution,
        Capability::Logging,
        Capability::Timers,
        Capability::Process,
        Capability::Buffer,
    ];

    /// Convert capability to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ModuleResolution => "module_resolution",
            Capability::Logging => "logging",
            Capability::Timers => "timers",
            Capability::Process => "process",
            Capability::Buffer => "buffer",
        }
    }
}

/// Resolves `import "<name>"` against the host's built-in modules only.
///
/// Unknown names resolve to an empty module and log a warning. Resolution
/// never fails, so a plugin's top-level code cannot abort on an import.
pub struct HostModuleResolver {
    filename: String,
    logger: Arc<dyn PluginLogger>,
    modules: BTreeMap<&'static str, Arc<Module>>,
}

impl HostModuleResolver {
    pub fn new(filename: &str, logger: Arc<dyn PluginLogger>) -> Self {
        Self {
            filename: filename.to_string(),
            logger,
            modules: host::builtin_modules(),
        }
    }

    /// Names that resolve to a non-empty module.
    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().copied()
    }

    /// Look up a module, falling back to an empty stub.
    pub fn lookup(&self, path: &str) -> Arc<Module> {
        match self.modules.get(path) {
            Some(module) => Arc::clone(module),
            None => {
                self.logger.warn(&format!(
                    "Cannot import module {} in script {}",
                    path, self.filename
                ));
                Arc::new(Module::new())
            }
        }
    }
}

impl ModuleResolver for HostModuleResolver {
    fn resolve(
        &self,
        _engine: &Engine,
        _source: Option<&str>,
        path: &str,
        _pos: Position,
    ) -> Result<Arc<Module>, Box<EvalAltResult>> {
        Ok(self.lookup(path))
    }
}

/// The bindings granted to one plugin execution context.
///
/// Built fresh for every load so that log lines carry the originating
/// filename; the shape is identical for every plugin.
pub struct CapabilitySet {
    console: ScriptConsole,
    resolver: HostModuleResolver,
    static_modules: Vec<(&'static str, Arc<Module>)>,
}

impl CapabilitySet {
    /// Build the capability set for `filename`.
    pub fn build(filename: &str, logger: Arc<dyn PluginLogger>) -> Self {
        let console = ScriptConsole::new(filename, Arc::clone(&logger));

        let static_modules = vec![
            ("console", Arc::new(host::console_module(&console))),
            ("timer", Arc::new(host::timer_module())),
            ("process", Arc::new(host::process_module())),
            ("buffer", Arc::new(host::buffer_module())),
        ];

        Self {
            resolver: HostModuleResolver::new(filename, logger),
            console,
            static_modules,
        }
    }

    /// The capabilities this set grants.
    pub fn granted(&self) -> &'static [Capability] {
        &Capability::ALL
    }

    /// Names of the modules bound into every script's namespace.
    pub fn static_module_names(&self) -> Vec<&'static str> {
        self.static_modules.iter().map(|(name, _)| *name).collect()
    }

    /// The logging proxy for this script.
    pub fn console(&self) -> &ScriptConsole {
        &self.console
    }

    /// Install every binding into `engine`.
    pub fn install(self, engine: &mut Engine) {
        for (name, module) in self.static_modules {
            engine.register_static_module(name, module);
        }

        let console = self.console.clone();
        engine.on_print(move |text| console.log(text));

        let console = self.console;
        engine.on_debug(move |text, _source, pos| {
            if pos.is_none() {
                console.log(text);
            } else {
                console.log(&format!("{} @ {}", text, pos));
            }
        });

        engine.set_module_resolver(self.resolver);
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySet")
            .field("script", &self.console.prefix())
            .field("static_modules", &self.static_module_names())
            .finish()
    }
}
