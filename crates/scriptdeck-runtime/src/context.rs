//! Isolated execution contexts.
//!
//! Every script runs in its own [`ExecutionContext`]: a fresh Rhai engine
//! carrying the script's [`CapabilitySet`], plus a fresh scope holding only
//! an empty `exports` object map. Contexts are consumed by [`ExecutionContext::run`]
//! and never reused, so one script's top-level mutations cannot leak into
//! another's run.
//!
//! What survives a run is a [`ScriptExports`]: the values left in `exports`
//! and the [`ScriptProgram`] needed to call any exported functions. The run
//! is captured as a Rhai module, so exported functions and closures keep the
//! script's top-level imports and constants when they are called later.

use crate::capability::CapabilitySet;
use crate::error::RuntimeResult;
use rhai::{Dynamic, Engine, FnAccess, FnPtr, FuncArgs, Map, Module, Scope, AST};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Name of the exports container seeded into every scope.
pub const EXPORTS: &str = "exports";

/// A fresh, single-use environment for one script.
pub struct ExecutionContext {
    engine: Engine,
    scope: Scope<'static>,
    exports: Dynamic,
}

impl ExecutionContext {
    /// Create a context seeded with `capabilities` and an empty exports map.
    pub fn new(capabilities: CapabilitySet) -> Self {
        let mut engine = Engine::new();
        capabilities.install(&mut engine);

        // Shared so the map outlives the scope consumed by the run.
        let exports = Dynamic::from_map(Map::new()).into_shared();
        let mut scope = Scope::new();
        scope.push_dynamic(EXPORTS, exports.clone());

        Self {
            engine,
            scope,
            exports,
        }
    }

    /// Compile and run `source` once as top-level code.
    ///
    /// Compile and runtime errors are returned as-is; this layer does not
    /// swallow anything.
    pub fn run(self, source: &str) -> RuntimeResult<ScriptExports> {
        let Self {
            mut engine,
            scope,
            exports,
        } = self;

        let ast = engine.compile(source)?;
        let module = Module::eval_ast_as_new(scope, &ast, &engine)?;

        let mut values = exports.flatten_clone().try_cast::<Map>().unwrap_or_default();

        // Public top-level functions are exported under their own names
        // unless the script assigned that key explicitly.
        let mut functions = 0;
        for function in ast.iter_functions() {
            if function.access == FnAccess::Private {
                continue;
            }
            functions += 1;
            if values.contains_key(function.name) {
                continue;
            }
            if let Ok(pointer) = FnPtr::new(function.name) {
                debug!("Exporting top-level function {}", function.name);
                values.insert(function.name.into(), Dynamic::from(pointer));
            }
        }

        // Script functions in the module carry the run's imports and
        // constants. Calls resolve against it instead of the bare AST.
        engine.register_global_module(module.into());

        Ok(ScriptExports {
            values,
            program: ScriptProgram {
                engine: Arc::new(engine),
                functions,
            },
        })
    }
}

/// What a script left behind after its top-level run.
pub struct ScriptExports {
    values: Map,
    program: ScriptProgram,
}

impl ScriptExports {
    /// All exported values.
    pub fn values(&self) -> &Map {
        &self.values
    }

    /// A single exported value, with shared wrappers removed.
    pub fn get(&self, key: &str) -> Option<Dynamic> {
        self.values.get(key).map(Dynamic::flatten_clone)
    }

    /// An exported value if it is callable.
    pub fn function(&self, key: &str) -> Option<FnPtr> {
        self.get(key)
            .filter(|value| value.is::<FnPtr>())
            .map(|value| value.cast::<FnPtr>())
    }

    /// An exported value if it is a string.
    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|value| value.into_string().ok())
    }

    /// The compiled program backing the exported functions.
    pub fn program(&self) -> &ScriptProgram {
        &self.program
    }

    pub fn into_program(self) -> ScriptProgram {
        self.program
    }
}

impl fmt::Debug for ScriptExports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptExports")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The engine a plugin's functions execute against.
///
/// Calls block the current thread for as long as the script runs.
#[derive(Clone)]
pub struct ScriptProgram {
    engine: Arc<Engine>,
    functions: usize,
}

impl ScriptProgram {
    /// Call an exported function.
    pub fn call(&self, function: &FnPtr, args: impl FuncArgs) -> RuntimeResult<Dynamic> {
        // An empty AST leaves resolution to the script module, whose
        // functions run inside the script's own environment.
        Ok(function.call::<Dynamic>(&self.engine, &AST::empty(), args)?)
    }
}

impl fmt::Debug for ScriptProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptProgram")
            .field("functions", &self.functions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::logger::{LogLevel, MemoryLogger};

    fn run(filename: &str, source: &str, logger: Arc<MemoryLogger>) -> RuntimeResult<ScriptExports> {
        let capabilities = CapabilitySet::build(filename, logger);
        ExecutionContext::new(capabilities).run(source)
    }

    #[test]
    fn test_exports_container() {
        let logger = Arc::new(MemoryLogger::new());
        let exports = run(
            "a.rhai",
            r#"
exports.name = "Alpha";
exports.fetch = || [#{ name: "X" }];
"#,
            logger,
        )
        .unwrap();

        assert_eq!(exports.string("name").as_deref(), Some("Alpha"));
        let fetch = exports.function("fetch").unwrap();
        let result = exports.program().call(&fetch, ()).unwrap();
        assert!(result.is::<rhai::Array>());
    }

    #[test]
    fn test_top_level_functions_are_exported() {
        let logger = Arc::new(MemoryLogger::new());
        let exports = run(
            "a.rhai",
            r#"
fn fetch() { [] }
private fn helper() { 1 }
"#,
            logger,
        )
        .unwrap();

        assert!(exports.function("fetch").is_some());
        assert!(exports.get("helper").is_none());
    }

    #[test]
    fn test_explicit_export_wins_over_function() {
        let logger = Arc::new(MemoryLogger::new());
        let exports = run(
            "a.rhai",
            r#"
fn fetch() { [] }
exports.fetch = 42;
"#,
            logger,
        )
        .unwrap();

        assert!(exports.function("fetch").is_none());
        assert_eq!(exports.get("fetch").unwrap().as_int().unwrap(), 42);
    }

    #[test]
    fn test_exported_functions_see_top_level_imports_and_constants() {
        let logger = Arc::new(MemoryLogger::new());
        let exports = run(
            "env.rhai",
            r#"
import "path" as path;
const PREFIX = "p-";

fn fetch() {
    [#{ name: global::PREFIX + path::join("a", "b") }]
}

exports.label = || global::PREFIX + path::file_name("/x/y.txt");
"#,
            logger,
        )
        .unwrap();

        let fetch = exports.function("fetch").unwrap();
        let items = exports.program().call(&fetch, ()).unwrap().cast::<rhai::Array>();
        let item = items[0].clone().cast::<Map>();
        let name = item["name"].clone().into_string().unwrap();
        assert!(name.starts_with("p-a"));
        assert!(name.ends_with('b'));

        let label = exports.function("label").unwrap();
        let result = exports.program().call(&label, ()).unwrap();
        assert_eq!(result.into_string().unwrap(), "p-y.txt");
    }

    #[test]
    fn test_private_helpers_stay_callable_from_exports() {
        let logger = Arc::new(MemoryLogger::new());
        let exports = run(
            "helpers.rhai",
            r#"
private fn double(x) { x * 2 }
fn fetch() { [double(21)] }
"#,
            logger,
        )
        .unwrap();

        let fetch = exports.function("fetch").unwrap();
        let items = exports.program().call(&fetch, ()).unwrap().cast::<rhai::Array>();
        assert_eq!(items[0].as_int().unwrap(), 42);
    }

    #[test]
    fn test_compile_error_propagates() {
        let logger = Arc::new(MemoryLogger::new());
        let err = run("bad.rhai", "fn broken( {", logger).unwrap_err();
        assert!(matches!(err, RuntimeError::Compile(_)));
    }

    #[test]
    fn test_runtime_error_propagates() {
        let logger = Arc::new(MemoryLogger::new());
        let err = run("bad.rhai", r#"throw "top-level failure";"#, logger).unwrap_err();
        match err {
            RuntimeError::Execution(message) => assert!(message.contains("top-level failure")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_contexts_do_not_share_state() {
        let logger = Arc::new(MemoryLogger::new());
        run("a.rhai", "exports.leak = 1; let global_flag = true;", logger.clone()).unwrap();

        let exports = run(
            "b.rhai",
            r#"exports.saw_flag = is_def_var("global_flag");"#,
            logger,
        )
        .unwrap();

        assert!(exports.get("leak").is_none());
        assert!(!exports.get("saw_flag").unwrap().as_bool().unwrap());
    }

    #[test]
    fn test_console_and_print_are_attributed() {
        let logger = Arc::new(MemoryLogger::new());
        run(
            "noisy.rhai",
            r#"
console::warn("careful");
print("hello");
"#,
            logger.clone(),
        )
        .unwrap();

        assert!(logger.contains(LogLevel::Warn, "[Script noisy.rhai] careful"));
        assert!(logger.contains(LogLevel::Info, "[Script noisy.rhai] hello"));
    }

    #[test]
    fn test_unknown_import_does_not_abort() {
        let logger = Arc::new(MemoryLogger::new());
        let exports = run(
            "imports.rhai",
            r#"
import "left-pad" as pad;
import "fs" as fs;
exports.root_exists = fs::exists("/");
"#,
            logger.clone(),
        )
        .unwrap();

        assert!(exports.get("root_exists").is_some());
        assert!(logger.contains(LogLevel::Warn, "Cannot import module left-pad"));
    }

    #[test]
    fn test_buffer_and_process_bindings() {
        let logger = Arc::new(MemoryLogger::new());
        let exports = run(
            "host.rhai",
            r#"
let bytes = buffer::from_utf8("hi");
exports.len = bytes.len();
exports.text = buffer::to_utf8(bytes);
exports.pid = process::pid();
"#,
            logger,
        )
        .unwrap();

        assert_eq!(exports.get("len").unwrap().as_int().unwrap(), 2);
        assert_eq!(exports.string("text").as_deref(), Some("hi"));
        assert!(exports.get("pid").unwrap().as_int().unwrap() > 0);
    }
}
