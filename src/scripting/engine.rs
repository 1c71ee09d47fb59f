/// `scripting/engine.rs`: one running glirc Lua extension
///
/// `Extension` owns a single interpreter. The user script is run once at
/// start; the value it returns is the callback module, and every host event
/// afterwards is delivered as `module:<callback>(record)`. Script failures
/// are printed to the client and never unload the extension.
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::{Function, Lua, Result as LuaResult, Value};

use super::{api::register_all, sandbox::create_vm, timers, trigger::HostEvent, warn::install_warnings};
use crate::config::ExtensionConfig;
use crate::ffi::{MessageCode, ProcessResult, TimerId};
use crate::host::Client;
use crate::marshal::bytes::export_bytes;
use crate::marshal::record::{Chat, Command, Message};
use crate::registry;

// ── Extension ─────────────────────────────────────────────────────────────────

pub struct Extension {
    lua: Lua,
    /// Whatever the user script returned. Callbacks are looked up on it.
    module: Value,
    /// `function(f, ...) return f(...) end`, so callbacks go through the
    /// Lua call protocol and `__call` metamethods apply.
    call_value: Function,
}

impl Extension {
    /// Build an interpreter bound to `client` with the `glirc` library
    /// installed. No user code has run yet.
    pub fn new(client: Rc<dyn Client>, config: ExtensionConfig) -> LuaResult<Self> {
        let lua = create_vm(config.trust)?;
        registry::bind(&lua, client);
        lua.set_app_data(config);
        install_warnings(&lua)?;
        register_all(&lua)?;
        let call_value: Function = lua
            .load("return function(f, ...) return f(...) end")
            .set_name("=glirc")
            .eval()?;
        Ok(Self {
            lua,
            module: Value::Nil,
            call_value,
        })
    }

    /// Create an instance and run the user script, printing any failure to
    /// the client.
    pub fn start(
        client: Rc<dyn Client>,
        config: ExtensionConfig,
        library_path: &[u8],
        args: &[&[u8]],
    ) -> Option<Self> {
        let mut ext = Self::new_or_report(client, config)?;
        ext.run_script(library_path, args).then_some(ext)
    }

    /// `new`, printing a construction failure to `client` instead of
    /// returning it.
    pub fn new_or_report(client: Rc<dyn Client>, config: ExtensionConfig) -> Option<Self> {
        match Self::new(Rc::clone(&client), config) {
            Ok(ext) => Some(ext),
            Err(e) => {
                report_to(client.as_ref(), &format!("Failed to create Lua VM: {e}"));
                None
            }
        }
    }

    /// `load`, printing any failure to the client. On failure the timers
    /// the script managed to set are cancelled and `false` is returned.
    pub fn run_script(&mut self, library_path: &[u8], args: &[&[u8]]) -> bool {
        match self.load(library_path, args) {
            Ok(()) => true,
            Err(e) => {
                self.report(&e);
                self.cancel_timers();
                false
            }
        }
    }

    /// Run the user script and keep its return value as the callback module.
    ///
    /// With no `args` the script is the configured file next to the
    /// extension library; otherwise `args[0]` resolved by the client. The
    /// global `arg` holds the script path at 0 and the remaining arguments
    /// from 1.
    pub fn load(&mut self, library_path: &[u8], args: &[&[u8]]) -> LuaResult<()> {
        let script = self.script_path(library_path, args)?;
        log::debug!("[script] loading {}", script.display());

        let arg = self.lua.create_table()?;
        arg.raw_set(0, export_bytes(&self.lua, script.as_os_str().as_bytes())?)?;
        for (i, a) in args.iter().enumerate().skip(1) {
            arg.raw_set(i, export_bytes(&self.lua, a)?)?;
        }
        self.lua.globals().set("arg", arg)?;

        let module: Value = self.lua.load(script.as_path()).call(())?;
        if !matches!(module, Value::Table(_)) {
            log::warn!(
                "[script] {} returned {} instead of a module table; callbacks disabled",
                script.display(),
                module.type_name()
            );
        }
        self.module = module;
        Ok(())
    }

    fn script_path(&self, library_path: &[u8], args: &[&[u8]]) -> LuaResult<PathBuf> {
        match args.first() {
            None => {
                let default_script = self
                    .lua
                    .app_data_ref::<ExtensionConfig>()
                    .map(|c| c.default_script.clone())
                    .unwrap_or_else(|| ExtensionConfig::default().default_script);
                let library = Path::new(OsStr::from_bytes(library_path));
                let dir = match library.parent() {
                    Some(dir) if !dir.as_os_str().is_empty() => dir,
                    _ => Path::new("."),
                };
                Ok(dir.join(default_script))
            }
            Some(first) => {
                let resolved = registry::resolve(&self.lua)
                    .resolve_path(first)
                    .ok_or_else(|| {
                        mlua::Error::RuntimeError(format!(
                            "cannot resolve script path '{}'",
                            String::from_utf8_lossy(first)
                        ))
                    })?;
                Ok(PathBuf::from(OsStr::from_bytes(&resolved)))
            }
        }
    }

    // ── Host events ───────────────────────────────────────────────────────

    pub fn process_message(&self, msg: &Message<'_>) -> ProcessResult {
        self.dispatch(HostEvent::Message(msg))
    }

    pub fn process_chat(&self, chat: &Chat<'_>) -> ProcessResult {
        self.dispatch(HostEvent::Chat(chat))
    }

    pub fn process_command(&self, cmd: &Command<'_>) {
        self.dispatch(HostEvent::Command(cmd));
    }

    /// Run the callback registered for host timer `id`, once.
    pub fn fire_timer(&self, id: TimerId) {
        let callback = match timers::take(&self.lua, id) {
            Ok(Some(callback)) => callback,
            Ok(None) => {
                log::debug!("[timer] {id} fired with no pending callback");
                return;
            }
            Err(e) => return self.report(&e),
        };
        let result: LuaResult<()> = self.call_value.call(callback);
        if let Err(e) = result {
            self.report(&e);
        }
    }

    /// Run the script's `stop` callback and release the interpreter.
    /// Timers still pending are cancelled with the client.
    pub fn stop(self) {
        self.dispatch(HostEvent::Stop);
        self.cancel_timers();
        log::debug!("[script] stopped");
    }

    fn cancel_timers(&self) {
        let client = registry::resolve(&self.lua);
        for id in timers::drain(&self.lua) {
            client.cancel_timer(id);
        }
    }

    /// Deliver `event`; a truthy callback result drops the message.
    fn dispatch(&self, event: HostEvent<'_>) -> ProcessResult {
        match self.invoke(event) {
            Ok(true) => ProcessResult::Drop,
            Ok(false) => ProcessResult::Pass,
            Err(e) => {
                self.report(&e);
                ProcessResult::Pass
            }
        }
    }

    fn invoke(&self, event: HostEvent<'_>) -> LuaResult<bool> {
        let Value::Table(module) = &self.module else {
            return Ok(false);
        };
        let name = event.callback_name();
        let callback: Value = module.get(name)?;
        if callback.is_nil() {
            return Ok(false);
        }

        let result: Value = match event.payload(&self.lua)? {
            Some(record) => self.call_value.call((callback, module.clone(), record))?,
            None => self.call_value.call((callback, module.clone()))?,
        };
        Ok(!matches!(result, Value::Nil | Value::Boolean(false)))
    }

    fn report(&self, err: &mlua::Error) {
        report_to(registry::resolve(&self.lua).as_ref(), &err.to_string());
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn report_to(client: &dyn Client, message: &str) {
    log::warn!("[script] {message}");
    client.print(MessageCode::Error, message.as_bytes());
}
