//! Lua-backed `ScriptHost`.
//!
//! The script loaded via `-x` must define a global `ParseData(runtime,
//! timestamp, data)`. Two Rust-implemented globals are registered for
//! the script to call back into the host: `SetTimeStampFormat(fmt,
//! suppress)` and `ArchiveInfo()`.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{Lua, Variadic};
use sttp::{ArchivePaths, ScriptError, ScriptHost};

struct FormatState {
    format: String,
    suppress_msec: bool,
}

pub struct LuaScriptHost {
    lua: Lua,
    format_state: Rc<RefCell<FormatState>>,
    paths: ArchivePaths,
}

impl LuaScriptHost {
    pub fn load(source: &str, paths: ArchivePaths, initial_format: String, initial_suppress_msec: bool) -> Result<Self, ScriptError> {
        let lua = Lua::new();
        let format_state = Rc::new(RefCell::new(FormatState {
            format: initial_format,
            suppress_msec: initial_suppress_msec,
        }));

        {
            let format_state = Rc::clone(&format_state);
            let set_format = lua
                .create_function(move |_, (fmt, suppress): (String, bool)| {
                    let mut state = format_state.borrow_mut();
                    state.format = fmt;
                    state.suppress_msec = suppress;
                    Ok(())
                })
                .map_err(|e| ScriptError::Load(e.to_string()))?;
            lua.globals()
                .set("SetTimeStampFormat", set_format)
                .map_err(|e| ScriptError::Load(e.to_string()))?;
        }

        {
            let paths = paths.clone();
            let archive_info = lua
                .create_function(move |lua, ()| {
                    let table = lua.create_table()?;
                    table.set("absolute", paths.absolute.to_string_lossy().into_owned())?;
                    table.set("directory", paths.directory.to_string_lossy().into_owned())?;
                    table.set("stem", paths.stem.clone())?;
                    table.set("extension", paths.extension.clone())?;
                    table.set("cwd", paths.cwd.to_string_lossy().into_owned())?;
                    Ok(table)
                })
                .map_err(|e| ScriptError::Load(e.to_string()))?;
            lua.globals()
                .set("ArchiveInfo", archive_info)
                .map_err(|e| ScriptError::Load(e.to_string()))?;
        }

        lua.load(source).exec().map_err(|e| ScriptError::Load(e.to_string()))?;

        if !lua.globals().contains_key("ParseData").unwrap_or(false) {
            return Err(ScriptError::Load("script does not define a ParseData function".to_string()));
        }

        Ok(LuaScriptHost {
            lua,
            format_state,
            paths,
        })
    }
}

impl ScriptHost for LuaScriptHost {
    fn configure_timestamp(&mut self, format: &str, suppress_msec: bool) {
        let mut state = self.format_state.borrow_mut();
        state.format = format.to_string();
        state.suppress_msec = suppress_msec;
    }

    fn archive_paths(&self) -> &ArchivePaths {
        &self.paths
    }

    fn current_format(&self) -> (String, bool) {
        let state = self.format_state.borrow();
        (state.format.clone(), state.suppress_msec)
    }

    fn parse_data(&mut self, runtime: f64, timestamp: &str, data: &[u8]) -> Result<(), ScriptError> {
        let parse_data: mlua::Function = self
            .lua
            .globals()
            .get("ParseData")
            .map_err(|e| ScriptError::Runtime(e.to_string()))?;
        let bytes = self.lua.create_string(data).map_err(|e| ScriptError::Runtime(e.to_string()))?;
        parse_data
            .call::<_, Variadic<mlua::Value>>((runtime, timestamp.to_string(), bytes))
            .map(|_| ())
            .map_err(|e| ScriptError::Runtime(e.to_string()))
    }
}
