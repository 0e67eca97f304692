use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use parking_lot::RwLock;

use crate::{Config, Error, Prototype};

/// How the platform loader binds the library's symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadMode {
    /// Resolve symbols on first use (`RTLD_LAZY`).
    Lazy,
    /// Resolve every symbol at load time (`RTLD_NOW`).
    #[default]
    Now,
    /// `RTLD_NOW | RTLD_GLOBAL`: also make the symbols visible to libraries
    /// loaded later.
    Global,
}

/// One loaded native shared library with a cache of resolved symbols.
pub struct NativeLibrary {
    path: PathBuf,
    mode: LoadMode,
    library: libloading::Library,
    symbols: RwLock<HashMap<&'static str, usize>>,
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("resolved", &self.symbols.read().len())
            .finish()
    }
}

impl NativeLibrary {
    /// Loads the shared library at `path`.
    ///
    /// Loading runs the library's initialisers, so the library must be one
    /// whose load-time behaviour is trusted.
    pub fn open(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self, Error> {
        let path = path.as_ref();
        let library = unsafe { open_with_mode(path, mode) }.map_err(|e| Error::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), ?mode, "loaded native library");

        Ok(NativeLibrary {
            path: path.to_path_buf(),
            mode,
            library,
            symbols: RwLock::new(HashMap::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    /// Resolves the prototype's symbol to a callable address.
    pub fn resolve(&self, prototype: &Prototype) -> Result<usize, Error> {
        if let Some(&address) = self.symbols.read().get(prototype.name) {
            return Ok(address);
        }

        let symbol = unsafe {
            self.library
                .get::<unsafe extern "C" fn()>(prototype.name.as_bytes())
        }
        .map_err(|_| Error::SymbolNotFound(prototype.name.to_string()))?;
        let address = *symbol as usize;
        tracing::debug!(symbol = prototype.name, "resolved native symbol");

        self.symbols.write().insert(prototype.name, address);
        Ok(address)
    }
}

#[cfg(unix)]
unsafe fn open_with_mode(path: &Path, mode: LoadMode) -> Result<libloading::Library, libloading::Error> {
    use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_LAZY, RTLD_LOCAL, RTLD_NOW};

    let flags = match mode {
        LoadMode::Lazy => RTLD_LAZY | RTLD_LOCAL,
        LoadMode::Now => RTLD_NOW | RTLD_LOCAL,
        LoadMode::Global => RTLD_NOW | RTLD_GLOBAL,
    };
    unsafe { Library::open(Some(path), flags) }.map(Into::into)
}

#[cfg(not(unix))]
unsafe fn open_with_mode(path: &Path, _mode: LoadMode) -> Result<libloading::Library, libloading::Error> {
    unsafe { libloading::Library::new(path) }
}

static LIBRARY: OnceLock<NativeLibrary> = OnceLock::new();

/// Loads the process-wide library from `path`.
///
/// Once a library is loaded, further calls return it unchanged regardless of
/// the path or mode they name.
///
/// # Panics
///
/// A process that cannot load the library cannot do anything useful with
/// this crate, so a load failure panics instead of returning an error.
pub fn init(path: impl AsRef<Path>, mode: LoadMode) -> &'static NativeLibrary {
    let path = path.as_ref();
    let library = LIBRARY.get_or_init(|| load_or_die(path, mode));
    if library.path() != path {
        tracing::debug!(
            requested = %path.display(),
            loaded = %library.path().display(),
            "native library already loaded, ignoring init"
        );
    }
    library
}

/// Installs an already opened library as the process-wide one, unless one is
/// loaded already, in which case `library` is dropped and the existing one is
/// returned.
pub fn init_with(library: NativeLibrary) -> &'static NativeLibrary {
    if let Err(ignored) = LIBRARY.set(library) {
        tracing::debug!(
            requested = %ignored.path().display(),
            "native library already loaded, ignoring init"
        );
    }
    self::library()
}

pub fn init_from_config(config: &Config) -> &'static NativeLibrary {
    init(&config.library_path, config.mode)
}

pub fn is_initialized() -> bool {
    LIBRARY.get().is_some()
}

/// The process-wide library, loaded from [`Config::from_env`] on first use.
///
/// # Panics
///
/// Panics when the configuration is invalid or the library cannot be loaded.
pub fn library() -> &'static NativeLibrary {
    LIBRARY.get_or_init(|| {
        let config = Config::from_env().unwrap_or_else(|e| {
            tracing::error!(error = %e, "invalid native library configuration");
            panic!("{e}")
        });
        load_or_die(&config.library_path, config.mode)
    })
}

fn load_or_die(path: &Path, mode: LoadMode) -> NativeLibrary {
    NativeLibrary::open(path, mode).unwrap_or_else(|e| {
        tracing::error!(error = %e, "cannot continue without the native library");
        panic!("{e}")
    })
}
