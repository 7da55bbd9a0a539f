// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Process-wide engine context: registries, the file system handle, and
//! global defaults. Built once, frozen at `init`, shared across renders.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Error;
use crate::page::{Page, PageFormat};
use crate::registry::FilterRegistry;
use crate::scope::ScopeFrame;
use crate::value::Value;
use crate::vfs::{MemoryFiles, VirtualFiles};

/// Host settings provider backing the `appSetting` filter.
pub trait SettingsSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

impl SettingsSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// The engine context. Filter and format registries, default args, and the
/// flags are immutable once built; the page cache is the only coordinated
/// mutable state (write-wins on concurrent first parse).
pub struct Context {
    filters: FilterRegistry,
    formats: HashMap<String, Arc<PageFormat>>,
    files: Arc<dyn VirtualFiles>,
    settings: Option<Arc<dyn SettingsSource>>,
    args: IndexMap<String, Value>,
    root_scope: Arc<ScopeFrame>,
    debug_mode: bool,
    lenient_filters: bool,
    cache: RwLock<HashMap<String, Arc<Page>>>,
}

impl Context {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Fetches a page by virtual path. Fatal when missing.
    pub fn get_page(&self, name: &str) -> Result<Arc<Page>, Error> {
        self.find_page(name)?
            .ok_or_else(|| Error::page_not_found(name))
    }

    /// Soft lookup: `Ok(None)` when the file does not exist. Parse failures
    /// are still fatal.
    pub fn find_page(&self, name: &str) -> Result<Option<Arc<Page>>, Error> {
        let key = name.trim_start_matches('/').to_string();

        if let Some(cached) = self.cache.read().expect("page cache lock").get(&key) {
            if !self.debug_mode || !self.is_stale(cached) {
                return Ok(Some(Arc::clone(cached)));
            }
            debug!(page = %key, "source changed, reloading page");
        }

        if !self.files.exists(&key) {
            return Ok(None);
        }

        let source = self.files.read(&key)?;
        let format = extension_of(&key).unwrap_or("html").to_string();
        let modified = self.files.last_modified(&key);
        let page = Arc::new(Page::parse(Some(key.clone()), source, format, modified)?);
        self.cache
            .write()
            .expect("page cache lock")
            .insert(key, Arc::clone(&page));
        Ok(Some(page))
    }

    /// Creates an ephemeral page from inline source. Never cached.
    pub fn one_time_page(&self, source: &str, extension: Option<&str>) -> Result<Arc<Page>, Error> {
        let format = extension.unwrap_or("html").to_string();
        Ok(Arc::new(Page::parse(None, source.to_string(), format, None)?))
    }

    fn is_stale(&self, page: &Page) -> bool {
        let (Some(path), Some(cached_at)) = (page.path(), page.modified()) else {
            return false;
        };
        self.files
            .last_modified(path)
            .map(|current| current > cached_at)
            .unwrap_or(false)
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn format(&self, extension: &str) -> Option<&Arc<PageFormat>> {
        self.formats.get(extension)
    }

    pub fn files(&self) -> &Arc<dyn VirtualFiles> {
        &self.files
    }

    pub fn settings(&self) -> Option<&Arc<dyn SettingsSource>> {
        self.settings.as_ref()
    }

    /// Context-level default args, the root of every scope chain.
    pub fn args(&self) -> &IndexMap<String, Value> {
        &self.args
    }

    pub(crate) fn root_scope(&self) -> &Arc<ScopeFrame> {
        &self.root_scope
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// When set, a filter failure substitutes an empty string for its
    /// placeholder instead of aborting the render.
    pub fn lenient_filters(&self) -> bool {
        self.lenient_filters
    }
}

/// Builder for [`Context`]. `init` freezes the registries, seeds the default
/// args, and returns the shared handle.
pub struct ContextBuilder {
    filters: FilterRegistry,
    formats: HashMap<String, Arc<PageFormat>>,
    files: Arc<dyn VirtualFiles>,
    settings: Option<Arc<dyn SettingsSource>>,
    args: IndexMap<String, Value>,
    debug_mode: bool,
    lenient_filters: bool,
}

impl ContextBuilder {
    fn new() -> Self {
        Self {
            filters: FilterRegistry::empty(),
            formats: HashMap::new(),
            files: Arc::new(MemoryFiles::new()),
            settings: None,
            args: IndexMap::new(),
            debug_mode: false,
            lenient_filters: false,
        }
    }

    pub fn filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    pub fn files(mut self, files: Arc<dyn VirtualFiles>) -> Self {
        self.files = files;
        self
    }

    pub fn settings(mut self, settings: Arc<dyn SettingsSource>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Registers a page format, replacing any existing entry for its
    /// extension.
    pub fn format(mut self, format: PageFormat) -> Self {
        self.formats
            .insert(format.extension().to_string(), Arc::new(format));
        self
    }

    /// Sets a context-level default arg, visible at the root of every scope
    /// chain.
    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    pub fn debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    pub fn lenient_filters(mut self, lenient: bool) -> Self {
        self.lenient_filters = lenient;
        self
    }

    /// Freezes the registries and defaults into a shared context.
    pub fn init(mut self) -> Arc<Context> {
        for (name, value) in [
            ("DefaultCulture", "en-US"),
            ("DefaultDateFormat", "yyyy-MM-dd"),
            ("DefaultDateTimeFormat", "yyyy-MM-dd HH:mm:ssZ"),
        ] {
            self.args
                .entry(name.to_string())
                .or_insert_with(|| Value::String(value.to_string()));
        }
        for format in [PageFormat::html(), PageFormat::markdown()] {
            self.formats
                .entry(format.extension().to_string())
                .or_insert_with(|| Arc::new(format));
        }

        let root_scope = ScopeFrame::root(self.args.clone());
        Arc::new(Context {
            filters: self.filters,
            formats: self.formats,
            files: self.files,
            settings: self.settings,
            args: self.args,
            root_scope,
            debug_mode: self.debug_mode,
            lenient_filters: self.lenient_filters,
            cache: RwLock::new(HashMap::new()),
        })
    }
}

fn extension_of(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}
