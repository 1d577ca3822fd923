//! Template rendering for Cloney.
//! Wraps a MiniJinja environment carrying the template function library:
//! MiniJinja builtins, case-conversion filters and the custom functions
//! `include`, `toFile`, `os`, `arch`, `joinSingleQuote` and `joinDoubleQuote`.

use crate::error::{Error, Result};
use cruet::Inflector;
use log::debug;
use minijinja::value::{Object, ObjectRepr, Value};
use minijinja::{AutoEscape, Environment, ErrorKind, State};
use regex::Regex;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

static TEMPLATE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}").expect("template block pattern is valid")
});

static TO_FILE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btoFile\s*\(").expect("toFile pattern is valid"));

/// Context key holding the [`FileWriter`] of the current render.
const FILE_WRITER: &str = "__cloney_file_writer";

/// Whether template source invokes the `toFile` function inside an
/// expression or statement block. Plain text mentioning it does not count.
pub fn uses_file_writes(content: &str) -> bool {
    TEMPLATE_BLOCK.find_iter(content).any(|block| TO_FILE_CALL.is_match(block.as_str()))
}

/// Where `toFile` may write while a file is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileScope {
    /// Paths resolve against `directory` and must stay within `root`.
    Writable { root: PathBuf, directory: PathBuf },
    /// Output is not materialised on disk; `toFile` fails.
    ReadOnly,
}

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders the template source of one file.
    ///
    /// # Arguments
    /// * `name` - Name used in error messages, usually the relative file path
    /// * `template` - Template source
    /// * `context` - Variables available to the template
    /// * `scope` - Where generated files may be written
    fn render_file(
        &self,
        name: &str,
        template: &str,
        context: &serde_json::Value,
        scope: &FileScope,
    ) -> Result<String>;

    /// Renders a standalone template string that may not write files.
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        self.render_file("template", template, context, &FileScope::ReadOnly)
    }
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer without a template loader.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        // Generated files are source code, not markup.
        env.set_auto_escape_callback(|_name: &str| AutoEscape::None);

        env.add_function("include", include);
        env.add_function("toFile", to_file);
        env.add_function("os", os);
        env.add_function("arch", arch);
        env.add_function("joinSingleQuote", join_single_quote);
        env.add_function("joinDoubleQuote", join_double_quote);

        env.add_filter("camel_case", camel_case);
        env.add_filter("pascal_case", pascal_case);
        env.add_filter("snake_case", snake_case);
        env.add_filter("screaming_snake_case", screaming_snake_case);
        env.add_filter("kebab_case", kebab_case);
        env.add_filter("train_case", train_case);
        env.add_filter("title_case", title_case);

        Self { env }
    }

    /// Creates a renderer that resolves named templates relative to `root`.
    pub fn with_template_root<P: AsRef<Path>>(root: P) -> Self {
        let mut renderer = Self::new();
        renderer.env.set_loader(minijinja::path_loader(root.as_ref()));
        renderer
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// # Errors
    /// * `Error::PathConfinementError` if `toFile` targets a path outside the root
    /// * `Error::TemplateError` for syntax errors and failing functions
    fn render_file(
        &self,
        name: &str,
        template: &str,
        context: &serde_json::Value,
        scope: &FileScope,
    ) -> Result<String> {
        let writer = Value::from_object(FileWriter::new(scope.clone()));
        let ctx = minijinja::context! {
            __cloney_file_writer => &writer,
            ..Value::from_serialize(context)
        };
        self.env.render_named_str(name, template, ctx).map_err(|err| {
            let violation =
                writer.downcast_object_ref::<FileWriter>().and_then(FileWriter::violation);
            match violation {
                Some(path) => Error::PathConfinementError { path },
                None => Error::TemplateError(err),
            }
        })
    }
}

/// Renders a sub-template: a macro visible from the calling template, or a
/// template resolved by the environment loader.
fn render_named(
    state: &State,
    name: &str,
    data: Option<Value>,
) -> std::result::Result<String, minijinja::Error> {
    if let Some(callable) = state.lookup(name).filter(|v| !v.is_undefined()) {
        let args: Vec<Value> = data.into_iter().collect();
        return Ok(callable.call(state, &args)?.to_string());
    }
    let tmpl = state.env().get_template(name)?;
    let writer = state.lookup(FILE_WRITER).unwrap_or_default();
    tmpl.render(minijinja::context! {
        __cloney_file_writer => &writer,
        ..data.unwrap_or_default()
    })
}

fn include(
    state: &State,
    name: &str,
    data: Option<Value>,
) -> std::result::Result<String, minijinja::Error> {
    render_named(state, name, data)
}

/// The `toFile(path, name, data)` template function. Writes through the
/// [`FileWriter`] of the render in progress.
fn to_file(
    state: &State,
    path: &str,
    name: &str,
    data: Option<Value>,
) -> std::result::Result<String, minijinja::Error> {
    let writer = state
        .lookup(FILE_WRITER)
        .and_then(|value| value.downcast_object::<FileWriter>())
        .unwrap_or_else(|| Arc::new(FileWriter::new(FileScope::ReadOnly)));
    writer.write(state, path, name, data)?;
    Ok(String::new())
}

fn os() -> String {
    std::env::consts::OS.to_string()
}

fn arch() -> String {
    std::env::consts::ARCH.to_string()
}

fn join_single_quote(list: Vec<Value>, separator: &str) -> String {
    list.iter().map(|item| format!("'{item}'")).collect::<Vec<_>>().join(separator)
}

fn join_double_quote(list: Vec<Value>, separator: &str) -> String {
    list.iter().map(|item| format!("\"{item}\"")).collect::<Vec<_>>().join(separator)
}

fn camel_case(value: &str) -> String {
    value.to_camel_case()
}

fn pascal_case(value: &str) -> String {
    value.to_pascal_case()
}

fn snake_case(value: &str) -> String {
    value.to_snake_case()
}

fn screaming_snake_case(value: &str) -> String {
    value.to_screaming_snake_case()
}

fn kebab_case(value: &str) -> String {
    value.to_kebab_case()
}

fn train_case(value: &str) -> String {
    value.to_train_case()
}

fn title_case(value: &str) -> String {
    value.to_title_case()
}

/// Backs `toFile` for one rendered file.
///
/// Renders sub-template `name` with `data` and writes it to `path`, which is
/// relative to the directory of the file being rendered. The resolved path
/// must stay within the template root, symlinks included.
struct FileWriter {
    scope: FileScope,
    violation: Mutex<Option<String>>,
}

impl FileWriter {
    fn new(scope: FileScope) -> Self {
        Self { scope, violation: Mutex::new(None) }
    }

    fn violation(&self) -> Option<String> {
        self.violation.lock().ok().and_then(|v| v.clone())
    }

    fn write(
        &self,
        state: &State,
        path: &str,
        name: &str,
        data: Option<Value>,
    ) -> std::result::Result<(), minijinja::Error> {
        let (root, directory) = match &self.scope {
            FileScope::Writable { root, directory } => (root, directory),
            FileScope::ReadOnly => {
                return Err(minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    "toFile is not supported when the output is not written to disk",
                ))
            }
        };

        let target = confine(root, directory, path).filter(|target| resolves_within(root, target));
        let Some(target) = target else {
            if let Ok(mut violation) = self.violation.lock() {
                *violation = Some(path.to_string());
            }
            return Err(minijinja::Error::new(
                ErrorKind::InvalidOperation,
                format!("cannot create file outside the scope of the template directory: {path}"),
            ));
        };

        let content = render_named(state, name, data)?;
        debug!("Writing generated file '{}'", target.display());
        let io_error = |e: std::io::Error| {
            minijinja::Error::new(ErrorKind::InvalidOperation, format!("could not write '{path}'"))
                .with_source(e)
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&target, content).map_err(io_error)
    }
}

impl fmt::Debug for FileWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileWriter").field("scope", &self.scope).finish()
    }
}

impl Object for FileWriter {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }
}

/// Resolves `relative` against `directory`, rejecting anything that
/// leaves `root`. Resolution is lexical; `..` never climbs above `/`.
pub fn confine(root: &Path, directory: &Path, relative: &str) -> Option<PathBuf> {
    let target = normalize(&directory.join(relative));
    let root = normalize(root);
    target.starts_with(&root).then_some(target)
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Whether `target` still lies within `root` once the symlinks along its
/// deepest existing ancestor are followed. A dangling link never does.
fn resolves_within(root: &Path, target: &Path) -> bool {
    let Ok(root) = root.canonicalize() else {
        return false;
    };
    let Some(existing) = target.ancestors().find(|p| p.symlink_metadata().is_ok()) else {
        return false;
    };
    existing.canonicalize().is_ok_and(|resolved| resolved.starts_with(&root))
}
