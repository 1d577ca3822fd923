//! Directory template filling.
//! Walks a template tree, renders every non-ignored file with the bound
//! variables and routes the result: back onto the file, into a mirrored
//! directory, or to a writer.

use crate::error::{Error, Result};
use crate::ignore::{collect_file_paths, to_slash, IgnoreSet};
use crate::renderer::{uses_file_writes, FileScope, MiniJinjaRenderer, TemplateRenderer};
use crate::variables::BoundVariables;
use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where filled files go.
pub enum FillMode<'a> {
    /// Overwrite each template file with its rendered content.
    InPlace,
    /// Write rendered files under this directory, mirroring the source layout.
    Mirror(PathBuf),
    /// Print each rendered file to the writer; nothing touches the disk.
    Terminal(&'a mut dyn Write),
}

/// Fills template files with bound variables using a [`TemplateRenderer`].
pub struct TemplateFiller<'a> {
    engine: &'a dyn TemplateRenderer,
    variables: &'a BoundVariables,
}

impl<'a> TemplateFiller<'a> {
    pub fn new(engine: &'a dyn TemplateRenderer, variables: &'a BoundVariables) -> Self {
        Self { engine, variables }
    }

    /// Fills every non-ignored file under `source`.
    ///
    /// Files are processed one at a time in path order. A failure stops the
    /// fill. In place, rendered files are written back only once every file
    /// has rendered; files created by `toFile` before a failure remain.
    ///
    /// # Errors
    /// * `Error::UnsupportedInTerminalError` if a file uses `toFile` in terminal mode
    /// * `Error::PathConfinementError` if `toFile` tries to leave the root
    /// * `Error::TemplateError` / `Error::IoError` for rendering and I/O failures
    pub fn fill<P, S>(&self, source: P, ignore_patterns: &[S], mut mode: FillMode) -> Result<()>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let source = source.as_ref().canonicalize()?;
        let ignore = IgnoreSet::new(&source, ignore_patterns)?;
        let context = self.variables.to_context();

        let target_root = match &mode {
            FillMode::Mirror(target) => {
                fs::create_dir_all(target)?;
                Some(target.canonicalize()?)
            }
            _ => None,
        };

        let mut pending = Vec::new();
        for file in collect_file_paths(&ignore)? {
            let relative = file.strip_prefix(&source).unwrap_or(&file).to_path_buf();
            let name = to_slash(&relative);
            debug!("Filling '{name}'");

            let content = match String::from_utf8(fs::read(&file)?) {
                Ok(content) => content,
                Err(binary) => {
                    debug!("'{name}' is not UTF-8 text, leaving it untouched");
                    match (&mut mode, &target_root) {
                        (FillMode::Mirror(_), Some(target)) => {
                            copy_file(&file, &target.join(&relative), binary.as_bytes())?
                        }
                        (FillMode::Terminal(writer), _) => {
                            write!(writer, "\n----- File: {name}\n(binary content omitted)\n")?
                        }
                        _ => {}
                    }
                    continue;
                }
            };

            match (&mut mode, &target_root) {
                (FillMode::Terminal(writer), _) => {
                    if uses_file_writes(&content) {
                        return Err(Error::UnsupportedInTerminalError { path: name });
                    }
                    let rendered =
                        self.engine.render_file(&name, &content, &context, &FileScope::ReadOnly)?;
                    write!(writer, "\n----- File: {name}\n{rendered}\n")?;
                }
                (FillMode::Mirror(_), Some(target)) => {
                    let destination = target.join(&relative);
                    let rendered = self.render(&name, &content, &context, target, &destination)?;
                    copy_file(&file, &destination, rendered.as_bytes())?;
                }
                _ => {
                    let rendered = self.render(&name, &content, &context, &source, &file)?;
                    pending.push((file, rendered));
                }
            }
        }

        // Sources stay intact until every file has rendered, so named
        // templates loaded from the tree are never already filled.
        for (file, rendered) in pending {
            fs::write(&file, rendered)?;
        }
        Ok(())
    }

    fn render(
        &self,
        name: &str,
        content: &str,
        context: &serde_json::Value,
        root: &Path,
        destination: &Path,
    ) -> Result<String> {
        let scope = FileScope::Writable {
            root: root.to_path_buf(),
            directory: destination.parent().unwrap_or(root).to_path_buf(),
        };
        self.engine.render_file(name, content, context, &scope)
    }
}

/// Fills `source` with the default MiniJinja renderer.
///
/// Named templates used by `include`/`toFile` resolve against `source`.
pub fn fill_directory<P, S>(
    source: P,
    ignore_patterns: &[S],
    variables: &BoundVariables,
    mode: FillMode,
) -> Result<()>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let engine = MiniJinjaRenderer::with_template_root(source.as_ref());
    TemplateFiller::new(&engine, variables).fill(source, ignore_patterns, mode)
}

/// Writes `content` to `destination`, creating parent directories and
/// carrying over the permissions of `source`.
fn copy_file(source: &Path, destination: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(destination, content)?;
    fs::set_permissions(destination, fs::metadata(source)?.permissions())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Configuration, TemplateSchema};
    use crate::variables::{bind_variables, UserVariables};
    use serde_json::json;
    use tempfile::TempDir;

    fn bound(vars: serde_json::Value) -> BoundVariables {
        let schema = TemplateSchema {
            name: "t".into(),
            description: String::new(),
            template_version: "1.0.0".into(),
            manifest_version: "v1".into(),
            authors: vec![],
            license: String::new(),
            configuration: Configuration::default(),
            variables: vec![],
        };
        let user: UserVariables = match vars {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => UserVariables::new(),
        };
        bind_variables(&schema, user).unwrap()
    }

    #[test]
    fn test_binary_files_are_copied_untouched_when_mirroring() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let bytes = vec![0xff, 0xfe, 0x00, b'{', b'{'];
        fs::write(source.path().join("logo.bin"), &bytes).unwrap();

        let vars = bound(json!({}));
        let mode = FillMode::Mirror(target.path().join("out"));
        fill_directory(source.path(), &[] as &[&str], &vars, mode).unwrap();

        assert_eq!(fs::read(target.path().join("out/logo.bin")).unwrap(), bytes);
    }

    #[test]
    fn test_terminal_mode_prints_and_leaves_files() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("a.txt"), "Hi {{ name }}").unwrap();

        let vars = bound(json!({"name": "Bo"}));
        let mut out: Vec<u8> = Vec::new();
        fill_directory(source.path(), &[] as &[&str], &vars, FillMode::Terminal(&mut out)).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed, "\n----- File: a.txt\nHi Bo\n");
        assert_eq!(fs::read_to_string(source.path().join("a.txt")).unwrap(), "Hi {{ name }}");
    }
}
