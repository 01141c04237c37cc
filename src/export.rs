use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use crate::{
    error::ExportError,
    graph::{encode_graph_def, FrozenGraph},
    logger::{self, ansi, PATH_CS},
    model::Sequential,
};

pub const EXTENSION: &str = "pb";

/// Where `new_model` writes its frozen graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSettings {
    /// Directory to write the graph into, created if missing.
    pub output_directory: PathBuf,
    /// File name without the `.pb` extension.
    pub file_name: String,
}

impl ExportSettings {
    /// Splits `path` into directory and base name. A trailing `.pb` is dropped
    /// from the base name, so `model.pb` is written as `model.pb` rather than
    /// `model.pb.pb`. A path ending in a separator names a directory, not a
    /// file, and is rejected.
    pub fn from_output_path(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();

        if path.to_string_lossy().ends_with(std::path::is_separator) {
            return Err(ExportError::InvalidPath(path.to_path_buf()));
        }

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ExportError::InvalidPath(path.to_path_buf()))?;

        let file_name = match file_name.strip_suffix(".pb") {
            Some(stem) if !stem.is_empty() => stem,
            _ => file_name,
        };

        let output_directory = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self { output_directory, file_name: file_name.to_string() })
    }

    pub fn target_path(&self) -> PathBuf {
        self.output_directory.join(format!("{}.{EXTENSION}", self.file_name))
    }

    pub fn display(&self) {
        println!("Output Directory       : {}", ansi(self.output_directory.display(), PATH_CS));
        println!("File Name              : {}", ansi(format!("{}.{EXTENSION}", self.file_name), PATH_CS));
    }
}

fn check_shapes(model: &Sequential, graph: &FrozenGraph) -> Result<(), ExportError> {
    let expected = [-1, model.input_dim() as i64];
    let found = graph.input_shape()?;

    if expected != found {
        return Err(ExportError::ShapeMismatch { expected: format!("{expected:?}"), found: format!("{found:?}") });
    }

    let (expected, found) = (model.output_dim(), graph.output_width()?);

    if expected != found {
        return Err(ExportError::ShapeMismatch {
            expected: format!("output width {expected}"),
            found: format!("output width {found}"),
        });
    }

    Ok(())
}

/// Freezes `model` and writes it to `<out_dir>/<out_filename>.pb`, overwriting
/// any existing file. Returns the path written.
pub fn export_model_as_pb(
    model: &Sequential,
    out_dir: impl AsRef<Path>,
    out_filename: &str,
) -> Result<PathBuf, ExportError> {
    let timer = Instant::now();

    let graph = FrozenGraph::freeze(model);
    check_shapes(model, &graph)?;

    let bytes = encode_graph_def(&graph);

    let out_dir = out_dir.as_ref();
    if !out_dir.as_os_str().is_empty() {
        fs::create_dir_all(out_dir)?;
    }

    let path = out_dir.join(format!("{out_filename}.{EXTENSION}"));

    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;

    logger::report_export_finished(&path, bytes.len(), timer.elapsed().as_secs_f32());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{create_model, create_model_with_seed};

    #[test]
    fn default_path_has_single_extension() {
        let settings = ExportSettings::from_output_path("./model.pb").unwrap();
        assert_eq!(settings.output_directory, PathBuf::from("."));
        assert_eq!(settings.file_name, "model");
        assert_eq!(settings.target_path(), PathBuf::from("./model.pb"));
    }

    #[test]
    fn path_without_extension() {
        let settings = ExportSettings::from_output_path("/tmp/out/mymodel").unwrap();
        assert_eq!(settings.output_directory, PathBuf::from("/tmp/out"));
        assert_eq!(settings.target_path(), PathBuf::from("/tmp/out/mymodel.pb"));
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        let settings = ExportSettings::from_output_path("net").unwrap();
        assert_eq!(settings.target_path(), PathBuf::from("./net.pb"));
    }

    #[test]
    fn only_extension_is_kept() {
        let settings = ExportSettings::from_output_path(".pb").unwrap();
        assert_eq!(settings.file_name, ".pb");
    }

    #[test]
    fn no_file_name() {
        assert!(matches!(ExportSettings::from_output_path("/"), Err(ExportError::InvalidPath(_))));
        assert!(matches!(ExportSettings::from_output_path(".."), Err(ExportError::InvalidPath(_))));
    }

    #[test]
    fn trailing_separator_is_rejected() {
        let result = ExportSettings::from_output_path("/tmp/out/");
        assert!(matches!(result, Err(ExportError::InvalidPath(path)) if path == Path::new("/tmp/out/")));
    }

    #[test]
    fn writes_non_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_model_as_pb(&create_model(), dir.path(), "model").unwrap();

        assert_eq!(path, dir.path().join("model.pb"));

        let size = fs::metadata(&path).unwrap().len();
        // three float kernels alone take 4 * 70152 bytes
        assert!(size > 4 * 70152);
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out").join("nested");

        let path = export_model_as_pb(&create_model(), &out, "mymodel").unwrap();

        assert!(out.is_dir());
        assert_eq!(path, out.join("mymodel.pb"));
        assert!(path.is_file());
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.pb");
        fs::write(&path, b"stale").unwrap();

        export_model_as_pb(&create_model_with_seed(Some(5)), dir.path(), "model").unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_ne!(bytes, b"stale");
        assert_eq!(bytes, encode_graph_def(&FrozenGraph::freeze(&create_model_with_seed(Some(5)))));
    }

    #[test]
    fn unwritable_target_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();

        let result = export_model_as_pb(&create_model(), &blocker, "model");
        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}
