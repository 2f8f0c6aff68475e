//! Per-structure pipeline: load, classify, and wrap when needed.

use std::path::{Path, PathBuf};

use mesh_soup::{load_polygon_soup, orient_polygon_soup, validate_mesh, Mesh};
use mesh_wrap::{RelativeParams, WrapError, WrapParams, Wrapper};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::FallbackMapping;
use crate::report::VOLUME_SCALE;

/// Why a structure could not be processed.
#[derive(Debug, Error)]
pub enum StructureError {
    /// None of the structure's files could be loaded.
    #[error("cannot open file {}", .0.display())]
    Load(PathBuf),

    /// The structure has no files at all.
    #[error("no mesh files found")]
    NoSources,

    /// Parameter derivation or wrapping failed.
    #[error(transparent)]
    Wrap(#[from] WrapError),
}

/// Result of running the pipeline on one structure.
#[derive(Debug, Clone)]
pub struct ProcessedStructure {
    /// The mesh to write: the input, its fallback counterpart, or a wrap.
    pub mesh: Mesh,
    /// The input was fully watertight.
    pub before: bool,
    /// The written mesh is fully watertight.
    pub after: bool,
    /// The written mesh is a wrap.
    pub wrapped: bool,
    /// The written mesh is, or wraps, the input's fallback counterpart.
    pub used_fallback: bool,
    /// Signed volume of the written mesh, scaled by [`VOLUME_SCALE`].
    pub volume: f64,
}

/// Per-structure outcome collected into the batch summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StructureOutcome {
    Processed {
        organ: String,
        structure: String,
        volume: f64,
        before: bool,
        after: bool,
        wrapped: bool,
        used_fallback: bool,
        output: PathBuf,
    },
    Failed {
        organ: String,
        structure: String,
        reason: String,
    },
}

impl StructureOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StructureOutcome::Failed { .. })
    }

    pub fn organ(&self) -> &str {
        match self {
            StructureOutcome::Processed { organ, .. } | StructureOutcome::Failed { organ, .. } => organ,
        }
    }

    pub fn structure(&self) -> &str {
        match self {
            StructureOutcome::Processed { structure, .. }
            | StructureOutcome::Failed { structure, .. } => structure,
        }
    }
}

/// Load one file as an oriented triangle mesh, logging failures.
fn load_oriented(path: &Path) -> Option<Mesh> {
    let mut soup = load_polygon_soup(path)?;
    let stats = orient_polygon_soup(&mut soup);
    debug!(
        "{}: {} components, {} polygons flipped",
        path.display(),
        stats.components,
        stats.flipped_polygons
    );
    Some(soup.to_mesh())
}

/// Load and merge every file of a structure.
///
/// Files that fail to load are logged and skipped; the structure fails only
/// when none of them loads.
pub fn load_merged(sources: &[PathBuf]) -> Result<Mesh, StructureError> {
    let first = sources.first().ok_or(StructureError::NoSources)?;

    let mut merged: Option<Mesh> = None;
    for path in sources {
        let Some(mesh) = load_oriented(path) else {
            continue;
        };
        match merged.as_mut() {
            Some(combined) => combined.append(&mesh),
            None => merged = Some(mesh),
        }
    }

    merged.ok_or_else(|| StructureError::Load(first.clone()))
}

/// Runs structures through the classify/fallback/wrap sequence.
pub struct Pipeline<'a> {
    wrapper: &'a dyn Wrapper,
    relative: RelativeParams,
    fallback: Option<&'a FallbackMapping>,
}

impl<'a> Pipeline<'a> {
    pub fn new(wrapper: &'a dyn Wrapper, relative: RelativeParams) -> Self {
        Self {
            wrapper,
            relative,
            fallback: None,
        }
    }

    /// Look for counterparts of non-watertight structures.
    pub fn with_fallback(mut self, fallback: Option<&'a FallbackMapping>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Process one structure made of `sources` (one file, or several merged).
    ///
    /// A fully watertight input is kept as-is. Otherwise, when the fallback
    /// mapping points at an existing counterpart of the input, the
    /// counterpart is classified and kept if watertight, or wrapped if not.
    /// Without a counterpart the input itself is wrapped. `before` always
    /// describes the input.
    pub fn process_structure(&self, sources: &[PathBuf]) -> Result<ProcessedStructure, StructureError> {
        let mesh = load_merged(sources)?;

        let report = validate_mesh(&mesh);
        if report.is_fully_watertight() {
            debug!("Input is fully watertight, keeping it");
            return Ok(finish(mesh, true, true, false, false));
        }
        debug!(
            "Input is not watertight: closed={}, self-intersecting={}",
            report.is_closed, report.self_intersects
        );

        let Some(counterpart) = self.find_fallback(sources) else {
            return self.wrap(&mesh);
        };

        if validate_mesh(&counterpart).is_fully_watertight() {
            debug!("Fallback is fully watertight, keeping it");
            return Ok(finish(counterpart, false, true, false, true));
        }

        debug!("Fallback is not watertight either, wrapping it");
        let mut wrapped = self.wrap(&counterpart)?;
        wrapped.used_fallback = true;
        Ok(wrapped)
    }

    /// Wrap a mesh unconditionally.
    pub fn wrap(&self, mesh: &Mesh) -> Result<ProcessedStructure, StructureError> {
        let params = WrapParams::from_mesh(mesh, &self.relative)?;
        let wrap = self.wrapper.wrap(mesh, &params)?;

        let after = validate_mesh(&wrap).is_fully_watertight();
        if !after {
            warn!("{} wrap is not fully watertight", self.wrapper.name());
        }

        Ok(finish(wrap, false, after, true, false))
    }

    fn find_fallback(&self, sources: &[PathBuf]) -> Option<Mesh> {
        let [source] = sources else {
            return None;
        };
        let candidate = self.fallback?.map(source)?;
        if !candidate.is_file() {
            debug!("No fallback at {}", candidate.display());
            return None;
        }

        match load_oriented(&candidate) {
            Some(counterpart) => {
                info!("Using fallback {} for {}", candidate.display(), source.display());
                Some(counterpart)
            }
            None => {
                warn!("Fallback {} cannot be loaded, using the input", candidate.display());
                None
            }
        }
    }
}

fn finish(mesh: Mesh, before: bool, after: bool, wrapped: bool, used_fallback: bool) -> ProcessedStructure {
    let volume = mesh.signed_volume() * VOLUME_SCALE;
    ProcessedStructure {
        mesh,
        before,
        after,
        wrapped,
        used_fallback,
        volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_soup::{save_off, Vertex};
    use mesh_wrap::OffsetWrapper;
    use tempfile::TempDir;

    fn cube(size: f64) -> Mesh {
        let mut mesh = Mesh::new();
        for i in 0..8u32 {
            let bit = |b: u32| if i & b != 0 { size } else { 0.0 };
            mesh.vertices.push(Vertex::from_coords(bit(1), bit(2), bit(4)));
        }
        // Corners indexed by x + 2y + 4z.
        mesh.faces.extend_from_slice(&[
            [0, 2, 3],
            [0, 3, 1],
            [4, 5, 7],
            [4, 7, 6],
            [0, 1, 5],
            [0, 5, 4],
            [2, 6, 7],
            [2, 7, 3],
            [0, 4, 6],
            [0, 6, 2],
            [1, 3, 7],
            [1, 7, 5],
        ]);
        mesh
    }

    fn open_cube(size: f64) -> Mesh {
        let mut mesh = cube(size);
        mesh.faces.truncate(10);
        mesh
    }

    fn write(dir: &Path, name: &str, mesh: &Mesh) -> PathBuf {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        save_off(mesh, &path).unwrap();
        path
    }

    #[test]
    fn test_fixture_cube_is_outward() {
        assert_relative_eq!(cube(2.0).signed_volume(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_watertight_input_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "cube.off", &cube(10.0));

        let wrapper = OffsetWrapper::default();
        let pipeline = Pipeline::new(&wrapper, RelativeParams::default());
        let result = pipeline.process_structure(&[path]).unwrap();

        assert!(result.before && result.after);
        assert!(!result.wrapped && !result.used_fallback);
        assert_eq!(result.mesh.face_count(), 12);
        assert_relative_eq!(result.volume, 1000.0 * VOLUME_SCALE, max_relative = 1e-12);
    }

    #[test]
    fn test_open_input_is_wrapped() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "open.off", &open_cube(4.0));

        let wrapper = OffsetWrapper::default();
        let pipeline = Pipeline::new(&wrapper, RelativeParams::new(20.0, 200.0).unwrap());
        let result = pipeline.process_structure(&[path]).unwrap();

        assert!(!result.before);
        assert!(result.after);
        assert!(result.wrapped);
        assert!(result.volume > 0.0);
    }

    #[test]
    fn test_watertight_fallback_replaces_input() {
        let dir = TempDir::new().unwrap();
        let source = write(dir.path(), "body/kidney/cortex.off", &open_cube(4.0));
        write(dir.path(), "plain/kidney/cortex.off", &cube(4.0));

        let mapping = FallbackMapping::new(dir.path().join("body"), dir.path().join("plain"));
        let wrapper = OffsetWrapper::default();
        let pipeline = Pipeline::new(&wrapper, RelativeParams::default()).with_fallback(Some(&mapping));
        let result = pipeline.process_structure(&[source]).unwrap();

        assert!(!result.before, "before describes the input");
        assert!(result.after);
        assert!(result.used_fallback);
        assert!(!result.wrapped);
        assert_relative_eq!(result.volume, 64.0 * VOLUME_SCALE, max_relative = 1e-12);
    }

    #[test]
    fn test_open_fallback_is_wrapped() {
        let dir = TempDir::new().unwrap();
        let source = write(dir.path(), "body/kidney/cortex.off", &open_cube(4.0));
        let mut plain = open_cube(6.0);
        plain.faces.truncate(8);
        write(dir.path(), "plain/kidney/cortex.off", &plain);

        let mapping = FallbackMapping::new(dir.path().join("body"), dir.path().join("plain"));
        let wrapper = OffsetWrapper::default();
        let pipeline = Pipeline::new(&wrapper, RelativeParams::new(20.0, 200.0).unwrap())
            .with_fallback(Some(&mapping));
        let result = pipeline.process_structure(&[source]).unwrap();

        assert!(!result.before);
        assert!(result.after);
        assert!(result.wrapped);
        assert!(result.used_fallback);

        // The wrap follows the 6-unit counterpart, not the 4-unit input.
        let (min, max) = result.mesh.bounds().unwrap();
        assert!(max.x - min.x > 6.0, "{:?} {:?}", min, max);
    }

    #[test]
    fn test_missing_fallback_wraps() {
        let dir = TempDir::new().unwrap();
        let source = write(dir.path(), "body/kidney/cortex.off", &open_cube(4.0));

        let mapping = FallbackMapping::new(dir.path().join("body"), dir.path().join("plain"));
        let wrapper = OffsetWrapper::default();
        let pipeline = Pipeline::new(&wrapper, RelativeParams::new(20.0, 200.0).unwrap())
            .with_fallback(Some(&mapping));
        let result = pipeline.process_structure(&[source]).unwrap();

        assert!(result.wrapped);
        assert!(!result.used_fallback);
    }

    #[test]
    fn test_unreadable_structure_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.off");
        std::fs::write(&path, "").unwrap();

        let wrapper = OffsetWrapper::default();
        let pipeline = Pipeline::new(&wrapper, RelativeParams::default());
        let err = pipeline.process_structure(&[path]).unwrap_err();
        assert!(matches!(err, StructureError::Load(_)));
        assert!(err.to_string().starts_with("cannot open file"));
    }

    #[test]
    fn test_single_point_structure_is_degenerate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("point.off");
        std::fs::write(&path, "OFF\n1 0 0\n1 2 3\n").unwrap();

        let wrapper = OffsetWrapper::default();
        let pipeline = Pipeline::new(&wrapper, RelativeParams::default());
        let err = pipeline.process_structure(&[path]).unwrap_err();
        assert!(matches!(err, StructureError::Wrap(WrapError::DegenerateBounds)));
    }

    #[test]
    fn test_merged_sources_skip_bad_files() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.off", &cube(1.0));
        let bad = dir.path().join("b.off");
        std::fs::write(&bad, "not a mesh").unwrap();

        let merged = load_merged(&[a, bad]).unwrap();
        assert_eq!(merged.face_count(), 12);
        assert!(matches!(load_merged(&[]), Err(StructureError::NoSources)));
    }

    #[test]
    fn test_outcome_json() {
        let outcome = StructureOutcome::Failed {
            organ: "kidney".to_string(),
            structure: "cortex".to_string(),
            reason: "cannot open file x".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["structure"], "cortex");
        assert!(outcome.is_failed());
    }
}
