//! Mesh file I/O for OFF, OBJ, STL, and 3MF formats.
//!
//! Readers produce a [`PolygonSoup`]: polygons are kept as they appear in the
//! file so the orienter can work on the original connectivity. Writers take an
//! indexed [`Mesh`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use nalgebra::Point3;
use tracing::{debug, error, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::winding::orient_polygon_soup;
use crate::{Mesh, PolygonSoup};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Off,
    Obj,
    Stl,
    ThreeMf,
}

impl MeshFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse an extension such as `"off"` or `"STL"` (no leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "off" => Some(MeshFormat::Off),
            "obj" => Some(MeshFormat::Obj),
            "stl" => Some(MeshFormat::Stl),
            "3mf" => Some(MeshFormat::ThreeMf),
            _ => None,
        }
    }

    /// Canonical lowercase extension.
    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Off => "off",
            MeshFormat::Obj => "obj",
            MeshFormat::Stl => "stl",
            MeshFormat::ThreeMf => "3mf",
        }
    }
}

fn detect_format(path: &Path) -> MeshResult<MeshFormat> {
    MeshFormat::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path.extension().and_then(|e| e.to_str()).map(String::from),
    })
}

/// Read a polygon soup from file, auto-detecting format from extension.
///
/// A file that parses but holds no points is an [`MeshError::EmptyMesh`].
pub fn read_polygon_soup(path: &Path) -> MeshResult<PolygonSoup> {
    let format = detect_format(path)?;

    info!("Loading mesh from {:?} (format: {:?})", path, format);

    let soup = match format {
        MeshFormat::Off => read_off(path)?,
        MeshFormat::Obj => read_obj(path)?,
        MeshFormat::Stl => read_stl(path)?,
        MeshFormat::ThreeMf => read_3mf(path)?,
    };

    if soup.is_empty() {
        return Err(MeshError::EmptyMesh {
            details: format!("{} contains no points", path.display()),
        });
    }

    debug!(
        "Loaded soup: {} points, {} polygons",
        soup.points.len(),
        soup.polygons.len()
    );

    Ok(soup)
}

/// Lenient loader used by the batch driver.
///
/// Logs `Cannot open file <path>` with the cause and returns `None` when the
/// file cannot be read or parsed.
pub fn load_polygon_soup(path: &Path) -> Option<PolygonSoup> {
    match read_polygon_soup(path) {
        Ok(soup) => Some(soup),
        Err(e) => {
            error!("Cannot open file {}: {}", path.display(), e);
            None
        }
    }
}

/// Load a mesh: read the soup, orient it, and triangulate it.
pub fn load_mesh(path: &Path) -> MeshResult<Mesh> {
    let mut soup = read_polygon_soup(path)?;
    orient_polygon_soup(&mut soup);
    let mesh = soup.to_mesh();

    if let Some((min, max)) = mesh.bounds() {
        let dims = max - min;
        debug!(
            "Bounding box: [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}]",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        if mesh.faces.is_empty() {
            warn!("{} has points but no usable faces", path.display());
        } else if dims.x.max(dims.y).max(dims.z) < 1e-3 {
            warn!(
                "Mesh largest dimension is {:.6} - may need scaling",
                dims.x.max(dims.y).max(dims.z)
            );
        }
    }

    Ok(mesh)
}

fn open(path: &Path) -> MeshResult<File> {
    File::open(path).map_err(|source| MeshError::IoRead {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_field<T: FromStr>(token: Option<&str>, path: &Path, what: &str) -> MeshResult<T> {
    let token = token.ok_or_else(|| MeshError::parse(path, format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| MeshError::parse(path, format!("invalid {} '{}'", what, token)))
}

/// Load a soup from an OFF file.
fn read_off(path: &Path) -> MeshResult<PolygonSoup> {
    let mut text = String::new();
    open(path)?
        .read_to_string(&mut text)
        .map_err(|source| MeshError::IoRead {
            path: path.to_path_buf(),
            source,
        })?;

    parse_off(&text, path)
}

fn parse_off(text: &str, path: &Path) -> MeshResult<PolygonSoup> {
    let mut lines = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty());

    let first = lines
        .next()
        .ok_or_else(|| MeshError::parse(path, "file is empty"))?;
    let mut header: Vec<&str> = first.split_whitespace().collect();
    if header.first().is_some_and(|t| t.ends_with("OFF")) {
        header.remove(0);
    }
    let counts: Vec<&str> = if header.is_empty() {
        lines
            .next()
            .ok_or_else(|| MeshError::parse(path, "missing element counts"))?
            .split_whitespace()
            .collect()
    } else {
        header
    };

    let vertex_count: usize = parse_field(counts.first().copied(), path, "vertex count")?;
    let face_count: usize = parse_field(counts.get(1).copied(), path, "face count")?;

    let mut soup = PolygonSoup {
        points: Vec::with_capacity(vertex_count.min(1 << 20)),
        polygons: Vec::with_capacity(face_count.min(1 << 20)),
    };

    for i in 0..vertex_count {
        let line = lines.next().ok_or_else(|| {
            MeshError::parse(path, format!("expected {} vertices, found {}", vertex_count, i))
        })?;
        let mut tokens = line.split_whitespace();
        let x = parse_field(tokens.next(), path, "coordinate")?;
        let y = parse_field(tokens.next(), path, "coordinate")?;
        let z = parse_field(tokens.next(), path, "coordinate")?;
        soup.points.push(Point3::new(x, y, z));
    }

    for i in 0..face_count {
        let line = lines.next().ok_or_else(|| {
            MeshError::parse(path, format!("expected {} faces, found {}", face_count, i))
        })?;
        let mut tokens = line.split_whitespace();
        let n: usize = parse_field(tokens.next(), path, "face size")?;
        let polygon = (0..n)
            .map(|_| parse_field(tokens.next(), path, "vertex index"))
            .collect::<MeshResult<Vec<u32>>>()?;
        soup.polygons.push(polygon);
    }

    debug!(
        "OFF contains {} vertices, {} faces",
        soup.points.len(),
        soup.polygons.len()
    );

    Ok(soup)
}

/// Load a soup from an OBJ file, keeping polygons untriangulated.
fn read_obj(path: &Path) -> MeshResult<PolygonSoup> {
    // tobj reports a missing file without its cause.
    drop(open(path)?);

    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: false,
            single_index: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::parse(path, e.to_string()))?;

    // Merge all models into a single soup
    let mut soup = PolygonSoup::new();

    for model in &models {
        let obj_mesh = &model.mesh;
        let offset = soup.points.len() as u32;

        soup.points.extend(
            obj_mesh
                .positions
                .chunks_exact(3)
                .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64)),
        );

        // Empty arities means the model is made of triangles only.
        if obj_mesh.face_arities.is_empty() {
            for chunk in obj_mesh.indices.chunks_exact(3) {
                soup.polygons.push(chunk.iter().map(|&i| i + offset).collect());
            }
        } else {
            let mut start = 0usize;
            for &arity in &obj_mesh.face_arities {
                let end = start + arity as usize;
                let Some(corners) = obj_mesh.indices.get(start..end) else {
                    return Err(MeshError::parse(
                        path,
                        format!("face arities of '{}' exceed its indices", model.name),
                    ));
                };
                soup.polygons.push(corners.iter().map(|&i| i + offset).collect());
                start = end;
            }
        }

        debug!("OBJ model '{}': {} points", model.name, obj_mesh.positions.len() / 3);
    }

    debug!(
        "OBJ loaded: {} points, {} polygons from {} models",
        soup.points.len(),
        soup.polygons.len(),
        models.len()
    );

    Ok(soup)
}

/// Load a soup from an STL file (binary or ASCII).
fn read_stl(path: &Path) -> MeshResult<PolygonSoup> {
    let mut reader = BufReader::new(open(path)?);

    // stl_io::read_stl merges coincident corners into an indexed mesh
    let stl = stl_io::read_stl(&mut reader).map_err(|e| MeshError::parse(path, e.to_string()))?;

    debug!(
        "STL contains {} vertices, {} triangles",
        stl.vertices.len(),
        stl.faces.len()
    );

    let points = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v.0[0] as f64, v.0[1] as f64, v.0[2] as f64))
        .collect();
    let polygons = stl
        .faces
        .iter()
        .map(|face| face.vertices.iter().map(|&i| i as u32).collect())
        .collect();

    Ok(PolygonSoup { points, polygons })
}

/// Load a soup from a 3MF file.
///
/// 3MF is a ZIP archive containing XML files. The mesh data is in
/// 3D/3dmodel.model as indexed vertices and triangles.
fn read_3mf(path: &Path) -> MeshResult<PolygonSoup> {
    let mut archive = zip::ZipArchive::new(open(path)?)
        .map_err(|e| MeshError::parse(path, format!("Invalid 3MF archive: {}", e)))?;

    let model_path = find_3mf_model_path(&mut archive, path)?;

    let mut model_file = archive
        .by_name(&model_path)
        .map_err(|e| MeshError::parse(path, format!("Cannot open model file '{}': {}", model_path, e)))?;

    let mut xml_content = String::new();
    model_file
        .read_to_string(&mut xml_content)
        .map_err(|source| MeshError::IoRead {
            path: path.to_path_buf(),
            source,
        })?;

    parse_3mf_model(&xml_content, path)
}

/// Find the model file path in a 3MF archive.
fn find_3mf_model_path(archive: &mut zip::ZipArchive<File>, path: &Path) -> MeshResult<String> {
    let candidates = ["3D/3dmodel.model", "3d/3dmodel.model", "3D/3DModel.model"];

    for candidate in candidates {
        if archive.by_name(candidate).is_ok() {
            return Ok(candidate.to_string());
        }
    }

    archive
        .file_names()
        .find(|name| name.to_lowercase().ends_with(".model"))
        .map(String::from)
        .ok_or_else(|| MeshError::parse(path, "No model file found in 3MF archive"))
}

/// Parse 3MF model XML content.
///
/// Triangle indices are local to their `<mesh>`; several objects are merged
/// into one soup.
fn parse_3mf_model(xml: &str, path: &Path) -> MeshResult<PolygonSoup> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut soup = PolygonSoup::new();
    let mut base = 0u32;
    let mut in_vertices = false;
    let mut in_triangles = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"mesh" => base = soup.points.len() as u32,
                b"vertices" => in_vertices = true,
                b"triangles" => in_triangles = true,
                b"vertex" if in_vertices => {
                    let mut coords = [None::<f64>; 3];
                    for attr in e.attributes().flatten() {
                        let slot = match attr.key.local_name().as_ref() {
                            b"x" => 0,
                            b"y" => 1,
                            b"z" => 2,
                            _ => continue,
                        };
                        let value = String::from_utf8_lossy(&attr.value);
                        coords[slot] = Some(parse_field(Some(value.as_ref()), path, "vertex coordinate")?);
                    }
                    let [Some(x), Some(y), Some(z)] = coords else {
                        return Err(MeshError::parse(path, "vertex without x/y/z"));
                    };
                    soup.points.push(Point3::new(x, y, z));
                }
                b"triangle" if in_triangles => {
                    let mut corners = [None::<u32>; 3];
                    for attr in e.attributes().flatten() {
                        let slot = match attr.key.local_name().as_ref() {
                            b"v1" => 0,
                            b"v2" => 1,
                            b"v3" => 2,
                            _ => continue,
                        };
                        let value = String::from_utf8_lossy(&attr.value);
                        corners[slot] = Some(parse_field(Some(value.as_ref()), path, "triangle index")?);
                    }
                    let [Some(v1), Some(v2), Some(v3)] = corners else {
                        return Err(MeshError::parse(path, "triangle without v1/v2/v3"));
                    };
                    soup.polygons.push(vec![base + v1, base + v2, base + v3]);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"vertices" => in_vertices = false,
                b"triangles" => in_triangles = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MeshError::parse(path, format!("XML parse error: {}", e)));
            }
            _ => {}
        }
    }

    debug!(
        "3MF loaded: {} vertices, {} triangles",
        soup.points.len(),
        soup.polygons.len()
    );

    Ok(soup)
}

/// Save mesh to file, auto-detecting format from extension.
pub fn save_mesh(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    match detect_format(path)? {
        MeshFormat::Off => save_off(mesh, path),
        MeshFormat::Obj => save_obj(mesh, path),
        MeshFormat::Stl => save_stl(mesh, path),
        MeshFormat::ThreeMf => save_3mf(mesh, path),
    }
}

/// Create `path` and run `body` against a buffered writer, flushing at the end.
fn write_with(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
) -> MeshResult<()> {
    let io_write = |source| MeshError::IoWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_write)?;
    let mut writer = BufWriter::new(file);
    body(&mut writer).map_err(io_write)?;
    writer.flush().map_err(io_write)
}

/// Save mesh to OFF file.
///
/// Coordinates use the shortest representation that reads back to the same
/// `f64`, so OFF output round-trips exactly.
pub fn save_off(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?} (OFF format)", path);

    write_with(path, |w| {
        writeln!(w, "OFF")?;
        writeln!(w, "{} {} 0", mesh.vertices.len(), mesh.faces.len())?;
        for v in &mesh.vertices {
            writeln!(w, "{} {} {}", v.position.x, v.position.y, v.position.z)?;
        }
        for [a, b, c] in &mesh.faces {
            writeln!(w, "3 {} {} {}", a, b, c)?;
        }
        Ok(())
    })?;

    info!(
        "Saved {} vertices and {} faces to {:?}",
        mesh.vertices.len(),
        mesh.faces.len(),
        path
    );

    Ok(())
}

/// Save mesh to OBJ file (ASCII format).
///
/// OBJ preserves vertex indices exactly, unlike STL which duplicates
/// vertices per triangle.
pub fn save_obj(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?} (OBJ format)", path);

    write_with(path, |w| {
        writeln!(w, "# OBJ file exported by organ-wrap")?;
        writeln!(w, "# Vertices: {}", mesh.vertices.len())?;
        writeln!(w, "# Faces: {}", mesh.faces.len())?;
        writeln!(w)?;

        for v in &mesh.vertices {
            writeln!(w, "v {} {} {}", v.position.x, v.position.y, v.position.z)?;
        }

        writeln!(w)?;
        for face in &mesh.faces {
            // OBJ uses 1-based indexing
            writeln!(w, "f {} {} {}", face[0] + 1, face[1] + 1, face[2] + 1)?;
        }
        Ok(())
    })?;

    info!(
        "Saved {} vertices and {} faces to {:?}",
        mesh.vertices.len(),
        mesh.faces.len(),
        path
    );

    Ok(())
}

/// Save mesh to STL file (binary format).
pub fn save_stl(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?} (STL format)", path);

    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|tri| {
            let n = tri.normal_unnormalized().try_normalize(0.0).unwrap_or_else(nalgebra::Vector3::zeros);
            let vertex = |p: Point3<f64>| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [vertex(tri.v0), vertex(tri.v1), vertex(tri.v2)],
            }
        })
        .collect();

    write_with(path, |w| stl_io::write_stl(w, triangles.iter()))?;

    info!("Saved {} triangles to {:?}", mesh.face_count(), path);

    Ok(())
}

/// Save mesh to 3MF file.
pub fn save_3mf(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?} (3MF format)", path);

    let io_write = |source| MeshError::IoWrite {
        path: path.to_path_buf(),
        source,
    };
    let zip_write = |e: zip::result::ZipError| io_write(std::io::Error::other(e));

    let file = File::create(path).map_err(io_write)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let entries = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", RELS_XML.to_string()),
        ("3D/3dmodel.model", generate_3mf_model_xml(mesh)),
    ];
    for (name, content) in entries {
        zip.start_file(name, options).map_err(zip_write)?;
        zip.write_all(content.as_bytes()).map_err(io_write)?;
    }
    zip.finish().map_err(zip_write)?;

    info!(
        "Saved {} vertices and {} faces to {:?} (3MF)",
        mesh.vertices.len(),
        mesh.faces.len(),
        path
    );

    Ok(())
}

/// Generate 3MF model XML content.
fn generate_3mf_model_xml(mesh: &Mesh) -> String {
    use std::fmt::Write as _;

    let mut xml = String::with_capacity(mesh.vertices.len() * 60 + mesh.faces.len() * 50);

    xml.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>
    <object id="1" type="model">
      <mesh>
        <vertices>
"#,
    );

    for v in &mesh.vertices {
        let _ = writeln!(
            xml,
            "          <vertex x=\"{}\" y=\"{}\" z=\"{}\"/>",
            v.position.x, v.position.y, v.position.z
        );
    }

    xml.push_str("        </vertices>\n        <triangles>\n");

    for face in &mesh.faces {
        let _ = writeln!(
            xml,
            "          <triangle v1=\"{}\" v2=\"{}\" v3=\"{}\"/>",
            face[0], face[1], face[2]
        );
    }

    xml.push_str(
        r#"        </triangles>
      </mesh>
    </object>
  </resources>
  <build>
    <item objectid="1"/>
  </build>
</model>
"#,
    );

    xml
}

/// 3MF Content Types XML.
const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>
"#;

/// 3MF Relationships XML.
const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::cube;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            MeshFormat::from_path(Path::new("test.off")),
            Some(MeshFormat::Off)
        );
        assert_eq!(
            MeshFormat::from_path(Path::new("test.STL")),
            Some(MeshFormat::Stl)
        );
        assert_eq!(
            MeshFormat::from_path(Path::new("test.obj")),
            Some(MeshFormat::Obj)
        );
        assert_eq!(
            MeshFormat::from_path(Path::new("a/b.3MF")),
            Some(MeshFormat::ThreeMf)
        );
        assert_eq!(MeshFormat::from_path(Path::new("test.xyz")), None);
        assert_eq!(MeshFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read_polygon_soup(Path::new("organ.ply")).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_parse_off_with_comments_and_colours() {
        let text = "\
# exported by a scanner
COFF
4 2 0

0 0 0 255 0 0
1 0 0 255 0 0
1 1 0
0 1 0   # trailing comment
4 0 1 2 3 128 128 128
3 0 2 1
";
        let soup = parse_off(text, Path::new("mem.off")).unwrap();
        assert_eq!(soup.points.len(), 4);
        assert_eq!(soup.points[2], Point3::new(1.0, 1.0, 0.0));
        assert_eq!(soup.polygons, vec![vec![0, 1, 2, 3], vec![0, 2, 1]]);
    }

    #[test]
    fn test_parse_off_counts_on_header_line() {
        let soup = parse_off("OFF 3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n", Path::new("x.off")).unwrap();
        assert_eq!(soup.polygons.len(), 1);
    }

    #[test]
    fn test_parse_off_without_keyword() {
        let soup = parse_off("3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n", Path::new("x.off")).unwrap();
        assert_eq!(soup.points.len(), 3);
    }

    #[test]
    fn test_parse_off_truncated() {
        let err = parse_off("OFF\n3 1 0\n0 0 0\n1 0 0\n", Path::new("x.off")).unwrap_err();
        assert!(matches!(err, MeshError::ParseError { .. }));
        let err = parse_off("OFF\n3 1 0\n0 0 0\n1 zero 0\n0 1 0\n3 0 1 2\n", Path::new("x.off"))
            .unwrap_err();
        assert!(err.to_string().contains("zero"));
    }

    #[test]
    fn test_zero_byte_file_is_an_error() {
        let file = write_temp(".off", "");
        let err = read_polygon_soup(file.path()).unwrap_err();
        assert!(matches!(err, MeshError::ParseError { .. }));
        assert!(load_polygon_soup(file.path()).is_none());
    }

    #[test]
    fn test_soup_without_points_is_empty() {
        let file = write_temp(".off", "OFF\n0 0 0\n");
        let err = read_polygon_soup(file.path()).unwrap_err();
        assert!(matches!(err, MeshError::EmptyMesh { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = read_polygon_soup(Path::new("/nonexistent/organ/struct.off")).unwrap_err();
        assert!(matches!(err, MeshError::IoRead { .. }));
        assert!(load_polygon_soup(Path::new("/nonexistent/organ/struct.obj")).is_none());
    }

    #[test]
    fn test_obj_keeps_polygons() {
        let file = write_temp(
            ".obj",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0.5 0.5 1\nf 1 2 3 4\nf 1 2 5\nl 1 5\n",
        );
        let soup = read_polygon_soup(file.path()).unwrap();
        assert_eq!(soup.points.len(), 5);
        assert_eq!(soup.polygons, vec![vec![0, 1, 2, 3], vec![0, 1, 4]]);
    }

    #[test]
    fn test_load_stl() {
        let file = write_temp(
            ".stl",
            "solid test
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 100 0 0
      vertex 0 100 0
    endloop
  endfacet
endsolid test
",
        );
        let mesh = load_mesh(file.path()).expect("should load");

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);

        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(100.0, 100.0, 0.0));
    }

    #[test]
    fn test_off_round_trip_is_exact() {
        let mut mesh = cube(1.0);
        mesh.vertices[6].position = Point3::new(0.1 + 0.2, 1.0 / 3.0, 1e-17 + 1.0);

        let file = NamedTempFile::with_suffix(".off").unwrap();
        save_mesh(&mesh, file.path()).expect("should save");
        let soup = read_polygon_soup(file.path()).expect("should reload");

        assert_eq!(soup.points[6], mesh.vertices[6].position);
        assert_eq!(soup.polygons.len(), 12);
    }

    #[test]
    fn test_save_and_reload_every_format() {
        let dir = TempDir::new().unwrap();
        let mesh = cube(10.0);

        for ext in ["off", "obj", "stl", "3mf"] {
            let path = dir.path().join(format!("cube.{}", ext));
            save_mesh(&mesh, &path).expect("should save");
            let reloaded = load_mesh(&path).expect("should reload");

            assert_eq!(reloaded.face_count(), 12, "{}", ext);
            assert_eq!(reloaded.vertex_count(), 8, "{}", ext);
            assert_relative_eq!(reloaded.signed_volume(), 1000.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_load_mesh_orients_outward() {
        let mut mesh = cube(2.0);
        mesh.flip_faces();

        let file = NamedTempFile::with_suffix(".off").unwrap();
        save_off(&mesh, file.path()).unwrap();
        let reloaded = load_mesh(file.path()).unwrap();

        assert_relative_eq!(reloaded.signed_volume(), 8.0, epsilon = 1e-12);
    }
}
