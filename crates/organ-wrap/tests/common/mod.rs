//! Body-directory fixtures shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Closed, outward cube of side 10.
pub const CLOSED_CUBE_OBJ: &str = "\
v 0 0 0
v 10 0 0
v 10 10 0
v 0 10 0
v 0 0 10
v 10 0 10
v 10 10 10
v 0 10 10
f 1 4 3 2
f 5 6 7 8
f 1 2 6 5
f 3 4 8 7
f 1 5 8 4
f 2 3 7 6
";

/// The same cube with its top face on duplicated vertices, pierced by a
/// triangle sticking out of the top and bottom.
pub const BROKEN_CUBE_OBJ: &str = "\
v 0 0 0
v 10 0 0
v 10 10 0
v 0 10 0
v 0 0 10
v 10 0 10
v 10 10 10
v 0 10 10
v 0 0 10
v 10 0 10
v 10 10 10
v 0 10 10
v 5 5 -5
v 5 5 15
v 6 5 5
f 1 4 3 2
f 9 10 11 12
f 1 2 6 5
f 3 4 8 7
f 1 5 8 4
f 2 3 7 6
f 13 14 15
";

pub fn write_file(path: &Path, contents: &str) -> PathBuf {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
    path.to_path_buf()
}

/// `body/organA/struct1.obj` and `body/organA/struct2.obj`.
pub fn body_with_two_structures(root: &Path) -> PathBuf {
    let body = root.join("body");
    write_file(&body.join("organA/struct1.obj"), CLOSED_CUBE_OBJ);
    write_file(&body.join("organA/struct2.obj"), BROKEN_CUBE_OBJ);
    body
}

/// Parse a report into rows of fields, header included.
pub fn read_report(path: &Path) -> Vec<Vec<String>> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split(',').map(String::from).collect())
        .collect()
}
