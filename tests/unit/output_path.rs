//! Unit tests for output file naming

use photo_export::output::{output_path, sanitize_file_name, OutputError};
use std::path::Path;

#[test]
fn test_remote_names_map_into_output_dir() {
    let dir = Path::new("images");
    let cases = [
        ("IMG_0001.JPG", "IMG_0001.JPG"),
        ("2019:01:01 12:00.jpg", "2019_01_01 12_00.jpg"),
        ("a\\b\\c.heic", "a_b_c.heic"),
        ("..\\..\\boot.ini", ".._.._boot.ini"),
    ];

    for (remote, local) in cases {
        let path = output_path(dir, remote).unwrap();
        assert_eq!(path, dir.join(local), "remote name {remote:?}");
        assert_eq!(path.parent(), Some(dir));
    }
}

#[test]
fn test_directory_references_are_rejected() {
    for name in ["", ".", ".."] {
        assert!(matches!(
            sanitize_file_name(name),
            Err(OutputError::InvalidFileName(_))
        ));
    }
}
