use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::io;

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_lines<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds a sibling path with a new extension.
///
/// Example:
/// `data/train.txt` + `"bin"` → `data/train.bin`
pub(crate) fn sibling_with_extension<P: AsRef<Path>>(
	input_path: P,
	extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(extension);

	Ok(output)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sibling_with_extension() {
		let output = sibling_with_extension("data/train.txt", "bin").unwrap();
		assert_eq!(output, PathBuf::from("data/train.bin"));
	}

	#[test]
	fn test_sibling_with_extension_no_parent() {
		let output = sibling_with_extension("train.txt", "bin").unwrap();
		assert_eq!(output, PathBuf::from("train.bin"));
	}
}
