use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::env;

/// Reads at most `max_lines` non-blank lines of a UTF-8 corpus file.
///
/// - Lines are read lazily and reading stops as soon as the cap is reached
/// - Line terminators and surrounding whitespace are stripped
/// - Blank lines carry no sentence and are skipped (they do not count toward the cap)
/// - Lines that are not valid UTF-8 are logged and skipped the same way
pub fn read_lines<P: AsRef<Path>>(filename: P, max_lines: usize) -> io::Result<Vec<String>> {
	let reader = BufReader::new(File::open(filename)?);
	let mut lines = Vec::new();
	let mut skipped = 0usize;
	for (number, bytes) in reader.split(b'\n').enumerate() {
		if lines.len() >= max_lines {
			break;
		}
		let line = match String::from_utf8(bytes?) {
			Ok(line) => line,
			Err(e) => {
				log::warn!("skipping line {}: {}", number + 1, e);
				skipped += 1;
				continue;
			}
		};
		let line = line.trim();
		if line.is_empty() {
			skipped += 1;
			continue;
		}
		lines.push(line.to_owned());
	}
	log::debug!("read {} lines, skipped {} blank or malformed lines", lines.len(), skipped);
	Ok(lines)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"bin"` → `data/input.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/bloggmix.txt"` → `"bloggmix"`
/// - `"bloggmix.txt"` → `"bloggmix"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory, sorted by name.
///
/// Returns file names only (no paths).
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}
	files.sort();

	Ok(files)
}
