use super::cell::Cell;

/// A single text string recognition result.
///
/// # Variants
/// - `Text(&str)`: a plain string; each character becomes a certain cell.
/// - `Cells(&[Cell])`: per-character alternatives already estimated by a
///   classifier.
#[derive(Debug, Clone, Copy)]
pub enum Recognition<'a> {
	Text(&'a str),
	Cells(&'a [Cell]),
}

impl Recognition<'_> {
	/// Materializes the recognition result as owned cells.
	///
	/// An empty result is represented as a single gap cell, so every
	/// input contributes at least one aligned position.
	pub fn to_cells(&self) -> Vec<Cell> {
		let cells: Vec<Cell> = match self {
			Recognition::Text(text) => text.chars().map(Cell::certain).collect(),
			Recognition::Cells(cells) => cells.to_vec(),
		};
		if cells.is_empty() { vec![Cell::gap()] } else { cells }
	}

	/// Whether the result carries no cell at all.
	pub fn is_empty(&self) -> bool {
		match self {
			Recognition::Text(text) => text.is_empty(),
			Recognition::Cells(cells) => cells.is_empty(),
		}
	}
}

impl<'a> From<&'a str> for Recognition<'a> {
	fn from(text: &'a str) -> Self {
		Recognition::Text(text)
	}
}

impl<'a> From<&'a String> for Recognition<'a> {
	fn from(text: &'a String) -> Self {
		Recognition::Text(text.as_str())
	}
}

impl<'a> From<&'a [Cell]> for Recognition<'a> {
	fn from(cells: &'a [Cell]) -> Self {
		Recognition::Cells(cells)
	}
}

impl<'a> From<&'a Vec<Cell>> for Recognition<'a> {
	fn from(cells: &'a Vec<Cell>) -> Self {
		Recognition::Cells(cells.as_slice())
	}
}
