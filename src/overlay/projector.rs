//! Grid cell naming and pixel projection.
//!
//! Cells are addressed in pixel order, `(1, 1)` being the top-left slot of the
//! host rectangle. Their algebraic labels depend on the grid orientation.

use crate::overlay::error::OverlayError;
use crate::overlay::model::{CellAddress, Endpoint, GridSpec, HostRect, Orientation, PixelPoint};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCell {
    pub address: CellAddress,
    pub label: String,
    pub center: PixelPoint,
}

/// Snapshot of every cell centre for one grid and one host rectangle.
///
/// Superseded wholesale on each geometry change, never patched.
#[derive(Debug, Clone)]
pub struct Projection {
    grid: GridSpec,
    rect: HostRect,
    cell_width: f64,
    cell_height: f64,
    cells: Vec<ProjectedCell>,
    by_label: HashMap<String, usize>,
}

impl Projection {
    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn rect(&self) -> HostRect {
        self.rect
    }

    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    pub fn cell_height(&self) -> f64 {
        self.cell_height
    }

    /// Cell size used to scale shape proportions.
    pub fn cell_size(&self) -> f64 {
        self.cell_width
    }

    pub fn cells(&self) -> &[ProjectedCell] {
        &self.cells
    }

    pub fn cell(&self, address: CellAddress) -> Option<&ProjectedCell> {
        if !self.grid.contains(address) {
            return None;
        }
        let index = (address.row - 1) as usize * self.grid.width as usize + (address.col - 1) as usize;
        self.cells.get(index)
    }

    pub fn cell_by_label(&self, label: &str) -> Option<&ProjectedCell> {
        let index = self.by_label.get(&label.to_ascii_lowercase())?;
        self.cells.get(*index)
    }

    pub fn center_of(&self, endpoint: &Endpoint) -> Result<PixelPoint, OverlayError> {
        let cell = match endpoint {
            Endpoint::Label(label) => self.cell_by_label(label),
            Endpoint::Address(address) => self.cell(*address),
        };
        cell.map(|cell| cell.center)
            .ok_or_else(|| OverlayError::unknown_address(endpoint.to_string()))
    }
}

/// Computes the centre of every cell, in row-major order, relative to the
/// rectangle's own origin.
pub fn project(rect: HostRect, grid: GridSpec) -> Result<Projection, OverlayError> {
    grid.validate()?;

    let cell_width = rect.width / grid.width as f64;
    let cell_height = rect.height / grid.height as f64;

    let mut cells = Vec::with_capacity(grid.cell_count());
    let mut by_label = HashMap::with_capacity(grid.cell_count());
    for row in 1..=grid.height {
        for col in 1..=grid.width {
            let address = CellAddress::new(col, row);
            let label = label_for(address, grid)?;
            by_label.insert(label.clone(), cells.len());
            cells.push(ProjectedCell {
                address,
                label,
                center: PixelPoint::new(
                    cell_width * (col as f64 - 0.5),
                    cell_height * (row as f64 - 0.5),
                ),
            });
        }
    }

    Ok(Projection {
        grid,
        rect,
        cell_width,
        cell_height,
        cells,
        by_label,
    })
}

pub fn label_for(address: CellAddress, grid: GridSpec) -> Result<String, OverlayError> {
    if !grid.contains(address) {
        return Err(OverlayError::unknown_address(address.to_string()));
    }
    let (file, rank) = match grid.orientation {
        Orientation::Primary => (address.col, grid.height - address.row + 1),
        Orientation::Flipped => (grid.width - address.col + 1, address.row),
    };
    Ok(format!("{}{rank}", file_letters(file)))
}

pub fn address_for(label: &str, grid: GridSpec) -> Result<CellAddress, OverlayError> {
    let unknown = || OverlayError::unknown_address(label);
    let (file, rank) = parse_label(label).ok_or_else(unknown)?;
    if file > grid.width || rank > grid.height {
        return Err(unknown());
    }
    let address = match grid.orientation {
        Orientation::Primary => CellAddress::new(file, grid.height - rank + 1),
        Orientation::Flipped => CellAddress::new(grid.width - file + 1, rank),
    };
    Ok(address)
}

/// Bijective base-26 file naming: `a..z`, then `aa, ab, ..`.
fn file_letters(mut file: u32) -> String {
    let mut letters = Vec::new();
    while file > 0 {
        file -= 1;
        letters.push(char::from(b'a' + (file % 26) as u8));
        file /= 26;
    }
    letters.iter().rev().collect()
}

fn parse_label(label: &str) -> Option<(u32, u32)> {
    let split = label.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = label.split_at(split);
    if letters.is_empty() || digits.starts_with('0') {
        return None;
    }

    let mut file: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let value = c.to_ascii_lowercase() as u32 - 'a' as u32 + 1;
        file = file.checked_mul(26)?.checked_add(value)?;
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let rank = digits.parse().ok()?;
    Some((file, rank))
}
