//! Image annex layout.
//!
//! Images are laid out two per row in upload order. Image `i` lands in row
//! `i / 2`, column `i % 2`; an odd count leaves the last row's second cell
//! empty.

/// Number of image columns in the annex table.
pub const ANNEX_COLUMNS: usize = 2;

/// One occupied annex cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnexCell {
    /// Position in the upload list (0-based)
    pub image_index: usize,
    /// Figure number shown in the caption (1-based)
    pub figure: usize,
}

impl AnnexCell {
    pub fn caption(&self) -> String {
        format!("Figure {}", self.figure)
    }
}

pub type AnnexRow = [Option<AnnexCell>; ANNEX_COLUMNS];

/// Lays out `count` images into `ceil(count / 2)` rows.
pub fn annex_grid(count: usize) -> Vec<AnnexRow> {
    let rows = count.div_ceil(ANNEX_COLUMNS);
    let mut grid: Vec<AnnexRow> = vec![[None; ANNEX_COLUMNS]; rows];

    for image_index in 0..count {
        let row = image_index / ANNEX_COLUMNS;
        let col = image_index % ANNEX_COLUMNS;
        grid[row][col] = Some(AnnexCell {
            image_index,
            figure: image_index + 1,
        });
    }

    grid
}
