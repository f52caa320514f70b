// Copyright 2025 The Stitchfont Project Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
//! Stitch bitmap operations: border trim and morphological dilation.

/// Equal-length rows of `'0'`/`'1'` cells, top to bottom.
pub type Bitmap = Vec<String>;

fn row_is_empty(row: &str) -> bool {
    row.bytes().all(|b| b == b'0')
}

/// Removes all-zero rows from the top and bottom, then all-zero columns
/// from the left and right. A bitmap with no ink trims to empty; callers
/// treat that as a skipped glyph.
pub fn trim(mut bitmap: Bitmap) -> Bitmap {
    while bitmap.first().map_or(false, |row| row_is_empty(row)) {
        bitmap.remove(0);
    }
    while bitmap.last().map_or(false, |row| row_is_empty(row)) {
        bitmap.pop();
    }
    if bitmap.is_empty() {
        return bitmap;
    }

    let width = bitmap[0].len();
    let column_is_empty = |col: usize| bitmap.iter().all(|row| row.as_bytes()[col] == b'0');

    let mut left = 0;
    while left < width && column_is_empty(left) {
        left += 1;
    }
    let mut right = width;
    while right > left && column_is_empty(right - 1) {
        right -= 1;
    }

    if left > 0 || right < width {
        bitmap = bitmap.iter().map(|row| row[left..right].to_owned()).collect();
    }
    bitmap
}

/// Dilation by a square structuring element: a cell is set when any input
/// cell within Chebyshev distance `radius` is set. Edges clip; `radius` 0
/// is the identity. Implements the bold effect, thickening strokes by a
/// whole number of stitches.
pub fn dilate(bitmap: &[String], radius: u32) -> Bitmap {
    if radius == 0 || bitmap.is_empty() || bitmap[0].is_empty() {
        return bitmap.to_vec();
    }

    let rows = bitmap.len();
    let cols = bitmap[0].len();
    let radius = radius as isize;
    let mut grid = vec![vec![false; cols]; rows];

    for (y, row) in bitmap.iter().enumerate() {
        for (x, cell) in row.bytes().enumerate() {
            if cell != b'1' {
                continue;
            }
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;
                    if ny >= 0 && (ny as usize) < rows && nx >= 0 && (nx as usize) < cols {
                        grid[ny as usize][nx as usize] = true;
                    }
                }
            }
        }
    }

    grid.iter()
        .map(|row| row.iter().map(|&on| if on { '1' } else { '0' }).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(rows: &[&str]) -> Bitmap {
        rows.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn trim_removes_empty_borders() {
        let trimmed = trim(bitmap(&["0000", "0110", "0100", "0000"]));
        assert_eq!(trimmed, bitmap(&["11", "10"]));
    }

    #[test]
    fn trim_of_blank_bitmap_is_empty() {
        assert!(trim(bitmap(&["000", "000"])).is_empty());
    }

    #[test]
    fn trim_is_idempotent() {
        let once = trim(bitmap(&["0000", "0110", "0100", "0000"]));
        assert_eq!(trim(once.clone()), once);
    }

    #[test]
    fn dilate_expands_by_radius() {
        let dilated = dilate(&bitmap(&["00000", "00100", "00000"]), 1);
        assert_eq!(dilated, bitmap(&["01110", "01110", "01110"]));
    }

    #[test]
    fn dilate_radius_zero_is_identity() {
        let input = bitmap(&["010", "101"]);
        assert_eq!(dilate(&input, 0), input);
    }

    #[test]
    fn dilate_clips_at_edges() {
        let dilated = dilate(&bitmap(&["100", "000"]), 1);
        assert_eq!(dilated, bitmap(&["110", "110"]));
    }

    #[test]
    fn dilate_preserves_existing_ink() {
        let input = bitmap(&["0110", "1001", "0100"]);
        let dilated = dilate(&input, 2);
        for (orig, grown) in input.iter().zip(&dilated) {
            for (a, b) in orig.bytes().zip(grown.bytes()) {
                if a == b'1' {
                    assert_eq!(b, b'1');
                }
            }
        }
    }
}
