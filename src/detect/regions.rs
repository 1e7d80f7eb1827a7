//! Connected-region extraction over a binary mask.

use super::result::Region;

/// Extract maximal 8-connected foreground regions from `mask` (0 = background,
/// nonzero = foreground) and compute each region's bounding rectangle and
/// pixel count.
///
/// Regions are emitted in raster-scan order of their first-seen pixel. The
/// flood fill uses an explicit stack so deep regions cannot overflow the call
/// stack.
pub(crate) fn extract_regions(mask: &[u8], width: usize, height: usize) -> Vec<Region> {
    let mut visited = vec![false; mask.len()];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for start_y in 0..height {
        for start_x in 0..width {
            let start = start_y * width + start_x;
            if mask[start] == 0 || visited[start] {
                continue;
            }

            let (mut min_x, mut max_x) = (start_x, start_x);
            let (mut min_y, mut max_y) = (start_y, start_y);
            let mut area = 0u32;

            visited[start] = true;
            stack.push((start_x, start_y));
            while let Some((x, y)) = stack.pop() {
                area += 1;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);

                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                            continue;
                        }
                        let idx = ny as usize * width + nx as usize;
                        if mask[idx] != 0 && !visited[idx] {
                            visited[idx] = true;
                            stack.push((nx as usize, ny as usize));
                        }
                    }
                }
            }

            regions.push(Region {
                x: min_x as u32,
                y: min_y as u32,
                width: (max_x - min_x + 1) as u32,
                height: (max_y - min_y + 1) as u32,
                area,
            });
        }
    }

    regions
}
