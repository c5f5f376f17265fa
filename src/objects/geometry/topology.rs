//! Polygon index encoding and edge derivation.
//!
//! On the wire all polygons share one flat index buffer. The last index of
//! each polygon is stored bitwise-complemented (`!i`, i.e. `-(i + 1)`), so a
//! negative value terminates the polygon.

use std::collections::HashMap;

/// Flatten polygons, complementing each polygon's last index.
///
/// Empty polygons contribute nothing.
pub fn encode_polygons(polygons: &[Vec<i32>]) -> Vec<i32> {
    let mut out = Vec::with_capacity(index_count(polygons));
    for polygon in polygons {
        if let Some((&last, rest)) = polygon.split_last() {
            out.extend_from_slice(rest);
            out.push(!last);
        }
    }
    out
}

/// Split a flat terminal-encoded buffer back into polygons.
///
/// A trailing run without a terminator is kept as a final polygon.
pub fn decode_polygons(indices: &[i32]) -> Vec<Vec<i32>> {
    let mut polygons = Vec::new();
    let mut current = Vec::new();
    for &index in indices {
        if index < 0 {
            current.push(!index);
            polygons.push(std::mem::take(&mut current));
        } else {
            current.push(index);
        }
    }
    if !current.is_empty() {
        tracing::debug!(len = current.len(), "unterminated trailing polygon");
        polygons.push(current);
    }
    polygons
}

/// Total number of polygon vertices.
#[inline]
pub fn index_count(polygons: &[Vec<i32>]) -> usize {
    polygons.iter().map(Vec::len).sum()
}

/// Unique undirected edges, each identified by the flat buffer position of
/// the polygon vertex where it is first met.
///
/// Every polygon is walked cyclically: its closing edge runs from the last
/// vertex back to the first. Output follows discovery order.
pub fn derive_edges(polygons: &[Vec<i32>]) -> Vec<i32> {
    let mut seen: HashMap<i64, i32> = HashMap::new();
    let mut edges = Vec::new();
    let mut position = 0i32;

    for polygon in polygons {
        let n = polygon.len();
        for (i, &a) in polygon.iter().enumerate() {
            let b = polygon[(i + 1) % n];
            seen.entry(edge_key(a, b)).or_insert_with(|| {
                edges.push(position);
                position
            });
            position += 1;
        }
    }
    edges
}

/// Order-independent key of an undirected vertex pair.
#[inline]
fn edge_key(a: i32, b: i32) -> i64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    ((lo as i64) << 32) | (hi as u32 as i64)
}
