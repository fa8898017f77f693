//! Text rendering of a biome source: an ASCII map and a distribution table.

use std::collections::BTreeMap;
use std::fmt::Write;

use nebula_biomes::{BiomeError, BiomeId, BiomeSource};

const GLYPHS: &[u8] = b"#%@*+=ox~:.-^&$";

/// Rectangle of host coordinates sampled for a report.
#[derive(Clone, Copy, Debug)]
pub struct Window {
    /// Host x of the top-left sample.
    pub origin_x: i32,
    /// Host z of the top-left sample.
    pub origin_z: i32,
    /// Samples per row.
    pub columns: i32,
    /// Number of rows.
    pub rows: i32,
    /// Host units between two samples.
    pub step: i32,
}

/// Biome identities sampled over `window`, row by row.
pub fn sample<S: BiomeSource>(source: &S, window: Window) -> Result<Vec<Vec<BiomeId>>, BiomeError> {
    (0..window.rows)
        .map(|row| {
            (0..window.columns)
                .map(|col| {
                    let x = window.origin_x + col * window.step;
                    let z = window.origin_z + row * window.step;
                    source.get_biome(x, 0, z)
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

/// Renders sampled rows as glyphs followed by a legend.
pub fn render_map(source: &impl BiomeSource, rows: &[Vec<BiomeId>]) -> String {
    let legend: BTreeMap<&BiomeId, char> = source
        .possible_biomes()
        .iter()
        .enumerate()
        .map(|(i, id)| (id, char::from(GLYPHS[i % GLYPHS.len()])))
        .collect();

    let mut out = String::new();
    for row in rows {
        let line: String = row
            .iter()
            .map(|id| legend.get(id).copied().unwrap_or('?'))
            .collect();
        let _ = writeln!(out, "{line}");
    }
    for id in source.possible_biomes() {
        if let Some(glyph) = legend.get(id) {
            let _ = writeln!(out, "  {glyph}  {id}");
        }
    }
    out
}

/// Share of samples per biome, most frequent first.
pub fn distribution(rows: &[Vec<BiomeId>]) -> Vec<(BiomeId, f64)> {
    let mut counts: BTreeMap<&BiomeId, usize> = BTreeMap::new();
    let mut total = 0usize;
    for id in rows.iter().flatten() {
        *counts.entry(id).or_default() += 1;
        total += 1;
    }
    let mut shares: Vec<(BiomeId, f64)> = counts
        .into_iter()
        .map(|(id, count)| (id.clone(), count as f64 / total.max(1) as f64))
        .collect();
    shares.sort_by(|a, b| b.1.total_cmp(&a.1));
    shares
}
