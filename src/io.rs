//! File I/O around the engine.
//!
//! Readers: fMRIPrep `*_desc-confounds_timeseries.tsv` and its JSON sidecar.
//! Writers: TSV with a header row, or a safetensors file holding one F64
//! tensor `confounds` `[T, K]` with the column labels in `__metadata__`.
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use std::io::{Read, Write};
use std::path::Path;

use crate::compcor::ComponentMetadata;
use crate::loader::{LoadResult, Scan};
use crate::table::ConfoundTable;

// ── Readers ──────────────────────────────────────────────────────────────────

/// Parse one TSV cell. `n/a` and empty cells are NaN.
fn parse_cell(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("n/a") || s.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    s.parse().ok()
}

/// Read a tab-separated confounds table with a header row.
pub fn read_table<R: Read>(reader: R) -> Result<ConfoundTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .context("reading TSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let n_cols = columns.len();

    let mut values: Vec<f64> = Vec::new();
    let mut n_rows = 0usize;
    for (row, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("reading TSV row {}", row + 1))?;
        if record.len() != n_cols {
            bail!("row {}: {} cells, header has {n_cols}", row + 1, record.len());
        }
        for (col, cell) in record.iter().enumerate() {
            let v = parse_cell(cell).with_context(|| {
                format!("row {}, column {:?}: {cell:?} is not a number", row + 1, columns[col])
            })?;
            values.push(v);
        }
        n_rows += 1;
    }

    let data = Array2::from_shape_vec((n_rows, n_cols), values)?;
    Ok(ConfoundTable::new(columns, data)?)
}

pub fn read_confounds_tsv(path: &Path) -> Result<ConfoundTable> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    read_table(std::io::BufReader::new(f))
        .with_context(|| format!("parsing {}", path.display()))
}

/// Read the confounds JSON sidecar into CompCor metadata.
pub fn read_sidecar(path: &Path) -> Result<ComponentMetadata> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(ComponentMetadata::from_sidecar(&value)?)
}

/// Table plus optional sidecar, ready for [`crate::Confounds::load`].
pub fn read_scan(tsv: &Path, sidecar: Option<&Path>) -> Result<Scan> {
    let table = read_confounds_tsv(tsv)?;
    let metadata = sidecar.map(read_sidecar).transpose()?;
    Ok(Scan::new(table, metadata))
}

// ── Writers ──────────────────────────────────────────────────────────────────

/// Write `result` as TSV: one header row of labels, one row per volume.
pub fn write_tsv<W: Write>(result: &LoadResult, writer: W) -> Result<()> {
    let mut w = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    w.write_record(&result.columns)?;
    for row in result.confounds.rows() {
        w.write_record(row.iter().map(|v| v.to_string()))?;
    }
    w.flush()?;
    Ok(())
}

/// Write `result` as a single-tensor safetensors file.
pub fn write_safetensors(result: &LoadResult, path: &Path) -> Result<()> {
    let (n_t, n_k) = result.confounds.dim();
    let bytes: Vec<u8> = result
        .confounds
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();

    let mut header_map = serde_json::Map::new();
    header_map.insert(
        "__metadata__".into(),
        serde_json::json!({ "columns": result.columns.join("\t") }),
    );
    header_map.insert(
        "confounds".into(),
        serde_json::json!({
            "dtype": "F64",
            "shape": [n_t, n_k],
            "data_offsets": [0, bytes.len()],
        }),
    );

    let hdr_bytes = serde_json::to_vec(&header_map)?;
    let pad = (8 - hdr_bytes.len() % 8) % 8;
    let padded: Vec<u8> = hdr_bytes
        .into_iter()
        .chain(std::iter::repeat(b' ').take(pad))
        .collect();

    let mut f = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    f.write_all(&(padded.len() as u64).to_le_bytes())?;
    f.write_all(&padded)?;
    f.write_all(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "trans_x\ttrans_x_derivative1\tframewise_displacement\n\
                       0.1\tn/a\tn/a\n\
                       0.2\t0.1\t0.05\n\
                       0.4\t0.2\t0.3\n";

    #[test]
    fn tsv_na_becomes_nan() {
        let t = read_table(TSV.as_bytes()).unwrap();
        assert_eq!(t.n_scans(), 3);
        assert_eq!(t.columns().len(), 3);
        assert!(t.column("trans_x_derivative1").unwrap()[0].is_nan());
        assert_eq!(t.column("trans_x").unwrap()[2], 0.4);
    }

    #[test]
    fn tsv_rejects_text_cells() {
        let bad = "a\tb\n1\tfoo\n";
        assert!(read_table(bad.as_bytes()).is_err());
    }

    #[test]
    fn tsv_round_trip_of_result() {
        let result = LoadResult {
            confounds: ndarray::array![[1.0, -0.5], [0.25, 2.0]],
            columns: vec!["a".into(), "b".into()],
        };
        let mut buf = Vec::new();
        write_tsv(&result, &mut buf).unwrap();
        let t = read_table(buf.as_slice()).unwrap();
        assert_eq!(t.columns(), ["a", "b"]);
        assert_eq!(t.data(), &result.confounds);
    }

    #[test]
    fn safetensors_header_lists_columns() {
        let result = LoadResult {
            confounds: Array2::from_shape_fn((4, 2), |(t, k)| (t * 2 + k) as f64),
            columns: vec!["csf".into(), "white_matter".into()],
        };
        let path = std::env::temp_dir().join(format!("confounds_{}.safetensors", std::process::id()));
        write_safetensors(&result, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let n = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
        let header: serde_json::Value = serde_json::from_slice(&bytes[8..8 + n]).unwrap();
        assert_eq!(header["__metadata__"]["columns"], "csf\twhite_matter");
        assert_eq!(header["confounds"]["shape"], serde_json::json!([4, 2]));
        let data = &bytes[8 + n..];
        assert_eq!(data.len(), 8 * 8);
        let last = f64::from_le_bytes(data[56..64].try_into().unwrap());
        assert_eq!(last, 7.0);
    }
}
