/// Shared fixtures: a synthetic fMRIPrep confounds table and sidecar.
use confounds::{ComponentMetadata, ConfoundTable, Scan};
use serde_json::{json, Value};

pub const N_T: usize = 40;

/// Deterministic noise in [-0.5, 0.5).
fn jitter(t: usize, c: usize) -> f64 {
    ((t * 7919 + c * 104_729 + 13) % 1000) as f64 / 1000.0 - 0.5
}

/// `x`, `x_derivative1`, `x_power2`, `x_derivative1_power2` for one base signal.
fn expanded(name: &str, base: &[f64]) -> Vec<(String, Vec<f64>)> {
    let deriv: Vec<f64> = (0..base.len())
        .map(|t| if t == 0 { f64::NAN } else { base[t] - base[t - 1] })
        .collect();
    vec![
        (name.to_string(), base.to_vec()),
        (format!("{name}_derivative1"), deriv.clone()),
        (format!("{name}_power2"), base.iter().map(|v| v * v).collect()),
        (format!("{name}_derivative1_power2"), deriv.iter().map(|v| v * v).collect()),
    ]
}

#[allow(unused)]
/// All columns of the synthetic table, in fMRIPrep-like order.
pub fn fmriprep_columns(n_t: usize) -> Vec<(String, Vec<f64>)> {
    let mut cols = Vec::new();
    let mut c = 0;
    let mut signal = |scale: f64| {
        c += 1;
        let k = c;
        (0..n_t)
            .map(|t| scale * (1.0 + t as f64 / n_t as f64) + 0.05 * jitter(t, k))
            .collect::<Vec<f64>>()
    };

    for name in ["global_signal", "csf", "white_matter"] {
        cols.extend(expanded(name, &signal(100.0)));
    }
    for (i, name) in ["trans_x", "trans_y", "trans_z", "rot_x", "rot_y", "rot_z"].iter().enumerate() {
        cols.extend(expanded(name, &signal(0.1 * (i + 1) as f64)));
    }
    for k in 0..3 {
        cols.push((
            format!("cosine{k:02}"),
            (0..n_t)
                .map(|t| (std::f64::consts::PI * (k + 1) as f64 * (t as f64 + 0.5) / n_t as f64).cos())
                .collect(),
        ));
    }
    for k in 0..8 {
        cols.push((format!("a_comp_cor_{k:02}"), (0..n_t).map(|t| jitter(t, 50 + k)).collect()));
    }
    for k in 0..3 {
        cols.push((format!("t_comp_cor_{k:02}"), (0..n_t).map(|t| jitter(t, 80 + k)).collect()));
    }
    for k in 1..=2 {
        cols.push((format!("aroma_motion_{k:02}"), (0..n_t).map(|t| jitter(t, 90 + k)).collect()));
    }
    cols.push((
        "framewise_displacement".into(),
        (0..n_t).map(|t| if t == 0 { f64::NAN } else { 0.05 }).collect(),
    ));
    cols.push((
        "std_dvars".into(),
        (0..n_t).map(|t| if t == 0 { f64::NAN } else { 1.0 }).collect(),
    ));
    cols
}

#[allow(unused)]
pub fn fmriprep_table() -> ConfoundTable {
    ConfoundTable::from_columns(fmriprep_columns(N_T)).unwrap()
}

#[allow(unused)]
/// Table with `drop` removed.
pub fn table_without(drop: &[&str]) -> ConfoundTable {
    let cols = fmriprep_columns(N_T)
        .into_iter()
        .filter(|(name, _)| !drop.contains(&name.as_str()))
        .collect();
    ConfoundTable::from_columns(cols).unwrap()
}

#[allow(unused)]
/// Table whose framewise displacement exceeds 0.2 mm at `spikes`.
pub fn table_with_fd_spikes(n_t: usize, spikes: &[usize]) -> ConfoundTable {
    let cols = fmriprep_columns(n_t)
        .into_iter()
        .map(|(name, values)| {
            if name == "framewise_displacement" {
                let fd = (0..n_t).map(|t| if spikes.contains(&t) { 0.9 } else { 0.01 }).collect();
                (name, fd)
            } else {
                (name, values)
            }
        })
        .collect();
    ConfoundTable::from_columns(cols).unwrap()
}

/// Sidecar describing the CompCor columns of [`fmriprep_columns`]:
/// a_comp_cor_00..03 combined, 04..05 WM, 06..07 CSF, t_comp_cor_00..02 temporal.
#[allow(unused)]
pub fn fmriprep_sidecar() -> Value {
    let mut obj = serde_json::Map::new();
    let combined = [0.30, 0.15, 0.10, 0.05];
    let mut cum = 0.0;
    for (k, v) in combined.iter().enumerate() {
        cum += v;
        obj.insert(
            format!("a_comp_cor_{k:02}"),
            json!({"Mask": "combined", "Method": "aCompCor", "Retained": true,
                   "VarianceExplained": v, "CumulativeVarianceExplained": cum}),
        );
    }
    for (mask, first) in [("WM", 4), ("CSF", 6)] {
        let mut cum = 0.0;
        for (i, v) in [0.6, 0.2].iter().enumerate() {
            cum += v;
            obj.insert(
                format!("a_comp_cor_{:02}", first + i),
                json!({"Mask": mask, "Method": "aCompCor", "Retained": true,
                       "VarianceExplained": v, "CumulativeVarianceExplained": cum}),
            );
        }
    }
    let mut cum = 0.0;
    for (k, v) in [0.25, 0.2, 0.1].iter().enumerate() {
        cum += v;
        obj.insert(
            format!("t_comp_cor_{k:02}"),
            json!({"Method": "tCompCor", "Retained": true,
                   "VarianceExplained": v, "CumulativeVarianceExplained": cum}),
        );
    }
    obj.insert("aroma_motion_01".into(), json!({"MotionNoise": true}));
    Value::Object(obj)
}

#[allow(unused)]
pub fn fmriprep_scan() -> Scan {
    let meta = ComponentMetadata::from_sidecar(&fmriprep_sidecar()).unwrap();
    Scan::new(fmriprep_table(), Some(meta))
}
