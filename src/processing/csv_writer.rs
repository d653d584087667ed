use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Write the interleaved lattice state as one row per cell: the cell
/// coordinate, the transmembrane potential, then the gating variables.
pub fn write_state_field<P: AsRef<Path>>(
    path: P,
    xs: &[f64],
    state: &[f64],
    width: usize,
) -> io::Result<()> {
    if state.len() != xs.len() * width {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "State length ({}) doesn't match {} cells of width {}",
                state.len(),
                xs.len(),
                width
            ),
        ));
    }

    let mut file = File::create(path)?;

    let mut headers = vec!["x".to_string(), "v".to_string()];
    for j in 0..width - 1 {
        headers.push(format!("s_{j}"));
    }
    writeln!(file, "{}", headers.join(","))?;

    for (k, x) in xs.iter().enumerate() {
        let mut row = vec![format!("{:.15e}", x)];
        for &value in &state[k * width..(k + 1) * width] {
            row.push(format!("{:.15e}", value));
        }
        writeln!(file, "{}", row.join(","))?;
    }

    Ok(())
}

/// Write probe time series: one time column followed by one column per
/// named probe.
pub fn write_probe_traces<P: AsRef<Path>>(
    path: P,
    times: &[f64],
    probes: &[(&str, Vec<f64>)],
) -> io::Result<()> {
    for (name, trace) in probes {
        if trace.len() != times.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Probe '{}' length ({}) doesn't match time column ({})",
                    name,
                    trace.len(),
                    times.len()
                ),
            ));
        }
    }

    let mut file = File::create(path)?;

    let mut headers = vec!["t"];
    headers.extend(probes.iter().map(|(name, _)| *name));
    writeln!(file, "{}", headers.join(","))?;

    for (i, t) in times.iter().enumerate() {
        let mut row = vec![format!("{:.15e}", t)];
        for (_, trace) in probes {
            row.push(format!("{:.15e}", trace[i]));
        }
        writeln!(file, "{}", row.join(","))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_state_field() {
        let path = "test_state_field.csv";
        let xs = vec![0.25, 0.75];
        let state = vec![-85.0, 0.1, -84.0, 0.2];

        write_state_field(path, &xs, &state, 2).unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("x,v,s_0\n"));
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_probe_length_mismatch_rejected() {
        let err = write_probe_traces(
            "test_probe_mismatch.csv",
            &[0.0, 1.0],
            &[("v", vec![1.0])],
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
