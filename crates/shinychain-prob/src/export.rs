use std::io::{self, Write};

use thiserror::Error;

use crate::distribution::Distribution;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: no distribution has any keys")]
    EmptyDistribution,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Write distributions side by side as comma-separated rows for plotting.
///
/// Rows cover every key from 1 up to the largest key of any input, so
/// gaps show up as explicit zeros. Each row is the key followed by one
/// value per distribution.
pub fn write_distributions<W: Write>(
    dists: &[&Distribution],
    mut writer: W,
) -> Result<(), ExportError> {
    let max_key = dists
        .iter()
        .filter_map(|d| d.max_key())
        .max()
        .ok_or(ExportError::EmptyDistribution)?;

    for key in 1..=max_key {
        write!(writer, "{key}")?;
        for dist in dists {
            match dist.get(key) {
                Some(value) => write!(writer, ",{value}")?,
                None => write!(writer, ",0")?,
            }
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_row_per_key_with_zero_fill() {
        let a = Distribution::from_counts([(1, 3), (3, 1)]);
        let b: Distribution = [(2, 0.5), (4, 0.25)].into_iter().collect();
        let mut out = Vec::new();
        write_distributions(&[&a, &b], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "1,3,0\n2,0,0.5\n3,1,0\n4,0,0.25\n");
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let empty = Distribution::new();
        let mut out = Vec::new();
        assert!(matches!(
            write_distributions(&[&empty], &mut out),
            Err(ExportError::EmptyDistribution)
        ));
        assert!(matches!(
            write_distributions(&[], &mut out),
            Err(ExportError::EmptyDistribution)
        ));
        assert!(out.is_empty());
    }
}
