//! Run report and CSV export of a similarity grid.

use crate::score_norm::ScoreNorm;
use crate::similarity_matrix::SimilarityMatrix;
use crate::Algorithm;
use ndarray::Array2;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("output directory {} already exists", .0.display())]
    DirectoryExists(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Run parameters echoed into `report.txt`.
#[derive(Debug, Clone)]
pub struct RunReport<'a> {
    pub algorithm: Algorithm,
    pub budget: Option<Duration>,
    pub norm: ScoreNorm,
    pub both_directions: bool,
    pub inputs: &'a [PathBuf],
    pub total_duration: Duration,
}

/// Creates `dir` and writes the report plus the three CSV matrices into it.
/// Refuses to reuse an existing directory rather than overwrite anything.
pub fn write_outputs(
    dir: &Path,
    matrix: &SimilarityMatrix,
    names: &[String],
    run: &RunReport,
) -> Result<(), ReportError> {
    if dir.exists() {
        return Err(ReportError::DirectoryExists(dir.to_path_buf()));
    }
    fs::create_dir_all(dir)?;

    write_report(&dir.join("report.txt"), run)?;
    let alg = run.algorithm;
    write_matrix_csv(
        &dir.join(format!("similarity_{}.csv", alg)),
        matrix.scores(),
        names,
    )?;
    write_matrix_csv(
        &dir.join(format!("duration_{}.csv", alg)),
        matrix.durations(),
        names,
    )?;
    write_matrix_csv(
        &dir.join(format!("time_limit_reached_{}.csv", alg)),
        matrix.timed_out(),
        names,
    )?;
    Ok(())
}

fn write_report(path: &Path, run: &RunReport) -> Result<(), ReportError> {
    let mut f = File::create(path)?;
    writeln!(f, "Report")?;
    writeln!(f, "algorithm: {}", run.algorithm)?;
    match run.budget {
        Some(budget) => writeln!(f, "time limit: {}s", budget.as_secs())?,
        None => writeln!(f, "time limit: none")?,
    }
    writeln!(f, "normalize: {}", run.norm == ScoreNorm::MaxEdges)?;
    writeln!(f, "both directions: {}", run.both_directions)?;
    writeln!(f, "trees:")?;
    for input in run.inputs {
        writeln!(f, "  {}", input.display())?;
    }
    writeln!(f, "entire duration: {:.3}s", run.total_duration.as_secs_f64())?;
    Ok(())
}

/// One CSV with an empty top-left corner cell and tree names as row and
/// column labels.
fn write_matrix_csv<T: Display>(
    path: &Path,
    values: &Array2<T>,
    names: &[String],
) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec![String::new()];
    header.extend_from_slice(names);
    writer.write_record(&header)?;
    for i in 0..values.nrows() {
        let mut record = vec![names[i].clone()];
        for j in 0..values.ncols() {
            record.push(values[(i, j)].to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
