//! CSV Data Loader Module
//! Loads the study export with Polars, renames the raw columns and converts
//! rows into typed participants.

use super::model::{Measure, Participant, ParticipantTable, Sex, UnknownSex};
use log::{debug, info, warn};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

pub const CAKE_COLUMN: &str = "CAKe";
pub const SEX_COLUMN: &str = "Sex";
const RAW_CAKE_COLUMN: &str = "CAKe score";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    #[error("Row {row}: unrecognized Sex value '{value}' (expected Female or Male)")]
    UnknownSex { row: usize, value: String },
    #[error("No complete participant rows in data")]
    NoData,
}

/// Handles CSV loading and conversion into a `ParticipantTable`.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file using Polars.
    pub fn load_csv(file_path: &str) -> Result<ParticipantTable, LoaderError> {
        info!("Loading {}", file_path);

        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        debug!(
            "Read {} rows, columns: {:?}",
            df.height(),
            df.get_column_names()
        );
        Self::from_dataframe(df)
    }

    /// Load from a path, for callers holding a `Path`.
    pub fn load_path(path: &Path) -> Result<ParticipantTable, LoaderError> {
        Self::load_csv(&path.to_string_lossy())
    }

    /// Rename raw export columns and convert every complete row.
    pub fn from_dataframe(mut df: DataFrame) -> Result<ParticipantTable, LoaderError> {
        Self::rename_columns(&mut df)?;

        let cake = Self::numeric_column(&df, CAKE_COLUMN)?;
        let measures: Vec<(Measure, Vec<Option<f64>>)> = Measure::ALL
            .iter()
            .map(|&m| Ok((m, Self::numeric_column(&df, m.column())?)))
            .collect::<Result<_, LoaderError>>()?;
        let sex_text = Self::sex_column(&df)?;

        let mut participants = Vec::with_capacity(df.height());
        'rows: for i in 0..df.height() {
            let Some(cake) = cake[i] else {
                warn!("Skipping row {}: missing {}", i + 1, CAKE_COLUMN);
                continue;
            };

            let mut values = [0.0; 4];
            for (slot, (measure, column)) in values.iter_mut().zip(&measures) {
                match column[i] {
                    Some(v) => *slot = v,
                    None => {
                        warn!("Skipping row {}: missing {}", i + 1, measure.column());
                        continue 'rows;
                    }
                }
            }

            // Only rows that survive the completeness checks are held to a valid Sex.
            let sex = match &sex_text {
                Some(texts) => Self::parse_sex(texts[i].as_deref(), i + 1)?,
                None => None,
            };

            participants.push(Participant {
                cake,
                source_acc_context: values[0],
                source_acc_feature: values[1],
                item_acc_context: values[2],
                item_acc_feature: values[3],
                sex,
            });
        }

        if participants.is_empty() {
            return Err(LoaderError::NoData);
        }

        info!(
            "Loaded {} participants ({} rows skipped)",
            participants.len(),
            df.height() - participants.len()
        );
        Ok(ParticipantTable::new(participants))
    }

    /// Map the study's long column names onto short ones.
    fn rename_columns(df: &mut DataFrame) -> Result<(), LoaderError> {
        let renames = std::iter::once((RAW_CAKE_COLUMN, CAKE_COLUMN))
            .chain(Measure::ALL.iter().map(|m| (m.raw_column(), m.column())));

        for (raw, short) in renames {
            if df.get_column_index(raw).is_some() && df.get_column_index(short).is_none() {
                df.rename(raw, short.into())?;
            }
        }
        Ok(())
    }

    /// Column values as f64; NaN and unparseable cells become `None`.
    fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, LoaderError> {
        let column = df
            .column(name)
            .map_err(|_| LoaderError::MissingColumn(name.to_string()))?;
        let value_f64 = column.cast(&DataType::Float64)?;
        let value_ca = value_f64.f64()?;

        Ok(value_ca
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    }

    /// Raw text of the optional `Sex` column; blank cells become `None`.
    fn sex_column(df: &DataFrame) -> Result<Option<Vec<Option<String>>>, LoaderError> {
        let Ok(column) = df.column(SEX_COLUMN) else {
            debug!("No {} column; sex split unavailable", SEX_COLUMN);
            return Ok(None);
        };

        let mut texts = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let val = column.get(i)?;
            if val.is_null() {
                texts.push(None);
                continue;
            }
            let text = val.to_string().trim_matches('"').trim().to_string();
            texts.push((!text.is_empty()).then_some(text));
        }
        Ok(Some(texts))
    }

    fn parse_sex(text: Option<&str>, row: usize) -> Result<Option<Sex>, LoaderError> {
        text.map(|t| {
            t.parse::<Sex>()
                .map_err(|UnknownSex(value)| LoaderError::UnknownSex { row, value })
        })
        .transpose()
    }
}
