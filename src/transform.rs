use crate::config::{Conversion, CurrencyTarget};
use crate::error::{PipelineError, Result};
use crate::structs::{RateTable, RecordSet, Value};
use log::debug;

/// Resolved input for the conversion step.
#[derive(Debug, Clone)]
pub enum SideInput {
    Rates {
        rates: RateTable,
        source_column: String,
        targets: Vec<CurrencyTarget>,
    },
    Divisor {
        column: String,
        divisor: f64,
        renamed: String,
    },
}

impl SideInput {
    /// Loads whatever the configured conversion needs; the rate file is read here.
    pub fn load(conversion: &Conversion) -> Result<Self> {
        match conversion {
            Conversion::Currency {
                rates_path,
                source_column,
                targets,
            } => {
                debug!("Reading exchange rates: {}", rates_path.display());
                let rates = RateTable::load(rates_path)?;
                debug!("Loaded {} exchange rates", rates.len());
                Ok(SideInput::Rates {
                    rates,
                    source_column: source_column.clone(),
                    targets: targets.clone(),
                })
            }
            Conversion::Units {
                column,
                divisor,
                renamed,
            } => Ok(SideInput::Divisor {
                column: column.clone(),
                divisor: *divisor,
                renamed: renamed.clone(),
            }),
        }
    }
}

/// Applies the conversion and hands back the same record set.
///
/// Row count and order are unchanged. The currency variant appends one column
/// per target; the unit variant rewrites and renames its column in place.
///
/// # Errors
///
/// Returns `PipelineError::MissingRate` when a target currency has no rate and
/// `PipelineError::Parse` when a source value is not numeric.
pub fn transform(mut records: RecordSet, side: &SideInput) -> Result<RecordSet> {
    match side {
        SideInput::Rates {
            rates,
            source_column,
            targets,
        } => convert_currency(&mut records, rates, source_column, targets)?,
        SideInput::Divisor {
            column,
            divisor,
            renamed,
        } => convert_units(&mut records, column, *divisor, renamed)?,
    }
    debug!("Transformed {} rows into columns: {}", records.len(), records.columns().join(", "));
    Ok(records)
}

fn convert_currency(
    records: &mut RecordSet,
    rates: &RateTable,
    source_column: &str,
    targets: &[CurrencyTarget],
) -> Result<()> {
    let amounts = records
        .column(source_column)?
        .map(numeric)
        .collect::<Result<Vec<f64>>>()?;

    for target in targets {
        let rate = rates.rate(&target.code)?;
        let converted = amounts
            .iter()
            .map(|amount| Value::Number(round2(amount * rate)))
            .collect();
        records.add_column(target.column.clone(), converted)?;
    }
    Ok(())
}

fn convert_units(records: &mut RecordSet, column: &str, divisor: f64, renamed: &str) -> Result<()> {
    records.map_column(column, |value| {
        let amount = match value {
            Value::Text(text) => parse_number(&text.replace(',', ""))?,
            other => numeric(other)?,
        };
        Ok(Value::Number(round2(amount / divisor)))
    })?;
    records.rename_column(column, renamed)
}

fn numeric(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Text(text) => parse_number(text),
        Value::Null => Err(PipelineError::Parse("expected a number, found null".to_string())),
    }
}

/// Parses cell text as a float after trimming surrounding whitespace.
pub fn parse_number(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|e| PipelineError::Parse(format!("{:?} is not a number: {}", text, e)))
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
